//! OFDM Transmitter - greyscale PGM image to WAV audio
//!
//! Encodes an image into DVB-T 2k-mode OFDM symbols, Nyquist-modulates the
//! complex baseband onto a quarter-rate audio carrier and writes a mono
//! 16-bit WAV file at 44100 Hz. A random silent gap precedes the first
//! symbol so the receiver has to find the symbol start itself.
//!
//! Usage:
//!   cargo run --bin ofdmtx -- [OPTIONS] <input.pgm> <output.wav>
//!   ofdmtx [OPTIONS] <input.pgm> <output.wav>
//!
//! Options:
//!   -p, --plots <DIR>     Write diagnostic spectrum plots into DIR
//!   -g, --gap <samples>   Fixed gap before the first symbol (default: random)
//!   -n, --noise <dB>      Add white Gaussian noise at the given SNR
//!   -h, --help            Show this help message
//!
//! Examples:
//!   # Clean transmission
//!   ofdmtx greyscale.pgm ofdm44100.wav
//!
//!   # With diagnostic plots and a 20 dB channel
//!   ofdmtx -p plots -n 20 greyscale.pgm noisy.wav

use std::path::{Path, PathBuf};

use rand::Rng;
use rustfft::num_complex::Complex32;

use rustyofdm::simulation::noise;
use rustyofdm::{dvbt, nyquist, pgm::GreyImage, plot, tracing_init, wav};

struct TxConfig {
    input_path: PathBuf,
    output_path: PathBuf,
    plot_dir: Option<PathBuf>,
    gap: Option<usize>,
    snr_db: Option<f32>,
}

impl TxConfig {
    fn parse_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();

        let mut plot_dir = None;
        let mut gap = None;
        let mut snr_db = None;
        let mut input_path = None;
        let mut output_path = None;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "-p" | "--plots" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("Missing value for --plots".to_string());
                    }
                    plot_dir = Some(PathBuf::from(&args[i]));
                }
                "-g" | "--gap" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("Missing value for --gap".to_string());
                    }
                    gap = Some(
                        args[i]
                            .parse()
                            .map_err(|_| format!("Invalid gap value: {}", args[i]))?,
                    );
                }
                "-n" | "--noise" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("Missing value for --noise".to_string());
                    }
                    snr_db = Some(
                        args[i]
                            .parse()
                            .map_err(|_| format!("Invalid SNR value: {}", args[i]))?,
                    );
                }
                "-h" | "--help" => {
                    print_help(&args[0]);
                    std::process::exit(0);
                }
                arg if !arg.starts_with('-') => {
                    if input_path.is_none() {
                        input_path = Some(PathBuf::from(arg));
                    } else if output_path.is_none() {
                        output_path = Some(PathBuf::from(arg));
                    } else {
                        return Err(format!("Unexpected argument: {}", arg));
                    }
                }
                arg => return Err(format!("Unknown option: {}", arg)),
            }
            i += 1;
        }

        let input_path = input_path.ok_or("Missing input image argument")?;
        let output_path = output_path.ok_or("Missing output file argument")?;

        Ok(TxConfig {
            input_path,
            output_path,
            plot_dir,
            gap,
            snr_db,
        })
    }
}

fn print_help(program: &str) {
    eprintln!("OFDM Transmitter");
    eprintln!();
    eprintln!("Usage: {} [OPTIONS] <input.pgm> <output.wav>", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -p, --plots <DIR>     Write diagnostic spectrum plots into DIR");
    eprintln!("  -g, --gap <samples>   Fixed gap before the first symbol (default: random)");
    eprintln!("  -n, --noise <dB>      Add white Gaussian noise at the given SNR");
    eprintln!("  -h, --help            Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} greyscale.pgm ofdm44100.wav", program);
    eprintln!("  {} -p plots -n 20 greyscale.pgm noisy.wav", program);
}

fn save_spectrum_plots(
    dir: &Path,
    complex_signal: &[Complex32],
    real_signal: &[f32],
) -> plot::PlotResult {
    std::fs::create_dir_all(dir)?;

    let baseband = plot::magnitude_spectrum_complex(complex_signal);
    plot::save_line_plot(
        &dir.join("tx_baseband_spectrum.png"),
        "Complex baseband spectrum",
        "Normalized frequency",
        "Magnitude",
        &plot::normalized_frequency_points(&baseband),
        None,
    )?;

    let audio = plot::magnitude_spectrum_real(real_signal);
    plot::save_line_plot(
        &dir.join("tx_audio_spectrum.png"),
        "Nyquist-modulated audio spectrum",
        "Normalized frequency",
        "Magnitude",
        &plot::normalized_frequency_points(&audio),
        None,
    )?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_init::init_tracing();
    let config = TxConfig::parse_args()?;

    println!("OFDM Transmitter");
    println!("================");
    println!("Input image:  {}", config.input_path.display());
    println!("Output file:  {}", config.output_path.display());
    println!();

    // Step 1: Load the image payload
    println!("Step 1: Loading image...");
    let image = GreyImage::load(&config.input_path)?;
    println!(
        "  ✓ {}x{} pixels ({} bytes)",
        image.width,
        image.height,
        image.len()
    );

    // Step 2: Build the codec and split the payload into symbols
    println!("Step 2: Encoding OFDM symbols...");
    let ofdm = dvbt::demo_codec()?;
    let sig_sym = dvbt::symbols_for_payload(image.len());

    let mut payload = image.pixels.clone();
    payload.resize(sig_sym * dvbt::NBYTES, 0);

    // Silence before the first symbol; the receiver must search for it.
    let gap = config.gap.unwrap_or_else(|| {
        rand::rng().random_range(ofdm.n_ifft()..2 * ofdm.n_ifft())
    });
    let mut complex_signal =
        Vec::with_capacity(gap + sig_sym * ofdm.symbol_period());
    complex_signal.resize(gap, Complex32::new(0.0, 0.0));
    for chunk in payload.chunks(dvbt::NBYTES) {
        complex_signal.extend(ofdm.encode(chunk)?);
    }
    println!("  ✓ {} symbols, gap of {} samples", sig_sym, gap);

    // Step 3: Nyquist-modulate to a real audio signal
    println!("Step 3: Modulating to audio band...");
    let mut real_signal = nyquist::modulate(&complex_signal);
    let duration = real_signal.len() as f32 / wav::SAMPLE_RATE as f32;
    println!(
        "  ✓ {} samples ({:.2} s at {} Hz)",
        real_signal.len(),
        duration,
        wav::SAMPLE_RATE
    );

    if let Some(snr_db) = config.snr_db {
        println!("Step 4: Adding noise...");
        noise::add_awgn(&mut real_signal, snr_db);
        println!("  ✓ Added white Gaussian noise at {:.1} dB SNR", snr_db);
    }

    if let Some(dir) = &config.plot_dir {
        save_spectrum_plots(dir, &complex_signal, &real_signal)?;
        println!("  ✓ Spectrum plots written to {}", dir.display());
    }

    // Final step: write the WAV file
    println!("Step 5: Writing WAV file...");
    wav::write_wav_file(&config.output_path, &real_signal)?;
    let file_size_kb = (44 + real_signal.len() * 2) as f32 / 1024.0;
    println!("  ✓ Written to: {}", config.output_path.display());
    println!("  ✓ File size: {:.1} KB", file_size_kb);

    println!();
    println!("✓ Transmission complete!");

    Ok(())
}
