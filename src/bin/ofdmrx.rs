//! OFDM Receiver - WAV audio back to a greyscale PGM image
//!
//! Nyquist-demodulates the audio signal to complex baseband, locates the
//! first OFDM symbol with the cyclic-prefix correlation plus the pilot-phase
//! fine search, decodes every symbol and writes the recovered image. When a
//! reference image is given the bit error rate against it is reported.
//!
//! Usage:
//!   cargo run --bin ofdmrx -- [OPTIONS] <input.wav> <reference.pgm> <decoded.pgm>
//!   ofdmrx [OPTIONS] <input.wav> <reference.pgm> <decoded.pgm>
//!
//! Options:
//!   -p, --plots <DIR>     Write synchronization plots into DIR
//!   -f, --fine <samples>  Fine search range around the coarse peak (default: 8)
//!   -h, --help            Show this help message
//!
//! Examples:
//!   ofdmrx ofdm44100.wav greyscale.pgm decoded.pgm
//!   ofdmrx -p plots ofdm44100.wav greyscale.pgm decoded.pgm

use std::path::{Path, PathBuf};

use tracing::warn;

use rustyofdm::{ber, dvbt, nyquist, pgm::GreyImage, plot, tracing_init, wav, SymbolStartSearch};

struct RxConfig {
    input_path: PathBuf,
    reference_path: PathBuf,
    decoded_path: PathBuf,
    plot_dir: Option<PathBuf>,
    searchrange_fine: usize,
}

impl RxConfig {
    fn parse_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();

        let mut plot_dir = None;
        let mut searchrange_fine = 8;
        let mut positional: Vec<PathBuf> = Vec::new();

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
                "-f" | "--fine" => {
                    i += 1;
                    if i >= args.len() {
                        return Err("Missing value for --fine".to_string());
                    }
                    searchrange_fine = args[i]
                        .parse()
                        .map_err(|_| format!("Invalid fine search range: {}", args[i]))?;
                }
                "-h" | "--help" => {
                    print_help(&args[0]);
                    std::process::exit(0);
                }
                arg if !arg.starts_with('-') => {
                    if positional.len() < 3 {
                        positional.push(PathBuf::from(arg));
                    } else {
                        return Err(format!("Unexpected argument: {}", arg));
                    }
                }
                arg => return Err(format!("Unknown option: {}", arg)),
            }
            i += 1;
        }

        let mut positional = positional.into_iter();
        let input_path = positional.next().ok_or("Missing input WAV argument")?;
        let reference_path = positional.next().ok_or("Missing reference image argument")?;
        let decoded_path = positional.next().ok_or("Missing decoded image argument")?;

        Ok(RxConfig {
            input_path,
            reference_path,
            decoded_path,
            plot_dir,
            searchrange_fine,
        })
    }
}

fn print_help(program: &str) {
    eprintln!("OFDM Receiver");
    eprintln!();
    eprintln!(
        "Usage: {} [OPTIONS] <input.wav> <reference.pgm> <decoded.pgm>",
        program
    );
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -p, --plots <DIR>     Write synchronization plots into DIR");
    eprintln!("  -f, --fine <samples>  Fine search range around the coarse peak (default: 8)");
    eprintln!("  -h, --help            Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} ofdm44100.wav greyscale.pgm decoded.pgm", program);
    eprintln!("  {} -p plots ofdm44100.wav greyscale.pgm decoded.pgm", program);
}

fn save_sync_plots(dir: &Path, search: &SymbolStartSearch) -> plot::PlotResult {
    std::fs::create_dir_all(dir)?;

    let correlation: Vec<(f32, f32)> = search
        .cross_correlation
        .iter()
        .enumerate()
        .map(|(i, &c)| (i as f32, c))
        .collect();
    plot::save_line_plot(
        &dir.join("rx_cyclic_prefix_correlation.png"),
        "Cyclic-prefix correlation",
        "Start sample",
        "Correlation magnitude",
        &correlation,
        Some(search.offset as f32),
    )?;

    // Offsets relative to the selected symbol start.
    let energy: Vec<(f32, f32)> = search
        .pilot_imag_energy
        .iter()
        .enumerate()
        .map(|(i, &e)| {
            let x = (search.fine_window_start + i) as f32 - search.offset as f32;
            (x, e)
        })
        .collect();
    plot::save_line_plot(
        &dir.join("rx_pilot_phase_energy.png"),
        "Pilot imaginary energy around symbol start",
        "Offset from selected start",
        "Energy",
        &energy,
        Some(0.0),
    )?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_init::init_tracing();
    let config = RxConfig::parse_args()?;

    println!("OFDM Receiver");
    println!("=============");
    println!("Input file:   {}", config.input_path.display());
    println!("Reference:    {}", config.reference_path.display());
    println!("Decoded to:   {}", config.decoded_path.display());
    println!();

    // Step 1: Read the audio signal
    println!("Step 1: Reading WAV file...");
    let (mut real_signal, sample_rate) = wav::read_wav_file(&config.input_path)?;
    if sample_rate != wav::SAMPLE_RATE {
        warn!(sample_rate, expected = wav::SAMPLE_RATE, "unexpected sample rate");
    }
    println!(
        "  ✓ {} samples ({:.2} s at {} Hz)",
        real_signal.len(),
        real_signal.len() as f32 / sample_rate as f32,
        sample_rate
    );

    // Step 2: Down-convert to complex baseband
    println!("Step 2: Demodulating to baseband...");
    let ofdm = dvbt::demo_codec()?;
    // Trailing silence so the search and the last FFT window never run off
    // the end of the signal.
    real_signal.extend(std::iter::repeat(0.0).take(2 * ofdm.n_ifft()));
    let complex_signal = nyquist::demodulate(&real_signal);
    println!("  ✓ {} complex samples", complex_signal.len());

    // Step 3: Locate the first symbol
    println!("Step 3: Searching for symbol start...");
    let search = ofdm.find_symbol_start(
        &complex_signal,
        4 * ofdm.n_ifft(),
        config.searchrange_fine,
    )?;
    println!("  ✓ First symbol starts at sample {}", search.offset);

    if let Some(dir) = &config.plot_dir {
        save_sync_plots(dir, &search)?;
        println!("  ✓ Synchronization plots written to {}", dir.display());
    }

    // Step 4: Decode the symbols covering the reference image
    println!("Step 4: Decoding symbols...");
    let reference = GreyImage::load(&config.reference_path)?;
    let sig_sym = dvbt::symbols_for_payload(reference.len());
    let mut decoder = ofdm.decoder(&complex_signal, search.offset);
    let mut payload = Vec::with_capacity(sig_sym * dvbt::NBYTES);
    for _ in 0..sig_sym {
        payload.extend(decoder.next_symbol()?.bytes);
    }
    payload.truncate(reference.len());
    println!("  ✓ Decoded {} symbols ({} bytes)", sig_sym, payload.len());

    // Step 5: Save the recovered image and compare
    println!("Step 5: Writing decoded image...");
    let decoded = GreyImage {
        width: reference.width,
        height: reference.height,
        pixels: payload,
    };
    decoded.save(&config.decoded_path)?;
    println!("  ✓ Written to: {}", config.decoded_path.display());

    let errors = ber::bit_errors(&reference.pixels, &decoded.pixels);
    let rate = ber::bit_error_rate(&reference.pixels, &decoded.pixels);
    println!();
    println!("Bit errors: {} of {} bits", errors, reference.len() * 8);
    println!("BER: {:.2e}", rate);
    if errors == 0 {
        println!();
        println!("✓ Perfect reception!");
    }

    Ok(())
}
