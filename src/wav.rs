//! WAV file round trip
//!
//! The persisted artifact at the transmit/receive boundary is a mono 16-bit
//! PCM WAV file at 44100 Hz. The transmitter peak-normalizes before
//! quantizing to i16; the receiver rescales into `[-1.0, 1.0]` floats. The
//! pilot-derived gain recovery in the codec makes the exact scale irrelevant.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use snafu::{ensure, ResultExt, Snafu};

/// Audio sample rate of the transmitted WAV file in Hz.
pub const SAMPLE_RATE: u32 = 44100;

/// Peak amplitude after normalization, leaving headroom below full scale.
const PEAK_AMPLITUDE: f32 = 0.9;

#[derive(Debug, Snafu)]
pub enum WavError {
    #[snafu(display("failed to create '{path}': {source}"))]
    Create { path: String, source: hound::Error },

    #[snafu(display("failed to read '{path}': {source}"))]
    Read { path: String, source: hound::Error },

    #[snafu(display("failed to write sample to '{path}': {source}"))]
    WriteSample { path: String, source: hound::Error },

    #[snafu(display("'{path}' is not mono 16-bit PCM ({channels} ch, {bits} bits)"))]
    UnsupportedFormat {
        path: String,
        channels: u16,
        bits: u16,
    },
}

/// Peak-normalize `samples` and write them as mono 16-bit PCM at 44100 Hz.
pub fn write_wav_file(path: &Path, samples: &[f32]) -> Result<(), WavError> {
    let display = path.display().to_string();
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).context(CreateSnafu {
        path: display.clone(),
    })?;

    let peak = samples.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
    let scale = if peak > 0.0 {
        PEAK_AMPLITUDE / peak
    } else {
        1.0
    };
    for &sample in samples {
        let value = (sample * scale * i16::MAX as f32) as i16;
        writer.write_sample(value).context(WriteSampleSnafu {
            path: display.clone(),
        })?;
    }
    writer.finalize().context(WriteSampleSnafu { path: display })?;
    Ok(())
}

/// Read a mono 16-bit PCM WAV file into floats, returning the sample rate.
pub fn read_wav_file(path: &Path) -> Result<(Vec<f32>, u32), WavError> {
    let display = path.display().to_string();
    let mut reader = WavReader::open(path).context(ReadSnafu {
        path: display.clone(),
    })?;
    let spec = reader.spec();
    ensure!(
        spec.channels == 1 && spec.bits_per_sample == 16 && spec.sample_format == SampleFormat::Int,
        UnsupportedFormatSnafu {
            path: display.clone(),
            channels: spec.channels,
            bits: spec.bits_per_sample
        }
    );

    let samples = reader
        .samples::<i16>()
        .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
        .collect::<Result<Vec<f32>, hound::Error>>()
        .context(ReadSnafu { path: display })?;
    Ok((samples, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rustyofdm_{}", name))
    }

    #[test]
    fn test_write_read_roundtrip_preserves_shape() {
        let path = temp_path("wav_roundtrip.wav");
        let samples: Vec<f32> = (0..1000)
            .map(|n| (n as f32 * 0.05).sin() * 0.25)
            .collect();
        write_wav_file(&path, &samples).unwrap();

        let (read_back, rate) = read_wav_file(&path).unwrap();
        assert_eq!(rate, SAMPLE_RATE);
        assert_eq!(read_back.len(), samples.len());

        // Quantization and peak normalization change the scale but the two
        // waveforms must stay proportional.
        let scale = read_back[25] / samples[25];
        for (a, b) in samples.iter().zip(read_back.iter()) {
            assert!((a * scale - b).abs() < 2e-3, "{} vs {}", a * scale, b);
        }
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_silence_roundtrip() {
        let path = temp_path("wav_silence.wav");
        write_wav_file(&path, &[0.0; 64]).unwrap();
        let (read_back, _) = read_wav_file(&path).unwrap();
        assert!(read_back.iter().all(|&x| x == 0.0));
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = read_wav_file(Path::new("/nonexistent/rustyofdm.wav"));
        assert!(matches!(result, Err(WavError::Read { .. })));
    }
}
