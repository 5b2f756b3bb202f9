//! Additive white Gaussian noise for channel simulation

use rand_distr::{Distribution, Normal};

/// Compute RMS (Root Mean Square) power of a signal
pub fn rms_power(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = signal.iter().map(|&x| x * x).sum();
    (sum_squares / signal.len() as f32).sqrt()
}

/// Generate Gaussian white noise with the given standard deviation
pub fn generate_white_noise(num_samples: usize, sigma: f32) -> Vec<f32> {
    let mut rng = rand::rng();
    let normal = match Normal::new(0.0, sigma) {
        Ok(normal) => normal,
        Err(_) => return vec![0.0; num_samples],
    };
    (0..num_samples).map(|_| normal.sample(&mut rng)).collect()
}

/// Add white Gaussian noise to `samples` at the given SNR in dB, measured
/// against the RMS power of the signal itself.
pub fn add_awgn(samples: &mut [f32], snr_db: f32) {
    let signal_rms = rms_power(samples);
    if signal_rms == 0.0 {
        return;
    }
    let snr_linear = 10.0_f32.powf(snr_db / 20.0);
    let sigma = signal_rms / snr_linear;
    let noise = generate_white_noise(samples.len(), sigma);
    for (sample, n) in samples.iter_mut().zip(noise) {
        *sample += n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms_of_constant_signal() {
        let signal = vec![0.5f32; 1000];
        assert!((rms_power(&signal) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_rms_of_empty_signal() {
        assert_eq!(rms_power(&[]), 0.0);
    }

    #[test]
    fn test_noise_sigma_tracks_request() {
        let noise = generate_white_noise(100_000, 0.25);
        let rms = rms_power(&noise);
        assert!((rms - 0.25).abs() < 0.01, "rms {rms}");
    }

    #[test]
    fn test_awgn_at_high_snr_barely_moves_signal() {
        let mut samples: Vec<f32> = (0..10_000).map(|n| (n as f32 * 0.1).sin()).collect();
        let clean = samples.clone();
        add_awgn(&mut samples, 60.0);
        let error_rms = rms_power(
            &samples
                .iter()
                .zip(clean.iter())
                .map(|(a, b)| a - b)
                .collect::<Vec<f32>>(),
        );
        assert!(error_rms < 0.01);
    }

    #[test]
    fn test_awgn_on_silence_is_a_noop() {
        let mut samples = vec![0.0f32; 100];
        add_awgn(&mut samples, 10.0);
        assert!(samples.iter().all(|&x| x == 0.0));
    }
}
