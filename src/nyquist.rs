//! Nyquist modulation between complex baseband and a real audio signal
//!
//! The modulator mixes the complex signal onto a carrier at a quarter of the
//! output sample rate: each complex sample contributes its real part at an
//! even output index and its imaginary part at the following odd index, with
//! the sign alternating every complex sample. This doubles the sample count
//! and places the spectrum centre at `fs/4` of the real signal, inside the
//! audio band at 44100 Hz.
//!
//! [`demodulate`] is the exact inverse of [`modulate`] under noiseless
//! conditions; a trailing unpaired real sample is dropped.

use rustfft::num_complex::Complex32;

/// Up-convert complex baseband to a real signal, doubling the sample count.
pub fn modulate(complex_signal: &[Complex32]) -> Vec<f32> {
    let mut real_signal = Vec::with_capacity(complex_signal.len() * 2);
    for (n, x) in complex_signal.iter().enumerate() {
        let sign = if n % 2 == 0 { 1.0 } else { -1.0 };
        real_signal.push(sign * x.re);
        real_signal.push(sign * x.im);
    }
    real_signal
}

/// Down-convert a real signal to complex baseband, halving the sample count.
pub fn demodulate(real_signal: &[f32]) -> Vec<Complex32> {
    real_signal
        .chunks_exact(2)
        .enumerate()
        .map(|(n, pair)| {
            let sign = if n % 2 == 0 { 1.0 } else { -1.0 };
            Complex32::new(sign * pair[0], sign * pair[1])
        })
        .collect()
}
