//! Full transmit/receive chain over a WAV file
//!
//! Drives the same path as the ofdmtx/ofdmrx binaries: image bytes through
//! OFDM encoding, Nyquist modulation, a 16-bit WAV round trip, symbol-start
//! search and decoding. Over a noiseless channel the BER must be exactly 0.

use std::path::PathBuf;

use rustfft::num_complex::Complex32;

use rustyofdm::{ber, dvbt, nyquist, tracing_init, wav};

fn temp_wav(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("rustyofdm_{}", name))
}

fn image_bytes(n: usize) -> Vec<u8> {
    (0..n).map(|i| ((i * 89 + 7) % 256) as u8).collect()
}

/// Encode `payload`, place it after `gap` silent samples and push the result
/// through a WAV file, returning the received complex baseband signal.
fn transmit(payload: &[u8], gap: usize, wav_name: &str) -> Vec<Complex32> {
    let ofdm = dvbt::demo_codec().unwrap();
    assert_eq!(payload.len() % dvbt::NBYTES, 0);

    let mut complex_signal = vec![Complex32::new(0.0, 0.0); gap];
    for chunk in payload.chunks(dvbt::NBYTES) {
        complex_signal.extend(ofdm.encode(chunk).unwrap());
    }
    let real_signal = nyquist::modulate(&complex_signal);

    let path = temp_wav(wav_name);
    wav::write_wav_file(&path, &real_signal).unwrap();
    let (mut received, rate) = wav::read_wav_file(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(rate, wav::SAMPLE_RATE);

    received.extend(std::iter::repeat(0.0).take(2 * ofdm.n_ifft()));
    nyquist::demodulate(&received)
}

fn receive(signal: &[Complex32], n_symbols: usize) -> (usize, Vec<u8>) {
    let ofdm = dvbt::demo_codec().unwrap();
    let search = ofdm
        .find_symbol_start(signal, 4 * ofdm.n_ifft(), 8)
        .unwrap();
    let mut decoder = ofdm.decoder(signal, search.offset);
    let mut payload = Vec::with_capacity(n_symbols * dvbt::NBYTES);
    for _ in 0..n_symbols {
        payload.extend(decoder.next_symbol().unwrap().bytes);
    }
    (search.offset, payload)
}

#[test]
fn test_single_symbol_roundtrip_through_wav() {
    tracing_init::init_test_tracing();

    let payload = image_bytes(dvbt::NBYTES);
    let gap = 1234;
    let signal = transmit(&payload, gap, "roundtrip_single.wav");
    let (offset, decoded) = receive(&signal, 1);

    assert_eq!(offset, gap);
    assert_eq!(ber::bit_errors(&payload, &decoded), 0);
}

#[test]
fn test_multi_symbol_roundtrip_through_wav() {
    tracing_init::init_test_tracing();

    // A 42x27-pixel image: 1134 bytes, exactly 3 symbols.
    let payload = image_bytes(3 * dvbt::NBYTES);
    let gap = 3051;
    let signal = transmit(&payload, gap, "roundtrip_multi.wav");
    let (offset, decoded) = receive(&signal, 3);

    assert_eq!(offset, gap);
    assert_eq!(ber::bit_error_rate(&payload, &decoded), 0.0);
}

#[test]
fn test_roundtrip_with_minimal_gap() {
    tracing_init::init_test_tracing();

    let payload = image_bytes(dvbt::NBYTES);
    let gap = dvbt::TOTAL_FREQ_SAMPLES;
    let signal = transmit(&payload, gap, "roundtrip_min_gap.wav");
    let (offset, decoded) = receive(&signal, 1);

    assert_eq!(offset, gap);
    assert_eq!(ber::bit_errors(&payload, &decoded), 0);
}
