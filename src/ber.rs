//! Bit-error-rate computation
//!
//! Compares transmitted and received byte streams bit by bit. The round-trip
//! demo requires a BER of exactly zero over a noiseless channel.

use bitvec::prelude::*;

/// Count of differing bits between two equal-length byte streams.
pub fn bit_errors(tx: &[u8], rx: &[u8]) -> usize {
    assert_eq!(tx.len(), rx.len(), "byte streams must be the same length");
    tx.view_bits::<Msb0>()
        .iter()
        .zip(rx.view_bits::<Msb0>().iter())
        .filter(|(a, b)| a != b)
        .count()
}

/// Fraction of differing bits between two equal-length byte streams.
pub fn bit_error_rate(tx: &[u8], rx: &[u8]) -> f64 {
    if tx.is_empty() {
        return 0.0;
    }
    bit_errors(tx, rx) as f64 / (tx.len() * 8) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_streams() {
        let data = vec![0xa5u8; 100];
        assert_eq!(bit_errors(&data, &data), 0);
        assert_eq!(bit_error_rate(&data, &data), 0.0);
    }

    #[test]
    fn test_single_bit_flip() {
        let tx = vec![0x00u8, 0x00];
        let rx = vec![0x00u8, 0x01];
        assert_eq!(bit_errors(&tx, &rx), 1);
        assert_eq!(bit_error_rate(&tx, &rx), 1.0 / 16.0);
    }

    #[test]
    fn test_complement_is_all_errors() {
        let tx = vec![0x0fu8; 8];
        let rx = vec![0xf0u8; 8];
        assert_eq!(bit_errors(&tx, &rx), 64);
        assert_eq!(bit_error_rate(&tx, &rx), 1.0);
    }

    #[test]
    fn test_empty_streams() {
        assert_eq!(bit_error_rate(&[], &[]), 0.0);
    }

    #[test]
    #[should_panic(expected = "same length")]
    fn test_length_mismatch_panics() {
        bit_errors(&[0u8], &[0u8, 1u8]);
    }
}
