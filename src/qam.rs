//! Gray-coded square QAM mapping and demapping
//!
//! Each carrier holds `m_qam` bits: the high half selects the in-phase level,
//! the low half the quadrature level. Levels are the odd integers
//! `-(L-1), ..., -1, +1, ..., +(L-1)` per axis, Gray-coded so that adjacent
//! levels differ in a single bit.
//!
//! Supported orders are the even bit counts 2 (QPSK), 4 (16-QAM) and
//! 6 (64-QAM). Mapping and hard-decision demapping are exact inverses.

use rustfft::num_complex::Complex32;

/// True if `m_qam` names a constellation this demapper can handle.
pub fn is_supported_order(m_qam: usize) -> bool {
    matches!(m_qam, 2 | 4 | 6)
}

/// Map the low `m_qam` bits of `bits` onto a constellation point.
pub fn map_symbol(bits: u32, m_qam: usize) -> Complex32 {
    debug_assert!(is_supported_order(m_qam));
    let axis_bits = m_qam / 2;
    let i_bits = bits >> axis_bits;
    let q_bits = bits & ((1 << axis_bits) - 1);
    Complex32::new(axis_level(i_bits, axis_bits), axis_level(q_bits, axis_bits))
}

/// Hard-decision demap of a (gain-normalized) constellation point.
pub fn demap_symbol(symbol: Complex32, m_qam: usize) -> u32 {
    debug_assert!(is_supported_order(m_qam));
    let axis_bits = m_qam / 2;
    let i_bits = axis_bits_from_level(symbol.re, axis_bits);
    let q_bits = axis_bits_from_level(symbol.im, axis_bits);
    (i_bits << axis_bits) | q_bits
}

/// Amplitude of the outermost level, used for power budgeting by callers.
pub fn peak_level(m_qam: usize) -> f32 {
    let levels = 1u32 << (m_qam / 2);
    (levels - 1) as f32
}

fn axis_level(bits: u32, axis_bits: usize) -> f32 {
    let levels = 1u32 << axis_bits;
    let index = gray_to_binary(bits);
    (2 * index as i32 - (levels as i32 - 1)) as f32
}

fn axis_bits_from_level(amplitude: f32, axis_bits: usize) -> u32 {
    let levels = 1i32 << axis_bits;
    let index = ((amplitude + (levels - 1) as f32) / 2.0).round() as i32;
    let index = index.clamp(0, levels - 1) as u32;
    index ^ (index >> 1)
}

fn gray_to_binary(gray: u32) -> u32 {
    let mut binary = gray;
    let mut shift = gray >> 1;
    while shift > 0 {
        binary ^= shift;
        shift >>= 1;
    }
    binary
}
