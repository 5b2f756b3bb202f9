//! Pilot subcarrier index generation
//!
//! Pilots are subcarriers at known positions carrying a known real-valued
//! reference symbol. The receiver uses them to fine-tune the symbol start
//! (their imaginary parts vanish only at perfect alignment) and as an
//! amplitude reference for demapping.
//!
//! **Layout**: pilots sit at evenly spaced offsets relative to the centre of
//! the spectrum, symmetric about DC. The smallest magnitude is
//! `pilot_spacing/2`, so DC itself is never a pilot. Transmitter and receiver
//! must call [`pilot_indices`] with identical parameters to agree on the
//! layout.

use snafu::{ensure, Snafu};

#[derive(Debug, Snafu, PartialEq)]
pub enum PilotIndexError {
    /// Spacing of 1 would divide by zero in the pilot count derivation
    #[snafu(display("pilot spacing must be at least 2, got {spacing}"))]
    SpacingTooSmall { spacing: usize },

    /// Zero payload length yields a degenerate pilot layout
    #[snafu(display("data length must be greater than zero"))]
    ZeroDataLength,

    /// Zero bits per carrier is not a constellation
    #[snafu(display("modulation order must be greater than zero"))]
    ZeroModulationOrder,
}

/// Compute the set of evenly spaced pilot subcarrier offsets.
///
/// Offsets are relative to the spectrum centre: negative below, positive
/// above. The result is strictly increasing and symmetric (for every `p`,
/// `-p` is also present); zero never appears.
///
/// # Arguments
/// * `n_data` - Payload bytes per OFDM symbol
/// * `m_qam` - Bits per carrier of the QAM constellation
/// * `pilot_spacing` - Subcarrier positions between consecutive pilots (>= 2)
///
/// # Example
/// ```
/// use rustyofdm::pilots::pilot_indices;
///
/// let pilots = pilot_indices(8, 2, 2)?;
/// assert_eq!(&pilots[pilots.len() / 2..pilots.len() / 2 + 2], &[1, 3]);
/// # Ok::<(), rustyofdm::pilots::PilotIndexError>(())
/// ```
pub fn pilot_indices(
    n_data: usize,
    m_qam: usize,
    pilot_spacing: usize,
) -> Result<Vec<i32>, PilotIndexError> {
    ensure!(n_data > 0, ZeroDataLengthSnafu);
    ensure!(m_qam > 0, ZeroModulationOrderSnafu);
    ensure!(
        pilot_spacing >= 2,
        SpacingTooSmallSnafu {
            spacing: pilot_spacing
        }
    );

    // Truncating division throughout, matching the DVB-T pilot count derivation.
    let kpilot = (4 * n_data / m_qam + pilot_spacing / 2) / (pilot_spacing - 1);

    // Ascending half: pilot_spacing/2, then every pilot_spacing, half-open end.
    let half: Vec<i32> = (pilot_spacing / 2..kpilot * pilot_spacing + pilot_spacing / 2)
        .step_by(pilot_spacing)
        .map(|k| k as i32)
        .collect();

    let mut indices: Vec<i32> = half.iter().rev().map(|k| -k).collect();
    indices.extend_from_slice(&half);
    Ok(indices)
}
