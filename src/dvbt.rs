//! DVB-T 2k-mode demo parameters
//!
//! The transmit and receive binaries share this layout: a 2048-point FFT,
//! 1512 QPSK data carriers (378 payload bytes per symbol), pilots every 12th
//! carrier at amplitude 16/9, carried over 44100 Hz audio.

use snafu::{ResultExt, Snafu};

use crate::codec::{CodecError, Ofdm, OfdmConfig};
use crate::pilots::{pilot_indices, PilotIndexError};

/// FFT size in frequency samples.
pub const TOTAL_FREQ_SAMPLES: usize = 2048;
/// QAM data carriers per symbol.
pub const SYM_SLOTS: usize = 1512;
/// Bits per data carrier (QPSK).
pub const QAM_ORDER: usize = 2;
/// Payload bytes per symbol.
pub const NBYTES: usize = SYM_SLOTS * QAM_ORDER / 8;
/// Distance between neighbouring pilots in carrier offsets.
pub const PILOT_SPACING: usize = 12;
/// Pilot amplitude relative to the QAM unit spacing.
pub const PILOT_AMPLITUDE: f32 = 16.0 / 9.0;

#[derive(Debug, Snafu)]
pub enum DemoSetupError {
    #[snafu(display("pilot layout: {source}"))]
    PilotLayout { source: PilotIndexError },

    #[snafu(display("codec construction: {source}"))]
    Codec { source: CodecError },
}

/// Build the codec both demo binaries use.
pub fn demo_codec() -> Result<Ofdm, DemoSetupError> {
    let pilots = pilot_indices(NBYTES, QAM_ORDER, PILOT_SPACING).context(PilotLayoutSnafu)?;
    Ofdm::new(OfdmConfig {
        pilot_amplitude: PILOT_AMPLITUDE,
        n_data: NBYTES,
        pilot_indices: pilots,
        m_qam: QAM_ORDER,
        n_fft: TOTAL_FREQ_SAMPLES,
    })
    .context(CodecSnafu)
}

/// Symbols needed to carry `n_bytes` of payload.
pub fn symbols_for_payload(n_bytes: usize) -> usize {
    (n_bytes + NBYTES - 1) / NBYTES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_codec_builds() {
        let ofdm = demo_codec().unwrap();
        assert_eq!(ofdm.n_ifft(), 2048);
        assert_eq!(ofdm.n_cyclic(), 512);
        assert_eq!(ofdm.symbol_period(), 2560);
        assert_eq!(ofdm.n_data(), 378);
    }

    #[test]
    fn test_payload_symbol_count() {
        assert_eq!(symbols_for_payload(1), 1);
        assert_eq!(symbols_for_payload(378), 1);
        assert_eq!(symbols_for_payload(379), 2);
        // 100x100-pixel image
        assert_eq!(symbols_for_payload(10_000), 27);
    }
}
