//! OFDM transmit/receive chain over audio-band signals
//!
//! A DVB-T-style OFDM codec: payload bytes become QAM carriers around the
//! spectrum centre, interleaved with real-valued pilots, assembled by an
//! inverse FFT and guarded by a cyclic prefix. The complex baseband signal is
//! Nyquist-modulated onto a quarter-rate audio carrier and carried through
//! 16-bit WAV files; the receiver finds the first symbol with a cyclic-prefix
//! correlation plus a pilot-phase fine search and demaps the carriers back to
//! bytes.
//!
//! The `ofdmtx` and `ofdmrx` binaries run the full chain over a greyscale
//! PGM image and report the round-trip bit error rate.

pub mod ber;
pub mod codec;
pub mod dvbt;
pub mod nyquist;
pub mod pgm;
pub mod pilots;
pub mod plot;
pub mod qam;
pub mod simulation;
pub mod tracing_init;
pub mod wav;

pub use codec::{DecodedSymbol, Ofdm, OfdmConfig, SymbolDecoder, SymbolStartSearch};
pub use pilots::pilot_indices;
