//! OFDM symbol codec
//!
//! One OFDM symbol carries `n_data` payload bytes across QAM data carriers
//! plus real-valued pilots, assembled in the frequency domain and converted
//! to time domain with an inverse FFT. A cyclic prefix of a quarter symbol is
//! prepended, so one symbol spans `n_fft + n_fft/4` complex samples.
//!
//! **Carrier layout**: data carriers fill centre-relative offsets symmetric
//! about DC in ascending order, skipping DC and every pilot offset. Offset
//! `k` lands in FFT bin `k mod n_fft`, so negative offsets wrap to the top
//! of the spectrum and the occupied band straddles DC.
//!
//! **Synchronization**: the receiver locates the first symbol in two stages.
//! A coarse stage correlates the signal with itself at lag `n_fft` (the
//! cyclic prefix repeats the symbol tail, so correlation peaks at each symbol
//! start). A fine stage slides the FFT window a few samples either way and
//! picks the position where the pilots' imaginary parts vanish.

use std::sync::Arc;

use bitvec::prelude::*;
use rustfft::num_complex::Complex32;
use rustfft::{Fft, FftPlanner};
use snafu::{ensure, Snafu};
use tracing::{debug, instrument};

use crate::qam;

#[derive(Debug, Snafu)]
pub enum CodecError {
    #[snafu(display("modulation order {m_qam} is not a supported square QAM order (2, 4 or 6)"))]
    UnsupportedQamOrder { m_qam: usize },

    #[snafu(display("{n_data} payload bytes do not split into whole {m_qam}-bit carriers"))]
    PayloadNotCarrierAligned { n_data: usize, m_qam: usize },

    #[snafu(display(
        "carriers reach offset {extent} from centre but an FFT of {n_fft} only holds {max}"
    ))]
    CarriersExceedSpectrum {
        extent: usize,
        n_fft: usize,
        max: usize,
    },

    #[snafu(display("encode expects exactly {expected} bytes, got {actual}"))]
    WrongPayloadLength { expected: usize, actual: usize },

    #[snafu(display("signal of {len} samples has no full symbol at offset {offset}"))]
    SignalExhausted { len: usize, offset: usize },

    #[snafu(display("signal of {len} samples is shorter than one symbol period"))]
    SignalTooShortForSearch { len: usize },
}

/// Fixed construction parameters of the codec.
///
/// Transmitter and receiver must agree on every field, including the pilot
/// index set, to recover the same carrier layout.
#[derive(Debug, Clone)]
pub struct OfdmConfig {
    /// Amplitude of the real-valued pilot carriers, relative to the unit
    /// spacing of the QAM constellation (DVB-T uses 16/9).
    pub pilot_amplitude: f32,
    /// Payload bytes per OFDM symbol.
    pub n_data: usize,
    /// Centre-relative pilot offsets, strictly increasing (see
    /// [`crate::pilots::pilot_indices`]).
    pub pilot_indices: Vec<i32>,
    /// Bits per data carrier.
    pub m_qam: usize,
    /// Total frequency-domain samples (IFFT size).
    pub n_fft: usize,
}

/// OFDM encoder/decoder with a layout fixed at construction.
pub struct Ofdm {
    pilot_amplitude: f32,
    n_data: usize,
    m_qam: usize,
    n_fft: usize,
    n_cyclic: usize,
    /// FFT bins of the pilots.
    pilot_bins: Vec<usize>,
    /// FFT bins of the data carriers, in payload order.
    data_bins: Vec<usize>,
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
}

/// Output of one [`SymbolDecoder::next_symbol`] call.
#[derive(Debug, Clone)]
pub struct DecodedSymbol {
    /// The `n_data` recovered payload bytes.
    pub bytes: Vec<u8>,
    /// Sum of the squared imaginary parts of the received pilots. Near zero
    /// when the FFT window is sample-aligned.
    pub pilot_imag_energy: f32,
}

/// Result of the pilot-based symbol-start search.
#[derive(Debug, Clone)]
pub struct SymbolStartSearch {
    /// Cyclic-prefix cross-correlation magnitude per candidate start sample.
    pub cross_correlation: Vec<f32>,
    /// Pilot imaginary energy per offset in the fine search window.
    pub pilot_imag_energy: Vec<f32>,
    /// Absolute sample index of `pilot_imag_energy[0]`.
    pub fine_window_start: usize,
    /// Selected start sample of the first symbol's cyclic prefix.
    pub offset: usize,
}

impl Ofdm {
    /// Build a codec from fixed parameters, deriving the carrier layout.
    pub fn new(config: OfdmConfig) -> Result<Self, CodecError> {
        ensure!(
            qam::is_supported_order(config.m_qam),
            UnsupportedQamOrderSnafu {
                m_qam: config.m_qam
            }
        );
        ensure!(
            (config.n_data * 8) % config.m_qam == 0,
            PayloadNotCarrierAlignedSnafu {
                n_data: config.n_data,
                m_qam: config.m_qam
            }
        );

        let mut pilots = config.pilot_indices.clone();
        pilots.sort_unstable();
        let is_pilot = |k: i32| pilots.binary_search(&k).is_ok();

        // Data carriers fill offsets outward from the centre, skipping DC and
        // pilots; the negative side mirrors the positive fill.
        let n_carriers = config.n_data * 8 / config.m_qam;
        let half_negative = n_carriers / 2;
        let half_positive = n_carriers - half_negative;

        let mut positive = Vec::with_capacity(half_positive);
        let mut k = 1i32;
        while positive.len() < half_positive {
            if !is_pilot(k) {
                positive.push(k);
            }
            k += 1;
        }
        let mut negative = Vec::with_capacity(half_negative);
        let mut k = -1i32;
        while negative.len() < half_negative {
            if !is_pilot(k) {
                negative.push(k);
            }
            k -= 1;
        }
        negative.reverse();

        let extent = positive
            .iter()
            .chain(negative.iter())
            .chain(pilots.iter())
            .map(|k| k.unsigned_abs() as usize)
            .max()
            .unwrap_or(0);
        ensure!(
            extent < config.n_fft / 2,
            CarriersExceedSpectrumSnafu {
                extent,
                n_fft: config.n_fft,
                max: config.n_fft / 2 - 1
            }
        );

        let bin = |k: i32| k.rem_euclid(config.n_fft as i32) as usize;
        let pilot_bins: Vec<usize> = pilots.iter().map(|&k| bin(k)).collect();
        let data_bins: Vec<usize> = negative
            .iter()
            .chain(positive.iter())
            .map(|&k| bin(k))
            .collect();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.n_fft);
        let ifft = planner.plan_fft_inverse(config.n_fft);

        debug!(
            n_fft = config.n_fft,
            data_carriers = data_bins.len(),
            pilots = pilot_bins.len(),
            extent,
            "carrier layout derived"
        );

        Ok(Self {
            pilot_amplitude: config.pilot_amplitude,
            n_data: config.n_data,
            m_qam: config.m_qam,
            n_fft: config.n_fft,
            n_cyclic: config.n_fft / 4,
            pilot_bins,
            data_bins,
            fft,
            ifft,
        })
    }

    /// IFFT size in frequency samples.
    pub fn n_ifft(&self) -> usize {
        self.n_fft
    }

    /// Cyclic prefix length in samples.
    pub fn n_cyclic(&self) -> usize {
        self.n_cyclic
    }

    /// Complex samples spanned by one symbol, prefix included.
    pub fn symbol_period(&self) -> usize {
        self.n_fft + self.n_cyclic
    }

    /// Payload bytes per symbol.
    pub fn n_data(&self) -> usize {
        self.n_data
    }

    /// Encode exactly `n_data` bytes into one time-domain OFDM symbol.
    ///
    /// Bytes are consumed MSB-first, `m_qam` bits per carrier. The returned
    /// symbol is the cyclic prefix followed by the IFFT body,
    /// [`Self::symbol_period`] samples long.
    pub fn encode(&self, data: &[u8]) -> Result<Vec<Complex32>, CodecError> {
        ensure!(
            data.len() == self.n_data,
            WrongPayloadLengthSnafu {
                expected: self.n_data,
                actual: data.len()
            }
        );

        let mut spectrum = vec![Complex32::new(0.0, 0.0); self.n_fft];
        for &bin in &self.pilot_bins {
            spectrum[bin] = Complex32::new(self.pilot_amplitude, 0.0);
        }
        let bits = data.view_bits::<Msb0>();
        for (&bin, chunk) in self.data_bins.iter().zip(bits.chunks(self.m_qam)) {
            let mut value = 0u32;
            for bit in chunk {
                value = (value << 1) | (*bit as u32);
            }
            spectrum[bin] = qam::map_symbol(value, self.m_qam);
        }

        self.ifft.process(&mut spectrum);
        let scale = 1.0 / self.n_fft as f32;
        for x in spectrum.iter_mut() {
            *x *= scale;
        }

        let mut symbol = Vec::with_capacity(self.symbol_period());
        symbol.extend_from_slice(&spectrum[self.n_fft - self.n_cyclic..]);
        symbol.extend_from_slice(&spectrum);
        Ok(symbol)
    }

    /// Begin stateful decoding of `signal` with the first symbol's cyclic
    /// prefix at sample `start`.
    pub fn decoder<'a>(&'a self, signal: &'a [Complex32], start: usize) -> SymbolDecoder<'a> {
        SymbolDecoder {
            ofdm: self,
            signal,
            index: start,
        }
    }

    /// Locate the start of the first OFDM symbol.
    ///
    /// The coarse stage computes the cyclic-prefix correlation over the first
    /// `searchrange_coarse` candidate offsets and locks onto the earliest
    /// peak reaching half the strongest correlation. The fine stage scans
    /// `searchrange_fine` samples either side of it and minimizes the pilots'
    /// imaginary energy.
    #[instrument(skip(self, signal), fields(signal_len = signal.len()))]
    pub fn find_symbol_start(
        &self,
        signal: &[Complex32],
        searchrange_coarse: usize,
        searchrange_fine: usize,
    ) -> Result<SymbolStartSearch, CodecError> {
        let period = self.symbol_period();
        ensure!(
            signal.len() > period,
            SignalTooShortForSearchSnafu { len: signal.len() }
        );
        let max_start = signal.len() - period;

        let total = searchrange_coarse.min(max_start);
        let mut cross_correlation = Vec::with_capacity(total);
        for i in 0..total {
            let sum: Complex32 = (0..self.n_cyclic)
                .map(|j| signal[i + j] * signal[i + j + self.n_fft].conj())
                .sum();
            cross_correlation.push(sum.norm());
        }

        let peak = cross_correlation.iter().copied().fold(0.0f32, f32::max);
        let threshold = 0.5 * peak;
        let first = cross_correlation
            .iter()
            .position(|&c| c >= threshold)
            .unwrap_or(0);
        // Peaks repeat every symbol period; the argmax within one period of
        // the first threshold crossing is the first symbol, not a later one.
        let window_end = (first + period).min(cross_correlation.len());
        let coarse = first + argmax(&cross_correlation[first..window_end]);

        let fine_window_start = coarse.saturating_sub(searchrange_fine);
        let fine_window_end = (coarse + searchrange_fine).min(max_start);
        let mut pilot_imag_energy = Vec::with_capacity(fine_window_end - fine_window_start);
        for start in fine_window_start..fine_window_end {
            let spectrum = self.symbol_spectrum(signal, start)?;
            pilot_imag_energy.push(self.pilot_imag_energy(&spectrum));
        }
        let offset = if pilot_imag_energy.is_empty() {
            coarse
        } else {
            fine_window_start + argmin(&pilot_imag_energy)
        };

        debug!(coarse, offset, "symbol start selected");
        Ok(SymbolStartSearch {
            cross_correlation,
            pilot_imag_energy,
            fine_window_start,
            offset,
        })
    }

    /// FFT of the symbol body whose cyclic prefix starts at `start`.
    fn symbol_spectrum(
        &self,
        signal: &[Complex32],
        start: usize,
    ) -> Result<Vec<Complex32>, CodecError> {
        ensure!(
            start + self.symbol_period() <= signal.len(),
            SignalExhaustedSnafu {
                len: signal.len(),
                offset: start
            }
        );
        let body = start + self.n_cyclic;
        let mut spectrum = signal[body..body + self.n_fft].to_vec();
        self.fft.process(&mut spectrum);
        Ok(spectrum)
    }

    fn pilot_imag_energy(&self, spectrum: &[Complex32]) -> f32 {
        self.pilot_bins
            .iter()
            .map(|&bin| spectrum[bin].im * spectrum[bin].im)
            .sum()
    }

    fn demap_spectrum(&self, spectrum: &[Complex32]) -> DecodedSymbol {
        let pilot_imag_energy = self.pilot_imag_energy(spectrum);

        // The pilots double as an amplitude reference, so demapping does not
        // depend on the channel or normalization gain.
        let mean_pilot = self
            .pilot_bins
            .iter()
            .map(|&bin| spectrum[bin].re.abs())
            .sum::<f32>()
            / self.pilot_bins.len().max(1) as f32;
        let gain = mean_pilot / self.pilot_amplitude;
        let gain = if gain.is_finite() && gain > f32::EPSILON {
            gain
        } else {
            1.0
        };

        let mut bits = BitVec::<u8, Msb0>::with_capacity(self.n_data * 8);
        for &bin in &self.data_bins {
            let value = qam::demap_symbol(spectrum[bin] / gain, self.m_qam);
            for shift in (0..self.m_qam).rev() {
                bits.push((value >> shift) & 1 == 1);
            }
        }

        DecodedSymbol {
            bytes: bits.into_vec(),
            pilot_imag_energy,
        }
    }
}

/// Symbol-by-symbol decoder over a complex baseband signal.
///
/// Created by [`Ofdm::decoder`]; call [`Self::next_symbol`] once per expected
/// symbol. The cursor advances one symbol period per call.
pub struct SymbolDecoder<'a> {
    ofdm: &'a Ofdm,
    signal: &'a [Complex32],
    index: usize,
}

impl SymbolDecoder<'_> {
    /// Decode one symbol's worth of samples and advance.
    pub fn next_symbol(&mut self) -> Result<DecodedSymbol, CodecError> {
        let spectrum = self.ofdm.symbol_spectrum(self.signal, self.index)?;
        self.index += self.ofdm.symbol_period();
        Ok(self.ofdm.demap_spectrum(&spectrum))
    }
}

fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn argmin(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0)
}
