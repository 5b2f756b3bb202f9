//! Diagnostic figures
//!
//! PNG renderings of the curves the demo scripts inspect: spectra before and
//! after Nyquist modulation, the cyclic-prefix cross-correlation and the
//! pilot imaginary-energy curve around the detected symbol start.

use std::path::Path;

use plotters::prelude::*;
use rustfft::num_complex::Complex32;
use rustfft::FftPlanner;

pub type PlotResult = Result<(), Box<dyn std::error::Error>>;

/// Normalized magnitude spectrum `|FFT(x)| / len` of a complex signal.
pub fn magnitude_spectrum_complex(signal: &[Complex32]) -> Vec<f32> {
    let mut buffer = signal.to_vec();
    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(buffer.len()).process(&mut buffer);
    let scale = 1.0 / buffer.len() as f32;
    buffer.iter().map(|x| x.norm() * scale).collect()
}

/// Normalized magnitude spectrum of a real signal.
pub fn magnitude_spectrum_real(signal: &[f32]) -> Vec<f32> {
    let complex: Vec<Complex32> = signal.iter().map(|&x| Complex32::new(x, 0.0)).collect();
    magnitude_spectrum_complex(&complex)
}

/// Pair each value with its normalized frequency in `[0, 1)`.
pub fn normalized_frequency_points(magnitudes: &[f32]) -> Vec<(f32, f32)> {
    let scale = 1.0 / magnitudes.len().max(1) as f32;
    magnitudes
        .iter()
        .enumerate()
        .map(|(i, &m)| (i as f32 * scale, m))
        .collect()
}

/// Render a line plot, optionally with a vertical marker line.
pub fn save_line_plot(
    path: &Path,
    title: &str,
    x_label: &str,
    y_label: &str,
    points: &[(f32, f32)],
    marker_x: Option<f32>,
) -> PlotResult {
    if points.is_empty() {
        return Ok(());
    }

    let (mut x_min, mut x_max) = (f32::INFINITY, f32::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f32::INFINITY, f32::NEG_INFINITY);
    for &(x, y) in points {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }
    if let Some(mx) = marker_x {
        x_min = x_min.min(mx);
        x_max = x_max.max(mx);
    }
    if x_min == x_max {
        x_max = x_min + 1.0;
    }
    if y_min == y_max {
        y_max = y_min + 1.0;
    }
    let y_pad = (y_max - y_min) * 0.05;

    let root = BitMapBackend::new(path, (960, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(44)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, (y_min - y_pad)..(y_max + y_pad))?;
    chart
        .configure_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .draw()?;

    chart.draw_series(LineSeries::new(points.iter().copied(), &BLUE))?;
    if let Some(mx) = marker_x {
        chart.draw_series(LineSeries::new(
            [(mx, y_min - y_pad), (mx, y_max + y_pad)],
            &GREEN,
        ))?;
    }
    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spectrum_of_pure_tone() {
        // exp(j*2*pi*k*n/N) concentrates all energy in bin k
        let n = 64;
        let k = 5;
        let signal: Vec<Complex32> = (0..n)
            .map(|i| {
                let phase = 2.0 * std::f32::consts::PI * k as f32 * i as f32 / n as f32;
                Complex32::new(phase.cos(), phase.sin())
            })
            .collect();
        let spectrum = magnitude_spectrum_complex(&signal);
        let peak_bin = spectrum
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak_bin, k);
        assert!((spectrum[k] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_normalized_frequency_axis() {
        let points = normalized_frequency_points(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(points[0].0, 0.0);
        assert_eq!(points[2], (0.5, 3.0));
    }

    #[test]
    fn test_save_line_plot_writes_png() {
        let path = std::env::temp_dir().join("rustyofdm_plot_test.png");
        let points: Vec<(f32, f32)> = (0..100).map(|i| (i as f32, (i as f32 * 0.1).sin())).collect();
        save_line_plot(&path, "test", "x", "y", &points, Some(42.0)).unwrap();
        assert!(path.exists());
        std::fs::remove_file(&path).ok();
    }
}
