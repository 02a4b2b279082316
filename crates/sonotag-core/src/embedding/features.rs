//! CLAP audio front end: fixed-length waveform to log-mel spectrogram.
//!
//! Matches the CLAP feature extractor: 10 s windows at 48 kHz (repeat-padded
//! or truncated), periodic Hann window, 1024-point FFT, hop 480, centered
//! reflect padding, 64 Slaney mel bands between 50 Hz and 14 kHz with
//! area normalization, power in dB.

use std::sync::Arc;

use ndarray::Array4;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

pub const SAMPLE_RATE: u32 = 48_000;
pub const N_FFT: usize = 1024;
pub const HOP_LENGTH: usize = 480;
pub const N_MELS: usize = 64;
pub const F_MIN: f32 = 50.0;
pub const F_MAX: f32 = 14_000.0;
/// Samples in one 10 s input window.
pub const MAX_SAMPLES: usize = SAMPLE_RATE as usize * 10;

const POWER_FLOOR: f32 = 1e-10;

/// Precomputed window, filterbank and FFT plan.
pub struct MelFrontend {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    /// `N_MELS` rows of `N_FFT / 2 + 1` weights.
    filterbank: Vec<Vec<f32>>,
}

impl MelFrontend {
    pub fn new() -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(N_FFT),
            window: hann_window(N_FFT),
            filterbank: mel_filterbank(SAMPLE_RATE as f32, N_FFT, N_MELS, F_MIN, F_MAX),
        }
    }

    /// Number of spectrogram frames for a waveform of `samples` samples.
    pub fn frame_count(samples: usize) -> usize {
        1 + samples / HOP_LENGTH
    }

    /// Build the `[1, 1, frames, N_MELS]` input tensor for a 48 kHz mono waveform.
    pub fn features(&self, waveform: &[f32]) -> Array4<f32> {
        let fitted = fit_to_window(waveform, MAX_SAMPLES);
        let mel = self.log_mel(&fitted);
        let frames = mel.len() / N_MELS;
        // Shape always matches the flat length built by `log_mel`.
        Array4::from_shape_vec((1, 1, frames, N_MELS), mel)
            .unwrap_or_else(|_| Array4::zeros((1, 1, frames, N_MELS)))
    }

    /// Log-mel spectrogram, row-major `[frames, N_MELS]`.
    pub fn log_mel(&self, waveform: &[f32]) -> Vec<f32> {
        let padded = reflect_pad(waveform, N_FFT / 2);
        let frames = Self::frame_count(waveform.len());
        let bins = N_FFT / 2 + 1;

        let mut out = Vec::with_capacity(frames * N_MELS);
        let mut buf = vec![Complex::new(0.0f32, 0.0); N_FFT];
        let mut power = vec![0.0f32; bins];

        for frame in 0..frames {
            let start = frame * HOP_LENGTH;
            for (i, slot) in buf.iter_mut().enumerate() {
                let sample = padded.get(start + i).copied().unwrap_or(0.0);
                *slot = Complex::new(sample * self.window[i], 0.0);
            }
            self.fft.process(&mut buf);
            for (p, c) in power.iter_mut().zip(&buf[..bins]) {
                *p = c.norm_sqr();
            }
            for filter in &self.filterbank {
                let energy: f32 = filter.iter().zip(&power).map(|(w, p)| w * p).sum();
                out.push(10.0 * energy.max(POWER_FLOOR).log10());
            }
        }
        out
    }
}

impl Default for MelFrontend {
    fn default() -> Self {
        Self::new()
    }
}

/// Repeat-pad a short waveform (then zero-fill the remainder), or keep the
/// first `max_samples` of a long one.
pub fn fit_to_window(waveform: &[f32], max_samples: usize) -> Vec<f32> {
    if waveform.len() >= max_samples {
        return waveform[..max_samples].to_vec();
    }
    let mut out = Vec::with_capacity(max_samples);
    if !waveform.is_empty() {
        let repeats = max_samples / waveform.len();
        for _ in 0..repeats {
            out.extend_from_slice(waveform);
        }
    }
    out.resize(max_samples, 0.0);
    out
}

/// Periodic Hann window.
pub fn hann_window(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| 0.5 - 0.5 * (std::f32::consts::TAU * i as f32 / len as f32).cos())
        .collect()
}

/// Mirror `pad` samples onto each end, excluding the edge sample.
fn reflect_pad(x: &[f32], pad: usize) -> Vec<f32> {
    if x.len() < 2 {
        let mut out = vec![0.0; pad];
        out.extend_from_slice(x);
        out.resize(x.len() + 2 * pad, 0.0);
        return out;
    }
    let last = x.len() - 1;
    let reflect = |i: isize| -> f32 {
        let period = 2 * last as isize;
        let mut j = i.rem_euclid(period);
        if j > last as isize {
            j = period - j;
        }
        x[j as usize]
    };
    (-(pad as isize)..(x.len() + pad) as isize)
        .map(reflect)
        .collect()
}

const SLANEY_BREAK_HZ: f32 = 1_000.0;
const SLANEY_BREAK_MEL: f32 = 15.0;
const SLANEY_HZ_PER_MEL: f32 = 200.0 / 3.0;

fn slaney_log_step() -> f32 {
    6.4f32.ln() / 27.0
}

/// Slaney mel scale: linear below 1 kHz, logarithmic above.
fn hz_to_mel(hz: f32) -> f32 {
    if hz < SLANEY_BREAK_HZ {
        hz / SLANEY_HZ_PER_MEL
    } else {
        SLANEY_BREAK_MEL + (hz / SLANEY_BREAK_HZ).ln() / slaney_log_step()
    }
}

fn mel_to_hz(mel: f32) -> f32 {
    if mel < SLANEY_BREAK_MEL {
        mel * SLANEY_HZ_PER_MEL
    } else {
        SLANEY_BREAK_HZ * (slaney_log_step() * (mel - SLANEY_BREAK_MEL)).exp()
    }
}

/// Triangular Slaney mel filterbank, each filter scaled to unit area in Hz.
pub fn mel_filterbank(
    sample_rate: f32,
    n_fft: usize,
    n_mels: usize,
    f_min: f32,
    f_max: f32,
) -> Vec<Vec<f32>> {
    let bins = n_fft / 2 + 1;
    let bin_hz: Vec<f32> = (0..bins)
        .map(|k| k as f32 * sample_rate / n_fft as f32)
        .collect();

    let mel_min = hz_to_mel(f_min);
    let mel_max = hz_to_mel(f_max);
    let edges: Vec<f32> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f32 / (n_mels + 1) as f32))
        .collect();

    (0..n_mels)
        .map(|m| {
            let (lower, center, upper) = (edges[m], edges[m + 1], edges[m + 2]);
            let area_norm = 2.0 / (upper - lower);
            bin_hz
                .iter()
                .map(|&f| {
                    let rising = (f - lower) / (center - lower);
                    let falling = (upper - f) / (upper - center);
                    rising.min(falling).max(0.0) * area_norm
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_to_window_repeats_then_zero_fills() {
        let out = fit_to_window(&[1.0, 2.0, 3.0], 8);
        assert_eq!(out, vec![1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 0.0, 0.0]);
    }

    #[test]
    fn test_fit_to_window_truncates_from_start() {
        let out = fit_to_window(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(out, vec![1.0, 2.0, 3.0]);
        assert_eq!(fit_to_window(&[], 4), vec![0.0; 4]);
    }

    #[test]
    fn test_reflect_pad() {
        let out = reflect_pad(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(out, vec![3.0, 2.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0]);
    }

    #[test]
    fn test_hann_window_is_periodic() {
        let w = hann_window(8);
        assert_eq!(w[0], 0.0);
        assert!((w[4] - 1.0).abs() < 1e-6);
        assert!((w[1] - w[7]).abs() < 1e-6);
    }

    #[test]
    fn test_filterbank_shape_and_range() {
        let fb = mel_filterbank(48_000.0, N_FFT, N_MELS, F_MIN, F_MAX);
        assert_eq!(fb.len(), N_MELS);
        assert!(fb.iter().all(|row| row.len() == N_FFT / 2 + 1));
        assert!(fb.iter().flatten().all(|&w| (0.0..=1.0).contains(&w)));
        // Nothing above f_max contributes.
        let cutoff = (F_MAX / (48_000.0 / N_FFT as f32)).ceil() as usize + 1;
        assert!(fb.iter().all(|row| row[cutoff..].iter().all(|&w| w == 0.0)));
    }

    #[test]
    fn test_slaney_scale_break_point() {
        assert!((hz_to_mel(1_000.0) - 15.0).abs() < 1e-4);
        assert!((hz_to_mel(500.0) - 7.5).abs() < 1e-4);
        assert!((hz_to_mel(6_400.0) - 42.0).abs() < 1e-3);
        for hz in [50.0f32, 999.0, 1_000.0, 3_000.0, 14_000.0] {
            assert!((mel_to_hz(hz_to_mel(hz)) - hz).abs() / hz < 1e-4, "{hz}");
        }
    }

    #[test]
    fn test_filters_have_unit_area() {
        let fb = mel_filterbank(48_000.0, N_FFT, N_MELS, F_MIN, F_MAX);
        let bin_width = 48_000.0 / N_FFT as f32;
        for row in &fb[N_MELS - 8..] {
            let area: f32 = row.iter().sum::<f32>() * bin_width;
            assert!((area - 1.0).abs() < 0.05, "area {area}");
        }
    }

    #[test]
    fn test_features_shape() {
        let frontend = MelFrontend::new();
        let tensor = frontend.features(&vec![0.1; 48_000]);
        assert_eq!(tensor.shape(), &[1, 1, 1001, N_MELS]);
    }

    #[test]
    fn test_silence_hits_power_floor() {
        let frontend = MelFrontend::new();
        let mel = frontend.log_mel(&vec![0.0; 4_800]);
        assert_eq!(mel.len(), MelFrontend::frame_count(4_800) * N_MELS);
        assert!(mel.iter().all(|&v| (v + 100.0).abs() < 1e-3));
    }

    #[test]
    fn test_tone_energy_lands_in_matching_band() {
        let frontend = MelFrontend::new();
        let tone: Vec<f32> = (0..9_600)
            .map(|i| (i as f32 / 48_000.0 * 1_000.0 * std::f32::consts::TAU).sin())
            .collect();
        let mel = frontend.log_mel(&tone);
        let frame = &mel[10 * N_MELS..11 * N_MELS];
        let loudest = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        let step = (hz_to_mel(F_MAX) - hz_to_mel(F_MIN)) / (N_MELS + 1) as f32;
        let center = mel_to_hz(hz_to_mel(F_MIN) + step * (loudest + 1) as f32);
        assert!((center - 1_000.0).abs() < 100.0, "band {loudest} centered at {center}");
    }
}
