//! Band power estimation
//!
//! Reduces one window of a recording to relative band powers averaged across
//! the selected EEG channels. The extractor only depends on the
//! [`BandPowerEstimator`] trait, so any estimator with the same input and
//! output shape can be plugged in.

use std::f64::consts::PI;

use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};

use crate::error::ExtractError;
use crate::recording::Recording;
use crate::types::{Band, BandPowers, FeatureVector, BAND_COUNT};

/// Smallest window the Welch estimator will accept
const MIN_SEGMENT_LEN: usize = 8;

/// Trend removal applied to each channel before spectral analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetrendMode {
    None,
    #[default]
    Constant,
    Linear,
}

/// Trait for band power estimators
pub trait BandPowerEstimator {
    /// Estimate band powers of `channels` over samples `[start, start + len)`
    fn estimate(
        &self,
        recording: &Recording,
        start: usize,
        len: usize,
        channels: &[usize],
    ) -> Result<BandPowers, ExtractError>;
}

/// Welch periodogram estimator backed by `rustfft`
#[derive(Debug, Clone, Copy, Default)]
pub struct WelchEstimator {
    detrend: DetrendMode,
}

impl WelchEstimator {
    pub fn new(detrend: DetrendMode) -> Self {
        Self { detrend }
    }

    /// Relative band powers of a single channel
    fn channel_powers(
        &self,
        planner: &mut FftPlanner<f64>,
        samples: &[f64],
        sampling_rate: u32,
    ) -> Result<FeatureVector, ExtractError> {
        if let Some(bad) = samples.iter().find(|v| !v.is_finite()) {
            return Err(ExtractError::EstimationError(format!(
                "non-finite sample {}",
                bad
            )));
        }

        let signal = detrend(samples, self.detrend);
        let nfft = segment_len(sampling_rate, signal.len())?;
        let psd = welch_psd(planner, &signal, nfft, sampling_rate as f64);
        let resolution = sampling_rate as f64 / nfft as f64;

        let mut absolute = [0.0; BAND_COUNT];
        for (slot, band) in absolute.iter_mut().zip(Band::ALL) {
            let (low, high) = band.range_hz();
            *slot = integrate(&psd, resolution, low, high);
        }

        let total: f64 = absolute.iter().sum();
        if total > 0.0 && total.is_finite() {
            Ok(absolute.map(|p| p / total))
        } else {
            Ok([0.0; BAND_COUNT])
        }
    }
}

impl BandPowerEstimator for WelchEstimator {
    fn estimate(
        &self,
        recording: &Recording,
        start: usize,
        len: usize,
        channels: &[usize],
    ) -> Result<BandPowers, ExtractError> {
        if channels.is_empty() {
            return Err(ExtractError::NoChannels);
        }

        let mut planner = FftPlanner::new();
        let mut per_channel = Vec::with_capacity(channels.len());

        for &channel in channels {
            let samples = recording.slice(channel, start, len).ok_or_else(|| {
                ExtractError::EstimationError(format!(
                    "window [{}, {}) of channel {} is outside the recording",
                    start,
                    start.saturating_add(len),
                    channel
                ))
            })?;
            per_channel.push(self.channel_powers(&mut planner, samples, recording.sampling_rate())?);
        }

        Ok(aggregate(&per_channel))
    }
}

/// Mean and population standard deviation per band across channels
fn aggregate(per_channel: &[FeatureVector]) -> BandPowers {
    let n = per_channel.len() as f64;
    let mut avg = [0.0; BAND_COUNT];
    let mut std = [0.0; BAND_COUNT];

    for powers in per_channel {
        for (acc, p) in avg.iter_mut().zip(powers) {
            *acc += p / n;
        }
    }
    for powers in per_channel {
        for ((acc, p), mean) in std.iter_mut().zip(powers).zip(&avg) {
            *acc += (p - mean).powi(2) / n;
        }
    }

    BandPowers {
        avg,
        std: std.map(f64::sqrt),
    }
}

fn detrend(samples: &[f64], mode: DetrendMode) -> Vec<f64> {
    match mode {
        DetrendMode::None => samples.to_vec(),
        DetrendMode::Constant => {
            let mean = samples.iter().sum::<f64>() / samples.len() as f64;
            samples.iter().map(|v| v - mean).collect()
        }
        DetrendMode::Linear => {
            let n = samples.len() as f64;
            let x_mean = (n - 1.0) / 2.0;
            let y_mean = samples.iter().sum::<f64>() / n;

            let (mut cov, mut var) = (0.0, 0.0);
            for (i, y) in samples.iter().enumerate() {
                let dx = i as f64 - x_mean;
                cov += dx * (y - y_mean);
                var += dx * dx;
            }
            let slope = if var > 0.0 { cov / var } else { 0.0 };

            samples
                .iter()
                .enumerate()
                .map(|(i, y)| y - (y_mean + slope * (i as f64 - x_mean)))
                .collect()
        }
    }
}

/// Segment length: the power of two nearest the sampling rate, capped by the window
fn segment_len(sampling_rate: u32, available: usize) -> Result<usize, ExtractError> {
    if available < MIN_SEGMENT_LEN {
        return Err(ExtractError::EstimationError(format!(
            "window of {} samples is too short",
            available
        )));
    }

    let rate = sampling_rate.max(1) as usize;
    let upper = rate.next_power_of_two();
    let lower = upper / 2;
    let nearest = if lower > 0 && rate - lower < upper - rate {
        lower
    } else {
        upper
    };

    // Largest power of two that still fits in the window
    let fit = 1usize << (usize::BITS - 1 - available.leading_zeros());
    Ok(nearest.min(fit).max(MIN_SEGMENT_LEN))
}

fn hann_window(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f64 / (size - 1) as f64).cos()))
        .collect()
}

/// One-sided Welch power spectral density with 50 % overlapping Hann segments
fn welch_psd(planner: &mut FftPlanner<f64>, signal: &[f64], nfft: usize, fs: f64) -> Vec<f64> {
    let fft = planner.plan_fft_forward(nfft);
    let window = hann_window(nfft);
    let window_power: f64 = window.iter().map(|w| w * w).sum();
    let step = (nfft / 2).max(1);
    let n_freqs = nfft / 2 + 1;

    let mut buffer = vec![Complex::new(0.0, 0.0); nfft];
    let mut scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
    let mut psd = vec![0.0; n_freqs];
    let mut segments = 0usize;

    let mut offset = 0;
    while offset + nfft <= signal.len() {
        for (slot, (&s, &w)) in buffer
            .iter_mut()
            .zip(signal[offset..offset + nfft].iter().zip(&window))
        {
            *slot = Complex::new(s * w, 0.0);
        }
        fft.process_with_scratch(&mut buffer, &mut scratch);

        for (k, (acc, c)) in psd.iter_mut().zip(&buffer[..n_freqs]).enumerate() {
            let mut power = c.norm_sqr() / (fs * window_power);
            // Fold negative frequencies except DC and Nyquist
            if k != 0 && !(nfft % 2 == 0 && k == nfft / 2) {
                power *= 2.0;
            }
            *acc += power;
        }

        segments += 1;
        offset += step;
    }

    if segments > 0 {
        for p in psd.iter_mut() {
            *p /= segments as f64;
        }
    }
    psd
}

/// Trapezoidal integral of the PSD over `[low, high]` Hz
fn integrate(psd: &[f64], resolution: f64, low: f64, high: f64) -> f64 {
    let first = (low / resolution).ceil() as usize;
    let last = ((high / resolution).floor() as usize).min(psd.len().saturating_sub(1));

    if first > last {
        return 0.0;
    }
    if first == last {
        return psd[first] * resolution;
    }

    psd[first..=last]
        .windows(2)
        .map(|pair| 0.5 * (pair[0] + pair[1]) * resolution)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sampling_rate: u32, len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f64 / sampling_rate as f64).sin())
            .collect()
    }

    fn recording_of(rows: Vec<Vec<f64>>, sampling_rate: u32) -> Recording {
        Recording::new(rows, sampling_rate).unwrap()
    }

    #[test]
    fn test_segment_len() {
        assert_eq!(segment_len(250, 1000).unwrap(), 256);
        assert_eq!(segment_len(256, 1024).unwrap(), 256);
        assert_eq!(segment_len(200, 800).unwrap(), 256);
        assert_eq!(segment_len(250, 100).unwrap(), 64);
        assert!(segment_len(250, 4).is_err());
    }

    #[test]
    fn test_relative_powers_sum_to_one() {
        let rate = 250;
        let signal: Vec<f64> = sine(6.0, rate, 1000)
            .iter()
            .zip(sine(20.0, rate, 1000))
            .map(|(a, b)| a + 0.5 * b)
            .collect();
        let recording = recording_of(vec![signal], rate);

        let powers = WelchEstimator::default()
            .estimate(&recording, 0, 1000, &[0])
            .unwrap();

        let total: f64 = powers.avg.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_alpha_sine_dominates_alpha_band() {
        let rate = 250;
        let recording = recording_of(vec![sine(10.0, rate, 1000)], rate);

        let powers = WelchEstimator::default()
            .estimate(&recording, 0, 1000, &[0])
            .unwrap();

        let alpha = powers.avg[2];
        assert!(alpha > 0.9, "alpha share was {}", alpha);
        assert!(powers.avg.iter().all(|p| *p >= 0.0));
    }

    #[test]
    fn test_average_and_std_across_channels() {
        let rate = 256;
        let recording = recording_of(
            vec![
                vec![0.0; 1024],
                sine(10.0, rate, 1024),
                sine(10.0, rate, 1024),
            ],
            rate,
        );

        let powers = WelchEstimator::default()
            .estimate(&recording, 0, 1024, &[1, 2])
            .unwrap();
        assert!(powers.avg[2] > 0.9);
        assert!(powers.std.iter().all(|s| s.abs() < 1e-12));
    }

    #[test]
    fn test_flat_channel_yields_zero_powers() {
        let recording = recording_of(vec![vec![3.0; 512]], 250);
        let powers = WelchEstimator::default()
            .estimate(&recording, 0, 512, &[0])
            .unwrap();
        assert_eq!(powers.avg, [0.0; BAND_COUNT]);
    }

    #[test]
    fn test_window_outside_recording_fails() {
        let recording = recording_of(vec![vec![0.0; 100]], 250);
        let result = WelchEstimator::default().estimate(&recording, 50, 100, &[0]);
        assert!(matches!(result, Err(ExtractError::EstimationError(_))));
    }

    #[test]
    fn test_non_finite_samples_fail() {
        let mut samples = sine(10.0, 250, 512);
        samples[7] = f64::NAN;
        let recording = recording_of(vec![samples], 250);
        assert!(WelchEstimator::default()
            .estimate(&recording, 0, 512, &[0])
            .is_err());
    }

    #[test]
    fn test_linear_detrend_removes_ramp() {
        let ramp: Vec<f64> = (0..100).map(|i| 3.0 + 0.5 * i as f64).collect();
        let residual = detrend(&ramp, DetrendMode::Linear);
        assert!(residual.iter().all(|r| r.abs() < 1e-9));
    }
}
