//! Windowed feature extraction
//!
//! Slices a recording into overlapping windows for every configured window
//! length and reduces each window to a labeled band-power feature vector.

use tracing::debug;

use crate::bandpower::{BandPowerEstimator, WelchEstimator};
use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::recording::Recording;
use crate::types::{Label, LabeledWindow};
use crate::window::WindowSpec;

/// Extractor turning one recording into labeled feature vectors
pub struct WindowedFeatureExtractor<E = WelchEstimator> {
    config: ExtractionConfig,
    estimator: E,
}

impl Default for WindowedFeatureExtractor {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

impl WindowedFeatureExtractor {
    /// Create an extractor using the Welch estimator
    pub fn new(config: ExtractionConfig) -> Self {
        let estimator = WelchEstimator::new(config.detrend);
        Self { config, estimator }
    }
}

impl<E: BandPowerEstimator> WindowedFeatureExtractor<E> {
    /// Create an extractor with a custom band power estimator
    pub fn with_estimator(config: ExtractionConfig, estimator: E) -> Self {
        Self { config, estimator }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract every window of `recording`.
    ///
    /// Passes run in window-table order and windows in increasing time order
    /// within a pass. Either every window is returned or an error is.
    pub fn extract(
        &self,
        recording: &Recording,
        label: Label,
        channels: &[usize],
    ) -> Result<Vec<LabeledWindow>, ExtractError> {
        recording.ensure_channels(channels)?;
        let sampling_rate = recording.sampling_rate();
        let plans = self.config.plans(sampling_rate)?;
        let total = recording.sample_count();

        let mut windows = Vec::new();
        for (spec, plan) in self.config.windows.iter().zip(&plans) {
            let starts = plan.starts(total);
            debug!(
                seconds = spec.seconds,
                overlap = spec.overlap,
                windows = starts.len(),
                "window pass"
            );

            for start in starts {
                let powers = self
                    .estimator
                    .estimate(recording, start, plan.length, channels)?;
                windows.push(LabeledWindow {
                    features: powers.avg,
                    label,
                });
            }
        }

        Ok(windows)
    }

    /// Number of windows `extract` would emit for a recording length
    pub fn window_count(
        &self,
        total_samples: usize,
        sampling_rate: u32,
    ) -> Result<usize, ExtractError> {
        Ok(self
            .config
            .plans(sampling_rate)?
            .iter()
            .map(|plan| plan.starts(total_samples).len())
            .sum())
    }

    /// Window specs paired with their start positions for a recording length
    pub fn schedule(
        &self,
        total_samples: usize,
        sampling_rate: u32,
    ) -> Result<Vec<(WindowSpec, Vec<usize>)>, ExtractError> {
        let plans = self.config.plans(sampling_rate)?;
        Ok(self
            .config
            .windows
            .iter()
            .zip(plans)
            .map(|(spec, plan)| (*spec, plan.starts(total_samples)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BandPowers, BAND_COUNT};
    use crate::window::{BoundaryRule, WindowSpec};
    use std::cell::RefCell;
    use std::f64::consts::PI;

    /// Records every window it is asked for
    #[derive(Default)]
    struct RecordingEstimator {
        calls: RefCell<Vec<(usize, usize)>>,
    }

    impl BandPowerEstimator for RecordingEstimator {
        fn estimate(
            &self,
            _recording: &Recording,
            start: usize,
            len: usize,
            _channels: &[usize],
        ) -> Result<BandPowers, ExtractError> {
            self.calls.borrow_mut().push((start, len));
            Ok(BandPowers::default())
        }
    }

    /// Fails on the n-th window
    struct FailingEstimator {
        fail_at: usize,
        seen: RefCell<usize>,
    }

    impl BandPowerEstimator for FailingEstimator {
        fn estimate(
            &self,
            _recording: &Recording,
            _start: usize,
            _len: usize,
            _channels: &[usize],
        ) -> Result<BandPowers, ExtractError> {
            let mut seen = self.seen.borrow_mut();
            *seen += 1;
            if *seen == self.fail_at {
                Err(ExtractError::EstimationError("boom".to_string()))
            } else {
                Ok(BandPowers::default())
            }
        }
    }

    fn eeg_recording(seconds: usize, rate: u32) -> Recording {
        let len = seconds * rate as usize;
        let rows = (0..5)
            .map(|ch| {
                (0..len)
                    .map(|i| {
                        let t = i as f64 / rate as f64;
                        (2.0 * PI * (6.0 + ch as f64 * 3.0) * t).sin()
                            + 0.3 * (2.0 * PI * 21.0 * t).sin()
                    })
                    .collect()
            })
            .collect();
        Recording::new(rows, rate).unwrap()
    }

    #[test]
    fn test_ten_second_recording_first_pass() {
        let config = ExtractionConfig {
            windows: vec![WindowSpec::new(4.0, 0.5)],
            ..Default::default()
        };
        let extractor = WindowedFeatureExtractor::with_estimator(config, RecordingEstimator::default());
        let recording = Recording::new(vec![vec![0.0; 2500]; 2], 250).unwrap();

        let windows = extractor.extract(&recording, Label::First, &[1]).unwrap();

        assert_eq!(windows.len(), 3);
        assert_eq!(
            *extractor.estimator.calls.borrow(),
            vec![(0, 1000), (500, 1000), (1000, 1000)]
        );
    }

    #[test]
    fn test_passes_run_in_table_order() {
        let extractor = WindowedFeatureExtractor::with_estimator(
            ExtractionConfig::default(),
            RecordingEstimator::default(),
        );
        let recording = Recording::new(vec![vec![0.0; 3000]], 250).unwrap();

        let windows = extractor.extract(&recording, Label::Second, &[0]).unwrap();
        let calls = extractor.estimator.calls.borrow();

        assert_eq!(windows.len(), calls.len());
        assert_eq!(windows.len(), extractor.window_count(3000, 250).unwrap());
        assert!(calls.windows(2).all(|w| w[0].1 <= w[1].1));
        // a single 10 s window fits in 3000 samples
        assert_eq!(calls.last().copied(), Some((0, 2500)));
    }

    #[test]
    fn test_short_recording_emits_nothing() {
        let extractor = WindowedFeatureExtractor::new(ExtractionConfig::default());
        let recording = eeg_recording(3, 250);
        let windows = extractor.extract(&recording, Label::First, &[1, 2]).unwrap();
        assert!(windows.is_empty());
    }

    #[test]
    fn test_features_and_labels() {
        let extractor = WindowedFeatureExtractor::new(ExtractionConfig::default());
        let recording = eeg_recording(12, 250);

        let windows = extractor.extract(&recording, Label::Second, &[1, 2, 3]).unwrap();

        assert!(!windows.is_empty());
        for window in &windows {
            assert_eq!(window.features.len(), BAND_COUNT);
            assert_eq!(window.label, Label::Second);
            assert_eq!(window.label.as_u8(), 1);
        }
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = WindowedFeatureExtractor::new(ExtractionConfig::default());
        let recording = eeg_recording(11, 256);

        let first = extractor.extract(&recording, Label::First, &[1, 2, 3, 4]).unwrap();
        let second = extractor.extract(&recording, Label::First, &[1, 2, 3, 4]).unwrap();

        let bits = |w: &[LabeledWindow]| -> Vec<u64> {
            w.iter()
                .flat_map(|lw| lw.features.iter().map(|f| f.to_bits()))
                .collect()
        };
        assert_eq!(bits(&first), bits(&second));
    }

    #[test]
    fn test_failure_discards_whole_recording() {
        let estimator = FailingEstimator {
            fail_at: 2,
            seen: RefCell::new(0),
        };
        let extractor = WindowedFeatureExtractor::with_estimator(ExtractionConfig::default(), estimator);
        let recording = Recording::new(vec![vec![0.0; 5000]], 250).unwrap();

        assert!(extractor.extract(&recording, Label::First, &[0]).is_err());
    }

    #[test]
    fn test_rejects_missing_channels() {
        let extractor = WindowedFeatureExtractor::new(ExtractionConfig::default());
        let recording = eeg_recording(5, 250);
        assert!(matches!(
            extractor.extract(&recording, Label::First, &[9]),
            Err(ExtractError::ChannelOutOfRange { .. })
        ));
        assert!(matches!(
            extractor.extract(&recording, Label::First, &[]),
            Err(ExtractError::NoChannels)
        ));
    }

    #[test]
    fn test_inclusive_boundary_schedule() {
        let config = ExtractionConfig {
            boundary: BoundaryRule::Inclusive,
            ..Default::default()
        };
        let extractor = WindowedFeatureExtractor::new(config);
        let schedule = extractor.schedule(2500, 250).unwrap();

        assert_eq!(schedule[0].1, vec![0, 500, 1000, 1500]);
        assert_eq!(schedule[6].1, vec![0]);
    }
}
