//! Sliding window planning
//!
//! Each window length is paired with an overlap fraction; shorter windows
//! advance in smaller steps, so a single recording contributes many
//! differently-sized samples.

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// Default window lengths in seconds and their overlap fractions
pub const DEFAULT_WINDOWS: [WindowSpec; 7] = [
    WindowSpec::new(4.0, 0.5),
    WindowSpec::new(5.0, 0.475),
    WindowSpec::new(6.0, 0.45),
    WindowSpec::new(7.0, 0.425),
    WindowSpec::new(8.0, 0.4),
    WindowSpec::new(9.0, 0.375),
    WindowSpec::new(10.0, 0.35),
];

/// One window length and the fraction of it used as the step between starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub seconds: f64,
    pub overlap: f64,
}

impl WindowSpec {
    pub const fn new(seconds: f64, overlap: f64) -> Self {
        Self { seconds, overlap }
    }

    /// Window length in samples, floor(seconds × rate)
    pub fn length_samples(&self, sampling_rate: u32) -> usize {
        (self.seconds * sampling_rate as f64) as usize
    }

    /// Distance between consecutive starts, floor(seconds × overlap × rate)
    pub fn step_samples(&self, sampling_rate: u32) -> usize {
        (self.seconds * self.overlap * sampling_rate as f64) as usize
    }

    /// Check the spec yields a non-empty window and a non-zero step
    pub fn validate(&self, sampling_rate: u32) -> Result<(), ExtractError> {
        if !(self.seconds.is_finite() && self.seconds > 0.0) {
            return Err(ExtractError::InvalidConfig(format!(
                "window length {}s must be positive",
                self.seconds
            )));
        }
        if !(self.overlap > 0.0 && self.overlap <= 1.0) {
            return Err(ExtractError::InvalidConfig(format!(
                "overlap {} for {}s windows must be in (0, 1]",
                self.overlap, self.seconds
            )));
        }
        if self.length_samples(sampling_rate) == 0 || self.step_samples(sampling_rate) == 0 {
            return Err(ExtractError::InvalidConfig(format!(
                "{}s windows with overlap {} are shorter than one sample at {} Hz",
                self.seconds, self.overlap, sampling_rate
            )));
        }
        Ok(())
    }
}

/// Where the last window of a pass may end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryRule {
    /// A window must end strictly before the last sample index + 1
    #[default]
    Exclusive,
    /// A window may end exactly at the end of the recording
    Inclusive,
}

impl BoundaryRule {
    fn fits(&self, end: usize, total_samples: usize) -> bool {
        match self {
            BoundaryRule::Exclusive => end < total_samples,
            BoundaryRule::Inclusive => end <= total_samples,
        }
    }
}

/// A window spec resolved against a sampling rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlan {
    pub length: usize,
    pub step: usize,
    pub boundary: BoundaryRule,
}

impl WindowPlan {
    pub fn new(
        spec: &WindowSpec,
        sampling_rate: u32,
        boundary: BoundaryRule,
    ) -> Result<Self, ExtractError> {
        spec.validate(sampling_rate)?;
        Ok(Self {
            length: spec.length_samples(sampling_rate),
            step: spec.step_samples(sampling_rate),
            boundary,
        })
    }

    /// Start positions of every window in a recording of `total_samples`
    pub fn starts(&self, total_samples: usize) -> Vec<usize> {
        let mut starts = Vec::new();
        let mut position = 0usize;

        while let Some(end) = position.checked_add(self.length) {
            if !self.boundary.fits(end, total_samples) {
                break;
            }
            starts.push(position);
            position += self.step;
        }

        starts
    }
}
