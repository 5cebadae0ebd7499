//! Extraction configuration
//!
//! Every field has a default, so a config file only needs the values it changes.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bandpower::DetrendMode;
use crate::error::ExtractError;
use crate::window::{BoundaryRule, WindowPlan, WindowSpec, DEFAULT_WINDOWS};

/// Electrodes excluded by default (temporal leads, prone to muscle artifacts)
pub const DEFAULT_BLACKLIST: [&str; 2] = ["T3", "T4"];

/// Settings for windowed feature extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Window lengths and overlaps, processed in order
    pub windows: Vec<WindowSpec>,
    /// End-of-recording rule shared by every pass
    pub boundary: BoundaryRule,
    /// Trend removal before spectral analysis
    pub detrend: DetrendMode,
    /// Electrode names to exclude
    pub blacklist: BTreeSet<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            windows: DEFAULT_WINDOWS.to_vec(),
            boundary: BoundaryRule::default(),
            detrend: DetrendMode::default(),
            blacklist: DEFAULT_BLACKLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ExtractionConfig {
    pub fn from_json(json: &str) -> Result<Self, ExtractError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ExtractError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self, ExtractError> {
        let json = fs::read_to_string(path).map_err(|e| ExtractError::io(path, e))?;
        Self::from_json(&json)
    }

    /// Check every window spec against a sampling rate
    pub fn validate(&self, sampling_rate: u32) -> Result<(), ExtractError> {
        if self.windows.is_empty() {
            return Err(ExtractError::InvalidConfig(
                "at least one window length is required".to_string(),
            ));
        }
        self.windows
            .iter()
            .try_for_each(|spec| spec.validate(sampling_rate))
    }

    /// Resolve the window table against a sampling rate
    pub fn plans(&self, sampling_rate: u32) -> Result<Vec<WindowPlan>, ExtractError> {
        self.validate(sampling_rate)?;
        self.windows
            .iter()
            .map(|spec| WindowPlan::new(spec, sampling_rate, self.boundary))
            .collect()
    }
}
