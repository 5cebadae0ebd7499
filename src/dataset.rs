//! Labeled feature dataset
//!
//! The dataset keeps feature vectors and labels as two index-aligned
//! sequences, which is also the form handed to a model trainer on disk.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::board::BoardId;
use crate::error::ExtractError;
use crate::types::{FeatureVector, Label, LabeledWindow, BAND_COUNT};
use crate::{NEUROFLUX_VERSION, PRODUCER_NAME};

/// Format tag written into every dataset file
pub const DATASET_FORMAT: &str = "neuroflux.dataset.v1";

/// Append-only collection of (feature vector, label) pairs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    x: Vec<FeatureVector>,
    y: Vec<u8>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, features: FeatureVector, label: Label) {
        self.x.push(features);
        self.y.push(label.as_u8());
    }

    pub fn extend<I: IntoIterator<Item = LabeledWindow>>(&mut self, windows: I) {
        for window in windows {
            self.push(window.features, window.label);
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn features(&self) -> &[FeatureVector] {
        &self.x
    }

    pub fn labels(&self) -> &[u8] {
        &self.y
    }

    /// Number of samples per class (first, second)
    pub fn class_counts(&self) -> (usize, usize) {
        let second = self.y.iter().filter(|&&l| l == Label::Second.as_u8()).count();
        (self.y.len() - second, second)
    }

    /// Mean feature vector of one class, None if the class has no samples
    pub fn class_mean(&self, label: Label) -> Option<FeatureVector> {
        let mut sum = [0.0; BAND_COUNT];
        let mut count = 0usize;

        for (features, _) in self
            .x
            .iter()
            .zip(&self.y)
            .filter(|(_, &l)| l == label.as_u8())
        {
            for (acc, v) in sum.iter_mut().zip(features) {
                *acc += v;
            }
            count += 1;
        }

        (count > 0).then(|| sum.map(|s| s / count as f64))
    }

    /// Build a dataset from parallel sequences, checking the pairing invariants
    pub fn from_parts(x: Vec<Vec<f64>>, y: Vec<u8>) -> Result<Self, ExtractError> {
        if x.len() != y.len() {
            return Err(ExtractError::InvalidDataset(format!(
                "{} feature vectors but {} labels",
                x.len(),
                y.len()
            )));
        }
        if let Some(i) = y.iter().position(|&l| Label::from_u8(l).is_none()) {
            return Err(ExtractError::InvalidDataset(format!(
                "label {} at index {} is not 0 or 1",
                y[i], i
            )));
        }

        let x = x
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                FeatureVector::try_from(v.as_slice()).map_err(|_| {
                    ExtractError::InvalidDataset(format!(
                        "feature vector {} has {} values, expected {}",
                        i,
                        v.len(),
                        BAND_COUNT
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { x, y })
    }
}

/// Producer information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
}

/// Class directory names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassNames {
    pub first: String,
    pub second: String,
}

/// Persisted dataset with provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetFile {
    pub format: String,
    pub producer: Producer,
    pub dataset_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub board: BoardId,
    pub classes: ClassNames,
    pub channels: Vec<usize>,
    pub x: Vec<Vec<f64>>,
    pub y: Vec<u8>,
}

impl DatasetFile {
    pub fn new(
        dataset: &Dataset,
        board: BoardId,
        classes: ClassNames,
        channels: Vec<usize>,
    ) -> Self {
        Self {
            format: DATASET_FORMAT.to_string(),
            producer: Producer {
                name: PRODUCER_NAME.to_string(),
                version: NEUROFLUX_VERSION.to_string(),
            },
            dataset_id: Uuid::new_v4(),
            created_at: Utc::now(),
            board,
            classes,
            channels,
            x: dataset.x.iter().map(|v| v.to_vec()).collect(),
            y: dataset.y.clone(),
        }
    }

    /// Validate and convert back into a dataset
    pub fn dataset(&self) -> Result<Dataset, ExtractError> {
        if self.format != DATASET_FORMAT {
            return Err(ExtractError::InvalidDataset(format!(
                "unknown format '{}'",
                self.format
            )));
        }
        Dataset::from_parts(self.x.clone(), self.y.clone())
    }

    pub fn to_json(&self) -> Result<String, ExtractError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ExtractError> {
        let file: DatasetFile = serde_json::from_str(json)?;
        file.dataset()?;
        Ok(file)
    }

    pub fn save(&self, path: &Path) -> Result<(), ExtractError> {
        fs::write(path, self.to_json()?).map_err(|e| ExtractError::io(path, e))
    }

    pub fn load(path: &Path) -> Result<Self, ExtractError> {
        let json = fs::read_to_string(path).map_err(|e| ExtractError::io(path, e))?;
        Self::from_json(&json)
    }
}
