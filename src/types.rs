//! Core types for the NeuroFlux pipeline
//!
//! This module defines the data structures that flow through each stage of
//! dataset preparation: class labels, frequency bands, feature vectors and the
//! labeled windows emitted by the extractor.

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// Number of canonical frequency bands, and therefore the feature dimensionality
pub const BAND_COUNT: usize = 5;

/// Average relative band power for one window, ordered as [`Band::ALL`]
pub type FeatureVector = [f64; BAND_COUNT];

/// Binary class label
///
/// `First` is encoded as 0 and `Second` as 1 in persisted datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    First,
    Second,
}

impl Label {
    pub fn as_u8(&self) -> u8 {
        match self {
            Label::First => 0,
            Label::Second => 1,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Label::First),
            1 => Some(Label::Second),
            _ => None,
        }
    }
}

/// Canonical EEG frequency band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Delta,
    Theta,
    Alpha,
    Beta,
    Gamma,
}

impl Band {
    /// All bands in feature-vector order
    pub const ALL: [Band; BAND_COUNT] = [
        Band::Delta,
        Band::Theta,
        Band::Alpha,
        Band::Beta,
        Band::Gamma,
    ];

    /// Frequency range in Hz (low, high)
    pub fn range_hz(&self) -> (f64, f64) {
        match self {
            Band::Delta => (2.0, 4.0),
            Band::Theta => (4.0, 8.0),
            Band::Alpha => (8.0, 13.0),
            Band::Beta => (13.0, 30.0),
            Band::Gamma => (30.0, 45.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Delta => "delta",
            Band::Theta => "theta",
            Band::Alpha => "alpha",
            Band::Beta => "beta",
            Band::Gamma => "gamma",
        }
    }
}

/// Band powers aggregated across the selected channels of one window
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BandPowers {
    /// Mean relative power per band across channels
    pub avg: FeatureVector,
    /// Standard deviation of the relative power per band across channels
    pub std: FeatureVector,
}

/// A single (feature vector, label) pair produced by the extractor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledWindow {
    pub features: FeatureVector,
    pub label: Label,
}

/// How the two class directories are named under the data root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassLayout {
    /// `<metric>` is the first class and `not_<metric>` the second
    Metric { name: String },
    /// Explicit directory names for both classes
    Pair { first: String, second: String },
}

impl ClassLayout {
    pub fn metric(name: impl Into<String>) -> Result<Self, ExtractError> {
        let name = name.into();
        validate_class_name(&name)?;
        Ok(ClassLayout::Metric { name })
    }

    pub fn pair(first: impl Into<String>, second: impl Into<String>) -> Result<Self, ExtractError> {
        let (first, second) = (first.into(), second.into());
        validate_class_name(&first)?;
        validate_class_name(&second)?;
        if first == second {
            return Err(ExtractError::InvalidLayout(format!(
                "both classes use directory '{}'",
                first
            )));
        }
        Ok(ClassLayout::Pair { first, second })
    }

    /// Directory name of the first class (label 0)
    pub fn first_class(&self) -> String {
        match self {
            ClassLayout::Metric { name } => name.clone(),
            ClassLayout::Pair { first, .. } => first.clone(),
        }
    }

    /// Directory name of the second class (label 1)
    pub fn second_class(&self) -> String {
        match self {
            ClassLayout::Metric { name } => format!("not_{}", name),
            ClassLayout::Pair { second, .. } => second.clone(),
        }
    }

    /// Class directories paired with their labels, first class first
    pub fn classes(&self) -> [(String, Label); 2] {
        [
            (self.first_class(), Label::First),
            (self.second_class(), Label::Second),
        ]
    }
}

fn validate_class_name(name: &str) -> Result<(), ExtractError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ExtractError::InvalidLayout("class name is empty".to_string()));
    }
    if trimmed != name || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(ExtractError::InvalidLayout(format!(
            "'{}' is not a plain directory name",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_encoding() {
        assert_eq!(Label::First.as_u8(), 0);
        assert_eq!(Label::Second.as_u8(), 1);
        assert_eq!(Label::from_u8(1), Some(Label::Second));
        assert_eq!(Label::from_u8(2), None);
    }

    #[test]
    fn test_band_ranges_are_contiguous() {
        for pair in Band::ALL.windows(2) {
            assert_eq!(pair[0].range_hz().1, pair[1].range_hz().0);
        }
    }

    #[test]
    fn test_metric_layout() {
        let layout = ClassLayout::metric("focused").unwrap();
        assert_eq!(layout.first_class(), "focused");
        assert_eq!(layout.second_class(), "not_focused");
        assert_eq!(layout.classes()[1].1, Label::Second);
    }

    #[test]
    fn test_pair_layout() {
        let layout = ClassLayout::pair("relaxed", "focused").unwrap();
        assert_eq!(layout.first_class(), "relaxed");
        assert_eq!(layout.second_class(), "focused");
    }

    #[test]
    fn test_layout_rejects_bad_names() {
        assert!(ClassLayout::metric("").is_err());
        assert!(ClassLayout::metric("../up").is_err());
        assert!(ClassLayout::metric(" padded").is_err());
        assert!(ClassLayout::pair("same", "same").is_err());
    }
}
