//! Pipeline orchestration
//!
//! This module provides the public API for NeuroFlux. It walks the two class
//! directories under a data root and turns every recording into labeled
//! windows:
//!
//! 1. RecordingSource - Read the raw session file
//! 2. Channel selection - Drop blacklisted electrodes
//! 3. WindowedFeatureExtractor - Slice and reduce windows to band powers
//! 4. Dataset - Accumulate (feature vector, label) pairs

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info};

use crate::bandpower::{BandPowerEstimator, WelchEstimator};
use crate::board::BoardId;
use crate::channels::select_eeg_channels;
use crate::config::ExtractionConfig;
use crate::dataset::{ClassNames, Dataset, DatasetFile};
use crate::error::ExtractError;
use crate::extractor::WindowedFeatureExtractor;
use crate::recording::{BrainFlowFileSource, RecordingSource};
use crate::types::{ClassLayout, Label};

/// A file that contributed no windows because it failed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Summary of a dataset build
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildReport {
    pub files_read: usize,
    pub skipped: Vec<SkippedFile>,
    pub first_class_windows: usize,
    pub second_class_windows: usize,
}

/// Result of a dataset build
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub dataset: Dataset,
    pub channels: Vec<usize>,
    pub report: BuildReport,
}

impl BuildOutput {
    /// Wrap the dataset with provenance for persistence
    pub fn to_file(&self, board: BoardId, layout: &ClassLayout) -> DatasetFile {
        DatasetFile::new(
            &self.dataset,
            board,
            ClassNames {
                first: layout.first_class(),
                second: layout.second_class(),
            },
            self.channels.clone(),
        )
    }
}

/// Builds a labeled dataset from per-class directories of recordings.
pub struct DatasetBuilder<S = BrainFlowFileSource, E = WelchEstimator> {
    board: BoardId,
    layout: ClassLayout,
    source: S,
    extractor: WindowedFeatureExtractor<E>,
}

impl DatasetBuilder {
    /// Create a builder reading BrainFlow files with the Welch estimator
    pub fn new(board: BoardId, layout: ClassLayout, config: ExtractionConfig) -> Self {
        Self {
            board,
            layout,
            source: BrainFlowFileSource,
            extractor: WindowedFeatureExtractor::new(config),
        }
    }
}

impl<S: RecordingSource, E: BandPowerEstimator> DatasetBuilder<S, E> {
    /// Create a builder from explicit collaborators
    pub fn with_parts(
        board: BoardId,
        layout: ClassLayout,
        source: S,
        extractor: WindowedFeatureExtractor<E>,
    ) -> Self {
        Self {
            board,
            layout,
            source,
            extractor,
        }
    }

    /// Read every file of both classes under `data_root`.
    ///
    /// Files that fail to read or extract are logged and skipped. A missing
    /// class directory, an invalid configuration or an empty channel
    /// selection aborts the build.
    pub fn build(&self, data_root: &Path) -> Result<BuildOutput, ExtractError> {
        let descriptor = self.board.descriptor();
        let sampling_rate = descriptor.sampling_rate;
        self.extractor.config().validate(sampling_rate)?;

        let channels = select_eeg_channels(descriptor, &self.extractor.config().blacklist);
        if channels.is_empty() {
            return Err(ExtractError::NoChannels);
        }
        info!(sampling_rate, channels = ?channels, board = %self.board, "preparing dataset");

        let mut dataset = Dataset::new();
        let mut report = BuildReport::default();

        for (class_dir, label) in self.layout.classes() {
            let dir = data_root.join(&class_dir);
            info!(dir = %dir.display(), label = label.as_u8(), "reading class directory");

            for path in list_files(&dir)? {
                report.files_read += 1;

                let result = self
                    .source
                    .read(&path, sampling_rate)
                    .and_then(|recording| self.extractor.extract(&recording, label, &channels));

                match result {
                    Ok(windows) => {
                        info!(file = %path.display(), windows = windows.len(), "extracted windows");
                        match label {
                            Label::First => report.first_class_windows += windows.len(),
                            Label::Second => report.second_class_windows += windows.len(),
                        }
                        dataset.extend(windows);
                    }
                    Err(e) => {
                        error!(file = %path.display(), error = %e, "skipping file");
                        report.skipped.push(SkippedFile {
                            path,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        info!(
            first_class = report.first_class_windows,
            second_class = report.second_class_windows,
            skipped = report.skipped.len(),
            "1st Class: {} 2nd Class: {}",
            report.first_class_windows,
            report.second_class_windows
        );

        Ok(BuildOutput {
            dataset,
            channels,
            report,
        })
    }
}

/// Regular files of a directory, sorted by name
fn list_files(dir: &Path) -> Result<Vec<PathBuf>, ExtractError> {
    let entries = fs::read_dir(dir).map_err(|e| ExtractError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ExtractError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}
