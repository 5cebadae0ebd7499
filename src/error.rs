//! Error types for NeuroFlux

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading recordings or extracting features
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed recording: {0}")]
    MalformedRecording(String),

    #[error("Invalid CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Channel {channel} out of range (recording has {available} rows)")]
    ChannelOutOfRange { channel: usize, available: usize },

    #[error("No EEG channels selected")]
    NoChannels,

    #[error("Unsupported board: {0}")]
    UnsupportedBoard(String),

    #[error("Invalid class layout: {0}")]
    InvalidLayout(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Band power estimation failed: {0}")]
    EstimationError(String),

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),
}

impl ExtractError {
    /// Wrap an I/O error together with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExtractError::Io {
            path: path.into(),
            source,
        }
    }
}
