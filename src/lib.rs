//! NeuroFlux - Windowed EEG band-power features for mental-state classifiers
//!
//! NeuroFlux turns raw BrainFlow recordings into a labeled feature dataset
//! through a deterministic pipeline: recording source → channel selection →
//! sliding windows → band power reduction → dataset.
//!
//! ## Modules
//!
//! - **Extraction**: Window planning and band power reduction of single recordings
//! - **Dataset building**: Directory-driven labeling of both classes and persistence

pub mod bandpower;
pub mod board;
pub mod channels;
pub mod config;
pub mod dataset;
pub mod error;
pub mod extractor;
pub mod pipeline;
pub mod recording;
pub mod types;
pub mod window;

pub use bandpower::{BandPowerEstimator, DetrendMode, WelchEstimator};
pub use board::{BoardDescriptor, BoardId};
pub use channels::select_eeg_channels;
pub use config::ExtractionConfig;
pub use dataset::{Dataset, DatasetFile};
pub use error::ExtractError;
pub use extractor::WindowedFeatureExtractor;
pub use pipeline::{BuildReport, DatasetBuilder};
pub use recording::{BrainFlowFileSource, Recording, RecordingSource};
pub use types::{ClassLayout, FeatureVector, Label, LabeledWindow, BAND_COUNT};
pub use window::{BoundaryRule, WindowSpec, DEFAULT_WINDOWS};

/// NeuroFlux version embedded in every dataset file
pub const NEUROFLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for dataset files
pub const PRODUCER_NAME: &str = "neuroflux";
