//! Supported acquisition boards
//!
//! Each headset the recordings may come from is a closed variant of [`BoardId`].
//! The descriptor carries the BrainFlow board id together with the layout of the
//! rows written by BrainFlow's `DataFilter.write_file`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// Board identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardId {
    Muse2,
    Cyton,
    Ganglion,
    Muse2016,
    Unicorn,
}

/// Static description of a board's data layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardDescriptor {
    /// BrainFlow `BoardIds` value
    pub brainflow_id: i32,
    /// Human-readable name
    pub name: &'static str,
    /// Samples per second per channel
    pub sampling_rate: u32,
    /// Row indices of the EEG channels in a recording
    pub eeg_channels: &'static [usize],
    /// Electrode names, index-aligned with `eeg_channels` (None if the board has none)
    pub eeg_names: Option<&'static [&'static str]>,
}

const MUSE_EEG_CHANNELS: &[usize] = &[1, 2, 3, 4];
const MUSE_EEG_NAMES: &[&str] = &["TP9", "AF7", "AF8", "TP10"];

const MUSE_2: BoardDescriptor = BoardDescriptor {
    brainflow_id: 22,
    name: "Muse 2",
    sampling_rate: 256,
    eeg_channels: MUSE_EEG_CHANNELS,
    eeg_names: Some(MUSE_EEG_NAMES),
};

const CYTON: BoardDescriptor = BoardDescriptor {
    brainflow_id: 0,
    name: "OpenBCI Cyton",
    sampling_rate: 250,
    eeg_channels: &[1, 2, 3, 4, 5, 6, 7, 8],
    eeg_names: Some(&["Fp1", "Fp2", "C3", "C4", "P7", "P8", "O1", "O2"]),
};

const GANGLION: BoardDescriptor = BoardDescriptor {
    brainflow_id: 1,
    name: "OpenBCI Ganglion",
    sampling_rate: 200,
    eeg_channels: &[1, 2, 3, 4],
    eeg_names: None,
};

const MUSE_2016: BoardDescriptor = BoardDescriptor {
    brainflow_id: 42,
    name: "Muse 2016",
    sampling_rate: 256,
    eeg_channels: MUSE_EEG_CHANNELS,
    eeg_names: Some(MUSE_EEG_NAMES),
};

const UNICORN: BoardDescriptor = BoardDescriptor {
    brainflow_id: 8,
    name: "g.tec Unicorn",
    sampling_rate: 250,
    eeg_channels: &[0, 1, 2, 3, 4, 5, 6, 7],
    eeg_names: Some(&["Fz", "C3", "Cz", "C4", "Pz", "PO7", "Oz", "PO8"]),
};

impl BoardId {
    /// All boards in menu order
    pub const ALL: [BoardId; 5] = [
        BoardId::Muse2,
        BoardId::Cyton,
        BoardId::Ganglion,
        BoardId::Muse2016,
        BoardId::Unicorn,
    ];

    pub fn descriptor(&self) -> &'static BoardDescriptor {
        match self {
            BoardId::Muse2 => &MUSE_2,
            BoardId::Cyton => &CYTON,
            BoardId::Ganglion => &GANGLION,
            BoardId::Muse2016 => &MUSE_2016,
            BoardId::Unicorn => &UNICORN,
        }
    }

    /// Stable slug used on the command line and in dataset files
    pub fn as_str(&self) -> &'static str {
        match self {
            BoardId::Muse2 => "muse2",
            BoardId::Cyton => "cyton",
            BoardId::Ganglion => "ganglion",
            BoardId::Muse2016 => "muse2016",
            BoardId::Unicorn => "unicorn",
        }
    }

    /// 1-based position in the board selection menu
    pub fn menu_number(&self) -> usize {
        Self::ALL
            .iter()
            .position(|b| b == self)
            .map(|i| i + 1)
            .unwrap_or_default()
    }

    /// Look up a board by its BrainFlow numeric id
    pub fn from_brainflow_id(id: i32) -> Result<Self, ExtractError> {
        Self::ALL
            .into_iter()
            .find(|b| b.descriptor().brainflow_id == id)
            .ok_or_else(|| ExtractError::UnsupportedBoard(format!("brainflow id {}", id)))
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts a slug (`muse2`), a menu number (`1`) or a BrainFlow id (`id:22`)
impl FromStr for BoardId {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();

        if let Some(id) = needle.strip_prefix("id:") {
            let id = id
                .trim()
                .parse::<i32>()
                .map_err(|_| ExtractError::UnsupportedBoard(s.to_string()))?;
            return Self::from_brainflow_id(id);
        }

        if let Ok(number) = needle.parse::<usize>() {
            return Self::ALL
                .into_iter()
                .find(|b| b.menu_number() == number)
                .ok_or_else(|| ExtractError::UnsupportedBoard(s.to_string()));
        }

        Self::ALL
            .into_iter()
            .find(|b| b.as_str() == needle)
            .ok_or_else(|| ExtractError::UnsupportedBoard(s.to_string()))
    }
}
