//! EEG channel selection
//!
//! Temporal leads pick up muscle artifacts, so callers may exclude electrodes by
//! name before features are computed.

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::board::BoardDescriptor;

/// Select the EEG channel rows of a board, dropping blacklisted electrode names.
///
/// Falls back to the full EEG channel list when the board has no usable
/// electrode names.
pub fn select_eeg_channels(board: &BoardDescriptor, blacklist: &BTreeSet<String>) -> Vec<usize> {
    let selected = match board.eeg_names {
        Some(names) if names.len() == board.eeg_channels.len() => board
            .eeg_channels
            .iter()
            .zip(names.iter())
            .filter(|(_, name)| !blacklist.contains(**name))
            .map(|(&channel, _)| channel)
            .collect(),
        Some(names) => {
            warn!(
                board = board.name,
                names = names.len(),
                channels = board.eeg_channels.len(),
                "EEG names do not match EEG channels, using all EEG channels"
            );
            board.eeg_channels.to_vec()
        }
        None => {
            warn!(
                board = board.name,
                "board has no EEG channel names, using all EEG channels"
            );
            board.eeg_channels.to_vec()
        }
    };

    info!(board = board.name, channels = ?selected, "channels to use");
    selected
}
