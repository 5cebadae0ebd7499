//! Recordings and the sources that read them
//!
//! BrainFlow's `DataFilter.write_file` stores one sample per line with the board
//! rows as tab-separated columns. [`BrainFlowFileSource`] reads that layout back
//! into a channel-major [`Recording`].

use std::fs::File;
use std::path::Path;

use tracing::debug;

use crate::error::ExtractError;

/// A raw multi-channel recording, channel-major and immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    channels: Vec<Vec<f64>>,
    sampling_rate: u32,
}

impl Recording {
    /// Build a recording from channel-major rows.
    ///
    /// Every row must have the same number of samples.
    pub fn new(channels: Vec<Vec<f64>>, sampling_rate: u32) -> Result<Self, ExtractError> {
        if sampling_rate == 0 {
            return Err(ExtractError::MalformedRecording(
                "sampling rate must be positive".to_string(),
            ));
        }
        if channels.is_empty() {
            return Err(ExtractError::MalformedRecording(
                "recording has no channels".to_string(),
            ));
        }

        let sample_count = channels[0].len();
        if let Some((row, ragged)) = channels
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != sample_count)
        {
            return Err(ExtractError::MalformedRecording(format!(
                "row {} has {} samples, expected {}",
                row,
                ragged.len(),
                sample_count
            )));
        }

        Ok(Self {
            channels,
            sampling_rate,
        })
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn sample_count(&self) -> usize {
        self.channels[0].len()
    }

    pub fn sampling_rate(&self) -> u32 {
        self.sampling_rate
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.sample_count() as f64 / self.sampling_rate as f64
    }

    pub fn channel(&self, index: usize) -> Option<&[f64]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Samples of one channel in `[start, start + len)`
    pub fn slice(&self, index: usize, start: usize, len: usize) -> Option<&[f64]> {
        let end = start.checked_add(len)?;
        self.channel(index).and_then(|c| c.get(start..end))
    }

    /// Check that every requested channel row exists
    pub fn ensure_channels(&self, channels: &[usize]) -> Result<(), ExtractError> {
        if channels.is_empty() {
            return Err(ExtractError::NoChannels);
        }
        match channels.iter().find(|&&c| c >= self.channel_count()) {
            Some(&channel) => Err(ExtractError::ChannelOutOfRange {
                channel,
                available: self.channel_count(),
            }),
            None => Ok(()),
        }
    }
}

/// Trait for anything that can produce a recording from a stored session
pub trait RecordingSource {
    /// Read the recording at `path`, sampled at `sampling_rate`
    fn read(&self, path: &Path, sampling_rate: u32) -> Result<Recording, ExtractError>;
}

/// Reader for files written by BrainFlow's `DataFilter.write_file`
#[derive(Debug, Clone, Copy, Default)]
pub struct BrainFlowFileSource;

impl BrainFlowFileSource {
    /// Parse tab-separated sample rows from any reader
    pub fn parse<R: std::io::Read>(
        &self,
        reader: R,
        sampling_rate: u32,
    ) -> Result<Recording, ExtractError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut channels: Vec<Vec<f64>> = Vec::new();

        for (line, record) in csv_reader.records().enumerate() {
            let record = record?;
            let mut values: Vec<&str> = record.iter().collect();
            // write_file ends every line with a delimiter
            if values.last() == Some(&"") {
                values.pop();
            }
            if values.is_empty() {
                continue;
            }
            if let Some(column) = values.iter().position(|v| v.is_empty()) {
                return Err(ExtractError::MalformedRecording(format!(
                    "line {}: column {} is empty",
                    line + 1,
                    column + 1
                )));
            }

            if channels.is_empty() {
                channels = vec![Vec::new(); values.len()];
            } else if values.len() != channels.len() {
                return Err(ExtractError::MalformedRecording(format!(
                    "line {} has {} columns, expected {}",
                    line + 1,
                    values.len(),
                    channels.len()
                )));
            }

            for (channel, raw) in channels.iter_mut().zip(values) {
                let value = raw.parse::<f64>().map_err(|e| {
                    ExtractError::MalformedRecording(format!(
                        "line {}: '{}' is not a number: {}",
                        line + 1,
                        raw,
                        e
                    ))
                })?;
                channel.push(value);
            }
        }

        if channels.is_empty() {
            return Err(ExtractError::MalformedRecording(
                "recording contains no samples".to_string(),
            ));
        }

        Recording::new(channels, sampling_rate)
    }
}

impl RecordingSource for BrainFlowFileSource {
    fn read(&self, path: &Path, sampling_rate: u32) -> Result<Recording, ExtractError> {
        let file = File::open(path).map_err(|e| ExtractError::io(path, e))?;
        let recording = self.parse(file, sampling_rate)?;
        debug!(
            path = %path.display(),
            channels = recording.channel_count(),
            samples = recording.sample_count(),
            seconds = recording.duration_secs(),
            "read recording"
        );
        Ok(recording)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_transposes_rows() {
        let data = "0.0\t1.5\t-2.0\n1.0\t2.5\t-3.0\n2.0\t3.5\t-4.0\n";
        let recording = BrainFlowFileSource.parse(data.as_bytes(), 250).unwrap();

        assert_eq!(recording.channel_count(), 3);
        assert_eq!(recording.sample_count(), 3);
        assert_eq!(recording.channel(1).unwrap(), &[1.5, 2.5, 3.5]);
        assert_eq!(recording.slice(2, 1, 2).unwrap(), &[-3.0, -4.0]);
    }

    #[test]
    fn test_parse_accepts_trailing_tab_and_blank_lines() {
        let data = "1.0\t2.0\t\n\n3.0\t4.0\t\n";
        let recording = BrainFlowFileSource.parse(data.as_bytes(), 200).unwrap();
        assert_eq!(recording.channel_count(), 2);
        assert_eq!(recording.sample_count(), 2);
    }

    #[test]
    fn test_parse_rejects_empty_middle_cell() {
        let data = "1\t\t3\n4\t\t6\n";
        let err = BrainFlowFileSource.parse(data.as_bytes(), 250).unwrap_err();
        match err {
            ExtractError::MalformedRecording(msg) => assert!(msg.contains("column 2"), "{}", msg),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_duration() {
        let recording = Recording::new(vec![vec![0.0; 500]; 2], 250).unwrap();
        assert_eq!(recording.duration_secs(), 2.0);
    }

    #[test]
    fn test_parse_rejects_ragged_rows() {
        let data = "1.0\t2.0\n3.0\n";
        let err = BrainFlowFileSource.parse(data.as_bytes(), 250).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedRecording(_)));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        let data = "1.0\tabc\n";
        assert!(BrainFlowFileSource.parse(data.as_bytes(), 250).is_err());
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(BrainFlowFileSource.parse("".as_bytes(), 250).is_err());
    }

    #[test]
    fn test_recording_rejects_zero_rate() {
        assert!(Recording::new(vec![vec![0.0; 4]], 0).is_err());
    }

    #[test]
    fn test_ensure_channels() {
        let recording = Recording::new(vec![vec![0.0; 4]; 3], 250).unwrap();
        assert!(recording.ensure_channels(&[0, 2]).is_ok());
        assert!(matches!(
            recording.ensure_channels(&[3]),
            Err(ExtractError::ChannelOutOfRange { channel: 3, available: 3 })
        ));
        assert!(matches!(
            recording.ensure_channels(&[]),
            Err(ExtractError::NoChannels)
        ));
    }

    #[test]
    fn test_read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0\t10\t20").unwrap();
        writeln!(file, "1\t11\t21").unwrap();

        let recording = BrainFlowFileSource.read(file.path(), 256).unwrap();
        assert_eq!(recording.sampling_rate(), 256);
        assert_eq!(recording.channel(2).unwrap(), &[20.0, 21.0]);
    }

    #[test]
    fn test_read_missing_file() {
        let err = BrainFlowFileSource
            .read(Path::new("/definitely/not/here.csv"), 250)
            .unwrap_err();
        assert!(matches!(err, ExtractError::Io { .. }));
    }
}
