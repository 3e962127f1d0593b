//! Logic-analyzer capture checker (host only).
//!
//! Verifies a flashed board from a Saleae Logic 2 digital CSV export.
//! The export has a time column followed by one column per channel and
//! one row per transition:
//!
//! ```text
//! Time [s],Channel 0,Channel 1,Channel 2,Channel 3,Channel 4,Channel 5,Channel 6
//! 0.000000000,1,0,0,0,0,0,0
//! 0.200012500,1,0,0,0,0,1,0
//! 0.200012750,1,0,0,0,0,1,0
//! ```
//!
//! [`analyze`] runs every check the channel map allows and returns a
//! serialisable [`Report`].

mod checks;
mod report;
mod spi;

use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

pub use checks::{agreement, interval_stats, AgreementCheck, IntervalStats, Relation};
pub use report::{analyze, AnalysisConfig, ChannelMap, CheckResult, Report, SpiSummary, Status};
pub use spi::{decode_spi, SpiChannels, SpiFrame};

/// Bit-packed levels limit the capture to this many channels.
pub const MAX_CHANNELS: usize = 64;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum CaptureError {
    Csv(csv::Error),
    Io(io::Error),
    /// Header has a time column but no channels.
    NoChannels,
    TooManyChannels(usize),
    /// No data rows.
    Empty,
    BadTime { row: usize, value: String },
    BadLevel { row: usize, column: usize, value: String },
    WrongWidth { row: usize, expected: usize, found: usize },
    TimeReversed { row: usize },
    ChannelOutOfRange { channel: usize, available: usize },
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv(e) => write!(f, "csv: {e}"),
            Self::Io(e) => write!(f, "io: {e}"),
            Self::NoChannels => write!(f, "capture has no channel columns"),
            Self::TooManyChannels(n) => {
                write!(f, "capture has {n} channels, at most {MAX_CHANNELS} supported")
            }
            Self::Empty => write!(f, "capture has no samples"),
            Self::BadTime { row, value } => write!(f, "row {row}: bad time {value:?}"),
            Self::BadLevel { row, column, value } => {
                write!(f, "row {row}, column {column}: bad level {value:?}")
            }
            Self::WrongWidth { row, expected, found } => {
                write!(f, "row {row}: expected {expected} fields, found {found}")
            }
            Self::TimeReversed { row } => write!(f, "row {row}: time goes backwards"),
            Self::ChannelOutOfRange { channel, available } => {
                write!(f, "channel {channel} mapped, capture has {available}")
            }
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Csv(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<csv::Error> for CaptureError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e)
    }
}

impl From<io::Error> for CaptureError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

/// One row of the export: the time and the level of every channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time_s: f64,
    levels: u64,
}

impl Sample {
    /// Level of `channel`. Channels past [`MAX_CHANNELS`] read low.
    pub fn level(&self, channel: usize) -> bool {
        channel < MAX_CHANNELS && (self.levels >> channel) & 1 == 1
    }
}

#[derive(Debug, Clone)]
pub struct Capture {
    channels: Vec<String>,
    samples: Vec<Sample>,
}

impl Capture {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        Self::from_reader(File::open(path)?)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, CaptureError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let channels: Vec<String> = headers.iter().skip(1).map(str::to_owned).collect();
        if channels.is_empty() {
            return Err(CaptureError::NoChannels);
        }
        if channels.len() > MAX_CHANNELS {
            return Err(CaptureError::TooManyChannels(channels.len()));
        }

        let width = channels.len() + 1;
        let mut samples = Vec::new();
        let mut last_time = f64::NEG_INFINITY;

        for (i, record) in reader.records().enumerate() {
            let record = record?;
            let row = i + 1;
            if record.len() != width {
                return Err(CaptureError::WrongWidth {
                    row,
                    expected: width,
                    found: record.len(),
                });
            }

            let time_s: f64 = record[0].parse().map_err(|_| CaptureError::BadTime {
                row,
                value: record[0].to_owned(),
            })?;
            if !time_s.is_finite() {
                return Err(CaptureError::BadTime {
                    row,
                    value: record[0].to_owned(),
                });
            }
            if time_s < last_time {
                return Err(CaptureError::TimeReversed { row });
            }
            last_time = time_s;

            let mut levels = 0u64;
            for (column, field) in record.iter().skip(1).enumerate() {
                match field {
                    "0" => {}
                    "1" => levels |= 1 << column,
                    other => {
                        return Err(CaptureError::BadLevel {
                            row,
                            column: column + 1,
                            value: other.to_owned(),
                        });
                    }
                }
            }
            samples.push(Sample { time_s, levels });
        }

        if samples.is_empty() {
            return Err(CaptureError::Empty);
        }
        Ok(Self { channels, samples })
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel_names(&self) -> &[String] {
        &self.channels
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Time from the first to the last row.
    pub fn duration_s(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.time_s - first.time_s,
            _ => 0.0,
        }
    }

    /// Times at which `channel` changes level. The first row sets the
    /// initial level and is not an edge.
    pub fn edges(&self, channel: usize) -> Vec<f64> {
        self.samples
            .windows(2)
            .filter(|w| w[0].level(channel) != w[1].level(channel))
            .map(|w| w[1].time_s)
            .collect()
    }

    pub(crate) fn check_channel(&self, channel: usize) -> Result<(), CaptureError> {
        if channel < self.channels.len() {
            Ok(())
        } else {
            Err(CaptureError::ChannelOutOfRange {
                channel,
                available: self.channels.len(),
            })
        }
    }
}
