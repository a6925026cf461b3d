//! Error types for the SLA engine.
//!
//! Every fallible entry point returns one of these explicitly; there are no
//! sentinel ratios. Both input errors are terminal for the call that produced
//! them: the caller fixes the input and calls again.

use crate::config::ConfigError;
use thiserror::Error;

/// Malformed construction input for [`crate::UptimeSlaCalculator`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("start time is negative: {0}")]
    NegativeStartTime(i64),

    #[error("end time is negative: {0}")]
    NegativeEndTime(i64),

    #[error("timestamp array is empty")]
    EmptyTimestamps,

    #[error("start time {start_time} is after the first timestamp {first_timestamp}")]
    StartAfterFirstSample {
        start_time: i64,
        first_timestamp: i64,
    },

    #[error("end time {end_time} is before the last timestamp {last_timestamp}")]
    EndBeforeLastSample { end_time: i64, last_timestamp: i64 },

    #[error("length of timestamps ({timestamps}) and counter values ({counter_values}) is unmatched")]
    CounterLengthMismatch {
        timestamps: usize,
        counter_values: usize,
    },

    #[error("length of timestamps ({timestamps}) and exceptions ({exceptions}) is unmatched")]
    ExceptionLengthMismatch { timestamps: usize, exceptions: usize },

    #[error("tolerance ratio {0} is outside 0..=1")]
    ToleranceRatioOutOfRange(f64),

    #[error("unordered timestamp at index {index}: {timestamp} follows {previous}")]
    UnorderedTimestamps {
        index: usize,
        previous: i64,
        timestamp: i64,
    },
}

/// SQF series that does not line up with the chronology it annotates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputMismatchError {
    #[error("{0} is empty")]
    Empty(&'static str),

    #[error("length mismatch: chronology {chronology}, sqf timestamps {timestamps}, sqf values {values}")]
    LengthMismatch {
        chronology: usize,
        timestamps: usize,
        values: usize,
    },

    #[error("sqf timestamp {sqf_timestamp} at index {index} does not match chronology start {chronology_start}")]
    TimestampMismatch {
        index: usize,
        chronology_start: i64,
        sqf_timestamp: i64,
    },
}

/// Umbrella error for callers that handle every engine failure the same way.
#[derive(Debug, Error)]
pub enum SlaError {
    #[error("invalid sample set: {0}")]
    Validation(#[from] ValidationError),

    #[error("sqf input mismatch: {0}")]
    InputMismatch(#[from] InputMismatchError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SlaError {
    /// Whether the failure came from the caller's sample data rather than from configuration.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InputMismatch(_))
    }
}
