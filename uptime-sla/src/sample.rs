//! Sample and window types.

use serde::{Deserialize, Serialize};

/// One uptime counter reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since the epoch (or any consistent time base).
    pub timestamp: i64,
    /// Continuous-uptime counter, in the same unit as `timestamp`.
    pub value: i64,
    /// Approved exclusion (e.g. scheduled maintenance).
    #[serde(default)]
    pub exception: bool,
}

impl Sample {
    pub fn new(timestamp: i64, value: i64) -> Self {
        Self {
            timestamp,
            value,
            exception: false,
        }
    }

    pub fn excepted(mut self) -> Self {
        self.exception = true;
        self
    }
}

/// Reporting window `[start_time, end_time]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start_time: i64,
    pub end_time: i64,
}

impl Window {
    pub fn new(start_time: i64, end_time: i64) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    pub fn duration(&self) -> i64 {
        self.end_time - self.start_time
    }
}

/// Split samples into the parallel arrays the calculator works on.
pub fn split_samples(samples: &[Sample]) -> (Vec<i64>, Vec<i64>, Vec<bool>) {
    let mut timestamps = Vec::with_capacity(samples.len());
    let mut values = Vec::with_capacity(samples.len());
    let mut exceptions = Vec::with_capacity(samples.len());
    for sample in samples {
        timestamps.push(sample.timestamp);
        values.push(sample.value);
        exceptions.push(sample.exception);
    }
    (timestamps, values, exceptions)
}
