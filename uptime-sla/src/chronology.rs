//! Cause-attributed downtime chronology.
//!
//! The timeline covers the whole window: a zero-valued synthetic sample is
//! added at the window start and end when no real sample sits there. Each
//! entry spans `[timestamp[i], timestamp[i + 1])`.
//!
//! Classification uses its own backward redistribution, independent of the
//! interval spreader: when a non-zero reading ends a run of zero readings, its
//! counter value is walked backward through the run. A zero reading that still
//! has positive credit after the walk was a link failure (the device stayed
//! up); one without credit was a power failure. Runs of exactly-zero credit at
//! either end of the window are open.

use crate::sample::Window;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Why an interval was (or was not) in service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChronologyStatus {
    Running,
    LinkFailure,
    PowerFailure,
    Open,
}

impl std::fmt::Display for ChronologyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            Self::Running => "running",
            Self::LinkFailure => "link_failure",
            Self::PowerFailure => "power_failure",
            Self::Open => "open",
        };
        write!(f, "{value}")
    }
}

/// One classified interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChronologyEntry {
    pub start_timestamp: i64,
    pub end_timestamp: i64,
    /// Raw counter reading at `start_timestamp` (0 for synthetic boundary samples).
    pub counter_value: i64,
    pub status: ChronologyStatus,
    /// Equals the entry's duration for link failures, otherwise 0.
    pub link_failure_duration: i64,
    /// Billable part of `link_failure_duration` after grace and quota.
    pub restitution_duration: i64,
}

impl ChronologyEntry {
    pub fn new(start_timestamp: i64, end_timestamp: i64, counter_value: i64, status: ChronologyStatus) -> Self {
        let mut entry = Self {
            start_timestamp,
            end_timestamp,
            counter_value,
            status,
            link_failure_duration: 0,
            restitution_duration: 0,
        };
        entry.reset_link_failure();
        entry
    }

    pub fn duration(&self) -> i64 {
        self.end_timestamp - self.start_timestamp
    }

    pub fn is_link_failure(&self) -> bool {
        self.status == ChronologyStatus::LinkFailure
    }

    /// Change status, keeping the link-failure fields consistent with it.
    pub(crate) fn relabel(&mut self, status: ChronologyStatus) {
        if self.status != status {
            self.status = status;
            self.reset_link_failure();
        }
    }

    /// Move the entry's bounds. A link failure's duration follows the new span
    /// and its restitution shifts by the same amount, staying within
    /// `0..=link_failure_duration`.
    pub(crate) fn retime(&mut self, start_timestamp: i64, end_timestamp: i64) {
        self.start_timestamp = start_timestamp;
        self.end_timestamp = end_timestamp;
        if !self.is_link_failure() {
            return;
        }
        let previous = self.link_failure_duration;
        self.link_failure_duration = self.duration().max(0);
        let shifted = self.restitution_duration + (self.link_failure_duration - previous);
        self.restitution_duration = shifted.clamp(0, self.link_failure_duration);
    }

    /// Re-derive both durations from the status: link failures owe their full span.
    fn reset_link_failure(&mut self) {
        self.link_failure_duration = if self.is_link_failure() { self.duration() } else { 0 };
        self.restitution_duration = self.link_failure_duration;
    }
}

/// Backward redistribution of raw counter readings into zero runs.
///
/// Returns per-sample credit. Values inside a zero run become
/// `next_credit - gap`, which may go negative; the walk stops at the first
/// non-positive credit or at the start of the run.
pub fn redistribute_counter(timestamps: &[i64], counter_values: &[i64]) -> Vec<i64> {
    let mut counted = counter_values.to_vec();
    // `run_start` is the first index after the last non-zero reading.
    let mut run_start = 0;
    for (i, &value) in counter_values.iter().enumerate() {
        if value == 0 {
            continue;
        }
        let mut k = i;
        while k > run_start && counted[k] > 0 {
            counted[k - 1] = counted[k].saturating_sub(timestamps[k] - timestamps[k - 1]);
            k -= 1;
        }
        run_start = i + 1;
    }
    counted
}

/// Build the chronology for `window` from raw samples.
pub fn build_chronology(window: Window, timestamps: &[i64], counter_values: &[i64]) -> Vec<ChronologyEntry> {
    let (Some(&first), Some(&last)) = (timestamps.first(), timestamps.last()) else {
        return Vec::new();
    };

    let mut ts = Vec::with_capacity(timestamps.len() + 2);
    let mut values = Vec::with_capacity(timestamps.len() + 2);
    if window.start_time != first {
        ts.push(window.start_time);
        values.push(0);
    }
    ts.extend_from_slice(timestamps);
    values.extend_from_slice(counter_values);
    if window.end_time != last {
        ts.push(window.end_time);
        values.push(0);
    }

    let counted = redistribute_counter(&ts, &values);
    let mut chronology: Vec<ChronologyEntry> = ts
        .windows(2)
        .enumerate()
        .map(|(i, span)| {
            let status = if values[i] > 0 {
                ChronologyStatus::Running
            } else if values[i] == 0 && counted[i] > 0 {
                ChronologyStatus::LinkFailure
            } else {
                ChronologyStatus::PowerFailure
            };
            ChronologyEntry::new(span[0], span[1], values[i], status)
        })
        .collect();

    let leading = counted
        .iter()
        .take(chronology.len())
        .take_while(|&&c| c == 0)
        .count();
    for entry in &mut chronology[..leading] {
        entry.relabel(ChronologyStatus::Open);
    }

    // Trailing scan stops before index 0.
    let mut i = chronology.len();
    while i > 1 && counted[i - 1] == 0 {
        chronology[i - 1].relabel(ChronologyStatus::Open);
        i -= 1;
    }

    debug!(
        entries = chronology.len(),
        leading_open = leading,
        trailing_open = chronology.len() - i,
        "built uptime chronology"
    );
    chronology
}
