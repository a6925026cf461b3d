//! Interval spreading of a continuous-uptime counter.
//!
//! A "time since last restart" counter can grow by more than one polling
//! period between two samples. That excess belongs to earlier, unsampled
//! intervals, so it is pushed backward instead of being over-counted in the
//! interval where it was observed.
//!
//! # Tolerance ratio
//!
//! Small overshoots are usually polling jitter (the agent sampled a little
//! late). At a trigger index `i > 0`, an excess of at most
//! `floor(delta[i] * (1 - tolerance_ratio))` is clamped away instead of being
//! redistributed. A ratio of `1.0` makes every overshoot redistribute.

use crate::sample::Window;
use tracing::trace;

/// Parallel per-interval wall-clock and credited-uptime durations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntervalLedger {
    pub delta_time: Vec<i64>,
    pub counted_time: Vec<i64>,
}

impl IntervalLedger {
    pub fn len(&self) -> usize {
        self.delta_time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delta_time.is_empty()
    }

    /// Append the uncredited tail `(last_timestamp, window.end_time]`, if any.
    pub fn close(mut self, window: Window, last_timestamp: i64) -> Self {
        let delta = window.end_time - last_timestamp;
        if delta > 0 {
            self.delta_time.push(delta);
            self.counted_time.push(0);
        }
        self
    }

    /// `(sum(counted), sum(delta))`.
    pub fn totals(&self) -> (i64, i64) {
        (
            self.counted_time.iter().sum(),
            self.delta_time.iter().sum(),
        )
    }

    /// `sum(counted) / sum(delta)`, undefined for a zero-length span.
    pub fn ratio(&self) -> Option<f64> {
        let (counted, delta) = self.totals();
        if delta == 0 {
            return None;
        }
        Some(counted as f64 / delta as f64)
    }
}

/// Wall-clock gap ending at each sample; the first gap starts at the window start.
pub(crate) fn delta_times(window: Window, timestamps: &[i64]) -> Vec<i64> {
    let mut previous = window.start_time;
    timestamps
        .iter()
        .map(|&ts| {
            let delta = ts - previous;
            previous = ts;
            delta
        })
        .collect()
}

/// Spread counter growth across sampling intervals.
///
/// The returned ledger has one entry per sample and satisfies
/// `0 <= counted_time[i] <= delta_time[i]`. Callers append the trailing
/// interval with [`IntervalLedger::close`] when they need it.
///
/// # Panics
///
/// Panics if `timestamps` and `counter_values` differ in length. The
/// calculator rejects such input at construction.
pub fn spread_uptime(
    window: Window,
    timestamps: &[i64],
    counter_values: &[i64],
    tolerance_ratio: f64,
) -> IntervalLedger {
    assert_eq!(
        timestamps.len(),
        counter_values.len(),
        "timestamps and counter values must be parallel"
    );
    let delta_time = delta_times(window, timestamps);
    let mut counted_time = Vec::with_capacity(timestamps.len());

    for (i, &value) in counter_values.iter().enumerate() {
        let counted = if i == 0 {
            if value <= 0 { 0 } else { value.min(delta_time[0]) }
        } else {
            let growth = value.saturating_sub(counter_values[i - 1]);
            if growth <= 0 { 0 } else { growth }
        };
        counted_time.push(counted);
    }

    for i in 0..delta_time.len() {
        if counted_time[i] <= delta_time[i] {
            continue;
        }
        let excess = counted_time[i] - delta_time[i];
        if i > 0 && excess <= jitter_allowance(delta_time[i], tolerance_ratio) {
            trace!(index = i, excess, "counter overshoot within jitter allowance");
            counted_time[i] = delta_time[i];
            continue;
        }
        redistribute_backward(&mut counted_time, &delta_time, i);
    }

    IntervalLedger {
        delta_time,
        counted_time,
    }
}

fn jitter_allowance(delta: i64, tolerance_ratio: f64) -> i64 {
    (delta as f64 * (1.0 - tolerance_ratio)).floor() as i64
}

/// Walk backward from `start`, capping each interval at its delta and handing
/// the remainder to its predecessor. The predecessor's own credit is replaced,
/// not added to.
fn redistribute_backward(counted: &mut [i64], delta: &[i64], start: usize) {
    let mut j = start;
    while counted[j] > delta[j] {
        if j == 0 {
            counted[0] = delta[0];
            break;
        }
        counted[j - 1] = counted[j] - delta[j];
        counted[j] = delta[j];
        trace!(index = j - 1, carried = counted[j - 1], "pushed counter excess backward");
        j -= 1;
    }
}
