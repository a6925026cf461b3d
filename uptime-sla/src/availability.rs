//! Availability reductions over an [`IntervalLedger`].
//!
//! Every variant reduces `sum(counted) / sum(delta)`; they differ only in how
//! each interval's credit is derived:
//!
//! | Variant        | Credit per interval                                        |
//! |----------------|------------------------------------------------------------|
//! | presence       | full delta when the raw reading is positive                |
//! | spread         | spreader output as-is                                      |
//! | service state  | full delta once seen up, except zero readings that only   |
//! |                | carry borrowed credit; leading/trailing zero runs are open |
//! | exception      | service state, with flagged intervals always fully up      |

use crate::sample::Window;
use crate::spread::{IntervalLedger, delta_times};
use tracing::trace;

/// Credit each interval fully when a positive reading was observed at its end.
pub fn presence_ledger(window: Window, timestamps: &[i64], counter_values: &[i64]) -> IntervalLedger {
    let delta_time = delta_times(window, timestamps);
    let counted_time = delta_time
        .iter()
        .zip(counter_values)
        .map(|(&delta, &value)| if value > 0 { delta } else { 0 })
        .collect();
    IntervalLedger {
        delta_time,
        counted_time,
    }
}

/// Apply service-state accounting to spreader output.
///
/// An explicit zero reading overrides credit the spreader borrowed backward
/// into it. With `exceptions`, flagged intervals are credited in full and do
/// not end the initial open period.
///
/// # Panics
///
/// Panics unless `ledger`, `counter_values` and `exceptions` (when given)
/// all have one entry per sample.
pub fn service_state_ledger(
    mut ledger: IntervalLedger,
    counter_values: &[i64],
    exceptions: Option<&[bool]>,
) -> IntervalLedger {
    assert_eq!(ledger.len(), counter_values.len(), "ledger and counter values must be parallel");
    if let Some(flags) = exceptions {
        assert_eq!(flags.len(), counter_values.len(), "exceptions and counter values must be parallel");
    }
    let excepted = |i: usize| exceptions.is_some_and(|flags| flags[i]);
    let IntervalLedger {
        delta_time,
        counted_time,
    } = &mut ledger;

    let mut open = true;
    for (i, &value) in counter_values.iter().enumerate() {
        if excepted(i) {
            counted_time[i] = delta_time[i];
            continue;
        }
        if open && value > 0 {
            open = false;
        }
        if open {
            counted_time[i] = 0;
            continue;
        }
        if value <= 0 && counted_time[i] > 0 {
            trace!(index = i, borrowed = counted_time[i], "zero reading overrides spread credit");
            counted_time[i] = 0;
            continue;
        }
        counted_time[i] = delta_time[i];
    }

    // Trailing zero readings are open, not failures. Flagged samples inside
    // the run keep their credit without ending it.
    for i in (0..counter_values.len()).rev() {
        if counter_values[i] > 0 {
            break;
        }
        if !excepted(i) {
            counted_time[i] = 0;
        }
    }

    ledger
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spread::spread_uptime;

    const W: Window = Window {
        start_time: 0,
        end_time: 600,
    };
    const TS: [i64; 6] = [100, 200, 300, 400, 500, 600];

    #[test]
    fn test_presence_ignores_magnitude() {
        let ledger = presence_ledger(W, &TS, &[0, 5, 1_000_000, 0, -3, 1]);
        assert_eq!(ledger.counted_time, vec![0, 100, 100, 0, 0, 100]);
    }

    #[test]
    fn test_service_state_leading_open() {
        let vals = [0, 0, 100, 200, 300, 400];
        let ledger = service_state_ledger(spread_uptime(W, &TS, &vals, 1.0), &vals, None);
        assert_eq!(ledger.counted_time, vec![0, 0, 100, 100, 100, 100]);
    }

    #[test]
    fn test_service_state_zero_reading_overrides_borrowed_credit() {
        // Reading at 400 is zero, but the 250s jump at 500 lends it a full interval.
        let vals = [100, 200, 300, 0, 250, 350];
        let spread = spread_uptime(W, &TS, &vals, 1.0);
        assert_eq!(spread.counted_time[3], 100);
        let ledger = service_state_ledger(spread, &vals, None);
        assert_eq!(ledger.counted_time, vec![100, 100, 100, 0, 100, 100]);
    }

    #[test]
    fn test_service_state_zero_reading_without_credit_counts_up() {
        // Power loss with no borrowed credit is not charged to the service.
        let vals = [100, 200, 0, 0, 10, 110];
        let ledger = service_state_ledger(spread_uptime(W, &TS, &vals, 1.0), &vals, None);
        assert_eq!(ledger.counted_time, vec![100, 100, 100, 100, 100, 100]);
    }

    #[test]
    fn test_service_state_trailing_open() {
        let vals = [100, 200, 300, 0, 0, 0];
        let ledger = service_state_ledger(spread_uptime(W, &TS, &vals, 1.0), &vals, None);
        assert_eq!(ledger.counted_time, vec![100, 100, 100, 0, 0, 0]);
    }

    #[test]
    fn test_exception_credits_flagged_intervals() {
        let vals = [0, 0, 0, 0, 0, 0];
        let flags = [true, false, false, false, false, true];
        let ledger = service_state_ledger(spread_uptime(W, &TS, &vals, 1.0), &vals, Some(&flags));
        assert_eq!(ledger.counted_time, vec![100, 0, 0, 0, 0, 100]);
    }

    #[test]
    fn test_exception_does_not_end_open_period() {
        let vals = [5, 0, 100, 200, 300, 400];
        let flags = [true, false, false, false, false, false];
        let ledger = service_state_ledger(spread_uptime(W, &TS, &vals, 1.0), &vals, Some(&flags));
        // Index 1 is still open: the flagged positive reading at index 0 did not count as first-seen-up.
        assert_eq!(ledger.counted_time[..2], [100, 0]);
    }

    #[test]
    fn test_all_false_exceptions_match_service_state() {
        let vals = [0, 270, 370, 0, 0, 40];
        let plain = service_state_ledger(spread_uptime(W, &TS, &vals, 0.9), &vals, None);
        let flagged = service_state_ledger(spread_uptime(W, &TS, &vals, 0.9), &vals, Some(&[false; 6]));
        assert_eq!(plain, flagged);
    }

    #[test]
    #[should_panic(expected = "exceptions and counter values must be parallel")]
    fn test_short_exception_slice_panics() {
        let vals = [100, 200, 300, 400, 500, 600];
        service_state_ledger(spread_uptime(W, &TS, &vals, 0.9), &vals, Some(&[false; 3]));
    }
}
