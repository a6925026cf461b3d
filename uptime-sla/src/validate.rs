//! Structural checks run before a calculator is built.

use crate::errors::ValidationError;
use crate::sample::Window;

/// Check a raw sample set. Returns the first violated precondition.
pub fn check_arguments(
    window: Window,
    timestamps: &[i64],
    counter_values: &[i64],
    tolerance_ratio: f64,
    exceptions: Option<&[bool]>,
) -> Result<(), ValidationError> {
    if window.start_time < 0 {
        return Err(ValidationError::NegativeStartTime(window.start_time));
    }
    if window.end_time < 0 {
        return Err(ValidationError::NegativeEndTime(window.end_time));
    }
    let (Some(&first), Some(&last)) = (timestamps.first(), timestamps.last()) else {
        return Err(ValidationError::EmptyTimestamps);
    };
    if window.start_time > first {
        return Err(ValidationError::StartAfterFirstSample {
            start_time: window.start_time,
            first_timestamp: first,
        });
    }
    if window.end_time < last {
        return Err(ValidationError::EndBeforeLastSample {
            end_time: window.end_time,
            last_timestamp: last,
        });
    }
    if timestamps.len() != counter_values.len() {
        return Err(ValidationError::CounterLengthMismatch {
            timestamps: timestamps.len(),
            counter_values: counter_values.len(),
        });
    }
    if let Some(exceptions) = exceptions
        && exceptions.len() != timestamps.len()
    {
        return Err(ValidationError::ExceptionLengthMismatch {
            timestamps: timestamps.len(),
            exceptions: exceptions.len(),
        });
    }
    // Written as a negated range check so NaN is rejected too.
    if !(0.0..=1.0).contains(&tolerance_ratio) {
        return Err(ValidationError::ToleranceRatioOutOfRange(tolerance_ratio));
    }
    if let Some(index) = timestamps.windows(2).position(|pair| pair[1] < pair[0]) {
        return Err(ValidationError::UnorderedTimestamps {
            index: index + 1,
            previous: timestamps[index],
            timestamp: timestamps[index + 1],
        });
    }
    Ok(())
}
