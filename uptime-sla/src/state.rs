//! Per-sample up/down/open labels.

use crate::spread::IntervalLedger;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UptimeState {
    Up,
    Down,
    /// No evidence either way (trailing run of zero readings).
    Open,
}

impl std::fmt::Display for UptimeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Open => "open",
        };
        write!(f, "{value}")
    }
}

/// Label each sample from unclosed spreader output.
pub fn label_states(spread: &IntervalLedger, counter_values: &[i64]) -> Vec<UptimeState> {
    let mut states: Vec<UptimeState> = spread
        .counted_time
        .iter()
        .take(counter_values.len())
        .map(|&counted| {
            if counted > 0 {
                UptimeState::Up
            } else {
                UptimeState::Down
            }
        })
        .collect();

    for (state, &value) in states.iter_mut().zip(counter_values).rev() {
        if value > 0 {
            break;
        }
        *state = UptimeState::Open;
    }
    states
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::Window;
    use crate::spread::spread_uptime;

    #[test]
    fn test_labels_with_trailing_open() {
        let ts = [100, 200, 300, 400, 500];
        let vals = [100, 0, 10, 0, 0];
        let spread = spread_uptime(Window::new(0, 500), &ts, &vals, 0.9);
        assert_eq!(
            label_states(&spread, &vals),
            vec![
                UptimeState::Up,
                UptimeState::Down,
                UptimeState::Up,
                UptimeState::Open,
                UptimeState::Open,
            ]
        );
    }

    #[test]
    fn test_all_zero_is_open() {
        let ts = [100, 200, 300];
        let vals = [0, 0, 0];
        let spread = spread_uptime(Window::new(0, 300), &ts, &vals, 0.9);
        assert!(label_states(&spread, &vals).iter().all(|s| *s == UptimeState::Open));
    }

    #[test]
    fn test_display_and_serde() {
        assert_eq!(UptimeState::Open.to_string(), "open");
        assert_eq!(serde_json::to_string(&UptimeState::Down).unwrap(), "\"down\"");
    }
}
