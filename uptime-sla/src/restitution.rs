//! Grace tolerance for link-failure runs.

use crate::chronology::{ChronologyEntry, ChronologyStatus};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Grace granted once per contiguous link-failure run, in seconds.
pub const DEFAULT_GRACE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RestitutionPolicy {
    pub grace_tolerance_secs: i64,
}

impl Default for RestitutionPolicy {
    fn default() -> Self {
        Self {
            grace_tolerance_secs: DEFAULT_GRACE_TOLERANCE_SECS,
        }
    }
}

/// Apply the grace tolerance to every maximal run of link failures.
///
/// Each run is walked from its last entry backward. An entry longer than the
/// remaining tolerance owes the difference and leaves the tolerance untouched;
/// the first entry the tolerance fully covers owes nothing and spends the
/// whole tolerance, so entries before it owe their full duration.
pub fn apply_restitution(mut chronology: Vec<ChronologyEntry>, policy: &RestitutionPolicy) -> Vec<ChronologyEntry> {
    let mut i = 0;
    while i < chronology.len() {
        if chronology[i].status != ChronologyStatus::LinkFailure {
            i += 1;
            continue;
        }
        let run_start = i;
        while i < chronology.len() && chronology[i].status == ChronologyStatus::LinkFailure {
            i += 1;
        }

        let mut tolerance = policy.grace_tolerance_secs.max(0);
        for entry in chronology[run_start..i].iter_mut().rev() {
            let remaining = entry.link_failure_duration - tolerance;
            if remaining <= 0 {
                entry.restitution_duration = 0;
                tolerance = 0;
            } else {
                entry.restitution_duration = remaining;
            }
        }
        debug!(
            run_start,
            run_len = i - run_start,
            restitution = chronology[run_start..i]
                .iter()
                .map(|e| e.restitution_duration)
                .sum::<i64>(),
            "applied grace tolerance to link failure run"
        );
    }
    chronology
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link_failure(start: i64, end: i64) -> ChronologyEntry {
        ChronologyEntry::new(start, end, 0, ChronologyStatus::LinkFailure)
    }

    fn running(start: i64, end: i64) -> ChronologyEntry {
        ChronologyEntry::new(start, end, 100, ChronologyStatus::Running)
    }

    fn restitutions(chronology: &[ChronologyEntry]) -> Vec<i64> {
        chronology.iter().map(|e| e.restitution_duration).collect()
    }

    #[test]
    fn test_short_run_fully_absorbed() {
        let chronology = vec![running(0, 100), link_failure(100, 200), running(200, 300)];
        let out = apply_restitution(chronology, &RestitutionPolicy::default());
        assert_eq!(restitutions(&out), vec![0, 0, 0]);
        assert_eq!(out[1].link_failure_duration, 100);
    }

    #[test]
    fn test_long_entry_owes_excess_and_keeps_tolerance() {
        let chronology = vec![link_failure(0, 200), link_failure(200, 700)];
        let out = apply_restitution(chronology, &RestitutionPolicy::default());
        // Last entry: 500 - 300 = 200 owed, tolerance stays 300; first: 200 - 300 <= 0.
        assert_eq!(restitutions(&out), vec![0, 200]);
    }

    #[test]
    fn test_grace_short_circuit_quirk() {
        // Known quirk, kept on purpose: the last entry absorbs 100 of the 300s
        // grace but spends all of it, so the earlier 100s entries owe in full
        // instead of sharing the leftover 200s.
        let chronology = vec![link_failure(0, 100), link_failure(100, 200), link_failure(200, 300)];
        let out = apply_restitution(chronology, &RestitutionPolicy::default());
        assert_eq!(restitutions(&out), vec![100, 100, 0]);
    }

    #[test]
    fn test_each_run_gets_its_own_tolerance() {
        let chronology = vec![
            link_failure(0, 100),
            link_failure(100, 200),
            running(200, 300),
            link_failure(300, 400),
            link_failure(400, 500),
        ];
        let out = apply_restitution(chronology, &RestitutionPolicy::default());
        assert_eq!(restitutions(&out), vec![100, 0, 0, 100, 0]);
    }

    #[test]
    fn test_zero_grace_charges_everything() {
        let chronology = vec![link_failure(0, 100), link_failure(100, 250)];
        let out = apply_restitution(chronology, &RestitutionPolicy { grace_tolerance_secs: 0 });
        assert_eq!(restitutions(&out), vec![100, 150]);
    }

    #[test]
    fn test_restitution_never_exceeds_link_failure() {
        let chronology = vec![link_failure(0, 50), link_failure(50, 1_000), running(1_000, 1_100)];
        let out = apply_restitution(chronology, &RestitutionPolicy::default());
        for entry in &out {
            assert!(entry.restitution_duration <= entry.link_failure_duration);
            assert!(entry.restitution_duration >= 0);
        }
    }
}
