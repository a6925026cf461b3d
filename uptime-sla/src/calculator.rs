//! The calculator: a validated, frozen sample set and every query over it.

use crate::availability::{presence_ledger, service_state_ledger};
use crate::chronology::{ChronologyEntry, ChronologyStatus, build_chronology};
use crate::errors::ValidationError;
use crate::restitution::{RestitutionPolicy, apply_restitution};
use crate::sample::{Sample, Window, split_samples};
use crate::spread::{IntervalLedger, spread_uptime};
use crate::state::{UptimeState, label_states};
use crate::trim::trim_chronology;
use crate::validate::check_arguments;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Chronology-based availability over an accounting window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityResult {
    /// `1 - (restitution + open) / period`; `None` for an empty period.
    pub ratio: Option<f64>,
    pub link_failure_duration: i64,
    pub restitution_duration: i64,
    pub open_duration: i64,
    /// The trimmed chronology the ratio was computed from.
    pub chronology: Vec<ChronologyEntry>,
}

impl AvailabilityResult {
    fn from_chronology(chronology: Vec<ChronologyEntry>, period: i64) -> Self {
        let mut link_failure_duration = 0;
        let mut restitution_duration = 0;
        let mut open_duration = 0;
        for entry in &chronology {
            match entry.status {
                ChronologyStatus::LinkFailure => {
                    link_failure_duration += entry.link_failure_duration;
                    restitution_duration += entry.restitution_duration;
                }
                ChronologyStatus::Open => open_duration += entry.duration(),
                ChronologyStatus::Running | ChronologyStatus::PowerFailure => {}
            }
        }
        let ratio = (period > 0).then(|| 1.0 - (restitution_duration + open_duration) as f64 / period as f64);
        Self {
            ratio,
            link_failure_duration,
            restitution_duration,
            open_duration,
            chronology,
        }
    }
}

/// Availability calculator for one device's uptime counter over one window.
///
/// Construction validates the sample set; afterwards every query is a pure
/// function of the stored samples.
#[derive(Debug, Clone)]
pub struct UptimeSlaCalculator {
    window: Window,
    timestamps: Vec<i64>,
    counter_values: Vec<i64>,
    exceptions: Option<Vec<bool>>,
    tolerance_ratio: f64,
    restitution: RestitutionPolicy,
}

impl UptimeSlaCalculator {
    pub fn new(
        start_time: i64,
        end_time: i64,
        timestamps: &[i64],
        counter_values: &[i64],
        tolerance_ratio: f64,
        exceptions: Option<&[bool]>,
    ) -> Result<Self, ValidationError> {
        let window = Window::new(start_time, end_time);
        check_arguments(window, timestamps, counter_values, tolerance_ratio, exceptions).inspect_err(|e| {
            warn!(error = %e, "rejected sample set");
        })?;
        debug!(
            start_time,
            end_time,
            samples = timestamps.len(),
            tolerance_ratio,
            with_exceptions = exceptions.is_some(),
            "built uptime sla calculator"
        );
        Ok(Self {
            window,
            timestamps: timestamps.to_vec(),
            counter_values: counter_values.to_vec(),
            exceptions: exceptions.map(<[bool]>::to_vec),
            tolerance_ratio,
            restitution: RestitutionPolicy::default(),
        })
    }

    /// Build from [`Sample`] records; their `exception` flags are always used.
    pub fn from_samples(window: Window, samples: &[Sample], tolerance_ratio: f64) -> Result<Self, ValidationError> {
        let (timestamps, counter_values, exceptions) = split_samples(samples);
        Self::new(
            window.start_time,
            window.end_time,
            &timestamps,
            &counter_values,
            tolerance_ratio,
            Some(&exceptions),
        )
    }

    pub fn with_restitution_policy(mut self, policy: RestitutionPolicy) -> Self {
        self.restitution = policy;
        self
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn tolerance_ratio(&self) -> f64 {
        self.tolerance_ratio
    }

    pub fn restitution_policy(&self) -> &RestitutionPolicy {
        &self.restitution
    }

    fn last_timestamp(&self) -> i64 {
        // Validation rejects empty timestamp arrays.
        self.timestamps[self.timestamps.len() - 1]
    }

    fn spread(&self) -> IntervalLedger {
        spread_uptime(self.window, &self.timestamps, &self.counter_values, self.tolerance_ratio)
    }

    fn closed(&self, ledger: IntervalLedger) -> IntervalLedger {
        ledger.close(self.window, self.last_timestamp())
    }

    /// Fraction of the window ending in a positive reading.
    pub fn presence_availability(&self) -> Option<f64> {
        self.closed(presence_ledger(self.window, &self.timestamps, &self.counter_values))
            .ratio()
    }

    /// Fraction of the window credited by the interval spreader.
    pub fn spread_availability(&self) -> Option<f64> {
        self.closed(self.spread()).ratio()
    }

    /// Spread availability with leading/trailing open periods and explicit
    /// zero readings accounted for.
    pub fn service_state_availability(&self) -> Option<f64> {
        self.closed(service_state_ledger(self.spread(), &self.counter_values, None))
            .ratio()
    }

    /// Service-state availability with exception-flagged intervals credited in full.
    pub fn exception_availability(&self) -> Option<f64> {
        let ledger = service_state_ledger(self.spread(), &self.counter_values, self.exceptions.as_deref());
        self.closed(ledger).ratio()
    }

    pub fn uptime_states(&self) -> Vec<UptimeState> {
        label_states(&self.spread(), &self.counter_values)
    }

    /// `(uptime, downtime)` in seconds from the spread reduction, trailing interval included.
    pub fn total_uptime_and_downtime(&self) -> (i64, i64) {
        let (counted, delta) = self.closed(self.spread()).totals();
        (counted, delta - counted)
    }

    /// Cause-attributed timeline over the whole window, before grace is applied.
    pub fn chronology(&self) -> Vec<ChronologyEntry> {
        build_chronology(self.window, &self.timestamps, &self.counter_values)
    }

    /// [`Self::trimmed_availability`] over the full window, not final.
    pub fn chronology_availability(&self) -> AvailabilityResult {
        self.trimmed_availability(self.window.start_time, self.window.end_time, false)
    }

    /// Chronology availability over `[s_trim, e_trim]` with grace applied.
    pub fn trimmed_availability(&self, s_trim: i64, e_trim: i64, is_final_calc: bool) -> AvailabilityResult {
        let chronology = apply_restitution(self.chronology(), &self.restitution);
        let trimmed = trim_chronology(chronology, s_trim, e_trim, is_final_calc);
        let result = AvailabilityResult::from_chronology(trimmed, e_trim - s_trim);
        debug!(
            s_trim,
            e_trim,
            is_final_calc,
            ratio = ?result.ratio,
            restitution = result.restitution_duration,
            open = result.open_duration,
            "computed chronology availability"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(start: i64, n: usize, step: i64) -> (Vec<i64>, Vec<i64>) {
        let ts: Vec<i64> = (1..=n as i64).map(|i| start + i * step).collect();
        let vals: Vec<i64> = (1..=n as i64).map(|i| i * step).collect();
        (ts, vals)
    }

    #[test]
    fn test_new_rejects_invalid_input() {
        let err = UptimeSlaCalculator::new(100, 50, &[100], &[1], 0.9, None).unwrap_err();
        assert!(matches!(err, ValidationError::EndBeforeLastSample { .. }));
        let err = UptimeSlaCalculator::new(0, 500, &[100, 200], &[1, 2], f64::NAN, None).unwrap_err();
        assert!(matches!(err, ValidationError::ToleranceRatioOutOfRange(_)));
    }

    #[test]
    fn test_steady_counter_is_fully_available() {
        let (ts, vals) = ramp(0, 10, 100);
        let calc = UptimeSlaCalculator::new(0, 1_000, &ts, &vals, 0.9, None).unwrap();
        assert_eq!(calc.presence_availability(), Some(1.0));
        assert_eq!(calc.spread_availability(), Some(1.0));
        assert_eq!(calc.service_state_availability(), Some(1.0));
        assert_eq!(calc.exception_availability(), Some(1.0));
        assert_eq!(calc.total_uptime_and_downtime(), (1_000, 0));
        assert!(calc.uptime_states().iter().all(|s| *s == UptimeState::Up));
    }

    #[test]
    fn test_trailing_interval_is_uncredited() {
        let (ts, vals) = ramp(0, 5, 100);
        let calc = UptimeSlaCalculator::new(0, 1_000, &ts, &vals, 0.9, None).unwrap();
        assert_eq!(calc.spread_availability(), Some(0.5));
        assert_eq!(calc.total_uptime_and_downtime(), (500, 500));
    }

    #[test]
    fn test_zero_length_window_has_no_ratio() {
        let calc = UptimeSlaCalculator::new(500, 500, &[500], &[10], 0.9, None).unwrap();
        assert_eq!(calc.spread_availability(), None);
        assert_eq!(calc.presence_availability(), None);
        assert!(calc.chronology().is_empty());
        assert_eq!(calc.chronology_availability().ratio, None);
    }

    #[test]
    fn test_from_samples_uses_exception_flags() {
        let samples = [
            Sample::new(100, 0),
            Sample::new(200, 0).excepted(),
            Sample::new(300, 0),
        ];
        let calc = UptimeSlaCalculator::from_samples(Window::new(0, 300), &samples, 0.9).unwrap();
        assert_eq!(calc.service_state_availability(), Some(0.0));
        let exception = calc.exception_availability().unwrap();
        assert!((exception - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_restitution_policy_changes_chronology_ratio() {
        // One 200s link failure between two running stretches.
        let ts = [100, 200, 400, 500];
        let vals = [100, 0, 400, 500];
        let strict = UptimeSlaCalculator::new(100, 500, &ts, &vals, 0.9, None)
            .unwrap()
            .with_restitution_policy(RestitutionPolicy { grace_tolerance_secs: 0 });
        let result = strict.chronology_availability();
        assert_eq!(result.link_failure_duration, 200);
        assert_eq!(result.restitution_duration, 200);
        assert_eq!(result.ratio, Some(0.5));

        let lenient = UptimeSlaCalculator::new(100, 500, &ts, &vals, 0.9, None).unwrap();
        assert_eq!(lenient.chronology_availability().ratio, Some(1.0));
    }

    #[test]
    fn test_extreme_counter_values_stay_bounded() {
        let calc = UptimeSlaCalculator::new(0, 20, &[10, 20], &[-2, i64::MAX], 0.9, None).unwrap();
        assert_eq!(calc.spread_availability(), Some(1.0));
        for ratio in [calc.presence_availability(), calc.service_state_availability()] {
            assert!(ratio.is_some_and(|r| (0.0..=1.0).contains(&r)));
        }
        assert_eq!(calc.total_uptime_and_downtime(), (20, 0));
    }

    #[test]
    fn test_trim_inside_first_interval() {
        let (ts, vals) = ramp(0, 10, 100);
        let calc = UptimeSlaCalculator::new(0, 1_000, &ts, &vals, 0.9, None).unwrap();
        // [0, 100) is a synthetic leading entry with no credit.
        assert_eq!(calc.trimmed_availability(20, 80, false).ratio, Some(0.0));
        assert_eq!(calc.trimmed_availability(20, 80, true).ratio, Some(1.0));
        assert_eq!(calc.trimmed_availability(950, 1_000, false).ratio, Some(1.0));
    }

    #[test]
    fn test_calculator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<UptimeSlaCalculator>();
    }
}
