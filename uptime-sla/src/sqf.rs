//! Signal-quality (SQF) gating of link-failure restitution.
//!
//! Each link-failure entry is paired with the signal-quality reading taken at
//! its start. Strong signal waives the restitution, weak signal charges it in
//! full, and the band in between draws on a shared rain quota before charging
//! whatever the quota could not cover.

use crate::chronology::{ChronologyEntry, ChronologyStatus};
use crate::errors::InputMismatchError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Readings at or above this waive link-failure restitution.
pub const DEFAULT_SQF_HIGH_THRESHOLD: f64 = 7.1;
/// Readings below this charge link-failure restitution in full.
pub const DEFAULT_SQF_LOW_THRESHOLD: f64 = 3.0;

/// Signal-quality band thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SqfPolicy {
    pub high_threshold: f64,
    pub low_threshold: f64,
}

impl Default for SqfPolicy {
    fn default() -> Self {
        Self {
            high_threshold: DEFAULT_SQF_HIGH_THRESHOLD,
            low_threshold: DEFAULT_SQF_LOW_THRESHOLD,
        }
    }
}

/// How an entry's restitution was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqfStatus {
    /// Not a link failure; nothing to settle.
    NotApplicable,
    /// Strong signal: restitution waived.
    HighSignal,
    /// Weak signal: restitution charged in full.
    LowSignal,
    /// Middle band, paid (fully or partly) from the rain quota.
    Quota,
    /// Middle band with the quota already exhausted.
    NonQuota,
}

impl SqfStatus {
    /// Whether the entry's remaining restitution counts against availability.
    pub fn is_chargeable(self) -> bool {
        matches!(self, Self::LowSignal | Self::Quota | Self::NonQuota)
    }
}

impl std::fmt::Display for SqfStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            Self::NotApplicable => "not_applicable",
            Self::HighSignal => "high_signal",
            Self::LowSignal => "low_signal",
            Self::Quota => "quota",
            Self::NonQuota => "non_quota",
        };
        write!(f, "{value}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqfChronologyEntry {
    #[serde(flatten)]
    pub entry: ChronologyEntry,
    pub sqf_status: SqfStatus,
    pub sqf_value: f64,
    /// Rain quota left after this entry was settled.
    pub remaining_rain_quota: i64,
}

/// Outcome of an SQF pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqfAvailability {
    /// `None` when the chronology spans no time.
    pub availability: Option<f64>,
    pub entries: Vec<SqfChronologyEntry>,
    pub rain_quota_used: i64,
    /// Restitution left on chargeable entries after quota.
    pub charged_restitution: i64,
    pub open_duration: i64,
}

/// Check that the SQF series lines up 1:1 with `chronology`.
pub fn validate_sqf_values(
    chronology: &[ChronologyEntry],
    sqf_timestamps: &[i64],
    sqf_values: &[f64],
) -> Result<(), InputMismatchError> {
    if chronology.is_empty() {
        return Err(InputMismatchError::Empty("chronology"));
    }
    if sqf_timestamps.is_empty() {
        return Err(InputMismatchError::Empty("sqf timestamps"));
    }
    if sqf_values.is_empty() {
        return Err(InputMismatchError::Empty("sqf values"));
    }
    if chronology.len() != sqf_timestamps.len() || chronology.len() != sqf_values.len() {
        return Err(InputMismatchError::LengthMismatch {
            chronology: chronology.len(),
            timestamps: sqf_timestamps.len(),
            values: sqf_values.len(),
        });
    }
    if let Some((index, (entry, &sqf_timestamp))) = chronology
        .iter()
        .zip(sqf_timestamps)
        .enumerate()
        .find(|(_, (entry, ts))| entry.start_timestamp != **ts)
    {
        return Err(InputMismatchError::TimestampMismatch {
            index,
            chronology_start: entry.start_timestamp,
            sqf_timestamp,
        });
    }
    Ok(())
}

/// Settle link-failure restitution against signal quality and the rain quota.
///
/// Returns the report and the quota left over for the next period.
pub fn sqf_availability(
    chronology: &[ChronologyEntry],
    sqf_timestamps: &[i64],
    sqf_values: &[f64],
    rain_quota: i64,
    policy: &SqfPolicy,
) -> Result<(SqfAvailability, i64), InputMismatchError> {
    validate_sqf_values(chronology, sqf_timestamps, sqf_values).inspect_err(|e| {
        warn!(error = %e, "rejected sqf input");
    })?;

    let initial_quota = rain_quota.max(0);
    let mut quota = initial_quota;
    let mut charged_restitution = 0;
    let mut open_duration = 0;

    let entries: Vec<SqfChronologyEntry> = chronology
        .iter()
        .zip(sqf_values)
        .map(|(entry, &sqf_value)| {
            let mut entry = entry.clone();
            let sqf_status = if !entry.is_link_failure() {
                SqfStatus::NotApplicable
            } else if sqf_value >= policy.high_threshold {
                entry.restitution_duration = 0;
                SqfStatus::HighSignal
            } else if sqf_value < policy.low_threshold {
                SqfStatus::LowSignal
            } else if quota > 0 {
                let consumed = quota.min(entry.restitution_duration);
                quota -= consumed;
                entry.restitution_duration -= consumed;
                SqfStatus::Quota
            } else {
                SqfStatus::NonQuota
            };

            if sqf_status.is_chargeable() {
                charged_restitution += entry.restitution_duration;
            }
            if entry.status == ChronologyStatus::Open {
                open_duration += entry.duration();
            }
            SqfChronologyEntry {
                entry,
                sqf_status,
                sqf_value,
                remaining_rain_quota: quota,
            }
        })
        .collect();

    // Validation guarantees at least one entry.
    let period = entries[entries.len() - 1].entry.end_timestamp - entries[0].entry.start_timestamp;
    let availability = (period > 0).then(|| 1.0 - (charged_restitution + open_duration) as f64 / period as f64);

    debug!(
        entries = entries.len(),
        initial_quota,
        remaining_quota = quota,
        charged_restitution,
        open_duration,
        "settled sqf restitution"
    );

    Ok((
        SqfAvailability {
            availability,
            entries,
            rain_quota_used: initial_quota - quota,
            charged_restitution,
            open_duration,
        },
        quota,
    ))
}
