//! Availability accounting for continuous-uptime counter series.
//!
//! A device reports a "seconds since last restart" counter at irregular
//! intervals. [`UptimeSlaCalculator`] reconciles those readings against
//! wall-clock time and reduces them to availability ratios, per-sample state
//! labels, and a cause-attributed chronology (running, link failure, power
//! failure, open). Link-failure time can then be settled against a grace
//! tolerance ([`apply_restitution`]) and signal quality with a shared rain
//! quota ([`sqf_availability`]).

pub mod availability;
pub mod calculator;
pub mod chronology;
pub mod config;
pub mod errors;
pub mod logging;
pub mod restitution;
pub mod sample;
pub mod spread;
pub mod sqf;
pub mod state;
pub mod trim;
pub mod validate;

pub use calculator::{AvailabilityResult, UptimeSlaCalculator};
pub use chronology::{ChronologyEntry, ChronologyStatus, build_chronology};
pub use config::{ConfigError, DEFAULT_TOLERANCE_RATIO, ResolvedConfig, SlaConfig};
pub use errors::{InputMismatchError, SlaError, ValidationError};
pub use logging::{LogConfig, LogFormat, LoggingError, LoggingGuards, init_logging};
pub use restitution::{DEFAULT_GRACE_TOLERANCE_SECS, RestitutionPolicy, apply_restitution};
pub use sample::{Sample, Window};
pub use spread::{IntervalLedger, spread_uptime};
pub use sqf::{SqfAvailability, SqfChronologyEntry, SqfPolicy, SqfStatus, sqf_availability};
pub use state::UptimeState;
pub use trim::trim_chronology;
