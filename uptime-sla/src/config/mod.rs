//! Configuration for SLA report runs.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `SLA_*` environment overrides. The engine itself never reads the
//! environment; callers build an [`SlaConfig`] and pass its parts in.
//!
//! ```toml
//! tolerance_ratio = 0.9
//! rain_quota = 350
//!
//! [restitution]
//! grace_tolerance_secs = 300
//!
//! [sqf]
//! high_threshold = 7.1
//! low_threshold = 3.0
//! ```

pub mod env;
pub mod source;

pub use env::{EnvError, EnvParser};
pub use source::{ConfigSource, Sourced};

use crate::restitution::RestitutionPolicy;
use crate::sqf::SqfPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Default jitter tolerance for the interval spreader.
pub const DEFAULT_TOLERANCE_RATIO: f64 = 0.9;

/// Largest grace tolerance accepted from configuration (one day).
const MAX_GRACE_TOLERANCE_SECS: i64 = 86_400;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("value out of range for {key}: {value} (valid: {min}..={max})")]
    OutOfRange {
        key: String,
        value: String,
        min: String,
        max: String,
    },

    #[error("invalid environment overrides: {}", join_env_errors(.0))]
    Env(Vec<EnvError>),
}

fn join_env_errors(errors: &[EnvError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A resolved config and the layer each setting came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    pub config: SlaConfig,
    /// Rendered setting values keyed by dotted TOML path.
    pub sources: BTreeMap<&'static str, Sourced<String>>,
}

impl ResolvedConfig {
    /// Settings supplied by `SLA_*` variables.
    pub fn overrides(&self) -> impl Iterator<Item = (&'static str, &Sourced<String>)> {
        self.sources
            .iter()
            .filter(|(_, sourced)| sourced.is_override())
            .map(|(key, sourced)| (*key, sourced))
    }
}

/// Settings for one calculation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlaConfig {
    /// Spreader jitter tolerance, `0.0..=1.0`.
    pub tolerance_ratio: f64,
    /// Initial rain quota handed to the SQF engine.
    pub rain_quota: i64,
    pub restitution: RestitutionPolicy,
    pub sqf: SqfPolicy,
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            tolerance_ratio: DEFAULT_TOLERANCE_RATIO,
            rain_quota: 0,
            restitution: RestitutionPolicy::default(),
            sqf: SqfPolicy::default(),
        }
    }
}

impl SlaConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml_str(&read_config_file(path)?)
    }

    /// Defaults (or the given file) with environment overrides applied.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::resolve_sourced(path).map(|resolved| resolved.config)
    }

    /// Like [`Self::resolve`], also reporting where each setting came from.
    pub fn resolve_sourced(path: Option<&Path>) -> Result<ResolvedConfig, ConfigError> {
        let (mut config, file_keys) = match path {
            Some(path) => {
                let content = read_config_file(path)?;
                (Self::from_toml_str(&content)?, toml_keys(&content)?)
            }
            None => (Self::default(), Vec::new()),
        };
        let mut parser = EnvParser::new();
        let mut sources = config.apply_env(&mut parser);
        if parser.has_errors() {
            return Err(ConfigError::Env(parser.take_errors()));
        }
        config.validate()?;

        for (key, sourced) in sources.iter_mut() {
            if !sourced.is_override() && file_keys.iter().any(|k| k == key) {
                *sourced = Sourced::from_file(std::mem::take(&mut sourced.value));
            }
        }
        Ok(ResolvedConfig { config, sources })
    }

    /// Overlay `SLA_*` variables onto this config.
    ///
    /// Malformed variables are left in `parser` and do not change the field.
    /// Returns every setting tagged as default or environment.
    pub fn apply_env(&mut self, parser: &mut EnvParser) -> BTreeMap<&'static str, Sourced<String>> {
        let tolerance = parser.get_f64_range("TOLERANCE_RATIO", self.tolerance_ratio, 0.0, 1.0);
        let grace = parser.get_i64_range(
            "GRACE_TOLERANCE_SECS",
            self.restitution.grace_tolerance_secs,
            0,
            MAX_GRACE_TOLERANCE_SECS,
        );
        let high = parser.get_f64_range("SQF_HIGH_THRESHOLD", self.sqf.high_threshold, 0.0, f64::MAX);
        let low = parser.get_f64_range("SQF_LOW_THRESHOLD", self.sqf.low_threshold, 0.0, f64::MAX);
        let quota = parser.get_i64_range("RAIN_QUOTA", self.rain_quota, 0, i64::MAX);

        for var in [&tolerance.env_var, &grace.env_var, &high.env_var, &low.env_var, &quota.env_var]
            .into_iter()
            .flatten()
        {
            debug!(var = %var, "sla config override from environment");
        }

        self.tolerance_ratio = tolerance.value;
        self.restitution.grace_tolerance_secs = grace.value;
        self.sqf.high_threshold = high.value;
        self.sqf.low_threshold = low.value;
        self.rain_quota = quota.value;

        BTreeMap::from([
            ("tolerance_ratio", tolerance.map(|v| v.to_string())),
            ("rain_quota", quota.map(|v| v.to_string())),
            ("restitution.grace_tolerance_secs", grace.map(|v| v.to_string())),
            ("sqf.high_threshold", high.map(|v| v.to_string())),
            ("sqf.low_threshold", low.map(|v| v.to_string())),
        ])
    }

    /// Reject values the engine cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.tolerance_ratio) {
            return Err(out_of_range("tolerance_ratio", self.tolerance_ratio, 0.0, 1.0));
        }
        let grace = self.restitution.grace_tolerance_secs;
        if !(0..=MAX_GRACE_TOLERANCE_SECS).contains(&grace) {
            return Err(out_of_range(
                "restitution.grace_tolerance_secs",
                grace,
                0,
                MAX_GRACE_TOLERANCE_SECS,
            ));
        }
        if self.rain_quota < 0 {
            return Err(out_of_range("rain_quota", self.rain_quota, 0, i64::MAX));
        }
        if !(self.sqf.low_threshold >= 0.0 && self.sqf.low_threshold <= self.sqf.high_threshold) {
            return Err(out_of_range(
                "sqf.low_threshold",
                self.sqf.low_threshold,
                0.0,
                self.sqf.high_threshold,
            ));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded sla config file");
    Ok(content)
}

/// Dotted paths of the keys a TOML document sets, one table deep.
fn toml_keys(content: &str) -> Result<Vec<String>, ConfigError> {
    let table: toml::Table = toml::from_str(content)?;
    let mut keys = Vec::new();
    for (key, value) in &table {
        match value.as_table() {
            Some(inner) => keys.extend(inner.keys().map(|k| format!("{key}.{k}"))),
            None => keys.push(key.clone()),
        }
    }
    Ok(keys)
}

fn out_of_range<T: ToString>(key: &str, value: T, min: T, max: T) -> ConfigError {
    ConfigError::OutOfRange {
        key: key.to_string(),
        value: value.to_string(),
        min: min.to_string(),
        max: max.to_string(),
    }
}

#[cfg(test)]
pub(crate) fn env_test_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
