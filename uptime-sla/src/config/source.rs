//! Provenance tracking for configuration values.

use serde::Serialize;

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Built-in default.
    Default,
    /// TOML configuration file.
    File,
    /// `SLA_*` environment variable.
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            Self::Default => "default",
            Self::File => "file",
            Self::Environment => "environment",
        };
        write!(f, "{value}")
    }
}

/// A value paired with its source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sourced<T> {
    pub value: T,
    pub source: ConfigSource,
    /// Variable name when the value was read from the environment.
    pub env_var: Option<String>,
}

impl<T> Sourced<T> {
    pub fn default_value(value: T) -> Self {
        Self {
            value,
            source: ConfigSource::Default,
            env_var: None,
        }
    }

    pub fn from_env(value: T, var: String) -> Self {
        Self {
            value,
            source: ConfigSource::Environment,
            env_var: Some(var),
        }
    }

    pub fn from_file(value: T) -> Self {
        Self {
            value,
            source: ConfigSource::File,
            env_var: None,
        }
    }

    /// Whether the environment supplied this value.
    pub fn is_override(&self) -> bool {
        self.source == ConfigSource::Environment
    }

    /// Convert the value, keeping its provenance.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        Sourced {
            value: f(self.value),
            source: self.source,
            env_var: self.env_var,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sourced_constructors() {
        let d = Sourced::default_value(300_i64);
        assert_eq!(d.source, ConfigSource::Default);
        assert!(!d.is_override());

        let e = Sourced::from_env(0.5_f64, "SLA_TOLERANCE_RATIO".to_string());
        assert!(e.is_override());
        assert_eq!(e.env_var.as_deref(), Some("SLA_TOLERANCE_RATIO"));

        assert_eq!(Sourced::from_file(1).source.to_string(), "file");
    }

    #[test]
    fn test_map_keeps_source() {
        let e = Sourced::from_env(600_i64, "SLA_GRACE_TOLERANCE_SECS".to_string()).map(|v| v.to_string());
        assert_eq!(e.value, "600");
        assert!(e.is_override());
        assert_eq!(e.env_var.as_deref(), Some("SLA_GRACE_TOLERANCE_SECS"));
    }
}
