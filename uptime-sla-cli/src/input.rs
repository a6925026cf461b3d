//! JSON input documents.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use uptime_sla::{Sample, SlaError, UptimeSlaCalculator, Window};

/// One signal-quality reading, keyed by the chronology entry start it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct SqfReading {
    pub timestamp: i64,
    pub value: f64,
}

/// A device's sample series for one reporting window.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputDocument {
    pub start_time: i64,
    pub end_time: i64,
    /// Overrides the configured tolerance ratio when present.
    #[serde(default)]
    pub tolerance_ratio: Option<f64>,
    pub samples: Vec<Sample>,
    #[serde(default)]
    pub sqf: Vec<SqfReading>,
}

impl InputDocument {
    /// Read from `path`, or from stdin when `path` is `-`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = if path == Path::new("-") {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read input from stdin")?;
            buf
        } else {
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read input file {}", path.display()))?
        };
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("failed to parse input document")
    }

    pub fn window(&self) -> Window {
        Window::new(self.start_time, self.end_time)
    }

    pub fn calculator(&self, default_tolerance: f64) -> Result<UptimeSlaCalculator> {
        let tolerance = self.tolerance_ratio.unwrap_or(default_tolerance);
        UptimeSlaCalculator::from_samples(self.window(), &self.samples, tolerance)
            .map_err(SlaError::from)
            .context("invalid sample series")
    }

    pub fn sqf_timestamps(&self) -> Vec<i64> {
        self.sqf.iter().map(|r| r.timestamp).collect()
    }

    pub fn sqf_values(&self) -> Vec<f64> {
        self.sqf.iter().map(|r| r.value).collect()
    }
}
