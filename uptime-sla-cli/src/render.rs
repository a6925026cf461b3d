//! Report shapes and their JSON / human-readable renderings.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;
use uptime_sla::{AvailabilityResult, ChronologyEntry, SqfAvailability, UptimeSlaCalculator, UptimeState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Debug, Serialize)]
pub struct RatiosReport {
    pub presence: Option<f64>,
    pub spread: Option<f64>,
    pub service_state: Option<f64>,
    pub exception: Option<f64>,
    pub uptime_secs: i64,
    pub downtime_secs: i64,
}

impl RatiosReport {
    pub fn from_calculator(calc: &UptimeSlaCalculator) -> Self {
        let (uptime_secs, downtime_secs) = calc.total_uptime_and_downtime();
        Self {
            presence: calc.presence_availability(),
            spread: calc.spread_availability(),
            service_state: calc.service_state_availability(),
            exception: calc.exception_availability(),
            uptime_secs,
            downtime_secs,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatesReport {
    pub timestamps: Vec<i64>,
    pub states: Vec<UptimeState>,
}

#[derive(Debug, Serialize)]
pub struct SqfReport {
    #[serde(flatten)]
    pub availability: SqfAvailability,
    pub rain_quota_remaining: i64,
}

/// Something the CLI can print.
pub trait Render: Serialize {
    fn pretty(&self) -> String;

    fn render(&self, format: OutputFormat) -> Result<String> {
        Ok(match format {
            OutputFormat::Json => serde_json::to_string(self)?,
            OutputFormat::Pretty => self.pretty(),
        })
    }
}

fn ratio(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4} ({:.2}%)", v, v * 100.0),
        None => "undefined".to_string(),
    }
}

fn timestamp(secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| secs.to_string())
}

fn chronology_table(out: &mut String, entries: &[ChronologyEntry], extra: impl Fn(usize) -> String) {
    for (i, e) in entries.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {} .. {}  {:>6}s  {:<13}  lf={:<6} restitution={:<6}{}",
            timestamp(e.start_timestamp),
            timestamp(e.end_timestamp),
            e.duration(),
            e.status.to_string(),
            e.link_failure_duration,
            e.restitution_duration,
            extra(i),
        );
    }
}

impl Render for RatiosReport {
    fn pretty(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "presence       {}", ratio(self.presence));
        let _ = writeln!(out, "spread         {}", ratio(self.spread));
        let _ = writeln!(out, "service state  {}", ratio(self.service_state));
        let _ = writeln!(out, "exception      {}", ratio(self.exception));
        let _ = write!(out, "uptime {}s, downtime {}s", self.uptime_secs, self.downtime_secs);
        out
    }
}

impl Render for StatesReport {
    fn pretty(&self) -> String {
        self.timestamps
            .iter()
            .zip(&self.states)
            .map(|(&ts, state)| format!("{}  {}", timestamp(ts), state))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Render for AvailabilityResult {
    fn pretty(&self) -> String {
        let mut out = String::new();
        chronology_table(&mut out, &self.chronology, |_| String::new());
        let _ = write!(
            out,
            "availability {}  link_failure={}s restitution={}s open={}s",
            ratio(self.ratio),
            self.link_failure_duration,
            self.restitution_duration,
            self.open_duration
        );
        out
    }
}

impl Render for SqfReport {
    fn pretty(&self) -> String {
        let report = &self.availability;
        let entries: Vec<ChronologyEntry> = report.entries.iter().map(|e| e.entry.clone()).collect();
        let mut out = String::new();
        chronology_table(&mut out, &entries, |i| {
            let e = &report.entries[i];
            format!(" sqf={:<5} {:<14} quota={}", e.sqf_value, e.sqf_status.to_string(), e.remaining_rain_quota)
        });
        let _ = write!(
            out,
            "availability {}  charged={}s open={}s quota_used={} quota_remaining={}",
            ratio(report.availability),
            report.charged_restitution,
            report.open_duration,
            report.rain_quota_used,
            self.rain_quota_remaining
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_formatting() {
        assert_eq!(ratio(Some(0.5)), "0.5000 (50.00%)");
        assert_eq!(ratio(None), "undefined");
    }

    #[test]
    fn test_timestamp_formatting() {
        assert_eq!(timestamp(1_546_300_800), "2019-01-01 00:00:00");
    }

    #[test]
    fn test_ratios_json_and_pretty() {
        let calc = UptimeSlaCalculator::new(0, 400, &[100, 200, 300, 400], &[100, 200, 0, 0], 0.9, None)
            .expect("valid");
        let report = RatiosReport::from_calculator(&calc);

        let json: serde_json::Value =
            serde_json::from_str(&report.render(OutputFormat::Json).expect("render")).expect("json");
        assert_eq!(json["spread"], 0.5);
        assert_eq!(json["uptime_secs"], 200);
        assert_eq!(json["downtime_secs"], 200);

        let pretty = report.render(OutputFormat::Pretty).expect("render");
        assert!(pretty.contains("spread         0.5000 (50.00%)"));
    }

    #[test]
    fn test_states_pretty() {
        let report = StatesReport {
            timestamps: vec![0, 300],
            states: vec![UptimeState::Up, UptimeState::Open],
        };
        assert_eq!(
            report.pretty(),
            "1970-01-01 00:00:00  up\n1970-01-01 00:05:00  open"
        );
    }
}
