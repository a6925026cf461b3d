use serde::Deserialize;
use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use uptime_sla::{ChronologyEntry, Sample, UptimeSlaCalculator, Window};

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_thread_ids(true)
                    .json(),
            )
            .with(filter)
            .init();
    });
}

#[allow(dead_code)]
pub fn fixture(name: &str) -> &'static str {
    match name {
        "uptime_series.json" => include_str!("../fixtures/uptime_series.json"),
        "all_down.json" => include_str!("../fixtures/all_down.json"),
        "all_up.json" => include_str!("../fixtures/all_up.json"),
        "chronology_series.json" => include_str!("../fixtures/chronology_series.json"),
        "sqf_scenario.json" => include_str!("../fixtures/sqf_scenario.json"),
        other => panic!("unknown fixture: {other}"),
    }
}

/// A sample-series fixture.
#[allow(dead_code)]
#[derive(Debug, Clone, Deserialize)]
pub struct Series {
    pub start_time: i64,
    pub end_time: i64,
    pub tolerance_ratio: f64,
    pub samples: Vec<Sample>,
}

#[allow(dead_code)]
impl Series {
    pub fn load(name: &str) -> Self {
        serde_json::from_str(fixture(name)).expect("fixture should parse")
    }

    pub fn window(&self) -> Window {
        Window::new(self.start_time, self.end_time)
    }

    pub fn calculator(&self) -> UptimeSlaCalculator {
        UptimeSlaCalculator::from_samples(self.window(), &self.samples, self.tolerance_ratio)
            .expect("fixture should validate")
    }
}

#[allow(dead_code)]
#[derive(Debug, Clone, Deserialize)]
pub struct SqfReading {
    pub timestamp: i64,
    pub value: f64,
}

/// A hand-built chronology with its signal-quality series.
#[allow(dead_code)]
#[derive(Debug, Clone, Deserialize)]
pub struct SqfScenario {
    pub rain_quota: i64,
    pub chronology: Vec<ChronologyEntry>,
    pub sqf: Vec<SqfReading>,
}

#[allow(dead_code)]
impl SqfScenario {
    pub fn load(name: &str) -> Self {
        serde_json::from_str(fixture(name)).expect("fixture should parse")
    }

    pub fn sqf_timestamps(&self) -> Vec<i64> {
        self.sqf.iter().map(|r| r.timestamp).collect()
    }

    pub fn sqf_values(&self) -> Vec<f64> {
        self.sqf.iter().map(|r| r.value).collect()
    }
}

#[allow(dead_code)]
pub fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.expect("ratio should be defined");
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {expected}, got {actual}"
    );
}
