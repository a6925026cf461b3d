//! Availability reports for uptime counter series.
#![forbid(unsafe_code)]

mod input;
mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use input::InputDocument;
use render::{OutputFormat, RatiosReport, Render, SqfReport, StatesReport};
use std::path::PathBuf;
use tracing::{debug, error, info};
use uptime_sla::{
    LogConfig, SlaConfig, SlaError, apply_restitution, init_logging, sqf_availability,
};

/// Exit status when the input series or SQF readings are rejected.
const EXIT_INPUT_ERROR: i32 = 2;
/// Exit status when configuration cannot be resolved.
const EXIT_CONFIG_ERROR: i32 = 3;

#[derive(Parser)]
#[command(name = "uptime-sla", about = "Availability reports for uptime counter series")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML config file (defaults, then file, then SLA_* environment)
    #[arg(short, long, global = true, env = "SLA_CONFIG")]
    config: Option<PathBuf>,

    /// Output format (json or pretty)
    #[arg(long, global = true, default_value = "json")]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every availability ratio and the uptime/downtime totals
    Ratios {
        /// Input document (`-` for stdin)
        input: PathBuf,
    },

    /// Print the up/down/open label of each sample
    States {
        /// Input document (`-` for stdin)
        input: PathBuf,
    },

    /// Print the cause-attributed chronology and its availability
    Chronology {
        /// Input document (`-` for stdin)
        input: PathBuf,

        /// Accounting window start (defaults to the document's start_time)
        #[arg(long)]
        trim_start: Option<i64>,

        /// Accounting window end (defaults to the document's end_time)
        #[arg(long)]
        trim_end: Option<i64>,

        /// Close the period: leading and trailing open time becomes power failure
        #[arg(long = "final")]
        final_calc: bool,
    },

    /// Settle link-failure restitution against signal quality and a rain quota
    Sqf {
        /// Input document (`-` for stdin) with an `sqf` array
        input: PathBuf,

        /// Rain quota for this period (defaults to the configured quota)
        #[arg(long)]
        rain_quota: Option<i64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env("info").with_stderr();
    if cli.verbose {
        log_config = log_config.with_level("debug");
    }
    let logging_guards = init_logging(&log_config)?;

    match run(cli) {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(err) => {
            let Some(sla_err) = err.downcast_ref::<SlaError>() else {
                return Err(err);
            };
            error!(input_error = sla_err.is_input_error(), "{:#}", err);
            eprintln!("Error: {:#}", err);
            let code = exit_code(sla_err);
            drop(logging_guards);
            std::process::exit(code);
        }
    }
}

fn exit_code(err: &SlaError) -> i32 {
    if err.is_input_error() {
        EXIT_INPUT_ERROR
    } else {
        EXIT_CONFIG_ERROR
    }
}

fn run(cli: Cli) -> Result<String> {
    let resolved = SlaConfig::resolve_sourced(cli.config.as_deref())
        .map_err(SlaError::from)
        .context("failed to load configuration")?;
    for (key, sourced) in &resolved.sources {
        debug!(key, value = %sourced.value, source = %sourced.source, "config setting");
    }
    for (key, sourced) in resolved.overrides() {
        info!(key, env_var = ?sourced.env_var, value = %sourced.value, "config override from environment");
    }
    let config = resolved.config;

    let output = match cli.command {
        Commands::Ratios { input } => {
            let calc = InputDocument::load(&input)?.calculator(config.tolerance_ratio)?;
            RatiosReport::from_calculator(&calc).render(cli.format)?
        }
        Commands::States { input } => {
            let doc = InputDocument::load(&input)?;
            let calc = doc.calculator(config.tolerance_ratio)?;
            StatesReport {
                timestamps: doc.samples.iter().map(|s| s.timestamp).collect(),
                states: calc.uptime_states(),
            }
            .render(cli.format)?
        }
        Commands::Chronology {
            input,
            trim_start,
            trim_end,
            final_calc,
        } => {
            let doc = InputDocument::load(&input)?;
            let calc = doc
                .calculator(config.tolerance_ratio)?
                .with_restitution_policy(config.restitution);
            let s_trim = trim_start.unwrap_or(doc.start_time);
            let e_trim = trim_end.unwrap_or(doc.end_time);
            let result = calc.trimmed_availability(s_trim, e_trim, final_calc);
            info!(s_trim, e_trim, final_calc, ratio = ?result.ratio, "chronology report");
            result.render(cli.format)?
        }
        Commands::Sqf { input, rain_quota } => {
            let doc = InputDocument::load(&input)?;
            let calc = doc.calculator(config.tolerance_ratio)?;
            let chronology = apply_restitution(calc.chronology(), &config.restitution);
            let quota = rain_quota.unwrap_or(config.rain_quota);
            let (availability, rain_quota_remaining) = sqf_availability(
                &chronology,
                &doc.sqf_timestamps(),
                &doc.sqf_values(),
                quota,
                &config.sqf,
            )
            .map_err(SlaError::from)
            .context("sqf readings do not match the chronology")?;
            info!(
                quota,
                rain_quota_remaining,
                availability = ?availability.availability,
                "sqf report"
            );
            SqfReport {
                availability,
                rain_quota_remaining,
            }
            .render(cli.format)?
        }
    };
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uptime_sla::{ConfigError, InputMismatchError, ValidationError};

    #[test]
    fn test_exit_code_by_error_kind() {
        assert_eq!(exit_code(&ValidationError::EmptyTimestamps.into()), EXIT_INPUT_ERROR);
        assert_eq!(exit_code(&InputMismatchError::Empty("sqf values").into()), EXIT_INPUT_ERROR);
        let config = ConfigError::Env(Vec::new());
        assert_eq!(exit_code(&config.into()), EXIT_CONFIG_ERROR);
    }

    #[test]
    fn test_context_keeps_sla_error_reachable() {
        let err = Err::<(), _>(SlaError::from(ValidationError::EmptyTimestamps))
            .context("invalid sample series")
            .unwrap_err();
        let sla_err = err.downcast_ref::<SlaError>().expect("downcast");
        assert!(sla_err.is_input_error());
        assert!(format!("{err:#}").contains("timestamp array is empty"));
    }

    #[test]
    fn test_cli_parses_chronology_flags() {
        let cli = Cli::try_parse_from([
            "uptime-sla",
            "--format",
            "pretty",
            "chronology",
            "series.json",
            "--trim-start",
            "100",
            "--final",
        ])
        .expect("parse");
        assert_eq!(cli.format, OutputFormat::Pretty);
        match cli.command {
            Commands::Chronology {
                trim_start,
                trim_end,
                final_calc,
                ..
            } => {
                assert_eq!(trim_start, Some(100));
                assert_eq!(trim_end, None);
                assert!(final_calc);
            }
            _ => panic!("expected chronology subcommand"),
        }
    }
}
