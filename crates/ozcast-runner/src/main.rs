//! Batch harness for the Ozcast winter-ozone inference core.
//!
//! Stands in for the upstream ensemble collaborator: it loads the
//! calibrations, reads one record per ensemble member, runs an independent
//! inference per member (and per comparison version), and writes the
//! forecasts as JSON lines on stdout. Logs go to stderr.
//!
//! # Architecture
//!
//! ```text
//! members.json --> BatchRunner --(spawn_blocking x N)--> Calibration::infer --> stdout
//! ```

mod batch;
mod config;
mod error;

use ozcast_core::{Calibration, CalibrationSet};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::batch::{BatchRunner, load_members, write_json_lines};
use crate::config::RunnerConfig;
use crate::error::RunnerError;

/// Application entry point.
///
/// Initializes logging, loads configuration from environment variables,
/// builds the calibration set, then runs one batch and exits.
///
/// # Errors
///
/// Returns an error if configuration, calibration loading, member input,
/// or output fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    info!("ozcast-runner starting");

    let config = RunnerConfig::from_env()?;
    info!(
        input = %config.input.display(),
        calibrations = config.calibrations.len(),
        version = %config.version,
        compare_version = ?config.compare_version.as_ref().map(ToString::to_string),
        max_concurrent = config.max_concurrent,
        "configuration loaded"
    );

    let set = load_calibrations(&config)?;
    if config.check_coverage {
        for tag in set.versions() {
            let calibration = set.get(tag)?;
            let report = calibration.coverage();
            for combination in &report.uncovered {
                warn!(version = %tag, combination = ?combination, "uncovered input combination");
            }
        }
    }

    let calibrations = config
        .versions()
        .iter()
        .map(|tag| set.get(tag))
        .collect::<Result<Vec<_>, _>>()?;

    let members = load_members(&config.input)?;
    let runner = BatchRunner::new(calibrations, config.max_concurrent);
    let outcome = runner.run(members).await?;

    write_json_lines(std::io::stdout().lock(), &outcome.forecasts)?;

    if !outcome.failed.is_empty() {
        warn!(
            run_id = %runner.run_id(),
            failed = ?outcome.failed,
            "some members produced no forecast"
        );
    }
    Ok(())
}

/// Install the global subscriber. `LOG_FORMAT=json` selects JSON output.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Built-in calibrations, or the configured files when any are given.
fn load_calibrations(config: &RunnerConfig) -> Result<CalibrationSet, RunnerError> {
    if config.calibrations.is_empty() {
        return Ok(CalibrationSet::built_in()?);
    }
    let mut set = CalibrationSet::new();
    for path in &config.calibrations {
        let calibration = Calibration::from_file(path)?;
        info!(
            path = %path.display(),
            version = %calibration.version(),
            "calibration loaded"
        );
        set.insert(calibration).map_err(ozcast_core::ConfigError::from)?;
    }
    Ok(set)
}
