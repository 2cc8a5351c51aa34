//! Bounded concurrent inference over a batch of ensemble members.
//!
//! Every member is an independent inference call, optionally repeated for
//! a comparison version. Calls run on the blocking pool (inference is pure
//! CPU work) with at most `max_concurrent` in flight. A member whose
//! inference fails is logged and left out of the output; the rest of the
//! batch carries on.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ozcast_core::{Calibration, InferenceError};
use ozcast_types::{MemberForecast, MemberRecord, RunId};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::error::RunnerError;

/// Read a JSON array of member records.
pub fn load_members(path: &Path) -> Result<Vec<MemberRecord>, RunnerError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// What a batch produced.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// Forecasts in member order, one per member per version.
    pub forecasts: Vec<MemberForecast>,
    /// Labels of members whose inference failed.
    pub failed: Vec<String>,
}

/// Runs batches of members against a fixed list of calibrations.
pub struct BatchRunner {
    run_id: RunId,
    issued_at: DateTime<Utc>,
    calibrations: Vec<Arc<Calibration>>,
    limiter: Arc<Semaphore>,
}

impl BatchRunner {
    /// Create a runner for one batch run.
    pub fn new(calibrations: Vec<Arc<Calibration>>, max_concurrent: usize) -> Self {
        Self {
            run_id: RunId::new(),
            issued_at: Utc::now(),
            calibrations,
            limiter: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// Identifier stamped on every forecast of this run.
    pub const fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Infer every member against every calibration.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Task`] if an inference task panicked, or
    /// [`RunnerError::Limiter`] if the limiter was closed.
    pub async fn run(&self, members: Vec<MemberRecord>) -> Result<BatchOutcome, RunnerError> {
        info!(
            run_id = %self.run_id,
            members = members.len(),
            versions = self.calibrations.len(),
            "batch started"
        );

        let mut tasks: JoinSet<(usize, MemberRecord, Result<Vec<MemberForecast>, InferenceError>)> =
            JoinSet::new();
        for (index, member) in members.into_iter().enumerate() {
            let permit = Arc::clone(&self.limiter).acquire_owned().await?;
            let calibrations = self.calibrations.clone();
            let run_id = self.run_id;
            let issued_at = self.issued_at;
            tasks.spawn_blocking(move || {
                let result = infer_member(&calibrations, &member, run_id, issued_at);
                drop(permit);
                (index, member, result)
            });
        }

        let mut completed: Vec<(usize, Vec<MemberForecast>)> = Vec::new();
        let mut failed: Vec<(usize, String)> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (index, member, result) = joined?;
            match result {
                Ok(forecasts) => completed.push((index, forecasts)),
                Err(e) => {
                    warn!(
                        member = member.member,
                        valid_time = %member.valid_time,
                        error = %e,
                        "member inference failed, skipping"
                    );
                    failed.push((index, member.member));
                }
            }
        }

        completed.sort_by_key(|(index, _)| *index);
        failed.sort_by_key(|(index, _)| *index);
        let outcome = BatchOutcome {
            forecasts: completed.into_iter().flat_map(|(_, f)| f).collect(),
            failed: failed.into_iter().map(|(_, m)| m).collect(),
        };

        info!(
            run_id = %self.run_id,
            forecasts = outcome.forecasts.len(),
            failed = outcome.failed.len(),
            "batch finished"
        );
        Ok(outcome)
    }
}

fn infer_member(
    calibrations: &[Arc<Calibration>],
    member: &MemberRecord,
    run_id: RunId,
    issued_at: DateTime<Utc>,
) -> Result<Vec<MemberForecast>, InferenceError> {
    calibrations
        .iter()
        .map(|calibration| {
            Ok(MemberForecast {
                run_id,
                issued_at,
                member: member.member.clone(),
                valid_time: member.valid_time,
                result: calibration.infer(&member.inputs)?,
            })
        })
        .collect()
}

/// Write one JSON object per line.
pub fn write_json_lines<W: Write>(mut writer: W, forecasts: &[MemberForecast]) -> Result<(), RunnerError> {
    for forecast in forecasts {
        serde_json::to_writer(&mut writer, forecast)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
