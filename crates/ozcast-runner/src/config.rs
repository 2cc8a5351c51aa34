//! Configuration types for the batch runner.
//!
//! All configuration is loaded from environment variables. The runner
//! needs to know which calibrations to load, which version (or pair of
//! versions) to run, and where the member records live.

use std::path::PathBuf;

use ozcast_types::VersionTag;

use crate::error::RunnerError;

/// Version run when `OZCAST_VERSION` is unset.
pub const DEFAULT_VERSION: &str = "v0.9";

/// Complete runner configuration loaded from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Calibration files to load. Empty means the built-in calibrations.
    pub calibrations: Vec<PathBuf>,
    /// Version every member is run against.
    pub version: VersionTag,
    /// Optional second version run side by side for comparison.
    pub compare_version: Option<VersionTag>,
    /// Path to a JSON array of member records.
    pub input: PathBuf,
    /// Maximum number of members inferred at once.
    pub max_concurrent: usize,
    /// Whether to log a rule-coverage report for each loaded calibration.
    pub check_coverage: bool,
}

impl RunnerConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `OZCAST_INPUT` -- path to the member JSON file
    ///
    /// Optional variables:
    /// - `OZCAST_CALIBRATIONS` -- comma-separated calibration YAML paths (default: built-ins)
    /// - `OZCAST_VERSION` -- version to run (default `v0.9`)
    /// - `OZCAST_COMPARE_VERSION` -- second version run alongside
    /// - `OZCAST_MAX_CONCURRENT` -- max members in flight (default 8)
    /// - `OZCAST_CHECK_COVERAGE` -- log rule coverage at startup (default `true`)
    pub fn from_env() -> Result<Self, RunnerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RunnerError> {
        let input = lookup("OZCAST_INPUT")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| RunnerError::Config("missing required env var OZCAST_INPUT".to_owned()))?;

        let calibrations = lookup("OZCAST_CALIBRATIONS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default();

        let version = VersionTag::new(
            lookup("OZCAST_VERSION").unwrap_or_else(|| DEFAULT_VERSION.to_owned()),
        );

        let compare_version = lookup("OZCAST_COMPARE_VERSION")
            .filter(|v| !v.trim().is_empty())
            .map(VersionTag::new);

        let max_concurrent: usize = lookup("OZCAST_MAX_CONCURRENT")
            .unwrap_or_else(|| "8".to_owned())
            .parse()
            .map_err(|e| RunnerError::Config(format!("invalid OZCAST_MAX_CONCURRENT: {e}")))?;
        if max_concurrent == 0 {
            return Err(RunnerError::Config(
                "OZCAST_MAX_CONCURRENT must be at least 1".to_owned(),
            ));
        }

        let check_coverage: bool = lookup("OZCAST_CHECK_COVERAGE")
            .unwrap_or_else(|| "true".to_owned())
            .parse()
            .map_err(|e| RunnerError::Config(format!("invalid OZCAST_CHECK_COVERAGE: {e}")))?;

        Ok(Self {
            calibrations,
            version,
            compare_version,
            input,
            max_concurrent,
            check_coverage,
        })
    }

    /// Versions to run, primary first.
    pub fn versions(&self) -> Vec<VersionTag> {
        std::iter::once(self.version.clone())
            .chain(self.compare_version.clone().filter(|v| *v != self.version))
            .collect()
    }
}
