//! Fuzzy inference core of the Ozcast winter-ozone forecast.
//!
//! Four precursor scalars (snow depth, mean-sea-level pressure, wind speed
//! and shortwave irradiance) are turned into a possibility distribution
//! over four severity categories plus p10/p50/p90 concentration estimates,
//! with the unexplained remainder reported as ignorance.
//!
//! # Modules
//!
//! - [`membership`] -- Piecewise-linear shapes and closed intervals.
//! - [`registry`] -- Variables, universes of discourse, and terms.
//! - [`fuzzifier`] -- Crisp-to-fuzzy conversion with clipping.
//! - [`rules`] -- Rule resolution, firing strength, and implication.
//! - [`coverage`] -- Offline check for uncovered term combinations.
//! - [`aggregation`] -- Max aggregation, possibilities, and percentiles.
//! - [`config`] -- Calibration YAML and the resolved [`Calibration`].
//! - [`versions`] -- [`CalibrationSet`] and the hot-swappable [`CalibrationHandle`].
//! - [`engine`] -- The per-call pipeline, [`Calibration::infer`].
//! - [`error`] -- Configuration and inference error types.
//!
//! [`Calibration`]: config::Calibration
//! [`Calibration::infer`]: config::Calibration::infer
//! [`CalibrationSet`]: versions::CalibrationSet
//! [`CalibrationHandle`]: versions::CalibrationHandle

pub mod aggregation;
pub mod config;
pub mod coverage;
pub mod engine;
pub mod error;
pub mod fuzzifier;
pub mod membership;
pub mod registry;
pub mod rules;
pub mod versions;

pub use config::{BUILT_IN, Calibration, CalibrationFile};
pub use coverage::{CoverageReport, check_coverage};
pub use engine::PERCENTILE_FRACTIONS;
pub use error::{ConfigError, ConfigurationError, InferenceError, UnknownVariableError};
pub use versions::{CalibrationHandle, CalibrationSet};
