//! Shared type definitions for the Ozcast ozone forecast core.
//!
//! These are the values that cross the boundary between the inference
//! core and its collaborators: the precursor record coming in, and the
//! possibility / percentile result going out. Types flow downstream to
//! `TypeScript` via `ts-rs` for forecast dashboards.
//!
//! # Modules
//!
//! - [`ids`] -- Run identifiers and opaque calibration version tags
//! - [`enums`] -- The four ordered severity categories
//! - [`structs`] -- Input records, inference results, and batch records

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::Category;
pub use ids::{RunId, VersionTag};
pub use structs::{
    ClipEvent, InferenceResult, MSLP, MemberForecast, MemberRecord, Percentiles,
    PrecursorRecord, RuleActivation, SNOW, SOLAR, WIND,
};
