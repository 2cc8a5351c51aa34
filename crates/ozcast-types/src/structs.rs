//! Record and result structures exchanged with the inference core.
//!
//! Upstream producers hand the core one [`PrecursorRecord`] per ensemble
//! member per forecast step. The core answers with an [`InferenceResult`].
//! Percentiles are `Option<f64>`: `None` means the rule base produced no
//! support at all and there is no numeric forecast. Consumers must branch
//! on it and never substitute a default.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Category;
use crate::ids::{RunId, VersionTag};

/// Input variable name for snow depth.
pub const SNOW: &str = "snow";

/// Input variable name for mean-sea-level pressure.
pub const MSLP: &str = "mslp";

/// Input variable name for 10 m wind speed.
pub const WIND: &str = "wind";

/// Input variable name for incoming shortwave irradiance.
pub const SOLAR: &str = "solar";

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// The four precursor scalars for one member at one forecast step.
///
/// Values are in physical units and are expected to fall inside the
/// calibration's universe of each variable. Unit correctness is the
/// producer's responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PrecursorRecord {
    /// Representative snow depth (mm).
    pub snow_depth_mm: f64,
    /// Mean-sea-level pressure (hPa).
    pub mslp_hpa: f64,
    /// Representative wind speed (m/s).
    pub wind_speed_ms: f64,
    /// Representative incoming shortwave irradiance (W/m^2).
    pub solar_wm2: f64,
}

impl PrecursorRecord {
    /// Construct a record from its four scalars.
    pub const fn new(snow_depth_mm: f64, mslp_hpa: f64, wind_speed_ms: f64, solar_wm2: f64) -> Self {
        Self {
            snow_depth_mm,
            mslp_hpa,
            wind_speed_ms,
            solar_wm2,
        }
    }

    /// Pair each scalar with the input variable name it feeds.
    pub const fn named_values(&self) -> [(&'static str, f64); 4] {
        [
            (SNOW, self.snow_depth_mm),
            (MSLP, self.mslp_hpa),
            (WIND, self.wind_speed_ms),
            (SOLAR, self.solar_wm2),
        ]
    }
}

/// One ensemble member's inputs for one valid time, as supplied by the
/// upstream collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MemberRecord {
    /// Ensemble member label (e.g. `"p03"`).
    pub member: String,
    /// Forecast valid time.
    pub valid_time: DateTime<Utc>,
    /// Precursor scalars.
    #[serde(flatten)]
    pub inputs: PrecursorRecord,
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// A crisp input that fell outside its universe and was clipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ClipEvent {
    /// Variable whose universe was exceeded.
    pub variable: String,
    /// The value as supplied.
    pub original_value: f64,
    /// The nearest universe bound actually used.
    pub clipped_value: f64,
}

/// Firing strength of a single rule for one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RuleActivation {
    /// Rule identifier from the calibration.
    pub rule_id: String,
    /// The rule's consequent category.
    pub consequent: Category,
    /// Minimum of the antecedent degrees, in `[0, 1]`.
    pub strength: f64,
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// The three percentile cut points of the aggregated surface.
///
/// Each is `None` when the aggregated surface has zero area.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Percentiles {
    /// 10th percentile (ppb).
    pub p10: Option<f64>,
    /// Median (ppb).
    pub p50: Option<f64>,
    /// 90th percentile (ppb).
    pub p90: Option<f64>,
}

impl Percentiles {
    /// Percentiles for a surface with no support.
    pub const UNDEFINED: Self = Self {
        p10: None,
        p50: None,
        p90: None,
    };

    /// `true` if all three cut points are defined.
    pub const fn is_defined(&self) -> bool {
        self.p10.is_some() && self.p50.is_some() && self.p90.is_some()
    }
}

/// Full output of one inference call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct InferenceResult {
    /// Calibration version that produced this result.
    pub version: VersionTag,
    /// Possibility of each category, always containing all four.
    ///
    /// These are possibilities, not probabilities; they need not sum to 1.
    pub possibilities: BTreeMap<Category, f64>,
    /// `1 - max(possibilities)`. Positive when the evidence is subnormal.
    pub ignorance: f64,
    /// Concentration percentiles (ppb).
    pub percentiles: Percentiles,
    /// Every rule's firing strength, in rule-table order.
    pub activations: Vec<RuleActivation>,
    /// Inputs that had to be clipped into their universe.
    pub clipped_inputs: Vec<ClipEvent>,
}

impl InferenceResult {
    /// Possibility of a single category (0 if absent).
    pub fn possibility(&self, category: Category) -> f64 {
        self.possibilities.get(&category).copied().unwrap_or(0.0)
    }

    /// The most possible category, ties resolved toward the more severe one.
    ///
    /// Returns `None` when every possibility is zero.
    pub fn dominant_category(&self) -> Option<Category> {
        self.possibilities
            .iter()
            .filter(|&(_, &p)| p > 0.0)
            .max_by(|a, b| a.1.total_cmp(b.1).then(a.0.cmp(b.0)))
            .map(|(&c, _)| c)
    }
}

/// One member's forecast as emitted by a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MemberForecast {
    /// Batch run identifier.
    pub run_id: RunId,
    /// When the forecast was issued.
    pub issued_at: DateTime<Utc>,
    /// Ensemble member label.
    pub member: String,
    /// Forecast valid time.
    pub valid_time: DateTime<Utc>,
    /// The inference output.
    pub result: InferenceResult,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_result(possibilities: [f64; 4]) -> InferenceResult {
        InferenceResult {
            version: VersionTag::new("test"),
            possibilities: Category::ALL.into_iter().zip(possibilities).collect(),
            ignorance: 0.0,
            percentiles: Percentiles::UNDEFINED,
            activations: Vec::new(),
            clipped_inputs: Vec::new(),
        }
    }

    #[test]
    fn named_values_follow_variable_names() {
        let record = PrecursorRecord::new(100.0, 1032.0, 1.5, 500.0);
        let names: Vec<&str> = record.named_values().iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec![SNOW, MSLP, WIND, SOLAR]);
    }

    #[test]
    fn undefined_percentiles_serialize_as_null() {
        let json = serde_json::to_value(Percentiles::UNDEFINED).unwrap();
        assert!(json["p10"].is_null());
        assert!(json["p50"].is_null());
        assert!(json["p90"].is_null());
    }

    #[test]
    fn dominant_category_prefers_highest_possibility() {
        let result = sample_result([0.0, 0.2, 0.6, 0.3]);
        assert_eq!(result.dominant_category(), Some(Category::Elevated));
    }

    #[test]
    fn dominant_category_breaks_ties_toward_severity() {
        let result = sample_result([0.5, 0.5, 0.0, 0.0]);
        assert_eq!(result.dominant_category(), Some(Category::Moderate));
    }

    #[test]
    fn dominant_category_is_none_without_support() {
        let result = sample_result([0.0; 4]);
        assert_eq!(result.dominant_category(), None);
    }

    #[test]
    fn member_record_flattens_inputs() {
        let json = r#"{
            "member": "p01",
            "valid_time": "2026-01-15T18:00:00Z",
            "snow_depth_mm": 120.0,
            "mslp_hpa": 1034.0,
            "wind_speed_ms": 1.0,
            "solar_wm2": 420.0
        }"#;
        let record: MemberRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.member, "p01");
        assert!((record.inputs.mslp_hpa - 1034.0).abs() < f64::EPSILON);
    }
}
