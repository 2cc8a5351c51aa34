//! Calibration files and the resolved [`Calibration`].
//!
//! A calibration is one versioned parameter set: universes and terms for
//! the four precursor inputs, the output categories, the rule table and
//! the integration resolution. It is written as YAML, deserialized into
//! the plain `*Spec` structs below, and then built into a [`Calibration`]
//! that is validated once and immutable afterwards.
//!
//! Two calibrations ship with the crate (see [`BUILT_IN`]). Their rule
//! tables are illustrative; operational tables are supplied by the
//! forecasting team as additional files.

use std::collections::BTreeMap;
use std::path::Path;

use ozcast_types::{Category, MSLP, SNOW, SOLAR, VersionTag, WIND};
use serde::Deserialize;
use tracing::info;

use crate::aggregation::{DEFAULT_RESOLUTION, MIN_RESOLUTION, OutputSpace};
use crate::coverage::{CoverageReport, check_coverage};
use crate::error::{ConfigError, ConfigurationError};
use crate::membership::{Interval, MembershipFunction};
use crate::registry::{Role, Term, VariableId, VariableRegistry};
use crate::rules::{RuleBase, RuleSpec};

/// Calibrations compiled into the crate, as `(version, yaml)`.
pub const BUILT_IN: [(&str, &str); 2] = [
    ("v0.9", include_str!("../calibrations/v0.9.yaml")),
    ("v1.0", include_str!("../calibrations/v1.0.yaml")),
];

const fn default_resolution() -> u32 {
    DEFAULT_RESOLUTION
}

fn default_output_name() -> String {
    "ozone".to_owned()
}

fn default_output_unit() -> String {
    "ppb".to_owned()
}

// ---------------------------------------------------------------------------
// File format
// ---------------------------------------------------------------------------

/// Top-level structure of a calibration YAML file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CalibrationFile {
    /// Version tag this file defines.
    pub version: VersionTag,

    /// Integration grid intervals for percentile extraction.
    #[serde(default = "default_resolution")]
    pub resolution: u32,

    /// Free-form description.
    #[serde(default)]
    pub description: String,

    /// The precursor input variables.
    pub inputs: Vec<VariableSpec>,

    /// The output variable and its categories.
    pub output: OutputSpec,

    /// The rule table, in evaluation order.
    pub rules: Vec<RuleEntry>,
}

impl CalibrationFile {
    /// Load a calibration file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not a valid calibration.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse a calibration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not a valid calibration.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// An input variable as written in YAML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VariableSpec {
    /// Variable name; one of `snow`, `mslp`, `wind`, `solar`.
    pub name: String,

    /// Unit label.
    #[serde(default)]
    pub unit: String,

    /// `[lo, hi]`.
    pub universe: [f64; 2],

    /// Terms in declaration order.
    pub terms: Vec<TermSpec>,
}

/// A linguistic term as written in YAML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TermSpec {
    /// Term name.
    pub name: String,

    /// Shape and breakpoints.
    #[serde(flatten)]
    pub function: MembershipFunction,
}

/// The output variable as written in YAML.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutputSpec {
    /// Variable name.
    #[serde(default = "default_output_name")]
    pub name: String,

    /// Unit label.
    #[serde(default = "default_output_unit")]
    pub unit: String,

    /// `[lo, hi]`.
    pub universe: [f64; 2],

    /// Membership function of each category.
    pub categories: BTreeMap<Category, MembershipFunction>,
}

/// A rule as written in YAML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleEntry {
    /// Unique rule identifier.
    pub id: String,

    /// Variable name to required term.
    pub when: BTreeMap<String, String>,

    /// Consequent category.
    pub then: Category,
}

impl From<&RuleEntry> for RuleSpec {
    fn from(entry: &RuleEntry) -> Self {
        Self {
            id: entry.id.clone(),
            when: entry
                .when
                .iter()
                .map(|(v, t)| (v.clone(), t.clone()))
                .collect(),
            then: entry.then,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved calibration
// ---------------------------------------------------------------------------

/// A validated, immutable calibration ready for inference.
///
/// A `Calibration` is plain data and is `Send + Sync`; share it across
/// threads behind an [`std::sync::Arc`].
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    version: VersionTag,
    description: String,
    resolution: u32,
    registry: VariableRegistry,
    inputs: [VariableId; 4],
    output: OutputSpace,
    rules: RuleBase,
}

impl Calibration {
    /// Validate a parsed file and resolve it into a calibration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] for any structural defect: bad
    /// universes or terms, a missing or unexpected input, a missing or
    /// overlapping category, a resolution below the minimum or too coarse
    /// for a category support, or a rule that does not resolve.
    pub fn build(file: &CalibrationFile) -> Result<Self, ConfigurationError> {
        if file.resolution < MIN_RESOLUTION {
            return Err(ConfigurationError::InvalidResolution {
                resolution: file.resolution,
                minimum: MIN_RESOLUTION,
            });
        }

        let mut registry = VariableRegistry::new();
        for spec in &file.inputs {
            if ![SNOW, MSLP, WIND, SOLAR].contains(&spec.name.as_str()) {
                return Err(ConfigurationError::UnsupportedInput {
                    variable: spec.name.clone(),
                });
            }
            let terms = spec
                .terms
                .iter()
                .map(|t| Term::new(t.name.clone(), t.function))
                .collect();
            let [lo, hi] = spec.universe;
            registry.register_variable(
                &spec.name,
                &spec.unit,
                Role::Input,
                Interval::new(lo, hi),
                terms,
            )?;
        }

        let input_id = |name: &str| {
            registry
                .variable_id(name)
                .ok_or_else(|| ConfigurationError::MissingInput {
                    variable: name.to_owned(),
                })
        };
        let inputs = [
            input_id(SNOW)?,
            input_id(MSLP)?,
            input_id(WIND)?,
            input_id(SOLAR)?,
        ];

        let output_terms = file
            .output
            .categories
            .iter()
            .map(|(category, function)| Term::new(category.as_str(), *function))
            .collect();
        let [lo, hi] = file.output.universe;
        let output_id = registry.register_variable(
            &file.output.name,
            &file.output.unit,
            Role::Output,
            Interval::new(lo, hi),
            output_terms,
        )?;
        let output_variable =
            registry
                .variable(output_id)
                .ok_or_else(|| ConfigurationError::MissingCategory {
                    category: Category::Background,
                })?;
        let output = OutputSpace::new(output_id, output_variable)?;
        output.check_resolution(file.resolution)?;

        let specs: Vec<RuleSpec> = file.rules.iter().map(RuleSpec::from).collect();
        let rules = RuleBase::new(&specs, &registry, &output)?;

        info!(
            version = %file.version,
            inputs = inputs.len(),
            rules = rules.len(),
            resolution = file.resolution,
            description = %file.description,
            "calibration built"
        );

        Ok(Self {
            version: file.version.clone(),
            description: file.description.clone(),
            resolution: file.resolution,
            registry,
            inputs,
            output,
            rules,
        })
    }

    /// Parse and build a calibration from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] for malformed YAML and
    /// [`ConfigError::Invalid`] for a structurally invalid calibration.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let file = CalibrationFile::parse(yaml)?;
        Ok(Self::build(&file)?)
    }

    /// Load and build a calibration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or built.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = CalibrationFile::from_file(path)?;
        Ok(Self::build(&file)?)
    }

    /// Build one of the compiled-in calibrations.
    ///
    /// Returns `None` if no built-in carries that tag.
    pub fn built_in(version: &str) -> Option<Result<Self, ConfigError>> {
        BUILT_IN
            .iter()
            .find(|(tag, _)| *tag == version)
            .map(|(_, yaml)| Self::parse(yaml))
    }

    /// Version tag.
    pub const fn version(&self) -> &VersionTag {
        &self.version
    }

    /// Free-form description from the file.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Integration grid intervals.
    pub const fn resolution(&self) -> u32 {
        self.resolution
    }

    /// The variable registry.
    pub const fn registry(&self) -> &VariableRegistry {
        &self.registry
    }

    /// Input variable ids in [`ozcast_types::PrecursorRecord::named_values`] order.
    pub const fn inputs(&self) -> &[VariableId; 4] {
        &self.inputs
    }

    /// The output variable with its category bands.
    pub const fn output(&self) -> &OutputSpace {
        &self.output
    }

    /// The resolved rule base.
    pub const fn rules(&self) -> &RuleBase {
        &self.rules
    }

    /// Check which input term combinations no rule covers.
    pub fn coverage(&self) -> CoverageReport {
        check_coverage(&self.registry, &self.rules)
    }
}
