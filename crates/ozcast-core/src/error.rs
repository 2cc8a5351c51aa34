//! Error types for the `ozcast-core` crate.
//!
//! Errors fall into two tiers. [`ConfigurationError`] (and the loader's
//! [`ConfigError`]) are structural and fatal: they are raised while a
//! calibration is being built, before any inference runs. [`InferenceError`]
//! covers the few per-call failures that cannot be recovered by clipping.
//! Out-of-universe inputs and zero-area surfaces are not errors at all;
//! they are logged and reflected in the result.

use ozcast_types::{Category, VersionTag};

/// Structural defects in a calibration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    /// The universe bounds are non-finite or not strictly increasing.
    #[error("variable {variable}: invalid universe [{lo}, {hi}]")]
    InvalidUniverse {
        /// Variable being registered.
        variable: String,
        /// Lower bound as supplied.
        lo: f64,
        /// Upper bound as supplied.
        hi: f64,
    },

    /// A breakpoint is NaN or infinite.
    #[error("variable {variable}, term {term}: non-finite breakpoint")]
    NonFiniteBreakpoint {
        /// Owning variable.
        variable: String,
        /// Offending term.
        term: String,
    },

    /// Breakpoints decrease somewhere along the shape.
    #[error("variable {variable}, term {term}: breakpoints must be non-decreasing")]
    DecreasingBreakpoints {
        /// Owning variable.
        variable: String,
        /// Offending term.
        term: String,
    },

    /// A breakpoint lies outside the variable's universe.
    #[error("variable {variable}, term {term}: breakpoint {value} outside universe [{lo}, {hi}]")]
    BreakpointOutsideUniverse {
        /// Owning variable.
        variable: String,
        /// Offending term.
        term: String,
        /// The breakpoint.
        value: f64,
        /// Universe lower bound.
        lo: f64,
        /// Universe upper bound.
        hi: f64,
    },

    /// Two terms of one variable share a name.
    #[error("variable {variable}: duplicate term {term}")]
    DuplicateTerm {
        /// Owning variable.
        variable: String,
        /// Repeated term name.
        term: String,
    },

    /// A variable has no terms.
    #[error("variable {variable}: no terms defined")]
    NoTerms {
        /// The empty variable.
        variable: String,
    },

    /// A variable name was registered twice.
    #[error("duplicate variable {variable}")]
    DuplicateVariable {
        /// Repeated variable name.
        variable: String,
    },

    /// One of the four precursor inputs is not defined.
    #[error("required input variable {variable} is not defined")]
    MissingInput {
        /// The missing input name.
        variable: String,
    },

    /// An input variable is defined that no precursor record can supply.
    #[error("input variable {variable} is not one of the supported precursors")]
    UnsupportedInput {
        /// The unexpected input name.
        variable: String,
    },

    /// The output variable lacks one of the four categories.
    #[error("output variable does not define category {category}")]
    MissingCategory {
        /// The missing category.
        category: Category,
    },

    /// A category's membership has no positive-width support.
    #[error("category {category} has an empty support")]
    EmptyCategorySupport {
        /// The degenerate category.
        category: Category,
    },

    /// Another category is positive somewhere on a category's core.
    #[error("category {other} overlaps the core of category {category}")]
    OverlappingCategoryCore {
        /// Category whose core is invaded.
        category: Category,
        /// Category reaching into it.
        other: Category,
    },

    /// The integration grid has too few intervals.
    #[error("resolution {resolution} is too coarse (minimum {minimum})")]
    InvalidResolution {
        /// Configured interval count.
        resolution: u32,
        /// Smallest accepted value.
        minimum: u32,
    },

    /// A category's support fits inside one integration interval.
    #[error("category {category} support width {width} is not wider than the grid spacing {spacing}")]
    CategorySupportTooNarrow {
        /// The category.
        category: Category,
        /// Width of its support.
        width: f64,
        /// Universe width divided by the resolution.
        spacing: f64,
    },

    /// A rule has no antecedent clauses.
    #[error("rule {rule}: antecedent is empty")]
    EmptyAntecedent {
        /// Rule identifier.
        rule: String,
    },

    /// A rule names the same variable in two clauses.
    #[error("rule {rule}: variable {variable} appears in more than one clause")]
    RepeatedClauseVariable {
        /// Rule identifier.
        rule: String,
        /// Repeated variable name.
        variable: String,
    },

    /// Two rules share an identifier.
    #[error("duplicate rule id {rule}")]
    DuplicateRule {
        /// Repeated rule identifier.
        rule: String,
    },

    /// A rule references a variable that is not a registered input.
    #[error("rule {rule}: unknown input variable {variable}")]
    UnknownVariable {
        /// Rule identifier.
        rule: String,
        /// Unresolved variable name.
        variable: String,
    },

    /// A rule references a term its variable does not define.
    #[error("rule {rule}: variable {variable} has no term {term}")]
    UnknownTerm {
        /// Rule identifier.
        rule: String,
        /// Variable name.
        variable: String,
        /// Unresolved term name.
        term: String,
    },

    /// A calibration set received the same version twice.
    #[error("duplicate calibration version {version}")]
    DuplicateVersion {
        /// Repeated tag.
        version: VersionTag,
    },
}

/// A registry lookup named a variable that was never registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variable: {name}")]
pub struct UnknownVariableError {
    /// The name that was looked up.
    pub name: String,
}

/// Errors that can occur when loading a calibration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the calibration file from disk.
    #[error("failed to read calibration file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse calibration YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The YAML parsed but describes an invalid calibration.
    #[error("invalid calibration: {0}")]
    Invalid(#[from] ConfigurationError),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Per-call inference failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    /// An input was NaN or infinite and cannot be placed in its universe.
    #[error("input {variable} is not finite")]
    NonFiniteInput {
        /// The input variable.
        variable: String,
    },

    /// A percentile fraction outside `[0, 1]` was requested.
    #[error("percentile fraction {0} outside [0, 1]")]
    InvalidFraction(f64),

    /// A variable was looked up by name and not found.
    #[error(transparent)]
    UnknownVariable(#[from] UnknownVariableError),

    /// A calibration version was requested that is not loaded.
    #[error("unknown calibration version {0}")]
    UnknownVersion(VersionTag),
}
