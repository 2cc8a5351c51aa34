//! Crisp-to-fuzzy conversion with a universe guard.
//!
//! A value outside its variable's universe is clipped to the nearest bound
//! and a warning is logged; the forecast carries on. Every term is
//! evaluated and reported, including terms with degree 0, so callers can
//! tell "irrelevant" from "missing".

use std::collections::BTreeMap;

use ozcast_types::ClipEvent;
use tracing::warn;

use crate::error::{InferenceError, UnknownVariableError};
use crate::registry::{TermId, Variable, VariableId, VariableRegistry};

/// Membership degree of one term.
#[derive(Debug, Clone, PartialEq)]
pub struct TermDegree {
    /// Term name.
    pub name: String,
    /// Degree in `[0, 1]`.
    pub degree: f64,
}

/// All term degrees for one crisp input.
#[derive(Debug, Clone, PartialEq)]
pub struct Fuzzified {
    /// Which variable was fuzzified.
    pub variable: VariableId,
    /// The value actually evaluated (after clipping).
    pub value: f64,
    /// Present when the input had to be clipped.
    pub clip: Option<ClipEvent>,
    /// One entry per term, in declaration order.
    pub terms: Vec<TermDegree>,
}

impl Fuzzified {
    /// Degree of a term by position; 0 if the position is unknown.
    pub fn degree(&self, term: TermId) -> f64 {
        self.terms.get(term.0).map_or(0.0, |t| t.degree)
    }

    /// Degree of a term by name.
    pub fn degree_of(&self, name: &str) -> Option<f64> {
        self.terms.iter().find(|t| t.name == name).map(|t| t.degree)
    }

    /// Term name to degree, for logging and reports.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.terms
            .iter()
            .map(|t| (t.name.clone(), t.degree))
            .collect()
    }
}

/// Fuzzify `value` against the named variable.
///
/// # Errors
///
/// Returns [`InferenceError::UnknownVariable`] if the name is not
/// registered, or [`InferenceError::NonFiniteInput`] for `NaN` or `±∞`.
pub fn fuzzify(
    registry: &VariableRegistry,
    variable_name: &str,
    value: f64,
) -> Result<Fuzzified, InferenceError> {
    let unknown = || UnknownVariableError {
        name: variable_name.to_owned(),
    };
    let id = registry.variable_id(variable_name).ok_or_else(unknown)?;
    let variable = registry.variable(id).ok_or_else(unknown)?;
    fuzzify_variable(id, variable, value)
}

/// Fuzzify `value` against an already resolved variable.
///
/// # Errors
///
/// Returns [`InferenceError::NonFiniteInput`] if `value` is `NaN` or infinite.
pub fn fuzzify_variable(
    id: VariableId,
    variable: &Variable,
    value: f64,
) -> Result<Fuzzified, InferenceError> {
    if !value.is_finite() {
        return Err(InferenceError::NonFiniteInput {
            variable: variable.name().to_owned(),
        });
    }

    let universe = variable.universe();
    let clipped = universe.clip(value);
    let clip = if universe.contains(value) {
        None
    } else {
        warn!(
            variable = variable.name(),
            unit = variable.unit(),
            original_value = value,
            clipped_value = clipped,
            "input outside universe of discourse, clipped to nearest bound"
        );
        Some(ClipEvent {
            variable: variable.name().to_owned(),
            original_value: value,
            clipped_value: clipped,
        })
    };

    let terms = variable
        .terms()
        .iter()
        .enumerate()
        .map(|(i, term)| TermDegree {
            name: term.name.clone(),
            degree: variable.degree(TermId(i), clipped),
        })
        .collect();

    Ok(Fuzzified {
        variable: id,
        value: clipped,
        clip,
        terms,
    })
}

/// Fuzzified values of every input for one call, keyed by variable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FuzzifiedInputs {
    by_variable: BTreeMap<VariableId, Fuzzified>,
}

impl FuzzifiedInputs {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one fuzzified input, replacing any earlier value.
    pub fn insert(&mut self, fuzzified: Fuzzified) {
        self.by_variable.insert(fuzzified.variable, fuzzified);
    }

    /// The fuzzified value for a variable, if present.
    pub fn get(&self, variable: VariableId) -> Option<&Fuzzified> {
        self.by_variable.get(&variable)
    }

    /// Degree of `term` of `variable`; 0 if either is absent.
    pub fn degree(&self, variable: VariableId, term: TermId) -> f64 {
        self.get(variable).map_or(0.0, |f| f.degree(term))
    }

    /// Clip events in variable order.
    pub fn clip_events(&self) -> Vec<ClipEvent> {
        self.by_variable
            .values()
            .filter_map(|f| f.clip.clone())
            .collect()
    }
}
