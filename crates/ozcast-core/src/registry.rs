//! Variable registry: universes of discourse and their linguistic terms.
//!
//! A [`VariableRegistry`] is filled once while a calibration is built and
//! is read-only afterwards. Variables are addressed by a dense
//! [`VariableId`] so rules can be resolved against the registry at build
//! time and never look names up during inference.

use std::collections::BTreeMap;

use crate::error::{ConfigurationError, UnknownVariableError};
use crate::membership::{Interval, MembershipFunction};

/// Position of a variable within its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariableId(pub usize);

/// Position of a term within its variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TermId(pub usize);

/// Whether a variable is fed by callers or produced by inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A crisp precursor input.
    Input,
    /// The inferred concentration.
    Output,
}

/// A named linguistic term with its membership function.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    /// Term name, unique within its variable.
    pub name: String,
    /// The term's shape.
    pub function: MembershipFunction,
}

impl Term {
    /// Create a term.
    pub fn new(name: impl Into<String>, function: MembershipFunction) -> Self {
        Self {
            name: name.into(),
            function,
        }
    }
}

/// A variable with a bounded universe and ordered terms.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    name: String,
    unit: String,
    role: Role,
    universe: Interval,
    terms: Vec<Term>,
}

impl Variable {
    /// Variable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Physical unit label (informational only).
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Input or output.
    pub const fn role(&self) -> Role {
        self.role
    }

    /// The universe of discourse.
    pub const fn universe(&self) -> Interval {
        self.universe
    }

    /// Terms in declaration order.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Look up a term's position by name.
    pub fn term_id(&self, name: &str) -> Option<TermId> {
        self.terms.iter().position(|t| t.name == name).map(TermId)
    }

    /// Look up a term by position.
    pub fn term(&self, id: TermId) -> Option<&Term> {
        self.terms.get(id.0)
    }

    /// Degree of `x` in the given term. Zero outside the universe.
    pub fn degree(&self, id: TermId, x: f64) -> f64 {
        if !self.universe.contains(x) {
            return 0.0;
        }
        self.term(id).map_or(0.0, |t| t.function.degree(x))
    }
}

/// Registry of every variable one calibration declares.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableRegistry {
    variables: Vec<Variable>,
    by_name: BTreeMap<String, VariableId>,
}

impl VariableRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a variable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the universe is not a proper
    /// finite interval, a term is malformed or leaves the universe, a term
    /// name repeats, the variable has no terms, or the name is taken.
    pub fn register_variable(
        &mut self,
        name: &str,
        unit: &str,
        role: Role,
        universe: Interval,
        terms: Vec<Term>,
    ) -> Result<VariableId, ConfigurationError> {
        if self.by_name.contains_key(name) {
            return Err(ConfigurationError::DuplicateVariable {
                variable: name.to_owned(),
            });
        }
        if !universe.is_proper() {
            return Err(ConfigurationError::InvalidUniverse {
                variable: name.to_owned(),
                lo: universe.lo,
                hi: universe.hi,
            });
        }
        if terms.is_empty() {
            return Err(ConfigurationError::NoTerms {
                variable: name.to_owned(),
            });
        }
        for (i, term) in terms.iter().enumerate() {
            term.function.validate(name, &term.name, universe)?;
            if terms.iter().take(i).any(|earlier| earlier.name == term.name) {
                return Err(ConfigurationError::DuplicateTerm {
                    variable: name.to_owned(),
                    term: term.name.clone(),
                });
            }
        }

        let id = VariableId(self.variables.len());
        self.variables.push(Variable {
            name: name.to_owned(),
            unit: unit.to_owned(),
            role,
            universe,
            terms,
        });
        self.by_name.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Look up a variable by name.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownVariableError`] if no variable has that name.
    pub fn get_variable(&self, name: &str) -> Result<&Variable, UnknownVariableError> {
        self.variable_id(name)
            .and_then(|id| self.variable(id))
            .ok_or_else(|| UnknownVariableError {
                name: name.to_owned(),
            })
    }

    /// Position of a variable by name.
    pub fn variable_id(&self, name: &str) -> Option<VariableId> {
        self.by_name.get(name).copied()
    }

    /// Look up a variable by position.
    pub fn variable(&self, id: VariableId) -> Option<&Variable> {
        self.variables.get(id.0)
    }

    /// All input variables with their ids, in registration order.
    pub fn inputs(&self) -> impl Iterator<Item = (VariableId, &Variable)> {
        self.variables
            .iter()
            .enumerate()
            .filter(|(_, v)| v.role == Role::Input)
            .map(|(i, v)| (VariableId(i), v))
    }

    /// Number of registered variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
