//! The rule base: conjunctive antecedents mapped to output categories.
//!
//! Rules arrive as names ([`RuleSpec`]) and are resolved against the
//! registry once, when the calibration is built. After that a rule is a
//! list of `(variable, term)` positions plus the cached membership of its
//! consequent, so firing a rule is a handful of indexed reads.
//!
//! Firing strength is the Gödel t-norm (minimum) of the antecedent
//! degrees. Implication clips the consequent at that strength (Mamdani).

use ozcast_types::{Category, RuleActivation};
use tracing::debug;

use crate::aggregation::{ClippedOutputSet, OutputSpace};
use crate::error::ConfigurationError;
use crate::fuzzifier::FuzzifiedInputs;
use crate::membership::MembershipFunction;
use crate::registry::{Role, TermId, VariableId, VariableRegistry};

/// One `variable IS term` test of an antecedent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Clause {
    /// Input variable tested.
    pub variable: VariableId,
    /// Term the variable must belong to.
    pub term: TermId,
}

/// An unresolved rule as written in a calibration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    /// Unique rule identifier.
    pub id: String,
    /// `(variable, term)` pairs combined with AND.
    pub when: Vec<(String, String)>,
    /// Consequent category.
    pub then: Category,
}

impl RuleSpec {
    /// Build a spec from borrowed names.
    pub fn new(id: &str, when: &[(&str, &str)], then: Category) -> Self {
        Self {
            id: id.to_owned(),
            when: when
                .iter()
                .map(|(v, t)| ((*v).to_owned(), (*t).to_owned()))
                .collect(),
            then,
        }
    }
}

/// A rule resolved against a registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    id: String,
    antecedent: Vec<Clause>,
    consequent: Category,
    consequent_function: MembershipFunction,
}

impl Rule {
    /// Resolve variable and term names into positions.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] if the antecedent is empty, names a
    /// variable twice, references anything other than a registered input
    /// and one of its terms, or the consequent category is not defined.
    pub fn resolve(
        spec: &RuleSpec,
        registry: &VariableRegistry,
        output: &OutputSpace,
    ) -> Result<Self, ConfigurationError> {
        if spec.when.is_empty() {
            return Err(ConfigurationError::EmptyAntecedent {
                rule: spec.id.clone(),
            });
        }

        let mut antecedent: Vec<Clause> = Vec::with_capacity(spec.when.len());
        for (variable_name, term_name) in &spec.when {
            let unknown_variable = || ConfigurationError::UnknownVariable {
                rule: spec.id.clone(),
                variable: variable_name.clone(),
            };
            let variable_id = registry
                .variable_id(variable_name)
                .ok_or_else(unknown_variable)?;
            let variable = registry
                .variable(variable_id)
                .filter(|v| v.role() == Role::Input)
                .ok_or_else(unknown_variable)?;
            if antecedent.iter().any(|c| c.variable == variable_id) {
                return Err(ConfigurationError::RepeatedClauseVariable {
                    rule: spec.id.clone(),
                    variable: variable_name.clone(),
                });
            }
            let term = variable
                .term_id(term_name)
                .ok_or_else(|| ConfigurationError::UnknownTerm {
                    rule: spec.id.clone(),
                    variable: variable_name.clone(),
                    term: term_name.clone(),
                })?;
            antecedent.push(Clause {
                variable: variable_id,
                term,
            });
        }

        let band = output
            .band(spec.then)
            .ok_or(ConfigurationError::MissingCategory {
                category: spec.then,
            })?;

        Ok(Self {
            id: spec.id.clone(),
            antecedent,
            consequent: spec.then,
            consequent_function: band.function,
        })
    }

    /// Rule identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Resolved antecedent clauses, in declaration order.
    pub fn antecedent(&self) -> &[Clause] {
        &self.antecedent
    }

    /// The consequent category.
    pub const fn consequent(&self) -> Category {
        self.consequent
    }

    /// `true` if the rule tests `variable`.
    pub fn mentions(&self, variable: VariableId) -> bool {
        self.antecedent.iter().any(|c| c.variable == variable)
    }

    /// Term the rule requires of `variable`, if it tests it at all.
    pub fn term_for(&self, variable: VariableId) -> Option<TermId> {
        self.antecedent
            .iter()
            .find(|c| c.variable == variable)
            .map(|c| c.term)
    }

    /// Firing strength: the minimum degree over all clauses.
    pub fn evaluate(&self, inputs: &FuzzifiedInputs) -> f64 {
        self.antecedent
            .iter()
            .map(|c| inputs.degree(c.variable, c.term))
            .fold(1.0, f64::min)
            .clamp(0.0, 1.0)
    }

    /// The consequent clipped at `strength`.
    pub fn implicate(&self, strength: f64) -> ClippedOutputSet {
        ClippedOutputSet {
            rule_id: self.id.clone(),
            category: self.consequent,
            strength: strength.clamp(0.0, 1.0),
            function: self.consequent_function,
        }
    }
}

/// An ordered, validated collection of rules.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleBase {
    rules: Vec<Rule>,
}

impl RuleBase {
    /// Resolve every spec, preserving order.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigurationError`] hit while resolving, or
    /// [`ConfigurationError::DuplicateRule`] if an id repeats.
    pub fn new(
        specs: &[RuleSpec],
        registry: &VariableRegistry,
        output: &OutputSpace,
    ) -> Result<Self, ConfigurationError> {
        let mut rules: Vec<Rule> = Vec::with_capacity(specs.len());
        for spec in specs {
            if rules.iter().any(|r| r.id == spec.id) {
                return Err(ConfigurationError::DuplicateRule {
                    rule: spec.id.clone(),
                });
            }
            rules.push(Rule::resolve(spec, registry, output)?);
        }
        Ok(Self { rules })
    }

    /// Rules in table order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// `true` if the base holds no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Firing strength of every rule, in table order.
    pub fn fire(&self, inputs: &FuzzifiedInputs) -> Vec<RuleActivation> {
        self.rules
            .iter()
            .map(|rule| {
                let strength = rule.evaluate(inputs);
                debug!(
                    rule = rule.id(),
                    consequent = %rule.consequent(),
                    strength,
                    "rule fired"
                );
                RuleActivation {
                    rule_id: rule.id.clone(),
                    consequent: rule.consequent,
                    strength,
                }
            })
            .collect()
    }

    /// Implicate every rule at its activation strength.
    ///
    /// `activations` must come from [`Self::fire`] on this base.
    pub fn implicate(&self, activations: &[RuleActivation]) -> Vec<ClippedOutputSet> {
        self.rules
            .iter()
            .zip(activations)
            .map(|(rule, activation)| rule.implicate(activation.strength))
            .collect()
    }
}
