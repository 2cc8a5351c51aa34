//! Rule-base coverage analysis.
//!
//! Enumerates every combination of one term per input variable and checks
//! whether at least one rule's antecedent matches it. A variable a rule
//! does not mention matches any term. Gaps are reported, not rejected: a
//! sparse rule base is legal, it only means some inputs produce no
//! support.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::registry::{TermId, VariableId, VariableRegistry};
use crate::rules::RuleBase;

/// One term per input variable, by name.
pub type Combination = BTreeMap<String, String>;

/// Result of a coverage check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageReport {
    /// Number of term combinations examined.
    pub total: usize,
    /// Combinations no rule matches.
    pub uncovered: Vec<Combination>,
}

impl CoverageReport {
    /// `true` if every combination is matched by some rule.
    pub fn is_complete(&self) -> bool {
        self.uncovered.is_empty()
    }

    /// Number of matched combinations.
    pub fn covered(&self) -> usize {
        self.total.saturating_sub(self.uncovered.len())
    }
}

/// Check every input term combination against the rule base.
pub fn check_coverage(registry: &VariableRegistry, rules: &RuleBase) -> CoverageReport {
    let inputs: Vec<(VariableId, Vec<TermId>)> = registry
        .inputs()
        .map(|(id, variable)| {
            let terms = (0..variable.terms().len()).map(TermId).collect();
            (id, terms)
        })
        .collect();

    let combinations = inputs.iter().fold(
        vec![Vec::<(VariableId, TermId)>::new()],
        |partial, (variable, terms)| {
            partial
                .iter()
                .flat_map(|prefix| {
                    terms.iter().map(move |&term| {
                        let mut next = prefix.clone();
                        next.push((*variable, term));
                        next
                    })
                })
                .collect()
        },
    );

    let total = combinations.len();
    let uncovered: Vec<Combination> = combinations
        .into_iter()
        .filter(|combination| {
            !rules.rules().iter().any(|rule| {
                combination
                    .iter()
                    .all(|&(variable, term)| rule.term_for(variable).is_none_or(|t| t == term))
            })
        })
        .map(|combination| name_combination(registry, &combination))
        .collect();

    let report = CoverageReport { total, uncovered };
    if report.is_complete() {
        info!(
            combinations = report.total,
            rules = rules.len(),
            "rule base covers every input combination"
        );
    } else {
        warn!(
            combinations = report.total,
            uncovered = report.uncovered.len(),
            "rule base leaves input combinations without support"
        );
    }
    report
}

fn name_combination(registry: &VariableRegistry, combination: &[(VariableId, TermId)]) -> Combination {
    combination
        .iter()
        .filter_map(|&(variable, term)| {
            let variable = registry.variable(variable)?;
            let term = variable.term(term)?;
            Some((variable.name().to_owned(), term.name.clone()))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ozcast_types::Category;

    use super::*;
    use crate::aggregation::OutputSpace;
    use crate::membership::{Interval, MembershipFunction as Mf};
    use crate::registry::{Role, Term};
    use crate::rules::RuleSpec;

    fn setup() -> (VariableRegistry, OutputSpace) {
        let mut registry = VariableRegistry::new();
        registry
            .register_variable(
                "wind",
                "m/s",
                Role::Input,
                Interval::new(0.0, 20.0),
                vec![
                    Term::new("calm", Mf::ramp_down(1.0, 4.0)),
                    Term::new("breezy", Mf::ramp_up(2.0, 6.0)),
                ],
            )
            .unwrap();
        registry
            .register_variable(
                "solar",
                "W/m2",
                Role::Input,
                Interval::new(0.0, 900.0),
                vec![
                    Term::new("low", Mf::ramp_down(100.0, 300.0)),
                    Term::new("moderate", Mf::trapezoid(150.0, 300.0, 450.0, 600.0)),
                    Term::new("high", Mf::ramp_up(400.0, 700.0)),
                ],
            )
            .unwrap();
        let id = registry
            .register_variable(
                "ozone",
                "ppb",
                Role::Output,
                Interval::new(20.0, 140.0),
                vec![
                    Term::new("background", Mf::trapezoid(20.0, 20.0, 40.0, 55.0)),
                    Term::new("moderate", Mf::trapezoid(40.0, 55.0, 60.0, 75.0)),
                    Term::new("elevated", Mf::trapezoid(60.0, 75.0, 80.0, 95.0)),
                    Term::new("extreme", Mf::trapezoid(80.0, 95.0, 140.0, 140.0)),
                ],
            )
            .unwrap();
        let output = OutputSpace::new(id, registry.variable(id).unwrap()).unwrap();
        (registry, output)
    }

    #[test]
    fn wildcard_rules_cover_everything() {
        let (registry, output) = setup();
        let specs = vec![
            RuleSpec::new("breezy", &[("wind", "breezy")], Category::Background),
            RuleSpec::new("calm", &[("wind", "calm")], Category::Moderate),
        ];
        let rules = RuleBase::new(&specs, &registry, &output).unwrap();
        let report = check_coverage(&registry, &rules);
        assert_eq!(report.total, 6);
        assert!(report.is_complete());
        assert_eq!(report.covered(), 6);
    }

    #[test]
    fn gaps_are_listed_by_name() {
        let (registry, output) = setup();
        let specs = vec![
            RuleSpec::new("breezy", &[("wind", "breezy")], Category::Background),
            RuleSpec::new(
                "calm_bright",
                &[("wind", "calm"), ("solar", "high")],
                Category::Extreme,
            ),
        ];
        let rules = RuleBase::new(&specs, &registry, &output).unwrap();
        let report = check_coverage(&registry, &rules);
        assert_eq!(report.total, 6);
        assert_eq!(report.uncovered.len(), 2);
        assert_eq!(report.covered(), 4);
        let solar_terms: Vec<&str> = report
            .uncovered
            .iter()
            .filter_map(|c| c.get("solar").map(String::as_str))
            .collect();
        assert_eq!(solar_terms, vec!["low", "moderate"]);
        assert!(report
            .uncovered
            .iter()
            .all(|c| c.get("wind").map(String::as_str) == Some("calm")));
    }
}
