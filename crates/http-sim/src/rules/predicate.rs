//! Compiles declarative conditions into an evaluable predicate.
//!
//! Predicates are an inspectable AND-list of per-condition tests rather than
//! opaque closures, so they can be logged and asserted on. Compilation
//! happens once per rule create/update; evaluation is pure.

use tracing::warn;

use crate::rules::types::{ConfigCondition, Field, Operator};
use crate::sim::SimRequest;

/// A single compiled condition test.
#[derive(Debug, Clone)]
enum ConditionTest {
    Compare {
        field: Field,
        operator: Operator,
        pattern: String,
    },
    /// Produced for invalid conditions (missing value). Always false.
    Never,
}

impl ConditionTest {
    fn matches(&self, request: &SimRequest) -> bool {
        match self {
            ConditionTest::Compare {
                field,
                operator,
                pattern,
            } => {
                let current = match field {
                    Field::Method => request.method(),
                    Field::Path => request.path(),
                };
                compare(current, *operator, pattern)
            }
            ConditionTest::Never => false,
        }
    }
}

fn compare(current: &str, operator: Operator, pattern: &str) -> bool {
    let current = current.to_lowercase();
    let pattern = pattern.to_lowercase();
    match operator {
        Operator::Equals => current == pattern,
        Operator::StartWith => current.starts_with(&pattern),
        Operator::Contains => current.contains(&pattern),
    }
}

/// The compiled predicate of one rule: the logical AND of its condition
/// tests, short-circuiting on the first false.
#[derive(Debug, Clone)]
pub struct RulePredicate {
    tests: Vec<ConditionTest>,
}

impl RulePredicate {
    /// Compile the conditions of `rule_name`. An empty condition list yields
    /// a predicate that never matches; this is reported here, at build time.
    pub fn compile(conditions: &[ConfigCondition], rule_name: &str) -> Self {
        if conditions.is_empty() {
            warn!("Rule: {rule_name} - Missing Conditions.");
            return Self { tests: Vec::new() };
        }

        let tests = conditions
            .iter()
            .map(|condition| compile_condition(condition, rule_name))
            .collect();
        Self { tests }
    }

    /// Evaluate the predicate against a mapped request.
    pub fn matches(&self, request: &SimRequest) -> bool {
        // Empty/missing conditions mean the rule can never match.
        !self.tests.is_empty() && self.tests.iter().all(|test| test.matches(request))
    }
}

fn compile_condition(condition: &ConfigCondition, rule_name: &str) -> ConditionTest {
    let Some(value) = &condition.value else {
        warn!("Rule: {rule_name} - Missing Value.");
        return ConditionTest::Never;
    };

    ConditionTest::Compare {
        field: condition.field,
        operator: condition.operator,
        pattern: value.clone(),
    }
}
