//! Validation and normalization of declarative rules before they enter the
//! store.
//!
//! Loading is best-effort per rule: an invalid rule is reported and skipped
//! without failing the batch, so one bad entry in a rules file does not take
//! the whole set down with it.

use std::path::Path;

use tracing::warn;

use crate::rules::store::{RuleStore, StoreError};
use crate::rules::types::{ConfigRule, ContentValueType, SimResponse};

/// Result of loading a batch of rules.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Names of the rules that were created, in input order.
    pub created: Vec<String>,
    /// Number of rules in the input batch.
    pub total: usize,
}

impl LoadOutcome {
    pub fn all_created(&self) -> bool {
        self.created.len() == self.total
    }
}

/// Validate, normalize, and create each rule in `rules`. Rules that fail
/// validation or collide with an existing name are skipped.
pub fn load_rules(
    rules: Vec<ConfigRule>,
    response_files_root: &Path,
    store: &RuleStore,
) -> LoadOutcome {
    let mut outcome = LoadOutcome {
        total: rules.len(),
        ..Default::default()
    };

    for rule in rules {
        let Some(rule) = normalize_rule(rule, response_files_root) else {
            continue;
        };
        let name = rule.name.clone();
        match store.create_rule(rule) {
            Ok(()) => outcome.created.push(name),
            Err(error) => warn!("Rule: {name} - {error}."),
        }
    }

    outcome
}

/// Validate and normalize a single rule for a replace operation.
pub fn update_rule(
    rule: ConfigRule,
    response_files_root: &Path,
    store: &RuleStore,
) -> Result<(), StoreError> {
    let name = rule.name.clone();
    let Some(rule) = normalize_rule(rule, response_files_root) else {
        return Err(StoreError::InvalidRule(name));
    };
    store.update_rule(rule)
}

/// Check a rule's invariants and fold the single-response shape into the
/// `responses` list. Returns `None` (after reporting) when the rule is
/// unusable.
fn normalize_rule(mut rule: ConfigRule, response_files_root: &Path) -> Option<ConfigRule> {
    let name = &rule.name;

    match (rule.response.take(), rule.responses.is_empty()) {
        (Some(_), false) => {
            warn!("Rule: {name} - Defines both 'response' and 'responses'.");
            return None;
        }
        (Some(response), true) => rule.responses = vec![response],
        (None, true) => {
            warn!("Rule: {name} - Missing response.");
            return None;
        }
        (None, false) => {}
    }

    if let Some(delay) = rule.delay {
        if delay.max.is_some_and(|max| max < delay.min) {
            warn!("Rule: {name} - Delay max is less than min.");
            return None;
        }
    }

    for response in &rule.responses {
        if response.content_value_type == ContentValueType::File
            && !content_file_exists(response, response_files_root, name)
        {
            return None;
        }
    }

    Some(rule)
}

/// File-backed responses must point at an existing file when the rule is
/// created; a file that disappears afterwards is handled at serve time.
fn content_file_exists(response: &SimResponse, response_files_root: &Path, rule_name: &str) -> bool {
    let Some(content_value) = &response.content_value else {
        warn!("Rule: {rule_name} - File response without contentValue.");
        return false;
    };
    let path = response_files_root.join(content_value);
    if !path.is_file() {
        warn!(
            "Rule: {rule_name} - Response file not found: {}.",
            path.display()
        );
        return false;
    }
    true
}
