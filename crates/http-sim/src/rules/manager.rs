//! Per-rule runtime state: compiled predicate, response rotation, and
//! observed-traffic bookkeeping.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::rules::predicate::RulePredicate;
use crate::rules::rotator::ResponseRotator;
use crate::rules::types::{ConfigRule, DelayRange, SimResponse};
use crate::sim::SimRequest;

/// Most recent matching requests kept per rule. Older entries are dropped
/// first.
pub const MAX_STORED_REQUESTS: usize = 10;

/// Runtime wrapper around one rule.
///
/// Created at rule create/update time and immutable except for its match
/// statistics, so it can be shared by reference between the resolution path
/// and the control API.
#[derive(Debug)]
pub struct RuleManager {
    rule: ConfigRule,
    predicate: RulePredicate,
    rotator: ResponseRotator,
    match_count: AtomicU64,
    requests: Mutex<VecDeque<SimRequest>>,
}

impl RuleManager {
    /// Build the runtime state for `rule`. The rule is expected to be
    /// normalized by the loader: responses live in `responses`, `response`
    /// is empty.
    pub fn new(rule: ConfigRule) -> Self {
        let predicate = RulePredicate::compile(&rule.conditions, &rule.name);
        let rotator = ResponseRotator::new(rule.responses.clone());
        Self {
            rule,
            predicate,
            rotator,
            match_count: AtomicU64::new(0),
            requests: Mutex::new(VecDeque::with_capacity(MAX_STORED_REQUESTS)),
        }
    }

    pub fn name(&self) -> &str {
        &self.rule.name
    }

    pub fn rule(&self) -> &ConfigRule {
        &self.rule
    }

    pub fn delay(&self) -> Option<DelayRange> {
        self.rule.delay
    }

    /// Evaluate the predicate only; no statistics are touched.
    pub fn matches(&self, request: &SimRequest) -> bool {
        self.predicate.matches(request)
    }

    /// Record a match: bump the hit count and retain the request, evicting
    /// the oldest once the per-rule cap is reached.
    pub fn record_match(&self, request: SimRequest) {
        self.match_count.fetch_add(1, Ordering::Relaxed);
        let mut requests = self.requests.lock();
        if requests.len() == MAX_STORED_REQUESTS {
            requests.pop_front();
        }
        requests.push_back(request);
    }

    pub fn match_count(&self) -> u64 {
        self.match_count.load(Ordering::Relaxed)
    }

    /// Snapshot of the retained matching requests, oldest first.
    pub fn requests(&self) -> Vec<SimRequest> {
        self.requests.lock().iter().cloned().collect()
    }

    pub fn next_response(&self) -> SimResponse {
        self.rotator.next()
    }

    pub fn responses(&self) -> &[SimResponse] {
        self.rotator.responses()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::types::{ConfigCondition, Field, Operator};

    fn rule(name: &str) -> ConfigRule {
        ConfigRule {
            name: name.to_string(),
            conditions: vec![ConfigCondition {
                field: Field::Path,
                operator: Operator::StartWith,
                value: Some("/customers".to_string()),
            }],
            responses: vec![SimResponse::default()],
            ..Default::default()
        }
    }

    #[test]
    fn test_matching_does_not_record() {
        let manager = RuleManager::new(rule("rule1"));
        assert!(manager.matches(&SimRequest::new("GET", "/customers")));
        assert_eq!(manager.match_count(), 0);
        assert!(manager.requests().is_empty());
    }

    #[test]
    fn test_record_match_counts_and_retains() {
        let manager = RuleManager::new(rule("rule1"));
        manager.record_match(SimRequest::new("GET", "/customers/1"));
        manager.record_match(SimRequest::new("GET", "/customers/2"));
        assert_eq!(manager.match_count(), 2);
        let requests = manager.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].path(), "/customers/1");
        assert_eq!(requests[1].path(), "/customers/2");
    }

    #[test]
    fn test_request_history_is_bounded() {
        let manager = RuleManager::new(rule("rule1"));
        for i in 0..MAX_STORED_REQUESTS + 5 {
            manager.record_match(SimRequest::new("GET", &format!("/customers/{i}")));
        }
        assert_eq!(manager.match_count() as usize, MAX_STORED_REQUESTS + 5);
        let requests = manager.requests();
        assert_eq!(requests.len(), MAX_STORED_REQUESTS);
        // The five oldest entries were evicted.
        assert_eq!(requests[0].path(), "/customers/5");
        assert_eq!(
            requests.last().unwrap().path(),
            format!("/customers/{}", MAX_STORED_REQUESTS + 4)
        );
    }
}
