//! Concurrent rule store shared between the simulated endpoint and the
//! control API.
//!
//! A single coarse lock guards the name index and insertion order together,
//! so rule resolution sees a consistent view and first-match-wins stays
//! deterministic across concurrent mutations. Rule managers are handed out
//! as `Arc`s; their statistics update outside any store-wide critical
//! section except during resolution itself, where the increment-and-retain
//! must be atomic with the scan.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::rules::manager::RuleManager;
use crate::rules::types::ConfigRule;
use crate::sim::SimRequest;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("A rule with the name '{0}' already exists")]
    DuplicateRule(String),
    #[error("Rule with name '{0}' not found")]
    RuleNotFound(String),
    #[error("Rule with name '{0}' is not valid")]
    InvalidRule(String),
}

#[derive(Debug, Default)]
struct StoreInner {
    rules: HashMap<String, Arc<RuleManager>>,
    /// Rule names in insertion order; drives resolution priority.
    order: Vec<String>,
}

/// Thread-safe collection of active rules.
#[derive(Debug, Default)]
pub struct RuleStore {
    inner: Mutex<StoreInner>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule. Names are unique; a duplicate leaves the store unchanged.
    pub fn create_rule(&self, rule: ConfigRule) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.rules.contains_key(&rule.name) {
            return Err(StoreError::DuplicateRule(rule.name));
        }
        let name = rule.name.clone();
        inner.rules.insert(name.clone(), Arc::new(RuleManager::new(rule)));
        inner.order.push(name);
        Ok(())
    }

    /// Replace an existing rule in place. The rule keeps its resolution
    /// priority; its statistics and rotation cursor start over.
    pub fn update_rule(&self, rule: ConfigRule) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !inner.rules.contains_key(&rule.name) {
            return Err(StoreError::RuleNotFound(rule.name));
        }
        let name = rule.name.clone();
        inner.rules.insert(name, Arc::new(RuleManager::new(rule)));
        Ok(())
    }

    /// Remove a rule by name. Returns whether it existed.
    pub fn delete_rule(&self, name: &str) -> bool {
        let mut inner = self.inner.lock();
        if inner.rules.remove(name).is_none() {
            return false;
        }
        inner.order.retain(|existing| existing != name);
        true
    }

    /// Remove every rule.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.rules.clear();
        inner.order.clear();
    }

    /// All rules in insertion order.
    pub fn get_rules(&self) -> Vec<Arc<RuleManager>> {
        let inner = self.inner.lock();
        inner
            .order
            .iter()
            .map(|name| Arc::clone(&inner.rules[name]))
            .collect()
    }

    pub fn get_rule(&self, name: &str) -> Option<Arc<RuleManager>> {
        self.inner.lock().rules.get(name).map(Arc::clone)
    }

    pub fn get_rule_hits(&self, name: &str) -> Result<u64, StoreError> {
        self.get_rule(name)
            .map(|manager| manager.match_count())
            .ok_or_else(|| StoreError::RuleNotFound(name.to_string()))
    }

    pub fn get_requests(&self, name: &str) -> Result<Vec<SimRequest>, StoreError> {
        self.get_rule(name)
            .map(|manager| manager.requests())
            .ok_or_else(|| StoreError::RuleNotFound(name.to_string()))
    }

    /// Find the first rule matching `request`, in insertion order, and
    /// record the match on it. The scan and the recording happen under the
    /// store lock so a concurrent delete cannot observe a half-applied
    /// match.
    pub fn resolve(&self, request: &SimRequest) -> Option<Arc<RuleManager>> {
        let inner = self.inner.lock();
        for name in &inner.order {
            let manager = &inner.rules[name];
            if manager.matches(request) {
                manager.record_match(request.clone());
                return Some(Arc::clone(manager));
            }
        }
        None
    }
}
