//! The rule engine: declarative rule model, condition evaluation, response
//! rotation, and the concurrent rule store backing both the simulated
//! endpoint and the control API.

pub mod loader;
mod manager;
mod predicate;
mod rotator;
mod store;
mod types;

pub use loader::{load_rules, update_rule, LoadOutcome};
pub use manager::{RuleManager, MAX_STORED_REQUESTS};
pub use predicate::RulePredicate;
pub use rotator::ResponseRotator;
pub use store::{RuleStore, StoreError};
pub use types::{
    ConfigCondition, ConfigRule, ContentValueType, DefaultResponse, DelayRange, Field, Header,
    Operator, ResponseEncoding, RuleView, RulesConfig, SimResponse,
};
