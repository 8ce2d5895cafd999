//! Control API operation handlers.
//!
//! Handlers are synchronous: every operation works against the in-memory
//! store, and request bodies arrive pre-collected from the server front
//! door.

use bytes::Bytes;
use http_body_util::Full;
use hyper::Response;
use tracing::info;

use crate::control::router::ControlState;
use crate::control::types::{envelope_response, OperationResult};
use crate::rules::{loader, ConfigRule, RuleManager, RuleView};
use crate::sim::CapturedRequest;

fn rule_not_found(name: &str) -> Response<Full<Bytes>> {
    envelope_response(&OperationResult::<()>::failure(format!(
        "Rule with name '{name}' not found"
    )))
}

/// Project a rule manager into its wire shape. Rules with exactly one
/// response keep the single-response field for older clients.
fn view_of(manager: &RuleManager) -> RuleView {
    let rule = manager.rule();
    let responses = manager.responses();
    let (response, responses) = if responses.len() == 1 {
        (Some(responses[0].clone()), None)
    } else {
        (None, Some(responses.to_vec()))
    };
    RuleView {
        name: rule.name.clone(),
        description: rule.description.clone(),
        conditions: rule.conditions.clone(),
        response,
        responses,
        delay: rule.delay,
    }
}

/// GET /rules
pub fn get_rules(state: &ControlState) -> Response<Full<Bytes>> {
    let views: Vec<RuleView> = state
        .store
        .get_rules()
        .iter()
        .map(|manager| view_of(manager))
        .collect();
    envelope_response(&OperationResult::ok(views))
}

/// POST /rules - batch create. One bad rule does not abort the batch; the
/// envelope reports the shortfall instead.
pub fn create_rules(state: &ControlState, body: &[u8]) -> Response<Full<Bytes>> {
    let rules: Vec<ConfigRule> = match serde_json::from_slice(body) {
        Ok(rules) => rules,
        Err(error) => {
            return envelope_response(&OperationResult::<()>::failure(format!(
                "Invalid rules payload: {error}"
            )))
        }
    };

    let outcome = loader::load_rules(rules, &state.response_files_root, &state.store);
    info!("Created {}/{} rules", outcome.created.len(), outcome.total);
    if outcome.all_created() {
        envelope_response(&OperationResult::<()>::ok_empty())
    } else {
        envelope_response(&OperationResult::<()>::failure(format!(
            "Not all the rules were created {}/{}.",
            outcome.created.len(),
            outcome.total
        )))
    }
}

/// DELETE /rules
pub fn delete_all_rules(state: &ControlState) -> Response<Full<Bytes>> {
    state.store.clear();
    info!("Deleted all rules");
    envelope_response(&OperationResult::<()>::ok_empty())
}

/// GET /rules/:name
pub fn get_rule(state: &ControlState, name: &str) -> Response<Full<Bytes>> {
    match state.store.get_rule(name) {
        Some(manager) => envelope_response(&OperationResult::ok(view_of(&manager))),
        None => rule_not_found(name),
    }
}

/// PUT /rules/:name - replace a rule in place. The name in the path and in
/// the body must agree.
pub fn update_rule(state: &ControlState, name: &str, body: &[u8]) -> Response<Full<Bytes>> {
    let rule: ConfigRule = match serde_json::from_slice(body) {
        Ok(rule) => rule,
        Err(error) => {
            return envelope_response(&OperationResult::<()>::failure(format!(
                "Invalid rule payload: {error}"
            )))
        }
    };
    if rule.name != name {
        return envelope_response(&OperationResult::<()>::failure("Name mismatch."));
    }

    match loader::update_rule(rule, &state.response_files_root, &state.store) {
        Ok(()) => {
            info!("Updated rule '{name}'");
            envelope_response(&OperationResult::<()>::ok_empty())
        }
        Err(error) => envelope_response(&OperationResult::<()>::failure(error.to_string())),
    }
}

/// DELETE /rules/:name
pub fn delete_rule(state: &ControlState, name: &str) -> Response<Full<Bytes>> {
    if state.store.delete_rule(name) {
        info!("Deleted rule '{name}'");
        envelope_response(&OperationResult::<()>::ok_empty())
    } else {
        rule_not_found(name)
    }
}

/// GET /rules/:name/hits
pub fn get_rule_hits(state: &ControlState, name: &str) -> Response<Full<Bytes>> {
    match state.store.get_rule_hits(name) {
        Ok(hits) => envelope_response(&OperationResult::ok(hits)),
        Err(_) => rule_not_found(name),
    }
}

/// GET /rules/:name/requests
pub fn get_rule_requests(state: &ControlState, name: &str) -> Response<Full<Bytes>> {
    match state.store.get_requests(name) {
        Ok(requests) => {
            let captured: Vec<CapturedRequest> =
                requests.iter().map(|request| request.captured()).collect();
            envelope_response(&OperationResult::ok(captured))
        }
        Err(_) => rule_not_found(name),
    }
}
