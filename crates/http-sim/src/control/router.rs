//! Route dispatch for the control API.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Method, Response};
use tracing::debug;

use crate::control::handlers;
use crate::control::types::{envelope_response, OperationResult};
use crate::rules::RuleStore;
use crate::CONTROL_ENDPOINT;

/// Shared state of the control API.
#[derive(Debug, Clone)]
pub struct ControlState {
    pub store: Arc<RuleStore>,
    pub response_files_root: PathBuf,
}

/// Parsed route for rule endpoints
enum RuleRoute<'a> {
    /// GET/POST/DELETE /rules
    Rules,
    /// GET/PUT/DELETE /rules/:name
    RuleByName(&'a str),
    /// GET /rules/:name/hits
    RuleHits(&'a str),
    /// GET /rules/:name/requests
    RuleRequests(&'a str),
}

impl<'a> RuleRoute<'a> {
    /// Parse route from path segments after the control namespace.
    fn parse(segments: &[&'a str]) -> Option<Self> {
        match *segments {
            ["rules"] => Some(RuleRoute::Rules),
            ["rules", name] => Some(RuleRoute::RuleByName(name)),
            ["rules", name, "hits"] => Some(RuleRoute::RuleHits(name)),
            ["rules", name, "requests"] => Some(RuleRoute::RuleRequests(name)),
            _ => None,
        }
    }
}

/// Dispatch a request addressed to the control namespace. The body has
/// already been collected by the caller.
pub fn route_control_request(
    state: &ControlState,
    method: &Method,
    path: &str,
    body: &[u8],
) -> Response<Full<Bytes>> {
    debug!("Control API: {method} {path}");

    let Some(rest) = path.strip_prefix(CONTROL_ENDPOINT) else {
        return unknown_route(method, path);
    };
    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();

    match RuleRoute::parse(&segments) {
        Some(RuleRoute::Rules) => match *method {
            Method::GET => handlers::get_rules(state),
            Method::POST => handlers::create_rules(state, body),
            Method::DELETE => handlers::delete_all_rules(state),
            _ => unknown_route(method, path),
        },
        Some(RuleRoute::RuleByName(name)) => match *method {
            Method::GET => handlers::get_rule(state, name),
            Method::PUT => handlers::update_rule(state, name, body),
            Method::DELETE => handlers::delete_rule(state, name),
            _ => unknown_route(method, path),
        },
        Some(RuleRoute::RuleHits(name)) if *method == Method::GET => {
            handlers::get_rule_hits(state, name)
        }
        Some(RuleRoute::RuleRequests(name)) if *method == Method::GET => {
            handlers::get_rule_requests(state, name)
        }
        _ => unknown_route(method, path),
    }
}

fn unknown_route(method: &Method, path: &str) -> Response<Full<Bytes>> {
    envelope_response(&OperationResult::<()>::failure(format!(
        "Unknown operation: {method} {path}"
    )))
}
