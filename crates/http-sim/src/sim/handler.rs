//! Request-resolution pipeline for the simulated endpoint.

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::Response;
use tracing::debug;

use crate::rules::{DefaultResponse, RuleStore};
use crate::sim::delay::apply_delay;
use crate::sim::request::SimRequest;
use crate::sim::response::build_response;

/// Shared state of the simulated endpoint.
#[derive(Debug, Clone)]
pub struct SimState {
    pub store: Arc<RuleStore>,
    pub default_response: DefaultResponse,
    pub response_files_root: PathBuf,
}

/// Resolve a mapped request against the rule store and produce the
/// response.
///
/// The winning rule's hit count and request history are updated during
/// resolution. The delay (rule's own, or the default response's) is applied
/// after the response body is built, so a slow disk read does not stack on
/// top of the configured latency.
pub async fn handle_sim_request(state: &SimState, request: &SimRequest) -> Response<Full<Bytes>> {
    match state.store.resolve(request) {
        Some(manager) => {
            debug!(
                "Rule matching request - Name: {} | {} {}",
                manager.name(),
                request.method(),
                request.path()
            );
            let spec = manager.next_response();
            let response = build_response(&spec, &state.response_files_root).await;
            apply_delay(manager.delay().as_ref()).await;
            response
        }
        None => {
            debug!(
                "Rule matching request not found - {} {}",
                request.method(),
                request.path()
            );
            let response =
                build_response(&state.default_response.response, &state.response_files_root).await;
            apply_delay(state.default_response.delay.as_ref()).await;
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{
        ConfigCondition, ConfigRule, DelayRange, Field, Operator, SimResponse,
    };
    use hyper::StatusCode;

    fn state() -> SimState {
        SimState {
            store: Arc::new(RuleStore::new()),
            default_response: DefaultResponse {
                response: SimResponse {
                    status_code: 404,
                    content_value: Some("no rule".into()),
                    ..Default::default()
                },
                delay: None,
            },
            response_files_root: std::env::temp_dir(),
        }
    }

    fn rule(name: &str, prefix: &str, statuses: &[u16]) -> ConfigRule {
        ConfigRule {
            name: name.to_string(),
            conditions: vec![ConfigCondition {
                field: Field::Path,
                operator: Operator::StartWith,
                value: Some(prefix.to_string()),
            }],
            responses: statuses
                .iter()
                .map(|&status_code| SimResponse {
                    status_code,
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_matching_rule_serves_and_counts() {
        let state = state();
        state.store.create_rule(rule("rule1", "/customers", &[201])).unwrap();

        let response = handle_sim_request(&state, &SimRequest::new("GET", "/customers/5")).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(state.store.get_rule_hits("rule1").unwrap(), 1);
        assert_eq!(state.store.get_requests("rule1").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unmatched_request_gets_default_response() {
        let state = state();
        state.store.create_rule(rule("rule1", "/customers", &[200])).unwrap();

        let response = handle_sim_request(&state, &SimRequest::new("GET", "/orders")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(state.store.get_rule_hits("rule1").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_responses_rotate_across_requests() {
        let state = state();
        state
            .store
            .create_rule(rule("flaky", "/data", &[200, 503]))
            .unwrap();

        let request = SimRequest::new("GET", "/data");
        let statuses: Vec<_> = [
            handle_sim_request(&state, &request).await.status(),
            handle_sim_request(&state, &request).await.status(),
            handle_sim_request(&state, &request).await.status(),
        ]
        .into_iter()
        .map(|status| status.as_u16())
        .collect();
        assert_eq!(statuses, vec![200, 503, 200]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rule_delay_is_applied() {
        let state = state();
        let mut delayed = rule("slow", "/slow", &[200]);
        delayed.delay = Some(DelayRange { min: 300, max: None });
        state.store.create_rule(delayed).unwrap();

        let started = tokio::time::Instant::now();
        handle_sim_request(&state, &SimRequest::new("GET", "/slow")).await;
        assert!(started.elapsed() >= tokio::time::Duration::from_millis(300));
    }
}
