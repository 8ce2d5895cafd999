// Library exports for integration tests and the binary.

pub mod config;
pub mod control;
pub mod logging;
pub mod rules;
pub mod sim;

/// Namespace prefix for the control API. Requests under this path are never
/// resolved against the rule store.
pub const CONTROL_ENDPOINT: &str = "/http-server-sim";
