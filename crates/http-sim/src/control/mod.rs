//! Control API: rule CRUD and match-statistics endpoints served under the
//! control namespace.

mod handlers;
mod router;
mod types;

pub use router::{route_control_request, ControlState};
pub use types::OperationResult;
