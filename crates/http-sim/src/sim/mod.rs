//! The simulated endpoint: request mapping, rule resolution, response
//! building, delay injection, and the HTTP server front door.

mod delay;
mod handler;
mod request;
mod response;
mod server;

pub use delay::apply_delay;
pub use handler::{handle_sim_request, SimState};
pub use request::{CapturedRequest, SimRequest};
pub use response::build_response;
pub use server::{ServerContext, SimServer};
