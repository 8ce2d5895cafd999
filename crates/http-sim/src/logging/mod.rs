//! Request/response logging: plain-text rendering of exchanged messages and
//! the sinks they are written to.

mod capture;
mod sinks;

pub use capture::{format_request, format_response};
pub use sinks::{ConsoleSink, FileSink, PresentationSink, RequestResponseLogger};
