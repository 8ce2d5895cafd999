//! Destinations for rendered request/response text.

use std::path::{Path, PathBuf};

use hyper::HeaderMap;
use tracing::warn;

use crate::logging::capture::{format_request, format_response};
use crate::sim::SimRequest;

const GREEN: &str = "\x1b[92m";
const CYAN: &str = "\x1b[96m";
const DEFAULT_COLOR: &str = "\x1b[39m";
const UNDERLINE_ON: &str = "\x1b[4m";
const UNDERLINE_OFF: &str = "\x1b[24m";

/// A destination for rendered message text. `id` is the correlation id of
/// the exchange, shared between a request and its response.
pub trait PresentationSink: Send + Sync {
    fn write_request(&self, text: &str, id: &str);
    fn write_response(&self, text: &str, id: &str);
}

/// Writes to stdout, requests in green and responses in cyan, with the
/// leading label underlined.
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    fn print(&self, text: &str, color: &str) {
        let text = underline_first_line(text);
        println!("{color}{text}{DEFAULT_COLOR}");
    }
}

fn underline_first_line(text: &str) -> String {
    match text.split_once('\n') {
        Some((first, rest)) => format!("{UNDERLINE_ON}{first}{UNDERLINE_OFF}\n{rest}"),
        None => format!("{UNDERLINE_ON}{text}{UNDERLINE_OFF}"),
    }
}

impl PresentationSink for ConsoleSink {
    fn write_request(&self, text: &str, _id: &str) {
        self.print(text, GREEN);
    }

    fn write_response(&self, text: &str, _id: &str) {
        self.print(text, CYAN);
    }
}

/// Writes each message to `<folder>/<id>.req` / `<folder>/<id>.res`.
/// Requests and responses are saved independently; a direction without a
/// folder is skipped. Write failures are reported and otherwise ignored.
#[derive(Debug)]
pub struct FileSink {
    request_folder: Option<PathBuf>,
    response_folder: Option<PathBuf>,
}

impl FileSink {
    pub fn new(request_folder: Option<PathBuf>, response_folder: Option<PathBuf>) -> Self {
        Self {
            request_folder,
            response_folder,
        }
    }

    fn write(folder: &Path, text: &str, id: &str, extension: &str) {
        let path = folder.join(format!("{id}.{extension}"));
        if let Err(error) = std::fs::write(&path, text) {
            warn!("Could not write {}: {error}", path.display());
        }
    }
}

impl PresentationSink for FileSink {
    fn write_request(&self, text: &str, id: &str) {
        if let Some(folder) = &self.request_folder {
            Self::write(folder, text, id, "req");
        }
    }

    fn write_response(&self, text: &str, id: &str) {
        if let Some(folder) = &self.response_folder {
            Self::write(folder, text, id, "res");
        }
    }
}

/// Renders exchanged messages and fans them out to the configured sinks.
pub struct RequestResponseLogger {
    request_body_limit: usize,
    response_body_limit: usize,
    sinks: Vec<Box<dyn PresentationSink>>,
}

impl RequestResponseLogger {
    pub fn new(
        request_body_limit: usize,
        response_body_limit: usize,
        sinks: Vec<Box<dyn PresentationSink>>,
    ) -> Self {
        Self {
            request_body_limit,
            response_body_limit,
            sinks,
        }
    }

    pub fn log_request(&self, request: &SimRequest, id: &str) {
        let text = format_request(request, self.request_body_limit);
        for sink in &self.sinks {
            sink.write_request(&text, id);
        }
    }

    pub fn log_response(&self, status: u16, headers: &HeaderMap, body: &[u8], id: &str) {
        let text = format_response(status, headers, body, self.response_body_limit);
        for sink in &self.sinks {
            sink.write_response(&text, id);
        }
    }
}
