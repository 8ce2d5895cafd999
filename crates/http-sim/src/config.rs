//! Command-line configuration and startup wiring.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use crate::logging::{ConsoleSink, FileSink, PresentationSink, RequestResponseLogger};
use crate::rules::{DefaultResponse, DelayRange, RulesConfig, SimResponse};

/// HTTP server simulator: serves canned responses driven by declarative
/// rules, with a control API for managing them at runtime.
#[derive(Parser, Debug, Clone)]
#[command(name = "http-server-sim")]
#[command(author, version, about)]
pub struct AppConfig {
    /// URL the simulated endpoint listens on
    #[arg(long, default_value = "http://localhost:5000")]
    pub url: String,

    /// Dedicated URL for the control API. When absent, the control API is
    /// served from the simulated endpoint's listener.
    #[arg(long)]
    pub control_url: Option<String>,

    /// Path to a rules file loaded at startup
    #[arg(long)]
    pub rules: Option<PathBuf>,

    /// Log simulated requests and responses to the console
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub log_request_and_response: bool,

    /// Log control API requests and responses to the console
    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    pub log_control_request_and_response: bool,

    /// Maximum request body characters included in logs
    #[arg(long, default_value_t = 4096)]
    pub request_body_log_limit: usize,

    /// Maximum response body characters included in logs
    #[arg(long, default_value_t = 4096)]
    pub response_body_log_limit: usize,

    /// Folder where incoming requests are saved, one file per request
    #[arg(long)]
    pub save_requests: Option<PathBuf>,

    /// Folder where outgoing responses are saved, one file per response
    #[arg(long)]
    pub save_responses: Option<PathBuf>,

    /// Status code of the response served when no rule matches
    #[arg(long, default_value_t = 200)]
    pub default_status_code: u16,

    /// Content type of the default response
    #[arg(long)]
    pub default_content_type: Option<String>,

    /// Body of the default response
    #[arg(long)]
    pub default_content_value: Option<String>,

    /// Minimum delay in milliseconds applied to the default response
    #[arg(long)]
    pub default_delay_min: Option<u64>,

    /// Maximum delay in milliseconds applied to the default response
    #[arg(long)]
    pub default_delay_max: Option<u64>,
}

impl AppConfig {
    /// Address of the simulated endpoint.
    pub fn sim_addr(&self) -> Result<SocketAddr, anyhow::Error> {
        parse_bind_addr(&self.url)
    }

    /// Address of the dedicated control listener, if one was requested.
    pub fn control_addr(&self) -> Result<Option<SocketAddr>, anyhow::Error> {
        self.control_url
            .as_deref()
            .map(parse_bind_addr)
            .transpose()
    }

    /// Directory response files are resolved against: the rules file's
    /// folder, or the working directory when no rules file was given.
    pub fn response_files_root(&self) -> PathBuf {
        self.rules
            .as_deref()
            .and_then(Path::parent)
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// The response served when no rule matches.
    pub fn default_response(&self) -> DefaultResponse {
        let delay = self.default_delay_min.map(|min| DelayRange {
            min,
            max: self.default_delay_max,
        });
        DefaultResponse {
            response: SimResponse {
                status_code: self.default_status_code,
                content_value: self.default_content_value.clone(),
                content_type: self.default_content_type.clone(),
                ..Default::default()
            },
            delay,
        }
    }

    /// Logger for simulated traffic, or `None` when every sink is off.
    pub fn sim_logger(&self) -> Option<Arc<RequestResponseLogger>> {
        let mut sinks: Vec<Box<dyn PresentationSink>> = Vec::new();
        if self.log_request_and_response {
            sinks.push(Box::new(ConsoleSink));
        }
        if self.save_requests.is_some() || self.save_responses.is_some() {
            sinks.push(Box::new(FileSink::new(
                self.save_requests.clone(),
                self.save_responses.clone(),
            )));
        }
        if sinks.is_empty() {
            return None;
        }
        Some(Arc::new(RequestResponseLogger::new(
            self.request_body_log_limit,
            self.response_body_log_limit,
            sinks,
        )))
    }

    /// Logger for control API traffic.
    pub fn control_logger(&self) -> Option<Arc<RequestResponseLogger>> {
        if !self.log_control_request_and_response {
            return None;
        }
        Some(Arc::new(RequestResponseLogger::new(
            self.request_body_log_limit,
            self.response_body_log_limit,
            vec![Box::new(ConsoleSink)],
        )))
    }
}

/// Read and parse a rules file. A malformed file is a startup failure, not
/// a per-rule one.
pub fn load_rules_file(path: &Path) -> Result<RulesConfig, anyhow::Error> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("could not read rules file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("could not parse rules file {}", path.display()))
}

/// Turn a listen URL like `http://localhost:5000` into a bind address.
pub fn parse_bind_addr(url: &str) -> Result<SocketAddr, anyhow::Error> {
    let rest = url
        .strip_prefix("http://")
        .with_context(|| format!("unsupported listen URL '{url}', expected http://host:port"))?;
    let rest = rest.trim_end_matches('/');
    let (host, port) = rest
        .rsplit_once(':')
        .with_context(|| format!("listen URL '{url}' is missing a port"))?;
    let port: u16 = port
        .parse()
        .with_context(|| format!("invalid port in listen URL '{url}'"))?;
    let ip: IpAddr = match host {
        "localhost" => IpAddr::from([127, 0, 0, 1]),
        "*" | "+" | "0.0.0.0" => IpAddr::from([0, 0, 0, 0]),
        other => other
            .parse()
            .with_context(|| format!("invalid host in listen URL '{url}'"))?,
    };
    Ok(SocketAddr::new(ip, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(args: &[&str]) -> AppConfig {
        AppConfig::parse_from(std::iter::once("http-server-sim").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.url, "http://localhost:5000");
        assert!(config.control_url.is_none());
        assert!(config.log_request_and_response);
        assert!(!config.log_control_request_and_response);
        assert_eq!(config.request_body_log_limit, 4096);
        assert_eq!(config.default_status_code, 200);
    }

    #[test]
    fn test_boolean_flags_take_explicit_values() {
        let config = config(&[
            "--log-request-and-response",
            "false",
            "--log-control-request-and-response",
            "true",
        ]);
        assert!(!config.log_request_and_response);
        assert!(config.log_control_request_and_response);
    }

    #[test]
    fn test_parse_bind_addr() {
        assert_eq!(
            parse_bind_addr("http://localhost:5000").unwrap(),
            "127.0.0.1:5000".parse().unwrap()
        );
        assert_eq!(
            parse_bind_addr("http://0.0.0.0:8080/").unwrap(),
            "0.0.0.0:8080".parse().unwrap()
        );
        assert_eq!(
            parse_bind_addr("http://192.168.1.10:81").unwrap(),
            "192.168.1.10:81".parse().unwrap()
        );
        assert!(parse_bind_addr("https://localhost:5000").is_err());
        assert!(parse_bind_addr("http://localhost").is_err());
        assert!(parse_bind_addr("http://localhost:notaport").is_err());
    }

    #[test]
    fn test_response_files_root_follows_rules_file() {
        let mut config = config(&[]);
        assert_eq!(config.response_files_root(), PathBuf::from("."));
        config.rules = Some(PathBuf::from("/etc/sim/rules.json"));
        assert_eq!(config.response_files_root(), PathBuf::from("/etc/sim"));
    }

    #[test]
    fn test_default_response_carries_delay() {
        let config = config(&[
            "--default-status-code",
            "404",
            "--default-content-value",
            "no match",
            "--default-delay-min",
            "100",
            "--default-delay-max",
            "200",
        ]);
        let default = config.default_response();
        assert_eq!(default.response.status_code, 404);
        assert_eq!(default.response.content_value.as_deref(), Some("no match"));
        assert_eq!(
            default.delay,
            Some(DelayRange {
                min: 100,
                max: Some(200)
            })
        );
    }

    #[test]
    fn test_load_rules_file_errors() {
        let missing = load_rules_file(Path::new("/does/not/exist.json"));
        assert!(missing.is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_rules_file(&path).is_err());

        std::fs::write(&path, r#"{"rules": []}"#).unwrap();
        assert!(load_rules_file(&path).unwrap().rules.is_empty());
    }
}
