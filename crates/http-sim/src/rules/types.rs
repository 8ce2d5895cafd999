//! Declarative rule model shared by the rules file and the control API.
//!
//! Field and enum spellings (`StartWith`, `GZip`, header key/value pairs)
//! are part of the wire contract with existing rules files and clients and
//! must not be renamed.

use serde::{Deserialize, Serialize};

/// Schema of a rules file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesConfig {
    #[serde(default)]
    pub rules: Vec<ConfigRule>,
}

/// A declarative rule as supplied by a rules file or the control API.
///
/// A rule carries either `response` (single) or `responses` (rotated);
/// supplying both is a validation failure for that one rule. The loader
/// normalizes the single shape into a one-element `responses` list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRule {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub conditions: Vec<ConfigCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<SimResponse>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<SimResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<DelayRange>,
}

/// A single field/operator/value test against an incoming request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigCondition {
    pub field: Field,
    pub operator: Operator,
    /// A condition without a value never matches and is reported at build
    /// time, not at evaluation time.
    #[serde(default)]
    pub value: Option<String>,
}

/// Request field a condition applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    Method,
    Path,
}

/// Comparison operator. All comparisons are case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Equals,
    StartWith,
    Contains,
}

/// A response header: one key with one or more values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub key: String,
    pub value: Vec<String>,
}

/// How `contentValue` is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentValueType {
    /// `contentValue` is literal text.
    #[default]
    Text,
    /// `contentValue` is a file path relative to the response-files root.
    File,
}

/// Body encoding applied when writing the response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseEncoding {
    #[default]
    None,
    GZip,
}

/// A response HTTP message. Immutable once attached to a rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimResponse {
    #[serde(default = "default_status_code")]
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<Header>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_value: Option<String>,
    #[serde(default, skip_serializing_if = "is_text")]
    pub content_value_type: ContentValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "is_no_encoding")]
    pub encoding: ResponseEncoding,
}

fn default_status_code() -> u16 {
    200
}

fn is_text(value: &ContentValueType) -> bool {
    *value == ContentValueType::Text
}

fn is_no_encoding(value: &ResponseEncoding) -> bool {
    *value == ResponseEncoding::None
}

impl Default for SimResponse {
    fn default() -> Self {
        Self {
            status_code: default_status_code(),
            headers: None,
            content_value: None,
            content_value_type: ContentValueType::Text,
            content_type: None,
            encoding: ResponseEncoding::None,
        }
    }
}

/// Artificial latency range in milliseconds. `max`, when present, must be
/// greater than or equal to `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayRange {
    #[serde(default)]
    pub min: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u64>,
}

/// The response served when no rule matches. Built once at startup,
/// read-only afterwards.
#[derive(Debug, Clone)]
pub struct DefaultResponse {
    pub response: SimResponse,
    pub delay: Option<DelayRange>,
}

/// Rule shape returned by the control API.
///
/// Clients that predate multi-response rules expect `response` when exactly
/// one response exists; `responses` is populated only for rotating rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleView {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub conditions: Vec<ConfigCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<SimResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responses: Option<Vec<SimResponse>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<DelayRange>,
}
