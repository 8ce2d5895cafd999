//! Internal representation of an incoming request.
//!
//! The simulated endpoint works on this mapped form rather than on hyper's
//! types: the body has already been collected, and condition evaluation and
//! history retention both need an owned, clonable value.

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

use crate::rules::Header;

#[derive(Debug, Clone)]
enum JsonCache {
    Unresolved,
    Resolved(Option<Value>),
}

/// An incoming request mapped into the rule engine's vocabulary.
#[derive(Debug)]
pub struct SimRequest {
    method: String,
    path: String,
    query: Option<String>,
    headers: Vec<Header>,
    content_value: Option<String>,
    /// Body parsed as a JSON object, computed on first use.
    json_content: Mutex<JsonCache>,
}

impl SimRequest {
    pub fn new(method: &str, path: &str) -> Self {
        Self::from_parts(method.to_string(), path.to_string(), None, Vec::new(), None)
    }

    pub fn from_parts(
        method: String,
        path: String,
        query: Option<String>,
        headers: Vec<Header>,
        content_value: Option<String>,
    ) -> Self {
        Self {
            method,
            path,
            query,
            headers,
            content_value,
            json_content: Mutex::new(JsonCache::Unresolved),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub fn content_value(&self) -> Option<&str> {
        self.content_value.as_deref()
    }

    /// The body parsed as a JSON object, or `None` when the body is absent,
    /// not valid JSON, or not an object. Parsed once and cached.
    pub fn json_content(&self) -> Option<Value> {
        let mut cache = self.json_content.lock();
        if let JsonCache::Resolved(value) = &*cache {
            return value.clone();
        }
        let value = self
            .content_value
            .as_deref()
            .and_then(|body| serde_json::from_str::<Value>(body).ok())
            .filter(Value::is_object);
        *cache = JsonCache::Resolved(value.clone());
        value
    }

    /// Snapshot for the control API's request-history endpoint.
    pub fn captured(&self) -> CapturedRequest {
        CapturedRequest {
            method: self.method.clone(),
            path: self.path.clone(),
            query: self.query.clone(),
            headers: self.headers.clone(),
            content_value: self.content_value.clone(),
            json_content: self.json_content(),
        }
    }
}

impl Clone for SimRequest {
    fn clone(&self) -> Self {
        Self {
            method: self.method.clone(),
            path: self.path.clone(),
            query: self.query.clone(),
            headers: self.headers.clone(),
            content_value: self.content_value.clone(),
            json_content: Mutex::new(self.json_content.lock().clone()),
        }
    }
}

/// Wire shape of a retained request as returned by the control API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub headers: Vec<Header>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_content: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_content_parses_object_body() {
        let request = SimRequest::from_parts(
            "POST".into(),
            "/customers".into(),
            None,
            vec![],
            Some(r#"{"id": 5, "name": "Pine"}"#.into()),
        );
        let json = request.json_content().unwrap();
        assert_eq!(json["id"], 5);
        assert_eq!(json["name"], "Pine");
    }

    #[test]
    fn test_json_content_rejects_non_object() {
        let array = SimRequest::from_parts("POST".into(), "/".into(), None, vec![], Some("[1,2]".into()));
        assert!(array.json_content().is_none());

        let text = SimRequest::from_parts("POST".into(), "/".into(), None, vec![], Some("plain".into()));
        assert!(text.json_content().is_none());

        let empty = SimRequest::new("GET", "/");
        assert!(empty.json_content().is_none());
    }

    #[test]
    fn test_captured_snapshot_includes_json_content() {
        let request = SimRequest::from_parts(
            "POST".into(),
            "/customers".into(),
            Some("v=1".into()),
            vec![Header {
                key: "Content-Type".into(),
                value: vec!["application/json".into()],
            }],
            Some(r#"{"id": 1}"#.into()),
        );
        let captured = request.captured();
        assert_eq!(captured.method, "POST");
        assert_eq!(captured.query.as_deref(), Some("v=1"));
        assert_eq!(captured.json_content.as_ref().unwrap()["id"], 1);

        let json = serde_json::to_value(&captured).unwrap();
        assert!(json.get("jsonContent").is_some());
        assert_eq!(json["headers"][0]["key"], "Content-Type");
    }

    #[test]
    fn test_clone_preserves_fields() {
        let request = SimRequest::from_parts(
            "GET".into(),
            "/a".into(),
            Some("q=1".into()),
            vec![],
            Some("{}".into()),
        );
        let copy = request.clone();
        assert_eq!(copy.method(), "GET");
        assert_eq!(copy.path(), "/a");
        assert_eq!(copy.query(), Some("q=1"));
        assert_eq!(copy.content_value(), Some("{}"));
    }
}
