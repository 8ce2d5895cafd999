//! Renders exchanged HTTP messages as plain text for the logging sinks.

use hyper::HeaderMap;

use crate::sim::SimRequest;

const BODY_NOT_PRESENT: &str = "[Not present]";

/// Render an incoming request. `body_limit` caps the number of body
/// characters included; anything beyond it is replaced with a truncation
/// marker.
pub fn format_request(request: &SimRequest, body_limit: usize) -> String {
    let host = request
        .headers()
        .iter()
        .find(|header| header.key.eq_ignore_ascii_case("host"))
        .and_then(|header| header.value.first().cloned())
        .unwrap_or_else(|| "localhost".to_string());
    let query = request
        .query()
        .map(|query| format!("?{query}"))
        .unwrap_or_default();

    let mut text = String::new();
    text.push_str("Request:\n");
    text.push_str(&format!(
        "HTTP/1.1 - {} - http://{}{}{}\n",
        request.method(),
        host,
        request.path(),
        query
    ));
    text.push_str("Headers:\n");
    for header in request.headers() {
        text.push_str(&format!("  {}: {}\n", header.key, header.value.join(", ")));
    }
    text.push_str("Body:\n");
    append_body(&mut text, request.content_value(), body_limit);
    text.push_str("End of Request");
    text
}

/// Render an outgoing response.
pub fn format_response(status: u16, headers: &HeaderMap, body: &[u8], body_limit: usize) -> String {
    let mut text = String::new();
    text.push_str("Response:\n");
    text.push_str(&format!("Status Code: {status}\n"));
    text.push_str("Headers:\n");
    for (name, value) in headers {
        text.push_str(&format!(
            "  {}: {}\n",
            name,
            value.to_str().unwrap_or("[non-text value]")
        ));
    }
    text.push_str("Body:\n");
    let body_text;
    let body = if body.is_empty() {
        None
    } else {
        body_text = String::from_utf8_lossy(body);
        Some(body_text.as_ref())
    };
    append_body(&mut text, body, body_limit);
    text.push_str("End of Response");
    text
}

fn append_body(text: &mut String, body: Option<&str>, body_limit: usize) {
    match body {
        None | Some("") => {
            text.push_str(BODY_NOT_PRESENT);
            text.push('\n');
        }
        Some(body) => {
            // The limit is in characters, not bytes.
            let char_count = body.chars().count();
            if char_count > body_limit {
                text.extend(body.chars().take(body_limit));
                text.push('\n');
                text.push_str(&format!("[Body truncated. Read {body_limit} characters]\n"));
            } else {
                text.push_str(body);
                text.push('\n');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Header;

    fn request_with_body(body: Option<&str>) -> SimRequest {
        SimRequest::from_parts(
            "POST".into(),
            "/customers".into(),
            Some("page=2".into()),
            vec![
                Header {
                    key: "Host".into(),
                    value: vec!["localhost:5000".into()],
                },
                Header {
                    key: "Accept".into(),
                    value: vec!["application/json".into(), "text/plain".into()],
                },
            ],
            body.map(str::to_string),
        )
    }

    #[test]
    fn test_request_rendering() {
        let text = format_request(&request_with_body(Some("{\"id\":1}")), 4096);
        assert!(text.starts_with("Request:\n"));
        assert!(text.contains("HTTP/1.1 - POST - http://localhost:5000/customers?page=2\n"));
        assert!(text.contains("  Accept: application/json, text/plain\n"));
        assert!(text.contains("Body:\n{\"id\":1}\n"));
        assert!(text.ends_with("End of Request"));
    }

    #[test]
    fn test_missing_body_marker() {
        let text = format_request(&request_with_body(None), 4096);
        assert!(text.contains("Body:\n[Not present]\n"));
    }

    #[test]
    fn test_body_truncation_is_character_based() {
        let body = "é".repeat(10);
        let text = format_request(&request_with_body(Some(&body)), 6);
        assert!(text.contains(&"é".repeat(6)));
        assert!(text.contains("[Body truncated. Read 6 characters]"));
        assert!(!text.contains(&"é".repeat(7)));
    }

    #[test]
    fn test_body_at_limit_is_not_truncated() {
        let text = format_request(&request_with_body(Some("abcd")), 4);
        assert!(text.contains("Body:\nabcd\n"));
        assert!(!text.contains("truncated"));
    }

    #[test]
    fn test_response_rendering() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        let text = format_response(200, &headers, b"[]", 4096);
        assert!(text.starts_with("Response:\nStatus Code: 200\n"));
        assert!(text.contains("  content-type: application/json\n"));
        assert!(text.contains("Body:\n[]\n"));
        assert!(text.ends_with("End of Response"));
    }

    #[test]
    fn test_empty_response_body_marker() {
        let text = format_response(204, &HeaderMap::new(), b"", 4096);
        assert!(text.contains("Body:\n[Not present]\n"));
    }
}
