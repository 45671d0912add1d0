//! Requests forwarded to, and responses returned from, a launched Binder.

use crate::{BindillaError, Result};
use bytes::Bytes;
use reqwest::Method;

/// Response headers that describe the upstream connection rather than the
/// content, and so must not be copied onto the proxied response.
const SKIPPED_HEADERS: [&str; 4] = [
    "content-length",
    "transfer-encoding",
    "content-encoding",
    "connection",
];

/// Whether an upstream response header should be dropped when proxying.
pub fn is_skipped_header(name: &str) -> bool {
    SKIPPED_HEADERS
        .iter()
        .any(|skipped| skipped.eq_ignore_ascii_case(name))
}

/// A request to forward to the Jupyter server of a launched Binder.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    /// Binder server name, as found in `/user/<binder_id>/` on the hub.
    pub binder_id: String,
    pub token: String,
    /// Path below the Binder server root, with any query string.
    pub path: String,
    pub body: Option<Bytes>,
    pub content_type: Option<String>,
}

impl ProxyRequest {
    pub fn new(method: Method, binder_id: &str, token: &str, path: &str) -> Self {
        Self {
            method,
            binder_id: binder_id.to_string(),
            token: token.to_string(),
            path: path.to_string(),
            body: None,
            content_type: None,
        }
    }

    pub fn with_body(mut self, body: Bytes, content_type: Option<String>) -> Self {
        self.body = Some(body);
        self.content_type = content_type;
        self
    }

    /// Reject ids, tokens and paths that could escape the Binder's own URL
    /// space.
    pub fn validate(&self) -> Result<()> {
        let valid_id = !self.binder_id.is_empty()
            && self
                .binder_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && self.binder_id != "."
            && self.binder_id != "..";
        if !valid_id {
            return Err(BindillaError::InvalidRequest {
                message: format!("invalid binder id: {}", self.binder_id),
            });
        }
        if self.token.is_empty() || self.token.contains(['/', '\r', '\n']) {
            return Err(BindillaError::InvalidRequest {
                message: "invalid binder token".to_string(),
            });
        }
        if has_dot_segment(&self.path) {
            return Err(BindillaError::InvalidRequest {
                message: format!("invalid proxy path: {}", self.path),
            });
        }
        Ok(())
    }
}

/// Whether a path (query string ignored) has a `.` or `..` segment, plain or
/// percent-encoded. URL parsing resolves those, moving the request out from
/// under `/user/<binder_id>/`.
fn has_dot_segment(path: &str) -> bool {
    let path = path.split_once('?').map_or(path, |(path, _)| path);
    path.split(['/', '\\']).any(|segment| {
        let decoded = urlencoding::decode_binary(segment.as_bytes());
        matches!(decoded.as_ref(), b"." | b"..")
    })
}

/// A successful upstream response, with connection headers removed.
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_headers_case_insensitive() {
        assert!(is_skipped_header("Content-Length"));
        assert!(is_skipped_header("transfer-encoding"));
        assert!(is_skipped_header("CONNECTION"));
        assert!(!is_skipped_header("Content-Type"));
        assert!(!is_skipped_header("Set-Cookie"));
    }

    #[test]
    fn test_validate_accepts_binder_names() {
        let request = ProxyRequest::new(Method::GET, "stencila-images-9ik3b1p1", "abc", "api");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_traversal() {
        for id in ["a/b", "..", "", "a b"] {
            let request = ProxyRequest::new(Method::GET, id, "abc", "api");
            assert!(
                matches!(request.validate(), Err(BindillaError::InvalidRequest { .. })),
                "{id:?} should be rejected"
            );
        }
        let request = ProxyRequest::new(Method::GET, "abc", "", "api");
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_dot_segments_in_path() {
        for path in [
            "../../hub/api/users",
            "api/../../hub",
            "./api",
            "api/..",
            "%2e%2e/%2E%2E/hub/api/users",
            ".%2e/hub",
            "..\\..\\hub",
        ] {
            let request = ProxyRequest::new(Method::GET, "abc-123", "t0k", path);
            assert!(
                matches!(request.validate(), Err(BindillaError::InvalidRequest { .. })),
                "{path:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_accepts_dots_within_names() {
        for path in [
            "api/contents/notebook.ipynb",
            "files/..hidden/a...b",
            "api/contents?path=../x",
        ] {
            let request = ProxyRequest::new(Method::GET, "abc-123", "t0k", path);
            assert!(request.validate().is_ok(), "{path:?} should be accepted");
        }
    }
}
