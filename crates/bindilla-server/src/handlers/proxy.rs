//! Forwarding requests to launched Binders.

use super::{build_response, method_not_allowed, HandlerResult};
use crate::server::AppState;
use axum::{
    body::Bytes,
    http::{header, HeaderMap, Method, StatusCode},
};
use bindilla_core::ProxyRequest;

/// Which Binder, and where on it, a proxied request goes.
pub(super) struct Target {
    pub binder_id: String,
    pub token: String,
    /// Path with query string.
    pub path: String,
}

pub(super) async fn handle(
    state: &AppState,
    method: Method,
    target: Target,
    headers: &HeaderMap,
    body: Bytes,
) -> HandlerResult {
    let mut request = match method {
        Method::GET | Method::POST | Method::PUT => {
            ProxyRequest::new(method.clone(), &target.binder_id, &target.token, &target.path)
        }
        _ => {
            return method_not_allowed(&method, &[Method::GET, Method::POST, Method::PUT])
        }
    };
    if method != Method::GET {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        request = request.with_body(body, content_type);
    }

    let response = state.host.proxy_environ(request).await?;
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::OK);
    build_response(status, &response.headers, response.body)
}
