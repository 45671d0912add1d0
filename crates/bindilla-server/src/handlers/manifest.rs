//! The host manifest endpoint.

use super::{json_response, method_not_allowed, HandlerResult};
use crate::server::AppState;
use axum::http::{Method, StatusCode};

pub(super) fn handle(
    state: &AppState,
    method: &Method,
    environs: Option<Vec<String>>,
) -> HandlerResult {
    if method != Method::GET {
        return method_not_allowed(method, &[Method::GET]);
    }
    let manifest = state.host.manifest(environs.as_deref());
    json_response(StatusCode::OK, &manifest)
}
