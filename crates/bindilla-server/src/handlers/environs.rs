//! Launching and shutting down environs.

use super::{empty_response, json_response, method_not_allowed, HandlerResult};
use crate::server::AppState;
use axum::http::{Method, StatusCode};

pub(super) async fn handle(state: &AppState, method: &Method, environ_id: &str) -> HandlerResult {
    match *method {
        Method::POST => {
            let launched = state.host.launch_environ(environ_id).await?;
            json_response(StatusCode::OK, &launched)
        }
        Method::DELETE => {
            state.host.shutdown_environ(environ_id).await?;
            Ok(empty_response(StatusCode::OK))
        }
        _ => method_not_allowed(method, &[Method::POST, Method::DELETE]),
    }
}
