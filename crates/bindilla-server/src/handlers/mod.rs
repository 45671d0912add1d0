//! HTTP request handlers, split by endpoint.

mod environs;
mod index;
mod manifest;
mod proxy;

use crate::routes::Route;
use crate::server::AppState;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use bindilla_core::BindillaError;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Result of an endpoint handler.
pub(crate) type HandlerResult = std::result::Result<Response, ApiError>;

/// A [`BindillaError`] on its way to becoming an HTTP response.
#[derive(Debug)]
pub(crate) struct ApiError(BindillaError);

impl From<BindillaError> for ApiError {
    fn from(err: BindillaError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
        if status.is_server_error() {
            error!("Request failed ({}): {}", status, self.0);
        } else {
            warn!("Request rejected ({}): {}", status, self.0);
        }
        error_response(status, &self.0.to_string())
    }
}

/// Health check endpoint.
pub async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Entry point for every path other than `/health`.
pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(route) = Route::parse(uri.path()) else {
        debug!("No route for {} {}", method, uri.path());
        return error_response(StatusCode::NOT_FOUND, "Not found");
    };

    debug!(
        "{} {} [{}]",
        method,
        uri.path(),
        route.version().map(|v| v.as_str()).unwrap_or("index")
    );

    // OPTIONS never gets here: the CORS layer answers it.
    if method == Method::HEAD {
        return empty_response(StatusCode::NO_CONTENT);
    }

    let result = match route {
        Route::Index => index::handle(&method),
        Route::Manifest { environs, .. } => manifest::handle(&state, &method, environs),
        Route::Environ { environ_id, .. } => {
            environs::handle(&state, &method, &environ_id).await
        }
        Route::Proxy {
            binder_id,
            token,
            path,
            ..
        } => {
            let path = match uri.query() {
                Some(query) => format!("{}?{}", path, query),
                None => path,
            };
            let target = proxy::Target {
                binder_id,
                token,
                path,
            };
            proxy::handle(&state, method, target, &headers, body).await
        }
    };

    result.unwrap_or_else(IntoResponse::into_response)
}

/// Pretty printed JSON body with the given status.
pub(crate) fn json_response<T: Serialize>(status: StatusCode, value: &T) -> HandlerResult {
    let body = serde_json::to_string_pretty(value).map_err(BindillaError::from)?;
    Ok((status, [(header::CONTENT_TYPE, APPLICATION_JSON)], body).into_response())
}

/// Empty body, still labelled as JSON like every other API response.
pub(crate) fn empty_response(status: StatusCode) -> Response {
    (status, [(header::CONTENT_TYPE, APPLICATION_JSON)]).into_response()
}

pub(crate) fn error_response(status: StatusCode, message: &str) -> Response {
    let body = json!({ "error": message }).to_string();
    (status, [(header::CONTENT_TYPE, APPLICATION_JSON)], body).into_response()
}

/// 405 with an `Allow` header listing what the route does accept.
pub(crate) fn method_not_allowed(method: &Method, allowed: &[Method]) -> HandlerResult {
    let mut response = error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &format!("Method {} not allowed", method),
    );
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    Ok(response)
}

pub(crate) const APPLICATION_JSON: &str = "application/json";

/// Build a response from parts that came from somewhere we don't control.
pub(crate) fn build_response(
    status: StatusCode,
    headers: &[(String, String)],
    body: Bytes,
) -> HandlerResult {
    let mut builder = Response::builder().status(status);
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if !body.is_empty() {
        builder = builder.header(header::CONTENT_LENGTH, body.len());
    }
    builder
        .body(Body::from(body))
        .map_err(|e| ApiError(BindillaError::Other(format!("Invalid response: {}", e))))
}
