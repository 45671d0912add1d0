//! The home page.
//!
//! Redirects browsers to the project README with a meta refresh rather than
//! a 301/302, so load balancer health checks against `/` see a 200.

use super::{method_not_allowed, HandlerResult};
use axum::{
    http::{header, Method, StatusCode},
    response::IntoResponse,
};
use bindilla_core::ServerConfig;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8">
        <meta http-equiv="refresh" content="0; URL='{readme}'" />
    </head>
    <body>
        <script>window.location = "{readme}";</script>
    </body>
</html>
"#;

pub(super) fn handle(method: &Method) -> HandlerResult {
    if method != Method::GET {
        return method_not_allowed(method, &[Method::GET]);
    }
    let page = INDEX_HTML.replace("{readme}", ServerConfig::README_URL);
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        page,
    )
        .into_response())
}
