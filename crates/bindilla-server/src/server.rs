//! HTTP server implementation using Axum.

use crate::handlers::{dispatch, handle_health};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use bindilla_core::{Host, ServerConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

const SERVER_HEADER: &str = concat!("Bindilla/", env!("CARGO_PKG_VERSION"), " (axum)");

/// Application state shared across handlers.
pub struct AppState {
    pub host: Host,
}

/// Build the router with CORS, tracing and the `Server` header applied.
pub fn router(host: Host) -> Router {
    let state = Arc::new(AppState { host });

    // Mirror the request origin: browsers reject a wildcard origin when
    // the request's credentials mode is `include`.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    Router::new()
        .route("/health", get(handle_health))
        .fallback(dispatch)
        .layer(DefaultBodyLimit::max(ServerConfig::MAX_BODY_SIZE))
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::SERVER,
            HeaderValue::from_static(SERVER_HEADER),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(host: Host, bind_host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    let app = router(host);

    let addr: SocketAddr = format!("{}:{}", bind_host, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    Ok(actual_addr)
}
