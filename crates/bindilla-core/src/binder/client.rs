//! HTTP client for the Binder build API and the hub serving launched Binders.
//!
//! Launching reads Binder's server-sent event stream until the server is
//! `ready` (or `failed`). Proxying forwards a request to the launched
//! Jupyter server, authenticating with the token Binder handed out.

use super::events::{BinderEvent, BinderPhase, LaunchedEnviron};
use crate::config::{BinderConfig, HostConfig};
use crate::environ::Environ;
use crate::network::{retry_async, RetryPolicy};
use crate::proxy::{is_skipped_header, ProxyRequest, ProxyResponse};
use crate::{BindillaError, Result};
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::{header, Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Client for one Binder deployment.
#[derive(Debug, Clone)]
pub struct BinderClient {
    client: Client,
    binder_url: String,
    hub_url: String,
    retry: RetryPolicy,
    proxy_timeout: Duration,
}

impl BinderClient {
    pub fn new(config: &HostConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(BinderConfig::CONNECT_TIMEOUT)
            .user_agent(BinderConfig::USER_AGENT)
            .build()
            .map_err(|e| BindillaError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(e),
            })?;

        Ok(Self {
            client,
            binder_url: config.binder_url.clone(),
            hub_url: config.hub_url.clone(),
            retry: RetryPolicy::default()
                .with_max_attempts(BinderConfig::LAUNCH_ATTEMPTS)
                .with_base_delay(BinderConfig::LAUNCH_RETRY_BASE_DELAY),
            proxy_timeout: BinderConfig::PROXY_TIMEOUT,
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Time allowed for a proxied request, including reading its body.
    pub fn with_proxy_timeout(mut self, timeout: Duration) -> Self {
        self.proxy_timeout = timeout;
        self
    }

    /// Launch an environ on Binder, retrying while Binder is busy.
    pub async fn launch(&self, environ: &Environ) -> Result<LaunchedEnviron> {
        retry_async(
            &self.retry,
            || self.launch_once(environ),
            BindillaError::is_retryable,
        )
        .await
    }

    async fn launch_once(&self, environ: &Environ) -> Result<LaunchedEnviron> {
        let url = format!("{}/build/{}", self.binder_url, environ.binder);
        info!("Launching {} via {}", environ.id, url);

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "text/event-stream")
            .timeout(BinderConfig::LAUNCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| request_error(e, "GET", &url, BinderConfig::LAUNCH_TIMEOUT))?;
        let response = check_status(response, &url)?;

        let mut events = response.bytes_stream().eventsource();
        while let Some(event) = events.next().await {
            let event = event.map_err(|e| BindillaError::Network {
                message: format!("Error reading Binder events for {}: {}", environ.id, e),
                source: None,
            })?;
            if event.data.trim().is_empty() {
                continue;
            }

            let event = match BinderEvent::parse(&event.data) {
                Ok(event) => event,
                Err(e) => {
                    warn!("Skipping malformed Binder event for {}: {}", environ.id, e);
                    continue;
                }
            };

            match event.phase {
                BinderPhase::Ready => {
                    let launched = LaunchedEnviron::from_ready(environ, event)?;
                    info!("Environ {} ready at {}", environ.id, launched.url);
                    return Ok(launched);
                }
                BinderPhase::Failed => {
                    let message = event
                        .message
                        .map(|m| m.trim().to_string())
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| "Binder reported a failure".to_string());
                    warn!("Launch of {} failed: {}", environ.id, message);
                    return Err(BindillaError::LaunchFailed {
                        environ: environ.id.clone(),
                        message,
                    });
                }
                phase => debug!(
                    "{} [{}] {}",
                    environ.id,
                    phase,
                    event.message.as_deref().unwrap_or("").trim()
                ),
            }
        }

        Err(BindillaError::LaunchFailed {
            environ: environ.id.clone(),
            message: "event stream ended before the server was ready".to_string(),
        })
    }

    /// Forward a request to the Jupyter server of a launched Binder.
    pub async fn proxy(&self, request: ProxyRequest) -> Result<ProxyResponse> {
        let url = format!(
            "{}/user/{}/{}",
            self.hub_url,
            request.binder_id,
            request.path.trim_start_matches('/')
        );
        debug!("Proxying {} {}", request.method, url);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .header(header::AUTHORIZATION, format!("token {}", request.token))
            .timeout(self.proxy_timeout);
        if let Some(content_type) = &request.content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let method = request.method.as_str();
        let response = builder
            .send()
            .await
            .map_err(|e| request_error(e, method, &url, self.proxy_timeout))?;
        let status = response.status();
        if !status.is_success() {
            debug!("Upstream {} answered {}", url, status);
            return Err(BindillaError::upstream(status.as_u16()));
        }

        let headers = response
            .headers()
            .iter()
            .filter(|(name, _)| !is_skipped_header(name.as_str()))
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| request_error(e, method, &url, self.proxy_timeout))?;

        Ok(ProxyResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

fn request_error(err: reqwest::Error, method: &str, url: &str, timeout: Duration) -> BindillaError {
    if err.is_timeout() {
        return BindillaError::Timeout(timeout);
    }
    BindillaError::Network {
        message: format!("{} {} failed: {}", method, url, err),
        source: Some(err),
    }
}

fn check_status(response: Response, url: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        return Err(BindillaError::RateLimited {
            service: extract_domain(url),
            retry_after_secs: retry_after,
        });
    }

    Err(BindillaError::upstream(status.as_u16()))
}

/// Extract domain from a URL.
fn extract_domain(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(String::from))
        .unwrap_or_else(|| "unknown".to_string())
}
