//! The Bindilla host: what the HTTP layer calls into.

use crate::binder::{BinderClient, LaunchedEnviron};
use crate::config::HostConfig;
use crate::manifest::Manifest;
use crate::proxy::{ProxyRequest, ProxyResponse};
use crate::{BindillaError, Result};
use tracing::info;

/// Launches environs on Binder and proxies requests to them.
///
/// Cheap to share behind an `Arc`; it holds no per-launch state. Binder
/// itself keeps track of launched servers and culls idle ones.
#[derive(Debug, Clone)]
pub struct Host {
    config: HostConfig,
    binder: BinderClient,
}

impl Host {
    pub fn new(config: HostConfig) -> Result<Self> {
        let binder = BinderClient::new(&config)?;
        Ok(Self { config, binder })
    }

    /// Use a preconfigured Binder client, e.g. with a faster retry policy.
    pub fn with_binder_client(mut self, binder: BinderClient) -> Self {
        self.binder = binder;
        self
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Manifest listing the requested environs, or the whole catalog when
    /// none are requested.
    pub fn manifest(&self, requested: Option<&[String]>) -> Manifest {
        let catalog = &self.config.catalog;
        let environs = match requested {
            Some(ids) if !ids.is_empty() => catalog.select(ids),
            _ => catalog.all().to_vec(),
        };
        Manifest::new(environs)
    }

    /// Launch a Binder for the environ and wait until it is ready.
    pub async fn launch_environ(&self, environ_id: &str) -> Result<LaunchedEnviron> {
        let environ = self
            .config
            .catalog
            .get(environ_id)
            .ok_or_else(|| BindillaError::UnknownEnviron(environ_id.to_string()))?;
        self.binder.launch(environ).await
    }

    /// Accepted for API compatibility only: Binder culls idle servers itself.
    pub async fn shutdown_environ(&self, environ_id: &str) -> Result<()> {
        info!("Shutdown requested for {} (Binder culls idle servers)", environ_id);
        Ok(())
    }

    /// Forward a request to a launched Binder.
    pub async fn proxy_environ(&self, request: ProxyRequest) -> Result<ProxyResponse> {
        request.validate()?;
        self.binder.proxy(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    fn host() -> Host {
        Host::new(HostConfig::default()).unwrap()
    }

    #[test]
    fn test_manifest_defaults_to_catalog() {
        let host = host();
        let all = host.manifest(None);
        assert_eq!(all.environs.len(), host.config().catalog.len());
        let empty: Vec<String> = Vec::new();
        assert_eq!(host.manifest(Some(empty.as_slice())), all);
    }

    #[test]
    fn test_manifest_selects_requested() {
        let requested = vec!["stencila/py".to_string(), "other/thing".to_string()];
        let manifest = host().manifest(Some(requested.as_slice()));
        assert_eq!(manifest.environs.len(), 1);
        assert_eq!(manifest.environs[0].id, "stencila/py");
    }

    #[tokio::test]
    async fn test_launch_unknown_environ() {
        let err = host().launch_environ("nope/nope").await.unwrap_err();
        assert!(matches!(err, BindillaError::UnknownEnviron(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_shutdown_is_noop() {
        assert!(host().shutdown_environ("stencila/core").await.is_ok());
    }

    #[tokio::test]
    async fn test_proxy_rejects_invalid_binder_id() {
        let request = ProxyRequest::new(Method::GET, "../admin", "t0k", "api");
        let err = host().proxy_environ(request).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_proxy_stays_under_binder_server() {
        let mut server = mockito::Server::new_async().await;
        let hub_api = server
            .mock("GET", "/hub/api/users")
            .with_status(200)
            .with_body("hub-admin-api")
            .expect(0)
            .create_async()
            .await;
        let config = HostConfig::new()
            .with_binder_url(server.url())
            .with_hub_url(server.url());
        let host = Host::new(config).unwrap();

        for path in ["../../hub/api/users", "%2e%2e/%2e%2e/hub/api/users"] {
            let request = ProxyRequest::new(Method::GET, "abc-123", "t0k", path);
            let err = host.proxy_environ(request).await.unwrap_err();
            assert!(matches!(err, BindillaError::InvalidRequest { .. }), "{path}");
        }
        hub_api.assert_async().await;
    }
}
