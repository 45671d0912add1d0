//! Centralized configuration for Bindilla.
//!
//! Constants for talking to Binder and serving HTTP, plus the runtime
//! [`HostConfig`] assembled from command line arguments.

use crate::environ::EnvironCatalog;
use std::time::Duration;

/// Package name reported in the host manifest.
pub const PACKAGE_NAME: &str = "bindilla";

/// Package version reported in the host manifest.
pub const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Binder-related configuration.
pub struct BinderConfig;

impl BinderConfig {
    pub const DEFAULT_BINDER_URL: &'static str = "https://mybinder.org";
    pub const DEFAULT_HUB_URL: &'static str = "https://hub.mybinder.org";
    /// Building an image from scratch can take a long time.
    pub const LAUNCH_TIMEOUT: Duration = Duration::from_secs(15 * 60);
    pub const PROXY_TIMEOUT: Duration = Duration::from_secs(60);
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const LAUNCH_ATTEMPTS: u32 = 3;
    pub const LAUNCH_RETRY_BASE_DELAY: Duration = Duration::from_secs(2);
    pub const USER_AGENT: &'static str = concat!("Bindilla/", env!("CARGO_PKG_VERSION"));
}

/// HTTP server configuration.
pub struct ServerConfig;

impl ServerConfig {
    pub const DEFAULT_HOST: &'static str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 8888;
    /// Largest request body accepted, e.g. a notebook saved through the proxy.
    pub const MAX_BODY_SIZE: usize = 100 * 1024 * 1024;
    pub const README_URL: &'static str = "https://github.com/stencila/bindilla#readme";
}

/// Runtime configuration for a [`Host`](crate::Host).
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Base URL of the Binder build API.
    pub binder_url: String,
    /// Base URL of the JupyterHub that serves launched Binders.
    pub hub_url: String,
    /// Environs that can be launched.
    pub catalog: EnvironCatalog,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            binder_url: BinderConfig::DEFAULT_BINDER_URL.to_string(),
            hub_url: BinderConfig::DEFAULT_HUB_URL.to_string(),
            catalog: EnvironCatalog::default(),
        }
    }
}

impl HostConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binder_url(mut self, url: impl Into<String>) -> Self {
        self.binder_url = trim_base_url(url.into());
        self
    }

    pub fn with_hub_url(mut self, url: impl Into<String>) -> Self {
        self.hub_url = trim_base_url(url.into());
        self
    }

    pub fn with_catalog(mut self, catalog: EnvironCatalog) -> Self {
        self.catalog = catalog;
        self
    }
}

fn trim_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
