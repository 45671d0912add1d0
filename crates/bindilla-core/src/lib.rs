//! Bindilla Core - launch Stencila environments on Binder.
//!
//! A Stencila client asks a host for its manifest, launches one of the
//! environs it lists, and then talks to the launched environment through
//! the host's proxy. This crate implements those operations on top of
//! Binder; it has no HTTP server of its own (see `bindilla-server`).
//!
//! # Example
//!
//! ```rust,ignore
//! use bindilla_core::{Host, HostConfig};
//!
//! #[tokio::main]
//! async fn main() -> bindilla_core::Result<()> {
//!     let host = Host::new(HostConfig::default())?;
//!
//!     let manifest = host.manifest(None);
//!     println!("{} environs available", manifest.environs.len());
//!
//!     let launched = host.launch_environ("stencila/core").await?;
//!     println!("Ready: {}", launched.id);
//!
//!     Ok(())
//! }
//! ```

pub mod binder;
pub mod config;
pub mod environ;
pub mod error;
pub mod manifest;
pub mod network;
pub mod proxy;

mod host;

pub use binder::{BinderClient, BinderEvent, BinderPhase, LaunchedEnviron};
pub use config::{BinderConfig, HostConfig, ServerConfig};
pub use environ::{Environ, EnvironCatalog};
pub use error::{BindillaError, Result};
pub use host::Host;
pub use manifest::Manifest;
pub use network::RetryPolicy;
pub use proxy::{ProxyRequest, ProxyResponse};
