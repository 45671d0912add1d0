//! Binder integration: build event stream parsing and the HTTP client.

mod client;
mod events;

pub use client::BinderClient;
pub use events::{binder_id_from_url, BinderEvent, BinderPhase, LaunchedEnviron};
