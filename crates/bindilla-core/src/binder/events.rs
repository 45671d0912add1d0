//! Progress events published by the Binder build API.

use crate::environ::Environ;
use crate::{BindillaError, Result};
use serde::{Deserialize, Serialize};

/// Stage a Binder launch has reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinderPhase {
    Waiting,
    Fetching,
    Building,
    Built,
    Pushing,
    Launching,
    Ready,
    Failed,
    #[serde(other)]
    Unknown,
}

impl BinderPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinderPhase::Waiting => "waiting",
            BinderPhase::Fetching => "fetching",
            BinderPhase::Building => "building",
            BinderPhase::Built => "built",
            BinderPhase::Pushing => "pushing",
            BinderPhase::Launching => "launching",
            BinderPhase::Ready => "ready",
            BinderPhase::Failed => "failed",
            BinderPhase::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for BinderPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One `data:` payload of the build event stream.
#[derive(Debug, Clone, Deserialize)]
pub struct BinderEvent {
    pub phase: BinderPhase,
    #[serde(default)]
    pub message: Option<String>,
    /// Server URL, present once `ready`.
    #[serde(default)]
    pub url: Option<String>,
    /// Server token, present once `ready`.
    #[serde(default)]
    pub token: Option<String>,
}

impl BinderEvent {
    pub fn parse(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }
}

/// An environ that Binder has launched and is ready to be proxied to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchedEnviron {
    /// `<binder_id>@<token>`, the form used in proxy paths.
    pub id: String,
    pub environ: String,
    pub binder_id: String,
    pub token: String,
    pub url: String,
}

impl LaunchedEnviron {
    /// Build from the `ready` event of a launch.
    pub fn from_ready(environ: &Environ, event: BinderEvent) -> Result<Self> {
        let failed = |message: &str| BindillaError::LaunchFailed {
            environ: environ.id.clone(),
            message: message.to_string(),
        };
        let url = event.url.ok_or_else(|| failed("ready event has no url"))?;
        let token = event
            .token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| failed("ready event has no token"))?;
        let binder_id = binder_id_from_url(&url)
            .ok_or_else(|| failed(&format!("cannot find a server name in {}", url)))?;

        Ok(Self {
            id: format!("{}@{}", binder_id, token),
            environ: environ.id.clone(),
            binder_id,
            token,
            url,
        })
    }
}

/// The server name in a hub URL: the segment after `user`.
///
/// `https://hub.mybinder.org/user/stencila-images-9ik3b1p1/` gives
/// `stencila-images-9ik3b1p1`.
pub fn binder_id_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let mut segments = parsed.path_segments()?;
    while let Some(segment) = segments.next() {
        if segment == "user" {
            return segments
                .next()
                .filter(|id| !id.is_empty())
                .map(String::from);
        }
    }
    None
}
