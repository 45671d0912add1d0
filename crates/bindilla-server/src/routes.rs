//! Path routing for the v0 and v1 host APIs.
//!
//! Clients put arbitrary prefixes in front of the API segment (e.g. a
//! comma separated list of environs before `/v1/manifest`), so routes are
//! matched with anchored regexes over the whole path rather than axum's
//! segment router. Within a version the patterns are tried in order:
//! manifest, environs, proxy.

use regex::Regex;
use std::sync::LazyLock;

/// Host API version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    V0,
    V1,
}

impl ApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V0 => "v0",
            ApiVersion::V1 => "v1",
        }
    }
}

/// A recognised request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Index,
    Manifest {
        version: ApiVersion,
        environs: Option<Vec<String>>,
    },
    Environ {
        version: ApiVersion,
        environ_id: String,
    },
    Proxy {
        version: ApiVersion,
        binder_id: String,
        token: String,
        path: String,
    },
}

struct VersionPatterns {
    version: ApiVersion,
    selector: Regex,
    manifest: Regex,
    environ: Regex,
    proxy: Regex,
}

impl VersionPatterns {
    fn new(version: ApiVersion, environ_segment: &str) -> Self {
        let v = version.as_str();
        let compile = |pattern: String| {
            Regex::new(&pattern).expect("route regex must compile")
        };
        Self {
            version,
            selector: compile(format!(r"^.*?/{v}/.*$")),
            manifest: compile(format!(r"^/?(?P<environs>.*?)/{v}/manifest/?$")),
            environ: compile(format!(r"^.*?/{v}/{environ_segment}/(?P<environ_id>.+)$")),
            proxy: compile(format!(
                r"^.*?/{v}/proxy/(?P<binder_id>[^@]+)@(?P<token>[^/]+)/(?P<path>.+)$"
            )),
        }
    }

    fn parse(&self, path: &str) -> Option<Route> {
        let version = self.version;
        if let Some(caps) = self.manifest.captures(path) {
            let environs = split_environs(&decode(&caps["environs"]));
            return Some(Route::Manifest { version, environs });
        }
        if let Some(caps) = self.environ.captures(path) {
            return Some(Route::Environ {
                version,
                environ_id: decode(&caps["environ_id"]),
            });
        }
        if let Some(caps) = self.proxy.captures(path) {
            return Some(Route::Proxy {
                version,
                binder_id: decode(&caps["binder_id"]),
                token: decode(&caps["token"]),
                path: caps["path"].to_string(),
            });
        }
        None
    }
}

static VERSIONS: LazyLock<[VersionPatterns; 2]> = LazyLock::new(|| {
    [
        VersionPatterns::new(ApiVersion::V1, "environs"),
        VersionPatterns::new(ApiVersion::V0, "environ"),
    ]
});

impl Route {
    pub fn version(&self) -> Option<ApiVersion> {
        match self {
            Route::Index => None,
            Route::Manifest { version, .. }
            | Route::Environ { version, .. }
            | Route::Proxy { version, .. } => Some(*version),
        }
    }

    /// Match a request path (without query string).
    ///
    /// The first version whose selector matches owns the path; if none of
    /// its endpoints match, the path is not found even if another version's
    /// would.
    pub fn parse(path: &str) -> Option<Route> {
        if path == "/" {
            return Some(Route::Index);
        }
        VERSIONS
            .iter()
            .find(|patterns| patterns.selector.is_match(path))
            .and_then(|patterns| patterns.parse(path))
    }
}

fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}

/// `"a,b"` to `["a", "b"]`; an empty list is no list.
fn split_environs(environs: &str) -> Option<Vec<String>> {
    let ids: Vec<String> = environs
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect();
    if ids.is_empty() {
        None
    } else {
        Some(ids)
    }
}
