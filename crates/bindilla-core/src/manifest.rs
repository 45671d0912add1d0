//! The host manifest returned to Stencila clients.

use crate::config::{PACKAGE_NAME, PACKAGE_VERSION};
use crate::environ::Environ;
use serde::Serialize;

/// Package identification within a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageInfo {
    pub package: String,
    pub version: String,
}

/// Describes this host and the environs it can launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub stencila: PackageInfo,
    pub environs: Vec<Environ>,
}

impl Manifest {
    pub fn new(environs: Vec<Environ>) -> Self {
        Self {
            stencila: PackageInfo {
                package: PACKAGE_NAME.to_string(),
                version: PACKAGE_VERSION.to_string(),
            },
            environs,
        }
    }
}
