//! Catalog of environments that can be launched on Binder.

use crate::{BindillaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// An execution environment that Binder can build and run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environ {
    /// Identifier used by clients, e.g. `stencila/core`.
    pub id: String,
    /// Human readable name.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Binder build spec, e.g. `gh/stencila/images/core`.
    pub binder: String,
}

impl Environ {
    pub fn new(id: &str, name: &str, description: &str, binder: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            binder: binder.to_string(),
        }
    }
}

/// Ordered set of environs, unique by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironCatalog {
    environs: Vec<Environ>,
}

impl Default for EnvironCatalog {
    fn default() -> Self {
        Self {
            environs: vec![
                Environ::new(
                    "stencila/core",
                    "Stencila Core",
                    "Python, R and Node.js with the Stencila execution contexts",
                    "gh/stencila/images/core",
                ),
                Environ::new(
                    "stencila/py",
                    "Stencila Python",
                    "Python with the Stencila execution context",
                    "gh/stencila/images/py",
                ),
                Environ::new(
                    "stencila/r",
                    "Stencila R",
                    "R with the Stencila execution context",
                    "gh/stencila/images/r",
                ),
            ],
        }
    }
}

impl EnvironCatalog {
    /// Build a catalog, validating ids and build specs.
    pub fn new(environs: Vec<Environ>) -> Result<Self> {
        let mut seen = HashSet::new();
        for environ in &environs {
            if environ.id.trim().is_empty() {
                return Err(BindillaError::Catalog {
                    message: "environ id must not be empty".to_string(),
                });
            }
            if environ.binder.trim().is_empty() {
                return Err(BindillaError::Catalog {
                    message: format!("environ {} has no binder spec", environ.id),
                });
            }
            if !seen.insert(environ.id.as_str()) {
                return Err(BindillaError::Catalog {
                    message: format!("duplicate environ id: {}", environ.id),
                });
            }
        }
        Ok(Self { environs })
    }

    /// Parse a catalog from a JSON array of environs.
    pub fn from_json(json: &str) -> Result<Self> {
        let environs: Vec<Environ> = serde_json::from_str(json)?;
        Self::new(environs)
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json =
            std::fs::read_to_string(path).map_err(|e| BindillaError::io_with_path(e, path))?;
        Self::from_json(&json)
    }

    pub fn get(&self, id: &str) -> Option<&Environ> {
        self.environs.iter().find(|environ| environ.id == id)
    }

    pub fn all(&self) -> &[Environ] {
        &self.environs
    }

    pub fn len(&self) -> usize {
        self.environs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.environs.is_empty()
    }

    /// Known environs among `ids`, in request order and without repeats.
    pub fn select<S: AsRef<str>>(&self, ids: &[S]) -> Vec<Environ> {
        let mut seen = HashSet::new();
        let mut selected = Vec::new();
        for id in ids {
            let id = id.as_ref().trim();
            if !seen.insert(id.to_string()) {
                continue;
            }
            match self.get(id) {
                Some(environ) => selected.push(environ.clone()),
                None => debug!("Ignoring unknown environ in manifest request: {}", id),
            }
        }
        selected
    }
}
