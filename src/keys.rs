//! Storage paths for provider nodes and dependent edges.
//!
//! ```text
//! <root>\<provider_key>                          provider node
//! <root>\<provider_key>\Dependents               edge container
//! <root>\<provider_key>\Dependents\<dependent>   edge
//! ```
//!
//! `KeyPaths` inserts keys verbatim. The registry runs every provider and
//! dependent key through [`validate_key`] first: an empty key or one with
//! a separator would address the root or some other node.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Path separator of the hierarchical store.
pub const SEPARATOR: char = '\\';

/// Default root namespace, below the per-user or per-machine hive.
pub const DEFAULT_ROOT: &str = r"Software\Classes\Installer\Dependencies";

/// Name of the edge container under each provider node.
pub const DEPENDENTS: &str = "Dependents";

/// Formats node paths below a fixed root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPaths {
    root: String,
}

impl Default for KeyPaths {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}

impl KeyPaths {
    pub fn new(root: impl Into<String>) -> Self {
        let mut root = root.into();
        while root.ends_with(SEPARATOR) {
            root.pop();
        }
        Self { root }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn provider(&self, provider_key: &str) -> String {
        join(&[&self.root, provider_key])
    }

    pub fn dependents(&self, provider_key: &str) -> String {
        join(&[&self.root, provider_key, DEPENDENTS])
    }

    pub fn dependent(&self, provider_key: &str, dependent_key: &str) -> String {
        join(&[&self.root, provider_key, DEPENDENTS, dependent_key])
    }
}

/// Reject keys that do not name exactly one node below their parent.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.contains(SEPARATOR) {
        return Err(Error::InvalidKey(key.to_string()));
    }
    Ok(())
}

fn join(parts: &[&str]) -> String {
    let len = parts.iter().map(|p| p.len() + 1).sum();
    let mut path = String::with_capacity(len);
    for part in parts {
        if !path.is_empty() {
            path.push(SEPARATOR);
        }
        path.push_str(part);
    }
    path
}
