//! Result collection for the check operations.
//!
//! A check appends `(key, name)` pairs to a caller-owned [`Dependencies`]
//! list. The caller also owns a [`DependencySet`] of keys already reported,
//! so many checks can share one combined report without repeating a key.

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

/// A provider that is missing, out of range, or a dependent that blocks removal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub key: String,
    pub name: Option<String>,
}

impl Dependency {
    pub fn new(key: impl Into<String>, name: Option<String>) -> Self {
        Self { key: key.into(), name }
    }

    /// The display name when known, otherwise the key.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.key)
    }
}

impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", name, self.key),
            None => write!(f, "{}", self.key),
        }
    }
}

/// Set of keys already reported (or to be ignored).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySet {
    keys: HashSet<String>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Add a key. Returns false if it was already present.
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<K: Into<String>> FromIterator<K> for DependencySet {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self { keys: iter.into_iter().map(Into::into).collect() }
    }
}

/// Append-only list of reported dependencies, in report order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dependencies {
    items: Vec<Dependency>,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, name: Option<String>) {
        self.items.push(Dependency::new(key, name));
    }

    /// Append `(key, name)` unless `seen` already holds `key`, then mark it seen.
    ///
    /// `name` is only evaluated when the entry is actually appended, so
    /// callers can defer a store read until it is needed.
    pub fn push_unique<F>(&mut self, seen: &mut DependencySet, key: &str, name: F) -> crate::Result<bool>
    where
        F: FnOnce() -> crate::Result<Option<String>>,
    {
        if seen.contains(key) {
            return Ok(false);
        }
        let name = name()?;
        self.push(key, name);
        seen.insert(key);
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Dependency> {
        self.items.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|d| d.key.as_str())
    }

    pub fn as_slice(&self) -> &[Dependency] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<Dependency> {
        self.items
    }
}

impl<'a> IntoIterator for &'a Dependencies {
    type Item = &'a Dependency;
    type IntoIter = std::slice::Iter<'a, Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for Dependencies {
    type Item = Dependency;
    type IntoIter = std::vec::IntoIter<Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

// ============================================================================
// Tests
// ============================================================================
