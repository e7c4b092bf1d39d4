//! # Hierarchical Store Trait
//!
//! This is THE contract between the dependency engine and whatever keeps the
//! data: a tree of named nodes ("keys"), each holding named scalar values,
//! split into independent hives.
//!
//! ## Implementations
//!
//! | Store | Module | Description |
//! |-------|--------|-------------|
//! | `MemoryStore` | `memory` | In-memory hives, optionally persisted to JSON |
//!
//! ## Handles
//!
//! `open` and `create` hand out a `Handle`. Handles are released when
//! dropped, so a handle never outlives the function that opened it, error
//! paths included.

pub mod memory;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::Result;

pub use memory::MemoryStore;

// ============================================================================
// Store Configuration
// ============================================================================

/// How to construct a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    /// In-memory (no persistence)
    Memory,

    /// In-memory, loaded from and written through to a JSON file
    File { path: PathBuf },
}

// ============================================================================
// Hive
// ============================================================================

/// Top-level partition of the store. Per-user and per-machine registrations
/// never see each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hive {
    PerUser,
    PerMachine,
}

impl Hive {
    pub const ALL: [Hive; 2] = [Hive::PerUser, Hive::PerMachine];
}

impl std::fmt::Display for Hive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hive::PerUser => f.write_str("per-user"),
            Hive::PerMachine => f.write_str("per-machine"),
        }
    }
}

// ============================================================================
// Key info
// ============================================================================

/// Child and value counts of one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyInfo {
    pub subkeys: usize,
    pub values: usize,
}

// ============================================================================
// HierarchicalStore Trait
// ============================================================================

/// The storage contract.
///
/// Paths are separator-joined (see [`crate::keys::SEPARATOR`]) and absolute
/// within a hive. "Not there" is never an error at this layer: it comes
/// back as `None` / `false` and the engine decides what it means.
///
/// Value names are `Option<&str>`; `None` addresses the node's default
/// (unnamed) value.
pub trait HierarchicalStore: Send + Sync {
    /// Open handle to one node.
    type Handle;

    // ========================================================================
    // Nodes
    // ========================================================================

    /// Open an existing node. Returns None if it does not exist.
    fn open(&self, hive: Hive, path: &str) -> Result<Option<Self::Handle>>;

    /// Open a node, creating it and any missing ancestors.
    /// The flag is true when the node itself was created.
    fn create(&self, hive: Hive, path: &str) -> Result<(Self::Handle, bool)>;

    /// Delete a node. Returns true if it existed.
    /// Non-recursive deletes fail when the node still has children.
    fn delete(&self, hive: Hive, path: &str, recursive: bool) -> Result<bool>;

    /// Name of the `index`-th child, or None past the end.
    fn enum_child(&self, handle: &Self::Handle, index: usize) -> Result<Option<String>>;

    /// Child and value counts.
    fn query_info(&self, handle: &Self::Handle) -> Result<KeyInfo>;

    // ========================================================================
    // Values
    // ========================================================================

    /// Read a string value. Returns None if absent; a non-string value is a type error.
    fn read_string(&self, handle: &Self::Handle, name: Option<&str>) -> Result<Option<String>>;

    /// Read a number value. Returns None if absent; a non-number value is a type error.
    fn read_number(&self, handle: &Self::Handle, name: Option<&str>) -> Result<Option<u32>>;

    /// Set a string value (upsert).
    fn write_string(&self, handle: &Self::Handle, name: Option<&str>, value: &str) -> Result<()>;

    /// Set a number value (upsert).
    fn write_number(&self, handle: &Self::Handle, name: Option<&str>, value: u32) -> Result<()>;

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Make every completed write durable.
    ///
    /// Default: nothing to do.
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Collect every child name of a node.
    ///
    /// Default: `enum_child` until it runs out.
    fn children(&self, handle: &Self::Handle) -> Result<Vec<String>> {
        let mut names = Vec::new();
        while let Some(name) = self.enum_child(handle, names.len())? {
            names.push(name);
        }
        Ok(names)
    }
}
