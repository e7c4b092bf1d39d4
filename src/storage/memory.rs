//! In-memory hierarchical store.
//!
//! This is the reference implementation of `HierarchicalStore`.
//! Each hive is a tree of `MemoryKey`s protected by one RwLock.
//!
//! ## Limitations
//!
//! - **Per-call locking only**: every trait method takes the lock once.
//!   Multi-step sequences (open, read, then write) are NOT atomic.
//! - **Case-sensitive names**: `Foo` and `foo` are different keys.
//! - **Write-through persistence**: with a backing file, `flush()` rewrites
//!   the whole file. Nothing is written until `flush()` is called.
//!
//! Use this store for:
//! - Testing the dependency engine
//! - Embedding in tools that keep their registrations in a single file
//! - Inspecting a dump of real installer state loaded from JSON

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::keys::SEPARATOR;
use crate::{Error, Result};
use super::{HierarchicalStore, Hive, KeyInfo, StoreConfig};

// ============================================================================
// Stored data
// ============================================================================

/// A scalar value on a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StoredValue {
    String(String),
    Number(u32),
}

impl StoredValue {
    fn type_name(&self) -> &'static str {
        match self {
            StoredValue::String(_) => "String",
            StoredValue::Number(_) => "Number",
        }
    }
}

/// One node of a hive. The default value is stored under the empty name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryKey {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, StoredValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, MemoryKey>,
}

impl MemoryKey {
    fn descend(&self, segments: &[String]) -> Option<&MemoryKey> {
        segments.iter().try_fold(self, |key, name| key.children.get(name))
    }

    fn descend_mut(&mut self, segments: &[String]) -> Option<&mut MemoryKey> {
        segments.iter().try_fold(self, |key, name| key.children.get_mut(name))
    }
}

/// Full content of a store, both hives. Also the on-disk JSON format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub per_user: MemoryKey,
    #[serde(default)]
    pub per_machine: MemoryKey,
}

impl StoreSnapshot {
    fn hive(&self, hive: Hive) -> &MemoryKey {
        match hive {
            Hive::PerUser => &self.per_user,
            Hive::PerMachine => &self.per_machine,
        }
    }

    fn hive_mut(&mut self, hive: Hive) -> &mut MemoryKey {
        match hive {
            Hive::PerUser => &mut self.per_user,
            Hive::PerMachine => &mut self.per_machine,
        }
    }
}

// ============================================================================
// MemoryStore
// ============================================================================

/// In-memory hierarchical store.
///
/// Clones share the same content and handle counter, so one store can be
/// handed to several registries.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    hives: RwLock<StoreSnapshot>,
    /// Number of live `MemoryHandle`s
    open_handles: Arc<AtomicUsize>,
    backing: Option<PathBuf>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::from_snapshot(StoreSnapshot::default(), None)
    }

    /// Load from `path` if it exists, start empty otherwise. `flush()`
    /// writes back to the same file.
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let snapshot = if path.exists() {
            let text = std::fs::read_to_string(&path)?;
            serde_json::from_str(&text)?
        } else {
            StoreSnapshot::default()
        };
        debug!(path = %path.display(), "opened file-backed dependency store");
        Ok(Self::from_snapshot(snapshot, Some(path)))
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        match config {
            StoreConfig::Memory => Ok(Self::new()),
            StoreConfig::File { path } => Self::open_file(path),
        }
    }

    pub fn from_snapshot(snapshot: StoreSnapshot, backing: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                hives: RwLock::new(snapshot),
                open_handles: Arc::new(AtomicUsize::new(0)),
                backing,
            }),
        }
    }

    /// Copy of the current content.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.inner.hives.read().clone()
    }

    /// Number of handles currently alive.
    pub fn open_handles(&self) -> usize {
        self.inner.open_handles.load(Ordering::SeqCst)
    }

    pub fn backing_file(&self) -> Option<&Path> {
        self.inner.backing.as_deref()
    }

    fn handle(&self, hive: Hive, segments: Vec<String>) -> MemoryHandle {
        self.inner.open_handles.fetch_add(1, Ordering::SeqCst);
        MemoryHandle {
            hive,
            segments,
            open_handles: Arc::clone(&self.inner.open_handles),
        }
    }

    fn with_key<T>(&self, handle: &MemoryHandle, f: impl FnOnce(&MemoryKey) -> Result<T>) -> Result<T> {
        let hives = self.inner.hives.read();
        let key = hives
            .hive(handle.hive)
            .descend(&handle.segments)
            .ok_or_else(|| deleted(handle))?;
        f(key)
    }

    fn with_key_mut<T>(&self, handle: &MemoryHandle, f: impl FnOnce(&mut MemoryKey) -> T) -> Result<T> {
        let mut hives = self.inner.hives.write();
        let key = hives
            .hive_mut(handle.hive)
            .descend_mut(&handle.segments)
            .ok_or_else(|| deleted(handle))?;
        Ok(f(key))
    }
}

// ============================================================================
// MemoryHandle
// ============================================================================

/// Open handle into a `MemoryStore`. Holds the node's path, not a borrow,
/// so the node may be deleted while the handle is alive; later calls
/// through the handle then fail.
#[derive(Debug)]
pub struct MemoryHandle {
    hive: Hive,
    segments: Vec<String>,
    open_handles: Arc<AtomicUsize>,
}

impl MemoryHandle {
    pub fn hive(&self) -> Hive {
        self.hive
    }

    pub fn path(&self) -> String {
        self.segments.join(&SEPARATOR.to_string())
    }
}

impl Drop for MemoryHandle {
    fn drop(&mut self) {
        self.open_handles.fetch_sub(1, Ordering::SeqCst);
    }
}

fn split(path: &str) -> Vec<String> {
    path.split(SEPARATOR)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn deleted(handle: &MemoryHandle) -> Error {
    Error::StorageError(format!(
        "key {}\\{} was deleted while open",
        handle.hive,
        handle.path()
    ))
}

fn value_name(name: Option<&str>) -> &str {
    name.unwrap_or("")
}

// ============================================================================
// HierarchicalStore impl
// ============================================================================

impl HierarchicalStore for MemoryStore {
    type Handle = MemoryHandle;

    fn open(&self, hive: Hive, path: &str) -> Result<Option<MemoryHandle>> {
        let segments = split(path);
        let exists = self.inner.hives.read().hive(hive).descend(&segments).is_some();
        Ok(exists.then(|| self.handle(hive, segments)))
    }

    fn create(&self, hive: Hive, path: &str) -> Result<(MemoryHandle, bool)> {
        let segments = split(path);
        let mut created = false;
        {
            let mut hives = self.inner.hives.write();
            let mut key = hives.hive_mut(hive);
            for name in &segments {
                created = !key.children.contains_key(name);
                key = key.children.entry(name.clone()).or_default();
            }
        }
        Ok((self.handle(hive, segments), created))
    }

    fn delete(&self, hive: Hive, path: &str, recursive: bool) -> Result<bool> {
        let mut segments = split(path);
        let Some(name) = segments.pop() else {
            return Err(Error::StorageError(format!("cannot delete the root of the {hive} hive")));
        };

        let mut hives = self.inner.hives.write();
        let Some(parent) = hives.hive_mut(hive).descend_mut(&segments) else {
            return Ok(false);
        };
        match parent.children.get(&name) {
            None => return Ok(false),
            Some(key) if !recursive && !key.children.is_empty() => {
                return Err(Error::StorageError(format!(
                    "cannot delete {hive}\\{path}: it still has {} subkeys",
                    key.children.len()
                )));
            }
            Some(_) => {}
        }
        parent.children.remove(&name);
        Ok(true)
    }

    fn enum_child(&self, handle: &MemoryHandle, index: usize) -> Result<Option<String>> {
        self.with_key(handle, |key| Ok(key.children.keys().nth(index).cloned()))
    }

    fn query_info(&self, handle: &MemoryHandle) -> Result<KeyInfo> {
        self.with_key(handle, |key| {
            Ok(KeyInfo { subkeys: key.children.len(), values: key.values.len() })
        })
    }

    fn read_string(&self, handle: &MemoryHandle, name: Option<&str>) -> Result<Option<String>> {
        self.with_key(handle, |key| match key.values.get(value_name(name)) {
            None => Ok(None),
            Some(StoredValue::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(Error::TypeError {
                expected: "String".into(),
                got: other.type_name().into(),
            }),
        })
    }

    fn read_number(&self, handle: &MemoryHandle, name: Option<&str>) -> Result<Option<u32>> {
        self.with_key(handle, |key| match key.values.get(value_name(name)) {
            None => Ok(None),
            Some(StoredValue::Number(n)) => Ok(Some(*n)),
            Some(other) => Err(Error::TypeError {
                expected: "Number".into(),
                got: other.type_name().into(),
            }),
        })
    }

    fn write_string(&self, handle: &MemoryHandle, name: Option<&str>, value: &str) -> Result<()> {
        self.with_key_mut(handle, |key| {
            key.values.insert(value_name(name).to_string(), StoredValue::String(value.to_string()));
        })
    }

    fn write_number(&self, handle: &MemoryHandle, name: Option<&str>, value: u32) -> Result<()> {
        self.with_key_mut(handle, |key| {
            key.values.insert(value_name(name).to_string(), StoredValue::Number(value));
        })
    }

    fn flush(&self) -> Result<()> {
        let Some(path) = &self.inner.backing else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&*self.inner.hives.read())?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "flushed dependency store");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
