//! The dependency registry: check, register, and unregister.
//!
//! Every operation works on one hive and touches at most one provider plus
//! its direct dependents. Nothing here is transactional: a failure midway
//! leaves whatever was already written, and the caller retries or repairs.
//! Store handles are dropped on every exit path, `?` included.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::keys::{validate_key, KeyPaths, DEFAULT_ROOT};
use crate::model::{
    Dependencies, DependencyRequirement, DependencySet, DependentEdge, ProviderInfo,
    ProviderRegistration,
};
use crate::record;
use crate::storage::{HierarchicalStore, Hive, MemoryStore, StoreConfig};
use crate::version::{Version, VersionBound};
use crate::{Error, Result};

// ============================================================================
// Configuration
// ============================================================================

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Namespace below each hive that holds the provider nodes.
    pub root: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { root: DEFAULT_ROOT.to_string() }
    }
}

// ============================================================================
// Check outcome
// ============================================================================

/// Result of a dependency check.
///
/// Missing, orphaned, too old, and too new all come back as `Unsatisfied`;
/// the details are in the `Dependencies` list the caller passed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Satisfied,
    Unsatisfied,
}

impl CheckStatus {
    pub fn is_satisfied(self) -> bool {
        self == CheckStatus::Satisfied
    }
}

// ============================================================================
// DependencyRegistry
// ============================================================================

/// The primary entry point. Wraps a store and answers "can I install this"
/// and "can I remove this".
pub struct DependencyRegistry<S: HierarchicalStore> {
    store: S,
    paths: KeyPaths,
}

impl DependencyRegistry<MemoryStore> {
    /// In-memory registry for testing and embedding.
    pub fn open_memory() -> Self {
        Self::with_store(MemoryStore::new())
    }

    pub fn open(config: &StoreConfig) -> Result<Self> {
        Ok(Self::with_store(MemoryStore::from_config(config)?))
    }
}

impl<S: HierarchicalStore> DependencyRegistry<S> {
    pub fn with_store(store: S) -> Self {
        Self::with_config(store, RegistryConfig::default())
    }

    pub fn with_config(store: S, config: RegistryConfig) -> Self {
        Self { store, paths: KeyPaths::new(config.root) }
    }

    /// Access the underlying store (for inspection and repair).
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn paths(&self) -> &KeyPaths {
        &self.paths
    }

    // ========================================================================
    // Checks
    // ========================================================================

    /// Check that a provider is registered and its version fits the bounds.
    ///
    /// On failure the provider is appended to `out` (with its display name
    /// when the node exists) unless `seen` already has it. A provider node
    /// without a `Version` value counts as missing.
    #[instrument(skip(self, requirement, seen, out), fields(provider = %requirement.provider_key))]
    pub fn check_dependency(
        &self,
        hive: Hive,
        requirement: &DependencyRequirement,
        seen: &mut DependencySet,
        out: &mut Dependencies,
    ) -> Result<CheckStatus> {
        let key = requirement.provider_key.as_str();
        validate_key(key)?;
        let node = self.store.open(hive, &self.paths.provider(key))?;
        let recorded = match &node {
            Some(node) => record::read_version(&self.store, node)?,
            None => None,
        };

        let (Some(node), Some(recorded)) = (node, recorded) else {
            debug!("provider is not registered");
            out.push_unique(seen, key, || Ok(None))?;
            return Ok(CheckStatus::Unsatisfied);
        };
        let recorded = Version::parse(&recorded)?;

        let bounds = [
            VersionBound::min(requirement.min_version.as_deref(), requirement.attributes.min_inclusive),
            VersionBound::max(requirement.max_version.as_deref(), requirement.attributes.max_inclusive),
        ];
        for bound in bounds {
            if !bound.is_satisfied_by(&recorded)? {
                debug!(recorded = %recorded, bound = ?bound, "provider version out of range");
                out.push_unique(seen, key, || record::read_display_name(&self.store, &node))?;
                return Ok(CheckStatus::Unsatisfied);
            }
        }

        trace!(recorded = %recorded, "provider satisfies requirement");
        Ok(CheckStatus::Satisfied)
    }

    /// Run every check, collecting all failures before returning.
    ///
    /// Stops early only on a propagated error, never on an unsatisfied check.
    pub fn check_dependencies(
        &self,
        hive: Hive,
        requirements: &[DependencyRequirement],
        seen: &mut DependencySet,
        out: &mut Dependencies,
    ) -> Result<CheckStatus> {
        let mut status = CheckStatus::Satisfied;
        for requirement in requirements {
            if !self.check_dependency(hive, requirement, seen, out)?.is_satisfied() {
                status = CheckStatus::Unsatisfied;
            }
        }
        Ok(status)
    }

    /// Append every dependent still registered on `provider_key`, except
    /// those in `ignored`.
    ///
    /// The provider node itself must exist: whoever asks is expected to have
    /// registered it, so its absence means the store is corrupt.
    #[instrument(skip(self, ignored, out))]
    pub fn check_dependents(
        &self,
        hive: Hive,
        provider_key: &str,
        ignored: Option<&DependencySet>,
        out: &mut Dependencies,
    ) -> Result<()> {
        validate_key(provider_key)?;
        let provider_path = self.paths.provider(provider_key);
        let Some(_provider) = self.store.open(hive, &provider_path)? else {
            return Err(Error::Corrupt(format!(
                "provider key {hive}\\{provider_path} does not exist"
            )));
        };

        let Some(dependents) = self.store.open(hive, &self.paths.dependents(provider_key))? else {
            trace!("no dependents container");
            return Ok(());
        };

        let mut index = 0;
        while let Some(dependent_key) = self.store.enum_child(&dependents, index)? {
            index += 1;

            if ignored.is_some_and(|set| set.contains(&dependent_key)) {
                trace!(dependent = %dependent_key, "ignoring dependent");
                continue;
            }

            let name = self.display_name_of(hive, &dependent_key)?;
            debug!(dependent = %dependent_key, "provider still has dependent");
            out.push(dependent_key, name);
        }
        Ok(())
    }

    /// A dependent is usually a provider too; use its display name if it has one.
    fn display_name_of(&self, hive: Hive, key: &str) -> Result<Option<String>> {
        match self.store.open(hive, &self.paths.provider(key))? {
            Some(node) => record::read_display_name(&self.store, &node),
            None => Ok(None),
        }
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Read every field of a provider node. Fails with `NotFound` when the
    /// node does not exist; an orphaned node comes back with `version: None`.
    pub fn provider_information(&self, hive: Hive, provider_key: &str) -> Result<ProviderInfo> {
        validate_key(provider_key)?;
        let node = self
            .store
            .open(hive, &self.paths.provider(provider_key))?
            .ok_or_else(|| Error::NotFound(format!("provider {provider_key}")))?;
        record::read_provider(&self.store, &node)
    }

    pub fn dependent_exists(&self, hive: Hive, provider_key: &str, dependent_key: &str) -> Result<bool> {
        validate_key(provider_key)?;
        validate_key(dependent_key)?;
        let edge = self.store.open(hive, &self.paths.dependent(provider_key, dependent_key))?;
        Ok(edge.is_some())
    }

    pub fn dependent_edge(
        &self,
        hive: Hive,
        provider_key: &str,
        dependent_key: &str,
    ) -> Result<Option<DependentEdge>> {
        validate_key(provider_key)?;
        validate_key(dependent_key)?;
        match self.store.open(hive, &self.paths.dependent(provider_key, dependent_key))? {
            Some(edge) => Ok(Some(record::read_edge(&self.store, &edge, dependent_key)?)),
            None => Ok(None),
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Create or overwrite a provider node.
    ///
    /// The version must parse, so that later checks can compare against it.
    /// A bad key or version is rejected before anything is written.
    #[instrument(skip(self, registration), fields(provider = %registration.provider_key, version = %registration.version))]
    pub fn register_dependency(&self, hive: Hive, registration: &ProviderRegistration) -> Result<()> {
        let result = self.write_provider(hive, registration);
        self.flushed(result)
    }

    fn write_provider(&self, hive: Hive, registration: &ProviderRegistration) -> Result<()> {
        validate_key(&registration.provider_key)?;
        Version::parse(&registration.version)?;
        let (node, created) = self.store.create(hive, &self.paths.provider(&registration.provider_key))?;
        record::write_provider(&self.store, &node, registration)?;
        debug!(created, "registered provider");
        Ok(())
    }

    /// Record that `edge.dependent_key` depends on `provider_key`.
    ///
    /// Creates the provider node and its dependents container when missing.
    /// A repeated call overwrites the edge's bounds.
    #[instrument(skip(self, edge), fields(dependent = %edge.dependent_key))]
    pub fn register_dependent(&self, hive: Hive, provider_key: &str, edge: &DependentEdge) -> Result<()> {
        let result = self.write_dependent(hive, provider_key, edge);
        self.flushed(result)
    }

    fn write_dependent(&self, hive: Hive, provider_key: &str, edge: &DependentEdge) -> Result<()> {
        validate_key(provider_key)?;
        validate_key(&edge.dependent_key)?;
        let (_provider, _) = self.store.create(hive, &self.paths.provider(provider_key))?;
        let (_dependents, _) = self.store.create(hive, &self.paths.dependents(provider_key))?;
        let (node, created) = self
            .store
            .create(hive, &self.paths.dependent(provider_key, &edge.dependent_key))?;
        record::write_edge(&self.store, &node, edge)?;
        debug!(created, "registered dependent");
        Ok(())
    }

    // ========================================================================
    // Unregistration
    // ========================================================================

    /// Delete a provider node with all its dependents. Already gone is fine.
    #[instrument(skip(self))]
    pub fn unregister_dependency(&self, hive: Hive, provider_key: &str) -> Result<()> {
        let result = self.remove_provider(hive, provider_key);
        self.flushed(result)
    }

    fn remove_provider(&self, hive: Hive, provider_key: &str) -> Result<()> {
        validate_key(provider_key)?;
        let existed = self.store.delete(hive, &self.paths.provider(provider_key), true)?;
        debug!(existed, "unregistered provider");
        Ok(())
    }

    /// Delete one dependent edge, then collapse what became empty.
    ///
    /// Removal goes bottom-up: the edge; the dependents container if no
    /// edges are left; the provider node if it has neither values nor
    /// children left. A missing root, provider, container, or edge means
    /// there is nothing to do, so repeated calls succeed.
    #[instrument(skip(self))]
    pub fn unregister_dependent(&self, hive: Hive, provider_key: &str, dependent_key: &str) -> Result<()> {
        let result = self.remove_dependent(hive, provider_key, dependent_key);
        self.flushed(result)
    }

    fn remove_dependent(&self, hive: Hive, provider_key: &str, dependent_key: &str) -> Result<()> {
        validate_key(provider_key)?;
        validate_key(dependent_key)?;
        let Some(_root) = self.store.open(hive, self.paths.root())? else {
            trace!("dependency root does not exist");
            return Ok(());
        };
        let provider_path = self.paths.provider(provider_key);
        let Some(provider) = self.store.open(hive, &provider_path)? else {
            trace!("provider does not exist");
            return Ok(());
        };
        let dependents_path = self.paths.dependents(provider_key);
        let Some(dependents) = self.store.open(hive, &dependents_path)? else {
            trace!("dependents container does not exist");
            return Ok(());
        };

        let existed = self
            .store
            .delete(hive, &self.paths.dependent(provider_key, dependent_key), true)?;
        debug!(existed, "removed dependent edge");

        if self.store.query_info(&dependents)?.subkeys > 0 {
            return Ok(());
        }
        drop(dependents);
        self.store.delete(hive, &dependents_path, false)?;
        debug!("removed empty dependents container");

        let info = self.store.query_info(&provider)?;
        if info.values > 0 || info.subkeys > 0 {
            return Ok(());
        }
        drop(provider);
        self.store.delete(hive, &provider_path, false)?;
        debug!("removed empty provider");
        Ok(())
    }

    /// Flush after a mutation, whether or not it succeeded. The mutation's
    /// own error wins over a flush error.
    fn flushed(&self, result: Result<()>) -> Result<()> {
        let flush = self.store.flush();
        result?;
        flush
    }
}

// ============================================================================
// Tests
// ============================================================================
