//! # deptrack: provider/dependent reference tracking
//!
//! Keeps a hierarchical record of which shared components ("providers") are
//! installed, at which version, and which other components ("dependents")
//! still rely on them. An installer asks two questions of it before acting:
//!
//! 1. **Can I install this?** `check_dependency` verifies a provider exists
//!    and its version fits a min/max bound.
//! 2. **Can I remove this?** `check_dependents` lists everyone still
//!    depending on a provider, minus the ones being removed together.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `HierarchicalStore` is the contract between the engine and storage
//! 2. **Plain records**: `ProviderInfo`, `DependentEdge`, `Dependency` cross all boundaries
//! 3. **Caller-owned state**: de-duplication sets and result lists belong to the caller
//! 4. **Bottom-up cleanup**: edge, then empty container, then empty provider
//!
//! ## Quick Start
//!
//! ```rust
//! use deptrack::{
//!     DependencyRegistry, DependencyRequirement, Dependencies, DependencySet,
//!     Hive, ProviderRegistration, CheckStatus,
//! };
//!
//! # fn example() -> deptrack::Result<()> {
//! let registry = DependencyRegistry::open_memory();
//!
//! registry.register_dependency(
//!     Hive::PerMachine,
//!     &ProviderRegistration::new("Acme.Runtime", "2.1.0", "Acme Runtime"),
//! )?;
//!
//! let mut seen = DependencySet::new();
//! let mut missing = Dependencies::new();
//! let status = registry.check_dependency(
//!     Hive::PerMachine,
//!     &DependencyRequirement::new("Acme.Runtime").with_min_version("2.0", true),
//!     &mut seen,
//!     &mut missing,
//! )?;
//! assert_eq!(status, CheckStatus::Satisfied);
//! assert!(missing.is_empty());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Storage Backends
//!
//! | Backend | Config | Description |
//! |---------|--------|-------------|
//! | Memory | `StoreConfig::Memory` | In-memory hives for testing/embedding |
//! | File | `StoreConfig::File` | Memory hives written through to a JSON file |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod keys;
pub mod version;
pub mod record;
pub mod registry;
pub mod storage;
pub mod export;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    Dependency, Dependencies, DependencySet,
    ProviderInfo, ProviderRegistration, DependentEdge, DependencyRequirement,
    RequiresAttributes,
};

// ============================================================================
// Re-exports: Engine
// ============================================================================

pub use keys::KeyPaths;
pub use registry::{DependencyRegistry, RegistryConfig, CheckStatus};
pub use version::{Version, VersionBound};

// ============================================================================
// Re-exports: Storage
// ============================================================================

pub use storage::{HierarchicalStore, Hive, KeyInfo, MemoryStore, StoreConfig};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("The dependency store is corrupt: {0}")]
    Corrupt(String),

    #[error("Invalid version \"{text}\": {reason}")]
    InvalidVersion { text: String, reason: String },

    #[error("Invalid key \"{0}\": must be non-empty and free of the path separator")]
    InvalidKey(String),

    #[error("Type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification of an [`Error`].
///
/// `NotFound` is usually a control-flow signal the engine turns into a
/// reported [`Dependency`]. `Corrupt` and `Propagated` always abort the
/// current operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Corrupt,
    Propagated,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Corrupt(_) => ErrorKind::Corrupt,
            _ => ErrorKind::Propagated,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

pub type Result<T> = std::result::Result<T, Error>;
