//! # Dependency Model
//!
//! Plain records that cross every boundary: store ↔ engine ↔ installer.
//!
//! Design rule: no store handles, no path strings here.
//! This module is pure data: no I/O, no state.

pub mod dependency;
pub mod provider;
pub mod edge;

pub use dependency::{Dependency, Dependencies, DependencySet};
pub use provider::{ProviderInfo, ProviderRegistration};
pub use edge::{DependentEdge, DependencyRequirement, RequiresAttributes};
