//! Field-level access to provider nodes and dependent edges.
//!
//! Reads turn "value not present" into `None`. Writes always overwrite the
//! full record; an absent version bound is written as an empty string so an
//! older bound does not survive.

use crate::model::{DependentEdge, ProviderInfo, ProviderRegistration, RequiresAttributes};
use crate::storage::HierarchicalStore;
use crate::Result;

/// Value names on a provider node. The id lives in the default value.
pub const VERSION: &str = "Version";
pub const DISPLAY_NAME: &str = "DisplayName";
pub const ATTRIBUTES: &str = "Attributes";

/// Value names on a dependent edge.
pub const MIN_VERSION: &str = "MinVersion";
pub const MAX_VERSION: &str = "MaxVersion";

pub fn read_provider<S: HierarchicalStore>(store: &S, node: &S::Handle) -> Result<ProviderInfo> {
    Ok(ProviderInfo {
        id: store.read_string(node, None)?,
        display_name: store.read_string(node, Some(DISPLAY_NAME))?,
        version: store.read_string(node, Some(VERSION))?,
        attributes: store.read_number(node, Some(ATTRIBUTES))?,
    })
}

pub fn read_version<S: HierarchicalStore>(store: &S, node: &S::Handle) -> Result<Option<String>> {
    store.read_string(node, Some(VERSION))
}

pub fn read_display_name<S: HierarchicalStore>(store: &S, node: &S::Handle) -> Result<Option<String>> {
    store.read_string(node, Some(DISPLAY_NAME))
}

/// Write every provider field. The id is only touched when given.
pub fn write_provider<S: HierarchicalStore>(
    store: &S,
    node: &S::Handle,
    registration: &ProviderRegistration,
) -> Result<()> {
    if let Some(id) = &registration.id {
        store.write_string(node, None, id)?;
    }
    store.write_string(node, Some(VERSION), &registration.version)?;
    store.write_string(node, Some(DISPLAY_NAME), &registration.display_name)?;
    store.write_number(node, Some(ATTRIBUTES), registration.attributes)?;
    Ok(())
}

/// Read an edge. `dependent_key` is the edge node's own name.
pub fn read_edge<S: HierarchicalStore>(
    store: &S,
    edge: &S::Handle,
    dependent_key: &str,
) -> Result<DependentEdge> {
    let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
    Ok(DependentEdge {
        dependent_key: dependent_key.to_string(),
        min_version: non_empty(store.read_string(edge, Some(MIN_VERSION))?),
        max_version: non_empty(store.read_string(edge, Some(MAX_VERSION))?),
        attributes: RequiresAttributes::from_bits(store.read_number(edge, Some(ATTRIBUTES))?.unwrap_or(0)),
    })
}

pub fn write_edge<S: HierarchicalStore>(store: &S, edge: &S::Handle, record: &DependentEdge) -> Result<()> {
    store.write_string(edge, Some(MIN_VERSION), record.min_version.as_deref().unwrap_or(""))?;
    store.write_string(edge, Some(MAX_VERSION), record.max_version.as_deref().unwrap_or(""))?;
    store.write_number(edge, Some(ATTRIBUTES), record.attributes.bits())?;
    Ok(())
}
