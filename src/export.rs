//! Dependency dump export. Writes out a hive's providers and dependents.
//!
//! Two shapes:
//!
//! ```text
//! snapshot_hive()  → Vec<ProviderSnapshot>  → serde (JSON reports, diffing)
//! export_dump()    → INI-like text          → logs, support bundles
//! ```
//!
//! Export walks every provider below the root, so unlike the engine
//! operations it is not bounded to one hop. It is a read-only reporting
//! path; nothing in the engine depends on it.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::model::{DependentEdge, ProviderInfo};
use crate::record;
use crate::registry::DependencyRegistry;
use crate::storage::{HierarchicalStore, Hive};
use crate::Result;

/// One provider node with all its edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSnapshot {
    pub provider_key: String,
    #[serde(flatten)]
    pub info: ProviderInfo,
    pub dependents: Vec<DependentEdge>,
}

/// Read every provider node of a hive, in store enumeration order.
pub fn snapshot_hive<S: HierarchicalStore>(
    registry: &DependencyRegistry<S>,
    hive: Hive,
) -> Result<Vec<ProviderSnapshot>> {
    let store = registry.store();
    let paths = registry.paths();

    let Some(root) = store.open(hive, paths.root())? else {
        return Ok(Vec::new());
    };

    let mut providers = Vec::new();
    for provider_key in store.children(&root)? {
        let Some(node) = store.open(hive, &paths.provider(&provider_key))? else {
            continue;
        };
        let info = record::read_provider(store, &node)?;

        let mut dependents = Vec::new();
        if let Some(container) = store.open(hive, &paths.dependents(&provider_key))? {
            for dependent_key in store.children(&container)? {
                if let Some(edge) = store.open(hive, &paths.dependent(&provider_key, &dependent_key))? {
                    dependents.push(record::read_edge(store, &edge, &dependent_key)?);
                }
            }
        }

        providers.push(ProviderSnapshot { provider_key, info, dependents });
    }
    Ok(providers)
}

/// Write a hive as JSON.
pub fn export_json<S: HierarchicalStore>(
    registry: &DependencyRegistry<S>,
    hive: Hive,
    writer: &mut dyn Write,
) -> Result<()> {
    let providers = snapshot_hive(registry, hive)?;
    serde_json::to_writer_pretty(&mut *writer, &providers)?;
    writeln!(writer)?;
    Ok(())
}

/// Write a hive as a human-readable dump.
pub fn export_dump<S: HierarchicalStore>(
    registry: &DependencyRegistry<S>,
    hive: Hive,
    writer: &mut dyn Write,
) -> Result<()> {
    let providers = snapshot_hive(registry, hive)?;

    // Header
    writeln!(writer, "; deptrack dependency dump")?;
    writeln!(writer, "; Hive: {hive}")?;
    writeln!(writer, "; Root: {}", registry.paths().root())?;
    writeln!(writer, "; Providers: {}", providers.len())?;

    for provider in &providers {
        writeln!(writer)?;
        writeln!(writer, "[{}]", provider.provider_key)?;
        if provider.info.is_orphaned() {
            writeln!(writer, "; orphaned: no version")?;
        }
        write_field(writer, "Id", provider.info.id.as_deref())?;
        write_field(writer, "Version", provider.info.version.as_deref())?;
        write_field(writer, "DisplayName", provider.info.display_name.as_deref())?;
        if let Some(attributes) = provider.info.attributes {
            writeln!(writer, "Attributes = {attributes}")?;
        }
        for edge in &provider.dependents {
            writeln!(writer, "Dependent = {}", format_edge(edge))?;
        }
    }
    Ok(())
}

fn write_field(writer: &mut dyn Write, name: &str, value: Option<&str>) -> Result<()> {
    if let Some(value) = value {
        writeln!(writer, "{name} = \"{}\"", value.replace('"', "\\\""))?;
    }
    Ok(())
}

/// Format an edge as `key [min, max)` style range text.
fn format_edge(edge: &DependentEdge) -> String {
    if edge.min_version.is_none() && edge.max_version.is_none() {
        return edge.dependent_key.clone();
    }
    let open = if edge.attributes.min_inclusive { '[' } else { '(' };
    let close = if edge.attributes.max_inclusive { ']' } else { ')' };
    format!(
        "{} {}{}, {}{}",
        edge.dependent_key,
        open,
        edge.min_version.as_deref().unwrap_or("*"),
        edge.max_version.as_deref().unwrap_or("*"),
        close,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_edge() {
        assert_eq!(format_edge(&DependentEdge::new("D")), "D");
        assert_eq!(
            format_edge(&DependentEdge::new("D").with_min_version("1.0", true)),
            "D [1.0, *)"
        );
        assert_eq!(
            format_edge(
                &DependentEdge::new("D")
                    .with_min_version("1.0", false)
                    .with_max_version("2.0", true)
            ),
            "D (1.0, 2.0]"
        );
    }

    #[test]
    fn test_write_field_escapes_quotes() {
        let mut buf = Vec::new();
        write_field(&mut buf, "DisplayName", Some(r#"The "Big" One"#)).unwrap();
        write_field(&mut buf, "Id", None).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "DisplayName = \"The \\\"Big\\\" One\"\n");
    }
}
