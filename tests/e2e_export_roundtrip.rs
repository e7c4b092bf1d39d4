//! Export and persistence round-trip tests.
//!
//!   registry → export_dump() / export_json() → verify content
//!   registry (file store) → flush → reopen → same answers

use deptrack::export::{export_dump, export_json, snapshot_hive, ProviderSnapshot};
use deptrack::{
    CheckStatus, Dependencies, DependencyRegistry, DependencyRequirement, DependencySet,
    DependentEdge, HierarchicalStore, Hive, MemoryStore, ProviderRegistration, StoreConfig,
};
use pretty_assertions::assert_eq;

const HIVE: Hive = Hive::PerMachine;

/// Helper: a provider with two dependents and one orphan.
fn seed<S: HierarchicalStore>(registry: &DependencyRegistry<S>) {
    registry
        .register_dependency(
            HIVE,
            &ProviderRegistration::new("Acme.Runtime", "2.1.0", "Acme Runtime").with_id("{RT-01}"),
        )
        .unwrap();
    registry
        .register_dependent(
            HIVE,
            "Acme.Runtime",
            &DependentEdge::new("BundleA").with_min_version("2.0", true),
        )
        .unwrap();
    registry.register_dependent(HIVE, "Acme.Runtime", &DependentEdge::new("BundleB")).unwrap();
    registry.register_dependent(HIVE, "Orphan", &DependentEdge::new("BundleA")).unwrap();
}

#[test]
fn test_snapshot_lists_providers_and_edges() {
    let registry = DependencyRegistry::open_memory();
    seed(&registry);

    let providers = snapshot_hive(&registry, HIVE).unwrap();
    let keys: Vec<_> = providers.iter().map(|p| p.provider_key.as_str()).collect();
    assert_eq!(keys, vec!["Acme.Runtime", "Orphan"]);

    let runtime: &ProviderSnapshot = &providers[0];
    assert_eq!(runtime.info.id.as_deref(), Some("{RT-01}"));
    assert_eq!(runtime.dependents.len(), 2);
    assert_eq!(runtime.dependents[0].min_version.as_deref(), Some("2.0"));
    assert!(providers[1].info.is_orphaned());

    assert!(snapshot_hive(&registry, Hive::PerUser).unwrap().is_empty());
}

#[test]
fn test_dump_format() {
    let registry = DependencyRegistry::open_memory();
    seed(&registry);

    let mut buf = Vec::new();
    export_dump(&registry, HIVE, &mut buf).unwrap();
    let dump = String::from_utf8(buf).unwrap();

    assert!(dump.contains("; Providers: 2"));
    assert!(dump.contains("[Acme.Runtime]"));
    assert!(dump.contains("Version = \"2.1.0\""));
    assert!(dump.contains("Dependent = BundleA [2.0, *)"));
    assert!(dump.contains("Dependent = BundleB\n"));
    assert!(dump.contains("; orphaned: no version"));

    let dependents = dump.lines().filter(|l| l.starts_with("Dependent = ")).count();
    assert_eq!(dependents, 3);
}

#[test]
fn test_json_export_parses_back() {
    let registry = DependencyRegistry::open_memory();
    seed(&registry);

    let mut buf = Vec::new();
    export_json(&registry, HIVE, &mut buf).unwrap();
    let parsed: Vec<ProviderSnapshot> = serde_json::from_slice(&buf).unwrap();
    assert_eq!(parsed, snapshot_hive(&registry, HIVE).unwrap());
}

#[test]
fn test_file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig::File { path: dir.path().join("dependencies.json") };

    {
        let registry = DependencyRegistry::open(&config).unwrap();
        seed(&registry);
        registry.unregister_dependent(HIVE, "Orphan", "BundleA").unwrap();
    }

    let registry = DependencyRegistry::open(&config).unwrap();
    let mut missing = Dependencies::new();
    let status = registry
        .check_dependency(
            HIVE,
            &DependencyRequirement::new("Acme.Runtime").with_min_version("2.1.0", true),
            &mut DependencySet::new(),
            &mut missing,
        )
        .unwrap();
    assert_eq!(status, CheckStatus::Satisfied);

    let mut dependents = Dependencies::new();
    registry.check_dependents(HIVE, "Acme.Runtime", None, &mut dependents).unwrap();
    assert_eq!(dependents.keys().collect::<Vec<_>>(), vec!["BundleA", "BundleB"]);

    assert!(registry.store().open(HIVE, &registry.paths().provider("Orphan")).unwrap().is_none());
}

#[test]
fn test_store_config_serde() {
    let config: StoreConfig = serde_json::from_str(r#"{"kind":"file","path":"/tmp/deps.json"}"#).unwrap();
    assert_eq!(config, StoreConfig::File { path: "/tmp/deps.json".into() });

    let memory: StoreConfig = serde_json::from_str(r#"{"kind":"memory"}"#).unwrap();
    assert_eq!(memory, StoreConfig::Memory);

    let registry = DependencyRegistry::open(&memory).unwrap();
    let _: &MemoryStore = registry.store();
}
