//! End-to-end tests for registration and unregistration.
//!
//! Tests upserts, the bottom-up cleanup cascade, idempotent deletes, and
//! that no store handle outlives an operation.

use deptrack::{
    CheckStatus, Dependencies, DependencyRegistry, DependencyRequirement, DependencySet,
    DependentEdge, HierarchicalStore, Hive, MemoryStore, ProviderRegistration,
};
use pretty_assertions::assert_eq;

const HIVE: Hive = Hive::PerUser;

/// Route engine spans to the test output. Set `RUST_LOG=deptrack=debug` to see them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn is_found(registry: &DependencyRegistry<MemoryStore>, key: &str) -> bool {
    registry
        .check_dependency(
            HIVE,
            &DependencyRequirement::new(key),
            &mut DependencySet::new(),
            &mut Dependencies::new(),
        )
        .unwrap()
        .is_satisfied()
}

fn node_exists(registry: &DependencyRegistry<MemoryStore>, path: &str) -> bool {
    registry.store().open(HIVE, path).unwrap().is_some()
}

// ============================================================================
// 1. Register then unregister restores the previous state
// ============================================================================

#[test]
fn test_register_unregister_roundtrip() {
    init_tracing();
    let registry = DependencyRegistry::open_memory();
    registry
        .register_dependency(HIVE, &ProviderRegistration::new("Keep", "1.0", "Keep"))
        .unwrap();
    let before = registry.store().snapshot();

    registry
        .register_dependency(HIVE, &ProviderRegistration::new("P", "1.0", "Product").with_id("{ID}"))
        .unwrap();
    assert!(is_found(&registry, "P"));

    registry.unregister_dependency(HIVE, "P").unwrap();
    assert!(!is_found(&registry, "P"));
    assert_eq!(registry.store().snapshot(), before);
}

#[test]
fn test_unregister_dependency_is_idempotent() {
    let registry = DependencyRegistry::open_memory();
    registry.unregister_dependency(HIVE, "P").unwrap();
    registry.unregister_dependency(HIVE, "P").unwrap();
}

#[test]
fn test_unregister_dependency_removes_edges_too() {
    let registry = DependencyRegistry::open_memory();
    registry
        .register_dependency(HIVE, &ProviderRegistration::new("P", "1.0", "Product"))
        .unwrap();
    registry.register_dependent(HIVE, "P", &DependentEdge::new("D")).unwrap();

    registry.unregister_dependency(HIVE, "P").unwrap();
    assert!(!registry.dependent_exists(HIVE, "P", "D").unwrap());
    assert!(!node_exists(&registry, &registry.paths().provider("P")));
}

// ============================================================================
// 2. Register is last-write-wins
// ============================================================================

#[test]
fn test_reregister_overwrites_fields() {
    let registry = DependencyRegistry::open_memory();
    registry
        .register_dependency(HIVE, &ProviderRegistration::new("P", "1.0", "Old Name"))
        .unwrap();
    registry
        .register_dependency(HIVE, &ProviderRegistration::new("P", "2.0", "New Name").with_attributes(1))
        .unwrap();

    let info = registry.provider_information(HIVE, "P").unwrap();
    assert_eq!(info.version.as_deref(), Some("2.0"));
    assert_eq!(info.display_name.as_deref(), Some("New Name"));
    assert_eq!(info.attributes, Some(1));
}

// ============================================================================
// 3. Unregistering the only dependent collapses container and provider
// ============================================================================

#[test]
fn test_last_dependent_removes_container_and_provider() {
    init_tracing();
    let registry = DependencyRegistry::open_memory();
    registry.register_dependent(HIVE, "P", &DependentEdge::new("D")).unwrap();
    assert!(registry.dependent_exists(HIVE, "P", "D").unwrap());

    registry.unregister_dependent(HIVE, "P", "D").unwrap();

    assert!(!node_exists(&registry, &registry.paths().dependents("P")));
    assert!(!node_exists(&registry, &registry.paths().provider("P")));
    assert!(!is_found(&registry, "P"));
}

#[test]
fn test_remaining_dependent_keeps_provider() {
    let registry = DependencyRegistry::open_memory();
    registry
        .register_dependency(HIVE, &ProviderRegistration::new("P", "1.0", "Product"))
        .unwrap();
    registry.register_dependent(HIVE, "P", &DependentEdge::new("D1")).unwrap();
    registry.register_dependent(HIVE, "P", &DependentEdge::new("D2")).unwrap();

    registry.unregister_dependent(HIVE, "P", "D1").unwrap();

    assert!(!registry.dependent_exists(HIVE, "P", "D1").unwrap());
    assert!(registry.dependent_exists(HIVE, "P", "D2").unwrap());
    assert!(is_found(&registry, "P"));
}

#[test]
fn test_remaining_dependent_keeps_valueless_provider() {
    let registry = DependencyRegistry::open_memory();
    registry.register_dependent(HIVE, "P", &DependentEdge::new("D1")).unwrap();
    registry.register_dependent(HIVE, "P", &DependentEdge::new("D2")).unwrap();

    registry.unregister_dependent(HIVE, "P", "D1").unwrap();
    assert!(node_exists(&registry, &registry.paths().dependents("P")));

    registry.unregister_dependent(HIVE, "P", "D2").unwrap();
    assert!(!node_exists(&registry, &registry.paths().provider("P")));
}

#[test]
fn test_provider_with_values_survives_cascade() {
    let registry = DependencyRegistry::open_memory();
    registry
        .register_dependency(HIVE, &ProviderRegistration::new("P", "1.0", "Product"))
        .unwrap();
    registry.register_dependent(HIVE, "P", &DependentEdge::new("D")).unwrap();

    registry.unregister_dependent(HIVE, "P", "D").unwrap();

    assert!(!node_exists(&registry, &registry.paths().dependents("P")));
    assert!(is_found(&registry, "P"));
}

// ============================================================================
// 4. Redundant unregister calls succeed (multi-phase rollback)
// ============================================================================

#[test]
fn test_unregister_dependent_redundant_calls() {
    init_tracing();
    let registry = DependencyRegistry::open_memory();

    // No root at all.
    registry.unregister_dependent(HIVE, "P", "D").unwrap();

    // Root exists, provider does not.
    registry
        .register_dependency(HIVE, &ProviderRegistration::new("Other", "1.0", "Other"))
        .unwrap();
    registry.unregister_dependent(HIVE, "P", "D").unwrap();

    // Provider exists, no container.
    registry
        .register_dependency(HIVE, &ProviderRegistration::new("P", "1.0", "Product"))
        .unwrap();
    registry.unregister_dependent(HIVE, "P", "D").unwrap();

    // Edge already gone, twice over.
    registry.register_dependent(HIVE, "P", &DependentEdge::new("D")).unwrap();
    registry.unregister_dependent(HIVE, "P", "D").unwrap();
    registry.unregister_dependent(HIVE, "P", "D").unwrap();

    assert!(is_found(&registry, "P"));
    assert!(is_found(&registry, "Other"));
}

#[test]
fn test_unregister_unknown_dependent_keeps_others() {
    let registry = DependencyRegistry::open_memory();
    registry.register_dependent(HIVE, "P", &DependentEdge::new("D")).unwrap();

    registry.unregister_dependent(HIVE, "P", "Stranger").unwrap();
    assert!(registry.dependent_exists(HIVE, "P", "D").unwrap());
}

// ============================================================================
// 5. Edge bounds upsert
// ============================================================================

#[test]
fn test_register_dependent_clears_stale_bounds() {
    let registry = DependencyRegistry::open_memory();
    let bounded = DependentEdge::new("D")
        .with_min_version("1.0", true)
        .with_max_version("2.0", false);
    registry.register_dependent(HIVE, "P", &bounded).unwrap();
    assert_eq!(registry.dependent_edge(HIVE, "P", "D").unwrap(), Some(bounded));

    registry.register_dependent(HIVE, "P", &DependentEdge::new("D")).unwrap();
    assert_eq!(registry.dependent_edge(HIVE, "P", "D").unwrap(), Some(DependentEdge::new("D")));
    assert_eq!(registry.dependent_edge(HIVE, "P", "Nope").unwrap(), None);
}

// ============================================================================
// 6. No handle outlives an operation
// ============================================================================

#[test]
fn test_no_handles_leak() {
    let registry = DependencyRegistry::open_memory();
    let store = registry.store();

    registry
        .register_dependency(HIVE, &ProviderRegistration::new("P", "1.0", "Product"))
        .unwrap();
    registry.register_dependent(HIVE, "P", &DependentEdge::new("D")).unwrap();
    assert_eq!(store.open_handles(), 0);

    let mut out = Dependencies::new();
    let status = registry
        .check_dependency(
            HIVE,
            &DependencyRequirement::new("P").with_min_version("9.0", true),
            &mut DependencySet::new(),
            &mut out,
        )
        .unwrap();
    assert_eq!(status, CheckStatus::Unsatisfied);
    registry.check_dependents(HIVE, "P", None, &mut out).unwrap();
    let _ = registry.check_dependents(HIVE, "Missing", None, &mut out);
    let _ = registry.provider_information(HIVE, "Missing");
    assert_eq!(store.open_handles(), 0);

    registry.unregister_dependent(HIVE, "P", "D").unwrap();
    registry.unregister_dependency(HIVE, "P").unwrap();
    assert_eq!(store.open_handles(), 0);
}
