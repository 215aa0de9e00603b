//! Tests for noesis-core: thought contract, context bundle, service map,
//! config loading.

use noesis_core::*;
use std::sync::Arc;

// ===========================================================================
// AgentThought — confidence contract
// ===========================================================================

#[test]
fn thought_confidence_in_range_accepted() {
    for c in [0.0, 0.25, 0.5, 0.99, 1.0] {
        let t = AgentThought::new("agent", c, "content").unwrap();
        assert_eq!(t.confidence(), c);
    }
}

#[test]
fn thought_confidence_out_of_range_rejected() {
    for c in [-0.01, 1.01, 7.5, f64::INFINITY, f64::NEG_INFINITY] {
        assert!(
            AgentThought::new("agent", c, "content").is_err(),
            "confidence {} should be rejected",
            c
        );
    }
}

#[test]
fn thought_builder_chain() {
    let t = AgentThought::new("reasoner", 0.8, "plan detected")
        .unwrap()
        .with_reason("planning verbs present")
        .with_reason("memory supported")
        .requires_memory(true)
        .with_flag("insight", true)
        .with_flag("contradiction", false);

    assert_eq!(t.reasons.len(), 2);
    assert!(t.requires_memory);
    assert!(t.flag("insight"));
    assert!(!t.flag("contradiction"));
    assert!(!t.flag("never_set"));
}

#[test]
fn thought_deserialization_enforces_confidence_range() {
    // The persisted/wire shape must not be a back door around the
    // constructor's range check.
    let raw = r#"{"agent_name":"a","confidence":7.5,"content":"x","reasons":[],"requires_memory":false,"flags":{}}"#;
    assert!(serde_json::from_str::<AgentThought>(raw).is_err());
}

#[test]
fn thought_serde_roundtrip() {
    let t = AgentThought::new("reasoner", 0.66, "content")
        .unwrap()
        .with_flag("insight", true);
    let json = serde_json::to_string(&t).unwrap();
    let back: AgentThought = serde_json::from_str(&json).unwrap();
    assert_eq!(back.agent_name, "reasoner");
    assert_eq!(back.confidence(), 0.66);
    assert!(back.flag("insight"));
}

// ===========================================================================
// ContextBundle — construction and sharing
// ===========================================================================

#[test]
fn bundle_carries_matches_in_order() {
    let bundle = ContextBundle::from_input(
        "what did we decide?",
        vec!["first".into(), "second".into()],
        HubConfig::default(),
    );
    assert_eq!(bundle.memory_matches, vec!["first", "second"]);
    assert!(!bundle.timestamp.is_empty());
}

#[test]
fn bundle_collaborators_are_shared() {
    let profile = Arc::new(UserProfile {
        name: Some("sam".into()),
        ..Default::default()
    });
    let bundle = ContextBundle::from_input("hi", vec![], HubConfig::default())
        .with_collaborators(
            Arc::new(EthicalBoundaries::default()),
            profile.clone(),
            Arc::new(PersonaStyle::default()),
        );
    assert_eq!(bundle.profile.name.as_deref(), Some("sam"));
    // Same allocation, not a copy.
    assert!(Arc::ptr_eq(&bundle.profile, &profile));
}

#[test]
fn bundle_service_map_is_shared_across_clones() {
    let bundle = ContextBundle::from_input("hi", vec![], HubConfig::default());
    let seen_by_agent = bundle.clone();
    bundle.services.insert("marker", Arc::new(42u32));
    // A clone of the bundle observes services registered later in the cycle.
    assert_eq!(seen_by_agent.services.get::<u32>("marker").as_deref(), Some(&42));
}

// ===========================================================================
// HubConfig
// ===========================================================================

#[test]
fn config_load_missing_file_uses_defaults() {
    let config = HubConfig::load(std::path::Path::new("/nonexistent/noesis.toml"));
    assert_eq!(config.recall.k, 5);
    assert!(config.features.search_enabled);
}

#[test]
fn config_load_garbage_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("noesis.toml");
    std::fs::write(&path, "this is [not toml").unwrap();
    let config = HubConfig::load(&path);
    assert_eq!(config.agents_enabled, HubConfig::default().agents_enabled);
}

// ===========================================================================
// Error display
// ===========================================================================

#[test]
fn error_messages_name_the_agent() {
    let e = Error::agent_execution("reasoner", 2, "boom");
    assert!(e.to_string().contains("reasoner"));
    assert!(e.to_string().contains("round 2"));
}
