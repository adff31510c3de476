use storili_registry::{Registry, RegistryEntry};
use storili_types::{ConfigFingerprint, StoryId};

const LEGACY_DOCUMENT: &str = r#"{
  "three-little-pigs": {
    "agentId": "agent_01jz8x",
    "deployedAt": "2025-01-15T10:30:00.000Z",
    "configHash": "9f2c4b1e7a8d3f60c5b2e1a9d8c7b6a5f4e3d2c1b0a99887766554433221100f"
  }
}
"#;

#[test]
fn reads_documents_written_by_earlier_tooling() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".agents.json");
    std::fs::write(&path, LEGACY_DOCUMENT).unwrap();

    let registry = Registry::load(&path);
    let entry = registry
        .get(&StoryId::new("three-little-pigs").unwrap())
        .expect("entry should load");
    assert_eq!(entry.agent_id, "agent_01jz8x");
    assert_eq!(entry.config_hash.short(), "9f2c4b1e7a8d3f60");
    assert_eq!(entry.deployed_at.to_rfc3339(), "2025-01-15T10:30:00+00:00");
}

#[test]
fn written_document_uses_camel_case_keys_and_trailing_newline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".agents.json");

    let mut registry = Registry::load(&path);
    registry
        .put(
            StoryId::new("story-a").unwrap(),
            RegistryEntry::deployed_now("agent-1", ConfigFingerprint::from_hex("00".repeat(32))),
        )
        .unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.ends_with("}\n"));
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entry = &value["story-a"];
    assert_eq!(entry["agentId"], "agent-1");
    assert_eq!(entry["configHash"], "00".repeat(32));
    assert!(entry["deployedAt"].is_string());
}

#[test]
fn invalid_story_key_skips_only_that_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".agents.json");
    std::fs::write(
        &path,
        r#"{
  "Legacy_Story": {"agentId": "agent-legacy", "deployedAt": "2025-01-15T10:30:00Z", "configHash": "x"},
  "story-a": {"agentId": "agent-existing", "deployedAt": "2025-01-15T10:30:00Z", "configHash": "y"}
}"#,
    )
    .unwrap();

    let mut registry = Registry::load(&path);
    assert_eq!(registry.len(), 1);
    let story_a = StoryId::new("story-a").unwrap();
    assert_eq!(registry.get(&story_a).unwrap().agent_id, "agent-existing");
    assert!(registry.find_by_agent("agent-legacy").is_none());

    // The skipped entry is carried through later writes.
    registry
        .put(
            StoryId::new("story-b").unwrap(),
            RegistryEntry::deployed_now("agent-b", ConfigFingerprint::from_hex("00".repeat(32))),
        )
        .unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["Legacy_Story"]["agentId"], "agent-legacy");
    assert_eq!(value["story-a"]["agentId"], "agent-existing");
    assert_eq!(value["story-b"]["agentId"], "agent-b");
}

#[test]
fn save_rewrites_a_corrupt_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".agents.json");
    std::fs::write(&path, "garbage").unwrap();

    let registry = Registry::load(&path);
    registry.save().unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}\n");
}
