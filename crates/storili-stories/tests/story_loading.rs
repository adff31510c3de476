use std::path::PathBuf;
use storili_stories::{build_agent_config, ConfigSource, LoadError, StoryDirectory, StoryRecord};
use storili_types::{fingerprint, StoryId};

const RECORD: &str = r#"
title = "Story A"
first_message = "Hi there!"
system_prompt = "You narrate story A."
scenes = ["meadow", "castle"]

[narrator]
voice_id = "voice-a"
"#;

fn shipped_stories() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../stories")
}

fn story(id: &str) -> StoryId {
    StoryId::new(id).unwrap()
}

#[test]
fn shipped_three_little_pigs_loads() {
    let source = StoryDirectory::new(shipped_stories());
    let config = source.load(&story("three-little-pigs")).unwrap();

    assert_eq!(config.name, "Storili - Three Little Pigs");
    let tts = config.conversation_config.tts.unwrap();
    assert_eq!(tts.voice_id, "jhgKhAfry5bhdFA52rHI");
    let labels: Vec<_> = tts.supported_voices.iter().map(|v| v.label.as_str()).collect();
    assert_eq!(labels, ["Wolf", "Pig1", "Pig2", "Pig3", "MotherPig"]);

    let ids = source.story_ids().unwrap();
    assert!(ids.contains(&story("three-little-pigs")));
}

#[test]
fn directory_reports_missing_story_as_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let source = StoryDirectory::new(dir.path());

    match source.load(&story("story-z")) {
        Err(LoadError::NotFound(id)) => assert_eq!(id.as_str(), "story-z"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn directory_reports_parse_and_validation_errors() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.toml"), "title = ").unwrap();
    std::fs::write(
        dir.path().join("no-scenes.toml"),
        RECORD.replace(r#"scenes = ["meadow", "castle"]"#, "scenes = []"),
    )
    .unwrap();
    let source = StoryDirectory::new(dir.path());

    assert!(matches!(
        source.load(&story("broken")),
        Err(LoadError::Parse { .. })
    ));
    assert!(matches!(
        source.load(&story("no-scenes")),
        Err(LoadError::InvalidRecord { .. })
    ));
}

#[test]
fn story_ids_skip_foreign_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("story-b.toml"), RECORD).unwrap();
    std::fs::write(dir.path().join("story-a.toml"), RECORD).unwrap();
    std::fs::write(dir.path().join("README.md"), "notes").unwrap();
    std::fs::write(dir.path().join("Bad_Name.toml"), RECORD).unwrap();

    let ids = StoryDirectory::new(dir.path()).story_ids().unwrap();
    assert_eq!(ids, vec![story("story-a"), story("story-b")]);
}

#[test]
fn loading_twice_yields_identical_fingerprints() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("story-a.toml"), RECORD).unwrap();
    let source = StoryDirectory::new(dir.path());

    let first = fingerprint(&source.load(&story("story-a")).unwrap()).unwrap();
    let second = fingerprint(&source.load(&story("story-a")).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn near_duplicate_configs_have_distinct_fingerprints() {
    let base: StoryRecord = toml::from_str(RECORD).unwrap();
    let base_fp = fingerprint(&build_agent_config(&base)).unwrap();

    let mut variants = Vec::new();

    let mut r = base.clone();
    r.system_prompt.push('!');
    variants.push(("prompt", r));

    let mut r = base.clone();
    r.temperature = 0.71;
    variants.push(("temperature", r));

    let mut r = base.clone();
    r.narrator.voice_id = "voice-b".to_string();
    variants.push(("voice", r));

    let mut r = base.clone();
    r.scenes.reverse();
    variants.push(("scene order", r));

    let mut r = base.clone();
    r.turn.turn_timeout += 1;
    variants.push(("turn timeout", r));

    for (field, record) in variants {
        let fp = fingerprint(&build_agent_config(&record)).unwrap();
        assert_ne!(fp, base_fp, "changing {field} must change the fingerprint");
    }
}

#[test]
fn fingerprint_ignores_json_key_order_of_equivalent_documents() {
    let base: StoryRecord = toml::from_str(RECORD).unwrap();
    let config = build_agent_config(&base);

    // Round-trip through a reordered JSON text: same content, different layout.
    let value = serde_json::to_value(&config).unwrap();
    let mut pairs: Vec<_> = value.as_object().unwrap().iter().collect();
    pairs.reverse();
    let reordered = format!(
        "{{{}}}",
        pairs
            .iter()
            .map(|(k, v)| format!("{}:{}", serde_json::to_string(k).unwrap(), v))
            .collect::<Vec<_>>()
            .join(",")
    );
    let reparsed: serde_json::Value = serde_json::from_str(&reordered).unwrap();

    assert_eq!(fingerprint(&config).unwrap(), fingerprint(&reparsed).unwrap());
}
