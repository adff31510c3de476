use crate::RegistryError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use storili_types::{ConfigFingerprint, StoryId};

/// The deployed state of one story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Identifier the platform assigned to the agent.
    #[serde(rename = "agentId")]
    pub agent_id: String,
    /// When the last successful create or update completed.
    #[serde(rename = "deployedAt")]
    pub deployed_at: DateTime<Utc>,
    /// Fingerprint of the configuration that was deployed.
    #[serde(rename = "configHash")]
    pub config_hash: ConfigFingerprint,
}

impl RegistryEntry {
    /// An entry stamped with the current time.
    pub fn deployed_now(agent_id: impl Into<String>, config_hash: ConfigFingerprint) -> Self {
        Self {
            agent_id: agent_id.into(),
            deployed_at: Utc::now(),
            config_hash,
        }
    }
}

/// Story id to deployment mapping, backed by a JSON document.
#[derive(Debug, Clone)]
pub struct Registry {
    path: PathBuf,
    entries: BTreeMap<StoryId, RegistryEntry>,
    /// Entries under keys that are not valid story ids. Never looked up,
    /// written back untouched.
    unrecognized: BTreeMap<String, RegistryEntry>,
}

impl Registry {
    /// Loads the registry at `path`.
    ///
    /// A missing file is an empty registry. A file that cannot be read or
    /// parsed is logged as corrupt and also treated as empty; the next
    /// successful write replaces it.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let document: BTreeMap<String, RegistryEntry> = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(document) => document,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        "registry is corrupt, treating as empty: {}",
                        e
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    "registry is unreadable, treating as empty: {}",
                    e
                );
                BTreeMap::new()
            }
        };

        let mut entries = BTreeMap::new();
        let mut unrecognized = BTreeMap::new();
        for (key, entry) in document {
            match StoryId::new(key.as_str()) {
                Ok(story_id) => {
                    entries.insert(story_id, entry);
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        key = %key,
                        agent_id = %entry.agent_id,
                        "skipping registry entry with invalid story id: {}",
                        e
                    );
                    unrecognized.insert(key, entry);
                }
            }
        }

        tracing::debug!(path = %path.display(), count = entries.len(), "loaded registry");
        Self {
            path,
            entries,
            unrecognized,
        }
    }

    /// Location of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, story_id: &StoryId) -> Option<&RegistryEntry> {
        self.entries.get(story_id)
    }

    /// Finds the story currently bound to `agent_id`.
    pub fn find_by_agent(&self, agent_id: &str) -> Option<(&StoryId, &RegistryEntry)> {
        self.entries.iter().find(|(_, e)| e.agent_id == agent_id)
    }

    /// Entries in story id order.
    pub fn entries(&self) -> impl Iterator<Item = (&StoryId, &RegistryEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts or overwrites the entry for `story_id` and persists immediately.
    ///
    /// The in-memory state only changes once the document is on disk.
    pub fn put(&mut self, story_id: StoryId, entry: RegistryEntry) -> Result<(), RegistryError> {
        let mut next = self.entries.clone();
        next.insert(story_id, entry);
        write_document(&self.path, &next, &self.unrecognized)?;
        self.entries = next;
        Ok(())
    }

    /// Removes the entry for `story_id` and persists immediately.
    pub fn remove(&mut self, story_id: &StoryId) -> Result<Option<RegistryEntry>, RegistryError> {
        if !self.entries.contains_key(story_id) {
            return Ok(None);
        }
        let mut next = self.entries.clone();
        let removed = next.remove(story_id);
        write_document(&self.path, &next, &self.unrecognized)?;
        self.entries = next;
        Ok(removed)
    }

    /// Writes the whole document to disk.
    pub fn save(&self) -> Result<(), RegistryError> {
        write_document(&self.path, &self.entries, &self.unrecognized)
    }
}

/// Atomically replaces the document at `path` with `entries` plus any
/// `unrecognized` entries carried over from the loaded document.
fn write_document(
    path: &Path,
    entries: &BTreeMap<StoryId, RegistryEntry>,
    unrecognized: &BTreeMap<String, RegistryEntry>,
) -> Result<(), RegistryError> {
    let document: BTreeMap<&str, &RegistryEntry> = entries
        .iter()
        .map(|(id, entry)| (id.as_str(), entry))
        .chain(unrecognized.iter().map(|(key, entry)| (key.as_str(), entry)))
        .collect();
    let mut contents = serde_json::to_string_pretty(&document)?;
    contents.push('\n');

    let io_err = |source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(contents.as_bytes()).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    tracing::debug!(path = %path.display(), count = entries.len(), "saved registry");
    Ok(())
}
