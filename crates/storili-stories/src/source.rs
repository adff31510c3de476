//! Story sources: where story records come from.

use crate::record::{build_agent_config, StoryRecord};
use crate::LoadError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use storili_types::{AgentConfig, StoryId};

/// File extension of story records in a [`StoryDirectory`].
const STORY_EXTENSION: &str = "toml";

/// Resolves story identifiers to agent configurations.
pub trait ConfigSource {
    /// Loads and assembles the configuration for `story_id`.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::NotFound` if the story has no definition.
    fn load(&self, story_id: &StoryId) -> Result<AgentConfig, LoadError>;

    /// Lists every story this source defines, in identifier order.
    fn story_ids(&self) -> Result<Vec<StoryId>, LoadError>;
}

/// Reads `<dir>/<story-id>.toml` story records from disk.
#[derive(Debug, Clone)]
pub struct StoryDirectory {
    dir: PathBuf,
}

impl StoryDirectory {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, story_id: &StoryId) -> PathBuf {
        self.dir
            .join(story_id.as_str())
            .with_extension(STORY_EXTENSION)
    }

    /// Reads and validates the raw record for `story_id`.
    pub fn read_record(&self, story_id: &StoryId) -> Result<StoryRecord, LoadError> {
        let path = self.record_path(story_id);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoadError::NotFound(story_id.clone()));
            }
            Err(source) => return Err(LoadError::Io { path, source }),
        };

        let record: StoryRecord = toml::from_str(&contents).map_err(|source| LoadError::Parse {
            story_id: story_id.clone(),
            source,
        })?;
        record.validate(story_id)?;
        tracing::debug!(story_id = %story_id, path = %path.display(), "loaded story record");
        Ok(record)
    }
}

impl ConfigSource for StoryDirectory {
    fn load(&self, story_id: &StoryId) -> Result<AgentConfig, LoadError> {
        self.read_record(story_id)
            .map(|record| build_agent_config(&record))
    }

    fn story_ids(&self) -> Result<Vec<StoryId>, LoadError> {
        let io_err = |source| LoadError::Io {
            path: self.dir.clone(),
            source,
        };

        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(STORY_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match StoryId::new(stem) {
                Ok(id) => ids.push(id),
                Err(e) => {
                    tracing::warn!(path = %path.display(), "skipping story file: {}", e);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// An in-memory set of story records.
#[derive(Debug, Clone, Default)]
pub struct StoryCatalog {
    records: BTreeMap<StoryId, StoryRecord>,
}

impl StoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a story record.
    pub fn insert(&mut self, story_id: StoryId, record: StoryRecord) {
        self.records.insert(story_id, record);
    }

    /// Mutable access to a record, for editing a story in place.
    pub fn get_mut(&mut self, story_id: &StoryId) -> Option<&mut StoryRecord> {
        self.records.get_mut(story_id)
    }
}

impl ConfigSource for StoryCatalog {
    fn load(&self, story_id: &StoryId) -> Result<AgentConfig, LoadError> {
        let record = self
            .records
            .get(story_id)
            .ok_or_else(|| LoadError::NotFound(story_id.clone()))?;
        record.validate(story_id)?;
        Ok(build_agent_config(record))
    }

    fn story_ids(&self) -> Result<Vec<StoryId>, LoadError> {
        Ok(self.records.keys().cloned().collect())
    }
}
