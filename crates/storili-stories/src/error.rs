use std::path::PathBuf;
use storili_types::StoryId;
use thiserror::Error;

/// Errors raised while resolving a story to an agent configuration.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The story has no definition.
    #[error("no configuration defined for story {0}")]
    NotFound(StoryId),

    /// The story file exists but is not valid TOML for a story record.
    #[error("failed to parse story {story_id}: {source}")]
    Parse {
        story_id: StoryId,
        #[source]
        source: toml::de::Error,
    },

    /// The record parsed but holds out-of-range or missing values.
    #[error("invalid story {story_id}: {reason}")]
    InvalidRecord { story_id: StoryId, reason: String },

    /// Reading the stories directory or a story file failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
