use storili_platform::PlatformError;
use storili_registry::RegistryError;
use storili_stories::LoadError;
use storili_types::{FingerprintError, InvalidStoryId, StoryId};
use thiserror::Error;

/// Errors that abort a single deploy, delete or inspection command.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The requested story has no definition.
    #[error("no configuration defined for story {0}")]
    ConfigNotFound(StoryId),

    /// The operator supplied a malformed story identifier.
    #[error(transparent)]
    InvalidStory(#[from] InvalidStoryId),

    /// The story definition exists but could not be loaded.
    #[error(transparent)]
    Load(LoadError),

    #[error(transparent)]
    Fingerprint(#[from] FingerprintError),

    /// The platform rejected or never answered a call. The registry is untouched.
    #[error("remote call failed for {target}: {source}")]
    RemoteCallFailed {
        target: String,
        #[source]
        source: PlatformError,
    },

    /// Delete was requested for an agent the registry does not track.
    #[error("agent {0} not found in registry")]
    UnknownAgent(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Reading the operator's confirmation failed.
    #[error("failed to read confirmation: {0}")]
    Confirmation(#[source] std::io::Error),
}

impl From<LoadError> for DeployError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::NotFound(story_id) => DeployError::ConfigNotFound(story_id),
            other => DeployError::Load(other),
        }
    }
}
