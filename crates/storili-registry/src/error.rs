use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when persisting the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Writing or renaming the registry document failed.
    #[error("failed to write registry {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The registry could not be encoded as JSON.
    #[error("failed to serialize registry: {0}")]
    Serialize(#[from] serde_json::Error),
}
