use std::fmt;
use thiserror::Error;

/// Longest remote error body kept in an error, in bytes.
const MAX_ERROR_BODY_BYTES: usize = 2048;

/// The platform call an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateAgent,
    UpdateAgent,
    DeleteAgent,
    GetAgent,
    ListAgents,
    IssueToken,
    IssueSignedUrl,
}

impl Operation {
    /// Whether repeating the call cannot create additional remote state.
    pub fn is_idempotent(self) -> bool {
        matches!(
            self,
            Operation::GetAgent
                | Operation::ListAgents
                | Operation::IssueToken
                | Operation::IssueSignedUrl
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::CreateAgent => "create agent",
            Operation::UpdateAgent => "update agent",
            Operation::DeleteAgent => "delete agent",
            Operation::GetAgent => "get agent",
            Operation::ListAgents => "list agents",
            Operation::IssueToken => "issue conversation token",
            Operation::IssueSignedUrl => "issue signed url",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PlatformError {
    /// The platform answered with a non-success status.
    #[error("{operation} failed with status {status}: {body}")]
    Remote {
        operation: Operation,
        status: u16,
        body: String,
    },

    /// The request never produced a response (connect failure, timeout).
    #[error("{operation} request failed: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },

    /// The response body did not have the expected shape.
    #[error("{operation} returned an unexpected body: {reason}")]
    Decode { operation: Operation, reason: String },

    #[error("invalid platform configuration: {0}")]
    Config(String),
}

impl PlatformError {
    pub(crate) fn remote(operation: Operation, status: u16, mut body: String) -> Self {
        if body.len() > MAX_ERROR_BODY_BYTES {
            let mut cut = MAX_ERROR_BODY_BYTES;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
            body.push_str("...");
        }
        PlatformError::Remote {
            operation,
            status,
            body,
        }
    }

    /// The remote status code, if the platform answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            PlatformError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the platform reported that the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// True for failures that may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            PlatformError::Transport { .. } => true,
            PlatformError::Remote { status, .. } => *status == 429 || *status >= 500,
            PlatformError::Decode { .. } | PlatformError::Config(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_statuses() {
        let not_found = PlatformError::remote(Operation::GetAgent, 404, String::new());
        assert!(not_found.is_not_found());
        assert!(!not_found.is_transient());

        assert!(PlatformError::remote(Operation::IssueToken, 503, String::new()).is_transient());
        assert!(PlatformError::remote(Operation::IssueToken, 429, String::new()).is_transient());
        assert!(!PlatformError::remote(Operation::IssueToken, 401, String::new()).is_transient());
    }

    #[test]
    fn long_bodies_are_truncated() {
        let err = PlatformError::remote(Operation::CreateAgent, 422, "é".repeat(4096));
        match err {
            PlatformError::Remote { body, .. } => {
                assert!(body.len() <= MAX_ERROR_BODY_BYTES + 3);
                assert!(body.ends_with("..."));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn only_reads_and_credentials_are_idempotent() {
        assert!(Operation::GetAgent.is_idempotent());
        assert!(Operation::IssueToken.is_idempotent());
        assert!(!Operation::CreateAgent.is_idempotent());
        assert!(!Operation::UpdateAgent.is_idempotent());
        assert!(!Operation::DeleteAgent.is_idempotent());
    }
}
