//! Seams between the platform client and its callers.

use crate::PlatformError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use storili_types::AgentConfig;

/// An agent as the platform reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteAgent {
    pub agent_id: String,
    pub name: Option<String>,
    /// The full platform document, including server-side defaults.
    pub document: serde_json::Value,
}

/// One row of the platform's agent listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub agent_id: String,
    #[serde(default)]
    pub name: String,
}

/// Which session credential to hand to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    /// Conversation token for WebRTC sessions.
    #[default]
    Token,
    /// Signed WebSocket URL.
    SignedUrl,
}

impl CredentialKind {
    /// JSON field name the credential is returned under.
    pub fn field_name(self) -> &'static str {
        match self {
            CredentialKind::Token => "token",
            CredentialKind::SignedUrl => "signed_url",
        }
    }
}

/// Agent lifecycle operations used by deploys.
pub trait AgentPlatform {
    /// Creates an agent and returns its platform identifier.
    fn create_agent(
        &self,
        config: &AgentConfig,
    ) -> impl Future<Output = Result<String, PlatformError>> + Send;

    /// Replaces the configuration of an existing agent.
    fn update_agent(
        &self,
        agent_id: &str,
        config: &AgentConfig,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    fn delete_agent(&self, agent_id: &str)
        -> impl Future<Output = Result<(), PlatformError>> + Send;

    fn get_agent(
        &self,
        agent_id: &str,
    ) -> impl Future<Output = Result<RemoteAgent, PlatformError>> + Send;

    fn list_agents(&self) -> impl Future<Output = Result<Vec<AgentSummary>, PlatformError>> + Send;
}

/// Issues short-lived session credentials for an agent.
pub trait TokenIssuer: Send + Sync {
    /// Returns only the credential string, never the full platform response.
    fn issue_credential(
        &self,
        agent_id: &str,
        kind: CredentialKind,
    ) -> impl Future<Output = Result<String, PlatformError>> + Send;
}
