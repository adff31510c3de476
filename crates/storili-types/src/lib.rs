//! Shared types for the Storili deployment tooling.
//!
//! This crate provides the foundational types used across all Storili crates:
//! the typed agent configuration document accepted by the conversational-AI
//! platform, the validated [`StoryId`] used as the public name of a story, and
//! the content [`ConfigFingerprint`] used to detect configuration drift.
//!
//! No crate in the workspace depends on anything *except* `storili-types` for
//! cross-cutting type definitions. This keeps the dependency graph clean and
//! prevents circular dependencies.

pub mod fingerprint;
pub mod schema;
mod story_id;

pub use fingerprint::{fingerprint, ConfigFingerprint, FingerprintError};
pub use schema::{
    AgentConfig, AgentSettings, ClientTool, ConversationConfig, LlmModel, NodePosition,
    ParameterSchema, PromptSettings, SupportedVoice, ToolParameters, TtsSettings, TurnSettings,
    Workflow, WorkflowEdge, WorkflowNode, WorkflowNodeKind,
};
pub use story_id::{InvalidStoryId, StoryId};
