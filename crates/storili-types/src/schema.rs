//! Agent configuration document accepted by the conversational-AI platform.
//!
//! These types mirror the platform's create/update agent payload. They are
//! assembled once per deploy from a story record and are never mutated after
//! that. All maps are ordered so serialization is deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A complete agent definition, as sent to the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Display name of the agent on the platform.
    pub name: String,
    /// Conversation behavior: prompt, voice and turn-taking.
    pub conversation_config: ConversationConfig,
    /// Workflow skeleton required by the platform.
    pub workflow: Workflow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationConfig {
    pub agent: AgentSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tts: Option<TtsSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn: Option<TurnSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSettings {
    /// The first line the agent speaks when a session opens.
    pub first_message: String,
    /// ISO 639-1 language code.
    pub language: String,
    pub prompt: PromptSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptSettings {
    /// System prompt text.
    pub prompt: String,
    pub llm: LlmModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Suppresses the platform's built-in assistant persona.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_default_personality: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ClientTool>,
}

/// Language models the platform can drive an agent with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LlmModel {
    #[default]
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    #[serde(rename = "claude-3-5-sonnet")]
    Claude35Sonnet,
    #[serde(rename = "gemini-1.5-pro")]
    Gemini15Pro,
}

impl fmt::Display for LlmModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LlmModel::Gpt4oMini => "gpt-4o-mini",
            LlmModel::Gpt4o => "gpt-4o",
            LlmModel::Claude35Sonnet => "claude-3-5-sonnet",
            LlmModel::Gemini15Pro => "gemini-1.5-pro",
        };
        f.write_str(name)
    }
}

/// A tool the agent can call; the call is executed by the client application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientTool {
    /// Always `"client"` for tools handled by the app.
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub description: String,
    pub parameters: ToolParameters,
    /// Whether the agent waits for the client to answer the call.
    pub expects_response: bool,
}

impl ClientTool {
    /// Creates a fire-and-forget client tool.
    pub fn client(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameters,
    ) -> Self {
        Self {
            kind: "client".to_string(),
            name: name.into(),
            description: description.into(),
            parameters,
            expects_response: false,
        }
    }
}

/// JSON-schema object describing a tool's arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameters {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: BTreeMap<String, ParameterSchema>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl ToolParameters {
    /// An object schema with the given properties, all of them required.
    pub fn required(properties: impl IntoIterator<Item = (String, ParameterSchema)>) -> Self {
        let properties: BTreeMap<_, _> = properties.into_iter().collect();
        let required = properties.keys().cloned().collect();
        Self {
            kind: "object".to_string(),
            properties,
            required,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ParameterSchema>>,
}

impl ParameterSchema {
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            kind: "string".to_string(),
            description: Some(description.into()),
            items: None,
        }
    }

    pub fn array(items: ParameterSchema, description: impl Into<String>) -> Self {
        Self {
            kind: "array".to_string(),
            description: Some(description.into()),
            items: Some(Box::new(items)),
        }
    }
}

/// Text-to-speech settings for the narrator and any character voices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsSettings {
    pub voice_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_boost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Additional voices the agent switches to with `<Label>...</Label>` tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supported_voices: Vec<SupportedVoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportedVoice {
    pub label: String,
    pub voice_id: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
}

/// Turn-taking timeouts, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_timeout: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silence_end_call_timeout: Option<u32>,
}

/// Workflow graph. Scene transitions happen on the platform side, so stories
/// only ship the minimal skeleton.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Workflow {
    pub nodes: BTreeMap<String, WorkflowNode>,
    pub edges: BTreeMap<String, Vec<WorkflowEdge>>,
}

impl Workflow {
    /// A workflow containing only the mandatory `start_node`.
    pub fn start_only() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            "start_node".to_string(),
            WorkflowNode {
                kind: WorkflowNodeKind::Start,
                position: Some(NodePosition { x: 0.0, y: 0.0 }),
                edge_order: Vec::new(),
            },
        );
        Self {
            nodes,
            edges: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    #[serde(rename = "type")]
    pub kind: WorkflowNodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<NodePosition>,
    #[serde(default)]
    pub edge_order: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowNodeKind {
    Start,
    Agent,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodePosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEdge {
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}
