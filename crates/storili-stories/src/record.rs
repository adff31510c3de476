//! Per-story data records and their assembly into the shared agent schema.

use crate::LoadError;
use serde::{Deserialize, Serialize};
use storili_types::{
    AgentConfig, AgentSettings, ClientTool, ConversationConfig, LlmModel, ParameterSchema,
    PromptSettings, StoryId, SupportedVoice, ToolParameters, TtsSettings, TurnSettings, Workflow,
};

/// Prefix of every agent name on the platform.
const AGENT_NAME_PREFIX: &str = "Storili - ";

/// Model family used for character voices.
const CHARACTER_MODEL_FAMILY: &str = "turbo";

/// The data that distinguishes one story from another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryRecord {
    /// Human-readable title, e.g. "Three Little Pigs".
    pub title: String,
    pub first_message: String,
    pub system_prompt: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub llm: LlmModel,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Scene identifiers in story order; the first is where sessions start.
    pub scenes: Vec<String>,
    pub narrator: NarratorVoice,
    #[serde(default)]
    pub characters: Vec<CharacterVoice>,
    #[serde(default)]
    pub turn: TurnRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarratorVoice {
    pub voice_id: String,
    #[serde(default = "default_tts_model")]
    pub model_id: String,
    #[serde(default = "default_stability")]
    pub stability: f64,
    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f64,
    #[serde(default)]
    pub style: Option<f64>,
    #[serde(default = "default_speed")]
    pub speed: f64,
}

/// A character voice the narrator switches to with `<Label>...</Label>` tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterVoice {
    pub label: String,
    pub voice_id: String,
    pub description: String,
    #[serde(default = "default_stability")]
    pub stability: f64,
    #[serde(default = "default_speed")]
    pub speed: f64,
}

/// Turn-taking timeouts in seconds. Young listeners need generous values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    #[serde(default = "default_turn_timeout")]
    pub turn_timeout: u32,
    #[serde(default = "default_silence_end_call_timeout")]
    pub silence_end_call_timeout: u32,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    150
}

fn default_tts_model() -> String {
    "eleven_turbo_v2".to_string()
}

fn default_stability() -> f64 {
    0.5
}

fn default_similarity_boost() -> f64 {
    0.75
}

fn default_speed() -> f64 {
    1.0
}

fn default_turn_timeout() -> u32 {
    15
}

fn default_silence_end_call_timeout() -> u32 {
    60
}

impl Default for TurnRecord {
    fn default() -> Self {
        Self {
            turn_timeout: default_turn_timeout(),
            silence_end_call_timeout: default_silence_end_call_timeout(),
        }
    }
}

impl StoryRecord {
    /// Checks value ranges the platform would otherwise reject at deploy time.
    pub fn validate(&self, story_id: &StoryId) -> Result<(), LoadError> {
        let invalid = |reason: String| LoadError::InvalidRecord {
            story_id: story_id.clone(),
            reason,
        };

        if self.title.trim().is_empty() {
            return Err(invalid("title must not be empty".to_string()));
        }
        if self.system_prompt.trim().is_empty() {
            return Err(invalid("system_prompt must not be empty".to_string()));
        }
        if self.scenes.is_empty() {
            return Err(invalid("at least one scene is required".to_string()));
        }
        if let Some(scene) = self.scenes.iter().find(|s| s.trim().is_empty()) {
            return Err(invalid(format!("scene name {scene:?} is blank")));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(invalid(format!(
                "temperature {} is outside 0.0..=2.0",
                self.temperature
            )));
        }

        check_unit("narrator.stability", self.narrator.stability).map_err(invalid)?;
        check_unit("narrator.similarity_boost", self.narrator.similarity_boost)
            .map_err(invalid)?;
        if let Some(style) = self.narrator.style {
            check_unit("narrator.style", style).map_err(invalid)?;
        }
        check_speed("narrator.speed", self.narrator.speed).map_err(invalid)?;

        for character in &self.characters {
            if character.label.is_empty()
                || !character.label.chars().all(|c| c.is_ascii_alphanumeric())
            {
                return Err(invalid(format!(
                    "character label {:?} must be non-empty and alphanumeric",
                    character.label
                )));
            }
            check_unit(&format!("{}.stability", character.label), character.stability)
                .map_err(invalid)?;
            check_speed(&format!("{}.speed", character.label), character.speed)
                .map_err(invalid)?;
        }

        Ok(())
    }
}

fn check_unit(field: &str, value: f64) -> Result<(), String> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(format!("{field} {value} is outside 0.0..=1.0"))
    }
}

fn check_speed(field: &str, value: f64) -> Result<(), String> {
    if (0.7..=1.2).contains(&value) {
        Ok(())
    } else {
        Err(format!("{field} {value} is outside 0.7..=1.2"))
    }
}

/// Assembles the platform document for a story.
pub fn build_agent_config(record: &StoryRecord) -> AgentConfig {
    let supported_voices = record
        .characters
        .iter()
        .map(|c| SupportedVoice {
            label: c.label.clone(),
            voice_id: c.voice_id.clone(),
            description: c.description.clone(),
            model_family: Some(CHARACTER_MODEL_FAMILY.to_string()),
            stability: Some(c.stability),
            speed: Some(c.speed),
        })
        .collect();

    AgentConfig {
        name: format!("{AGENT_NAME_PREFIX}{}", record.title),
        conversation_config: ConversationConfig {
            agent: AgentSettings {
                first_message: record.first_message.clone(),
                language: record.language.clone(),
                prompt: PromptSettings {
                    prompt: record.system_prompt.clone(),
                    llm: record.llm,
                    temperature: Some(record.temperature),
                    max_tokens: Some(record.max_tokens),
                    ignore_default_personality: Some(true),
                    tools: story_tools(&record.scenes),
                },
            },
            tts: Some(TtsSettings {
                voice_id: record.narrator.voice_id.clone(),
                model_id: Some(record.narrator.model_id.clone()),
                stability: Some(record.narrator.stability),
                similarity_boost: Some(record.narrator.similarity_boost),
                style: record.narrator.style,
                speed: Some(record.narrator.speed),
                supported_voices,
            }),
            turn: Some(TurnSettings {
                turn_timeout: Some(record.turn.turn_timeout),
                silence_end_call_timeout: Some(record.turn.silence_end_call_timeout),
            }),
        },
        workflow: Workflow::start_only(),
    }
}

/// The client tools every story agent exposes to the app.
fn story_tools(scenes: &[String]) -> Vec<ClientTool> {
    vec![
        ClientTool::client(
            "change_scene",
            "Transition to a new scene. Call when moving between story locations.",
            ToolParameters::required([(
                "scene_name".to_string(),
                ParameterSchema::string(format!("Scene identifier: {}", scenes.join(", "))),
            )]),
        ),
        ClientTool::client(
            "suggest_actions",
            "Offer 3 action choices after asking a question. Always provide exactly 3 options.",
            ToolParameters::required([(
                "actions".to_string(),
                ParameterSchema::array(
                    ParameterSchema::string("A short action phrase"),
                    "Exactly 3 short action phrases with emoji prefix",
                ),
            )]),
        ),
        ClientTool::client(
            "generate_image",
            "Generate illustration for current scene. Call after change_scene.",
            ToolParameters::required([(
                "prompt".to_string(),
                ParameterSchema::string(
                    "Detailed image prompt including scene, characters, and current action",
                ),
            )]),
        ),
        ClientTool::client(
            "session_end",
            "End the story session. Call when story concludes or child says goodbye.",
            ToolParameters::required([(
                "summary".to_string(),
                ParameterSchema::string("Personalized summary of child's journey for resume context"),
            )]),
        ),
    ]
}
