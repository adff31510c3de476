//! Story definitions and their assembly into platform agent configurations.
//!
//! Every story shares one agent schema: the same client tools, the same
//! workflow skeleton and the same voice plumbing. What differs per story is
//! data, captured in a [`StoryRecord`] (one TOML file per story). The
//! [`ConfigSource`] trait resolves a [`StoryId`](storili_types::StoryId) to a
//! ready-to-deploy [`AgentConfig`](storili_types::AgentConfig).

mod error;
mod record;
mod source;

pub use error::LoadError;
pub use record::{build_agent_config, CharacterVoice, NarratorVoice, StoryRecord, TurnRecord};
pub use source::{ConfigSource, StoryCatalog, StoryDirectory};
