//! Which caller-supplied identifiers the proxy will resolve.

use crate::config::{AccessConfig, ConfigError};
use std::collections::{BTreeMap, BTreeSet};
use storili_types::StoryId;

/// An identifier as named by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identifier<'a> {
    /// Public story id, resolved through the bindings table.
    Story(&'a str),
    /// Platform agent id, checked against the allowlist.
    Agent(&'a str),
}

/// Immutable access table, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    bindings: BTreeMap<StoryId, String>,
    allowed_agents: BTreeSet<String>,
}

impl AccessPolicy {
    /// Builds a policy. Every binding target is also allowed by agent id.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBinding` for blank agent ids.
    pub fn new(
        bindings: BTreeMap<StoryId, String>,
        allowed_agents: impl IntoIterator<Item = String>,
    ) -> Result<Self, ConfigError> {
        let mut allowed: BTreeSet<String> = BTreeSet::new();
        for agent_id in allowed_agents {
            allowed.insert(checked_agent(agent_id)?);
        }
        for (story_id, agent_id) in &bindings {
            if agent_id.trim().is_empty() {
                return Err(ConfigError::InvalidBinding(format!(
                    "story {story_id} is bound to an empty agent id"
                )));
            }
            allowed.insert(agent_id.clone());
        }
        Ok(Self {
            bindings,
            allowed_agents: allowed,
        })
    }

    /// Validates the raw table from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBinding` for malformed story ids or blank
    /// agent ids.
    pub fn from_config(access: &AccessConfig) -> Result<Self, ConfigError> {
        let mut bindings = BTreeMap::new();
        for (story, agent_id) in &access.bindings {
            let story_id = StoryId::new(story.as_str())
                .map_err(|e| ConfigError::InvalidBinding(e.to_string()))?;
            bindings.insert(story_id, agent_id.trim().to_string());
        }
        Self::new(bindings, access.allowed_agents.iter().cloned())
    }

    /// The platform agent id for `identifier`, if the policy allows it.
    ///
    /// Malformed and unprovisioned identifiers are indistinguishable here.
    pub fn resolve(&self, identifier: Identifier<'_>) -> Option<&str> {
        match identifier {
            Identifier::Story(story) => {
                let story_id = StoryId::new(story).ok()?;
                self.bindings.get(&story_id).map(String::as_str)
            }
            Identifier::Agent(agent_id) => self
                .allowed_agents
                .get(agent_id)
                .map(String::as_str),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.allowed_agents.is_empty()
    }

    pub fn story_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn agent_count(&self) -> usize {
        self.allowed_agents.len()
    }
}

fn checked_agent(agent_id: String) -> Result<String, ConfigError> {
    let trimmed = agent_id.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidBinding(
            "allowed agent id is empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AccessPolicy {
        let access = AccessConfig {
            bindings: [("story-a".to_string(), "agent-a".to_string())]
                .into_iter()
                .collect(),
            allowed_agents: vec!["agent-direct".to_string()],
        };
        AccessPolicy::from_config(&access).unwrap()
    }

    #[test]
    fn resolves_bound_stories_and_allowed_agents() {
        let policy = policy();
        assert_eq!(policy.resolve(Identifier::Story("story-a")), Some("agent-a"));
        assert_eq!(
            policy.resolve(Identifier::Agent("agent-direct")),
            Some("agent-direct")
        );
        // Binding targets are implicitly allowed.
        assert_eq!(policy.resolve(Identifier::Agent("agent-a")), Some("agent-a"));
    }

    #[test]
    fn unknown_and_malformed_identifiers_do_not_resolve() {
        let policy = policy();
        assert_eq!(policy.resolve(Identifier::Story("story-z")), None);
        assert_eq!(policy.resolve(Identifier::Story("../etc/passwd")), None);
        assert_eq!(policy.resolve(Identifier::Story("")), None);
        assert_eq!(policy.resolve(Identifier::Agent("agent-z")), None);
        // A story id is not an agent id.
        assert_eq!(policy.resolve(Identifier::Agent("story-a")), None);
    }

    #[test]
    fn invalid_tables_are_rejected() {
        let bad_story = AccessConfig {
            bindings: [("Bad Story".to_string(), "agent-a".to_string())]
                .into_iter()
                .collect(),
            allowed_agents: Vec::new(),
        };
        assert!(AccessPolicy::from_config(&bad_story).is_err());

        let blank_agent = AccessConfig {
            bindings: [("story-a".to_string(), "  ".to_string())]
                .into_iter()
                .collect(),
            allowed_agents: Vec::new(),
        };
        assert!(AccessPolicy::from_config(&blank_agent).is_err());

        let blank_allowed = AccessConfig {
            bindings: BTreeMap::new(),
            allowed_agents: vec![String::new()],
        };
        assert!(AccessPolicy::from_config(&blank_allowed).is_err());
    }
}
