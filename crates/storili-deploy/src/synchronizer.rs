use crate::{Confirm, DeployError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use storili_platform::{AgentPlatform, PlatformError};
use storili_registry::{Registry, RegistryEntry};
use storili_stories::ConfigSource;
use storili_types::{fingerprint, ConfigFingerprint, StoryId};

/// What a deploy did on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployAction {
    Created,
    Updated,
    /// The fingerprint matched the registry; no remote call was made.
    Unchanged,
}

impl fmt::Display for DeployAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeployAction::Created => "created",
            DeployAction::Updated => "updated",
            DeployAction::Unchanged => "unchanged",
        };
        f.write_str(label)
    }
}

/// Result of deploying one story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub story_id: StoryId,
    pub agent_id: String,
    pub action: DeployAction,
    pub fingerprint: ConfigFingerprint,
}

/// Outcome of deploying several stories in order.
///
/// `reports` holds every story deployed before `failure`, so callers can
/// report agents that were created even when a later story fails.
#[derive(Debug)]
pub struct DeployBatch {
    pub reports: Vec<DeployReport>,
    pub failure: Option<DeployError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { story_id: StoryId },
    /// The operator declined; nothing was touched.
    Cancelled { story_id: StoryId },
}

/// Remote state of a registered agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentHealth {
    Live,
    /// The platform reports the agent does not exist.
    Missing,
    /// The platform could not be asked.
    Unreachable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRow {
    pub story_id: StoryId,
    pub entry: RegistryEntry,
    pub health: AgentHealth,
}

/// A platform agent and the story tracking it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteListing {
    pub agent_id: String,
    pub name: String,
    pub story_id: Option<StoryId>,
}

/// The proxy's access table, derived from the registry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ProxyBindings {
    access: AccessTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
struct AccessTable {
    bindings: BTreeMap<StoryId, String>,
}

impl ProxyBindings {
    /// Binds every registered story to its agent.
    pub fn from_registry(registry: &Registry) -> Self {
        Self {
            access: AccessTable {
                bindings: registry
                    .entries()
                    .map(|(id, entry)| (id.clone(), entry.agent_id.clone()))
                    .collect(),
            },
        }
    }

    pub fn bindings(&self) -> &BTreeMap<StoryId, String> {
        &self.access.bindings
    }

    /// Renders the `[access.bindings]` table of the proxy configuration.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

/// Drives story deploys against the platform and records them in the registry.
pub struct Synchronizer<S, P> {
    source: S,
    platform: P,
    registry: Registry,
}

impl<S: ConfigSource, P: AgentPlatform> Synchronizer<S, P> {
    pub fn new(source: S, platform: P, registry: Registry) -> Self {
        Self {
            source,
            platform,
            registry,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Brings one story's remote agent in line with its local definition.
    ///
    /// At most one remote call is made, and only when the configuration
    /// fingerprint differs from the registered one.
    ///
    /// # Errors
    ///
    /// - `ConfigNotFound` if the story has no definition.
    /// - `RemoteCallFailed` if the platform call fails; the registry is left
    ///   exactly as it was.
    /// - `Registry` if the platform call succeeded but the registry could not
    ///   be written. The remote change stands; the error names the agent.
    pub async fn deploy(&mut self, story_id: &StoryId) -> Result<DeployReport, DeployError> {
        let config = self.source.load(story_id)?;
        let fresh = fingerprint(&config)?;

        let existing = self.registry.get(story_id).cloned();
        let (action, agent_id) = match existing {
            Some(entry) if entry.config_hash == fresh => {
                tracing::info!(
                    story_id = %story_id,
                    agent_id = %entry.agent_id,
                    "story unchanged, skipping deploy"
                );
                return Ok(DeployReport {
                    story_id: story_id.clone(),
                    agent_id: entry.agent_id,
                    action: DeployAction::Unchanged,
                    fingerprint: fresh,
                });
            }
            Some(entry) => {
                self.platform
                    .update_agent(&entry.agent_id, &config)
                    .await
                    .map_err(|source| remote_failed(story_id.as_str(), source))?;
                (DeployAction::Updated, entry.agent_id)
            }
            None => {
                let agent_id = self
                    .platform
                    .create_agent(&config)
                    .await
                    .map_err(|source| remote_failed(story_id.as_str(), source))?;
                (DeployAction::Created, agent_id)
            }
        };

        let entry = RegistryEntry::deployed_now(agent_id.clone(), fresh.clone());
        if let Err(e) = self.registry.put(story_id.clone(), entry) {
            tracing::error!(
                story_id = %story_id,
                agent_id = %agent_id,
                %action,
                "platform accepted the deploy but the registry write failed: {}",
                e
            );
            return Err(e.into());
        }

        tracing::info!(
            story_id = %story_id,
            agent_id = %agent_id,
            %action,
            fingerprint = %fresh.short(),
            "deployed story"
        );
        Ok(DeployReport {
            story_id: story_id.clone(),
            agent_id,
            action,
            fingerprint: fresh,
        })
    }

    /// Deploys `story_ids` in order, stopping at the first failure.
    pub async fn deploy_many(&mut self, story_ids: &[StoryId]) -> DeployBatch {
        let mut reports = Vec::with_capacity(story_ids.len());
        for story_id in story_ids {
            match self.deploy(story_id).await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    return DeployBatch {
                        reports,
                        failure: Some(e),
                    }
                }
            }
        }
        DeployBatch {
            reports,
            failure: None,
        }
    }

    /// Deploys every story the source defines, stopping at the first failure.
    pub async fn deploy_all(&mut self) -> Result<Vec<DeployReport>, DeployError> {
        let story_ids = self.source.story_ids()?;
        let batch = self.deploy_many(&story_ids).await;
        match batch.failure {
            Some(e) => Err(e),
            None => Ok(batch.reports),
        }
    }

    /// Deletes a registered agent from the platform after confirmation.
    ///
    /// The registry entry is removed only once the platform confirms the
    /// delete. Declining the confirmation makes no remote call.
    ///
    /// # Errors
    ///
    /// - `UnknownAgent` if no story maps to `agent_id`; nothing is called.
    /// - `RemoteCallFailed` if the platform delete fails; the entry stays.
    pub async fn delete(
        &mut self,
        agent_id: &str,
        confirm: &mut impl Confirm,
    ) -> Result<DeleteOutcome, DeployError> {
        let story_id = self
            .registry
            .find_by_agent(agent_id)
            .map(|(story_id, _)| story_id.clone())
            .ok_or_else(|| DeployError::UnknownAgent(agent_id.to_string()))?;

        if !confirm
            .confirm(&story_id, agent_id)
            .map_err(DeployError::Confirmation)?
        {
            tracing::info!(story_id = %story_id, agent_id, "delete cancelled by operator");
            return Ok(DeleteOutcome::Cancelled { story_id });
        }

        self.platform
            .delete_agent(agent_id)
            .await
            .map_err(|source| remote_failed(agent_id, source))?;

        if let Err(e) = self.registry.remove(&story_id) {
            tracing::error!(
                story_id = %story_id,
                agent_id,
                "platform deleted the agent but the registry write failed: {}",
                e
            );
            return Err(e.into());
        }

        tracing::info!(story_id = %story_id, agent_id, "deleted story agent");
        Ok(DeleteOutcome::Deleted { story_id })
    }

    /// Registered deployments in story order.
    pub fn status(&self) -> Vec<(StoryId, RegistryEntry)> {
        status_rows(&self.registry)
    }

    /// Checks that every registered agent still exists on the platform.
    ///
    /// Read-only: missing agents are reported, not removed.
    pub async fn audit(&self) -> Vec<AuditRow> {
        let mut rows = Vec::with_capacity(self.registry.len());
        for (story_id, entry) in self.registry.entries() {
            let health = match self.platform.get_agent(&entry.agent_id).await {
                Ok(_) => AgentHealth::Live,
                Err(e) if e.is_not_found() => {
                    tracing::warn!(
                        story_id = %story_id,
                        agent_id = %entry.agent_id,
                        "registered agent is missing on the platform"
                    );
                    AgentHealth::Missing
                }
                Err(e) => AgentHealth::Unreachable(e.to_string()),
            };
            rows.push(AuditRow {
                story_id: story_id.clone(),
                entry: entry.clone(),
                health,
            });
        }
        rows
    }

    /// Lists platform agents, marking which story (if any) tracks each one.
    pub async fn remote_agents(&self) -> Result<Vec<RemoteListing>, DeployError> {
        let agents = self
            .platform
            .list_agents()
            .await
            .map_err(|source| remote_failed("agent listing", source))?;

        Ok(agents
            .into_iter()
            .map(|agent| {
                let story_id = self
                    .registry
                    .find_by_agent(&agent.agent_id)
                    .map(|(id, _)| id.clone());
                RemoteListing {
                    agent_id: agent.agent_id,
                    name: agent.name,
                    story_id,
                }
            })
            .collect())
    }

    /// The proxy access table matching the current registry.
    pub fn bindings(&self) -> ProxyBindings {
        ProxyBindings::from_registry(&self.registry)
    }
}

/// Registered deployments in story order, read without touching the platform.
pub fn status_rows(registry: &Registry) -> Vec<(StoryId, RegistryEntry)> {
    registry
        .entries()
        .map(|(id, entry)| (id.clone(), entry.clone()))
        .collect()
}

fn remote_failed(target: &str, source: PlatformError) -> DeployError {
    DeployError::RemoteCallFailed {
        target: target.to_string(),
        source,
    }
}
