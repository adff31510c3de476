use crate::platform::{AgentPlatform, AgentSummary, CredentialKind, RemoteAgent, TokenIssuer};
use crate::{Operation, PlatformConfig, PlatformError};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use storili_types::AgentConfig;

/// Header carrying the API key.
const API_KEY_HEADER: &str = "xi-api-key";

#[derive(Deserialize)]
struct CreateAgentResponse {
    agent_id: String,
}

#[derive(Deserialize)]
struct ListAgentsResponse {
    #[serde(default)]
    agents: Vec<AgentSummary>,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Deserialize)]
struct SignedUrlResponse {
    signed_url: String,
}

/// HTTP client for the platform's `convai` API.
#[derive(Debug, Clone)]
pub struct ElevenLabsClient {
    http: reqwest::Client,
    base_url: Url,
    config: PlatformConfig,
}

impl ElevenLabsClient {
    /// Builds a client with the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Config` if the API key is empty or the base URL
    /// cannot be parsed.
    pub fn new(config: PlatformConfig) -> Result<Self, PlatformError> {
        if config.api_key.trim().is_empty() {
            return Err(PlatformError::Config("API key is empty".to_string()));
        }
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| PlatformError::Config(format!("invalid base url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(PlatformError::Config(format!(
                "base url {} cannot carry a path",
                config.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("storili/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PlatformError::Config(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            config,
        })
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header(API_KEY_HEADER, &self.config.api_key)
    }

    /// Sends once and maps non-success statuses to `PlatformError::Remote`.
    async fn send(
        &self,
        operation: Operation,
        request: RequestBuilder,
    ) -> Result<Response, PlatformError> {
        let response = request
            .send()
            .await
            .map_err(|source| PlatformError::Transport { operation, source })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(PlatformError::remote(operation, status.as_u16(), body))
    }

    /// Runs an idempotent request, retrying transient failures with backoff.
    async fn with_retry<T, F, Fut>(
        &self,
        operation: Operation,
        mut attempt_fn: F,
    ) -> Result<T, PlatformError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PlatformError>>,
    {
        debug_assert!(operation.is_idempotent());
        let mut attempt = 0;
        loop {
            match attempt_fn().await {
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    let delay = self.config.backoff(attempt);
                    tracing::warn!(
                        %operation,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "transient platform failure, retrying: {}",
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn read_json<T: DeserializeOwned>(
        operation: Operation,
        response: Response,
    ) -> Result<T, PlatformError> {
        response.json::<T>().await.map_err(|e| PlatformError::Decode {
            operation,
            reason: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: Operation,
        url: Url,
    ) -> Result<T, PlatformError> {
        self.with_retry(operation, || {
            let request = self.request(Method::GET, url.clone());
            async move {
                let response = self.send(operation, request).await?;
                Self::read_json(operation, response).await
            }
        })
        .await
    }
}

impl AgentPlatform for ElevenLabsClient {
    async fn create_agent(&self, config: &AgentConfig) -> Result<String, PlatformError> {
        let operation = Operation::CreateAgent;
        let url = self.endpoint(&["convai", "agents", "create"]);
        let request = self.request(Method::POST, url).json(config);
        let response = self.send(operation, request).await?;
        let created: CreateAgentResponse = Self::read_json(operation, response).await?;
        tracing::info!(agent_id = %created.agent_id, name = %config.name, "created agent");
        Ok(created.agent_id)
    }

    async fn update_agent(
        &self,
        agent_id: &str,
        config: &AgentConfig,
    ) -> Result<(), PlatformError> {
        let url = self.endpoint(&["convai", "agents", agent_id]);
        let request = self.request(Method::PATCH, url).json(config);
        self.send(Operation::UpdateAgent, request).await?;
        tracing::info!(agent_id, name = %config.name, "updated agent");
        Ok(())
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<(), PlatformError> {
        let url = self.endpoint(&["convai", "agents", agent_id]);
        let request = self.request(Method::DELETE, url);
        self.send(Operation::DeleteAgent, request).await?;
        tracing::info!(agent_id, "deleted agent");
        Ok(())
    }

    async fn get_agent(&self, agent_id: &str) -> Result<RemoteAgent, PlatformError> {
        let operation = Operation::GetAgent;
        let url = self.endpoint(&["convai", "agents", agent_id]);
        let document: serde_json::Value = self.get_json(operation, url).await?;
        if !document.is_object() {
            return Err(PlatformError::Decode {
                operation,
                reason: "agent document is not a JSON object".to_string(),
            });
        }

        let reported_id = document
            .get("agent_id")
            .and_then(|v| v.as_str())
            .unwrap_or(agent_id)
            .to_string();
        let name = document
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        Ok(RemoteAgent {
            agent_id: reported_id,
            name,
            document,
        })
    }

    async fn list_agents(&self) -> Result<Vec<AgentSummary>, PlatformError> {
        let url = self.endpoint(&["convai", "agents"]);
        let listing: ListAgentsResponse = self.get_json(Operation::ListAgents, url).await?;
        Ok(listing.agents)
    }
}

impl TokenIssuer for ElevenLabsClient {
    async fn issue_credential(
        &self,
        agent_id: &str,
        kind: CredentialKind,
    ) -> Result<String, PlatformError> {
        let (operation, endpoint) = match kind {
            CredentialKind::Token => (Operation::IssueToken, "token"),
            CredentialKind::SignedUrl => (Operation::IssueSignedUrl, "get-signed-url"),
        };
        let mut url = self.endpoint(&["convai", "conversation", endpoint]);
        url.query_pairs_mut().append_pair("agent_id", agent_id);

        match kind {
            CredentialKind::Token => {
                let body: TokenResponse = self.get_json(operation, url).await?;
                Ok(body.token)
            }
            CredentialKind::SignedUrl => {
                let body: SignedUrlResponse = self.get_json(operation, url).await?;
                Ok(body.signed_url)
            }
        }
    }
}
