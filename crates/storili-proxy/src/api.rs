//! Token issuance handler.

use crate::policy::Identifier;
use crate::ProxyState;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Extension},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use storili_platform::{PlatformError, TokenIssuer};
use thiserror::Error;

/// Body fields naming a story, in precedence order.
const STORY_FIELDS: [&str; 2] = ["storyId", "story_id"];

/// Body fields naming an agent directly.
const AGENT_FIELDS: [&str; 2] = ["agentId", "agent_id"];

/// Errors returned to callers. Bodies never carry internal detail.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("missing identifier")]
    MissingIdentifier,
    /// Not provisioned or malformed; callers cannot tell which.
    #[error("unknown identifier")]
    UnknownIdentifier,
    #[error("token generation failed")]
    Upstream(#[source] PlatformError),
    #[error("internal error")]
    Internal,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match self {
            ProxyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::MissingIdentifier | ProxyError::UnknownIdentifier => {
                StatusCode::BAD_REQUEST
            }
            ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

/// Pulls the caller's identifier out of a JSON object body.
///
/// A story field wins over an agent field; a present but non-string field
/// counts as missing.
fn identifier(body: &Value) -> Option<Identifier<'_>> {
    let object = body.as_object()?;
    if let Some(value) = STORY_FIELDS.iter().find_map(|field| object.get(*field)) {
        return value.as_str().map(Identifier::Story);
    }
    AGENT_FIELDS
        .iter()
        .find_map(|field| object.get(*field))
        .and_then(Value::as_str)
        .map(Identifier::Agent)
}

/// Handler for `POST /`.
///
/// Resolves the identifier against the access policy and relays a credential
/// request upstream. Only the credential field is returned. A body that
/// cannot be read, including one over the size limit, counts as missing.
pub async fn issue_handler<T: TokenIssuer + 'static>(
    Extension(state): Extension<Arc<ProxyState<T>>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, ProxyError> {
    let body = body.map_err(|rejection| {
        tracing::debug!(status = %rejection.status(), "rejected unreadable body: {}", rejection);
        ProxyError::MissingIdentifier
    })?;
    let payload: Value =
        serde_json::from_slice(&body).map_err(|_| ProxyError::MissingIdentifier)?;
    let identifier = identifier(&payload).ok_or(ProxyError::MissingIdentifier)?;

    let agent_id = state.policy.resolve(identifier).ok_or_else(|| {
        tracing::debug!(?identifier, "rejected unresolvable identifier");
        ProxyError::UnknownIdentifier
    })?;

    let credential = state
        .issuer
        .issue_credential(agent_id, state.kind)
        .await
        .map_err(|e| {
            tracing::error!(
                agent_id,
                status = ?e.status(),
                "upstream credential request failed: {}",
                e
            );
            ProxyError::Upstream(e)
        })?;

    let mut response = Map::new();
    response.insert(state.kind.field_name().to_string(), Value::String(credential));
    Ok(Json(Value::Object(response)))
}

/// Answers every method other than `POST` and `OPTIONS` on the token route.
pub async fn method_not_allowed() -> ProxyError {
    ProxyError::MethodNotAllowed
}
