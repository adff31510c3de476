//! Client for the conversational-AI platform that hosts story agents.
//!
//! The [`ElevenLabsClient`] wraps the platform's agent management and
//! conversation credential endpoints. Callers depend on the narrower
//! [`AgentPlatform`] and [`TokenIssuer`] traits so tests can substitute
//! in-process stubs.
//!
//! Every request carries the server-held API key in the `xi-api-key` header.
//! The key never appears in logs or `Debug` output.
//!
//! # Retries
//!
//! Reads (`get`, `list`) and credential issuance are retried with exponential
//! backoff on transport errors, `429` and `5xx`. Create, update and delete are
//! attempted exactly once: a retried create could leave a duplicate agent
//! behind on the platform.

mod client;
mod config;
mod error;
mod platform;

pub use client::ElevenLabsClient;
pub use config::{PlatformConfig, DEFAULT_BASE_URL};
pub use error::{Operation, PlatformError};
pub use platform::{AgentPlatform, AgentSummary, CredentialKind, RemoteAgent, TokenIssuer};
