//! Idempotent deployment of story agents.
//!
//! The [`Synchronizer`] keeps the platform in step with local story
//! definitions. A deploy loads the story's configuration, fingerprints it and
//! compares the fingerprint with the [`Registry`](storili_registry::Registry):
//!
//! | Registry entry | Fingerprint | Remote call |
//! |----------------|-------------|-------------|
//! | absent         | -           | `create`    |
//! | present        | differs     | `update`    |
//! | present        | equal       | none        |
//!
//! The registry is only written after the remote call succeeds, so it never
//! records a deploy that did not happen.

pub mod config;
mod confirm;
mod error;
pub mod report;
mod synchronizer;

pub use confirm::{Confirm, PromptConfirm, CONFIRM_WORD};
pub use error::DeployError;
pub use synchronizer::{
    AgentHealth, AuditRow, DeleteOutcome, DeployAction, DeployBatch, DeployReport, ProxyBindings,
    RemoteListing, Synchronizer, status_rows,
};
