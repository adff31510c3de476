//! Local record of which stories are deployed, where, and with what content.
//!
//! The registry is a single JSON document keyed by story identifier. It is the
//! sole source of truth for "is story X deployed, to which remote agent, with
//! which configuration fingerprint".
//!
//! # Design decisions
//!
//! - **Whole-document persistence**: every mutation rewrites the file. Writes
//!   go to a temporary file in the same directory which is then renamed over
//!   the target, so a crash never leaves a half-written document.
//! - **Single writer**: there is no locking. Two concurrent operator commands
//!   can race and the last writer wins.
//! - **Corruption is not fatal**: an unreadable document loads as an empty
//!   registry with a warning, so deploys stay available.

mod error;
mod registry;

pub use error::RegistryError;
pub use registry::{Registry, RegistryEntry};
