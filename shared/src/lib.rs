//! Shared types for the local marketplace simulator
//!
//! Holds the persisted data model, the messages pushed to the presentation
//! layer, and the logging helpers used by every crate in the workspace.

pub mod errors;
pub mod logging;
pub mod messages;
pub mod types;

pub use errors::*;
pub use types::*;

pub use messages::{Notification, RenderTarget, StateSnapshot, SNAPSHOT_SCHEMA_VERSION};
