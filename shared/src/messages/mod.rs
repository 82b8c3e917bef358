//! Messages exchanged with the presentation and persistence collaborators

pub mod notifications;
pub mod snapshot;

pub use notifications::{Notification, RenderTarget};
pub use snapshot::{StateSnapshot, SNAPSHOT_SCHEMA_VERSION};
