//! Service implementations
//!
//! Real implementations of the collaborator traits. These are the ones the
//! binary wires in; tests use the mocks from `traits`.

pub mod clock;
pub mod console_notifier;
pub mod file_store;
pub mod manual_location;

#[cfg(test)]
mod tests;

pub use clock::{ManualClock, SystemClock};
pub use console_notifier::ConsoleNotifier;
pub use file_store::JsonFileStore;
pub use manual_location::ManualLocationProvider;
