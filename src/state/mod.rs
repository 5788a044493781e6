//! Durable record of what the installer put on this host.

pub mod store;

pub use store::{InstallationState, STATE_FILE_NAME};
