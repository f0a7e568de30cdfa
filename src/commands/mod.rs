//! Clips - Command surface for UI collaborators

pub mod handlers;

pub use handlers::{CommandResult, Commands, SettingsUpdate};
