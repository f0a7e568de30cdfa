//! Clips - Configuration module

pub mod settings;

pub use settings::{data_dir, Settings, SETTINGS_KEY};
