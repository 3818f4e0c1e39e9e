//! Configuration management

mod settings;

pub use settings::{load_color_table, SettingsStore};
