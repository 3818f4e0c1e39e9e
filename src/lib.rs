//! round-panel: serial control panel for timed game rounds
//!
//! This library provides:
//! - A port session that owns the serial connection and its reader thread
//! - The round controller (countdown, mode commands, first-color capture)
//! - Settings persistence
//! - The console front end

pub mod config;
pub mod core;
pub mod serial;
pub mod ui;

// Re-export commonly used types
pub use config::SettingsStore;
pub use core::RoundController;
pub use serial::{PortSession, SerialPortConnector};
pub use ui::App;
