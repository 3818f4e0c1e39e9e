//! round-panel-core: Wire protocol, link traits and errors for round-panel.
//!
//! This crate holds what the session and controller agree on: the command
//! encoding, the `Link`/`Connector` seam to the transport, the shared error
//! type, and an in-memory device for exercising all of it.

pub mod error;
pub mod link;
pub mod protocol;
pub mod sim;

pub use error::{PanelError, Result};
pub use link::{Connector, LineSettings, Link, DEFAULT_BAUD_RATE, READ_POLL_INTERVAL};
pub use protocol::{Command, SettingIndex};

// Re-export types used in trait signatures for convenience
pub use round_panel_types::{ColorTable, PortEvent, Settings};
