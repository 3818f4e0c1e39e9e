//! round-panel-types: Shared data types for the round-panel control panel.
//!
//! Pure data (settings, color table, round countdown, port events) shared by
//! the protocol crate and the application. No I/O lives here.

pub mod color;
pub mod event;
pub mod round;
pub mod settings;

// Re-export commonly used types at the crate root for convenience
pub use color::ColorTable;
pub use event::PortEvent;
pub use round::{format_mm_ss, RoundState, TickOutcome, TICK_INTERVAL};
pub use settings::{ModeSlot, Settings};
