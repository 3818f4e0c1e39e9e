//! User-configurable round and mode settings

use serde::{Deserialize, Serialize};

/// Persisted panel settings.
///
/// Missing keys in a stored file fall back to their defaults, so older files
/// keep loading after a field is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Round duration in seconds (at least 1)
    pub round_time_seconds: u32,
    /// Lock duration in seconds pushed to the device
    pub lock_time_seconds: u32,
    /// Whether the device blocks input after a round ends
    pub block_after_round: bool,
    /// Character sent for mode A
    pub mode_a_code: char,
    /// Character sent for mode B
    pub mode_b_code: char,
}

pub const DEFAULT_ROUND_TIME_SECONDS: u32 = 60;
pub const DEFAULT_LOCK_TIME_SECONDS: u32 = 6;
pub const DEFAULT_MODE_A_CODE: char = 'b';
pub const DEFAULT_MODE_B_CODE: char = 'p';

impl Default for Settings {
    fn default() -> Self {
        Self {
            round_time_seconds: DEFAULT_ROUND_TIME_SECONDS,
            lock_time_seconds: DEFAULT_LOCK_TIME_SECONDS,
            block_after_round: true,
            mode_a_code: DEFAULT_MODE_A_CODE,
            mode_b_code: DEFAULT_MODE_B_CODE,
        }
    }
}

impl Settings {
    /// Enforce the field invariants (round time of at least one second)
    pub fn sanitized(mut self) -> Self {
        self.round_time_seconds = self.round_time_seconds.max(1);
        self
    }

    /// Code character for the given mode slot
    pub fn mode_code(&self, slot: ModeSlot) -> char {
        match slot {
            ModeSlot::A => self.mode_a_code,
            ModeSlot::B => self.mode_b_code,
        }
    }

    /// One-line summary used in the activity log
    pub fn summary(&self) -> String {
        format!(
            "Round={}s, Lock={}s, BlockAfter={}, ModeA='{}', ModeB='{}'",
            self.round_time_seconds,
            self.lock_time_seconds,
            self.block_after_round,
            self.mode_a_code,
            self.mode_b_code
        )
    }
}

/// The two configurable device modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeSlot {
    A,
    B,
}

impl ModeSlot {
    pub fn label(&self) -> &'static str {
        match self {
            ModeSlot::A => "A",
            ModeSlot::B => "B",
        }
    }
}
