//! Round countdown state

use std::time::Duration;

/// Interval between countdown ticks
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Result of advancing the countdown by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No round is running
    Idle,
    /// The round continues with this much time left
    Running(Duration),
    /// This tick ended the round
    Finished,
}

/// Local countdown for the round currently running on the device
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundState {
    remaining: Duration,
    active: bool,
    first_color: Option<String>,
}

impl RoundState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset for a fresh round of `seconds` length
    pub fn start(&mut self, seconds: u32) {
        self.remaining = Duration::from_secs(u64::from(seconds));
        self.first_color = None;
        self.active = true;
    }

    /// Stop without waiting for the countdown
    pub fn stop(&mut self) {
        self.active = false;
    }

    /// Advance by one tick.
    ///
    /// The tick that would leave one second or less on the clock ends the
    /// round, so the display reads `00:00` one tick before a plain countdown
    /// would reach zero.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.active {
            return TickOutcome::Idle;
        }

        let next = self.remaining.saturating_sub(TICK_INTERVAL);
        if next <= TICK_INTERVAL {
            self.active = false;
            self.remaining = Duration::ZERO;
            TickOutcome::Finished
        } else {
            self.remaining = next;
            TickOutcome::Running(next)
        }
    }

    /// Latch the first color of the round. Returns false if one was already
    /// captured or no round is running.
    pub fn capture_first_color(&mut self, name: &str) -> bool {
        if !self.accepts_color() {
            return false;
        }
        self.first_color = Some(name.to_string());
        true
    }

    /// True while a round runs and no color has been captured yet
    pub fn accepts_color(&self) -> bool {
        self.active && self.first_color.is_none()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn first_color_captured(&self) -> bool {
        self.first_color.is_some()
    }

    pub fn first_color(&self) -> Option<&str> {
        self.first_color.as_deref()
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Remaining time as `MM:SS`
    pub fn display_string(&self) -> String {
        format_mm_ss(self.remaining)
    }
}

/// Format a duration as `MM:SS`; minutes keep counting past 59
pub fn format_mm_ss(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}
