//! Timestamped activity log shown to the user

use chrono::Local;
use std::collections::VecDeque;
use std::io::Write;

/// Oldest lines are dropped beyond this
const MAX_LINES: usize = 1000;

/// User-facing log of actions and device traffic.
///
/// Lines are stamped `[HH:MM:SS]` and, when echo is on, printed as they are
/// added.
pub struct ActivityLog {
    lines: VecDeque<String>,
    echo: bool,
}

impl ActivityLog {
    pub fn new(echo: bool) -> Self {
        Self {
            lines: VecDeque::new(),
            echo,
        }
    }

    pub fn append(&mut self, text: impl AsRef<str>) {
        let line = format!("[{}] {}", Local::now().format("%H:%M:%S"), text.as_ref());
        if self.echo {
            // \r overwrites a pending timer line
            println!("\r{}", line);
        }
        if self.lines.len() == MAX_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Show a message without recording it
    pub fn notice(&self, text: impl AsRef<str>) {
        if self.echo {
            println!("\r{}", text.as_ref());
        }
    }

    /// Redraw the countdown in place
    pub fn show_timer(&self, display: &str) {
        if self.echo {
            print!("\rTimer {} ", display);
            let _ = std::io::stdout().flush();
        }
    }

    /// Print every retained line
    pub fn replay(&self) {
        for line in &self.lines {
            println!("{}", line);
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
