//! Console command parsing

use round_panel_types::{ModeSlot, Settings};

/// Token injected by `simulate` when none is given
pub const DEFAULT_SIMULATED_TOKEN: &str = "01";

pub const HELP_TEXT: &str = "\
Commands:
  ports                 refresh and list serial ports
  connect [PORT]        connect to PORT or the selected port
  disconnect            close the port
  start                 start a round
  a | b                 send mode A / mode B
  simulate [TOKEN]      inject an inbound token (default 01)
  settings              show current settings
  save KEY=VALUE ...    edit and save settings (round, lock, block, a, b)
  status                connection, timer, first color, mode
  log | clear           print / clear the activity log
  about | help | quit";

/// One parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Empty,
    Ports,
    Connect(Option<String>),
    Disconnect,
    Start,
    Mode(ModeSlot),
    Simulate(String),
    ShowSettings,
    Save(Vec<(String, String)>),
    Status,
    Log,
    Clear,
    About,
    Help,
    Quit,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(ConsoleCommand::Empty);
        };
        let rest: Vec<&str> = words.collect();

        let command = match head.to_ascii_lowercase().as_str() {
            "ports" | "refresh" => ConsoleCommand::Ports,
            "connect" | "open" => ConsoleCommand::Connect(rest.first().map(|s| s.to_string())),
            "disconnect" | "close" => ConsoleCommand::Disconnect,
            "start" | "round" => ConsoleCommand::Start,
            "a" => ConsoleCommand::Mode(ModeSlot::A),
            "b" => ConsoleCommand::Mode(ModeSlot::B),
            "mode" => match rest.first().map(|s| s.to_ascii_lowercase()).as_deref() {
                Some("a") => ConsoleCommand::Mode(ModeSlot::A),
                Some("b") => ConsoleCommand::Mode(ModeSlot::B),
                _ => return Err("Usage: mode a|b".to_string()),
            },
            "simulate" | "sim" => ConsoleCommand::Simulate(
                rest.first()
                    .copied()
                    .unwrap_or(DEFAULT_SIMULATED_TOKEN)
                    .to_string(),
            ),
            "settings" => ConsoleCommand::ShowSettings,
            "save" => {
                let edits = rest
                    .iter()
                    .map(|pair| {
                        pair.split_once('=')
                            .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                            .ok_or_else(|| format!("Expected KEY=VALUE, got: {}", pair))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                ConsoleCommand::Save(edits)
            }
            "status" => ConsoleCommand::Status,
            "log" => ConsoleCommand::Log,
            "clear" => ConsoleCommand::Clear,
            "about" => ConsoleCommand::About,
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" | "q" => ConsoleCommand::Quit,
            other => return Err(format!("Unknown command: {} (try `help`)", other)),
        };
        Ok(command)
    }
}

/// Apply `save` edits to a copy of `current`.
///
/// Numbers that do not parse keep their old value; round time is raised to
/// at least 1 and lock time to at least 0. Mode codes take the first
/// non-blank character.
pub fn apply_edits(current: &Settings, edits: &[(String, String)]) -> Result<Settings, String> {
    let mut settings = current.clone();
    for (key, value) in edits {
        match key.as_str() {
            "round" => {
                if let Some(seconds) = parse_seconds(value) {
                    settings.round_time_seconds = seconds.max(1);
                }
            }
            "lock" => {
                if let Some(seconds) = parse_seconds(value) {
                    settings.lock_time_seconds = seconds;
                }
            }
            "block" => {
                settings.block_after_round = parse_flag(value)
                    .ok_or_else(|| format!("Invalid value for block: {}", value))?;
            }
            "a" => {
                if let Some(code) = value.trim().chars().next() {
                    settings.mode_a_code = code;
                }
            }
            "b" => {
                if let Some(code) = value.trim().chars().next() {
                    settings.mode_b_code = code;
                }
            }
            other => return Err(format!("Unknown setting: {}", other)),
        }
    }
    Ok(settings)
}

/// Parse a second count; negative values clamp to 0
fn parse_seconds(value: &str) -> Option<u32> {
    let n: i64 = value.trim().parse().ok()?;
    Some(u32::try_from(n.max(0)).unwrap_or(u32::MAX))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ConsoleCommand::parse("   ").unwrap(), ConsoleCommand::Empty);
        assert_eq!(
            ConsoleCommand::parse("connect /dev/ttyUSB0").unwrap(),
            ConsoleCommand::Connect(Some("/dev/ttyUSB0".to_string()))
        );
        assert_eq!(
            ConsoleCommand::parse("connect").unwrap(),
            ConsoleCommand::Connect(None)
        );
        assert_eq!(ConsoleCommand::parse("START").unwrap(), ConsoleCommand::Start);
        assert_eq!(
            ConsoleCommand::parse("mode b").unwrap(),
            ConsoleCommand::Mode(ModeSlot::B)
        );
        assert_eq!(
            ConsoleCommand::parse("simulate").unwrap(),
            ConsoleCommand::Simulate("01".to_string())
        );
        assert_eq!(
            ConsoleCommand::parse("simulate 31").unwrap(),
            ConsoleCommand::Simulate("31".to_string())
        );
        assert!(ConsoleCommand::parse("launch").is_err());
        assert!(ConsoleCommand::parse("mode c").is_err());
    }

    #[test]
    fn test_parse_save() {
        assert_eq!(
            ConsoleCommand::parse("save round=45 Block=off").unwrap(),
            ConsoleCommand::Save(vec![
                ("round".to_string(), "45".to_string()),
                ("block".to_string(), "off".to_string()),
            ])
        );
        assert!(ConsoleCommand::parse("save round").is_err());
    }

    #[test]
    fn test_apply_edits_sanitizes() {
        let current = Settings::default();
        let edits = |pairs: &[(&str, &str)]| -> Vec<(String, String)> {
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        };

        let settings = apply_edits(
            &current,
            &edits(&[("round", "0"), ("lock", "-3"), ("a", "  xyz"), ("block", "no")]),
        )
        .unwrap();
        assert_eq!(settings.round_time_seconds, 1);
        assert_eq!(settings.lock_time_seconds, 0);
        assert_eq!(settings.mode_a_code, 'x');
        assert!(!settings.block_after_round);

        let unchanged = apply_edits(&current, &edits(&[("round", "soon"), ("b", "")])).unwrap();
        assert_eq!(unchanged, current);

        assert!(apply_edits(&current, &edits(&[("volume", "3")])).is_err());
        assert!(apply_edits(&current, &edits(&[("block", "maybe")])).is_err());
    }
}
