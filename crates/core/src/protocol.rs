//! Outbound command encoding.
//!
//! The device protocol is a single command letter, optionally followed by
//! raw parameter bytes. There is no length prefix, checksum or
//! acknowledgment.

use round_panel_types::Settings;

/// Command byte that starts a round
pub const START_ROUND: u8 = b'r';
/// Command byte that prefixes a setting packet
pub const SETTING_PREFIX: u8 = b's';

/// Device parameter slots addressed by setting packets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SettingIndex {
    LockTime = 1,
    RoundTime = 2,
    BlockAfterRound = 3,
}

/// A command as sent on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StartRound,
    Mode(char),
    Setting { index: u8, value: u8 },
}

impl Command {
    pub fn to_bytes(&self) -> Vec<u8> {
        match *self {
            Command::StartRound => vec![START_ROUND],
            Command::Mode(code) => vec![ascii_byte(code)],
            Command::Setting { index, value } => setting_packet(index, value).to_vec(),
        }
    }
}

/// `['s', index, value]`
pub fn setting_packet(index: u8, value: u8) -> [u8; 3] {
    [SETTING_PREFIX, index, value]
}

/// The three packets that push `settings` to the device, in send order:
/// lock time, round time, block-after-round.
pub fn settings_packets(settings: &Settings) -> [[u8; 3]; 3] {
    [
        setting_packet(
            SettingIndex::LockTime as u8,
            low_byte(settings.lock_time_seconds),
        ),
        setting_packet(
            SettingIndex::RoundTime as u8,
            low_byte(settings.round_time_seconds),
        ),
        setting_packet(
            SettingIndex::BlockAfterRound as u8,
            u8::from(settings.block_after_round),
        ),
    ]
}

/// The one byte a setting packet carries; larger values wrap modulo 256
pub fn low_byte(value: u32) -> u8 {
    value as u8
}

/// Encode a character as a single ASCII byte; anything else becomes `?`
pub fn ascii_byte(c: char) -> u8 {
    if c.is_ascii() {
        c as u8
    } else {
        b'?'
    }
}

/// Encode text as ASCII, one byte per character
pub fn encode_ascii(text: &str) -> Vec<u8> {
    text.chars().map(ascii_byte).collect()
}

/// Decode bytes as ASCII, one character per byte; bytes above 0x7F become `?`
pub fn decode_ascii(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect()
}

/// Uppercase hex bytes joined by dashes, e.g. `30-31`
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join("-")
}
