//! Notifications delivered from the port reader to the foreground loop

/// Tagged event emitted by a port session.
///
/// For each inbound chunk the reader emits `Data` followed by `Message`
/// carrying the same bytes decoded as ASCII.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortEvent {
    /// Raw bytes read in one go; may hold a partial or several tokens
    Data(Vec<u8>),
    /// The same chunk decoded as ASCII
    Message(String),
    /// A read or teardown failure
    Error(String),
    /// The reader stopped after an I/O failure; the port is no longer usable
    Closed,
}
