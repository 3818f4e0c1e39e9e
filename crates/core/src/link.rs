//! Link traits between the port session and a concrete transport

use serialport::{DataBits, Parity, StopBits};
use std::io;
use std::time::Duration;

/// Default baud rate of the device
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// How long a reader blocks before checking whether it should stop
pub const READ_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Line parameters used when opening a port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSettings {
    pub baud_rate: u32,
    pub parity: Parity,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            parity: Parity::None,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
        }
    }
}

impl LineSettings {
    pub fn with_baud_rate(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Self::default()
        }
    }
}

/// An open, bidirectional byte link.
///
/// The session keeps one instance for writes and hands a clone to its
/// reader thread.
pub trait Link: Send {
    /// Port name this link was opened on
    fn name(&self) -> &str;

    /// Write all bytes, blocking until they are handed to the driver
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read whatever is currently available into `buf`.
    ///
    /// Returns `Ok(0)` when nothing arrived within [`READ_POLL_INTERVAL`].
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Second handle on the same port, used by the reader thread
    fn try_clone_link(&self) -> io::Result<Box<dyn Link>>;

    /// Release driver resources before the handle is dropped
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Opens links and enumerates ports
pub trait Connector {
    /// Names of the serial ports visible to the system
    fn available_ports(&self) -> io::Result<Vec<String>>;

    /// Open `port_name` with the given line parameters
    fn open(&self, port_name: &str, line: &LineSettings) -> io::Result<Box<dyn Link>>;
}
