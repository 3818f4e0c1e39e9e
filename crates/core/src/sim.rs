//! In-memory serial device.
//!
//! Records everything written to it and replays queued inbound chunks, so
//! sessions and controllers can be exercised without hardware.

use crate::link::{Connector, LineSettings, Link, READ_POLL_INTERVAL};
use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct DeviceState {
    written: Vec<u8>,
    write_calls: usize,
    fail_writes_after: Option<usize>,
    unplugged: bool,
    fail_close: bool,
    fail_clone: bool,
    opens: usize,
    closes: usize,
    last_line: Option<LineSettings>,
}

/// Shared handle on the simulated device; clones observe the same state
#[derive(Clone)]
pub struct SimulatedDevice {
    state: Arc<Mutex<DeviceState>>,
    inbound_tx: Sender<Vec<u8>>,
    inbound_rx: Receiver<Vec<u8>>,
}

impl SimulatedDevice {
    pub fn new() -> Self {
        let (inbound_tx, inbound_rx) = unbounded();
        Self {
            state: Arc::new(Mutex::new(DeviceState::default())),
            inbound_tx,
            inbound_rx,
        }
    }

    fn state(&self) -> MutexGuard<'_, DeviceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue one chunk as if the device had sent it
    pub fn push_inbound(&self, bytes: &[u8]) {
        let _ = self.inbound_tx.send(bytes.to_vec());
    }

    /// Everything written so far
    pub fn written(&self) -> Vec<u8> {
        self.state().written.clone()
    }

    /// Let `count` more writes succeed, then fail every write
    pub fn fail_writes_after(&self, count: usize) {
        let mut state = self.state();
        state.fail_writes_after = Some(state.write_calls + count);
    }

    /// Make every read and write on open links fail, and refuse new opens
    pub fn unplug(&self) {
        self.state().unplugged = true;
    }

    /// Make `close` fail on every link
    pub fn fail_close(&self) {
        self.state().fail_close = true;
    }

    /// Make `try_clone_link` fail on every link
    pub fn fail_clone(&self) {
        self.state().fail_clone = true;
    }

    pub fn open_count(&self) -> usize {
        self.state().opens
    }

    pub fn close_count(&self) -> usize {
        self.state().closes
    }

    /// Line parameters of the most recent successful open
    pub fn last_line_settings(&self) -> Option<LineSettings> {
        self.state().last_line
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

fn unplugged_error() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged")
}

/// Connector exposing a fixed set of port names, all wired to one device
pub struct SimulatedConnector {
    ports: Vec<String>,
    device: SimulatedDevice,
}

impl SimulatedConnector {
    pub fn new(device: SimulatedDevice, ports: &[&str]) -> Self {
        Self {
            ports: ports.iter().map(|p| p.to_string()).collect(),
            device,
        }
    }
}

impl Connector for SimulatedConnector {
    fn available_ports(&self) -> io::Result<Vec<String>> {
        Ok(self.ports.clone())
    }

    fn open(&self, port_name: &str, line: &LineSettings) -> io::Result<Box<dyn Link>> {
        if !self.ports.iter().any(|p| p == port_name) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("No such port: {}", port_name),
            ));
        }

        let mut state = self.device.state();
        if state.unplugged {
            return Err(unplugged_error());
        }
        state.opens += 1;
        state.last_line = Some(*line);
        drop(state);

        Ok(Box::new(SimulatedLink {
            name: port_name.to_string(),
            device: self.device.clone(),
            pending: Vec::new(),
        }))
    }
}

/// One handle on the simulated device
pub struct SimulatedLink {
    name: String,
    device: SimulatedDevice,
    pending: Vec<u8>,
}

impl Link for SimulatedLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let mut state = self.device.state();
        if state.unplugged {
            return Err(unplugged_error());
        }
        if matches!(state.fail_writes_after, Some(limit) if state.write_calls >= limit) {
            return Err(io::Error::new(io::ErrorKind::Other, "simulated write failure"));
        }
        state.write_calls += 1;
        state.written.extend_from_slice(data);
        Ok(())
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.device.state().unplugged {
            return Err(unplugged_error());
        }

        if self.pending.is_empty() {
            match self.device.inbound_rx.recv_timeout(READ_POLL_INTERVAL) {
                Ok(chunk) => self.pending = chunk,
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return Ok(0)
                }
            }
        }

        let n = self.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }

    fn try_clone_link(&self) -> io::Result<Box<dyn Link>> {
        if self.device.state().fail_clone {
            return Err(io::Error::new(io::ErrorKind::Other, "simulated clone failure"));
        }
        Ok(Box::new(SimulatedLink {
            name: self.name.clone(),
            device: self.device.clone(),
            pending: Vec::new(),
        }))
    }

    fn close(&mut self) -> io::Result<()> {
        let mut state = self.device.state();
        state.closes += 1;
        if state.fail_close {
            return Err(io::Error::new(io::ErrorKind::Other, "simulated close failure"));
        }
        Ok(())
    }
}
