//! Port session: owns one serial connection and its reader thread

use crossbeam::channel::Sender;
use log::{debug, info, trace, warn};
use round_panel_core::protocol::{decode_ascii, encode_ascii, setting_packet};
use round_panel_core::{Command, Connector, LineSettings, Link, PanelError, PortEvent, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Size of the buffer one inbound chunk is read into
const READ_BUFFER_SIZE: usize = 1024;

/// An open connection plus the thread reading from it
struct Connection {
    link: Box<dyn Link>,
    stop: Arc<AtomicBool>,
    /// Set by the reader when it gave up after an I/O error
    failed: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

/// Serial session with a synchronous send path and an asynchronous
/// receive path.
///
/// Inbound chunks are delivered on the `events` channel, in arrival order,
/// as `PortEvent::Data` followed by `PortEvent::Message` for the same bytes.
pub struct PortSession<C: Connector> {
    connector: C,
    events: Sender<PortEvent>,
    connection: Option<Connection>,
}

impl<C: Connector> PortSession<C> {
    pub fn new(connector: C, events: Sender<PortEvent>) -> Self {
        Self {
            connector,
            events,
            connection: None,
        }
    }

    /// Serial ports visible to the system; empty if enumeration fails
    pub fn list_available_ports(&self) -> Vec<String> {
        match self.connector.available_ports() {
            Ok(ports) => ports,
            Err(e) => {
                warn!("Failed to list serial ports: {}", e);
                Vec::new()
            }
        }
    }

    /// Connect with the default line parameters (115200 8N1)
    pub fn connect(&mut self, port_name: &str) -> Result<()> {
        self.connect_with(port_name, LineSettings::default())
    }

    /// Connect to `port_name`, closing any existing connection first
    pub fn connect_with(&mut self, port_name: &str, line: LineSettings) -> Result<()> {
        if port_name.trim().is_empty() {
            return Err(PanelError::InvalidArgument(
                "Port name is required".to_string(),
            ));
        }

        if self.connection.is_some() {
            self.disconnect();
        }

        let link = self.connector.open(port_name, &line)?;
        let reader_link = match link.try_clone_link() {
            Ok(reader_link) => reader_link,
            Err(e) => {
                abandon(link);
                return Err(e.into());
            }
        };

        let stop = Arc::new(AtomicBool::new(false));
        let failed = Arc::new(AtomicBool::new(false));
        let reader = match spawn_reader(
            reader_link,
            stop.clone(),
            failed.clone(),
            self.events.clone(),
        ) {
            Ok(reader) => reader,
            Err(e) => {
                abandon(link);
                return Err(e);
            }
        };

        info!("Opened serial port: {} at {} baud", port_name, line.baud_rate);
        self.connection = Some(Connection {
            link,
            stop,
            failed,
            reader: Some(reader),
        });
        Ok(())
    }

    /// Close the connection if one is open. Teardown problems are reported
    /// as `PortEvent::Error`.
    pub fn disconnect(&mut self) {
        self.teardown(true);
    }

    fn teardown(&mut self, close_link: bool) {
        let Some(mut connection) = self.connection.take() else {
            return;
        };

        connection.stop.store(true, Ordering::Release);
        if let Some(handle) = connection.reader.take() {
            if handle.join().is_err() {
                self.report_error("Port reader thread panicked".to_string());
            }
        }

        if close_link {
            if let Err(e) = connection.link.close() {
                self.report_error(e.to_string());
            }
        }
        info!("Closed serial port: {}", connection.link.name());
    }

    /// Tear down after the reader reported `PortEvent::Closed`.
    ///
    /// Returns true if the current connection was the one that failed; a
    /// `Closed` left over from an earlier connection is ignored.
    pub fn on_reader_closed(&mut self) -> bool {
        let failed = self
            .connection
            .as_ref()
            .is_some_and(|c| c.failed.load(Ordering::Acquire));
        if failed {
            // The reader already reported why the port died
            self.teardown(false);
        }
        failed
    }

    pub fn is_open(&self) -> bool {
        self.connection.is_some()
    }

    pub fn port_name(&self) -> Option<&str> {
        self.connection.as_ref().map(|c| c.link.name())
    }

    pub fn send_ascii(&mut self, text: &str) -> Result<()> {
        self.send_bytes(&encode_ascii(text))
    }

    pub fn send_bytes(&mut self, data: &[u8]) -> Result<()> {
        let connection = self.connection.as_mut().ok_or(PanelError::NotConnected)?;
        debug!("-> {} byte(s) to {}", data.len(), connection.link.name());
        connection.link.write_all(data)?;
        Ok(())
    }

    /// Send `['s', index, value]`
    pub fn send_setting(&mut self, index: u8, value: u8) -> Result<()> {
        self.send_bytes(&setting_packet(index, value))
    }

    pub fn send_command(&mut self, command: Command) -> Result<()> {
        self.send_bytes(&command.to_bytes())
    }

    fn report_error(&self, message: String) {
        warn!("Port error: {}", message);
        let _ = self.events.send(PortEvent::Error(message));
    }
}

impl<C: Connector> Drop for PortSession<C> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Release a link that never became a connection
fn abandon(mut link: Box<dyn Link>) {
    if let Err(e) = link.close() {
        debug!("Closing {} failed: {}", link.name(), e);
    }
}

fn spawn_reader(
    mut link: Box<dyn Link>,
    stop: Arc<AtomicBool>,
    failed: Arc<AtomicBool>,
    events: Sender<PortEvent>,
) -> Result<JoinHandle<()>> {
    let handle = std::thread::Builder::new()
        .name(format!("port-reader:{}", link.name()))
        .spawn(move || {
            let mut buf = vec![0u8; READ_BUFFER_SIZE];
            while !stop.load(Ordering::Acquire) {
                match link.read_chunk(&mut buf) {
                    Ok(0) => {}
                    Ok(n) => {
                        let chunk = buf[..n].to_vec();
                        trace!("<- {:?}", chunk);
                        let text = decode_ascii(&chunk);
                        if events.send(PortEvent::Data(chunk)).is_err() {
                            break;
                        }
                        let _ = events.send(PortEvent::Message(text));
                    }
                    Err(e) => {
                        if stop.load(Ordering::Acquire) {
                            break;
                        }
                        warn!("Read from {} failed: {}", link.name(), e);
                        failed.store(true, Ordering::Release);
                        let _ = events.send(PortEvent::Error(e.to_string()));
                        let _ = events.send(PortEvent::Closed);
                        break;
                    }
                }
            }
            debug!("Port reader for {} exiting", link.name());
        })?;
    Ok(handle)
}
