//! Serial port adapter using the `serialport` crate

use round_panel_core::{Connector, LineSettings, Link, READ_POLL_INTERVAL};
use serialport::{ClearBuffer, FlowControl, SerialPort};
use std::io::{self, Read, Write};

/// Opens OS serial ports
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialPortConnector;

impl Connector for SerialPortConnector {
    fn available_ports(&self) -> io::Result<Vec<String>> {
        let ports = serialport::available_ports()?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }

    fn open(&self, port_name: &str, line: &LineSettings) -> io::Result<Box<dyn Link>> {
        let port = serialport::new(port_name, line.baud_rate)
            .parity(line.parity)
            .data_bits(line.data_bits)
            .stop_bits(line.stop_bits)
            .flow_control(FlowControl::None)
            .timeout(READ_POLL_INTERVAL)
            .open()?;

        Ok(Box::new(SerialLink {
            name: port_name.to_string(),
            port,
        }))
    }
}

/// An open OS serial port
pub struct SerialLink {
    name: String,
    port: Box<dyn SerialPort>,
}

impl Link for SerialLink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)?;
        self.port.flush()
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn try_clone_link(&self) -> io::Result<Box<dyn Link>> {
        let port = self.port.try_clone()?;
        Ok(Box::new(SerialLink {
            name: self.name.clone(),
            port,
        }))
    }

    fn close(&mut self) -> io::Result<()> {
        self.port.clear(ClearBuffer::All)?;
        Ok(())
    }
}
