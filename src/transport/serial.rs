use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, Parity, SerialPort, StopBits};
use tracing::debug;

use crate::core::{Error, Result, SerialConfig};
use super::Transport;

/// Optolink adapter on a serial port: 8E2, default 4800 baud
pub struct SerialTransport {
    /// Open serial port
    port: Box<dyn SerialPort>,
    /// Device path, kept for diagnostics
    path: String,
}

impl SerialTransport {
    /// Opens the adapter with the Optolink line settings
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::Even)
            .stop_bits(StopBits::Two)
            .timeout(timeout)
            .open()
            .map_err(|e| Error::connection(format!("Failed to open serial port {}: {}", path, e)))?;

        debug!(path, baud_rate, ?timeout, "opened optolink adapter");

        Ok(SerialTransport {
            port,
            path: path.to_string(),
        })
    }

    /// Opens the adapter described by the `[serial]` section
    pub fn from_config(config: &SerialConfig) -> Result<Self> {
        Self::open(&config.port, config.baud_rate, config.timeout)
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()
    }

    fn read(&mut self, max_len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; max_len];
        let mut filled = 0;

        // Keep reading until the buffer is full or the port times out
        while filled < max_len {
            match self.port.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        buf.truncate(filled);
        Ok(buf)
    }

    fn reset_input_buffer(&mut self) -> io::Result<()> {
        self.port.clear(ClearBuffer::Input).map_err(io::Error::from)
    }
}
