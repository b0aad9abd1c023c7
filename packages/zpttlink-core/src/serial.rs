//! Serial port line source
//!
//! Opens a port through the `serialport` crate and samples the modem status
//! lines. No data bytes are ever read: the PTT adapter only drives the
//! control lines.

use crate::error::{PttError, Result};
use crate::lines::{LineSample, LineSource};
use std::io;
use std::time::Duration;

pub const DEFAULT_BAUD: u32 = 9600;

/// Parameters for opening a serial port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub port: String,
    pub baud: u32,
    /// Read timeout applied to the port. Zero means return immediately.
    pub timeout: Duration,
}

impl SerialSettings {
    pub fn new(port: impl Into<String>, baud: u32) -> Self {
        Self {
            port: port.into(),
            baud,
            timeout: Duration::ZERO,
        }
    }
}

/// An open serial port whose modem lines are sampled.
pub struct SerialPort {
    name: String,
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl SerialPort {
    pub fn open(settings: &SerialSettings) -> Result<Self> {
        let port = serialport::new(settings.port.as_str(), settings.baud)
            .timeout(settings.timeout)
            .open()
            .map_err(|e| PttError::port_unavailable(settings.port.as_str(), e))?;

        Ok(Self {
            name: settings.port.clone(),
            port: Some(port),
        })
    }
}

fn sample(port: &mut dyn serialport::SerialPort) -> serialport::Result<LineSample> {
    Ok(LineSample {
        cts: port.read_clear_to_send()?,
        dsr: port.read_data_set_ready()?,
        cd: port.read_carrier_detect()?,
    })
}

impl LineSource for SerialPort {
    fn read_lines(&mut self) -> io::Result<LineSample> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "port closed"))?;
        sample(&mut **port).map_err(io::Error::from)
    }

    fn describe(&self) -> String {
        self.name.clone()
    }

    fn close(&mut self) {
        // Dropping the handle closes the device
        self.port.take();
    }
}
