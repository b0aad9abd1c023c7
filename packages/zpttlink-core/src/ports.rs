//! Serial port discovery
//!
//! Enumerates candidate serial devices and ranks them against the
//! configured autodetect hints (e.g. "aioc", "cm108", "ttyacm").

use serialport::{SerialPortInfo, SerialPortType};

/// A serial device found on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Path or name to pass to `SerialPort::open`
    pub device: String,
    /// Product string, or "n/a" if unknown
    pub description: String,
    /// Hardware id (e.g. "USB VID:PID=1209:7388"), or "n/a"
    pub hwid: String,
}

impl PortInfo {
    fn search_text(&self) -> String {
        format!("{} {} {}", self.device, self.description, self.hwid).to_lowercase()
    }
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (description, hwid) = match info.port_type {
            SerialPortType::UsbPort(usb) => (
                usb.product.unwrap_or_else(|| "n/a".to_string()),
                format!("USB VID:PID={:04X}:{:04X}", usb.vid, usb.pid),
            ),
            SerialPortType::BluetoothPort => ("Bluetooth".to_string(), "n/a".to_string()),
            SerialPortType::PciPort | SerialPortType::Unknown => {
                ("n/a".to_string(), "n/a".to_string())
            }
        };
        PortInfo {
            device: info.port_name,
            description,
            hwid,
        }
    }
}

/// List serial ports, sorted by device name.
///
/// Enumeration failures are logged and yield an empty list.
pub fn list_ports() -> Vec<PortInfo> {
    let found = match serialport::available_ports() {
        Ok(found) => found,
        Err(e) => {
            tracing::warn!(error = %e, "serial port enumeration failed");
            return Vec::new();
        }
    };

    let mut ports: Vec<PortInfo> = found.into_iter().map(PortInfo::from).collect();
    ports.sort_by(|a, b| a.device.cmp(&b.device));
    ports
}

/// Score a port by how many hints appear in its device/description/hwid.
pub fn score(port: &PortInfo, hints: &[String]) -> usize {
    let text = port.search_text();
    hints
        .iter()
        .filter(|hint| text.contains(&hint.to_lowercase()))
        .count()
}

/// Pick the best matching port from `ports`.
///
/// Ports are ranked by score, ties broken by device name (descending). The
/// top entry is returned even when nothing matched, so a machine with a
/// single unrecognised adapter still gets used. Returns `None` only when
/// `ports` is empty.
pub fn best_match(ports: &[PortInfo], hints: &[String]) -> Option<String> {
    let mut ranked: Vec<(usize, &str)> = ports
        .iter()
        .map(|p| (score(p, hints), p.device.as_str()))
        .collect();
    ranked.sort_by(|a, b| b.cmp(a));
    ranked.first().map(|(_, device)| device.to_string())
}

/// Autodetect a PTT serial port on this machine.
pub fn autodetect(hints: &[String]) -> Option<String> {
    best_match(&list_ports(), hints)
}
