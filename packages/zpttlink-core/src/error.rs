use thiserror::Error;

pub type Result<T> = std::result::Result<T, PttError>;

#[derive(Debug, Error)]
pub enum PttError {
    /// The serial port could not be opened or configured.
    #[error("serial port {port} unavailable: {reason}")]
    PortUnavailable { port: String, reason: String },

    /// Transient failure reading the modem control lines.
    #[error("failed to read modem lines: {0}")]
    ReadError(#[source] std::io::Error),

    /// The OS refused the synthetic key event.
    #[error("key {action} failed for {key}: {reason}")]
    InjectionFailed {
        action: &'static str,
        key: String,
        reason: String,
    },

    /// Unrecoverable sampling loop failure (device gone, too many read errors).
    #[error("listener failed: {0}")]
    Fatal(String),

    #[error("no serial port specified and auto-detect found none")]
    NoPort,

    #[error("invalid hotkey: {0}")]
    InvalidHotkey(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PttError {
    /// Process exit code for the command line front end.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoPort => 2,
            Self::PortUnavailable { .. } => 3,
            _ => 1,
        }
    }

    pub fn port_unavailable(port: impl Into<String>, reason: impl ToString) -> Self {
        Self::PortUnavailable {
            port: port.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(PttError::NoPort.exit_code(), 2);
        assert_eq!(
            PttError::port_unavailable("/dev/ttyUSB0", "No such file").exit_code(),
            3
        );
        assert_eq!(PttError::Fatal("gone".into()).exit_code(), 1);
    }

    #[test]
    fn test_port_unavailable_message() {
        let err = PttError::port_unavailable("COM3", "access denied");
        assert_eq!(err.to_string(), "serial port COM3 unavailable: access denied");
    }
}
