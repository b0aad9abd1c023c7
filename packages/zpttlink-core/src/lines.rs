//! Modem control line sampling
//!
//! A PTT adapter signals "transmit" by asserting one of the serial port's
//! input control lines. Which one depends on the adapter, so any of them
//! counts.

use std::io;

/// Instantaneous state of the three modem input lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineSample {
    /// Clear To Send
    pub cts: bool,
    /// Data Set Ready
    pub dsr: bool,
    /// Carrier Detect
    pub cd: bool,
}

impl LineSample {
    pub const IDLE: LineSample = LineSample {
        cts: false,
        dsr: false,
        cd: false,
    };

    pub fn new(cts: bool, dsr: bool, cd: bool) -> Self {
        Self { cts, dsr, cd }
    }

    /// True when any line is asserted (raw PTT down).
    #[inline]
    pub fn is_asserted(&self) -> bool {
        self.cts || self.dsr || self.cd
    }
}

/// Source of modem line samples, owned by a single listener loop.
pub trait LineSource: Send {
    /// Read the current line state. Errors are treated as transient by the
    /// caller until they repeat too many times in a row.
    fn read_lines(&mut self) -> io::Result<LineSample>;

    /// Human readable identifier, used in log lines.
    fn describe(&self) -> String;

    /// Release the underlying handle. Called once when the loop exits.
    fn close(&mut self) {}
}

impl<S: LineSource + ?Sized> LineSource for Box<S> {
    fn read_lines(&mut self) -> io::Result<LineSample> {
        (**self).read_lines()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }

    fn close(&mut self) {
        (**self).close()
    }
}
