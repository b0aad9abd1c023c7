//! zpttlink core
//!
//! Bridges a hardware PTT switch, seen as an asserted modem control line
//! (CTS, DSR or CD) on a serial port, to a hotkey held down in voice
//! software such as Zello.
//!
//! ## Key components:
//! - `lines` / `serial` - Sample the modem lines of an open tty
//! - `debounce` - Turn raw samples into confirmed PTT down/up transitions
//! - `dispatch` / `inject` - Press or release the hotkey once per transition
//! - `listener` - Own the sampling loop, its shutdown and the final key release
//! - `config` / `ports` / `keys` - Startup plumbing for the command line tool

pub mod config;
pub mod debounce;
pub mod dispatch;
pub mod error;
pub mod inject;
pub mod keys;
pub mod lines;
pub mod listener;
pub mod ports;
pub mod serial;

pub use config::{load_or_default, AppConfig, ConfigSource};
pub use debounce::{DebounceConfig, Debouncer, LogicalState, Transition};
pub use dispatch::Dispatcher;
pub use error::{PttError, Result};
pub use inject::{DryRunInjector, KeyInjector, RdevInjector};
pub use keys::{CharKey, Hotkey, DEFAULT_HOTKEY};
pub use lines::{LineSample, LineSource};
pub use listener::{
    ListenerConfig, ListenerHandle, ListenerStatus, PttListener, StopReason, StopReport,
};
pub use ports::PortInfo;
pub use serial::{SerialPort, SerialSettings, DEFAULT_BAUD};
