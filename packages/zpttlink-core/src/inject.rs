//! Key injection
//!
//! The listener only needs two operations: hold a key down and let it go.
//! [`RdevInjector`] sends real OS key events; [`DryRunInjector`] logs them.

use crate::error::{PttError, Result};
use crate::keys::{CharKey, Hotkey};
use rdev::{EventType, Key};

/// Sends key-down / key-up events for the PTT hotkey.
pub trait KeyInjector: Send {
    fn press(&mut self, key: Hotkey) -> Result<()>;

    fn release(&mut self, key: Hotkey) -> Result<()>;

    /// Short name for log lines ("rdev", "dry-run").
    fn name(&self) -> &'static str;
}

impl<I: KeyInjector + ?Sized> KeyInjector for Box<I> {
    fn press(&mut self, key: Hotkey) -> Result<()> {
        (**self).press(key)
    }

    fn release(&mut self, key: Hotkey) -> Result<()> {
        (**self).release(key)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Logs key events without touching the OS.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunInjector;

impl KeyInjector for DryRunInjector {
    fn press(&mut self, key: Hotkey) -> Result<()> {
        tracing::debug!(%key, "[dry-run] press");
        Ok(())
    }

    fn release(&mut self, key: Hotkey) -> Result<()> {
        tracing::debug!(%key, "[dry-run] release");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dry-run"
    }
}

/// Global key injection through `rdev::simulate`.
///
/// On Linux this goes through X11 (XTest); Wayland sessions usually block
/// it. On macOS the terminal needs Accessibility permission.
#[derive(Debug, Default, Clone, Copy)]
pub struct RdevInjector;

impl RdevInjector {
    pub fn new() -> Self {
        Self
    }

    fn send(
        &self,
        action: &'static str,
        key: Hotkey,
        event: fn(Key) -> EventType,
    ) -> Result<()> {
        let failed = |reason: String| PttError::InjectionFailed {
            action,
            key: key.to_string(),
            reason,
        };
        let code = rdev_key(key).ok_or_else(|| failed("no OS key code".into()))?;
        rdev::simulate(&event(code)).map_err(|e| failed(format!("{:?}", e)))
    }
}

impl KeyInjector for RdevInjector {
    fn press(&mut self, key: Hotkey) -> Result<()> {
        self.send("press", key, EventType::KeyPress)
    }

    fn release(&mut self, key: Hotkey) -> Result<()> {
        self.send("release", key, EventType::KeyRelease)
    }

    fn name(&self) -> &'static str {
        "rdev"
    }
}

/// Map a hotkey onto the rdev key vocabulary.
pub fn rdev_key(key: Hotkey) -> Option<Key> {
    let code = match key {
        Hotkey::F1 => Key::F1,
        Hotkey::F2 => Key::F2,
        Hotkey::F3 => Key::F3,
        Hotkey::F4 => Key::F4,
        Hotkey::F5 => Key::F5,
        Hotkey::F6 => Key::F6,
        Hotkey::F7 => Key::F7,
        Hotkey::F8 => Key::F8,
        Hotkey::F9 => Key::F9,
        Hotkey::F10 => Key::F10,
        Hotkey::F11 => Key::F11,
        Hotkey::F12 => Key::F12,
        Hotkey::Escape => Key::Escape,
        Hotkey::Space => Key::Space,
        Hotkey::Enter => Key::Return,
        Hotkey::Tab => Key::Tab,
        Hotkey::Shift => Key::ShiftLeft,
        Hotkey::Ctrl => Key::ControlLeft,
        Hotkey::Alt => Key::Alt,
        Hotkey::Meta => Key::MetaLeft,
        Hotkey::Char(c) => return char_key(c),
    };
    Some(code)
}

fn char_key(c: CharKey) -> Option<Key> {
    let code = match c.get() {
        'a' => Key::KeyA,
        'b' => Key::KeyB,
        'c' => Key::KeyC,
        'd' => Key::KeyD,
        'e' => Key::KeyE,
        'f' => Key::KeyF,
        'g' => Key::KeyG,
        'h' => Key::KeyH,
        'i' => Key::KeyI,
        'j' => Key::KeyJ,
        'k' => Key::KeyK,
        'l' => Key::KeyL,
        'm' => Key::KeyM,
        'n' => Key::KeyN,
        'o' => Key::KeyO,
        'p' => Key::KeyP,
        'q' => Key::KeyQ,
        'r' => Key::KeyR,
        's' => Key::KeyS,
        't' => Key::KeyT,
        'u' => Key::KeyU,
        'v' => Key::KeyV,
        'w' => Key::KeyW,
        'x' => Key::KeyX,
        'y' => Key::KeyY,
        'z' => Key::KeyZ,
        '0' => Key::Num0,
        '1' => Key::Num1,
        '2' => Key::Num2,
        '3' => Key::Num3,
        '4' => Key::Num4,
        '5' => Key::Num5,
        '6' => Key::Num6,
        '7' => Key::Num7,
        '8' => Key::Num8,
        '9' => Key::Num9,
        '`' => Key::BackQuote,
        '-' => Key::Minus,
        '=' => Key::Equal,
        '[' => Key::LeftBracket,
        ']' => Key::RightBracket,
        ';' => Key::SemiColon,
        '\'' => Key::Quote,
        '\\' => Key::BackSlash,
        ',' => Key::Comma,
        '.' => Key::Dot,
        '/' => Key::Slash,
        _ => return None,
    };
    Some(code)
}
