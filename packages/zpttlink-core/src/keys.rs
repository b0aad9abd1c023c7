//! PTT hotkey names
//!
//! The hotkey is resolved from its configured name once at startup. The
//! rest of the crate only passes the resolved [`Hotkey`] around.

use crate::error::PttError;
use std::fmt;
use std::str::FromStr;

/// Key sent to the voice application while PTT is down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hotkey {
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    Escape,
    Space,
    Enter,
    Tab,
    Shift,
    Ctrl,
    Alt,
    /// Command on macOS, Windows key elsewhere
    Meta,
    Char(CharKey),
}

pub const DEFAULT_HOTKEY: Hotkey = Hotkey::F9;

const FUNCTION_KEYS: [Hotkey; 12] = [
    Hotkey::F1,
    Hotkey::F2,
    Hotkey::F3,
    Hotkey::F4,
    Hotkey::F5,
    Hotkey::F6,
    Hotkey::F7,
    Hotkey::F8,
    Hotkey::F9,
    Hotkey::F10,
    Hotkey::F11,
    Hotkey::F12,
];

/// Unshifted punctuation on a US layout that has its own physical key.
const PUNCTUATION: &str = "`-=[];'\\,./";

/// A single printable key: `a`-`z`, `0`-`9` or one of `` `-=[];'\,./ ``.
///
/// Only constructible through [`CharKey::new`], so every value maps onto a
/// physical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CharKey(char);

impl CharKey {
    /// Letters are folded to lowercase; anything else outside the set is `None`.
    pub fn new(c: char) -> Option<Self> {
        let c = c.to_ascii_lowercase();
        (c.is_ascii_lowercase() || c.is_ascii_digit() || PUNCTUATION.contains(c)).then_some(Self(c))
    }

    pub fn get(self) -> char {
        self.0
    }
}

impl Hotkey {
    /// Function key `F<n>`, for `n` in 1..=12.
    pub fn function(n: u8) -> Option<Hotkey> {
        let index = usize::from(n).checked_sub(1)?;
        FUNCTION_KEYS.get(index).copied()
    }

    /// Single-character key, see [`CharKey`].
    pub fn char(c: char) -> Option<Hotkey> {
        CharKey::new(c).map(Hotkey::Char)
    }

    /// Parse `name`, falling back to [`DEFAULT_HOTKEY`] when it is empty or
    /// not recognised. Returns the key and whether the fallback was used.
    pub fn parse_or_default(name: &str) -> (Hotkey, bool) {
        match name.parse() {
            Ok(key) => (key, false),
            Err(_) => (DEFAULT_HOTKEY, true),
        }
    }
}

impl FromStr for Hotkey {
    type Err = PttError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let s = name.trim().to_lowercase();
        let invalid = || PttError::InvalidHotkey(name.to_string());
        let key = match s.as_str() {
            "esc" | "escape" => Hotkey::Escape,
            "space" => Hotkey::Space,
            "enter" | "return" => Hotkey::Enter,
            "tab" => Hotkey::Tab,
            "shift" => Hotkey::Shift,
            "ctrl" | "control" => Hotkey::Ctrl,
            "alt" => Hotkey::Alt,
            "cmd" | "win" | "meta" | "super" => Hotkey::Meta,
            _ => {
                if let Some(digits) = s.strip_prefix('f').filter(|d| !d.is_empty()) {
                    return digits
                        .parse::<u8>()
                        .ok()
                        .and_then(Hotkey::function)
                        .ok_or_else(invalid);
                }
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Hotkey::char(c).ok_or_else(invalid)?,
                    _ => return Err(invalid()),
                }
            }
        };
        Ok(key)
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Hotkey::F1 => "F1",
            Hotkey::F2 => "F2",
            Hotkey::F3 => "F3",
            Hotkey::F4 => "F4",
            Hotkey::F5 => "F5",
            Hotkey::F6 => "F6",
            Hotkey::F7 => "F7",
            Hotkey::F8 => "F8",
            Hotkey::F9 => "F9",
            Hotkey::F10 => "F10",
            Hotkey::F11 => "F11",
            Hotkey::F12 => "F12",
            Hotkey::Escape => "ESC",
            Hotkey::Space => "SPACE",
            Hotkey::Enter => "ENTER",
            Hotkey::Tab => "TAB",
            Hotkey::Shift => "SHIFT",
            Hotkey::Ctrl => "CTRL",
            Hotkey::Alt => "ALT",
            Hotkey::Meta => "META",
            Hotkey::Char(c) => return write!(f, "{}", c.get()),
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ch(c: char) -> Hotkey {
        Hotkey::char(c).unwrap()
    }

    #[test]
    fn test_parse_function_keys() {
        assert_eq!("F9".parse::<Hotkey>().unwrap(), Hotkey::F9);
        assert_eq!("f1".parse::<Hotkey>().unwrap(), Hotkey::F1);
        assert_eq!(" F12 ".parse::<Hotkey>().unwrap(), Hotkey::F12);
        assert!("F13".parse::<Hotkey>().is_err());
        assert!("F0".parse::<Hotkey>().is_err());
        assert!("F300".parse::<Hotkey>().is_err());
    }

    #[test]
    fn test_function_constructor_is_bounded() {
        assert_eq!(Hotkey::function(1), Some(Hotkey::F1));
        assert_eq!(Hotkey::function(12), Some(Hotkey::F12));
        assert_eq!(Hotkey::function(0), None);
        assert_eq!(Hotkey::function(20), None);
    }

    #[test]
    fn test_parse_named_keys_and_aliases() {
        assert_eq!("ENTER".parse::<Hotkey>().unwrap(), Hotkey::Enter);
        assert_eq!("return".parse::<Hotkey>().unwrap(), Hotkey::Enter);
        assert_eq!("Esc".parse::<Hotkey>().unwrap(), Hotkey::Escape);
        assert_eq!("win".parse::<Hotkey>().unwrap(), Hotkey::Meta);
        assert_eq!("cmd".parse::<Hotkey>().unwrap(), Hotkey::Meta);
    }

    #[test]
    fn test_parse_single_character() {
        assert_eq!("X".parse::<Hotkey>().unwrap(), ch('x'));
        assert_eq!("7".parse::<Hotkey>().unwrap(), ch('7'));
        // "f" alone is the letter, not a function key
        assert_eq!("f".parse::<Hotkey>().unwrap(), ch('f'));
        assert!("xy".parse::<Hotkey>().is_err());
    }

    #[test]
    fn test_parse_punctuation_keys() {
        for c in ['`', '-', '=', '[', ']', ';', '\'', '\\', ',', '.', '/'] {
            let key = c.to_string().parse::<Hotkey>().unwrap();
            assert_eq!(key, ch(c));
            assert_eq!(key.to_string(), c.to_string());
        }
        // shifted symbols have no key of their own
        assert!("#".parse::<Hotkey>().is_err());
        assert!("~".parse::<Hotkey>().is_err());
        assert!("é".parse::<Hotkey>().is_err());
    }

    #[test]
    fn test_char_key_folds_case() {
        assert_eq!(CharKey::new('Q').map(CharKey::get), Some('q'));
        assert_eq!(CharKey::new('!'), None);
    }

    #[test]
    fn test_parse_or_default_falls_back_to_f9() {
        assert_eq!(Hotkey::parse_or_default("F8"), (Hotkey::F8, false));
        assert_eq!(Hotkey::parse_or_default(""), (Hotkey::F9, true));
        assert_eq!(Hotkey::parse_or_default("F20"), (Hotkey::F9, true));
        assert_eq!(Hotkey::parse_or_default("hyper"), (Hotkey::F9, true));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let mut keys = FUNCTION_KEYS.to_vec();
        keys.extend([Hotkey::Escape, Hotkey::Meta, ch('q'), ch('/')]);
        for key in keys {
            assert_eq!(key.to_string().parse::<Hotkey>().unwrap(), key);
        }
    }
}
