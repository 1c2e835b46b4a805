//! Keyboard and mouse vocabulary: keys, actions, modifiers, buttons, cursor and input modes.

use crate::error::{self, Result};

macro_rules! keys {
    ($($Key:ident = $raw:expr,)+) => {
        /// Portable key identifiers, named after the US layout.
        ///
        /// Raw values are stable and usable as indices (`Key::LAST` is the highest one).
        #[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
        #[repr(i32)]
        #[allow(missing_docs)]
        pub enum Key {
            Unknown = -1,
            $($Key = $raw,)+
        }

        impl Key {
            /// Every key but `Unknown`, in ascending raw order.
            pub const ALL: &'static [Key] = &[$(Key::$Key,)+];

            /// Converts from a raw value. Values naming no key yield `None`.
            pub fn from_raw(raw: i32) -> Option<Self> {
                match raw {
                    -1 => Some(Key::Unknown),
                    $(x if x == $raw => Some(Key::$Key),)+
                    _ => None,
                }
            }
        }
    };
}

keys!{
    Space = 32,
    Apostrophe = 39,
    Comma = 44,
    Minus = 45,
    Period = 46,
    Slash = 47,
    Num0 = 48,
    Num1 = 49,
    Num2 = 50,
    Num3 = 51,
    Num4 = 52,
    Num5 = 53,
    Num6 = 54,
    Num7 = 55,
    Num8 = 56,
    Num9 = 57,
    Semicolon = 59,
    Equal = 61,
    A = 65,
    B = 66,
    C = 67,
    D = 68,
    E = 69,
    F = 70,
    G = 71,
    H = 72,
    I = 73,
    J = 74,
    K = 75,
    L = 76,
    M = 77,
    N = 78,
    O = 79,
    P = 80,
    Q = 81,
    R = 82,
    S = 83,
    T = 84,
    U = 85,
    V = 86,
    W = 87,
    X = 88,
    Y = 89,
    Z = 90,
    LeftBracket = 91,
    Backslash = 92,
    RightBracket = 93,
    GraveAccent = 96,
    World1 = 161,
    World2 = 162,
    Escape = 256,
    Enter = 257,
    Tab = 258,
    Backspace = 259,
    Insert = 260,
    Delete = 261,
    Right = 262,
    Left = 263,
    Down = 264,
    Up = 265,
    PageUp = 266,
    PageDown = 267,
    Home = 268,
    End = 269,
    CapsLock = 280,
    ScrollLock = 281,
    NumLock = 282,
    PrintScreen = 283,
    Pause = 284,
    F1 = 290,
    F2 = 291,
    F3 = 292,
    F4 = 293,
    F5 = 294,
    F6 = 295,
    F7 = 296,
    F8 = 297,
    F9 = 298,
    F10 = 299,
    F11 = 300,
    F12 = 301,
    F13 = 302,
    F14 = 303,
    F15 = 304,
    F16 = 305,
    F17 = 306,
    F18 = 307,
    F19 = 308,
    F20 = 309,
    F21 = 310,
    F22 = 311,
    F23 = 312,
    F24 = 313,
    F25 = 314,
    Kp0 = 320,
    Kp1 = 321,
    Kp2 = 322,
    Kp3 = 323,
    Kp4 = 324,
    Kp5 = 325,
    Kp6 = 326,
    Kp7 = 327,
    Kp8 = 328,
    Kp9 = 329,
    KpDecimal = 330,
    KpDivide = 331,
    KpMultiply = 332,
    KpSubtract = 333,
    KpAdd = 334,
    KpEnter = 335,
    KpEqual = 336,
    LeftShift = 340,
    LeftControl = 341,
    LeftAlt = 342,
    LeftSuper = 343,
    RightShift = 344,
    RightControl = 345,
    RightAlt = 346,
    RightSuper = 347,
    Menu = 348,
}

impl Key {
    /// The highest raw key value.
    pub const LAST: Key = Key::Menu;

    /// Gets the raw value.
    pub fn raw(self) -> i32 {
        self as i32
    }
    pub(crate) fn index(self) -> Option<usize> {
        match self {
            Key::Unknown => None,
            k => Some(k as usize),
        }
    }
    /// The character this key produces on a US layout without modifiers, for printable keys.
    pub(crate) fn us_char(self) -> Option<char> {
        let raw = self.raw();
        match self {
            Key::A | Key::B | Key::C | Key::D | Key::E | Key::F | Key::G | Key::H | Key::I |
            Key::J | Key::K | Key::L | Key::M | Key::N | Key::O | Key::P | Key::Q | Key::R |
            Key::S | Key::T | Key::U | Key::V | Key::W | Key::X | Key::Y | Key::Z => {
                Some((b'a' + (raw - Key::A.raw()) as u8) as char)
            },
            Key::Apostrophe | Key::Comma | Key::Minus | Key::Period | Key::Slash |
            Key::Semicolon | Key::Equal | Key::LeftBracket | Key::Backslash |
            Key::RightBracket | Key::GraveAccent |
            Key::Num0 | Key::Num1 | Key::Num2 | Key::Num3 | Key::Num4 |
            Key::Num5 | Key::Num6 | Key::Num7 | Key::Num8 | Key::Num9 => Some(raw as u8 as char),
            Key::Kp0 | Key::Kp1 | Key::Kp2 | Key::Kp3 | Key::Kp4 |
            Key::Kp5 | Key::Kp6 | Key::Kp7 | Key::Kp8 | Key::Kp9 => {
                Some((b'0' + (raw - Key::Kp0.raw()) as u8) as char)
            },
            Key::KpDecimal => Some('.'),
            Key::KpDivide => Some('/'),
            Key::KpMultiply => Some('*'),
            Key::KpSubtract => Some('-'),
            Key::KpAdd => Some('+'),
            Key::KpEqual => Some('='),
            _ => None,
        }
    }
}

/// What happened to a key or button.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
#[repr(i32)]
pub enum Action {
    #[allow(missing_docs)]
    Release = 0,
    #[allow(missing_docs)]
    Press = 1,
    /// The key was held down until it repeated.
    Repeat = 2,
}

bitflags! {
    /// Modifier keys held, and lock keys enabled, when an event happened.
    #[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, Default)]
    pub struct Modifiers: i32 {
        #[allow(missing_docs)]
        const SHIFT = 0x0001;
        #[allow(missing_docs)]
        const CONTROL = 0x0002;
        #[allow(missing_docs)]
        const ALT = 0x0004;
        #[allow(missing_docs)]
        const SUPER = 0x0008;
        /// Only reported when lock-key mods are enabled.
        const CAPS_LOCK = 0x0010;
        /// Only reported when lock-key mods are enabled.
        const NUM_LOCK = 0x0020;
    }
}

/// Mouse buttons. Raw values start at 0.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(i32)]
#[allow(missing_docs)]
pub enum MouseButton {
    Button1 = 0,
    Button2 = 1,
    Button3 = 2,
    Button4 = 3,
    Button5 = 4,
    Button6 = 5,
    Button7 = 6,
    Button8 = 7,
}

impl MouseButton {
    #[allow(missing_docs)]
    pub const LEFT: MouseButton = MouseButton::Button1;
    #[allow(missing_docs)]
    pub const RIGHT: MouseButton = MouseButton::Button2;
    #[allow(missing_docs)]
    pub const MIDDLE: MouseButton = MouseButton::Button3;
    /// All buttons, in raw order.
    pub const ALL: [MouseButton; 8] = [
        MouseButton::Button1, MouseButton::Button2, MouseButton::Button3, MouseButton::Button4,
        MouseButton::Button5, MouseButton::Button6, MouseButton::Button7, MouseButton::Button8,
    ];

    /// Converts from a raw value in `0..8`.
    pub fn from_raw(raw: i32) -> Option<Self> {
        Self::ALL.get(raw as usize).filter(|_| raw >= 0).cloned()
    }
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// How the cursor behaves over a window.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
#[repr(i32)]
pub enum CursorMode {
    /// Visible, reports absolute positions.
    Normal = 0x0003_4001,
    /// Invisible over the client area.
    Hidden = 0x0003_4002,
    /// Invisible, captured, and reporting an unbounded virtual position.
    Disabled = 0x0003_4003,
}

impl CursorMode {
    /// Converts from the raw value.
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0x0003_4001 => Some(CursorMode::Normal),
            0x0003_4002 => Some(CursorMode::Hidden),
            0x0003_4003 => Some(CursorMode::Disabled),
            _ => None,
        }
    }
}

/// Per-window input modes, for the raw `set_input_mode()` API.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
#[repr(i32)]
#[allow(missing_docs)]
pub enum InputMode {
    Cursor = 0x0003_3001,
    StickyKeys = 0x0003_3002,
    StickyMouseButtons = 0x0003_3003,
    LockKeyMods = 0x0003_3004,
    RawMouseMotion = 0x0003_3005,
}

/// Last observed state of a key or button.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub(crate) enum KeyState {
    Released,
    Pressed,
    /// Released while sticky; reads as pressed once.
    Stick,
}

impl KeyState {
    pub fn from_action(action: Action, sticky: bool) -> Self {
        match action {
            Action::Release if sticky => KeyState::Stick,
            Action::Release => KeyState::Released,
            Action::Press | Action::Repeat => KeyState::Pressed,
        }
    }
}

/// Is the code point text, as opposed to a C0 or C1 control code?
pub(crate) fn is_text_codepoint(codepoint: u32) -> bool {
    !(codepoint < 0x20 || (codepoint >= 0x7F && codepoint <= 0x9F))
}

/// Assembles code points from UTF-16 units delivered one at a time.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Utf16Composer {
    high_surrogate: Option<u16>,
}

impl Utf16Composer {
    pub fn push(&mut self, unit: u16) -> Option<u32> {
        match unit {
            0xD800..=0xDBFF => {
                self.high_surrogate = Some(unit);
                None
            },
            0xDC00..=0xDFFF => {
                let high = self.high_surrogate.take()?;
                Some(0x10000 + ((high as u32 - 0xD800) << 10) + (unit as u32 - 0xDC00))
            },
            _ => {
                self.high_surrogate = None;
                Some(unit as u32)
            },
        }
    }
}

/// Validates a raw key for queries.
pub(crate) fn check_key(key: Key) -> Result<usize> {
    key.index().ok_or_else(|| error::Error::invalid_enum(format!("Invalid key {:?}", key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_raw_values() {
        assert_eq!(Key::Space.raw(), 32);
        assert_eq!(Key::LAST.raw(), 348);
        assert_eq!(Key::from_raw(346), Some(Key::RightAlt));
        assert_eq!(Key::from_raw(100), None);
        assert!(Key::ALL.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn us_chars() {
        assert_eq!(Key::Q.us_char(), Some('q'));
        assert_eq!(Key::Num7.us_char(), Some('7'));
        assert_eq!(Key::Kp3.us_char(), Some('3'));
        assert_eq!(Key::LeftBracket.us_char(), Some('['));
        assert_eq!(Key::Escape.us_char(), None);
    }

    #[test]
    fn surrogate_pairs_compose() {
        let mut c = Utf16Composer::default();
        assert_eq!(c.push(0xD83D), None);
        assert_eq!(c.push(0xDE00), Some(0x1F600));
        assert_eq!(c.push(0x41), Some(0x41));
        // A lone low surrogate is dropped.
        assert_eq!(c.push(0xDC00), None);
    }

    #[test]
    fn control_codes_are_not_text() {
        assert!(!is_text_codepoint(0x1B));
        assert!(!is_text_codepoint(0x7F));
        assert!(!is_text_codepoint(0x9F));
        assert!(is_text_codepoint(0xA0));
        assert!(is_text_codepoint('é' as u32));
    }

    #[test]
    fn buttons_and_modes() {
        assert_eq!(MouseButton::from_raw(2), Some(MouseButton::MIDDLE));
        assert_eq!(MouseButton::from_raw(8), None);
        assert_eq!(MouseButton::from_raw(-1), None);
        assert_eq!(CursorMode::from_raw(0x34003), Some(CursorMode::Disabled));
        assert_eq!(KeyState::from_action(Action::Release, true), KeyState::Stick);
        assert_eq!((Modifiers::SHIFT | Modifiers::NUM_LOCK).bits(), 33);
    }
}
