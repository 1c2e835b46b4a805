//! Scancodes of the Cocoa backend: the virtual key codes of `NSEvent`, which name
//! physical positions on an ANSI keyboard.

use super::ffi::*;
use crate::input::{Key, Modifiers};

static KEYCODES: &[(u8, Key)] = &[
    (0x1D, Key::Num0), (0x12, Key::Num1), (0x13, Key::Num2), (0x14, Key::Num3), (0x15, Key::Num4),
    (0x17, Key::Num5), (0x16, Key::Num6), (0x1A, Key::Num7), (0x1C, Key::Num8), (0x19, Key::Num9),
    (0x00, Key::A), (0x0B, Key::B), (0x08, Key::C), (0x02, Key::D), (0x0E, Key::E),
    (0x03, Key::F), (0x05, Key::G), (0x04, Key::H), (0x22, Key::I), (0x26, Key::J),
    (0x28, Key::K), (0x25, Key::L), (0x2E, Key::M), (0x2D, Key::N), (0x1F, Key::O),
    (0x23, Key::P), (0x0C, Key::Q), (0x0F, Key::R), (0x01, Key::S), (0x11, Key::T),
    (0x20, Key::U), (0x09, Key::V), (0x0D, Key::W), (0x07, Key::X), (0x10, Key::Y),
    (0x06, Key::Z),
    (0x27, Key::Apostrophe), (0x2A, Key::Backslash), (0x2B, Key::Comma), (0x18, Key::Equal),
    (0x32, Key::GraveAccent), (0x21, Key::LeftBracket), (0x1B, Key::Minus), (0x2F, Key::Period),
    (0x1E, Key::RightBracket), (0x29, Key::Semicolon), (0x2C, Key::Slash), (0x0A, Key::World1),
    (0x33, Key::Backspace), (0x39, Key::CapsLock), (0x75, Key::Delete), (0x7D, Key::Down),
    (0x77, Key::End), (0x24, Key::Enter), (0x35, Key::Escape),
    (0x7A, Key::F1), (0x78, Key::F2), (0x63, Key::F3), (0x76, Key::F4), (0x60, Key::F5),
    (0x61, Key::F6), (0x62, Key::F7), (0x64, Key::F8), (0x65, Key::F9), (0x6D, Key::F10),
    (0x67, Key::F11), (0x6F, Key::F12), (0x69, Key::F13), (0x6B, Key::F14), (0x71, Key::F15),
    (0x6A, Key::F16), (0x40, Key::F17), (0x4F, Key::F18), (0x50, Key::F19), (0x5A, Key::F20),
    (0x73, Key::Home), (0x72, Key::Insert), (0x7B, Key::Left), (0x3A, Key::LeftAlt),
    (0x3B, Key::LeftControl), (0x38, Key::LeftShift), (0x37, Key::LeftSuper), (0x6E, Key::Menu),
    (0x47, Key::NumLock), (0x79, Key::PageDown), (0x74, Key::PageUp), (0x7C, Key::Right),
    (0x3D, Key::RightAlt), (0x3E, Key::RightControl), (0x3C, Key::RightShift),
    (0x36, Key::RightSuper), (0x31, Key::Space), (0x30, Key::Tab), (0x7E, Key::Up),
    (0x52, Key::Kp0), (0x53, Key::Kp1), (0x54, Key::Kp2), (0x55, Key::Kp3), (0x56, Key::Kp4),
    (0x57, Key::Kp5), (0x58, Key::Kp6), (0x59, Key::Kp7), (0x5B, Key::Kp8), (0x5C, Key::Kp9),
    (0x45, Key::KpAdd), (0x41, Key::KpDecimal), (0x4B, Key::KpDivide), (0x4C, Key::KpEnter),
    (0x51, Key::KpEqual), (0x43, Key::KpMultiply), (0x4E, Key::KpSubtract),
];

/// Both directions of the key code mapping.
pub(crate) struct KeyTables {
    keycodes: Vec<Key>,
    scancodes: Vec<i32>,
}

impl KeyTables {
    pub fn new() -> Self {
        let mut keycodes = vec![Key::Unknown; 0x100];
        let mut scancodes = vec![-1; Key::LAST.raw() as usize + 1];
        for &(code, key) in KEYCODES {
            keycodes[code as usize] = key;
            if let Some(i) = key.index() {
                scancodes[i] = code as i32;
            }
        }
        Self { keycodes, scancodes }
    }
    pub fn key(&self, scancode: i32) -> Key {
        if scancode < 0 || scancode >= self.keycodes.len() as i32 {
            return Key::Unknown;
        }
        self.keycodes[scancode as usize]
    }
    pub fn scancode(&self, key: Key) -> i32 {
        key.index().map_or(-1, |i| self.scancodes[i])
    }
}

pub(super) fn translate_flags(flags: usize) -> Modifiers {
    let mut mods = Modifiers::empty();
    if flags & NSEventModifierFlagShift != 0 {
        mods |= Modifiers::SHIFT;
    }
    if flags & NSEventModifierFlagControl != 0 {
        mods |= Modifiers::CONTROL;
    }
    if flags & NSEventModifierFlagOption != 0 {
        mods |= Modifiers::ALT;
    }
    if flags & NSEventModifierFlagCommand != 0 {
        mods |= Modifiers::SUPER;
    }
    if flags & NSEventModifierFlagCapsLock != 0 {
        mods |= Modifiers::CAPS_LOCK;
    }
    mods
}

/// The modifier flag a modifier key sets while held, for telling presses from
/// releases in `flagsChanged:`.
pub(super) fn modifier_flag(key: Key) -> usize {
    match key {
        Key::LeftShift | Key::RightShift => NSEventModifierFlagShift,
        Key::LeftControl | Key::RightControl => NSEventModifierFlagControl,
        Key::LeftAlt | Key::RightAlt => NSEventModifierFlagOption,
        Key::LeftSuper | Key::RightSuper => NSEventModifierFlagCommand,
        Key::CapsLock => NSEventModifierFlagCapsLock,
        _ => 0,
    }
}

/// Characters AppKit reserves for function keys, which are not text.
pub(super) fn is_function_key_char(c: char) -> bool {
    ('\u{F700}'..='\u{F8FF}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_is_bijective() {
        let keys = KeyTables::new();
        for &(code, key) in KEYCODES {
            assert_eq!(keys.scancode(key), code as i32);
            assert_eq!(keys.key(code as i32), key);
        }
        assert_eq!(keys.key(0x100), Key::Unknown);
    }

    #[test]
    fn modifier_keys_have_flags() {
        assert_eq!(modifier_flag(Key::RightSuper), NSEventModifierFlagCommand);
        assert_eq!(modifier_flag(Key::A), 0);
        let mods = translate_flags(NSEventModifierFlagShift | NSEventModifierFlagCommand);
        assert_eq!(mods, Modifiers::SHIFT | Modifiers::SUPER);
    }

    #[test]
    fn private_use_characters_are_not_text() {
        assert!(is_function_key_char('\u{F704}'));
        assert!(!is_function_key_char('a'));
    }
}
