//! Scancodes of the headless backend: USB HID keyboard page usages.

use crate::input::Key;

static USAGES: &[(u8, Key)] = &[
    (0x04, Key::A), (0x05, Key::B), (0x06, Key::C), (0x07, Key::D), (0x08, Key::E),
    (0x09, Key::F), (0x0A, Key::G), (0x0B, Key::H), (0x0C, Key::I), (0x0D, Key::J),
    (0x0E, Key::K), (0x0F, Key::L), (0x10, Key::M), (0x11, Key::N), (0x12, Key::O),
    (0x13, Key::P), (0x14, Key::Q), (0x15, Key::R), (0x16, Key::S), (0x17, Key::T),
    (0x18, Key::U), (0x19, Key::V), (0x1A, Key::W), (0x1B, Key::X), (0x1C, Key::Y),
    (0x1D, Key::Z),
    (0x1E, Key::Num1), (0x1F, Key::Num2), (0x20, Key::Num3), (0x21, Key::Num4),
    (0x22, Key::Num5), (0x23, Key::Num6), (0x24, Key::Num7), (0x25, Key::Num8),
    (0x26, Key::Num9), (0x27, Key::Num0),
    (0x28, Key::Enter), (0x29, Key::Escape), (0x2A, Key::Backspace), (0x2B, Key::Tab),
    (0x2C, Key::Space), (0x2D, Key::Minus), (0x2E, Key::Equal), (0x2F, Key::LeftBracket),
    (0x30, Key::RightBracket), (0x31, Key::Backslash), (0x32, Key::World1),
    (0x33, Key::Semicolon), (0x34, Key::Apostrophe), (0x35, Key::GraveAccent),
    (0x36, Key::Comma), (0x37, Key::Period), (0x38, Key::Slash), (0x39, Key::CapsLock),
    (0x3A, Key::F1), (0x3B, Key::F2), (0x3C, Key::F3), (0x3D, Key::F4), (0x3E, Key::F5),
    (0x3F, Key::F6), (0x40, Key::F7), (0x41, Key::F8), (0x42, Key::F9), (0x43, Key::F10),
    (0x44, Key::F11), (0x45, Key::F12),
    (0x46, Key::PrintScreen), (0x47, Key::ScrollLock), (0x48, Key::Pause),
    (0x49, Key::Insert), (0x4A, Key::Home), (0x4B, Key::PageUp), (0x4C, Key::Delete),
    (0x4D, Key::End), (0x4E, Key::PageDown),
    (0x4F, Key::Right), (0x50, Key::Left), (0x51, Key::Down), (0x52, Key::Up),
    (0x53, Key::NumLock), (0x54, Key::KpDivide), (0x55, Key::KpMultiply),
    (0x56, Key::KpSubtract), (0x57, Key::KpAdd), (0x58, Key::KpEnter),
    (0x59, Key::Kp1), (0x5A, Key::Kp2), (0x5B, Key::Kp3), (0x5C, Key::Kp4), (0x5D, Key::Kp5),
    (0x5E, Key::Kp6), (0x5F, Key::Kp7), (0x60, Key::Kp8), (0x61, Key::Kp9), (0x62, Key::Kp0),
    (0x63, Key::KpDecimal), (0x64, Key::World2), (0x65, Key::Menu), (0x67, Key::KpEqual),
    (0x68, Key::F13), (0x69, Key::F14), (0x6A, Key::F15), (0x6B, Key::F16), (0x6C, Key::F17),
    (0x6D, Key::F18), (0x6E, Key::F19), (0x6F, Key::F20), (0x70, Key::F21), (0x71, Key::F22),
    (0x72, Key::F23), (0x73, Key::F24),
    (0xE0, Key::LeftControl), (0xE1, Key::LeftShift), (0xE2, Key::LeftAlt), (0xE3, Key::LeftSuper),
    (0xE4, Key::RightControl), (0xE5, Key::RightShift), (0xE6, Key::RightAlt), (0xE7, Key::RightSuper),
];

/// Both directions of the scancode mapping.
pub(crate) struct KeyTables {
    keycodes: [Key; 256],
    scancodes: Vec<i32>,
}

impl KeyTables {
    pub fn new() -> Self {
        let mut keycodes = [Key::Unknown; 256];
        let mut scancodes = vec![-1; Key::LAST.raw() as usize + 1];
        for &(usage, key) in USAGES {
            keycodes[usage as usize] = key;
            if let Some(i) = key.index() {
                scancodes[i] = usage as i32;
            }
        }
        Self { keycodes, scancodes }
    }
    pub fn key(&self, scancode: i32) -> Key {
        if scancode < 0 || scancode > 0xFF {
            return Key::Unknown;
        }
        self.keycodes[scancode as usize]
    }
    pub fn scancode(&self, key: Key) -> i32 {
        key.index().map_or(-1, |i| self.scancodes[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_agree() {
        let t = KeyTables::new();
        for &(usage, key) in USAGES {
            assert_eq!(t.key(usage as i32), key);
            assert_eq!(t.scancode(key), usage as i32);
        }
        assert_eq!(t.scancode(Key::F25), -1);
        assert_eq!(t.key(0x01), Key::Unknown);
        assert_eq!(t.key(4096), Key::Unknown);
    }
}
