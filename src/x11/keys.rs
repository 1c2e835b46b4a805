//! X keysyms to `Key`, and the keycode tables built from them.

use std::os::raw::c_int;
use x11_dl::xlib::{self as x, Xlib};
use crate::input::Key;

macro_rules! x_keysyms {
    ($($Key:ident $sym:expr,)+) => {
        pub(crate) fn key_from_x_keysym(x_keysym: x::KeySym) -> Key {
            match x_keysym {
                $(s if s == $sym => Key::$Key,)+
                _ => Key::Unknown,
            }
        }
    };
}

x_keysyms!{
    Escape        0xFF1B,
    Tab           0xFF09,
    LeftShift     0xFFE1,
    RightShift    0xFFE2,
    LeftControl   0xFFE3,
    RightControl  0xFFE4,
    LeftAlt       0xFFE9,
    LeftAlt       0xFFE7, // Meta_L
    RightAlt      0xFFEA,
    RightAlt      0xFFE8, // Meta_R
    RightAlt      0xFF7E, // Mode_switch
    RightAlt      0xFE03, // ISO_Level3_Shift
    LeftSuper     0xFFEB,
    RightSuper    0xFFEC,
    Menu          0xFF67,
    NumLock       0xFF7F,
    CapsLock      0xFFE5,
    PrintScreen   0xFF61,
    ScrollLock    0xFF14,
    Pause         0xFF13,
    Delete        0xFFFF,
    Backspace     0xFF08,
    Enter         0xFF0D,
    Home          0xFF50,
    End           0xFF57,
    PageUp        0xFF55,
    PageDown      0xFF56,
    Insert        0xFF63,
    Left          0xFF51,
    Right         0xFF53,
    Down          0xFF54,
    Up            0xFF52,
    F1            0xFFBE,
    F2            0xFFBF,
    F3            0xFFC0,
    F4            0xFFC1,
    F5            0xFFC2,
    F6            0xFFC3,
    F7            0xFFC4,
    F8            0xFFC5,
    F9            0xFFC6,
    F10           0xFFC7,
    F11           0xFFC8,
    F12           0xFFC9,
    F13           0xFFCA,
    F14           0xFFCB,
    F15           0xFFCC,
    F16           0xFFCD,
    F17           0xFFCE,
    F18           0xFFCF,
    F19           0xFFD0,
    F20           0xFFD1,
    F21           0xFFD2,
    F22           0xFFD3,
    F23           0xFFD4,
    F24           0xFFD5,
    F25           0xFFD6,
    KpDivide      0xFFAF,
    KpMultiply    0xFFAA,
    KpSubtract    0xFFAD,
    KpAdd         0xFFAB,
    Kp0           0xFFB0,
    Kp1           0xFFB1,
    Kp2           0xFFB2,
    Kp3           0xFFB3,
    Kp4           0xFFB4,
    Kp5           0xFFB5,
    Kp6           0xFFB6,
    Kp7           0xFFB7,
    Kp8           0xFFB8,
    Kp9           0xFFB9,
    KpDecimal     0xFFAE,
    KpDecimal     0xFFAC, // KP_Separator
    KpEqual       0xFFBD,
    KpEnter       0xFF8D,
    A             0x61,
    B             0x62,
    C             0x63,
    D             0x64,
    E             0x65,
    F             0x66,
    G             0x67,
    H             0x68,
    I             0x69,
    J             0x6A,
    K             0x6B,
    L             0x6C,
    M             0x6D,
    N             0x6E,
    O             0x6F,
    P             0x70,
    Q             0x71,
    R             0x72,
    S             0x73,
    T             0x74,
    U             0x75,
    V             0x76,
    W             0x77,
    X             0x78,
    Y             0x79,
    Z             0x7A,
    Num1          0x31,
    Num2          0x32,
    Num3          0x33,
    Num4          0x34,
    Num5          0x35,
    Num6          0x36,
    Num7          0x37,
    Num8          0x38,
    Num9          0x39,
    Num0          0x30,
    Space         0x20,
    Minus         0x2D,
    Equal         0x3D,
    LeftBracket   0x5B,
    RightBracket  0x5D,
    Backslash     0x5C,
    Semicolon     0x3B,
    Apostrophe    0x27,
    GraveAccent   0x60,
    Comma         0x2C,
    Period        0x2E,
    Slash         0x2F,
    World1        0x3C, // less
}

fn is_keypad_keysym(sym: x::KeySym) -> bool {
    (0xFFB0..=0xFFB9).contains(&sym) || [0xFFAC, 0xFFAE, 0xFFBD, 0xFF8D].contains(&sym)
}

/// The character a keysym stands for, if any.
pub(crate) fn keysym_to_char(sym: x::KeySym) -> Option<char> {
    let cp = match sym {
        0x20..=0x7E | 0xA0..=0xFF => sym as u32,
        0x0100_0000..=0x0110_FFFF => (sym - 0x0100_0000) as u32,
        0xFFB0..=0xFFB9 => (sym - 0xFFB0) as u32 + '0' as u32,
        0xFFAA => '*' as u32,
        0xFFAB => '+' as u32,
        0xFFAD => '-' as u32,
        0xFFAE => '.' as u32,
        0xFFAF => '/' as u32,
        0xFFBD => '=' as u32,
        _ => return None,
    };
    std::char::from_u32(cp)
}

/// Both directions of the keycode mapping.
pub(crate) struct KeyTables {
    keycodes: [Key; 256],
    scancodes: Vec<i32>,
}

impl KeyTables {
    pub unsafe fn load(xlib: &Xlib, x_display: *mut x::Display) -> Self {
        let mut keycodes = [Key::Unknown; 256];
        let mut scancodes = vec![-1; Key::LAST.raw() as usize + 1];
        let (mut min, mut max): (c_int, c_int) = (0, 0);
        (xlib.XDisplayKeycodes)(x_display, &mut min, &mut max);
        for keycode in min.max(0)..=max.min(255) {
            // The keypad is looked up on the second level, where the digits are.
            let shifted = (xlib.XkbKeycodeToKeysym)(x_display, keycode as x::KeyCode, 0, 1);
            let key = if is_keypad_keysym(shifted) {
                key_from_x_keysym(shifted)
            } else {
                key_from_x_keysym((xlib.XkbKeycodeToKeysym)(x_display, keycode as x::KeyCode, 0, 0))
            };
            keycodes[keycode as usize] = key;
            if let Some(i) = key.index() {
                if scancodes[i] < 0 {
                    scancodes[i] = keycode;
                }
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
    fn keysyms_map_to_keys() {
        assert_eq!(key_from_x_keysym(0x61), Key::A);
        assert_eq!(key_from_x_keysym(0xFFE7), Key::LeftAlt);
        assert_eq!(key_from_x_keysym(0xFFB5), Key::Kp5);
        assert_eq!(key_from_x_keysym(0x1234), Key::Unknown);
    }

    #[test]
    fn keysyms_map_to_chars() {
        assert_eq!(keysym_to_char(0x61), Some('a'));
        assert_eq!(keysym_to_char(0xE9), Some('é'));
        assert_eq!(keysym_to_char(0x0100_20AC), Some('€'));
        assert_eq!(keysym_to_char(0xFFB3), Some('3'));
        assert_eq!(keysym_to_char(0xFF0D), None);
    }
}
