//! `_MOTIF_WM_HINTS`, the de facto way to ask window managers for no decorations.

use std::os::raw::{c_long, c_ulong};

pub mod flags {
    use super::*;
    pub const DECORATIONS : c_ulong = 1 << 1;
}
pub mod decorations {
    use super::*;
    pub const ALL         : c_ulong = 1 << 0;
}

#[derive(Debug, Default, Copy, Clone, Hash, PartialEq, Eq)]
#[repr(C)]
pub struct Hints {
    pub flags      : c_ulong,
    pub functions  : c_ulong,
    pub decorations: c_ulong,
    pub input_mode : c_long,
    pub state      : c_ulong,
}

impl Hints {
    pub fn decorated(decorated: bool) -> Self {
        Self {
            flags: flags::DECORATIONS,
            decorations: if decorated { decorations::ALL } else { 0 },
            .. Self::default()
        }
    }
    pub fn into_array(self) -> [c_ulong; 5] {
        let Self { flags, functions, decorations, input_mode, state } = self;
        [flags, functions, decorations, input_mode as _, state]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undecorated_hints_clear_everything() {
        assert_eq!(Hints::decorated(false).into_array(), [flags::DECORATIONS, 0, 0, 0, 0]);
        assert_eq!(Hints::decorated(true).into_array()[2], decorations::ALL);
    }
}
