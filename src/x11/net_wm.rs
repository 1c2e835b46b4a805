use std::os::raw::c_long;

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
#[repr(i64)]
pub enum NetWMStateAction {
    Remove = 0,
    Add    = 1,
}

impl NetWMStateAction {
    pub fn from_bool(add: bool) -> Self {
        if add { NetWMStateAction::Add } else { NetWMStateAction::Remove }
    }
    pub fn raw(self) -> c_long {
        self as i64 as c_long
    }
}

/// Value of `_NET_WM_BYPASS_COMPOSITOR`.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
#[repr(u32)]
pub enum BypassCompositor {
    NoPreference = 0,
    Yes = 1,
}
