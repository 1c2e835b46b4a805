//! The winapi items the backend uses, plus string and error helpers.

#![allow(non_snake_case)]

pub use std::os::raw::{c_char, c_int, c_void};
pub use winapi::shared::basetsd::{LONG_PTR, UINT_PTR};
pub use winapi::shared::hidusage::{HID_USAGE_GENERIC_MOUSE, HID_USAGE_PAGE_GENERIC};
pub use winapi::shared::minwindef::*;
pub use winapi::shared::ntdef::{HANDLE, HRESULT, LONG, LPCWSTR, LPWSTR, WCHAR};
pub use winapi::shared::windef::*;
pub use winapi::shared::windowsx::{GET_X_LPARAM, GET_Y_LPARAM};
pub use winapi::shared::winerror::SUCCEEDED;
pub use winapi::um::dwmapi::{DWM_BB_BLURREGION, DWM_BB_ENABLE, DWM_BLURBEHIND};
pub use winapi::um::errhandlingapi::GetLastError;
pub use winapi::um::libloaderapi::{FreeLibrary, GetModuleHandleW, GetProcAddress, LoadLibraryA};
pub use winapi::um::shellapi::{DragAcceptFiles, DragFinish, DragQueryFileW, DragQueryPoint, HDROP};
pub use winapi::um::shellscalingapi::{MDT_EFFECTIVE_DPI, MONITOR_DPI_TYPE, PROCESS_DPI_AWARENESS, PROCESS_PER_MONITOR_DPI_AWARE};
pub use winapi::um::sysinfoapi::GetVersionExW;
pub use winapi::um::winbase::{
    FormatMessageW, GlobalAlloc, GlobalFree, GlobalLock, GlobalUnlock, SetThreadExecutionState,
    FORMAT_MESSAGE_FROM_SYSTEM, FORMAT_MESSAGE_IGNORE_INSERTS, GMEM_MOVEABLE,
};
pub use winapi::um::wingdi::*;
pub use winapi::um::winnt::{OSVERSIONINFOW, ES_CONTINUOUS, ES_DISPLAY_REQUIRED};
pub use winapi::um::winuser::*;

use std::ffi::OsStr;
use std::iter;
use std::os::windows::ffi::OsStrExt;
use std::ptr;
use crate::error::{Error, Result};

pub const USER_DEFAULT_SCREEN_DPI: UINT = 96;
pub const WM_COPYGLOBALDATA: UINT = 0x0049;
pub const WM_DWMCOMPOSITIONCHANGED: UINT = 0x031E;
pub const WM_DWMCOLORIZATIONCOLORCHANGED: UINT = 0x0320;
pub const WM_DPICHANGED: UINT = 0x02E0;
pub const UNICODE_NOCHAR: WPARAM = 0xFFFF;
pub const DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2: isize = -4;

pub fn MAKEINTATOM(atom: ATOM) -> LPCWSTR {
    atom as usize as LPCWSTR
}

pub fn to_wide_with_nul(s: &str) -> Vec<WCHAR> {
    OsStr::new(s).encode_wide().chain(iter::once(0)).collect()
}

/// Decodes up to the first nul, or the whole slice.
pub fn from_wide(s: &[WCHAR]) -> String {
    let len = s.iter().position(|&c| c == 0).unwrap_or(s.len());
    String::from_utf16_lossy(&s[..len])
}

fn system_message(code: DWORD) -> String {
    let mut buf = [0 as WCHAR; 512];
    let len = unsafe {
        FormatMessageW(
            FORMAT_MESSAGE_FROM_SYSTEM | FORMAT_MESSAGE_IGNORE_INSERTS,
            ptr::null(), code, 0,
            buf.as_mut_ptr(), buf.len() as DWORD, ptr::null_mut()
        )
    };
    from_wide(&buf[..len as usize]).trim_end().to_owned()
}

/// Describes `GetLastError()` after a failed call to `name`.
pub fn winapi_error(name: &str) -> Error {
    let code = unsafe { GetLastError() };
    Error::failed(format!("Win32: {}() failed: {} (error {:#x})", name, system_message(code), code))
}

pub fn winapi_fail<T>(name: &str) -> Result<T> {
    Err(winapi_error(name))
}

pub fn hresult_to_result(name: &str, hresult: HRESULT) -> Result<()> {
    if SUCCEEDED(hresult) {
        return Ok(());
    }
    Err(Error::failed(format!("Win32: {}() failed: {} (HRESULT {:#x})", name, system_message(hresult as DWORD), hresult)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_strings_stop_at_nul() {
        let wide = to_wide_with_nul("héllo");
        assert_eq!(wide.last(), Some(&0));
        assert_eq!(from_wide(&wide), "héllo");
        assert_eq!(from_wide(&[0x61, 0x62]), "ab");
    }
}
