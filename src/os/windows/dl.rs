//! Runtime-loaded system DLLs, for entry points that not every Windows version exports.

#![allow(non_snake_case)]

use std::ffi::CString;
use std::mem;
use super::winapi_utils::*;
use crate::error::{Error, Result};

pub(super) struct Dll {
    handle: HMODULE,
    name: &'static str,
}

impl Dll {
    pub fn open(name: &'static str) -> Option<Self> {
        let cname = CString::new(name).ok()?;
        let handle = unsafe { LoadLibraryA(cname.as_ptr()) };
        if handle.is_null() {
            debug!("Win32: {} is not available", name);
            return None;
        }
        Some(Self { handle, name })
    }

    /// `T` must be the `extern "system" fn` type of the symbol.
    pub unsafe fn sym<T: Copy>(&self, name: &str) -> Option<T> {
        debug_assert_eq!(mem::size_of::<T>(), mem::size_of::<FARPROC>());
        let cname = CString::new(name).ok()?;
        let f = GetProcAddress(self.handle, cname.as_ptr());
        if f.is_null() {
            None
        } else {
            Some(mem::transmute_copy(&f))
        }
    }

    pub unsafe fn required<T: Copy>(&self, name: &str) -> Result<T> {
        self.sym(name).ok_or_else(|| Error::api_unavailable(format!("Win32: Failed to load {} from {}", name, self.name)))
    }
}

impl Drop for Dll {
    fn drop(&mut self) {
        unsafe {
            FreeLibrary(self.handle);
        }
    }
}

macro_rules! optional_dll {
    ($name:ident($file:expr) { $(fn $f:ident($($arg:ty),*) -> $ret:ty;)+ }) => {
        pub(super) struct $name {
            $(pub $f: Option<unsafe extern "system" fn($($arg),*) -> $ret>,)+
            _dll: Dll,
        }
        impl $name {
            pub fn open() -> Option<Self> {
                let dll = Dll::open($file)?;
                unsafe {
                    Some(Self { $($f: dll.sym(stringify!($f)),)+ _dll: dll })
                }
            }
        }
    };
}

optional_dll!(User32Ext("user32.dll") {
    fn SetProcessDpiAwarenessContext(HANDLE) -> BOOL;
    fn GetDpiForWindow(HWND) -> UINT;
    fn AdjustWindowRectExForDpi(*mut RECT, DWORD, BOOL, DWORD, UINT) -> BOOL;
});

optional_dll!(Shcore("shcore.dll") {
    fn SetProcessDpiAwareness(PROCESS_DPI_AWARENESS) -> HRESULT;
    fn GetDpiForMonitor(HMONITOR, MONITOR_DPI_TYPE, *mut UINT, *mut UINT) -> HRESULT;
});

optional_dll!(Dwmapi("dwmapi.dll") {
    fn DwmIsCompositionEnabled(*mut BOOL) -> HRESULT;
    fn DwmFlush() -> HRESULT;
    fn DwmEnableBlurBehindWindow(HWND, *const DWM_BLURBEHIND) -> HRESULT;
    fn DwmGetColorizationColor(*mut DWORD, *mut BOOL) -> HRESULT;
});

/// The legacy WGL entry points, which live in opengl32.dll rather than in the ICD.
pub(super) struct Opengl32 {
    pub wglCreateContext: unsafe extern "system" fn(HDC) -> HGLRC,
    pub wglDeleteContext: unsafe extern "system" fn(HGLRC) -> BOOL,
    pub wglGetProcAddress: unsafe extern "system" fn(*const c_char) -> *const c_void,
    pub wglGetCurrentDC: unsafe extern "system" fn() -> HDC,
    pub wglGetCurrentContext: unsafe extern "system" fn() -> HGLRC,
    pub wglMakeCurrent: unsafe extern "system" fn(HDC, HGLRC) -> BOOL,
    pub wglShareLists: unsafe extern "system" fn(HGLRC, HGLRC) -> BOOL,
    pub dll: Dll,
}

impl Opengl32 {
    pub fn open() -> Result<Self> {
        let dll = Dll::open("opengl32.dll").ok_or_else(|| Error::api_unavailable("WGL: Failed to load opengl32.dll"))?;
        unsafe {
            Ok(Self {
                wglCreateContext: dll.required("wglCreateContext")?,
                wglDeleteContext: dll.required("wglDeleteContext")?,
                wglGetProcAddress: dll.required("wglGetProcAddress")?,
                wglGetCurrentDC: dll.required("wglGetCurrentDC")?,
                wglGetCurrentContext: dll.required("wglGetCurrentContext")?,
                wglMakeCurrent: dll.required("wglMakeCurrent")?,
                wglShareLists: dll.required("wglShareLists")?,
                dll,
            })
        }
    }
}

/// The DLLs loaded once at connection time.
pub(super) struct Libs {
    pub user32: Option<User32Ext>,
    pub shcore: Option<Shcore>,
    pub dwmapi: Option<Dwmapi>,
}

impl Libs {
    pub fn load() -> Self {
        Self {
            user32: User32Ext::open(),
            shcore: Shcore::open(),
            dwmapi: Dwmapi::open(),
        }
    }

    pub fn dwm_composition_enabled(&self) -> bool {
        let f = match self.dwmapi.as_ref().and_then(|d| d.DwmIsCompositionEnabled) {
            Some(f) => f,
            None => return false,
        };
        let mut enabled = FALSE;
        unsafe { SUCCEEDED(f(&mut enabled)) && enabled != FALSE }
    }

    /// Whether the DWM colorization is opaque, in which case blur-behind can't be used.
    pub fn dwm_colorization_opaque(&self) -> bool {
        let f = match self.dwmapi.as_ref().and_then(|d| d.DwmGetColorizationColor) {
            Some(f) => f,
            None => return true,
        };
        let (mut color, mut opaque) = (0, FALSE);
        unsafe { !SUCCEEDED(f(&mut color, &mut opaque)) || opaque != FALSE }
    }

    pub fn dwm_flush(&self) {
        if let Some(f) = self.dwmapi.as_ref().and_then(|d| d.DwmFlush) {
            unsafe {
                f();
            }
        }
    }
}
