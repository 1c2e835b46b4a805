// Useful reference: _XPrintDefaultError() in XlibInt.c (X11 sources)

use std::cell::Cell;
use std::ffi::CStr;
use std::os::raw::c_int;
use x11_dl::xlib::{self as x, Xlib};
use crate::error::{Error, Result};

thread_local! {
    static ERROR_CODE: Cell<Option<u8>> = Cell::new(None);
}

unsafe extern "C" fn our_xlib_error_handler(_x_display: *mut x::Display, e: *mut x::XErrorEvent) -> c_int {
    // NOTE: DO NOT make requests to the X server within X error handlers such as this one.
    if let Some(e) = e.as_ref() {
        ERROR_CODE.with(|c| c.set(Some(e.error_code)));
    }
    0 // The return value is ignored anyway
}

/// Records the first X error raised while `f` runs. Requests are synced on both ends, so the
/// error is known to come from `f`.
pub unsafe fn sync_catch<T, F: FnOnce() -> T>(xlib: &Xlib, x_display: *mut x::Display, f: F) -> Result<T> {
    (xlib.XSync)(x_display, x::False);
    ERROR_CODE.with(|c| c.set(None));
    let previous = (xlib.XSetErrorHandler)(Some(our_xlib_error_handler));
    let out = f();
    (xlib.XSync)(x_display, x::False);
    (xlib.XSetErrorHandler)(previous);
    match ERROR_CODE.with(|c| c.take()) {
        None => Ok(out),
        Some(code) => Err(Error::failed(format!("X error: {}", error_text(xlib, x_display, code)))),
    }
}

pub unsafe fn error_text(xlib: &Xlib, x_display: *mut x::Display, code: u8) -> String {
    let mut buf = [0 as std::os::raw::c_char; 256];
    (xlib.XGetErrorText)(x_display, code as c_int, buf.as_mut_ptr(), buf.len() as c_int);
    CStr::from_ptr(buf.as_ptr()).to_string_lossy().into_owned()
}
