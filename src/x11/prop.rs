use std::os::raw::{c_char, c_int, c_long, c_uchar, c_ulong};
use std::ptr;
use x11_dl::xlib::{self as x, Xlib};
use super::missing_bits::xlib::PropModeReplace;
use crate::error::{self, Result};

#[derive(Debug, Default, Clone, Hash, PartialEq, Eq)]
pub struct PropData<T> {
    pub data: Vec<T>,
    pub actual_type: x::Atom,
}

pub trait PropElement: Copy {
    const SERVER_BITS: usize;
}

impl PropElement for c_ulong  { const SERVER_BITS: usize = 32; }
impl PropElement for c_long   { const SERVER_BITS: usize = 32; }
impl PropElement for c_uchar  { const SERVER_BITS: usize =  8; }
impl PropElement for c_char   { const SERVER_BITS: usize =  8; }

pub unsafe fn set<T: PropElement>(xlib: &Xlib, x_display: *mut x::Display, x_window: x::Window, prop: x::Atom, prop_type: x::Atom, data: &[T]) {
    (xlib.XChangeProperty)(x_display, x_window, prop, prop_type, T::SERVER_BITS as c_int, PropModeReplace, data.as_ptr() as *const c_uchar, data.len() as c_int);
}

/// Reads a whole property. Returns `Ok(None)` when it doesn't exist.
pub unsafe fn get<T: PropElement>(xlib: &Xlib, x_display: *mut x::Display, x_window: x::Window, prop: x::Atom, req_type: x::Atom) -> Result<Option<PropData<T>>> {
    let mut actual_type: x::Atom = 0;
    let mut actual_format: c_int = 0;
    let mut nitems: c_ulong = 0;
    let mut bytes_after: c_ulong = 0;
    let mut data_ptr: *mut c_uchar = ptr::null_mut();
    let status = (xlib.XGetWindowProperty)(
        x_display, x_window, prop, 0, c_long::max_value(), x::False,
        req_type, &mut actual_type,
        &mut actual_format, &mut nitems,
        &mut bytes_after, &mut data_ptr
    );
    if status != x::Success as c_int {
        return error::failed(format!("XGetWindowProperty() returned {}", status));
    }
    if actual_type == 0 {
        if !data_ptr.is_null() {
            (xlib.XFree)(data_ptr as *mut _);
        }
        return Ok(None);
    }
    if actual_format != T::SERVER_BITS as c_int {
        (xlib.XFree)(data_ptr as *mut _);
        return error::failed(format!("The actual format for this property is {} server-side bits", actual_format));
    }
    let mut data = Vec::with_capacity(nitems as usize);
    if !data_ptr.is_null() {
        // 32-bit items come back as longs, so T's size is right either way.
        data.extend_from_slice(std::slice::from_raw_parts(data_ptr as *const T, nitems as usize));
        (xlib.XFree)(data_ptr as *mut _);
    }
    Ok(Some(PropData { data, actual_type }))
}
