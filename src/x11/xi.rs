use std::os::raw::{c_int, c_uchar};
use x11_dl::xlib::{self as x, Xlib};
use x11_dl::xinput2::{self as xi2, XInput2};
use super::missing_bits::xi::{XIMaskLen, XISetMask, XI_LASTEVENT};
use crate::error::{self, Error, Result};

pub struct XI {
    pub lib: XInput2,
    pub major_opcode: c_int,
    pub event_base: c_int,
    pub error_base: c_int,
    pub major_version: c_int,
    pub minor_version: c_int,
}

impl XI {
    pub unsafe fn query(xlib: &Xlib, x_display: *mut x::Display) -> Result<Self> {
        let lib = XInput2::open().map_err(|e| Error::failed(format!("Failed to load libXi: {}", e)))?;
        let (mut major_opcode, mut event_base, mut error_base) = (0, 0, 0);
        let has_it = (xlib.XQueryExtension)(
            x_display, b"XInputExtension\0".as_ptr() as *const _,
            &mut major_opcode, &mut event_base, &mut error_base
        );
        if has_it == x::False {
            return error::failed("X server lacks the XInput extension");
        }
        // Raw motion needs 2.0.
        let (mut major_version, mut minor_version) = (2, 0);
        let status = (lib.XIQueryVersion)(x_display, &mut major_version, &mut minor_version);
        if status != x::Success as c_int {
            return error::failed("X server doesn't have XInput 2.0");
        }
        Ok(Self { lib, major_opcode, event_base, error_base, major_version, minor_version })
    }

    /// Replaces the event selection of all master devices on `x_window`.
    pub unsafe fn select_events(&self, x_display: *mut x::Display, x_window: x::Window, device: c_int, events: &[c_int]) {
        let mut mask_mem = vec![0 as c_uchar; XIMaskLen(XI_LASTEVENT) as usize];
        for ev in events {
            XISetMask(&mut mask_mem, *ev);
        }
        let mut mask = xi2::XIEventMask {
            deviceid: device,
            mask_len: mask_mem.len() as c_int,
            mask: mask_mem.as_mut_ptr(),
        };
        (self.lib.XISelectEvents)(x_display, x_window, &mut mask, 1);
    }
}
