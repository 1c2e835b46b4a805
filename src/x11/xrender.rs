use std::os::raw::c_int;
use x11_dl::xlib as x;
use x11_dl::xrender::Xrender;
use crate::error::{self, Error, Result};

pub struct XRender {
    pub lib: Xrender,
    pub error_base: c_int,
    pub event_base: c_int,
}

impl XRender {
    pub unsafe fn query(x_display: *mut x::Display) -> Result<Self> {
        let lib = Xrender::open().map_err(|e| Error::failed(format!("Failed to load libXrender: {}", e)))?;
        let (mut error_base, mut event_base) = (0, 0);
        let has_it = (lib.XRenderQueryExtension)(x_display, &mut event_base, &mut error_base);
        if has_it == x::False {
            return error::failed("XRenderQueryExtension() returned False");
        }
        Ok(Self { lib, error_base, event_base })
    }

    /// Whether windows with this visual can be blended by a compositor.
    pub unsafe fn visual_has_alpha(&self, x_display: *mut x::Display, visual: *mut x::Visual) -> bool {
        let format = (self.lib.XRenderFindVisualFormat)(x_display, visual);
        !format.is_null() && (*format).direct.alphaMask != 0
    }
}
