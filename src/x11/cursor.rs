use std::ffi::CString;
use std::os::raw::{c_int, c_uint};
use x11_dl::xlib as x;
use super::missing_bits::cursor_font::*;
use super::missing_bits::xi::{XIAllMasterDevices, XI_RawMotion};
use super::missing_bits::xlib::{ButtonPressMask, ButtonReleaseMask, GrabModeAsync, PointerMotionMask};
use super::X11Platform;
use crate::cursor::StandardCursor;
use crate::error::{self, Error, Result};
use crate::image::RgbaImage;
use crate::input::CursorMode;
use crate::platform::{CursorId, WindowId};
use crate::Vec2;

fn theme_name(shape: StandardCursor) -> &'static str {
    match shape {
        StandardCursor::Arrow => "default",
        StandardCursor::IBeam => "text",
        StandardCursor::Crosshair => "crosshair",
        StandardCursor::PointingHand => "pointer",
        StandardCursor::ResizeEW => "ew-resize",
        StandardCursor::ResizeNS => "ns-resize",
        StandardCursor::ResizeNWSE => "nwse-resize",
        StandardCursor::ResizeNESW => "nesw-resize",
        StandardCursor::ResizeAll => "all-scroll",
        StandardCursor::NotAllowed => "not-allowed",
    }
}

/// The core cursor font has no diagonal or "not allowed" shapes.
fn font_shape(shape: StandardCursor) -> Option<c_uint> {
    Some(match shape {
        StandardCursor::Arrow => XC_left_ptr,
        StandardCursor::IBeam => XC_xterm,
        StandardCursor::Crosshair => XC_crosshair,
        StandardCursor::PointingHand => XC_hand2,
        StandardCursor::ResizeEW => XC_sb_h_double_arrow,
        StandardCursor::ResizeNS => XC_sb_v_double_arrow,
        StandardCursor::ResizeAll => XC_fleur,
        StandardCursor::ResizeNWSE | StandardCursor::ResizeNESW | StandardCursor::NotAllowed => return None,
    })
}

impl X11Platform {
    /// An invisible 1x1 cursor, shown in the hidden and disabled modes.
    pub(super) unsafe fn create_hidden_cursor(xlib: &x::Xlib, x_display: *mut x::Display, root: x::Window) -> x::Cursor {
        let pixmap = (xlib.XCreatePixmap)(x_display, root, 1, 1, 1);
        let mut color: x::XColor = std::mem::zeroed();
        let cursor = (xlib.XCreatePixmapCursor)(x_display, pixmap, pixmap, &mut color, &mut color, 0, 0);
        (xlib.XFreePixmap)(x_display, pixmap);
        cursor
    }

    pub(super) fn x11_create_cursor(&self, id: CursorId, image: &RgbaImage, hot: Vec2<i32>) -> Result<()> {
        let xcursor = self.xcursor.as_ref().ok_or_else(|| Error::failed("Custom cursors need libXcursor"))?;
        let cursor = unsafe {
            let native = (xcursor.XcursorImageCreate)(image.size.w as c_int, image.size.h as c_int);
            if native.is_null() {
                return error::failed("XcursorImageCreate() failed");
            }
            (*native).xhot = hot.x as _;
            (*native).yhot = hot.y as _;
            let pixels = std::slice::from_raw_parts_mut((*native).pixels, image.pixels.len());
            for (dst, src) in pixels.iter_mut().zip(image.to_argb(true)) {
                *dst = src;
            }
            let cursor = (xcursor.XcursorImageLoadCursor)(self.x_display, native);
            (xcursor.XcursorImageDestroy)(native);
            cursor
        };
        if cursor == 0 {
            return error::failed("Failed to create an X cursor from the image");
        }
        self.cursors.borrow_mut().insert(id, cursor);
        Ok(())
    }

    pub(super) fn x11_create_standard_cursor(&self, id: CursorId, shape: StandardCursor) -> Result<()> {
        let mut cursor = 0;
        unsafe {
            if let Some(xcursor) = self.xcursor.as_ref() {
                let theme = (xcursor.XcursorGetTheme)(self.x_display);
                if !theme.is_null() {
                    let size = (xcursor.XcursorGetDefaultSize)(self.x_display);
                    let name = CString::new(theme_name(shape)).unwrap_or_default();
                    let image = (xcursor.XcursorLibraryLoadImage)(name.as_ptr(), theme, size);
                    if !image.is_null() {
                        cursor = (xcursor.XcursorImageLoadCursor)(self.x_display, image);
                        (xcursor.XcursorImageDestroy)(image);
                    }
                }
            }
            if cursor == 0 {
                let font = font_shape(shape).ok_or_else(|| Error::failed(format!("Standard cursor {:?} is unavailable", shape)))?;
                cursor = (self.xlib.XCreateFontCursor)(self.x_display, font);
            }
        }
        if cursor == 0 {
            return error::failed("Failed to create standard cursor");
        }
        self.cursors.borrow_mut().insert(id, cursor);
        Ok(())
    }

    pub(super) fn x11_destroy_cursor(&self, id: CursorId) -> Result<()> {
        if let Some(cursor) = self.cursors.borrow_mut().remove(&id) {
            unsafe {
                (self.xlib.XFreeCursor)(self.x_display, cursor);
            }
        }
        Ok(())
    }

    unsafe fn define_cursor(&self, handle: x::Window, cursor: x::Cursor) {
        if cursor == 0 {
            (self.xlib.XUndefineCursor)(self.x_display, handle);
        } else {
            (self.xlib.XDefineCursor)(self.x_display, handle, cursor);
        }
        (self.xlib.XFlush)(self.x_display);
    }

    pub(super) fn x11_set_cursor(&self, id: WindowId, cursor: Option<CursorId>) -> Result<()> {
        let (handle, effective) = {
            let mut windows = self.windows.borrow_mut();
            let w = windows.get_mut(&id).ok_or_else(|| Error::failed(format!("Unknown window {:?}", id)))?;
            w.cursor = cursor;
            (w.handle, self.effective_x_cursor(w))
        };
        unsafe {
            self.define_cursor(handle, effective);
        }
        Ok(())
    }

    unsafe fn select_raw_motion(&self, enabled: bool) {
        if let Some(xi) = self.xi.as_ref() {
            let events: &[c_int] = if enabled { &[XI_RawMotion] } else { &[] };
            xi.select_events(self.x_display, self.root, XIAllMasterDevices, events);
        }
    }

    pub(super) fn x11_apply_cursor_mode(&self, id: WindowId, mode: CursorMode, raw_motion: bool) -> Result<()> {
        let (handle, effective) = {
            let mut windows = self.windows.borrow_mut();
            let w = windows.get_mut(&id).ok_or_else(|| Error::failed(format!("Unknown window {:?}", id)))?;
            w.cursor_mode = mode;
            (w.handle, self.effective_x_cursor(w))
        };
        unsafe {
            if mode == CursorMode::Disabled {
                self.disabled_window.set(Some(id));
                self.select_raw_motion(raw_motion && self.xi.is_some());
                let grabbed = (self.xlib.XGrabPointer)(
                    self.x_display, handle, x::True,
                    (ButtonPressMask | ButtonReleaseMask | PointerMotionMask) as c_uint,
                    GrabModeAsync, GrabModeAsync,
                    handle, self.hidden_cursor, x::CurrentTime
                );
                if grabbed != 0 {
                    warn!("XGrabPointer() returned {}, the cursor is not confined", grabbed);
                }
            } else if self.disabled_window.get() == Some(id) {
                self.disabled_window.set(None);
                self.select_raw_motion(false);
                (self.xlib.XUngrabPointer)(self.x_display, x::CurrentTime);
            }
            self.define_cursor(handle, effective);
        }
        Ok(())
    }

    pub(super) fn x11_raw_mouse_motion_supported(&self) -> bool {
        self.xi.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_shape_has_a_theme_name() {
        for &shape in StandardCursor::ALL.iter() {
            assert!(!theme_name(shape).is_empty());
        }
        assert_eq!(font_shape(StandardCursor::NotAllowed), None);
        assert_eq!(font_shape(StandardCursor::IBeam), Some(XC_xterm));
    }
}
