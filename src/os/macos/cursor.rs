//! Cursors, cursor visibility and warping, and the general pasteboard.

use std::ptr;
use objc2::rc::{Allocated, Retained};
use objc2::runtime::{AnyObject, Sel};
use objc2::{class, msg_send, sel};
use objc2_foundation::{NSArray, NSPoint, NSRect, NSSize, NSString};
use super::ffi::*;
use super::CocoaShared;
use crate::cursor::StandardCursor;
use crate::error::{self, Error, Result};
use crate::image::RgbaImage;
use crate::input::CursorMode;
use crate::platform::{CursorId, WindowId};
use crate::Vec2;

/// The `NSCursor` class method for a shape. Diagonal resize cursors are private
/// and may be missing.
fn standard_selector(shape: StandardCursor) -> Sel {
    match shape {
        StandardCursor::Arrow => sel!(arrowCursor),
        StandardCursor::IBeam => sel!(IBeamCursor),
        StandardCursor::Crosshair => sel!(crosshairCursor),
        StandardCursor::PointingHand => sel!(pointingHandCursor),
        StandardCursor::ResizeEW => sel!(resizeLeftRightCursor),
        StandardCursor::ResizeNS => sel!(resizeUpDownCursor),
        StandardCursor::ResizeNWSE => sel!(_windowResizeNorthWestSouthEastCursor),
        StandardCursor::ResizeNESW => sel!(_windowResizeNorthEastSouthWestCursor),
        StandardCursor::ResizeAll => sel!(closedHandCursor),
        StandardCursor::NotAllowed => sel!(operationNotAllowedCursor),
    }
}

fn rgba_bytes(image: &RgbaImage) -> Vec<u8> {
    let mut out = Vec::with_capacity(image.pixels.len() * 4);
    for p in &image.pixels {
        out.extend_from_slice(&[p.r, p.g, p.b, p.a]);
    }
    out
}

impl CocoaShared {
    pub(super) fn show_cursor(&self) {
        if self.cursor_hidden.replace(false) {
            unsafe {
                let _: () = msg_send![class!(NSCursor), unhide];
            }
        }
    }

    pub(super) fn hide_cursor(&self) {
        if !self.cursor_hidden.replace(true) {
            unsafe {
                let _: () = msg_send![class!(NSCursor), hide];
            }
        }
    }

    /// Shows the window's cursor image, or hides the cursor, while it is over the
    /// content area.
    pub(super) fn update_cursor_image(&self, id: WindowId) {
        if !self.cocoa_window_hovered(id).unwrap_or(false) {
            return;
        }
        let (mode, cursor) = match self.with_window(id, |w| (w.cursor_mode, w.cursor)) {
            Ok(state) => state,
            Err(_) => return,
        };
        if mode != CursorMode::Normal {
            self.hide_cursor();
            return;
        }
        self.show_cursor();
        let object = cursor.and_then(|c| self.cursors.borrow().get(&c).cloned());
        unsafe {
            match object {
                Some(object) => {
                    let _: () = msg_send![&*object, set];
                },
                None => {
                    let arrow: Retained<AnyObject> = msg_send![class!(NSCursor), arrowCursor];
                    let _: () = msg_send![&*arrow, set];
                },
            }
        }
    }

    pub(super) fn cocoa_cursor_pos(&self, id: WindowId) -> Result<Vec2<f64>> {
        let (object, view) = self.with_window(id, |w| (w.object.clone(), w.view.clone()))?;
        unsafe {
            let frame: NSRect = msg_send![&*view, frame];
            let pos: NSPoint = msg_send![&*object, mouseLocationOutsideOfEventStream];
            Ok(Vec2::new(pos.x, frame.size.height - pos.y))
        }
    }

    pub(super) fn cocoa_set_cursor_pos(&self, id: WindowId, pos: Vec2<f64>) -> Result<()> {
        self.update_cursor_image(id);
        let (object, view) = self.with_window(id, |w| (w.object.clone(), w.view.clone()))?;
        let global = unsafe {
            let frame: NSRect = msg_send![&*view, frame];
            let local: NSPoint = msg_send![&*object, mouseLocationOutsideOfEventStream];
            let delta = Vec2::new(pos.x - local.x, pos.y - (frame.size.height - local.y));
            self.with_window(id, |w| {
                w.warp_delta += delta;
                w.cursor_pos = pos;
            })?;
            let rect = NSRect::new(NSPoint::new(pos.x, frame.size.height - pos.y - 1.), NSSize::new(0., 0.));
            let rect: NSRect = msg_send![&*object, convertRectToScreen: rect];
            rect.origin
        };
        let point = NSPoint::new(global.x, super::window::transform_y(global.y));
        if unsafe { CGWarpMouseCursorPosition(point) } != kCGErrorSuccess {
            return error::failed("Cocoa: Failed to warp the cursor");
        }
        // Warping suppresses events for a moment unless the mouse is re-associated.
        let disabled = self.with_window(id, |w| w.cursor_mode == CursorMode::Disabled)?;
        if !disabled {
            unsafe {
                CGAssociateMouseAndMouseCursorPosition(1);
            }
        }
        Ok(())
    }

    pub(super) fn cocoa_apply_cursor_mode(&self, id: WindowId, mode: CursorMode) -> Result<()> {
        self.with_window(id, |w| w.cursor_mode = mode)?;
        unsafe {
            CGAssociateMouseAndMouseCursorPosition((mode != CursorMode::Disabled) as u32);
        }
        if mode == CursorMode::Normal {
            self.show_cursor();
        }
        self.update_cursor_image(id);
        Ok(())
    }

    pub(super) fn cocoa_create_cursor(&self, id: CursorId, image: &RgbaImage, hot: Vec2<i32>) -> Result<()> {
        let (w, h) = (image.size.w as isize, image.size.h as isize);
        let bytes = rgba_bytes(image);
        let cursor: Option<Retained<AnyObject>> = unsafe {
            let space = NSString::from_str(NSCalibratedRGBColorSpace);
            let rep: Allocated<AnyObject> = msg_send![class!(NSBitmapImageRep), alloc];
            let rep: Option<Retained<AnyObject>> = msg_send![rep,
                initWithBitmapDataPlanes: ptr::null_mut::<*mut u8>(),
                pixelsWide: w,
                pixelsHigh: h,
                bitsPerSample: 8isize,
                samplesPerPixel: 4isize,
                hasAlpha: true,
                isPlanar: false,
                colorSpaceName: &*space,
                bitmapFormat: NSBitmapFormatAlphaNonpremultiplied,
                bytesPerRow: w * 4,
                bitsPerPixel: 32isize];
            let rep = rep.ok_or_else(|| Error::failed("Cocoa: Failed to create cursor bitmap"))?;
            let data: *mut u8 = msg_send![&*rep, bitmapData];
            if data.is_null() {
                return error::failed("Cocoa: Cursor bitmap has no storage");
            }
            ptr::copy_nonoverlapping(bytes.as_ptr(), data, bytes.len());

            let native: Allocated<AnyObject> = msg_send![class!(NSImage), alloc];
            let native: Option<Retained<AnyObject>> = msg_send![native, initWithSize: NSSize::new(w as f64, h as f64)];
            let native = native.ok_or_else(|| Error::failed("Cocoa: Failed to create cursor image"))?;
            let _: () = msg_send![&*native, addRepresentation: &*rep];

            let cursor: Allocated<AnyObject> = msg_send![class!(NSCursor), alloc];
            msg_send![cursor, initWithImage: &*native, hotSpot: NSPoint::new(hot.x as f64, hot.y as f64)]
        };
        let cursor = cursor.ok_or_else(|| Error::failed("Cocoa: Failed to create cursor"))?;
        self.cursors.borrow_mut().insert(id, cursor);
        Ok(())
    }

    pub(super) fn cocoa_create_standard_cursor(&self, id: CursorId, shape: StandardCursor) -> Result<()> {
        let selector = standard_selector(shape);
        let cursor: Option<Retained<AnyObject>> = unsafe {
            let class = class!(NSCursor);
            let known: bool = msg_send![class, respondsToSelector: selector];
            if known {
                msg_send![class, performSelector: selector]
            } else {
                None
            }
        };
        let cursor = cursor.ok_or_else(|| Error::failed(format!("Cocoa: Standard cursor {:?} is unavailable", shape)))?;
        self.cursors.borrow_mut().insert(id, cursor);
        Ok(())
    }

    pub(super) fn cocoa_destroy_cursor(&self, id: CursorId) -> Result<()> {
        self.cursors.borrow_mut().remove(&id);
        Ok(())
    }

    pub(super) fn cocoa_set_cursor(&self, window: WindowId, cursor: Option<CursorId>) -> Result<()> {
        self.with_window(window, |w| w.cursor = cursor)?;
        self.update_cursor_image(window);
        Ok(())
    }

    pub(super) fn cocoa_set_clipboard_string(&self, s: &str) -> Result<()> {
        let kind = NSString::from_str(NSPasteboardTypeString);
        let string = NSString::from_str(s);
        unsafe {
            let pasteboard: Retained<AnyObject> = msg_send![class!(NSPasteboard), generalPasteboard];
            let types = NSArray::from_retained_slice(&[kind.clone()]);
            let _: isize = msg_send![&*pasteboard, declareTypes: &*types, owner: None::<&AnyObject>];
            let ok: bool = msg_send![&*pasteboard, setString: &*string, forType: &*kind];
            if !ok {
                return error::failed("Cocoa: Failed to write to the pasteboard");
            }
        }
        Ok(())
    }

    pub(super) fn cocoa_clipboard_string(&self) -> Result<String> {
        let kind = NSString::from_str(NSPasteboardTypeString);
        let string: Option<Retained<NSString>> = unsafe {
            let pasteboard: Retained<AnyObject> = msg_send![class!(NSPasteboard), generalPasteboard];
            msg_send![&*pasteboard, stringForType: &*kind]
        };
        match string {
            Some(string) => Ok(string.to_string()),
            None => error::format_unavailable("Cocoa: Failed to retrieve string from pasteboard"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Extent2, Rgba};

    #[test]
    fn cursor_bitmaps_are_rgba() {
        let image = RgbaImage::new(Extent2::new(2, 1), vec![Rgba::new(1, 2, 3, 4), Rgba::new(5, 6, 7, 8)]).unwrap();
        assert_eq!(rgba_bytes(&image), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn every_shape_has_a_selector() {
        assert_eq!(standard_selector(StandardCursor::Arrow), sel!(arrowCursor));
        assert_ne!(standard_selector(StandardCursor::ResizeNWSE), standard_selector(StandardCursor::ResizeNESW));
    }
}
