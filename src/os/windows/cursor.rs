//! Cursor images, confinement and raw mouse input; also the clipboard.

use std::mem;
use std::ptr;
use std::slice;
use std::thread;
use std::time::Duration;
use super::window::client_rect_on_screen;
use super::winapi_utils::*;
use super::Win32Shared;
use crate::cursor::StandardCursor;
use crate::error::{self, Error, Result};
use crate::image::RgbaImage;
use crate::input::CursorMode;
use crate::platform::{CursorId, WindowId};
use crate::Vec2;

pub(super) struct Win32Cursor {
    pub handle: HCURSOR,
    /// Shared system cursors must not be destroyed.
    pub owned: bool,
}

/// Builds an icon or cursor from straight RGBA pixels, through a top-down 32-bit DIB.
pub(super) unsafe fn create_icon(image: &RgbaImage, hot: Vec2<i32>, icon: bool) -> Result<HICON> {
    let (w, h) = (image.size.w as LONG, image.size.h as LONG);
    let mut bi: BITMAPV5HEADER = mem::zeroed();
    bi.bV5Size = mem::size_of::<BITMAPV5HEADER>() as DWORD;
    bi.bV5Width = w;
    bi.bV5Height = -h;
    bi.bV5Planes = 1;
    bi.bV5BitCount = 32;
    bi.bV5Compression = BI_BITFIELDS;
    bi.bV5RedMask = 0x00ff_0000;
    bi.bV5GreenMask = 0x0000_ff00;
    bi.bV5BlueMask = 0x0000_00ff;
    bi.bV5AlphaMask = 0xff00_0000;

    let dc = GetDC(ptr::null_mut());
    let mut target: *mut c_void = ptr::null_mut();
    let color = CreateDIBSection(dc, &bi as *const BITMAPV5HEADER as *const BITMAPINFO, DIB_RGB_COLORS, &mut target, ptr::null_mut(), 0);
    ReleaseDC(ptr::null_mut(), dc);
    if color.is_null() {
        return winapi_fail("CreateDIBSection");
    }
    let mask = CreateBitmap(w, h, 1, 1, ptr::null());
    if mask.is_null() {
        DeleteObject(color as HGDIOBJ);
        return winapi_fail("CreateBitmap");
    }

    let dst = slice::from_raw_parts_mut(target as *mut u8, image.pixels.len() * 4);
    for (px, out) in image.pixels.iter().zip(dst.chunks_exact_mut(4)) {
        out.copy_from_slice(&[px.b, px.g, px.r, px.a]);
    }

    let mut ii: ICONINFO = mem::zeroed();
    ii.fIcon = icon as BOOL;
    ii.xHotspot = hot.x as DWORD;
    ii.yHotspot = hot.y as DWORD;
    ii.hbmMask = mask;
    ii.hbmColor = color;
    let handle = CreateIconIndirect(&mut ii);

    DeleteObject(color as HGDIOBJ);
    DeleteObject(mask as HGDIOBJ);
    if handle.is_null() {
        return winapi_fail(if icon { "CreateIconIndirect (icon)" } else { "CreateIconIndirect (cursor)" });
    }
    Ok(handle)
}

fn standard_cursor_resource(shape: StandardCursor) -> LPCWSTR {
    match shape {
        StandardCursor::Arrow => IDC_ARROW,
        StandardCursor::IBeam => IDC_IBEAM,
        StandardCursor::Crosshair => IDC_CROSS,
        StandardCursor::PointingHand => IDC_HAND,
        StandardCursor::ResizeEW => IDC_SIZEWE,
        StandardCursor::ResizeNS => IDC_SIZENS,
        StandardCursor::ResizeNWSE => IDC_SIZENWSE,
        StandardCursor::ResizeNESW => IDC_SIZENESW,
        StandardCursor::ResizeAll => IDC_SIZEALL,
        StandardCursor::NotAllowed => IDC_NO,
    }
}

impl Win32Shared {
    pub(super) fn win32_create_cursor(&self, id: CursorId, image: &RgbaImage, hot: Vec2<i32>) -> Result<()> {
        let handle = unsafe { create_icon(image, hot, false)? };
        self.cursors.borrow_mut().insert(id, Win32Cursor { handle, owned: true });
        Ok(())
    }

    pub(super) fn win32_create_standard_cursor(&self, id: CursorId, shape: StandardCursor) -> Result<()> {
        let handle = unsafe { LoadCursorW(ptr::null_mut(), standard_cursor_resource(shape)) };
        if handle.is_null() {
            return error::failed(format!("Win32: Failed to load standard cursor {:?}", shape));
        }
        self.cursors.borrow_mut().insert(id, Win32Cursor { handle, owned: false });
        Ok(())
    }

    pub(super) fn win32_destroy_cursor(&self, id: CursorId) -> Result<()> {
        let cursor = self.cursors.borrow_mut().remove(&id)
            .ok_or_else(|| Error::failed(format!("Unknown cursor {:?}", id)))?;
        if cursor.owned {
            unsafe {
                DestroyIcon(cursor.handle);
            }
        }
        Ok(())
    }

    pub(super) fn win32_set_cursor(&self, window: WindowId, cursor: Option<CursorId>) -> Result<()> {
        self.with_window(window, |w| w.cursor = cursor)?;
        if self.cursor_in_content_area(window)? {
            self.update_cursor_image(window)?;
        }
        Ok(())
    }

    pub(super) fn cursor_in_content_area(&self, id: WindowId) -> Result<bool> {
        let hwnd = self.hwnd(id)?;
        unsafe {
            let mut pos = POINT { x: 0, y: 0 };
            if GetCursorPos(&mut pos) == FALSE || WindowFromPoint(pos) != hwnd {
                return Ok(false);
            }
            Ok(PtInRect(&client_rect_on_screen(hwnd), pos) != FALSE)
        }
    }

    /// Shows the window's cursor image, or nothing when the mode hides it.
    pub(super) fn update_cursor_image(&self, id: WindowId) -> Result<()> {
        let (mode, cursor) = self.with_window(id, |w| (w.cursor_mode, w.cursor))?;
        unsafe {
            if mode == CursorMode::Normal {
                let custom = cursor.and_then(|c| self.cursors.borrow().get(&c).map(|c| c.handle));
                SetCursor(custom.unwrap_or_else(|| LoadCursorW(ptr::null_mut(), IDC_ARROW)));
            } else {
                SetCursor(ptr::null_mut());
            }
        }
        Ok(())
    }

    pub(super) fn clip_cursor_to(&self, hwnd: HWND) {
        let area = client_rect_on_screen(hwnd);
        unsafe {
            ClipCursor(&area);
        }
    }

    pub(super) fn release_cursor_clip(&self) {
        unsafe {
            ClipCursor(ptr::null());
        }
    }

    /// Routes raw mouse input to `hwnd`, or stops it.
    pub(super) fn set_raw_mouse_motion(&self, hwnd: Option<HWND>) {
        let rid = RAWINPUTDEVICE {
            usUsagePage: HID_USAGE_PAGE_GENERIC,
            usUsage: HID_USAGE_GENERIC_MOUSE,
            dwFlags: if hwnd.is_some() { 0 } else { RIDEV_REMOVE },
            hwndTarget: hwnd.unwrap_or(ptr::null_mut()),
        };
        let ok = unsafe { RegisterRawInputDevices(&rid, 1, mem::size_of::<RAWINPUTDEVICE>() as UINT) };
        if ok == FALSE {
            warn!("{}", winapi_error("RegisterRawInputDevices"));
        }
    }

    pub(super) fn win32_apply_cursor_mode(&self, id: WindowId, mode: CursorMode, raw_motion: bool) -> Result<()> {
        let (hwnd, was_raw) = self.with_window(id, |w| {
            let was_raw = w.cursor_mode == CursorMode::Disabled && w.raw_motion;
            w.cursor_mode = mode;
            w.raw_motion = raw_motion;
            (w.hwnd, was_raw)
        })?;
        let raw = mode == CursorMode::Disabled && raw_motion;
        if raw != was_raw {
            self.set_raw_mouse_motion(if raw { Some(hwnd) } else { None });
        }
        if mode == CursorMode::Disabled {
            self.disabled_window.set(Some(id));
            if unsafe { GetActiveWindow() } == hwnd {
                self.clip_cursor_to(hwnd);
            }
        } else if self.disabled_window.get() == Some(id) {
            self.disabled_window.set(None);
            self.release_cursor_clip();
        }
        if self.cursor_in_content_area(id)? {
            self.update_cursor_image(id)?;
        }
        Ok(())
    }

    pub(super) fn win32_cursor_pos(&self, id: WindowId) -> Result<Vec2<f64>> {
        let hwnd = self.hwnd(id)?;
        let mut pos = POINT { x: 0, y: 0 };
        unsafe {
            if GetCursorPos(&mut pos) == FALSE {
                return winapi_fail("GetCursorPos");
            }
            ScreenToClient(hwnd, &mut pos);
        }
        Ok(Vec2::new(pos.x as f64, pos.y as f64))
    }

    pub(super) fn win32_set_cursor_pos(&self, id: WindowId, pos: Vec2<f64>) -> Result<()> {
        let hwnd = self.hwnd(id)?;
        let mut pos = POINT { x: pos.x as LONG, y: pos.y as LONG };
        unsafe {
            ClientToScreen(hwnd, &mut pos);
            if SetCursorPos(pos.x, pos.y) == FALSE {
                return winapi_fail("SetCursorPos");
            }
        }
        Ok(())
    }

    /// Another process may hold the clipboard for a moment.
    fn open_clipboard(&self) -> Result<()> {
        for attempt in 0..3 {
            if unsafe { OpenClipboard(self.helper) } != FALSE {
                return Ok(());
            }
            if attempt < 2 {
                thread::sleep(Duration::from_millis(1));
            }
        }
        winapi_fail("OpenClipboard")
    }

    pub(super) fn win32_set_clipboard_string(&self, s: &str) -> Result<()> {
        let wide = to_wide_with_nul(s);
        unsafe {
            let object = GlobalAlloc(GMEM_MOVEABLE, wide.len() * mem::size_of::<WCHAR>());
            if object.is_null() {
                return winapi_fail("GlobalAlloc");
            }
            let buffer = GlobalLock(object) as *mut WCHAR;
            if buffer.is_null() {
                GlobalFree(object);
                return winapi_fail("GlobalLock");
            }
            ptr::copy_nonoverlapping(wide.as_ptr(), buffer, wide.len());
            GlobalUnlock(object);

            if let Err(e) = self.open_clipboard() {
                GlobalFree(object);
                return Err(e);
            }
            EmptyClipboard();
            // The clipboard owns the memory from here on.
            if SetClipboardData(CF_UNICODETEXT, object as HANDLE).is_null() {
                let e = winapi_error("SetClipboardData");
                GlobalFree(object);
                CloseClipboard();
                return Err(e);
            }
            CloseClipboard();
        }
        Ok(())
    }

    pub(super) fn win32_clipboard_string(&self) -> Result<String> {
        self.open_clipboard()?;
        unsafe {
            let object = GetClipboardData(CF_UNICODETEXT);
            if object.is_null() {
                CloseClipboard();
                return error::format_unavailable("Win32: Failed to convert clipboard to string");
            }
            let buffer = GlobalLock(object as HGLOBAL) as *const WCHAR;
            if buffer.is_null() {
                let e = winapi_error("GlobalLock");
                CloseClipboard();
                return Err(e);
            }
            let mut len = 0;
            while *buffer.add(len) != 0 {
                len += 1;
            }
            let s = String::from_utf16_lossy(slice::from_raw_parts(buffer, len));
            GlobalUnlock(object as HGLOBAL);
            CloseClipboard();
            Ok(s)
        }
    }
}
