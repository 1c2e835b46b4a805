//! Top-level windows: creation, styles, geometry and state.

use std::cell::Cell;
use std::mem;
use std::ptr;
use std::rc::Rc;
use super::cursor::create_icon;
use super::winapi_utils::*;
use super::Win32Shared;
use crate::error::{Error, Result};
use crate::hint::{ClientApi, ContextConfig, FramebufferConfig, WindowConfig, DONT_CARE};
use crate::image::RgbaImage;
use crate::input::{CursorMode, Utf16Composer};
use crate::platform::{CursorId, FrameExtents, MonitorKey, WindowId};
use crate::{Extent2, Rect, Vec2};

pub(super) struct Win32Window {
    pub hwnd: HWND,
    /// Private DC, from `CS_OWNDC`. Never released.
    pub dc: HDC,
    pub big_icon: HICON,
    pub small_icon: HICON,
    pub resizable: bool,
    pub decorated: bool,
    pub floating: bool,
    pub transparent: bool,
    pub mouse_passthrough: bool,
    pub scale_to_monitor: bool,
    /// Shared with the window's WGL context, which syncs differently when fullscreen.
    pub fullscreen: Rc<Cell<bool>>,
    pub iconified: bool,
    pub maximized: bool,
    pub min_size: Extent2<i32>,
    pub max_size: Extent2<i32>,
    pub aspect: (i32, i32),
    pub cursor: Option<CursorId>,
    pub cursor_mode: CursorMode,
    pub raw_motion: bool,
    pub cursor_tracked: bool,
    pub buttons_down: u8,
    pub composer: Utf16Composer,
}

impl Win32Window {
    pub fn style(&self) -> DWORD {
        window_style(self.fullscreen.get(), self.decorated, self.resizable)
    }
    pub fn ex_style(&self) -> DWORD {
        window_ex_style(self.fullscreen.get(), self.floating)
    }
}

pub(super) fn window_style(fullscreen: bool, decorated: bool, resizable: bool) -> DWORD {
    let mut style = WS_CLIPSIBLINGS | WS_CLIPCHILDREN;
    if fullscreen {
        return style | WS_POPUP;
    }
    style |= WS_SYSMENU | WS_MINIMIZEBOX;
    if decorated {
        style |= WS_CAPTION;
        if resizable {
            style |= WS_MAXIMIZEBOX | WS_THICKFRAME;
        }
    } else {
        style |= WS_POPUP;
    }
    style
}

pub(super) fn window_ex_style(fullscreen: bool, floating: bool) -> DWORD {
    let mut style = WS_EX_APPWINDOW;
    if fullscreen || floating {
        style |= WS_EX_TOPMOST;
    }
    style
}

const WMSZ_LEFT: UINT = 1;
const WMSZ_RIGHT: UINT = 2;
const WMSZ_TOP: UINT = 3;
const WMSZ_TOPLEFT: UINT = 4;
const WMSZ_TOPRIGHT: UINT = 5;
const WMSZ_BOTTOM: UINT = 6;
const WMSZ_BOTTOMLEFT: UINT = 7;
const WMSZ_BOTTOMRIGHT: UINT = 8;

/// Client area of `hwnd` in screen coordinates.
pub(super) fn client_rect_on_screen(hwnd: HWND) -> RECT {
    unsafe {
        let mut area: RECT = mem::zeroed();
        GetClientRect(hwnd, &mut area);
        let mut top_left = POINT { x: area.left, y: area.top };
        let mut bottom_right = POINT { x: area.right, y: area.bottom };
        ClientToScreen(hwnd, &mut top_left);
        ClientToScreen(hwnd, &mut bottom_right);
        RECT { left: top_left.x, top: top_left.y, right: bottom_right.x, bottom: bottom_right.y }
    }
}

/// Index of the image whose area is closest to `w` by `h`.
pub(super) fn closest_image(images: &[RgbaImage], w: i32, h: i32) -> Option<usize> {
    let target = w as i64 * h as i64;
    (0..images.len()).min_by_key(|&i| {
        let size = images[i].size;
        (size.w as i64 * size.h as i64 - target).abs()
    })
}

impl Win32Shared {
    pub(super) fn with_window<T, F: FnOnce(&mut Win32Window) -> T>(&self, id: WindowId, f: F) -> Result<T> {
        let mut windows = self.windows.borrow_mut();
        let window = windows.get_mut(&id).ok_or_else(|| Error::failed(format!("Unknown window {:?}", id)))?;
        Ok(f(window))
    }

    pub(super) fn hwnd(&self, id: WindowId) -> Result<HWND> {
        self.with_window(id, |w| w.hwnd)
    }

    /// Grows a client rect into a window rect, at the window's DPI where supported.
    pub(super) fn adjust_rect(&self, hwnd: HWND, rect: &mut RECT, style: DWORD, ex_style: DWORD) {
        let user32 = self.libs.user32.as_ref();
        let for_dpi = user32.and_then(|u| Some((u.AdjustWindowRectExForDpi?, u.GetDpiForWindow?)));
        unsafe {
            match for_dpi {
                Some((adjust, dpi)) if !hwnd.is_null() => {
                    adjust(rect, style, FALSE, ex_style, dpi(hwnd));
                },
                _ => {
                    AdjustWindowRectEx(rect, style, FALSE, ex_style);
                },
            }
        }
    }

    fn styles_of(&self, hwnd: HWND) -> (DWORD, DWORD) {
        unsafe { (GetWindowLongW(hwnd, GWL_STYLE) as DWORD, GetWindowLongW(hwnd, GWL_EXSTYLE) as DWORD) }
    }

    /// Frame thickness around the client area, as a rect around (0, 0, 0, 0).
    pub(super) fn frame_rect(&self, hwnd: HWND) -> RECT {
        let (style, ex_style) = self.styles_of(hwnd);
        let mut rect = RECT { left: 0, top: 0, right: 0, bottom: 0 };
        self.adjust_rect(hwnd, &mut rect, style, ex_style);
        rect
    }

    pub(super) fn win32_create_window(&self, id: WindowId, wndconfig: &WindowConfig, fbconfig: &FramebufferConfig, ctxconfig: &ContextConfig, monitor: Option<&MonitorKey>) -> Result<()> {
        let window = Win32Window {
            hwnd: ptr::null_mut(),
            dc: ptr::null_mut(),
            big_icon: ptr::null_mut(),
            small_icon: ptr::null_mut(),
            resizable: wndconfig.resizable,
            decorated: wndconfig.decorated,
            floating: wndconfig.floating,
            transparent: fbconfig.transparent,
            mouse_passthrough: false,
            scale_to_monitor: wndconfig.scale_to_monitor,
            fullscreen: Rc::new(Cell::new(monitor.is_some())),
            iconified: false,
            maximized: false,
            min_size: Extent2::new(DONT_CARE, DONT_CARE),
            max_size: Extent2::new(DONT_CARE, DONT_CARE),
            aspect: (DONT_CARE, DONT_CARE),
            cursor: None,
            cursor_mode: CursorMode::Normal,
            raw_motion: false,
            cursor_tracked: false,
            buttons_down: 0,
            composer: Utf16Composer::default(),
        };
        let mut style = window.style();
        if wndconfig.maximized && monitor.is_none() {
            style |= WS_MAXIMIZE;
        }
        let ex_style = window.ex_style();

        let (x, y, w, h) = match monitor {
            Some(key) => {
                let pos = self.win32_monitor_pos(key)?;
                let mode = self.win32_current_video_mode(key)?;
                (pos.x, pos.y, mode.width, mode.height)
            },
            None => {
                let mut rect = RECT { left: 0, top: 0, right: wndconfig.width, bottom: wndconfig.height };
                self.adjust_rect(ptr::null_mut(), &mut rect, style, ex_style);
                (CW_USEDEFAULT, CW_USEDEFAULT, rect.right - rect.left, rect.bottom - rect.top)
            },
        };

        let title = to_wide_with_nul(&wndconfig.title);
        let hwnd = unsafe {
            CreateWindowExW(
                ex_style, MAKEINTATOM(self.class_atom), title.as_ptr(), style,
                x, y, w, h,
                ptr::null_mut(), ptr::null_mut(), self.instance, ptr::null_mut(),
            )
        };
        if hwnd.is_null() {
            return winapi_fail("CreateWindowExW");
        }
        let dc = unsafe { GetDC(hwnd) };
        self.handles.borrow_mut().insert(hwnd, id);
        self.windows.borrow_mut().insert(id, Win32Window { hwnd, dc, ..window });

        let result = self.finish_window(id, hwnd, dc, wndconfig, fbconfig, ctxconfig, monitor.is_none());
        if result.is_err() {
            let _ = self.win32_destroy_window(id);
        }
        result
    }

    fn finish_window(&self, id: WindowId, hwnd: HWND, dc: HDC, wndconfig: &WindowConfig, fbconfig: &FramebufferConfig, ctxconfig: &ContextConfig, windowed: bool) -> Result<()> {
        unsafe {
            // Let drag and drop through UIPI when running elevated.
            for &msg in &[WM_DROPFILES, WM_COPYDATA, WM_COPYGLOBALDATA] {
                ChangeWindowMessageFilterEx(hwnd, msg, MSGFLT_ALLOW, ptr::null_mut());
            }
            DragAcceptFiles(hwnd, TRUE);

            if windowed {
                // The frame was sized for the system DPI; redo it for the monitor the window landed on.
                let mut rect = RECT { left: 0, top: 0, right: wndconfig.width, bottom: wndconfig.height };
                if wndconfig.scale_to_monitor {
                    let scale = self.hmonitor_content_scale(MonitorFromWindow(hwnd, MONITOR_DEFAULTTONEAREST));
                    if scale.x > 0. && scale.y > 0. {
                        rect.right = (rect.right as f32 * scale.x) as LONG;
                        rect.bottom = (rect.bottom as f32 * scale.y) as LONG;
                    }
                }
                let (style, ex_style) = self.styles_of(hwnd);
                self.adjust_rect(hwnd, &mut rect, style, ex_style);

                // Only the restored rect changes, so a maximized window stays maximized.
                let mut wp: WINDOWPLACEMENT = mem::zeroed();
                wp.length = mem::size_of::<WINDOWPLACEMENT>() as UINT;
                GetWindowPlacement(hwnd, &mut wp);
                OffsetRect(&mut rect, wp.rcNormalPosition.left - rect.left, wp.rcNormalPosition.top - rect.top);
                wp.rcNormalPosition = rect;
                wp.showCmd = SW_HIDE as UINT;
                SetWindowPlacement(hwnd, &wp);
            }
        }

        if fbconfig.transparent {
            self.update_framebuffer_transparency(hwnd);
        }

        if ctxconfig.client != ClientApi::NoApi.raw() {
            let wgl = self.wgl()?;
            unsafe {
                let format = wgl.choose_pixel_format(dc, fbconfig)?;
                wgl.set_pixel_format(dc, format)?;
            }
        }
        debug!("Win32: Created window {:?} ({:p})", id, hwnd);
        Ok(())
    }

    pub(super) fn win32_destroy_window(&self, id: WindowId) -> Result<()> {
        let window = self.windows.borrow_mut().remove(&id)
            .ok_or_else(|| Error::failed(format!("Unknown window {:?}", id)))?;
        self.handles.borrow_mut().remove(&window.hwnd);
        if self.disabled_window.get() == Some(id) {
            self.disabled_window.set(None);
            self.release_cursor_clip();
            self.set_raw_mouse_motion(None);
        }
        unsafe {
            DestroyWindow(window.hwnd);
            if !window.big_icon.is_null() {
                DestroyIcon(window.big_icon);
            }
            if !window.small_icon.is_null() {
                DestroyIcon(window.small_icon);
            }
        }
        Ok(())
    }

    /// Lets DWM blend the window with what's behind it, using the alpha channel.
    pub(super) fn update_framebuffer_transparency(&self, hwnd: HWND) {
        let enable_blur = match self.libs.dwmapi.as_ref().and_then(|d| d.DwmEnableBlurBehindWindow) {
            Some(f) => f,
            None => return,
        };
        if !self.libs.dwm_composition_enabled() {
            return;
        }
        unsafe {
            let mut bb: DWM_BLURBEHIND = mem::zeroed();
            if self.win8 || !self.libs.dwm_colorization_opaque() {
                // An empty region enables alpha blending without the blur.
                let region = CreateRectRgn(0, 0, -1, -1);
                bb.dwFlags = DWM_BB_ENABLE | DWM_BB_BLURREGION;
                bb.hRgnBlur = region;
                bb.fEnable = TRUE;
                enable_blur(hwnd, &bb);
                DeleteObject(region as HGDIOBJ);
            } else {
                bb.dwFlags = DWM_BB_ENABLE;
                enable_blur(hwnd, &bb);
            }
        }
    }

    pub(super) fn win32_set_window_title(&self, id: WindowId, title: &str) -> Result<()> {
        let hwnd = self.hwnd(id)?;
        let title = to_wide_with_nul(title);
        if unsafe { SetWindowTextW(hwnd, title.as_ptr()) } == FALSE {
            return winapi_fail("SetWindowTextW");
        }
        Ok(())
    }

    pub(super) fn win32_set_window_icon(&self, id: WindowId, images: &[RgbaImage]) -> Result<()> {
        let hwnd = self.hwnd(id)?;
        let (big, small) = unsafe {
            if images.is_empty() {
                (ptr::null_mut(), ptr::null_mut())
            } else {
                let pick = |metric_w, metric_h| closest_image(images, GetSystemMetrics(metric_w), GetSystemMetrics(metric_h)).unwrap_or(0);
                let big = create_icon(&images[pick(SM_CXICON, SM_CYICON)], Vec2::new(0, 0), true)?;
                let small = match create_icon(&images[pick(SM_CXSMICON, SM_CYSMICON)], Vec2::new(0, 0), true) {
                    Ok(small) => small,
                    Err(e) => {
                        DestroyIcon(big);
                        return Err(e);
                    },
                };
                (big, small)
            }
        };
        unsafe {
            // Without images, fall back to the class icons.
            let (shown_big, shown_small) = if images.is_empty() {
                (GetClassLongPtrW(hwnd, GCLP_HICON) as HICON, GetClassLongPtrW(hwnd, GCLP_HICONSM) as HICON)
            } else {
                (big, small)
            };
            SendMessageW(hwnd, WM_SETICON, ICON_BIG as WPARAM, shown_big as LPARAM);
            SendMessageW(hwnd, WM_SETICON, ICON_SMALL as WPARAM, shown_small as LPARAM);
        }
        let (old_big, old_small) = self.with_window(id, |w| {
            (mem::replace(&mut w.big_icon, big), mem::replace(&mut w.small_icon, small))
        })?;
        unsafe {
            if !old_big.is_null() {
                DestroyIcon(old_big);
            }
            if !old_small.is_null() {
                DestroyIcon(old_small);
            }
        }
        Ok(())
    }

    pub(super) fn win32_window_pos(&self, id: WindowId) -> Result<Vec2<i32>> {
        let hwnd = self.hwnd(id)?;
        let mut pos = POINT { x: 0, y: 0 };
        unsafe {
            ClientToScreen(hwnd, &mut pos);
        }
        Ok(Vec2::new(pos.x, pos.y))
    }

    pub(super) fn win32_set_window_pos(&self, id: WindowId, pos: Vec2<i32>) -> Result<()> {
        let hwnd = self.hwnd(id)?;
        let (style, ex_style) = self.styles_of(hwnd);
        let mut rect = RECT { left: pos.x, top: pos.y, right: pos.x, bottom: pos.y };
        self.adjust_rect(hwnd, &mut rect, style, ex_style);
        unsafe {
            SetWindowPos(hwnd, ptr::null_mut(), rect.left, rect.top, 0, 0, SWP_NOACTIVATE | SWP_NOZORDER | SWP_NOSIZE);
        }
        Ok(())
    }

    pub(super) fn win32_window_size(&self, id: WindowId) -> Result<Extent2<i32>> {
        let hwnd = self.hwnd(id)?;
        let mut area: RECT = unsafe { mem::zeroed() };
        unsafe {
            GetClientRect(hwnd, &mut area);
        }
        Ok(Extent2::new(area.right, area.bottom))
    }

    pub(super) fn win32_set_window_size(&self, id: WindowId, size: Extent2<i32>) -> Result<()> {
        let hwnd = self.hwnd(id)?;
        let (style, ex_style) = self.styles_of(hwnd);
        let mut rect = RECT { left: 0, top: 0, right: size.w, bottom: size.h };
        self.adjust_rect(hwnd, &mut rect, style, ex_style);
        unsafe {
            SetWindowPos(
                hwnd, HWND_TOP, 0, 0, rect.right - rect.left, rect.bottom - rect.top,
                SWP_NOACTIVATE | SWP_NOOWNERZORDER | SWP_NOMOVE | SWP_NOZORDER,
            );
        }
        Ok(())
    }

    /// Nudges the window so `WM_GETMINMAXINFO` and `WM_SIZING` apply new limits.
    fn reapply_limits(&self, hwnd: HWND, aspect: Option<f32>) {
        unsafe {
            let mut area: RECT = mem::zeroed();
            GetWindowRect(hwnd, &mut area);
            if let Some(ratio) = aspect {
                apply_aspect_ratio(WMSZ_BOTTOMRIGHT as WPARAM, &mut area, &self.frame_rect(hwnd), ratio);
            }
            MoveWindow(hwnd, area.left, area.top, area.right - area.left, area.bottom - area.top, TRUE);
        }
    }

    pub(super) fn win32_set_window_size_limits(&self, id: WindowId, min: Extent2<i32>, max: Extent2<i32>) -> Result<()> {
        let (hwnd, fullscreen) = self.with_window(id, |w| {
            w.min_size = min;
            w.max_size = max;
            (w.hwnd, w.fullscreen.get())
        })?;
        let unset = |size: Extent2<i32>| size.w == DONT_CARE || size.h == DONT_CARE;
        if (unset(min) && unset(max)) || fullscreen {
            return Ok(());
        }
        self.reapply_limits(hwnd, None);
        Ok(())
    }

    pub(super) fn win32_set_window_aspect_ratio(&self, id: WindowId, numer: i32, denom: i32) -> Result<()> {
        let (hwnd, fullscreen) = self.with_window(id, |w| {
            w.aspect = (numer, denom);
            (w.hwnd, w.fullscreen.get())
        })?;
        if numer == DONT_CARE || denom == DONT_CARE || fullscreen {
            return Ok(());
        }
        self.reapply_limits(hwnd, Some(numer as f32 / denom as f32));
        Ok(())
    }

    pub(super) fn win32_window_frame_size(&self, id: WindowId) -> Result<FrameExtents> {
        let hwnd = self.hwnd(id)?;
        let size = self.win32_window_size(id)?;
        let (style, ex_style) = self.styles_of(hwnd);
        let mut rect = RECT { left: 0, top: 0, right: size.w, bottom: size.h };
        self.adjust_rect(hwnd, &mut rect, style, ex_style);
        Ok(FrameExtents {
            left: -rect.left,
            top: -rect.top,
            right: rect.right - size.w,
            bottom: rect.bottom - size.h,
        })
    }

    pub(super) fn win32_window_content_scale(&self, id: WindowId) -> Result<Vec2<f32>> {
        let hwnd = self.hwnd(id)?;
        let monitor = unsafe { MonitorFromWindow(hwnd, MONITOR_DEFAULTTONEAREST) };
        Ok(self.hmonitor_content_scale(monitor))
    }

    fn show(&self, id: WindowId, cmd: c_int) -> Result<()> {
        let hwnd = self.hwnd(id)?;
        unsafe {
            ShowWindow(hwnd, cmd);
        }
        Ok(())
    }

    pub(super) fn win32_iconify_window(&self, id: WindowId) -> Result<()> {
        self.show(id, SW_MINIMIZE)
    }

    pub(super) fn win32_restore_window(&self, id: WindowId) -> Result<()> {
        self.show(id, SW_RESTORE)
    }

    pub(super) fn win32_maximize_window(&self, id: WindowId) -> Result<()> {
        let hwnd = self.hwnd(id)?;
        if unsafe { IsWindowVisible(hwnd) } != FALSE {
            return self.show(id, SW_MAXIMIZE);
        }
        // ShowWindow would also show it, so fit the work area by hand.
        unsafe {
            let mut mi: MONITORINFO = mem::zeroed();
            mi.cbSize = mem::size_of::<MONITORINFO>() as DWORD;
            GetMonitorInfoW(MonitorFromWindow(hwnd, MONITOR_DEFAULTTONEAREST), &mut mi);
            let mut rect = mi.rcWork;
            let max = self.with_window(id, |w| w.max_size)?;
            if max.w != DONT_CARE && max.h != DONT_CARE {
                rect.right = rect.right.min(rect.left + max.w);
                rect.bottom = rect.bottom.min(rect.top + max.h);
            }
            let (style, _) = self.styles_of(hwnd);
            SetWindowLongW(hwnd, GWL_STYLE, (style | WS_MAXIMIZE) as LONG);
            SetWindowPos(
                hwnd, HWND_TOP, rect.left, rect.top, rect.right - rect.left, rect.bottom - rect.top,
                SWP_NOACTIVATE | SWP_NOZORDER | SWP_FRAMECHANGED,
            );
        }
        self.with_window(id, |w| w.maximized = true)
    }

    pub(super) fn win32_show_window(&self, id: WindowId) -> Result<()> {
        self.show(id, SW_SHOWNA)
    }

    pub(super) fn win32_hide_window(&self, id: WindowId) -> Result<()> {
        self.show(id, SW_HIDE)
    }

    pub(super) fn win32_request_window_attention(&self, id: WindowId) -> Result<()> {
        let hwnd = self.hwnd(id)?;
        unsafe {
            FlashWindow(hwnd, TRUE);
        }
        Ok(())
    }

    pub(super) fn win32_focus_window(&self, id: WindowId) -> Result<()> {
        let hwnd = self.hwnd(id)?;
        unsafe {
            BringWindowToTop(hwnd);
            SetForegroundWindow(hwnd);
            SetFocus(hwnd);
        }
        Ok(())
    }

    pub(super) fn win32_set_window_monitor(&self, id: WindowId, monitor: Option<&MonitorKey>, rect: Rect<i32, i32>) -> Result<()> {
        let (hwnd, was_fullscreen, floating, style, ex_style) = self.with_window(id, |w| {
            let was = w.fullscreen.replace(monitor.is_some());
            (w.hwnd, was, w.floating, w.style(), w.ex_style())
        })?;
        unsafe {
            let mut flags = SWP_NOACTIVATE | SWP_NOCOPYBITS;
            if was_fullscreen != monitor.is_some() {
                let old = GetWindowLongW(hwnd, GWL_STYLE) as DWORD;
                let kept = old & !(WS_OVERLAPPEDWINDOW | WS_POPUP);
                SetWindowLongW(hwnd, GWL_STYLE, (kept | style) as LONG);
                flags |= SWP_FRAMECHANGED;
            }
            match monitor {
                Some(_) => {
                    SetWindowPos(hwnd, HWND_TOPMOST, rect.x, rect.y, rect.w, rect.h, flags | SWP_SHOWWINDOW);
                },
                None => {
                    let mut area = RECT { left: rect.x, top: rect.y, right: rect.x + rect.w, bottom: rect.y + rect.h };
                    self.adjust_rect(hwnd, &mut area, style, ex_style);
                    let after = if floating { HWND_TOPMOST } else { HWND_NOTOPMOST };
                    SetWindowPos(hwnd, after, area.left, area.top, area.right - area.left, area.bottom - area.top, flags);
                },
            }
        }
        Ok(())
    }

    pub(super) fn win32_window_focused(&self, id: WindowId) -> Result<bool> {
        Ok(unsafe { GetActiveWindow() } == self.hwnd(id)?)
    }

    pub(super) fn win32_window_iconified(&self, id: WindowId) -> Result<bool> {
        Ok(unsafe { IsIconic(self.hwnd(id)?) } != FALSE)
    }

    pub(super) fn win32_window_visible(&self, id: WindowId) -> Result<bool> {
        Ok(unsafe { IsWindowVisible(self.hwnd(id)?) } != FALSE)
    }

    pub(super) fn win32_window_maximized(&self, id: WindowId) -> Result<bool> {
        Ok(unsafe { IsZoomed(self.hwnd(id)?) } != FALSE)
    }

    pub(super) fn win32_window_hovered(&self, id: WindowId) -> Result<bool> {
        self.cursor_in_content_area(id)
    }

    pub(super) fn win32_framebuffer_transparent(&self, id: WindowId) -> Result<bool> {
        let transparent = self.with_window(id, |w| w.transparent)?;
        if !transparent || !self.libs.dwm_composition_enabled() {
            return Ok(false);
        }
        Ok(self.win8 || !self.libs.dwm_colorization_opaque())
    }

    /// Rewrites the style bits from the window's flags, keeping the client area in place.
    fn update_styles(&self, id: WindowId) -> Result<()> {
        let (hwnd, style) = self.with_window(id, |w| (w.hwnd, w.style()))?;
        unsafe {
            let old = GetWindowLongW(hwnd, GWL_STYLE) as DWORD;
            let style = (old & !(WS_OVERLAPPEDWINDOW | WS_POPUP)) | style;
            let ex_style = GetWindowLongW(hwnd, GWL_EXSTYLE) as DWORD;

            let mut rect = client_rect_on_screen(hwnd);
            self.adjust_rect(hwnd, &mut rect, style, ex_style);

            SetWindowLongW(hwnd, GWL_STYLE, style as LONG);
            SetWindowPos(
                hwnd, HWND_TOP, rect.left, rect.top, rect.right - rect.left, rect.bottom - rect.top,
                SWP_FRAMECHANGED | SWP_NOACTIVATE | SWP_NOZORDER,
            );
        }
        Ok(())
    }

    pub(super) fn win32_set_window_resizable(&self, id: WindowId, enabled: bool) -> Result<()> {
        self.with_window(id, |w| w.resizable = enabled)?;
        self.update_styles(id)
    }

    pub(super) fn win32_set_window_decorated(&self, id: WindowId, enabled: bool) -> Result<()> {
        self.with_window(id, |w| w.decorated = enabled)?;
        self.update_styles(id)
    }

    pub(super) fn win32_set_window_floating(&self, id: WindowId, enabled: bool) -> Result<()> {
        let hwnd = self.with_window(id, |w| {
            w.floating = enabled;
            w.hwnd
        })?;
        let after = if enabled { HWND_TOPMOST } else { HWND_NOTOPMOST };
        unsafe {
            SetWindowPos(hwnd, after, 0, 0, 0, 0, SWP_NOACTIVATE | SWP_NOMOVE | SWP_NOSIZE);
        }
        Ok(())
    }

    pub(super) fn win32_set_window_mouse_passthrough(&self, id: WindowId, enabled: bool) -> Result<()> {
        let hwnd = self.with_window(id, |w| {
            w.mouse_passthrough = enabled;
            w.hwnd
        })?;
        unsafe {
            let (mut key, mut alpha, mut flags): (COLORREF, BYTE, DWORD) = (0, 0, 0);
            let mut ex_style = GetWindowLongW(hwnd, GWL_EXSTYLE) as DWORD;
            if ex_style & WS_EX_LAYERED != 0 {
                GetLayeredWindowAttributes(hwnd, &mut key, &mut alpha, &mut flags);
            }
            if enabled {
                ex_style |= WS_EX_TRANSPARENT | WS_EX_LAYERED;
            } else {
                ex_style &= !WS_EX_TRANSPARENT;
                // Keep the layered style only if opacity still needs it.
                if ex_style & WS_EX_LAYERED != 0 && flags & LWA_ALPHA == 0 {
                    ex_style &= !WS_EX_LAYERED;
                }
            }
            SetWindowLongW(hwnd, GWL_EXSTYLE, ex_style as LONG);
            if enabled {
                SetLayeredWindowAttributes(hwnd, key, alpha, flags);
            }
        }
        Ok(())
    }

    pub(super) fn win32_window_opacity(&self, id: WindowId) -> Result<f32> {
        let hwnd = self.hwnd(id)?;
        unsafe {
            let (mut alpha, mut flags): (BYTE, DWORD) = (0, 0);
            let layered = GetWindowLongW(hwnd, GWL_EXSTYLE) as DWORD & WS_EX_LAYERED != 0;
            if layered && GetLayeredWindowAttributes(hwnd, ptr::null_mut(), &mut alpha, &mut flags) != FALSE && flags & LWA_ALPHA != 0 {
                return Ok(alpha as f32 / 255.);
            }
        }
        Ok(1.)
    }

    pub(super) fn win32_set_window_opacity(&self, id: WindowId, opacity: f32) -> Result<()> {
        let (hwnd, passthrough) = self.with_window(id, |w| (w.hwnd, w.mouse_passthrough))?;
        unsafe {
            let mut ex_style = GetWindowLongW(hwnd, GWL_EXSTYLE) as DWORD;
            if opacity < 1. || passthrough {
                ex_style |= WS_EX_LAYERED;
                SetWindowLongW(hwnd, GWL_EXSTYLE, ex_style as LONG);
                let alpha = (255. * opacity).round() as BYTE;
                if SetLayeredWindowAttributes(hwnd, 0, alpha, LWA_ALPHA) == FALSE {
                    return winapi_fail("SetLayeredWindowAttributes");
                }
            } else {
                ex_style &= !WS_EX_LAYERED;
                SetWindowLongW(hwnd, GWL_EXSTYLE, ex_style as LONG);
            }
        }
        Ok(())
    }
}

/// Adjusts the rect being dragged from `edge` so the client area keeps `ratio`.
pub(super) fn apply_aspect_ratio(edge: WPARAM, area: &mut RECT, frame: &RECT, ratio: f32) {
    let frame_w = frame.right - frame.left;
    let frame_h = frame.bottom - frame.top;
    let client_w = area.right - area.left - frame_w;
    let client_h = area.bottom - area.top - frame_h;
    match edge as UINT {
        WMSZ_LEFT | WMSZ_BOTTOMLEFT | WMSZ_RIGHT | WMSZ_BOTTOMRIGHT => {
            area.bottom = area.top + frame_h + (client_w as f32 / ratio) as LONG;
        },
        WMSZ_TOPLEFT | WMSZ_TOPRIGHT => {
            area.top = area.bottom - frame_h - (client_w as f32 / ratio) as LONG;
        },
        WMSZ_TOP | WMSZ_BOTTOM => {
            area.right = area.left + frame_w + (client_h as f32 * ratio) as LONG;
        },
        _ => (),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rgba;

    #[test]
    fn styles_follow_flags() {
        let style = window_style(false, true, true);
        assert_eq!(style & WS_THICKFRAME, WS_THICKFRAME);
        assert_eq!(style & WS_CAPTION, WS_CAPTION);
        assert_eq!(window_style(false, true, false) & (WS_THICKFRAME | WS_MAXIMIZEBOX), 0);
        assert_eq!(window_style(false, false, true) & WS_POPUP, WS_POPUP);
        assert_eq!(window_style(true, true, true) & WS_CAPTION, 0);
        assert_eq!(window_ex_style(false, false) & WS_EX_TOPMOST, 0);
        assert_eq!(window_ex_style(true, false) & WS_EX_TOPMOST, WS_EX_TOPMOST);
        assert_eq!(window_ex_style(false, true) & WS_EX_TOPMOST, WS_EX_TOPMOST);
    }

    #[test]
    fn aspect_ratio_follows_the_dragged_edge() {
        let frame = RECT { left: -8, top: -31, right: 8, bottom: 8 };
        let mut area = RECT { left: 100, top: 100, right: 100 + 16 + 400, bottom: 100 + 39 + 400 };
        apply_aspect_ratio(WMSZ_RIGHT as WPARAM, &mut area, &frame, 2.);
        assert_eq!(area.bottom - area.top - 39, 200);

        let mut area = RECT { left: 100, top: 100, right: 100 + 16 + 400, bottom: 100 + 39 + 400 };
        apply_aspect_ratio(WMSZ_BOTTOM as WPARAM, &mut area, &frame, 2.);
        assert_eq!(area.right - area.left - 16, 800);

        let mut area = RECT { left: 100, top: 100, right: 100 + 16 + 400, bottom: 100 + 39 + 400 };
        apply_aspect_ratio(WMSZ_TOPLEFT as WPARAM, &mut area, &frame, 2.);
        assert_eq!(area.bottom, 100 + 39 + 400);
        assert_eq!(area.bottom - area.top - 39, 200);
    }

    #[test]
    fn icon_sizes_pick_the_closest_area() {
        let img = |s| RgbaImage::new(Extent2::new(s, s), vec![Rgba::new(0, 0, 0, 255); (s * s) as usize]).unwrap();
        let images = vec![img(16), img(48), img(32)];
        assert_eq!(closest_image(&images, 32, 32), Some(2));
        assert_eq!(closest_image(&images, 20, 20), Some(0));
        assert_eq!(closest_image(&images, 64, 64), Some(1));
        assert_eq!(closest_image(&[], 16, 16), None);
    }
}
