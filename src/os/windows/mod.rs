//! The Win32 backend: user32 for windows and input, GDI for monitors, WGL for contexts.
//!
//! Entry points missing from older Windows versions (per-monitor DPI, DWM) are loaded
//! at connection time and degrade gracefully when absent.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::mem;
use std::ptr;
use std::rc::Rc;
use std::sync::Arc;

mod cursor;
mod dl;
mod keys;
mod monitor;
mod wgl;
mod window;
mod winapi_utils;
mod wndproc;

use self::cursor::Win32Cursor;
use self::dl::Libs;
use self::keys::KeyTables;
use self::wgl::{Wgl, WglContext};
use self::winapi_utils::*;
use self::window::Win32Window;
use crate::cursor::StandardCursor;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::hint::{ContextConfig, FramebufferConfig, WindowConfig};
use crate::image::RgbaImage;
use crate::input::{Action, CursorMode, Key};
use crate::monitor::VideoMode;
use crate::platform::{CursorId, FrameExtents, MonitorInfo, MonitorKey, Platform, PlatformContext, PlatformKind, Waker, WindowId};
use crate::timeout::Timeout;
use crate::{Extent2, Rect, Vec2};

/// Wakes `poll_events()` by posting an empty message to the helper window.
/// `PostMessageW()` may be called from any thread.
#[derive(Debug)]
struct MessageWaker {
    helper: usize,
}

impl Waker for MessageWaker {
    fn wake(&self) -> Result<()> {
        if unsafe { PostMessageW(self.helper as HWND, WM_NULL, 0, 0) } == FALSE {
            return winapi_fail("PostMessageW");
        }
        Ok(())
    }
}

pub(crate) struct Win32Shared {
    instance: HINSTANCE,
    class_atom: ATOM,
    /// Hidden window that owns the clipboard, receives display changes and carries
    /// the pixel format WGL is loaded with.
    helper: HWND,
    helper_dc: HDC,
    libs: Rc<Libs>,
    win8: bool,
    wgl: RefCell<Option<Rc<Wgl>>>,
    keys: KeyTables,
    windows: RefCell<HashMap<WindowId, Win32Window>>,
    handles: RefCell<HashMap<HWND, WindowId>>,
    cursors: RefCell<HashMap<CursorId, Win32Cursor>>,
    changed_modes: RefCell<HashSet<String>>,
    disabled_window: Cell<Option<WindowId>>,
    last_raw_pos: Cell<Vec2<i32>>,
    mouse_trails: Cell<Option<UINT>>,
    /// Left and right Shift, as last reported down.
    shifts_down: Cell<[bool; 2]>,
    pending: RefCell<Vec<Event>>,
    waker: Arc<MessageWaker>,
}

/// The window procedure finds the backend through a weak reference, hence the `Rc`.
pub(crate) struct Win32Platform(Rc<Win32Shared>);

unsafe fn enable_dpi_awareness(libs: &Libs) {
    let per_monitor_v2 = libs.user32.as_ref().and_then(|u| u.SetProcessDpiAwarenessContext);
    let per_monitor = libs.shcore.as_ref().and_then(|s| s.SetProcessDpiAwareness);
    if let Some(f) = per_monitor_v2 {
        if f(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2 as HANDLE) != FALSE {
            return;
        }
    }
    if let Some(f) = per_monitor {
        if SUCCEEDED(f(PROCESS_PER_MONITOR_DPI_AWARE)) {
            return;
        }
    }
    SetProcessDPIAware();
}

unsafe fn is_windows_8_or_greater() -> bool {
    let mut info: OSVERSIONINFOW = mem::zeroed();
    info.dwOSVersionInfoSize = mem::size_of::<OSVERSIONINFOW>() as DWORD;
    if GetVersionExW(&mut info) == FALSE {
        return false;
    }
    (info.dwMajorVersion, info.dwMinorVersion) >= (6, 2)
}

fn keypad_virtual_key(key: Key) -> Option<c_int> {
    Some(match key {
        Key::Kp0 => VK_NUMPAD0,
        Key::Kp1 => VK_NUMPAD1,
        Key::Kp2 => VK_NUMPAD2,
        Key::Kp3 => VK_NUMPAD3,
        Key::Kp4 => VK_NUMPAD4,
        Key::Kp5 => VK_NUMPAD5,
        Key::Kp6 => VK_NUMPAD6,
        Key::Kp7 => VK_NUMPAD7,
        Key::Kp8 => VK_NUMPAD8,
        Key::Kp9 => VK_NUMPAD9,
        Key::KpDecimal => VK_DECIMAL,
        Key::KpDivide => VK_DIVIDE,
        Key::KpMultiply => VK_MULTIPLY,
        Key::KpSubtract => VK_SUBTRACT,
        Key::KpAdd => VK_ADD,
        _ => return None,
    })
}

impl Win32Platform {
    pub fn connect() -> Result<Self> {
        let libs = Rc::new(Libs::load());
        unsafe {
            enable_dpi_awareness(&libs);

            let instance = GetModuleHandleW(ptr::null());
            let class_name = to_wide_with_nul("winpal");
            let mut wc: WNDCLASSEXW = mem::zeroed();
            wc.cbSize = mem::size_of::<WNDCLASSEXW>() as UINT;
            wc.style = CS_HREDRAW | CS_VREDRAW | CS_OWNDC;
            wc.lpfnWndProc = Some(wndproc::wndproc);
            wc.hInstance = instance;
            wc.hCursor = LoadCursorW(ptr::null_mut(), IDC_ARROW);
            wc.hIcon = LoadIconW(ptr::null_mut(), IDI_APPLICATION);
            wc.lpszClassName = class_name.as_ptr();
            let class_atom = RegisterClassExW(&wc);
            if class_atom == 0 {
                return winapi_fail("RegisterClassExW");
            }

            let title = to_wide_with_nul("winpal helper window");
            let helper = CreateWindowExW(
                WS_EX_OVERLAPPEDWINDOW, MAKEINTATOM(class_atom), title.as_ptr(),
                WS_CLIPSIBLINGS | WS_CLIPCHILDREN, 0, 0, 1, 1,
                ptr::null_mut(), ptr::null_mut(), instance, ptr::null_mut(),
            );
            if helper.is_null() {
                let e = winapi_error("CreateWindowExW (helper window)");
                UnregisterClassW(MAKEINTATOM(class_atom), instance);
                return Err(e);
            }
            ShowWindow(helper, SW_HIDE);
            let mut msg: MSG = mem::zeroed();
            while PeekMessageW(&mut msg, helper, 0, 0, PM_REMOVE) != FALSE {
                TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
            let helper_dc = GetDC(helper);
            let win8 = is_windows_8_or_greater();
            debug!("Win32: Connected; Windows 8 or newer: {}, DWM composition: {}", win8, libs.dwm_composition_enabled());

            let shared = Rc::new(Win32Shared {
                instance,
                class_atom,
                helper,
                helper_dc,
                libs,
                win8,
                wgl: RefCell::new(None),
                keys: KeyTables::new(),
                windows: RefCell::new(HashMap::new()),
                handles: RefCell::new(HashMap::new()),
                cursors: RefCell::new(HashMap::new()),
                changed_modes: RefCell::new(HashSet::new()),
                disabled_window: Cell::new(None),
                last_raw_pos: Cell::new(Vec2::new(0, 0)),
                mouse_trails: Cell::new(None),
                shifts_down: Cell::new([false; 2]),
                pending: RefCell::new(Vec::new()),
                waker: Arc::new(MessageWaker { helper: helper as usize }),
            });
            wndproc::set_current(&shared);
            Ok(Win32Platform(shared))
        }
    }
}

impl Win32Shared {
    /// WGL is loaded on first use, since it costs a dummy context.
    fn wgl(&self) -> Result<Rc<Wgl>> {
        let cached = self.wgl.borrow().clone();
        if let Some(wgl) = cached {
            return Ok(wgl);
        }
        let wgl = Rc::new(unsafe { Wgl::load(self.helper_dc)? });
        *self.wgl.borrow_mut() = Some(wgl.clone());
        Ok(wgl)
    }

    /// Windows sends no key up for one Shift when both are released together.
    fn release_stuck_shifts(&self) {
        let active = unsafe { GetActiveWindow() };
        let id = match self.handles.borrow().get(&active).copied() {
            Some(id) => id,
            None => return,
        };
        let mods = wndproc::key_mods();
        let mut down = self.shifts_down.get();
        for (i, &(vk, key)) in [(VK_LSHIFT, Key::LeftShift), (VK_RSHIFT, Key::RightShift)].iter().enumerate() {
            if down[i] && unsafe { GetKeyState(vk) } as u16 & 0x8000 == 0 {
                down[i] = false;
                let scancode = self.keys.scancode(key);
                self.push(Event::KeyboardKey { window: id, key, scancode, action: Action::Release, mods });
            }
        }
        self.shifts_down.set(down);
    }

    fn key_name(&self, scancode: i32) -> Option<String> {
        if scancode <= 0 || scancode > 0x1FF {
            return None;
        }
        // Keypad keys would otherwise name their Num Lock off function.
        let vk = match keypad_virtual_key(self.keys.key(scancode)) {
            Some(vk) => vk as UINT,
            None => unsafe { MapVirtualKeyW(scancode as UINT, MAPVK_VSC_TO_VK) },
        };
        let state = [0 as BYTE; 256];
        let mut chars = [0 as WCHAR; 16];
        unsafe {
            let mut len = ToUnicode(vk, scancode as UINT, state.as_ptr(), chars.as_mut_ptr(), chars.len() as c_int, 0);
            if len == -1 {
                // A dead key; the second call clears it from the keyboard state.
                len = ToUnicode(vk, scancode as UINT, state.as_ptr(), chars.as_mut_ptr(), chars.len() as c_int, 0);
            }
            if len <= 0 {
                return None;
            }
        }
        let c = std::char::decode_utf16(chars.iter().copied()).next()?.ok()?;
        if c.is_control() {
            return None;
        }
        Some(c.to_string())
    }
}

impl Drop for Win32Shared {
    fn drop(&mut self) {
        self.restore_all_video_modes();
        if let Some(trails) = self.mouse_trails.take() {
            unsafe {
                SystemParametersInfoW(SPI_SETMOUSETRAILS, trails, ptr::null_mut(), 0);
            }
        }
        if self.disabled_window.take().is_some() {
            self.release_cursor_clip();
            self.set_raw_mouse_motion(None);
        }
        unsafe {
            for (_, window) in self.windows.get_mut().drain() {
                DestroyWindow(window.hwnd);
            }
            for (_, cursor) in self.cursors.get_mut().drain() {
                if cursor.owned {
                    DestroyIcon(cursor.handle);
                }
            }
            // Contexts hold their own reference; this only drops the loader's.
            *self.wgl.get_mut() = None;
            DestroyWindow(self.helper);
            UnregisterClassW(MAKEINTATOM(self.class_atom), self.instance);
        }
    }
}

impl Platform for Win32Platform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Win32
    }
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn poll_monitors(&self) -> Result<Vec<MonitorInfo>> {
        self.0.win32_poll_monitors()
    }
    fn monitor_pos(&self, monitor: &MonitorKey) -> Result<Vec2<i32>> {
        self.0.win32_monitor_pos(monitor)
    }
    fn monitor_work_area(&self, monitor: &MonitorKey) -> Result<Rect<i32, i32>> {
        self.0.win32_monitor_work_area(monitor)
    }
    fn monitor_content_scale(&self, monitor: &MonitorKey) -> Result<Vec2<f32>> {
        self.0.win32_monitor_content_scale(monitor)
    }
    fn video_modes(&self, monitor: &MonitorKey) -> Result<Vec<VideoMode>> {
        self.0.win32_video_modes(monitor)
    }
    fn current_video_mode(&self, monitor: &MonitorKey) -> Result<VideoMode> {
        self.0.win32_current_video_mode(monitor)
    }
    fn set_video_mode(&self, monitor: &MonitorKey, mode: &VideoMode) -> Result<()> {
        self.0.win32_set_video_mode(monitor, mode)
    }
    fn restore_video_mode(&self, monitor: &MonitorKey, _original: &VideoMode) -> Result<()> {
        // The registry settings are the original mode.
        self.0.win32_restore_video_mode(monitor)
    }
    fn set_fullscreen_inhibitors(&self, active: bool) -> Result<()> {
        let s = &self.0;
        unsafe {
            if active {
                SetThreadExecutionState(ES_CONTINUOUS | ES_DISPLAY_REQUIRED);
                if s.mouse_trails.get().is_none() {
                    // Mouse trails break with fullscreen OpenGL.
                    let mut trails: UINT = 0;
                    SystemParametersInfoW(SPI_GETMOUSETRAILS, 0, &mut trails as *mut UINT as *mut c_void, 0);
                    s.mouse_trails.set(Some(trails));
                    SystemParametersInfoW(SPI_SETMOUSETRAILS, 0, ptr::null_mut(), 0);
                }
            } else {
                SetThreadExecutionState(ES_CONTINUOUS);
                if let Some(trails) = s.mouse_trails.take() {
                    SystemParametersInfoW(SPI_SETMOUSETRAILS, trails, ptr::null_mut(), 0);
                }
            }
        }
        Ok(())
    }

    fn create_window(&self, id: WindowId, wndconfig: &WindowConfig, fbconfig: &FramebufferConfig, ctxconfig: &ContextConfig, monitor: Option<&MonitorKey>) -> Result<()> {
        self.0.win32_create_window(id, wndconfig, fbconfig, ctxconfig, monitor)
    }
    fn create_context(&self, id: WindowId, _fbconfig: &FramebufferConfig, ctxconfig: &ContextConfig, share: Option<&dyn PlatformContext>) -> Result<Box<dyn PlatformContext>> {
        let wgl = self.0.wgl()?;
        let (dc, fullscreen) = self.0.with_window(id, |w| (w.dc, w.fullscreen.clone()))?;
        let share = match share {
            Some(share) => Some(share.as_any().downcast_ref::<WglContext>()
                .ok_or_else(|| Error::invalid_value("Can only share with another WGL context"))?),
            None => None,
        };
        let context = unsafe { wgl.create_context(&self.0.libs, dc, ctxconfig, share, fullscreen, self.0.win8)? };
        Ok(Box::new(context))
    }
    fn destroy_window(&self, id: WindowId) -> Result<()> {
        self.0.win32_destroy_window(id)
    }
    fn set_window_title(&self, id: WindowId, title: &str) -> Result<()> {
        self.0.win32_set_window_title(id, title)
    }
    fn set_window_icon(&self, id: WindowId, images: &[RgbaImage]) -> Result<()> {
        self.0.win32_set_window_icon(id, images)
    }
    fn window_pos(&self, id: WindowId) -> Result<Vec2<i32>> {
        self.0.win32_window_pos(id)
    }
    fn set_window_pos(&self, id: WindowId, pos: Vec2<i32>) -> Result<()> {
        self.0.win32_set_window_pos(id, pos)
    }
    fn window_size(&self, id: WindowId) -> Result<Extent2<i32>> {
        self.0.win32_window_size(id)
    }
    fn set_window_size(&self, id: WindowId, size: Extent2<i32>) -> Result<()> {
        self.0.win32_set_window_size(id, size)
    }
    fn set_window_size_limits(&self, id: WindowId, min: Extent2<i32>, max: Extent2<i32>) -> Result<()> {
        self.0.win32_set_window_size_limits(id, min, max)
    }
    fn set_window_aspect_ratio(&self, id: WindowId, numer: i32, denom: i32) -> Result<()> {
        self.0.win32_set_window_aspect_ratio(id, numer, denom)
    }
    fn framebuffer_size(&self, id: WindowId) -> Result<Extent2<i32>> {
        // The client area is in physical pixels under per-monitor DPI awareness.
        self.0.win32_window_size(id)
    }
    fn window_frame_size(&self, id: WindowId) -> Result<FrameExtents> {
        self.0.win32_window_frame_size(id)
    }
    fn window_content_scale(&self, id: WindowId) -> Result<Vec2<f32>> {
        self.0.win32_window_content_scale(id)
    }
    fn iconify_window(&self, id: WindowId) -> Result<()> {
        self.0.win32_iconify_window(id)
    }
    fn restore_window(&self, id: WindowId) -> Result<()> {
        self.0.win32_restore_window(id)
    }
    fn maximize_window(&self, id: WindowId) -> Result<()> {
        self.0.win32_maximize_window(id)
    }
    fn show_window(&self, id: WindowId) -> Result<()> {
        self.0.win32_show_window(id)
    }
    fn hide_window(&self, id: WindowId) -> Result<()> {
        self.0.win32_hide_window(id)
    }
    fn request_window_attention(&self, id: WindowId) -> Result<()> {
        self.0.win32_request_window_attention(id)
    }
    fn focus_window(&self, id: WindowId) -> Result<()> {
        self.0.win32_focus_window(id)
    }
    fn set_window_monitor(&self, id: WindowId, monitor: Option<&MonitorKey>, rect: Rect<i32, i32>) -> Result<()> {
        self.0.win32_set_window_monitor(id, monitor, rect)
    }
    fn window_focused(&self, id: WindowId) -> Result<bool> {
        self.0.win32_window_focused(id)
    }
    fn window_iconified(&self, id: WindowId) -> Result<bool> {
        self.0.win32_window_iconified(id)
    }
    fn window_visible(&self, id: WindowId) -> Result<bool> {
        self.0.win32_window_visible(id)
    }
    fn window_maximized(&self, id: WindowId) -> Result<bool> {
        self.0.win32_window_maximized(id)
    }
    fn window_hovered(&self, id: WindowId) -> Result<bool> {
        self.0.win32_window_hovered(id)
    }
    fn framebuffer_transparent(&self, id: WindowId) -> Result<bool> {
        self.0.win32_framebuffer_transparent(id)
    }
    fn set_window_resizable(&self, id: WindowId, enabled: bool) -> Result<()> {
        self.0.win32_set_window_resizable(id, enabled)
    }
    fn set_window_decorated(&self, id: WindowId, enabled: bool) -> Result<()> {
        self.0.win32_set_window_decorated(id, enabled)
    }
    fn set_window_floating(&self, id: WindowId, enabled: bool) -> Result<()> {
        self.0.win32_set_window_floating(id, enabled)
    }
    fn set_window_mouse_passthrough(&self, id: WindowId, enabled: bool) -> Result<()> {
        self.0.win32_set_window_mouse_passthrough(id, enabled)
    }
    fn window_opacity(&self, id: WindowId) -> Result<f32> {
        self.0.win32_window_opacity(id)
    }
    fn set_window_opacity(&self, id: WindowId, opacity: f32) -> Result<()> {
        self.0.win32_set_window_opacity(id, opacity)
    }

    fn poll_events(&self, timeout: Timeout) -> Result<Vec<Event>> {
        let s = &self.0;
        unsafe {
            if s.pending.borrow().is_empty() && !timeout.is_none() {
                match timeout.duration() {
                    None => {
                        WaitMessage();
                    },
                    Some(d) => {
                        let millis = d.as_millis().min(DWORD::max_value() as u128 - 1) as DWORD;
                        MsgWaitForMultipleObjects(0, ptr::null(), FALSE, millis, QS_ALLINPUT);
                    },
                }
            }
            let mut msg: MSG = mem::zeroed();
            while PeekMessageW(&mut msg, ptr::null_mut(), 0, 0, PM_REMOVE) != FALSE {
                if msg.message == WM_QUIT {
                    // Someone posted WM_QUIT to this thread; ask every window to close.
                    let ids: Vec<WindowId> = s.windows.borrow().keys().copied().collect();
                    for window in ids {
                        s.push(Event::WindowCloseRequested { window });
                    }
                } else {
                    TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }
        }
        s.release_stuck_shifts();
        Ok(mem::replace(&mut *s.pending.borrow_mut(), Vec::new()))
    }
    fn waker(&self) -> Arc<dyn Waker> {
        self.0.waker.clone()
    }
    fn cursor_pos(&self, id: WindowId) -> Result<Vec2<f64>> {
        self.0.win32_cursor_pos(id)
    }
    fn set_cursor_pos(&self, id: WindowId, pos: Vec2<f64>) -> Result<()> {
        self.0.win32_set_cursor_pos(id, pos)
    }
    fn apply_cursor_mode(&self, id: WindowId, mode: CursorMode, raw_motion: bool) -> Result<()> {
        self.0.win32_apply_cursor_mode(id, mode, raw_motion)
    }
    fn raw_mouse_motion_supported(&self) -> bool {
        true
    }
    fn key_scancode(&self, key: Key) -> i32 {
        self.0.keys.scancode(key)
    }
    fn key_name(&self, scancode: i32) -> Option<String> {
        self.0.key_name(scancode)
    }
    fn create_cursor(&self, id: CursorId, image: &RgbaImage, hot: Vec2<i32>) -> Result<()> {
        self.0.win32_create_cursor(id, image, hot)
    }
    fn create_standard_cursor(&self, id: CursorId, shape: StandardCursor) -> Result<()> {
        self.0.win32_create_standard_cursor(id, shape)
    }
    fn destroy_cursor(&self, id: CursorId) -> Result<()> {
        self.0.win32_destroy_cursor(id)
    }
    fn set_cursor(&self, window: WindowId, cursor: Option<CursorId>) -> Result<()> {
        self.0.win32_set_cursor(window, cursor)
    }
    fn set_clipboard_string(&self, s: &str) -> Result<()> {
        self.0.win32_set_clipboard_string(s)
    }
    fn clipboard_string(&self) -> Result<String> {
        self.0.win32_clipboard_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypad_keys_name_their_digits() {
        assert_eq!(keypad_virtual_key(Key::Kp0), Some(VK_NUMPAD0));
        assert_eq!(keypad_virtual_key(Key::KpAdd), Some(VK_ADD));
        assert_eq!(keypad_virtual_key(Key::KpEnter), None);
        assert_eq!(keypad_virtual_key(Key::A), None);
    }
}
