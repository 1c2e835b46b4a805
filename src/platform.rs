//! The seam between the platform-independent core and the native backends.
//!
//! The core owns all window/monitor/cursor bookkeeping and the user-visible
//! semantics; backends only perform native work and translate native
//! messages into `event::Event`s, which the core dispatches.
//!
//! Backends take `&self` everywhere and use interior mutability, because native
//! callbacks (window procedures, error handlers) may re-enter them.

use std::any::Any;
use std::fmt;
use std::os::raw::c_void;
use std::sync::Arc;
use crate::error::Result;
use crate::event::Event;
use crate::hint::{ContextConfig, FramebufferConfig, WindowConfig};
use crate::image::RgbaImage;
use crate::input::{CursorMode, Key};
use crate::cursor::StandardCursor;
use crate::monitor::VideoMode;
use crate::timeout::Timeout;
use crate::{Extent2, Rect, Vec2};

/// The backends this crate can run on.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum PlatformKind {
    /// Picks the native backend for the target.
    Any,
    /// Win32 and WGL.
    Win32,
    /// Xlib, XRandR and GLX.
    X11,
    /// AppKit, Quartz Display Services and NSGL.
    Cocoa,
    /// Headless in-process simulation, available everywhere.
    Null,
}

/// Library-assigned identity of a window, stable for its whole lifetime.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct WindowId(pub u64);

/// Library-assigned identity of a cursor.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct CursorId(pub u64);

/// Backend-specific stable identity of a display, used to diff hot-plug changes.
///
/// Win32: adapter and display device names. X11: the RandR output XID. Cocoa: the
/// display unit number.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub(crate) struct MonitorKey(pub String);

/// What a backend reports about each connected display.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MonitorInfo {
    pub key: MonitorKey,
    pub name: String,
    pub width_mm: i32,
    pub height_mm: i32,
    pub primary: bool,
}

/// Extents of each window frame edge, in screen coordinates.
#[derive(Debug, Copy, Clone, Default, Hash, PartialEq, Eq)]
pub struct FrameExtents {
    #[allow(missing_docs)]
    pub left: i32,
    #[allow(missing_docs)]
    pub top: i32,
    #[allow(missing_docs)]
    pub right: i32,
    #[allow(missing_docs)]
    pub bottom: i32,
}

/// Framebuffer configuration candidate, with the capabilities that act as hard filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FbCandidate {
    pub fb: FramebufferConfig,
    pub accelerated: bool,
    pub window_drawable: bool,
}

/// Raw OpenGL function pointer, as returned by `get_proc_address`.
pub type GlProc = *const c_void;

/// Wakes a thread blocked in `Platform::poll_events`.
pub(crate) trait Waker: Send + Sync {
    fn wake(&self) -> Result<()>;
}

/// A native OpenGL or OpenGL ES context. Dropping it destroys it.
pub(crate) trait PlatformContext {
    fn as_any(&self) -> &dyn Any;
    /// Makes this context current on the calling thread, or detaches it if `current` is false.
    fn make_current(&self, current: bool) -> Result<()>;
    fn swap_buffers(&self) -> Result<()>;
    fn swap_interval(&self, interval: i32) -> Result<()>;
    /// Looks the name up in the window-system extension string (WGL, GLX...).
    fn extension_supported(&self, name: &str) -> bool;
    fn get_proc_address(&self, name: &str) -> GlProc;
}

/// Everything the core needs from a backend.
pub(crate) trait Platform {
    fn kind(&self) -> PlatformKind;
    fn as_any(&self) -> &dyn Any;

    // Monitors

    fn poll_monitors(&self) -> Result<Vec<MonitorInfo>>;
    fn monitor_pos(&self, monitor: &MonitorKey) -> Result<Vec2<i32>>;
    fn monitor_work_area(&self, monitor: &MonitorKey) -> Result<Rect<i32, i32>>;
    fn monitor_content_scale(&self, monitor: &MonitorKey) -> Result<Vec2<f32>>;
    fn video_modes(&self, monitor: &MonitorKey) -> Result<Vec<VideoMode>>;
    fn current_video_mode(&self, monitor: &MonitorKey) -> Result<VideoMode>;
    fn set_video_mode(&self, monitor: &MonitorKey, mode: &VideoMode) -> Result<()>;
    fn restore_video_mode(&self, monitor: &MonitorKey, original: &VideoMode) -> Result<()>;
    /// Toggled when the first monitor is acquired and when the last one is released.
    fn set_fullscreen_inhibitors(&self, active: bool) -> Result<()>;

    // Windows

    fn create_window(&self, id: WindowId, wndconfig: &WindowConfig, fbconfig: &FramebufferConfig, ctxconfig: &ContextConfig, monitor: Option<&MonitorKey>) -> Result<()>;
    fn create_context(&self, id: WindowId, fbconfig: &FramebufferConfig, ctxconfig: &ContextConfig, share: Option<&dyn PlatformContext>) -> Result<Box<dyn PlatformContext>>;
    fn destroy_window(&self, id: WindowId) -> Result<()>;
    fn set_window_title(&self, id: WindowId, title: &str) -> Result<()>;
    fn set_window_icon(&self, id: WindowId, images: &[RgbaImage]) -> Result<()>;
    fn window_pos(&self, id: WindowId) -> Result<Vec2<i32>>;
    fn set_window_pos(&self, id: WindowId, pos: Vec2<i32>) -> Result<()>;
    fn window_size(&self, id: WindowId) -> Result<Extent2<i32>>;
    fn set_window_size(&self, id: WindowId, size: Extent2<i32>) -> Result<()>;
    fn set_window_size_limits(&self, id: WindowId, min: Extent2<i32>, max: Extent2<i32>) -> Result<()>;
    fn set_window_aspect_ratio(&self, id: WindowId, numer: i32, denom: i32) -> Result<()>;
    fn framebuffer_size(&self, id: WindowId) -> Result<Extent2<i32>>;
    fn window_frame_size(&self, id: WindowId) -> Result<FrameExtents>;
    fn window_content_scale(&self, id: WindowId) -> Result<Vec2<f32>>;
    fn iconify_window(&self, id: WindowId) -> Result<()>;
    fn restore_window(&self, id: WindowId) -> Result<()>;
    fn maximize_window(&self, id: WindowId) -> Result<()>;
    fn show_window(&self, id: WindowId) -> Result<()>;
    fn hide_window(&self, id: WindowId) -> Result<()>;
    fn request_window_attention(&self, id: WindowId) -> Result<()>;
    fn focus_window(&self, id: WindowId) -> Result<()>;
    /// Switches styles and geometry. `rect` is the monitor's area when fullscreen,
    /// the requested client area otherwise.
    fn set_window_monitor(&self, id: WindowId, monitor: Option<&MonitorKey>, rect: Rect<i32, i32>) -> Result<()>;
    fn window_focused(&self, id: WindowId) -> Result<bool>;
    fn window_iconified(&self, id: WindowId) -> Result<bool>;
    fn window_visible(&self, id: WindowId) -> Result<bool>;
    fn window_maximized(&self, id: WindowId) -> Result<bool>;
    fn window_hovered(&self, id: WindowId) -> Result<bool>;
    fn framebuffer_transparent(&self, id: WindowId) -> Result<bool>;
    fn set_window_resizable(&self, id: WindowId, enabled: bool) -> Result<()>;
    fn set_window_decorated(&self, id: WindowId, enabled: bool) -> Result<()>;
    fn set_window_floating(&self, id: WindowId, enabled: bool) -> Result<()>;
    fn set_window_mouse_passthrough(&self, id: WindowId, enabled: bool) -> Result<()>;
    fn window_opacity(&self, id: WindowId) -> Result<f32>;
    fn set_window_opacity(&self, id: WindowId, opacity: f32) -> Result<()>;

    // Events and input

    /// Drains native messages, blocking up to `timeout` when none are pending.
    fn poll_events(&self, timeout: Timeout) -> Result<Vec<Event>>;
    fn waker(&self) -> Arc<dyn Waker>;
    fn cursor_pos(&self, id: WindowId) -> Result<Vec2<f64>>;
    fn set_cursor_pos(&self, id: WindowId, pos: Vec2<f64>) -> Result<()>;
    /// Applies image visibility, confinement and raw-input registration for the mode.
    fn apply_cursor_mode(&self, id: WindowId, mode: CursorMode, raw_motion: bool) -> Result<()>;
    fn raw_mouse_motion_supported(&self) -> bool;
    fn key_scancode(&self, key: Key) -> i32;
    fn key_name(&self, scancode: i32) -> Option<String>;
    fn create_cursor(&self, id: CursorId, image: &RgbaImage, hot: Vec2<i32>) -> Result<()>;
    fn create_standard_cursor(&self, id: CursorId, shape: StandardCursor) -> Result<()>;
    fn destroy_cursor(&self, id: CursorId) -> Result<()>;
    fn set_cursor(&self, window: WindowId, cursor: Option<CursorId>) -> Result<()>;
    fn set_clipboard_string(&self, s: &str) -> Result<()>;
    fn clipboard_string(&self) -> Result<String>;
}

impl fmt::Debug for dyn Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Platform({:?})", self.kind())
    }
}
