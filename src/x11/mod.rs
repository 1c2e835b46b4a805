//! The X11 backend: Xlib for windows and input, XRandR for monitors, GLX for contexts.
//!
//! Optional extensions (XInput2, XRender, XFixes, Xcursor) are loaded at connection time;
//! features that need a missing one report `PlatformError` or fall back.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::os::raw::{c_int, c_ulong};
use std::os::unix::io::RawFd;
use std::ptr;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::poll::{poll, PollFd, PollFlags};
use nix::unistd;
use x11_dl::xlib::{self as x, Xlib};
use x11_dl::xrandr::{RRCrtc, RRMode};

pub mod atoms;
pub mod cursor;
pub mod event;
pub mod glx;
pub mod keys;
pub mod missing_bits;
pub mod motif_wm;
pub mod net_wm;
pub mod prop;
pub mod selection;
pub mod window;
pub mod xi;
pub mod xlib_error;
pub mod xrandr;
pub mod xrender;

use self::atoms::PreloadedAtoms;
use self::event::XdndState;
use self::glx::{GlxContext, GlxLib};
use self::keys::{keysym_to_char, KeyTables};
use self::missing_bits::xlib::{PropertyChangeMask, XA_ATOM};
use self::window::X11Window;
use self::xi::XI;
use self::xrandr::XRandR;
use self::xrender::XRender;
use crate::cursor::StandardCursor;
use crate::error::{self, Error, Result};
use crate::event::Event;
use crate::hint::{ContextConfig, FramebufferConfig, InitHints, WindowConfig};
use crate::image::RgbaImage;
use crate::input::{CursorMode, Key};
use crate::monitor::VideoMode;
use crate::platform::{CursorId, FrameExtents, MonitorInfo, MonitorKey, Platform, PlatformContext, PlatformKind, Waker, WindowId};
use crate::timeout::Timeout;
use crate::{Extent2, Rect, Vec2};

const DontPreferBlanking: c_int = 0;
const DefaultExposures: c_int = 2;

/// Wakes `poll()` through a self-pipe, since Xlib has no thread-safe way to post an event
/// without `XInitThreads()`.
#[derive(Debug)]
struct PipeWaker {
    read_fd: RawFd,
    write_fd: RawFd,
}

impl PipeWaker {
    fn new() -> Result<Self> {
        let (read_fd, write_fd) = unistd::pipe2(OFlag::O_NONBLOCK | OFlag::O_CLOEXEC)
            .map_err(|e| Error::failed(format!("Failed to create the wake-up pipe: {}", e)))?;
        Ok(Self { read_fd, write_fd })
    }
    fn drain(&self) {
        let mut buf = [0_u8; 64];
        while let Ok(n) = unistd::read(self.read_fd, &mut buf) {
            if n == 0 {
                break;
            }
        }
    }
}

impl Waker for PipeWaker {
    fn wake(&self) -> Result<()> {
        match unistd::write(self.write_fd, &[0]) {
            // A full pipe already wakes the reader.
            Ok(_) | Err(Errno::EAGAIN) => Ok(()),
            Err(e) => error::failed(format!("Failed to write to the wake-up pipe: {}", e)),
        }
    }
}

impl Drop for PipeWaker {
    fn drop(&mut self) {
        let _ = unistd::close(self.read_fd);
        let _ = unistd::close(self.write_fd);
    }
}

unsafe extern "C" fn log_xlib_error(_x_display: *mut x::Display, e: *mut x::XErrorEvent) -> c_int {
    // No requests allowed here, so no XGetErrorText().
    if let Some(e) = e.as_ref() {
        warn!("X error {} (request {}.{}, resource {:#x})", e.error_code, e.request_code, e.minor_code, e.resourceid);
    }
    0
}

pub(crate) struct X11Platform {
    xlib: Rc<Xlib>,
    x_display: *mut x::Display,
    screen: c_int,
    root: x::Window,
    depth: c_int,
    atoms: PreloadedAtoms,
    randr: Option<XRandR>,
    xi: Option<XI>,
    xrender: Option<XRender>,
    xfixes: Option<x11_dl::xfixes::Xlib>,
    xcursor: Option<x11_dl::xcursor::Xcursor>,
    glx: Option<Rc<GlxLib>>,
    xim: x::XIM,
    keys: KeyTables,
    content_scale: Vec2<f32>,
    net_supported: Vec<x::Atom>,
    /// Owns the clipboard and receives selection conversions.
    helper_window: x::Window,
    hidden_cursor: x::Cursor,
    windows: RefCell<HashMap<WindowId, X11Window>>,
    handles: RefCell<HashMap<x::Window, WindowId>>,
    cursors: RefCell<HashMap<CursorId, x::Cursor>>,
    old_modes: RefCell<HashMap<RRCrtc, RRMode>>,
    clipboard: RefCell<String>,
    disabled_window: Cell<Option<WindowId>>,
    xdnd: Cell<XdndState>,
    saved_screensaver: Cell<Option<[c_int; 4]>>,
    waker: Arc<PipeWaker>,
}

impl X11Platform {
    pub fn connect(hints: &InitHints) -> Result<Self> {
        let xlib = Xlib::open().map_err(|e| Error::failed(format!("Failed to load Xlib: {}", e)))?;
        unsafe {
            if hints.xlib_xinitthreads {
                (xlib.XInitThreads)();
            }
            if !hints.xlib_default_error_handlers {
                (xlib.XSetErrorHandler)(Some(log_xlib_error));
            }
            let x_display = (xlib.XOpenDisplay)(ptr::null());
            if x_display.is_null() {
                return error::failed("Failed to open the X display; is DISPLAY set?");
            }
            let xlib = Rc::new(xlib);
            match Self::connect_display(&xlib, x_display) {
                Ok(platform) => Ok(platform),
                Err(e) => {
                    (xlib.XCloseDisplay)(x_display);
                    Err(e)
                },
            }
        }
    }

    unsafe fn connect_display(xlib: &Rc<Xlib>, x_display: *mut x::Display) -> Result<Self> {
        let screen = (xlib.XDefaultScreen)(x_display);
        let root = (xlib.XRootWindow)(x_display, screen);
        let depth = (xlib.XDefaultDepth)(x_display, screen);

        let mut atoms = PreloadedAtoms::load(xlib, x_display);
        atoms.fix_up(xlib, x_display);
        let net_supported = prop::get::<c_ulong>(xlib, x_display, root, atoms._NET_SUPPORTED, XA_ATOM)
            .ok().and_then(|p| p).map_or(Vec::new(), |p| p.data);

        let randr = XRandR::query(x_display, root).map_err(|e| warn!("RandR unavailable: {}", e)).ok();
        let xi = XI::query(xlib, x_display).map_err(|e| info!("XInput2 unavailable: {}", e)).ok();
        let xrender = XRender::query(x_display).map_err(|e| info!("XRender unavailable: {}", e)).ok();
        let xfixes = x11_dl::xfixes::Xlib::open().map_err(|e| info!("XFixes unavailable: {}", e)).ok();
        let xcursor = x11_dl::xcursor::Xcursor::open().map_err(|e| info!("Xcursor unavailable: {}", e)).ok();
        let glx = GlxLib::query(xlib.clone(), x_display, screen).map(Rc::new)
            .map_err(|e| info!("GLX unavailable: {}", e)).ok();

        // Lets the core tell repeats from presses, since releases are no longer synthesized.
        let mut supported = x::False;
        (xlib.XkbSetDetectableAutoRepeat)(x_display, x::True, &mut supported);
        if supported == x::False {
            warn!("Detectable auto-repeat is not supported");
        }

        let mut xim = ptr::null_mut();
        if (xlib.XSupportsLocale)() != x::False {
            (xlib.XSetLocaleModifiers)(b"\0".as_ptr() as *const _);
            xim = (xlib.XOpenIM)(x_display, ptr::null_mut(), ptr::null_mut(), ptr::null_mut());
        }
        if xim.is_null() {
            info!("No input method; text input falls back to keysyms");
        }

        let helper_window = (xlib.XCreateSimpleWindow)(x_display, root, 0, 0, 1, 1, 0, 0, 0);
        (xlib.XSelectInput)(x_display, helper_window, PropertyChangeMask);
        let hidden_cursor = Self::create_hidden_cursor(xlib, x_display, root);
        let content_scale = xrandr::query_content_scale(xlib, x_display);
        let keys = KeyTables::load(xlib, x_display);
        let waker = Arc::new(PipeWaker::new()?);

        debug!("Connected to X display; screen {}, depth {}, content scale {:?}", screen, depth, content_scale);

        Ok(Self {
            xlib: xlib.clone(),
            x_display,
            screen,
            root,
            depth,
            atoms,
            randr,
            xi,
            xrender,
            xfixes,
            xcursor,
            glx,
            xim,
            keys,
            content_scale,
            net_supported,
            helper_window,
            hidden_cursor,
            windows: RefCell::new(HashMap::new()),
            handles: RefCell::new(HashMap::new()),
            cursors: RefCell::new(HashMap::new()),
            old_modes: RefCell::new(HashMap::new()),
            clipboard: RefCell::new(String::new()),
            disabled_window: Cell::new(None),
            xdnd: Cell::new(XdndState::default()),
            saved_screensaver: Cell::new(None),
            waker,
        })
    }

    /// Blocks until the connection (and optionally the wake-up pipe) is readable.
    fn wait(&self, timeout: Timeout, with_waker: bool) -> bool {
        let connection = unsafe { (self.xlib.XConnectionNumber)(self.x_display) };
        let deadline = timeout.duration().map(|d| Instant::now() + d);
        loop {
            let mut fds = vec![PollFd::new(connection, PollFlags::POLLIN)];
            if with_waker {
                fds.push(PollFd::new(self.waker.read_fd, PollFlags::POLLIN));
            }
            let millis = match deadline {
                Some(deadline) => Timeout::Set(deadline.saturating_duration_since(Instant::now())).as_poll_millis(),
                None => -1,
            };
            match poll(&mut fds, millis) {
                Ok(n) => return n > 0,
                Err(Errno::EINTR) => continue,
                Err(e) => {
                    warn!("poll() failed: {}", e);
                    return false;
                },
            }
        }
    }

    /// Waits for data on the X connection only. Returns false on timeout.
    pub(super) fn wait_for_x_event(&self, timeout: Option<Duration>) -> bool {
        unsafe {
            (self.xlib.XFlush)(self.x_display);
        }
        self.wait(timeout.map_or(Timeout::Infinite, Timeout::Set), false)
    }
}

impl Drop for X11Platform {
    fn drop(&mut self) {
        unsafe {
            for (_, cursor) in self.cursors.get_mut().drain() {
                (self.xlib.XFreeCursor)(self.x_display, cursor);
            }
            (self.xlib.XFreeCursor)(self.x_display, self.hidden_cursor);
            (self.xlib.XDestroyWindow)(self.x_display, self.helper_window);
            if !self.xim.is_null() {
                (self.xlib.XCloseIM)(self.xim);
            }
            // GLX keeps a handle on the display until its last context is gone.
            self.glx = None;
            (self.xlib.XCloseDisplay)(self.x_display);
        }
    }
}

impl Platform for X11Platform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::X11
    }
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn poll_monitors(&self) -> Result<Vec<MonitorInfo>> {
        self.randr_poll_monitors()
    }
    fn monitor_pos(&self, monitor: &MonitorKey) -> Result<Vec2<i32>> {
        self.randr_monitor_pos(monitor)
    }
    fn monitor_work_area(&self, monitor: &MonitorKey) -> Result<Rect<i32, i32>> {
        self.randr_monitor_work_area(monitor)
    }
    fn monitor_content_scale(&self, monitor: &MonitorKey) -> Result<Vec2<f32>> {
        self.randr_monitor_content_scale(monitor)
    }
    fn video_modes(&self, monitor: &MonitorKey) -> Result<Vec<VideoMode>> {
        self.randr_video_modes(monitor)
    }
    fn current_video_mode(&self, monitor: &MonitorKey) -> Result<VideoMode> {
        self.randr_current_video_mode(monitor)
    }
    fn set_video_mode(&self, monitor: &MonitorKey, mode: &VideoMode) -> Result<()> {
        self.randr_set_video_mode(monitor, mode)
    }
    fn restore_video_mode(&self, monitor: &MonitorKey, original: &VideoMode) -> Result<()> {
        self.randr_restore_video_mode(monitor, original)
    }
    fn set_fullscreen_inhibitors(&self, active: bool) -> Result<()> {
        unsafe {
            if active {
                if self.saved_screensaver.get().is_none() {
                    let mut saved = [0; 4];
                    let [timeout, interval, blanking, exposures] = &mut saved;
                    (self.xlib.XGetScreenSaver)(self.x_display, timeout, interval, blanking, exposures);
                    self.saved_screensaver.set(Some(saved));
                }
                (self.xlib.XSetScreenSaver)(self.x_display, 0, 0, DontPreferBlanking, DefaultExposures);
            } else if let Some([timeout, interval, blanking, exposures]) = self.saved_screensaver.take() {
                (self.xlib.XSetScreenSaver)(self.x_display, timeout, interval, blanking, exposures);
            }
        }
        Ok(())
    }

    fn create_window(&self, id: WindowId, wndconfig: &WindowConfig, fbconfig: &FramebufferConfig, ctxconfig: &ContextConfig, monitor: Option<&MonitorKey>) -> Result<()> {
        self.x11_create_window(id, wndconfig, fbconfig, ctxconfig, monitor)
    }
    fn create_context(&self, id: WindowId, _fbconfig: &FramebufferConfig, ctxconfig: &ContextConfig, share: Option<&dyn PlatformContext>) -> Result<Box<dyn PlatformContext>> {
        let glx = self.glx.as_ref().ok_or_else(|| Error::api_unavailable("GLX is not available"))?;
        let (handle, config) = self.with_window(id, |w| (w.handle, w.fbconfig))?;
        let config = config.ok_or_else(|| Error::format_unavailable("The window has no GLX framebuffer configuration"))?;
        let share = match share {
            Some(share) => Some(share.as_any().downcast_ref::<GlxContext>()
                .ok_or_else(|| Error::invalid_value("Can only share with another GLX context"))?),
            None => None,
        };
        let context = unsafe { glx.create_context(config, handle, ctxconfig, share)? };
        Ok(Box::new(context))
    }
    fn destroy_window(&self, id: WindowId) -> Result<()> {
        self.x11_destroy_window(id)
    }
    fn set_window_title(&self, id: WindowId, title: &str) -> Result<()> {
        self.x11_set_window_title(id, title)
    }
    fn set_window_icon(&self, id: WindowId, images: &[RgbaImage]) -> Result<()> {
        self.x11_set_window_icon(id, images)
    }
    fn window_pos(&self, id: WindowId) -> Result<Vec2<i32>> {
        self.x11_window_pos(id)
    }
    fn set_window_pos(&self, id: WindowId, pos: Vec2<i32>) -> Result<()> {
        self.x11_set_window_pos(id, pos)
    }
    fn window_size(&self, id: WindowId) -> Result<Extent2<i32>> {
        self.x11_window_size(id)
    }
    fn set_window_size(&self, id: WindowId, size: Extent2<i32>) -> Result<()> {
        self.x11_set_window_size(id, size)
    }
    fn set_window_size_limits(&self, id: WindowId, min: Extent2<i32>, max: Extent2<i32>) -> Result<()> {
        self.x11_set_window_size_limits(id, min, max)
    }
    fn set_window_aspect_ratio(&self, id: WindowId, numer: i32, denom: i32) -> Result<()> {
        self.x11_set_window_aspect_ratio(id, numer, denom)
    }
    fn framebuffer_size(&self, id: WindowId) -> Result<Extent2<i32>> {
        self.x11_window_size(id)
    }
    fn window_frame_size(&self, id: WindowId) -> Result<FrameExtents> {
        self.x11_window_frame_size(id)
    }
    fn window_content_scale(&self, id: WindowId) -> Result<Vec2<f32>> {
        self.handle(id)?;
        Ok(self.content_scale)
    }
    fn iconify_window(&self, id: WindowId) -> Result<()> {
        self.x11_iconify_window(id)
    }
    fn restore_window(&self, id: WindowId) -> Result<()> {
        self.x11_restore_window(id)
    }
    fn maximize_window(&self, id: WindowId) -> Result<()> {
        self.x11_maximize_window(id)
    }
    fn show_window(&self, id: WindowId) -> Result<()> {
        self.x11_show_window(id)
    }
    fn hide_window(&self, id: WindowId) -> Result<()> {
        self.x11_hide_window(id)
    }
    fn request_window_attention(&self, id: WindowId) -> Result<()> {
        self.x11_request_window_attention(id)
    }
    fn focus_window(&self, id: WindowId) -> Result<()> {
        self.x11_focus_window(id)
    }
    fn set_window_monitor(&self, id: WindowId, monitor: Option<&MonitorKey>, rect: Rect<i32, i32>) -> Result<()> {
        self.x11_set_window_monitor(id, monitor, rect)
    }
    fn window_focused(&self, id: WindowId) -> Result<bool> {
        self.x11_window_focused(id)
    }
    fn window_iconified(&self, id: WindowId) -> Result<bool> {
        self.x11_window_iconified(id)
    }
    fn window_visible(&self, id: WindowId) -> Result<bool> {
        self.x11_window_visible(id)
    }
    fn window_maximized(&self, id: WindowId) -> Result<bool> {
        self.x11_window_maximized(id)
    }
    fn window_hovered(&self, id: WindowId) -> Result<bool> {
        self.x11_window_hovered(id)
    }
    fn framebuffer_transparent(&self, id: WindowId) -> Result<bool> {
        self.x11_framebuffer_transparent(id)
    }
    fn set_window_resizable(&self, id: WindowId, enabled: bool) -> Result<()> {
        self.x11_set_window_resizable(id, enabled)
    }
    fn set_window_decorated(&self, id: WindowId, enabled: bool) -> Result<()> {
        self.x11_set_window_decorated(id, enabled)
    }
    fn set_window_floating(&self, id: WindowId, enabled: bool) -> Result<()> {
        self.x11_set_window_floating(id, enabled)
    }
    fn set_window_mouse_passthrough(&self, id: WindowId, enabled: bool) -> Result<()> {
        self.x11_set_window_mouse_passthrough(id, enabled)
    }
    fn window_opacity(&self, id: WindowId) -> Result<f32> {
        self.x11_window_opacity(id)
    }
    fn set_window_opacity(&self, id: WindowId, opacity: f32) -> Result<()> {
        self.x11_set_window_opacity(id, opacity)
    }

    fn poll_events(&self, timeout: Timeout) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        unsafe {
            (self.xlib.XPending)(self.x_display);
            if (self.xlib.XQLength)(self.x_display) == 0 && !timeout.is_none() {
                self.wait(timeout, true);
            }
            self.waker.drain();
            (self.xlib.XPending)(self.x_display);
            while (self.xlib.XQLength)(self.x_display) > 0 {
                let mut event: x::XEvent = std::mem::zeroed();
                (self.xlib.XNextEvent)(self.x_display, &mut event);
                self.process_event(&mut event, &mut events);
            }
            (self.xlib.XFlush)(self.x_display);
        }
        Ok(events)
    }
    fn waker(&self) -> Arc<dyn Waker> {
        self.waker.clone()
    }
    fn cursor_pos(&self, id: WindowId) -> Result<Vec2<f64>> {
        self.x11_cursor_pos(id)
    }
    fn set_cursor_pos(&self, id: WindowId, pos: Vec2<f64>) -> Result<()> {
        self.x11_set_cursor_pos(id, pos)
    }
    fn apply_cursor_mode(&self, id: WindowId, mode: CursorMode, raw_motion: bool) -> Result<()> {
        self.x11_apply_cursor_mode(id, mode, raw_motion)
    }
    fn raw_mouse_motion_supported(&self) -> bool {
        self.x11_raw_mouse_motion_supported()
    }
    fn key_scancode(&self, key: Key) -> i32 {
        self.keys.scancode(key)
    }
    fn key_name(&self, scancode: i32) -> Option<String> {
        if scancode < 0 || scancode > 0xFF {
            return None;
        }
        let keysym = unsafe { (self.xlib.XkbKeycodeToKeysym)(self.x_display, scancode as x::KeyCode, 0, 0) };
        keysym_to_char(keysym).filter(|c| !c.is_control()).map(|c| c.to_string())
    }
    fn create_cursor(&self, id: CursorId, image: &RgbaImage, hot: Vec2<i32>) -> Result<()> {
        self.x11_create_cursor(id, image, hot)
    }
    fn create_standard_cursor(&self, id: CursorId, shape: StandardCursor) -> Result<()> {
        self.x11_create_standard_cursor(id, shape)
    }
    fn destroy_cursor(&self, id: CursorId) -> Result<()> {
        self.x11_destroy_cursor(id)
    }
    fn set_cursor(&self, window: WindowId, cursor: Option<CursorId>) -> Result<()> {
        self.x11_set_cursor(window, cursor)
    }
    fn set_clipboard_string(&self, s: &str) -> Result<()> {
        self.x11_set_clipboard_string(s)
    }
    fn clipboard_string(&self) -> Result<String> {
        self.x11_clipboard_string()
    }
}
