//! The headless backend.
//!
//! Windows, monitors, the keyboard and the mouse all live in memory. Geometry
//! and state changes queue the same events a native backend would report, and
//! the `Simulator` injects user input. Available on every target.

mod gl;
mod keys;
mod simulator;

pub use self::gl::{DriverInfo, PixelFormat};
pub use self::simulator::Simulator;

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::{Arc, Condvar, Mutex};
use crate::cursor::StandardCursor;
use crate::error::{self, Error, Result};
use crate::event::Event;
use crate::hint::{ContextConfig, FramebufferConfig, WindowConfig, DONT_CARE};
use crate::image::RgbaImage;
use crate::input::{CursorMode, Key, Modifiers, Utf16Composer};
use crate::monitor::VideoMode;
use crate::platform::{CursorId, FbCandidate, FrameExtents, MonitorInfo, MonitorKey, Platform, PlatformContext, PlatformKind, Waker, WindowId};
use crate::timeout::Timeout;
use crate::{Extent2, Rect, Vec2};
use self::gl::{GlState, NullContext};
use self::keys::KeyTables;

struct NullMonitor {
    key: MonitorKey,
    name: String,
    pos: Vec2<i32>,
    size_mm: Extent2<i32>,
    modes: Vec<VideoMode>,
    current: VideoMode,
    scale: Vec2<f32>,
}

impl NullMonitor {
    fn rect(&self) -> Rect<i32, i32> {
        Rect::new(self.pos.x, self.pos.y, self.current.width, self.current.height)
    }
}

struct NullWindow {
    pos: Vec2<i32>,
    size: Extent2<i32>,
    scale: Vec2<f32>,
    visible: bool,
    iconified: bool,
    maximized: bool,
    decorated: bool,
    resizable: bool,
    floating: bool,
    mouse_passthrough: bool,
    transparent: bool,
    hovered: bool,
    monitor: Option<MonitorKey>,
    opacity: f32,
    title: String,
    icon_count: usize,
    min_size: Extent2<i32>,
    max_size: Extent2<i32>,
    aspect: (i32, i32),
    cursor_mode: CursorMode,
    raw_motion: bool,
    cursor: Option<CursorId>,
    restore_rect: Option<Rect<i32, i32>>,
    gl: Option<Rc<GlState>>,
}

impl NullWindow {
    fn framebuffer_size(&self) -> Extent2<i32> {
        Extent2::new(
            (self.size.w as f32 * self.scale.x) as i32,
            (self.size.h as f32 * self.scale.y) as i32,
        )
    }
    fn apply_size_limits(&self, mut size: Extent2<i32>) -> Extent2<i32> {
        let (numer, denom) = self.aspect;
        if numer != DONT_CARE && denom != DONT_CARE {
            size.h = (size.w as f32 * denom as f32 / numer as f32) as i32;
        }
        if self.min_size.w != DONT_CARE {
            size.w = size.w.max(self.min_size.w);
        }
        if self.min_size.h != DONT_CARE {
            size.h = size.h.max(self.min_size.h);
        }
        if self.max_size.w != DONT_CARE {
            size.w = size.w.min(self.max_size.w);
        }
        if self.max_size.h != DONT_CARE {
            size.h = size.h.min(self.max_size.h);
        }
        size
    }
}

struct NullWaker {
    woken: Mutex<bool>,
    cvar: Condvar,
}

impl Waker for NullWaker {
    fn wake(&self) -> Result<()> {
        let mut woken = self.woken.lock().unwrap_or_else(|e| e.into_inner());
        *woken = true;
        self.cvar.notify_all();
        Ok(())
    }
}

impl NullWaker {
    fn wait(&self, timeout: Timeout) {
        let guard = self.woken.lock().unwrap_or_else(|e| e.into_inner());
        let mut woken = match timeout.duration() {
            Some(d) => self.cvar.wait_timeout_while(guard, d, |w| !*w).map(|(g, _)| g).unwrap_or_else(|e| e.into_inner().0),
            None => self.cvar.wait_while(guard, |w| !*w).unwrap_or_else(|e| e.into_inner()),
        };
        *woken = false;
    }
    fn reset(&self) {
        *self.woken.lock().unwrap_or_else(|e| e.into_inner()) = false;
    }
}

pub(crate) struct NullState {
    monitors: RefCell<Vec<NullMonitor>>,
    next_monitor: Cell<u32>,
    windows: RefCell<HashMap<WindowId, NullWindow>>,
    events: RefCell<VecDeque<Event>>,
    focused: Cell<Option<WindowId>>,
    cursor_screen_pos: Cell<Vec2<f64>>,
    held_keys: RefCell<HashSet<Key>>,
    caps_lock: Cell<bool>,
    num_lock: Cell<bool>,
    keys: KeyTables,
    utf16: RefCell<Utf16Composer>,
    driver: RefCell<DriverInfo>,
    clipboard: RefCell<String>,
    inhibited: Cell<bool>,
    raw_supported: Cell<bool>,
    cursors: RefCell<HashSet<CursorId>>,
    waker: Arc<NullWaker>,
}

fn default_modes() -> Vec<VideoMode> {
    let mode = |width, height, refresh_rate| VideoMode { width, height, red_bits: 8, green_bits: 8, blue_bits: 8, refresh_rate };
    vec![
        mode(640, 480, 60),
        mode(800, 600, 60),
        mode(1280, 720, 60),
        mode(1920, 1080, 60),
        mode(1920, 1080, 144),
    ]
}

impl NullState {
    fn new() -> Self {
        let state = Self {
            monitors: RefCell::new(Vec::new()),
            next_monitor: Cell::new(0),
            windows: RefCell::new(HashMap::new()),
            events: RefCell::new(VecDeque::new()),
            focused: Cell::new(None),
            cursor_screen_pos: Cell::new(Vec2::zero()),
            held_keys: RefCell::new(HashSet::new()),
            caps_lock: Cell::new(false),
            num_lock: Cell::new(false),
            keys: KeyTables::new(),
            utf16: RefCell::new(Utf16Composer::default()),
            driver: RefCell::new(DriverInfo::default()),
            clipboard: RefCell::new(String::new()),
            inhibited: Cell::new(false),
            raw_supported: Cell::new(true),
            cursors: RefCell::new(HashSet::new()),
            waker: Arc::new(NullWaker { woken: Mutex::new(false), cvar: Condvar::new() }),
        };
        let modes = default_modes();
        let current = VideoMode { width: 1920, height: 1080, red_bits: 8, green_bits: 8, blue_bits: 8, refresh_rate: 60 };
        state.add_monitor("Null SuperNoop 0", Vec2::zero(), Extent2::new(527, 296), modes, current);
        state
    }

    fn add_monitor(&self, name: &str, pos: Vec2<i32>, size_mm: Extent2<i32>, modes: Vec<VideoMode>, current: VideoMode) -> MonitorKey {
        let n = self.next_monitor.get();
        self.next_monitor.set(n + 1);
        let key = MonitorKey(format!("null-{}", n));
        self.monitors.borrow_mut().push(NullMonitor {
            key: key.clone(),
            name: name.to_owned(),
            pos,
            size_mm,
            modes,
            current,
            scale: Vec2::one(),
        });
        key
    }

    fn push(&self, event: Event) {
        trace!("Queuing {:?}", event);
        self.events.borrow_mut().push_back(event);
    }

    fn with_monitor<T, F: FnOnce(&mut NullMonitor) -> T>(&self, key: &MonitorKey, f: F) -> Result<T> {
        let mut monitors = self.monitors.borrow_mut();
        let monitor = monitors.iter_mut().find(|m| &m.key == key)
            .ok_or_else(|| Error::failed(format!("Unknown monitor {:?}", key)))?;
        Ok(f(monitor))
    }

    fn with_window<T, F: FnOnce(&mut NullWindow) -> T>(&self, id: WindowId, f: F) -> Result<T> {
        let mut windows = self.windows.borrow_mut();
        let window = windows.get_mut(&id).ok_or_else(|| Error::failed(format!("Unknown window {:?}", id)))?;
        Ok(f(window))
    }

    fn move_window(&self, id: WindowId, w: &mut NullWindow, pos: Vec2<i32>) {
        if w.pos != pos {
            w.pos = pos;
            self.push(Event::WindowMoved { window: id, position: pos });
        }
    }

    fn resize_window(&self, id: WindowId, w: &mut NullWindow, size: Extent2<i32>) {
        if w.size != size {
            w.size = size;
            self.push(Event::WindowResized { window: id, size });
            self.push(Event::FramebufferResized { window: id, size: w.framebuffer_size() });
        }
    }

    fn work_area(&self) -> Rect<i32, i32> {
        self.monitors.borrow().first().map_or(Rect::new(0, 0, 0, 0), |m| {
            let r = m.rect();
            Rect::new(r.x, r.y, r.w, (r.h - 40).max(0))
        })
    }

    fn set_focus(&self, id: Option<WindowId>) {
        let previous = self.focused.get();
        if previous == id {
            return;
        }
        if let Some(previous) = previous {
            self.push(Event::WindowFocusChanged { window: previous, focused: false });
        }
        self.focused.set(id);
        if let Some(id) = id {
            self.push(Event::WindowFocusChanged { window: id, focused: true });
        }
    }

    fn modifiers(&self) -> Modifiers {
        let held = self.held_keys.borrow();
        let mut mods = Modifiers::empty();
        let either = |a, b| held.contains(&a) || held.contains(&b);
        if either(Key::LeftShift, Key::RightShift) {
            mods |= Modifiers::SHIFT;
        }
        if either(Key::LeftControl, Key::RightControl) {
            mods |= Modifiers::CONTROL;
        }
        if either(Key::LeftAlt, Key::RightAlt) {
            mods |= Modifiers::ALT;
        }
        if either(Key::LeftSuper, Key::RightSuper) {
            mods |= Modifiers::SUPER;
        }
        if self.caps_lock.get() {
            mods |= Modifiers::CAPS_LOCK;
        }
        if self.num_lock.get() {
            mods |= Modifiers::NUM_LOCK;
        }
        mods
    }
}

/// The headless backend.
pub(crate) struct NullPlatform {
    state: Rc<NullState>,
}

impl NullPlatform {
    pub fn connect() -> Self {
        info!("Using the Null platform");
        Self { state: Rc::new(NullState::new()) }
    }
}

impl Platform for NullPlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Null
    }
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn poll_monitors(&self) -> Result<Vec<MonitorInfo>> {
        Ok(self.state.monitors.borrow().iter().enumerate().map(|(i, m)| MonitorInfo {
            key: m.key.clone(),
            name: m.name.clone(),
            width_mm: m.size_mm.w,
            height_mm: m.size_mm.h,
            primary: i == 0,
        }).collect())
    }
    fn monitor_pos(&self, monitor: &MonitorKey) -> Result<Vec2<i32>> {
        self.state.with_monitor(monitor, |m| m.pos)
    }
    fn monitor_work_area(&self, monitor: &MonitorKey) -> Result<Rect<i32, i32>> {
        self.state.with_monitor(monitor, |m| {
            let r = m.rect();
            Rect::new(r.x, r.y, r.w, (r.h - 40).max(0))
        })
    }
    fn monitor_content_scale(&self, monitor: &MonitorKey) -> Result<Vec2<f32>> {
        self.state.with_monitor(monitor, |m| m.scale)
    }
    fn video_modes(&self, monitor: &MonitorKey) -> Result<Vec<VideoMode>> {
        self.state.with_monitor(monitor, |m| m.modes.clone())
    }
    fn current_video_mode(&self, monitor: &MonitorKey) -> Result<VideoMode> {
        self.state.with_monitor(monitor, |m| m.current)
    }
    fn set_video_mode(&self, monitor: &MonitorKey, mode: &VideoMode) -> Result<()> {
        self.state.with_monitor(monitor, |m| {
            if !m.modes.contains(mode) {
                return error::failed(format!("Monitor \"{}\" does not support {:?}", m.name, mode));
            }
            m.current = *mode;
            Ok(())
        })?
    }
    fn restore_video_mode(&self, monitor: &MonitorKey, original: &VideoMode) -> Result<()> {
        self.state.with_monitor(monitor, |m| m.current = *original)
    }
    fn set_fullscreen_inhibitors(&self, active: bool) -> Result<()> {
        self.state.inhibited.set(active);
        Ok(())
    }

    fn create_window(&self, id: WindowId, wndconfig: &WindowConfig, fbconfig: &FramebufferConfig, _ctxconfig: &ContextConfig, monitor: Option<&MonitorKey>) -> Result<()> {
        let (pos, scale) = match monitor {
            Some(key) => self.state.with_monitor(key, |m| (m.pos, m.scale))?,
            None => (Vec2::new(17, 17), self.state.monitors.borrow().first().map_or(Vec2::one(), |m| m.scale)),
        };
        let mut size = Extent2::new(wndconfig.width, wndconfig.height);
        if wndconfig.scale_to_monitor && monitor.is_none() {
            size.w = (size.w as f32 * scale.x) as i32;
            size.h = (size.h as f32 * scale.y) as i32;
        }
        let mut window = NullWindow {
            pos,
            size,
            scale,
            visible: false,
            iconified: false,
            maximized: false,
            decorated: wndconfig.decorated,
            resizable: wndconfig.resizable,
            floating: wndconfig.floating,
            mouse_passthrough: wndconfig.mouse_passthrough,
            transparent: fbconfig.transparent,
            hovered: false,
            monitor: monitor.cloned(),
            opacity: 1.,
            title: wndconfig.title.clone(),
            icon_count: 0,
            min_size: Extent2::new(DONT_CARE, DONT_CARE),
            max_size: Extent2::new(DONT_CARE, DONT_CARE),
            aspect: (DONT_CARE, DONT_CARE),
            cursor_mode: CursorMode::Normal,
            raw_motion: false,
            cursor: None,
            restore_rect: None,
            gl: None,
        };
        if wndconfig.maximized && monitor.is_none() {
            let area = self.state.work_area();
            window.restore_rect = Some(Rect::new(pos.x, pos.y, size.w, size.h));
            window.pos = Vec2::new(area.x, area.y);
            window.size = Extent2::new(area.w, area.h);
            window.maximized = true;
        }
        debug!("Null window {:?} at {:?}, {:?}", id, window.pos, window.size);
        self.state.windows.borrow_mut().insert(id, window);
        Ok(())
    }

    fn create_context(&self, id: WindowId, fbconfig: &FramebufferConfig, ctxconfig: &ContextConfig, _share: Option<&dyn PlatformContext>) -> Result<Box<dyn PlatformContext>> {
        let driver = self.state.driver.borrow();
        let candidates: Vec<FbCandidate> = driver.pixel_formats.iter().enumerate().map(|(i, p)| FbCandidate {
            fb: FramebufferConfig {
                red_bits: p.red_bits,
                green_bits: p.green_bits,
                blue_bits: p.blue_bits,
                alpha_bits: p.alpha_bits,
                depth_bits: p.depth_bits,
                stencil_bits: p.stencil_bits,
                accum_red_bits: 0,
                accum_green_bits: 0,
                accum_blue_bits: 0,
                accum_alpha_bits: 0,
                aux_buffers: 0,
                stereo: p.stereo,
                samples: p.samples,
                srgb: p.srgb,
                double_buffer: p.double_buffer,
                transparent: p.transparent,
                handle: i,
            },
            accelerated: p.accelerated,
            window_drawable: true,
        }).collect();
        let chosen = crate::gl::choose_fb_config(fbconfig, &candidates)
            .ok_or_else(|| Error::format_unavailable("Failed to find a suitable pixel format"))?;
        trace!("Chose pixel format {} for window {:?}", chosen.fb.handle, id);
        let state = Rc::new(gl::realize(&driver, ctxconfig)?);
        let transparent = chosen.fb.transparent;
        self.state.with_window(id, |w| {
            w.transparent = transparent;
            w.gl = Some(state.clone());
        })?;
        Ok(Box::new(NullContext { state }))
    }

    fn destroy_window(&self, id: WindowId) -> Result<()> {
        self.state.windows.borrow_mut().remove(&id);
        if self.state.focused.get() == Some(id) {
            self.state.focused.set(None);
        }
        Ok(())
    }
    fn set_window_title(&self, id: WindowId, title: &str) -> Result<()> {
        self.state.with_window(id, |w| w.title = title.to_owned())
    }
    fn set_window_icon(&self, id: WindowId, images: &[RgbaImage]) -> Result<()> {
        self.state.with_window(id, |w| w.icon_count = images.len())
    }
    fn window_pos(&self, id: WindowId) -> Result<Vec2<i32>> {
        self.state.with_window(id, |w| w.pos)
    }
    fn set_window_pos(&self, id: WindowId, pos: Vec2<i32>) -> Result<()> {
        self.state.with_window(id, |w| self.state.move_window(id, w, pos))
    }
    fn window_size(&self, id: WindowId) -> Result<Extent2<i32>> {
        self.state.with_window(id, |w| w.size)
    }
    fn set_window_size(&self, id: WindowId, size: Extent2<i32>) -> Result<()> {
        self.state.with_window(id, |w| {
            let size = w.apply_size_limits(size);
            self.state.resize_window(id, w, size)
        })
    }
    fn set_window_size_limits(&self, id: WindowId, min: Extent2<i32>, max: Extent2<i32>) -> Result<()> {
        self.state.with_window(id, |w| {
            w.min_size = min;
            w.max_size = max;
            let size = w.apply_size_limits(w.size);
            self.state.resize_window(id, w, size)
        })
    }
    fn set_window_aspect_ratio(&self, id: WindowId, numer: i32, denom: i32) -> Result<()> {
        self.state.with_window(id, |w| {
            w.aspect = (numer, denom);
            let size = w.apply_size_limits(w.size);
            self.state.resize_window(id, w, size)
        })
    }
    fn framebuffer_size(&self, id: WindowId) -> Result<Extent2<i32>> {
        self.state.with_window(id, |w| w.framebuffer_size())
    }
    fn window_frame_size(&self, id: WindowId) -> Result<FrameExtents> {
        self.state.with_window(id, |w| {
            if w.decorated && w.monitor.is_none() {
                FrameExtents { left: 1, top: 10, right: 1, bottom: 1 }
            } else {
                FrameExtents::default()
            }
        })
    }
    fn window_content_scale(&self, id: WindowId) -> Result<Vec2<f32>> {
        self.state.with_window(id, |w| w.scale)
    }
    fn iconify_window(&self, id: WindowId) -> Result<()> {
        let iconified = self.state.with_window(id, |w| {
            let was = w.iconified;
            w.iconified = true;
            !was
        })?;
        if iconified {
            self.state.push(Event::WindowIconifyChanged { window: id, iconified: true });
            if self.state.focused.get() == Some(id) {
                self.state.set_focus(None);
            }
        }
        Ok(())
    }
    fn restore_window(&self, id: WindowId) -> Result<()> {
        self.state.with_window(id, |w| {
            if w.iconified {
                w.iconified = false;
                self.state.push(Event::WindowIconifyChanged { window: id, iconified: false });
            } else if w.maximized {
                w.maximized = false;
                if let Some(r) = w.restore_rect.take() {
                    self.state.move_window(id, w, Vec2::new(r.x, r.y));
                    self.state.resize_window(id, w, Extent2::new(r.w, r.h));
                }
                self.state.push(Event::WindowMaximizeChanged { window: id, maximized: false });
            }
        })
    }
    fn maximize_window(&self, id: WindowId) -> Result<()> {
        let area = self.state.work_area();
        self.state.with_window(id, |w| {
            if w.maximized {
                return;
            }
            w.restore_rect = Some(Rect::new(w.pos.x, w.pos.y, w.size.w, w.size.h));
            w.maximized = true;
            self.state.move_window(id, w, Vec2::new(area.x, area.y));
            self.state.resize_window(id, w, Extent2::new(area.w, area.h));
            self.state.push(Event::WindowMaximizeChanged { window: id, maximized: true });
        })
    }
    fn show_window(&self, id: WindowId) -> Result<()> {
        self.state.with_window(id, |w| w.visible = true)
    }
    fn hide_window(&self, id: WindowId) -> Result<()> {
        self.state.with_window(id, |w| w.visible = false)?;
        if self.state.focused.get() == Some(id) {
            self.state.set_focus(None);
        }
        Ok(())
    }
    fn request_window_attention(&self, id: WindowId) -> Result<()> {
        trace!("Window {:?} requests attention", id);
        self.state.with_window(id, |_| ())
    }
    fn focus_window(&self, id: WindowId) -> Result<()> {
        let focusable = self.state.with_window(id, |w| w.visible && !w.iconified)?;
        if focusable {
            self.state.set_focus(Some(id));
        }
        Ok(())
    }
    fn set_window_monitor(&self, id: WindowId, monitor: Option<&MonitorKey>, rect: Rect<i32, i32>) -> Result<()> {
        self.state.with_window(id, |w| {
            w.monitor = monitor.cloned();
            self.state.move_window(id, w, Vec2::new(rect.x, rect.y));
            self.state.resize_window(id, w, Extent2::new(rect.w, rect.h));
        })
    }
    fn window_focused(&self, id: WindowId) -> Result<bool> {
        self.state.with_window(id, |_| ())?;
        Ok(self.state.focused.get() == Some(id))
    }
    fn window_iconified(&self, id: WindowId) -> Result<bool> {
        self.state.with_window(id, |w| w.iconified)
    }
    fn window_visible(&self, id: WindowId) -> Result<bool> {
        self.state.with_window(id, |w| w.visible)
    }
    fn window_maximized(&self, id: WindowId) -> Result<bool> {
        self.state.with_window(id, |w| w.maximized)
    }
    fn window_hovered(&self, id: WindowId) -> Result<bool> {
        let screen = self.state.cursor_screen_pos.get();
        self.state.with_window(id, |w| {
            let p = screen - Vec2::new(w.pos.x as f64, w.pos.y as f64);
            w.visible && p.x >= 0. && p.y >= 0. && p.x < w.size.w as f64 && p.y < w.size.h as f64
        })
    }
    fn framebuffer_transparent(&self, id: WindowId) -> Result<bool> {
        self.state.with_window(id, |w| w.transparent)
    }
    fn set_window_resizable(&self, id: WindowId, enabled: bool) -> Result<()> {
        self.state.with_window(id, |w| w.resizable = enabled)
    }
    fn set_window_decorated(&self, id: WindowId, enabled: bool) -> Result<()> {
        self.state.with_window(id, |w| w.decorated = enabled)
    }
    fn set_window_floating(&self, id: WindowId, enabled: bool) -> Result<()> {
        self.state.with_window(id, |w| w.floating = enabled)
    }
    fn set_window_mouse_passthrough(&self, id: WindowId, enabled: bool) -> Result<()> {
        self.state.with_window(id, |w| w.mouse_passthrough = enabled)
    }
    fn window_opacity(&self, id: WindowId) -> Result<f32> {
        self.state.with_window(id, |w| w.opacity)
    }
    fn set_window_opacity(&self, id: WindowId, opacity: f32) -> Result<()> {
        self.state.with_window(id, |w| w.opacity = opacity)
    }

    fn poll_events(&self, timeout: Timeout) -> Result<Vec<Event>> {
        if self.state.events.borrow().is_empty() && !timeout.is_none() {
            self.state.waker.wait(timeout);
        } else {
            self.state.waker.reset();
        }
        Ok(self.state.events.borrow_mut().drain(..).collect())
    }
    fn waker(&self) -> Arc<dyn Waker> {
        self.state.waker.clone()
    }
    fn cursor_pos(&self, id: WindowId) -> Result<Vec2<f64>> {
        let screen = self.state.cursor_screen_pos.get();
        self.state.with_window(id, |w| screen - Vec2::new(w.pos.x as f64, w.pos.y as f64))
    }
    fn set_cursor_pos(&self, id: WindowId, pos: Vec2<f64>) -> Result<()> {
        let origin = self.state.with_window(id, |w| Vec2::new(w.pos.x as f64, w.pos.y as f64))?;
        self.state.cursor_screen_pos.set(origin + pos);
        Ok(())
    }
    fn apply_cursor_mode(&self, id: WindowId, mode: CursorMode, raw_motion: bool) -> Result<()> {
        self.state.with_window(id, |w| {
            w.cursor_mode = mode;
            w.raw_motion = raw_motion;
        })
    }
    fn raw_mouse_motion_supported(&self) -> bool {
        self.state.raw_supported.get()
    }
    fn key_scancode(&self, key: Key) -> i32 {
        self.state.keys.scancode(key)
    }
    fn key_name(&self, scancode: i32) -> Option<String> {
        self.state.keys.key(scancode).us_char().map(|c| c.to_string())
    }
    fn create_cursor(&self, id: CursorId, _image: &RgbaImage, _hot: Vec2<i32>) -> Result<()> {
        self.state.cursors.borrow_mut().insert(id);
        Ok(())
    }
    fn create_standard_cursor(&self, id: CursorId, _shape: StandardCursor) -> Result<()> {
        self.state.cursors.borrow_mut().insert(id);
        Ok(())
    }
    fn destroy_cursor(&self, id: CursorId) -> Result<()> {
        self.state.cursors.borrow_mut().remove(&id);
        Ok(())
    }
    fn set_cursor(&self, window: WindowId, cursor: Option<CursorId>) -> Result<()> {
        self.state.with_window(window, |w| w.cursor = cursor)
    }
    fn set_clipboard_string(&self, s: &str) -> Result<()> {
        *self.state.clipboard.borrow_mut() = s.to_owned();
        Ok(())
    }
    fn clipboard_string(&self) -> Result<String> {
        Ok(self.state.clipboard.borrow().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(p: &NullPlatform, id: u64) -> WindowId {
        let id = WindowId(id);
        let cfg = WindowConfig { width: 640, height: 480, ..WindowConfig::default() };
        p.create_window(id, &cfg, &FramebufferConfig::default(), &ContextConfig::default(), None).unwrap();
        id
    }

    #[test]
    fn size_limits_and_aspect_clamp() {
        let p = NullPlatform::connect();
        let id = window(&p, 1);
        p.set_window_size_limits(id, Extent2::new(200, 200), Extent2::new(400, 400)).unwrap();
        assert_eq!(p.window_size(id).unwrap(), Extent2::new(400, 400));
        p.set_window_size(id, Extent2::new(100, 300)).unwrap();
        assert_eq!(p.window_size(id).unwrap(), Extent2::new(200, 300));
        p.set_window_aspect_ratio(id, 2, 1).unwrap();
        assert_eq!(p.window_size(id).unwrap(), Extent2::new(200, 200));
    }

    #[test]
    fn focus_changes_come_in_pairs() {
        let p = NullPlatform::connect();
        let (a, b) = (window(&p, 1), window(&p, 2));
        p.show_window(a).unwrap();
        p.show_window(b).unwrap();
        p.focus_window(a).unwrap();
        p.focus_window(b).unwrap();
        let events = p.poll_events(Timeout::none()).unwrap();
        assert_eq!(events, vec![
            Event::WindowFocusChanged { window: a, focused: true },
            Event::WindowFocusChanged { window: a, focused: false },
            Event::WindowFocusChanged { window: b, focused: true },
        ]);
    }

    #[test]
    fn hidden_windows_cannot_take_focus() {
        let p = NullPlatform::connect();
        let id = window(&p, 1);
        p.focus_window(id).unwrap();
        assert!(!p.window_focused(id).unwrap());
    }

    #[test]
    fn waker_interrupts_waiting() {
        let p = NullPlatform::connect();
        let waker = p.waker();
        let t = std::thread::spawn(move || waker.wake().unwrap());
        assert!(p.poll_events(Timeout::Infinite).unwrap().is_empty());
        t.join().unwrap();
    }

    #[test]
    fn mode_changes_must_be_supported() {
        let p = NullPlatform::connect();
        let key = p.poll_monitors().unwrap()[0].key.clone();
        let mut mode = p.current_video_mode(&key).unwrap();
        mode.refresh_rate = 144;
        p.set_video_mode(&key, &mode).unwrap();
        mode.refresh_rate = 75;
        assert!(p.set_video_mode(&key, &mode).is_err());
    }
}
