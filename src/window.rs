//! Windows: creation and destruction, geometry, state, attributes, per-window
//! input state and callbacks.
//!
//! A `Window` is a cheap handle. The library keeps every live window in its
//! list; destroying a window removes it from there, and every later operation
//! on a stale handle fails with `InvalidValue`.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use crate::cursor::Cursor;
use crate::error::{self, Error, Reported, Result};
use crate::gl::{self, Context, ContextAttribs};
use crate::hint::{ClientApi, ContextCreationApi, ContextReleaseBehavior, ContextRobustness, OpenGlProfile, WindowAttrib, DONT_CARE, FALSE, TRUE};
use crate::image::RgbaImage;
use crate::input::{self, Action, CursorMode, InputMode, Key, KeyState, Modifiers, MouseButton};
use crate::library::{Library, LibraryShared};
use crate::monitor::{Monitor, MonitorShared, VideoMode};
use crate::platform::{FrameExtents, WindowId};
use crate::{Extent2, Rect, Vec2};

macro_rules! callbacks {
    ($($(#[$doc:meta])* $field:ident: $Alias:ident = Fn(&Window $(, $arg:ty)*), $set:ident, $replace:ident;)+) => {
        $(
            $(#[$doc])*
            pub type $Alias = Rc<dyn Fn(&Window $(, $arg)*)>;
        )+

        #[derive(Default)]
        pub(crate) struct Callbacks {
            $(pub $field: RefCell<Option<$Alias>>,)+
        }

        impl Callbacks {
            fn clear(&self) {
                $(self.$field.borrow_mut().take();)+
            }
        }

        impl Window {
            $(
                $(#[$doc])*
                ///
                /// Returns the previous callback.
                pub fn $set<F>(&self, f: F) -> Result<Option<$Alias>>
                    where F: Fn(&Window $(, $arg)*) + 'static
                {
                    self.$replace(Some(Rc::new(f)))
                }
                /// Replaces (or removes, with `None`) the callback, returning the previous one.
                pub fn $replace(&self, cb: Option<$Alias>) -> Result<Option<$Alias>> {
                    self.lib().map(|_| self.shared.callbacks.$field.replace(cb)).reported()
                }
            )+
        }
    };
}

callbacks!{
    /// Called when the window moves, with the new position of its client area.
    pos: PosCallback = Fn(&Window, Vec2<i32>), set_pos_callback, replace_pos_callback;
    /// Called when the client area is resized, in screen coordinates.
    size: SizeCallback = Fn(&Window, Extent2<i32>), set_size_callback, replace_size_callback;
    /// Called when the user asks to close the window. The close flag is already set.
    close: CloseCallback = Fn(&Window), set_close_callback, replace_close_callback;
    /// Called when the client area needs to be redrawn.
    refresh: RefreshCallback = Fn(&Window), set_refresh_callback, replace_refresh_callback;
    /// Called when the window gains or loses input focus.
    focus: FocusCallback = Fn(&Window, bool), set_focus_callback, replace_focus_callback;
    /// Called when the window is iconified or restored.
    iconify: IconifyCallback = Fn(&Window, bool), set_iconify_callback, replace_iconify_callback;
    /// Called when the window is maximized or restored.
    maximize: MaximizeCallback = Fn(&Window, bool), set_maximize_callback, replace_maximize_callback;
    /// Called when the framebuffer is resized, in pixels.
    framebuffer_size: FramebufferSizeCallback = Fn(&Window, Extent2<i32>), set_framebuffer_size_callback, replace_framebuffer_size_callback;
    /// Called when the content scale changes.
    content_scale: ContentScaleCallback = Fn(&Window, Vec2<f32>), set_content_scale_callback, replace_content_scale_callback;
    /// Called on key press, repeat and release, with the platform scancode.
    key: KeyCallback = Fn(&Window, Key, i32, Action, Modifiers), set_key_callback, replace_key_callback;
    /// Called for each Unicode character typed, when no Control or Alt modifier is held.
    character: CharCallback = Fn(&Window, char), set_char_callback, replace_char_callback;
    /// Called for each Unicode character typed, with the modifiers held.
    char_mods: CharModsCallback = Fn(&Window, char, Modifiers), set_char_mods_callback, replace_char_mods_callback;
    /// Called on mouse button press and release.
    mouse_button: MouseButtonCallback = Fn(&Window, MouseButton, Action, Modifiers), set_mouse_button_callback, replace_mouse_button_callback;
    /// Called when the cursor moves, relative to the client area's top-left corner.
    cursor_pos: CursorPosCallback = Fn(&Window, Vec2<f64>), set_cursor_pos_callback, replace_cursor_pos_callback;
    /// Called when the cursor enters or leaves the client area.
    cursor_enter: CursorEnterCallback = Fn(&Window, bool), set_cursor_enter_callback, replace_cursor_enter_callback;
    /// Called with scroll offsets from wheels and touchpads.
    scroll: ScrollCallback = Fn(&Window, Vec2<f64>), set_scroll_callback, replace_scroll_callback;
    /// Called when paths are dropped onto the window.
    drop_files: DropCallback = Fn(&Window, &[String]), set_drop_callback, replace_drop_callback;
}

pub(crate) struct WindowShared {
    pub lib: Weak<LibraryShared>,
    pub id: WindowId,
    pub destroyed: Cell<bool>,
    /// Set while the window is fullscreen.
    pub monitor: RefCell<Weak<MonitorShared>>,
    /// The mode this window wants while fullscreen.
    pub video_mode: Cell<VideoMode>,
    pub resizable: Cell<bool>,
    pub decorated: Cell<bool>,
    pub auto_iconify: Cell<bool>,
    pub floating: Cell<bool>,
    pub focus_on_show: Cell<bool>,
    pub mouse_passthrough: Cell<bool>,
    pub double_buffer: bool,
    pub min_size: Cell<Extent2<i32>>,
    pub max_size: Cell<Extent2<i32>>,
    pub aspect: Cell<(i32, i32)>,
    pub should_close: Cell<bool>,
    pub sticky_keys: Cell<bool>,
    pub sticky_mouse_buttons: Cell<bool>,
    pub lock_key_mods: Cell<bool>,
    pub raw_mouse_motion: Cell<bool>,
    pub cursor_mode: Cell<CursorMode>,
    pub keys: RefCell<Vec<KeyState>>,
    pub mouse_buttons: RefCell<[KeyState; 8]>,
    pub virtual_cursor_pos: Cell<Vec2<f64>>,
    pub last_cursor_pos: Cell<Vec2<f64>>,
    /// Client area to return to when the fullscreen monitor goes away.
    pub windowed_rect: Cell<Option<Rect<i32, i32>>>,
    pub cursor: RefCell<Option<Cursor>>,
    pub context: RefCell<Option<Context>>,
    pub user_data: RefCell<Option<Rc<dyn Any>>>,
    pub callbacks: Callbacks,
}

/// A handle to a window and its optional OpenGL or OpenGL ES context. Cheap to clone.
#[derive(Clone)]
pub struct Window {
    pub(crate) shared: Rc<WindowShared>,
}

impl PartialEq for Window {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }
}
impl Eq for Window {}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.shared.id.0)
            .field("destroyed", &self.shared.destroyed.get())
            .finish()
    }
}

impl Library {
    /// Creates a window, and a context for it unless the client API hint is `ClientApi::NoApi`.
    ///
    /// Passing a monitor creates a fullscreen window on it. Passing `share` makes the new
    /// context share objects with that window's context.
    pub fn create_window(&self, width: i32, height: i32, title: &str, monitor: Option<&Monitor>, share: Option<&Window>) -> Result<Window> {
        self.entry().and_then(|lib| lib.create_window(width, height, title, monitor, share)).reported()
    }
}

impl LibraryShared {
    fn create_window(self: &Rc<Self>, width: i32, height: i32, title: &str, monitor: Option<&Monitor>, share: Option<&Window>) -> Result<Window> {
        if width <= 0 || height <= 0 {
            return error::invalid_value(format!("Invalid window size {}x{}", width, height));
        }
        if let Some(monitor) = monitor {
            if !monitor.shared.connected.get() {
                return error::invalid_value(format!("Monitor \"{}\" was disconnected", monitor.shared.name));
            }
        }
        if let Some(share) = share {
            share.lib()?;
        }

        let hints = self.hints.borrow().clone();
        let mut wndconfig = hints.window;
        let fbconfig = hints.framebuffer;
        let ctxconfig = hints.context;
        wndconfig.width = width;
        wndconfig.height = height;
        wndconfig.title = title.to_owned();

        gl::check_context_config(&ctxconfig, share)?;

        let id = WindowId(self.next_id());
        let window = Window {
            shared: Rc::new(WindowShared {
                lib: Rc::downgrade(self),
                id,
                destroyed: Cell::new(false),
                monitor: RefCell::new(monitor.map(Monitor::downgrade).unwrap_or_default()),
                video_mode: Cell::new(VideoMode {
                    width,
                    height,
                    red_bits: fbconfig.red_bits,
                    green_bits: fbconfig.green_bits,
                    blue_bits: fbconfig.blue_bits,
                    refresh_rate: hints.refresh_rate,
                }),
                resizable: Cell::new(wndconfig.resizable),
                decorated: Cell::new(wndconfig.decorated),
                auto_iconify: Cell::new(wndconfig.auto_iconify),
                floating: Cell::new(wndconfig.floating),
                focus_on_show: Cell::new(wndconfig.focus_on_show),
                mouse_passthrough: Cell::new(wndconfig.mouse_passthrough),
                double_buffer: fbconfig.double_buffer,
                min_size: Cell::new(Extent2::new(DONT_CARE, DONT_CARE)),
                max_size: Cell::new(Extent2::new(DONT_CARE, DONT_CARE)),
                aspect: Cell::new((DONT_CARE, DONT_CARE)),
                should_close: Cell::new(false),
                sticky_keys: Cell::new(false),
                sticky_mouse_buttons: Cell::new(false),
                lock_key_mods: Cell::new(false),
                raw_mouse_motion: Cell::new(false),
                cursor_mode: Cell::new(CursorMode::Normal),
                keys: RefCell::new(vec![KeyState::Released; Key::LAST.raw() as usize + 1]),
                mouse_buttons: RefCell::new([KeyState::Released; 8]),
                virtual_cursor_pos: Cell::new(Vec2::zero()),
                last_cursor_pos: Cell::new(Vec2::zero()),
                // A window born fullscreen leaves it at its requested size, placed by `revert_to_windowed`.
                windowed_rect: Cell::new(monitor.map(|_| Rect::new(DONT_CARE, DONT_CARE, width, height))),
                cursor: RefCell::new(None),
                context: RefCell::new(None),
                user_data: RefCell::new(None),
                callbacks: Callbacks::default(),
            }),
        };
        self.windows.borrow_mut().push(window.clone());
        debug!("Creating window {:?} ({}x{}, \"{}\")", id, width, height, title);

        let result = (|| -> Result<()> {
            let platform = self.platform()?;
            platform.create_window(id, &wndconfig, &fbconfig, &ctxconfig, monitor.map(|m| &m.shared.key))?;

            if ctxconfig.client != ClientApi::NoApi.raw() {
                let native = {
                    let share_ctx = share.map(|s| s.shared.context.borrow());
                    let share_native = share_ctx.as_ref().and_then(|c| c.as_ref()).map(|c| c.native.as_ref());
                    platform.create_context(id, &fbconfig, &ctxconfig, share_native)?
                };
                *window.shared.context.borrow_mut() = Some(Context {
                    attribs: requested_attribs(&RequestedContext::from(ctxconfig.clone())),
                    native,
                });
                self.refresh_context_attribs(&window, &ctxconfig)?;
            }

            if wndconfig.mouse_passthrough {
                platform.set_window_mouse_passthrough(id, true)?;
            }

            if monitor.is_some() {
                platform.show_window(id)?;
                platform.focus_window(id)?;
                self.acquire_monitor(&window)?;
                window.fit_to_monitor(self)?;
                if wndconfig.center_cursor {
                    window.center_cursor(self)?;
                }
            } else if wndconfig.visible {
                platform.show_window(id)?;
                if wndconfig.focused {
                    platform.focus_window(id)?;
                }
            }
            Ok(())
        })();

        if let Err(e) = result {
            if let Err(teardown) = self.destroy_window(&window) {
                warn!("While tearing down half-created window {:?}: {}", id, teardown);
            }
            return Err(e);
        }
        Ok(window)
    }

    pub(crate) fn destroy_window(&self, window: &Window) -> Result<()> {
        if window.shared.destroyed.get() {
            return Ok(());
        }
        debug!("Destroying window {:?}", window.shared.id);
        window.shared.callbacks.clear();

        if self.current_context().as_ref() == Some(window) {
            if let Err(e) = self.make_context_current(None) {
                error::report_transient(e);
            }
        }
        if self.disabled_cursor_window().as_ref() == Some(window) {
            *self.disabled_cursor_window.borrow_mut() = Weak::new();
        }
        if let Err(e) = self.release_monitor(window) {
            error::report_transient(e);
        }
        *window.shared.monitor.borrow_mut() = Weak::new();
        window.shared.cursor.borrow_mut().take();
        window.shared.context.borrow_mut().take();

        let result = self.platform().and_then(|p| p.destroy_window(window.shared.id));
        self.windows.borrow_mut().retain(|w| w != window);
        window.shared.destroyed.set(true);
        result
    }
}

/// The attributes a context is created with, before querying what the driver actually gave.
fn requested_attribs(req: &RequestedContext) -> ContextAttribs {
    ContextAttribs {
        client: req.client,
        source: req.source,
        major: req.major,
        minor: req.minor,
        revision: 0,
        forward: req.forward,
        debug: req.debug,
        no_error: req.no_error,
        profile: req.profile,
        robustness: req.robustness,
        release: req.release,
    }
}

/// Context hints after validation, with every enum resolved.
struct RequestedContext {
    client: ClientApi,
    source: ContextCreationApi,
    major: i32,
    minor: i32,
    forward: bool,
    debug: bool,
    no_error: bool,
    profile: OpenGlProfile,
    robustness: ContextRobustness,
    release: ContextReleaseBehavior,
}

impl From<crate::hint::ContextConfig> for RequestedContext {
    fn from(c: crate::hint::ContextConfig) -> Self {
        Self {
            client: ClientApi::from_raw(c.client).unwrap_or(ClientApi::NoApi),
            source: ContextCreationApi::from_raw(c.source).unwrap_or(ContextCreationApi::Native),
            major: c.major,
            minor: c.minor,
            forward: c.forward,
            debug: c.debug,
            no_error: c.no_error,
            profile: OpenGlProfile::from_raw(c.profile).unwrap_or(OpenGlProfile::Any),
            robustness: ContextRobustness::from_raw(c.robustness).unwrap_or(ContextRobustness::NoRobustness),
            release: ContextReleaseBehavior::from_raw(c.release).unwrap_or(ContextReleaseBehavior::Any),
        }
    }
}

fn bool_attrib(b: bool) -> i32 {
    if b { TRUE } else { FALSE }
}

impl Window {
    pub(crate) fn lib(&self) -> Result<Rc<LibraryShared>> {
        let lib = LibraryShared::upgrade(&self.shared.lib)?;
        if self.shared.destroyed.get() {
            return error::invalid_value("The window was destroyed");
        }
        Ok(lib)
    }

    fn id(&self) -> WindowId {
        self.shared.id
    }

    /// The monitor this window is fullscreen on, if any.
    pub fn monitor(&self) -> Result<Option<Monitor>> {
        self.lib().map(|_| self.current_monitor()).reported()
    }

    pub(crate) fn current_monitor(&self) -> Option<Monitor> {
        self.shared.monitor.borrow().upgrade().map(|shared| Monitor { shared })
    }

    fn owns_monitor(&self, monitor: &Monitor) -> bool {
        monitor.shared.owner.borrow().upgrade().map_or(false, |w| Rc::ptr_eq(&w, &self.shared))
    }

    /// Has this window been destroyed, explicitly or by termination?
    pub fn is_destroyed(&self) -> bool {
        self.shared.destroyed.get() || LibraryShared::upgrade(&self.shared.lib).is_err()
    }

    /// Destroys the window and its context. Destroying twice is fine.
    pub fn destroy(&self) -> Result<()> {
        if self.shared.destroyed.get() {
            return Ok(());
        }
        LibraryShared::upgrade(&self.shared.lib).and_then(|lib| lib.destroy_window(self)).reported()
    }

    pub(crate) fn fit_to_monitor(&self, lib: &LibraryShared) -> Result<()> {
        let monitor = match self.current_monitor() {
            Some(m) => m,
            None => return Ok(()),
        };
        let platform = lib.platform()?;
        let pos = platform.monitor_pos(&monitor.shared.key)?;
        let mode = platform.current_video_mode(&monitor.shared.key)?;
        platform.set_window_monitor(self.id(), Some(&monitor.shared.key), Rect::new(pos.x, pos.y, mode.width, mode.height))
    }

    pub(crate) fn center_cursor(&self, lib: &LibraryShared) -> Result<()> {
        let size = lib.platform()?.window_size(self.id())?;
        let center = Vec2::new(size.w as f64 / 2., size.h as f64 / 2.);
        lib.platform()?.set_cursor_pos(self.id(), center)?;
        self.shared.last_cursor_pos.set(center);
        Ok(())
    }

    /// Leaves fullscreen for the saved windowed geometry.
    ///
    /// Without a saved position (the window was created fullscreen) the window is
    /// placed so its decorations touch the top-left corner of the virtual desktop.
    pub(crate) fn revert_to_windowed(&self) -> Result<()> {
        let lib = self.lib()?;
        if self.current_monitor().is_none() {
            return Ok(());
        }
        let platform = lib.platform()?;
        let rect = match self.shared.windowed_rect.take() {
            Some(rect) => rect,
            None => {
                let size = platform.window_size(self.id())?;
                Rect::new(DONT_CARE, DONT_CARE, size.w, size.h)
            },
        };
        // The monitor may be gone already, along with its video modes.
        if let Err(e) = lib.release_monitor(self) {
            error::report_transient(e);
        }
        *self.shared.monitor.borrow_mut() = Weak::new();
        if rect.x != DONT_CARE {
            return platform.set_window_monitor(self.id(), None, rect);
        }
        platform.set_window_monitor(self.id(), None, Rect::new(0, 0, rect.w, rect.h))?;
        let frame = platform.window_frame_size(self.id())?;
        platform.set_window_pos(self.id(), Vec2::new(frame.left, frame.top))
    }

    /// Makes the window fullscreen on `monitor`, or windowed with the given client area.
    ///
    /// When going fullscreen, `pos` is ignored and `size` and `refresh_rate` describe the
    /// desired video mode. `refresh_rate` may be `DONT_CARE`.
    pub fn set_monitor(&self, monitor: Option<&Monitor>, pos: Vec2<i32>, size: Extent2<i32>, refresh_rate: i32) -> Result<()> {
        self.lib().and_then(|lib| {
            if size.w <= 0 || size.h <= 0 {
                return error::invalid_value(format!("Invalid window size {}x{}", size.w, size.h));
            }
            if refresh_rate < 0 && refresh_rate != DONT_CARE {
                return error::invalid_value(format!("Invalid refresh rate {}", refresh_rate));
            }
            if let Some(m) = monitor {
                if !m.shared.connected.get() {
                    return error::invalid_value(format!("Monitor \"{}\" was disconnected", m.shared.name));
                }
            }
            let mut mode = self.shared.video_mode.get();
            mode.width = size.w;
            mode.height = size.h;
            mode.refresh_rate = refresh_rate;
            self.shared.video_mode.set(mode);

            let platform = lib.platform()?;
            let old = self.current_monitor();
            if old.is_some() && old.as_ref() == monitor {
                if monitor.map_or(false, |m| self.owns_monitor(m)) {
                    lib.acquire_monitor(self)?;
                    self.fit_to_monitor(&lib)?;
                }
                return Ok(());
            }

            if old.is_none() && monitor.is_some() {
                let pos = platform.window_pos(self.id())?;
                let size = platform.window_size(self.id())?;
                self.shared.windowed_rect.set(Some(Rect::new(pos.x, pos.y, size.w, size.h)));
            }
            if old.is_some() {
                lib.release_monitor(self)?;
            }
            *self.shared.monitor.borrow_mut() = monitor.map(Monitor::downgrade).unwrap_or_default();

            match monitor {
                Some(_) => {
                    lib.acquire_monitor(self)?;
                    self.fit_to_monitor(&lib)
                },
                None => {
                    self.shared.windowed_rect.set(None);
                    platform.set_window_monitor(self.id(), None, Rect::new(pos.x, pos.y, size.w, size.h))?;
                    let (min, max) = (self.shared.min_size.get(), self.shared.max_size.get());
                    platform.set_window_size_limits(self.id(), min, max)
                },
            }
        }).reported()
    }

    /// Sets the title, encoded as UTF-8.
    pub fn set_title(&self, title: &str) -> Result<()> {
        self.lib().and_then(|lib| lib.platform()?.set_window_title(self.id(), title)).reported()
    }

    /// Sets the icon candidates; the backend picks the sizes it needs. An empty slice reverts to the default icon.
    pub fn set_icon(&self, images: &[RgbaImage]) -> Result<()> {
        self.lib().and_then(|lib| {
            for image in images {
                image.validate()?;
            }
            lib.platform()?.set_window_icon(self.id(), images)
        }).reported()
    }

    /// Position of the client area's top-left corner, in screen coordinates.
    pub fn pos(&self) -> Result<Vec2<i32>> {
        self.lib().and_then(|lib| lib.platform()?.window_pos(self.id())).reported()
    }

    /// Moves the client area. Does nothing for fullscreen windows.
    pub fn set_pos(&self, pos: Vec2<i32>) -> Result<()> {
        self.lib().and_then(|lib| {
            if self.current_monitor().is_some() {
                return Ok(());
            }
            lib.platform()?.set_window_pos(self.id(), pos)
        }).reported()
    }

    /// Size of the client area, in screen coordinates.
    pub fn size(&self) -> Result<Extent2<i32>> {
        self.lib().and_then(|lib| lib.platform()?.window_size(self.id())).reported()
    }

    /// Resizes the client area, or changes the desired video mode of a fullscreen window.
    pub fn set_size(&self, size: Extent2<i32>) -> Result<()> {
        self.lib().and_then(|lib| {
            if size.w <= 0 || size.h <= 0 {
                return error::invalid_value(format!("Invalid window size {}x{}", size.w, size.h));
            }
            let mut mode = self.shared.video_mode.get();
            mode.width = size.w;
            mode.height = size.h;
            self.shared.video_mode.set(mode);

            match self.current_monitor() {
                Some(monitor) => {
                    if self.owns_monitor(&monitor) {
                        lib.acquire_monitor(self)?;
                        self.fit_to_monitor(&lib)?;
                    }
                    Ok(())
                },
                None => lib.platform()?.set_window_size(self.id(), size),
            }
        }).reported()
    }

    /// Constrains the client area size. Each component may be `DONT_CARE`.
    ///
    /// Only applied while the window is windowed and resizable, but always remembered.
    pub fn set_size_limits(&self, min: Extent2<i32>, max: Extent2<i32>) -> Result<()> {
        self.lib().and_then(|lib| {
            if min.w != DONT_CARE && min.h != DONT_CARE && (min.w < 0 || min.h < 0) {
                return error::invalid_value(format!("Invalid window minimum size {}x{}", min.w, min.h));
            }
            if max.w != DONT_CARE && max.h != DONT_CARE
                && (max.w < 0 || max.h < 0 || max.w < min.w || max.h < min.h)
            {
                return error::invalid_value(format!("Invalid window maximum size {}x{}", max.w, max.h));
            }
            self.shared.min_size.set(min);
            self.shared.max_size.set(max);
            if self.current_monitor().is_some() || !self.shared.resizable.get() {
                return Ok(());
            }
            lib.platform()?.set_window_size_limits(self.id(), min, max)
        }).reported()
    }

    /// Constrains the client area to an aspect ratio. Pass `DONT_CARE` twice to remove it.
    pub fn set_aspect_ratio(&self, numer: i32, denom: i32) -> Result<()> {
        self.lib().and_then(|lib| {
            if numer != DONT_CARE && denom != DONT_CARE && (numer <= 0 || denom <= 0) {
                return error::invalid_value(format!("Invalid window aspect ratio {}:{}", numer, denom));
            }
            self.shared.aspect.set((numer, denom));
            if self.current_monitor().is_some() || !self.shared.resizable.get() {
                return Ok(());
            }
            lib.platform()?.set_window_aspect_ratio(self.id(), numer, denom)
        }).reported()
    }

    /// Size of the framebuffer, in pixels.
    pub fn framebuffer_size(&self) -> Result<Extent2<i32>> {
        self.lib().and_then(|lib| lib.platform()?.framebuffer_size(self.id())).reported()
    }

    /// Size of each edge of the window frame. All zero for undecorated and fullscreen windows.
    pub fn frame_size(&self) -> Result<FrameExtents> {
        self.lib().and_then(|lib| lib.platform()?.window_frame_size(self.id())).reported()
    }

    /// Ratio between the current DPI and the platform's default DPI.
    pub fn content_scale(&self) -> Result<Vec2<f32>> {
        self.lib().and_then(|lib| lib.platform()?.window_content_scale(self.id())).reported()
    }

    /// Opacity of the whole window, from 0 to 1.
    pub fn opacity(&self) -> Result<f32> {
        self.lib().and_then(|lib| lib.platform()?.window_opacity(self.id())).reported()
    }

    /// Sets the opacity of the whole window, from 0 to 1.
    pub fn set_opacity(&self, opacity: f32) -> Result<()> {
        self.lib().and_then(|lib| {
            if opacity.is_nan() || opacity < 0. || opacity > 1. {
                return error::invalid_value(format!("Invalid window opacity {}", opacity));
            }
            lib.platform()?.set_window_opacity(self.id(), opacity)
        }).reported()
    }

    #[allow(missing_docs)]
    pub fn iconify(&self) -> Result<()> {
        self.lib().and_then(|lib| lib.platform()?.iconify_window(self.id())).reported()
    }

    /// Restores the window from iconification or maximization.
    pub fn restore(&self) -> Result<()> {
        self.lib().and_then(|lib| lib.platform()?.restore_window(self.id())).reported()
    }

    /// Maximizes the window. Does nothing for fullscreen windows.
    pub fn maximize(&self) -> Result<()> {
        self.lib().and_then(|lib| {
            if self.current_monitor().is_some() {
                return Ok(());
            }
            lib.platform()?.maximize_window(self.id())
        }).reported()
    }

    /// Shows the window, focusing it if its focus-on-show attribute is set. Does nothing for fullscreen windows.
    pub fn show(&self) -> Result<()> {
        self.lib().and_then(|lib| {
            if self.current_monitor().is_some() {
                return Ok(());
            }
            let platform = lib.platform()?;
            platform.show_window(self.id())?;
            if self.shared.focus_on_show.get() {
                platform.focus_window(self.id())?;
            }
            Ok(())
        }).reported()
    }

    /// Hides the window. Does nothing for fullscreen windows.
    pub fn hide(&self) -> Result<()> {
        self.lib().and_then(|lib| {
            if self.current_monitor().is_some() {
                return Ok(());
            }
            lib.platform()?.hide_window(self.id())
        }).reported()
    }

    /// Brings the window to front and gives it input focus.
    pub fn focus(&self) -> Result<()> {
        self.lib().and_then(|lib| lib.platform()?.focus_window(self.id())).reported()
    }

    /// Asks the user's attention without taking focus (e.g by flashing the task bar entry).
    pub fn request_attention(&self) -> Result<()> {
        self.lib().and_then(|lib| lib.platform()?.request_window_attention(self.id())).reported()
    }

    /// Gets a window or context attribute, as an integer.
    pub fn attrib(&self, attrib: WindowAttrib) -> Result<i32> {
        self.lib().and_then(|lib| {
            let p = lib.platform()?;
            let id = self.id();
            let ctx = self.shared.context.borrow();
            let ctx = ctx.as_ref().map(|c| c.attribs);
            Ok(match attrib {
                WindowAttrib::Focused => bool_attrib(p.window_focused(id)?),
                WindowAttrib::Iconified => bool_attrib(p.window_iconified(id)?),
                WindowAttrib::Visible => bool_attrib(p.window_visible(id)?),
                WindowAttrib::Maximized => bool_attrib(p.window_maximized(id)?),
                WindowAttrib::Hovered => bool_attrib(p.window_hovered(id)?),
                WindowAttrib::TransparentFramebuffer => bool_attrib(p.framebuffer_transparent(id)?),
                WindowAttrib::Resizable => bool_attrib(self.shared.resizable.get()),
                WindowAttrib::Decorated => bool_attrib(self.shared.decorated.get()),
                WindowAttrib::Floating => bool_attrib(self.shared.floating.get()),
                WindowAttrib::AutoIconify => bool_attrib(self.shared.auto_iconify.get()),
                WindowAttrib::FocusOnShow => bool_attrib(self.shared.focus_on_show.get()),
                WindowAttrib::MousePassthrough => bool_attrib(self.shared.mouse_passthrough.get()),
                WindowAttrib::DoubleBuffer => bool_attrib(self.shared.double_buffer),
                WindowAttrib::ClientApi => ctx.map_or(ClientApi::NoApi.raw(), |c| c.client.raw()),
                WindowAttrib::ContextCreationApi => ctx.map_or(ContextCreationApi::Native.raw(), |c| c.source.raw()),
                WindowAttrib::ContextVersionMajor => ctx.map_or(0, |c| c.major),
                WindowAttrib::ContextVersionMinor => ctx.map_or(0, |c| c.minor),
                WindowAttrib::ContextRevision => ctx.map_or(0, |c| c.revision),
                WindowAttrib::ContextRobustness => ctx.map_or(ContextRobustness::NoRobustness.raw(), |c| c.robustness.raw()),
                WindowAttrib::OpenGlForwardCompat => bool_attrib(ctx.map_or(false, |c| c.forward)),
                WindowAttrib::ContextDebug => bool_attrib(ctx.map_or(false, |c| c.debug)),
                WindowAttrib::OpenGlProfile => ctx.map_or(OpenGlProfile::Any.raw(), |c| c.profile.raw()),
                WindowAttrib::ContextReleaseBehavior => ctx.map_or(ContextReleaseBehavior::Any.raw(), |c| c.release.raw()),
                WindowAttrib::ContextNoError => bool_attrib(ctx.map_or(false, |c| c.no_error)),
            })
        }).reported()
    }

    /// Sets one of the attributes that can change after creation.
    ///
    /// Those are `AutoIconify`, `Resizable`, `Decorated`, `Floating`, `FocusOnShow` and
    /// `MousePassthrough`; any other fails with `InvalidEnum`.
    pub fn set_attrib(&self, attrib: WindowAttrib, value: bool) -> Result<()> {
        self.lib().and_then(|lib| {
            let p = lib.platform()?;
            let id = self.id();
            let windowed = self.current_monitor().is_none();
            match attrib {
                WindowAttrib::AutoIconify => self.shared.auto_iconify.set(value),
                WindowAttrib::FocusOnShow => self.shared.focus_on_show.set(value),
                WindowAttrib::Resizable => {
                    self.shared.resizable.set(value);
                    if windowed {
                        p.set_window_resizable(id, value)?;
                    }
                },
                WindowAttrib::Decorated => {
                    self.shared.decorated.set(value);
                    if windowed {
                        p.set_window_decorated(id, value)?;
                    }
                },
                WindowAttrib::Floating => {
                    self.shared.floating.set(value);
                    if windowed {
                        p.set_window_floating(id, value)?;
                    }
                },
                WindowAttrib::MousePassthrough => {
                    self.shared.mouse_passthrough.set(value);
                    p.set_window_mouse_passthrough(id, value)?;
                },
                _ => return error::invalid_enum(format!("Invalid window attribute {:?}", attrib)),
            }
            Ok(())
        }).reported()
    }

    /// The close flag. Set when the user asks to close the window.
    pub fn should_close(&self) -> Result<bool> {
        self.lib().map(|_| self.shared.should_close.get()).reported()
    }

    #[allow(missing_docs)]
    pub fn set_should_close(&self, value: bool) -> Result<()> {
        self.lib().map(|_| self.shared.should_close.set(value)).reported()
    }

    /// Attaches arbitrary data to the window, returning the previous data.
    pub fn set_user_data(&self, data: Option<Rc<dyn Any>>) -> Result<Option<Rc<dyn Any>>> {
        self.lib().map(|_| self.shared.user_data.replace(data)).reported()
    }

    /// The data attached with `set_user_data()`.
    pub fn user_data(&self) -> Result<Option<Rc<dyn Any>>> {
        self.lib().map(|_| self.shared.user_data.borrow().clone()).reported()
    }

    // Input

    /// Gets an input mode, as an integer.
    pub fn input_mode(&self, mode: InputMode) -> Result<i32> {
        self.lib().map(|_| match mode {
            InputMode::Cursor => self.shared.cursor_mode.get() as i32,
            InputMode::StickyKeys => bool_attrib(self.shared.sticky_keys.get()),
            InputMode::StickyMouseButtons => bool_attrib(self.shared.sticky_mouse_buttons.get()),
            InputMode::LockKeyMods => bool_attrib(self.shared.lock_key_mods.get()),
            InputMode::RawMouseMotion => bool_attrib(self.shared.raw_mouse_motion.get()),
        }).reported()
    }

    /// Sets an input mode from an integer, as the typed setters do.
    pub fn set_input_mode(&self, mode: InputMode, value: i32) -> Result<()> {
        match mode {
            InputMode::Cursor => match CursorMode::from_raw(value) {
                Some(m) => self.set_cursor_mode(m),
                None => error::invalid_enum(format!("Invalid cursor mode 0x{:08X}", value)).reported(),
            },
            InputMode::StickyKeys => self.set_sticky_keys(value != FALSE),
            InputMode::StickyMouseButtons => self.set_sticky_mouse_buttons(value != FALSE),
            InputMode::LockKeyMods => self.set_lock_key_mods(value != FALSE),
            InputMode::RawMouseMotion => self.set_raw_mouse_motion(value != FALSE),
        }
    }

    #[allow(missing_docs)]
    pub fn cursor_mode(&self) -> Result<CursorMode> {
        self.lib().map(|_| self.shared.cursor_mode.get()).reported()
    }

    /// Sets how the cursor behaves over this window.
    ///
    /// `Disabled` hides and captures the cursor, and reports an unbounded virtual
    /// position, which suits camera controls.
    pub fn set_cursor_mode(&self, mode: CursorMode) -> Result<()> {
        self.lib().and_then(|lib| {
            if self.shared.cursor_mode.get() == mode {
                return Ok(());
            }
            let p = lib.platform()?;
            self.shared.cursor_mode.set(mode);
            self.shared.virtual_cursor_pos.set(p.cursor_pos(self.id())?);

            if p.window_focused(self.id())? {
                if mode == CursorMode::Disabled {
                    lib.disable_cursor(self)
                } else if lib.disabled_cursor_window().as_ref() == Some(self) {
                    lib.enable_cursor(self)
                } else {
                    p.apply_cursor_mode(self.id(), mode, false)
                }
            } else if mode != CursorMode::Disabled {
                p.apply_cursor_mode(self.id(), mode, false)
            } else {
                Ok(())
            }
        }).reported()
    }

    /// When enabled, a key released since the last query still reads as pressed once.
    pub fn set_sticky_keys(&self, enabled: bool) -> Result<()> {
        self.lib().map(|_| {
            if !enabled {
                for state in self.shared.keys.borrow_mut().iter_mut().filter(|s| **s == KeyState::Stick) {
                    *state = KeyState::Released;
                }
            }
            self.shared.sticky_keys.set(enabled);
        }).reported()
    }

    /// Like `set_sticky_keys()`, for mouse buttons.
    pub fn set_sticky_mouse_buttons(&self, enabled: bool) -> Result<()> {
        self.lib().map(|_| {
            if !enabled {
                for state in self.shared.mouse_buttons.borrow_mut().iter_mut().filter(|s| **s == KeyState::Stick) {
                    *state = KeyState::Released;
                }
            }
            self.shared.sticky_mouse_buttons.set(enabled);
        }).reported()
    }

    /// When enabled, modifier bits include `CAPS_LOCK` and `NUM_LOCK`.
    pub fn set_lock_key_mods(&self, enabled: bool) -> Result<()> {
        self.lib().map(|_| self.shared.lock_key_mods.set(enabled)).reported()
    }

    /// Requests unaccelerated, unscaled motion while the cursor is disabled.
    ///
    /// Fails with `PlatformError` when the system cannot provide it.
    pub fn set_raw_mouse_motion(&self, enabled: bool) -> Result<()> {
        self.lib().and_then(|lib| {
            let p = lib.platform()?;
            if !p.raw_mouse_motion_supported() {
                return error::failed("Raw mouse motion is not supported on this system");
            }
            if self.shared.raw_mouse_motion.get() == enabled {
                return Ok(());
            }
            self.shared.raw_mouse_motion.set(enabled);
            if lib.disabled_cursor_window().as_ref() == Some(self) {
                p.apply_cursor_mode(self.id(), CursorMode::Disabled, enabled)?;
            }
            Ok(())
        }).reported()
    }

    /// Last reported state of a key: `Press` or `Release`.
    pub fn key(&self, key: Key) -> Result<Action> {
        self.lib().and_then(|_| {
            let i = input::check_key(key)?;
            let mut keys = self.shared.keys.borrow_mut();
            Ok(match keys[i] {
                KeyState::Stick => {
                    keys[i] = KeyState::Released;
                    Action::Press
                },
                KeyState::Pressed => Action::Press,
                KeyState::Released => Action::Release,
            })
        }).reported()
    }

    /// Last reported state of a mouse button: `Press` or `Release`.
    pub fn mouse_button(&self, button: MouseButton) -> Result<Action> {
        self.lib().map(|_| {
            let mut buttons = self.shared.mouse_buttons.borrow_mut();
            let i = button.index();
            match buttons[i] {
                KeyState::Stick => {
                    buttons[i] = KeyState::Released;
                    Action::Press
                },
                KeyState::Pressed => Action::Press,
                KeyState::Released => Action::Release,
            }
        }).reported()
    }

    /// Cursor position relative to the client area's top-left corner.
    ///
    /// While the cursor is disabled, this is the unbounded virtual position.
    pub fn cursor_pos(&self) -> Result<Vec2<f64>> {
        self.lib().and_then(|lib| {
            if self.shared.cursor_mode.get() == CursorMode::Disabled {
                return Ok(self.shared.virtual_cursor_pos.get());
            }
            lib.platform()?.cursor_pos(self.id())
        }).reported()
    }

    /// Moves the cursor. Does nothing unless the window has input focus.
    pub fn set_cursor_pos(&self, pos: Vec2<f64>) -> Result<()> {
        self.lib().and_then(|lib| {
            if !pos.x.is_finite() || !pos.y.is_finite() {
                return error::invalid_value(format!("Invalid cursor position {:?}", pos));
            }
            let p = lib.platform()?;
            if !p.window_focused(self.id())? {
                return Ok(());
            }
            if self.shared.cursor_mode.get() == CursorMode::Disabled {
                self.shared.virtual_cursor_pos.set(pos);
                return Ok(());
            }
            p.set_cursor_pos(self.id(), pos)?;
            self.shared.last_cursor_pos.set(pos);
            Ok(())
        }).reported()
    }

    /// Sets the cursor image shown over the client area. `None` reverts to the default arrow.
    pub fn set_cursor(&self, cursor: Option<&Cursor>) -> Result<()> {
        self.lib().and_then(|lib| {
            if let Some(cursor) = cursor {
                if cursor.shared.destroyed.get() {
                    return error::invalid_value("The cursor was destroyed");
                }
            }
            *self.shared.cursor.borrow_mut() = cursor.cloned();
            lib.platform()?.set_cursor(self.id(), cursor.map(|c| c.shared.id))
        }).reported()
    }

    /// Swaps the front and back buffers of this window's context.
    pub fn swap_buffers(&self) -> Result<()> {
        self.lib().and_then(|_| {
            let ctx = self.shared.context.borrow();
            ctx.as_ref().ok_or_else(Error::no_window_context)?.native.swap_buffers()
        }).reported()
    }

    pub(crate) fn modifiers_masked(&self, mods: Modifiers) -> Modifiers {
        if self.shared.lock_key_mods.get() {
            mods
        } else {
            mods.difference(Modifiers::CAPS_LOCK | Modifiers::NUM_LOCK)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hint::ContextConfig;

    #[test]
    fn requested_attribs_resolve_enums() {
        let cfg = ContextConfig {
            client: ClientApi::OpenGl.raw(),
            major: 3,
            minor: 3,
            profile: OpenGlProfile::Core.raw(),
            forward: true,
            ..ContextConfig::default()
        };
        let attribs = requested_attribs(&RequestedContext::from(cfg));
        assert_eq!(attribs.client, ClientApi::OpenGl);
        assert_eq!(attribs.profile, OpenGlProfile::Core);
        assert_eq!((attribs.major, attribs.minor, attribs.revision), (3, 3, 0));
        assert!(attribs.forward && !attribs.debug);
        assert_eq!(attribs.source, ContextCreationApi::Native);
    }

    #[test]
    fn bool_attribs() {
        assert_eq!(bool_attrib(true), TRUE);
        assert_eq!(bool_attrib(false), FALSE);
    }
}
