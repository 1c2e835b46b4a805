//! The event pump: backends translate native messages into `Event`s, which are
//! dispatched here to the per-window input state and callbacks.

use std::rc::{Rc, Weak};
use crate::error::{self, Reported, Result};
use crate::input::{is_text_codepoint, Action, CursorMode, Key, KeyState, Modifiers, MouseButton};
use crate::library::{Library, LibraryShared};
use crate::platform::WindowId;
use crate::timeout::Timeout;
use crate::window::Window;
use crate::{Extent2, Vec2};

/// What backends report, in native delivery order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event {
    WindowMoved           { window: WindowId, position: Vec2<i32>, },
    WindowResized         { window: WindowId, size: Extent2<i32>, },
    FramebufferResized    { window: WindowId, size: Extent2<i32>, },
    ContentScaleChanged   { window: WindowId, scale: Vec2<f32>, },
    WindowCloseRequested  { window: WindowId, },
    WindowNeedsRefresh    { window: WindowId, },
    WindowFocusChanged    { window: WindowId, focused: bool, },
    WindowIconifyChanged  { window: WindowId, iconified: bool, },
    WindowMaximizeChanged { window: WindowId, maximized: bool, },
    KeyboardKey           { window: WindowId, key: Key, scancode: i32, action: Action, mods: Modifiers, },
    /// `plain` is false when Control or Alt turned the key press into something other than text.
    TextInput             { window: WindowId, codepoint: u32, mods: Modifiers, plain: bool, },
    MouseButton           { window: WindowId, button: MouseButton, action: Action, mods: Modifiers, },
    MouseMotion           { window: WindowId, position: Vec2<f64>, },
    MouseMotionRaw        { window: WindowId, displacement: Vec2<f64>, },
    MouseEnter            { window: WindowId, entered: bool, },
    MouseScroll           { window: WindowId, scroll: Vec2<f64>, },
    FilesDropped          { window: WindowId, paths: Vec<String>, },
    MonitorsChanged,
    /// Wakes the pump without doing anything.
    Empty,
}

/// Invokes a window callback, if set. The callback is cloned out of its cell first, so
/// it may replace itself or call back into the library.
macro_rules! fire {
    ($window:expr, $field:ident $(, $arg:expr)*) => {{
        let cb = $window.shared.callbacks.$field.borrow().clone();
        if let Some(cb) = cb {
            let window: &Window = &$window;
            cb(window $(, $arg)*);
        }
    }};
}

impl Library {
    /// Processes pending events, then returns immediately.
    pub fn poll_events(&self) -> Result<()> {
        self.entry().and_then(|lib| lib.pump(Timeout::none())).reported()
    }

    /// Sleeps until at least one event arrives, then processes all of them.
    pub fn wait_events(&self) -> Result<()> {
        self.entry().and_then(|lib| lib.pump(Timeout::Infinite)).reported()
    }

    /// Like `wait_events()`, but gives up after `timeout` seconds. Zero means polling.
    pub fn wait_events_timeout(&self, timeout: f64) -> Result<()> {
        self.entry().and_then(|lib| {
            let timeout = Timeout::from_secs_f64(timeout)?;
            lib.pump(timeout)
        }).reported()
    }
}

impl LibraryShared {
    pub(crate) fn pump(self: &Rc<Self>, timeout: Timeout) -> Result<()> {
        let platform = self.platform()?;
        let events = platform.poll_events(timeout)?;
        for event in events {
            // A callback may have terminated the library.
            if !self.initialized.get() {
                return Ok(());
            }
            self.dispatch(event);
        }
        if !self.initialized.get() {
            return Ok(());
        }

        if let Some(window) = self.disabled_cursor_window() {
            let size = platform.window_size(window.shared.id)?;
            let center = Vec2::new(size.w as f64 / 2., size.h as f64 / 2.);
            if window.shared.last_cursor_pos.get() != center {
                trace!("Recentering disabled cursor of window {:?}", window.shared.id);
                platform.set_cursor_pos(window.shared.id, center)?;
                window.shared.last_cursor_pos.set(center);
            }
        }
        Ok(())
    }

    fn dispatch(self: &Rc<Self>, event: Event) {
        trace!("Dispatching {:?}", event);
        let id = match event {
            Event::MonitorsChanged => {
                if let Err(e) = self.poll_monitors() {
                    error::report_transient(e);
                }
                return;
            },
            Event::Empty => return,
            Event::WindowMoved { window, .. }
            | Event::WindowResized { window, .. }
            | Event::FramebufferResized { window, .. }
            | Event::ContentScaleChanged { window, .. }
            | Event::WindowCloseRequested { window, .. }
            | Event::WindowNeedsRefresh { window, .. }
            | Event::WindowFocusChanged { window, .. }
            | Event::WindowIconifyChanged { window, .. }
            | Event::WindowMaximizeChanged { window, .. }
            | Event::KeyboardKey { window, .. }
            | Event::TextInput { window, .. }
            | Event::MouseButton { window, .. }
            | Event::MouseMotion { window, .. }
            | Event::MouseMotionRaw { window, .. }
            | Event::MouseEnter { window, .. }
            | Event::MouseScroll { window, .. }
            | Event::FilesDropped { window, .. } => window,
        };
        // Events may outlive their window when a callback destroyed it.
        let window = match self.window_by_id(id) {
            Some(w) => w,
            None => return,
        };

        match event {
            Event::WindowMoved { position, .. } => fire!(window, pos, position),
            Event::WindowResized { size, .. } => fire!(window, size, size),
            Event::FramebufferResized { size, .. } => fire!(window, framebuffer_size, size),
            Event::ContentScaleChanged { scale, .. } => fire!(window, content_scale, scale),
            Event::WindowCloseRequested { .. } => {
                window.shared.should_close.set(true);
                fire!(window, close);
            },
            Event::WindowNeedsRefresh { .. } => fire!(window, refresh),
            Event::WindowFocusChanged { focused, .. } => self.input_window_focus(&window, focused),
            Event::WindowIconifyChanged { iconified, .. } => {
                if window.current_monitor().is_some() {
                    let result = if iconified {
                        self.release_monitor(&window)
                    } else {
                        self.acquire_monitor(&window).and_then(|_| window.fit_to_monitor(self))
                    };
                    if let Err(e) = result {
                        error::report_transient(e);
                    }
                }
                fire!(window, iconify, iconified);
            },
            Event::WindowMaximizeChanged { maximized, .. } => fire!(window, maximize, maximized),
            Event::KeyboardKey { key, scancode, action, mods, .. } => self.input_key(&window, key, scancode, action, mods),
            Event::TextInput { codepoint, mods, plain, .. } => self.input_char(&window, codepoint, mods, plain),
            Event::MouseButton { button, action, mods, .. } => self.input_mouse_button(&window, button, action, mods),
            Event::MouseMotion { position, .. } => {
                if self.disabled_cursor_window().as_ref() == Some(&window) {
                    if window.shared.raw_mouse_motion.get() {
                        // Raw events feed the virtual position instead.
                        return;
                    }
                    let delta = position - window.shared.last_cursor_pos.get();
                    self.input_cursor_pos(&window, window.shared.virtual_cursor_pos.get() + delta);
                } else {
                    self.input_cursor_pos(&window, position);
                }
                window.shared.last_cursor_pos.set(position);
            },
            Event::MouseMotionRaw { displacement, .. } => {
                if self.disabled_cursor_window().as_ref() == Some(&window) && window.shared.raw_mouse_motion.get() {
                    self.input_cursor_pos(&window, window.shared.virtual_cursor_pos.get() + displacement);
                }
            },
            Event::MouseEnter { entered, .. } => fire!(window, cursor_enter, entered),
            Event::MouseScroll { scroll, .. } => fire!(window, scroll, scroll),
            Event::FilesDropped { paths, .. } => fire!(window, drop_files, &paths[..]),
            Event::MonitorsChanged | Event::Empty => (),
        }
    }

    pub(crate) fn input_key(&self, window: &Window, key: Key, scancode: i32, action: Action, mods: Modifiers) {
        let mut action = action;
        if let Some(i) = key.index() {
            let mut keys = window.shared.keys.borrow_mut();
            if action == Action::Release && keys[i] == KeyState::Released {
                return;
            }
            if action == Action::Press && keys[i] == KeyState::Pressed {
                action = Action::Repeat;
            }
            keys[i] = KeyState::from_action(action, window.shared.sticky_keys.get());
        }
        let mods = window.modifiers_masked(mods);
        fire!(window, key, key, scancode, action, mods);
    }

    fn input_char(&self, window: &Window, codepoint: u32, mods: Modifiers, plain: bool) {
        if !is_text_codepoint(codepoint) {
            return;
        }
        let c = match std::char::from_u32(codepoint) {
            Some(c) => c,
            None => return,
        };
        let mods = window.modifiers_masked(mods);
        fire!(window, char_mods, c, mods);
        if plain {
            fire!(window, character, c);
        }
    }

    pub(crate) fn input_mouse_button(&self, window: &Window, button: MouseButton, action: Action, mods: Modifiers) {
        window.shared.mouse_buttons.borrow_mut()[button.index()] = KeyState::from_action(action, window.shared.sticky_mouse_buttons.get());
        let mods = window.modifiers_masked(mods);
        fire!(window, mouse_button, button, action, mods);
    }

    fn input_cursor_pos(&self, window: &Window, pos: Vec2<f64>) {
        if window.shared.virtual_cursor_pos.get() == pos {
            return;
        }
        window.shared.virtual_cursor_pos.set(pos);
        fire!(window, cursor_pos, pos);
    }

    fn input_window_focus(&self, window: &Window, focused: bool) {
        let id = window.shared.id;
        if !focused {
            if self.disabled_cursor_window().as_ref() == Some(window) {
                if let Err(e) = self.enable_cursor(window) {
                    error::report_transient(e);
                }
            }
            if window.current_monitor().is_some() && window.shared.auto_iconify.get() {
                if let Err(e) = self.platform().and_then(|p| p.iconify_window(id)) {
                    error::report_transient(e);
                }
            }

            let pressed_keys: Vec<Key> = {
                let keys = window.shared.keys.borrow();
                Key::ALL.iter().cloned().filter(|k| k.index().map_or(false, |i| keys[i] == KeyState::Pressed)).collect()
            };
            for key in pressed_keys {
                let scancode = self.platform().map(|p| p.key_scancode(key)).unwrap_or(-1);
                self.input_key(window, key, scancode, Action::Release, Modifiers::empty());
            }
            let pressed_buttons: Vec<MouseButton> = {
                let buttons = window.shared.mouse_buttons.borrow();
                MouseButton::ALL.iter().cloned().filter(|b| buttons[b.index()] == KeyState::Pressed).collect()
            };
            for button in pressed_buttons {
                self.input_mouse_button(window, button, Action::Release, Modifiers::empty());
            }
        }

        fire!(window, focus, focused);

        if focused && window.shared.cursor_mode.get() == CursorMode::Disabled && !window.is_destroyed() {
            if let Err(e) = self.disable_cursor(window) {
                error::report_transient(e);
            }
        }
    }

    /// Hides and captures the cursor, remembering where to put it back.
    pub(crate) fn disable_cursor(&self, window: &Window) -> Result<()> {
        let platform = self.platform()?;
        let id = window.shared.id;
        *self.disabled_cursor_window.borrow_mut() = Rc::downgrade(&window.shared);
        self.restore_cursor_pos.set(platform.cursor_pos(id)?);
        platform.apply_cursor_mode(id, CursorMode::Disabled, window.shared.raw_mouse_motion.get())?;
        window.center_cursor(self)
    }

    /// Releases the cursor and puts it back where it was when it got disabled.
    pub(crate) fn enable_cursor(&self, window: &Window) -> Result<()> {
        let platform = self.platform()?;
        let id = window.shared.id;
        *self.disabled_cursor_window.borrow_mut() = Weak::new();
        let mode = match window.shared.cursor_mode.get() {
            CursorMode::Disabled => CursorMode::Hidden,
            mode => mode,
        };
        platform.apply_cursor_mode(id, mode, false)?;
        let pos = self.restore_cursor_pos.get();
        platform.set_cursor_pos(id, pos)?;
        window.shared.last_cursor_pos.set(pos);
        Ok(())
    }
}
