//! Drives the headless backend: user input, hot-plugging and driver changes.

use std::rc::{Rc, Weak};
use crate::error::{self, Reported, Result};
use crate::event::Event;
use crate::input::{Action, CursorMode, Key, Modifiers, MouseButton};
use crate::library::{Library, LibraryShared};
use crate::monitor::{Monitor, VideoMode};
use crate::platform::{MonitorKey, WindowId};
use crate::window::Window;
use crate::{Extent2, Vec2};
use super::{DriverInfo, NullPlatform, NullState};

/// Plays the user and the operating system when running on `PlatformKind::Null`.
///
/// Everything it does is queued as native events; they reach callbacks on the
/// next `poll_events()`.
pub struct Simulator {
    lib: Weak<LibraryShared>,
    state: Rc<NullState>,
}

impl std::fmt::Debug for Simulator {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("Simulator")
    }
}

impl Library {
    /// The simulator of the headless backend. Fails with `InvalidValue` on any other backend.
    pub fn simulator(&self) -> Result<Simulator> {
        self.entry().and_then(|lib| {
            let platform = lib.platform()?;
            let null = match platform.as_any().downcast_ref::<NullPlatform>() {
                Some(null) => null,
                None => return error::invalid_value(format!("The {:?} platform cannot be simulated", platform.kind())),
            };
            Ok(Simulator { lib: Rc::downgrade(lib), state: null.state.clone() })
        }).reported()
    }
}

impl Simulator {
    fn id(&self, window: &Window) -> Result<WindowId> {
        LibraryShared::upgrade(&self.lib)?;
        window.lib()?;
        let id = window.shared.id;
        if !self.state.windows.borrow().contains_key(&id) {
            return error::invalid_value(format!("Window {:?} does not belong to this backend", id));
        }
        Ok(id)
    }

    fn key_event(&self, window: &Window, key: Key, action: Action) -> Result<()> {
        let id = self.id(window)?;
        {
            let mut held = self.state.held_keys.borrow_mut();
            match action {
                Action::Release => { held.remove(&key); },
                _ => { held.insert(key); },
            }
        }
        if action == Action::Press {
            match key {
                Key::CapsLock => self.state.caps_lock.set(!self.state.caps_lock.get()),
                Key::NumLock => self.state.num_lock.set(!self.state.num_lock.get()),
                _ => (),
            }
        }
        let scancode = self.state.keys.scancode(key);
        let mods = self.state.modifiers();
        self.state.push(Event::KeyboardKey { window: id, key, scancode, action, mods });
        Ok(())
    }

    /// Presses a key. Pressing a held key again reports a repeat.
    pub fn press_key(&self, window: &Window, key: Key) -> Result<()> {
        self.key_event(window, key, Action::Press).reported()
    }

    /// Releases a key.
    pub fn release_key(&self, window: &Window, key: Key) -> Result<()> {
        self.key_event(window, key, Action::Release).reported()
    }

    /// Delivers text, one character event per code point, with the modifiers currently held.
    pub fn type_text(&self, window: &Window, text: &str) -> Result<()> {
        (|| -> Result<()> {
            let id = self.id(window)?;
            let mods = self.state.modifiers();
            let plain = !mods.contains(Modifiers::ALT);
            for c in text.chars() {
                self.state.push(Event::TextInput { window: id, codepoint: c as u32, mods, plain });
            }
            Ok(())
        })().reported()
    }

    /// Delivers UTF-16 code units the way Win32 does, surrogate halves one at a time.
    pub fn type_utf16(&self, window: &Window, units: &[u16]) -> Result<()> {
        (|| -> Result<()> {
            let id = self.id(window)?;
            let mods = self.state.modifiers();
            let plain = !mods.contains(Modifiers::ALT);
            for &unit in units {
                if let Some(codepoint) = self.state.utf16.borrow_mut().push(unit) {
                    self.state.push(Event::TextInput { window: id, codepoint, mods, plain });
                }
            }
            Ok(())
        })().reported()
    }

    fn button_event(&self, window: &Window, button: MouseButton, action: Action) -> Result<()> {
        let id = self.id(window)?;
        let mods = self.state.modifiers();
        self.state.push(Event::MouseButton { window: id, button, action, mods });
        Ok(())
    }

    /// Presses a mouse button.
    pub fn press_mouse_button(&self, window: &Window, button: MouseButton) -> Result<()> {
        self.button_event(window, button, Action::Press).reported()
    }

    /// Releases a mouse button.
    pub fn release_mouse_button(&self, window: &Window, button: MouseButton) -> Result<()> {
        self.button_event(window, button, Action::Release).reported()
    }

    fn cursor_moved(&self, id: WindowId, screen: Vec2<f64>, raw: Option<Vec2<f64>>) -> Result<()> {
        self.state.cursor_screen_pos.set(screen);
        let (pos, entered, raw_applied) = self.state.with_window(id, |w| {
            let pos = screen - Vec2::new(w.pos.x as f64, w.pos.y as f64);
            let inside = pos.x >= 0. && pos.y >= 0. && pos.x < w.size.w as f64 && pos.y < w.size.h as f64;
            let entered = if inside != w.hovered {
                w.hovered = inside;
                Some(inside)
            } else {
                None
            };
            (pos, entered, w.cursor_mode == CursorMode::Disabled && w.raw_motion)
        })?;
        if let Some(entered) = entered {
            self.state.push(Event::MouseEnter { window: id, entered });
        }
        if let (Some(displacement), true) = (raw, raw_applied) {
            self.state.push(Event::MouseMotionRaw { window: id, displacement });
        }
        self.state.push(Event::MouseMotion { window: id, position: pos });
        Ok(())
    }

    /// Moves the pointer to a position relative to the window's content area.
    pub fn move_cursor_to(&self, window: &Window, pos: Vec2<f64>) -> Result<()> {
        (|| -> Result<()> {
            let id = self.id(window)?;
            let origin = self.state.with_window(id, |w| Vec2::new(w.pos.x as f64, w.pos.y as f64))?;
            self.cursor_moved(id, origin + pos, None)
        })().reported()
    }

    /// Moves the mouse by `delta`, as a physical mouse would.
    pub fn move_mouse(&self, window: &Window, delta: Vec2<f64>) -> Result<()> {
        (|| -> Result<()> {
            let id = self.id(window)?;
            let screen = self.state.cursor_screen_pos.get() + delta;
            self.cursor_moved(id, screen, Some(delta))
        })().reported()
    }

    /// Scrolls the wheel or touchpad.
    pub fn scroll(&self, window: &Window, offset: Vec2<f64>) -> Result<()> {
        (|| -> Result<()> {
            let id = self.id(window)?;
            self.state.push(Event::MouseScroll { window: id, scroll: offset });
            Ok(())
        })().reported()
    }

    /// Drops files on the window at `pos`.
    pub fn drop_files(&self, window: &Window, pos: Vec2<f64>, paths: &[&str]) -> Result<()> {
        (|| -> Result<()> {
            let id = self.id(window)?;
            let origin = self.state.with_window(id, |w| Vec2::new(w.pos.x as f64, w.pos.y as f64))?;
            self.cursor_moved(id, origin + pos, None)?;
            let paths = paths.iter().map(|p| p.to_string()).collect();
            self.state.push(Event::FilesDropped { window: id, paths });
            Ok(())
        })().reported()
    }

    /// Gives the focus to something outside this application.
    pub fn focus_elsewhere(&self) -> Result<()> {
        LibraryShared::upgrade(&self.lib).map(|_| self.state.set_focus(None)).reported()
    }

    /// Clicks the window's close button.
    pub fn request_close(&self, window: &Window) -> Result<()> {
        (|| -> Result<()> {
            let id = self.id(window)?;
            self.state.push(Event::WindowCloseRequested { window: id });
            Ok(())
        })().reported()
    }

    /// Damages the window's contents.
    pub fn request_refresh(&self, window: &Window) -> Result<()> {
        (|| -> Result<()> {
            let id = self.id(window)?;
            self.state.push(Event::WindowNeedsRefresh { window: id });
            Ok(())
        })().reported()
    }

    /// Moves the window as the user dragging its title bar would.
    pub fn drag_window(&self, window: &Window, pos: Vec2<i32>) -> Result<()> {
        (|| -> Result<()> {
            let id = self.id(window)?;
            self.state.with_window(id, |w| self.state.move_window(id, w, pos))
        })().reported()
    }

    /// Resizes the window as the user dragging its border would. Size limits apply.
    pub fn drag_window_border(&self, window: &Window, size: Extent2<i32>) -> Result<()> {
        (|| -> Result<()> {
            let id = self.id(window)?;
            self.state.with_window(id, |w| {
                if w.resizable {
                    let size = w.apply_size_limits(size);
                    self.state.resize_window(id, w, size);
                }
            })
        })().reported()
    }

    /// Changes the content scale of the window, as moving it to another display would.
    pub fn set_content_scale(&self, window: &Window, scale: Vec2<f32>) -> Result<()> {
        (|| -> Result<()> {
            let id = self.id(window)?;
            self.state.with_window(id, |w| {
                if w.scale == scale {
                    return;
                }
                w.scale = scale;
                self.state.push(Event::ContentScaleChanged { window: id, scale });
                self.state.push(Event::FramebufferResized { window: id, size: w.framebuffer_size() });
            })
        })().reported()
    }

    /// Plugs in a monitor that supports a single video mode. It is never primary
    /// while another monitor is connected.
    pub fn connect_monitor(&self, name: &str, pos: Vec2<i32>, mode: VideoMode) -> Result<()> {
        (|| -> Result<()> {
            LibraryShared::upgrade(&self.lib)?;
            let key = self.state.add_monitor(name, pos, Extent2::new(600, 340), vec![mode], mode);
            debug!("Connected simulated monitor {:?}", key);
            self.state.push(Event::MonitorsChanged);
            Ok(())
        })().reported()
    }

    /// Unplugs a monitor.
    pub fn disconnect_monitor(&self, monitor: &Monitor) -> Result<()> {
        (|| -> Result<()> {
            LibraryShared::upgrade(&self.lib)?;
            let key: &MonitorKey = &monitor.shared.key;
            let mut monitors = self.state.monitors.borrow_mut();
            let before = monitors.len();
            monitors.retain(|m| &m.key != key);
            if monitors.len() == before {
                return error::invalid_value(format!("Monitor \"{}\" is not connected", monitor.shared.name));
            }
            drop(monitors);
            self.state.push(Event::MonitorsChanged);
            Ok(())
        })().reported()
    }

    /// Changes the modes a monitor supports without telling anyone, as a driver
    /// update or a KVM switch might. The current mode is kept.
    pub fn set_video_modes(&self, monitor: &Monitor, modes: &[VideoMode]) -> Result<()> {
        (|| -> Result<()> {
            LibraryShared::upgrade(&self.lib)?;
            self.state.with_monitor(&monitor.shared.key, |m| m.modes = modes.to_vec())
        })().reported()
    }

    /// Replaces the simulated graphics driver. Affects contexts created afterwards.
    pub fn set_driver(&self, driver: DriverInfo) {
        *self.state.driver.borrow_mut() = driver;
    }

    /// The simulated graphics driver.
    pub fn driver(&self) -> DriverInfo {
        self.state.driver.borrow().clone()
    }

    /// Whether the simulated system offers raw mouse motion.
    pub fn set_raw_mouse_motion_supported(&self, supported: bool) {
        self.state.raw_supported.set(supported);
    }

    /// Whether screensaver and power management are currently held off.
    pub fn fullscreen_inhibited(&self) -> bool {
        self.state.inhibited.get()
    }

    /// Where the pointer is, in screen coordinates.
    pub fn cursor_screen_pos(&self) -> Vec2<f64> {
        self.state.cursor_screen_pos.get()
    }

    /// The cursor mode last applied to the native window, and whether raw motion is on.
    pub fn applied_cursor_mode(&self, window: &Window) -> Result<(CursorMode, bool)> {
        self.id(window).and_then(|id| self.state.with_window(id, |w| (w.cursor_mode, w.raw_motion))).reported()
    }

    /// The native title of the window.
    pub fn window_title(&self, window: &Window) -> Result<String> {
        self.id(window).and_then(|id| self.state.with_window(id, |w| w.title.clone())).reported()
    }

    /// How many icon images the window was last given.
    pub fn window_icon_count(&self, window: &Window) -> Result<usize> {
        self.id(window).and_then(|id| self.state.with_window(id, |w| w.icon_count)).reported()
    }

    fn gl_stat<T, F: FnOnce(&super::GlState) -> T>(&self, window: &Window, f: F) -> Result<T> {
        let id = self.id(window)?;
        let gl = self.state.with_window(id, |w| w.gl.clone())?;
        match gl {
            Some(gl) => Ok(f(&gl)),
            None => Err(crate::error::Error::no_window_context()),
        }
    }

    /// How many times the window's buffers were swapped.
    pub fn swap_count(&self, window: &Window) -> Result<u64> {
        self.gl_stat(window, |gl| gl.swaps.get()).reported()
    }

    /// How many times the window's framebuffer was cleared.
    pub fn clear_count(&self, window: &Window) -> Result<u64> {
        self.gl_stat(window, |gl| gl.clears.get()).reported()
    }

    /// The swap interval last set on the window's context.
    pub fn swap_interval(&self, window: &Window) -> Result<i32> {
        self.gl_stat(window, |gl| gl.swap_interval.get()).reported()
    }
}
