//! The library facade: initialization, termination, hints and process-wide queries.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use crate::cursor::{Cursor, CursorShared, StandardCursor};
use crate::error::{Error, Reported, Result};
use crate::hint::{self, Hint, Hints};
use crate::image::RgbaImage;
use crate::input::Key;
use crate::monitor::{Monitor, MonitorCallback};
use crate::os;
use crate::platform::{CursorId, Platform, PlatformKind, Waker, WindowId};
use crate::tls::TlsSlot;
use crate::window::{Window, WindowShared};
use crate::Vec2;

thread_local! {
    static LIBRARY: RefCell<Weak<LibraryShared>> = RefCell::new(Weak::new());
}

pub(crate) struct LibraryShared {
    pub initialized: Cell<bool>,
    platform: RefCell<Option<Rc<dyn Platform>>>,
    waker: Arc<dyn Waker>,
    pub hints: RefCell<Hints>,
    pub monitors: RefCell<Vec<Monitor>>,
    pub windows: RefCell<Vec<Window>>,
    pub cursors: RefCell<Vec<Cursor>>,
    pub monitor_callback: RefCell<Option<MonitorCallback>>,
    /// How many monitors are held by fullscreen windows.
    pub acquired_count: Cell<u32>,
    pub disabled_cursor_window: RefCell<Weak<WindowShared>>,
    pub restore_cursor_pos: Cell<Vec2<f64>>,
    /// Holds the raw `WindowId` whose context is current on each thread.
    pub context_slot: RefCell<Option<TlsSlot>>,
    next_id: Cell<u64>,
}

impl LibraryShared {
    pub(crate) fn upgrade(weak: &Weak<Self>) -> Result<Rc<Self>> {
        match weak.upgrade() {
            Some(lib) if lib.initialized.get() => Ok(lib),
            _ => Err(Error::not_initialized()),
        }
    }

    pub(crate) fn platform(&self) -> Result<Rc<dyn Platform>> {
        self.platform.borrow().clone().ok_or_else(Error::not_initialized)
    }

    pub(crate) fn next_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    pub(crate) fn window_by_id(&self, id: WindowId) -> Option<Window> {
        self.windows.borrow().iter().find(|w| w.shared.id == id).cloned()
    }

    pub(crate) fn disabled_cursor_window(&self) -> Option<Window> {
        self.disabled_cursor_window.borrow().upgrade().map(|shared| Window { shared })
    }

    /// Tears everything down. Failures are logged, not propagated.
    fn terminate(&self) {
        if !self.initialized.get() {
            return;
        }
        info!("Terminating");
        self.monitor_callback.borrow_mut().take();

        let windows = self.windows.borrow().clone();
        for window in windows.iter().rev() {
            if let Err(e) = self.destroy_window(window) {
                warn!("While destroying window {:?} during termination: {}", window.shared.id, e);
            }
        }
        let cursors = self.cursors.borrow().clone();
        for cursor in cursors.iter() {
            if let Err(e) = self.destroy_cursor(cursor) {
                warn!("While destroying cursor during termination: {}", e);
            }
        }
        for monitor in self.monitors.borrow_mut().drain(..) {
            monitor.shared.connected.set(false);
        }

        self.initialized.set(false);
        if let Some(slot) = self.context_slot.borrow_mut().take() {
            slot.destroy();
        }
        // Dropping the backend closes connections and unloads native libraries.
        self.platform.borrow_mut().take();
    }

    pub(crate) fn destroy_cursor(&self, cursor: &Cursor) -> Result<()> {
        let users: Vec<Window> = self.windows.borrow().iter()
            .filter(|w| w.shared.cursor.borrow().as_ref() == Some(cursor))
            .cloned().collect();
        for window in users {
            window.set_cursor(None)?;
        }
        self.cursors.borrow_mut().retain(|c| c != cursor);
        cursor.shared.destroyed.set(true);
        self.platform()?.destroy_cursor(cursor.shared.id)
    }
}

impl Drop for LibraryShared {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Initializes the library on the calling thread, which becomes its main thread.
///
/// Calling this while a library is alive on this thread returns that library.
pub fn init() -> Result<Library> {
    if let Some(shared) = LIBRARY.with(|l| l.borrow().upgrade()) {
        if shared.initialized.get() {
            return Ok(Library { shared });
        }
    }
    let hints = hint::init_hints();
    let platform = os::connect(&hints).reported()?;
    info!("Initialized {:?} backend", platform.kind());
    let waker = platform.waker();
    let shared = Rc::new(LibraryShared {
        initialized: Cell::new(true),
        platform: RefCell::new(Some(platform)),
        waker,
        hints: RefCell::new(Hints::default()),
        monitors: RefCell::new(Vec::new()),
        windows: RefCell::new(Vec::new()),
        cursors: RefCell::new(Vec::new()),
        monitor_callback: RefCell::new(None),
        acquired_count: Cell::new(0),
        disabled_cursor_window: RefCell::new(Weak::new()),
        restore_cursor_pos: Cell::new(Vec2::zero()),
        context_slot: RefCell::new(Some(TlsSlot::create())),
        next_id: Cell::new(1),
    });
    if let Err(e) = shared.poll_monitors() {
        shared.terminate();
        return Err(e).reported();
    }
    LIBRARY.with(|l| *l.borrow_mut() = Rc::downgrade(&shared));
    Ok(Library { shared })
}

/// Handle to the initialized library. Cheap to clone; all clones refer to the same state.
///
/// This is neither `Send` nor `Sync`: every operation happens on the thread that called `init()`.
#[derive(Clone)]
pub struct Library {
    pub(crate) shared: Rc<LibraryShared>,
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Library").field("initialized", &self.shared.initialized.get()).finish()
    }
}

/// Wakes the main thread from `wait_events()`. Can be sent to and used from any thread.
#[derive(Clone)]
pub struct EventPoster {
    waker: Arc<dyn Waker>,
}

impl fmt::Debug for EventPoster {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("EventPoster")
    }
}

impl EventPoster {
    /// Posts an empty event, waking a thread blocked in `wait_events()` or `wait_events_timeout()`.
    pub fn post_empty_event(&self) -> Result<()> {
        self.waker.wake().reported()
    }
}

impl Library {
    pub(crate) fn entry(&self) -> Result<&Rc<LibraryShared>> {
        if self.shared.initialized.get() {
            Ok(&self.shared)
        } else {
            Err(Error::not_initialized())
        }
    }

    /// Destroys every window and cursor, restores video modes, and shuts the backend down.
    ///
    /// Other clones of this handle, and every window, monitor and cursor handle, report
    /// `NotInitialized` afterwards.
    pub fn terminate(self) {
        self.shared.terminate();
        LIBRARY.with(|l| *l.borrow_mut() = Weak::new());
    }

    /// Is this handle still usable?
    pub fn is_initialized(&self) -> bool {
        self.shared.initialized.get()
    }

    /// The backend in use.
    pub fn platform(&self) -> Result<PlatformKind> {
        self.entry().and_then(|lib| lib.platform()).map(|p| p.kind()).reported()
    }

    /// Sets an integer hint for the next `create_window()`.
    ///
    /// Out-of-range enum values are stored as is and rejected by `create_window()`.
    pub fn window_hint<V: Into<i32>>(&self, hint: Hint, value: V) -> Result<()> {
        let lib = self.entry().reported()?;
        lib.hints.borrow_mut().set(hint, value.into());
        Ok(())
    }

    /// Sets a string hint for the next `create_window()`.
    pub fn window_hint_string(&self, hint: Hint, value: &str) -> Result<()> {
        self.entry().and_then(|lib| lib.hints.borrow_mut().set_string(hint, value)).reported()
    }

    /// Resets all window hints to their defaults.
    pub fn default_window_hints(&self) -> Result<()> {
        let lib = self.entry().reported()?;
        *lib.hints.borrow_mut() = Hints::default();
        Ok(())
    }

    /// Connected monitors, primary first.
    pub fn monitors(&self) -> Result<Vec<Monitor>> {
        self.entry().map(|lib| lib.monitors.borrow().clone()).reported()
    }

    /// The primary monitor, if any monitor is connected.
    pub fn primary_monitor(&self) -> Result<Option<Monitor>> {
        self.entry().map(|lib| lib.monitors.borrow().first().cloned()).reported()
    }

    /// Sets the monitor hot-plug callback, returning the previous one.
    pub fn set_monitor_callback<F>(&self, f: F) -> Result<Option<MonitorCallback>>
        where F: Fn(&Monitor, crate::monitor::PeripheralEvent) + 'static
    {
        self.replace_monitor_callback(Some(Rc::new(f)))
    }

    /// Replaces (or removes, with `None`) the monitor hot-plug callback, returning the previous one.
    pub fn replace_monitor_callback(&self, cb: Option<MonitorCallback>) -> Result<Option<MonitorCallback>> {
        self.entry().map(|lib| lib.monitor_callback.replace(cb)).reported()
    }

    /// Live windows, in creation order.
    pub fn windows(&self) -> Result<Vec<Window>> {
        self.entry().map(|lib| lib.windows.borrow().clone()).reported()
    }

    /// Returns a handle that can wake this thread from any other thread.
    pub fn event_poster(&self) -> EventPoster {
        EventPoster { waker: self.shared.waker.clone() }
    }

    /// Wakes a thread blocked in `wait_events()`.
    pub fn post_empty_event(&self) -> Result<()> {
        self.entry().and_then(|lib| lib.waker.wake()).reported()
    }

    /// Creates a cursor from an RGBA image, whose hotspot is at (`xhot`, `yhot`) from the top-left.
    pub fn create_cursor(&self, image: &RgbaImage, xhot: i32, yhot: i32) -> Result<Cursor> {
        self.entry().and_then(|lib| {
            image.validate()?;
            let id = CursorId(lib.next_id());
            lib.platform()?.create_cursor(id, image, Vec2::new(xhot, yhot))?;
            Ok(lib.register_cursor(id, None))
        }).reported()
    }

    /// Creates a cursor with one of the system's standard shapes.
    pub fn create_standard_cursor(&self, shape: StandardCursor) -> Result<Cursor> {
        self.entry().and_then(|lib| {
            let id = CursorId(lib.next_id());
            lib.platform()?.create_standard_cursor(id, shape)?;
            Ok(lib.register_cursor(id, Some(shape)))
        }).reported()
    }

    /// Places UTF-8 text on the system clipboard.
    pub fn set_clipboard_string(&self, s: &str) -> Result<()> {
        self.entry().and_then(|lib| lib.platform()?.set_clipboard_string(s)).reported()
    }

    /// Gets the system clipboard's contents as UTF-8 text.
    pub fn clipboard_string(&self) -> Result<String> {
        self.entry().and_then(|lib| lib.platform()?.clipboard_string()).reported()
    }

    /// The platform scancode of a key, or -1 when the key does not exist on this keyboard.
    pub fn key_scancode(&self, key: Key) -> Result<i32> {
        self.entry().and_then(|lib| {
            crate::input::check_key(key)?;
            Ok(lib.platform()?.key_scancode(key))
        }).reported()
    }

    /// The layout-specific name of a printable key.
    ///
    /// `key` is used unless it is `Key::Unknown`, in which case `scancode` is.
    pub fn key_name(&self, key: Key, scancode: i32) -> Result<Option<String>> {
        self.entry().and_then(|lib| {
            let p = lib.platform()?;
            let scancode = match key {
                Key::Unknown => scancode,
                key => p.key_scancode(key),
            };
            Ok(p.key_name(scancode))
        }).reported()
    }

    /// Can raw mouse motion be enabled on this system?
    pub fn raw_mouse_motion_supported(&self) -> Result<bool> {
        self.entry().and_then(|lib| lib.platform()).map(|p| p.raw_mouse_motion_supported()).reported()
    }
}

impl LibraryShared {
    fn register_cursor(self: &Rc<Self>, id: CursorId, shape: Option<StandardCursor>) -> Cursor {
        let cursor = Cursor {
            shared: Rc::new(CursorShared {
                lib: Rc::downgrade(self),
                id,
                shape,
                destroyed: Cell::new(false),
            }),
        };
        self.cursors.borrow_mut().push(cursor.clone());
        cursor
    }
}
