//! Monitors, video modes, hot-plug tracking and fullscreen acquisition.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::fmt;
use std::rc::{Rc, Weak};
use crate::error::{self, Error, Reported, Result};
use crate::hint::DONT_CARE;
use crate::library::LibraryShared;
use crate::platform::{MonitorInfo, MonitorKey};
use crate::window::{Window, WindowShared};
use crate::{Extent2, Rect, Vec2};

/// A display mode: resolution, colour depth and refresh rate.
///
/// Modes order by total colour bits, then area, then width, then refresh rate.
#[derive(Debug, Copy, Clone, Default, Hash, PartialEq, Eq)]
pub struct VideoMode {
    #[allow(missing_docs)]
    pub width: i32,
    #[allow(missing_docs)]
    pub height: i32,
    #[allow(missing_docs)]
    pub red_bits: i32,
    #[allow(missing_docs)]
    pub green_bits: i32,
    #[allow(missing_docs)]
    pub blue_bits: i32,
    /// In Hz. May be `DONT_CARE` in desired modes.
    pub refresh_rate: i32,
}

impl VideoMode {
    fn sort_key(&self) -> (i32, i64, i32, i32, i32, i32) {
        (
            self.red_bits + self.green_bits + self.blue_bits,
            self.width as i64 * self.height as i64,
            self.width,
            self.refresh_rate,
            self.red_bits,
            self.green_bits,
        )
    }
}

impl Ord for VideoMode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for VideoMode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Splits a pixel depth into red, green and blue bits. 32 bpp means 24 bits of colour.
pub(crate) fn split_bpp(bpp: i32) -> (i32, i32, i32) {
    let bpp = if bpp == 32 { 24 } else { bpp };
    let mut red = bpp / 3;
    let mut green = bpp / 3;
    let blue = bpp / 3;
    let delta = bpp - red * 3;
    if delta >= 1 {
        green += 1;
    }
    if delta == 2 {
        red += 1;
    }
    (red, green, blue)
}

/// Sorts and removes duplicates, as every cached mode list must be.
pub(crate) fn sort_modes(modes: &mut Vec<VideoMode>) {
    modes.sort();
    modes.dedup();
}

/// Picks the mode closest to `desired`.
///
/// Colour depth matters most, then the squared size distance, then the
/// refresh rate distance (or the highest rate when the desired one is `DONT_CARE`).
pub(crate) fn choose_video_mode<'a>(modes: &'a [VideoMode], desired: &VideoMode) -> Option<&'a VideoMode> {
    let cost = |m: &VideoMode| {
        let mut color_diff = 0u32;
        for &(have, want) in &[(m.red_bits, desired.red_bits), (m.green_bits, desired.green_bits), (m.blue_bits, desired.blue_bits)] {
            if want != DONT_CARE {
                color_diff += (have - want).abs() as u32;
            }
        }
        let dw = (m.width - desired.width) as i64;
        let dh = (m.height - desired.height) as i64;
        let size_diff = dw * dw + dh * dh;
        let rate_diff = if desired.refresh_rate != DONT_CARE {
            (m.refresh_rate - desired.refresh_rate).abs() as u64
        } else {
            u32::max_value() as u64 - m.refresh_rate.max(0) as u64
        };
        (color_diff, size_diff, rate_diff)
    };
    // `min_by_key` keeps the last of equal elements; ties must go to the first.
    let mut best: Option<(&VideoMode, (u32, i64, u64))> = None;
    for m in modes {
        let c = cost(m);
        match best {
            Some((_, least)) if least <= c => (),
            _ => best = Some((m, c)),
        }
    }
    best.map(|(m, _)| m)
}

/// Hot-plug notification kind.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
#[repr(i32)]
pub enum PeripheralEvent {
    #[allow(missing_docs)]
    Connected = 0x0004_0001,
    #[allow(missing_docs)]
    Disconnected = 0x0004_0002,
}

/// Called when a monitor is connected or disconnected.
pub type MonitorCallback = Rc<dyn Fn(&Monitor, PeripheralEvent)>;

pub(crate) struct MonitorShared {
    pub lib: Weak<LibraryShared>,
    pub key: MonitorKey,
    pub name: String,
    pub width_mm: i32,
    pub height_mm: i32,
    pub connected: Cell<bool>,
    /// Sorted; `None` until first requested.
    pub modes: RefCell<Option<Vec<VideoMode>>>,
    /// The window currently presenting fullscreen on this monitor.
    pub owner: RefCell<Weak<WindowShared>>,
    /// Mode to restore once the owner releases the monitor, set by the first mode change.
    pub original_mode: Cell<Option<VideoMode>>,
}

/// A handle to a display. Cheap to clone.
#[derive(Clone)]
pub struct Monitor {
    pub(crate) shared: Rc<MonitorShared>,
}

impl PartialEq for Monitor {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }
}
impl Eq for Monitor {}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Monitor").field("name", &self.shared.name).field("key", &self.shared.key).finish()
    }
}

impl Monitor {
    fn lib(&self) -> Result<Rc<LibraryShared>> {
        let lib = LibraryShared::upgrade(&self.shared.lib)?;
        if !self.shared.connected.get() {
            return error::invalid_value(format!("Monitor \"{}\" was disconnected", self.shared.name));
        }
        Ok(lib)
    }
    pub(crate) fn downgrade(&self) -> Weak<MonitorShared> {
        Rc::downgrade(&self.shared)
    }

    /// Human-readable name, not guaranteed to be unique. Still answers once the
    /// monitor is disconnected, but not after termination.
    pub fn name(&self) -> Result<&str> {
        LibraryShared::upgrade(&self.shared.lib).map(|_| self.shared.name.as_str()).reported()
    }
    /// Physical size in millimetres, which may be zero when the display does not report it.
    pub fn physical_size(&self) -> Result<Extent2<i32>> {
        LibraryShared::upgrade(&self.shared.lib)
            .map(|_| Extent2::new(self.shared.width_mm, self.shared.height_mm))
            .reported()
    }
    /// Position of the monitor's viewport on the virtual desktop.
    pub fn pos(&self) -> Result<Vec2<i32>> {
        self.lib().and_then(|lib| lib.platform()?.monitor_pos(&self.shared.key)).reported()
    }
    /// Area not occupied by task bars and docks, in screen coordinates.
    pub fn work_area(&self) -> Result<Rect<i32, i32>> {
        self.lib().and_then(|lib| lib.platform()?.monitor_work_area(&self.shared.key)).reported()
    }
    /// Ratio between the current DPI and the platform's default DPI.
    pub fn content_scale(&self) -> Result<Vec2<f32>> {
        self.lib().and_then(|lib| lib.platform()?.monitor_content_scale(&self.shared.key)).reported()
    }
    /// Supported modes, sorted ascending.
    pub fn video_modes(&self) -> Result<Vec<VideoMode>> {
        self.lib().and_then(|lib| {
            lib.refresh_video_modes(self, false)?;
            Ok(self.shared.modes.borrow().clone().unwrap_or_default())
        }).reported()
    }
    /// The mode currently installed.
    pub fn video_mode(&self) -> Result<VideoMode> {
        self.lib().and_then(|lib| lib.platform()?.current_video_mode(&self.shared.key)).reported()
    }
    /// The supported mode a fullscreen window asking for `desired` would get.
    pub fn choose_video_mode(&self, desired: &VideoMode) -> Result<VideoMode> {
        self.lib().and_then(|lib| lib.choose_video_mode(self, desired)).reported()
    }
    /// The window holding this monitor in fullscreen, if any.
    pub fn fullscreen_window(&self) -> Result<Option<Window>> {
        LibraryShared::upgrade(&self.shared.lib)
            .map(|_| self.shared.owner.borrow().upgrade().map(|shared| Window { shared }))
            .reported()
    }
}

impl LibraryShared {
    /// Fills the mode cache. `force` re-queries even when it is already filled.
    pub(crate) fn refresh_video_modes(&self, monitor: &Monitor, force: bool) -> Result<()> {
        if !force && monitor.shared.modes.borrow().is_some() {
            return Ok(());
        }
        let mut modes = self.platform()?.video_modes(&monitor.shared.key)?;
        sort_modes(&mut modes);
        *monitor.shared.modes.borrow_mut() = Some(modes);
        Ok(())
    }

    pub(crate) fn choose_video_mode(&self, monitor: &Monitor, desired: &VideoMode) -> Result<VideoMode> {
        self.refresh_video_modes(monitor, false)?;
        let modes = monitor.shared.modes.borrow();
        let modes = modes.as_ref().map(|m| m.as_slice()).unwrap_or(&[]);
        choose_video_mode(modes, desired).cloned().ok_or_else(|| Error::failed(format!("Monitor \"{}\" reports no video modes", monitor.shared.name)))
    }

    fn install_video_mode(&self, monitor: &Monitor, desired: &VideoMode) -> Result<()> {
        let best = self.choose_video_mode(monitor, desired)?;
        let current = self.platform()?.current_video_mode(&monitor.shared.key)?;
        if current == best {
            return Ok(());
        }
        if monitor.shared.original_mode.get().is_none() {
            monitor.shared.original_mode.set(Some(current));
        }
        info!("Setting video mode {}x{}@{} on \"{}\"", best.width, best.height, best.refresh_rate, monitor.shared.name);
        self.platform()?.set_video_mode(&monitor.shared.key, &best)
    }

    fn restore_video_mode(&self, monitor: &Monitor) -> Result<()> {
        match monitor.shared.original_mode.take() {
            Some(original) => {
                info!("Restoring video mode {}x{}@{} on \"{}\"", original.width, original.height, original.refresh_rate, monitor.shared.name);
                self.platform()?.restore_video_mode(&monitor.shared.key, &original)
            },
            None => Ok(()),
        }
    }

    /// Installs the window's desired mode on its monitor and makes it the owner.
    /// The monitor's modes are queried afresh, as they may change while cached.
    pub(crate) fn acquire_monitor(&self, window: &Window) -> Result<()> {
        let monitor = match window.current_monitor() {
            Some(m) => m,
            None => return Ok(()),
        };
        if monitor.shared.owner.borrow().upgrade().is_none() {
            if self.acquired_count.get() == 0 {
                if let Err(e) = self.platform()?.set_fullscreen_inhibitors(true) {
                    error::report_transient(e);
                }
            }
            self.acquired_count.set(self.acquired_count.get() + 1);
        }
        *monitor.shared.owner.borrow_mut() = Rc::downgrade(&window.shared);
        self.refresh_video_modes(&monitor, true)?;
        self.install_video_mode(&monitor, &window.shared.video_mode.get())
    }

    /// Restores the monitor's original mode if the window still owns it.
    pub(crate) fn release_monitor(&self, window: &Window) -> Result<()> {
        let monitor = match window.current_monitor() {
            Some(m) => m,
            None => return Ok(()),
        };
        let is_owner = monitor.shared.owner.borrow().upgrade().map_or(false, |w| Rc::ptr_eq(&w, &window.shared));
        if !is_owner {
            return Ok(());
        }
        *monitor.shared.owner.borrow_mut() = Weak::new();
        let count = self.acquired_count.get().saturating_sub(1);
        self.acquired_count.set(count);
        if count == 0 {
            if let Err(e) = self.platform()?.set_fullscreen_inhibitors(false) {
                error::report_transient(e);
            }
        }
        self.restore_video_mode(&monitor)
    }

    fn new_monitor(self: &Rc<Self>, info: MonitorInfo) -> Monitor {
        let MonitorInfo { key, name, width_mm, height_mm, primary: _ } = info;
        Monitor {
            shared: Rc::new(MonitorShared {
                lib: Rc::downgrade(self),
                key,
                name,
                width_mm,
                height_mm,
                connected: Cell::new(true),
                modes: RefCell::new(None),
                owner: RefCell::new(Weak::new()),
                original_mode: Cell::new(None),
            }),
        }
    }

    /// Re-enumerates displays, and reports removals, then additions.
    pub(crate) fn poll_monitors(self: &Rc<Self>) -> Result<()> {
        let infos = self.platform()?.poll_monitors()?;
        let old = self.monitors.borrow().clone();

        for monitor in old.iter().filter(|m| !infos.iter().any(|i| i.key == m.shared.key)) {
            info!("Monitor disconnected: \"{}\"", monitor.shared.name);
            let hosted: Vec<Window> = self.windows.borrow().iter()
                .filter(|w| w.current_monitor().as_ref() == Some(monitor))
                .cloned().collect();
            for window in hosted {
                if let Err(e) = window.revert_to_windowed() {
                    error::report_transient(e);
                }
            }
            monitor.shared.connected.set(false);
            self.monitors.borrow_mut().retain(|m| m != monitor);
            self.notify_monitor(monitor, PeripheralEvent::Disconnected);
        }

        for info in infos {
            if old.iter().any(|m| m.shared.key == info.key) {
                continue;
            }
            let primary = info.primary;
            let monitor = self.new_monitor(info);
            info!("Monitor connected: \"{}\"{}", monitor.shared.name, if primary { " (primary)" } else { "" });
            if primary {
                self.monitors.borrow_mut().insert(0, monitor.clone());
            } else {
                self.monitors.borrow_mut().push(monitor.clone());
            }
            self.notify_monitor(&monitor, PeripheralEvent::Connected);
        }
        Ok(())
    }

    fn notify_monitor(&self, monitor: &Monitor, event: PeripheralEvent) {
        let cb = self.monitor_callback.borrow().clone();
        if let Some(cb) = cb {
            cb(monitor, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(width: i32, height: i32, bits: i32, refresh_rate: i32) -> VideoMode {
        VideoMode { width, height, red_bits: bits, green_bits: bits, blue_bits: bits, refresh_rate }
    }

    #[test]
    fn split_bpp_distributes_leftovers_to_green_then_red() {
        assert_eq!(split_bpp(32), (8, 8, 8));
        assert_eq!(split_bpp(16), (5, 6, 5));
        assert_eq!(split_bpp(15), (5, 5, 5));
        assert_eq!(split_bpp(17), (6, 6, 5));
    }

    #[test]
    fn modes_sort_by_bits_area_width_rate() {
        let mut modes = vec![
            mode(1920, 1080, 8, 60),
            mode(800, 600, 8, 60),
            mode(1920, 1080, 8, 60),
            mode(1024, 768, 5, 60),
            mode(1920, 1080, 8, 30),
            mode(1200, 1000, 8, 60),
        ];
        sort_modes(&mut modes);
        assert_eq!(modes, vec![
            mode(1024, 768, 5, 60),
            mode(800, 600, 8, 60),
            mode(1200, 1000, 8, 60),
            mode(1920, 1080, 8, 30),
            mode(1920, 1080, 8, 60),
        ]);
        assert!(modes.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn choice_prefers_color_then_size_then_rate() {
        let modes = [
            mode(1920, 1080, 5, 60),
            mode(1280, 720, 8, 60),
            mode(1920, 1080, 8, 50),
            mode(1920, 1080, 8, 75),
        ];
        let best = choose_video_mode(&modes, &mode(1920, 1080, 8, 60)).unwrap();
        assert_eq!(*best, mode(1920, 1080, 8, 50));
        let mut desired = mode(1920, 1080, 8, DONT_CARE);
        assert_eq!(*choose_video_mode(&modes, &desired).unwrap(), mode(1920, 1080, 8, 75));
        desired.red_bits = DONT_CARE;
        desired.green_bits = DONT_CARE;
        desired.blue_bits = DONT_CARE;
        desired.refresh_rate = 60;
        assert_eq!(*choose_video_mode(&modes, &desired).unwrap(), mode(1920, 1080, 5, 60));
    }

    #[test]
    fn choice_ties_go_to_the_first_mode() {
        let modes = [mode(640, 480, 8, 70), mode(640, 480, 8, 50)];
        assert_eq!(choose_video_mode(&modes, &mode(640, 480, 8, 60)).unwrap().refresh_rate, 70);
        assert!(choose_video_mode(&[], &mode(640, 480, 8, 60)).is_none());
    }
}
