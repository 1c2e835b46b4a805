//! Displays through Quartz Display Services, matched to `NSScreen`s for the
//! parts only AppKit knows: names, work areas and backing scale factors.

use std::collections::HashSet;
use std::ptr;
use objc2::rc::Retained;
use objc2::runtime::AnyObject;
use objc2::{class, msg_send, sel};
use objc2_foundation::{NSRect, NSString};
use super::ffi::*;
use super::window::transform_y;
use super::CocoaShared;
use crate::error::{Error, Result};
use crate::monitor::VideoMode;
use crate::platform::{MonitorInfo, MonitorKey};
use crate::{Rect, Vec2};

fn monitor_key(unit: u32) -> MonitorKey {
    MonitorKey(format!("unit{}", unit))
}

fn mode_usable(flags: u32) -> bool {
    flags & kDisplayModeValidFlag != 0
        && flags & kDisplayModeSafeFlag != 0
        && flags & (kDisplayModeInterlacedFlag | kDisplayModeStretchedFlag) == 0
}

/// Built-in panels report a refresh rate of zero.
fn refresh_rate(raw: f64) -> i32 {
    match raw.round() as i32 {
        0 => 60,
        hz => hz,
    }
}

unsafe fn mode_from_cg(mode: CGDisplayModeRef) -> VideoMode {
    VideoMode {
        width: CGDisplayModeGetWidth(mode) as i32,
        height: CGDisplayModeGetHeight(mode) as i32,
        red_bits: 8,
        green_bits: 8,
        blue_bits: 8,
        refresh_rate: refresh_rate(CGDisplayModeGetRefreshRate(mode)),
    }
}

/// Runs `f` over the usable modes of a display until it returns `true`.
unsafe fn for_each_mode<F: FnMut(CGDisplayModeRef) -> bool>(display: CGDirectDisplayID, mut f: F) {
    let modes = CGDisplayCopyAllDisplayModes(display, ptr::null());
    if modes.is_null() {
        return;
    }
    for i in 0..CFArrayGetCount(modes) {
        let mode = CFArrayGetValueAtIndex(modes, i) as CGDisplayModeRef;
        if mode_usable(CGDisplayModeGetIOFlags(mode)) && f(mode) {
            break;
        }
    }
    CFRelease(modes);
}

/// The `NSScreen` showing `display`, if any.
unsafe fn screen_for(display: CGDirectDisplayID) -> Option<Retained<AnyObject>> {
    let screens: Option<Retained<AnyObject>> = msg_send![class!(NSScreen), screens];
    let screens = screens?;
    let key = NSString::from_str("NSScreenNumber");
    let count: usize = msg_send![&*screens, count];
    for i in 0..count {
        let screen: Retained<AnyObject> = msg_send![&*screens, objectAtIndex: i];
        let description: Option<Retained<AnyObject>> = msg_send![&*screen, deviceDescription];
        let number: Option<Retained<AnyObject>> = match description {
            Some(description) => msg_send![&*description, objectForKey: &*key],
            None => None,
        };
        if let Some(number) = number {
            let id: u32 = msg_send![&*number, unsignedIntValue];
            if id == display {
                return Some(screen);
            }
        }
    }
    None
}

unsafe fn screen_name(display: CGDirectDisplayID, unit: u32) -> String {
    if let Some(screen) = screen_for(display) {
        let named: bool = msg_send![&*screen, respondsToSelector: sel!(localizedName)];
        if named {
            let name: Option<Retained<NSString>> = msg_send![&*screen, localizedName];
            if let Some(name) = name {
                return name.to_string();
            }
        }
    }
    format!("Display {}", unit)
}

impl CocoaShared {
    pub(super) fn display_id(&self, key: &MonitorKey) -> Result<CGDirectDisplayID> {
        self.displays.borrow().get(key).copied()
            .ok_or_else(|| Error::failed(format!("Cocoa: Unknown monitor {:?}", key)))
    }

    pub(super) fn cocoa_poll_monitors(&self) -> Result<Vec<MonitorInfo>> {
        let mut count = 0u32;
        let mut ids = Vec::new();
        unsafe {
            if CGGetOnlineDisplayList(0, ptr::null_mut(), &mut count) != kCGErrorSuccess {
                return Err(Error::failed("Cocoa: Failed to count online displays"));
            }
            ids.resize(count as usize, 0);
            if CGGetOnlineDisplayList(count, ids.as_mut_ptr(), &mut count) != kCGErrorSuccess {
                return Err(Error::failed("Cocoa: Failed to list online displays"));
            }
            ids.truncate(count as usize);
        }

        let main = unsafe { CGMainDisplayID() };
        let mut units = HashSet::new();
        let mut displays = self.displays.borrow_mut();
        displays.clear();
        let mut monitors = Vec::new();
        for id in ids {
            unsafe {
                if CGDisplayIsAsleep(id) != 0 {
                    continue;
                }
                // Mirrored displays share a unit number.
                let unit = CGDisplayUnitNumber(id);
                if !units.insert(unit) {
                    continue;
                }
                let size = CGDisplayScreenSize(id);
                let key = monitor_key(unit);
                displays.insert(key.clone(), id);
                monitors.push(MonitorInfo {
                    key,
                    name: screen_name(id, unit),
                    width_mm: size.width as i32,
                    height_mm: size.height as i32,
                    primary: id == main,
                });
            }
        }
        trace!("Cocoa: Found {} displays", monitors.len());
        Ok(monitors)
    }

    pub(super) fn cocoa_monitor_pos(&self, key: &MonitorKey) -> Result<Vec2<i32>> {
        let bounds = unsafe { CGDisplayBounds(self.display_id(key)?) };
        Ok(Vec2::new(bounds.origin.x as i32, bounds.origin.y as i32))
    }

    pub(super) fn cocoa_monitor_work_area(&self, key: &MonitorKey) -> Result<Rect<i32, i32>> {
        let display = self.display_id(key)?;
        unsafe {
            match screen_for(display) {
                Some(screen) => {
                    let frame: NSRect = msg_send![&*screen, visibleFrame];
                    let top = transform_y(frame.origin.y + frame.size.height - 1.);
                    Ok(Rect::new(frame.origin.x as i32, top as i32, frame.size.width as i32, frame.size.height as i32))
                },
                None => {
                    let bounds = CGDisplayBounds(display);
                    Ok(Rect::new(bounds.origin.x as i32, bounds.origin.y as i32, bounds.size.width as i32, bounds.size.height as i32))
                },
            }
        }
    }

    pub(super) fn cocoa_monitor_content_scale(&self, key: &MonitorKey) -> Result<Vec2<f32>> {
        let display = self.display_id(key)?;
        let scale = unsafe {
            match screen_for(display) {
                Some(screen) => {
                    let factor: f64 = msg_send![&*screen, backingScaleFactor];
                    factor as f32
                },
                None => 1.,
            }
        };
        Ok(Vec2::new(scale, scale))
    }

    pub(super) fn cocoa_video_modes(&self, key: &MonitorKey) -> Result<Vec<VideoMode>> {
        let display = self.display_id(key)?;
        let mut modes: Vec<VideoMode> = Vec::new();
        unsafe {
            for_each_mode(display, |mode| {
                let mode = mode_from_cg(mode);
                if !modes.contains(&mode) {
                    modes.push(mode);
                }
                false
            });
        }
        if modes.is_empty() {
            modes.push(self.cocoa_current_video_mode(key)?);
        }
        Ok(modes)
    }

    pub(super) fn cocoa_current_video_mode(&self, key: &MonitorKey) -> Result<VideoMode> {
        let display = self.display_id(key)?;
        unsafe {
            let mode = CGDisplayCopyDisplayMode(display);
            if mode.is_null() {
                return Err(Error::failed("Cocoa: Failed to query display mode"));
            }
            let current = mode_from_cg(mode);
            CGDisplayModeRelease(mode);
            Ok(current)
        }
    }

    fn switch_mode(&self, display: CGDirectDisplayID, mode: &VideoMode) -> Result<()> {
        let mut result = None;
        unsafe {
            for_each_mode(display, |candidate| {
                if mode_from_cg(candidate) != *mode {
                    return false;
                }
                result = Some(CGDisplaySetDisplayMode(display, candidate, ptr::null()));
                true
            });
        }
        match result {
            Some(code) if code == kCGErrorSuccess => Ok(()),
            Some(code) => Err(Error::failed(format!("Cocoa: Failed to set display mode (error {})", code))),
            None => Err(Error::failed(format!("Cocoa: Display has no mode {}x{}@{}", mode.width, mode.height, mode.refresh_rate))),
        }
    }

    pub(super) fn cocoa_set_video_mode(&self, key: &MonitorKey, mode: &VideoMode) -> Result<()> {
        let current = self.cocoa_current_video_mode(key)?;
        if current == *mode {
            return Ok(());
        }
        let display = self.display_id(key)?;
        self.switch_mode(display, mode)?;
        self.original_modes.borrow_mut().entry(key.clone()).or_insert(current);
        Ok(())
    }

    pub(super) fn cocoa_restore_video_mode(&self, key: &MonitorKey, original: &VideoMode) -> Result<()> {
        if self.original_modes.borrow_mut().remove(key).is_none() {
            return Ok(());
        }
        let display = self.display_id(key)?;
        self.switch_mode(display, original)
    }

    /// Puts back every mode changed since connecting.
    pub(super) fn restore_all_video_modes(&self) {
        let changed: Vec<(MonitorKey, VideoMode)> = self.original_modes.borrow_mut().drain().collect();
        for (key, original) in changed {
            if let Ok(display) = self.display_id(&key) {
                if let Err(e) = self.switch_mode(display, &original) {
                    warn!("{}", e);
                }
            }
        }
    }

    pub(super) fn cocoa_set_fullscreen_inhibitors(&self, active: bool) -> Result<()> {
        let mut activity = self.activity.borrow_mut();
        if active {
            if activity.is_none() {
                let reason = NSString::from_str("Fullscreen window");
                let options = NSActivityIdleDisplaySleepDisabled | NSActivityUserInitiated;
                let token: Option<Retained<AnyObject>> = unsafe {
                    let info: Retained<AnyObject> = msg_send![class!(NSProcessInfo), processInfo];
                    msg_send![&*info, beginActivityWithOptions: options, reason: &*reason]
                };
                *activity = Some(token.ok_or_else(|| Error::failed("Cocoa: Failed to begin activity"))?);
            }
        } else if let Some(token) = activity.take() {
            self.end_activity(token);
        }
        Ok(())
    }

    pub(super) fn end_activity(&self, token: Retained<AnyObject>) {
        unsafe {
            let info: Retained<AnyObject> = msg_send![class!(NSProcessInfo), processInfo];
            let _: () = msg_send![&*info, endActivity: &*token];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_the_unit_number() {
        assert_eq!(monitor_key(2), MonitorKey("unit2".to_owned()));
    }

    #[test]
    fn unsafe_and_scaled_modes_are_skipped() {
        let valid = kDisplayModeValidFlag | kDisplayModeSafeFlag;
        assert!(mode_usable(valid));
        assert!(!mode_usable(kDisplayModeValidFlag));
        assert!(!mode_usable(valid | kDisplayModeInterlacedFlag));
        assert!(!mode_usable(valid | kDisplayModeStretchedFlag));
    }

    #[test]
    fn panels_without_a_rate_run_at_60() {
        assert_eq!(refresh_rate(0.), 60);
        assert_eq!(refresh_rate(59.94), 60);
        assert_eq!(refresh_rate(75.), 75);
    }
}
