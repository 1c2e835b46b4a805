//! Display enumeration and video modes through the GDI display device API.

use std::mem;
use std::ptr;
use super::winapi_utils::*;
use super::Win32Shared;
use crate::error::{self, Error, Result};
use crate::monitor::{split_bpp, VideoMode};
use crate::platform::{MonitorInfo, MonitorKey};
use crate::{Rect, Vec2};

/// Monitor keys are `adapter|display` device names; the adapter name is what the
/// settings functions take.
fn adapter_name(key: &MonitorKey) -> &str {
    key.0.split('|').next().unwrap_or("")
}

fn monitor_key(adapter: &str, display: Option<&str>) -> MonitorKey {
    match display {
        Some(display) => MonitorKey(format!("{}|{}", adapter, display)),
        None => MonitorKey(adapter.to_owned()),
    }
}

unsafe fn display_device(parent: LPCWSTR, index: DWORD) -> Option<DISPLAY_DEVICEW> {
    let mut dd: DISPLAY_DEVICEW = mem::zeroed();
    dd.cb = mem::size_of::<DISPLAY_DEVICEW>() as DWORD;
    if EnumDisplayDevicesW(parent, index, &mut dd, 0) == FALSE {
        return None;
    }
    Some(dd)
}

unsafe fn physical_size(adapter: &[WCHAR]) -> (i32, i32) {
    let driver = to_wide_with_nul("DISPLAY");
    let dc = CreateDCW(driver.as_ptr(), adapter.as_ptr(), ptr::null(), ptr::null());
    if dc.is_null() {
        return (0, 0);
    }
    let size = (GetDeviceCaps(dc, HORZSIZE), GetDeviceCaps(dc, VERTSIZE));
    DeleteDC(dc);
    size
}

fn mode_from_devmode(dm: &DEVMODEW) -> VideoMode {
    let (red_bits, green_bits, blue_bits) = split_bpp(dm.dmBitsPerPel as i32);
    VideoMode {
        width: dm.dmPelsWidth as i32,
        height: dm.dmPelsHeight as i32,
        red_bits,
        green_bits,
        blue_bits,
        refresh_rate: dm.dmDisplayFrequency as i32,
    }
}

/// Colour depth to ask the driver for. Anything outside 15..24 gets 32 bits.
fn devmode_bpp(mode: &VideoMode) -> DWORD {
    let bpp = mode.red_bits + mode.green_bits + mode.blue_bits;
    if bpp < 15 || bpp >= 24 { 32 } else { bpp as DWORD }
}

fn disp_change_description(code: LONG) -> &'static str {
    match code {
        DISP_CHANGE_BADDUALVIEW => "The system uses DualView",
        DISP_CHANGE_BADFLAGS => "Invalid flags",
        DISP_CHANGE_BADMODE => "Graphics mode not supported",
        DISP_CHANGE_BADPARAM => "Invalid parameter",
        DISP_CHANGE_FAILED => "Graphics mode failed",
        DISP_CHANGE_NOTUPDATED => "Failed to write to registry",
        DISP_CHANGE_RESTART => "Computer restart required",
        _ => "Unknown error",
    }
}

impl Win32Shared {
    pub(super) fn win32_poll_monitors(&self) -> Result<Vec<MonitorInfo>> {
        let mut monitors = Vec::new();
        unsafe {
            for adapter_index in 0.. {
                let adapter = match display_device(ptr::null(), adapter_index) {
                    Some(adapter) => adapter,
                    None => break,
                };
                if adapter.StateFlags & DISPLAY_DEVICE_ACTIVE == 0 {
                    continue;
                }
                let adapter_primary = adapter.StateFlags & DISPLAY_DEVICE_PRIMARY_DEVICE != 0;
                let adapter_name = from_wide(&adapter.DeviceName);
                let (width_mm, height_mm) = physical_size(&adapter.DeviceName);

                let mut found_display = false;
                for display_index in 0.. {
                    let display = match display_device(adapter.DeviceName.as_ptr(), display_index) {
                        Some(display) => display,
                        None => break,
                    };
                    if display.StateFlags & DISPLAY_DEVICE_ACTIVE == 0 {
                        continue;
                    }
                    found_display = true;
                    monitors.push(MonitorInfo {
                        key: monitor_key(&adapter_name, Some(&from_wide(&display.DeviceName))),
                        name: from_wide(&display.DeviceString),
                        width_mm,
                        height_mm,
                        primary: adapter_primary && display_index == 0,
                    });
                }
                // Some virtual adapters report no display devices.
                if !found_display {
                    monitors.push(MonitorInfo {
                        key: monitor_key(&adapter_name, None),
                        name: from_wide(&adapter.DeviceString),
                        width_mm,
                        height_mm,
                        primary: adapter_primary,
                    });
                }
            }
        }
        // Primary first; sort_by_key is stable.
        monitors.sort_by_key(|m| !m.primary);
        Ok(monitors)
    }

    unsafe fn current_settings(&self, key: &MonitorKey) -> Result<DEVMODEW> {
        let adapter = to_wide_with_nul(adapter_name(key));
        let mut dm: DEVMODEW = mem::zeroed();
        dm.dmSize = mem::size_of::<DEVMODEW>() as WORD;
        if EnumDisplaySettingsExW(adapter.as_ptr(), ENUM_CURRENT_SETTINGS, &mut dm, EDS_ROTATEDMODE) == FALSE {
            return error::failed(format!("Win32: Failed to query display settings of {}", adapter_name(key)));
        }
        Ok(dm)
    }

    pub(super) fn monitor_handle(&self, key: &MonitorKey) -> Result<HMONITOR> {
        unsafe {
            let dm = self.current_settings(key)?;
            let pos = dm.u1.s2().dmPosition;
            let rect = RECT {
                left: pos.x,
                top: pos.y,
                right: pos.x + dm.dmPelsWidth as LONG,
                bottom: pos.y + dm.dmPelsHeight as LONG,
            };
            Ok(MonitorFromRect(&rect, MONITOR_DEFAULTTONEAREST))
        }
    }

    pub(super) fn win32_monitor_pos(&self, key: &MonitorKey) -> Result<Vec2<i32>> {
        let dm = unsafe { self.current_settings(key)? };
        let pos = unsafe { dm.u1.s2().dmPosition };
        Ok(Vec2::new(pos.x, pos.y))
    }

    pub(super) fn win32_monitor_work_area(&self, key: &MonitorKey) -> Result<Rect<i32, i32>> {
        let handle = self.monitor_handle(key)?;
        unsafe {
            let mut mi: MONITORINFO = mem::zeroed();
            mi.cbSize = mem::size_of::<MONITORINFO>() as DWORD;
            if GetMonitorInfoW(handle, &mut mi) == FALSE {
                return Err(winapi_error("GetMonitorInfoW"));
            }
            let r = mi.rcWork;
            Ok(Rect::new(r.left, r.top, r.right - r.left, r.bottom - r.top))
        }
    }

    /// Effective DPI of `handle` over 96, falling back to the system DPI.
    pub(super) fn hmonitor_content_scale(&self, handle: HMONITOR) -> Vec2<f32> {
        let (mut xdpi, mut ydpi): (UINT, UINT) = (0, 0);
        let from_shcore = self.libs.shcore.as_ref().and_then(|s| s.GetDpiForMonitor).map_or(false, |f| unsafe {
            SUCCEEDED(f(handle, MDT_EFFECTIVE_DPI, &mut xdpi, &mut ydpi))
        });
        if !from_shcore {
            unsafe {
                let dc = GetDC(ptr::null_mut());
                xdpi = GetDeviceCaps(dc, LOGPIXELSX) as UINT;
                ydpi = GetDeviceCaps(dc, LOGPIXELSY) as UINT;
                ReleaseDC(ptr::null_mut(), dc);
            }
        }
        let scale = USER_DEFAULT_SCREEN_DPI as f32;
        Vec2::new(xdpi as f32 / scale, ydpi as f32 / scale)
    }

    pub(super) fn win32_monitor_content_scale(&self, key: &MonitorKey) -> Result<Vec2<f32>> {
        let handle = self.monitor_handle(key)?;
        Ok(self.hmonitor_content_scale(handle))
    }

    pub(super) fn win32_video_modes(&self, key: &MonitorKey) -> Result<Vec<VideoMode>> {
        let adapter = to_wide_with_nul(adapter_name(key));
        let mut modes: Vec<VideoMode> = Vec::new();
        unsafe {
            for index in 0.. {
                let mut dm: DEVMODEW = mem::zeroed();
                dm.dmSize = mem::size_of::<DEVMODEW>() as WORD;
                if EnumDisplaySettingsW(adapter.as_ptr(), index, &mut dm) == FALSE {
                    break;
                }
                if dm.dmBitsPerPel < 15 {
                    continue;
                }
                let mode = mode_from_devmode(&dm);
                if modes.contains(&mode) {
                    continue;
                }
                // Skip modes the driver lists but refuses.
                let test = ChangeDisplaySettingsExW(adapter.as_ptr(), &mut dm, ptr::null_mut(), CDS_TEST, ptr::null_mut());
                if test != DISP_CHANGE_SUCCESSFUL {
                    continue;
                }
                modes.push(mode);
            }
        }
        if modes.is_empty() {
            // Virtual adapters may enumerate nothing; offer the current mode.
            modes.push(self.win32_current_video_mode(key)?);
        }
        Ok(modes)
    }

    pub(super) fn win32_current_video_mode(&self, key: &MonitorKey) -> Result<VideoMode> {
        let dm = unsafe { self.current_settings(key)? };
        Ok(mode_from_devmode(&dm))
    }

    pub(super) fn win32_set_video_mode(&self, key: &MonitorKey, mode: &VideoMode) -> Result<()> {
        if self.win32_current_video_mode(key)? == *mode {
            return Ok(());
        }
        let adapter = to_wide_with_nul(adapter_name(key));
        let result = unsafe {
            let mut dm: DEVMODEW = mem::zeroed();
            dm.dmSize = mem::size_of::<DEVMODEW>() as WORD;
            dm.dmFields = DM_PELSWIDTH | DM_PELSHEIGHT | DM_BITSPERPEL | DM_DISPLAYFREQUENCY;
            dm.dmPelsWidth = mode.width as DWORD;
            dm.dmPelsHeight = mode.height as DWORD;
            dm.dmBitsPerPel = devmode_bpp(mode);
            dm.dmDisplayFrequency = mode.refresh_rate.max(0) as DWORD;
            ChangeDisplaySettingsExW(adapter.as_ptr(), &mut dm, ptr::null_mut(), CDS_FULLSCREEN, ptr::null_mut())
        };
        if result != DISP_CHANGE_SUCCESSFUL {
            return Err(Error::failed(format!("Win32: Failed to set video mode: {}", disp_change_description(result))));
        }
        self.changed_modes.borrow_mut().insert(adapter_name(key).to_owned());
        Ok(())
    }

    pub(super) fn win32_restore_video_mode(&self, key: &MonitorKey) -> Result<()> {
        if !self.changed_modes.borrow_mut().remove(adapter_name(key)) {
            return Ok(());
        }
        let adapter = to_wide_with_nul(adapter_name(key));
        let result = unsafe {
            ChangeDisplaySettingsExW(adapter.as_ptr(), ptr::null_mut(), ptr::null_mut(), CDS_FULLSCREEN, ptr::null_mut())
        };
        if result != DISP_CHANGE_SUCCESSFUL {
            return Err(Error::failed(format!("Win32: Failed to restore video mode: {}", disp_change_description(result))));
        }
        Ok(())
    }

    /// Puts back every mode changed since connecting.
    pub(super) fn restore_all_video_modes(&self) {
        let adapters: Vec<String> = self.changed_modes.borrow_mut().drain().collect();
        for adapter in adapters {
            let adapter = to_wide_with_nul(&adapter);
            unsafe {
                ChangeDisplaySettingsExW(adapter.as_ptr(), ptr::null_mut(), ptr::null_mut(), CDS_FULLSCREEN, ptr::null_mut());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(r: i32, g: i32, b: i32) -> VideoMode {
        VideoMode { width: 640, height: 480, red_bits: r, green_bits: g, blue_bits: b, refresh_rate: 60 }
    }

    #[test]
    fn keys_lead_with_the_adapter() {
        let key = monitor_key(r"\\.\DISPLAY1", Some(r"\\.\DISPLAY1\Monitor0"));
        assert_eq!(adapter_name(&key), r"\\.\DISPLAY1");
        assert_eq!(adapter_name(&monitor_key(r"\\.\DISPLAY2", None)), r"\\.\DISPLAY2");
    }

    #[test]
    fn requested_depth_is_clamped() {
        assert_eq!(devmode_bpp(&mode(5, 6, 5)), 16);
        assert_eq!(devmode_bpp(&mode(5, 5, 5)), 15);
        assert_eq!(devmode_bpp(&mode(8, 8, 8)), 32);
        assert_eq!(devmode_bpp(&mode(4, 4, 4)), 32);
    }
}
