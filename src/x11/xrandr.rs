//! Monitors through RandR 1.3, with a whole-screen fallback.

use std::ffi::CStr;
use std::os::raw::{c_int, c_ulong};
use x11_dl::xlib as x;
use x11_dl::xrandr::{self as rr, Xrandr};
use super::missing_bits::xlib::XA_CARDINAL;
use super::missing_bits::xrandr::*;
use super::prop;
use super::X11Platform;
use crate::error::{self, Error, Result};
use crate::monitor::{split_bpp, VideoMode};
use crate::platform::{MonitorInfo, MonitorKey};
use crate::{Rect, Vec2};

pub struct XRandR {
    pub lib: Xrandr,
    pub event_base: c_int,
    pub error_base: c_int,
    pub major_version: c_int,
    pub minor_version: c_int,
    /// Some drivers report RandR but no usable outputs or gamma.
    pub monitors_broken: bool,
}

impl XRandR {
    pub unsafe fn query(x_display: *mut x::Display, root: x::Window) -> Result<Self> {
        let lib = Xrandr::open().map_err(|e| Error::failed(format!("Failed to load libXrandr: {}", e)))?;
        let (mut event_base, mut error_base) = (0, 0);
        if (lib.XRRQueryExtension)(x_display, &mut event_base, &mut error_base) == x::False {
            return error::failed("X server lacks the RandR extension");
        }
        let (mut major_version, mut minor_version) = (0, 0);
        if (lib.XRRQueryVersion)(x_display, &mut major_version, &mut minor_version) == 0 {
            return error::failed("Failed to query RandR version");
        }
        if (major_version, minor_version) < (1, 3) {
            return error::failed(format!("RandR 1.3 is required, found {}.{}", major_version, minor_version));
        }
        let sr = (lib.XRRGetScreenResourcesCurrent)(x_display, root);
        let monitors_broken = sr.is_null() || (*sr).ncrtc == 0;
        if !sr.is_null() {
            (lib.XRRFreeScreenResources)(sr);
        }
        if monitors_broken {
            warn!("RandR reports no CRTCs, falling back to the core screen");
        } else {
            (lib.XRRSelectInput)(x_display, root, RROutputChangeNotifyMask);
        }
        Ok(Self { lib, event_base, error_base, major_version, minor_version, monitors_broken })
    }
}

const SCREEN_KEY: &str = "x11-screen";

fn output_of(key: &MonitorKey) -> Option<rr::RROutput> {
    key.0.strip_prefix("randr-").and_then(|s| s.parse().ok())
}

/// Refresh rate of a mode, or 0 when it can't be computed.
pub(crate) fn mode_refresh_rate(mi: &rr::XRRModeInfo) -> i32 {
    if mi.hTotal == 0 || mi.vTotal == 0 {
        return 0;
    }
    (mi.dotClock as f64 / (mi.hTotal as f64 * mi.vTotal as f64)).round() as i32
}

/// Extracts `Xft.dpi` from the resource manager string.
pub(crate) fn parse_xft_dpi(resources: &str) -> Option<f32> {
    resources.lines()
        .filter_map(|line| line.strip_prefix("Xft.dpi:"))
        .filter_map(|value| value.trim().parse::<f32>().ok())
        .next()
}

/// RAII over the per-query RandR structures.
struct Resources<'a> {
    randr: &'a XRandR,
    sr: *mut rr::XRRScreenResources,
}

impl<'a> Drop for Resources<'a> {
    fn drop(&mut self) {
        unsafe {
            (self.randr.lib.XRRFreeScreenResources)(self.sr);
        }
    }
}

impl<'a> Resources<'a> {
    fn outputs(&self) -> &[rr::RROutput] {
        unsafe { std::slice::from_raw_parts((*self.sr).outputs, (*self.sr).noutput as usize) }
    }
    fn modes(&self) -> &[rr::XRRModeInfo] {
        unsafe { std::slice::from_raw_parts((*self.sr).modes, (*self.sr).nmode as usize) }
    }
    fn mode_info(&self, id: rr::RRMode) -> Option<&rr::XRRModeInfo> {
        self.modes().iter().find(|m| m.id == id)
    }
}

impl X11Platform {
    fn randr(&self) -> Option<&XRandR> {
        self.randr.as_ref().filter(|r| !r.monitors_broken)
    }

    unsafe fn resources<'a>(&self, randr: &'a XRandR) -> Result<Resources<'a>> {
        let sr = (randr.lib.XRRGetScreenResourcesCurrent)(self.x_display, self.root);
        if sr.is_null() {
            return error::failed("XRRGetScreenResourcesCurrent() failed");
        }
        Ok(Resources { randr, sr })
    }

    /// Runs `f` with the output's info and its CRTC info, both freed afterwards.
    unsafe fn with_output<T, F>(&self, key: &MonitorKey, f: F) -> Result<T>
        where F: FnOnce(&XRandR, &Resources, &rr::XRROutputInfo, &rr::XRRCrtcInfo, rr::RRCrtc) -> Result<T>
    {
        let randr = self.randr().ok_or_else(|| Error::failed("RandR is unavailable"))?;
        let output = output_of(key).ok_or_else(|| Error::failed(format!("Unknown monitor {:?}", key)))?;
        let res = self.resources(randr)?;
        let oi = (randr.lib.XRRGetOutputInfo)(self.x_display, res.sr, output);
        if oi.is_null() {
            return error::failed(format!("Monitor {:?} has gone away", key));
        }
        let crtc = (*oi).crtc;
        let ci = (randr.lib.XRRGetCrtcInfo)(self.x_display, res.sr, crtc);
        let out = if ci.is_null() {
            error::failed(format!("Monitor {:?} is not active", key))
        } else {
            let out = f(randr, &res, &*oi, &*ci, crtc);
            (randr.lib.XRRFreeCrtcInfo)(ci);
            out
        };
        (randr.lib.XRRFreeOutputInfo)(oi);
        out
    }

    fn video_mode_from(&self, mi: &rr::XRRModeInfo, rotation: u16) -> VideoMode {
        let (red_bits, green_bits, blue_bits) = split_bpp(self.depth);
        let (width, height) = if rotation == RR_Rotate_90 || rotation == RR_Rotate_270 {
            (mi.height as i32, mi.width as i32)
        } else {
            (mi.width as i32, mi.height as i32)
        };
        VideoMode { width, height, red_bits, green_bits, blue_bits, refresh_rate: mode_refresh_rate(mi) }
    }

    fn screen_mode(&self) -> VideoMode {
        let (red_bits, green_bits, blue_bits) = split_bpp(self.depth);
        unsafe {
            VideoMode {
                width: (self.xlib.XDisplayWidth)(self.x_display, self.screen),
                height: (self.xlib.XDisplayHeight)(self.x_display, self.screen),
                red_bits, green_bits, blue_bits,
                refresh_rate: 0,
            }
        }
    }

    pub(super) fn randr_poll_monitors(&self) -> Result<Vec<MonitorInfo>> {
        let randr = match self.randr() {
            Some(randr) => randr,
            None => unsafe {
                return Ok(vec![MonitorInfo {
                    key: MonitorKey(SCREEN_KEY.to_owned()),
                    name: "Display".to_owned(),
                    width_mm: (self.xlib.XDisplayWidthMM)(self.x_display, self.screen),
                    height_mm: (self.xlib.XDisplayHeightMM)(self.x_display, self.screen),
                    primary: true,
                }]);
            },
        };
        let mut monitors = Vec::new();
        unsafe {
            let res = self.resources(randr)?;
            let primary = (randr.lib.XRRGetOutputPrimary)(self.x_display, self.root);
            for &output in res.outputs() {
                let oi = (randr.lib.XRRGetOutputInfo)(self.x_display, res.sr, output);
                if oi.is_null() {
                    continue;
                }
                let info = &*oi;
                if info.connection == RR_Connected && info.crtc != 0 {
                    let ci = (randr.lib.XRRGetCrtcInfo)(self.x_display, res.sr, info.crtc);
                    if !ci.is_null() {
                        let (mut width_mm, mut height_mm) = (info.mm_width as i32, info.mm_height as i32);
                        if (*ci).rotation == RR_Rotate_90 || (*ci).rotation == RR_Rotate_270 {
                            std::mem::swap(&mut width_mm, &mut height_mm);
                        }
                        let name_bytes = std::slice::from_raw_parts(info.name as *const u8, info.nameLen as usize);
                        let monitor = MonitorInfo {
                            key: MonitorKey(format!("randr-{}", output)),
                            name: String::from_utf8_lossy(name_bytes).into_owned(),
                            width_mm,
                            height_mm,
                            primary: output == primary,
                        };
                        // The primary monitor goes first.
                        if monitor.primary {
                            monitors.insert(0, monitor);
                        } else {
                            monitors.push(monitor);
                        }
                        (randr.lib.XRRFreeCrtcInfo)(ci);
                    }
                }
                (randr.lib.XRRFreeOutputInfo)(oi);
            }
        }
        if monitors.is_empty() {
            warn!("RandR found no connected and active outputs");
        }
        Ok(monitors)
    }

    pub(super) fn randr_monitor_pos(&self, key: &MonitorKey) -> Result<Vec2<i32>> {
        if key.0 == SCREEN_KEY {
            return Ok(Vec2::zero());
        }
        unsafe { self.with_output(key, |_, _, _, ci, _| Ok(Vec2::new(ci.x, ci.y))) }
    }

    pub(super) fn randr_current_video_mode(&self, key: &MonitorKey) -> Result<VideoMode> {
        if key.0 == SCREEN_KEY {
            return Ok(self.screen_mode());
        }
        unsafe {
            self.with_output(key, |_, res, _, ci, _| {
                let mi = res.mode_info(ci.mode).ok_or_else(|| Error::failed("Current RandR mode not found"))?;
                Ok(self.video_mode_from(mi, ci.rotation))
            })
        }
    }

    pub(super) fn randr_video_modes(&self, key: &MonitorKey) -> Result<Vec<VideoMode>> {
        if key.0 == SCREEN_KEY {
            return Ok(vec![self.screen_mode()]);
        }
        unsafe {
            self.with_output(key, |_, res, oi, ci, _| {
                let ids = std::slice::from_raw_parts(oi.modes, oi.nmode as usize);
                Ok(ids.iter()
                    .filter_map(|id| res.mode_info(*id))
                    .filter(|mi| mi.modeFlags & RR_Interlace == 0)
                    .map(|mi| self.video_mode_from(mi, ci.rotation))
                    .collect())
            })
        }
    }

    pub(super) fn randr_monitor_work_area(&self, key: &MonitorKey) -> Result<Rect<i32, i32>> {
        let pos = self.randr_monitor_pos(key)?;
        let mode = self.randr_current_video_mode(key)?;
        let mut area = Rect::new(pos.x, pos.y, mode.width, mode.height);

        unsafe {
            let workarea = prop::get::<c_ulong>(&self.xlib, self.x_display, self.root, self.atoms._NET_WORKAREA, XA_CARDINAL)?;
            let desktop = prop::get::<c_ulong>(&self.xlib, self.x_display, self.root, self.atoms._NET_CURRENT_DESKTOP, XA_CARDINAL)?;
            if let (Some(workarea), Some(desktop)) = (workarea, desktop) {
                let i = desktop.data.first().map_or(0, |d| *d as usize);
                if let Some(w) = workarea.data.get(i * 4..i * 4 + 4) {
                    let (wx, wy, ww, wh) = (w[0] as i32, w[1] as i32, w[2] as i32, w[3] as i32);
                    let x0 = area.x.max(wx);
                    let y0 = area.y.max(wy);
                    let x1 = (area.x + area.w).min(wx + ww);
                    let y1 = (area.y + area.h).min(wy + wh);
                    area = Rect::new(x0, y0, (x1 - x0).max(0), (y1 - y0).max(0));
                }
            }
        }
        Ok(area)
    }

    /// Both axes share the `Xft.dpi` resource; X has no per-monitor scale.
    pub(super) fn randr_monitor_content_scale(&self, _key: &MonitorKey) -> Result<Vec2<f32>> {
        Ok(self.content_scale)
    }

    pub(super) fn randr_set_video_mode(&self, key: &MonitorKey, mode: &VideoMode) -> Result<()> {
        unsafe {
            self.with_output(key, |randr, res, oi, ci, crtc| {
                let ids = std::slice::from_raw_parts(oi.modes, oi.nmode as usize);
                let native = ids.iter()
                    .filter_map(|id| res.mode_info(*id))
                    .filter(|mi| mi.modeFlags & RR_Interlace == 0)
                    .find(|mi| self.video_mode_from(mi, ci.rotation) == *mode)
                    .map(|mi| mi.id)
                    .ok_or_else(|| Error::failed(format!("No RandR mode matches {:?}", mode)))?;
                if native == ci.mode {
                    return Ok(());
                }
                self.old_modes.borrow_mut().entry(crtc).or_insert(ci.mode);
                debug!("Setting RandR mode {} on CRTC {}", native, crtc);
                let status = (randr.lib.XRRSetCrtcConfig)(
                    self.x_display, res.sr, crtc, x::CurrentTime,
                    ci.x, ci.y, native, ci.rotation, ci.outputs, ci.noutput
                );
                if status != 0 {
                    return error::failed(format!("XRRSetCrtcConfig() returned {}", status));
                }
                Ok(())
            })
        }
    }

    pub(super) fn randr_restore_video_mode(&self, key: &MonitorKey, original: &VideoMode) -> Result<()> {
        if key.0 == SCREEN_KEY {
            return Ok(());
        }
        unsafe {
            self.with_output(key, |randr, res, _, ci, crtc| {
                let old = match self.old_modes.borrow_mut().remove(&crtc) {
                    Some(old) => old,
                    None => {
                        trace!("CRTC {} still has its original mode {:?}", crtc, original);
                        return Ok(());
                    },
                };
                (randr.lib.XRRSetCrtcConfig)(
                    self.x_display, res.sr, crtc, x::CurrentTime,
                    ci.x, ci.y, old, ci.rotation, ci.outputs, ci.noutput
                );
                Ok(())
            })
        }
    }
}

/// Reads the scale from `Xft.dpi`, defaulting to 1.
pub(crate) unsafe fn query_content_scale(xlib: &x::Xlib, x_display: *mut x::Display) -> Vec2<f32> {
    let rms = (xlib.XResourceManagerString)(x_display);
    if rms.is_null() {
        return Vec2::one();
    }
    let resources = CStr::from_ptr(rms).to_string_lossy();
    match parse_xft_dpi(&resources) {
        Some(dpi) if dpi > 0. => Vec2::broadcast(dpi / 96.),
        _ => Vec2::one(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xft_dpi_is_found_among_other_resources() {
        let resources = "Xcursor.size:\t24\nXft.antialias:\t1\nXft.dpi:\t144\n";
        assert_eq!(parse_xft_dpi(resources), Some(144.));
        assert_eq!(parse_xft_dpi("Xft.hinting: 1\n"), None);
    }

    #[test]
    fn refresh_rate_rounds_dot_clock() {
        let mut mi: rr::XRRModeInfo = unsafe { std::mem::zeroed() };
        mi.dotClock = 148_500_000;
        mi.hTotal = 2200;
        mi.vTotal = 1125;
        assert_eq!(mode_refresh_rate(&mi), 60);
        mi.vTotal = 0;
        assert_eq!(mode_refresh_rate(&mi), 0);
    }

    #[test]
    fn monitor_keys_carry_the_output() {
        assert_eq!(output_of(&MonitorKey("randr-66".to_owned())), Some(66));
        assert_eq!(output_of(&MonitorKey(SCREEN_KEY.to_owned())), None);
    }
}
