//! A software "driver" that answers the queries context negotiation makes.
//!
//! It renders nothing. Entry points are real `extern "system"` functions that read
//! the context current on the calling thread.

use std::cell::{Cell, RefCell};
use std::ffi::CString;
use std::os::raw::c_void;
use std::ptr;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};
use crate::error::{self, Result};
use crate::gl::consts::*;
use crate::hint::{ClientApi, ContextConfig, ContextCreationApi, ContextReleaseBehavior, ContextRobustness, OpenGlProfile};
use crate::platform::{GlProc, PlatformContext};

const GL_MAJOR_VERSION: u32 = 0x821B;
const GL_MINOR_VERSION: u32 = 0x821C;

/// One refresh of the simulated display, at 60 Hz.
pub(crate) const VBLANK: Duration = Duration::from_nanos(16_666_667);

/// What the simulated GPU and its driver support.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverInfo {
    /// Highest desktop OpenGL version.
    pub gl_version: (i32, i32),
    /// Highest OpenGL ES version, if ES is supported at all.
    pub gles_version: Option<(i32, i32)>,
    /// Simulates a window system without the modern context creation extension.
    pub legacy_only: bool,
    /// The version legacy context creation yields.
    pub legacy_version: (i32, i32),
    /// Client API extensions (`GL_*`).
    pub extensions: Vec<String>,
    /// Window-system extensions, as WGL or GLX ones would be reported.
    pub platform_extensions: Vec<String>,
    /// Framebuffer configurations, in enumeration order.
    pub pixel_formats: Vec<PixelFormat>,
}

/// A framebuffer configuration the simulated driver offers.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct PixelFormat {
    pub red_bits: i32,
    pub green_bits: i32,
    pub blue_bits: i32,
    pub alpha_bits: i32,
    pub depth_bits: i32,
    pub stencil_bits: i32,
    pub samples: i32,
    pub srgb: bool,
    pub double_buffer: bool,
    pub stereo: bool,
    pub transparent: bool,
    pub accelerated: bool,
}

impl Default for PixelFormat {
    fn default() -> Self {
        Self {
            red_bits: 8,
            green_bits: 8,
            blue_bits: 8,
            alpha_bits: 8,
            depth_bits: 24,
            stencil_bits: 8,
            samples: 0,
            srgb: false,
            double_buffer: true,
            stereo: false,
            transparent: false,
            accelerated: true,
        }
    }
}

impl Default for DriverInfo {
    fn default() -> Self {
        let base = PixelFormat::default();
        Self {
            gl_version: (4, 6),
            gles_version: Some((3, 2)),
            legacy_only: false,
            legacy_version: (2, 1),
            extensions: [
                "GL_ARB_debug_output", "GL_ARB_framebuffer_sRGB", "GL_ARB_robustness",
                "GL_KHR_context_flush_control", "GL_KHR_no_error",
            ].iter().map(|s| s.to_string()).collect(),
            platform_extensions: vec!["NULL_EXT_swap_control".to_owned()],
            pixel_formats: vec![
                base,
                PixelFormat { srgb: true, ..base },
                PixelFormat { samples: 4, ..base },
                PixelFormat { red_bits: 5, green_bits: 6, blue_bits: 5, alpha_bits: 0, depth_bits: 16, stencil_bits: 0, ..base },
                PixelFormat { double_buffer: false, ..base },
                PixelFormat { transparent: true, ..base },
            ],
        }
    }
}

/// Everything a realized context answers, plus counters the simulator reads.
#[derive(Debug)]
pub(crate) struct GlState {
    version: CString,
    vendor: CString,
    renderer: CString,
    extensions: Vec<CString>,
    extension_string: CString,
    platform_extensions: Vec<String>,
    major: i32,
    minor: i32,
    flags: i32,
    profile_mask: i32,
    reset_strategy: i32,
    release_behavior: i32,
    pub swap_interval: Cell<i32>,
    pub swaps: Cell<u64>,
    pub clears: Cell<u64>,
    last_swap: Cell<Option<Instant>>,
}

thread_local! {
    static CURRENT: RefCell<Option<Rc<GlState>>> = RefCell::new(None);
}

fn with_current<T, F: FnOnce(&GlState) -> T>(default: T, f: F) -> T {
    CURRENT.with(|c| match c.borrow().as_ref() {
        Some(state) => f(state),
        None => default,
    })
}

unsafe extern "system" fn get_string(name: u32) -> *const u8 {
    with_current(ptr::null(), |s| {
        let string = match name {
            GL_VERSION => &s.version,
            GL_VENDOR => &s.vendor,
            GL_RENDERER => &s.renderer,
            GL_EXTENSIONS => &s.extension_string,
            _ => return ptr::null(),
        };
        string.as_ptr() as *const u8
    })
}

unsafe extern "system" fn get_stringi(name: u32, index: u32) -> *const u8 {
    with_current(ptr::null(), |s| {
        if name != GL_EXTENSIONS {
            return ptr::null();
        }
        s.extensions.get(index as usize).map_or(ptr::null(), |e| e.as_ptr() as *const u8)
    })
}

unsafe extern "system" fn get_integerv(name: u32, data: *mut i32) {
    if data.is_null() {
        return;
    }
    let value = with_current(None, |s| match name {
        GL_NUM_EXTENSIONS => Some(s.extensions.len() as i32),
        GL_MAJOR_VERSION => Some(s.major),
        GL_MINOR_VERSION => Some(s.minor),
        GL_CONTEXT_FLAGS => Some(s.flags),
        GL_CONTEXT_PROFILE_MASK => Some(s.profile_mask),
        GL_RESET_NOTIFICATION_STRATEGY_ARB => Some(s.reset_strategy),
        GL_CONTEXT_RELEASE_BEHAVIOR => Some(s.release_behavior),
        _ => None,
    });
    if let Some(value) = value {
        *data = value;
    }
}

unsafe extern "system" fn clear(_mask: u32) {
    with_current((), |s| s.clears.set(s.clears.get() + 1))
}

unsafe extern "system" fn flush() {}

/// Creates the state of a new context, negotiating the version as a real driver would.
pub(crate) fn realize(driver: &DriverInfo, ctxconfig: &ContextConfig) -> Result<GlState> {
    let source = ContextCreationApi::from_raw(ctxconfig.source).unwrap_or(ContextCreationApi::Native);
    if source != ContextCreationApi::Native {
        return error::api_unavailable(format!("{:?} is not available on the Null platform", source));
    }
    let client = ClientApi::from_raw(ctxconfig.client).unwrap_or(ClientApi::NoApi);
    let profile = OpenGlProfile::from_raw(ctxconfig.profile).unwrap_or(OpenGlProfile::Any);
    let requested = (ctxconfig.major, ctxconfig.minor);
    let has_ext = |name: &str| driver.extensions.iter().any(|e| e == name);

    let (major, minor) = match client {
        ClientApi::OpenGlEs => {
            let max = driver.gles_version.ok_or_else(|| crate::error::Error::api_unavailable("OpenGL ES is not supported by the driver"))?;
            if requested > max {
                return error::version_unavailable(format!("OpenGL ES {}.{} is not supported by the driver", requested.0, requested.1));
            }
            requested
        },
        _ => {
            if driver.legacy_only {
                if ctxconfig.forward {
                    return error::version_unavailable("A forward compatible OpenGL context requested but the modern creation path is unavailable");
                }
                if profile != OpenGlProfile::Any {
                    return error::version_unavailable("OpenGL profile requested but the modern creation path is unavailable");
                }
                driver.legacy_version
            } else {
                if requested > driver.gl_version {
                    return error::version_unavailable(format!("OpenGL {}.{} is not supported by the driver", requested.0, requested.1));
                }
                if profile == OpenGlProfile::Core || ctxconfig.forward { requested } else { driver.gl_version }
            }
        },
    };

    let mut flags = 0;
    if ctxconfig.forward && major >= 3 {
        flags |= GL_CONTEXT_FLAG_FORWARD_COMPATIBLE_BIT;
    }
    if ctxconfig.debug {
        flags |= GL_CONTEXT_FLAG_DEBUG_BIT;
    }
    if ctxconfig.no_error && has_ext("GL_KHR_no_error") {
        flags |= GL_CONTEXT_FLAG_NO_ERROR_BIT_KHR;
    }

    let profile_mask = match client {
        ClientApi::OpenGl if (major, minor) >= (3, 2) => match profile {
            OpenGlProfile::Core => GL_CONTEXT_CORE_PROFILE_BIT,
            _ if ctxconfig.forward => GL_CONTEXT_CORE_PROFILE_BIT,
            _ => GL_CONTEXT_COMPATIBILITY_PROFILE_BIT,
        },
        _ => 0,
    };

    let reset_strategy = match ContextRobustness::from_raw(ctxconfig.robustness) {
        Some(ContextRobustness::LoseContextOnReset) if !driver.legacy_only => GL_LOSE_CONTEXT_ON_RESET_ARB,
        _ => GL_NO_RESET_NOTIFICATION_ARB,
    };
    let release_behavior = match ContextReleaseBehavior::from_raw(ctxconfig.release) {
        Some(ContextReleaseBehavior::None) if !driver.legacy_only => GL_NONE,
        _ => GL_CONTEXT_RELEASE_BEHAVIOR_FLUSH,
    };

    let version = match client {
        ClientApi::OpenGlEs => format!("OpenGL ES {}.{} Null", major, minor),
        _ => format!("{}.{}.0 Null", major, minor),
    };
    let cstring = |s: &str| CString::new(s).map_err(|_| crate::error::Error::failed("Interior NUL in driver string"));
    let extensions = driver.extensions.iter().map(|e| cstring(e)).collect::<Result<Vec<_>>>()?;
    Ok(GlState {
        version: cstring(&version)?,
        vendor: cstring("winpal")?,
        renderer: cstring("Null software rasterizer")?,
        extension_string: cstring(&driver.extensions.join(" "))?,
        extensions,
        platform_extensions: driver.platform_extensions.clone(),
        major,
        minor,
        flags,
        profile_mask,
        reset_strategy,
        release_behavior,
        swap_interval: Cell::new(0),
        swaps: Cell::new(0),
        clears: Cell::new(0),
        last_swap: Cell::new(None),
    })
}

pub(crate) struct NullContext {
    pub state: Rc<GlState>,
}

impl NullContext {
    fn is_current(&self) -> bool {
        CURRENT.with(|c| c.borrow().as_ref().map_or(false, |s| Rc::ptr_eq(s, &self.state)))
    }
}

impl Drop for NullContext {
    fn drop(&mut self) {
        if self.is_current() {
            CURRENT.with(|c| c.borrow_mut().take());
        }
    }
}

impl PlatformContext for NullContext {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn make_current(&self, current: bool) -> Result<()> {
        CURRENT.with(|c| {
            let mut c = c.borrow_mut();
            if current {
                *c = Some(self.state.clone());
            } else if c.as_ref().map_or(false, |s| Rc::ptr_eq(s, &self.state)) {
                *c = None;
            }
        });
        Ok(())
    }
    /// With a non-zero interval, waits until that many vertical blanks have
    /// passed since the previous swap. Negative (adaptive) intervals count as positive.
    fn swap_buffers(&self) -> Result<()> {
        let interval = self.state.swap_interval.get().abs() as u32;
        match self.state.last_swap.get() {
            Some(last) if interval > 0 => {
                let due = last + VBLANK * interval;
                let now = Instant::now();
                if due > now {
                    thread::sleep(due - now);
                }
            },
            _ => (),
        }
        self.state.last_swap.set(Some(Instant::now()));
        self.state.swaps.set(self.state.swaps.get() + 1);
        Ok(())
    }
    fn swap_interval(&self, interval: i32) -> Result<()> {
        self.state.swap_interval.set(interval);
        Ok(())
    }
    fn extension_supported(&self, name: &str) -> bool {
        self.state.platform_extensions.iter().any(|e| e == name)
    }
    fn get_proc_address(&self, name: &str) -> GlProc {
        let f = match name {
            "glGetString" => get_string as usize,
            "glGetStringi" if self.state.major >= 3 => get_stringi as usize,
            "glGetIntegerv" => get_integerv as usize,
            "glClear" => clear as usize,
            "glFlush" => flush as usize,
            _ => return ptr::null(),
        };
        f as *const c_void
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gl(major: i32, minor: i32) -> ContextConfig {
        ContextConfig { client: ClientApi::OpenGl.raw(), major, minor, ..ContextConfig::default() }
    }

    #[test]
    fn compat_requests_get_the_highest_version() {
        let s = realize(&DriverInfo::default(), &gl(2, 1)).unwrap();
        assert_eq!((s.major, s.minor), (4, 6));
        assert_eq!(s.profile_mask, GL_CONTEXT_COMPATIBILITY_PROFILE_BIT);
    }

    #[test]
    fn core_requests_get_what_they_ask() {
        let cfg = ContextConfig { profile: OpenGlProfile::Core.raw(), forward: true, ..gl(3, 3) };
        let s = realize(&DriverInfo::default(), &cfg).unwrap();
        assert_eq!((s.major, s.minor), (3, 3));
        assert_eq!(s.profile_mask, GL_CONTEXT_CORE_PROFILE_BIT);
        assert_ne!(s.flags & GL_CONTEXT_FLAG_FORWARD_COMPATIBLE_BIT, 0);
    }

    #[test]
    fn unsupported_requests_fail() {
        let driver = DriverInfo { gles_version: None, ..DriverInfo::default() };
        assert!(realize(&driver, &gl(4, 7)).is_err());
        let es = ContextConfig { client: ClientApi::OpenGlEs.raw(), major: 2, ..ContextConfig::default() };
        assert_eq!(realize(&driver, &es).unwrap_err().kind, crate::error::ErrorKind::ApiUnavailable);
        let egl = ContextConfig { source: ContextCreationApi::Egl.raw(), ..gl(3, 3) };
        assert_eq!(realize(&DriverInfo::default(), &egl).unwrap_err().kind, crate::error::ErrorKind::ApiUnavailable);
    }

    #[test]
    fn legacy_driver_realizes_its_only_version() {
        let driver = DriverInfo { legacy_only: true, ..DriverInfo::default() };
        let s = realize(&driver, &gl(3, 3)).unwrap();
        assert_eq!((s.major, s.minor), (2, 1));
        let core = ContextConfig { profile: OpenGlProfile::Core.raw(), ..gl(3, 3) };
        assert_eq!(realize(&driver, &core).unwrap_err().kind, crate::error::ErrorKind::VersionUnavailable);
    }

    #[test]
    fn entry_points_read_the_current_context() {
        let ctx = NullContext { state: Rc::new(realize(&DriverInfo::default(), &gl(3, 0)).unwrap()) };
        unsafe {
            assert!(get_string(GL_VERSION).is_null());
            ctx.make_current(true).unwrap();
            let v = std::ffi::CStr::from_ptr(get_string(GL_VERSION) as *const _);
            assert_eq!(v.to_str().unwrap(), "4.6.0 Null");
            let mut n = 0;
            get_integerv(GL_NUM_EXTENSIONS, &mut n);
            assert_eq!(n, DriverInfo::default().extensions.len() as i32);
            clear(GL_COLOR_BUFFER_BIT);
            ctx.make_current(false).unwrap();
            clear(GL_COLOR_BUFFER_BIT);
        }
        assert_eq!(ctx.state.clears.get(), 1);
        assert!(!ctx.get_proc_address("glClear").is_null());
        assert!(ctx.get_proc_address("glDrawArrays").is_null());
    }

    #[test]
    fn swaps_wait_for_the_interval() {
        let ctx = NullContext { state: Rc::new(realize(&DriverInfo::default(), &gl(3, 0)).unwrap()) };
        ctx.swap_interval(2).unwrap();
        let start = Instant::now();
        for _ in 0..4 {
            ctx.swap_buffers().unwrap();
        }
        // The first swap has nothing to wait for.
        assert!(start.elapsed() >= VBLANK * 6);
        assert_eq!(ctx.state.swaps.get(), 4);
    }
}
