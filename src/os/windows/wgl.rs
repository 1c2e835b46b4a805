//! WGL: pixel formats and OpenGL contexts on Win32.

use std::any::Any;
use std::cell::Cell;
use std::ffi::{CStr, CString};
use std::mem;
use std::ptr;
use std::rc::Rc;
use super::dl::{Libs, Opengl32};
use super::winapi_utils::*;
use self::consts::*;
use crate::error::{self, Error, Result};
use crate::hint::{ClientApi, ContextConfig, ContextCreationApi, ContextReleaseBehavior, ContextRobustness, FramebufferConfig, OpenGlProfile};
use crate::platform::{FbCandidate, GlProc, PlatformContext};

#[allow(dead_code)]
pub mod consts {
    use std::os::raw::c_int;

    pub const WGL_NUMBER_PIXEL_FORMATS_ARB: c_int = 0x2000;
    pub const WGL_DRAW_TO_WINDOW_ARB: c_int = 0x2001;
    pub const WGL_ACCELERATION_ARB: c_int = 0x2003;
    pub const WGL_SUPPORT_OPENGL_ARB: c_int = 0x2010;
    pub const WGL_DOUBLE_BUFFER_ARB: c_int = 0x2011;
    pub const WGL_STEREO_ARB: c_int = 0x2012;
    pub const WGL_PIXEL_TYPE_ARB: c_int = 0x2013;
    pub const WGL_RED_BITS_ARB: c_int = 0x2015;
    pub const WGL_GREEN_BITS_ARB: c_int = 0x2017;
    pub const WGL_BLUE_BITS_ARB: c_int = 0x2019;
    pub const WGL_ALPHA_BITS_ARB: c_int = 0x201B;
    pub const WGL_ACCUM_RED_BITS_ARB: c_int = 0x201E;
    pub const WGL_ACCUM_GREEN_BITS_ARB: c_int = 0x201F;
    pub const WGL_ACCUM_BLUE_BITS_ARB: c_int = 0x2020;
    pub const WGL_ACCUM_ALPHA_BITS_ARB: c_int = 0x2021;
    pub const WGL_DEPTH_BITS_ARB: c_int = 0x2022;
    pub const WGL_STENCIL_BITS_ARB: c_int = 0x2023;
    pub const WGL_AUX_BUFFERS_ARB: c_int = 0x2024;
    pub const WGL_NO_ACCELERATION_ARB: c_int = 0x2025;
    pub const WGL_TYPE_RGBA_ARB: c_int = 0x202B;
    pub const WGL_SAMPLES_ARB: c_int = 0x2042;
    pub const WGL_FRAMEBUFFER_SRGB_CAPABLE_ARB: c_int = 0x20A9;

    pub const WGL_CONTEXT_DEBUG_BIT_ARB: c_int = 0x0001;
    pub const WGL_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB: c_int = 0x0002;
    pub const WGL_CONTEXT_ROBUST_ACCESS_BIT_ARB: c_int = 0x0004;
    pub const WGL_CONTEXT_MAJOR_VERSION_ARB: c_int = 0x2091;
    pub const WGL_CONTEXT_MINOR_VERSION_ARB: c_int = 0x2092;
    pub const WGL_CONTEXT_FLAGS_ARB: c_int = 0x2094;
    pub const WGL_CONTEXT_PROFILE_MASK_ARB: c_int = 0x9126;
    pub const WGL_CONTEXT_CORE_PROFILE_BIT_ARB: c_int = 0x0001;
    pub const WGL_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB: c_int = 0x0002;
    pub const WGL_CONTEXT_ES2_PROFILE_BIT_EXT: c_int = 0x0004;
    pub const WGL_CONTEXT_RESET_NOTIFICATION_STRATEGY_ARB: c_int = 0x8256;
    pub const WGL_NO_RESET_NOTIFICATION_ARB: c_int = 0x8261;
    pub const WGL_LOSE_CONTEXT_ON_RESET_ARB: c_int = 0x8252;
    pub const WGL_CONTEXT_RELEASE_BEHAVIOR_ARB: c_int = 0x2097;
    pub const WGL_CONTEXT_RELEASE_BEHAVIOR_NONE_ARB: c_int = 0;
    pub const WGL_CONTEXT_RELEASE_BEHAVIOR_FLUSH_ARB: c_int = 0x2098;
    pub const WGL_CONTEXT_OPENGL_NO_ERROR_ARB: c_int = 0x31B3;

    pub const ERROR_INVALID_VERSION_ARB: u32 = 0xC007_2095;
    pub const ERROR_INVALID_PROFILE_ARB: u32 = 0xC007_2096;
    pub const ERROR_INCOMPATIBLE_DEVICE_CONTEXTS_ARB: u32 = 0xC007_2054;
}

pub mod fn_types {
    #![allow(non_camel_case_types)]

    use std::os::raw::{c_char, c_int};
    use winapi::shared::minwindef::{BOOL, UINT};
    use winapi::shared::windef::{HDC, HGLRC};

    pub type wglGetExtensionsStringARB = unsafe extern "system" fn(HDC) -> *const c_char;
    pub type wglGetExtensionsStringEXT = unsafe extern "system" fn() -> *const c_char;
    pub type wglCreateContextAttribsARB = unsafe extern "system" fn(HDC, HGLRC, *const c_int) -> HGLRC;
    pub type wglGetPixelFormatAttribivARB = unsafe extern "system" fn(HDC, c_int, c_int, UINT, *const c_int, *mut c_int) -> BOOL;
    pub type wglSwapIntervalEXT = unsafe extern "system" fn(c_int) -> BOOL;
}

macro_rules! wgl_ext {
    (($($name:ident)+) ($($func:ident)+)) => {
        #[allow(non_snake_case)]
        #[derive(Copy, Clone, Default)]
        pub struct WglExt {
            $(pub $name: bool,)+
            $(pub $func: Option<fn_types::$func>,)+
        }
        impl WglExt {
            #[allow(non_snake_case)]
            unsafe fn load(gl: &Opengl32) -> Self {
                let mut out = Self::default();
                $(
                    let name = concat!(stringify!($func), "\0");
                    let f = (gl.wglGetProcAddress)(name.as_ptr() as *const c_char);
                    out.$func = if f.is_null() { None } else { Some(mem::transmute(f)) };
                )+
                out
            }
            #[allow(non_snake_case)]
            fn parse(&mut self, extensions: &str) {
                for name in extensions.split_whitespace() {
                    match name {
                        $(stringify!($name) => {
                            self.$name = true;
                            debug!("Found WGL extension {}", stringify!($name));
                        },)+
                        _ => {}
                    };
                }
            }
        }
    }
}

wgl_ext!((
    WGL_ARB_multisample
    WGL_ARB_framebuffer_sRGB
    WGL_EXT_framebuffer_sRGB
    WGL_ARB_pixel_format
    WGL_EXT_swap_control
    WGL_ARB_create_context
    WGL_ARB_create_context_profile
    WGL_ARB_create_context_robustness
    WGL_ARB_create_context_no_error
    WGL_ARB_context_flush_control
    WGL_EXT_create_context_es2_profile
    )(
    wglGetExtensionsStringARB
    wglGetExtensionsStringEXT
    wglCreateContextAttribsARB
    wglGetPixelFormatAttribivARB
    wglSwapIntervalEXT
));

/// opengl32.dll and the extensions of the installed driver.
pub struct Wgl {
    gl: Opengl32,
    extensions: String,
    ext: WglExt,
}

unsafe fn basic_pfd() -> PIXELFORMATDESCRIPTOR {
    let mut pfd: PIXELFORMATDESCRIPTOR = mem::zeroed();
    pfd.nSize = mem::size_of::<PIXELFORMATDESCRIPTOR>() as _;
    pfd.nVersion = 1;
    pfd.dwFlags = PFD_DRAW_TO_WINDOW | PFD_SUPPORT_OPENGL | PFD_DOUBLEBUFFER;
    pfd.iPixelType = PFD_TYPE_RGBA;
    pfd.cColorBits = 24;
    pfd
}

impl Wgl {
    /// Loads extension entry points through a legacy context on `dc`, which gets a
    /// pixel format for good.
    pub unsafe fn load(dc: HDC) -> Result<Self> {
        let gl = Opengl32::open()?;

        let pfd = basic_pfd();
        let format = ChoosePixelFormat(dc, &pfd);
        if format == 0 || SetPixelFormat(dc, format, &pfd) == FALSE {
            return error::api_unavailable("WGL: Failed to set pixel format for dummy context");
        }
        let rc = (gl.wglCreateContext)(dc);
        if rc.is_null() {
            return error::api_unavailable("WGL: Failed to create dummy context");
        }
        let (prev_dc, prev_rc) = ((gl.wglGetCurrentDC)(), (gl.wglGetCurrentContext)());
        if (gl.wglMakeCurrent)(dc, rc) == FALSE {
            (gl.wglMakeCurrent)(prev_dc, prev_rc);
            (gl.wglDeleteContext)(rc);
            return error::api_unavailable("WGL: Failed to make dummy context current");
        }

        let mut ext = WglExt::load(&gl);
        let extensions = {
            let p = match (ext.wglGetExtensionsStringARB, ext.wglGetExtensionsStringEXT) {
                (Some(f), _) => f(dc),
                (None, Some(f)) => f(),
                (None, None) => ptr::null(),
            };
            if p.is_null() { String::new() } else { CStr::from_ptr(p).to_string_lossy().into_owned() }
        };
        ext.parse(&extensions);

        (gl.wglMakeCurrent)(prev_dc, prev_rc);
        (gl.wglDeleteContext)(rc);

        Ok(Self { gl, extensions, ext })
    }

    /// Picks the pixel format of `dc` closest to `desired`.
    pub unsafe fn choose_pixel_format(&self, dc: HDC, desired: &FramebufferConfig) -> Result<c_int> {
        let candidates = match self.ext.wglGetPixelFormatAttribivARB.filter(|_| self.ext.WGL_ARB_pixel_format) {
            Some(f) => self.arb_candidates(f, dc, desired)?,
            None => self.legacy_candidates(dc, desired)?,
        };
        match crate::gl::choose_fb_config(desired, &candidates) {
            Some(c) => Ok(c.fb.handle as c_int),
            None => error::format_unavailable("WGL: Failed to find a suitable pixel format"),
        }
    }

    unsafe fn arb_candidates(&self, get_attribs: fn_types::wglGetPixelFormatAttribivARB, dc: HDC, desired: &FramebufferConfig) -> Result<Vec<FbCandidate>> {
        let mut count = 0;
        let attrib = WGL_NUMBER_PIXEL_FORMATS_ARB;
        if get_attribs(dc, 1, 0, 1, &attrib, &mut count) == FALSE {
            return Err(winapi_error("wglGetPixelFormatAttribivARB"));
        }

        let mut attribs = vec![
            WGL_SUPPORT_OPENGL_ARB, WGL_DRAW_TO_WINDOW_ARB, WGL_PIXEL_TYPE_ARB, WGL_ACCELERATION_ARB,
            WGL_RED_BITS_ARB, WGL_GREEN_BITS_ARB, WGL_BLUE_BITS_ARB, WGL_ALPHA_BITS_ARB,
            WGL_DEPTH_BITS_ARB, WGL_STENCIL_BITS_ARB,
            WGL_ACCUM_RED_BITS_ARB, WGL_ACCUM_GREEN_BITS_ARB, WGL_ACCUM_BLUE_BITS_ARB, WGL_ACCUM_ALPHA_BITS_ARB,
            WGL_AUX_BUFFERS_ARB, WGL_STEREO_ARB, WGL_DOUBLE_BUFFER_ARB,
        ];
        if self.ext.WGL_ARB_multisample {
            attribs.push(WGL_SAMPLES_ARB);
        }
        if self.ext.WGL_ARB_framebuffer_sRGB || self.ext.WGL_EXT_framebuffer_sRGB {
            attribs.push(WGL_FRAMEBUFFER_SRGB_CAPABLE_ARB);
        }

        let mut values = vec![0; attribs.len()];
        let mut candidates = Vec::with_capacity(count.max(0) as usize);
        for format in 1..=count {
            if get_attribs(dc, format, 0, attribs.len() as UINT, attribs.as_ptr(), values.as_mut_ptr()) == FALSE {
                return Err(winapi_error("wglGetPixelFormatAttribivARB"));
            }
            let value = |a: c_int| attribs.iter().position(|&x| x == a).map_or(0, |i| values[i]);
            if value(WGL_SUPPORT_OPENGL_ARB) == 0 || value(WGL_PIXEL_TYPE_ARB) != WGL_TYPE_RGBA_ARB {
                continue;
            }
            candidates.push(FbCandidate {
                fb: FramebufferConfig {
                    red_bits: value(WGL_RED_BITS_ARB),
                    green_bits: value(WGL_GREEN_BITS_ARB),
                    blue_bits: value(WGL_BLUE_BITS_ARB),
                    alpha_bits: value(WGL_ALPHA_BITS_ARB),
                    depth_bits: value(WGL_DEPTH_BITS_ARB),
                    stencil_bits: value(WGL_STENCIL_BITS_ARB),
                    accum_red_bits: value(WGL_ACCUM_RED_BITS_ARB),
                    accum_green_bits: value(WGL_ACCUM_GREEN_BITS_ARB),
                    accum_blue_bits: value(WGL_ACCUM_BLUE_BITS_ARB),
                    accum_alpha_bits: value(WGL_ACCUM_ALPHA_BITS_ARB),
                    aux_buffers: value(WGL_AUX_BUFFERS_ARB),
                    stereo: value(WGL_STEREO_ARB) != 0,
                    samples: value(WGL_SAMPLES_ARB),
                    srgb: value(WGL_FRAMEBUFFER_SRGB_CAPABLE_ARB) != 0,
                    double_buffer: value(WGL_DOUBLE_BUFFER_ARB) != 0,
                    // Transparency comes from DWM blur-behind, which works with any format.
                    transparent: desired.transparent,
                    handle: format as usize,
                },
                accelerated: value(WGL_ACCELERATION_ARB) != WGL_NO_ACCELERATION_ARB,
                window_drawable: value(WGL_DRAW_TO_WINDOW_ARB) != 0,
            });
        }
        Ok(candidates)
    }

    unsafe fn legacy_candidates(&self, dc: HDC, desired: &FramebufferConfig) -> Result<Vec<FbCandidate>> {
        let mut pfd: PIXELFORMATDESCRIPTOR = mem::zeroed();
        let size = mem::size_of::<PIXELFORMATDESCRIPTOR>() as UINT;
        let count = DescribePixelFormat(dc, 1, size, &mut pfd);
        let mut candidates = Vec::with_capacity(count.max(0) as usize);
        for format in 1..=count {
            if DescribePixelFormat(dc, format, size, &mut pfd) == 0 {
                return Err(winapi_error("DescribePixelFormat"));
            }
            if pfd.dwFlags & PFD_SUPPORT_OPENGL == 0 || pfd.iPixelType != PFD_TYPE_RGBA {
                continue;
            }
            let generic = pfd.dwFlags & PFD_GENERIC_FORMAT != 0 && pfd.dwFlags & PFD_GENERIC_ACCELERATED == 0;
            candidates.push(FbCandidate {
                fb: FramebufferConfig {
                    red_bits: pfd.cRedBits as _,
                    green_bits: pfd.cGreenBits as _,
                    blue_bits: pfd.cBlueBits as _,
                    alpha_bits: pfd.cAlphaBits as _,
                    depth_bits: pfd.cDepthBits as _,
                    stencil_bits: pfd.cStencilBits as _,
                    accum_red_bits: pfd.cAccumRedBits as _,
                    accum_green_bits: pfd.cAccumGreenBits as _,
                    accum_blue_bits: pfd.cAccumBlueBits as _,
                    accum_alpha_bits: pfd.cAccumAlphaBits as _,
                    aux_buffers: pfd.cAuxBuffers as _,
                    stereo: pfd.dwFlags & PFD_STEREO != 0,
                    samples: 0,
                    srgb: false,
                    double_buffer: pfd.dwFlags & PFD_DOUBLEBUFFER != 0,
                    transparent: desired.transparent,
                    handle: format as usize,
                },
                accelerated: !generic,
                window_drawable: pfd.dwFlags & PFD_DRAW_TO_WINDOW != 0,
            });
        }
        Ok(candidates)
    }

    /// Sets `format` on `dc`. A window's pixel format can only be set once.
    pub unsafe fn set_pixel_format(&self, dc: HDC, format: c_int) -> Result<()> {
        let mut pfd: PIXELFORMATDESCRIPTOR = mem::zeroed();
        if DescribePixelFormat(dc, format, mem::size_of::<PIXELFORMATDESCRIPTOR>() as UINT, &mut pfd) == 0 {
            return Err(winapi_error("DescribePixelFormat"));
        }
        if SetPixelFormat(dc, format, &pfd) == FALSE {
            return Err(winapi_error("SetPixelFormat"));
        }
        Ok(())
    }

    pub unsafe fn create_context(
        self: &Rc<Self>, libs: &Rc<Libs>, dc: HDC, ctxconfig: &ContextConfig, share: Option<&WglContext>,
        fullscreen: Rc<Cell<bool>>, win8: bool,
    ) -> Result<WglContext> {
        if ctxconfig.source != ContextCreationApi::Native.raw() {
            return error::api_unavailable("WGL: Only native context creation is available on Win32");
        }
        let share_handle = share.map_or(ptr::null_mut(), |s| s.handle);
        let attribs = context_attribs(&self.ext, ctxconfig)?;

        let handle = match self.ext.wglCreateContextAttribsARB.filter(|_| self.ext.WGL_ARB_create_context) {
            Some(create_context_attribs) => {
                let handle = create_context_attribs(dc, share_handle, attribs.as_ptr());
                if handle.is_null() {
                    let code = GetLastError();
                    let es = ctxconfig.client == ClientApi::OpenGlEs.raw();
                    return Err(match code {
                        ERROR_INVALID_VERSION_ARB if es => Error::version_unavailable("WGL: Driver does not support OpenGL ES version"),
                        ERROR_INVALID_VERSION_ARB => Error::version_unavailable("WGL: Driver does not support OpenGL version"),
                        ERROR_INVALID_PROFILE_ARB => Error::version_unavailable("WGL: Driver does not support the requested OpenGL profile"),
                        ERROR_INCOMPATIBLE_DEVICE_CONTEXTS_ARB => Error::invalid_value("WGL: The share context is not compatible with the requested context"),
                        _ => Error::version_unavailable("WGL: Failed to create OpenGL context"),
                    });
                }
                handle
            },
            None => {
                let handle = (self.gl.wglCreateContext)(dc);
                if handle.is_null() {
                    return error::version_unavailable("WGL: Failed to create OpenGL context");
                }
                if !share_handle.is_null() && (self.gl.wglShareLists)(share_handle, handle) == FALSE {
                    (self.gl.wglDeleteContext)(handle);
                    return Err(winapi_error("wglShareLists"));
                }
                handle
            },
        };
        Ok(WglContext {
            wgl: self.clone(),
            libs: libs.clone(),
            dc,
            handle,
            fullscreen,
            win8,
            interval: Cell::new(0),
        })
    }
}

/// Builds the attribute list for `wglCreateContextAttribsARB()`, checking that the
/// extensions the hints need are present.
pub(crate) fn context_attribs(ext: &WglExt, ctxconfig: &ContextConfig) -> Result<Vec<c_int>> {
    let es = ctxconfig.client == ClientApi::OpenGlEs.raw();
    if es && !(ext.WGL_ARB_create_context && ext.WGL_ARB_create_context_profile && ext.WGL_EXT_create_context_es2_profile) {
        return error::api_unavailable("WGL: OpenGL ES requested but WGL_EXT_create_context_es2_profile is unavailable");
    }
    if ctxconfig.forward && !ext.WGL_ARB_create_context {
        return error::version_unavailable("WGL: Forward compatibility requested but WGL_ARB_create_context is unavailable");
    }
    if ctxconfig.profile != OpenGlProfile::Any.raw() && !(ext.WGL_ARB_create_context && ext.WGL_ARB_create_context_profile) {
        return error::version_unavailable("WGL: An OpenGL profile requested but WGL_ARB_create_context_profile is unavailable");
    }

    let mut mask = 0;
    let mut flags = 0;
    if es {
        mask |= WGL_CONTEXT_ES2_PROFILE_BIT_EXT;
    } else if ctxconfig.profile == OpenGlProfile::Core.raw() {
        mask |= WGL_CONTEXT_CORE_PROFILE_BIT_ARB;
    } else if ctxconfig.profile == OpenGlProfile::Compat.raw() {
        mask |= WGL_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB;
    }
    if ctxconfig.forward {
        flags |= WGL_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB;
    }
    if ctxconfig.debug {
        flags |= WGL_CONTEXT_DEBUG_BIT_ARB;
    }

    let mut attribs = Vec::with_capacity(16);
    if ext.WGL_ARB_create_context_robustness {
        if ctxconfig.robustness == ContextRobustness::NoResetNotification.raw() {
            attribs.extend_from_slice(&[WGL_CONTEXT_RESET_NOTIFICATION_STRATEGY_ARB, WGL_NO_RESET_NOTIFICATION_ARB]);
            flags |= WGL_CONTEXT_ROBUST_ACCESS_BIT_ARB;
        } else if ctxconfig.robustness == ContextRobustness::LoseContextOnReset.raw() {
            attribs.extend_from_slice(&[WGL_CONTEXT_RESET_NOTIFICATION_STRATEGY_ARB, WGL_LOSE_CONTEXT_ON_RESET_ARB]);
            flags |= WGL_CONTEXT_ROBUST_ACCESS_BIT_ARB;
        }
    }
    if ext.WGL_ARB_context_flush_control {
        if ctxconfig.release == ContextReleaseBehavior::None.raw() {
            attribs.extend_from_slice(&[WGL_CONTEXT_RELEASE_BEHAVIOR_ARB, WGL_CONTEXT_RELEASE_BEHAVIOR_NONE_ARB]);
        } else if ctxconfig.release == ContextReleaseBehavior::Flush.raw() {
            attribs.extend_from_slice(&[WGL_CONTEXT_RELEASE_BEHAVIOR_ARB, WGL_CONTEXT_RELEASE_BEHAVIOR_FLUSH_ARB]);
        }
    }
    if ctxconfig.no_error && ext.WGL_ARB_create_context_no_error {
        attribs.extend_from_slice(&[WGL_CONTEXT_OPENGL_NO_ERROR_ARB, 1]);
    }
    if ctxconfig.major != 1 || ctxconfig.minor != 0 {
        attribs.extend_from_slice(&[WGL_CONTEXT_MAJOR_VERSION_ARB, ctxconfig.major, WGL_CONTEXT_MINOR_VERSION_ARB, ctxconfig.minor]);
    }
    if flags != 0 {
        attribs.extend_from_slice(&[WGL_CONTEXT_FLAGS_ARB, flags]);
    }
    if mask != 0 {
        attribs.extend_from_slice(&[WGL_CONTEXT_PROFILE_MASK_ARB, mask]);
    }
    attribs.push(0);
    Ok(attribs)
}

/// A WGL context bound to the private DC of one window.
pub struct WglContext {
    wgl: Rc<Wgl>,
    libs: Rc<Libs>,
    dc: HDC,
    handle: HGLRC,
    fullscreen: Rc<Cell<bool>>,
    win8: bool,
    interval: Cell<i32>,
}

impl WglContext {
    /// Before Windows 8, DWM composition ignores the driver's swap interval for
    /// windowed contexts, so we wait on DWM instead.
    fn syncs_with_dwm(&self) -> bool {
        !self.win8 && !self.fullscreen.get() && self.libs.dwm_composition_enabled()
    }
}

impl Drop for WglContext {
    fn drop(&mut self) {
        unsafe {
            if (self.wgl.gl.wglGetCurrentContext)() == self.handle {
                (self.wgl.gl.wglMakeCurrent)(ptr::null_mut(), ptr::null_mut());
            }
            (self.wgl.gl.wglDeleteContext)(self.handle);
        }
    }
}

impl PlatformContext for WglContext {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn make_current(&self, current: bool) -> Result<()> {
        let ok = unsafe {
            if current {
                (self.wgl.gl.wglMakeCurrent)(self.dc, self.handle)
            } else {
                (self.wgl.gl.wglMakeCurrent)(ptr::null_mut(), ptr::null_mut())
            }
        };
        if ok == FALSE {
            return Err(winapi_error("wglMakeCurrent"));
        }
        Ok(())
    }
    fn swap_buffers(&self) -> Result<()> {
        if self.syncs_with_dwm() {
            for _ in 0..self.interval.get() {
                self.libs.dwm_flush();
            }
        }
        if unsafe { SwapBuffers(self.dc) } == FALSE {
            return Err(winapi_error("SwapBuffers"));
        }
        Ok(())
    }
    fn swap_interval(&self, interval: i32) -> Result<()> {
        self.interval.set(interval);
        let interval = if self.syncs_with_dwm() { 0 } else { interval };
        if let Some(f) = self.wgl.ext.wglSwapIntervalEXT.filter(|_| self.wgl.ext.WGL_EXT_swap_control) {
            unsafe {
                f(interval);
            }
        } else {
            debug!("WGL: No swap control extension, ignoring swap interval {}", interval);
        }
        Ok(())
    }
    fn extension_supported(&self, name: &str) -> bool {
        crate::gl::string_in_extension_string(name, &self.wgl.extensions)
    }
    fn get_proc_address(&self, name: &str) -> GlProc {
        let cname = match CString::new(name) {
            Ok(cname) => cname,
            Err(_) => return ptr::null(),
        };
        let f = unsafe { (self.wgl.gl.wglGetProcAddress)(cname.as_ptr()) };
        // Some drivers return small sentinel values instead of null.
        match f as isize {
            -1 | 0..=3 => unsafe { self.wgl.gl.dll.sym::<GlProc>(name).unwrap_or(ptr::null()) },
            _ => f,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modern() -> WglExt {
        WglExt {
            WGL_ARB_create_context: true,
            WGL_ARB_create_context_profile: true,
            WGL_ARB_context_flush_control: true,
            ..WglExt::default()
        }
    }

    #[test]
    fn compat_profile_with_flush_control() {
        let ctx = ContextConfig {
            client: ClientApi::OpenGl.raw(),
            major: 4,
            minor: 6,
            debug: true,
            profile: OpenGlProfile::Compat.raw(),
            release: ContextReleaseBehavior::None.raw(),
            ..ContextConfig::default()
        };
        assert_eq!(context_attribs(&modern(), &ctx).unwrap(), vec![
            WGL_CONTEXT_RELEASE_BEHAVIOR_ARB, WGL_CONTEXT_RELEASE_BEHAVIOR_NONE_ARB,
            WGL_CONTEXT_MAJOR_VERSION_ARB, 4, WGL_CONTEXT_MINOR_VERSION_ARB, 6,
            WGL_CONTEXT_FLAGS_ARB, WGL_CONTEXT_DEBUG_BIT_ARB,
            WGL_CONTEXT_PROFILE_MASK_ARB, WGL_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB,
            0,
        ]);
    }

    #[test]
    fn robustness_is_dropped_without_the_extension() {
        let ctx = ContextConfig {
            client: ClientApi::OpenGl.raw(),
            robustness: ContextRobustness::LoseContextOnReset.raw(),
            ..ContextConfig::default()
        };
        assert_eq!(context_attribs(&modern(), &ctx).unwrap(), vec![0]);
    }

    #[test]
    fn forward_compat_needs_create_context() {
        let ctx = ContextConfig { client: ClientApi::OpenGl.raw(), major: 3, forward: true, ..ContextConfig::default() };
        let e = context_attribs(&WglExt::default(), &ctx).unwrap_err();
        assert_eq!(e.kind, crate::error::ErrorKind::VersionUnavailable);
    }
}
