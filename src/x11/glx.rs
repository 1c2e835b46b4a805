//! GLX framebuffer configurations and context creation.

use std::any::Any;
use std::ffi::{CStr, CString};
use std::os::raw::{c_int, c_uchar};
use std::ptr;
use std::rc::Rc;
use x11_dl::xlib::{self as x, Xlib};
use x11_dl::glx::{self as glx, Glx};
use super::missing_bits::glx::*;
use super::xlib_error;
use super::xrender::XRender;
use crate::error::{self, Error, Result};
use crate::hint::{ClientApi, ContextConfig, ContextCreationApi, ContextReleaseBehavior, ContextRobustness, FramebufferConfig, OpenGlProfile};
use crate::platform::{FbCandidate, GlProc, PlatformContext};

pub mod fn_types {
    #![allow(non_camel_case_types)]

    use std::os::raw::c_int;
    use x11_dl::xlib as x;
    use x11_dl::glx::{GLXContext, GLXDrawable, GLXFBConfig};

    pub type glXSwapIntervalMESA = unsafe extern "C" fn(interval: c_int) -> c_int;
    pub type glXSwapIntervalSGI = unsafe extern "C" fn(interval: c_int) -> c_int;
    pub type glXSwapIntervalEXT = unsafe extern "C" fn(*mut x::Display, GLXDrawable, interval: c_int);
    pub type glXCreateContextAttribsARB = unsafe extern "C" fn(
        *mut x::Display, GLXFBConfig, share_context: GLXContext,
        direct: x::Bool, attrib_list: *const c_int
    ) -> GLXContext;
}

macro_rules! glx_ext {
    (($($name:ident)+) ($($func:ident)+)) => {
        #[allow(non_snake_case)]
        #[derive(Debug, Copy, Clone, Default, Hash, PartialEq, Eq)]
        pub struct GlxExt {
            $(pub $name: bool,)+
            $(pub $func: Option<fn_types::$func>,)+
        }
        impl GlxExt {
            #[allow(non_snake_case)]
            pub unsafe fn parse(lib: &Glx, extensions: &str) -> Self {
                $(let mut $name = false;)+
                for name in extensions.split_whitespace() {
                    match name {
                        $(stringify!($name) => {
                            $name = true;
                            debug!("Found GLX extension {}", stringify!($name));
                        },)+
                        _ => {}
                    };
                }
                let mut out = Self { $($name,)+ $($func: None,)+ };
                $(
                    let name = concat!(stringify!($func), "\0");
                    out.$func = match (lib.glXGetProcAddressARB)(name.as_ptr() as *const c_uchar) {
                        None => {
                            debug!("Couldn't load `{}`", stringify!($func));
                            None
                        },
                        Some(f) => Some(std::mem::transmute(f)),
                    };
                )+
                out
            }
        }
    }
}

glx_ext!((
    GLX_ARB_multisample
    GLX_ARB_framebuffer_sRGB
    GLX_EXT_framebuffer_sRGB
    GLX_EXT_swap_control
    GLX_MESA_swap_control
    GLX_SGI_swap_control
    GLX_ARB_create_context
    GLX_ARB_create_context_profile
    GLX_ARB_create_context_robustness
    GLX_ARB_create_context_no_error
    GLX_ARB_context_flush_control
    GLX_EXT_create_context_es2_profile
    )(
    glXSwapIntervalEXT
    glXSwapIntervalMESA
    glXSwapIntervalSGI
    glXCreateContextAttribsARB
));

/// The loaded GLX library, bound to one display.
pub struct GlxLib {
    pub lib: Glx,
    pub xlib: Rc<Xlib>,
    pub x_display: *mut x::Display,
    pub screen: c_int,
    pub major_version: c_int,
    pub minor_version: c_int,
    pub extensions: String,
    pub ext: GlxExt,
}

impl GlxLib {
    pub unsafe fn query(xlib: Rc<Xlib>, x_display: *mut x::Display, screen: c_int) -> Result<Self> {
        let lib = Glx::open().map_err(|e| Error::api_unavailable(format!("GLX: Failed to load libGL: {}", e)))?;
        let (mut error_base, mut event_base) = (0, 0);
        if (lib.glXQueryExtension)(x_display, &mut error_base, &mut event_base) == x::False {
            return error::api_unavailable("GLX: GLX extension not found");
        }
        let (mut major, mut minor) = (0, 0);
        if (lib.glXQueryVersion)(x_display, &mut major, &mut minor) == x::False {
            return error::api_unavailable("GLX: Failed to query GLX version");
        }
        if (major, minor) < (1, 3) {
            return error::api_unavailable(format!("GLX: GLX version 1.3 is required, found {}.{}", major, minor));
        }
        let extensions = {
            let p = (lib.glXQueryExtensionsString)(x_display, screen);
            if p.is_null() { String::new() } else { CStr::from_ptr(p).to_string_lossy().into_owned() }
        };
        let vendor = (lib.glXGetClientString)(x_display, GLX_VENDOR);
        if !vendor.is_null() {
            info!("GLX {}.{}, client vendor {:?}", major, minor, CStr::from_ptr(vendor).to_string_lossy());
        }
        let ext = GlxExt::parse(&lib, &extensions);
        Ok(Self { lib, xlib, x_display, screen, major_version: major, minor_version: minor, extensions, ext })
    }

    unsafe fn fbconfig_attrib(&self, config: glx::GLXFBConfig, attrib: c_int) -> c_int {
        let mut value = 0;
        (self.lib.glXGetFBConfigAttrib)(self.x_display, config, attrib, &mut value);
        value
    }

    /// Picks the closest framebuffer configuration and returns it with its visual.
    pub unsafe fn choose_fbconfig(&self, desired: &FramebufferConfig, xrender: Option<&XRender>) -> Result<(glx::GLXFBConfig, *mut x::XVisualInfo)> {
        let mut count = 0;
        let configs = (self.lib.glXGetFBConfigs)(self.x_display, self.screen, &mut count);
        if configs.is_null() || count <= 0 {
            return error::api_unavailable("GLX: No GLXFBConfigs returned");
        }
        let configs_slice = std::slice::from_raw_parts(configs, count as usize);
        let srgb_capable = self.ext.GLX_ARB_framebuffer_sRGB || self.ext.GLX_EXT_framebuffer_sRGB;

        let mut candidates = Vec::with_capacity(configs_slice.len());
        for (i, &config) in configs_slice.iter().enumerate() {
            let attrib = |a| self.fbconfig_attrib(config, a);
            if attrib(GLX_RENDER_TYPE) & GLX_RGBA_BIT == 0 {
                continue;
            }
            let mut transparent = false;
            if desired.transparent {
                if let Some(xrender) = xrender {
                    let vi = (self.lib.glXGetVisualFromFBConfig)(self.x_display, config);
                    if !vi.is_null() {
                        transparent = xrender.visual_has_alpha(self.x_display, (*vi).visual);
                        (self.xlib.XFree)(vi as *mut _);
                    }
                }
            }
            candidates.push(FbCandidate {
                fb: FramebufferConfig {
                    red_bits: attrib(GLX_RED_SIZE),
                    green_bits: attrib(GLX_GREEN_SIZE),
                    blue_bits: attrib(GLX_BLUE_SIZE),
                    alpha_bits: attrib(GLX_ALPHA_SIZE),
                    depth_bits: attrib(GLX_DEPTH_SIZE),
                    stencil_bits: attrib(GLX_STENCIL_SIZE),
                    accum_red_bits: attrib(GLX_ACCUM_RED_SIZE),
                    accum_green_bits: attrib(GLX_ACCUM_GREEN_SIZE),
                    accum_blue_bits: attrib(GLX_ACCUM_BLUE_SIZE),
                    accum_alpha_bits: attrib(GLX_ACCUM_ALPHA_SIZE),
                    aux_buffers: attrib(GLX_AUX_BUFFERS),
                    stereo: attrib(GLX_STEREO) != 0,
                    samples: if self.ext.GLX_ARB_multisample { attrib(GLX_SAMPLES) } else { 0 },
                    srgb: srgb_capable && attrib(GLX_FRAMEBUFFER_SRGB_CAPABLE_ARB) != 0,
                    double_buffer: attrib(GLX_DOUBLEBUFFER) != 0,
                    transparent,
                    handle: i,
                },
                accelerated: attrib(GLX_CONFIG_CAVEAT) != GLX_SLOW_CONFIG,
                window_drawable: attrib(GLX_DRAWABLE_TYPE) & GLX_WINDOW_BIT != 0,
            });
        }

        let chosen = crate::gl::choose_fb_config(desired, &candidates).map(|c| configs_slice[c.fb.handle]);
        (self.xlib.XFree)(configs as *mut _);
        let config = chosen.ok_or_else(|| Error::format_unavailable("GLX: Failed to find a suitable GLXFBConfig"))?;
        let vi = (self.lib.glXGetVisualFromFBConfig)(self.x_display, config);
        if vi.is_null() {
            return error::failed("GLX: Failed to retrieve visual for GLXFBConfig");
        }
        Ok((config, vi))
    }

    /// Creates a context for `x_window`, which must have been created with the config's visual.
    pub unsafe fn create_context(self: &Rc<Self>, config: glx::GLXFBConfig, x_window: x::Window, ctxconfig: &ContextConfig, share: Option<&GlxContext>) -> Result<GlxContext> {
        if ctxconfig.source != ContextCreationApi::Native.raw() {
            return error::api_unavailable("GLX: Only native context creation is available on X11");
        }
        let share_context = share.map_or(ptr::null_mut(), |s| s.context);
        let xlib = &self.xlib;

        let context = match self.ext.glXCreateContextAttribsARB.filter(|_| self.ext.GLX_ARB_create_context) {
            Some(create_context_attribs) => {
                let attribs = context_attribs(&self.ext, ctxconfig)?;
                let context = xlib_error::sync_catch(xlib, self.x_display, || {
                    create_context_attribs(self.x_display, config, share_context, x::True, attribs.as_ptr())
                }).unwrap_or(ptr::null_mut());
                // Old drivers reject 1.0 with the ARB extension, but are fine with a legacy context.
                let legacy_ok = ctxconfig.client == ClientApi::OpenGl.raw()
                    && ctxconfig.profile == OpenGlProfile::Any.raw()
                    && !ctxconfig.forward;
                if context.is_null() && legacy_ok {
                    debug!("GLX: Falling back to glXCreateNewContext()");
                    (self.lib.glXCreateNewContext)(self.x_display, config, GLX_RGBA_TYPE, share_context, x::True)
                } else {
                    context
                }
            },
            None => {
                context_attribs(&self.ext, ctxconfig)?;
                xlib_error::sync_catch(xlib, self.x_display, || {
                    (self.lib.glXCreateNewContext)(self.x_display, config, GLX_RGBA_TYPE, share_context, x::True)
                })?
            },
        };
        if context.is_null() {
            return error::version_unavailable("GLX: Failed to create context");
        }

        let drawable = (self.lib.glXCreateWindow)(self.x_display, config, x_window, ptr::null());
        if drawable == 0 {
            (self.lib.glXDestroyContext)(self.x_display, context);
            return error::failed("GLX: Failed to create window");
        }
        Ok(GlxContext { glx: self.clone(), context, drawable })
    }
}

/// Builds the attribute list for `glXCreateContextAttribsARB()`, checking that the
/// extensions the hints need are present.
pub(crate) fn context_attribs(ext: &GlxExt, ctxconfig: &ContextConfig) -> Result<Vec<c_int>> {
    let es = ctxconfig.client == ClientApi::OpenGlEs.raw();
    if es && !(ext.GLX_ARB_create_context && ext.GLX_ARB_create_context_profile && ext.GLX_EXT_create_context_es2_profile) {
        return error::api_unavailable("GLX: OpenGL ES requested but GLX_EXT_create_context_es2_profile is unavailable");
    }
    if ctxconfig.forward && !ext.GLX_ARB_create_context {
        return error::version_unavailable("GLX: Forward compatibility requested but GLX_ARB_create_context_profile is unavailable");
    }
    if ctxconfig.profile != OpenGlProfile::Any.raw() && !(ext.GLX_ARB_create_context && ext.GLX_ARB_create_context_profile) {
        return error::version_unavailable("GLX: An OpenGL profile requested but GLX_ARB_create_context_profile is unavailable");
    }

    let mut mask = 0;
    let mut flags = 0;
    if es {
        mask |= GLX_CONTEXT_ES2_PROFILE_BIT_EXT;
    } else if ctxconfig.profile == OpenGlProfile::Core.raw() {
        mask |= GLX_CONTEXT_CORE_PROFILE_BIT_ARB;
    } else if ctxconfig.profile == OpenGlProfile::Compat.raw() {
        mask |= GLX_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB;
    }
    if ctxconfig.forward {
        flags |= GLX_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB;
    }
    if ctxconfig.debug {
        flags |= GLX_CONTEXT_DEBUG_BIT_ARB;
    }

    let mut attribs = Vec::with_capacity(16);
    if ext.GLX_ARB_create_context_robustness {
        if ctxconfig.robustness == ContextRobustness::NoResetNotification.raw() {
            attribs.extend_from_slice(&[GLX_CONTEXT_RESET_NOTIFICATION_STRATEGY_ARB, GLX_NO_RESET_NOTIFICATION_ARB]);
            flags |= GLX_CONTEXT_ROBUST_ACCESS_BIT_ARB;
        } else if ctxconfig.robustness == ContextRobustness::LoseContextOnReset.raw() {
            attribs.extend_from_slice(&[GLX_CONTEXT_RESET_NOTIFICATION_STRATEGY_ARB, GLX_LOSE_CONTEXT_ON_RESET_ARB]);
            flags |= GLX_CONTEXT_ROBUST_ACCESS_BIT_ARB;
        }
    }
    if ext.GLX_ARB_context_flush_control {
        if ctxconfig.release == ContextReleaseBehavior::None.raw() {
            attribs.extend_from_slice(&[GLX_CONTEXT_RELEASE_BEHAVIOR_ARB, GLX_CONTEXT_RELEASE_BEHAVIOR_NONE_ARB]);
        } else if ctxconfig.release == ContextReleaseBehavior::Flush.raw() {
            attribs.extend_from_slice(&[GLX_CONTEXT_RELEASE_BEHAVIOR_ARB, GLX_CONTEXT_RELEASE_BEHAVIOR_FLUSH_ARB]);
        }
    }
    if ctxconfig.no_error && ext.GLX_ARB_create_context_no_error {
        attribs.extend_from_slice(&[GLX_CONTEXT_OPENGL_NO_ERROR_ARB, x::True]);
    }
    // 1.0 is the default, and some drivers reject it when spelled out.
    if ctxconfig.major != 1 || ctxconfig.minor != 0 {
        attribs.extend_from_slice(&[GLX_CONTEXT_MAJOR_VERSION_ARB, ctxconfig.major, GLX_CONTEXT_MINOR_VERSION_ARB, ctxconfig.minor]);
    }
    if flags != 0 {
        attribs.extend_from_slice(&[GLX_CONTEXT_FLAGS_ARB, flags]);
    }
    if mask != 0 {
        attribs.extend_from_slice(&[GLX_CONTEXT_PROFILE_MASK_ARB, mask]);
    }
    attribs.push(0);
    Ok(attribs)
}

/// A GLX context and the GLX window it draws to.
pub struct GlxContext {
    glx: Rc<GlxLib>,
    context: glx::GLXContext,
    drawable: glx::GLXWindow,
}

impl Drop for GlxContext {
    fn drop(&mut self) {
        unsafe {
            if (self.glx.lib.glXGetCurrentContext)() == self.context {
                (self.glx.lib.glXMakeCurrent)(self.glx.x_display, 0, ptr::null_mut());
            }
            (self.glx.lib.glXDestroyWindow)(self.glx.x_display, self.drawable);
            (self.glx.lib.glXDestroyContext)(self.glx.x_display, self.context);
        }
    }
}

impl PlatformContext for GlxContext {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn make_current(&self, current: bool) -> Result<()> {
        let ok = unsafe {
            if current {
                (self.glx.lib.glXMakeCurrent)(self.glx.x_display, self.drawable, self.context)
            } else {
                (self.glx.lib.glXMakeCurrent)(self.glx.x_display, 0, ptr::null_mut())
            }
        };
        if ok == x::False {
            return error::failed("GLX: Failed to make context current");
        }
        Ok(())
    }
    fn swap_buffers(&self) -> Result<()> {
        unsafe {
            (self.glx.lib.glXSwapBuffers)(self.glx.x_display, self.drawable);
        }
        Ok(())
    }
    fn swap_interval(&self, interval: i32) -> Result<()> {
        let ext = &self.glx.ext;
        unsafe {
            if let Some(f) = ext.glXSwapIntervalEXT.filter(|_| ext.GLX_EXT_swap_control) {
                f(self.glx.x_display, self.drawable, interval);
            } else if let Some(f) = ext.glXSwapIntervalMESA.filter(|_| ext.GLX_MESA_swap_control) {
                f(interval);
            } else if let Some(f) = ext.glXSwapIntervalSGI.filter(|_| ext.GLX_SGI_swap_control) {
                // SGI rejects zero.
                if interval > 0 {
                    f(interval);
                }
            } else {
                debug!("GLX: No swap control extension, ignoring swap interval {}", interval);
            }
        }
        Ok(())
    }
    fn extension_supported(&self, name: &str) -> bool {
        crate::gl::string_in_extension_string(name, &self.glx.extensions)
    }
    fn get_proc_address(&self, name: &str) -> GlProc {
        let name = match CString::new(name) {
            Ok(name) => name,
            Err(_) => return ptr::null(),
        };
        unsafe {
            match (self.glx.lib.glXGetProcAddressARB)(name.as_ptr() as *const c_uchar) {
                Some(f) => f as GlProc,
                None => ptr::null(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modern() -> GlxExt {
        GlxExt {
            GLX_ARB_create_context: true,
            GLX_ARB_create_context_profile: true,
            GLX_ARB_create_context_robustness: true,
            ..GlxExt::default()
        }
    }

    #[test]
    fn core_profile_attribs() {
        let ctx = ContextConfig {
            client: ClientApi::OpenGl.raw(),
            major: 3,
            minor: 3,
            forward: true,
            profile: OpenGlProfile::Core.raw(),
            robustness: ContextRobustness::LoseContextOnReset.raw(),
            ..ContextConfig::default()
        };
        let attribs = context_attribs(&modern(), &ctx).unwrap();
        assert_eq!(attribs, vec![
            GLX_CONTEXT_RESET_NOTIFICATION_STRATEGY_ARB, GLX_LOSE_CONTEXT_ON_RESET_ARB,
            GLX_CONTEXT_MAJOR_VERSION_ARB, 3, GLX_CONTEXT_MINOR_VERSION_ARB, 3,
            GLX_CONTEXT_FLAGS_ARB, GLX_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB | GLX_CONTEXT_ROBUST_ACCESS_BIT_ARB,
            GLX_CONTEXT_PROFILE_MASK_ARB, GLX_CONTEXT_CORE_PROFILE_BIT_ARB,
            0,
        ]);
    }

    #[test]
    fn version_one_zero_is_left_implicit() {
        let ctx = ContextConfig { client: ClientApi::OpenGl.raw(), ..ContextConfig::default() };
        assert_eq!(context_attribs(&modern(), &ctx).unwrap(), vec![0]);
    }

    #[test]
    fn es_needs_the_es2_profile_extension() {
        let ctx = ContextConfig { client: ClientApi::OpenGlEs.raw(), major: 2, ..ContextConfig::default() };
        let e = context_attribs(&modern(), &ctx).unwrap_err();
        assert_eq!(e.kind, crate::error::ErrorKind::ApiUnavailable);
        let ext = GlxExt { GLX_EXT_create_context_es2_profile: true, ..modern() };
        assert!(context_attribs(&ext, &ctx).is_ok());
    }

    #[test]
    fn profiles_need_the_profile_extension() {
        let ctx = ContextConfig { client: ClientApi::OpenGl.raw(), major: 3, minor: 2, profile: OpenGlProfile::Core.raw(), ..ContextConfig::default() };
        let e = context_attribs(&GlxExt::default(), &ctx).unwrap_err();
        assert_eq!(e.kind, crate::error::ErrorKind::VersionUnavailable);
    }
}
