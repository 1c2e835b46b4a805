//! OpenGL and OpenGL ES context negotiation.
//!
//! Framebuffer configurations are chosen here from the candidates each
//! backend enumerates, context hints are validated here, and the realized
//! attributes of every new context are queried here through the context's own
//! entry points.

use std::ffi::CStr;
use std::fmt;
use std::mem;
use std::os::raw::c_char;
use crate::error::{self, Error, Reported, Result};
use crate::hint::{ClientApi, ContextConfig, ContextCreationApi, ContextReleaseBehavior, ContextRobustness, FramebufferConfig, OpenGlProfile, DONT_CARE};
use crate::library::{Library, LibraryShared};
use crate::platform::{FbCandidate, GlProc, PlatformContext, WindowId};
use crate::window::Window;

#[allow(dead_code)]
pub(crate) mod consts {
    pub const GL_VERSION: u32 = 0x1F02;
    pub const GL_VENDOR: u32 = 0x1F00;
    pub const GL_RENDERER: u32 = 0x1F01;
    pub const GL_EXTENSIONS: u32 = 0x1F03;
    pub const GL_NUM_EXTENSIONS: u32 = 0x821D;
    pub const GL_CONTEXT_FLAGS: u32 = 0x821E;
    pub const GL_CONTEXT_FLAG_FORWARD_COMPATIBLE_BIT: i32 = 0x0001;
    pub const GL_CONTEXT_FLAG_DEBUG_BIT: i32 = 0x0002;
    pub const GL_CONTEXT_FLAG_NO_ERROR_BIT_KHR: i32 = 0x0008;
    pub const GL_CONTEXT_PROFILE_MASK: u32 = 0x9126;
    pub const GL_CONTEXT_CORE_PROFILE_BIT: i32 = 0x0001;
    pub const GL_CONTEXT_COMPATIBILITY_PROFILE_BIT: i32 = 0x0002;
    pub const GL_RESET_NOTIFICATION_STRATEGY_ARB: u32 = 0x8256;
    pub const GL_LOSE_CONTEXT_ON_RESET_ARB: i32 = 0x8252;
    pub const GL_NO_RESET_NOTIFICATION_ARB: i32 = 0x8261;
    pub const GL_CONTEXT_RELEASE_BEHAVIOR: u32 = 0x82FB;
    pub const GL_CONTEXT_RELEASE_BEHAVIOR_FLUSH: i32 = 0x82FC;
    pub const GL_NONE: i32 = 0;
    pub const GL_COLOR_BUFFER_BIT: u32 = 0x4000;
}

use self::consts::*;

type GetStringFn = unsafe extern "system" fn(u32) -> *const u8;
type GetStringiFn = unsafe extern "system" fn(u32, u32) -> *const u8;
type GetIntegervFn = unsafe extern "system" fn(u32, *mut i32);
type ClearFn = unsafe extern "system" fn(u32);

/// The few GL entry points needed to query a context.
struct GlFns {
    get_string: GetStringFn,
    get_stringi: Option<GetStringiFn>,
    get_integerv: Option<GetIntegervFn>,
    clear: Option<ClearFn>,
}

unsafe fn load_opt<F: Copy>(ctx: &dyn PlatformContext, name: &str) -> Option<F> {
    let p = ctx.get_proc_address(name);
    if p.is_null() {
        None
    } else {
        Some(mem::transmute_copy::<GlProc, F>(&p))
    }
}

impl GlFns {
    fn load(ctx: &dyn PlatformContext) -> Result<Self> {
        unsafe {
            let get_string = load_opt::<GetStringFn>(ctx, "glGetString")
                .ok_or_else(|| Error::failed("Entry point retrieval is broken"))?;
            Ok(Self {
                get_string,
                get_stringi: load_opt(ctx, "glGetStringi"),
                get_integerv: load_opt(ctx, "glGetIntegerv"),
                clear: load_opt(ctx, "glClear"),
            })
        }
    }
    fn string(&self, name: u32) -> Option<String> {
        unsafe {
            let s = (self.get_string)(name);
            if s.is_null() {
                return None;
            }
            Some(CStr::from_ptr(s as *const c_char).to_string_lossy().into_owned())
        }
    }
    fn integer(&self, name: u32) -> i32 {
        let mut value = 0;
        if let Some(f) = self.get_integerv {
            unsafe { f(name, &mut value) };
        }
        value
    }
    fn extension_supported(&self, major: i32, name: &str) -> Result<bool> {
        if major >= 3 {
            let get_stringi = self.get_stringi.ok_or_else(|| Error::failed("Extension string retrieval is broken"))?;
            let count = self.integer(GL_NUM_EXTENSIONS);
            for i in 0..count.max(0) as u32 {
                let ext = unsafe { get_stringi(GL_EXTENSIONS, i) };
                if ext.is_null() {
                    return error::failed("Extension string retrieval is broken");
                }
                if unsafe { CStr::from_ptr(ext as *const c_char) }.to_bytes() == name.as_bytes() {
                    return Ok(true);
                }
            }
            Ok(false)
        } else {
            let extensions = self.string(GL_EXTENSIONS).ok_or_else(|| Error::failed("Extension string retrieval is broken"))?;
            Ok(string_in_extension_string(name, &extensions))
        }
    }
}

/// Looks for a whole word in a space-separated extension string.
pub(crate) fn string_in_extension_string(name: &str, extensions: &str) -> bool {
    extensions.split_whitespace().any(|e| e == name)
}

/// The attributes a context actually got, as queried after creation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct ContextAttribs {
    pub client: ClientApi,
    pub source: ContextCreationApi,
    pub major: i32,
    pub minor: i32,
    pub revision: i32,
    pub forward: bool,
    pub debug: bool,
    pub no_error: bool,
    pub profile: OpenGlProfile,
    pub robustness: ContextRobustness,
    pub release: ContextReleaseBehavior,
}

pub(crate) struct Context {
    pub attribs: ContextAttribs,
    pub native: Box<dyn PlatformContext>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.attribs.fmt(f)
    }
}

/// Picks the candidate closest to `desired`, or `None` if none passes the hard constraints.
///
/// Missing buffers weigh most, then the colour channel differences, then all other channels.
pub(crate) fn choose_fb_config<'a>(desired: &FramebufferConfig, candidates: &'a [FbCandidate]) -> Option<&'a FbCandidate> {
    let mut closest: Option<&FbCandidate> = None;
    let (mut least_missing, mut least_color_diff, mut least_extra_diff) = (i32::max_value(), i32::max_value(), i32::max_value());

    let sq = |have: i32, want: i32| if want == DONT_CARE { 0 } else { (have - want) * (have - want) };

    for candidate in candidates {
        let c = &candidate.fb;
        if !candidate.accelerated || !candidate.window_drawable {
            continue;
        }
        if desired.stereo && !c.stereo {
            continue;
        }
        if desired.double_buffer != c.double_buffer {
            continue;
        }

        let mut missing = 0;
        if desired.alpha_bits > 0 && c.alpha_bits == 0 {
            missing += 1;
        }
        if desired.depth_bits > 0 && c.depth_bits == 0 {
            missing += 1;
        }
        if desired.stencil_bits > 0 && c.stencil_bits == 0 {
            missing += 1;
        }
        if desired.aux_buffers > 0 && c.aux_buffers < desired.aux_buffers {
            missing += desired.aux_buffers - c.aux_buffers;
        }
        if desired.samples > 0 && c.samples == 0 {
            // Technically, several multisampling buffers could be involved,
            // but that's a lower level implementation detail and not important here.
            missing += 1;
        }
        if desired.transparent != c.transparent {
            missing += 1;
        }

        let color_diff = sq(c.red_bits, desired.red_bits)
            + sq(c.green_bits, desired.green_bits)
            + sq(c.blue_bits, desired.blue_bits);

        let mut extra_diff = sq(c.alpha_bits, desired.alpha_bits)
            + sq(c.depth_bits, desired.depth_bits)
            + sq(c.stencil_bits, desired.stencil_bits)
            + sq(c.accum_red_bits, desired.accum_red_bits)
            + sq(c.accum_green_bits, desired.accum_green_bits)
            + sq(c.accum_blue_bits, desired.accum_blue_bits)
            + sq(c.accum_alpha_bits, desired.accum_alpha_bits)
            + sq(c.samples, desired.samples);
        if desired.srgb && !c.srgb {
            extra_diff += 1;
        }

        let better = missing < least_missing
            || (missing == least_missing && (color_diff < least_color_diff
                || (color_diff == least_color_diff && extra_diff < least_extra_diff)));
        if better {
            closest = Some(candidate);
            least_missing = missing;
            least_color_diff = color_diff;
            least_extra_diff = extra_diff;
        }
    }
    closest
}

/// Rejects context hints no backend could satisfy.
pub(crate) fn check_context_config(ctx: &ContextConfig, share: Option<&Window>) -> Result<()> {
    let source = ContextCreationApi::from_raw(ctx.source)
        .ok_or_else(|| Error::invalid_enum(format!("Invalid context creation API 0x{:08X}", ctx.source)))?;
    let client = ClientApi::from_raw(ctx.client)
        .ok_or_else(|| Error::invalid_enum(format!("Invalid client API 0x{:08X}", ctx.client)))?;

    if let Some(share) = share {
        let share_ctx = share.shared.context.borrow();
        let share_attribs = match share_ctx.as_ref() {
            Some(c) if client != ClientApi::NoApi => c.attribs,
            _ => return Err(Error::no_window_context()),
        };
        if share_attribs.source != source {
            return error::invalid_enum("Context creation APIs do not match between contexts");
        }
    }

    let (major, minor) = (ctx.major, ctx.minor);
    match client {
        ClientApi::NoApi => (),
        ClientApi::OpenGl => {
            let valid = match major {
                1 => minor >= 0 && minor <= 5,
                2 => minor >= 0 && minor <= 1,
                3 => minor >= 0 && minor <= 3,
                m => m >= 4 && minor >= 0,
            };
            if !valid {
                return error::invalid_value(format!("Invalid OpenGL version {}.{}", major, minor));
            }
            if ctx.profile != OpenGlProfile::Any.raw() {
                if OpenGlProfile::from_raw(ctx.profile).is_none() {
                    return error::invalid_enum(format!("Invalid OpenGL profile 0x{:08X}", ctx.profile));
                }
                if (major, minor) < (3, 2) {
                    return error::invalid_value("Context profiles are only defined for OpenGL version 3.2 and above");
                }
            }
            if ctx.forward && major <= 2 {
                return error::invalid_value("Forward-compatibility is only defined for OpenGL version 3.0 and above");
            }
        },
        ClientApi::OpenGlEs => {
            let valid = match major {
                1 => minor >= 0 && minor <= 1,
                2 => minor == 0,
                m => m >= 3 && minor >= 0,
            };
            if !valid {
                return error::invalid_value(format!("Invalid OpenGL ES version {}.{}", major, minor));
            }
        },
    }

    if ctx.robustness != ContextRobustness::NoRobustness.raw() && ContextRobustness::from_raw(ctx.robustness).is_none() {
        return error::invalid_enum(format!("Invalid context robustness mode 0x{:08X}", ctx.robustness));
    }
    if ctx.release != ContextReleaseBehavior::Any.raw() && ContextReleaseBehavior::from_raw(ctx.release).is_none() {
        return error::invalid_enum(format!("Invalid context release behavior 0x{:08X}", ctx.release));
    }
    Ok(())
}

/// Parses a `GL_VERSION` string into the client API and its major, minor and revision numbers.
pub(crate) fn parse_version(version: &str) -> Result<(ClientApi, i32, i32, i32)> {
    const ES_PREFIXES: [&str; 3] = ["OpenGL ES-CM ", "OpenGL ES-CL ", "OpenGL ES "];

    let (client, rest) = match ES_PREFIXES.iter().find(|p| version.starts_with(*p)) {
        Some(prefix) => (ClientApi::OpenGlEs, &version[prefix.len()..]),
        None => (ClientApi::OpenGl, version),
    };
    let numbers = rest.split(|c: char| c.is_whitespace()).next().unwrap_or("");
    let mut parts = numbers.split('.').map(|p| {
        let digits: String = p.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse::<i32>().ok()
    });
    let major = parts.next().and_then(|p| p);
    let minor = parts.next().and_then(|p| p);
    let revision = parts.next().and_then(|p| p).unwrap_or(0);
    match (major, minor) {
        (Some(major), Some(minor)) => Ok((client, major, minor, revision)),
        _ => error::failed(format!("No version found in client API version string \"{}\"", version)),
    }
}

impl LibraryShared {
    /// The window whose context is current on the calling thread.
    pub(crate) fn current_context(&self) -> Option<Window> {
        let raw = self.context_slot.borrow().as_ref().map(|s| s.get()).unwrap_or(0);
        if raw == 0 {
            return None;
        }
        self.window_by_id(WindowId(raw as u64))
    }

    pub(crate) fn make_context_current(&self, window: Option<&Window>) -> Result<()> {
        let previous = self.current_context();

        let source = match window {
            Some(w) => match w.shared.context.borrow().as_ref() {
                Some(c) => Some(c.attribs.source),
                None => return Err(Error::no_window_context()),
            },
            None => None,
        };

        if let Some(previous) = previous.as_ref() {
            let prev_ctx = previous.shared.context.borrow();
            if let Some(prev_ctx) = prev_ctx.as_ref() {
                if source != Some(prev_ctx.attribs.source) {
                    prev_ctx.native.make_current(false)?;
                }
            }
        }

        if let Some(w) = window {
            if let Some(c) = w.shared.context.borrow().as_ref() {
                c.native.make_current(true)?;
            }
        }

        let raw = window.map_or(0, |w| w.shared.id.0 as usize);
        if let Some(slot) = self.context_slot.borrow().as_ref() {
            slot.set(raw);
        }
        Ok(())
    }

    /// Queries what the driver actually created, failing if it is less than what was requested.
    pub(crate) fn refresh_context_attribs(&self, window: &Window, ctxconfig: &ContextConfig) -> Result<()> {
        let previous = self.current_context();
        self.make_context_current(Some(window))?;
        let queried = self.query_context(window, ctxconfig);
        let restored = self.make_context_current(previous.as_ref());
        queried?;
        restored
    }

    fn query_context(&self, window: &Window, ctxconfig: &ContextConfig) -> Result<()> {
        let mut attribs = {
            let ctx = window.shared.context.borrow();
            let ctx = ctx.as_ref().ok_or_else(Error::no_window_context)?;
            let fns = GlFns::load(ctx.native.as_ref())?;

            let version = fns.string(GL_VERSION).ok_or_else(|| {
                Error::failed(match ctx.attribs.client {
                    ClientApi::OpenGlEs => "OpenGL ES version string retrieval is broken",
                    _ => "OpenGL version string retrieval is broken",
                })
            })?;
            let (client, major, minor, revision) = parse_version(&version)?;
            debug!("Context realized \"{}\"", version);

            if (major, minor) < (ctxconfig.major, ctxconfig.minor) {
                // Only happens when the modern context creation path is unavailable and
                // the application asked for more than what the legacy path gives.
                return error::version_unavailable(format!(
                    "Requested OpenGL{} version {}.{}, got version {}.{}",
                    if client == ClientApi::OpenGlEs { " ES" } else { "" },
                    ctxconfig.major, ctxconfig.minor, major, minor
                ));
            }

            let mut attribs = ContextAttribs { client, major, minor, revision, ..ctx.attribs };

            if major >= 3 {
                let flags = fns.integer(GL_CONTEXT_FLAGS);
                attribs.forward = flags & GL_CONTEXT_FLAG_FORWARD_COMPATIBLE_BIT != 0;
                attribs.debug = flags & GL_CONTEXT_FLAG_DEBUG_BIT != 0
                    || (ctxconfig.debug && fns.extension_supported(major, "GL_ARB_debug_output")?);
                attribs.no_error = flags & GL_CONTEXT_FLAG_NO_ERROR_BIT_KHR != 0;
            }

            if client == ClientApi::OpenGl && (major, minor) >= (3, 2) {
                let mask = fns.integer(GL_CONTEXT_PROFILE_MASK);
                attribs.profile = if mask & GL_CONTEXT_COMPATIBILITY_PROFILE_BIT != 0 {
                    OpenGlProfile::Compat
                } else if mask & GL_CONTEXT_CORE_PROFILE_BIT != 0 {
                    OpenGlProfile::Core
                } else if fns.extension_supported(major, "GL_ARB_compatibility")? {
                    // A compatibility context by definition.
                    OpenGlProfile::Compat
                } else {
                    OpenGlProfile::Any
                };
            }

            let robustness_ext = match client {
                ClientApi::OpenGlEs => "GL_EXT_robustness",
                _ => "GL_ARB_robustness",
            };
            if fns.extension_supported(major, robustness_ext)? {
                attribs.robustness = match fns.integer(GL_RESET_NOTIFICATION_STRATEGY_ARB) {
                    GL_LOSE_CONTEXT_ON_RESET_ARB => ContextRobustness::LoseContextOnReset,
                    GL_NO_RESET_NOTIFICATION_ARB => ContextRobustness::NoResetNotification,
                    _ => ContextRobustness::NoRobustness,
                };
            }

            if fns.extension_supported(major, "GL_KHR_context_flush_control")? {
                match fns.integer(GL_CONTEXT_RELEASE_BEHAVIOR) {
                    GL_NONE => attribs.release = ContextReleaseBehavior::None,
                    GL_CONTEXT_RELEASE_BEHAVIOR_FLUSH => attribs.release = ContextReleaseBehavior::Flush,
                    _ => (),
                }
            }

            // Clear the front buffer, which may hold garbage left over from
            // previous uses of this bit of VRAM.
            if let Some(clear) = fns.clear {
                unsafe { clear(GL_COLOR_BUFFER_BIT) };
            }
            if window.shared.double_buffer {
                ctx.native.swap_buffers()?;
            }
            attribs
        };
        attribs.source = window.shared.context.borrow().as_ref().map_or(attribs.source, |c| c.attribs.source);
        if let Some(ctx) = window.shared.context.borrow_mut().as_mut() {
            ctx.attribs = attribs;
        }
        Ok(())
    }

    pub(crate) fn extension_supported(&self, name: &str) -> Result<bool> {
        let window = self.current_context().ok_or_else(Error::no_current_context)?;
        if name.is_empty() {
            return error::invalid_value("Extension name cannot be an empty string");
        }
        let ctx = window.shared.context.borrow();
        let ctx = ctx.as_ref().ok_or_else(Error::no_window_context)?;
        let fns = GlFns::load(ctx.native.as_ref())?;
        if fns.extension_supported(ctx.attribs.major, name)? {
            return Ok(true);
        }
        Ok(ctx.native.extension_supported(name))
    }
}

impl Library {
    /// Makes the window's context current on the calling thread, or detaches the current one.
    pub fn make_context_current(&self, window: Option<&Window>) -> Result<()> {
        self.entry().and_then(|lib| lib.make_context_current(window)).reported()
    }

    /// The window whose context is current on the calling thread.
    pub fn current_context(&self) -> Result<Option<Window>> {
        self.entry().map(|lib| lib.current_context()).reported()
    }

    /// Sets how many vertical blanks `swap_buffers()` waits for, for the current context.
    pub fn swap_interval(&self, interval: i32) -> Result<()> {
        self.entry().and_then(|lib| {
            let window = lib.current_context().ok_or_else(Error::no_current_context)?;
            let ctx = window.shared.context.borrow();
            ctx.as_ref().ok_or_else(Error::no_window_context)?.native.swap_interval(interval)
        }).reported()
    }

    /// Is the extension supported by the current context, either as a GL or a window-system one?
    pub fn extension_supported(&self, name: &str) -> Result<bool> {
        self.entry().and_then(|lib| lib.extension_supported(name)).reported()
    }

    /// Looks up a client API function for the current context. Null if unsupported.
    pub fn get_proc_address(&self, name: &str) -> Result<GlProc> {
        self.entry().and_then(|lib| {
            let window = lib.current_context().ok_or_else(Error::no_current_context)?;
            let ctx = window.shared.context.borrow();
            Ok(ctx.as_ref().ok_or_else(Error::no_window_context)?.native.get_proc_address(name))
        }).reported()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(fb: FramebufferConfig) -> FbCandidate {
        FbCandidate { fb, accelerated: true, window_drawable: true }
    }

    #[test]
    fn version_strings() {
        assert_eq!(parse_version("4.6.0 NVIDIA 470.57.02").unwrap(), (ClientApi::OpenGl, 4, 6, 0));
        assert_eq!(parse_version("3.3 (Core Profile) Mesa 21.0.3").unwrap(), (ClientApi::OpenGl, 3, 3, 0));
        assert_eq!(parse_version("OpenGL ES 3.2 Mesa 20.0").unwrap(), (ClientApi::OpenGlEs, 3, 2, 0));
        assert_eq!(parse_version("OpenGL ES-CM 1.1").unwrap(), (ClientApi::OpenGlEs, 1, 1, 0));
        assert_eq!(parse_version("2.1.2").unwrap(), (ClientApi::OpenGl, 2, 1, 2));
        assert!(parse_version("garbage").is_err());
    }

    #[test]
    fn extension_strings_match_whole_words() {
        let exts = "GL_ARB_robustness GL_ARB_robustness_isolation WGL_EXT_swap_control";
        assert!(string_in_extension_string("GL_ARB_robustness", exts));
        assert!(string_in_extension_string("WGL_EXT_swap_control", exts));
        assert!(!string_in_extension_string("GL_ARB_robust", exts));
    }

    #[test]
    fn missing_buffers_outweigh_color() {
        let desired = FramebufferConfig::default();
        let no_depth = FramebufferConfig { depth_bits: 0, ..FramebufferConfig::default() };
        let low_color = FramebufferConfig { red_bits: 5, green_bits: 6, blue_bits: 5, handle: 1, ..FramebufferConfig::default() };
        let candidates = vec![candidate(no_depth), candidate(low_color)];
        assert_eq!(choose_fb_config(&desired, &candidates).unwrap().fb.handle, 1);
    }

    #[test]
    fn hard_constraints_filter() {
        let desired = FramebufferConfig { stereo: true, ..FramebufferConfig::default() };
        let mono = candidate(FramebufferConfig::default());
        assert!(choose_fb_config(&desired, &[mono]).is_none());

        let desired = FramebufferConfig::default();
        let single = candidate(FramebufferConfig { double_buffer: false, ..FramebufferConfig::default() });
        let mut software = candidate(FramebufferConfig::default());
        software.accelerated = false;
        assert!(choose_fb_config(&desired, &[single, software]).is_none());
    }

    #[test]
    fn srgb_and_samples_break_ties() {
        let desired = FramebufferConfig { srgb: true, samples: 4, ..FramebufferConfig::default() };
        let plain = candidate(FramebufferConfig { handle: 0, ..FramebufferConfig::default() });
        let srgb = candidate(FramebufferConfig { srgb: true, handle: 1, ..FramebufferConfig::default() });
        let msaa = candidate(FramebufferConfig { samples: 4, handle: 2, ..FramebufferConfig::default() });
        // Missing multisampling counts as a missing buffer.
        assert_eq!(choose_fb_config(&desired, &[plain.clone(), srgb.clone(), msaa.clone()]).unwrap().fb.handle, 2);
        let desired = FramebufferConfig { srgb: true, ..FramebufferConfig::default() };
        assert_eq!(choose_fb_config(&desired, &[plain, srgb]).unwrap().fb.handle, 1);
    }

    #[test]
    fn context_versions() {
        let gl = |major, minor| ContextConfig { client: ClientApi::OpenGl.raw(), major, minor, ..ContextConfig::default() };
        assert!(check_context_config(&gl(1, 5), None).is_ok());
        assert!(check_context_config(&gl(4, 6), None).is_ok());
        for &(major, minor) in &[(1, 6), (2, 2), (3, 4), (0, 0), (1, -1)] {
            assert_eq!(check_context_config(&gl(major, minor), None).unwrap_err().kind, error::ErrorKind::InvalidValue);
        }
        let es = ContextConfig { client: ClientApi::OpenGlEs.raw(), major: 2, minor: 1, ..ContextConfig::default() };
        assert_eq!(check_context_config(&es, None).unwrap_err().kind, error::ErrorKind::InvalidValue);
    }

    #[test]
    fn profiles_and_forward_compat_need_modern_versions() {
        let core_31 = ContextConfig { client: ClientApi::OpenGl.raw(), major: 3, minor: 1, profile: OpenGlProfile::Core.raw(), ..ContextConfig::default() };
        assert_eq!(check_context_config(&core_31, None).unwrap_err().kind, error::ErrorKind::InvalidValue);
        let core_32 = ContextConfig { minor: 2, ..core_31.clone() };
        assert!(check_context_config(&core_32, None).is_ok());
        let bad_profile = ContextConfig { profile: 42, ..core_32 };
        assert_eq!(check_context_config(&bad_profile, None).unwrap_err().kind, error::ErrorKind::InvalidEnum);
        let fwd_21 = ContextConfig { client: ClientApi::OpenGl.raw(), major: 2, minor: 1, forward: true, ..ContextConfig::default() };
        assert_eq!(check_context_config(&fwd_21, None).unwrap_err().kind, error::ErrorKind::InvalidValue);
    }

    #[test]
    fn enums_are_checked() {
        let bad_client = ContextConfig { client: 7, ..ContextConfig::default() };
        assert_eq!(check_context_config(&bad_client, None).unwrap_err().kind, error::ErrorKind::InvalidEnum);
        let bad_source = ContextConfig { source: 7, ..ContextConfig::default() };
        assert_eq!(check_context_config(&bad_source, None).unwrap_err().kind, error::ErrorKind::InvalidEnum);
        let bad_release = ContextConfig { release: 7, ..ContextConfig::default() };
        assert_eq!(check_context_config(&bad_release, None).unwrap_err().kind, error::ErrorKind::InvalidEnum);
    }
}
