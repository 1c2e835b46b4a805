//! Hints: inputs to `init()` and to the next `Library::create_window()`.
//!
//! Init hints affect the next initialization on the calling thread. Window
//! hints are stored by the `Library` and snapshotted by `create_window()`, so
//! later changes never affect existing windows.

use std::cell::RefCell;
use crate::error::{self, Result};
use crate::platform::PlatformKind;

/// Sentinel meaning "any value is acceptable".
pub const DONT_CARE: i32 = -1;
/// Integer truth value used by hints and attributes.
pub const TRUE: i32 = 1;
/// Integer false value used by hints and attributes.
pub const FALSE: i32 = 0;

/// Hints affecting the next call to `init()` on this thread.
#[derive(Debug, Clone, PartialEq)]
pub enum InitHint {
    /// Selects the backend. Defaults to `PlatformKind::Any`.
    Platform(PlatformKind),
    /// Calls `XInitThreads()`, which allows using Xlib from multiple threads.
    /// By default, it is not called.
    XlibXInitThreads(bool),
    /// If `false`, this crate's Xlib error handlers are used. Otherwise, they aren't. Defaults to
    /// `false`.
    XlibDefaultErrorHandlers(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct InitHints {
    pub platform: PlatformKind,
    pub xlib_xinitthreads: bool,
    pub xlib_default_error_handlers: bool,
}

impl Default for InitHints {
    fn default() -> Self {
        Self {
            platform: PlatformKind::Any,
            xlib_xinitthreads: false,
            xlib_default_error_handlers: false,
        }
    }
}

thread_local! {
    static INIT_HINTS: RefCell<InitHints> = RefCell::new(InitHints::default());
}

/// Sets a hint for the next `init()` on the calling thread.
pub fn init_hint(hint: InitHint) {
    INIT_HINTS.with(|h| {
        let mut h = h.borrow_mut();
        match hint {
            InitHint::Platform(p) => h.platform = p,
            InitHint::XlibXInitThreads(b) => h.xlib_xinitthreads = b,
            InitHint::XlibDefaultErrorHandlers(b) => h.xlib_default_error_handlers = b,
        }
    })
}

pub(crate) fn init_hints() -> InitHints {
    INIT_HINTS.with(|h| h.borrow().clone())
}

macro_rules! raw_enum {
    ($(#[$meta:meta])* pub enum $Name:ident { $($(#[$vmeta:meta])* $Variant:ident = $raw:expr,)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
        #[repr(i32)]
        #[allow(missing_docs)]
        pub enum $Name { $($(#[$vmeta])* $Variant = $raw,)+ }

        impl $Name {
            /// Converts from the raw integer value, if it names a variant.
            pub fn from_raw(raw: i32) -> Option<Self> {
                match raw {
                    $(x if x == $raw => Some($Name::$Variant),)+
                    _ => None,
                }
            }
            /// Gets the raw integer value.
            pub fn raw(self) -> i32 {
                self as i32
            }
        }

        impl From<$Name> for i32 {
            fn from(v: $Name) -> i32 {
                v as i32
            }
        }
    };
}

raw_enum!{
    /// Integer window, framebuffer and context hints.
    pub enum Hint {
        Focused = 0x0002_0001,
        Resizable = 0x0002_0003,
        Visible = 0x0002_0004,
        Decorated = 0x0002_0005,
        AutoIconify = 0x0002_0006,
        Floating = 0x0002_0007,
        Maximized = 0x0002_0008,
        CenterCursor = 0x0002_0009,
        TransparentFramebuffer = 0x0002_000A,
        FocusOnShow = 0x0002_000C,
        MousePassthrough = 0x0002_000D,
        RedBits = 0x0002_1001,
        GreenBits = 0x0002_1002,
        BlueBits = 0x0002_1003,
        AlphaBits = 0x0002_1004,
        DepthBits = 0x0002_1005,
        StencilBits = 0x0002_1006,
        AccumRedBits = 0x0002_1007,
        AccumGreenBits = 0x0002_1008,
        AccumBlueBits = 0x0002_1009,
        AccumAlphaBits = 0x0002_100A,
        AuxBuffers = 0x0002_100B,
        Stereo = 0x0002_100C,
        Samples = 0x0002_100D,
        SrgbCapable = 0x0002_100E,
        RefreshRate = 0x0002_100F,
        DoubleBuffer = 0x0002_1010,
        ClientApi = 0x0002_2001,
        ContextVersionMajor = 0x0002_2002,
        ContextVersionMinor = 0x0002_2003,
        ContextRobustness = 0x0002_2005,
        OpenGlForwardCompat = 0x0002_2006,
        ContextDebug = 0x0002_2007,
        OpenGlProfile = 0x0002_2008,
        ContextReleaseBehavior = 0x0002_2009,
        ContextNoError = 0x0002_200A,
        ContextCreationApi = 0x0002_200B,
        ScaleToMonitor = 0x0002_200C,
        X11ClassName = 0x0002_4001,
        X11InstanceName = 0x0002_4002,
    }
}

raw_enum!{
    /// Values of `Hint::ClientApi`.
    pub enum ClientApi {
        NoApi = 0,
        OpenGl = 0x0003_0001,
        OpenGlEs = 0x0003_0002,
    }
}

raw_enum!{
    /// Values of `Hint::ContextCreationApi`.
    pub enum ContextCreationApi {
        Native = 0x0003_6001,
        Egl = 0x0003_6002,
        OsMesa = 0x0003_6003,
    }
}

raw_enum!{
    /// Values of `Hint::OpenGlProfile`.
    pub enum OpenGlProfile {
        Any = 0,
        Core = 0x0003_2001,
        Compat = 0x0003_2002,
    }
}

raw_enum!{
    /// Values of `Hint::ContextRobustness`.
    pub enum ContextRobustness {
        NoRobustness = 0,
        NoResetNotification = 0x0003_1001,
        LoseContextOnReset = 0x0003_1002,
    }
}

raw_enum!{
    /// Values of `Hint::ContextReleaseBehavior`.
    pub enum ContextReleaseBehavior {
        Any = 0,
        Flush = 0x0003_5001,
        None = 0x0003_5002,
    }
}

raw_enum!{
    /// Window attributes, for `Window::attrib()` and `Window::set_attrib()`.
    pub enum WindowAttrib {
        Focused = 0x0002_0001,
        Iconified = 0x0002_0002,
        Resizable = 0x0002_0003,
        Visible = 0x0002_0004,
        Decorated = 0x0002_0005,
        AutoIconify = 0x0002_0006,
        Floating = 0x0002_0007,
        Maximized = 0x0002_0008,
        TransparentFramebuffer = 0x0002_000A,
        Hovered = 0x0002_000B,
        FocusOnShow = 0x0002_000C,
        MousePassthrough = 0x0002_000D,
        DoubleBuffer = 0x0002_1010,
        ClientApi = 0x0002_2001,
        ContextVersionMajor = 0x0002_2002,
        ContextVersionMinor = 0x0002_2003,
        ContextRevision = 0x0002_2004,
        ContextRobustness = 0x0002_2005,
        OpenGlForwardCompat = 0x0002_2006,
        ContextDebug = 0x0002_2007,
        OpenGlProfile = 0x0002_2008,
        ContextReleaseBehavior = 0x0002_2009,
        ContextNoError = 0x0002_200A,
        ContextCreationApi = 0x0002_200B,
    }
}

/// Window bundle, plus what `create_window()` adds to it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WindowConfig {
    pub width: i32,
    pub height: i32,
    pub title: String,
    pub resizable: bool,
    pub visible: bool,
    pub decorated: bool,
    pub focused: bool,
    pub auto_iconify: bool,
    pub floating: bool,
    pub maximized: bool,
    pub center_cursor: bool,
    pub focus_on_show: bool,
    pub mouse_passthrough: bool,
    pub scale_to_monitor: bool,
    pub x11_class_name: String,
    pub x11_instance_name: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            title: String::new(),
            resizable: true,
            visible: true,
            decorated: true,
            focused: true,
            auto_iconify: true,
            floating: false,
            maximized: false,
            center_cursor: true,
            focus_on_show: true,
            mouse_passthrough: false,
            scale_to_monitor: false,
            x11_class_name: String::new(),
            x11_instance_name: String::new(),
        }
    }
}

/// Framebuffer bundle. Also describes candidates during format selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FramebufferConfig {
    pub red_bits: i32,
    pub green_bits: i32,
    pub blue_bits: i32,
    pub alpha_bits: i32,
    pub depth_bits: i32,
    pub stencil_bits: i32,
    pub accum_red_bits: i32,
    pub accum_green_bits: i32,
    pub accum_blue_bits: i32,
    pub accum_alpha_bits: i32,
    pub aux_buffers: i32,
    pub stereo: bool,
    pub samples: i32,
    pub srgb: bool,
    pub double_buffer: bool,
    pub transparent: bool,
    /// Backend-specific identifier (pixel format index, FBConfig index...).
    pub handle: usize,
}

impl Default for FramebufferConfig {
    fn default() -> Self {
        Self {
            red_bits: 8,
            green_bits: 8,
            blue_bits: 8,
            alpha_bits: 8,
            depth_bits: 24,
            stencil_bits: 8,
            accum_red_bits: 0,
            accum_green_bits: 0,
            accum_blue_bits: 0,
            accum_alpha_bits: 0,
            aux_buffers: 0,
            stereo: false,
            samples: 0,
            srgb: false,
            double_buffer: true,
            transparent: false,
            handle: 0,
        }
    }
}

/// Context bundle. Enum-valued fields stay raw until validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ContextConfig {
    pub client: i32,
    pub source: i32,
    pub major: i32,
    pub minor: i32,
    pub forward: bool,
    pub debug: bool,
    pub no_error: bool,
    pub profile: i32,
    pub robustness: i32,
    pub release: i32,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            client: ClientApi::NoApi.raw(),
            source: ContextCreationApi::Native.raw(),
            major: 1,
            minor: 0,
            forward: false,
            debug: false,
            no_error: false,
            profile: OpenGlProfile::Any.raw(),
            robustness: ContextRobustness::NoRobustness.raw(),
            release: ContextReleaseBehavior::Any.raw(),
        }
    }
}

/// Everything `window_hint()` writes into.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Hints {
    pub window: WindowConfig,
    pub framebuffer: FramebufferConfig,
    pub context: ContextConfig,
    pub refresh_rate: i32,
}

impl Default for Hints {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            framebuffer: FramebufferConfig::default(),
            context: ContextConfig::default(),
            refresh_rate: DONT_CARE,
        }
    }
}

impl Hints {
    pub fn set(&mut self, hint: Hint, value: i32) {
        let b = value != FALSE;
        let fb = &mut self.framebuffer;
        let w = &mut self.window;
        let ctx = &mut self.context;
        match hint {
            Hint::RedBits => fb.red_bits = value,
            Hint::GreenBits => fb.green_bits = value,
            Hint::BlueBits => fb.blue_bits = value,
            Hint::AlphaBits => fb.alpha_bits = value,
            Hint::DepthBits => fb.depth_bits = value,
            Hint::StencilBits => fb.stencil_bits = value,
            Hint::AccumRedBits => fb.accum_red_bits = value,
            Hint::AccumGreenBits => fb.accum_green_bits = value,
            Hint::AccumBlueBits => fb.accum_blue_bits = value,
            Hint::AccumAlphaBits => fb.accum_alpha_bits = value,
            Hint::AuxBuffers => fb.aux_buffers = value,
            Hint::Stereo => fb.stereo = b,
            Hint::DoubleBuffer => fb.double_buffer = b,
            Hint::TransparentFramebuffer => fb.transparent = b,
            Hint::Samples => fb.samples = value,
            Hint::SrgbCapable => fb.srgb = b,
            Hint::Resizable => w.resizable = b,
            Hint::Decorated => w.decorated = b,
            Hint::Focused => w.focused = b,
            Hint::AutoIconify => w.auto_iconify = b,
            Hint::Floating => w.floating = b,
            Hint::Maximized => w.maximized = b,
            Hint::Visible => w.visible = b,
            Hint::CenterCursor => w.center_cursor = b,
            Hint::FocusOnShow => w.focus_on_show = b,
            Hint::MousePassthrough => w.mouse_passthrough = b,
            Hint::ScaleToMonitor => w.scale_to_monitor = b,
            Hint::ClientApi => ctx.client = value,
            Hint::ContextCreationApi => ctx.source = value,
            Hint::ContextVersionMajor => ctx.major = value,
            Hint::ContextVersionMinor => ctx.minor = value,
            Hint::ContextRobustness => ctx.robustness = value,
            Hint::OpenGlForwardCompat => ctx.forward = b,
            Hint::ContextDebug => ctx.debug = b,
            Hint::ContextNoError => ctx.no_error = b,
            Hint::OpenGlProfile => ctx.profile = value,
            Hint::ContextReleaseBehavior => ctx.release = value,
            Hint::RefreshRate => self.refresh_rate = value,
            Hint::X11ClassName | Hint::X11InstanceName => {
                warn!("Hint {:?} takes a string, ignoring integer value {}", hint, value);
            }
        }
    }

    pub fn set_string(&mut self, hint: Hint, value: &str) -> Result<()> {
        match hint {
            Hint::X11ClassName => self.window.x11_class_name = value.to_owned(),
            Hint::X11InstanceName => self.window.x11_instance_name = value.to_owned(),
            _ => return error::invalid_enum(format!("Invalid window hint string {:?}", hint)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_no_client_api() {
        let h = Hints::default();
        assert_eq!(h.context.client, ClientApi::NoApi.raw());
        assert_eq!(h.refresh_rate, DONT_CARE);
        assert_eq!((h.framebuffer.depth_bits, h.framebuffer.stencil_bits), (24, 8));
        assert!(h.framebuffer.double_buffer && !h.framebuffer.srgb);
        assert!(h.window.visible && h.window.focused && h.window.focus_on_show);
    }

    #[test]
    fn invalid_enum_values_are_stored_verbatim() {
        let mut h = Hints::default();
        h.set(Hint::ClientApi, 0x1234);
        assert_eq!(h.context.client, 0x1234);
        assert_eq!(ClientApi::from_raw(0x1234), None);
    }

    #[test]
    fn string_hints_reject_integer_keys() {
        let mut h = Hints::default();
        assert!(h.set_string(Hint::X11ClassName, "game").is_ok());
        assert_eq!(h.window.x11_class_name, "game");
        let e = h.set_string(Hint::Visible, "yes").unwrap_err();
        assert_eq!(e.kind, error::ErrorKind::InvalidEnum);
    }

    #[test]
    fn raw_round_trip() {
        assert_eq!(Hint::from_raw(0x0002_200C), Some(Hint::ScaleToMonitor));
        assert_eq!(i32::from(OpenGlProfile::Core), 0x0003_2001);
    }
}
