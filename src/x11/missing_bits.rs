#![allow(dead_code)]
#![allow(non_upper_case_globals)]

// Protocol constants, spelled out here so their types match how they're used.

pub mod glx {
    pub const GLX_VENDOR                                 : i32 = 1;
    pub const GLX_VERSION                                : i32 = 2;
    pub const GLX_EXTENSIONS                             : i32 = 3;
    pub const GLX_DOUBLEBUFFER                           : i32 = 5;
    pub const GLX_STEREO                                 : i32 = 6;
    pub const GLX_AUX_BUFFERS                            : i32 = 7;
    pub const GLX_RED_SIZE                               : i32 = 8;
    pub const GLX_GREEN_SIZE                             : i32 = 9;
    pub const GLX_BLUE_SIZE                              : i32 = 10;
    pub const GLX_ALPHA_SIZE                             : i32 = 11;
    pub const GLX_DEPTH_SIZE                             : i32 = 12;
    pub const GLX_STENCIL_SIZE                           : i32 = 13;
    pub const GLX_ACCUM_RED_SIZE                         : i32 = 14;
    pub const GLX_ACCUM_GREEN_SIZE                       : i32 = 15;
    pub const GLX_ACCUM_BLUE_SIZE                        : i32 = 16;
    pub const GLX_ACCUM_ALPHA_SIZE                       : i32 = 17;
    pub const GLX_CONFIG_CAVEAT                          : i32 = 0x20;
    pub const GLX_SLOW_CONFIG                            : i32 = 0x8001;
    pub const GLX_DRAWABLE_TYPE                          : i32 = 0x8010;
    pub const GLX_RENDER_TYPE                            : i32 = 0x8011;
    pub const GLX_RGBA_TYPE                              : i32 = 0x8014;
    pub const GLX_WINDOW_BIT                             : i32 = 0x0001;
    pub const GLX_RGBA_BIT                               : i32 = 0x0001;
    pub const GLX_X_RENDERABLE                           : i32 = 0x8012;
    pub const GLX_SAMPLE_BUFFERS                         : i32 = 100000;
    pub const GLX_SAMPLES                                : i32 = 100001;
    pub const GLX_FRAMEBUFFER_SRGB_CAPABLE_ARB           : i32 = 0x20B2;

    pub const GLX_CONTEXT_MAJOR_VERSION_ARB              : i32 = 0x2091;
    pub const GLX_CONTEXT_MINOR_VERSION_ARB              : i32 = 0x2092;
    pub const GLX_CONTEXT_FLAGS_ARB                      : i32 = 0x2094;
    pub const GLX_CONTEXT_PROFILE_MASK_ARB               : i32 = 0x9126;
    pub const GLX_CONTEXT_DEBUG_BIT_ARB                  : i32 = 0x0001;
    pub const GLX_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB     : i32 = 0x0002;
    pub const GLX_CONTEXT_CORE_PROFILE_BIT_ARB           : i32 = 0x0001;
    pub const GLX_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB  : i32 = 0x0002;
    pub const GLX_CONTEXT_ES2_PROFILE_BIT_EXT            : i32 = 0x0004;
    pub const GLX_CONTEXT_ROBUST_ACCESS_BIT_ARB          : i32 = 0x0004;
    pub const GLX_CONTEXT_RESET_NOTIFICATION_STRATEGY_ARB: i32 = 0x8256;
    pub const GLX_NO_RESET_NOTIFICATION_ARB              : i32 = 0x8261;
    pub const GLX_LOSE_CONTEXT_ON_RESET_ARB              : i32 = 0x8252;
    pub const GLX_CONTEXT_RELEASE_BEHAVIOR_ARB           : i32 = 0x2097;
    pub const GLX_CONTEXT_RELEASE_BEHAVIOR_NONE_ARB      : i32 = 0;
    pub const GLX_CONTEXT_RELEASE_BEHAVIOR_FLUSH_ARB     : i32 = 0x2098;
    pub const GLX_CONTEXT_OPENGL_NO_ERROR_ARB            : i32 = 0x31B3;
}

pub mod xlib {
    use std::os::raw::{c_int, c_long, c_uint, c_ulong};

    pub const KeyPress        : c_int = 2;
    pub const KeyRelease      : c_int = 3;
    pub const ButtonPress     : c_int = 4;
    pub const ButtonRelease   : c_int = 5;
    pub const MotionNotify    : c_int = 6;
    pub const EnterNotify     : c_int = 7;
    pub const LeaveNotify     : c_int = 8;
    pub const FocusIn         : c_int = 9;
    pub const FocusOut        : c_int = 10;
    pub const Expose          : c_int = 12;
    pub const VisibilityNotify: c_int = 15;
    pub const UnmapNotify     : c_int = 18;
    pub const MapNotify       : c_int = 19;
    pub const ConfigureNotify : c_int = 22;
    pub const PropertyNotify  : c_int = 28;
    pub const SelectionClear  : c_int = 29;
    pub const SelectionRequest: c_int = 30;
    pub const SelectionNotify : c_int = 31;
    pub const ClientMessage   : c_int = 33;
    pub const GenericEvent    : c_int = 35;

    pub const KeyPressMask         : c_long = 1 << 0;
    pub const KeyReleaseMask       : c_long = 1 << 1;
    pub const ButtonPressMask      : c_long = 1 << 2;
    pub const ButtonReleaseMask    : c_long = 1 << 3;
    pub const EnterWindowMask      : c_long = 1 << 4;
    pub const LeaveWindowMask      : c_long = 1 << 5;
    pub const PointerMotionMask    : c_long = 1 << 6;
    pub const ExposureMask         : c_long = 1 << 15;
    pub const VisibilityChangeMask : c_long = 1 << 16;
    pub const StructureNotifyMask  : c_long = 1 << 17;
    pub const SubstructureNotifyMask  : c_long = 1 << 19;
    pub const SubstructureRedirectMask: c_long = 1 << 20;
    pub const FocusChangeMask      : c_long = 1 << 21;
    pub const PropertyChangeMask   : c_long = 1 << 22;

    pub const ShiftMask  : c_uint = 1 << 0;
    pub const LockMask   : c_uint = 1 << 1;
    pub const ControlMask: c_uint = 1 << 2;
    pub const Mod1Mask   : c_uint = 1 << 3;
    pub const Mod2Mask   : c_uint = 1 << 4;
    pub const Mod4Mask   : c_uint = 1 << 6;

    pub const CWBorderPixel     : c_ulong = 1 << 3;
    pub const CWEventMask       : c_ulong = 1 << 11;
    pub const CWColormap        : c_ulong = 1 << 13;

    pub const InputOutput: c_uint = 1;
    pub const InputOnly  : c_uint = 2;
    pub const AllocNone  : c_int = 0;
    pub const IsViewable : c_int = 2;

    pub const PropModeReplace: c_int = 0;
    pub const AnyPropertyType: c_ulong = 0;
    pub const XA_ATOM    : c_ulong = 4;
    pub const XA_CARDINAL: c_ulong = 6;
    pub const XA_STRING  : c_ulong = 31;
    pub const XA_WINDOW  : c_ulong = 33;

    pub const CurrentTime   : c_ulong = 0;
    pub const NotifyNormal  : c_int = 0;
    pub const NotifyGrab    : c_int = 1;
    pub const NotifyUngrab  : c_int = 2;
    pub const NotifyWhileGrabbed: c_int = 3;
    pub const NotifyInferior: c_int = 2;
    pub const NewValue      : c_int = 0;
    pub const GrabModeAsync : c_int = 1;
    pub const GrabSuccess   : c_int = 0;
    pub const RevertToParent: c_int = 2;

    pub const PPosition  : c_long = 1 << 2;
    pub const PMinSize   : c_long = 1 << 4;
    pub const PMaxSize   : c_long = 1 << 5;
    pub const PAspect    : c_long = 1 << 7;
    pub const PWinGravity: c_long = 1 << 9;
    pub const StaticGravity: c_int = 10;

    pub const StateHint: c_long = 1 << 1;

    pub const Button1: c_uint = 1;
    pub const Button2: c_uint = 2;
    pub const Button3: c_uint = 3;
    pub const Button4: c_uint = 4;
    pub const Button5: c_uint = 5;
    pub const Button6: c_uint = 6;
    pub const Button7: c_uint = 7;

    pub const XNInputStyle  : &[u8] = b"inputStyle\0";
    pub const XNClientWindow: &[u8] = b"clientWindow\0";
    pub const XNFocusWindow : &[u8] = b"focusWindow\0";
    pub const XIMPreeditNothing: c_ulong = 0x0008;
    pub const XIMStatusNothing : c_ulong = 0x0400;
}

pub mod wm_state {
    pub const WithdrawnState: i64 = 0;
    pub const NormalState: i64 = 1;
    pub const IconicState: i64 = 3;
}

pub mod xrandr {
    use std::os::raw::{c_int, c_ulong, c_ushort};

    pub const RR_Connected: c_ushort = 0;
    pub const RR_Rotate_90: c_ushort = 2;
    pub const RR_Rotate_270: c_ushort = 8;
    pub const RR_Interlace: c_ulong = 0x0000_0010;
    pub const RRScreenChangeNotify: c_int = 0;
    pub const RRScreenChangeNotifyMask: c_int = 1 << 0;
    pub const RROutputChangeNotifyMask: c_int = 1 << 2;
}

pub mod xi {
    use std::os::raw::c_int;

    pub const XIAllMasterDevices: c_int = 1;
    pub const XI_RawMotion: c_int = 17;
    pub const XI_LASTEVENT: c_int = 26;

    pub fn XIMaskLen(event: c_int) -> c_int {
        (event >> 3) + 1
    }
    pub fn XISetMask(mask: &mut [u8], event: c_int) {
        mask[(event >> 3) as usize] |= 1 << (event & 7);
    }
    pub fn XIMaskIsSet(mask: &[u8], event: c_int) -> bool {
        mask.get((event >> 3) as usize).map_or(false, |m| m & (1 << (event & 7)) != 0)
    }
}

pub mod xfixes {
    pub const ShapeInput: i32 = 2;
}

pub mod cursor_font {
    use std::os::raw::c_uint;

    pub const XC_crosshair: c_uint = 34;
    pub const XC_fleur: c_uint = 52;
    pub const XC_hand2: c_uint = 60;
    pub const XC_left_ptr: c_uint = 68;
    pub const XC_sb_h_double_arrow: c_uint = 108;
    pub const XC_sb_v_double_arrow: c_uint = 116;
    pub const XC_xterm: c_uint = 152;
}
