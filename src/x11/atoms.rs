use std::ffi::CStr;
use x11_dl::xlib::{self as x, Xlib};

/// Generate this module's `PreloadedAtoms` struct, where all atoms are retrieved
/// once when opening a display.
macro_rules! atoms {
    ($($atom:ident)+) => {
        #[allow(non_snake_case)]
        #[derive(Debug, Hash, PartialEq, Eq)]
        pub struct PreloadedAtoms {
            $(pub $atom: x::Atom,)+
        }
        #[allow(non_snake_case)]
        impl PreloadedAtoms {
            pub unsafe fn load(xlib: &Xlib, x_display: *mut x::Display) -> Self {
                $(
                    let name = concat!(stringify!($atom), "\0");
                    let $atom = (xlib.XInternAtom)(x_display, name.as_ptr() as *const _, x::False);
                    trace!("Atom {} = {}", stringify!($atom), $atom);
                )+
                Self { $($atom,)+ }
            }
        }
    }
}

atoms!(
    UTF8_STRING
    CLIPBOARD
    TARGETS
    MULTIPLE
    ATOM_PAIR
    INCR
    NULL
    WINPAL_SELECTION

    WM_PROTOCOLS
    WM_DELETE_WINDOW
    WM_STATE

    _MOTIF_WM_HINTS

    _NET_SUPPORTED
    _NET_SUPPORTING_WM_CHECK
    _NET_ACTIVE_WINDOW
    _NET_CURRENT_DESKTOP
    _NET_WORKAREA
    _NET_FRAME_EXTENTS
    _NET_WM_NAME
    _NET_WM_ICON_NAME
    _NET_WM_ICON
    _NET_WM_PID
    _NET_WM_PING
    _NET_WM_WINDOW_TYPE
    _NET_WM_WINDOW_TYPE_NORMAL
    _NET_WM_STATE
    _NET_WM_STATE_ABOVE
    _NET_WM_STATE_FULLSCREEN
    _NET_WM_STATE_MAXIMIZED_VERT
    _NET_WM_STATE_MAXIMIZED_HORZ
    _NET_WM_STATE_DEMANDS_ATTENTION
    _NET_WM_BYPASS_COMPOSITOR
    _NET_WM_WINDOW_OPACITY

    XdndAware
    XdndEnter
    XdndPosition
    XdndStatus
    XdndActionCopy
    XdndDrop
    XdndFinished
    XdndSelection
    XdndTypeList
    text_uri_list
);

impl PreloadedAtoms {
    /// `text/uri-list` can't be spelled as an identifier.
    pub unsafe fn fix_up(&mut self, xlib: &Xlib, x_display: *mut x::Display) {
        let name = CStr::from_bytes_with_nul_unchecked(b"text/uri-list\0");
        self.text_uri_list = (xlib.XInternAtom)(x_display, name.as_ptr(), x::False);
    }
}
