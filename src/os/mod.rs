//! Backend selection.

use std::rc::Rc;
use crate::error::{self, Result};
use crate::hint::InitHints;
use crate::null::NullPlatform;
use crate::platform::{Platform, PlatformKind};

#[cfg(windows)]
pub(crate) mod windows;

#[cfg(windows)]
fn connect_win32() -> Result<Rc<dyn Platform>> {
    Ok(Rc::new(windows::Win32Platform::connect()?))
}
#[cfg(not(windows))]
fn connect_win32() -> Result<Rc<dyn Platform>> {
    error::failed("The Win32 backend is only available on Windows")
}

#[cfg(target_os = "macos")]
pub(crate) mod macos;

#[cfg(target_os = "macos")]
fn connect_cocoa() -> Result<Rc<dyn Platform>> {
    Ok(Rc::new(macos::CocoaPlatform::connect()?))
}
#[cfg(not(target_os = "macos"))]
fn connect_cocoa() -> Result<Rc<dyn Platform>> {
    error::failed("The Cocoa backend is only available on macOS")
}

#[cfg(x11)]
fn connect_x11(hints: &InitHints) -> Result<Rc<dyn Platform>> {
    Ok(Rc::new(crate::x11::X11Platform::connect(hints)?))
}
#[cfg(not(x11))]
fn connect_x11(_hints: &InitHints) -> Result<Rc<dyn Platform>> {
    error::failed("The X11 backend was not compiled in; enable the `x11` feature")
}

/// Connects to the backend named by the init hints.
pub(crate) fn connect(hints: &InitHints) -> Result<Rc<dyn Platform>> {
    match hints.platform {
        PlatformKind::Null => Ok(Rc::new(NullPlatform::connect())),
        PlatformKind::Win32 => connect_win32(),
        PlatformKind::X11 => connect_x11(hints),
        PlatformKind::Cocoa => connect_cocoa(),
        PlatformKind::Any => {
            if cfg!(windows) {
                connect_win32()
            } else if cfg!(target_os = "macos") {
                connect_cocoa()
            } else if cfg!(x11) {
                connect_x11(hints)
            } else {
                error::failed("No native backend for this target; select PlatformKind::Null explicitly")
            }
        },
    }
}
