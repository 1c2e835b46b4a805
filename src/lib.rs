//! winpal - Windowing Platform Abstraction Layer
//!
//! Windows, monitors, input and OpenGL contexts for 2D game engines, over
//! native backends (Win32, X11) and a headless `Null` backend.
//!
//! ```no_run
//! # fn main() -> winpal::Result<()> {
//! let lib = winpal::init()?;
//! lib.window_hint(winpal::Hint::ClientApi, winpal::ClientApi::OpenGl)?;
//! let window = lib.create_window(800, 600, "Hello", None, None)?;
//! lib.make_context_current(Some(&window))?;
//! while !window.should_close()? {
//!     window.swap_buffers()?;
//!     lib.poll_events()?;
//! }
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/winpal/0.3.0")]
#![warn(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate log;
#[macro_use]
extern crate bitflags;
extern crate vek;

pub use vek::{Vec2, Extent2, Rect, Rgba};

pub mod error;
pub use error::{get_error, Error, ErrorKind, Result};
pub mod hint;
pub use hint::{
    init_hint, InitHint, Hint, WindowAttrib,
    ClientApi, ContextCreationApi, OpenGlProfile, ContextRobustness, ContextReleaseBehavior,
    DONT_CARE, TRUE, FALSE,
};
pub mod timeout;
pub use timeout::Timeout;
pub mod image;
pub use image::{Image, RgbaImage};
pub mod input;
pub use input::{Key, Action, Modifiers, MouseButton, CursorMode, InputMode};
pub mod monitor;
pub use monitor::{Monitor, VideoMode, PeripheralEvent, MonitorCallback};
pub mod library;
pub use library::{init, Library, EventPoster};
pub mod cursor;
pub use cursor::{Cursor, StandardCursor};
pub mod window;
pub use window::Window;
pub mod platform;
pub use platform::{PlatformKind, FrameExtents, GlProc};
pub mod null;

mod tls;
mod event;
mod gl;
mod os;

#[cfg(x11)]
mod x11;
