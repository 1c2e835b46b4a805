//! Cursor images: custom RGBA ones, and the system's standard shapes.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};
use crate::error::{Reported, Result};
use crate::library::LibraryShared;
use crate::platform::CursorId;

/// Standard cursor shapes.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
#[repr(i32)]
pub enum StandardCursor {
    /// The regular arrow.
    Arrow = 0x0003_6001,
    /// Text input I-beam.
    IBeam = 0x0003_6002,
    #[allow(missing_docs)]
    Crosshair = 0x0003_6003,
    /// Pointing hand, for links and buttons.
    PointingHand = 0x0003_6004,
    /// Horizontal resize arrows.
    ResizeEW = 0x0003_6005,
    /// Vertical resize arrows.
    ResizeNS = 0x0003_6006,
    /// Diagonal resize arrows, top-left to bottom-right.
    ResizeNWSE = 0x0003_6007,
    /// Diagonal resize arrows, top-right to bottom-left.
    ResizeNESW = 0x0003_6008,
    /// Omnidirectional resize (move) arrows.
    ResizeAll = 0x0003_6009,
    /// Operation-not-allowed shape.
    NotAllowed = 0x0003_600A,
}

impl StandardCursor {
    /// All shapes, in raw order.
    pub const ALL: [StandardCursor; 10] = [
        StandardCursor::Arrow, StandardCursor::IBeam, StandardCursor::Crosshair,
        StandardCursor::PointingHand, StandardCursor::ResizeEW, StandardCursor::ResizeNS,
        StandardCursor::ResizeNWSE, StandardCursor::ResizeNESW, StandardCursor::ResizeAll,
        StandardCursor::NotAllowed,
    ];
}

pub(crate) struct CursorShared {
    pub lib: Weak<LibraryShared>,
    pub id: CursorId,
    pub shape: Option<StandardCursor>,
    pub destroyed: Cell<bool>,
}

/// A cursor image owned by the library. Cheap to clone.
#[derive(Clone)]
pub struct Cursor {
    pub(crate) shared: Rc<CursorShared>,
}

impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }
}
impl Eq for Cursor {}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Cursor").field("id", &self.shared.id).field("shape", &self.shared.shape).finish()
    }
}

impl Cursor {
    /// The standard shape this cursor was created with, if any.
    pub fn shape(&self) -> Option<StandardCursor> {
        self.shared.shape
    }
    /// Destroys the cursor. Windows using it revert to the default arrow.
    pub fn destroy(&self) -> Result<()> {
        LibraryShared::upgrade(&self.shared.lib).and_then(|lib| {
            if self.shared.destroyed.get() {
                return Ok(());
            }
            lib.destroy_cursor(self)
        }).reported()
    }
}
