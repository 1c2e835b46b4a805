//! The CLIPBOARD selection, owned through the helper window.

use std::os::raw::{c_int, c_long, c_uchar, c_ulong};
use std::time::{Duration, Instant};
use x11_dl::xlib as x;
use super::missing_bits::xlib::*;
use super::{prop, X11Platform};
use crate::error::{self, Result};

/// How long to wait for the selection owner before giving up.
const CONVERSION_TIMEOUT: Duration = Duration::from_secs(2);

/// Decodes `STRING` data, which is Latin-1.
pub(crate) fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

impl X11Platform {
    pub(super) fn x11_set_clipboard_string(&self, s: &str) -> Result<()> {
        *self.clipboard.borrow_mut() = s.to_owned();
        unsafe {
            (self.xlib.XSetSelectionOwner)(self.x_display, self.atoms.CLIPBOARD, self.helper_window, x::CurrentTime);
            if (self.xlib.XGetSelectionOwner)(self.x_display, self.atoms.CLIPBOARD) != self.helper_window {
                return error::failed("Failed to become owner of clipboard selection");
            }
        }
        Ok(())
    }

    pub(super) fn x11_clipboard_string(&self) -> Result<String> {
        unsafe {
            if (self.xlib.XGetSelectionOwner)(self.x_display, self.atoms.CLIPBOARD) == self.helper_window {
                return Ok(self.clipboard.borrow().clone());
            }
            for &target in &[self.atoms.UTF8_STRING, XA_STRING] {
                if let Some(s) = self.convert_selection(target)? {
                    return Ok(s);
                }
            }
        }
        error::format_unavailable("Failed to convert clipboard to string")
    }

    /// Waits for an event of `event_type` on the helper window that `accept` agrees with.
    unsafe fn wait_helper_event<F>(&self, event_type: c_int, mut accept: F) -> Option<x::XEvent>
        where F: FnMut(&x::XEvent) -> bool
    {
        let deadline = Instant::now() + CONVERSION_TIMEOUT;
        let mut event: x::XEvent = std::mem::zeroed();
        loop {
            while (self.xlib.XCheckTypedWindowEvent)(self.x_display, self.helper_window, event_type, &mut event) != x::False {
                if accept(&event) {
                    return Some(event);
                }
            }
            let now = Instant::now();
            if now >= deadline || !self.wait_for_x_event(Some(deadline - now)) {
                return None;
            }
        }
    }

    unsafe fn convert_selection(&self, target: x::Atom) -> Result<Option<String>> {
        let property = self.atoms.WINPAL_SELECTION;
        (self.xlib.XConvertSelection)(self.x_display, self.atoms.CLIPBOARD, target, property, self.helper_window, x::CurrentTime);
        let notify = match self.wait_helper_event(SelectionNotify, |e| e.selection.selection == self.atoms.CLIPBOARD) {
            Some(e) => e.selection,
            None => {
                warn!("The clipboard owner didn't answer in time");
                return Ok(None);
            },
        };
        if notify.property == 0 {
            return Ok(None);
        }

        let data = prop::get::<c_uchar>(&self.xlib, self.x_display, self.helper_window, property, AnyPropertyType);
        let data = match data {
            Ok(Some(data)) => data,
            _ => {
                // INCR transfers announce themselves with 32-bit data.
                return self.convert_incremental(target, property);
            },
        };
        (self.xlib.XDeleteProperty)(self.x_display, self.helper_window, property);
        Ok(Some(self.decode(target, &data.data)))
    }

    /// Reads a selection sent in chunks; each deletion of the property asks for the next one.
    unsafe fn convert_incremental(&self, target: x::Atom, property: x::Atom) -> Result<Option<String>> {
        let header = prop::get::<c_ulong>(&self.xlib, self.x_display, self.helper_window, property, AnyPropertyType)?;
        match header {
            Some(ref h) if h.actual_type == self.atoms.INCR => (),
            _ => return Ok(None),
        }
        (self.xlib.XDeleteProperty)(self.x_display, self.helper_window, property);
        (self.xlib.XFlush)(self.x_display);

        let mut bytes = Vec::new();
        loop {
            let new_value = self.wait_helper_event(PropertyNotify, |e| {
                e.property.atom == property && e.property.state == NewValue
            });
            if new_value.is_none() {
                warn!("Incremental clipboard transfer timed out");
                return Ok(None);
            }
            let chunk = prop::get::<c_uchar>(&self.xlib, self.x_display, self.helper_window, property, AnyPropertyType)?;
            (self.xlib.XDeleteProperty)(self.x_display, self.helper_window, property);
            (self.xlib.XFlush)(self.x_display);
            match chunk {
                Some(ref c) if !c.data.is_empty() => bytes.extend_from_slice(&c.data),
                _ => break,
            }
        }
        Ok(Some(self.decode(target, &bytes)))
    }

    fn decode(&self, target: x::Atom, bytes: &[u8]) -> String {
        if target == XA_STRING {
            latin1_to_string(bytes)
        } else {
            String::from_utf8_lossy(bytes).into_owned()
        }
    }

    /// Writes the converted selection for one target. Returns the property, or 0 on refusal.
    unsafe fn write_target_to_property(&self, request: &x::XSelectionRequestEvent) -> x::Atom {
        let targets = [self.atoms.TARGETS, self.atoms.MULTIPLE, self.atoms.UTF8_STRING, XA_STRING];
        let clipboard = self.clipboard.borrow();

        if request.property == 0 {
            // Obsolete clients.
            return 0;
        }
        if request.target == self.atoms.TARGETS {
            prop::set(&self.xlib, self.x_display, request.requestor, request.property, XA_ATOM, &targets[..]);
            return request.property;
        }
        if request.target == self.atoms.MULTIPLE {
            let pairs = prop::get::<c_ulong>(&self.xlib, self.x_display, request.requestor, request.property, self.atoms.ATOM_PAIR);
            let mut pairs = match pairs {
                Ok(Some(p)) => p.data,
                _ => return 0,
            };
            for pair in pairs.chunks_mut(2) {
                if pair.len() < 2 {
                    continue;
                }
                if pair[0] == self.atoms.UTF8_STRING || pair[0] == XA_STRING {
                    prop::set(&self.xlib, self.x_display, request.requestor, pair[1], pair[0], clipboard.as_bytes());
                } else {
                    pair[1] = 0;
                }
            }
            prop::set(&self.xlib, self.x_display, request.requestor, request.property, self.atoms.ATOM_PAIR, &pairs);
            return request.property;
        }
        if request.target == self.atoms.UTF8_STRING || request.target == XA_STRING {
            prop::set(&self.xlib, self.x_display, request.requestor, request.property, request.target, clipboard.as_bytes());
            return request.property;
        }
        0
    }

    pub(super) unsafe fn handle_selection_request(&self, request: &x::XSelectionRequestEvent) {
        let property = self.write_target_to_property(request);
        let mut reply: x::XEvent = std::mem::zeroed();
        reply.selection.type_ = SelectionNotify;
        reply.selection.selection = request.selection;
        reply.selection.target = request.target;
        reply.selection.property = property;
        reply.selection.requestor = request.requestor;
        reply.selection.time = request.time;
        (self.xlib.XSendEvent)(self.x_display, request.requestor, x::False, 0 as c_long, &mut reply);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_maps_bytes_to_code_points() {
        assert_eq!(latin1_to_string(b"caf\xE9"), "café");
    }
}
