//! Translating X events into `Event`s.

use std::os::raw::{c_char, c_int, c_long, c_uint, c_ulong};
use std::ptr;
use x11_dl::xlib as x;
use x11_dl::xinput2 as xi2;
use super::keys::keysym_to_char;
use super::missing_bits::xi::{XIMaskIsSet, XI_RawMotion};
use super::missing_bits::xlib::*;
use super::{prop, X11Platform};
use crate::event::Event;
use crate::input::{Action, Modifiers, MouseButton};
use crate::platform::WindowId;
use crate::{Extent2, Vec2};

const RRNotify: c_int = 1;
const XBufferOverflow: c_int = -1;
const XLookupChars: c_int = 2;
const XLookupBoth: c_int = 4;

/// State of an incoming drag and drop, between `XdndEnter` and `XdndDrop`.
#[derive(Debug, Copy, Clone, Default, Hash, PartialEq, Eq)]
pub(super) struct XdndState {
    pub version: c_long,
    pub source: x::Window,
    pub format: x::Atom,
}

pub(crate) fn translate_state(state: c_uint) -> Modifiers {
    let mut mods = Modifiers::empty();
    if state & ShiftMask != 0 {
        mods |= Modifiers::SHIFT;
    }
    if state & ControlMask != 0 {
        mods |= Modifiers::CONTROL;
    }
    if state & Mod1Mask != 0 {
        mods |= Modifiers::ALT;
    }
    if state & Mod4Mask != 0 {
        mods |= Modifiers::SUPER;
    }
    if state & LockMask != 0 {
        mods |= Modifiers::CAPS_LOCK;
    }
    if state & Mod2Mask != 0 {
        mods |= Modifiers::NUM_LOCK;
    }
    mods
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let Some(b) = s.get(i + 1..i + 3).and_then(|hex| u8::from_str_radix(hex, 16).ok()) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Splits a `text/uri-list` into paths, dropping comments and the `file://host` prefix.
pub(crate) fn parse_uri_list(text: &str) -> Vec<String> {
    text.split(|c| c == '\r' || c == '\n')
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let path = match line.strip_prefix("file://") {
                Some(rest) => match rest.find('/') {
                    Some(slash) => &rest[slash..],
                    None => rest,
                },
                None => line,
            };
            percent_decode(path)
        })
        .collect()
}

impl X11Platform {
    fn window_id(&self, handle: x::Window) -> Option<WindowId> {
        self.handles.borrow().get(&handle).cloned()
    }

    pub(super) unsafe fn process_event(&self, event: &mut x::XEvent, out: &mut Vec<Event>) {
        let event_type = event.get_type();

        // Key presses may feed the input method; the rest must be seen by it too.
        if (self.xlib.XFilterEvent)(event, 0) != x::False {
            return;
        }

        if event_type == GenericEvent {
            self.process_generic_event(event, out);
            return;
        }
        if let Some(randr) = self.randr.as_ref() {
            if event_type == randr.event_base + RRNotify {
                (randr.lib.XRRUpdateConfiguration)(event);
                out.push(Event::MonitorsChanged);
                return;
            }
        }

        match event_type {
            SelectionRequest => {
                self.handle_selection_request(&event.selection_request);
                return;
            },
            SelectionClear => return,
            _ => (),
        }

        let handle = event.any.window;
        let id = match self.window_id(handle) {
            Some(id) => id,
            None => return,
        };

        match event_type {
            KeyPress => self.process_key_press(id, event, out),
            KeyRelease => {
                let keycode = event.key.keycode as i32;
                out.push(Event::KeyboardKey {
                    window: id,
                    key: self.keys.key(keycode),
                    scancode: keycode,
                    action: Action::Release,
                    mods: translate_state(event.key.state),
                });
            },
            ButtonPress | ButtonRelease => {
                let action = if event_type == ButtonPress { Action::Press } else { Action::Release };
                let mods = translate_state(event.button.state);
                let button = event.button.button;
                let mouse_button = match button {
                    Button1 => Some(MouseButton::LEFT),
                    Button2 => Some(MouseButton::MIDDLE),
                    Button3 => Some(MouseButton::RIGHT),
                    Button4 | Button5 | Button6 | Button7 => {
                        if action == Action::Press {
                            let scroll = match button {
                                Button4 => Vec2::new(0., 1.),
                                Button5 => Vec2::new(0., -1.),
                                Button6 => Vec2::new(1., 0.),
                                _ => Vec2::new(-1., 0.),
                            };
                            out.push(Event::MouseScroll { window: id, scroll });
                        }
                        None
                    },
                    // Buttons 4 to 7 were taken by scrolling.
                    b => MouseButton::from_raw(b as i32 - Button1 as i32 - 4),
                };
                if let Some(button) = mouse_button {
                    out.push(Event::MouseButton { window: id, button, action, mods });
                }
            },
            MotionNotify => {
                let pos = Vec2::new(event.motion.x, event.motion.y);
                let warped = self.with_window(id, |w| {
                    let warped = w.warp_pos == Some(pos);
                    if warped {
                        w.warp_pos = None;
                    }
                    w.last_cursor_pos = pos;
                    warped
                }).unwrap_or(false);
                if !warped {
                    out.push(Event::MouseMotion { window: id, position: Vec2::new(pos.x as f64, pos.y as f64) });
                }
            },
            EnterNotify => {
                let pos = Vec2::new(event.crossing.x as f64, event.crossing.y as f64);
                out.push(Event::MouseEnter { window: id, entered: true });
                out.push(Event::MouseMotion { window: id, position: pos });
            },
            LeaveNotify => out.push(Event::MouseEnter { window: id, entered: false }),
            FocusIn | FocusOut => {
                let mode = event.focus_change.mode;
                // Grabs (including our own) move focus only in appearance.
                if mode == NotifyGrab || mode == NotifyUngrab {
                    return;
                }
                let focused = event_type == FocusIn;
                if let Ok(ic) = self.with_window(id, |w| w.ic) {
                    if !ic.is_null() {
                        if focused {
                            (self.xlib.XSetICFocus)(ic);
                        } else {
                            (self.xlib.XUnsetICFocus)(ic);
                        }
                    }
                }
                out.push(Event::WindowFocusChanged { window: id, focused });
            },
            Expose => out.push(Event::WindowNeedsRefresh { window: id }),
            ConfigureNotify => self.process_configure(id, &event.configure, out),
            ClientMessage => self.process_client_message(id, &event.client_message, out),
            SelectionNotify => {
                if event.selection.property == self.atoms.XdndSelection {
                    self.finish_drop(id, handle, out);
                }
            },
            PropertyNotify => {
                if event.property.state != NewValue {
                    return;
                }
                if event.property.atom == self.atoms.WM_STATE {
                    let iconified = self.x11_window_iconified(id).unwrap_or(false);
                    let changed = self.with_window(id, |w| {
                        let changed = w.iconified != iconified;
                        w.iconified = iconified;
                        changed
                    }).unwrap_or(false);
                    if changed {
                        out.push(Event::WindowIconifyChanged { window: id, iconified });
                    }
                } else if event.property.atom == self.atoms._NET_WM_STATE {
                    let maximized = self.x11_window_maximized(id).unwrap_or(false);
                    let changed = self.with_window(id, |w| {
                        let changed = w.maximized != maximized;
                        w.maximized = maximized;
                        changed
                    }).unwrap_or(false);
                    if changed {
                        out.push(Event::WindowMaximizeChanged { window: id, maximized });
                    }
                }
            },
            _ => (),
        }
    }

    unsafe fn process_key_press(&self, id: WindowId, event: &mut x::XEvent, out: &mut Vec<Event>) {
        let keycode = event.key.keycode as i32;
        let mods = translate_state(event.key.state);
        let plain = !mods.intersects(Modifiers::CONTROL | Modifiers::ALT);
        out.push(Event::KeyboardKey { window: id, key: self.keys.key(keycode), scancode: keycode, action: Action::Press, mods });

        let ic = self.with_window(id, |w| w.ic).unwrap_or(ptr::null_mut());
        if ic.is_null() {
            let mut keysym: x::KeySym = 0;
            (self.xlib.XLookupString)(&mut event.key, ptr::null_mut(), 0, &mut keysym, ptr::null_mut());
            if let Some(c) = keysym_to_char(keysym) {
                out.push(Event::TextInput { window: id, codepoint: c as u32, mods, plain });
            }
            return;
        }

        let mut buffer = vec![0 as c_char; 100];
        let mut keysym: x::KeySym = 0;
        let mut status: c_int = 0;
        let mut count = (self.xlib.Xutf8LookupString)(ic, &mut event.key, buffer.as_mut_ptr(), buffer.len() as c_int - 1, &mut keysym, &mut status);
        if status == XBufferOverflow {
            buffer = vec![0 as c_char; count as usize + 1];
            count = (self.xlib.Xutf8LookupString)(ic, &mut event.key, buffer.as_mut_ptr(), count, &mut keysym, &mut status);
        }
        if status == XLookupChars || status == XLookupBoth {
            let bytes = std::slice::from_raw_parts(buffer.as_ptr() as *const u8, count.max(0) as usize);
            for c in String::from_utf8_lossy(bytes).chars() {
                out.push(Event::TextInput { window: id, codepoint: c as u32, mods, plain });
            }
        }
    }

    unsafe fn process_generic_event(&self, event: &mut x::XEvent, out: &mut Vec<Event>) {
        let xi = match self.xi.as_ref() {
            Some(xi) => xi,
            None => return,
        };
        let id = match self.disabled_window.get() {
            Some(id) => id,
            None => return,
        };
        let cookie = &mut event.generic_event_cookie;
        if cookie.extension != xi.major_opcode || (self.xlib.XGetEventData)(self.x_display, cookie) == x::False {
            return;
        }
        if cookie.evtype == XI_RawMotion {
            let raw = &*(cookie.data as *const xi2::XIRawEvent);
            let mask = std::slice::from_raw_parts(raw.valuators.mask, raw.valuators.mask_len as usize);
            let mut values = raw.raw_values;
            let mut displacement = Vec2::<f64>::zero();
            if XIMaskIsSet(mask, 0) {
                displacement.x = *values;
                values = values.offset(1);
            }
            if XIMaskIsSet(mask, 1) {
                displacement.y = *values;
            }
            out.push(Event::MouseMotionRaw { window: id, displacement });
        }
        (self.xlib.XFreeEventData)(self.x_display, cookie);
    }

    unsafe fn process_configure(&self, id: WindowId, configure: &x::XConfigureEvent, out: &mut Vec<Event>) {
        let size = Extent2::new(configure.width, configure.height);
        let mut pos = Vec2::new(configure.x, configure.y);
        // Reparenting WMs send synthetic events with root coordinates; real ones are parent-relative.
        if configure.send_event == x::False {
            let (mut x, mut y, mut child) = (0, 0, 0);
            (self.xlib.XTranslateCoordinates)(self.x_display, configure.window, self.root, 0, 0, &mut x, &mut y, &mut child);
            pos = Vec2::new(x, y);
        }
        let (moved, resized) = self.with_window(id, |w| {
            let resized = w.size != size;
            let moved = w.pos != pos;
            w.size = size;
            w.pos = pos;
            (moved, resized)
        }).unwrap_or((false, false));
        if resized {
            out.push(Event::WindowResized { window: id, size });
            out.push(Event::FramebufferResized { window: id, size });
        }
        if moved {
            out.push(Event::WindowMoved { window: id, position: pos });
        }
    }

    unsafe fn send_xdnd(&self, target: x::Window, message_type: x::Atom, data: [c_long; 5]) {
        let mut reply: x::XEvent = std::mem::zeroed();
        reply.client_message.type_ = ClientMessage;
        reply.client_message.window = target;
        reply.client_message.message_type = message_type;
        reply.client_message.format = 32;
        for (i, d) in data.iter().enumerate() {
            reply.client_message.data.set_long(i, *d);
        }
        (self.xlib.XSendEvent)(self.x_display, target, x::False, 0, &mut reply);
        (self.xlib.XFlush)(self.x_display);
    }

    unsafe fn process_client_message(&self, id: WindowId, message: &x::XClientMessageEvent, out: &mut Vec<Event>) {
        let atoms = &self.atoms;
        let data = |i| message.data.get_long(i);
        let handle = message.window;

        if message.message_type == atoms.WM_PROTOCOLS {
            let protocol = data(0) as x::Atom;
            if protocol == atoms.WM_DELETE_WINDOW {
                out.push(Event::WindowCloseRequested { window: id });
            } else if protocol == atoms._NET_WM_PING {
                let mut reply = x::XEvent { client_message: *message };
                reply.client_message.window = self.root;
                (self.xlib.XSendEvent)(self.x_display, self.root, x::False, SubstructureNotifyMask | SubstructureRedirectMask, &mut reply);
            }
        } else if message.message_type == atoms.XdndEnter {
            let source = data(0) as x::Window;
            let version = data(1) >> 24;
            let types: Vec<x::Atom> = if data(1) & 1 != 0 {
                prop::get::<c_ulong>(&self.xlib, self.x_display, source, atoms.XdndTypeList, XA_ATOM)
                    .ok().and_then(|p| p).map_or(Vec::new(), |p| p.data)
            } else {
                (2..5).map(|i| data(i) as x::Atom).collect()
            };
            let format = if types.contains(&atoms.text_uri_list) { atoms.text_uri_list } else { 0 };
            self.xdnd.set(XdndState { version, source, format });
        } else if message.message_type == atoms.XdndPosition {
            let xdnd = self.xdnd.get();
            let (root_x, root_y) = ((data(2) >> 16) as c_int & 0xFFFF, (data(2) & 0xFFFF) as c_int);
            let (mut x, mut y, mut child) = (0, 0, 0);
            (self.xlib.XTranslateCoordinates)(self.x_display, self.root, handle, root_x, root_y, &mut x, &mut y, &mut child);
            out.push(Event::MouseMotion { window: id, position: Vec2::new(x as f64, y as f64) });

            let accepted = xdnd.format != 0;
            let action = if accepted && xdnd.version >= 2 { atoms.XdndActionCopy as c_long } else { 0 };
            self.send_xdnd(xdnd.source, atoms.XdndStatus, [handle as c_long, accepted as c_long, 0, 0, action]);
        } else if message.message_type == atoms.XdndDrop {
            let xdnd = self.xdnd.get();
            if xdnd.format != 0 {
                let time = if xdnd.version >= 1 { data(2) as x::Time } else { x::CurrentTime };
                (self.xlib.XConvertSelection)(self.x_display, atoms.XdndSelection, xdnd.format, atoms.XdndSelection, handle, time);
            } else if xdnd.version >= 2 {
                self.send_xdnd(xdnd.source, atoms.XdndFinished, [handle as c_long, 0, 0, 0, 0]);
            }
        }
    }

    unsafe fn finish_drop(&self, id: WindowId, handle: x::Window, out: &mut Vec<Event>) {
        let xdnd = self.xdnd.get();
        let data = prop::get::<u8>(&self.xlib, self.x_display, handle, self.atoms.XdndSelection, xdnd.format);
        let paths = match data {
            Ok(Some(p)) => parse_uri_list(&String::from_utf8_lossy(&p.data)),
            _ => Vec::new(),
        };
        (self.xlib.XDeleteProperty)(self.x_display, handle, self.atoms.XdndSelection);
        let accepted = !paths.is_empty();
        if accepted {
            out.push(Event::FilesDropped { window: id, paths });
        }
        if xdnd.version >= 2 {
            let action = if accepted { self.atoms.XdndActionCopy as c_long } else { 0 };
            self.send_xdnd(xdnd.source, self.atoms.XdndFinished, [handle as c_long, accepted as c_long, action, 0, 0]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_lists_become_paths() {
        let list = "# comment\r\nfile:///home/me/a%20b.txt\r\nfile://host/tmp/c.png\r\n/plain/path\r\n";
        assert_eq!(parse_uri_list(list), vec!["/home/me/a b.txt", "/tmp/c.png", "/plain/path"]);
    }

    #[test]
    fn broken_escapes_are_kept() {
        assert_eq!(parse_uri_list("file:///50%"), vec!["/50%"]);
        assert_eq!(parse_uri_list("file:///x%zz"), vec!["/x%zz"]);
    }

    #[test]
    fn modifier_state_bits() {
        let mods = translate_state(ShiftMask | Mod1Mask | Mod2Mask);
        assert_eq!(mods, Modifiers::SHIFT | Modifiers::ALT | Modifiers::NUM_LOCK);
    }
}
