//! Native windows: creation, EWMH state and geometry.

use std::ffi::CString;
use std::os::raw::{c_char, c_int, c_long, c_uint, c_ulong, c_void};
use std::ptr;
use x11_dl::xlib as x;
use x11_dl::glx::GLXFBConfig;
use super::missing_bits::xlib::*;
use super::missing_bits::wm_state::IconicState;
use super::missing_bits::xfixes::ShapeInput;
use super::net_wm::{BypassCompositor, NetWMStateAction};
use super::{motif_wm, prop, X11Platform};
use crate::error::{self, Error, Result};
use crate::hint::{ClientApi, ContextConfig, FramebufferConfig, WindowConfig, DONT_CARE};
use crate::image::RgbaImage;
use crate::input::CursorMode;
use crate::platform::{CursorId, FrameExtents, MonitorKey, WindowId};
use crate::{Extent2, Rect, Vec2};

const EVENT_MASK: c_long = StructureNotifyMask | KeyPressMask | KeyReleaseMask
    | PointerMotionMask | ButtonPressMask | ButtonReleaseMask
    | ExposureMask | FocusChangeMask | VisibilityChangeMask
    | EnterWindowMask | LeaveWindowMask | PropertyChangeMask;

pub(super) struct X11Window {
    pub handle: x::Window,
    pub colormap: x::Colormap,
    pub ic: x::XIC,
    pub fbconfig: Option<GLXFBConfig>,
    pub transparent: bool,
    pub resizable: bool,
    pub decorated: bool,
    pub floating: bool,
    pub monitor: Option<MonitorKey>,
    pub iconified: bool,
    pub maximized: bool,
    pub pos: Vec2<i32>,
    pub size: Extent2<i32>,
    pub min_size: Extent2<i32>,
    pub max_size: Extent2<i32>,
    pub aspect: (i32, i32),
    pub cursor: Option<CursorId>,
    pub cursor_mode: CursorMode,
    /// Where we last warped the pointer, so the resulting motion is not reported as movement.
    pub warp_pos: Option<Vec2<i32>>,
    pub last_cursor_pos: Vec2<i32>,
}

impl X11Platform {
    pub(super) fn with_window<T, F: FnOnce(&mut X11Window) -> T>(&self, id: WindowId, f: F) -> Result<T> {
        let mut windows = self.windows.borrow_mut();
        let window = windows.get_mut(&id).ok_or_else(|| Error::failed(format!("Unknown window {:?}", id)))?;
        Ok(f(window))
    }

    pub(super) fn handle(&self, id: WindowId) -> Result<x::Window> {
        self.with_window(id, |w| w.handle)
    }

    pub(super) fn supports(&self, atom: x::Atom) -> bool {
        atom != 0 && self.net_supported.contains(&atom)
    }

    /// Sends an EWMH client message about `handle` to the root window.
    pub(super) unsafe fn send_ewmh(&self, handle: x::Window, message_type: x::Atom, data: [c_long; 5]) {
        let mut event: x::XEvent = std::mem::zeroed();
        event.client_message.type_ = ClientMessage;
        event.client_message.window = handle;
        event.client_message.format = 32;
        event.client_message.message_type = message_type;
        for (i, d) in data.iter().enumerate() {
            event.client_message.data.set_long(i, *d);
        }
        (self.xlib.XSendEvent)(self.x_display, self.root, x::False, SubstructureNotifyMask | SubstructureRedirectMask, &mut event);
    }

    unsafe fn set_net_wm_state(&self, handle: x::Window, visible: bool, add: bool, a: x::Atom, b: x::Atom) {
        if visible {
            self.send_ewmh(handle, self.atoms._NET_WM_STATE, [NetWMStateAction::from_bool(add).raw(), a as c_long, b as c_long, 1, 0]);
            return;
        }
        // Unmapped windows own their state property.
        let mut states = prop::get::<c_ulong>(&self.xlib, self.x_display, handle, self.atoms._NET_WM_STATE, XA_ATOM)
            .ok().and_then(|p| p).map_or(Vec::new(), |p| p.data);
        for &atom in [a, b].iter().filter(|&&atom| atom != 0) {
            let present = states.contains(&atom);
            if add && !present {
                states.push(atom);
            } else if !add && present {
                states.retain(|s| *s != atom);
            }
        }
        prop::set(&self.xlib, self.x_display, handle, self.atoms._NET_WM_STATE, XA_ATOM, &states);
    }

    pub(super) unsafe fn update_normal_hints(&self, w: &X11Window, size: Extent2<i32>) {
        let hints = (self.xlib.XAllocSizeHints)();
        if hints.is_null() {
            return;
        }
        let h = &mut *hints;
        if w.monitor.is_none() {
            if w.resizable {
                if w.min_size.w != DONT_CARE && w.min_size.h != DONT_CARE {
                    h.flags |= PMinSize;
                    h.min_width = w.min_size.w;
                    h.min_height = w.min_size.h;
                }
                if w.max_size.w != DONT_CARE && w.max_size.h != DONT_CARE {
                    h.flags |= PMaxSize;
                    h.max_width = w.max_size.w;
                    h.max_height = w.max_size.h;
                }
                if w.aspect.0 != DONT_CARE && w.aspect.1 != DONT_CARE {
                    h.flags |= PAspect;
                    h.min_aspect.x = w.aspect.0;
                    h.min_aspect.y = w.aspect.1;
                    h.max_aspect = h.min_aspect;
                }
            } else {
                h.flags |= PMinSize | PMaxSize;
                h.min_width = size.w;
                h.max_width = size.w;
                h.min_height = size.h;
                h.max_height = size.h;
            }
        }
        h.flags |= PWinGravity;
        h.win_gravity = StaticGravity;
        (self.xlib.XSetWMNormalHints)(self.x_display, w.handle, hints);
        (self.xlib.XFree)(hints as *mut _);
    }

    unsafe fn set_decorations(&self, handle: x::Window, decorated: bool) {
        let hints = motif_wm::Hints::decorated(decorated).into_array();
        prop::set(&self.xlib, self.x_display, handle, self.atoms._MOTIF_WM_HINTS, self.atoms._MOTIF_WM_HINTS, &hints);
    }

    unsafe fn create_ic(&self, handle: x::Window) -> x::XIC {
        if self.xim.is_null() {
            return ptr::null_mut();
        }
        let ic = (self.xlib.XCreateIC)(
            self.xim,
            XNInputStyle.as_ptr() as *const c_char, XIMPreeditNothing | XIMStatusNothing,
            XNClientWindow.as_ptr() as *const c_char, handle,
            XNFocusWindow.as_ptr() as *const c_char, handle,
            ptr::null_mut::<c_void>()
        );
        if ic.is_null() {
            warn!("XCreateIC() failed, text input falls back to keysyms");
        }
        ic
    }

    pub(super) fn x11_create_window(&self, id: WindowId, wndconfig: &WindowConfig, fbconfig: &FramebufferConfig, ctxconfig: &ContextConfig, monitor: Option<&MonitorKey>) -> Result<()> {
        let mut size = Extent2::new(wndconfig.width, wndconfig.height);
        if wndconfig.scale_to_monitor && monitor.is_none() {
            size.w = (size.w as f32 * self.content_scale.x) as i32;
            size.h = (size.h as f32 * self.content_scale.y) as i32;
        }
        let pos = match monitor {
            Some(key) => self.randr_monitor_pos(key)?,
            None => Vec2::zero(),
        };

        unsafe {
            let mut fbconfig_handle = None;
            let mut transparent = false;
            let (visual, depth) = if ctxconfig.client != ClientApi::NoApi.raw() {
                let glx = self.glx.as_ref().ok_or_else(|| Error::api_unavailable("GLX: GLX is unavailable"))?;
                let (config, vi) = glx.choose_fbconfig(fbconfig, self.xrender.as_ref())?;
                let visual = ((*vi).visual, (*vi).depth);
                (self.xlib.XFree)(vi as *mut _);
                fbconfig_handle = Some(config);
                if fbconfig.transparent {
                    transparent = self.xrender.as_ref().map_or(false, |r| r.visual_has_alpha(self.x_display, visual.0));
                }
                visual
            } else if fbconfig.transparent {
                match self.find_alpha_visual() {
                    Some(visual) => {
                        transparent = true;
                        visual
                    },
                    None => self.default_visual(),
                }
            } else {
                self.default_visual()
            };

            let colormap = (self.xlib.XCreateColormap)(self.x_display, self.root, visual, AllocNone);
            let mut wa: x::XSetWindowAttributes = std::mem::zeroed();
            wa.colormap = colormap;
            wa.border_pixel = 0;
            wa.event_mask = EVENT_MASK;

            let handle = super::xlib_error::sync_catch(&self.xlib, self.x_display, || {
                (self.xlib.XCreateWindow)(
                    self.x_display, self.root, pos.x, pos.y,
                    size.w.max(1) as c_uint, size.h.max(1) as c_uint,
                    0, depth, InputOutput, visual,
                    CWBorderPixel | CWColormap | CWEventMask, &mut wa
                )
            })?;
            if handle == 0 {
                (self.xlib.XFreeColormap)(self.x_display, colormap);
                return error::failed("XCreateWindow() returned 0");
            }

            let window = X11Window {
                handle,
                colormap,
                ic: ptr::null_mut(),
                fbconfig: fbconfig_handle,
                transparent,
                resizable: wndconfig.resizable,
                decorated: wndconfig.decorated,
                floating: wndconfig.floating,
                monitor: monitor.cloned(),
                iconified: false,
                maximized: false,
                pos,
                size,
                min_size: Extent2::new(DONT_CARE, DONT_CARE),
                max_size: Extent2::new(DONT_CARE, DONT_CARE),
                aspect: (DONT_CARE, DONT_CARE),
                cursor: None,
                cursor_mode: CursorMode::Normal,
                warp_pos: None,
                last_cursor_pos: Vec2::zero(),
            };

            if !wndconfig.decorated {
                self.set_decorations(handle, false);
            }

            let mut states = Vec::new();
            if monitor.is_none() {
                if wndconfig.floating && self.supports(self.atoms._NET_WM_STATE_ABOVE) {
                    states.push(self.atoms._NET_WM_STATE_ABOVE);
                }
                if wndconfig.maximized && self.supports(self.atoms._NET_WM_STATE_MAXIMIZED_VERT) && self.supports(self.atoms._NET_WM_STATE_MAXIMIZED_HORZ) {
                    states.push(self.atoms._NET_WM_STATE_MAXIMIZED_VERT);
                    states.push(self.atoms._NET_WM_STATE_MAXIMIZED_HORZ);
                }
            }
            if !states.is_empty() {
                prop::set(&self.xlib, self.x_display, handle, self.atoms._NET_WM_STATE, XA_ATOM, &states);
            }

            let mut protocols = [self.atoms.WM_DELETE_WINDOW, self.atoms._NET_WM_PING];
            (self.xlib.XSetWMProtocols)(self.x_display, handle, protocols.as_mut_ptr(), protocols.len() as c_int);

            let pid = libc::getpid() as c_ulong;
            prop::set(&self.xlib, self.x_display, handle, self.atoms._NET_WM_PID, XA_CARDINAL, &[pid]);

            if self.atoms._NET_WM_WINDOW_TYPE != 0 && self.atoms._NET_WM_WINDOW_TYPE_NORMAL != 0 {
                prop::set(&self.xlib, self.x_display, handle, self.atoms._NET_WM_WINDOW_TYPE, XA_ATOM, &[self.atoms._NET_WM_WINDOW_TYPE_NORMAL]);
            }

            let wm_hints = (self.xlib.XAllocWMHints)();
            if !wm_hints.is_null() {
                (*wm_hints).flags = StateHint;
                (*wm_hints).initial_state = super::missing_bits::wm_state::NormalState as c_int;
                (self.xlib.XSetWMHints)(self.x_display, handle, wm_hints);
                (self.xlib.XFree)(wm_hints as *mut _);
            }

            self.update_normal_hints(&window, size);
            self.set_class_hint(handle, wndconfig);

            // Version 5 of the drag and drop protocol.
            prop::set(&self.xlib, self.x_display, handle, self.atoms.XdndAware, XA_ATOM, &[5 as c_ulong]);

            let ic = self.create_ic(handle);
            if !ic.is_null() {
                let mut filter: c_long = 0;
                let name = b"filterEvents\0";
                (self.xlib.XGetICValues)(ic, name.as_ptr() as *const c_char, &mut filter as *mut c_long, ptr::null_mut::<c_void>());
                let mut attribs: x::XWindowAttributes = std::mem::zeroed();
                (self.xlib.XGetWindowAttributes)(self.x_display, handle, &mut attribs);
                (self.xlib.XSelectInput)(self.x_display, handle, attribs.your_event_mask | filter);
            }

            self.handles.borrow_mut().insert(handle, id);
            self.windows.borrow_mut().insert(id, X11Window { ic, ..window });
            self.x11_set_window_title(id, &wndconfig.title)?;

            if let Some(key) = monitor {
                let mode = self.randr_current_video_mode(key)?;
                let rect = Rect::new(pos.x, pos.y, mode.width, mode.height);
                self.x11_set_window_monitor(id, Some(key), rect)?;
            }
            (self.xlib.XFlush)(self.x_display);
            debug!("Created X window {} for {:?}", handle, id);
        }
        Ok(())
    }

    unsafe fn default_visual(&self) -> (*mut x::Visual, c_int) {
        ((self.xlib.XDefaultVisual)(self.x_display, self.screen), self.depth)
    }

    /// A 32-bit TrueColor visual whose alpha channel a compositor honours.
    unsafe fn find_alpha_visual(&self) -> Option<(*mut x::Visual, c_int)> {
        let xrender = self.xrender.as_ref()?;
        let mut vi: x::XVisualInfo = std::mem::zeroed();
        if (self.xlib.XMatchVisualInfo)(self.x_display, self.screen, 32, 4 /* TrueColor */, &mut vi) == 0 {
            return None;
        }
        if xrender.visual_has_alpha(self.x_display, vi.visual) {
            Some((vi.visual, vi.depth))
        } else {
            None
        }
    }

    unsafe fn set_class_hint(&self, handle: x::Window, wndconfig: &WindowConfig) {
        let hint = (self.xlib.XAllocClassHint)();
        if hint.is_null() {
            return;
        }
        let from_env = std::env::var("RESOURCE_NAME").ok().filter(|s| !s.is_empty());
        let instance = if !wndconfig.x11_instance_name.is_empty() {
            wndconfig.x11_instance_name.clone()
        } else if let Some(name) = from_env {
            name
        } else if !wndconfig.title.is_empty() {
            wndconfig.title.clone()
        } else {
            "winpal-application".to_owned()
        };
        let class = if !wndconfig.x11_class_name.is_empty() {
            wndconfig.x11_class_name.clone()
        } else if !wndconfig.title.is_empty() {
            wndconfig.title.clone()
        } else {
            "Winpal-application".to_owned()
        };
        let instance = CString::new(instance.replace('\0', "")).unwrap_or_default();
        let class = CString::new(class.replace('\0', "")).unwrap_or_default();
        (*hint).res_name = instance.as_ptr() as *mut c_char;
        (*hint).res_class = class.as_ptr() as *mut c_char;
        (self.xlib.XSetClassHint)(self.x_display, handle, hint);
        (self.xlib.XFree)(hint as *mut _);
    }

    pub(super) fn x11_destroy_window(&self, id: WindowId) -> Result<()> {
        let window = match self.windows.borrow_mut().remove(&id) {
            Some(w) => w,
            None => return Ok(()),
        };
        if self.disabled_window.get() == Some(id) {
            self.disabled_window.set(None);
            unsafe {
                (self.xlib.XUngrabPointer)(self.x_display, x::CurrentTime);
            }
        }
        self.handles.borrow_mut().remove(&window.handle);
        unsafe {
            if !window.ic.is_null() {
                (self.xlib.XDestroyIC)(window.ic);
            }
            (self.xlib.XUnmapWindow)(self.x_display, window.handle);
            (self.xlib.XDestroyWindow)(self.x_display, window.handle);
            (self.xlib.XFreeColormap)(self.x_display, window.colormap);
            (self.xlib.XFlush)(self.x_display);
        }
        Ok(())
    }

    pub(super) fn x11_set_window_title(&self, id: WindowId, title: &str) -> Result<()> {
        let handle = self.handle(id)?;
        let bytes: Vec<u8> = title.bytes().filter(|b| *b != 0).collect();
        unsafe {
            let c = CString::new(bytes.clone()).unwrap_or_default();
            (self.xlib.Xutf8SetWMProperties)(
                self.x_display, handle, c.as_ptr(), c.as_ptr(),
                ptr::null_mut(), 0, ptr::null_mut(), ptr::null_mut(), ptr::null_mut()
            );
            prop::set(&self.xlib, self.x_display, handle, self.atoms._NET_WM_NAME, self.atoms.UTF8_STRING, &bytes);
            prop::set(&self.xlib, self.x_display, handle, self.atoms._NET_WM_ICON_NAME, self.atoms.UTF8_STRING, &bytes);
            (self.xlib.XFlush)(self.x_display);
        }
        Ok(())
    }

    pub(super) fn x11_set_window_icon(&self, id: WindowId, images: &[RgbaImage]) -> Result<()> {
        let handle = self.handle(id)?;
        unsafe {
            if images.is_empty() {
                (self.xlib.XDeleteProperty)(self.x_display, handle, self.atoms._NET_WM_ICON);
            } else {
                let mut data: Vec<c_ulong> = Vec::new();
                for image in images {
                    data.push(image.size.w as c_ulong);
                    data.push(image.size.h as c_ulong);
                    data.extend(image.to_argb(false).into_iter().map(|p| p as c_ulong));
                }
                prop::set(&self.xlib, self.x_display, handle, self.atoms._NET_WM_ICON, XA_CARDINAL, &data);
            }
            (self.xlib.XFlush)(self.x_display);
        }
        Ok(())
    }

    pub(super) fn x11_window_pos(&self, id: WindowId) -> Result<Vec2<i32>> {
        let handle = self.handle(id)?;
        unsafe {
            let (mut x, mut y, mut child) = (0, 0, 0);
            (self.xlib.XTranslateCoordinates)(self.x_display, handle, self.root, 0, 0, &mut x, &mut y, &mut child);
            Ok(Vec2::new(x, y))
        }
    }

    pub(super) fn x11_set_window_pos(&self, id: WindowId, pos: Vec2<i32>) -> Result<()> {
        let handle = self.handle(id)?;
        unsafe {
            // Unmapped windows need the position hinted, or the WM places them itself.
            if !self.x11_window_visible(id)? {
                let hints = (self.xlib.XAllocSizeHints)();
                if !hints.is_null() {
                    let mut supplied = 0;
                    (self.xlib.XGetWMNormalHints)(self.x_display, handle, hints, &mut supplied);
                    (*hints).flags |= PPosition;
                    (*hints).x = pos.x;
                    (*hints).y = pos.y;
                    (self.xlib.XSetWMNormalHints)(self.x_display, handle, hints);
                    (self.xlib.XFree)(hints as *mut _);
                }
            }
            (self.xlib.XMoveWindow)(self.x_display, handle, pos.x, pos.y);
            (self.xlib.XFlush)(self.x_display);
        }
        Ok(())
    }

    pub(super) fn x11_window_size(&self, id: WindowId) -> Result<Extent2<i32>> {
        let handle = self.handle(id)?;
        unsafe {
            let mut attribs: x::XWindowAttributes = std::mem::zeroed();
            (self.xlib.XGetWindowAttributes)(self.x_display, handle, &mut attribs);
            Ok(Extent2::new(attribs.width, attribs.height))
        }
    }

    pub(super) fn x11_set_window_size(&self, id: WindowId, size: Extent2<i32>) -> Result<()> {
        let windows = self.windows.borrow();
        let w = windows.get(&id).ok_or_else(|| Error::failed(format!("Unknown window {:?}", id)))?;
        unsafe {
            if !w.resizable {
                self.update_normal_hints(w, size);
            }
            (self.xlib.XResizeWindow)(self.x_display, w.handle, size.w.max(1) as c_uint, size.h.max(1) as c_uint);
            (self.xlib.XFlush)(self.x_display);
        }
        Ok(())
    }

    pub(super) fn x11_set_window_size_limits(&self, id: WindowId, min: Extent2<i32>, max: Extent2<i32>) -> Result<()> {
        self.with_window(id, |w| {
            w.min_size = min;
            w.max_size = max;
        })?;
        self.refresh_normal_hints(id)
    }

    pub(super) fn x11_set_window_aspect_ratio(&self, id: WindowId, numer: i32, denom: i32) -> Result<()> {
        self.with_window(id, |w| w.aspect = (numer, denom))?;
        self.refresh_normal_hints(id)
    }

    pub(super) fn refresh_normal_hints(&self, id: WindowId) -> Result<()> {
        let size = self.x11_window_size(id)?;
        let windows = self.windows.borrow();
        let w = windows.get(&id).ok_or_else(|| Error::failed(format!("Unknown window {:?}", id)))?;
        unsafe {
            self.update_normal_hints(w, size);
            (self.xlib.XFlush)(self.x_display);
        }
        Ok(())
    }

    pub(super) fn x11_window_frame_size(&self, id: WindowId) -> Result<FrameExtents> {
        let (handle, decorated, fullscreen) = self.with_window(id, |w| (w.handle, w.decorated, w.monitor.is_some()))?;
        if !decorated || fullscreen {
            return Ok(FrameExtents::default());
        }
        let extents = unsafe {
            prop::get::<c_ulong>(&self.xlib, self.x_display, handle, self.atoms._NET_FRAME_EXTENTS, XA_CARDINAL)?
        };
        Ok(match extents {
            Some(ref p) if p.data.len() == 4 => FrameExtents {
                left: p.data[0] as i32,
                right: p.data[1] as i32,
                top: p.data[2] as i32,
                bottom: p.data[3] as i32,
            },
            _ => FrameExtents::default(),
        })
    }

    pub(super) fn x11_iconify_window(&self, id: WindowId) -> Result<()> {
        let handle = self.handle(id)?;
        unsafe {
            (self.xlib.XIconifyWindow)(self.x_display, handle, self.screen);
            (self.xlib.XFlush)(self.x_display);
        }
        Ok(())
    }

    pub(super) fn x11_restore_window(&self, id: WindowId) -> Result<()> {
        let handle = self.handle(id)?;
        unsafe {
            if self.x11_window_iconified(id)? {
                (self.xlib.XMapWindow)(self.x_display, handle);
                self.wait_for_visibility(handle);
            } else if self.x11_window_visible(id)? && self.supports(self.atoms._NET_WM_STATE) {
                self.set_net_wm_state(handle, true, false, self.atoms._NET_WM_STATE_MAXIMIZED_VERT, self.atoms._NET_WM_STATE_MAXIMIZED_HORZ);
            }
            (self.xlib.XFlush)(self.x_display);
        }
        Ok(())
    }

    pub(super) fn x11_maximize_window(&self, id: WindowId) -> Result<()> {
        let handle = self.handle(id)?;
        if !self.supports(self.atoms._NET_WM_STATE_MAXIMIZED_VERT) || !self.supports(self.atoms._NET_WM_STATE_MAXIMIZED_HORZ) {
            warn!("The window manager cannot maximize windows");
            return Ok(());
        }
        let visible = self.x11_window_visible(id)?;
        unsafe {
            self.set_net_wm_state(handle, visible, true, self.atoms._NET_WM_STATE_MAXIMIZED_VERT, self.atoms._NET_WM_STATE_MAXIMIZED_HORZ);
            (self.xlib.XFlush)(self.x_display);
        }
        Ok(())
    }

    pub(super) fn x11_show_window(&self, id: WindowId) -> Result<()> {
        if self.x11_window_visible(id)? {
            return Ok(());
        }
        let handle = self.handle(id)?;
        unsafe {
            (self.xlib.XMapWindow)(self.x_display, handle);
            self.wait_for_visibility(handle);
        }
        Ok(())
    }

    /// Waits a little for the window to become viewable, so it can take focus right away.
    unsafe fn wait_for_visibility(&self, handle: x::Window) {
        let deadline = std::time::Instant::now() + std::time::Duration::from_millis(100);
        let mut event: x::XEvent = std::mem::zeroed();
        while (self.xlib.XCheckTypedWindowEvent)(self.x_display, handle, VisibilityNotify, &mut event) == x::False {
            let now = std::time::Instant::now();
            if now >= deadline || !self.wait_for_x_event(Some(deadline - now)) {
                break;
            }
        }
    }

    pub(super) fn x11_hide_window(&self, id: WindowId) -> Result<()> {
        let handle = self.handle(id)?;
        unsafe {
            (self.xlib.XUnmapWindow)(self.x_display, handle);
            (self.xlib.XFlush)(self.x_display);
        }
        Ok(())
    }

    pub(super) fn x11_request_window_attention(&self, id: WindowId) -> Result<()> {
        let handle = self.handle(id)?;
        if !self.supports(self.atoms._NET_WM_STATE_DEMANDS_ATTENTION) {
            return Ok(());
        }
        unsafe {
            self.send_ewmh(handle, self.atoms._NET_WM_STATE, [NetWMStateAction::Add.raw(), self.atoms._NET_WM_STATE_DEMANDS_ATTENTION as c_long, 0, 1, 0]);
            (self.xlib.XFlush)(self.x_display);
        }
        Ok(())
    }

    pub(super) fn x11_focus_window(&self, id: WindowId) -> Result<()> {
        let handle = self.handle(id)?;
        unsafe {
            if self.supports(self.atoms._NET_ACTIVE_WINDOW) {
                self.send_ewmh(handle, self.atoms._NET_ACTIVE_WINDOW, [1, 0, 0, 0, 0]);
            } else if self.x11_window_visible(id)? {
                (self.xlib.XRaiseWindow)(self.x_display, handle);
                (self.xlib.XSetInputFocus)(self.x_display, handle, RevertToParent, x::CurrentTime);
            }
            (self.xlib.XFlush)(self.x_display);
        }
        Ok(())
    }

    pub(super) fn x11_set_window_monitor(&self, id: WindowId, monitor: Option<&MonitorKey>, rect: Rect<i32, i32>) -> Result<()> {
        let (handle, decorated, floating) = self.with_window(id, |w| {
            w.monitor = monitor.cloned();
            (w.handle, w.decorated, w.floating)
        })?;
        let visible = self.x11_window_visible(id)?;
        let size = Extent2::new(rect.w, rect.h);
        unsafe {
            {
                let windows = self.windows.borrow();
                if let Some(w) = windows.get(&id) {
                    self.update_normal_hints(w, size);
                }
            }
            let fullscreen = monitor.is_some();
            self.set_decorations(handle, decorated && !fullscreen);
            if self.supports(self.atoms._NET_WM_STATE_ABOVE) {
                self.set_net_wm_state(handle, visible, fullscreen || floating, self.atoms._NET_WM_STATE_ABOVE, 0);
            }
            if self.supports(self.atoms._NET_WM_STATE_FULLSCREEN) {
                self.set_net_wm_state(handle, visible, fullscreen, self.atoms._NET_WM_STATE_FULLSCREEN, 0);
            }
            let bypass = if fullscreen { BypassCompositor::Yes } else { BypassCompositor::NoPreference };
            prop::set(&self.xlib, self.x_display, handle, self.atoms._NET_WM_BYPASS_COMPOSITOR, XA_CARDINAL, &[bypass as u32 as c_ulong]);
            (self.xlib.XMoveResizeWindow)(self.x_display, handle, rect.x, rect.y, rect.w.max(1) as c_uint, rect.h.max(1) as c_uint);
            (self.xlib.XFlush)(self.x_display);
        }
        Ok(())
    }

    pub(super) fn x11_window_focused(&self, id: WindowId) -> Result<bool> {
        let handle = self.handle(id)?;
        unsafe {
            let (mut focused, mut revert) = (0, 0);
            (self.xlib.XGetInputFocus)(self.x_display, &mut focused, &mut revert);
            Ok(focused == handle)
        }
    }

    pub(super) fn x11_window_iconified(&self, id: WindowId) -> Result<bool> {
        let handle = self.handle(id)?;
        let state = unsafe {
            prop::get::<c_ulong>(&self.xlib, self.x_display, handle, self.atoms.WM_STATE, self.atoms.WM_STATE)?
        };
        Ok(state.and_then(|p| p.data.first().cloned()).map_or(false, |s| s as i64 == IconicState))
    }

    pub(super) fn x11_window_visible(&self, id: WindowId) -> Result<bool> {
        let handle = self.handle(id)?;
        unsafe {
            let mut attribs: x::XWindowAttributes = std::mem::zeroed();
            (self.xlib.XGetWindowAttributes)(self.x_display, handle, &mut attribs);
            Ok(attribs.map_state == IsViewable)
        }
    }

    pub(super) fn x11_window_maximized(&self, id: WindowId) -> Result<bool> {
        let handle = self.handle(id)?;
        let states = unsafe {
            prop::get::<c_ulong>(&self.xlib, self.x_display, handle, self.atoms._NET_WM_STATE, XA_ATOM)?
        };
        Ok(states.map_or(false, |p| {
            p.data.contains(&self.atoms._NET_WM_STATE_MAXIMIZED_VERT) && p.data.contains(&self.atoms._NET_WM_STATE_MAXIMIZED_HORZ)
        }))
    }

    pub(super) fn x11_window_hovered(&self, id: WindowId) -> Result<bool> {
        let handle = self.handle(id)?;
        unsafe {
            let mut w = self.root;
            while w != 0 {
                let (mut root, mut child) = (0, 0);
                let (mut rx, mut ry, mut wx, mut wy, mut mask) = (0, 0, 0, 0, 0);
                let ok = super::xlib_error::sync_catch(&self.xlib, self.x_display, || {
                    (self.xlib.XQueryPointer)(self.x_display, w, &mut root, &mut child, &mut rx, &mut ry, &mut wx, &mut wy, &mut mask)
                });
                match ok {
                    Ok(r) if r != x::False => (),
                    _ => return Ok(false),
                }
                if child == handle {
                    return Ok(true);
                }
                w = child;
            }
        }
        Ok(false)
    }

    pub(super) fn x11_framebuffer_transparent(&self, id: WindowId) -> Result<bool> {
        if !self.with_window(id, |w| w.transparent)? {
            return Ok(false);
        }
        // Alpha only shows through a compositing manager.
        unsafe {
            let name = CString::new(format!("_NET_WM_CM_S{}", self.screen)).unwrap_or_default();
            let selection = (self.xlib.XInternAtom)(self.x_display, name.as_ptr(), x::False);
            Ok((self.xlib.XGetSelectionOwner)(self.x_display, selection) != 0)
        }
    }

    pub(super) fn x11_set_window_resizable(&self, id: WindowId, enabled: bool) -> Result<()> {
        self.with_window(id, |w| w.resizable = enabled)?;
        self.refresh_normal_hints(id)
    }

    pub(super) fn x11_set_window_decorated(&self, id: WindowId, enabled: bool) -> Result<()> {
        let handle = self.with_window(id, |w| {
            w.decorated = enabled;
            w.handle
        })?;
        unsafe {
            self.set_decorations(handle, enabled);
            (self.xlib.XFlush)(self.x_display);
        }
        Ok(())
    }

    pub(super) fn x11_set_window_floating(&self, id: WindowId, enabled: bool) -> Result<()> {
        let handle = self.with_window(id, |w| {
            w.floating = enabled;
            w.handle
        })?;
        if !self.supports(self.atoms._NET_WM_STATE) || !self.supports(self.atoms._NET_WM_STATE_ABOVE) {
            return Ok(());
        }
        let visible = self.x11_window_visible(id)?;
        unsafe {
            self.set_net_wm_state(handle, visible, enabled, self.atoms._NET_WM_STATE_ABOVE, 0);
            (self.xlib.XFlush)(self.x_display);
        }
        Ok(())
    }

    pub(super) fn x11_set_window_mouse_passthrough(&self, id: WindowId, enabled: bool) -> Result<()> {
        let handle = self.handle(id)?;
        let xfixes = match self.xfixes.as_ref() {
            Some(xfixes) => xfixes,
            None => return error::failed("Mouse passthrough needs the XFixes extension"),
        };
        unsafe {
            if enabled {
                let region = (xfixes.XFixesCreateRegion)(self.x_display, ptr::null_mut(), 0);
                (xfixes.XFixesSetWindowShapeRegion)(self.x_display, handle, ShapeInput, 0, 0, region);
                (xfixes.XFixesDestroyRegion)(self.x_display, region);
            } else {
                (xfixes.XFixesSetWindowShapeRegion)(self.x_display, handle, ShapeInput, 0, 0, 0);
            }
            (self.xlib.XFlush)(self.x_display);
        }
        Ok(())
    }

    pub(super) fn x11_window_opacity(&self, id: WindowId) -> Result<f32> {
        let handle = self.handle(id)?;
        let opacity = unsafe {
            prop::get::<c_ulong>(&self.xlib, self.x_display, handle, self.atoms._NET_WM_WINDOW_OPACITY, XA_CARDINAL)?
        };
        Ok(opacity.and_then(|p| p.data.first().cloned()).map_or(1., |v| (v as u32) as f32 / 0xFFFF_FFFFu32 as f32))
    }

    pub(super) fn x11_set_window_opacity(&self, id: WindowId, opacity: f32) -> Result<()> {
        let handle = self.handle(id)?;
        let value = (0xFFFF_FFFFu32 as f64 * opacity.max(0.).min(1.) as f64) as u32 as c_ulong;
        unsafe {
            prop::set(&self.xlib, self.x_display, handle, self.atoms._NET_WM_WINDOW_OPACITY, XA_CARDINAL, &[value]);
            (self.xlib.XFlush)(self.x_display);
        }
        Ok(())
    }

    pub(super) fn x11_cursor_pos(&self, id: WindowId) -> Result<Vec2<f64>> {
        let handle = self.handle(id)?;
        unsafe {
            let (mut root, mut child) = (0, 0);
            let (mut rx, mut ry, mut wx, mut wy, mut mask) = (0, 0, 0, 0, 0);
            (self.xlib.XQueryPointer)(self.x_display, handle, &mut root, &mut child, &mut rx, &mut ry, &mut wx, &mut wy, &mut mask);
            Ok(Vec2::new(wx as f64, wy as f64))
        }
    }

    pub(super) fn x11_set_cursor_pos(&self, id: WindowId, pos: Vec2<f64>) -> Result<()> {
        let target = Vec2::new(pos.x as i32, pos.y as i32);
        let handle = self.with_window(id, |w| {
            w.warp_pos = Some(target);
            w.last_cursor_pos = target;
            w.handle
        })?;
        unsafe {
            (self.xlib.XWarpPointer)(self.x_display, 0, handle, 0, 0, 0, 0, target.x, target.y);
            (self.xlib.XFlush)(self.x_display);
        }
        Ok(())
    }

    /// The X cursor a window in `mode` should display.
    pub(super) fn effective_x_cursor(&self, w: &X11Window) -> x::Cursor {
        match w.cursor_mode {
            CursorMode::Normal => w.cursor.and_then(|c| self.cursors.borrow().get(&c).cloned()).unwrap_or(0),
            CursorMode::Hidden | CursorMode::Disabled => self.hidden_cursor,
        }
    }
}
