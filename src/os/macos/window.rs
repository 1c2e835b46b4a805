//! Top-level windows: `NSWindow` creation, styles, geometry and state.
//!
//! AppKit puts the origin at the bottom-left of the main display; everything the
//! core sees is flipped so the origin is the top-left, like the other backends.

use std::collections::HashSet;
use objc2::rc::Retained;
use objc2::runtime::AnyObject;
use objc2::{class, msg_send, sel, MainThreadOnly};
use objc2_app_kit::NSWindow;
use objc2_foundation::{NSPoint, NSRect, NSSize, NSString};
use super::delegate::WindowDelegate;
use super::ffi::*;
use super::view::{ContentView, KeyableWindow};
use super::CocoaShared;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::hint::{FramebufferConfig, WindowConfig, DONT_CARE};
use crate::input::{CursorMode, Key};
use crate::platform::{CursorId, FrameExtents, MonitorKey, WindowId};
use crate::{Extent2, Rect, Vec2};

pub(super) struct CocoaWindow {
    pub object: Retained<NSWindow>,
    pub view: Retained<ContentView>,
    pub delegate: Retained<WindowDelegate>,
    /// The NSGL context drawing into `view`, updated on resize.
    pub gl: Option<Retained<AnyObject>>,
    pub fullscreen: bool,
    pub resizable: bool,
    pub decorated: bool,
    pub floating: bool,
    pub transparent: bool,
    pub maximized: bool,
    pub size: Extent2<i32>,
    pub fb_size: Extent2<i32>,
    pub scale: Vec2<f32>,
    pub cursor: Option<CursorId>,
    pub cursor_mode: CursorMode,
    /// Last position reported for this window, which is virtual while disabled.
    pub cursor_pos: Vec2<f64>,
    /// Displacement caused by warps since the last motion event.
    pub warp_delta: Vec2<f64>,
    pub held_modifiers: HashSet<Key>,
}

/// The window states AppKit answers directly.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) enum WindowFlag {
    Key,
    Miniaturized,
    Visible,
    Zoomed,
}

impl CocoaWindow {
    pub fn style_mask(&self) -> usize {
        style_mask(self.fullscreen, self.decorated, self.resizable)
    }
    pub fn level(&self) -> isize {
        window_level(self.fullscreen, self.floating)
    }
    pub fn close(self) {
        unsafe {
            let _: () = msg_send![&*self.object, orderOut: None::<&AnyObject>];
            let _: () = msg_send![&*self.object, setDelegate: None::<&AnyObject>];
            let _: () = msg_send![&*self.object, close];
        }
    }
}

pub(super) fn style_mask(fullscreen: bool, decorated: bool, resizable: bool) -> usize {
    if fullscreen {
        return NSWindowStyleMaskBorderless;
    }
    let mut mask = NSWindowStyleMaskMiniaturizable;
    if decorated {
        mask |= NSWindowStyleMaskTitled | NSWindowStyleMaskClosable;
        if resizable {
            mask |= NSWindowStyleMaskResizable;
        }
    }
    mask
}

pub(super) fn window_level(fullscreen: bool, floating: bool) -> isize {
    if fullscreen {
        NSMainMenuWindowLevel + 1
    } else if floating {
        NSFloatingWindowLevel
    } else {
        NSNormalWindowLevel
    }
}

/// Flips a y coordinate between AppKit's and the core's convention.
pub(super) fn transform_y(y: f64) -> f64 {
    let height = unsafe { CGDisplayBounds(CGMainDisplayID()).size.height };
    height - y - 1.
}

impl CocoaShared {
    pub(super) fn with_window<T, F: FnOnce(&mut CocoaWindow) -> T>(&self, id: WindowId, f: F) -> Result<T> {
        // Delegates fire re-entrantly from within AppKit calls made while borrowed.
        let mut windows = self.windows.try_borrow_mut().map_err(|_| Error::failed("Cocoa: Window table is busy"))?;
        let window = windows.get_mut(&id).ok_or_else(|| Error::failed(format!("Unknown window {:?}", id)))?;
        Ok(f(window))
    }

    pub(super) fn object(&self, id: WindowId) -> Result<Retained<NSWindow>> {
        self.with_window(id, |w| w.object.clone())
    }

    fn view(&self, id: WindowId) -> Result<Retained<ContentView>> {
        self.with_window(id, |w| w.view.clone())
    }

    pub(super) fn window_flag(&self, id: WindowId, flag: WindowFlag) -> Result<bool> {
        let object = self.object(id)?;
        Ok(unsafe {
            match flag {
                WindowFlag::Key => msg_send![&*object, isKeyWindow],
                WindowFlag::Miniaturized => msg_send![&*object, isMiniaturized],
                WindowFlag::Visible => msg_send![&*object, isVisible],
                WindowFlag::Zoomed => msg_send![&*object, isZoomed],
            }
        })
    }

    fn content_rect(&self, id: WindowId) -> Result<NSRect> {
        let view = self.view(id)?;
        Ok(unsafe { msg_send![&*view, frame] })
    }

    pub(super) fn cocoa_create_window(&self, id: WindowId, wndconfig: &WindowConfig, fbconfig: &FramebufferConfig, monitor: Option<&MonitorKey>) -> Result<()> {
        let mtm = self.mtm;
        let content_rect = match monitor {
            Some(key) => {
                let pos = self.cocoa_monitor_pos(key)?;
                let mode = self.cocoa_current_video_mode(key)?;
                NSRect::new(NSPoint::new(pos.x as f64, transform_y((pos.y + mode.height - 1) as f64)),
                            NSSize::new(mode.width as f64, mode.height as f64))
            },
            None => NSRect::new(NSPoint::new(0., 0.), NSSize::new(wndconfig.width as f64, wndconfig.height as f64)),
        };
        let fullscreen = monitor.is_some();
        let mask = style_mask(fullscreen, wndconfig.decorated, wndconfig.resizable);

        let object: Option<Retained<KeyableWindow>> = unsafe {
            msg_send![KeyableWindow::alloc(mtm),
                initWithContentRect: content_rect,
                styleMask: mask,
                backing: NSBackingStoreBuffered,
                defer: false]
        };
        let object: Retained<NSWindow> = object
            .map(Retained::into_super)
            .ok_or_else(|| Error::failed("Cocoa: Failed to create window"))?;
        let delegate = WindowDelegate::new(mtm, self.this.clone(), id);
        let view = ContentView::new(mtm, self.this.clone(), id);

        unsafe {
            let _: () = msg_send![&*object, setReleasedWhenClosed: false];
            let _: () = msg_send![&*object, setLevel: window_level(fullscreen, wndconfig.floating)];
            if !fullscreen {
                let _: () = msg_send![&*object, center];
                let behavior = NSWindowCollectionBehaviorFullScreenPrimary | NSWindowCollectionBehaviorManaged;
                let _: () = msg_send![&*object, setCollectionBehavior: behavior];
            } else {
                let _: () = msg_send![&*object, setCollectionBehavior: NSWindowCollectionBehaviorFullScreenNone];
            }
            if fbconfig.transparent {
                let clear: Retained<AnyObject> = msg_send![class!(NSColor), clearColor];
                let _: () = msg_send![&*object, setOpaque: false];
                let _: () = msg_send![&*object, setHasShadow: false];
                let _: () = msg_send![&*object, setBackgroundColor: &*clear];
            }
            let _: () = msg_send![&*object, setContentView: &*view];
            let _: bool = msg_send![&*object, makeFirstResponder: &*view];
            let title = NSString::from_str(&wndconfig.title);
            let _: () = msg_send![&*object, setTitle: &*title];
            let _: () = msg_send![&*object, setDelegate: &*delegate];
            let _: () = msg_send![&*object, setAcceptsMouseMovedEvents: true];
            let _: () = msg_send![&*object, setRestorable: false];
            let tabbing: bool = msg_send![&*object, respondsToSelector: sel!(setTabbingMode:)];
            if tabbing {
                let _: () = msg_send![&*object, setTabbingMode: NSWindowTabbingModeDisallowed];
            }
        }

        let window = CocoaWindow {
            object: object.clone(),
            view,
            delegate,
            gl: None,
            fullscreen,
            resizable: wndconfig.resizable,
            decorated: wndconfig.decorated,
            floating: wndconfig.floating,
            transparent: fbconfig.transparent,
            maximized: false,
            size: Extent2::new(0, 0),
            fb_size: Extent2::new(0, 0),
            scale: Vec2::new(1., 1.),
            cursor: None,
            cursor_mode: CursorMode::Normal,
            cursor_pos: Vec2::new(0., 0.),
            warp_delta: Vec2::new(0., 0.),
            held_modifiers: HashSet::new(),
        };
        self.windows.borrow_mut().insert(id, window);

        if wndconfig.maximized && !fullscreen {
            unsafe {
                let _: () = msg_send![&*object, zoom: None::<&AnyObject>];
            }
        }
        let size = self.cocoa_window_size(id)?;
        let fb_size = self.cocoa_framebuffer_size(id)?;
        let scale = self.cocoa_window_content_scale(id)?;
        let maximized = self.window_flag(id, WindowFlag::Zoomed)?;
        self.with_window(id, |w| {
            w.size = size;
            w.fb_size = fb_size;
            w.scale = scale;
            w.maximized = maximized;
        })?;
        debug!("Cocoa: Created window {:?}", id);
        Ok(())
    }

    pub(super) fn cocoa_destroy_window(&self, id: WindowId) -> Result<()> {
        let window = self.windows.borrow_mut().remove(&id)
            .ok_or_else(|| Error::failed(format!("Unknown window {:?}", id)))?;
        window.close();
        // Let AppKit process the close before the objects go away.
        self.poll_native_now();
        debug!("Cocoa: Destroyed window {:?}", id);
        Ok(())
    }

    fn poll_native_now(&self) {
        let mode = NSString::from_str(NSDefaultRunLoopMode);
        if let Some(date) = super::date_for(crate::timeout::Timeout::none()) {
            while let Some(event) = self.next_event(&date, &mode) {
                unsafe {
                    let _: () = msg_send![&*self.app, sendEvent: &*event];
                }
            }
        }
    }

    pub(super) fn cocoa_set_window_title(&self, id: WindowId, title: &str) -> Result<()> {
        let object = self.object(id)?;
        let title = NSString::from_str(title);
        unsafe {
            let _: () = msg_send![&*object, setTitle: &*title];
            // The mini-window title does not follow the title of a window that
            // was never shown.
            let _: () = msg_send![&*object, setMiniwindowTitle: &*title];
        }
        Ok(())
    }

    pub(super) fn cocoa_window_pos(&self, id: WindowId) -> Result<Vec2<i32>> {
        let object = self.object(id)?;
        let content: NSRect = unsafe {
            let frame: NSRect = msg_send![&*object, frame];
            msg_send![&*object, contentRectForFrameRect: frame]
        };
        Ok(Vec2::new(content.origin.x as i32, transform_y(content.origin.y + content.size.height - 1.) as i32))
    }

    pub(super) fn cocoa_set_window_pos(&self, id: WindowId, pos: Vec2<i32>) -> Result<()> {
        let object = self.object(id)?;
        let content = self.content_rect(id)?;
        let dummy = NSRect::new(
            NSPoint::new(pos.x as f64, transform_y(pos.y as f64 + content.size.height - 1.)),
            NSSize::new(0., 0.));
        unsafe {
            let frame: NSRect = msg_send![&*object, frameRectForContentRect: dummy];
            let _: () = msg_send![&*object, setFrameOrigin: frame.origin];
        }
        Ok(())
    }

    pub(super) fn cocoa_window_size(&self, id: WindowId) -> Result<Extent2<i32>> {
        let content = self.content_rect(id)?;
        Ok(Extent2::new(content.size.width as i32, content.size.height as i32))
    }

    pub(super) fn cocoa_set_window_size(&self, id: WindowId, size: Extent2<i32>) -> Result<()> {
        let object = self.object(id)?;
        unsafe {
            let frame: NSRect = msg_send![&*object, frame];
            let mut content: NSRect = msg_send![&*object, contentRectForFrameRect: frame];
            // Grow or shrink downwards, keeping the top edge in place.
            content.origin.y += content.size.height - size.h as f64;
            content.size = NSSize::new(size.w as f64, size.h as f64);
            let frame: NSRect = msg_send![&*object, frameRectForContentRect: content];
            let _: () = msg_send![&*object, setFrame: frame, display: true];
        }
        Ok(())
    }

    pub(super) fn cocoa_set_window_size_limits(&self, id: WindowId, min: Extent2<i32>, max: Extent2<i32>) -> Result<()> {
        let object = self.object(id)?;
        let min = if min.w == DONT_CARE || min.h == DONT_CARE {
            NSSize::new(0., 0.)
        } else {
            NSSize::new(min.w as f64, min.h as f64)
        };
        let max = if max.w == DONT_CARE || max.h == DONT_CARE {
            NSSize::new(f64::MAX, f64::MAX)
        } else {
            NSSize::new(max.w as f64, max.h as f64)
        };
        unsafe {
            let _: () = msg_send![&*object, setContentMinSize: min];
            let _: () = msg_send![&*object, setContentMaxSize: max];
        }
        Ok(())
    }

    pub(super) fn cocoa_set_window_aspect_ratio(&self, id: WindowId, numer: i32, denom: i32) -> Result<()> {
        let object = self.object(id)?;
        unsafe {
            if numer == DONT_CARE || denom == DONT_CARE {
                let _: () = msg_send![&*object, setResizeIncrements: NSSize::new(1., 1.)];
            } else {
                let _: () = msg_send![&*object, setContentAspectRatio: NSSize::new(numer as f64, denom as f64)];
            }
        }
        Ok(())
    }

    pub(super) fn cocoa_framebuffer_size(&self, id: WindowId) -> Result<Extent2<i32>> {
        let view = self.view(id)?;
        let backing: NSRect = unsafe {
            let frame: NSRect = msg_send![&*view, frame];
            msg_send![&*view, convertRectToBacking: frame]
        };
        Ok(Extent2::new(backing.size.width as i32, backing.size.height as i32))
    }

    pub(super) fn cocoa_window_frame_size(&self, id: WindowId) -> Result<FrameExtents> {
        let object = self.object(id)?;
        let content = self.content_rect(id)?;
        let frame: NSRect = unsafe { msg_send![&*object, frameRectForContentRect: content] };
        Ok(FrameExtents {
            left: (content.origin.x - frame.origin.x) as i32,
            top: (frame.origin.y + frame.size.height - content.origin.y - content.size.height) as i32,
            right: (frame.origin.x + frame.size.width - content.origin.x - content.size.width) as i32,
            bottom: (content.origin.y - frame.origin.y) as i32,
        })
    }

    pub(super) fn cocoa_window_content_scale(&self, id: WindowId) -> Result<Vec2<f32>> {
        let content = self.content_rect(id)?;
        let view = self.view(id)?;
        let backing: NSRect = unsafe { msg_send![&*view, convertRectToBacking: content] };
        if content.size.width <= 0. || content.size.height <= 0. {
            return Ok(Vec2::new(1., 1.));
        }
        Ok(Vec2::new((backing.size.width / content.size.width) as f32, (backing.size.height / content.size.height) as f32))
    }

    pub(super) fn cocoa_iconify_window(&self, id: WindowId) -> Result<()> {
        let object = self.object(id)?;
        unsafe {
            let _: () = msg_send![&*object, miniaturize: None::<&AnyObject>];
        }
        Ok(())
    }

    pub(super) fn cocoa_restore_window(&self, id: WindowId) -> Result<()> {
        let object = self.object(id)?;
        unsafe {
            let miniaturized: bool = msg_send![&*object, isMiniaturized];
            let zoomed: bool = msg_send![&*object, isZoomed];
            if miniaturized {
                let _: () = msg_send![&*object, deminiaturize: None::<&AnyObject>];
            } else if zoomed {
                let _: () = msg_send![&*object, zoom: None::<&AnyObject>];
            }
        }
        Ok(())
    }

    pub(super) fn cocoa_maximize_window(&self, id: WindowId) -> Result<()> {
        let object = self.object(id)?;
        unsafe {
            let zoomed: bool = msg_send![&*object, isZoomed];
            if !zoomed {
                let _: () = msg_send![&*object, zoom: None::<&AnyObject>];
            }
        }
        Ok(())
    }

    pub(super) fn cocoa_show_window(&self, id: WindowId) -> Result<()> {
        let object = self.object(id)?;
        unsafe {
            let _: () = msg_send![&*object, orderFront: None::<&AnyObject>];
        }
        Ok(())
    }

    pub(super) fn cocoa_hide_window(&self, id: WindowId) -> Result<()> {
        let object = self.object(id)?;
        unsafe {
            let _: () = msg_send![&*object, orderOut: None::<&AnyObject>];
        }
        Ok(())
    }

    pub(super) fn cocoa_focus_window(&self, id: WindowId) -> Result<()> {
        let object = self.object(id)?;
        unsafe {
            // Keyboard focus needs the application to be active first.
            let _: () = msg_send![&*self.app, activateIgnoringOtherApps: true];
            let _: () = msg_send![&*object, makeKeyAndOrderFront: None::<&AnyObject>];
        }
        Ok(())
    }

    pub(super) fn cocoa_set_window_monitor(&self, id: WindowId, monitor: Option<&MonitorKey>, rect: Rect<i32, i32>) -> Result<()> {
        let fullscreen = monitor.is_some();
        let (object, view, mask, level) = self.with_window(id, |w| {
            w.fullscreen = fullscreen;
            (w.object.clone(), w.view.clone(), w.style_mask(), w.level())
        })?;
        let content = match monitor {
            Some(key) => {
                let pos = self.cocoa_monitor_pos(key)?;
                let mode = self.cocoa_current_video_mode(key)?;
                NSRect::new(NSPoint::new(pos.x as f64, transform_y((pos.y + mode.height - 1) as f64)),
                            NSSize::new(mode.width as f64, mode.height as f64))
            },
            None => NSRect::new(NSPoint::new(rect.x as f64, transform_y((rect.y + rect.h - 1) as f64)),
                                NSSize::new(rect.w as f64, rect.h as f64)),
        };
        unsafe {
            let _: () = msg_send![&*object, setStyleMask: mask];
            let frame: NSRect = msg_send![&*object, frameRectForContentRect: content];
            let _: () = msg_send![&*object, setFrame: frame, display: true];
            let _: () = msg_send![&*object, setLevel: level];
            let behavior = if fullscreen {
                NSWindowCollectionBehaviorFullScreenNone
            } else {
                NSWindowCollectionBehaviorFullScreenPrimary | NSWindowCollectionBehaviorManaged
            };
            let _: () = msg_send![&*object, setCollectionBehavior: behavior];
            let _: () = msg_send![&*object, setHasShadow: !fullscreen];
            // Changing the style mask drops the first responder.
            let _: bool = msg_send![&*object, makeFirstResponder: &*view];
        }
        Ok(())
    }

    pub(super) fn cocoa_window_hovered(&self, id: WindowId) -> Result<bool> {
        let object = self.object(id)?;
        unsafe {
            let point: NSPoint = msg_send![class!(NSEvent), mouseLocation];
            let number: isize = msg_send![class!(NSWindow), windowNumberAtPoint: point, belowWindowWithWindowNumber: 0isize];
            let own: isize = msg_send![&*object, windowNumber];
            if number != own {
                return Ok(false);
            }
            let frame: NSRect = msg_send![&*object, frame];
            let content: NSRect = msg_send![&*object, contentRectForFrameRect: frame];
            Ok(point.x >= content.origin.x && point.x < content.origin.x + content.size.width
                && point.y >= content.origin.y && point.y < content.origin.y + content.size.height)
        }
    }

    pub(super) fn cocoa_update_style(&self, id: WindowId) -> Result<()> {
        let (object, view, mask) = self.with_window(id, |w| (w.object.clone(), w.view.clone(), w.style_mask()))?;
        unsafe {
            let _: () = msg_send![&*object, setStyleMask: mask];
            let _: bool = msg_send![&*object, makeFirstResponder: &*view];
        }
        Ok(())
    }

    pub(super) fn cocoa_update_level(&self, id: WindowId) -> Result<()> {
        let (object, level) = self.with_window(id, |w| (w.object.clone(), w.level()))?;
        unsafe {
            let _: () = msg_send![&*object, setLevel: level];
        }
        Ok(())
    }

    /// Queues the size, framebuffer and maximization changes AppKit just applied.
    pub(super) fn window_resized(&self, id: WindowId) {
        let gl = self.with_window(id, |w| w.gl.clone()).ok().flatten();
        if let Some(gl) = gl {
            unsafe {
                let _: () = msg_send![&*gl, update];
            }
        }
        let disabled = self.with_window(id, |w| w.cursor_mode == CursorMode::Disabled).unwrap_or(false);
        if disabled {
            if let Ok(size) = self.cocoa_window_size(id) {
                let center = Vec2::new(size.w as f64 / 2., size.h as f64 / 2.);
                let _ = self.cocoa_set_cursor_pos(id, center);
            }
        }

        let (size, fb_size, maximized) = match (self.cocoa_window_size(id), self.cocoa_framebuffer_size(id), self.window_flag(id, WindowFlag::Zoomed)) {
            (Ok(size), Ok(fb_size), Ok(maximized)) => (size, fb_size, maximized),
            _ => return,
        };
        let changes = self.with_window(id, |w| {
            let changes = (w.maximized != maximized, w.size != size, w.fb_size != fb_size);
            w.maximized = maximized;
            w.size = size;
            w.fb_size = fb_size;
            changes
        });
        let (maximize_changed, size_changed, fb_changed) = match changes {
            Ok(changes) => changes,
            Err(_) => return,
        };
        if maximize_changed {
            self.push(Event::WindowMaximizeChanged { window: id, maximized });
        }
        if size_changed {
            self.push(Event::WindowResized { window: id, size });
        }
        if fb_changed {
            self.push(Event::FramebufferResized { window: id, size: fb_size });
        }
    }

    /// Queues the framebuffer and content scale changes of a move to a display
    /// with another backing scale factor.
    pub(super) fn backing_changed(&self, id: WindowId) {
        let (fb_size, scale) = match (self.cocoa_framebuffer_size(id), self.cocoa_window_content_scale(id)) {
            (Ok(fb_size), Ok(scale)) => (fb_size, scale),
            _ => return,
        };
        let changes = self.with_window(id, |w| {
            let changes = (w.fb_size != fb_size, w.scale != scale);
            w.fb_size = fb_size;
            w.scale = scale;
            changes
        });
        if let Ok((fb_changed, scale_changed)) = changes {
            if fb_changed {
                self.push(Event::FramebufferResized { window: id, size: fb_size });
            }
            if scale_changed {
                self.push(Event::ContentScaleChanged { window: id, scale });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styles_follow_flags() {
        assert_eq!(style_mask(true, true, true), NSWindowStyleMaskBorderless);
        assert_eq!(style_mask(false, false, true), NSWindowStyleMaskMiniaturizable);
        let decorated = style_mask(false, true, false);
        assert_ne!(decorated & NSWindowStyleMaskTitled, 0);
        assert_eq!(decorated & NSWindowStyleMaskResizable, 0);
        assert_ne!(style_mask(false, true, true) & NSWindowStyleMaskResizable, 0);
    }

    #[test]
    fn fullscreen_windows_sit_above_the_menu_bar() {
        assert!(window_level(true, false) > NSMainMenuWindowLevel);
        assert_eq!(window_level(false, true), NSFloatingWindowLevel);
        assert_eq!(window_level(false, false), NSNormalWindowLevel);
    }
}
