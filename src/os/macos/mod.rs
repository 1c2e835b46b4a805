//! The Cocoa backend: AppKit for windows and input, Quartz Display Services for
//! monitors, NSGL for contexts.
//!
//! AppKit must be driven from the main thread; connecting anywhere else fails.
//! Native callbacks (window delegates, the content view) only queue events, which
//! `poll_events()` hands to the core once the native queue is drained.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::mem;
use std::os::raw::c_void;
use std::ptr;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use objc2::rc::{autoreleasepool, Allocated, Retained};
use objc2::runtime::AnyObject;
use objc2::{class, msg_send, sel, MainThreadMarker};
use objc2_app_kit::{NSApplication, NSEvent, NSWindow};
use objc2_foundation::{NSPoint, NSString};

mod cursor;
mod delegate;
mod ffi;
mod keys;
mod monitor;
mod nsgl;
mod view;
mod window;

use self::delegate::AppDelegate;
use self::ffi::*;
use self::keys::KeyTables;
use self::nsgl::NsglContext;
use self::window::{CocoaWindow, WindowFlag};
use crate::cursor::StandardCursor;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::hint::{ContextConfig, FramebufferConfig, WindowConfig};
use crate::image::RgbaImage;
use crate::input::{CursorMode, Key};
use crate::monitor::VideoMode;
use crate::platform::{CursorId, FrameExtents, MonitorInfo, MonitorKey, Platform, PlatformContext, PlatformKind, Waker, WindowId};
use crate::timeout::Timeout;
use crate::{Extent2, Rect, Vec2};

/// Queues an empty application-defined event, which ends a wait in
/// `nextEventMatchingMask:`. AppKit accepts posted events from any thread.
fn post_empty_event() {
    autoreleasepool(|_| unsafe {
        let event: *mut AnyObject = msg_send![class!(NSEvent),
            otherEventWithType: NSEventTypeApplicationDefined,
            location: NSPoint::new(0., 0.),
            modifierFlags: 0usize,
            timestamp: 0f64,
            windowNumber: 0isize,
            context: ptr::null_mut::<AnyObject>(),
            subtype: 0i16,
            data1: 0isize,
            data2: 0isize];
        if event.is_null() {
            return;
        }
        let app: *mut AnyObject = msg_send![class!(NSApplication), sharedApplication];
        let _: () = msg_send![app, postEvent: event, atStart: true];
    })
}

#[derive(Debug)]
struct EventWaker;

impl Waker for EventWaker {
    fn wake(&self) -> Result<()> {
        post_empty_event();
        Ok(())
    }
}

/// Runs on the main thread's run loop whenever the display configuration changes.
extern "C" fn display_reconfigured(_display: CGDirectDisplayID, flags: u32, user_info: *mut c_void) {
    if flags & kCGDisplayBeginConfigurationFlag != 0 || user_info.is_null() {
        return;
    }
    let changed = unsafe { &*(user_info as *const AtomicBool) };
    changed.store(true, Ordering::SeqCst);
    post_empty_event();
}

pub(crate) struct CocoaShared {
    mtm: MainThreadMarker,
    /// Handed to the delegates and views this backend creates.
    this: Weak<CocoaShared>,
    app: Retained<NSApplication>,
    app_delegate: Retained<AppDelegate>,
    keys: KeyTables,
    windows: RefCell<HashMap<WindowId, CocoaWindow>>,
    cursors: RefCell<HashMap<CursorId, Retained<AnyObject>>>,
    /// Display ids by monitor key, refreshed on every poll. Ids change across
    /// reconfigurations, unit numbers do not.
    displays: RefCell<HashMap<MonitorKey, CGDirectDisplayID>>,
    /// Modes to put back, for every display whose mode was changed.
    original_modes: RefCell<HashMap<MonitorKey, VideoMode>>,
    cursor_hidden: Cell<bool>,
    /// Token of the activity that keeps the display awake while fullscreen.
    activity: RefCell<Option<Retained<AnyObject>>>,
    monitors_changed: Arc<AtomicBool>,
    pending: RefCell<Vec<Event>>,
    waker: Arc<EventWaker>,
}

/// Delegates and views find the backend through a weak reference, hence the `Rc`.
pub(crate) struct CocoaPlatform(Rc<CocoaShared>);

unsafe fn install_menu_bar(app: &NSApplication) {
    let bar: Retained<AnyObject> = msg_send![class!(NSMenu), new];
    let app_item: Retained<AnyObject> = msg_send![class!(NSMenuItem), new];
    let _: () = msg_send![&*bar, addItem: &*app_item];
    let _: () = msg_send![app, setMainMenu: &*bar];

    let app_menu: Retained<AnyObject> = msg_send![class!(NSMenu), new];
    let title = NSString::from_str("Quit");
    let key = NSString::from_str("q");
    let quit: Allocated<AnyObject> = msg_send![class!(NSMenuItem), alloc];
    let quit: Option<Retained<AnyObject>> = msg_send![quit, initWithTitle: &*title, action: sel!(terminate:), keyEquivalent: &*key];
    if let Some(quit) = quit {
        let _: () = msg_send![&*app_menu, addItem: &*quit];
    }
    let _: () = msg_send![&*app_item, setSubmenu: &*app_menu];
}

impl CocoaPlatform {
    pub fn connect() -> Result<Self> {
        let mtm = MainThreadMarker::new().ok_or_else(|| Error::failed("Cocoa: The library must be initialized on the main thread"))?;
        let app = NSApplication::sharedApplication(mtm);
        let shared = Rc::new_cyclic(|this: &Weak<CocoaShared>| CocoaShared {
            mtm,
            this: this.clone(),
            app: app.clone(),
            app_delegate: AppDelegate::new(mtm, this.clone()),
            keys: KeyTables::new(),
            windows: RefCell::new(HashMap::new()),
            cursors: RefCell::new(HashMap::new()),
            displays: RefCell::new(HashMap::new()),
            original_modes: RefCell::new(HashMap::new()),
            cursor_hidden: Cell::new(false),
            activity: RefCell::new(None),
            monitors_changed: Arc::new(AtomicBool::new(false)),
            pending: RefCell::new(Vec::new()),
            waker: Arc::new(EventWaker),
        });
        unsafe {
            let _: bool = msg_send![&*app, setActivationPolicy: NSApplicationActivationPolicyRegular];
            let _: () = msg_send![&*app, setDelegate: &*shared.app_delegate];
            let main_menu: Option<Retained<AnyObject>> = msg_send![&*app, mainMenu];
            if main_menu.is_none() {
                install_menu_bar(&app);
            }
            let _: () = msg_send![&*app, finishLaunching];

            let user_info = Arc::as_ptr(&shared.monitors_changed) as *mut c_void;
            if CGDisplayRegisterReconfigurationCallback(display_reconfigured, user_info) != kCGErrorSuccess {
                warn!("Cocoa: Failed to register for display reconfiguration; monitor hot-plugging will go unnoticed");
            }
        }
        debug!("Cocoa: Connected");
        Ok(CocoaPlatform(shared))
    }
}

impl CocoaShared {
    pub(super) fn push(&self, event: Event) {
        trace!("Cocoa: Queuing {:?}", event);
        self.pending.borrow_mut().push(event);
    }

    pub(super) fn window_ids(&self) -> Vec<WindowId> {
        self.windows.try_borrow().map(|w| w.keys().copied().collect()).unwrap_or_default()
    }

    pub(super) fn monitors_changed(&self) {
        self.monitors_changed.store(true, Ordering::SeqCst);
    }

    fn key_name(&self, scancode: i32) -> Option<String> {
        // Without a keyboard layout service, keys are named by their US ANSI label.
        self.keys.key(scancode).us_char().map(|c| c.to_string())
    }

    fn next_event(&self, until: &AnyObject, mode: &NSString) -> Option<Retained<NSEvent>> {
        unsafe { msg_send![&*self.app, nextEventMatchingMask: NSEventMaskAny, untilDate: until, inMode: mode, dequeue: true] }
    }
}

fn date_for(timeout: Timeout) -> Option<Retained<AnyObject>> {
    unsafe {
        if timeout.is_none() {
            return msg_send![class!(NSDate), distantPast];
        }
        match timeout.duration() {
            None => msg_send![class!(NSDate), distantFuture],
            Some(d) => msg_send![class!(NSDate), dateWithTimeIntervalSinceNow: d.as_secs_f64()],
        }
    }
}

impl Drop for CocoaShared {
    fn drop(&mut self) {
        unsafe {
            let user_info = Arc::as_ptr(&self.monitors_changed) as *mut c_void;
            CGDisplayRemoveReconfigurationCallback(display_reconfigured, user_info);
            CGAssociateMouseAndMouseCursorPosition(1);
        }
        self.restore_all_video_modes();
        if let Some(activity) = self.activity.get_mut().take() {
            self.end_activity(activity);
        }
        if self.cursor_hidden.get() {
            unsafe {
                let _: () = msg_send![class!(NSCursor), unhide];
            }
        }
        for (_, window) in self.windows.get_mut().drain() {
            window.close();
        }
        self.cursors.get_mut().clear();
        unsafe {
            let _: () = msg_send![&*self.app, setDelegate: ptr::null_mut::<AnyObject>()];
        }
    }
}

impl Platform for CocoaPlatform {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Cocoa
    }
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn poll_monitors(&self) -> Result<Vec<MonitorInfo>> {
        self.0.cocoa_poll_monitors()
    }
    fn monitor_pos(&self, monitor: &MonitorKey) -> Result<Vec2<i32>> {
        self.0.cocoa_monitor_pos(monitor)
    }
    fn monitor_work_area(&self, monitor: &MonitorKey) -> Result<Rect<i32, i32>> {
        self.0.cocoa_monitor_work_area(monitor)
    }
    fn monitor_content_scale(&self, monitor: &MonitorKey) -> Result<Vec2<f32>> {
        self.0.cocoa_monitor_content_scale(monitor)
    }
    fn video_modes(&self, monitor: &MonitorKey) -> Result<Vec<VideoMode>> {
        self.0.cocoa_video_modes(monitor)
    }
    fn current_video_mode(&self, monitor: &MonitorKey) -> Result<VideoMode> {
        self.0.cocoa_current_video_mode(monitor)
    }
    fn set_video_mode(&self, monitor: &MonitorKey, mode: &VideoMode) -> Result<()> {
        self.0.cocoa_set_video_mode(monitor, mode)
    }
    fn restore_video_mode(&self, monitor: &MonitorKey, original: &VideoMode) -> Result<()> {
        self.0.cocoa_restore_video_mode(monitor, original)
    }
    fn set_fullscreen_inhibitors(&self, active: bool) -> Result<()> {
        self.0.cocoa_set_fullscreen_inhibitors(active)
    }

    fn create_window(&self, id: WindowId, wndconfig: &WindowConfig, fbconfig: &FramebufferConfig, _ctxconfig: &ContextConfig, monitor: Option<&MonitorKey>) -> Result<()> {
        self.0.cocoa_create_window(id, wndconfig, fbconfig, monitor)
    }
    fn create_context(&self, id: WindowId, fbconfig: &FramebufferConfig, ctxconfig: &ContextConfig, share: Option<&dyn PlatformContext>) -> Result<Box<dyn PlatformContext>> {
        let share = match share {
            Some(share) => Some(share.as_any().downcast_ref::<NsglContext>()
                .ok_or_else(|| Error::invalid_value("Can only share with another NSGL context"))?),
            None => None,
        };
        Ok(Box::new(self.0.nsgl_create_context(id, fbconfig, ctxconfig, share)?))
    }
    fn destroy_window(&self, id: WindowId) -> Result<()> {
        self.0.cocoa_destroy_window(id)
    }
    fn set_window_title(&self, id: WindowId, title: &str) -> Result<()> {
        self.0.cocoa_set_window_title(id, title)
    }
    fn set_window_icon(&self, _id: WindowId, _images: &[RgbaImage]) -> Result<()> {
        // Windows have no icons of their own; the Dock shows the bundle's.
        Ok(())
    }
    fn window_pos(&self, id: WindowId) -> Result<Vec2<i32>> {
        self.0.cocoa_window_pos(id)
    }
    fn set_window_pos(&self, id: WindowId, pos: Vec2<i32>) -> Result<()> {
        self.0.cocoa_set_window_pos(id, pos)
    }
    fn window_size(&self, id: WindowId) -> Result<Extent2<i32>> {
        self.0.cocoa_window_size(id)
    }
    fn set_window_size(&self, id: WindowId, size: Extent2<i32>) -> Result<()> {
        self.0.cocoa_set_window_size(id, size)
    }
    fn set_window_size_limits(&self, id: WindowId, min: Extent2<i32>, max: Extent2<i32>) -> Result<()> {
        self.0.cocoa_set_window_size_limits(id, min, max)
    }
    fn set_window_aspect_ratio(&self, id: WindowId, numer: i32, denom: i32) -> Result<()> {
        self.0.cocoa_set_window_aspect_ratio(id, numer, denom)
    }
    fn framebuffer_size(&self, id: WindowId) -> Result<Extent2<i32>> {
        self.0.cocoa_framebuffer_size(id)
    }
    fn window_frame_size(&self, id: WindowId) -> Result<FrameExtents> {
        self.0.cocoa_window_frame_size(id)
    }
    fn window_content_scale(&self, id: WindowId) -> Result<Vec2<f32>> {
        self.0.cocoa_window_content_scale(id)
    }
    fn iconify_window(&self, id: WindowId) -> Result<()> {
        self.0.cocoa_iconify_window(id)
    }
    fn restore_window(&self, id: WindowId) -> Result<()> {
        self.0.cocoa_restore_window(id)
    }
    fn maximize_window(&self, id: WindowId) -> Result<()> {
        self.0.cocoa_maximize_window(id)
    }
    fn show_window(&self, id: WindowId) -> Result<()> {
        self.0.cocoa_show_window(id)
    }
    fn hide_window(&self, id: WindowId) -> Result<()> {
        self.0.cocoa_hide_window(id)
    }
    fn request_window_attention(&self, _id: WindowId) -> Result<()> {
        unsafe {
            let _: isize = msg_send![&*self.0.app, requestUserAttention: NSInformationalRequest];
        }
        Ok(())
    }
    fn focus_window(&self, id: WindowId) -> Result<()> {
        self.0.cocoa_focus_window(id)
    }
    fn set_window_monitor(&self, id: WindowId, monitor: Option<&MonitorKey>, rect: Rect<i32, i32>) -> Result<()> {
        self.0.cocoa_set_window_monitor(id, monitor, rect)
    }
    fn window_focused(&self, id: WindowId) -> Result<bool> {
        self.0.window_flag(id, WindowFlag::Key)
    }
    fn window_iconified(&self, id: WindowId) -> Result<bool> {
        self.0.window_flag(id, WindowFlag::Miniaturized)
    }
    fn window_visible(&self, id: WindowId) -> Result<bool> {
        self.0.window_flag(id, WindowFlag::Visible)
    }
    fn window_maximized(&self, id: WindowId) -> Result<bool> {
        self.0.window_flag(id, WindowFlag::Zoomed)
    }
    fn window_hovered(&self, id: WindowId) -> Result<bool> {
        self.0.cocoa_window_hovered(id)
    }
    fn framebuffer_transparent(&self, id: WindowId) -> Result<bool> {
        self.0.with_window(id, |w| w.transparent)
    }
    fn set_window_resizable(&self, id: WindowId, enabled: bool) -> Result<()> {
        self.0.with_window(id, |w| w.resizable = enabled)?;
        self.0.cocoa_update_style(id)
    }
    fn set_window_decorated(&self, id: WindowId, enabled: bool) -> Result<()> {
        self.0.with_window(id, |w| w.decorated = enabled)?;
        self.0.cocoa_update_style(id)
    }
    fn set_window_floating(&self, id: WindowId, enabled: bool) -> Result<()> {
        self.0.with_window(id, |w| w.floating = enabled)?;
        self.0.cocoa_update_level(id)
    }
    fn set_window_mouse_passthrough(&self, id: WindowId, enabled: bool) -> Result<()> {
        let object = self.0.object(id)?;
        unsafe {
            let _: () = msg_send![&*object, setIgnoresMouseEvents: enabled];
        }
        Ok(())
    }
    fn window_opacity(&self, id: WindowId) -> Result<f32> {
        let object = self.0.object(id)?;
        let alpha: f64 = unsafe { msg_send![&*object, alphaValue] };
        Ok(alpha as f32)
    }
    fn set_window_opacity(&self, id: WindowId, opacity: f32) -> Result<()> {
        let object = self.0.object(id)?;
        unsafe {
            let _: () = msg_send![&*object, setAlphaValue: opacity as f64];
        }
        Ok(())
    }

    fn poll_events(&self, timeout: Timeout) -> Result<Vec<Event>> {
        let s = &self.0;
        autoreleasepool(|_| {
            let mode = NSString::from_str(NSDefaultRunLoopMode);
            let first = if s.pending.borrow().is_empty() { timeout } else { Timeout::none() };
            let mut until = date_for(first);
            while let Some(date) = until.take() {
                let event = match s.next_event(&date, &mode) {
                    Some(event) => event,
                    None => break,
                };
                unsafe {
                    let kind: usize = msg_send![&*event, type];
                    let flags: usize = msg_send![&*event, modifierFlags];
                    // AppKit swallows key releases while Command is held.
                    if kind == NSEventTypeKeyUp && flags & NSEventModifierFlagCommand != 0 {
                        let key_window: Option<Retained<NSWindow>> = msg_send![&*s.app, keyWindow];
                        if let Some(key_window) = key_window {
                            let _: () = msg_send![&*key_window, sendEvent: &*event];
                        }
                    }
                    let _: () = msg_send![&*s.app, sendEvent: &*event];
                }
                until = date_for(Timeout::none());
            }
        });
        if s.monitors_changed.swap(false, Ordering::SeqCst) {
            s.push(Event::MonitorsChanged);
        }
        Ok(mem::replace(&mut *s.pending.borrow_mut(), Vec::new()))
    }
    fn waker(&self) -> Arc<dyn Waker> {
        self.0.waker.clone()
    }
    fn cursor_pos(&self, id: WindowId) -> Result<Vec2<f64>> {
        self.0.cocoa_cursor_pos(id)
    }
    fn set_cursor_pos(&self, id: WindowId, pos: Vec2<f64>) -> Result<()> {
        self.0.cocoa_set_cursor_pos(id, pos)
    }
    fn apply_cursor_mode(&self, id: WindowId, mode: CursorMode, _raw_motion: bool) -> Result<()> {
        self.0.cocoa_apply_cursor_mode(id, mode)
    }
    fn raw_mouse_motion_supported(&self) -> bool {
        false
    }
    fn key_scancode(&self, key: Key) -> i32 {
        self.0.keys.scancode(key)
    }
    fn key_name(&self, scancode: i32) -> Option<String> {
        self.0.key_name(scancode)
    }
    fn create_cursor(&self, id: CursorId, image: &RgbaImage, hot: Vec2<i32>) -> Result<()> {
        self.0.cocoa_create_cursor(id, image, hot)
    }
    fn create_standard_cursor(&self, id: CursorId, shape: StandardCursor) -> Result<()> {
        self.0.cocoa_create_standard_cursor(id, shape)
    }
    fn destroy_cursor(&self, id: CursorId) -> Result<()> {
        self.0.cocoa_destroy_cursor(id)
    }
    fn set_cursor(&self, window: WindowId, cursor: Option<CursorId>) -> Result<()> {
        self.0.cocoa_set_cursor(window, cursor)
    }
    fn set_clipboard_string(&self, s: &str) -> Result<()> {
        self.0.cocoa_set_clipboard_string(s)
    }
    fn clipboard_string(&self) -> Result<String> {
        self.0.cocoa_clipboard_string()
    }
}
