//! The application delegate, and the per-window delegate that turns AppKit window
//! notifications into events.

use std::rc::Weak;
use objc2::rc::Retained;
use objc2::runtime::{AnyObject, NSObject, NSObjectProtocol};
use objc2::{define_class, msg_send, DefinedClass, MainThreadMarker, MainThreadOnly};
use super::ffi::*;
use super::CocoaShared;
use crate::event::Event;
use crate::platform::WindowId;

pub(super) struct AppDelegateIvars {
    shared: Weak<CocoaShared>,
}

define_class!(
    #[unsafe(super(NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "WinpalApplicationDelegate"]
    #[ivars = AppDelegateIvars]
    pub(super) struct AppDelegate;

    unsafe impl NSObjectProtocol for AppDelegate {}

    impl AppDelegate {
        /// Quitting from the Dock or the menu asks every window to close instead.
        #[unsafe(method(applicationShouldTerminate:))]
        fn should_terminate(&self, _sender: &AnyObject) -> usize {
            if let Some(shared) = self.ivars().shared.upgrade() {
                for window in shared.window_ids() {
                    shared.push(Event::WindowCloseRequested { window });
                }
            }
            NSTerminateCancel
        }

        #[unsafe(method(applicationDidChangeScreenParameters:))]
        fn screen_parameters_changed(&self, _notification: &AnyObject) {
            if let Some(shared) = self.ivars().shared.upgrade() {
                shared.monitors_changed();
            }
        }
    }
);

impl AppDelegate {
    pub fn new(mtm: MainThreadMarker, shared: Weak<CocoaShared>) -> Retained<Self> {
        let this = Self::alloc(mtm).set_ivars(AppDelegateIvars { shared });
        unsafe { msg_send![super(this), init] }
    }
}

pub(super) struct WindowDelegateIvars {
    shared: Weak<CocoaShared>,
    id: WindowId,
}

define_class!(
    #[unsafe(super(NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "WinpalWindowDelegate"]
    #[ivars = WindowDelegateIvars]
    pub(super) struct WindowDelegate;

    unsafe impl NSObjectProtocol for WindowDelegate {}

    impl WindowDelegate {
        #[unsafe(method(windowShouldClose:))]
        fn should_close(&self, _sender: &AnyObject) -> bool {
            self.with_shared(|shared, window| shared.push(Event::WindowCloseRequested { window }));
            false
        }

        #[unsafe(method(windowDidResize:))]
        fn did_resize(&self, _notification: &AnyObject) {
            self.with_shared(|shared, window| shared.window_resized(window));
        }

        #[unsafe(method(windowDidMove:))]
        fn did_move(&self, _notification: &AnyObject) {
            self.with_shared(|shared, window| {
                if let Ok(position) = shared.cocoa_window_pos(window) {
                    shared.push(Event::WindowMoved { window, position });
                }
            });
        }

        #[unsafe(method(windowDidMiniaturize:))]
        fn did_miniaturize(&self, _notification: &AnyObject) {
            self.with_shared(|shared, window| shared.push(Event::WindowIconifyChanged { window, iconified: true }));
        }

        #[unsafe(method(windowDidDeminiaturize:))]
        fn did_deminiaturize(&self, _notification: &AnyObject) {
            self.with_shared(|shared, window| shared.push(Event::WindowIconifyChanged { window, iconified: false }));
        }

        #[unsafe(method(windowDidBecomeKey:))]
        fn did_become_key(&self, _notification: &AnyObject) {
            self.with_shared(|shared, window| {
                shared.push(Event::WindowFocusChanged { window, focused: true });
                shared.update_cursor_image(window);
            });
        }

        #[unsafe(method(windowDidResignKey:))]
        fn did_resign_key(&self, _notification: &AnyObject) {
            self.with_shared(|shared, window| shared.push(Event::WindowFocusChanged { window, focused: false }));
        }

        #[unsafe(method(windowDidChangeBackingProperties:))]
        fn did_change_backing(&self, _notification: &AnyObject) {
            self.with_shared(|shared, window| shared.backing_changed(window));
        }
    }
);

impl WindowDelegate {
    pub fn new(mtm: MainThreadMarker, shared: Weak<CocoaShared>, id: WindowId) -> Retained<Self> {
        let this = Self::alloc(mtm).set_ivars(WindowDelegateIvars { shared, id });
        unsafe { msg_send![super(this), init] }
    }

    fn with_shared<F: FnOnce(&CocoaShared, WindowId)>(&self, f: F) {
        let ivars = self.ivars();
        if let Some(shared) = ivars.shared.upgrade() {
            f(&shared, ivars.id);
        }
    }
}
