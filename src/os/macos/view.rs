//! The content view, which receives keyboard, mouse and drag-and-drop input, and
//! the window subclass that lets borderless windows take keyboard focus.

use std::rc::Weak;
use objc2::rc::{Allocated, Retained};
use objc2::runtime::{AnyObject, NSObject, NSObjectProtocol};
use objc2::{class, define_class, msg_send, DefinedClass, MainThreadMarker, MainThreadOnly};
use objc2_app_kit::{NSEvent, NSResponder, NSView, NSWindow};
use objc2_foundation::{NSArray, NSPoint, NSRect, NSString};
use super::ffi::*;
use super::keys::{is_function_key_char, modifier_flag, translate_flags};
use super::CocoaShared;
use crate::event::Event;
use crate::input::{Action, CursorMode, Modifiers, MouseButton};
use crate::platform::WindowId;
use crate::Vec2;

define_class!(
    #[unsafe(super(NSWindow, NSResponder, NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "WinpalWindow"]
    pub(super) struct KeyableWindow;

    unsafe impl NSObjectProtocol for KeyableWindow {}

    impl KeyableWindow {
        #[unsafe(method(canBecomeKeyWindow))]
        fn can_become_key(&self) -> bool {
            true
        }

        #[unsafe(method(canBecomeMainWindow))]
        fn can_become_main(&self) -> bool {
            true
        }
    }
);

pub(super) struct ContentViewIvars {
    shared: Weak<CocoaShared>,
    id: WindowId,
}

define_class!(
    #[unsafe(super(NSView, NSResponder, NSObject))]
    #[thread_kind = MainThreadOnly]
    #[name = "WinpalContentView"]
    #[ivars = ContentViewIvars]
    pub(super) struct ContentView;

    unsafe impl NSObjectProtocol for ContentView {}

    impl ContentView {
        #[unsafe(method(acceptsFirstResponder))]
        fn accepts_first_responder(&self) -> bool {
            true
        }

        #[unsafe(method(canBecomeKeyView))]
        fn can_become_key_view(&self) -> bool {
            true
        }

        #[unsafe(method(acceptsFirstMouse:))]
        fn accepts_first_mouse(&self, _event: Option<&NSEvent>) -> bool {
            true
        }

        #[unsafe(method(drawRect:))]
        fn draw_rect(&self, _rect: NSRect) {
            self.with_shared(|shared, window| shared.push(Event::WindowNeedsRefresh { window }));
        }

        #[unsafe(method(keyDown:))]
        fn key_down(&self, event: &NSEvent) {
            self.with_shared(|shared, window| {
                let (scancode, mods) = key_info(event);
                let key = shared.keys.key(scancode);
                shared.push(Event::KeyboardKey { window, key, scancode, action: Action::Press, mods });

                let characters: Option<Retained<NSString>> = unsafe { msg_send![event, characters] };
                let plain = !mods.intersects(Modifiers::CONTROL | Modifiers::SUPER);
                if let Some(characters) = characters {
                    for c in characters.to_string().chars().filter(|&c| !is_function_key_char(c)) {
                        shared.push(Event::TextInput { window, codepoint: c as u32, mods, plain });
                    }
                }
            });
        }

        #[unsafe(method(keyUp:))]
        fn key_up(&self, event: &NSEvent) {
            self.with_shared(|shared, window| {
                let (scancode, mods) = key_info(event);
                let key = shared.keys.key(scancode);
                shared.push(Event::KeyboardKey { window, key, scancode, action: Action::Release, mods });
            });
        }

        #[unsafe(method(flagsChanged:))]
        fn flags_changed(&self, event: &NSEvent) {
            self.with_shared(|shared, window| {
                let (scancode, mods) = key_info(event);
                let key = shared.keys.key(scancode);
                let flags: usize = unsafe { msg_send![event, modifierFlags] };
                let down = flags & modifier_flag(key) != 0;
                let action = shared.with_window(window, |w| {
                    if down && w.held_modifiers.insert(key) {
                        Action::Press
                    } else {
                        w.held_modifiers.remove(&key);
                        Action::Release
                    }
                });
                if let Ok(action) = action {
                    shared.push(Event::KeyboardKey { window, key, scancode, action, mods });
                }
            });
        }

        #[unsafe(method(mouseDown:))]
        fn mouse_down(&self, event: &NSEvent) {
            self.button(event, MouseButton::LEFT, Action::Press);
        }

        #[unsafe(method(mouseUp:))]
        fn mouse_up(&self, event: &NSEvent) {
            self.button(event, MouseButton::LEFT, Action::Release);
        }

        #[unsafe(method(rightMouseDown:))]
        fn right_mouse_down(&self, event: &NSEvent) {
            self.button(event, MouseButton::RIGHT, Action::Press);
        }

        #[unsafe(method(rightMouseUp:))]
        fn right_mouse_up(&self, event: &NSEvent) {
            self.button(event, MouseButton::RIGHT, Action::Release);
        }

        #[unsafe(method(otherMouseDown:))]
        fn other_mouse_down(&self, event: &NSEvent) {
            if let Some(button) = other_button(event) {
                self.button(event, button, Action::Press);
            }
        }

        #[unsafe(method(otherMouseUp:))]
        fn other_mouse_up(&self, event: &NSEvent) {
            if let Some(button) = other_button(event) {
                self.button(event, button, Action::Release);
            }
        }

        #[unsafe(method(mouseMoved:))]
        fn mouse_moved(&self, event: &NSEvent) {
            self.motion(event);
        }

        #[unsafe(method(mouseDragged:))]
        fn mouse_dragged(&self, event: &NSEvent) {
            self.motion(event);
        }

        #[unsafe(method(rightMouseDragged:))]
        fn right_mouse_dragged(&self, event: &NSEvent) {
            self.motion(event);
        }

        #[unsafe(method(otherMouseDragged:))]
        fn other_mouse_dragged(&self, event: &NSEvent) {
            self.motion(event);
        }

        #[unsafe(method(scrollWheel:))]
        fn scroll_wheel(&self, event: &NSEvent) {
            self.with_shared(|shared, window| {
                let (mut x, mut y, precise): (f64, f64, bool) = unsafe {
                    (msg_send![event, scrollingDeltaX], msg_send![event, scrollingDeltaY], msg_send![event, hasPreciseScrollingDeltas])
                };
                if precise {
                    x *= 0.1;
                    y *= 0.1;
                }
                if x != 0. || y != 0. {
                    shared.push(Event::MouseScroll { window, scroll: Vec2::new(x, y) });
                }
            });
        }

        #[unsafe(method(mouseEntered:))]
        fn mouse_entered(&self, _event: &NSEvent) {
            self.with_shared(|shared, window| {
                if matches!(shared.with_window(window, |w| w.cursor_mode), Ok(CursorMode::Hidden)) {
                    shared.hide_cursor();
                }
                shared.push(Event::MouseEnter { window, entered: true });
            });
        }

        #[unsafe(method(mouseExited:))]
        fn mouse_exited(&self, _event: &NSEvent) {
            self.with_shared(|shared, window| {
                if matches!(shared.with_window(window, |w| w.cursor_mode), Ok(CursorMode::Hidden)) {
                    shared.show_cursor();
                }
                shared.push(Event::MouseEnter { window, entered: false });
            });
        }

        #[unsafe(method(cursorUpdate:))]
        fn cursor_update(&self, _event: &NSEvent) {
            self.with_shared(|shared, window| shared.update_cursor_image(window));
        }

        #[unsafe(method(draggingEntered:))]
        fn dragging_entered(&self, _sender: &AnyObject) -> usize {
            NSDragOperationGeneric
        }

        #[unsafe(method(performDragOperation:))]
        fn perform_drag_operation(&self, sender: &AnyObject) -> bool {
            let height = self.height();
            let paths = unsafe { dropped_paths(sender) };
            let location: NSPoint = unsafe { msg_send![sender, draggingLocation] };
            self.with_shared(|shared, window| {
                shared.push(Event::MouseMotion { window, position: Vec2::new(location.x, height - location.y) });
                if !paths.is_empty() {
                    shared.push(Event::FilesDropped { window, paths });
                }
            });
            true
        }
    }
);

fn key_info(event: &NSEvent) -> (i32, Modifiers) {
    let (code, flags): (u16, usize) = unsafe { (msg_send![event, keyCode], msg_send![event, modifierFlags]) };
    (code as i32, translate_flags(flags))
}

fn other_button(event: &NSEvent) -> Option<MouseButton> {
    let number: isize = unsafe { msg_send![event, buttonNumber] };
    MouseButton::from_raw(number as i32)
}

/// File paths on the dragging pasteboard, in pasteboard order.
unsafe fn dropped_paths(sender: &AnyObject) -> Vec<String> {
    let mut paths = Vec::new();
    let pasteboard: Option<Retained<AnyObject>> = msg_send![sender, draggingPasteboard];
    let items: Option<Retained<AnyObject>> = match pasteboard {
        Some(pasteboard) => msg_send![&*pasteboard, pasteboardItems],
        None => None,
    };
    let items = match items {
        Some(items) => items,
        None => return paths,
    };
    let file_url = NSString::from_str(NSPasteboardTypeFileURL);
    let count: usize = msg_send![&*items, count];
    for i in 0..count {
        let item: Retained<AnyObject> = msg_send![&*items, objectAtIndex: i];
        let string: Option<Retained<NSString>> = msg_send![&*item, stringForType: &*file_url];
        let url: Option<Retained<AnyObject>> = match string {
            Some(string) => msg_send![class!(NSURL), URLWithString: &*string],
            None => None,
        };
        let path: Option<Retained<NSString>> = match url {
            Some(url) => msg_send![&*url, path],
            None => None,
        };
        if let Some(path) = path {
            paths.push(path.to_string());
        }
    }
    paths
}

impl ContentView {
    pub fn new(mtm: MainThreadMarker, shared: Weak<CocoaShared>, id: WindowId) -> Retained<Self> {
        let this = Self::alloc(mtm).set_ivars(ContentViewIvars { shared, id });
        let view: Retained<Self> = unsafe { msg_send![super(this), initWithFrame: NSRect::ZERO] };
        unsafe {
            let options = NSTrackingMouseEnteredAndExited | NSTrackingActiveInKeyWindow | NSTrackingEnabledDuringMouseDrag
                | NSTrackingCursorUpdate | NSTrackingInVisibleRect | NSTrackingAssumeInside;
            let area: Allocated<AnyObject> = msg_send![class!(NSTrackingArea), alloc];
            let area: Option<Retained<AnyObject>> = msg_send![area,
                initWithRect: NSRect::ZERO,
                options: options,
                owner: &*view,
                userInfo: None::<&AnyObject>];
            if let Some(area) = area {
                let _: () = msg_send![&*view, addTrackingArea: &*area];
            }
            let types = NSArray::from_retained_slice(&[NSString::from_str(NSPasteboardTypeFileURL)]);
            let _: () = msg_send![&*view, registerForDraggedTypes: &*types];
        }
        view
    }

    fn with_shared<F: FnOnce(&CocoaShared, WindowId)>(&self, f: F) {
        let ivars = self.ivars();
        if let Some(shared) = ivars.shared.upgrade() {
            f(&shared, ivars.id);
        }
    }

    fn height(&self) -> f64 {
        let frame: NSRect = unsafe { msg_send![self, frame] };
        frame.size.height
    }

    fn button(&self, event: &NSEvent, button: MouseButton, action: Action) {
        let flags: usize = unsafe { msg_send![event, modifierFlags] };
        let mods = translate_flags(flags);
        self.with_shared(|shared, window| shared.push(Event::MouseButton { window, button, action, mods }));
    }

    fn motion(&self, event: &NSEvent) {
        let height = self.height();
        let (location, dx, dy): (NSPoint, f64, f64) = unsafe {
            (msg_send![event, locationInWindow], msg_send![event, deltaX], msg_send![event, deltaY])
        };
        self.with_shared(|shared, window| {
            let position = shared.with_window(window, |w| {
                let position = if w.cursor_mode == CursorMode::Disabled {
                    // The cursor is pinned; only the deltas say where it would be.
                    w.cursor_pos + Vec2::new(dx, dy) - w.warp_delta
                } else {
                    Vec2::new(location.x, height - location.y)
                };
                w.warp_delta = Vec2::new(0., 0.);
                w.cursor_pos = position;
                position
            });
            if let Ok(position) = position {
                shared.push(Event::MouseMotion { window, position });
            }
        });
    }
}
