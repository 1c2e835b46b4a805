//! The window procedure: native messages in, `Event`s out.
//!
//! Messages are sent re-entrantly from inside many Win32 calls, so nothing here may
//! hold a borrow of the window table across a call that can send one.

use std::cell::RefCell;
use std::mem;
use std::ptr;
use std::rc::{Rc, Weak};
use super::window::apply_aspect_ratio;
use super::winapi_utils::*;
use super::Win32Shared;
use crate::event::Event;
use crate::hint::DONT_CARE;
use crate::input::{Action, Key, Modifiers, MouseButton};
use crate::platform::WindowId;
use crate::{Extent2, Vec2};

const KF_EXTENDED: WORD = 0x0100;
const KF_UP: WORD = 0x8000;
const MOUSE_MOVE_ABSOLUTE: USHORT = 0x01;
const MOUSE_VIRTUAL_DESKTOP: USHORT = 0x02;
const WHEEL_DELTA: f64 = 120.;

thread_local! {
    static CURRENT: RefCell<Weak<Win32Shared>> = RefCell::new(Weak::new());
}

/// Routes messages of this thread's windows to `shared`.
pub(super) fn set_current(shared: &Rc<Win32Shared>) {
    CURRENT.with(|c| *c.borrow_mut() = Rc::downgrade(shared));
}

pub(super) unsafe extern "system" fn wndproc(hwnd: HWND, msg: UINT, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    // Messages sent while connecting, or during CreateWindowExW, have no owner yet.
    let shared = match CURRENT.with(|c| c.borrow().upgrade()) {
        Some(shared) => shared,
        None => return DefWindowProcW(hwnd, msg, wparam, lparam),
    };
    if hwnd == shared.helper {
        if msg == WM_DISPLAYCHANGE {
            shared.push(Event::MonitorsChanged);
        }
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    }
    let id = shared.handles.borrow().get(&hwnd).copied();
    match id {
        Some(id) => shared.window_proc(id, hwnd, msg, wparam, lparam)
            .unwrap_or_else(|| DefWindowProcW(hwnd, msg, wparam, lparam)),
        None => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

/// Scancodes that Windows reports inconsistently.
fn fix_scancode(scancode: i32) -> i32 {
    match scancode {
        // Alt+PrtSc
        0x054 => 0x137,
        // Ctrl+Pause
        0x146 => 0x045,
        // Right Shift under some IMEs
        0x136 => 0x036,
        s => s,
    }
}

pub(super) fn key_mods() -> Modifiers {
    let down = |vk| unsafe { GetKeyState(vk) as u16 & 0x8000 != 0 };
    let toggled = |vk| unsafe { GetKeyState(vk) & 1 != 0 };
    let mut mods = Modifiers::empty();
    mods.set(Modifiers::SHIFT, down(VK_SHIFT));
    mods.set(Modifiers::CONTROL, down(VK_CONTROL));
    mods.set(Modifiers::ALT, down(VK_MENU));
    mods.set(Modifiers::SUPER, down(VK_LWIN) || down(VK_RWIN));
    mods.set(Modifiers::CAPS_LOCK, toggled(VK_CAPITAL));
    mods.set(Modifiers::NUM_LOCK, toggled(VK_NUMLOCK));
    mods
}

/// Alt-Gr arrives as a fake left Control press followed by a right Alt press with the same time.
unsafe fn is_alt_gr_control() -> bool {
    let time = GetMessageTime() as DWORD;
    let mut next: MSG = mem::zeroed();
    if PeekMessageW(&mut next, ptr::null_mut(), 0, 0, PM_NOREMOVE) == FALSE {
        return false;
    }
    let key_message = match next.message {
        WM_KEYDOWN | WM_SYSKEYDOWN | WM_KEYUP | WM_SYSKEYUP => true,
        _ => false,
    };
    key_message
        && next.wParam == VK_MENU as WPARAM
        && HIWORD(next.lParam as DWORD) & KF_EXTENDED != 0
        && next.time == time
}

/// Maps an absolute raw position to virtual desktop pixels when needed.
fn absolute_raw_position(flags: USHORT, x: LONG, y: LONG, desktop: RECT) -> Vec2<i32> {
    if flags & MOUSE_VIRTUAL_DESKTOP == 0 {
        return Vec2::new(x, y);
    }
    let w = (desktop.right - desktop.left) as f64;
    let h = (desktop.bottom - desktop.top) as f64;
    Vec2::new(
        desktop.left + (x as f64 / 65535. * w) as i32,
        desktop.top + (y as f64 / 65535. * h) as i32,
    )
}

impl Win32Shared {
    pub(super) fn push(&self, event: Event) {
        if let Event::KeyboardKey { key, action, .. } = event {
            let i = match key {
                Key::LeftShift => Some(0),
                Key::RightShift => Some(1),
                _ => None,
            };
            if let Some(i) = i {
                let mut down = self.shifts_down.get();
                down[i] = action != Action::Release;
                self.shifts_down.set(down);
            }
        }
        self.pending.borrow_mut().push(event);
    }

    fn is_disabled(&self, id: WindowId) -> bool {
        self.disabled_window.get() == Some(id)
    }

    unsafe fn window_proc(&self, id: WindowId, hwnd: HWND, msg: UINT, wparam: WPARAM, lparam: LPARAM) -> Option<LRESULT> {
        match msg {
            WM_SETFOCUS => {
                self.push(Event::WindowFocusChanged { window: id, focused: true });
                if self.is_disabled(id) {
                    self.clip_cursor_to(hwnd);
                    let _ = self.update_cursor_image(id);
                }
                Some(0)
            },
            WM_KILLFOCUS => {
                if self.is_disabled(id) {
                    self.release_cursor_clip();
                }
                self.push(Event::WindowFocusChanged { window: id, focused: false });
                Some(0)
            },
            WM_SYSCOMMAND => {
                match wparam & 0xfff0 {
                    SC_SCREENSAVE | SC_MONITORPOWER => {
                        let fullscreen = self.with_window(id, |w| w.fullscreen.get()).unwrap_or(false);
                        if fullscreen {
                            return Some(0);
                        }
                        None
                    },
                    // The Alt menu would steal the keyboard.
                    SC_KEYMENU => Some(0),
                    _ => None,
                }
            },
            WM_CLOSE => {
                self.push(Event::WindowCloseRequested { window: id });
                Some(0)
            },
            WM_CHAR | WM_SYSCHAR => {
                let unit = wparam as u16;
                let codepoint = self.with_window(id, |w| w.composer.push(unit)).ok().and_then(|c| c);
                if let Some(codepoint) = codepoint {
                    self.push(Event::TextInput { window: id, codepoint, mods: key_mods(), plain: msg != WM_SYSCHAR });
                }
                if msg == WM_SYSCHAR {
                    return None;
                }
                Some(0)
            },
            WM_UNICHAR => {
                // Tells the sender that WM_UNICHAR is understood.
                if wparam == UNICODE_NOCHAR {
                    return Some(TRUE as LRESULT);
                }
                self.push(Event::TextInput { window: id, codepoint: wparam as u32, mods: key_mods(), plain: true });
                Some(0)
            },
            WM_KEYDOWN | WM_SYSKEYDOWN | WM_KEYUP | WM_SYSKEYUP => {
                self.key_message(id, wparam, lparam);
                None
            },
            WM_LBUTTONDOWN | WM_RBUTTONDOWN | WM_MBUTTONDOWN | WM_XBUTTONDOWN
            | WM_LBUTTONUP | WM_RBUTTONUP | WM_MBUTTONUP | WM_XBUTTONUP => {
                let button = match msg {
                    WM_LBUTTONDOWN | WM_LBUTTONUP => MouseButton::Button1,
                    WM_RBUTTONDOWN | WM_RBUTTONUP => MouseButton::Button2,
                    WM_MBUTTONDOWN | WM_MBUTTONUP => MouseButton::Button3,
                    _ if HIWORD(wparam as DWORD) == XBUTTON1 => MouseButton::Button4,
                    _ => MouseButton::Button5,
                };
                let press = match msg {
                    WM_LBUTTONDOWN | WM_RBUTTONDOWN | WM_MBUTTONDOWN | WM_XBUTTONDOWN => true,
                    _ => false,
                };
                let bit = 1u8 << button.index();
                let (before, after) = self.with_window(id, |w| {
                    let before = w.buttons_down;
                    if press {
                        w.buttons_down |= bit;
                    } else {
                        w.buttons_down &= !bit;
                    }
                    (before, w.buttons_down)
                }).unwrap_or((0, 0));

                // Keep receiving the release when it happens outside the window.
                if before == 0 && after != 0 {
                    SetCapture(hwnd);
                }
                let action = if press { Action::Press } else { Action::Release };
                self.push(Event::MouseButton { window: id, button, action, mods: key_mods() });
                if before != 0 && after == 0 {
                    ReleaseCapture();
                }
                if msg == WM_XBUTTONDOWN || msg == WM_XBUTTONUP {
                    return Some(TRUE as LRESULT);
                }
                Some(0)
            },
            WM_MOUSEMOVE => {
                let tracked = self.with_window(id, |w| mem::replace(&mut w.cursor_tracked, true)).unwrap_or(true);
                if !tracked {
                    let mut tme = TRACKMOUSEEVENT {
                        cbSize: mem::size_of::<TRACKMOUSEEVENT>() as DWORD,
                        dwFlags: TME_LEAVE,
                        hwndTrack: hwnd,
                        dwHoverTime: 0,
                    };
                    TrackMouseEvent(&mut tme);
                    self.push(Event::MouseEnter { window: id, entered: true });
                }
                let position = Vec2::new(GET_X_LPARAM(lparam) as f64, GET_Y_LPARAM(lparam) as f64);
                self.push(Event::MouseMotion { window: id, position });
                Some(0)
            },
            WM_INPUT => {
                self.raw_input(id, lparam);
                None
            },
            WM_MOUSELEAVE => {
                let _ = self.with_window(id, |w| w.cursor_tracked = false);
                self.push(Event::MouseEnter { window: id, entered: false });
                Some(0)
            },
            WM_MOUSEWHEEL => {
                let delta = HIWORD(wparam as DWORD) as i16 as f64 / WHEEL_DELTA;
                self.push(Event::MouseScroll { window: id, scroll: Vec2::new(0., delta) });
                Some(0)
            },
            WM_MOUSEHWHEEL => {
                // Positive is to the right here, but to the left for the application.
                let delta = HIWORD(wparam as DWORD) as i16 as f64 / WHEEL_DELTA;
                self.push(Event::MouseScroll { window: id, scroll: Vec2::new(-delta, 0.) });
                Some(0)
            },
            WM_ENTERSIZEMOVE | WM_ENTERMENULOOP => {
                if self.is_disabled(id) {
                    self.release_cursor_clip();
                }
                None
            },
            WM_EXITSIZEMOVE | WM_EXITMENULOOP => {
                if self.is_disabled(id) {
                    self.clip_cursor_to(hwnd);
                }
                None
            },
            WM_SIZE => {
                let size = Extent2::new(LOWORD(lparam as DWORD) as i32, HIWORD(lparam as DWORD) as i32);
                let kind = wparam as UINT;
                let iconified = kind == SIZE_MINIMIZED as UINT;
                let (was_iconified, was_maximized, maximized) = self.with_window(id, |w| {
                    let maximized = kind == SIZE_MAXIMIZED as UINT || (w.maximized && kind != SIZE_RESTORED as UINT);
                    let was = (w.iconified, w.maximized);
                    w.iconified = iconified;
                    w.maximized = maximized;
                    (was.0, was.1, maximized)
                }).ok()?;

                if self.is_disabled(id) {
                    self.clip_cursor_to(hwnd);
                }
                if was_iconified != iconified {
                    self.push(Event::WindowIconifyChanged { window: id, iconified });
                }
                if was_maximized != maximized {
                    self.push(Event::WindowMaximizeChanged { window: id, maximized });
                }
                self.push(Event::FramebufferResized { window: id, size });
                self.push(Event::WindowResized { window: id, size });
                Some(0)
            },
            WM_MOVE => {
                if self.is_disabled(id) {
                    self.clip_cursor_to(hwnd);
                }
                // Signed, because of multiple monitors.
                let position = Vec2::new(GET_X_LPARAM(lparam), GET_Y_LPARAM(lparam));
                self.push(Event::WindowMoved { window: id, position });
                Some(0)
            },
            WM_SIZING => {
                let (numer, denom) = self.with_window(id, |w| w.aspect).ok()?;
                if numer == DONT_CARE || denom == DONT_CARE {
                    return None;
                }
                let area = &mut *(lparam as *mut RECT);
                apply_aspect_ratio(wparam, area, &self.frame_rect(hwnd), numer as f32 / denom as f32);
                Some(TRUE as LRESULT)
            },
            WM_GETMINMAXINFO => {
                let (min, max, decorated, fullscreen) = self.with_window(id, |w| {
                    (w.min_size, w.max_size, w.decorated, w.fullscreen.get())
                }).ok()?;
                if fullscreen {
                    return None;
                }
                let mmi = &mut *(lparam as *mut MINMAXINFO);
                let frame = self.frame_rect(hwnd);
                let (frame_w, frame_h) = (frame.right - frame.left, frame.bottom - frame.top);
                if min.w != DONT_CARE && min.h != DONT_CARE {
                    mmi.ptMinTrackSize.x = min.w + frame_w;
                    mmi.ptMinTrackSize.y = min.h + frame_h;
                }
                if max.w != DONT_CARE && max.h != DONT_CARE {
                    mmi.ptMaxTrackSize.x = max.w + frame_w;
                    mmi.ptMaxTrackSize.y = max.h + frame_h;
                }
                if !decorated {
                    // Maximizing a borderless window would otherwise cover the taskbar.
                    let mut mi: MONITORINFO = mem::zeroed();
                    mi.cbSize = mem::size_of::<MONITORINFO>() as DWORD;
                    GetMonitorInfoW(MonitorFromWindow(hwnd, MONITOR_DEFAULTTONEAREST), &mut mi);
                    mmi.ptMaxPosition.x = mi.rcWork.left - mi.rcMonitor.left;
                    mmi.ptMaxPosition.y = mi.rcWork.top - mi.rcMonitor.top;
                    mmi.ptMaxSize.x = mi.rcWork.right - mi.rcWork.left;
                    mmi.ptMaxSize.y = mi.rcWork.bottom - mi.rcWork.top;
                }
                Some(0)
            },
            WM_PAINT => {
                self.push(Event::WindowNeedsRefresh { window: id });
                None
            },
            WM_ERASEBKGND => Some(TRUE as LRESULT),
            WM_NCACTIVATE | WM_NCPAINT => {
                // Keeps the title bar from reappearing on undecorated windows.
                let decorated = self.with_window(id, |w| w.decorated).unwrap_or(true);
                if decorated {
                    None
                } else {
                    Some(TRUE as LRESULT)
                }
            },
            WM_DWMCOMPOSITIONCHANGED | WM_DWMCOLORIZATIONCOLORCHANGED => {
                if self.with_window(id, |w| w.transparent).unwrap_or(false) {
                    self.update_framebuffer_transparency(hwnd);
                }
                Some(0)
            },
            WM_DPICHANGED => {
                let dpi = USER_DEFAULT_SCREEN_DPI as f32;
                let scale = Vec2::new(LOWORD(wparam as DWORD) as f32 / dpi, HIWORD(wparam as DWORD) as f32 / dpi);
                let (scale_to_monitor, fullscreen) = self.with_window(id, |w| (w.scale_to_monitor, w.fullscreen.get())).ok()?;
                if scale_to_monitor && !fullscreen {
                    let suggested = &*(lparam as *const RECT);
                    SetWindowPos(
                        hwnd, HWND_TOP,
                        suggested.left, suggested.top,
                        suggested.right - suggested.left, suggested.bottom - suggested.top,
                        SWP_NOACTIVATE | SWP_NOZORDER,
                    );
                }
                self.push(Event::ContentScaleChanged { window: id, scale });
                None
            },
            WM_SETCURSOR => {
                if LOWORD(lparam as DWORD) as LRESULT == HTCLIENT as LRESULT {
                    let _ = self.update_cursor_image(id);
                    return Some(TRUE as LRESULT);
                }
                None
            },
            WM_DROPFILES => {
                let drop = wparam as HDROP;
                let count = DragQueryFileW(drop, 0xFFFF_FFFF, ptr::null_mut(), 0);

                // The drop point is where the cursor is now.
                let mut pt = POINT { x: 0, y: 0 };
                DragQueryPoint(drop, &mut pt);
                self.push(Event::MouseMotion { window: id, position: Vec2::new(pt.x as f64, pt.y as f64) });

                let mut paths = Vec::with_capacity(count as usize);
                for i in 0..count {
                    let len = DragQueryFileW(drop, i, ptr::null_mut(), 0);
                    let mut buffer = vec![0 as WCHAR; len as usize + 1];
                    DragQueryFileW(drop, i, buffer.as_mut_ptr(), len + 1);
                    paths.push(from_wide(&buffer));
                }
                self.push(Event::FilesDropped { window: id, paths });
                DragFinish(drop);
                Some(0)
            },
            _ => None,
        }
    }

    unsafe fn key_message(&self, id: WindowId, wparam: WPARAM, lparam: LPARAM) {
        let flags = HIWORD(lparam as DWORD);
        let action = if flags & KF_UP != 0 { Action::Release } else { Action::Press };
        let mods = key_mods();

        let mut scancode = (flags & (KF_EXTENDED | 0xff)) as i32;
        if scancode == 0 {
            // Some synthetic key messages carry no scancode.
            scancode = MapVirtualKeyW(wparam as UINT, MAPVK_VK_TO_VSC) as i32;
        }
        let scancode = fix_scancode(scancode);
        let key = self.keys.key(scancode);

        if wparam == VK_CONTROL as WPARAM {
            if flags & KF_EXTENDED == 0 && is_alt_gr_control() {
                return;
            }
        } else if wparam == VK_PROCESSKEY as WPARAM {
            // Consumed by the IME.
            return;
        }

        if action == Action::Release && wparam == VK_SHIFT as WPARAM {
            // Releasing one Shift while both are held reports only one release.
            self.push(Event::KeyboardKey { window: id, key: Key::LeftShift, scancode, action, mods });
            self.push(Event::KeyboardKey { window: id, key: Key::RightShift, scancode, action, mods });
        } else if wparam == VK_SNAPSHOT as WPARAM {
            // Print Screen never sends a key down.
            self.push(Event::KeyboardKey { window: id, key, scancode, action: Action::Press, mods });
            self.push(Event::KeyboardKey { window: id, key, scancode, action: Action::Release, mods });
        } else {
            self.push(Event::KeyboardKey { window: id, key, scancode, action, mods });
        }
    }

    unsafe fn raw_input(&self, id: WindowId, lparam: LPARAM) {
        if !self.is_disabled(id) || !self.with_window(id, |w| w.raw_motion).unwrap_or(false) {
            return;
        }
        let header_size = mem::size_of::<RAWINPUTHEADER>() as UINT;
        let mut size: UINT = 0;
        GetRawInputData(lparam as HRAWINPUT, RID_INPUT, ptr::null_mut(), &mut size, header_size);
        // u64 storage keeps RAWINPUT aligned.
        let mut buffer = vec![0u64; (size as usize + 7) / 8];
        let read = GetRawInputData(lparam as HRAWINPUT, RID_INPUT, buffer.as_mut_ptr() as *mut c_void, &mut size, header_size);
        if read == !0 {
            warn!("{}", winapi_error("GetRawInputData"));
            return;
        }

        let data = &*(buffer.as_ptr() as *const RAWINPUT);
        let mouse = data.data.mouse();
        let displacement = if mouse.usFlags & MOUSE_MOVE_ABSOLUTE != 0 {
            let desktop = RECT {
                left: GetSystemMetrics(SM_XVIRTUALSCREEN),
                top: GetSystemMetrics(SM_YVIRTUALSCREEN),
                right: GetSystemMetrics(SM_XVIRTUALSCREEN) + GetSystemMetrics(SM_CXVIRTUALSCREEN),
                bottom: GetSystemMetrics(SM_YVIRTUALSCREEN) + GetSystemMetrics(SM_CYVIRTUALSCREEN),
            };
            let pos = absolute_raw_position(mouse.usFlags, mouse.lLastX, mouse.lLastY, desktop);
            let last = self.last_raw_pos.replace(pos);
            pos - last
        } else {
            Vec2::new(mouse.lLastX, mouse.lLastY)
        };
        let displacement = Vec2::new(displacement.x as f64, displacement.y as f64);
        self.push(Event::MouseMotionRaw { window: id, displacement });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inconsistent_scancodes_are_fixed() {
        assert_eq!(fix_scancode(0x054), 0x137);
        assert_eq!(fix_scancode(0x146), 0x045);
        assert_eq!(fix_scancode(0x136), 0x036);
        assert_eq!(fix_scancode(0x01E), 0x01E);
    }

    #[test]
    fn absolute_raw_motion_spans_the_virtual_desktop() {
        let desktop = RECT { left: -1920, top: 0, right: 1920, bottom: 1080 };
        assert_eq!(absolute_raw_position(MOUSE_MOVE_ABSOLUTE, 10, 20, desktop), Vec2::new(10, 20));
        let flags = MOUSE_MOVE_ABSOLUTE | MOUSE_VIRTUAL_DESKTOP;
        assert_eq!(absolute_raw_position(flags, 0, 0, desktop), Vec2::new(-1920, 0));
        assert_eq!(absolute_raw_position(flags, 65535, 65535, desktop), Vec2::new(1920, 1080));
    }
}
