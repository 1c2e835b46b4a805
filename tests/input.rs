mod common;

use common::{null_library, plain_window, recorder};
use winpal::{
    Action, CursorMode, ErrorKind, Extent2, InputMode, Key, Modifiers, MouseButton, Rgba, RgbaImage,
    StandardCursor, Vec2, FALSE, TRUE,
};

#[test]
fn held_keys_repeat_and_stray_releases_are_dropped() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let window = plain_window(&lib, 100, 100);
    let actions = recorder();
    let log = actions.clone();
    window.set_key_callback(move |_, key, _, action, _| log.borrow_mut().push((key, action))).unwrap();

    sim.release_key(&window, Key::W).unwrap();
    sim.press_key(&window, Key::W).unwrap();
    sim.press_key(&window, Key::W).unwrap();
    sim.release_key(&window, Key::W).unwrap();
    lib.poll_events().unwrap();

    assert_eq!(*actions.borrow(), vec![(Key::W, Action::Press), (Key::W, Action::Repeat), (Key::W, Action::Release)]);
}

#[test]
fn key_events_carry_the_platform_scancode() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let window = plain_window(&lib, 100, 100);
    let scancodes = recorder();
    let log = scancodes.clone();
    window.set_key_callback(move |_, _, scancode, _, _| log.borrow_mut().push(scancode)).unwrap();

    sim.press_key(&window, Key::Space).unwrap();
    lib.poll_events().unwrap();
    assert_eq!(*scancodes.borrow(), vec![lib.key_scancode(Key::Space).unwrap()]);
    assert_eq!(lib.key_scancode(Key::Unknown).unwrap_err().kind, ErrorKind::InvalidEnum);
}

#[test]
fn sticky_keys_read_as_pressed_once_after_release() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let window = plain_window(&lib, 100, 100);
    window.set_sticky_keys(true).unwrap();
    assert_eq!(window.input_mode(InputMode::StickyKeys).unwrap(), TRUE);

    sim.press_key(&window, Key::E).unwrap();
    sim.release_key(&window, Key::E).unwrap();
    lib.poll_events().unwrap();
    assert_eq!(window.key(Key::E).unwrap(), Action::Press);
    assert_eq!(window.key(Key::E).unwrap(), Action::Release);

    sim.press_key(&window, Key::E).unwrap();
    sim.release_key(&window, Key::E).unwrap();
    lib.poll_events().unwrap();
    window.set_sticky_keys(false).unwrap();
    assert_eq!(window.key(Key::E).unwrap(), Action::Release);
}

#[test]
fn sticky_mouse_buttons() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let window = plain_window(&lib, 100, 100);
    window.set_input_mode(InputMode::StickyMouseButtons, TRUE).unwrap();

    sim.press_mouse_button(&window, MouseButton::LEFT).unwrap();
    lib.poll_events().unwrap();
    assert_eq!(window.mouse_button(MouseButton::LEFT).unwrap(), Action::Press);
    sim.release_mouse_button(&window, MouseButton::LEFT).unwrap();
    lib.poll_events().unwrap();
    assert_eq!(window.mouse_button(MouseButton::LEFT).unwrap(), Action::Press);
    assert_eq!(window.mouse_button(MouseButton::LEFT).unwrap(), Action::Release);
}

#[test]
fn lock_modifiers_are_reported_only_on_request() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let window = plain_window(&lib, 100, 100);
    let mods = recorder();
    let log = mods.clone();
    window.set_key_callback(move |_, key, _, _, mods| {
        if key == Key::A {
            log.borrow_mut().push(mods);
        }
    }).unwrap();

    sim.press_key(&window, Key::CapsLock).unwrap();
    sim.release_key(&window, Key::CapsLock).unwrap();
    sim.press_key(&window, Key::LeftShift).unwrap();
    sim.press_key(&window, Key::A).unwrap();
    sim.release_key(&window, Key::A).unwrap();
    lib.poll_events().unwrap();

    window.set_lock_key_mods(true).unwrap();
    sim.press_key(&window, Key::A).unwrap();
    lib.poll_events().unwrap();

    assert_eq!(*mods.borrow(), vec![
        Modifiers::SHIFT,
        Modifiers::SHIFT,
        Modifiers::SHIFT | Modifiers::CAPS_LOCK,
    ]);
}

#[test]
fn text_input_skips_control_codes_and_alt_chords() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let window = plain_window(&lib, 100, 100);
    let chars = recorder();
    let chords = recorder();
    let (c, m) = (chars.clone(), chords.clone());
    window.set_char_callback(move |_, ch| c.borrow_mut().push(ch)).unwrap();
    window.set_char_mods_callback(move |_, ch, mods| m.borrow_mut().push((ch, mods))).unwrap();

    sim.type_text(&window, "a\u{1b}é\u{7f}").unwrap();
    sim.press_key(&window, Key::LeftAlt).unwrap();
    sim.type_text(&window, "x").unwrap();
    lib.poll_events().unwrap();

    assert_eq!(*chars.borrow(), vec!['a', 'é']);
    assert_eq!(*chords.borrow(), vec![('a', Modifiers::empty()), ('é', Modifiers::empty()), ('x', Modifiers::ALT)]);
}

#[test]
fn surrogate_pairs_arrive_as_one_character() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let window = plain_window(&lib, 100, 100);
    let chars = recorder();
    let c = chars.clone();
    window.set_char_callback(move |_, ch| c.borrow_mut().push(ch)).unwrap();

    sim.type_utf16(&window, &[0xD83D, 0xDE00, 0x41]).unwrap();
    lib.poll_events().unwrap();
    assert_eq!(*chars.borrow(), vec!['\u{1F600}', 'A']);
}

#[test]
fn pointer_enter_leave_motion_and_scroll() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let window = plain_window(&lib, 100, 100);
    let enters = recorder();
    let moves = recorder();
    let scrolls = recorder();
    let (e, m, s) = (enters.clone(), moves.clone(), scrolls.clone());
    window.set_cursor_enter_callback(move |_, entered| e.borrow_mut().push(entered)).unwrap();
    window.set_cursor_pos_callback(move |_, pos| m.borrow_mut().push(pos)).unwrap();
    window.set_scroll_callback(move |_, offset| s.borrow_mut().push(offset)).unwrap();

    sim.move_cursor_to(&window, Vec2::new(10., 20.)).unwrap();
    sim.scroll(&window, Vec2::new(0., -1.5)).unwrap();
    sim.move_cursor_to(&window, Vec2::new(150., 20.)).unwrap();
    lib.poll_events().unwrap();

    assert_eq!(*enters.borrow(), vec![true, false]);
    assert_eq!(*moves.borrow(), vec![Vec2::new(10., 20.), Vec2::new(150., 20.)]);
    assert_eq!(*scrolls.borrow(), vec![Vec2::new(0., -1.5)]);
    assert_eq!(window.cursor_pos().unwrap(), Vec2::new(150., 20.));
}

#[test]
fn cursor_mode_round_trips_through_input_mode() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let window = plain_window(&lib, 100, 100);
    window.set_input_mode(InputMode::Cursor, CursorMode::Hidden as i32).unwrap();
    assert_eq!(window.cursor_mode().unwrap(), CursorMode::Hidden);
    assert_eq!(sim.applied_cursor_mode(&window).unwrap(), (CursorMode::Hidden, false));

    let e = window.set_input_mode(InputMode::Cursor, 0x1234).unwrap_err();
    assert_eq!(e.kind, ErrorKind::InvalidEnum);
    assert_eq!(window.cursor_mode().unwrap(), CursorMode::Hidden);
}

#[test]
fn disabling_the_cursor_and_losing_focus_gives_the_pointer_back() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let window = plain_window(&lib, 200, 100);
    lib.poll_events().unwrap();
    sim.move_cursor_to(&window, Vec2::new(20., 30.)).unwrap();
    lib.poll_events().unwrap();

    window.set_cursor_mode(CursorMode::Disabled).unwrap();
    assert_eq!(sim.applied_cursor_mode(&window).unwrap().0, CursorMode::Disabled);
    sim.focus_elsewhere().unwrap();
    lib.poll_events().unwrap();

    // The mode sticks, but the native cursor is only hidden while unfocused.
    assert_eq!(window.cursor_mode().unwrap(), CursorMode::Disabled);
    assert_eq!(sim.applied_cursor_mode(&window).unwrap().0, CursorMode::Hidden);
    let origin = window.pos().unwrap();
    assert_eq!(sim.cursor_screen_pos(), Vec2::new(origin.x as f64 + 20., origin.y as f64 + 30.));

    window.focus().unwrap();
    lib.poll_events().unwrap();
    assert_eq!(sim.applied_cursor_mode(&window).unwrap().0, CursorMode::Disabled);
}

#[test]
fn raw_motion_needs_system_support() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let window = plain_window(&lib, 100, 100);
    assert!(lib.raw_mouse_motion_supported().unwrap());

    sim.set_raw_mouse_motion_supported(false);
    assert!(!lib.raw_mouse_motion_supported().unwrap());
    let e = window.set_raw_mouse_motion(true).unwrap_err();
    assert_eq!(e.kind, ErrorKind::PlatformError);
    assert_eq!(window.input_mode(InputMode::RawMouseMotion).unwrap(), FALSE);
}

#[test]
fn cursors_can_be_shared_and_destroyed() {
    let lib = null_library();
    let window = plain_window(&lib, 100, 100);

    let image = RgbaImage::new(Extent2::new(4, 4), vec![Rgba::new(0, 0, 0, 255); 16]).unwrap();
    let custom = lib.create_cursor(&image, 1, 1).unwrap();
    let hand = lib.create_standard_cursor(StandardCursor::PointingHand).unwrap();
    assert_eq!(custom.shape(), None);
    assert_eq!(hand.shape(), Some(StandardCursor::PointingHand));

    window.set_cursor(Some(&custom)).unwrap();
    custom.destroy().unwrap();
    let e = window.set_cursor(Some(&custom)).unwrap_err();
    assert_eq!(e.kind, ErrorKind::InvalidValue);
    window.set_cursor(Some(&hand)).unwrap();
    window.set_cursor(None).unwrap();
}

#[test]
fn clipboard_and_key_names() {
    let lib = null_library();
    lib.set_clipboard_string("grüße").unwrap();
    assert_eq!(lib.clipboard_string().unwrap(), "grüße");

    assert_eq!(lib.key_name(Key::A, 0).unwrap().as_deref(), Some("a"));
    assert_eq!(lib.key_name(Key::Escape, 0).unwrap(), None);
    let scancode = lib.key_scancode(Key::Kp7).unwrap();
    assert_eq!(lib.key_name(Key::Unknown, scancode).unwrap().as_deref(), Some("7"));
}
