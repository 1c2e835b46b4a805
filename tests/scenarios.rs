//! End-to-end usage on the headless backend.

mod common;

use common::{null_library, plain_window, recorder};
use winpal::{Action, CursorMode, Extent2, Hint, Key, Vec2, VideoMode, WindowAttrib, DONT_CARE, FALSE, TRUE};

#[test]
fn contextless_window_reports_its_framebuffer() {
    let lib = null_library();
    let window = plain_window(&lib, 640, 480);
    assert_eq!(window.framebuffer_size().unwrap(), Extent2::new(640, 480));
    assert_eq!(window.attrib(WindowAttrib::ClientApi).unwrap(), 0);
    let e = window.swap_buffers().unwrap_err();
    assert_eq!(e.kind, winpal::ErrorKind::NoWindowContext);
}

#[test]
fn hidden_window_becomes_visible_on_show() {
    let lib = null_library();
    lib.window_hint(Hint::Visible, FALSE).unwrap();
    let window = plain_window(&lib, 320, 240);
    assert_eq!(window.attrib(WindowAttrib::Visible).unwrap(), FALSE);
    assert_eq!(window.attrib(WindowAttrib::Focused).unwrap(), FALSE);

    window.show().unwrap();
    assert_eq!(window.attrib(WindowAttrib::Visible).unwrap(), TRUE);
    assert_eq!(window.attrib(WindowAttrib::Focused).unwrap(), TRUE);
}

#[test]
fn fullscreen_installs_the_closest_mode_and_restores_it() {
    let lib = null_library();
    let monitor = lib.primary_monitor().unwrap().unwrap();
    let original = monitor.video_mode().unwrap();

    let desired = VideoMode { width: 1920, height: 1080, red_bits: 8, green_bits: 8, blue_bits: 8, refresh_rate: 60 };
    assert_eq!(monitor.choose_video_mode(&desired).unwrap(), desired);

    lib.window_hint(Hint::ClientApi, winpal::ClientApi::NoApi).unwrap();
    let window = lib.create_window(1280, 720, "fullscreen", Some(&monitor), None).unwrap();
    let installed = monitor.video_mode().unwrap();
    assert_eq!((installed.width, installed.height), (1280, 720));
    assert_eq!(monitor.fullscreen_window().unwrap(), Some(window.clone()));
    assert_eq!(window.monitor().unwrap(), Some(monitor.clone()));
    assert!(lib.simulator().unwrap().fullscreen_inhibited());

    window.destroy().unwrap();
    assert_eq!(monitor.video_mode().unwrap(), original);
    assert_eq!(monitor.fullscreen_window().unwrap(), None);
    assert!(!lib.simulator().unwrap().fullscreen_inhibited());
}

#[test]
fn fullscreen_refresh_rate_can_be_left_to_the_monitor() {
    let lib = null_library();
    let monitor = lib.primary_monitor().unwrap().unwrap();
    let window = plain_window(&lib, 200, 100);
    window.set_monitor(Some(&monitor), Vec2::zero(), Extent2::new(1920, 1080), 144).unwrap();
    assert_eq!(monitor.video_mode().unwrap().refresh_rate, 144);

    window.set_monitor(None, Vec2::new(40, 50), Extent2::new(200, 100), DONT_CARE).unwrap();
    assert_eq!(monitor.video_mode().unwrap().refresh_rate, 60);
    assert_eq!(window.pos().unwrap(), Vec2::new(40, 50));
    assert_eq!(window.size().unwrap(), Extent2::new(200, 100));
}

#[test]
fn disabled_cursor_accumulates_motion_across_pumps() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let window = plain_window(&lib, 800, 600);
    lib.poll_events().unwrap();

    window.set_cursor_mode(CursorMode::Disabled).unwrap();
    let start = window.cursor_pos().unwrap();
    for _ in 0..100 {
        sim.move_mouse(&window, Vec2::new(100., 0.)).unwrap();
        lib.poll_events().unwrap();
    }
    let end = window.cursor_pos().unwrap();
    assert!((end.x - start.x - 10_000.).abs() <= 1., "moved by {}", end.x - start.x);
    assert!((end.y - start.y).abs() <= 1.);

    // The real pointer stays parked at the center of the window.
    let origin = window.pos().unwrap();
    assert_eq!(sim.cursor_screen_pos(), Vec2::new(origin.x as f64 + 400., origin.y as f64 + 300.));
}

#[test]
fn raw_motion_feeds_the_disabled_cursor() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let window = plain_window(&lib, 800, 600);
    lib.poll_events().unwrap();

    window.set_raw_mouse_motion(true).unwrap();
    window.set_cursor_mode(CursorMode::Disabled).unwrap();
    assert_eq!(sim.applied_cursor_mode(&window).unwrap(), (CursorMode::Disabled, true));

    let start = window.cursor_pos().unwrap();
    for _ in 0..100 {
        sim.move_mouse(&window, Vec2::new(0., -100.)).unwrap();
        lib.poll_events().unwrap();
    }
    let end = window.cursor_pos().unwrap();
    assert!((start.y - end.y - 10_000.).abs() <= 1.);

    window.set_cursor_mode(CursorMode::Normal).unwrap();
    assert_eq!(sim.applied_cursor_mode(&window).unwrap(), (CursorMode::Normal, false));
}

#[test]
fn focus_loss_releases_held_keys_once() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let window = plain_window(&lib, 320, 240);
    lib.poll_events().unwrap();

    let actions = recorder();
    let log = actions.clone();
    window.set_key_callback(move |_, key, _, action, _| log.borrow_mut().push((key, action))).unwrap();

    sim.press_key(&window, Key::Space).unwrap();
    lib.poll_events().unwrap();
    sim.focus_elsewhere().unwrap();
    lib.poll_events().unwrap();
    // Nothing is left to release the second time around.
    lib.poll_events().unwrap();

    assert_eq!(*actions.borrow(), vec![(Key::Space, Action::Press), (Key::Space, Action::Release)]);
    assert_eq!(window.key(Key::Space).unwrap(), Action::Release);
    assert_eq!(window.attrib(WindowAttrib::Focused).unwrap(), FALSE);
}

#[test]
fn dropped_paths_arrive_with_the_cursor_at_the_drop_point() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let window = plain_window(&lib, 320, 240);

    let drops = recorder();
    let log = drops.clone();
    window.set_drop_callback(move |w, paths| {
        log.borrow_mut().push((paths.to_vec(), w.cursor_pos().unwrap()));
    }).unwrap();

    sim.drop_files(&window, Vec2::new(50., 50.), &["/tmp/a", "/tmp/b"]).unwrap();
    lib.poll_events().unwrap();

    let drops = drops.borrow();
    assert_eq!(drops.len(), 1);
    assert_eq!(drops[0].0, vec!["/tmp/a".to_owned(), "/tmp/b".to_owned()]);
    assert_eq!(drops[0].1, Vec2::new(50., 50.));
}
