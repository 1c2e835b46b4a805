mod common;

use common::{null_library, plain_window, recorder};
use winpal::{ClientApi, ErrorKind, Extent2, Hint, PeripheralEvent, Rect, Vec2, VideoMode};

fn mode(width: i32, height: i32, refresh_rate: i32) -> VideoMode {
    VideoMode { width, height, red_bits: 8, green_bits: 8, blue_bits: 8, refresh_rate }
}

#[test]
fn the_default_monitor() {
    let lib = null_library();
    let monitors = lib.monitors().unwrap();
    assert_eq!(monitors.len(), 1);
    let monitor = &monitors[0];
    assert_eq!(lib.primary_monitor().unwrap().as_ref(), Some(monitor));
    assert_eq!(monitor.name().unwrap(), "Null SuperNoop 0");
    assert_eq!(monitor.physical_size().unwrap(), Extent2::new(527, 296));
    assert_eq!(monitor.pos().unwrap(), Vec2::zero());
    assert_eq!(monitor.work_area().unwrap(), Rect::new(0, 0, 1920, 1040));
    assert_eq!(monitor.video_mode().unwrap(), mode(1920, 1080, 60));

    let modes = monitor.video_modes().unwrap();
    assert!(modes.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(modes.first(), Some(&mode(640, 480, 60)));
    assert_eq!(modes.last(), Some(&mode(1920, 1080, 144)));
}

#[test]
fn closest_mode_is_chosen() {
    let lib = null_library();
    let monitor = lib.primary_monitor().unwrap().unwrap();
    assert_eq!(monitor.choose_video_mode(&mode(1900, 1000, 110)).unwrap(), mode(1920, 1080, 144));
    assert_eq!(monitor.choose_video_mode(&mode(1920, 1080, 50)).unwrap(), mode(1920, 1080, 60));
    assert_eq!(monitor.choose_video_mode(&mode(700, 500, winpal::DONT_CARE)).unwrap(), mode(640, 480, 60));
}

#[test]
fn hot_plugging_is_reported_on_the_next_pump() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let events = recorder();
    let log = events.clone();
    lib.set_monitor_callback(move |m, e| log.borrow_mut().push((m.name().unwrap().to_owned(), e))).unwrap();

    sim.connect_monitor("Side", Vec2::new(1920, 0), mode(1280, 1024, 75)).unwrap();
    assert_eq!(lib.monitors().unwrap().len(), 1);
    lib.poll_events().unwrap();

    let monitors = lib.monitors().unwrap();
    assert_eq!(monitors.len(), 2);
    let side = monitors[1].clone();
    assert_eq!(side.name().unwrap(), "Side");
    assert_eq!(side.pos().unwrap(), Vec2::new(1920, 0));
    assert_eq!(side.video_modes().unwrap(), vec![mode(1280, 1024, 75)]);

    sim.disconnect_monitor(&side).unwrap();
    lib.poll_events().unwrap();
    assert_eq!(*events.borrow(), vec![
        ("Side".to_owned(), PeripheralEvent::Connected),
        ("Side".to_owned(), PeripheralEvent::Disconnected),
    ]);
    assert_eq!(side.pos().unwrap_err().kind, ErrorKind::InvalidValue);
    assert_eq!(lib.monitors().unwrap().len(), 1);
}

#[test]
fn removals_are_reported_before_additions() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let events = recorder();
    let log = events.clone();
    lib.set_monitor_callback(move |m, e| log.borrow_mut().push((m.name().unwrap().to_owned(), e))).unwrap();

    let old = lib.primary_monitor().unwrap().unwrap();
    sim.connect_monitor("Replacement", Vec2::zero(), mode(1024, 768, 60)).unwrap();
    sim.disconnect_monitor(&old).unwrap();
    lib.poll_events().unwrap();

    assert_eq!(*events.borrow(), vec![
        ("Null SuperNoop 0".to_owned(), PeripheralEvent::Disconnected),
        ("Replacement".to_owned(), PeripheralEvent::Connected),
    ]);
    let primary = lib.primary_monitor().unwrap().unwrap();
    assert_eq!(primary.name().unwrap(), "Replacement");
}

#[test]
fn unplugging_a_fullscreen_monitor_reverts_its_window() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    sim.connect_monitor("Side", Vec2::new(1920, 0), mode(1280, 1024, 75)).unwrap();
    lib.poll_events().unwrap();
    let side = lib.monitors().unwrap()[1].clone();

    lib.window_hint(Hint::ClientApi, ClientApi::NoApi).unwrap();
    let window = lib.create_window(1280, 1024, "game", Some(&side), None).unwrap();
    assert_eq!(window.pos().unwrap(), Vec2::new(1920, 0));
    assert_eq!(side.fullscreen_window().unwrap(), Some(window.clone()));

    sim.disconnect_monitor(&side).unwrap();
    lib.poll_events().unwrap();
    assert_eq!(window.monitor().unwrap(), None);
    assert!(!window.is_destroyed());

    let e = lib.create_window(640, 480, "late", Some(&side), None).unwrap_err();
    assert_eq!(e.kind, ErrorKind::InvalidValue);
}

#[test]
fn fullscreen_windows_iconify_when_focus_leaves() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let monitor = lib.primary_monitor().unwrap().unwrap();
    lib.window_hint(Hint::ClientApi, ClientApi::NoApi).unwrap();
    let window = lib.create_window(800, 600, "game", Some(&monitor), None).unwrap();
    lib.poll_events().unwrap();
    assert_eq!(monitor.video_mode().unwrap(), mode(800, 600, 60));

    sim.focus_elsewhere().unwrap();
    lib.poll_events().unwrap();
    assert_eq!(window.attrib(winpal::WindowAttrib::Iconified).unwrap(), winpal::TRUE);
    // The iconification itself is reported on the following pump.
    lib.poll_events().unwrap();
    assert_eq!(monitor.video_mode().unwrap(), mode(1920, 1080, 60));

    window.restore().unwrap();
    lib.poll_events().unwrap();
    assert_eq!(monitor.video_mode().unwrap(), mode(800, 600, 60));
}

#[test]
fn windowed_windows_ignore_the_monitor_registry() {
    let lib = null_library();
    let window = plain_window(&lib, 100, 100);
    assert_eq!(window.monitor().unwrap(), None);
    assert_eq!(lib.primary_monitor().unwrap().unwrap().fullscreen_window().unwrap(), None);
}

#[test]
fn windows_created_fullscreen_fall_back_to_their_requested_size() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    sim.connect_monitor("Side", Vec2::new(1920, 0), mode(1280, 1024, 60)).unwrap();
    lib.poll_events().unwrap();
    let side = lib.monitors().unwrap()[1].clone();

    lib.window_hint(Hint::ClientApi, ClientApi::NoApi).unwrap();
    let window = lib.create_window(800, 600, "game", Some(&side), None).unwrap();
    assert_eq!(window.size().unwrap(), Extent2::new(1280, 1024));

    sim.disconnect_monitor(&side).unwrap();
    lib.poll_events().unwrap();
    assert_eq!(window.monitor().unwrap(), None);
    assert_eq!(window.size().unwrap(), Extent2::new(800, 600));
    // Decorations touch the top-left corner of the desktop.
    let frame = window.frame_size().unwrap();
    assert_eq!(window.pos().unwrap(), Vec2::new(frame.left, frame.top));
    assert_eq!(window.pos().unwrap(), Vec2::new(1, 10));
}

#[test]
fn set_monitor_round_trip_restores_the_desktop() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let primary = lib.primary_monitor().unwrap().unwrap();
    let window = plain_window(&lib, 640, 480);
    window.set_pos(Vec2::new(100, 80)).unwrap();

    window.set_monitor(Some(&primary), Vec2::zero(), Extent2::new(1280, 720), 60).unwrap();
    assert!(sim.fullscreen_inhibited());
    assert_eq!(primary.video_mode().unwrap(), mode(1280, 720, 60));
    assert_eq!(primary.fullscreen_window().unwrap(), Some(window.clone()));
    assert_eq!(window.monitor().unwrap(), Some(primary.clone()));
    assert_eq!(window.pos().unwrap(), Vec2::zero());
    assert_eq!(window.size().unwrap(), Extent2::new(1280, 720));

    window.set_monitor(None, Vec2::new(100, 80), Extent2::new(640, 480), winpal::DONT_CARE).unwrap();
    assert!(!sim.fullscreen_inhibited());
    assert_eq!(primary.video_mode().unwrap(), mode(1920, 1080, 60));
    assert_eq!(primary.fullscreen_window().unwrap(), None);
    assert_eq!(window.monitor().unwrap(), None);
    assert_eq!(window.pos().unwrap(), Vec2::new(100, 80));
    assert_eq!(window.size().unwrap(), Extent2::new(640, 480));
}

#[test]
fn mode_lists_are_requeried_when_going_fullscreen() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let primary = lib.primary_monitor().unwrap().unwrap();
    assert_eq!(primary.video_modes().unwrap().len(), 5);

    sim.set_video_modes(&primary, &[mode(1024, 768, 75), mode(1920, 1080, 60)]).unwrap();
    // Nothing announced the change, so the cached list still stands.
    assert_eq!(primary.video_modes().unwrap().len(), 5);

    lib.window_hint(Hint::ClientApi, ClientApi::NoApi).unwrap();
    let _window = lib.create_window(1024, 768, "game", Some(&primary), None).unwrap();
    assert_eq!(primary.video_mode().unwrap(), mode(1024, 768, 75));
    assert_eq!(primary.video_modes().unwrap(), vec![mode(1024, 768, 75), mode(1920, 1080, 60)]);
}
