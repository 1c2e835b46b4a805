mod common;

use std::any::Any;
use std::rc::Rc;
use common::{null_library, plain_window, recorder};
use winpal::{ClientApi, ErrorKind, Extent2, Hint, Rgba, RgbaImage, Vec2, VideoMode, WindowAttrib, DONT_CARE, FALSE, TRUE};

#[test]
fn non_positive_sizes_are_rejected() {
    let lib = null_library();
    for &(w, h) in &[(0, 480), (640, 0), (-1, 480), (640, -5)] {
        let e = lib.create_window(w, h, "bad", None, None).unwrap_err();
        assert_eq!(e.kind, ErrorKind::InvalidValue, "{}x{}", w, h);
    }
    assert!(lib.windows().unwrap().is_empty());

    let window = plain_window(&lib, 100, 100);
    assert_eq!(window.set_size(Extent2::new(0, 10)).unwrap_err().kind, ErrorKind::InvalidValue);
    assert_eq!(window.size().unwrap(), Extent2::new(100, 100));
}

#[test]
fn opacity_must_be_within_unit_range() {
    let lib = null_library();
    let window = plain_window(&lib, 100, 100);
    assert_eq!(window.opacity().unwrap(), 1.);
    for &bad in &[-0.01, 1.01, std::f32::NAN] {
        assert_eq!(window.set_opacity(bad).unwrap_err().kind, ErrorKind::InvalidValue);
    }
    window.set_opacity(0.).unwrap();
    window.set_opacity(0.5).unwrap();
    assert_eq!(window.opacity().unwrap(), 0.5);
}

#[test]
fn geometry_round_trips() {
    let lib = null_library();
    let window = plain_window(&lib, 100, 100);
    assert_eq!(window.pos().unwrap(), Vec2::new(17, 17));

    window.set_pos(Vec2::new(120, -30)).unwrap();
    assert_eq!(window.pos().unwrap(), Vec2::new(120, -30));
    window.set_size(Extent2::new(300, 200)).unwrap();
    assert_eq!(window.size().unwrap(), Extent2::new(300, 200));
    assert_eq!(window.framebuffer_size().unwrap(), Extent2::new(300, 200));

    let frame = window.frame_size().unwrap();
    assert!(frame.top > 0 && frame.left >= 0);
    window.set_attrib(WindowAttrib::Decorated, false).unwrap();
    assert_eq!(window.frame_size().unwrap(), winpal::FrameExtents::default());
}

#[test]
fn geometry_changes_reach_callbacks_on_the_next_pump() {
    let lib = null_library();
    let window = plain_window(&lib, 100, 100);
    lib.poll_events().unwrap();

    let moves = recorder();
    let sizes = recorder();
    let (m, s) = (moves.clone(), sizes.clone());
    window.set_pos_callback(move |_, pos| m.borrow_mut().push(pos)).unwrap();
    window.set_size_callback(move |_, size| s.borrow_mut().push(size)).unwrap();

    window.set_pos(Vec2::new(5, 6)).unwrap();
    window.set_size(Extent2::new(50, 60)).unwrap();
    assert!(moves.borrow().is_empty());
    lib.poll_events().unwrap();
    assert_eq!(*moves.borrow(), vec![Vec2::new(5, 6)]);
    assert_eq!(*sizes.borrow(), vec![Extent2::new(50, 60)]);
}

#[test]
fn size_limits_and_aspect_ratio_are_validated_and_applied() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let window = plain_window(&lib, 400, 300);

    let e = window.set_size_limits(Extent2::new(200, 200), Extent2::new(100, 100)).unwrap_err();
    assert_eq!(e.kind, ErrorKind::InvalidValue);
    assert_eq!(window.set_aspect_ratio(0, 9).unwrap_err().kind, ErrorKind::InvalidValue);

    window.set_size_limits(Extent2::new(200, 150), Extent2::new(DONT_CARE, DONT_CARE)).unwrap();
    sim.drag_window_border(&window, Extent2::new(10, 10)).unwrap();
    assert_eq!(window.size().unwrap(), Extent2::new(200, 150));

    window.set_size_limits(Extent2::new(DONT_CARE, DONT_CARE), Extent2::new(DONT_CARE, DONT_CARE)).unwrap();
    window.set_aspect_ratio(16, 9).unwrap();
    sim.drag_window_border(&window, Extent2::new(1600, 10)).unwrap();
    assert_eq!(window.size().unwrap(), Extent2::new(1600, 900));
}

#[test]
fn maximize_fills_the_work_area_and_restore_undoes_it() {
    let lib = null_library();
    let window = plain_window(&lib, 300, 200);
    let area = lib.primary_monitor().unwrap().unwrap().work_area().unwrap();

    window.maximize().unwrap();
    assert_eq!(window.attrib(WindowAttrib::Maximized).unwrap(), TRUE);
    assert_eq!(window.size().unwrap(), Extent2::new(area.w, area.h));

    window.restore().unwrap();
    assert_eq!(window.attrib(WindowAttrib::Maximized).unwrap(), FALSE);
    assert_eq!(window.size().unwrap(), Extent2::new(300, 200));
    assert_eq!(window.pos().unwrap(), Vec2::new(17, 17));
}

#[test]
fn iconify_drops_focus() {
    let lib = null_library();
    let window = plain_window(&lib, 300, 200);
    let changes = recorder();
    let c = changes.clone();
    window.set_iconify_callback(move |_, iconified| c.borrow_mut().push(iconified)).unwrap();

    window.iconify().unwrap();
    assert_eq!(window.attrib(WindowAttrib::Iconified).unwrap(), TRUE);
    assert_eq!(window.attrib(WindowAttrib::Focused).unwrap(), FALSE);
    window.restore().unwrap();
    lib.poll_events().unwrap();
    assert_eq!(*changes.borrow(), vec![true, false]);
}

#[test]
fn settable_attributes() {
    let lib = null_library();
    let window = plain_window(&lib, 300, 200);
    for &attrib in &[WindowAttrib::Resizable, WindowAttrib::Floating, WindowAttrib::AutoIconify, WindowAttrib::FocusOnShow, WindowAttrib::MousePassthrough] {
        let before = window.attrib(attrib).unwrap();
        window.set_attrib(attrib, before == FALSE).unwrap();
        assert_ne!(window.attrib(attrib).unwrap(), before, "{:?}", attrib);
    }
    let e = window.set_attrib(WindowAttrib::Visible, false).unwrap_err();
    assert_eq!(e.kind, ErrorKind::InvalidEnum);
}

#[test]
fn hints_shape_the_next_window_only() {
    let lib = null_library();
    lib.window_hint(Hint::Resizable, FALSE).unwrap();
    lib.window_hint(Hint::Decorated, FALSE).unwrap();
    let fixed = plain_window(&lib, 100, 100);
    assert_eq!(fixed.attrib(WindowAttrib::Resizable).unwrap(), FALSE);
    assert_eq!(fixed.attrib(WindowAttrib::Decorated).unwrap(), FALSE);

    let normal = plain_window(&lib, 100, 100);
    assert_eq!(normal.attrib(WindowAttrib::Resizable).unwrap(), TRUE);

    lib.window_hint(Hint::ClientApi, 0x1234).unwrap();
    let e = lib.create_window(100, 100, "bad", None, None).unwrap_err();
    assert_eq!(e.kind, ErrorKind::InvalidEnum);
}

#[test]
fn title_and_icons_reach_the_native_window() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let window = plain_window(&lib, 100, 100);
    window.set_title("Ünïcödé ✓").unwrap();
    assert_eq!(sim.window_title(&window).unwrap(), "Ünïcödé ✓");

    let small = RgbaImage::new(Extent2::new(16, 16), vec![Rgba::new(255, 0, 0, 255); 256]).unwrap();
    let large = RgbaImage::new(Extent2::new(32, 32), vec![Rgba::new(0, 255, 0, 255); 1024]).unwrap();
    window.set_icon(&[small, large]).unwrap();
    assert_eq!(sim.window_icon_count(&window).unwrap(), 2);
    window.set_icon(&[]).unwrap();
    assert_eq!(sim.window_icon_count(&window).unwrap(), 0);

    assert!(RgbaImage::new(Extent2::new(2, 2), vec![Rgba::new(0, 0, 0, 0); 3]).is_err());
}

#[test]
fn close_requests_set_the_flag_then_call_back() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let window = plain_window(&lib, 100, 100);
    let seen = recorder();
    let s = seen.clone();
    window.set_close_callback(move |w| s.borrow_mut().push(w.should_close().unwrap())).unwrap();

    sim.request_close(&window).unwrap();
    lib.poll_events().unwrap();
    assert_eq!(*seen.borrow(), vec![true]);
    window.set_should_close(false).unwrap();
    assert!(!window.should_close().unwrap());
}

#[test]
fn a_callback_may_destroy_its_own_window() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let window = plain_window(&lib, 100, 100);
    let other = plain_window(&lib, 100, 100);
    let refreshes = recorder();
    let r = refreshes.clone();
    other.set_refresh_callback(move |_| r.borrow_mut().push(())).unwrap();

    window.set_close_callback(|w| w.destroy().unwrap()).unwrap();
    sim.request_close(&window).unwrap();
    sim.request_refresh(&window).unwrap();
    sim.request_refresh(&other).unwrap();
    lib.poll_events().unwrap();

    assert!(window.is_destroyed());
    assert_eq!(window.pos().unwrap_err().kind, ErrorKind::InvalidValue);
    assert_eq!(lib.windows().unwrap(), vec![other]);
    assert_eq!(refreshes.borrow().len(), 1);
    window.destroy().unwrap();
}

#[test]
fn callbacks_may_replace_themselves() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let window = plain_window(&lib, 100, 100);
    let hits = recorder();
    let h = hits.clone();
    window.set_refresh_callback(move |w| {
        h.borrow_mut().push("first");
        let h = h.clone();
        w.set_refresh_callback(move |_| h.borrow_mut().push("second")).unwrap();
    }).unwrap();
    sim.request_refresh(&window).unwrap();
    sim.request_refresh(&window).unwrap();
    lib.poll_events().unwrap();
    assert_eq!(*hits.borrow(), vec!["first", "second"]);
}

#[test]
fn user_data_is_kept_until_replaced() {
    let lib = null_library();
    let window = plain_window(&lib, 100, 100);
    assert!(window.user_data().unwrap().is_none());
    window.set_user_data(Some(Rc::new(42_u32) as Rc<dyn Any>)).unwrap();
    let data = window.user_data().unwrap().unwrap();
    assert_eq!(data.downcast_ref::<u32>(), Some(&42));
    assert!(window.set_user_data(None).unwrap().is_some());
}

#[test]
fn content_scale_changes_are_reported() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let window = plain_window(&lib, 100, 100);
    let scales = recorder();
    let s = scales.clone();
    window.set_content_scale_callback(move |_, scale| s.borrow_mut().push(scale)).unwrap();
    sim.set_content_scale(&window, Vec2::new(2., 2.)).unwrap();
    lib.poll_events().unwrap();
    assert_eq!(*scales.borrow(), vec![Vec2::new(2., 2.)]);
    assert_eq!(window.content_scale().unwrap(), Vec2::new(2., 2.));
}

#[test]
fn resizing_a_fullscreen_window_switches_the_video_mode() {
    let lib = null_library();
    let monitor = lib.primary_monitor().unwrap().unwrap();
    lib.window_hint(Hint::ClientApi, ClientApi::NoApi).unwrap();
    let window = lib.create_window(800, 600, "game", Some(&monitor), None).unwrap();
    let mode = |width, height| VideoMode { width, height, red_bits: 8, green_bits: 8, blue_bits: 8, refresh_rate: 60 };
    assert_eq!(monitor.video_mode().unwrap(), mode(800, 600));

    window.set_size(Extent2::new(1280, 720)).unwrap();
    assert_eq!(monitor.video_mode().unwrap(), mode(1280, 720));
    assert_eq!(window.size().unwrap(), Extent2::new(1280, 720));
    assert_eq!(window.pos().unwrap(), Vec2::zero());
}
