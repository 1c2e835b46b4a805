mod common;

use std::thread;
use std::time::{Duration, Instant};
use common::{null_library, plain_window};
use winpal::{ErrorKind, PlatformKind};

#[test]
fn init_returns_the_live_library() {
    let lib = null_library();
    assert_eq!(lib.platform().unwrap(), PlatformKind::Null);
    let window = plain_window(&lib, 10, 10);

    let again = winpal::init().unwrap();
    assert_eq!(again.windows().unwrap(), vec![window]);
}

#[test]
fn terminate_then_init_starts_over() {
    let lib = null_library();
    let clone = lib.clone();
    let window = plain_window(&lib, 10, 10);
    let monitor = lib.primary_monitor().unwrap().unwrap();
    lib.terminate();

    assert!(!clone.is_initialized());
    assert_eq!(clone.poll_events().unwrap_err().kind, ErrorKind::NotInitialized);
    assert!(window.is_destroyed());
    assert_eq!(window.size().unwrap_err().kind, ErrorKind::NotInitialized);
    assert_eq!(monitor.pos().unwrap_err().kind, ErrorKind::NotInitialized);
    window.destroy().unwrap();

    let lib = null_library();
    assert!(lib.is_initialized());
    assert!(lib.windows().unwrap().is_empty());
    assert_eq!(lib.monitors().unwrap().len(), 1);
    let window = plain_window(&lib, 10, 10);
    assert!(!window.is_destroyed());
}

#[test]
fn handles_report_not_initialized_after_terminate() {
    let lib = null_library();
    let window = plain_window(&lib, 10, 10);
    let monitor = lib.primary_monitor().unwrap().unwrap();
    lib.terminate();
    while winpal::get_error().is_some() {}

    assert_eq!(window.set_close_callback(|_| ()).err().unwrap().kind, ErrorKind::NotInitialized);
    assert_eq!(window.replace_size_callback(None).err().unwrap().kind, ErrorKind::NotInitialized);
    assert_eq!(window.set_user_data(None).unwrap_err().kind, ErrorKind::NotInitialized);
    assert_eq!(window.user_data().unwrap_err().kind, ErrorKind::NotInitialized);
    assert_eq!(window.monitor().unwrap_err().kind, ErrorKind::NotInitialized);
    assert_eq!(monitor.name().unwrap_err().kind, ErrorKind::NotInitialized);
    assert_eq!(monitor.physical_size().unwrap_err().kind, ErrorKind::NotInitialized);
    assert_eq!(monitor.fullscreen_window().unwrap_err().kind, ErrorKind::NotInitialized);

    // The first failure and the latest one are kept.
    assert_eq!(winpal::get_error().map(|e| e.kind), Some(ErrorKind::NotInitialized));
    assert_eq!(winpal::get_error().map(|e| e.kind), Some(ErrorKind::NotInitialized));
    assert_eq!(winpal::get_error(), None);
}

#[test]
fn failures_are_also_queued_for_get_error() {
    let lib = null_library();
    while winpal::get_error().is_some() {}

    assert!(lib.create_window(0, 0, "", None, None).is_err());
    assert!(lib.wait_events_timeout(-1.).is_err());
    assert_eq!(winpal::get_error().map(|e| e.kind), Some(ErrorKind::InvalidValue));
    assert_eq!(winpal::get_error().map(|e| e.kind), Some(ErrorKind::InvalidValue));
    assert_eq!(winpal::get_error(), None);
}

#[test]
fn wait_timeouts_are_validated() {
    let lib = null_library();
    for &bad in &[-1., std::f64::NAN, std::f64::INFINITY] {
        assert_eq!(lib.wait_events_timeout(bad).unwrap_err().kind, ErrorKind::InvalidValue);
    }
    lib.wait_events_timeout(0.).unwrap();

    let start = Instant::now();
    lib.wait_events_timeout(0.05).unwrap();
    assert!(start.elapsed() >= Duration::from_millis(40));
}

#[test]
fn pending_events_end_the_wait_early() {
    let lib = null_library();
    let window = plain_window(&lib, 10, 10);
    lib.poll_events().unwrap();
    lib.simulator().unwrap().request_refresh(&window).unwrap();

    let start = Instant::now();
    lib.wait_events_timeout(10.).unwrap();
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn other_threads_can_wake_the_main_thread() {
    let lib = null_library();
    let poster = lib.event_poster();
    let wake = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        poster.post_empty_event().unwrap();
    });

    let start = Instant::now();
    lib.wait_events().unwrap();
    assert!(start.elapsed() < Duration::from_secs(5));
    wake.join().unwrap();
}

#[test]
fn a_posted_event_is_not_lost_before_the_wait() {
    let lib = null_library();
    lib.post_empty_event().unwrap();
    let start = Instant::now();
    lib.wait_events_timeout(10.).unwrap();
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn a_callback_may_terminate_the_library() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    let window = plain_window(&lib, 10, 10);
    let handle = lib.clone();
    window.set_close_callback(move |_| handle.clone().terminate()).unwrap();

    sim.request_close(&window).unwrap();
    sim.request_refresh(&window).unwrap();
    lib.poll_events().unwrap();
    assert!(!lib.is_initialized());
    assert!(window.is_destroyed());
}
