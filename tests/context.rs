mod common;

use std::time::{Duration, Instant};
use common::{null_library, plain_window};
use winpal::null::DriverInfo;
use winpal::{
    ClientApi, ContextCreationApi, ErrorKind, Hint, OpenGlProfile, WindowAttrib, FALSE, TRUE,
};

fn request_opengl(lib: &winpal::Library) {
    lib.window_hint(Hint::ClientApi, ClientApi::OpenGl).unwrap();
}

fn version(window: &winpal::Window) -> (i32, i32) {
    (
        window.attrib(WindowAttrib::ContextVersionMajor).unwrap(),
        window.attrib(WindowAttrib::ContextVersionMinor).unwrap(),
    )
}

#[test]
fn default_hints_give_no_context() {
    let lib = null_library();
    let window = lib.create_window(320, 240, "plain", None, None).unwrap();
    assert_eq!(window.attrib(WindowAttrib::ClientApi).unwrap(), ClientApi::NoApi.raw());
    assert_eq!(window.swap_buffers().unwrap_err().kind, ErrorKind::NoWindowContext);
}

#[test]
fn opengl_requests_get_the_newest_compatible_context() {
    let lib = null_library();
    request_opengl(&lib);
    let window = lib.create_window(320, 240, "gl", None, None).unwrap();
    assert_eq!(window.attrib(WindowAttrib::ClientApi).unwrap(), ClientApi::OpenGl.raw());
    assert_eq!(window.attrib(WindowAttrib::ContextCreationApi).unwrap(), ContextCreationApi::Native.raw());
    assert_eq!(version(&window), (4, 6));
    assert_eq!(window.attrib(WindowAttrib::OpenGlForwardCompat).unwrap(), FALSE);
    assert_eq!(window.attrib(WindowAttrib::DoubleBuffer).unwrap(), TRUE);

    let sim = lib.simulator().unwrap();
    assert!(sim.clear_count(&window).unwrap() >= 1);
}

#[test]
fn core_profile_requests_are_honored() {
    let lib = null_library();
    request_opengl(&lib);
    lib.window_hint(Hint::ContextVersionMajor, 3).unwrap();
    lib.window_hint(Hint::ContextVersionMinor, 3).unwrap();
    lib.window_hint(Hint::OpenGlProfile, OpenGlProfile::Core).unwrap();
    lib.window_hint(Hint::OpenGlForwardCompat, TRUE).unwrap();
    lib.window_hint(Hint::ContextDebug, TRUE).unwrap();
    let window = lib.create_window(320, 240, "core", None, None).unwrap();

    assert_eq!(version(&window), (3, 3));
    assert_eq!(window.attrib(WindowAttrib::OpenGlProfile).unwrap(), OpenGlProfile::Core.raw());
    assert_eq!(window.attrib(WindowAttrib::OpenGlForwardCompat).unwrap(), TRUE);
    assert_eq!(window.attrib(WindowAttrib::ContextDebug).unwrap(), TRUE);
}

#[test]
fn opengl_es_contexts() {
    let lib = null_library();
    lib.window_hint(Hint::ClientApi, ClientApi::OpenGlEs).unwrap();
    lib.window_hint(Hint::ContextVersionMajor, 2).unwrap();
    let window = lib.create_window(320, 240, "es", None, None).unwrap();
    assert_eq!(window.attrib(WindowAttrib::ClientApi).unwrap(), ClientApi::OpenGlEs.raw());
    assert_eq!(version(&window), (2, 0));
}

#[test]
fn invalid_versions_are_rejected_before_anything_is_created() {
    let lib = null_library();
    request_opengl(&lib);
    lib.window_hint(Hint::ContextVersionMajor, 3).unwrap();
    lib.window_hint(Hint::ContextVersionMinor, 4).unwrap();
    assert_eq!(lib.create_window(1, 1, "", None, None).unwrap_err().kind, ErrorKind::InvalidValue);

    lib.window_hint(Hint::ContextVersionMinor, 1).unwrap();
    lib.window_hint(Hint::OpenGlProfile, OpenGlProfile::Core).unwrap();
    assert_eq!(lib.create_window(1, 1, "", None, None).unwrap_err().kind, ErrorKind::InvalidValue);

    lib.default_window_hints().unwrap();
    request_opengl(&lib);
    lib.window_hint(Hint::ContextVersionMajor, 2).unwrap();
    lib.window_hint(Hint::OpenGlForwardCompat, TRUE).unwrap();
    assert_eq!(lib.create_window(1, 1, "", None, None).unwrap_err().kind, ErrorKind::InvalidValue);

    lib.default_window_hints().unwrap();
    request_opengl(&lib);
    lib.window_hint(Hint::OpenGlProfile, 0x0003_2003).unwrap();
    lib.window_hint(Hint::ContextVersionMajor, 3).unwrap();
    lib.window_hint(Hint::ContextVersionMinor, 2).unwrap();
    assert_eq!(lib.create_window(1, 1, "", None, None).unwrap_err().kind, ErrorKind::InvalidEnum);

    assert!(lib.windows().unwrap().is_empty());
}

#[test]
fn missing_es_support_is_an_unavailable_api() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    sim.set_driver(DriverInfo { gles_version: None, ..DriverInfo::default() });
    lib.window_hint(Hint::ClientApi, ClientApi::OpenGlEs).unwrap();
    let e = lib.create_window(320, 240, "es", None, None).unwrap_err();
    assert_eq!(e.kind, ErrorKind::ApiUnavailable);
    assert!(lib.windows().unwrap().is_empty());
}

#[test]
fn non_native_creation_apis_are_unavailable() {
    let lib = null_library();
    request_opengl(&lib);
    lib.window_hint(Hint::ContextCreationApi, ContextCreationApi::Egl).unwrap();
    let e = lib.create_window(320, 240, "egl", None, None).unwrap_err();
    assert_eq!(e.kind, ErrorKind::ApiUnavailable);
}

#[test]
fn legacy_drivers_cannot_provide_modern_contexts() {
    let lib = null_library();
    request_opengl(&lib);
    let sim = lib.simulator().unwrap();
    sim.set_driver(DriverInfo { legacy_only: true, ..DriverInfo::default() });

    lib.window_hint(Hint::ContextVersionMajor, 3).unwrap();
    lib.window_hint(Hint::ContextVersionMinor, 3).unwrap();
    lib.window_hint(Hint::OpenGlProfile, OpenGlProfile::Core).unwrap();
    assert_eq!(lib.create_window(1, 1, "", None, None).unwrap_err().kind, ErrorKind::VersionUnavailable);

    // Without a profile the driver gives what it has, which falls short.
    lib.window_hint(Hint::OpenGlProfile, OpenGlProfile::Any).unwrap();
    assert_eq!(lib.create_window(1, 1, "", None, None).unwrap_err().kind, ErrorKind::VersionUnavailable);

    lib.default_window_hints().unwrap();
    request_opengl(&lib);
    let window = lib.create_window(1, 1, "", None, None).unwrap();
    assert_eq!(version(&window), (2, 1));
    assert_eq!(lib.windows().unwrap(), vec![window]);
}

#[test]
fn unsatisfiable_pixel_formats() {
    let lib = null_library();
    request_opengl(&lib);
    let sim = lib.simulator().unwrap();
    sim.set_driver(DriverInfo { pixel_formats: Vec::new(), ..DriverInfo::default() });
    let e = lib.create_window(320, 240, "gl", None, None).unwrap_err();
    assert_eq!(e.kind, ErrorKind::FormatUnavailable);
}

#[test]
fn make_current_round_trip() {
    let lib = null_library();
    request_opengl(&lib);
    let window = lib.create_window(320, 240, "gl", None, None).unwrap();
    assert_eq!(lib.current_context().unwrap(), None);

    lib.make_context_current(Some(&window)).unwrap();
    assert_eq!(lib.current_context().unwrap(), Some(window.clone()));
    lib.make_context_current(None).unwrap();
    assert_eq!(lib.current_context().unwrap(), None);
    lib.make_context_current(Some(&window)).unwrap();
    assert_eq!(lib.current_context().unwrap(), Some(window.clone()));

    window.destroy().unwrap();
    assert_eq!(lib.current_context().unwrap(), None);
}

#[test]
fn contextless_windows_cannot_be_made_current_or_shared() {
    let lib = null_library();
    let plain = plain_window(&lib, 100, 100);
    assert_eq!(lib.make_context_current(Some(&plain)).unwrap_err().kind, ErrorKind::NoWindowContext);

    let e = lib.create_window(100, 100, "shared", None, Some(&plain)).unwrap_err();
    assert_eq!(e.kind, ErrorKind::NoWindowContext);

    request_opengl(&lib);
    let gl = lib.create_window(100, 100, "gl", None, None).unwrap();
    let shared = lib.create_window(100, 100, "shared", None, Some(&gl)).unwrap();
    assert_eq!(version(&shared), version(&gl));
}

#[test]
fn current_context_operations() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    assert_eq!(lib.swap_interval(1).unwrap_err().kind, ErrorKind::NoCurrentContext);
    assert_eq!(lib.extension_supported("GL_ARB_robustness").unwrap_err().kind, ErrorKind::NoCurrentContext);
    assert_eq!(lib.get_proc_address("glClear").unwrap_err().kind, ErrorKind::NoCurrentContext);

    request_opengl(&lib);
    let window = lib.create_window(320, 240, "gl", None, None).unwrap();
    lib.make_context_current(Some(&window)).unwrap();

    lib.swap_interval(1).unwrap();
    assert_eq!(sim.swap_interval(&window).unwrap(), 1);

    assert!(lib.extension_supported("GL_ARB_robustness").unwrap());
    assert!(lib.extension_supported("NULL_EXT_swap_control").unwrap());
    assert!(!lib.extension_supported("GL_ARB_robust").unwrap());
    assert_eq!(lib.extension_supported("").unwrap_err().kind, ErrorKind::InvalidValue);

    assert!(!lib.get_proc_address("glClear").unwrap().is_null());
    assert!(lib.get_proc_address("glNotAThing").unwrap().is_null());

    let before = sim.swap_count(&window).unwrap();
    window.swap_buffers().unwrap();
    window.swap_buffers().unwrap();
    assert_eq!(sim.swap_count(&window).unwrap(), before + 2);
}

#[test]
fn transparent_framebuffers() {
    let lib = null_library();
    request_opengl(&lib);
    lib.window_hint(Hint::TransparentFramebuffer, TRUE).unwrap();
    let window = lib.create_window(320, 240, "glass", None, None).unwrap();
    assert_eq!(window.attrib(WindowAttrib::TransparentFramebuffer).unwrap(), TRUE);
}

#[test]
fn swap_interval_throttles_swaps() {
    let lib = null_library();
    let sim = lib.simulator().unwrap();
    request_opengl(&lib);
    let window = lib.create_window(320, 240, "vsync", None, None).unwrap();
    lib.make_context_current(Some(&window)).unwrap();

    lib.swap_interval(1).unwrap();
    assert_eq!(sim.swap_interval(&window).unwrap(), 1);
    let before = sim.swap_count(&window).unwrap();
    let start = Instant::now();
    for _ in 0..4 {
        window.swap_buffers().unwrap();
    }
    // Three full refreshes at 60 Hz separate four swaps.
    assert!(start.elapsed() >= Duration::from_millis(50));
    assert_eq!(sim.swap_count(&window).unwrap(), before + 4);

    lib.swap_interval(0).unwrap();
    assert_eq!(sim.swap_interval(&window).unwrap(), 0);
}
