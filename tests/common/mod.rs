#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use winpal::{ClientApi, Hint, InitHint, Library, PlatformKind, Window};

/// Initializes the library on the headless backend.
pub fn null_library() -> Library {
    winpal::init_hint(InitHint::Platform(PlatformKind::Null));
    winpal::init().expect("the Null platform is always available")
}

/// A window without a context, created with the default hints otherwise.
pub fn plain_window(lib: &Library, width: i32, height: i32) -> Window {
    lib.window_hint(Hint::ClientApi, ClientApi::NoApi).unwrap();
    let window = lib.create_window(width, height, "test", None, None).unwrap();
    lib.default_window_hints().unwrap();
    window
}

/// Collects whatever a callback reports.
pub fn recorder<T>() -> Rc<RefCell<Vec<T>>> {
    Rc::new(RefCell::new(Vec::new()))
}
