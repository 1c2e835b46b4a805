//! `Error` and `Result` types for this crate, and the per-thread error channel.
//!
//! Every failing public operation returns an `Error` *and* records it so that
//! `get_error()` can report it later, which is what applications ported from
//! C-style polling code expect.
use std::cell::RefCell;
use std::fmt::{self, Display, Formatter};

pub(crate) type CowStr = ::std::borrow::Cow<'static, str>;

/// Different kinds of errors reported by faillible operations.
///
/// The discriminants are the raw error codes applications may already know.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorKind {
    /// The library was not initialized, or was terminated since this handle was obtained.
    NotInitialized = 0x0001_0001,
    /// The operation requires a context to be current on the calling thread.
    NoCurrentContext = 0x0001_0002,
    /// An enumeration value was out of range for the hint, attribute or mode it was given to.
    InvalidEnum = 0x0001_0003,
    /// An argument had an invalid value (negative size, NaN opacity, destroyed window...).
    InvalidValue = 0x0001_0004,
    /// An allocation failed.
    OutOfMemory = 0x0001_0005,
    /// The requested client API or context creation API is not available on this system.
    ApiUnavailable = 0x0001_0006,
    /// The requested client API version is not available.
    VersionUnavailable = 0x0001_0007,
    /// The windowing system or a driver reported a failure.
    ///
    /// For instance, on X11-based targets, the user's X11 server may lack some required extensions.
    PlatformError = 0x0001_0008,
    /// No framebuffer configuration matches the requested hints.
    FormatUnavailable = 0x0001_0009,
    /// The window has no OpenGL or OpenGL ES context.
    NoWindowContext = 0x0001_000A,
}

/// An `ErrorKind` packed with an optional `reason` string.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Error {
    /// The error kind.
    pub kind: ErrorKind,
    /// A hopefully useful reason string, or `None` if unknown or not meaningful.
    pub reason: Option<CowStr>,
}

/// Alias to `Result<T, Error>`.
pub type Result<T> = ::std::result::Result<T, Error>;

impl ErrorKind {
    /// Gets the raw error code.
    pub fn raw(self) -> i32 {
        self as i32
    }
    pub(crate) fn describe_quick(&self) -> &'static str {
        match *self {
            ErrorKind::NotInitialized => "The library is not initialized",
            ErrorKind::NoCurrentContext => "There is no current context",
            ErrorKind::InvalidEnum => "Invalid argument for enum parameter",
            ErrorKind::InvalidValue => "Invalid value for parameter",
            ErrorKind::OutOfMemory => "Out of memory",
            ErrorKind::ApiUnavailable => "The requested API is unavailable",
            ErrorKind::VersionUnavailable => "The requested API version is unavailable",
            ErrorKind::PlatformError => "A platform-specific error occurred",
            ErrorKind::FormatUnavailable => "The requested format is unavailable",
            ErrorKind::NoWindowContext => "The specified window has no context",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.describe_quick())
    }
}

impl ::std::error::Error for ErrorKind {}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.kind.describe_quick())?;
        match self.reason {
            None => write!(f, " (no reason given)"),
            Some(ref s) => write!(f, ": {}", s),
        }
    }
}

impl ::std::error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self { kind, reason: None }
    }
}

/// Keeps the first unread error, and the most recent one after it.
///
/// Errors raised in a burst (one tick of the application loop) displace each
/// other in the second slot only, so the root cause is never lost.
#[derive(Debug, Default)]
struct ErrorChannel {
    first: Option<Error>,
    latest: Option<Error>,
}

impl ErrorChannel {
    fn push(&mut self, e: Error) {
        if self.first.is_none() {
            self.first = Some(e);
        } else {
            self.latest = Some(e);
        }
    }
    fn pop(&mut self) -> Option<Error> {
        let e = self.first.take();
        self.first = self.latest.take();
        e
    }
}

thread_local! {
    static CHANNEL: RefCell<ErrorChannel> = RefCell::new(ErrorChannel::default());
}

/// Pops the oldest unread error recorded on the calling thread.
///
/// Errors are scoped per thread: each thread has its own channel, holding the
/// first unread error and the latest one after it. An error reported on one
/// thread is never seen by `get_error()` on another.
///
/// This may be called at any time, including before initialization.
pub fn get_error() -> Option<Error> {
    CHANNEL.with(|c| c.borrow_mut().pop())
}

/// Records an error into the calling thread's channel.
pub(crate) fn report(e: &Error) {
    match e.kind {
        ErrorKind::PlatformError | ErrorKind::OutOfMemory => error!("{}", e),
        _ => debug!("{}", e),
    }
    CHANNEL.with(|c| c.borrow_mut().push(e.clone()));
}

/// Records a backend failure that the calling operation recovers from.
pub(crate) fn report_transient(e: Error) {
    warn!("Ignoring transient failure: {}", e);
    CHANNEL.with(|c| c.borrow_mut().push(e));
}

/// Extension used at the public boundary: an `Err` is also recorded in the channel.
pub(crate) trait Reported {
    fn reported(self) -> Self;
}

impl<T> Reported for Result<T> {
    fn reported(self) -> Self {
        if let Err(ref e) = self {
            report(e);
        }
        self
    }
}

#[allow(unused_imports)]
pub(crate) use self::utils::*;

mod utils {
    #![allow(dead_code)]
    use super::*;

    impl Error {
        pub(crate) fn new<S: Into<CowStr>>(kind: ErrorKind, s: S) -> Self {
            Self { kind, reason: Some(s.into()), }
        }
        pub(crate) fn not_initialized() -> Self {
            Self::new(ErrorKind::NotInitialized, "The library is not initialized")
        }
        pub(crate) fn no_current_context() -> Self {
            Self::new(ErrorKind::NoCurrentContext, "No context is current on this thread")
        }
        pub(crate) fn no_window_context() -> Self {
            Self::new(ErrorKind::NoWindowContext, "Cannot use a window without an OpenGL or OpenGL ES context")
        }
        pub(crate) fn invalid_enum<S: Into<CowStr>>(s: S) -> Self {
            Self::new(ErrorKind::InvalidEnum, s)
        }
        pub(crate) fn invalid_value<S: Into<CowStr>>(s: S) -> Self {
            Self::new(ErrorKind::InvalidValue, s)
        }
        pub(crate) fn api_unavailable<S: Into<CowStr>>(s: S) -> Self {
            Self::new(ErrorKind::ApiUnavailable, s)
        }
        pub(crate) fn version_unavailable<S: Into<CowStr>>(s: S) -> Self {
            Self::new(ErrorKind::VersionUnavailable, s)
        }
        pub(crate) fn format_unavailable<S: Into<CowStr>>(s: S) -> Self {
            Self::new(ErrorKind::FormatUnavailable, s)
        }
        pub(crate) fn failed<S: Into<CowStr>>(s: S) -> Self {
            Self::new(ErrorKind::PlatformError, s)
        }
        pub(crate) fn failed_unexplained() -> Self {
            Self { kind: ErrorKind::PlatformError, reason: None, }
        }
    }

    pub(crate) fn invalid_enum<T, S: Into<CowStr>>(s: S) -> self::Result<T> {
        Err(Error::invalid_enum(s))
    }
    pub(crate) fn invalid_value<T, S: Into<CowStr>>(s: S) -> self::Result<T> {
        Err(Error::invalid_value(s))
    }
    pub(crate) fn api_unavailable<T, S: Into<CowStr>>(s: S) -> self::Result<T> {
        Err(Error::api_unavailable(s))
    }
    pub(crate) fn version_unavailable<T, S: Into<CowStr>>(s: S) -> self::Result<T> {
        Err(Error::version_unavailable(s))
    }
    pub(crate) fn format_unavailable<T, S: Into<CowStr>>(s: S) -> self::Result<T> {
        Err(Error::format_unavailable(s))
    }
    pub(crate) fn failed<T, S: Into<CowStr>>(s: S) -> self::Result<T> {
        Err(Error::failed(s))
    }
    pub(crate) fn failed_unexplained<T>() -> self::Result<T> {
        Err(Error::failed_unexplained())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain() {
        while get_error().is_some() {}
    }

    #[test]
    fn first_error_of_a_burst_is_kept() {
        drain();
        report(&Error::invalid_value("first"));
        report(&Error::invalid_enum("second"));
        report(&Error::failed("third"));
        let e = get_error().unwrap();
        assert_eq!(e.kind, ErrorKind::InvalidValue);
        assert_eq!(get_error().unwrap().kind, ErrorKind::PlatformError);
        assert!(get_error().is_none());
    }

    #[test]
    fn reported_records_only_failures() {
        drain();
        let ok: Result<u32> = Ok(3);
        assert_eq!(ok.reported().unwrap(), 3);
        assert!(get_error().is_none());
        let err: Result<u32> = invalid_value("nope");
        assert!(err.reported().is_err());
        assert_eq!(get_error().unwrap().reason.as_ref().map(|s| s.as_ref()), Some("nope"));
    }

    #[test]
    fn errors_stay_on_their_thread() {
        drain();
        report(&Error::invalid_value("main"));
        let other = std::thread::spawn(|| {
            let seen = get_error().is_none();
            report(&Error::failed("worker"));
            seen
        }).join().unwrap();
        assert!(other);
        assert_eq!(get_error().unwrap().kind, ErrorKind::InvalidValue);
        assert!(get_error().is_none());
    }

    #[test]
    fn raw_codes_are_stable() {
        assert_eq!(ErrorKind::NotInitialized.raw(), 0x00010001);
        assert_eq!(ErrorKind::NoWindowContext.raw(), 0x0001000A);
        assert_eq!(format!("{}", Error::invalid_value("w")), "Invalid value for parameter: w");
    }
}
