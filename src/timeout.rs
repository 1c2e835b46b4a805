//! The Timeout enum, which is either a fixed duration or infinite.

use std::time::Duration;
use crate::error::{self, Result};

/// Either a fixed duration or infinite.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum Timeout {
    /// Wait at most this long. A zero duration never blocks.
    Set(Duration),
    /// Wait until something happens.
    Infinite,
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Timeout::Set(d)
    }
}

impl Timeout {
    /// The timeout that never blocks.
    pub fn none() -> Self {
        Timeout::Set(Duration::from_secs(0))
    }
    /// Converts a timeout expressed in seconds, rejecting negative and non-finite values.
    pub fn from_secs_f64(secs: f64) -> Result<Self> {
        if !secs.is_finite() || secs < 0. {
            return error::invalid_value(format!("Invalid time {}", secs));
        }
        // Beyond a century, waiting is as good as waiting forever.
        if secs > 3.2e9 {
            return Ok(Timeout::Infinite);
        }
        Ok(Timeout::Set(Duration::from_secs_f64(secs)))
    }
    /// Is this a zero-length timeout?
    pub fn is_none(&self) -> bool {
        *self == Self::none()
    }
    /// Gets the duration, or `None` when infinite.
    pub fn duration(&self) -> Option<Duration> {
        match *self {
            Timeout::Set(d) => Some(d),
            Timeout::Infinite => None,
        }
    }
    /// Gets the duration in whole milliseconds, or -1 when infinite, as `poll(2)` expects.
    pub fn as_poll_millis(&self) -> i32 {
        match *self {
            Timeout::Set(d) => {
                let ms = d.as_millis();
                if ms > i32::max_value() as u128 { i32::max_value() } else { ms as i32 }
            },
            Timeout::Infinite => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn zero_is_a_poll() {
        assert!(Timeout::from_secs_f64(0.).unwrap().is_none());
        assert_eq!(Timeout::from_secs_f64(0.25).unwrap().as_poll_millis(), 250);
        assert_eq!(Timeout::Infinite.as_poll_millis(), -1);
    }

    #[test]
    fn rejects_negative_and_non_finite() {
        for &t in &[-1., ::std::f64::NAN, ::std::f64::INFINITY] {
            assert_eq!(Timeout::from_secs_f64(t).unwrap_err().kind, ErrorKind::InvalidValue);
        }
    }
}
