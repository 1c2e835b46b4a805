//! A thread-local storage slot holding one pointer-sized value per thread.
//!
//! Slots are allocated dynamically (one per initialized library) instead of
//! being static `thread_local!`s, so that a terminated library's slot can be
//! released and a re-initialized one starts from a clean state.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_KEY: AtomicUsize = AtomicUsize::new(1);

thread_local! {
    static VALUES: RefCell<HashMap<usize, usize>> = RefCell::new(HashMap::new());
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct TlsSlot {
    key: usize,
}

impl TlsSlot {
    pub fn create() -> Self {
        Self { key: NEXT_KEY.fetch_add(1, Ordering::Relaxed) }
    }
    /// Gets this thread's value, 0 if never set.
    pub fn get(&self) -> usize {
        VALUES.with(|v| v.borrow().get(&self.key).cloned().unwrap_or(0))
    }
    pub fn set(&self, value: usize) {
        VALUES.with(|v| {
            let mut v = v.borrow_mut();
            if value == 0 {
                v.remove(&self.key);
            } else {
                v.insert(self.key, value);
            }
        })
    }
    /// Releases the slot. Values other threads stored in it are unreachable from now on.
    pub fn destroy(self) {
        self.set(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn values_are_per_thread_and_per_slot() {
        let a = TlsSlot::create();
        let b = TlsSlot::create();
        a.set(42);
        assert_eq!(a.get(), 42);
        assert_eq!(b.get(), 0);
        let key = a.key;
        thread::spawn(move || {
            let a = TlsSlot { key };
            assert_eq!(a.get(), 0);
            a.set(7);
        }).join().unwrap();
        assert_eq!(a.get(), 42);
        a.destroy();
        b.destroy();
    }

    #[test]
    fn destroyed_slots_are_not_reused() {
        let a = TlsSlot::create();
        a.set(1);
        let key = a.key;
        a.destroy();
        let b = TlsSlot::create();
        assert_ne!(b.key, key);
        assert_eq!(b.get(), 0);
    }
}
