//! Sharing a registry between an interrupt handler and the main loop.
//!
//! All registry state (debouncers, phase memory, position, speed) is updated
//! inside one `&mut self` call, so serializing calls is enough to rule out a
//! torn read. [`Shared`] does that with a short critical section.

use core::cell::RefCell;

use critical_section::Mutex;

/// A value reachable from several execution contexts.
///
/// # Example
///
/// ```rust,ignore
/// static BUTTONS: Shared<Option<ButtonRegistry<Bank, Timer, 4>>> = Shared::new(None);
///
/// // Timer interrupt, every 5 ms
/// BUTTONS.lock(|b| b.as_mut().map(|b| b.sample_tick()));
///
/// // Main loop
/// let start = BUTTONS.lock(|b| b.as_ref().map(|b| b.pressed(0)));
/// ```
pub struct Shared<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> Shared<T> {
    /// Wrap `value`.
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Run `f` with exclusive access to the value.
    ///
    /// Keep `f` short: interrupts are masked while it runs on single-core
    /// targets. Calling `lock` again from inside `f` panics.
    pub fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    /// Replace the value, returning the old one.
    pub fn replace(&self, value: T) -> T {
        self.lock(|v| core::mem::replace(v, value))
    }

    /// Unwrap the value.
    pub fn into_inner(self) -> T {
        self.inner.into_inner().into_inner()
    }
}

impl<T: Default> Default for Shared<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    extern crate std;

    use std::sync::Arc;
    use std::thread;
    use std::vec::Vec;

    use super::*;

    #[test]
    fn test_lock_returns_closure_result() {
        let shared = Shared::new(41u32);
        let value = shared.lock(|v| {
            *v += 1;
            *v
        });
        assert_eq!(value, 42);
        assert_eq!(shared.replace(0), 42);
        assert_eq!(shared.into_inner(), 0);
    }

    #[test]
    fn test_concurrent_updates_are_serialized() {
        let shared = Arc::new(Shared::new((0u64, 0u64)));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    for _ in 0..1_000 {
                        shared.lock(|(a, b)| {
                            *a += 1;
                            *b += 1;
                        });
                        // Both halves always move together
                        shared.lock(|(a, b)| assert_eq!(a, b));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.lock(|v| *v), (4_000, 4_000));
    }
}
