//! Button module for device-hal.
//!
//! Turns raw, bouncing switch levels into stable press/release state and a
//! queue of transition events.

mod debounce;
mod event;
mod registry;

pub use debounce::Debouncer;
pub use event::{ButtonEvent, ButtonState};
pub use registry::{ButtonRegistry, EVENT_QUEUE_DEPTH};
