//! Per-button debounce state machine.

use crate::config::units::Micros;

use super::event::ButtonState;

/// Hysteresis debouncer for one input.
///
/// Any change of the raw level restarts the window. The logical state flips
/// only once the raw level has held still for a full window, so a burst of
/// bounces yields at most one transition and latency is bounded by the
/// window. The logical state starts released.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Micros,
    /// Last raw (polarity-corrected) level seen, `None` before the first sample.
    candidate: Option<bool>,
    candidate_since: Micros,
    pressed: bool,
    last_transition: Option<Micros>,
}

impl Debouncer {
    /// New debouncer in the released state.
    pub const fn new(window: Micros) -> Self {
        Self {
            window,
            candidate: None,
            candidate_since: Micros(0),
            pressed: false,
            last_transition: None,
        }
    }

    /// Feed one sample.
    ///
    /// `active` is the polarity-corrected raw level ("switch closed").
    /// Returns the new state when a transition is committed.
    pub fn sample(&mut self, active: bool, now: Micros) -> Option<ButtonState> {
        if self.candidate != Some(active) {
            self.candidate = Some(active);
            self.candidate_since = now;
        }

        if active != self.pressed && now.since(self.candidate_since) >= self.window {
            self.pressed = active;
            self.last_transition = Some(now);
            return Some(ButtonState::from(active));
        }

        None
    }

    /// Committed logical state.
    #[inline]
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Committed logical state.
    #[inline]
    pub fn state(&self) -> ButtonState {
        ButtonState::from(self.pressed)
    }

    /// Time of the last committed transition.
    #[inline]
    pub fn last_transition(&self) -> Option<Micros> {
        self.last_transition
    }

    /// Debounce window.
    #[inline]
    pub fn window(&self) -> Micros {
        self.window
    }
}
