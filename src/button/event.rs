//! Committed button transitions.

use core::fmt;

use crate::config::units::Micros;

/// Debounced logical state of a button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonState {
    /// Not held.
    #[default]
    Released,
    /// Held down.
    Pressed,
}

impl ButtonState {
    /// `true` for [`ButtonState::Pressed`].
    #[inline]
    pub fn is_pressed(self) -> bool {
        self == ButtonState::Pressed
    }
}

impl From<bool> for ButtonState {
    fn from(pressed: bool) -> Self {
        if pressed {
            ButtonState::Pressed
        } else {
            ButtonState::Released
        }
    }
}

impl fmt::Display for ButtonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ButtonState::Pressed => f.write_str("PRESSED"),
            ButtonState::Released => f.write_str("RELEASED"),
        }
    }
}

/// A debounced transition of one button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonEvent {
    /// Button id.
    pub id: usize,
    /// State entered.
    pub state: ButtonState,
    /// When the transition was committed.
    pub at: Micros,
    /// How long the button was held; only set on release.
    pub pressed_duration: Option<Micros>,
}
