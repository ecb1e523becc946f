//! Push-button descriptors.

use heapless::String;
use serde::Deserialize;

use super::units::Line;

/// Electrical polarity of a button input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Pressed when the line reads low (switch to ground, pull-up).
    #[default]
    ActiveLow,
    /// Pressed when the line reads high.
    ActiveHigh,
}

impl Polarity {
    /// Translate a raw line level into "button held down".
    #[inline]
    pub fn is_active(self, level_high: bool) -> bool {
        match self {
            Polarity::ActiveLow => !level_high,
            Polarity::ActiveHigh => level_high,
        }
    }
}

/// One button line descriptor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ButtonConfig {
    /// Human-readable name (max 16 chars).
    pub name: String<16>,

    /// Input line the switch is wired to.
    pub line: Line,

    /// Line polarity.
    #[serde(default)]
    pub polarity: Polarity,
}

impl ButtonConfig {
    /// Active-low button on `line`.
    pub fn new(name: &str, line: Line) -> Self {
        Self {
            name: super::device_name(name),
            line,
            polarity: Polarity::ActiveLow,
        }
    }

    /// Set the polarity.
    pub fn polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }
}
