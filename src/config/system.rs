//! System configuration - root configuration structure.

use heapless::Vec;
use serde::Deserialize;

use super::button::ButtonConfig;
use super::current::CurrentConfig;
use super::encoder::EncoderConfig;
use super::units::Millis;

/// Maximum number of buttons in a configuration.
pub const MAX_BUTTONS: usize = 10;

/// Maximum number of encoders in a configuration.
pub const MAX_ENCODERS: usize = 10;

/// Maximum number of current sensors in a configuration.
pub const MAX_CURRENT_SENSORS: usize = 10;

/// Sampling parameters shared by all devices.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TimingConfig {
    /// Time a raw button level must stay stable before it is trusted.
    #[serde(default = "default_debounce", rename = "debounce_ms")]
    pub debounce: Millis,

    /// Look-back window for encoder speed estimation.
    #[serde(default = "default_speed_window", rename = "speed_window_ms")]
    pub speed_window: Millis,
}

fn default_debounce() -> Millis {
    Millis(20)
}

fn default_speed_window() -> Millis {
    Millis(100)
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            debounce: default_debounce(),
            speed_window: default_speed_window(),
        }
    }
}

/// Root configuration structure from TOML.
///
/// Device ids are assigned in declaration order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemConfig {
    /// Sampling parameters.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Push-buttons.
    #[serde(default)]
    pub buttons: Vec<ButtonConfig, MAX_BUTTONS>,

    /// Quadrature encoders.
    #[serde(default)]
    pub encoders: Vec<EncoderConfig, MAX_ENCODERS>,

    /// Analog current sensors.
    #[serde(default)]
    pub current_sensors: Vec<CurrentConfig, MAX_CURRENT_SENSORS>,
}

impl SystemConfig {
    /// Get a button descriptor by name.
    pub fn button(&self, name: &str) -> Option<&ButtonConfig> {
        self.buttons.iter().find(|b| b.name.as_str() == name)
    }

    /// Get an encoder descriptor by name.
    pub fn encoder(&self, name: &str) -> Option<&EncoderConfig> {
        self.encoders.iter().find(|e| e.name.as_str() == name)
    }

    /// Get a current sensor descriptor by name.
    pub fn current_sensor(&self, name: &str) -> Option<&CurrentConfig> {
        self.current_sensors.iter().find(|c| c.name.as_str() == name)
    }

    /// Id a button will be registered under.
    pub fn button_id(&self, name: &str) -> Option<usize> {
        self.buttons.iter().position(|b| b.name.as_str() == name)
    }

    /// Id an encoder will be registered under.
    pub fn encoder_id(&self, name: &str) -> Option<usize> {
        self.encoders.iter().position(|e| e.name.as_str() == name)
    }

    /// Id a current sensor will be registered under.
    pub fn current_sensor_id(&self, name: &str) -> Option<usize> {
        self.current_sensors
            .iter()
            .position(|c| c.name.as_str() == name)
    }

    /// List all button names.
    pub fn button_names(&self) -> impl Iterator<Item = &str> {
        self.buttons.iter().map(|b| b.name.as_str())
    }

    /// List all encoder names.
    pub fn encoder_names(&self) -> impl Iterator<Item = &str> {
        self.encoders.iter().map(|e| e.name.as_str())
    }
}
