//! Analog current sensor descriptors.

use heapless::String;
use serde::Deserialize;

use super::units::{Channel, Volts};

/// One current sensor descriptor.
///
/// Defaults match a Hall-effect ACS725 10 A board: 0.322 V at zero current,
/// 264 mV per ampere.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrentConfig {
    /// Human-readable name (max 16 chars).
    pub name: String<16>,

    /// ADC channel the sensor output is wired to.
    pub channel: Channel,

    /// Sensor output at zero current.
    #[serde(default = "default_zero_offset")]
    pub zero_offset_volts: Volts,

    /// Sensor sensitivity.
    #[serde(default = "default_volts_per_amp")]
    pub volts_per_amp: f32,

    /// Weight of a new sample in the moving average, in (0, 1].
    #[serde(default = "default_smoothing")]
    pub smoothing: f32,
}

fn default_zero_offset() -> Volts {
    Volts(0.322)
}

fn default_volts_per_amp() -> f32 {
    0.264
}

fn default_smoothing() -> f32 {
    0.025
}

impl CurrentConfig {
    /// Sensor on `channel` with the default calibration.
    pub fn new(name: &str, channel: Channel) -> Self {
        Self {
            name: super::device_name(name),
            channel,
            zero_offset_volts: default_zero_offset(),
            volts_per_amp: default_volts_per_amp(),
            smoothing: default_smoothing(),
        }
    }

    /// Override the calibration.
    pub fn calibration(mut self, zero_offset: Volts, volts_per_amp: f32) -> Self {
        self.zero_offset_volts = zero_offset;
        self.volts_per_amp = volts_per_amp;
        self
    }

    /// Override the smoothing factor.
    pub fn smoothing(mut self, smoothing: f32) -> Self {
        self.smoothing = smoothing;
        self
    }
}
