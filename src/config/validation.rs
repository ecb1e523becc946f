//! Configuration validation.

use crate::error::{ConfigError, Error, Result};

use super::{CurrentConfig, EncoderConfig, SystemConfig, TimingConfig};

/// Validate a system configuration.
///
/// Checks:
/// - Debounce and speed windows are within range
/// - Names are unique within each device class
/// - Encoders use two distinct lines and a non-empty wrap range
/// - Current sensor calibration and smoothing are usable
pub fn validate_config(config: &SystemConfig) -> Result<()> {
    validate_timing(&config.timing)?;

    // Buttons only need unique names
    check_unique(config.buttons.iter().map(|b| &b.name))?;

    for encoder in config.encoders.iter() {
        validate_encoder(encoder)?;
    }
    check_unique(config.encoders.iter().map(|e| &e.name))?;

    for sensor in config.current_sensors.iter() {
        validate_current(sensor)?;
    }
    check_unique(config.current_sensors.iter().map(|c| &c.name))?;

    Ok(())
}

fn validate_timing(timing: &TimingConfig) -> Result<()> {
    if timing.debounce.0 == 0 || timing.debounce.0 > 1_000 {
        return Err(Error::Config(ConfigError::InvalidDebounceWindow(
            timing.debounce.0,
        )));
    }

    if timing.speed_window.0 == 0 || timing.speed_window.0 > 10_000 {
        return Err(Error::Config(ConfigError::InvalidSpeedWindow(
            timing.speed_window.0,
        )));
    }

    Ok(())
}

/// Check one encoder descriptor: distinct lines and a wrap range in
/// `1..=i32::MAX`.
pub(crate) fn validate_encoder(config: &EncoderConfig) -> Result<()> {
    if config.line_a == config.line_b {
        return Err(Error::Config(ConfigError::SharedEncoderLines {
            name: config.name.clone(),
            line: config.line_a,
        }));
    }

    if matches!(config.range, Some(range) if range == 0 || range > i32::MAX as u32) {
        return Err(Error::Config(ConfigError::InvalidRange(config.name.clone())));
    }

    Ok(())
}

/// Check one current sensor descriptor: positive sensitivity and a
/// smoothing factor in `(0, 1]`.
pub(crate) fn validate_current(config: &CurrentConfig) -> Result<()> {
    if config.volts_per_amp.is_nan() || config.volts_per_amp <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidSensitivity(
            config.volts_per_amp,
        )));
    }

    if config.smoothing.is_nan() || config.smoothing <= 0.0 || config.smoothing > 1.0 {
        return Err(Error::Config(ConfigError::InvalidSmoothing(config.smoothing)));
    }

    Ok(())
}

fn check_unique<'a, I>(names: I) -> Result<()>
where
    I: Iterator<Item = &'a heapless::String<16>> + Clone,
{
    for (i, name) in names.clone().enumerate() {
        if names.clone().take(i).any(|other| other == name) {
            return Err(Error::Config(ConfigError::DuplicateName(name.clone())));
        }
    }
    Ok(())
}
