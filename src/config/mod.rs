//! Configuration module for device-hal.
//!
//! Provides descriptor types for buttons, encoders and current sensors that
//! can be built in code or loaded from TOML files (with the `std` feature).

mod button;
mod current;
mod encoder;
mod system;
pub mod units;
#[cfg(feature = "std")]
mod loader;
mod validation;

pub use button::{ButtonConfig, Polarity};
pub use current::CurrentConfig;
pub use encoder::EncoderConfig;
pub use system::{SystemConfig, TimingConfig, MAX_BUTTONS, MAX_CURRENT_SENSORS, MAX_ENCODERS};
pub use validation::validate_config;
pub(crate) use validation::{validate_current, validate_encoder};

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{Amps, Channel, Line, Micros, Millis, Volts};

/// Device name from `name`, truncated at a character boundary to fit 16
/// bytes.
pub(crate) fn device_name(name: &str) -> heapless::String<16> {
    let mut out = heapless::String::new();
    for c in name.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
