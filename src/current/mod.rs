//! Current sensor module for device-hal.
//!
//! Converts ADC voltages from Hall-effect current sensors (ACS725 class)
//! into amperes, raw or smoothed.

mod sensor;

pub use sensor::CurrentSensors;
