//! # device-hal
//!
//! Debounced push-buttons, quadrature encoders and current sensors for
//! embedded targets, over narrow digital/analog/clock backends.
//!
//! ## Features
//!
//! - **Debounced buttons**: per-button hysteresis, press/release events with
//!   press duration, latched "was pressed" flags
//! - **Quadrature encoders**: table-driven decoding with glitch counting,
//!   position with optional wrap range, windowed speed estimate
//! - **Current sensors**: ADC volts to amperes, raw or smoothed
//! - **Configuration-driven**: describe devices in TOML files
//! - **embedded-hal 1.0**: [`PinBank`] turns `InputPin`s into a line backend
//! - **no_std compatible**: core library works without standard library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use device_hal::{ButtonRegistry, EncoderRegistry, PinBank, SystemConfig};
//!
//! let config: SystemConfig = device_hal::load_config("panel.toml")?;
//!
//! let mut buttons: ButtonRegistry<_, _, 4> = ButtonRegistry::new(bank, clock);
//! buttons.init_from_config(&config)?;
//!
//! loop {
//!     buttons.sample_tick()?;
//!     while let Some(event) = buttons.next_event() {
//!         // ...
//!     }
//! }
//! ```
//!
//! Sampling usually runs from a timer interrupt; wrap the registry in a
//! [`Shared`] to query it from the main loop.
//!
//! ## Feature Flags
//!
//! - `std` (default): TOML file loading, host clock, simulated backend
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

// Core modules
pub mod backend;
pub mod button;
pub mod config;
pub mod current;
pub mod encoder;
pub mod error;
pub mod shared;

// Re-exports for ergonomic API
pub use backend::{AnalogInput, Clock, DigitalInput, PinBank, PinBankError};
pub use button::{ButtonEvent, ButtonRegistry, ButtonState, Debouncer};
pub use config::{
    validate_config, ButtonConfig, CurrentConfig, EncoderConfig, Polarity, SystemConfig,
    TimingConfig,
};
pub use current::CurrentSensors;
pub use encoder::{EncoderReading, EncoderRegistry, QuadratureDecoder};
pub use error::{Error, Result};
pub use shared::Shared;

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

#[cfg(feature = "std")]
pub use backend::StdClock;

// Unit types
pub use config::units::{Amps, Channel, Line, Micros, Millis, Volts};
