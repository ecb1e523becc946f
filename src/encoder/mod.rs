//! Encoder module for device-hal.
//!
//! Decodes incremental quadrature encoders into an accumulated position and
//! a speed estimate.

mod quadrature;
mod registry;

pub use quadrature::{phase_of, QuadratureDecoder};
pub use registry::{EncoderReading, EncoderRegistry, HISTORY_DEPTH};
