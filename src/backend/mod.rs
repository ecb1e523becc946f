//! Signal backend capability set.
//!
//! The device registries only ever read: raw digital levels, ADC voltages and
//! a monotonic time source. Each concern is a small trait so a board support
//! crate, an embedded-hal pin array or the host simulation can provide it.

use core::fmt::Debug;

use embedded_hal::digital::InputPin;

use crate::config::units::{Channel, Line, Micros, Volts};

#[cfg(feature = "std")]
pub mod sim;

/// Raw digital level sampling.
pub trait DigitalInput {
    /// Backend specific failure.
    type Error: Debug;

    /// Arm `line` for sampling.
    ///
    /// Fails when the line does not exist or cannot be configured as input.
    fn configure(&mut self, line: Line) -> Result<(), Self::Error>;

    /// Read the raw level of `line` (`true` = high).
    fn read(&mut self, line: Line) -> Result<bool, Self::Error>;
}

/// Raw ADC sampling.
pub trait AnalogInput {
    /// Backend specific failure.
    type Error: Debug;

    /// Arm `channel` for conversions.
    fn configure(&mut self, channel: Channel) -> Result<(), Self::Error>;

    /// Convert `channel` and return the measured voltage.
    fn read_volts(&mut self, channel: Channel) -> Result<Volts, Self::Error>;
}

/// Monotonic time source.
pub trait Clock {
    /// Time since an arbitrary fixed origin.
    fn now(&mut self) -> Micros;
}

impl<F> Clock for F
where
    F: FnMut() -> Micros,
{
    #[inline]
    fn now(&mut self) -> Micros {
        self()
    }
}

/// Error from a [`PinBank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinBankError<E> {
    /// Line number beyond the bank size.
    NoSuchLine(Line),
    /// Underlying pin error.
    Pin(E),
}

/// An array of embedded-hal input pins addressed by line number.
///
/// Line `n` is `pins[n]`.
///
/// # Example
///
/// ```rust,ignore
/// let bank = PinBank::new([start_pin, stop_pin]);
/// let mut buttons: ButtonRegistry<_, _, 2> = ButtonRegistry::new(bank, clock);
/// ```
pub struct PinBank<P, const N: usize> {
    pins: [P; N],
}

impl<P, const N: usize> PinBank<P, N>
where
    P: InputPin,
{
    /// Wrap `pins`.
    pub fn new(pins: [P; N]) -> Self {
        Self { pins }
    }

    /// Give the pins back.
    pub fn release(self) -> [P; N] {
        self.pins
    }
}

impl<P, const N: usize> DigitalInput for PinBank<P, N>
where
    P: InputPin,
{
    type Error = PinBankError<P::Error>;

    fn configure(&mut self, line: Line) -> Result<(), Self::Error> {
        if line.index() < N {
            Ok(())
        } else {
            Err(PinBankError::NoSuchLine(line))
        }
    }

    fn read(&mut self, line: Line) -> Result<bool, Self::Error> {
        self.pins
            .get_mut(line.index())
            .ok_or(PinBankError::NoSuchLine(line))?
            .is_high()
            .map_err(PinBankError::Pin)
    }
}

/// Clock backed by `std::time::Instant`, zero at construction.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    /// Start a clock at zero.
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now(&mut self) -> Micros {
        Micros(self.origin.elapsed().as_micros() as u64)
    }
}
