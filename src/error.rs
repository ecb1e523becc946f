//! Error types for device-hal.
//!
//! Provides unified error handling across configuration, digital devices
//! (buttons, encoders) and analog devices (current sensors).

use core::fmt;

use crate::config::units::{Channel, Line};

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all device-hal operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Button or encoder registry error
    Device(DeviceError),
    /// Current sensor error
    Analog(AnalogError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Debounce window must be 1-1000 ms
    InvalidDebounceWindow(u32),
    /// Speed window must be 1-10000 ms
    InvalidSpeedWindow(u32),
    /// Two devices of the same class share a name
    DuplicateName(heapless::String<16>),
    /// Encoder uses the same line for both phases
    SharedEncoderLines {
        /// Encoder name
        name: heapless::String<16>,
        /// The line used twice
        line: Line,
    },
    /// Encoder wrap range must be > 0
    InvalidRange(heapless::String<16>),
    /// Current sensor sensitivity must be > 0
    InvalidSensitivity(f32),
    /// Smoothing factor must be in (0, 1]
    InvalidSmoothing(f32),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Registry errors for digital devices.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// Non-positive capacity passed to `init`
    InvalidArgument,
    /// More devices requested than the registry can hold
    CapacityExceeded {
        /// Number of devices requested
        requested: usize,
        /// Available capacity
        capacity: usize,
    },
    /// Descriptor references a line the backend cannot provide
    InvalidDescriptor {
        /// Offending line
        line: Line,
    },
    /// Backend could not be armed for a line
    InitFailure {
        /// Offending line
        line: Line,
    },
    /// Query against an unregistered identifier
    InvalidId(usize),
    /// `init` was already called on this registry
    AlreadyInitialized,
    /// Backend failed to read an armed line
    ReadFailure {
        /// Line that failed
        line: Line,
    },
}

/// Current sensor errors.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalogError {
    /// No sensor registered under this id
    InvalidChannel(usize),
    /// ADC channel could not be armed
    InitFailure {
        /// Offending ADC channel
        channel: Channel,
    },
    /// ADC conversion failed
    ReadFailure {
        /// ADC channel that failed
        channel: Channel,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Device(e) => write!(f, "Device error: {}", e),
            Error::Analog(e) => write!(f, "Analog error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidDebounceWindow(ms) => {
                write!(f, "Invalid debounce window: {} ms. Must be 1-1000", ms)
            }
            ConfigError::InvalidSpeedWindow(ms) => {
                write!(f, "Invalid speed window: {} ms. Must be 1-10000", ms)
            }
            ConfigError::DuplicateName(name) => write!(f, "Duplicate device name: '{}'", name),
            ConfigError::SharedEncoderLines { name, line } => {
                write!(f, "Encoder '{}' uses line {} for both phases", name, line.0)
            }
            ConfigError::InvalidRange(name) => {
                write!(f, "Encoder '{}' has an empty wrap range", name)
            }
            ConfigError::InvalidSensitivity(v) => {
                write!(f, "Invalid sensitivity: {} V/A. Must be > 0", v)
            }
            ConfigError::InvalidSmoothing(v) => {
                write!(f, "Invalid smoothing factor: {}. Must be in (0, 1]", v)
            }
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::InvalidArgument => write!(f, "Capacity must be > 0"),
            DeviceError::CapacityExceeded { requested, capacity } => {
                write!(f, "{} devices requested, capacity is {}", requested, capacity)
            }
            DeviceError::InvalidDescriptor { line } => {
                write!(f, "Line {} is not available", line.0)
            }
            DeviceError::InitFailure { line } => {
                write!(f, "Backend could not be armed for line {}", line.0)
            }
            DeviceError::InvalidId(id) => write!(f, "No device registered with id {}", id),
            DeviceError::AlreadyInitialized => write!(f, "Registry already initialized"),
            DeviceError::ReadFailure { line } => write!(f, "Failed to read line {}", line.0),
        }
    }
}

impl fmt::Display for AnalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalogError::InvalidChannel(id) => write!(f, "No current sensor with id {}", id),
            AnalogError::InitFailure { channel } => {
                write!(f, "ADC could not be armed for channel {}", channel.0)
            }
            AnalogError::ReadFailure { channel } => {
                write!(f, "ADC read failed on channel {}", channel.0)
            }
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<DeviceError> for Error {
    fn from(e: DeviceError) -> Self {
        Error::Device(e)
    }
}

impl From<AnalogError> for Error {
    fn from(e: AnalogError) -> Self {
        Error::Analog(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for DeviceError {}

#[cfg(feature = "std")]
impl std::error::Error for AnalogError {}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Config(e) => defmt::write!(f, "Config({})", e),
            Error::Device(e) => defmt::write!(f, "Device({})", e),
            Error::Analog(e) => defmt::write!(f, "Analog({})", e),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ConfigError::ParseError(msg) => defmt::write!(f, "ParseError({})", msg.as_str()),
            ConfigError::InvalidDebounceWindow(ms) => defmt::write!(f, "InvalidDebounceWindow({})", ms),
            ConfigError::InvalidSpeedWindow(ms) => defmt::write!(f, "InvalidSpeedWindow({})", ms),
            ConfigError::DuplicateName(name) => defmt::write!(f, "DuplicateName({})", name.as_str()),
            ConfigError::SharedEncoderLines { name, line } => {
                defmt::write!(f, "SharedEncoderLines({}, {})", name.as_str(), line.0)
            }
            ConfigError::InvalidRange(name) => defmt::write!(f, "InvalidRange({})", name.as_str()),
            ConfigError::InvalidSensitivity(v) => defmt::write!(f, "InvalidSensitivity({})", v),
            ConfigError::InvalidSmoothing(v) => defmt::write!(f, "InvalidSmoothing({})", v),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => defmt::write!(f, "IoError({})", msg.as_str()),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DeviceError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            DeviceError::InvalidArgument => defmt::write!(f, "InvalidArgument"),
            DeviceError::CapacityExceeded { requested, capacity } => {
                defmt::write!(f, "CapacityExceeded({}/{})", requested, capacity)
            }
            DeviceError::InvalidDescriptor { line } => defmt::write!(f, "InvalidDescriptor({})", line.0),
            DeviceError::InitFailure { line } => defmt::write!(f, "InitFailure({})", line.0),
            DeviceError::InvalidId(id) => defmt::write!(f, "InvalidId({})", id),
            DeviceError::AlreadyInitialized => defmt::write!(f, "AlreadyInitialized"),
            DeviceError::ReadFailure { line } => defmt::write!(f, "ReadFailure({})", line.0),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for AnalogError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            AnalogError::InvalidChannel(id) => defmt::write!(f, "InvalidChannel({})", id),
            AnalogError::InitFailure { channel } => defmt::write!(f, "InitFailure({})", channel.0),
            AnalogError::ReadFailure { channel } => defmt::write!(f, "ReadFailure({})", channel.0),
        }
    }
}
