//! Calibrated current readings over an analog backend.

use heapless::{String, Vec};

use crate::backend::AnalogInput;
use crate::config::units::{Amps, Channel, Volts};
use crate::config::{validate_current, CurrentConfig, SystemConfig};
use crate::error::{AnalogError, DeviceError, Error, Result};

#[derive(Debug, Clone)]
struct SensorSlot {
    name: String<16>,
    channel: Channel,
    zero_offset: Volts,
    volts_per_amp: f32,
    smoothing: f32,
    average: Amps,
}

impl SensorSlot {
    fn new(config: &CurrentConfig) -> Self {
        Self {
            name: config.name.clone(),
            channel: config.channel,
            zero_offset: config.zero_offset_volts,
            volts_per_amp: config.volts_per_amp,
            smoothing: config.smoothing,
            average: Amps(0.0),
        }
    }

    #[inline]
    fn to_amps(&self, volts: Volts) -> Amps {
        Amps((volts - self.zero_offset).value() / self.volts_per_amp)
    }

    fn accumulate(&mut self, sample: Amps) {
        let s = self.smoothing;
        self.average = Amps((1.0 - s) * self.average.value() + s * sample.value());
    }
}

/// Up to `N` current sensors read through one ADC backend.
///
/// [`read`](Self::read) converts a fresh sample; [`sample_tick`](Self::sample_tick)
/// feeds an exponential moving average read back with
/// [`smoothed`](Self::smoothed). The average starts at 0 A.
pub struct CurrentSensors<A, const N: usize> {
    adc: A,
    sensors: Vec<SensorSlot, N>,
    initialized: bool,
}

impl<A, const N: usize> CurrentSensors<A, N>
where
    A: AnalogInput,
{
    /// Create an empty sensor table.
    pub fn new(adc: A) -> Self {
        Self {
            adc,
            sensors: Vec::new(),
            initialized: false,
        }
    }

    /// Register sensors; ids are `0..count` in descriptor order.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `max_info` is 0
    /// - `CapacityExceeded` if `max_info > N` or more descriptors than `max_info`
    /// - `InvalidSensitivity` or `InvalidSmoothing` for an unusable calibration
    /// - `InitFailure` if the ADC cannot arm a channel
    /// - `AlreadyInitialized` on a second call
    pub fn init(&mut self, max_info: usize, descriptors: &[CurrentConfig]) -> Result<usize> {
        if self.initialized {
            #[cfg(feature = "defmt")]
            defmt::warn!("current sensors already initialized");
            return Err(Error::Device(DeviceError::AlreadyInitialized));
        }

        if max_info == 0 {
            return Err(Error::Device(DeviceError::InvalidArgument));
        }

        if max_info > N {
            return Err(Error::Device(DeviceError::CapacityExceeded {
                requested: max_info,
                capacity: N,
            }));
        }

        if descriptors.len() > max_info {
            return Err(Error::Device(DeviceError::CapacityExceeded {
                requested: descriptors.len(),
                capacity: max_info,
            }));
        }

        for descriptor in descriptors {
            validate_current(descriptor)?;
        }

        for descriptor in descriptors {
            let channel = descriptor.channel;
            self.adc.configure(channel).map_err(|_e| {
                #[cfg(feature = "defmt")]
                defmt::error!("ADC channel {} could not be armed", channel.0);
                Error::Analog(AnalogError::InitFailure { channel })
            })?;
        }

        for descriptor in descriptors {
            self.sensors.push(SensorSlot::new(descriptor)).map_err(|_| {
                Error::Device(DeviceError::CapacityExceeded {
                    requested: descriptors.len(),
                    capacity: N,
                })
            })?;
        }

        self.initialized = true;

        #[cfg(feature = "defmt")]
        defmt::info!("{} current sensors registered", self.sensors.len());

        Ok(self.sensors.len())
    }

    /// Register the current sensors of a configuration.
    pub fn init_from_config(&mut self, config: &SystemConfig) -> Result<usize> {
        self.init(N, &config.current_sensors)
    }

    /// Convert a fresh ADC sample from sensor `id`.
    ///
    /// # Errors
    ///
    /// - `InvalidChannel` for an unregistered id
    /// - `ReadFailure` if the conversion fails
    pub fn read(&mut self, id: usize) -> Result<Amps> {
        let slot = self
            .sensors
            .get(id)
            .ok_or(Error::Analog(AnalogError::InvalidChannel(id)))?;
        let volts = read_channel(&mut self.adc, slot.channel)?;
        Ok(slot.to_amps(volts))
    }

    /// Sample every sensor once and fold the result into its average.
    ///
    /// With the default smoothing of 0.025, a 20 ms tick settles in about
    /// two seconds.
    pub fn sample_tick(&mut self) -> Result<()> {
        for slot in self.sensors.iter_mut() {
            let volts = read_channel(&mut self.adc, slot.channel)?;
            let sample = slot.to_amps(volts);
            slot.accumulate(sample);
        }
        Ok(())
    }

    /// Smoothed current of sensor `id`.
    pub fn smoothed(&self, id: usize) -> Result<Amps> {
        Ok(self.slot(id)?.average)
    }

    /// Name of sensor `id`.
    pub fn name(&self, id: usize) -> Result<&str> {
        Ok(self.slot(id)?.name.as_str())
    }

    /// Id of the sensor called `name`.
    pub fn id_of(&self, name: &str) -> Option<usize> {
        self.sensors.iter().position(|s| s.name.as_str() == name)
    }

    /// Number of registered sensors.
    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    /// Check if no sensor is registered.
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Whether [`init`](Self::init) has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn slot(&self, id: usize) -> Result<&SensorSlot> {
        self.sensors
            .get(id)
            .ok_or(Error::Analog(AnalogError::InvalidChannel(id)))
    }
}

fn read_channel<A: AnalogInput>(adc: &mut A, channel: Channel) -> Result<Volts> {
    adc.read_volts(channel)
        .map_err(|_| Error::Analog(AnalogError::ReadFailure { channel }))
}
