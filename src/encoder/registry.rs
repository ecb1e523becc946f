//! Encoder table: accumulated position, speed estimate and per-encoder
//! housekeeping.

use heapless::{HistoryBuffer, String, Vec};

use crate::backend::{Clock, DigitalInput};
use crate::config::units::{Line, Micros, Millis};
use crate::config::{validate_encoder, EncoderConfig, SystemConfig};
use crate::error::{DeviceError, Error, Result};

use super::quadrature::QuadratureDecoder;

/// Samples kept per encoder for speed estimation.
///
/// The effective speed window is the shorter of the configured window and
/// this many samples.
pub const HISTORY_DEPTH: usize = 64;

const DEFAULT_SPEED_WINDOW: Millis = Millis(100);

/// Interval over which [`EncoderRegistry::poll_rate`] is measured.
const POLL_RATE_INTERVAL: Micros = Micros(1_000_000);

/// Snapshot of one encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderReading {
    /// Counts since the last position reset, wrapped if a range is set.
    pub position: i32,
    /// Counts per second, positive clockwise.
    pub speed: i32,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    count: i64,
    at: Micros,
}

#[derive(Debug, Clone)]
struct EncoderSlot {
    name: String<16>,
    line_a: Line,
    line_b: Line,
    reverse: bool,
    range: Option<u32>,
    decoder: QuadratureDecoder,
    count: i64,
    offset: i64,
    speed: i32,
    last_update: Option<Micros>,
    history: HistoryBuffer<Sample, HISTORY_DEPTH>,
    enabled: bool,
}

impl EncoderSlot {
    fn new(config: &EncoderConfig) -> Self {
        Self {
            name: config.name.clone(),
            line_a: config.line_a,
            line_b: config.line_b,
            reverse: config.reverse,
            range: config.range,
            decoder: QuadratureDecoder::new(),
            count: 0,
            offset: 0,
            speed: 0,
            last_update: None,
            history: HistoryBuffer::new(),
            enabled: true,
        }
    }

    /// Decode one A/B observation taken at `now` and refresh the speed.
    fn update(&mut self, a: bool, b: bool, now: Micros, window: Micros) -> i8 {
        #[cfg(feature = "defmt")]
        let glitches = self.decoder.glitches();
        let mut step = self.decoder.decode(a, b);
        if self.reverse {
            step = -step;
        }

        #[cfg(feature = "defmt")]
        if self.decoder.glitches() != glitches {
            defmt::warn!("encoder {} skipped a phase", self.name.as_str());
        }

        self.count += i64::from(step);
        self.speed = self.speed_at(now, window);
        self.history.write(Sample {
            count: self.count,
            at: now,
        });
        self.last_update = Some(now);

        step
    }

    fn speed_at(&self, now: Micros, window: Micros) -> i32 {
        let reference = self
            .history
            .oldest_ordered()
            .find(|s| now.since(s.at) <= window)
            .or_else(|| self.history.recent());

        let Some(reference) = reference else {
            return 0;
        };

        let elapsed = now.since(reference.at).value();
        if elapsed == 0 {
            return 0;
        }

        let counts_per_sec =
            (self.count - reference.count).saturating_mul(1_000_000) / elapsed as i64;
        counts_per_sec.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }

    fn position(&self) -> i32 {
        let relative = self.count - self.offset;
        match self.range {
            Some(range) => relative.rem_euclid(i64::from(range)) as i32,
            None => relative as i32,
        }
    }

    fn reading(&self) -> EncoderReading {
        EncoderReading {
            position: self.position(),
            speed: self.speed,
        }
    }

    fn rebaseline(&mut self) {
        self.decoder.reset();
        self.history = HistoryBuffer::new();
        self.speed = 0;
    }
}

/// Registry owning up to `N` quadrature encoders.
///
/// Every observation, whether from [`get`](Self::get),
/// [`sample_tick`](Self::sample_tick) or [`decode`](Self::decode), goes
/// through the same update: decode, accumulate, refresh speed, stamp time.
/// Polling must be fast enough to see every phase; a skipped phase is
/// counted in [`errors`](Self::errors) and the step is lost.
///
/// # Example
///
/// ```rust,ignore
/// use device_hal::{EncoderConfig, EncoderRegistry, Line};
///
/// let mut encoders: EncoderRegistry<_, _, 2> = EncoderRegistry::new(lines, clock);
/// encoders.init(&[EncoderConfig::new("knob", Line(5), Line(6)).range(96)])?;
///
/// let reading = encoders.get(0)?;
/// ```
pub struct EncoderRegistry<L, C, const N: usize> {
    lines: L,
    clock: C,
    encoders: Vec<EncoderSlot, N>,
    speed_window: Micros,
    initialized: bool,
    ticks: u32,
    rate_window_start: Option<Micros>,
    poll_rate: u32,
}

impl<L, C, const N: usize> EncoderRegistry<L, C, N>
where
    L: DigitalInput,
    C: Clock,
{
    /// Create an empty registry with a 100 ms speed window.
    pub fn new(lines: L, clock: C) -> Self {
        Self {
            lines,
            clock,
            encoders: Vec::new(),
            speed_window: DEFAULT_SPEED_WINDOW.to_micros(),
            initialized: false,
            ticks: 0,
            rate_window_start: None,
            poll_rate: 0,
        }
    }

    /// Set the speed estimation window.
    pub fn with_speed_window(mut self, window: Millis) -> Self {
        self.speed_window = window.to_micros();
        self
    }

    /// Register encoders; ids are `0..count` in descriptor order.
    ///
    /// All encoders start enabled with an unknown phase, so the first
    /// observation of each is a baseline.
    ///
    /// # Errors
    ///
    /// - `CapacityExceeded` if there are more than `N` descriptors
    /// - `SharedEncoderLines` or `InvalidRange` for a malformed descriptor
    /// - `InitFailure` if the backend cannot arm a line
    /// - `AlreadyInitialized` on a second call
    pub fn init(&mut self, descriptors: &[EncoderConfig]) -> Result<usize> {
        if self.initialized {
            #[cfg(feature = "defmt")]
            defmt::warn!("encoder registry already initialized");
            return Err(Error::Device(DeviceError::AlreadyInitialized));
        }

        if descriptors.len() > N {
            return Err(Error::Device(DeviceError::CapacityExceeded {
                requested: descriptors.len(),
                capacity: N,
            }));
        }

        for descriptor in descriptors {
            validate_encoder(descriptor)?;
        }

        for descriptor in descriptors {
            for line in [descriptor.line_a, descriptor.line_b] {
                self.lines.configure(line).map_err(|_e| {
                    #[cfg(feature = "defmt")]
                    defmt::error!("encoder line {} could not be armed", line.0);
                    Error::Device(DeviceError::InitFailure { line })
                })?;
            }
        }

        for descriptor in descriptors {
            self.encoders
                .push(EncoderSlot::new(descriptor))
                .map_err(|_| {
                    Error::Device(DeviceError::CapacityExceeded {
                        requested: descriptors.len(),
                        capacity: N,
                    })
                })?;
        }

        self.initialized = true;

        #[cfg(feature = "defmt")]
        defmt::info!("{} encoders registered", self.encoders.len());

        Ok(self.encoders.len())
    }

    /// Register the encoders of a configuration, using its speed window.
    ///
    /// The window is kept unchanged if registration fails.
    pub fn init_from_config(&mut self, config: &SystemConfig) -> Result<usize> {
        let count = self.init(&config.encoders)?;
        self.speed_window = config.timing.speed_window.to_micros();
        Ok(count)
    }

    /// Feed channel levels captured elsewhere (e.g. in an edge interrupt)
    /// into encoder `id`. Returns the position step.
    ///
    /// A disabled encoder ignores the levels and returns 0.
    pub fn decode(&mut self, id: usize, a: bool, b: bool) -> Result<i8> {
        let now = self.clock.now();
        let window = self.speed_window;
        let slot = self.slot_mut(id)?;
        if !slot.enabled {
            return Ok(0);
        }
        Ok(slot.update(a, b, now, window))
    }

    /// Sample encoder `id` and return its position and speed.
    ///
    /// A disabled encoder is not sampled; its last reading is returned.
    ///
    /// # Errors
    ///
    /// - `InvalidId` for an unregistered id
    /// - `ReadFailure` if the backend cannot read a line
    pub fn get(&mut self, id: usize) -> Result<EncoderReading> {
        let now = self.clock.now();
        let window = self.speed_window;
        let slot = self
            .encoders
            .get_mut(id)
            .ok_or(Error::Device(DeviceError::InvalidId(id)))?;

        if slot.enabled {
            let (a, b) = read_pair(&mut self.lines, slot.line_a, slot.line_b)?;
            slot.update(a, b, now, window);
        }

        Ok(slot.reading())
    }

    /// Sample every enabled encoder once.
    ///
    /// Call from a timer at a rate at least twice the fastest edge rate.
    pub fn sample_tick(&mut self) -> Result<()> {
        let now = self.clock.now();
        let window = self.speed_window;
        let mut sampled = false;

        for slot in self.encoders.iter_mut().filter(|s| s.enabled) {
            let (a, b) = read_pair(&mut self.lines, slot.line_a, slot.line_b)?;
            slot.update(a, b, now, window);
            sampled = true;
        }

        if sampled {
            self.count_tick(now);
        } else {
            self.rate_window_start = None;
            self.poll_rate = 0;
        }

        Ok(())
    }

    /// Last position and speed of encoder `id`, without sampling.
    pub fn reading(&self, id: usize) -> Result<EncoderReading> {
        Ok(self.slot(id)?.reading())
    }

    /// Make the current position of encoder `id` read as zero.
    pub fn reset_position(&mut self, id: usize) -> Result<()> {
        let slot = self.slot_mut(id)?;
        slot.offset = slot.count;
        Ok(())
    }

    /// Skipped-phase transitions seen on encoder `id`.
    pub fn errors(&self, id: usize) -> Result<u32> {
        Ok(self.slot(id)?.decoder.glitches())
    }

    /// Resume sampling encoder `id`; the next observation is a baseline.
    pub fn enable(&mut self, id: usize) -> Result<()> {
        let slot = self.slot_mut(id)?;
        if !slot.enabled {
            slot.enabled = true;
            slot.rebaseline();
        }
        Ok(())
    }

    /// Stop sampling encoder `id`. Position is kept.
    pub fn disable(&mut self, id: usize) -> Result<()> {
        self.slot_mut(id)?.enabled = false;
        Ok(())
    }

    /// Whether encoder `id` is sampled.
    pub fn is_enabled(&self, id: usize) -> Result<bool> {
        Ok(self.slot(id)?.enabled)
    }

    /// Time of the last observation of encoder `id`.
    pub fn last_update(&self, id: usize) -> Result<Option<Micros>> {
        Ok(self.slot(id)?.last_update)
    }

    /// Measured [`sample_tick`](Self::sample_tick) calls per second.
    ///
    /// Refreshed about once a second; 0 until the first interval completes
    /// or while no encoder is enabled.
    pub fn poll_rate(&self) -> u32 {
        self.poll_rate
    }

    /// Name of encoder `id`.
    pub fn name(&self, id: usize) -> Result<&str> {
        Ok(self.slot(id)?.name.as_str())
    }

    /// Id of the encoder called `name`.
    pub fn id_of(&self, name: &str) -> Option<usize> {
        self.encoders.iter().position(|e| e.name.as_str() == name)
    }

    /// Number of registered encoders.
    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    /// Check if no encoder is registered.
    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }

    /// Whether [`init`](Self::init) has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Speed estimation window in use.
    pub fn speed_window(&self) -> Micros {
        self.speed_window
    }

    fn count_tick(&mut self, now: Micros) {
        let Some(start) = self.rate_window_start else {
            self.rate_window_start = Some(now);
            self.ticks = 0;
            return;
        };

        self.ticks = self.ticks.saturating_add(1);
        let elapsed = now.since(start);
        if elapsed >= POLL_RATE_INTERVAL {
            self.poll_rate = (u64::from(self.ticks) * 1_000_000 / elapsed.value()) as u32;
            self.ticks = 0;
            self.rate_window_start = Some(now);
        }
    }

    fn slot(&self, id: usize) -> Result<&EncoderSlot> {
        self.encoders
            .get(id)
            .ok_or(Error::Device(DeviceError::InvalidId(id)))
    }

    fn slot_mut(&mut self, id: usize) -> Result<&mut EncoderSlot> {
        self.encoders
            .get_mut(id)
            .ok_or(Error::Device(DeviceError::InvalidId(id)))
    }
}

fn read_pair<L: DigitalInput>(lines: &mut L, a: Line, b: Line) -> Result<(bool, bool)> {
    let level_a = lines
        .read(a)
        .map_err(|_| Error::Device(DeviceError::ReadFailure { line: a }))?;
    let level_b = lines
        .read(b)
        .map_err(|_| Error::Device(DeviceError::ReadFailure { line: b }))?;
    Ok((level_a, level_b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::sim::{SimClock, SimLines};
    use crate::error::ConfigError;

    type Registry = EncoderRegistry<SimLines, SimClock, 2>;

    const A: Line = Line(5);
    const B: Line = Line(6);

    fn setup(config: EncoderConfig) -> (Registry, SimLines, SimClock) {
        let lines = SimLines::new(16);
        let clock = SimClock::new();
        let mut registry = Registry::new(lines.clone(), clock.clone());
        registry
            .init(&[config, EncoderConfig::new("aux", Line(7), Line(8))])
            .unwrap();
        (registry, lines, clock)
    }

    fn knob() -> EncoderConfig {
        EncoderConfig::new("knob", A, B)
    }

    fn step_to(
        registry: &mut Registry,
        lines: &SimLines,
        clock: &SimClock,
        phase: u8,
    ) -> EncoderReading {
        clock.advance_ms(1);
        lines.set_phase(A, B, phase);
        registry.get(0).unwrap()
    }

    #[test]
    fn test_clockwise_decode_path() {
        let (mut registry, _, _) = setup(knob());
        let steps: [i8; 5] = [0b00, 0b01, 0b11, 0b10, 0b00]
            .map(|p| registry.decode(0, p & 0b10 != 0, p & 0b01 != 0).unwrap());
        assert_eq!(steps, [0, 1, 1, 1, 1]);
        assert_eq!(registry.reading(0).unwrap().position, 4);
    }

    #[test]
    fn test_get_accumulates_and_measures_speed() {
        let (mut registry, lines, clock) = setup(knob());
        lines.set_phase(A, B, 0b00);
        assert_eq!(registry.get(0).unwrap(), EncoderReading::default());

        let reading = step_to(&mut registry, &lines, &clock, 0b01);
        assert_eq!(reading, EncoderReading { position: 1, speed: 1_000 });

        let reading = step_to(&mut registry, &lines, &clock, 0b11);
        assert_eq!(reading, EncoderReading { position: 2, speed: 1_000 });
        assert_eq!(registry.last_update(0).unwrap(), Some(Micros(2_000)));
    }

    #[test]
    fn test_zero_elapsed_gives_zero_speed() {
        let (mut registry, lines, _) = setup(knob());
        lines.set_phase(A, B, 0b00);
        registry.get(0).unwrap();
        lines.set_phase(A, B, 0b01);
        let reading = registry.get(0).unwrap();
        assert_eq!(reading, EncoderReading { position: 1, speed: 0 });
    }

    #[test]
    fn test_speed_decays_when_idle() {
        let (mut registry, lines, clock) = setup(knob());
        lines.set_phase(A, B, 0b00);
        registry.get(0).unwrap();
        step_to(&mut registry, &lines, &clock, 0b01);

        clock.advance_ms(500);
        let reading = registry.get(0).unwrap();
        assert_eq!(reading, EncoderReading { position: 1, speed: 0 });
    }

    #[test]
    fn test_reverse_flips_direction() {
        let (mut registry, lines, clock) = setup(knob().reverse(true));
        lines.set_phase(A, B, 0b00);
        registry.get(0).unwrap();
        step_to(&mut registry, &lines, &clock, 0b01);
        let reading = step_to(&mut registry, &lines, &clock, 0b11);
        assert_eq!(reading, EncoderReading { position: -2, speed: -1_000 });
    }

    #[test]
    fn test_range_wraps_position() {
        let (mut registry, lines, clock) = setup(knob().range(4));
        lines.set_phase(A, B, 0b00);
        registry.get(0).unwrap();
        // One step counter-clockwise from zero
        let reading = step_to(&mut registry, &lines, &clock, 0b10);
        assert_eq!(reading.position, 3);
        for phase in [0b00, 0b01, 0b11, 0b10, 0b00] {
            step_to(&mut registry, &lines, &clock, phase);
        }
        assert_eq!(registry.reading(0).unwrap().position, 0);
    }

    #[test]
    fn test_reset_position() {
        let (mut registry, lines, clock) = setup(knob());
        lines.set_phase(A, B, 0b00);
        registry.get(0).unwrap();
        step_to(&mut registry, &lines, &clock, 0b01);
        step_to(&mut registry, &lines, &clock, 0b11);

        registry.reset_position(0).unwrap();
        assert_eq!(registry.reading(0).unwrap().position, 0);
        let reading = step_to(&mut registry, &lines, &clock, 0b10);
        assert_eq!(reading.position, 1);
    }

    #[test]
    fn test_glitch_counted_not_accumulated() {
        let (mut registry, lines, clock) = setup(knob());
        lines.set_phase(A, B, 0b00);
        registry.get(0).unwrap();
        let reading = step_to(&mut registry, &lines, &clock, 0b11);
        assert_eq!(reading.position, 0);
        assert_eq!(registry.errors(0), Ok(1));
        assert_eq!(registry.errors(1), Ok(0));
    }

    #[test]
    fn test_disable_and_rebaseline() {
        let (mut registry, lines, clock) = setup(knob());
        lines.set_phase(A, B, 0b00);
        registry.get(0).unwrap();
        step_to(&mut registry, &lines, &clock, 0b01);

        registry.disable(0).unwrap();
        assert_eq!(registry.is_enabled(0), Ok(false));
        // Moves while disabled are not seen
        let reading = step_to(&mut registry, &lines, &clock, 0b10);
        assert_eq!(reading.position, 1);
        assert_eq!(registry.decode(0, true, true), Ok(0));

        registry.enable(0).unwrap();
        let reading = registry.get(0).unwrap();
        assert_eq!(reading, EncoderReading { position: 1, speed: 0 });
        assert_eq!(registry.errors(0), Ok(0));
    }

    #[test]
    fn test_invalid_id() {
        let (mut registry, _, _) = setup(knob());
        assert_eq!(registry.get(2), Err(Error::Device(DeviceError::InvalidId(2))));
        assert_eq!(registry.reading(9), Err(Error::Device(DeviceError::InvalidId(9))));
        assert!(registry.decode(2, false, false).is_err());
        assert!(registry.reset_position(2).is_err());
    }

    #[test]
    fn test_init_failure_and_reinit() {
        let mut registry = Registry::new(SimLines::new(8), SimClock::new());
        assert_eq!(
            registry.init(&[EncoderConfig::new("far", Line(3), Line(12))]),
            Err(Error::Device(DeviceError::InitFailure { line: Line(12) }))
        );
        assert!(registry.is_empty());

        assert_eq!(registry.init(&[knob()]), Ok(1));
        assert_eq!(
            registry.init(&[knob()]),
            Err(Error::Device(DeviceError::AlreadyInitialized))
        );
    }

    #[test]
    fn test_init_rejects_zero_range() {
        let mut registry = Registry::new(SimLines::new(8), SimClock::new());
        assert!(matches!(
            registry.init(&[knob().range(0)]),
            Err(Error::Config(ConfigError::InvalidRange(_)))
        ));
        assert!(registry.is_empty());
        assert!(!registry.is_initialized());
        assert!(matches!(registry.get(0), Err(Error::Device(DeviceError::InvalidId(0)))));
    }

    #[test]
    fn test_init_rejects_oversized_range() {
        let mut registry = Registry::new(SimLines::new(8), SimClock::new());
        assert!(matches!(
            registry.init(&[knob().range(u32::MAX)]),
            Err(Error::Config(ConfigError::InvalidRange(_)))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_init_rejects_shared_lines() {
        let lines = SimLines::new(8);
        let mut registry = Registry::new(lines.clone(), SimClock::new());
        assert_eq!(
            registry.init(&[knob(), EncoderConfig::new("bad", Line(2), Line(2))]),
            Err(Error::Config(ConfigError::SharedEncoderLines {
                name: String::try_from("bad").unwrap(),
                line: Line(2),
            }))
        );
        assert!(registry.is_empty());

        // Nothing was committed, so a corrected list still registers
        assert_eq!(registry.init(&[knob()]), Ok(1));
    }

    #[test]
    fn test_rejected_reinit_keeps_speed_window() {
        let (mut registry, _, _) = setup(knob());
        let mut config = SystemConfig::default();
        config.timing.speed_window = Millis(500);

        assert_eq!(
            registry.init_from_config(&config),
            Err(Error::Device(DeviceError::AlreadyInitialized))
        );
        assert_eq!(registry.speed_window(), Micros(100_000));
    }

    #[test]
    fn test_init_from_config_applies_speed_window() {
        let mut registry = Registry::new(SimLines::new(16), SimClock::new());
        let mut config = SystemConfig::default();
        config.timing.speed_window = Millis(250);
        config.encoders.push(knob()).unwrap();

        assert_eq!(registry.init_from_config(&config), Ok(1));
        assert_eq!(registry.speed_window(), Micros(250_000));
    }

    #[test]
    fn test_capacity_exceeded() {
        let mut registry = Registry::new(SimLines::new(16), SimClock::new());
        let descriptors = [
            EncoderConfig::new("a", Line(0), Line(1)),
            EncoderConfig::new("b", Line(2), Line(3)),
            EncoderConfig::new("c", Line(4), Line(5)),
        ];
        assert!(matches!(
            registry.init(&descriptors),
            Err(Error::Device(DeviceError::CapacityExceeded { requested: 3, capacity: 2 }))
        ));
    }

    #[test]
    fn test_read_failure() {
        let (mut registry, lines, _) = setup(knob());
        lines.break_line(B);
        assert_eq!(
            registry.get(0),
            Err(Error::Device(DeviceError::ReadFailure { line: B }))
        );
    }

    #[test]
    fn test_poll_rate() {
        let (mut registry, _, clock) = setup(knob());
        for _ in 0..1_000 {
            clock.advance_ms(1);
            registry.sample_tick().unwrap();
        }
        assert_eq!(registry.poll_rate(), 0);

        clock.advance_ms(1);
        registry.sample_tick().unwrap();
        assert_eq!(registry.poll_rate(), 1_000);

        registry.disable(0).unwrap();
        registry.disable(1).unwrap();
        registry.sample_tick().unwrap();
        assert_eq!(registry.poll_rate(), 0);
    }
}
