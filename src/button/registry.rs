//! Fixed-capacity button table and its public query surface.

use heapless::{Deque, String, Vec};

use crate::backend::{Clock, DigitalInput};
use crate::config::units::{Line, Micros, Millis};
use crate::config::{ButtonConfig, Polarity, SystemConfig};
use crate::error::{DeviceError, Error, Result};

use super::debounce::Debouncer;
use super::event::{ButtonEvent, ButtonState};

/// Number of unread events kept before new ones are dropped.
pub const EVENT_QUEUE_DEPTH: usize = 8;

const DEFAULT_DEBOUNCE: Millis = Millis(20);

#[derive(Debug, Clone)]
struct ButtonSlot {
    name: String<16>,
    line: Line,
    polarity: Polarity,
    debouncer: Debouncer,
    pressed_at: Option<Micros>,
    press_latched: bool,
}

impl ButtonSlot {
    fn new(config: &ButtonConfig, window: Micros) -> Self {
        Self {
            name: config.name.clone(),
            line: config.line,
            polarity: config.polarity,
            debouncer: Debouncer::new(window),
            pressed_at: None,
            press_latched: false,
        }
    }

    fn commit(&mut self, id: usize, state: ButtonState, now: Micros) -> ButtonEvent {
        let pressed_duration = match state {
            ButtonState::Pressed => {
                self.pressed_at = Some(now);
                self.press_latched = true;
                None
            }
            ButtonState::Released => self.pressed_at.take().map(|t| now.since(t)),
        };

        ButtonEvent {
            id,
            state,
            at: now,
            pressed_duration,
        }
    }
}

/// Registry owning up to `N` debounced buttons.
///
/// Ids are assigned `0..count` in descriptor order at [`init`](Self::init)
/// and never change afterwards.
///
/// # Example
///
/// ```rust,ignore
/// use device_hal::{ButtonConfig, ButtonRegistry, Line};
///
/// let mut buttons: ButtonRegistry<_, _, 4> = ButtonRegistry::new(lines, clock);
/// buttons.init(3, &[
///     ButtonConfig::new("a", Line(17)),
///     ButtonConfig::new("b", Line(27)),
///     ButtonConfig::new("c", Line(22)),
/// ])?;
///
/// // From a 10 ms timer
/// buttons.sample_tick()?;
///
/// if buttons.pressed(0)? { /* ... */ }
/// ```
pub struct ButtonRegistry<L, C, const N: usize> {
    lines: L,
    clock: C,
    buttons: Vec<ButtonSlot, N>,
    events: Deque<ButtonEvent, EVENT_QUEUE_DEPTH>,
    window: Micros,
    initialized: bool,
    dropped_events: u32,
}

impl<L, C, const N: usize> ButtonRegistry<L, C, N>
where
    L: DigitalInput,
    C: Clock,
{
    /// Create an empty registry with a 20 ms debounce window.
    pub fn new(lines: L, clock: C) -> Self {
        Self {
            lines,
            clock,
            buttons: Vec::new(),
            events: Deque::new(),
            window: DEFAULT_DEBOUNCE.to_micros(),
            initialized: false,
            dropped_events: 0,
        }
    }

    /// Set the debounce window used by [`init`](Self::init).
    pub fn with_debounce(mut self, window: Millis) -> Self {
        self.window = window.to_micros();
        self
    }

    /// Register buttons.
    ///
    /// `max_info` is the number of buttons the caller intends to register;
    /// `descriptors` may not exceed it. Returns the number of buttons
    /// registered.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `max_info` is 0
    /// - `CapacityExceeded` if `max_info > N` or more descriptors than `max_info`
    /// - `InvalidDescriptor` if the backend cannot arm a line
    /// - `AlreadyInitialized` on a second call
    pub fn init(&mut self, max_info: usize, descriptors: &[ButtonConfig]) -> Result<usize> {
        if self.initialized {
            #[cfg(feature = "defmt")]
            defmt::warn!("button registry already initialized");
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

        // Arm every line before touching the table so a failure leaves it empty
        for descriptor in descriptors {
            self.lines.configure(descriptor.line).map_err(|_e| {
                #[cfg(feature = "defmt")]
                defmt::error!("button line {} unavailable", descriptor.line.0);
                Error::Device(DeviceError::InvalidDescriptor {
                    line: descriptor.line,
                })
            })?;
        }

        for descriptor in descriptors {
            self.buttons
                .push(ButtonSlot::new(descriptor, self.window))
                .map_err(|_| {
                    Error::Device(DeviceError::CapacityExceeded {
                        requested: descriptors.len(),
                        capacity: N,
                    })
                })?;
        }

        self.initialized = true;

        #[cfg(feature = "defmt")]
        defmt::info!("{} buttons registered", self.buttons.len());

        Ok(self.buttons.len())
    }

    /// Register the buttons of a configuration, using its debounce window.
    ///
    /// The window is kept unchanged if registration fails.
    pub fn init_from_config(&mut self, config: &SystemConfig) -> Result<usize> {
        let previous = self.window;
        self.window = config.timing.debounce.to_micros();
        self.init(N, &config.buttons).map_err(|e| {
            self.window = previous;
            e
        })
    }

    /// Sample every button once.
    ///
    /// Call at a fixed interval (1-10 ms) or on every raw edge interrupt.
    ///
    /// # Errors
    ///
    /// Returns `ReadFailure` if the backend cannot read a line; buttons
    /// before it in the table have already been sampled.
    pub fn sample_tick(&mut self) -> Result<()> {
        let now = self.clock.now();

        for (id, slot) in self.buttons.iter_mut().enumerate() {
            let level = self
                .lines
                .read(slot.line)
                .map_err(|_| Error::Device(DeviceError::ReadFailure { line: slot.line }))?;

            if let Some(state) = slot.debouncer.sample(slot.polarity.is_active(level), now) {
                #[cfg(feature = "defmt")]
                defmt::debug!("button {} {}", id, state);

                let event = slot.commit(id, state, now);
                if self.events.push_back(event).is_err() {
                    self.dropped_events = self.dropped_events.saturating_add(1);
                    #[cfg(feature = "defmt")]
                    defmt::warn!("button event queue full, dropped {}", event);
                }
            }
        }

        Ok(())
    }

    /// Committed state of button `id`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidId` for an unregistered id.
    pub fn pressed(&self, id: usize) -> Result<bool> {
        Ok(self.slot(id)?.debouncer.is_pressed())
    }

    /// Alias of [`pressed`](Self::pressed).
    #[inline]
    pub fn is_pressed(&self, id: usize) -> Result<bool> {
        self.pressed(id)
    }

    /// Committed state of button `id` as a [`ButtonState`].
    pub fn state(&self, id: usize) -> Result<ButtonState> {
        Ok(self.slot(id)?.debouncer.state())
    }

    /// Whether button `id` was pressed since the last call; clears the flag.
    pub fn take_press(&mut self, id: usize) -> Result<bool> {
        let slot = self
            .buttons
            .get_mut(id)
            .ok_or(Error::Device(DeviceError::InvalidId(id)))?;
        Ok(core::mem::take(&mut slot.press_latched))
    }

    /// Oldest unread transition.
    pub fn next_event(&mut self) -> Option<ButtonEvent> {
        self.events.pop_front()
    }

    /// Time of the last committed transition of button `id`.
    pub fn last_transition(&self, id: usize) -> Result<Option<Micros>> {
        Ok(self.slot(id)?.debouncer.last_transition())
    }

    /// Name of button `id`.
    pub fn name(&self, id: usize) -> Result<&str> {
        Ok(self.slot(id)?.name.as_str())
    }

    /// Id of the button called `name`.
    pub fn id_of(&self, name: &str) -> Option<usize> {
        self.buttons.iter().position(|b| b.name.as_str() == name)
    }

    /// Number of registered buttons.
    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    /// Check if no button is registered.
    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    /// Whether [`init`](Self::init) has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Debounce window in use.
    pub fn debounce_window(&self) -> Micros {
        self.window
    }

    /// Events lost to a full queue since start.
    pub fn dropped_events(&self) -> u32 {
        self.dropped_events
    }

    fn slot(&self, id: usize) -> Result<&ButtonSlot> {
        self.buttons
            .get(id)
            .ok_or(Error::Device(DeviceError::InvalidId(id)))
    }
}
