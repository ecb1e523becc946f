//! Host simulation backend (std only).
//!
//! Every type is a cheap cloneable handle over shared state: hand one clone
//! to a registry and keep another to drive levels, voltages and time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::vec::Vec;

use crate::config::units::{Channel, Line, Micros, Millis, Volts};

use super::{AnalogInput, Clock, DigitalInput};

/// Failure injected into or detected by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    /// Line number beyond the simulated bank.
    NoSuchLine(Line),
    /// Channel number beyond the simulated ADC.
    NoSuchChannel(Channel),
    /// Line marked as failing with [`SimLines::break_line`].
    BrokenLine(Line),
    /// Channel marked as failing with [`SimAdc::break_channel`].
    BrokenChannel(Channel),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug)]
struct LineState {
    levels: Vec<bool>,
    broken: Vec<bool>,
}

/// Simulated bank of digital input lines.
///
/// Lines idle high, as with pull-up resistors.
#[derive(Debug, Clone)]
pub struct SimLines {
    state: Arc<Mutex<LineState>>,
}

impl SimLines {
    /// Bank of `count` lines, all high.
    pub fn new(count: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(LineState {
                levels: vec![true; count],
                broken: vec![false; count],
            })),
        }
    }

    /// Drive `line` high or low. Out of range lines are ignored.
    pub fn set(&self, line: Line, high: bool) {
        if let Some(level) = lock(&self.state).levels.get_mut(line.index()) {
            *level = high;
        }
    }

    /// Current level of `line`.
    pub fn level(&self, line: Line) -> Option<bool> {
        lock(&self.state).levels.get(line.index()).copied()
    }

    /// Drive an encoder's lines to a 2-bit phase (`A` is bit 1, `B` bit 0).
    pub fn set_phase(&self, a: Line, b: Line, phase: u8) {
        let mut state = lock(&self.state);
        if let Some(level) = state.levels.get_mut(a.index()) {
            *level = phase & 0b10 != 0;
        }
        if let Some(level) = state.levels.get_mut(b.index()) {
            *level = phase & 0b01 != 0;
        }
    }

    /// Make every later read of `line` fail.
    pub fn break_line(&self, line: Line) {
        if let Some(broken) = lock(&self.state).broken.get_mut(line.index()) {
            *broken = true;
        }
    }
}

impl DigitalInput for SimLines {
    type Error = SimError;

    fn configure(&mut self, line: Line) -> Result<(), Self::Error> {
        let state = lock(&self.state);
        match state.broken.get(line.index()) {
            None => Err(SimError::NoSuchLine(line)),
            Some(true) => Err(SimError::BrokenLine(line)),
            Some(false) => Ok(()),
        }
    }

    fn read(&mut self, line: Line) -> Result<bool, Self::Error> {
        let state = lock(&self.state);
        if state.broken.get(line.index()).copied().unwrap_or(false) {
            return Err(SimError::BrokenLine(line));
        }
        state
            .levels
            .get(line.index())
            .copied()
            .ok_or(SimError::NoSuchLine(line))
    }
}

#[derive(Debug)]
struct AdcState {
    volts: Vec<Volts>,
    broken: Vec<bool>,
}

/// Simulated ADC.
#[derive(Debug, Clone)]
pub struct SimAdc {
    state: Arc<Mutex<AdcState>>,
}

impl SimAdc {
    /// ADC with `count` channels, all reading 0 V.
    pub fn new(count: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(AdcState {
                volts: vec![Volts(0.0); count],
                broken: vec![false; count],
            })),
        }
    }

    /// Set the voltage seen on `channel`.
    pub fn set(&self, channel: Channel, volts: Volts) {
        if let Some(v) = lock(&self.state).volts.get_mut(channel.index()) {
            *v = volts;
        }
    }

    /// Make every later conversion of `channel` fail.
    pub fn break_channel(&self, channel: Channel) {
        if let Some(broken) = lock(&self.state).broken.get_mut(channel.index()) {
            *broken = true;
        }
    }
}

impl AnalogInput for SimAdc {
    type Error = SimError;

    fn configure(&mut self, channel: Channel) -> Result<(), Self::Error> {
        let state = lock(&self.state);
        match state.broken.get(channel.index()) {
            None => Err(SimError::NoSuchChannel(channel)),
            Some(true) => Err(SimError::BrokenChannel(channel)),
            Some(false) => Ok(()),
        }
    }

    fn read_volts(&mut self, channel: Channel) -> Result<Volts, Self::Error> {
        let state = lock(&self.state);
        if state.broken.get(channel.index()).copied().unwrap_or(false) {
            return Err(SimError::BrokenChannel(channel));
        }
        state
            .volts
            .get(channel.index())
            .copied()
            .ok_or(SimError::NoSuchChannel(channel))
    }
}

/// Manually advanced clock.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now_us: Arc<AtomicU64>,
}

impl SimClock {
    /// Clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Jump to an absolute time.
    pub fn set(&self, t: Micros) {
        self.now_us.store(t.0, Ordering::SeqCst);
    }

    /// Move forward by `dt`.
    pub fn advance(&self, dt: Micros) {
        self.now_us.fetch_add(dt.0, Ordering::SeqCst);
    }

    /// Move forward by `ms` milliseconds.
    pub fn advance_ms(&self, ms: u32) {
        self.advance(Millis(ms).to_micros());
    }

    /// Current simulated time.
    pub fn peek(&self) -> Micros {
        Micros(self.now_us.load(Ordering::SeqCst))
    }
}

impl Clock for SimClock {
    fn now(&mut self) -> Micros {
        self.peek()
    }
}
