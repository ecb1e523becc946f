//! Table-driven quadrature state machine.

/// Marks a transition that skipped a phase.
const GLITCH: i8 = 2;

/// Step for `[previous phase][new phase]`, phase = `(A << 1) | B`.
///
/// Clockwise is 00 -> 01 -> 11 -> 10 -> 00.
const TRANSITIONS: [[i8; 4]; 4] = [
    // to:  00      01      10      11
    [0, 1, -1, GLITCH], // from 00
    [-1, 0, GLITCH, 1], // from 01
    [1, GLITCH, 0, -1], // from 10
    [GLITCH, -1, 1, 0], // from 11
];

/// Pack two channel levels into a 2-bit phase.
#[inline]
pub const fn phase_of(a: bool, b: bool) -> u8 {
    ((a as u8) << 1) | (b as u8)
}

/// Quadrature decoder for one encoder.
///
/// The caller must sample at least twice as fast as the fastest expected
/// edge rate; a missed phase shows up as a glitch and the step is lost.
#[derive(Debug, Clone, Default)]
pub struct QuadratureDecoder {
    phase: Option<u8>,
    glitches: u32,
}

impl QuadratureDecoder {
    /// Decoder with no phase memory.
    pub const fn new() -> Self {
        Self {
            phase: None,
            glitches: 0,
        }
    }

    /// Forget the stored phase; the next sample becomes the baseline.
    pub fn reset(&mut self) {
        self.phase = None;
    }

    /// Feed the current channel levels and get the position step.
    ///
    /// Returns +1 or -1 for a move to an adjacent phase and 0 for no change,
    /// for the baseline sample and for a glitch (both channels changed). The
    /// new phase is always stored.
    pub fn decode(&mut self, a: bool, b: bool) -> i8 {
        let new = phase_of(a, b);
        let Some(previous) = self.phase.replace(new) else {
            return 0;
        };

        match TRANSITIONS[previous as usize][new as usize] {
            GLITCH => {
                self.glitches = self.glitches.wrapping_add(1);
                0
            }
            step => step,
        }
    }

    /// Last stored phase.
    #[inline]
    pub fn phase(&self) -> Option<u8> {
        self.phase
    }

    /// Transitions rejected since construction.
    #[inline]
    pub fn glitches(&self) -> u32 {
        self.glitches
    }
}
