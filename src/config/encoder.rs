//! Quadrature encoder descriptors.

use heapless::String;
use serde::Deserialize;

use super::units::Line;

/// One encoder descriptor: a pair of phase lines.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EncoderConfig {
    /// Human-readable name (max 16 chars).
    pub name: String<16>,

    /// Phase A line.
    pub line_a: Line,

    /// Phase B line.
    pub line_b: Line,

    /// Count the other way round (A and B swapped in the wiring).
    #[serde(default)]
    pub reverse: bool,

    /// Wrap the reported position into `[0, range)`; unbounded when absent.
    #[serde(default)]
    pub range: Option<u32>,
}

impl EncoderConfig {
    /// Unbounded encoder on lines `a` and `b`.
    pub fn new(name: &str, line_a: Line, line_b: Line) -> Self {
        Self {
            name: super::device_name(name),
            line_a,
            line_b,
            reverse: false,
            range: None,
        }
    }

    /// Invert the counting direction.
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Wrap position into `[0, range)`.
    pub fn range(mut self, range: u32) -> Self {
        self.range = Some(range);
        self
    }
}
