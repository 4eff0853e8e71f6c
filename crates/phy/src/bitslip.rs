//! Bitslip aligner.
//!
//! Keeps the two most recent deserialized words side by side (older word in the low
//! half) and selects a word-wide window starting `rotation` transitions into that
//! history: `output[k] = history[rotation + k]`. With the rotation equal to the
//! deserializer's start-up skew the selected window is exactly one transmitted word,
//! and the end-to-end latency does not depend on the rotation.
//!
//! Rotation only moves through single-cycle pulses: increment (modulo the word width)
//! and reset to zero. A calibration routine steps it while reading back a known pattern.

use tracing::trace;

use crate::calibration::TapPulse;
use crate::common::DdrWord;

/// Bitslip aligner for one DQ pin.
#[derive(Debug, Clone)]
pub struct Bitslip {
    width: usize,
    rotation: u8,
    history: u16,
    selected: DdrWord,
    retimed: DdrWord,
}

impl Bitslip {
    /// Creates an aligner for `nphases` phases with zero rotation.
    pub const fn new(nphases: usize) -> Self {
        Self {
            width: DdrWord::width(nphases),
            rotation: 0,
            history: 0,
            selected: DdrWord::ZERO,
            retimed: DdrWord::ZERO,
        }
    }

    /// Current rotation in transitions.
    pub const fn rotation(&self) -> u8 {
        self.rotation
    }

    /// Window width; rotation wraps at this value.
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Applies a calibration pulse. Reset takes priority over increment.
    pub fn pulse(&mut self, pulse: TapPulse) {
        if pulse.reset {
            self.rotation = 0;
        } else if pulse.inc {
            self.rotation = ((usize::from(self.rotation) + 1) % self.width) as u8;
            trace!(rotation = self.rotation, "bitslip advanced");
        }
    }

    /// Pushes this cycle's deserialized word and returns the aligned word for this cycle.
    pub fn step(&mut self, word: DdrWord) -> DdrWord {
        let w = self.width;
        self.history = (self.history >> w) | (u16::from(word.0) << w);
        let window = (self.history >> self.rotation) as u8 & DdrWord::mask(w / 2);
        let out = self.retimed;
        self.retimed = self.selected;
        self.selected = DdrWord(window);
        out
    }
}
