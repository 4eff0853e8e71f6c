//! Input deserializer.
//!
//! Each system cycle the pad delivers `2 * nphases` transitions, which the
//! deserializer clocks in as two `nphases`-bit nibbles on the half-rate clock. Its word
//! boundary after reset is not known: with a start-up skew of `s`, every word it emits
//! begins with the last `s` transitions of the previous cycle. The bitslip aligner
//! downstream undoes that.

use std::collections::VecDeque;

use crate::common::DdrWord;
use crate::common::constants::DESERIALIZER_LATENCY;

/// Input deserializer for one DQ pin.
#[derive(Debug, Clone)]
pub struct ISerdes {
    nphases: usize,
    skew: usize,
    /// The last two cycles of transitions, oldest in bit 0.
    stream: u16,
    stages: VecDeque<DdrWord>,
}

impl ISerdes {
    /// Creates a deserializer whose word boundary lags the cycle boundary by `skew`
    /// transitions (taken modulo the word width).
    pub fn new(nphases: usize, skew: u8) -> Self {
        Self {
            nphases,
            skew: usize::from(skew) % DdrWord::width(nphases),
            stream: 0,
            stages: std::iter::repeat_n(DdrWord::ZERO, DESERIALIZER_LATENCY).collect(),
        }
    }

    /// Start-up skew in transitions.
    pub const fn skew(&self) -> usize {
        self.skew
    }

    /// Samples this cycle's transitions and returns the word completed
    /// [`DESERIALIZER_LATENCY`] cycles ago.
    pub fn step(&mut self, wire: DdrWord) -> DdrWord {
        let n = self.nphases;
        let width = DdrWord::width(n);
        let nibble_mask = (1u16 << n) - 1;
        for half in 0..2 {
            let nibble = (u16::from(wire.0) >> (half * n)) & nibble_mask;
            self.stream = (self.stream >> n) | (nibble << (2 * width - n));
        }
        let word = (self.stream >> (width - self.skew)) as u8 & DdrWord::mask(n);
        self.stages.push_back(DdrWord(word));
        self.stages.pop_front().unwrap_or_default()
    }
}
