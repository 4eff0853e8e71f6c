//! Output serializer.
//!
//! Accepts one [`DdrWord`] and one output enable per system cycle and presents them on
//! the pad [`SERIALIZER_LATENCY`] cycles later. Data and tristate control travel
//! through registers of the same depth so a word and its enable always reach the pad
//! together.

use std::collections::VecDeque;

use crate::common::DdrWord;
use crate::common::constants::SERIALIZER_LATENCY;

/// Level and drive state of one pad over one system cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PinDrive {
    /// Transitions presented to the output buffer.
    pub word: DdrWord,
    /// Whether the buffer drives the pad; when false the pad is high impedance.
    pub oe: bool,
}

/// Output serializer for one pin.
#[derive(Debug, Clone)]
pub struct OSerdes {
    mask: u8,
    stages: VecDeque<PinDrive>,
}

impl OSerdes {
    /// Creates a serializer for `nphases` phases with an empty (undriven) pipeline.
    pub fn new(nphases: usize) -> Self {
        Self {
            mask: DdrWord::mask(nphases),
            stages: std::iter::repeat_n(PinDrive::default(), SERIALIZER_LATENCY).collect(),
        }
    }

    /// Accepts this cycle's word and enable and returns what the pad presents this cycle.
    pub fn step(&mut self, word: DdrWord, oe: bool) -> PinDrive {
        self.stages.push_back(PinDrive {
            word: DdrWord(word.0 & self.mask),
            oe,
        });
        self.stages.pop_front().unwrap_or_default()
    }

    /// Output-only pins keep their buffer enabled.
    #[inline]
    pub fn drive(&mut self, word: DdrWord) -> DdrWord {
        self.step(word, true).word
    }
}
