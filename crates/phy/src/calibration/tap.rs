//! Programmable delay taps.

use crate::common::constants::DELAY_TAPS;

use super::TapPulse;

/// One variable delay line.
///
/// Increments wrap from the last tap back to zero, as the hardware counter does;
/// reset loads the tap's reset value. There is no absolute load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayTap {
    value: u8,
    reset_value: u8,
}

impl DelayTap {
    /// Creates a tap holding `reset_value` (taken modulo the tap count).
    pub const fn new(reset_value: u8) -> Self {
        let reset_value = reset_value % DELAY_TAPS;
        Self {
            value: reset_value,
            reset_value,
        }
    }

    /// Current tap.
    #[inline]
    pub const fn value(&self) -> u8 {
        self.value
    }

    /// Tap loaded on reset.
    pub const fn reset_value(&self) -> u8 {
        self.reset_value
    }

    /// Applies a pulse. Reset takes priority over increment.
    pub const fn pulse(&mut self, pulse: TapPulse) {
        if pulse.reset {
            self.value = self.reset_value;
        } else if pulse.inc {
            self.value = (self.value + 1) % DELAY_TAPS;
        }
    }
}

impl Default for DelayTap {
    fn default() -> Self {
        Self::new(0)
    }
}
