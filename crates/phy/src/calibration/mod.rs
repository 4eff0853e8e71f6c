//! Calibration registers and delay taps.
//!
//! 1. **Delay taps:** incrementally adjustable input and output delay lines.
//! 2. **Register file:** lane select, single-cycle pulses and write-leveling control.
//!
//! Calibration state has exactly one writer: the register file is reached through
//! `&mut Phy`, so two calibration sequences cannot interleave.

/// Register file exposed to the calibration routine.
pub mod registers;
/// Programmable delay line taps.
pub mod tap;

pub use registers::{CalibrationPulse, CalibrationPulses, CalibrationRegisters};
pub use tap::DelayTap;

/// A reset/increment pulse pair addressed to one tap or rotation counter.
///
/// Each field is asserted for a single cycle; nothing is queued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TapPulse {
    /// Return to the reset value.
    pub reset: bool,
    /// Advance by one unit.
    pub inc: bool,
}

impl TapPulse {
    /// No pulse.
    pub const NONE: Self = Self {
        reset: false,
        inc: false,
    };

    /// Whether either pulse is asserted.
    #[inline]
    pub const fn any(self) -> bool {
        self.reset || self.inc
    }
}
