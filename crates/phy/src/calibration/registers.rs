//! Calibration register file.
//!
//! Mirrors the control/status registers a calibration routine writes:
//!
//! | Register | Kind | Effect on selected lanes |
//! |---|---|---|
//! | `lane_select` | storage | which lanes the pulses below address |
//! | `read_delay_reset` / `read_delay_inc` | pulse | input delay of DQ |
//! | `bitslip_reset` / `bitslip_inc` | pulse | bitslip rotation of DQ |
//! | `write_delay_reset` / `write_delay_inc` | pulse | output delay of DQ and DM |
//! | `strobe_delay_reset` / `strobe_delay_inc` | pulse | output delay of DQS |
//! | `write_level_enable` | storage | enter/leave write leveling |
//! | `write_level_strobe` | pulse | inject one training edge |
//! | `io_delay_tap_base` | read-only | quarter-clock tap count |
//!
//! Write-path registers only exist on output-delay architectures. A pulse is latched
//! by [`CalibrationRegisters::pulse`] and consumed by the next PHY cycle, mirroring a
//! CSR whose write strobe is high for exactly one clock.

use tracing::debug;

use crate::common::{PhyError, PhyResult};

use super::TapPulse;

/// One pulse register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalibrationPulse {
    /// Reset the input delay of the selected lanes.
    ReadDelayReset,
    /// Increment the input delay of the selected lanes.
    ReadDelayInc,
    /// Reset the bitslip rotation of the selected lanes.
    BitslipReset,
    /// Increment the bitslip rotation of the selected lanes.
    BitslipInc,
    /// Reset the DQ/DM output delay of the selected lanes.
    WriteDelayReset,
    /// Increment the DQ/DM output delay of the selected lanes.
    WriteDelayInc,
    /// Reset the DQS output delay of the selected lanes.
    StrobeDelayReset,
    /// Increment the DQS output delay of the selected lanes.
    StrobeDelayInc,
    /// Inject one strobe edge while write leveling.
    WriteLevelStrobe,
}

impl CalibrationPulse {
    /// Whether the register belongs to the output-delay write path.
    pub const fn is_write_path(self) -> bool {
        matches!(
            self,
            Self::WriteDelayReset
                | Self::WriteDelayInc
                | Self::StrobeDelayReset
                | Self::StrobeDelayInc
                | Self::WriteLevelStrobe
        )
    }
}

/// Pulses asserted during one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalibrationPulses {
    /// DQ input delay.
    pub read_delay: TapPulse,
    /// DQ bitslip rotation.
    pub bitslip: TapPulse,
    /// DQ and DM output delay.
    pub write_delay: TapPulse,
    /// DQS output delay.
    pub strobe_delay: TapPulse,
    /// Write-leveling training edge.
    pub write_level_strobe: bool,
}

impl CalibrationPulses {
    /// Whether any lane-addressed pulse is asserted.
    pub const fn any_lane_pulse(&self) -> bool {
        self.read_delay.any()
            || self.bitslip.any()
            || self.write_delay.any()
            || self.strobe_delay.any()
    }

    /// Number of asserted pulse lines.
    pub fn count(&self) -> u64 {
        [
            self.read_delay.reset,
            self.read_delay.inc,
            self.bitslip.reset,
            self.bitslip.inc,
            self.write_delay.reset,
            self.write_delay.inc,
            self.strobe_delay.reset,
            self.strobe_delay.inc,
            self.write_level_strobe,
        ]
        .iter()
        .filter(|&&p| p)
        .count() as u64
    }
}

/// Calibration register file of one PHY.
#[derive(Debug, Clone)]
pub struct CalibrationRegisters {
    lanes: usize,
    with_odelay: bool,
    io_delay_tap_base: u8,
    lane_select: u32,
    write_level_enable: bool,
    pending: CalibrationPulses,
}

impl CalibrationRegisters {
    /// Creates the register file for `lanes` byte lanes, all deselected.
    pub const fn new(lanes: usize, with_odelay: bool, io_delay_tap_base: u8) -> Self {
        Self {
            lanes,
            with_odelay,
            io_delay_tap_base,
            lane_select: 0,
            write_level_enable: false,
            pending: CalibrationPulses {
                read_delay: TapPulse::NONE,
                bitslip: TapPulse::NONE,
                write_delay: TapPulse::NONE,
                strobe_delay: TapPulse::NONE,
                write_level_strobe: false,
            },
        }
    }

    /// Number of lanes addressed by `lane_select`.
    pub const fn lanes(&self) -> usize {
        self.lanes
    }

    /// Writes the lane-select mask. Bits above the lane count are dropped.
    pub fn select_lanes(&mut self, mask: u32) {
        let valid = if self.lanes >= 32 {
            u32::MAX
        } else {
            (1u32 << self.lanes) - 1
        };
        self.lane_select = mask & valid;
        debug!(lane_select = self.lane_select, "lane select written");
    }

    /// Selects exactly one lane.
    pub fn select_lane(&mut self, lane: usize) {
        self.select_lanes(1u32.checked_shl(lane as u32).unwrap_or(0));
    }

    /// Current lane-select mask.
    pub const fn lane_select(&self) -> u32 {
        self.lane_select
    }

    /// Whether `lane` is addressed by the lane-select mask.
    #[inline]
    pub const fn is_selected(&self, lane: usize) -> bool {
        lane < 32 && (self.lane_select >> lane) & 1 == 1
    }

    /// Quarter-clock tap count; the strobe delay resets to it.
    pub const fn io_delay_tap_base(&self) -> u8 {
        self.io_delay_tap_base
    }

    /// Whether write-leveling mode is active.
    pub const fn write_level_enable(&self) -> bool {
        self.write_level_enable
    }

    /// Enters or leaves write-leveling mode.
    ///
    /// # Errors
    ///
    /// Returns [`PhyError::UnsupportedConfiguration`] on architectures without output delays.
    pub fn set_write_leveling(&mut self, enable: bool) -> PhyResult<()> {
        self.require_odelay("write_level_enable")?;
        if self.write_level_enable != enable {
            debug!(enable, "write leveling");
        }
        self.write_level_enable = enable;
        Ok(())
    }

    /// Strobes a pulse register; the pulse is seen by the next PHY cycle only.
    ///
    /// # Errors
    ///
    /// Returns [`PhyError::UnsupportedConfiguration`] for write-path registers on
    /// architectures without output delays.
    pub fn pulse(&mut self, pulse: CalibrationPulse) -> PhyResult<()> {
        if pulse.is_write_path() {
            self.require_odelay("write path calibration")?;
        }
        debug!(?pulse, lane_select = self.lane_select, "calibration pulse");
        let p = &mut self.pending;
        match pulse {
            CalibrationPulse::ReadDelayReset => p.read_delay.reset = true,
            CalibrationPulse::ReadDelayInc => p.read_delay.inc = true,
            CalibrationPulse::BitslipReset => p.bitslip.reset = true,
            CalibrationPulse::BitslipInc => p.bitslip.inc = true,
            CalibrationPulse::WriteDelayReset => p.write_delay.reset = true,
            CalibrationPulse::WriteDelayInc => p.write_delay.inc = true,
            CalibrationPulse::StrobeDelayReset => p.strobe_delay.reset = true,
            CalibrationPulse::StrobeDelayInc => p.strobe_delay.inc = true,
            CalibrationPulse::WriteLevelStrobe => p.write_level_strobe = true,
        }
        Ok(())
    }

    /// Returns the pulses latched since the last cycle and clears them.
    pub(crate) fn take_pulses(&mut self) -> CalibrationPulses {
        std::mem::take(&mut self.pending)
    }

    fn require_odelay(&self, register: &str) -> PhyResult<()> {
        if self.with_odelay {
            Ok(())
        } else {
            Err(PhyError::UnsupportedConfiguration(format!(
                "{register} requires an architecture with output delays"
            )))
        }
    }
}
