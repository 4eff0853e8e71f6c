//! Strobe generation and write leveling.
//!
//! In normal operation the strobe toggles with [`DQS_PATTERN`], drops to zero for the
//! preamble and postamble cycles, and shares its output enable with DQ. In
//! write-leveling mode the strobe is driven continuously but stays low except for a
//! single edge per `write_level_strobe` pulse, DQ is released, and read-valid is held
//! high so the host samples the device's leveling feedback every cycle.

use tracing::debug;

use crate::common::DdrWord;
use crate::common::constants::{DQS_PATTERN, WRITE_LEVEL_PATTERN};
use crate::flow::WriteWindow;

/// Strobe and output-enable decisions for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrobeControl {
    /// Transitions fed to every DQS serializer.
    pub pattern: DdrWord,
    /// DQS drives the bus.
    pub oe_dqs: bool,
    /// DQ drives the bus.
    pub oe_dq: bool,
    /// `rddata_valid` is forced high regardless of the read pipeline.
    pub force_valid: bool,
}

/// Write-leveling controller.
#[derive(Debug, Clone)]
pub struct WriteLeveling {
    nphases: usize,
    active: bool,
}

impl WriteLeveling {
    /// Creates the controller for `nphases` phases, initially inactive.
    pub const fn new(nphases: usize) -> Self {
        Self {
            nphases,
            active: false,
        }
    }

    /// Whether leveling was active on the last cycle.
    pub const fn active(&self) -> bool {
        self.active
    }

    /// Decides this cycle's strobe pattern and enables.
    pub fn step(&mut self, enable: bool, strobe: bool, window: WriteWindow) -> StrobeControl {
        if enable != self.active {
            debug!(enable, "write leveling mode changed");
            self.active = enable;
        }
        if enable {
            return StrobeControl {
                pattern: if strobe {
                    DdrWord::pattern(WRITE_LEVEL_PATTERN, self.nphases)
                } else {
                    DdrWord::ZERO
                },
                oe_dqs: true,
                oe_dq: false,
                force_valid: true,
            };
        }
        StrobeControl {
            pattern: if window.preamble || window.postamble {
                DdrWord::ZERO
            } else {
                DdrWord::pattern(DQS_PATTERN, self.nphases)
            },
            oe_dqs: window.oe,
            oe_dq: window.oe,
            force_valid: false,
        }
    }
}
