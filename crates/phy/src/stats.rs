//! PHY activity statistics.
//!
//! Counts what passed through the PHY since construction:
//! 1. **Cycles:** system cycles stepped, and how many were spent write leveling.
//! 2. **Bursts:** write and read bursts, counted on the rising edge of their enables.
//! 3. **Calibration:** pulse lines asserted and how many lanes each reached.

use std::fmt;

/// Counters maintained by [`Phy::step`](crate::Phy::step).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhyStats {
    /// System cycles stepped.
    pub cycles: u64,
    /// Write bursts (rising edges of `wrdata_en` on the write phase).
    pub write_bursts: u64,
    /// Read bursts (rising edges of `rddata_en` on the read phase).
    pub read_bursts: u64,
    /// Cycles with `rddata_valid` asserted.
    pub valid_cycles: u64,
    /// Calibration pulse lines asserted.
    pub calibration_pulses: u64,
    /// Lane updates performed by those pulses (a pulse to three lanes counts three).
    pub lane_updates: u64,
    /// Cycles spent in write-leveling mode.
    pub leveling_cycles: u64,
}

impl PhyStats {
    /// Fraction of cycles in which the read path delivered valid data.
    pub fn read_utilization(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.valid_cycles as f64 / self.cycles as f64
        }
    }

    /// Prints the statistics to stdout.
    pub fn print(&self) {
        println!("{self}");
    }
}

impl fmt::Display for PhyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==========================================================")?;
        writeln!(f, "DDR PHY STATISTICS")?;
        writeln!(f, "==========================================================")?;
        writeln!(f, "phy_cycles               {}", self.cycles)?;
        writeln!(f, "write_bursts             {}", self.write_bursts)?;
        writeln!(f, "read_bursts              {}", self.read_bursts)?;
        writeln!(
            f,
            "read_valid_cycles        {} ({:.2}%)",
            self.valid_cycles,
            self.read_utilization() * 100.0
        )?;
        writeln!(f, "calibration_pulses       {}", self.calibration_pulses)?;
        writeln!(f, "calibration_lane_updates {}", self.lane_updates)?;
        writeln!(f, "leveling_cycles          {}", self.leveling_cycles)?;
        write!(f, "==========================================================")
    }
}
