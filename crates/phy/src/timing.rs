//! Timing resolver.
//!
//! Each memory family publishes a small set of speed bins, each pairing a data rate
//! with the CAS latency (`cl`) and CAS write latency (`cwl`) the device needs at that
//! rate. The resolver walks the bins in ascending data-rate order and returns the
//! first one the clock period satisfies, i.e. the slowest bin still fast enough.
//!
//! The tables are plain data so new families only add rows, not branches.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::constants::{DELAY_TAPS, IODELAY_TAP_AVERAGE};
use crate::common::{PhyError, PhyResult};

/// DRAM family driven by the PHY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum MemoryFamily {
    /// DDR2 SDRAM (400 to 1066 MT/s).
    #[serde(rename = "DDR2", alias = "Ddr2", alias = "ddr2")]
    Ddr2,
    /// DDR3 SDRAM (800 to 1600 MT/s).
    #[default]
    #[serde(rename = "DDR3", alias = "Ddr3", alias = "ddr3")]
    Ddr3,
}

impl MemoryFamily {
    /// Speed bins of this family in ascending data-rate order.
    pub const fn speed_bins(self) -> &'static [SpeedBin] {
        match self {
            Self::Ddr2 => &DDR2_SPEED_BINS,
            Self::Ddr3 => &DDR3_SPEED_BINS,
        }
    }

    /// Whether the family can run with `nphases` phases per system cycle.
    ///
    /// DDR3 always bursts 8 transfers, so a 1:2 ratio would need the controller to
    /// spread one burst across two system cycles, which the phase bus cannot express.
    pub const fn supports_phases(self, nphases: usize) -> bool {
        match self {
            Self::Ddr2 => matches!(nphases, 2 | 4),
            Self::Ddr3 => nphases == 4,
        }
    }
}

impl fmt::Display for MemoryFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ddr2 => write!(f, "DDR2"),
            Self::Ddr3 => write!(f, "DDR3"),
        }
    }
}

impl FromStr for MemoryFamily {
    type Err = PhyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DDR2" => Ok(Self::Ddr2),
            "DDR3" => Ok(Self::Ddr3),
            _ => Err(PhyError::UnsupportedConfiguration(format!(
                "unknown memory family '{s}'"
            ))),
        }
    }
}

/// One row of a family's speed-bin table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedBin {
    /// Data rate of the bin in transfers per second.
    pub data_rate: f64,
    /// CAS latency in memory clock cycles.
    pub cl: usize,
    /// CAS write latency in memory clock cycles.
    pub cwl: usize,
}

impl SpeedBin {
    const fn new(data_rate: f64, cl: usize, cwl: usize) -> Self {
        Self { data_rate, cl, cwl }
    }

    /// Whether a memory clock of period `tck` seconds is slow enough for this bin.
    #[inline]
    pub fn accepts(&self, tck: f64) -> bool {
        tck >= 2.0 / self.data_rate
    }

    /// The latencies of this bin.
    pub const fn latencies(&self) -> CasLatency {
        CasLatency {
            cl: self.cl,
            cwl: self.cwl,
        }
    }
}

/// DDR2 bins: 400, 533, 667, 800 and 1066 MT/s.
pub const DDR2_SPEED_BINS: [SpeedBin; 5] = [
    SpeedBin::new(400e6, 3, 2),
    SpeedBin::new(533e6, 4, 3),
    SpeedBin::new(667e6, 5, 4),
    SpeedBin::new(800e6, 6, 5),
    SpeedBin::new(1066e6, 7, 5),
];

/// DDR3 bins: 800, 1066, 1333 and 1600 MT/s.
pub const DDR3_SPEED_BINS: [SpeedBin; 4] = [
    SpeedBin::new(800e6, 6, 5),
    SpeedBin::new(1066e6, 7, 6),
    SpeedBin::new(1333e6, 10, 7),
    SpeedBin::new(1600e6, 11, 8),
];

/// CAS latencies selected for a memory clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CasLatency {
    /// CAS (read) latency.
    pub cl: usize,
    /// CAS write latency.
    pub cwl: usize,
}

/// Memory clock period in seconds for a system clock of `sys_clk_freq` Hz and
/// `nphases` phases per system cycle.
#[inline]
pub fn memory_clock_period(nphases: usize, sys_clk_freq: f64) -> f64 {
    2.0 / (2.0 * nphases as f64 * sys_clk_freq)
}

/// Resolves the CAS latencies of `family` for a memory clock period of `tck` seconds.
///
/// # Errors
///
/// Returns [`PhyError::UnsupportedConfiguration`] when `tck` is not a positive finite
/// period or no bin of the family accepts it.
pub fn resolve(family: MemoryFamily, tck: f64) -> PhyResult<CasLatency> {
    if !tck.is_finite() || tck <= 0.0 {
        return Err(PhyError::UnsupportedConfiguration(format!(
            "memory clock period {tck:e} s is not a positive period"
        )));
    }
    family
        .speed_bins()
        .iter()
        .find(|bin| bin.accepts(tck))
        .map(SpeedBin::latencies)
        .ok_or_else(|| {
            PhyError::UnsupportedConfiguration(format!(
                "no {family} speed bin supports a {:.1} MT/s data rate",
                2.0 / tck / 1e6
            ))
        })
}

/// Average delay of one IODELAY tap for a reference clock of `iodelay_clk_freq` Hz.
///
/// # Errors
///
/// Returns [`PhyError::UnsupportedConfiguration`] for reference clocks other than
/// 200, 300 or 400 MHz.
pub fn iodelay_tap_delay(iodelay_clk_freq: f64) -> PhyResult<f64> {
    IODELAY_TAP_AVERAGE
        .iter()
        .find(|(freq, _)| (freq - iodelay_clk_freq).abs() < 1.0)
        .map(|&(_, delay)| delay)
        .ok_or_else(|| {
            PhyError::UnsupportedConfiguration(format!(
                "no IODELAY calibration for a {:.1} MHz reference clock",
                iodelay_clk_freq / 1e6
            ))
        })
}

/// Number of delay taps spanning a quarter of the memory clock period.
///
/// This is the reset value of the strobe output delay, which centres DQS in the DQ eye.
///
/// # Errors
///
/// Returns [`PhyError::UnsupportedConfiguration`] when the reference clock is unknown or
/// the quarter period does not fit the delay line.
pub fn io_delay_tap_base(tck: f64, iodelay_clk_freq: f64) -> PhyResult<u8> {
    let taps = (tck / (4.0 * iodelay_tap_delay(iodelay_clk_freq)?)).floor();
    if taps < 0.0 || taps >= f64::from(DELAY_TAPS) {
        return Err(PhyError::UnsupportedConfiguration(format!(
            "a quarter memory clock needs {taps} delay taps, the delay line has {DELAY_TAPS}"
        )));
    }
    Ok(taps as u8)
}
