//! Latency planner and PHY settings.
//!
//! The planner turns the CAS latencies of the selected speed bin into:
//! 1. **System latencies:** how many whole system cycles cover a memory-clock latency.
//! 2. **Phase assignment:** which phase issues a command and which carries its data,
//!    so the data lands exactly `latency` memory clocks after the command.
//! 3. **Pipeline latencies:** end-to-end read and write latencies seen by the controller.
//!
//! Everything is computed once in [`PhySettings::new`] and never changes afterwards.

use serde::Serialize;
use tracing::info;

use crate::common::constants::{
    BITSLIP_LATENCY, DESERIALIZER_LATENCY, LANE_WIDTH, MAX_ADDRESS_BITS, MAX_BANK_BITS,
    MAX_DATA_BITS, MAX_RANKS, READ_LATENCY_OVERLAP, SERIALIZER_LATENCY,
};
use crate::common::{PhyError, PhyResult};
use crate::config::PhyConfig;
use crate::timing::{self, CasLatency, MemoryFamily};

/// System cycles needed to cover `latency` memory clocks with `nphases` phases.
///
/// # Panics
///
/// Panics if `nphases` is zero; [`PhySettings::new`] rejects such configurations first.
#[inline]
pub const fn sys_latency(nphases: usize, latency: usize) -> usize {
    latency.div_ceil(nphases)
}

/// Command and data phases for one direction of traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseAssignment {
    /// Phase that issues the command.
    pub cmd_phase: usize,
    /// Phase that carries (or receives) the burst data.
    pub data_phase: usize,
}

/// Assigns command and data phases so data lands `latency` memory clocks after the command.
///
/// # Errors
///
/// Returns [`PhyError::InvalidLatencyConfiguration`] when `sys_latency` does not cover
/// `latency` within one system cycle, which leaves the data phase outside `[0, nphases)`.
pub fn phase_assignment(
    nphases: usize,
    sys_latency: usize,
    latency: usize,
) -> PhyResult<PhaseAssignment> {
    let span = sys_latency * nphases;
    let data_phase = span
        .checked_sub(latency)
        .filter(|&p| p < nphases)
        .ok_or_else(|| {
            PhyError::InvalidLatencyConfiguration(format!(
                "{sys_latency} system cycles of {nphases} phases cannot place a latency of {latency}"
            ))
        })?;
    let cmd_phase = (data_phase + nphases - 1) % nphases;
    Ok(PhaseAssignment {
        cmd_phase,
        data_phase,
    })
}

/// Immutable PHY settings shared with the memory controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhySettings {
    /// Memory family on the bus.
    pub memtype: MemoryFamily,
    /// Width of the DFI data vector per phase (two transfers per pad bit).
    pub dfi_databits: usize,
    /// Ranks on the bus.
    pub nranks: usize,
    /// Phases per system cycle.
    pub nphases: usize,
    /// Phase carrying read data and `rddata_en`.
    pub rdphase: usize,
    /// Phase carrying write data and `wrdata_en`.
    pub wrphase: usize,
    /// Phase on which read commands are issued.
    pub rdcmdphase: usize,
    /// Phase on which write commands are issued.
    pub wrcmdphase: usize,
    /// CAS latency in memory clocks.
    pub cl: usize,
    /// CAS write latency in memory clocks.
    pub cwl: usize,
    /// System cycles from `rddata_en` until the matching `rddata_valid` pipeline output.
    pub read_latency: usize,
    /// System cycles from a write command to the centre of the output-enable window.
    pub write_latency: usize,
    /// Write-history tap of the strobe preamble; the postamble sits two cycles later.
    pub dqs_latency: usize,
    /// Reset value of the strobe output delay: a quarter memory clock in taps.
    pub io_delay_tap_base: u8,
    /// Whether output delay lines and write leveling exist.
    pub with_odelay: bool,
}

impl PhySettings {
    /// Resolves latencies and phases for `config`.
    ///
    /// # Errors
    ///
    /// * [`PhyError::UnsupportedPhaseCount`] when the family cannot use the phase count.
    /// * [`PhyError::UnsupportedConfiguration`] for unknown clocks or pad geometry.
    /// * [`PhyError::InvalidLatencyConfiguration`] when a latency or phase is out of range.
    pub fn new(config: &PhyConfig) -> PhyResult<Self> {
        validate_geometry(config)?;

        let nphases = config.nphases;
        let tck = timing::memory_clock_period(nphases, config.sys_clk_freq);
        let CasLatency { cl, cwl } = timing::resolve(config.memtype, tck)?;
        let io_delay_tap_base = timing::io_delay_tap_base(tck, config.iodelay_clk_freq)?;

        let cl_sys_latency = sys_latency(nphases, cl);
        let cwl_sys_latency = sys_latency(nphases, cwl);
        let read = phase_assignment(nphases, cl_sys_latency, cl)?;
        let write = phase_assignment(nphases, cwl_sys_latency, cwl)?;

        let read_latency = (SERIALIZER_LATENCY
            + cl_sys_latency
            + DESERIALIZER_LATENCY
            + BITSLIP_LATENCY)
            .saturating_sub(READ_LATENCY_OVERLAP);
        if read_latency <= 1 {
            return Err(PhyError::InvalidLatencyConfiguration(format!(
                "read latency of {read_latency} leaves no read-enable pipeline"
            )));
        }
        let write_latency = cwl_sys_latency;
        if write_latency == 0 {
            return Err(PhyError::InvalidLatencyConfiguration(
                "write latency of 0 places the output-enable window before the command".into(),
            ));
        }

        let dqs_latency = config
            .dqs_latency
            .unwrap_or_else(|| default_dqs_latency(cwl_sys_latency));
        if dqs_latency >= write_latency {
            return Err(PhyError::InvalidLatencyConfiguration(format!(
                "strobe latency {dqs_latency} puts the postamble outside the {} cycle write history",
                write_latency + 2
            )));
        }

        let settings = Self {
            memtype: config.memtype,
            dfi_databits: 2 * config.data_bits,
            nranks: config.nranks,
            nphases,
            rdphase: read.data_phase,
            wrphase: write.data_phase,
            rdcmdphase: read.cmd_phase,
            wrcmdphase: write.cmd_phase,
            cl,
            cwl,
            read_latency,
            write_latency,
            dqs_latency,
            io_delay_tap_base,
            with_odelay: config.with_odelay(),
        };
        info!(
            memtype = %settings.memtype,
            nphases,
            cl,
            cwl,
            read_latency,
            write_latency,
            rdphase = settings.rdphase,
            wrphase = settings.wrphase,
            "resolved PHY settings"
        );
        Ok(settings)
    }

    /// DQ pins on the pads.
    pub const fn databits(&self) -> usize {
        self.dfi_databits / 2
    }

    /// Byte lanes on the pads.
    pub const fn lanes(&self) -> usize {
        self.databits() / LANE_WIDTH
    }

    /// Transitions per pin per system cycle.
    pub const fn word_width(&self) -> usize {
        2 * self.nphases
    }
}

/// Strobe latency used when the configuration does not override it.
///
/// One cycle ahead of the write latency, for every family and architecture: the
/// strobe then toggles on the data cycle and is driven low on the cycles either side.
/// Boards whose DQS trace skew needs another value set `dqs_latency` explicitly.
pub const fn default_dqs_latency(cwl_sys_latency: usize) -> usize {
    cwl_sys_latency.saturating_sub(1)
}

fn validate_geometry(config: &PhyConfig) -> PhyResult<()> {
    if !config.memtype.supports_phases(config.nphases) {
        return Err(PhyError::UnsupportedPhaseCount {
            family: config.memtype,
            nphases: config.nphases,
        });
    }
    if !config.sys_clk_freq.is_finite() || config.sys_clk_freq <= 0.0 {
        return Err(PhyError::UnsupportedConfiguration(format!(
            "system clock of {} Hz",
            config.sys_clk_freq
        )));
    }
    let unsupported = |what: String| Err(PhyError::UnsupportedConfiguration(what));
    if config.data_bits == 0
        || config.data_bits % LANE_WIDTH != 0
        || config.data_bits > MAX_DATA_BITS
    {
        return unsupported(format!(
            "{} data bits is not 1 to {} whole byte lanes",
            config.data_bits,
            MAX_DATA_BITS / LANE_WIDTH
        ));
    }
    if config.nranks == 0 || config.nranks > MAX_RANKS {
        return unsupported(format!("{} ranks (1 to {MAX_RANKS})", config.nranks));
    }
    if config.address_bits == 0 || config.address_bits > MAX_ADDRESS_BITS {
        return unsupported(format!(
            "{} address bits (1 to {MAX_ADDRESS_BITS})",
            config.address_bits
        ));
    }
    if config.bank_bits == 0 || config.bank_bits > MAX_BANK_BITS {
        return unsupported(format!("{} bank bits (1 to {MAX_BANK_BITS})", config.bank_bits));
    }
    let width = 2 * config.nphases;
    if let Some(skew) = config.lane_skew.iter().find(|&&s| usize::from(s) >= width) {
        return unsupported(format!(
            "deserializer skew {skew} exceeds the {width}-transition word"
        ));
    }
    Ok(())
}
