//! DFI phase bus.
//!
//! The controller talks to the PHY through `nphases` phases per system cycle. Each
//! phase is split by direction: [`DfiPhase`] is written only by the controller and
//! [`DfiReadPhase`] only by the PHY, so neither side ever observes a half-written phase.

use crate::common::word::bit_of;

/// Controller-driven half of one phase.
///
/// Control lines are active low where the DRAM pins are (`*_n`). Per-rank lines
/// (`cs_n`, `cke`, `odt`) are bitmasks with bit `r` driving rank `r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DfiPhase {
    /// Row/column address.
    pub address: u32,
    /// Bank address.
    pub bank: u8,
    /// Chip selects, one bit per rank.
    pub cs_n: u8,
    /// Clock enables, one bit per rank.
    pub cke: u8,
    /// On-die termination enables, one bit per rank.
    pub odt: u8,
    /// Device reset.
    pub reset_n: bool,
    /// Row address strobe.
    pub ras_n: bool,
    /// Column address strobe.
    pub cas_n: bool,
    /// Write enable.
    pub we_n: bool,
    /// Write data; bit `i` is the rising-edge transfer of DQ `i`, bit `databits + i` the falling one.
    pub wrdata: u128,
    /// Write mask, laid out like `wrdata` at byte-lane granularity.
    pub wrdata_mask: u16,
    /// Write data on this phase is valid (sampled on the write phase only).
    pub wrdata_en: bool,
    /// Read data is requested (sampled on the read phase only).
    pub rddata_en: bool,
}

impl DfiPhase {
    /// A phase that issues no command: strobes high, no ranks selected, out of reset.
    pub const IDLE: Self = Self {
        address: 0,
        bank: 0,
        cs_n: u8::MAX,
        cke: 0,
        odt: 0,
        reset_n: true,
        ras_n: true,
        cas_n: true,
        we_n: true,
        wrdata: 0,
        wrdata_mask: 0,
        wrdata_en: false,
        rddata_en: false,
    };

    /// Write data transfer for DQ `pin` on the rising (`false`) or falling (`true`) edge.
    #[inline]
    pub const fn wrdata_bit(&self, databits: usize, pin: usize, falling: bool) -> bool {
        bit_of(self.wrdata, pin + if falling { databits } else { 0 })
    }

    /// Write mask for byte `lane` on the rising (`false`) or falling (`true`) edge.
    #[inline]
    pub const fn wrdata_mask_bit(&self, lanes: usize, lane: usize, falling: bool) -> bool {
        bit_of(
            self.wrdata_mask as u128,
            lane + if falling { lanes } else { 0 },
        )
    }
}

impl Default for DfiPhase {
    fn default() -> Self {
        Self::IDLE
    }
}

/// PHY-driven half of one phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DfiReadPhase {
    /// Read data, laid out like [`DfiPhase::wrdata`].
    pub rddata: u128,
    /// `rddata` belongs to a requested read.
    pub rddata_valid: bool,
}

/// Controller-driven phases for one system cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DfiCommand {
    phases: Vec<DfiPhase>,
}

impl DfiCommand {
    /// All phases idle.
    pub fn idle(nphases: usize) -> Self {
        Self {
            phases: vec![DfiPhase::IDLE; nphases],
        }
    }

    /// Phase `p`, or an idle phase when `p` is out of range.
    #[inline]
    pub fn phase(&self, p: usize) -> &DfiPhase {
        self.phases.get(p).unwrap_or(&DfiPhase::IDLE)
    }

    /// Mutable access to phase `p`.
    pub fn phase_mut(&mut self, p: usize) -> Option<&mut DfiPhase> {
        self.phases.get_mut(p)
    }

    /// All phases in order.
    pub fn phases(&self) -> &[DfiPhase] {
        &self.phases
    }

    /// Number of phases.
    pub fn nphases(&self) -> usize {
        self.phases.len()
    }
}

/// Packs a per-lane, per-edge write mask into the DFI mask layout.
pub fn pack_wrdata_mask(lanes: usize, mask: impl Fn(usize, bool) -> bool) -> u16 {
    let mut packed = 0u16;
    for lane in 0..lanes {
        packed |= u16::from(mask(lane, false)) << lane;
        packed |= u16::from(mask(lane, true)) << (lanes + lane);
    }
    packed
}
