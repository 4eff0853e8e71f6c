//! Construction-time configuration of a PHY.
//!
//! This module defines the structures used to parameterize a [`Phy`](crate::Phy):
//! 1. **Defaults:** A DDR3 x16 part on an Artix-7 class device at a 1:4 clock ratio.
//! 2. **Architecture:** Whether the device has programmable output delay lines.
//! 3. **Geometry:** Pad widths, ranks and the optional control pins.
//!
//! Configuration is supplied as JSON or built with `PhyConfig::default()`.

use serde::{Deserialize, Serialize};

use crate::common::PhyResult;
use crate::timing::MemoryFamily;

/// Default configuration constants.
mod defaults {
    /// Phases per system cycle (1:4 system to memory clock ratio).
    pub const NPHASES: usize = 4;

    /// System clock frequency in Hz; with four phases this is DDR3-800.
    pub const SYS_CLK_FREQ: f64 = 100e6;

    /// IODELAY reference clock frequency in Hz.
    pub const IODELAY_CLK_FREQ: f64 = 200e6;

    /// Row/column address pins.
    pub const ADDRESS_BITS: usize = 14;

    /// Bank address pins.
    pub const BANK_BITS: usize = 3;

    /// Ranks on the memory bus.
    pub const NRANKS: usize = 1;

    /// DQ pins (two byte lanes).
    pub const DATA_BITS: usize = 16;
}

/// FPGA family variant of the PHY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum PhyArch {
    /// Artix-7: input delays only, DQS clocked from a phase-shifted I/O clock.
    #[default]
    #[serde(alias = "A7")]
    Artix7,
    /// Kintex-7: input and output delays, write leveling available.
    #[serde(alias = "K7")]
    Kintex7,
    /// Virtex-7: input and output delays, write leveling available.
    #[serde(alias = "V7")]
    Virtex7,
}

impl PhyArch {
    /// Whether output delay lines (and with them write leveling) exist.
    pub const fn with_odelay(self) -> bool {
        matches!(self, Self::Kintex7 | Self::Virtex7)
    }
}

/// Root PHY configuration.
///
/// # Examples
///
/// ```
/// use ddrphy_core::config::{PhyArch, PhyConfig};
///
/// let json = r#"{ "memtype": "DDR3", "arch": "Kintex7", "data_bits": 32 }"#;
/// let config = PhyConfig::from_json(json).unwrap();
/// assert_eq!(config.arch, PhyArch::Kintex7);
/// assert_eq!(config.nphases, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PhyConfig {
    /// Memory family on the bus.
    #[serde(default)]
    pub memtype: MemoryFamily,

    /// Device architecture variant.
    #[serde(default)]
    pub arch: PhyArch,

    /// Phases per system cycle (2 or 4).
    #[serde(default = "PhyConfig::default_nphases")]
    pub nphases: usize,

    /// System clock frequency in Hz.
    #[serde(default = "PhyConfig::default_sys_clk_freq")]
    pub sys_clk_freq: f64,

    /// IODELAY reference clock frequency in Hz (200, 300 or 400 MHz).
    #[serde(default = "PhyConfig::default_iodelay_clk_freq")]
    pub iodelay_clk_freq: f64,

    /// Address pins.
    #[serde(default = "PhyConfig::default_address_bits")]
    pub address_bits: usize,

    /// Bank address pins.
    #[serde(default = "PhyConfig::default_bank_bits")]
    pub bank_bits: usize,

    /// Ranks; one CKE/ODT (and CS_n when present) pin per rank.
    #[serde(default = "PhyConfig::default_nranks")]
    pub nranks: usize,

    /// DQ pins; must be a whole number of byte lanes.
    #[serde(default = "PhyConfig::default_data_bits")]
    pub data_bits: usize,

    /// Whether the board routes RESET_n (DDR3 only in practice).
    #[serde(default = "PhyConfig::default_has_reset_n")]
    pub has_reset_n: bool,

    /// Whether the board routes per-rank chip selects.
    #[serde(default)]
    pub has_cs_n: bool,

    /// Overrides the write-history tap of the strobe preamble.
    ///
    /// When unset it defaults to one cycle ahead of the write latency; boards that
    /// need a different value find it empirically.
    #[serde(default)]
    pub dqs_latency: Option<usize>,

    /// Deserializer start-up skew of each byte lane, in transitions.
    ///
    /// Models the unknown word boundary the ISERDES settles on after reset. Lanes
    /// without an entry start aligned.
    #[serde(default)]
    pub lane_skew: Vec<u8>,
}

impl PhyConfig {
    /// Parses a configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`PhyError::Config`](crate::PhyError::Config) when the document is malformed.
    pub fn from_json(json: &str) -> PhyResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether the configured architecture has output delay lines.
    pub const fn with_odelay(&self) -> bool {
        self.arch.with_odelay()
    }

    /// Number of byte lanes.
    pub const fn lanes(&self) -> usize {
        self.data_bits / crate::common::constants::LANE_WIDTH
    }

    fn default_nphases() -> usize {
        defaults::NPHASES
    }

    fn default_sys_clk_freq() -> f64 {
        defaults::SYS_CLK_FREQ
    }

    fn default_iodelay_clk_freq() -> f64 {
        defaults::IODELAY_CLK_FREQ
    }

    fn default_address_bits() -> usize {
        defaults::ADDRESS_BITS
    }

    fn default_bank_bits() -> usize {
        defaults::BANK_BITS
    }

    fn default_nranks() -> usize {
        defaults::NRANKS
    }

    fn default_data_bits() -> usize {
        defaults::DATA_BITS
    }

    fn default_has_reset_n() -> bool {
        true
    }
}

impl Default for PhyConfig {
    fn default() -> Self {
        Self {
            memtype: MemoryFamily::default(),
            arch: PhyArch::default(),
            nphases: defaults::NPHASES,
            sys_clk_freq: defaults::SYS_CLK_FREQ,
            iodelay_clk_freq: defaults::IODELAY_CLK_FREQ,
            address_bits: defaults::ADDRESS_BITS,
            bank_bits: defaults::BANK_BITS,
            nranks: defaults::NRANKS,
            data_bits: defaults::DATA_BITS,
            has_reset_n: true,
            has_cs_n: false,
            dqs_latency: None,
            lane_skew: Vec::new(),
        }
    }
}
