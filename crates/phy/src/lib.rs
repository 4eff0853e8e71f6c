//! Multi-phase DDR PHY datapath model.
//!
//! This crate models the physical layer that sits between a DFI-style memory controller
//! and the DDR2/DDR3 pads of a Series-7 class FPGA, one system clock cycle at a time:
//! 1. **Timing:** Speed-bin tables resolving CAS latencies from the memory clock period.
//! 2. **Settings:** Latency planning and phase assignment, frozen into [`PhySettings`].
//! 3. **SerDes:** Per-pin serializers and deserializers between phase words and DDR bit streams.
//! 4. **Calibration:** Lane-selected delay taps and bitslip rotation driven by register pulses.
//! 5. **Flow control:** Output-enable, strobe preamble/postamble and read-valid pipelines.
//! 6. **Leveling:** Write-leveling strobe generation on output-delay architectures.

/// Bitslip aligner applied to deserialized data words.
pub mod bitslip;
/// Calibration register file and delay taps.
pub mod calibration;
/// Common constants and error types.
pub mod common;
/// PHY construction-time configuration (JSON-deserializable).
pub mod config;
/// DFI phase bus definitions.
pub mod dfi;
/// Write-enable and read-enable flow-control pipelines.
pub mod flow;
/// Byte-lane datapath: DQ pins, data mask and strobe.
pub mod lane;
/// Write-leveling strobe control.
pub mod leveling;
/// Top-level PHY composed of all per-pin components.
pub mod phy;
/// Serializers, deserializers and pad frames.
pub mod serdes;
/// Latency planning and the immutable PHY settings.
pub mod settings;
/// PHY activity statistics.
pub mod stats;
/// CAS latency resolution from speed-bin tables.
pub mod timing;

/// Error type shared by every constructor in the crate.
pub use crate::common::{PhyError, PhyResult};
/// Root configuration type; use `PhyConfig::default()` or deserialize from JSON.
pub use crate::config::PhyConfig;
/// The PHY itself; construct with `Phy::new` and advance with `Phy::step`.
pub use crate::phy::Phy;
/// Settings derived once at construction.
pub use crate::settings::PhySettings;
