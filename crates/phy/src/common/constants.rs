//! Fixed architecture constants of the modelled PHY.

/// Cycles a word spends in an output serializer (data and tristate paths alike).
pub const SERIALIZER_LATENCY: usize = 2;

/// Cycles between a bit arriving on a DQ pad and its word leaving the deserializer.
pub const DESERIALIZER_LATENCY: usize = 2;

/// Cycles through the bitslip history, selection and retiming registers.
pub const BITSLIP_LATENCY: usize = 3;

/// Read latency reduction from the overlap of command issue and serializer entry.
pub const READ_LATENCY_OVERLAP: usize = 1;

/// Number of taps in an input or output delay line (5-bit tap counter).
pub const DELAY_TAPS: u8 = 32;

/// Data pins per byte lane; lanes share one DQS, one DM and one calibration select bit.
pub const LANE_WIDTH: usize = 8;

/// Widest supported pad data bus; the DFI bus carries twice this in a `u128`.
pub const MAX_DATA_BITS: usize = 64;

/// Most ranks representable in the per-rank control bitmasks.
pub const MAX_RANKS: usize = 8;

/// Widest supported address bus.
pub const MAX_ADDRESS_BITS: usize = 32;

/// Widest supported bank address bus.
pub const MAX_BANK_BITS: usize = 8;

/// Strobe pattern while toggling; the first transition is high.
pub const DQS_PATTERN: u8 = 0b0101_0101;

/// Memory clock pattern; the first transition is low.
pub const CLK_PATTERN: u8 = 0b1010_1010;

/// Single training edge injected on a write-leveling strobe pulse.
pub const WRITE_LEVEL_PATTERN: u8 = 0b0000_0001;

/// Average IODELAY tap delay in seconds, keyed by reference clock frequency in Hz.
pub const IODELAY_TAP_AVERAGE: [(f64, f64); 3] = [
    (200e6, 78e-12),
    (300e6, 52e-12),
    // Only valid for -3 and -2/2E speed grades.
    (400e6, 39e-12),
];
