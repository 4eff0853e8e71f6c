//! Flow-control pipelines.
//!
//! The controller asserts `wrdata_en`/`rddata_en` on one phase per burst; the PHY
//! delays those flags so that:
//! 1. **Write:** DQ/DQS output enable covers the three cycles centred on the write
//!    latency, and the strobe is held low for one cycle before and after the burst.
//! 2. **Read:** `rddata_valid` rises exactly when the deserialized data of the burst
//!    leaves the bitslip aligner.

use std::collections::VecDeque;

use tracing::trace;

/// Fixed-length bit shift register. Position 0 holds the most recent bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftRegister {
    bits: VecDeque<bool>,
}

impl ShiftRegister {
    /// Creates a cleared register of `len` bits.
    pub fn new(len: usize) -> Self {
        Self {
            bits: std::iter::repeat_n(false, len).collect(),
        }
    }

    /// Length of the register.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether the register has no storage (a zero-cycle delay).
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Shifts `bit` in at position 0 and returns the bit shifted out of the far end.
    ///
    /// An empty register passes `bit` straight through.
    pub fn push(&mut self, bit: bool) -> bool {
        if self.bits.is_empty() {
            return bit;
        }
        self.bits.push_front(bit);
        self.bits.pop_back().unwrap_or(false)
    }

    /// Bit at `position`; positions outside the register read as clear.
    #[inline]
    pub fn tap(&self, position: usize) -> bool {
        self.bits.get(position).copied().unwrap_or(false)
    }

    /// Like [`tap`](Self::tap) for a position computed with signed arithmetic.
    #[inline]
    fn tap_signed(&self, position: Option<usize>) -> bool {
        position.is_some_and(|p| self.tap(p))
    }
}

/// Write-side enables for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteWindow {
    /// DQ and DQS drive the bus.
    pub oe: bool,
    /// DQS is driven low on the cycle before the data cycle.
    pub preamble: bool,
    /// DQS is driven low on the cycle after the last data cycle.
    pub postamble: bool,
}

/// Tracks `wrdata_en` through the write latency.
#[derive(Debug, Clone)]
pub struct WriteFlow {
    history: ShiftRegister,
    write_latency: usize,
    dqs_latency: usize,
}

impl WriteFlow {
    /// Creates the write pipeline; the history holds `write_latency + 2` cycles.
    pub fn new(write_latency: usize, dqs_latency: usize) -> Self {
        Self {
            history: ShiftRegister::new(write_latency + 2),
            write_latency,
            dqs_latency,
        }
    }

    /// Length of the write-enable history.
    pub fn depth(&self) -> usize {
        self.history.len()
    }

    /// Pushes the write phase's `wrdata_en` and returns this cycle's window.
    pub fn step(&mut self, wrdata_en: bool) -> WriteWindow {
        let _ = self.history.push(wrdata_en);
        let h = &self.history;
        let wl = self.write_latency;
        let dqs = self.dqs_latency;
        let oe = h.tap_signed(wl.checked_sub(1)) || h.tap(wl) || h.tap(wl + 1);
        // Strobe taps count from the registered history, one cycle behind the
        // output-enable taps: `dqs + 1` is the burst's data cycle.
        let centre = h.tap(dqs + 1);
        let window = WriteWindow {
            oe,
            preamble: h.tap(dqs) && !centre,
            postamble: h.tap(dqs + 2) && !centre,
        };
        if window.preamble {
            trace!("write burst: strobe preamble");
        }
        window
    }
}

/// Delays `rddata_en` to `rddata_valid`.
#[derive(Debug, Clone)]
pub struct ReadFlow {
    delay: ShiftRegister,
}

impl ReadFlow {
    /// Creates the read pipeline for a read latency of `read_latency` cycles; the
    /// delay line holds `read_latency - 1` cycles.
    pub fn new(read_latency: usize) -> Self {
        Self {
            delay: ShiftRegister::new(read_latency.saturating_sub(1)),
        }
    }

    /// Length of the delay line.
    pub fn depth(&self) -> usize {
        self.delay.len()
    }

    /// Pushes the read phase's `rddata_en` and returns this cycle's `rddata_valid`.
    pub fn step(&mut self, rddata_en: bool) -> bool {
        self.delay.push(rddata_en)
    }
}
