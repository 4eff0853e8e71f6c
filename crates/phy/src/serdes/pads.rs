//! Pad frames exchanged with the memory bus each system cycle.

use crate::common::DdrWord;

use super::oserdes::PinDrive;

/// Command/control pins. Per-rank pins are indexed by rank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlPads {
    /// Row address strobe.
    pub ras_n: DdrWord,
    /// Column address strobe.
    pub cas_n: DdrWord,
    /// Write enable.
    pub we_n: DdrWord,
    /// Clock enable per rank.
    pub cke: Vec<DdrWord>,
    /// On-die termination per rank.
    pub odt: Vec<DdrWord>,
    /// Device reset, when routed.
    pub reset_n: Option<DdrWord>,
    /// Chip select per rank, when routed.
    pub cs_n: Vec<DdrWord>,
}

/// A bidirectional DQ pad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DqPad {
    /// Output transitions and tristate control.
    pub drive: PinDrive,
    /// Output delay tap applied before the buffer.
    pub output_delay: u8,
    /// Input delay tap applied before the deserializer.
    pub input_delay: u8,
}

/// An output pad behind a delay line (DQS and DM).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrobePad {
    /// Output transitions and tristate control.
    pub drive: PinDrive,
    /// Output delay tap applied before the buffer.
    pub output_delay: u8,
}

/// Everything the PHY presents to the memory bus during one system cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PadsOut {
    /// Differential memory clock (positive leg).
    pub clk: DdrWord,
    /// Address pins.
    pub address: Vec<DdrWord>,
    /// Bank address pins.
    pub bank: Vec<DdrWord>,
    /// Command/control pins.
    pub control: ControlPads,
    /// Data mask, one per byte lane.
    pub dm: Vec<StrobePad>,
    /// Data strobe (positive leg), one per byte lane.
    pub dqs: Vec<StrobePad>,
    /// Data pins.
    pub dq: Vec<DqPad>,
}

impl PadsOut {
    /// Transitions driven on DQ `pin`, or `None` while the pin is high impedance.
    pub fn dq_driven(&self, pin: usize) -> Option<DdrWord> {
        self.dq
            .get(pin)
            .filter(|pad| pad.drive.oe)
            .map(|pad| pad.drive.word)
    }
}

/// What the PHY samples from the memory bus during one system cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PadsIn {
    /// Transitions seen on each DQ pin; missing pins read low.
    pub dq: Vec<DdrWord>,
}

impl PadsIn {
    /// A bus with nothing driving the data pins.
    pub fn idle(databits: usize) -> Self {
        Self {
            dq: vec![DdrWord::ZERO; databits],
        }
    }

    /// Loops back what `out` drives on the DQ pins, as a bus with the device idle.
    pub fn loopback(out: &PadsOut) -> Self {
        Self {
            dq: out
                .dq
                .iter()
                .map(|pad| if pad.drive.oe { pad.drive.word } else { DdrWord::ZERO })
                .collect(),
        }
    }

    /// Transitions on DQ `pin`.
    #[inline]
    pub fn pin(&self, pin: usize) -> DdrWord {
        self.dq.get(pin).copied().unwrap_or_default()
    }
}
