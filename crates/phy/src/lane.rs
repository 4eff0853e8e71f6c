//! Byte-lane datapath.
//!
//! A lane owns eight DQ pins, one DM pin and one DQS pin together with the calibration
//! state the lane-select mask addresses: the DQ input delay, the DQ/DM output delay, the
//! DQS output delay and one bitslip aligner per DQ pin. Lanes never share state, so
//! each can be calibrated and inspected on its own.

use crate::bitslip::Bitslip;
use crate::calibration::{CalibrationPulses, DelayTap};
use crate::common::DdrWord;
use crate::common::constants::LANE_WIDTH;
use crate::leveling::StrobeControl;
use crate::serdes::{DqPad, ISerdes, OSerdes, StrobePad};

/// One DQ pin: serializer, deserializer and bitslip aligner.
#[derive(Debug, Clone)]
pub struct DqPin {
    oserdes: OSerdes,
    iserdes: ISerdes,
    bitslip: Bitslip,
}

impl DqPin {
    fn new(nphases: usize, skew: u8) -> Self {
        Self {
            oserdes: OSerdes::new(nphases),
            iserdes: ISerdes::new(nphases, skew),
            bitslip: Bitslip::new(nphases),
        }
    }

    /// Current bitslip rotation.
    pub const fn rotation(&self) -> u8 {
        self.bitslip.rotation()
    }

    /// Start-up skew of the deserializer.
    pub const fn skew(&self) -> usize {
        self.iserdes.skew()
    }
}

/// Pads driven by one lane during one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaneDrive {
    /// DQ pads, lane bit order.
    pub dq: Vec<DqPad>,
    /// DM pad.
    pub dm: StrobePad,
    /// DQS pad.
    pub dqs: StrobePad,
}

/// One byte lane.
#[derive(Debug, Clone)]
pub struct ByteLane {
    index: usize,
    pins: Vec<DqPin>,
    dm: OSerdes,
    dqs: OSerdes,
    read_delay: DelayTap,
    write_delay: DelayTap,
    strobe_delay: DelayTap,
}

impl ByteLane {
    /// Creates lane `index` for `nphases` phases.
    ///
    /// `skew` is the deserializer start-up skew of every DQ pin in the lane and
    /// `io_delay_tap_base` the reset value of the strobe output delay.
    pub fn new(index: usize, nphases: usize, skew: u8, io_delay_tap_base: u8) -> Self {
        Self {
            index,
            pins: (0..LANE_WIDTH).map(|_| DqPin::new(nphases, skew)).collect(),
            dm: OSerdes::new(nphases),
            dqs: OSerdes::new(nphases),
            read_delay: DelayTap::new(0),
            write_delay: DelayTap::new(0),
            strobe_delay: DelayTap::new(io_delay_tap_base),
        }
    }

    /// Lane number (its bit in the lane-select mask).
    pub const fn index(&self) -> usize {
        self.index
    }

    /// DQ pins of the lane.
    pub fn pins(&self) -> &[DqPin] {
        &self.pins
    }

    /// Bitslip rotation shared by the lane's pins.
    pub fn rotation(&self) -> u8 {
        self.pins.first().map_or(0, DqPin::rotation)
    }

    /// DQ input delay tap.
    pub const fn read_delay(&self) -> u8 {
        self.read_delay.value()
    }

    /// DQ/DM output delay tap.
    pub const fn write_delay(&self) -> u8 {
        self.write_delay.value()
    }

    /// DQS output delay tap.
    pub const fn strobe_delay(&self) -> u8 {
        self.strobe_delay.value()
    }

    /// Applies this cycle's pulses. Only call for lanes selected by `lane_select`.
    pub fn calibrate(&mut self, pulses: &CalibrationPulses) {
        self.read_delay.pulse(pulses.read_delay);
        self.write_delay.pulse(pulses.write_delay);
        self.strobe_delay.pulse(pulses.strobe_delay);
        for pin in &mut self.pins {
            pin.bitslip.pulse(pulses.bitslip);
        }
    }

    /// Serializes this cycle's DQ and DM words and the strobe pattern.
    ///
    /// `dq` holds one word per lane pin; missing pins drive low.
    pub fn drive(&mut self, dq: &[DdrWord], dm: DdrWord, strobe: &StrobeControl) -> LaneDrive {
        let output_delay = self.write_delay.value();
        let input_delay = self.read_delay.value();
        let dq = self
            .pins
            .iter_mut()
            .enumerate()
            .map(|(k, pin)| DqPad {
                drive: pin
                    .oserdes
                    .step(dq.get(k).copied().unwrap_or_default(), strobe.oe_dq),
                output_delay,
                input_delay,
            })
            .collect();
        LaneDrive {
            dq,
            dm: StrobePad {
                drive: self.dm.step(dm, true),
                output_delay,
            },
            dqs: StrobePad {
                drive: self.dqs.step(strobe.pattern, strobe.oe_dqs),
                output_delay: self.strobe_delay.value(),
            },
        }
    }

    /// Deserializes and aligns this cycle's DQ samples; returns one word per lane pin.
    pub fn capture(&mut self, dq: &[DdrWord]) -> Vec<DdrWord> {
        self.pins
            .iter_mut()
            .enumerate()
            .map(|(k, pin)| {
                let word = pin.iserdes.step(dq.get(k).copied().unwrap_or_default());
                pin.bitslip.step(word)
            })
            .collect()
    }
}
