//! Serializer and Loopback Tests.
//!
//! Verifies how phase words map onto pin transitions for command, clock, data and
//! mask pins, and that data written through the PHY reads back unchanged once the
//! bitslip matches the deserializer skew.

use ddrphy_core::calibration::CalibrationPulse;
use ddrphy_core::common::DdrWord;
use ddrphy_core::common::constants::{
    BITSLIP_LATENCY, DESERIALIZER_LATENCY, SERIALIZER_LATENCY,
};
use ddrphy_core::config::PhyConfig;
use ddrphy_core::dfi::{DfiCommand, pack_wrdata_mask};
use ddrphy_core::serdes::{ISerdes, OSerdes, PadsIn};
use pretty_assertions::assert_eq;

use crate::common::configs;
use crate::common::harness::PhyHarness;

/// Cycles between driving a word and reading it back through `PadsIn::loopback`,
/// which feeds one cycle's pad outputs into the next cycle's inputs.
const LOOPBACK_LATENCY: usize =
    SERIALIZER_LATENCY + 1 + DESERIALIZER_LATENCY + BITSLIP_LATENCY;

// ══════════════════════════════════════════════════════════
// 1. Bare serializers
// ══════════════════════════════════════════════════════════

#[test]
fn test_oserdes_into_iserdes() {
    let mut ser = OSerdes::new(4);
    let mut des = ISerdes::new(4, 0);
    let words = [0xA5u8, 0x3C, 0x0F, 0xF0, 0x00, 0x00, 0x00, 0x00];
    let out: Vec<u8> = words
        .iter()
        .map(|&w| des.step(ser.drive(DdrWord(w))).0)
        .collect();
    let lag = SERIALIZER_LATENCY + DESERIALIZER_LATENCY;
    assert_eq!(&out[lag..], &words[..words.len() - lag]);
}

#[test]
fn test_half_rate_words_are_four_transitions() {
    let mut ser = OSerdes::new(2);
    let _ = ser.drive(DdrWord(0xFF));
    let _ = ser.drive(DdrWord(0x00));
    assert_eq!(ser.drive(DdrWord(0x00)), DdrWord(0x0F));
}

// ══════════════════════════════════════════════════════════
// 2. Command path
// ══════════════════════════════════════════════════════════

#[test]
fn test_clock_pattern() {
    let mut h = PhyHarness::new(&configs::ddr3_a7());
    h.run_idle(SERIALIZER_LATENCY + 2);
    for out in &h.history[SERIALIZER_LATENCY..] {
        assert_eq!(out.pads.clk, DdrWord(0b1010_1010));
    }
    let mut h = PhyHarness::new(&configs::ddr2_a7_half_rate());
    h.run_idle(SERIALIZER_LATENCY + 1);
    assert_eq!(h.history[SERIALIZER_LATENCY].pads.clk, DdrWord(0b1010));
}

#[test]
fn test_address_held_per_phase() {
    let mut h = PhyHarness::new(&configs::ddr3_a7());
    let mut cmd = h.phy.idle_command();
    if let Some(p) = cmd.phase_mut(0) {
        p.address = 0b01;
        p.bank = 0b100;
    }
    if let Some(p) = cmd.phase_mut(2) {
        p.address = 0b11;
        p.ras_n = false;
    }
    let _ = h.step(&cmd, &PadsIn::idle(16));
    h.run_idle(SERIALIZER_LATENCY);
    let pads = &h.history[SERIALIZER_LATENCY].pads;
    assert_eq!(pads.address[0], DdrWord(0b0011_0011));
    assert_eq!(pads.address[1], DdrWord(0b0011_0000));
    assert_eq!(pads.address[2], DdrWord::ZERO);
    assert_eq!(pads.bank[2], DdrWord(0b0000_0011));
    assert_eq!(pads.control.ras_n, DdrWord(0b1100_1111));
    assert_eq!(pads.control.cas_n, DdrWord(0xFF));
    assert_eq!(pads.address.len(), 14);
    assert_eq!(pads.bank.len(), 3);
}

#[test]
fn test_optional_control_pins() {
    let mut h = PhyHarness::new(&configs::ddr2_a7_half_rate());
    let _ = h.step_idle();
    assert!(h.history[0].pads.control.reset_n.is_none());
    assert!(h.history[0].pads.control.cs_n.is_empty());

    let config = PhyConfig {
        nranks: 2,
        has_cs_n: true,
        ..configs::ddr3_a7()
    };
    let mut h = PhyHarness::new(&config);
    let mut cmd = h.phy.idle_command();
    for p in 0..4 {
        if let Some(ph) = cmd.phase_mut(p) {
            ph.cs_n = 0b10;
            ph.cke = 0b11;
        }
    }
    let _ = h.step(&cmd, &PadsIn::idle(16));
    h.run_idle(SERIALIZER_LATENCY);
    let control = &h.history[SERIALIZER_LATENCY].pads.control;
    assert_eq!(control.cs_n, vec![DdrWord::ZERO, DdrWord(0xFF)]);
    assert_eq!(control.cke, vec![DdrWord(0xFF), DdrWord(0xFF)]);
    assert_eq!(control.odt, vec![DdrWord::ZERO, DdrWord::ZERO]);
    assert_eq!(control.reset_n, Some(DdrWord(0xFF)));
}

// ══════════════════════════════════════════════════════════
// 3. Data path
// ══════════════════════════════════════════════════════════

#[test]
fn test_data_and_mask_transitions() {
    let mut h = PhyHarness::new(&configs::ddr3_k7());
    let wl = h.phy.settings().write_latency;
    let issued = h.issue_write();
    for _ in 1..wl {
        let _ = h.step_idle();
    }
    let mut cmd = h.phy.idle_command();
    if let Some(p) = cmd.phase_mut(1) {
        // DQ 9 high on the rising edge, DQ 0 high on the falling edge.
        p.wrdata = (1 << 9) | (1 << 16);
        // Lane 1 masked on the falling edge.
        p.wrdata_mask = pack_wrdata_mask(2, |lane, falling| lane == 1 && falling);
    }
    let data_cycle = h.cycle();
    assert_eq!(data_cycle, issued + wl);
    let _ = h.step(&cmd, &PadsIn::idle(16));
    h.run_idle(SERIALIZER_LATENCY + 3);

    let pads = &h.history[data_cycle + SERIALIZER_LATENCY].pads;
    assert_eq!(pads.dq_driven(9), Some(DdrWord(0b0000_0100)));
    assert_eq!(pads.dq_driven(0), Some(DdrWord(0b0000_1000)));
    assert_eq!(pads.dq_driven(1), Some(DdrWord::ZERO));
    assert_eq!(pads.dm[0].drive.word, DdrWord::ZERO);
    assert_eq!(pads.dm[1].drive.word, DdrWord(0b0000_1000));
    // Outside the window the data pins float.
    let after = &h.history[data_cycle + SERIALIZER_LATENCY + 2].pads;
    assert_eq!(after.dq_driven(9), None);
}

/// Writes one burst of `wrdata` per phase and loops the pads back into the PHY.
fn write_loopback(h: &mut PhyHarness, wrdata: &[u128]) -> usize {
    let wl = h.phy.settings().write_latency;
    let databits = h.databits();
    let mut cmd = h.phy.idle_command();
    let wrphase = h.phy.settings().wrphase;
    if let Some(p) = cmd.phase_mut(wrphase) {
        p.wrdata_en = true;
    }
    let mut data = h.phy.idle_command();
    for (p, &d) in wrdata.iter().enumerate() {
        if let Some(ph) = data.phase_mut(p) {
            ph.wrdata = d;
        }
    }
    let idle = h.phy.idle_command();
    let start = h.cycle();
    let mut data_cycle = 0;
    let mut pads_in = PadsIn::idle(databits);
    for c in 0..wl + LOOPBACK_LATENCY + 4 {
        let this: &DfiCommand = if c == 0 {
            &cmd
        } else if c == wl {
            data_cycle = start + c;
            &data
        } else {
            &idle
        };
        let out = h.step(this, &pads_in);
        pads_in = PadsIn::loopback(&out.pads);
    }
    data_cycle
}

#[test]
fn test_write_read_loopback_aligned() {
    let mut h = PhyHarness::new(&configs::ddr3_k7());
    let wrdata: Vec<u128> = vec![0xDEAD_BEEF, 0x0123_4567, 0x89AB_CDEF, 0xFEDC_BA98];
    let data_cycle = write_loopback(&mut h, &wrdata);
    let read = &h.history[data_cycle + LOOPBACK_LATENCY].read;
    let got: Vec<u128> = read.iter().map(|p| p.rddata).collect();
    assert_eq!(got, wrdata);
}

#[test]
fn test_write_read_loopback_after_bitslip_calibration() {
    let config = PhyConfig {
        lane_skew: vec![3, 6],
        data_bits: 16,
        ..configs::ddr3_v7_1600()
    };
    let mut h = PhyHarness::new(&config);
    let wrdata: Vec<u128> = vec![0x1111_2222, 0x3333_4444, 0x5555_6666, 0x7777_8888];

    let data_cycle = write_loopback(&mut h, &wrdata);
    let got: Vec<u128> = h.history[data_cycle + LOOPBACK_LATENCY]
        .read
        .iter()
        .map(|p| p.rddata)
        .collect();
    assert_ne!(got, wrdata);

    for (lane, skew) in [(0, 3), (1, 6)] {
        h.phy.registers_mut().select_lane(lane);
        for _ in 0..skew {
            h.pulse(CalibrationPulse::BitslipInc);
        }
    }
    h.run_idle(8);
    let data_cycle = write_loopback(&mut h, &wrdata);
    let got: Vec<u128> = h.history[data_cycle + LOOPBACK_LATENCY]
        .read
        .iter()
        .map(|p| p.rddata)
        .collect();
    assert_eq!(got, wrdata);
}

#[test]
fn test_half_rate_loopback() {
    let mut h = PhyHarness::new(&configs::ddr2_a7_half_rate());
    let wrdata: Vec<u128> = vec![0xCAFE_F00D, 0x0BAD_C0DE];
    let data_cycle = write_loopback(&mut h, &wrdata);
    let got: Vec<u128> = h.history[data_cycle + LOOPBACK_LATENCY]
        .read
        .iter()
        .map(|p| p.rddata)
        .collect();
    assert_eq!(got, wrdata);
}
