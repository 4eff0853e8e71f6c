//! Write-Leveling Tests.
//!
//! Verifies the strobe pattern, output enables and forced read-valid while the PHY
//! is in write-leveling mode.

use ddrphy_core::calibration::CalibrationPulse;
use ddrphy_core::common::DdrWord;
use ddrphy_core::common::constants::SERIALIZER_LATENCY;

use crate::common::configs;
use crate::common::harness::PhyHarness;

#[test]
fn test_leveling_unavailable_without_output_delays() {
    let mut h = PhyHarness::new(&configs::ddr3_a7());
    assert!(h.phy.registers_mut().set_write_leveling(true).is_err());
    assert!(!h.phy.registers().write_level_enable());
}

#[test]
fn test_leveling_forces_valid_and_strobe_enable() {
    let mut h = PhyHarness::new(&configs::ddr3_k7());
    assert!(h.phy.registers_mut().set_write_leveling(true).is_ok());
    h.run_idle(SERIALIZER_LATENCY + 2);
    for out in &h.history {
        assert!(out.rddata_valid());
    }
    for out in &h.history[SERIALIZER_LATENCY..] {
        assert!(out.pads.dqs.iter().all(|p| p.drive.oe && p.drive.word == DdrWord::ZERO));
        assert!(out.pads.dq.iter().all(|p| !p.drive.oe));
    }
}

#[test]
fn test_strobe_pulse_injects_single_edge() {
    let mut h = PhyHarness::new(&configs::ddr3_k7());
    assert!(h.phy.registers_mut().set_write_leveling(true).is_ok());
    h.run_idle(2);
    let at = h.cycle();
    h.pulse(CalibrationPulse::WriteLevelStrobe);
    h.run_idle(SERIALIZER_LATENCY + 2);
    let edges: Vec<usize> = h
        .history
        .iter()
        .enumerate()
        .filter(|(_, o)| o.pads.dqs[0].drive.word != DdrWord::ZERO)
        .map(|(c, _)| c)
        .collect();
    assert_eq!(edges, vec![at + SERIALIZER_LATENCY]);
    assert_eq!(
        h.history[at + SERIALIZER_LATENCY].pads.dqs[1].drive.word,
        DdrWord(0b0000_0001)
    );
}

#[test]
fn test_leaving_leveling_restores_flow_control() {
    let mut h = PhyHarness::new(&configs::ddr2_k7());
    assert!(h.phy.registers_mut().set_write_leveling(true).is_ok());
    h.run_idle(3);
    assert!(h.phy.registers_mut().set_write_leveling(false).is_ok());
    let leaving = h.cycle();
    h.run_idle(SERIALIZER_LATENCY + 3);
    assert!(h.history[leaving..].iter().all(|o| !o.rddata_valid()));
    let settled = &h.history[leaving + SERIALIZER_LATENCY];
    assert!(settled.pads.dqs.iter().all(|p| !p.drive.oe));
    assert_eq!(h.phy.stats().leveling_cycles, 3);
}
