//! Statistics Tests.

use ddrphy_core::calibration::CalibrationPulse;
use ddrphy_core::stats::PhyStats;
use pretty_assertions::assert_eq;

use crate::common::configs;
use crate::common::harness::PhyHarness;

#[test]
fn test_counts_bursts_and_cycles() {
    let mut h = PhyHarness::new(&configs::ddr3_a7());
    let rl = h.phy.settings().read_latency;
    let _ = h.issue_write();
    let _ = h.issue_write();
    h.run_idle(1);
    let _ = h.issue_write();
    let _ = h.issue_read();
    let _ = h.issue_read();
    h.phy.registers_mut().select_lane(0);
    h.pulse(CalibrationPulse::BitslipInc);
    h.run_idle(rl);

    let stats = *h.phy.stats();
    assert_eq!(
        stats,
        PhyStats {
            cycles: 7 + rl as u64,
            write_bursts: 2,
            read_bursts: 1,
            valid_cycles: 2,
            calibration_pulses: 1,
            lane_updates: 1,
            leveling_cycles: 0,
        }
    );
    assert!(stats.read_utilization() > 0.0);
}

#[test]
fn test_display_lists_counters() {
    let stats = PhyStats {
        cycles: 100,
        write_bursts: 3,
        read_bursts: 4,
        valid_cycles: 25,
        ..PhyStats::default()
    };
    let text = stats.to_string();
    assert!(text.contains("100"));
    assert!(text.contains("25.00%"));
}
