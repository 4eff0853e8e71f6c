//! Flow-Control Pipeline Tests.
//!
//! Verifies the write output-enable window, strobe preamble/postamble placement and
//! the read-valid delay, both on the bare pipelines and through a whole PHY.

use ddrphy_core::common::DdrWord;
use ddrphy_core::common::constants::{DQS_PATTERN, SERIALIZER_LATENCY};
use ddrphy_core::config::PhyConfig;
use ddrphy_core::flow::{ReadFlow, WriteFlow, WriteWindow};
use ddrphy_core::serdes::PadsIn;
use proptest::prelude::*;
use rstest::rstest;

use crate::common::configs;
use crate::common::harness::PhyHarness;

/// Steps `flow` for `cycles` cycles with `wrdata_en` high only on cycle 0.
fn single_write(flow: &mut WriteFlow, cycles: usize) -> Vec<WriteWindow> {
    (0..cycles).map(|c| flow.step(c == 0)).collect()
}

// ══════════════════════════════════════════════════════════
// 1. Write window
// ══════════════════════════════════════════════════════════

#[rstest]
#[case::wl1(1)]
#[case::wl2(2)]
#[case::wl3(3)]
#[case::wl5(5)]
fn test_write_window_position(#[case] wl: usize) {
    let mut flow = WriteFlow::new(wl, wl - 1);
    assert_eq!(flow.depth(), wl + 2);
    let windows = single_write(&mut flow, wl + 6);
    let oe: Vec<usize> = (0..windows.len()).filter(|&c| windows[c].oe).collect();
    assert_eq!(oe, vec![wl - 1, wl, wl + 1]);
}

#[rstest]
#[case::wl1(1)]
#[case::wl2(2)]
#[case::wl3(3)]
#[case::wl4(4)]
fn test_strobe_low_either_side_of_data_cycle(#[case] wl: usize) {
    let mut flow = WriteFlow::new(wl, wl - 1);
    let windows = single_write(&mut flow, wl + 6);
    let preamble: Vec<usize> = (0..windows.len())
        .filter(|&c| windows[c].preamble)
        .collect();
    let postamble: Vec<usize> = (0..windows.len())
        .filter(|&c| windows[c].postamble)
        .collect();
    assert_eq!(preamble, vec![wl - 1]);
    assert_eq!(postamble, vec![wl + 1]);
    // Both sit inside the output-enable window; the data cycle between them toggles.
    assert!(windows[wl - 1].oe && windows[wl + 1].oe);
    assert!(!windows[wl].preamble && !windows[wl].postamble);
}

#[test]
fn test_early_strobe_latency_shifts_preamble() {
    let mut flow = WriteFlow::new(3, 0);
    let windows = single_write(&mut flow, 8);
    assert!(windows[0].preamble);
    assert!(windows[2].postamble);
    assert_eq!(windows.iter().filter(|w| w.preamble || w.postamble).count(), 2);
}

#[test]
fn test_back_to_back_writes_merge_window() {
    let mut flow = WriteFlow::new(2, 1);
    let windows: Vec<WriteWindow> = (0..8).map(|c| flow.step(c < 2)).collect();
    let oe: Vec<usize> = (0..8).filter(|&c| windows[c].oe).collect();
    assert_eq!(oe, vec![1, 2, 3, 4]);
    // Only the leading edge has a preamble, only the trailing edge a postamble.
    let preamble: Vec<usize> = (0..8).filter(|&c| windows[c].preamble).collect();
    let postamble: Vec<usize> = (0..8).filter(|&c| windows[c].postamble).collect();
    assert_eq!(preamble, vec![1]);
    assert_eq!(postamble, vec![4]);
}

proptest! {
    #[test]
    fn prop_write_window_follows_enable(wl in 1usize..8, start in 0usize..6) {
        let mut flow = WriteFlow::new(wl, wl - 1);
        let windows: Vec<WriteWindow> = (0..start + wl + 6).map(|c| flow.step(c == start)).collect();
        for (c, w) in windows.iter().enumerate() {
            let expected = c + 1 >= start + wl && c <= start + wl + 1;
            prop_assert_eq!(w.oe, expected, "cycle {}", c);
        }
    }
}

// ══════════════════════════════════════════════════════════
// 2. Read valid
// ══════════════════════════════════════════════════════════

#[rstest]
#[case::rl2(2)]
#[case::rl8(8)]
#[case::rl9(9)]
fn test_read_flow_delay(#[case] rl: usize) {
    let mut flow = ReadFlow::new(rl);
    assert_eq!(flow.depth(), rl - 1);
    let valid: Vec<usize> = (0..rl + 4).filter(|&c| flow.step(c == 0)).collect();
    assert_eq!(valid, vec![rl - 1]);
}

#[test]
fn test_rddata_valid_at_read_latency_for_every_config() {
    for config in configs::all() {
        let mut h = PhyHarness::new(&config);
        let rl = h.phy.settings().read_latency;
        h.run_idle(3);
        let issued = h.issue_read();
        h.run_idle(rl + 2);
        assert_eq!(h.valid_cycles(), vec![issued + rl - 1], "{config:?}");
        let last = &h.history[issued + rl - 1];
        assert!(last.read.iter().all(|p| p.rddata_valid));
    }
}

#[test]
fn test_read_burst_keeps_valid_contiguous() {
    let mut h = PhyHarness::new(&configs::ddr3_a7());
    let rl = h.phy.settings().read_latency;
    let first = h.issue_read();
    let _ = h.issue_read();
    let _ = h.issue_read();
    h.run_idle(rl);
    let expected: Vec<usize> = (first + rl - 1..first + rl + 2).collect();
    assert_eq!(h.valid_cycles(), expected);
}

// ══════════════════════════════════════════════════════════
// 3. Through the PHY
// ══════════════════════════════════════════════════════════

#[rstest]
#[case::ddr3_k7(configs::ddr3_k7())]
#[case::ddr3_v7_1600(configs::ddr3_v7_1600())]
#[case::ddr2_k7(configs::ddr2_k7())]
#[case::ddr3_a7(configs::ddr3_a7())]
fn test_dq_output_enable_at_pads(#[case] config: PhyConfig) {
    let mut h = PhyHarness::new(&config);
    let wl = h.phy.settings().write_latency;
    h.run_idle(2);
    let issued = h.issue_write();
    h.run_idle(wl + SERIALIZER_LATENCY + 4);
    let driven: Vec<usize> = h
        .history
        .iter()
        .enumerate()
        .filter(|(_, o)| o.pads.dq.iter().all(|pad| pad.drive.oe))
        .map(|(c, _)| c)
        .collect();
    let start = issued + wl - 1 + SERIALIZER_LATENCY;
    assert_eq!(driven, vec![start, start + 1, start + 2]);
    // DQS follows the same window.
    for (c, out) in h.history.iter().enumerate() {
        let dqs_oe = out.pads.dqs.iter().all(|pad| pad.drive.oe);
        assert_eq!(dqs_oe, driven.contains(&c), "cycle {c}");
    }
}

#[test]
fn test_strobe_toggles_on_data_cycle_for_every_config() {
    for config in configs::all() {
        let mut h = PhyHarness::new(&config);
        let s = h.phy.settings().clone();
        let databits = h.databits();
        h.run_idle(2);
        let issued = h.issue_write();
        h.run_idle(s.write_latency - 1);

        let mut data = h.phy.idle_command();
        let ones = u128::MAX >> (128 - 2 * databits);
        for p in 0..s.nphases {
            if let Some(ph) = data.phase_mut(p) {
                ph.wrdata = ones;
            }
        }
        let pads = PadsIn::idle(databits);
        let _ = h.step(&data, &pads);
        h.run_idle(SERIALIZER_LATENCY + 4);

        let d = issued + s.write_latency + SERIALIZER_LATENCY;
        let all_ones = DdrWord(DdrWord::mask(s.nphases));
        assert_eq!(h.history[d].pads.dq_driven(0), Some(all_ones), "{config:?}");
        for strobe in &h.history[d].pads.dqs {
            assert!(strobe.drive.oe, "{config:?}");
            assert_eq!(
                strobe.drive.word,
                DdrWord::pattern(DQS_PATTERN, s.nphases),
                "{config:?}"
            );
        }
        for c in [d - 1, d + 1] {
            assert!(h.history[c].pads.dq_driven(0).is_some(), "{config:?} cycle {c}");
            for strobe in &h.history[c].pads.dqs {
                assert!(strobe.drive.oe, "{config:?} cycle {c}");
                assert_eq!(strobe.drive.word, DdrWord(0), "{config:?} cycle {c}");
            }
        }
    }
}
