//! DDR PHY model CLI.
//!
//! This binary exposes the PHY model from the command line. It provides:
//! 1. **resolve:** CAS latencies a memory family needs at a given system clock.
//! 2. **settings:** The complete resolved settings of a configuration, as JSON.
//! 3. **calibrate:** A bitslip search over write/read loopback, lane by lane, as a
//!    calibration routine would run it against real pads.

use std::{fs, process};

use clap::{Parser, Subcommand};
use tracing::{debug, info};

use ddrphy_core::calibration::CalibrationPulse;
use ddrphy_core::common::constants::{
    BITSLIP_LATENCY, DESERIALIZER_LATENCY, LANE_WIDTH, SERIALIZER_LATENCY,
};
use ddrphy_core::config::PhyConfig;
use ddrphy_core::serdes::PadsIn;
use ddrphy_core::timing::{self, MemoryFamily};
use ddrphy_core::{Phy, PhySettings};

/// Cycles from presenting write data to reading it back when the pads are looped
/// back with one register in between.
const LOOPBACK_LATENCY: usize = SERIALIZER_LATENCY + 1 + DESERIALIZER_LATENCY + BITSLIP_LATENCY;

#[derive(Parser, Debug)]
#[command(
    name = "ddrphy",
    author,
    version,
    about = "Multi-phase DDR2/DDR3 PHY model",
    long_about = "Resolve latencies, inspect PHY settings, or run a loopback bitslip calibration.\n\nExamples:\n  ddrphy resolve --memtype DDR3 --sys-clk-freq 100e6 --nphases 4\n  ddrphy settings --config board.json\n  ddrphy calibrate --config board.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the CAS latencies (cl, cwl) selected for a system clock.
    Resolve {
        /// Memory family (DDR2 or DDR3).
        #[arg(long, default_value = "DDR3")]
        memtype: MemoryFamily,

        /// System clock frequency in Hz.
        #[arg(long, default_value_t = 100e6)]
        sys_clk_freq: f64,

        /// Phases per system cycle.
        #[arg(long, default_value_t = 4)]
        nphases: usize,
    },

    /// Print the resolved PHY settings as JSON.
    Settings {
        /// JSON configuration file; built-in defaults when omitted.
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Run a bitslip search over write/read loopback and report the rotation per lane.
    Calibrate {
        /// JSON configuration file; built-in defaults when omitted.
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Resolve {
            memtype,
            sys_clk_freq,
            nphases,
        } => cmd_resolve(memtype, sys_clk_freq, nphases),
        Commands::Settings { config } => cmd_settings(config.as_deref()),
        Commands::Calibrate { config } => cmd_calibrate(config.as_deref()),
    }
}

/// Loads a configuration file, or the defaults when no path is given. Exits on error.
fn load_config(path: Option<&str>) -> PhyConfig {
    let Some(path) = path else {
        return PhyConfig::default();
    };
    let text = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error reading config {path}: {e}");
        process::exit(1);
    });
    PhyConfig::from_json(&text).unwrap_or_else(|e| {
        eprintln!("Error in config {path}: {e}");
        process::exit(1);
    })
}

fn build_phy(config: &PhyConfig) -> Phy {
    Phy::new(config).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    })
}

fn cmd_resolve(memtype: MemoryFamily, sys_clk_freq: f64, nphases: usize) {
    let tck = timing::memory_clock_period(nphases, sys_clk_freq);
    match timing::resolve(memtype, tck) {
        Ok(lat) => {
            println!(
                "{memtype} @ {:.1} MT/s: cl={} cwl={}",
                2.0 / tck / 1e6,
                lat.cl,
                lat.cwl
            );
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn cmd_settings(path: Option<&str>) {
    let config = load_config(path);
    let settings = PhySettings::new(&config).unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });
    match serde_json::to_string_pretty(&settings) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error serializing settings: {e}");
            process::exit(1);
        }
    }
}

/// Training pattern: one pseudo-random DFI word per phase, cut to the DFI width.
fn training_pattern(settings: &PhySettings) -> Vec<u128> {
    let mask = u128::MAX >> (128 - settings.dfi_databits);
    let mut state: u128 = 0x9E37_79B9_7F4A_7C15_F39C_C060_5CED_C834;
    (0..settings.nphases)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state & mask
        })
        .collect()
}

/// DFI data bits belonging to `lane`, both edges.
fn lane_mask(lane: usize, databits: usize) -> u128 {
    let byte = 0xFFu128 << (lane * LANE_WIDTH);
    byte | (byte << databits)
}

/// Writes `pattern` with the pads looped back and returns the read data of the cycle
/// the burst arrives on.
fn loopback_burst(phy: &mut Phy, pattern: &[u128]) -> Vec<u128> {
    let settings = phy.settings().clone();
    let mut pads_in = PadsIn::idle(settings.databits());
    let mut captured = Vec::new();
    let arrival = settings.write_latency + LOOPBACK_LATENCY;
    for cycle in 0..=arrival + 2 {
        let mut cmd = phy.idle_command();
        if cycle == 0 {
            if let Some(p) = cmd.phase_mut(settings.wrphase) {
                p.wrdata_en = true;
            }
        }
        if cycle == settings.write_latency {
            for (p, &word) in pattern.iter().enumerate() {
                if let Some(phase) = cmd.phase_mut(p) {
                    phase.wrdata = word;
                }
            }
        }
        let out = phy.step(&cmd, &pads_in);
        if cycle == arrival {
            captured = out.read.iter().map(|p| p.rddata).collect();
        }
        pads_in = PadsIn::loopback(&out.pads);
    }
    captured
}

fn cmd_calibrate(path: Option<&str>) {
    let config = load_config(path);
    let mut phy = build_phy(&config);
    let settings = phy.settings().clone();
    let lanes = settings.lanes();
    let databits = settings.databits();
    let pattern = training_pattern(&settings);

    let mut found: Vec<Option<usize>> = vec![None; lanes];
    for rotation in 0..settings.word_width() {
        let read = loopback_burst(&mut phy, &pattern);
        for (lane, slot) in found.iter_mut().enumerate() {
            if slot.is_some() {
                continue;
            }
            let mask = lane_mask(lane, databits);
            let aligned = read
                .iter()
                .zip(&pattern)
                .all(|(got, want)| got & mask == want & mask);
            if aligned {
                debug!(lane, rotation, "lane aligned");
                *slot = Some(rotation);
            }
        }
        let pending = found
            .iter()
            .enumerate()
            .filter(|(_, f)| f.is_none())
            .fold(0u32, |m, (lane, _)| m | (1 << lane));
        if pending == 0 {
            break;
        }
        phy.registers_mut().select_lanes(pending);
        if let Err(e) = phy.registers_mut().pulse(CalibrationPulse::BitslipInc) {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }

    let mut failed = false;
    for (lane, rotation) in found.iter().enumerate() {
        match rotation {
            Some(r) => println!("lane {lane}: bitslip {r}"),
            None => {
                println!("lane {lane}: no alignment found");
                failed = true;
            }
        }
    }
    info!(lanes, failed, "calibration finished");
    phy.stats().print();
    if failed {
        process::exit(1);
    }
}
