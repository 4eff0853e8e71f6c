//! Top-level PHY.
//!
//! [`Phy`] owns every per-pin component and advances them together, once per system
//! clock, in a fixed order:
//! 1. **Calibration:** pulses latched in the register file reach the selected lanes.
//! 2. **Flow control:** `wrdata_en`/`rddata_en` enter their pipelines; the write window
//!    and write-leveling state decide strobe pattern and output enables.
//! 3. **Command path:** clock, address, bank and control pins are serialized.
//! 4. **Data path:** each lane serializes DQ/DM/DQS and deserializes, aligns and
//!    reassembles DQ into phase words.
//!
//! Settings are frozen at construction; only the register file changes between cycles.

use tracing::{info, trace};

use crate::calibration::CalibrationRegisters;
use crate::common::constants::{CLK_PATTERN, LANE_WIDTH};
use crate::common::{DdrWord, PhyResult};
use crate::config::PhyConfig;
use crate::dfi::{DfiCommand, DfiReadPhase};
use crate::flow::{ReadFlow, WriteFlow};
use crate::lane::ByteLane;
use crate::leveling::WriteLeveling;
use crate::serdes::{ControlPads, OSerdes, PadsIn, PadsOut};
use crate::settings::PhySettings;
use crate::stats::PhyStats;

/// What the PHY produces in one system cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhyOutputs {
    /// Pads driven this cycle.
    pub pads: PadsOut,
    /// Read half of every phase.
    pub read: Vec<DfiReadPhase>,
}

impl PhyOutputs {
    /// `rddata_valid` of the read phases (identical across phases).
    pub fn rddata_valid(&self) -> bool {
        self.read.first().is_some_and(|p| p.rddata_valid)
    }
}

/// Serializers for the clock and every command/address pin.
#[derive(Debug, Clone)]
struct CommandPath {
    nphases: usize,
    clk: OSerdes,
    address: Vec<OSerdes>,
    bank: Vec<OSerdes>,
    ras_n: OSerdes,
    cas_n: OSerdes,
    we_n: OSerdes,
    cke: Vec<OSerdes>,
    odt: Vec<OSerdes>,
    reset_n: Option<OSerdes>,
    cs_n: Vec<OSerdes>,
}

impl CommandPath {
    fn new(config: &PhyConfig) -> Self {
        let n = config.nphases;
        let bank_of = |count: usize| (0..count).map(|_| OSerdes::new(n)).collect::<Vec<_>>();
        Self {
            nphases: n,
            clk: OSerdes::new(n),
            address: bank_of(config.address_bits),
            bank: bank_of(config.bank_bits),
            ras_n: OSerdes::new(n),
            cas_n: OSerdes::new(n),
            we_n: OSerdes::new(n),
            cke: bank_of(config.nranks),
            odt: bank_of(config.nranks),
            reset_n: config.has_reset_n.then(|| OSerdes::new(n)),
            cs_n: if config.has_cs_n {
                bank_of(config.nranks)
            } else {
                Vec::new()
            },
        }
    }

    fn step(&mut self, cmd: &DfiCommand, pads: &mut PadsOut) {
        let n = self.nphases;
        let held = |level: &dyn Fn(usize) -> bool| DdrWord::held(n, level);
        let bit = |v: u32, i: usize| (v >> i) & 1 == 1;

        pads.clk = self.clk.drive(DdrWord::pattern(CLK_PATTERN, n));
        pads.address = self
            .address
            .iter_mut()
            .enumerate()
            .map(|(i, s)| s.drive(held(&|p| bit(cmd.phase(p).address, i))))
            .collect();
        pads.bank = self
            .bank
            .iter_mut()
            .enumerate()
            .map(|(i, s)| s.drive(held(&|p| bit(u32::from(cmd.phase(p).bank), i))))
            .collect();

        let per_rank = |serdes: &mut Vec<OSerdes>, field: fn(&crate::dfi::DfiPhase) -> u8| {
            serdes
                .iter_mut()
                .enumerate()
                .map(|(r, s)| s.drive(held(&|p| bit(u32::from(field(cmd.phase(p))), r))))
                .collect::<Vec<_>>()
        };
        pads.control = ControlPads {
            ras_n: self.ras_n.drive(held(&|p| cmd.phase(p).ras_n)),
            cas_n: self.cas_n.drive(held(&|p| cmd.phase(p).cas_n)),
            we_n: self.we_n.drive(held(&|p| cmd.phase(p).we_n)),
            cke: per_rank(&mut self.cke, |ph| ph.cke),
            odt: per_rank(&mut self.odt, |ph| ph.odt),
            reset_n: self
                .reset_n
                .as_mut()
                .map(|s| s.drive(held(&|p| cmd.phase(p).reset_n))),
            cs_n: per_rank(&mut self.cs_n, |ph| ph.cs_n),
        };
    }
}

/// A DDR PHY instance.
#[derive(Debug, Clone)]
pub struct Phy {
    settings: PhySettings,
    registers: CalibrationRegisters,
    command: CommandPath,
    lanes: Vec<ByteLane>,
    write_flow: WriteFlow,
    read_flow: ReadFlow,
    leveling: WriteLeveling,
    stats: PhyStats,
    last_wrdata_en: bool,
    last_rddata_en: bool,
}

impl Phy {
    /// Builds a PHY for `config`.
    ///
    /// # Errors
    ///
    /// Propagates every error of [`PhySettings::new`].
    pub fn new(config: &PhyConfig) -> PhyResult<Self> {
        let settings = PhySettings::new(config)?;
        let n = settings.nphases;
        let lanes = (0..settings.lanes())
            .map(|i| {
                let skew = config.lane_skew.get(i).copied().unwrap_or(0);
                ByteLane::new(i, n, skew, settings.io_delay_tap_base)
            })
            .collect();
        info!(
            arch = ?config.arch,
            databits = settings.databits(),
            lanes = settings.lanes(),
            io_delay_tap_base = settings.io_delay_tap_base,
            "built DDR PHY"
        );
        Ok(Self {
            registers: CalibrationRegisters::new(
                settings.lanes(),
                settings.with_odelay,
                settings.io_delay_tap_base,
            ),
            command: CommandPath::new(config),
            lanes,
            write_flow: WriteFlow::new(settings.write_latency, settings.dqs_latency),
            read_flow: ReadFlow::new(settings.read_latency),
            leveling: WriteLeveling::new(n),
            stats: PhyStats::default(),
            last_wrdata_en: false,
            last_rddata_en: false,
            settings,
        })
    }

    /// Settings shared with the controller.
    pub const fn settings(&self) -> &PhySettings {
        &self.settings
    }

    /// Calibration register file (read side).
    pub const fn registers(&self) -> &CalibrationRegisters {
        &self.registers
    }

    /// Calibration register file (write side). Only one calibration sequence may hold it.
    pub const fn registers_mut(&mut self) -> &mut CalibrationRegisters {
        &mut self.registers
    }

    /// All byte lanes.
    pub fn lanes(&self) -> &[ByteLane] {
        &self.lanes
    }

    /// Byte lane `index`.
    pub fn lane(&self, index: usize) -> Option<&ByteLane> {
        self.lanes.get(index)
    }

    /// Activity counters.
    pub const fn stats(&self) -> &PhyStats {
        &self.stats
    }

    /// An idle command for this PHY's phase count.
    pub fn idle_command(&self) -> DfiCommand {
        DfiCommand::idle(self.settings.nphases)
    }

    /// Advances the PHY by one system cycle.
    ///
    /// `cmd` is the controller's phase bus for this cycle and `pads_in` what the bus
    /// presents on the DQ pins. Missing phases read as idle and missing pins as low.
    pub fn step(&mut self, cmd: &DfiCommand, pads_in: &PadsIn) -> PhyOutputs {
        let n = self.settings.nphases;
        let databits = self.settings.databits();
        let nlanes = self.settings.lanes();
        self.stats.cycles += 1;

        let pulses = self.registers.take_pulses();
        self.stats.calibration_pulses += pulses.count();
        if pulses.any_lane_pulse() {
            for lane in &mut self.lanes {
                if self.registers.is_selected(lane.index()) {
                    lane.calibrate(&pulses);
                    self.stats.lane_updates += 1;
                }
            }
        }

        let wr = cmd.phase(self.settings.wrphase);
        let rd = cmd.phase(self.settings.rdphase);
        if wr.wrdata_en && !self.last_wrdata_en {
            self.stats.write_bursts += 1;
            trace!(cycle = self.stats.cycles, "write burst start");
        }
        if rd.rddata_en && !self.last_rddata_en {
            self.stats.read_bursts += 1;
            trace!(cycle = self.stats.cycles, "read burst start");
        }
        self.last_wrdata_en = wr.wrdata_en;
        self.last_rddata_en = rd.rddata_en;

        let window = self.write_flow.step(wr.wrdata_en);
        let leveling = self.registers.write_level_enable();
        let strobe = self
            .leveling
            .step(leveling, pulses.write_level_strobe, window);
        if leveling {
            self.stats.leveling_cycles += 1;
        }
        let valid = self.read_flow.step(rd.rddata_en) || strobe.force_valid;
        if valid {
            self.stats.valid_cycles += 1;
        }

        let mut pads = PadsOut::default();
        self.command.step(cmd, &mut pads);

        let mut read = vec![
            DfiReadPhase {
                rddata: 0,
                rddata_valid: valid,
            };
            n
        ];
        for lane in &mut self.lanes {
            let base = lane.index() * LANE_WIDTH;
            let li = lane.index();
            let dq: Vec<DdrWord> = (base..base + LANE_WIDTH)
                .map(|pin| {
                    DdrWord::from_phases(n, |p| {
                        let ph = cmd.phase(p);
                        (
                            ph.wrdata_bit(databits, pin, false),
                            ph.wrdata_bit(databits, pin, true),
                        )
                    })
                })
                .collect();
            let dm = DdrWord::from_phases(n, |p| {
                let ph = cmd.phase(p);
                (
                    ph.wrdata_mask_bit(nlanes, li, false),
                    ph.wrdata_mask_bit(nlanes, li, true),
                )
            });
            let drive = lane.drive(&dq, dm, &strobe);
            pads.dq.extend(drive.dq);
            pads.dm.push(drive.dm);
            pads.dqs.push(drive.dqs);

            let sampled: Vec<DdrWord> = (base..base + LANE_WIDTH)
                .map(|pin| pads_in.pin(pin))
                .collect();
            for (k, word) in lane.capture(&sampled).into_iter().enumerate() {
                let pin = base + k;
                for (p, phase) in read.iter_mut().enumerate() {
                    let (rise, fall) = word.phase(p);
                    phase.rddata |= u128::from(rise) << pin;
                    phase.rddata |= u128::from(fall) << (databits + pin);
                }
            }
        }

        PhyOutputs { pads, read }
    }
}
