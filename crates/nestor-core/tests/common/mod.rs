#![allow(dead_code)]

use anyhow::{Context, Result};
use ctor::ctor;
use nestor_core::{Bus, SharedCartridge};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[ctor]
fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");
}

pub const PRG_BANK_SIZE: usize = 0x4000;
pub const CHR_BANK_SIZE: usize = 0x2000;

/// Where [`nrom_program`] places the NMI handler inside the PRG image.
pub const NMI_HANDLER: u16 = 0x9000;
/// Zero-page counter the NMI handler increments.
pub const NMI_COUNTER: u16 = 0x0020;

/// Builds an iNES 1.0 image.
#[derive(Debug, Clone)]
pub struct RomBuilder {
    prg: Vec<u8>,
    chr: Vec<u8>,
    mapper: u8,
    vertical: bool,
}

impl RomBuilder {
    /// `prg_banks` x 16 KiB of `0xEA` (NOP) with one 8 KiB CHR bank.
    pub fn new(prg_banks: usize) -> Self {
        Self {
            prg: vec![0xEA; prg_banks * PRG_BANK_SIZE],
            chr: vec![0; CHR_BANK_SIZE],
            mapper: 0,
            vertical: false,
        }
    }

    pub fn mapper(mut self, id: u8) -> Self {
        self.mapper = id;
        self
    }

    pub fn vertical(mut self) -> Self {
        self.vertical = true;
        self
    }

    pub fn chr_banks(mut self, banks: usize) -> Self {
        self.chr = vec![0; banks * CHR_BANK_SIZE];
        self
    }

    /// Copies `bytes` to the PRG image at CPU address `addr` (`$8000-$FFFF`,
    /// folded onto the last bank when the image is smaller than 32 KiB).
    pub fn at(mut self, addr: u16, bytes: &[u8]) -> Self {
        let offset = (addr as usize - 0x8000) % self.prg.len();
        self.prg[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn fill_prg(mut self, f: impl FnMut(usize) -> u8) -> Self {
        self.prg = (0..self.prg.len()).map(f).collect();
        self
    }

    /// Writes the NMI, reset and IRQ vectors.
    pub fn vectors(self, nmi: u16, reset: u16, irq: u16) -> Self {
        let mut bytes = [0u8; 6];
        bytes[..2].copy_from_slice(&nmi.to_le_bytes());
        bytes[2..4].copy_from_slice(&reset.to_le_bytes());
        bytes[4..].copy_from_slice(&irq.to_le_bytes());
        self.at(0xFFFA, &bytes)
    }

    pub fn build(&self) -> Vec<u8> {
        let flags6 = ((self.mapper & 0x0F) << 4) | u8::from(self.vertical);
        let flags7 = self.mapper & 0xF0;
        let mut rom = vec![
            b'N',
            b'E',
            b'S',
            0x1A,
            (self.prg.len() / PRG_BANK_SIZE) as u8,
            (self.chr.len() / CHR_BANK_SIZE) as u8,
            flags6,
            flags7,
        ];
        rom.resize(16, 0);
        rom.extend_from_slice(&self.prg);
        rom.extend_from_slice(&self.chr);
        rom
    }
}

/// NROM-128 image running `main` from `$8000` with an NMI handler at
/// [`NMI_HANDLER`] that increments [`NMI_COUNTER`] and returns.
pub fn nrom_program(main: &[u8]) -> Vec<u8> {
    RomBuilder::new(1)
        .at(0x8000, main)
        // INC $20; RTI
        .at(NMI_HANDLER, &[0xE6, NMI_COUNTER as u8, 0x40])
        .vectors(NMI_HANDLER, 0x8000, 0x8000)
        .build()
}

/// Main loop that spins forever: `JMP $8000`.
pub const IDLE_LOOP: [u8; 3] = [0x4C, 0x00, 0x80];

/// Bus with `rom` inserted and powered on.
pub fn boot(rom: &[u8]) -> Result<(Bus, SharedCartridge)> {
    let mut bus = Bus::new();
    let cart = bus.insert_rom(rom).context("inserting test ROM")?;
    Ok((bus, cart))
}

/// Clocks the bus for `cycles` CPU cycle slots.
pub fn run_cpu_cycles(bus: &mut Bus, cycles: u64) {
    for _ in 0..cycles * 3 {
        bus.clock();
    }
}
