//! Mapper 0 (NROM) implementation.
//!
//! NROM has no banking hardware: the CPU sees the whole PRG ROM at
//! `$8000-$FFFF` and the PPU sees the whole CHR at `$0000-$1FFF`.
//!
//! - **NROM-128 (one 16 KiB bank)**: mirrored at `$8000-$BFFF` and `$C000-$FFFF`.
//! - **NROM-256 (two 16 KiB banks)**: occupies the full 32 KiB window.
//! - **CHR**: 8 KiB, addressed directly.
//!
//! PRG is ROM, so CPU writes are never translated. The PPU write path is left
//! open for CHR: boards declaring zero CHR banks carry CHR RAM, and the same
//! translation is applied to CHR ROM boards as a known simplification.
//!
//! # Reference
//! - [NROM on NESdev Wiki](https://www.nesdev.org/wiki/NROM)

use std::borrow::Cow;

use crate::{cartridge::Mapper, memory::cpu as cpu_mem, memory::ppu as ppu_mem};

const PRG_MASK_ONE_BANK: u16 = 0x3FFF;
const PRG_MASK_TWO_BANKS: u16 = 0x7FFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapper0 {
    prg_banks: u8,
}

impl Mapper0 {
    pub fn new(prg_banks: u8) -> Self {
        Self { prg_banks }
    }

    fn prg_mask(&self) -> u16 {
        if self.prg_banks > 1 {
            PRG_MASK_TWO_BANKS
        } else {
            PRG_MASK_ONE_BANK
        }
    }
}

impl Mapper for Mapper0 {
    fn cpu_map_read(&self, addr: u16) -> Option<usize> {
        (addr >= cpu_mem::PRG_ROM_START).then(|| (addr & self.prg_mask()) as usize)
    }

    fn cpu_map_write(&mut self, _addr: u16, _data: u8) -> Option<usize> {
        None
    }

    fn ppu_map_read(&self, addr: u16) -> Option<usize> {
        Some((addr & ppu_mem::PATTERN_TABLE_END) as usize)
    }

    fn ppu_map_write(&mut self, addr: u16, _data: u8) -> Option<usize> {
        Some((addr & ppu_mem::PATTERN_TABLE_END) as usize)
    }

    fn mapper_id(&self) -> u8 {
        0
    }

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("NROM")
    }
}
