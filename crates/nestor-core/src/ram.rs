use core::ops::{Deref, DerefMut};

/// Fixed-size, zero-initialised byte block used for every on-board memory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ram<const N: usize>([u8; N]);

pub mod cpu {
    use crate::memory::cpu as cpu_mem;

    /// 2 KiB work RAM behind `$0000-$1FFF`.
    pub type Ram = super::Ram<{ cpu_mem::INTERNAL_RAM_SIZE }>;
}

pub mod ppu {
    use crate::memory::ppu as ppu_mem;

    pub type Ciram = super::Ram<{ ppu_mem::CIRAM_SIZE }>;
    pub type PaletteRam = super::Ram<{ ppu_mem::PALETTE_RAM_SIZE }>;
    pub type OamRam = super::Ram<{ ppu_mem::OAM_RAM_SIZE }>;
}

impl<const N: usize> Ram<N> {
    pub fn new() -> Self {
        Self([0; N])
    }

    /// Block pre-filled with `value` (power-on RAM patterns).
    pub fn filled(value: u8) -> Self {
        Self([value; N])
    }

    pub fn read(&self, addr: usize) -> u8 {
        self.0[addr % N]
    }

    pub fn write(&mut self, addr: usize, value: u8) {
        self.0[addr % N] = value;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

impl<const N: usize> Default for Ram<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Deref for Ram<N> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<const N: usize> DerefMut for Ram<N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}
