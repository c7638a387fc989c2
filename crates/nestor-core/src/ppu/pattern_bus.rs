use crate::cartridge::{Mirroring, SharedCartridge};

/// Temporary view that lets the PPU reach cartridge CHR space.
///
/// The bus creates one per PPU call from its cartridge slot. A missing
/// cartridge reads as `0`, ignores writes and reports horizontal mirroring.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternBus<'a> {
    cartridge: Option<&'a SharedCartridge>,
}

impl<'a> PatternBus<'a> {
    pub fn new(cartridge: Option<&'a SharedCartridge>) -> Self {
        Self { cartridge }
    }

    /// Pattern-table read (`$0000-$1FFF`).
    pub fn read(&self, addr: u16) -> u8 {
        self.cartridge
            .and_then(|cart| cart.try_borrow().ok()?.ppu_read(addr))
            .unwrap_or(0)
    }

    /// Pattern-table write; returns whether storage accepted it.
    pub fn write(&self, addr: u16, data: u8) -> bool {
        self.cartridge
            .and_then(|cart| cart.try_borrow_mut().ok())
            .is_some_and(|mut cart| cart.ppu_write(addr, data))
    }

    pub fn mirroring(&self) -> Mirroring {
        self.cartridge
            .and_then(|cart| cart.try_borrow().ok().map(|cart| cart.mirroring()))
            .unwrap_or(Mirroring::Horizontal)
    }
}
