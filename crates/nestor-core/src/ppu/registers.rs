//! CPU-visible PPU register state and the internal VRAM address latches.
//!
//! Mirrors the `$2000-$2007` register set and the `v/t/x/w` latches from the
//! NESdev loopy documentation. Bit layouts live in the submodules.

mod control;
mod mask;
mod status;
mod vram_addr;
mod vram_registers;

pub use control::Control;
pub use mask::Mask;
pub use status::Status;
pub use vram_addr::VramAddr;
pub use vram_registers::VramRegisters;

/// Aggregates the state behind `$2000-$2007`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Registers {
    pub control: Control,
    pub mask: Mask,
    pub status: Status,
    /// OAM pointer driven by `$2003` and advanced by `$2004` writes.
    pub oam_addr: u8,
    pub vram: VramRegisters,
    /// Delayed `$2007` read buffer.
    pub read_buffer: u8,
    /// Last value written to or read from any register; undriven bits of
    /// `$2002` and reads of write-only registers return it.
    pub io_latch: u8,
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// `$2000` write; the nametable bits also land in `t`.
    pub fn write_control(&mut self, value: u8) {
        self.control = Control::from_bits_retain(value);
        self.vram.t.set_nametable(self.control.nametable_index());
    }

    /// `$2002` read: vblank flag and `w` are cleared.
    pub fn read_status(&mut self) -> u8 {
        let value = self.peek_status();
        self.status.remove(Status::VERTICAL_BLANK);
        self.vram.w = false;
        value
    }

    pub fn peek_status(&self) -> u8 {
        (self.status.bits() & 0xE0) | (self.io_latch & 0x1F)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_write_updates_t_nametable() {
        let mut regs = Registers::new();
        regs.write_control(0b0000_0011);
        assert_eq!(regs.vram.t.nametable(), 3);
    }

    #[test]
    fn status_read_clears_vblank_and_toggle() {
        let mut regs = Registers::new();
        regs.status.insert(Status::VERTICAL_BLANK | Status::SPRITE_ZERO_HIT);
        regs.vram.w = true;
        regs.io_latch = 0x1F;
        assert_eq!(regs.read_status(), 0xDF);
        assert!(!regs.vram.w);
        assert_eq!(regs.peek_status(), 0x5F);
    }
}
