use bitflags::bitflags;

use crate::memory::ppu as ppu_mem;

bitflags! {
    /// PPUCTRL (`$2000`), write-only.
    ///
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// V P H B S I N N
    /// ```
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Control: u8 {
        /// Base nametable (`$2000 + 0x400 * n`).
        const NAMETABLE        = 0b0000_0011;
        /// `$2007` increments by 32 instead of 1.
        const INCREMENT_32     = 0b0000_0100;
        /// 8x8 sprites fetch from `$1000`.
        const SPRITE_TABLE     = 0b0000_1000;
        /// Background fetches from `$1000`.
        const BACKGROUND_TABLE = 0b0001_0000;
        /// 8x16 sprites.
        const SPRITE_SIZE_16   = 0b0010_0000;
        /// EXT pin direction; unused on a stock console.
        const MASTER_SLAVE     = 0b0100_0000;
        /// Raise NMI at the start of vblank.
        const GENERATE_NMI     = 0b1000_0000;
    }
}

impl Control {
    pub fn nametable_index(self) -> u8 {
        (self & Control::NAMETABLE).bits()
    }

    pub fn vram_increment(self) -> u16 {
        if self.contains(Control::INCREMENT_32) { 32 } else { 1 }
    }

    pub fn sprite_pattern_table(self) -> u16 {
        if self.contains(Control::SPRITE_TABLE) {
            ppu_mem::PATTERN_TABLE_1
        } else {
            ppu_mem::PATTERN_TABLE_0
        }
    }

    pub fn background_pattern_table(self) -> u16 {
        if self.contains(Control::BACKGROUND_TABLE) {
            ppu_mem::PATTERN_TABLE_1
        } else {
            ppu_mem::PATTERN_TABLE_0
        }
    }

    pub fn sprite_height(self) -> u8 {
        if self.contains(Control::SPRITE_SIZE_16) { 16 } else { 8 }
    }

    pub fn nmi_enabled(self) -> bool {
        self.contains(Control::GENERATE_NMI)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_table_and_increment_bits() {
        let ctrl = Control::from_bits_retain(0b1011_1110);
        assert_eq!(ctrl.nametable_index(), 2);
        assert_eq!(ctrl.vram_increment(), 32);
        assert_eq!(ctrl.sprite_pattern_table(), 0x1000);
        assert_eq!(ctrl.background_pattern_table(), 0x1000);
        assert_eq!(ctrl.sprite_height(), 16);
        assert!(ctrl.nmi_enabled());
        assert_eq!(Control::empty().background_pattern_table(), 0x0000);
    }
}
