//! NES address map.
//!
//! The bus decoder, the CPU vector fetches and the PPU address logic all name
//! addresses through these constants. Ranges are inclusive on both ends so they
//! can be used directly as `match` patterns.

/// CPU address space (`$0000-$FFFF`).
pub mod cpu {
    /// Page `$01`, where the 6502 keeps its stack.
    pub const STACK_PAGE_START: u16 = 0x0100;

    pub const NMI_VECTOR_LO: u16 = 0xFFFA;
    pub const RESET_VECTOR_LO: u16 = 0xFFFC;
    pub const RESET_VECTOR_HI: u16 = 0xFFFD;
    /// Shared by IRQ and `BRK`.
    pub const IRQ_VECTOR_LO: u16 = 0xFFFE;

    /// 2 KiB of work RAM, repeated four times up to `$1FFF`.
    pub const INTERNAL_RAM_SIZE: usize = 0x0800;
    pub const INTERNAL_RAM_START: u16 = 0x0000;
    pub const INTERNAL_RAM_MIRROR_END: u16 = 0x1FFF;
    /// Folds any address below `$2000` onto the physical 2 KiB.
    pub const INTERNAL_RAM_MASK: u16 = (INTERNAL_RAM_SIZE as u16) - 1;

    /// The eight PPU registers, repeated every 8 bytes.
    pub const PPU_REGISTER_BASE: u16 = 0x2000;
    pub const PPU_REGISTER_END: u16 = 0x3FFF;

    /// Audio channel registers. Audio is not modelled, so they float.
    pub const APU_REGISTER_BASE: u16 = 0x4000;
    pub const APU_REGISTER_END: u16 = 0x4013;
    /// Write-only sprite DMA port.
    pub const OAM_DMA: u16 = 0x4014;
    pub const APU_STATUS: u16 = 0x4015;
    /// Reads pad 1; writes drive the strobe line of both pads.
    pub const CONTROLLER_PORT_1: u16 = 0x4016;
    /// Reads pad 2; writes belong to the APU frame counter.
    pub const CONTROLLER_PORT_2: u16 = 0x4017;
    /// CPU test-mode registers, disabled on retail consoles.
    pub const TEST_MODE_BASE: u16 = 0x4018;
    pub const TEST_MODE_END: u16 = 0x401F;

    /// Everything from here up is routed to the cartridge.
    pub const CARTRIDGE_SPACE_BASE: u16 = 0x4020;
    /// Start of the PRG ROM window on NROM-style boards.
    pub const PRG_ROM_START: u16 = 0x8000;
    pub const CPU_ADDR_END: u16 = 0xFFFF;
}

/// PPU address space (`$0000-$3FFF`) and register decoding.
pub mod ppu {
    /// The PPU bus is 14 bits wide.
    pub const VRAM_MIRROR_MASK: u16 = 0x3FFF;

    /// Left and right pattern tables, both on the cartridge.
    pub const PATTERN_TABLE_0: u16 = 0x0000;
    pub const PATTERN_TABLE_1: u16 = 0x1000;
    pub const PATTERN_TABLE_END: u16 = 0x1FFF;

    /// Four logical nametables at `$2000-$2FFF`, repeated up to `$3EFF`.
    pub const NAMETABLE_BASE: u16 = 0x2000;
    pub const NAMETABLE_SIZE: u16 = 0x0400;
    pub const NAMETABLE_END: u16 = 0x3EFF;
    /// Physical nametable RAM inside the console: room for two tables.
    pub const CIRAM_SIZE: usize = 0x0800;

    /// 32 palette bytes, repeated up to `$3FFF`.
    pub const PALETTE_BASE: u16 = 0x3F00;
    pub const PALETTE_RAM_SIZE: usize = 0x20;

    /// 64 sprites, 4 bytes each.
    pub const OAM_RAM_SIZE: usize = 0x100;

    /// PPU register selected by the low three bits of a CPU address.
    #[repr(u16)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Register {
        Control = 0x2000,
        Mask = 0x2001,
        Status = 0x2002,
        OamAddr = 0x2003,
        OamData = 0x2004,
        Scroll = 0x2005,
        Addr = 0x2006,
        Data = 0x2007,
    }

    impl Register {
        /// Canonical (unmirrored) CPU address.
        pub const fn addr(self) -> u16 {
            self as u16
        }

        /// Decodes any address in `$2000-$3FFF`.
        pub const fn from_cpu_addr(addr: u16) -> Self {
            match addr % 8 {
                0 => Self::Control,
                1 => Self::Mask,
                2 => Self::Status,
                3 => Self::OamAddr,
                4 => Self::OamData,
                5 => Self::Scroll,
                6 => Self::Addr,
                _ => Self::Data,
            }
        }
    }
}
