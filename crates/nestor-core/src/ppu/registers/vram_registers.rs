use super::VramAddr;

/// The `v/t/x/w` scroll latches shared by `$2005` and `$2006`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VramRegisters {
    /// Current VRAM address.
    pub v: VramAddr,
    /// Temporary address; the top-left of the next frame or row.
    pub t: VramAddr,
    /// Fine X scroll (0..7).
    pub x: u8,
    /// Write toggle: `false` before the first half of a pair.
    pub w: bool,
}

impl VramRegisters {
    /// `$2005`: coarse/fine X on the first write, coarse/fine Y on the second.
    pub fn write_scroll(&mut self, value: u8) {
        if self.w {
            self.t.set_coarse_y(value >> 3);
            self.t.set_fine_y(value & 0b111);
        } else {
            self.t.set_coarse_x(value >> 3);
            self.x = value & 0b111;
        }
        self.w = !self.w;
    }

    /// `$2006`: high six bits first, then the low byte, which also loads `v`.
    pub fn write_addr(&mut self, value: u8) {
        if self.w {
            self.t.set_raw((self.t.raw() & 0x7F00) | u16::from(value));
            self.v = self.t;
        } else {
            self.t
                .set_raw((self.t.raw() & 0x00FF) | (u16::from(value & 0x3F) << 8));
        }
        self.w = !self.w;
    }
}
