use std::fmt;

// Layout of the 15-bit `v`/`t` registers:
//  14 13 12 11 10 9 8 7 6 5 4 3 2 1 0
//  [fine_y][nt][coarse_y   ][coarse_x   ]
const COARSE_X: u16 = 0x001F;
const COARSE_Y: u16 = 0x03E0;
const NAMETABLE: u16 = 0x0C00;
const NAMETABLE_X: u16 = 0x0400;
const NAMETABLE_Y: u16 = 0x0800;
const FINE_Y: u16 = 0x7000;
const ALL: u16 = 0x7FFF;

const COARSE_Y_SHIFT: u16 = 5;
const NAMETABLE_SHIFT: u16 = 10;
const FINE_Y_SHIFT: u16 = 12;

/// Scroll-aware VRAM address used by the internal `v`/`t` registers.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VramAddr(u16);

impl VramAddr {
    pub fn new(raw: u16) -> Self {
        Self(raw & ALL)
    }

    pub fn raw(self) -> u16 {
        self.0
    }

    pub fn set_raw(&mut self, raw: u16) {
        self.0 = raw & ALL;
    }

    pub fn coarse_x(self) -> u8 {
        (self.0 & COARSE_X) as u8
    }

    pub fn set_coarse_x(&mut self, value: u8) {
        self.0 = (self.0 & !COARSE_X) | u16::from(value & 0x1F);
    }

    pub fn coarse_y(self) -> u8 {
        ((self.0 & COARSE_Y) >> COARSE_Y_SHIFT) as u8
    }

    pub fn set_coarse_y(&mut self, value: u8) {
        self.0 = (self.0 & !COARSE_Y) | (u16::from(value & 0x1F) << COARSE_Y_SHIFT);
    }

    pub fn nametable(self) -> u8 {
        ((self.0 & NAMETABLE) >> NAMETABLE_SHIFT) as u8
    }

    pub fn set_nametable(&mut self, value: u8) {
        self.0 = (self.0 & !NAMETABLE) | (u16::from(value & 0b11) << NAMETABLE_SHIFT);
    }

    pub fn fine_y(self) -> u8 {
        ((self.0 & FINE_Y) >> FINE_Y_SHIFT) as u8
    }

    pub fn set_fine_y(&mut self, value: u8) {
        self.0 = (self.0 & !FINE_Y) | (u16::from(value & 0b111) << FINE_Y_SHIFT);
    }

    /// `$2007` post-access increment.
    pub fn increment(&mut self, step: u16) {
        self.0 = self.0.wrapping_add(step) & ALL;
    }

    /// Nametable byte address for the tile under `v`.
    pub fn tile_addr(self) -> u16 {
        0x2000 | (self.0 & 0x0FFF)
    }

    /// Attribute byte address covering the tile under `v`.
    pub fn attribute_addr(self) -> u16 {
        0x23C0
            | (self.0 & NAMETABLE)
            | (u16::from(self.coarse_y() >> 2) << 3)
            | u16::from(self.coarse_x() >> 2)
    }

    /// Moves one tile right, switching horizontal nametable on wrap.
    pub fn increment_x(&mut self) {
        if self.coarse_x() == 31 {
            self.0 &= !COARSE_X;
            self.0 ^= NAMETABLE_X;
        } else {
            self.0 += 1;
        }
    }

    /// Moves one pixel row down. Coarse Y wraps at 29 into the other
    /// vertical nametable; rows 30/31 (attribute memory) wrap to 0 in place.
    pub fn increment_y(&mut self) {
        let fine = self.fine_y();
        if fine < 7 {
            self.set_fine_y(fine + 1);
            return;
        }
        self.set_fine_y(0);
        match self.coarse_y() {
            29 => {
                self.set_coarse_y(0);
                self.0 ^= NAMETABLE_Y;
            }
            31 => self.set_coarse_y(0),
            y => self.set_coarse_y(y + 1),
        }
    }

    /// Copies coarse X and the horizontal nametable bit from `t`.
    pub fn copy_horizontal(&mut self, t: VramAddr) {
        let mask = COARSE_X | NAMETABLE_X;
        self.0 = (self.0 & !mask) | (t.0 & mask);
    }

    /// Copies fine Y, coarse Y and the vertical nametable bit from `t`.
    pub fn copy_vertical(&mut self, t: VramAddr) {
        let mask = FINE_Y | COARSE_Y | NAMETABLE_Y;
        self.0 = (self.0 & !mask) | (t.0 & mask);
    }
}

impl fmt::Debug for VramAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VramAddr")
            .field("raw", &format_args!("{:#06X}", self.0))
            .field("fine_y", &self.fine_y())
            .field("nametable", &self.nametable())
            .field("coarse_y", &self.coarse_y())
            .field("coarse_x", &self.coarse_x())
            .finish()
    }
}
