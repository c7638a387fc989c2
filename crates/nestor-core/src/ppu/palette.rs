//! 2C02 master palette.
//!
//! Palette RAM stores 6-bit indices into this table; the PPU converts them to
//! RGB when it writes a pixel into the frame buffer.

/// One RGBA pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    pub const fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Number of entries in the master palette.
pub const PALETTE_SIZE: usize = 64;

#[rustfmt::skip]
const MASTER_PALETTE: [Color; PALETTE_SIZE] = [
    // 0x00
    Color::rgb(84, 84, 84),    Color::rgb(0, 30, 116),    Color::rgb(8, 16, 144),    Color::rgb(48, 0, 136),
    Color::rgb(68, 0, 100),    Color::rgb(92, 0, 48),     Color::rgb(84, 4, 0),      Color::rgb(60, 24, 0),
    Color::rgb(32, 42, 0),     Color::rgb(8, 58, 0),      Color::rgb(0, 64, 0),      Color::rgb(0, 60, 0),
    Color::rgb(0, 50, 60),     Color::rgb(0, 0, 0),       Color::rgb(0, 0, 0),       Color::rgb(0, 0, 0),
    // 0x10
    Color::rgb(152, 150, 152), Color::rgb(8, 76, 196),    Color::rgb(48, 50, 236),   Color::rgb(92, 30, 228),
    Color::rgb(136, 20, 176),  Color::rgb(160, 20, 100),  Color::rgb(152, 34, 32),   Color::rgb(120, 60, 0),
    Color::rgb(84, 90, 0),     Color::rgb(40, 114, 0),    Color::rgb(8, 124, 0),     Color::rgb(0, 118, 40),
    Color::rgb(0, 102, 120),   Color::rgb(0, 0, 0),       Color::rgb(0, 0, 0),       Color::rgb(0, 0, 0),
    // 0x20
    Color::rgb(236, 238, 236), Color::rgb(76, 154, 236),  Color::rgb(120, 124, 236), Color::rgb(176, 98, 236),
    Color::rgb(228, 84, 236),  Color::rgb(236, 88, 180),  Color::rgb(236, 106, 100), Color::rgb(212, 136, 32),
    Color::rgb(160, 170, 0),   Color::rgb(116, 196, 0),   Color::rgb(76, 208, 32),   Color::rgb(56, 204, 108),
    Color::rgb(56, 180, 204),  Color::rgb(60, 60, 60),    Color::rgb(0, 0, 0),       Color::rgb(0, 0, 0),
    // 0x30
    Color::rgb(236, 238, 236), Color::rgb(168, 204, 236), Color::rgb(188, 188, 236), Color::rgb(212, 178, 236),
    Color::rgb(236, 174, 236), Color::rgb(236, 174, 212), Color::rgb(236, 180, 176), Color::rgb(228, 196, 144),
    Color::rgb(204, 210, 120), Color::rgb(180, 222, 120), Color::rgb(168, 226, 144), Color::rgb(152, 226, 180),
    Color::rgb(160, 214, 228), Color::rgb(160, 162, 160), Color::rgb(0, 0, 0),       Color::rgb(0, 0, 0),
];

/// Looks up a palette RAM value; only the low six bits select a color.
pub fn color(index: u8) -> Color {
    MASTER_PALETTE[usize::from(index & 0x3F)]
}

/// Folds a `$3F00-$3FFF` address onto the 32 bytes of palette RAM.
///
/// `$3F10/$3F14/$3F18/$3F1C` are the backdrop slots of the sprite palettes
/// and alias `$3F00/$3F04/$3F08/$3F0C`.
pub fn palette_index(addr: u16) -> usize {
    let index = usize::from(addr & 0x1F);
    if index >= 0x10 && index % 4 == 0 {
        index - 0x10
    } else {
        index
    }
}
