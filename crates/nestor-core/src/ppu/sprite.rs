use bitflags::bitflags;

bitflags! {
    /// Attribute bits stored in sprite byte 2.
    ///
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// V H P . . . p p
    /// ```
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct SpriteAttributes: u8 {
        /// Sprite palette select (4..7).
        const PALETTE                    = 0b0000_0011;
        /// Drawn behind opaque background pixels.
        const PRIORITY_BEHIND_BACKGROUND = 0b0010_0000;
        const FLIP_HORIZONTAL            = 0b0100_0000;
        const FLIP_VERTICAL              = 0b1000_0000;
    }
}

impl SpriteAttributes {
    pub fn palette(self) -> u8 {
        (self & SpriteAttributes::PALETTE).bits()
    }
}

/// Bytes per OAM entry: Y, tile, attributes, X.
pub const BYTES_PER_SPRITE: usize = 4;
/// Sprites the hardware can draw on one scanline.
pub const SPRITES_PER_LINE: usize = 8;

/// One OAM entry decoded from its four bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Sprite {
    pub y: u8,
    pub tile: u8,
    pub attributes: SpriteAttributes,
    pub x: u8,
}

impl Sprite {
    pub fn from_bytes(bytes: [u8; BYTES_PER_SPRITE]) -> Self {
        Self {
            y: bytes[0],
            tile: bytes[1],
            attributes: SpriteAttributes::from_bits_retain(bytes[2]),
            x: bytes[3],
        }
    }

    /// Row of this sprite shown on the line after `scanline`, if any.
    ///
    /// OAM Y is one less than the first line a sprite covers, so evaluating
    /// during line `s` for line `s + 1` compares against `s` directly.
    pub fn row_on(&self, scanline: i16, height: u8) -> Option<u8> {
        let row = scanline - i16::from(self.y);
        (0..i16::from(height)).contains(&row).then_some(row as u8)
    }
}

/// A sprite selected for the next scanline, with its pattern row loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub(crate) struct LineSprite {
    pub(crate) x: u8,
    pub(crate) attributes: SpriteAttributes,
    pub(crate) pattern_lo: u8,
    pub(crate) pattern_hi: u8,
    /// Entry 0 of OAM, for sprite-0 hit detection.
    pub(crate) is_sprite_zero: bool,
}

impl LineSprite {
    /// 2-bit pixel value at screen column `x`, 0 meaning transparent.
    pub(crate) fn pixel_at(&self, x: u16) -> u8 {
        let offset = x.wrapping_sub(u16::from(self.x));
        if offset >= 8 {
            return 0;
        }
        let bit = 7 - offset as u8;
        let lo = (self.pattern_lo >> bit) & 1;
        let hi = (self.pattern_hi >> bit) & 1;
        (hi << 1) | lo
    }
}

/// Reverses a pattern byte for horizontally flipped sprites.
pub(crate) fn flip_byte(value: u8) -> u8 {
    value.reverse_bits()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_oam_bytes() {
        let sprite = Sprite::from_bytes([0x10, 0x22, 0b1100_0010, 0x30]);
        assert_eq!(sprite.y, 0x10);
        assert_eq!(sprite.tile, 0x22);
        assert_eq!(sprite.attributes.palette(), 2);
        assert!(sprite.attributes.contains(SpriteAttributes::FLIP_VERTICAL));
        assert_eq!(sprite.x, 0x30);
    }

    #[test]
    fn row_on_respects_height() {
        let sprite = Sprite::from_bytes([20, 0, 0, 0]);
        assert_eq!(sprite.row_on(19, 8), None);
        assert_eq!(sprite.row_on(20, 8), Some(0));
        assert_eq!(sprite.row_on(27, 8), Some(7));
        assert_eq!(sprite.row_on(28, 8), None);
        assert_eq!(sprite.row_on(35, 16), Some(15));
    }

    #[test]
    fn line_sprite_pixels_are_msb_first() {
        let sprite = LineSprite {
            x: 10,
            pattern_lo: 0b1000_0001,
            pattern_hi: 0b1000_0000,
            ..LineSprite::default()
        };
        assert_eq!(sprite.pixel_at(9), 0);
        assert_eq!(sprite.pixel_at(10), 3);
        assert_eq!(sprite.pixel_at(17), 1);
        assert_eq!(sprite.pixel_at(18), 0);
    }
}
