use bitflags::bitflags;

bitflags! {
    /// PPUSTATUS (`$2002`), read-only. The low five bits are not driven and
    /// read back whatever the PPU data latch holds.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        /// More than eight sprites were found on a scanline.
        const SPRITE_OVERFLOW = 0b0010_0000;
        /// An opaque sprite 0 pixel overlapped an opaque background pixel.
        const SPRITE_ZERO_HIT = 0b0100_0000;
        const VERTICAL_BLANK  = 0b1000_0000;
    }
}
