//! Picture Processing Unit (2C02).
//!
//! The PPU is advanced one dot at a time by [`Ppu::clock`]. A frame is 262
//! scanlines of 341 dots, numbered -1 (pre-render) through 260. Lines 0..=239
//! produce pixels, vblank starts at line 241 dot 1 and ends at the pre-render
//! line's dot 1. The background is drawn from shift registers refilled every
//! eight dots; sprites are evaluated once per line for the following line.
//!
//! Pattern-table traffic goes to the cartridge through a [`PatternBus`] the
//! caller builds for each call; nametables, palette RAM and OAM live here.

pub mod buffer;
pub mod palette;
pub mod pattern_bus;
pub mod registers;
pub mod sprite;

use crate::{
    cartridge::Mirroring,
    memory::ppu::{self as ppu_mem, Register as PpuRegister},
    ram::ppu::{Ciram, OamRam, PaletteRam},
};
use buffer::FrameBuffer;
use pattern_bus::PatternBus;
use registers::{Control, Mask, Registers, Status, VramAddr};
use sprite::{LineSprite, SPRITES_PER_LINE, Sprite, SpriteAttributes};

pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 240;

pub const DOTS_PER_SCANLINE: u16 = 341;
pub const SCANLINES_PER_FRAME: u16 = 262;
/// Global ticks in one frame (odd frames with rendering on are one shorter).
pub const TICKS_PER_FRAME: u64 = DOTS_PER_SCANLINE as u64 * SCANLINES_PER_FRAME as u64;

const PRERENDER_SCANLINE: i16 = -1;
const VBLANK_SCANLINE: i16 = 241;
const LAST_SCANLINE: i16 = 260;

/// Background tile fetch latches and the 16-bit shifters they feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
struct BackgroundPipeline {
    next_tile: u8,
    next_attribute: u8,
    next_lo: u8,
    next_hi: u8,
    pattern_lo: u16,
    pattern_hi: u16,
    attribute_lo: u16,
    attribute_hi: u16,
}

impl BackgroundPipeline {
    /// Moves the fetched tile into the low byte of the shifters.
    fn reload(&mut self) {
        self.pattern_lo = (self.pattern_lo & 0xFF00) | u16::from(self.next_lo);
        self.pattern_hi = (self.pattern_hi & 0xFF00) | u16::from(self.next_hi);
        let spread = |bit: u8| if bit != 0 { 0x00FF } else { 0x0000 };
        self.attribute_lo = (self.attribute_lo & 0xFF00) | spread(self.next_attribute & 0b01);
        self.attribute_hi = (self.attribute_hi & 0xFF00) | spread(self.next_attribute & 0b10);
    }

    fn shift(&mut self) {
        self.pattern_lo <<= 1;
        self.pattern_hi <<= 1;
        self.attribute_lo <<= 1;
        self.attribute_hi <<= 1;
    }

    /// `(pixel, palette)` at fine X offset `fine_x`.
    fn pixel(&self, fine_x: u8) -> (u8, u8) {
        let mux = 0x8000u16 >> fine_x;
        let bit = |shifter: u16| u8::from(shifter & mux != 0);
        let pixel = (bit(self.pattern_hi) << 1) | bit(self.pattern_lo);
        let palette = (bit(self.attribute_hi) << 1) | bit(self.attribute_lo);
        (pixel, palette)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ppu {
    registers: Registers,
    ciram: Ciram,
    palette_ram: PaletteRam,
    oam: OamRam,

    scanline: i16,
    dot: u16,
    odd_frame: bool,
    frame_count: u64,
    nmi_pending: bool,
    frame_complete: bool,

    background: BackgroundPipeline,
    line_sprites: [LineSprite; SPRITES_PER_LINE],
    line_sprite_count: usize,

    frame: FrameBuffer,
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Ppu {
    /// Power-on state, positioned at the start of the pre-render line.
    pub fn new() -> Self {
        Self {
            registers: Registers::new(),
            ciram: Ciram::new(),
            palette_ram: PaletteRam::new(),
            oam: OamRam::new(),
            scanline: PRERENDER_SCANLINE,
            dot: 0,
            odd_frame: false,
            frame_count: 0,
            nmi_pending: false,
            frame_complete: false,
            background: BackgroundPipeline::default(),
            line_sprites: [LineSprite::default(); SPRITES_PER_LINE],
            line_sprite_count: 0,
            frame: FrameBuffer::new(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// CPU read of `$2000-$3FFF` (mirrored every 8 bytes).
    pub fn cpu_read(&mut self, addr: u16, pattern: &PatternBus<'_>) -> u8 {
        let value = match PpuRegister::from_cpu_addr(addr) {
            PpuRegister::Status => self.registers.read_status(),
            PpuRegister::OamData => self.oam[usize::from(self.registers.oam_addr)],
            PpuRegister::Data => self.read_data(pattern),
            // Write-only registers return the data latch.
            _ => self.registers.io_latch,
        };
        self.registers.io_latch = value;
        value
    }

    /// Side-effect-free view of what [`Ppu::cpu_read`] would return.
    pub fn peek_register(&self, addr: u16, pattern: &PatternBus<'_>) -> u8 {
        match PpuRegister::from_cpu_addr(addr) {
            PpuRegister::Status => self.registers.peek_status(),
            PpuRegister::OamData => self.oam[usize::from(self.registers.oam_addr)],
            PpuRegister::Data => {
                let addr = self.registers.vram.v.raw() & ppu_mem::VRAM_MIRROR_MASK;
                if addr >= ppu_mem::PALETTE_BASE {
                    self.vram_read(addr, pattern)
                } else {
                    self.registers.read_buffer
                }
            }
            _ => self.registers.io_latch,
        }
    }

    /// CPU write of `$2000-$3FFF` (mirrored every 8 bytes).
    pub fn cpu_write(&mut self, addr: u16, data: u8, pattern: &PatternBus<'_>) {
        self.registers.io_latch = data;
        match PpuRegister::from_cpu_addr(addr) {
            PpuRegister::Control => {
                let was_enabled = self.registers.control.nmi_enabled();
                self.registers.write_control(data);
                // Enabling NMI during vblank fires immediately.
                if !was_enabled
                    && self.registers.control.nmi_enabled()
                    && self.registers.status.contains(Status::VERTICAL_BLANK)
                {
                    self.nmi_pending = true;
                }
            }
            PpuRegister::Mask => self.registers.mask = Mask::from_bits_retain(data),
            PpuRegister::Status => {}
            PpuRegister::OamAddr => self.registers.oam_addr = data,
            PpuRegister::OamData => {
                let index = usize::from(self.registers.oam_addr);
                self.oam[index] = data;
                self.registers.oam_addr = self.registers.oam_addr.wrapping_add(1);
            }
            PpuRegister::Scroll => self.registers.vram.write_scroll(data),
            PpuRegister::Addr => self.registers.vram.write_addr(data),
            PpuRegister::Data => {
                let addr = self.registers.vram.v.raw() & ppu_mem::VRAM_MIRROR_MASK;
                self.vram_write(addr, data, pattern);
                self.increment_vram_addr();
            }
        }
    }

    /// `$2007` read. Palette reads are immediate; everything else returns the
    /// previous buffer content and refills it.
    fn read_data(&mut self, pattern: &PatternBus<'_>) -> u8 {
        let addr = self.registers.vram.v.raw() & ppu_mem::VRAM_MIRROR_MASK;
        let value = if addr >= ppu_mem::PALETTE_BASE {
            // The buffer still latches the nametable byte underneath.
            self.registers.read_buffer = self.vram_read(addr & 0x2FFF, pattern);
            self.vram_read(addr, pattern)
        } else {
            let buffered = self.registers.read_buffer;
            self.registers.read_buffer = self.vram_read(addr, pattern);
            buffered
        };
        self.increment_vram_addr();
        value
    }

    fn increment_vram_addr(&mut self) {
        let step = self.registers.control.vram_increment();
        self.registers.vram.v.increment(step);
    }

    fn vram_read(&self, addr: u16, pattern: &PatternBus<'_>) -> u8 {
        let addr = addr & ppu_mem::VRAM_MIRROR_MASK;
        match addr {
            0x0000..=ppu_mem::PATTERN_TABLE_END => pattern.read(addr),
            ppu_mem::NAMETABLE_BASE..=ppu_mem::NAMETABLE_END => {
                self.ciram[ciram_index(addr, pattern.mirroring())]
            }
            _ => self.palette_ram[palette::palette_index(addr)],
        }
    }

    fn vram_write(&mut self, addr: u16, data: u8, pattern: &PatternBus<'_>) {
        let addr = addr & ppu_mem::VRAM_MIRROR_MASK;
        match addr {
            0x0000..=ppu_mem::PATTERN_TABLE_END => {
                pattern.write(addr, data);
            }
            ppu_mem::NAMETABLE_BASE..=ppu_mem::NAMETABLE_END => {
                self.ciram[ciram_index(addr, pattern.mirroring())] = data;
            }
            _ => self.palette_ram[palette::palette_index(addr)] = data & 0x3F,
        }
    }

    /// Advances the PPU by one dot.
    pub fn clock(&mut self, pattern: &PatternBus<'_>) {
        let rendering = self.registers.mask.rendering_enabled();

        if self.scanline < SCREEN_HEIGHT as i16 {
            if self.scanline == 0 && self.dot == 0 && self.odd_frame && rendering {
                // Odd frames skip the first idle dot.
                self.dot = 1;
            }

            if self.scanline == PRERENDER_SCANLINE && self.dot == 1 {
                self.registers.status.remove(
                    Status::VERTICAL_BLANK | Status::SPRITE_ZERO_HIT | Status::SPRITE_OVERFLOW,
                );
                self.line_sprite_count = 0;
            }

            if (2..258).contains(&self.dot) || (321..338).contains(&self.dot) {
                if self.registers.mask.contains(Mask::SHOW_BACKGROUND) {
                    self.background.shift();
                }
                self.fetch_background(pattern, rendering);
            }

            if rendering {
                match self.dot {
                    256 => self.registers.vram.v.increment_y(),
                    257 => {
                        let t = self.registers.vram.t;
                        self.registers.vram.v.copy_horizontal(t);
                    }
                    280..=304 if self.scanline == PRERENDER_SCANLINE => {
                        let t = self.registers.vram.t;
                        self.registers.vram.v.copy_vertical(t);
                    }
                    _ => {}
                }
            }

            if self.dot == 257 {
                self.background.reload();
                self.evaluate_sprites(pattern, rendering);
            }

            if self.dot == 338 || self.dot == 340 {
                // Unused nametable fetches; mappers can observe them.
                self.background.next_tile = self.vram_read(self.registers.vram.v.tile_addr(), pattern);
            }
        }

        if self.scanline == VBLANK_SCANLINE && self.dot == 1 {
            self.registers.status.insert(Status::VERTICAL_BLANK);
            if self.registers.control.nmi_enabled() {
                self.nmi_pending = true;
            }
        }

        if (0..SCREEN_HEIGHT as i16).contains(&self.scanline) && (1..=256).contains(&self.dot) {
            self.render_pixel(pattern);
        }

        self.advance_dot();
    }

    fn advance_dot(&mut self) {
        self.dot += 1;
        if self.dot < DOTS_PER_SCANLINE {
            return;
        }
        self.dot = 0;
        self.scanline += 1;
        if self.scanline > LAST_SCANLINE {
            self.scanline = PRERENDER_SCANLINE;
            self.frame_complete = true;
            self.frame_count += 1;
            self.odd_frame = !self.odd_frame;
        }
    }

    /// The eight-dot fetch cadence: nametable, attribute, pattern low,
    /// pattern high, then a coarse X step.
    fn fetch_background(&mut self, pattern: &PatternBus<'_>, rendering: bool) {
        let v = self.registers.vram.v;
        match (self.dot - 1) % 8 {
            0 => {
                self.background.reload();
                self.background.next_tile = self.vram_read(v.tile_addr(), pattern);
            }
            2 => {
                let mut attribute = self.vram_read(v.attribute_addr(), pattern);
                if v.coarse_y() & 0x02 != 0 {
                    attribute >>= 4;
                }
                if v.coarse_x() & 0x02 != 0 {
                    attribute >>= 2;
                }
                self.background.next_attribute = attribute & 0x03;
            }
            4 => {
                let addr = self.background_pattern_addr(v);
                self.background.next_lo = self.vram_read(addr, pattern);
            }
            6 => {
                let addr = self.background_pattern_addr(v) + 8;
                self.background.next_hi = self.vram_read(addr, pattern);
            }
            7 if rendering => self.registers.vram.v.increment_x(),
            _ => {}
        }
    }

    fn background_pattern_addr(&self, v: VramAddr) -> u16 {
        self.registers.control.background_pattern_table()
            + u16::from(self.background.next_tile) * 16
            + u16::from(v.fine_y())
    }

    /// Selects up to eight sprites for the next line and loads their pattern rows.
    fn evaluate_sprites(&mut self, pattern: &PatternBus<'_>, rendering: bool) {
        self.line_sprite_count = 0;
        if !rendering || self.scanline >= (SCREEN_HEIGHT as i16) - 1 {
            return;
        }

        let height = self.registers.control.sprite_height();
        for (index, bytes) in self.oam.chunks_exact(sprite::BYTES_PER_SPRITE).enumerate() {
            let sprite = Sprite::from_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            let Some(row) = sprite.row_on(self.scanline, height) else {
                continue;
            };
            if self.line_sprite_count == SPRITES_PER_LINE {
                self.registers.status.insert(Status::SPRITE_OVERFLOW);
                break;
            }
            let addr = self.sprite_pattern_addr(&sprite, row, height);
            let mut lo = self.vram_read(addr, pattern);
            let mut hi = self.vram_read(addr + 8, pattern);
            if sprite.attributes.contains(SpriteAttributes::FLIP_HORIZONTAL) {
                lo = sprite::flip_byte(lo);
                hi = sprite::flip_byte(hi);
            }
            self.line_sprites[self.line_sprite_count] = LineSprite {
                x: sprite.x,
                attributes: sprite.attributes,
                pattern_lo: lo,
                pattern_hi: hi,
                is_sprite_zero: index == 0,
            };
            self.line_sprite_count += 1;
        }
    }

    fn sprite_pattern_addr(&self, sprite: &Sprite, row: u8, height: u8) -> u16 {
        let row = if sprite.attributes.contains(SpriteAttributes::FLIP_VERTICAL) {
            height - 1 - row
        } else {
            row
        };
        if height == 16 {
            let table = u16::from(sprite.tile & 0x01) * ppu_mem::PATTERN_TABLE_1;
            let tile = u16::from(sprite.tile & 0xFE) + u16::from(row / 8);
            table + tile * 16 + u16::from(row % 8)
        } else {
            self.registers.control.sprite_pattern_table()
                + u16::from(sprite.tile) * 16
                + u16::from(row)
        }
    }

    fn render_pixel(&mut self, pattern: &PatternBus<'_>) {
        let x = self.dot - 1;
        let mask = self.registers.mask;

        let (bg_pixel, bg_palette) = if mask.background_visible_at(x) {
            self.background.pixel(self.registers.vram.x)
        } else {
            (0, 0)
        };

        let mut sprite_pixel = None;
        if mask.sprites_visible_at(x) {
            sprite_pixel = self.line_sprites[..self.line_sprite_count]
                .iter()
                .find_map(|s| {
                    let value = s.pixel_at(x);
                    (value != 0).then_some((value, *s))
                });
        }

        let (pixel, palette) = match sprite_pixel {
            None => (bg_pixel, bg_palette),
            Some((value, sprite)) => {
                if bg_pixel != 0 && sprite.is_sprite_zero && x != 255 {
                    self.registers.status.insert(Status::SPRITE_ZERO_HIT);
                }
                let behind = sprite
                    .attributes
                    .contains(SpriteAttributes::PRIORITY_BEHIND_BACKGROUND);
                if bg_pixel != 0 && behind {
                    (bg_pixel, bg_palette)
                } else {
                    (value, 4 + sprite.attributes.palette())
                }
            }
        };

        let addr = ppu_mem::PALETTE_BASE + (u16::from(palette) << 2) + u16::from(pixel);
        let addr = if pixel == 0 { ppu_mem::PALETTE_BASE } else { addr };
        let mut index = self.vram_read(addr, pattern);
        if mask.contains(Mask::GRAYSCALE) {
            index &= 0x30;
        }
        self.frame
            .set(usize::from(x), self.scanline as usize, palette::color(index));
    }

    /// Returns and clears the NMI request raised at vblank start.
    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pending)
    }

    /// Returns and clears the end-of-frame flag.
    pub fn take_frame_complete(&mut self) -> bool {
        std::mem::take(&mut self.frame_complete)
    }

    pub fn frame_complete(&self) -> bool {
        self.frame_complete
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// OAM DMA target.
    pub fn write_oam(&mut self, offset: u8, data: u8) {
        self.oam[usize::from(offset)] = data;
    }

    pub fn oam(&self) -> &[u8] {
        &self.oam
    }

    pub fn palette_ram(&self) -> &[u8] {
        &self.palette_ram
    }

    pub fn ciram(&self) -> &[u8] {
        &self.ciram
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn scanline(&self) -> i16 {
        self.scanline
    }

    pub fn dot(&self) -> u16 {
        self.dot
    }

    pub fn control(&self) -> Control {
        self.registers.control
    }

    pub fn mask(&self) -> Mask {
        self.registers.mask
    }

    pub fn status(&self) -> Status {
        self.registers.status
    }

    pub fn vram_addr(&self) -> VramAddr {
        self.registers.vram.v
    }
}

/// Folds a nametable address onto the 2 KiB of CIRAM.
fn ciram_index(addr: u16, mirroring: Mirroring) -> usize {
    let offset = (addr - ppu_mem::NAMETABLE_BASE) & 0x0FFF;
    let table = offset / ppu_mem::NAMETABLE_SIZE;
    let page = match mirroring {
        Mirroring::Vertical => table & 0x01,
        Mirroring::Horizontal => table >> 1,
    };
    usize::from(page * ppu_mem::NAMETABLE_SIZE + (offset % ppu_mem::NAMETABLE_SIZE))
}
