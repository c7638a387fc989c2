//! 256x240 RGBA frame buffer written by the PPU.

use crate::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH, palette::Color};

/// One complete picture. Rows are stored top to bottom, pixels left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: Vec<Color>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            pixels: vec![Color::BLACK; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }

    pub fn width(&self) -> usize {
        SCREEN_WIDTH
    }

    pub fn height(&self) -> usize {
        SCREEN_HEIGHT
    }

    /// Pixel at `(x, y)`, or `None` outside the visible area.
    pub fn get(&self, x: usize, y: usize) -> Option<Color> {
        if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
            return None;
        }
        self.pixels.get(y * SCREEN_WIDTH + x).copied()
    }

    /// Stores a pixel; coordinates outside the visible area are ignored.
    pub fn set(&mut self, x: usize, y: usize, color: Color) {
        if x >= SCREEN_WIDTH || y >= SCREEN_HEIGHT {
            return;
        }
        if let Some(pixel) = self.pixels.get_mut(y * SCREEN_WIDTH + x) {
            *pixel = color;
        }
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Packed `R, G, B, A` bytes, `width * height * 4` long.
    pub fn as_rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| c.to_rgba()).collect()
    }

    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color);
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
