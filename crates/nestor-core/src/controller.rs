//! Standard NES controller (joypad) model.
//!
//! Implements the 8-button pad readable through `$4016/$4017`. The input
//! collaborator hands over one live bitmask per port; the console latches it
//! into a shift register on strobe and shifts one bit out per read.

use bitflags::bitflags;

bitflags! {
    /// Live button bitmask in shift-out order, most significant bit first.
    ///
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// A B s S U D L R
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Buttons: u8 {
        const A      = 0b1000_0000;
        const B      = 0b0100_0000;
        const SELECT = 0b0010_0000;
        const START  = 0b0001_0000;
        const UP     = 0b0000_1000;
        const DOWN   = 0b0000_0100;
        const LEFT   = 0b0000_0010;
        const RIGHT  = 0b0000_0001;
    }
}

/// Upper data lines are not driven by the pad and read back as `$40`.
const OPEN_BUS_BITS: u8 = 0x40;

/// Serially-readable controller state with latch/strobe behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controller {
    strobe: bool,
    shift: u8,
    state: u8,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the live button bitmask.
    pub fn set_state(&mut self, state: u8) {
        self.state = state;
        if self.strobe {
            self.shift = self.state;
        }
    }

    pub fn set_buttons(&mut self, buttons: Buttons) {
        self.set_state(buttons.bits());
    }

    /// Update a single button's pressed state.
    pub fn set_button(&mut self, button: Buttons, pressed: bool) {
        let mut buttons = Buttons::from_bits_retain(self.state);
        buttons.set(button, pressed);
        self.set_buttons(buttons);
    }

    pub fn state(&self) -> u8 {
        self.state
    }

    /// Writes to the `$4016` strobe bit (shared by both ports).
    pub fn write_strobe(&mut self, data: u8) {
        self.strobe = data & 0x01 != 0;
        if self.strobe {
            self.shift = self.state;
        }
    }

    /// Reads the next bit from the shift register.
    ///
    /// While strobe is high the register keeps re-latching, so every read
    /// reports button A. After eight reads the register is full of ones.
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            self.shift = self.state;
        }
        let bit = self.shift >> 7;
        if !self.strobe {
            self.shift = (self.shift << 1) | 0x01;
        }
        bit | OPEN_BUS_BITS
    }

    /// Side-effect-free view of the next bit [`read`](Self::read) would return.
    pub fn peek(&self) -> u8 {
        let shift = if self.strobe { self.state } else { self.shift };
        (shift >> 7) | OPEN_BUS_BITS
    }

    pub(crate) fn reset(&mut self) {
        self.strobe = false;
        self.shift = 0;
    }
}
