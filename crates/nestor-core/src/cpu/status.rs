use bitflags::bitflags;

bitflags! {
    /// Represents the 8-bit processor status register (P) of the NES CPU.
    ///
    /// Bit layout:
    /// 7 6 5 4 3 2 1 0
    /// N V _ B D I Z C
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        /// Carry out of bit 7, or no borrow on subtraction.
        const CARRY     = 0b0000_0001;
        /// Result was zero.
        const ZERO      = 0b0000_0010;
        /// Masks IRQ (NMI is unaffected).
        const INTERRUPT = 0b0000_0100;
        /// Stored and restored, but the 2A03 has no decimal ALU.
        const DECIMAL   = 0b0000_1000;
        /// Only exists in copies pushed to the stack (PHP/BRK).
        const BREAK     = 0b0001_0000;
        /// Always reads back as 1.
        const UNUSED    = 0b0010_0000;
        /// Signed overflow.
        const OVERFLOW  = 0b0100_0000;
        /// Bit 7 of the last result.
        const NEGATIVE  = 0b1000_0000;
    }
}

impl Status {
    /// Power-up / reset value: interrupts masked, unused bit set.
    pub fn power_on() -> Self {
        Status::INTERRUPT | Status::UNUSED
    }

    /// Updates the Zero and Negative flags from a result byte.
    pub fn set_zn(&mut self, value: u8) {
        self.set(Status::ZERO, value == 0);
        self.set(Status::NEGATIVE, value & 0x80 != 0);
    }

    /// Value pushed by PHP/BRK (`brk == true`) or by NMI/IRQ entry.
    pub fn to_stack_byte(self, brk: bool) -> u8 {
        let mut pushed = self | Status::UNUSED;
        pushed.set(Status::BREAK, brk);
        pushed.bits()
    }

    /// Value restored by PLP/RTI; B is dropped and U forced on.
    pub fn from_stack_byte(value: u8) -> Self {
        (Status::from_bits_retain(value) - Status::BREAK) | Status::UNUSED
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::power_on()
    }
}
