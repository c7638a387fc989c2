use crate::{
    bus::Memory,
    cpu::{Cpu, mnemonic::Access},
};

/// Represents the addressing modes supported by the 6502 CPU.
///
/// Addressing modes define how the CPU interprets the operand bytes
/// of an instruction to determine the effective memory address or
/// immediate value for the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Addressing {
    /// No operand. `CLC`, `RTS`, `NOP`.
    Implied,
    /// Operates on the accumulator. `ASL A`, `ROR A`.
    Accumulator,
    /// The byte after the opcode is the value. `LDA #$42`.
    Immediate,
    /// Full 16-bit address. `STA $0200`.
    Absolute,
    /// `address + X`; read instructions pay one cycle on a page cross.
    AbsoluteX,
    /// `address + Y`; read instructions pay one cycle on a page cross.
    AbsoluteY,
    /// `JMP ($xxxx)` only. The high byte is fetched without carrying into the
    /// pointer's high byte (`JMP ($10FF)` reads `$10FF` and `$1000`).
    Indirect,
    /// `($zp,X)`: pointer read from zero page at `zp + X`, wrapping.
    IndirectX,
    /// `($zp),Y`: pointer read from zero page, then `+ Y`.
    IndirectY,
    /// Signed 8-bit branch displacement from the next instruction.
    Relative,
    /// Zero-page address `$00xx`.
    ZeroPage,
    /// `zp + X`, wrapping inside the zero page.
    ZeroPageX,
    /// `zp + Y`, wrapping inside the zero page.
    ZeroPageY,
}

impl Addressing {
    /// Total instruction length in bytes, opcode included.
    pub const fn len(self) -> u8 {
        match self {
            Addressing::Implied | Addressing::Accumulator => 1,
            Addressing::Absolute
            | Addressing::AbsoluteX
            | Addressing::AbsoluteY
            | Addressing::Indirect => 3,
            _ => 2,
        }
    }
}

/// Effective operand produced by resolving an addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operand {
    /// Implied instructions and the accumulator forms of shifts.
    Register,
    /// A memory location (immediate operands point at the byte after the opcode).
    Memory { addr: u16, crossed: bool },
    /// Branch target.
    Branch(u16),
}

impl Operand {
    pub(crate) fn page_crossed(self) -> bool {
        matches!(self, Operand::Memory { crossed: true, .. })
    }
}

const fn crosses_page(base: u16, effective: u16) -> bool {
    base & 0xFF00 != effective & 0xFF00
}

impl Cpu {
    /// Fetches the operand bytes for `mode` and computes the effective operand.
    ///
    /// Indexed modes issue the dummy read the hardware performs at the
    /// un-carried address: on a page cross for reads, always for writes and
    /// read-modify-write instructions.
    pub(crate) fn resolve<M: Memory>(
        &mut self,
        mode: Addressing,
        access: Access,
        bus: &mut M,
    ) -> Operand {
        match mode {
            Addressing::Implied | Addressing::Accumulator => Operand::Register,
            Addressing::Immediate => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                Operand::Memory {
                    addr,
                    crossed: false,
                }
            }
            Addressing::ZeroPage => self.zero_page(bus, 0),
            Addressing::ZeroPageX => self.zero_page(bus, self.x),
            Addressing::ZeroPageY => self.zero_page(bus, self.y),
            Addressing::Absolute => Operand::Memory {
                addr: self.fetch_word(bus),
                crossed: false,
            },
            Addressing::AbsoluteX => {
                let base = self.fetch_word(bus);
                self.indexed(bus, base, self.x, access)
            }
            Addressing::AbsoluteY => {
                let base = self.fetch_word(bus);
                self.indexed(bus, base, self.y, access)
            }
            Addressing::Indirect => {
                let ptr = self.fetch_word(bus);
                let lo = bus.read(ptr);
                let hi = bus.read((ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF));
                Operand::Memory {
                    addr: u16::from_le_bytes([lo, hi]),
                    crossed: false,
                }
            }
            Addressing::IndirectX => {
                let zp = self.fetch_byte(bus).wrapping_add(self.x);
                Operand::Memory {
                    addr: self.read_zero_page_word(bus, zp),
                    crossed: false,
                }
            }
            Addressing::IndirectY => {
                let zp = self.fetch_byte(bus);
                let base = self.read_zero_page_word(bus, zp);
                self.indexed(bus, base, self.y, access)
            }
            Addressing::Relative => {
                let offset = self.fetch_byte(bus) as i8;
                Operand::Branch(self.pc.wrapping_add_signed(i16::from(offset)))
            }
        }
    }

    fn zero_page<M: Memory>(&mut self, bus: &mut M, index: u8) -> Operand {
        let addr = self.fetch_byte(bus).wrapping_add(index);
        Operand::Memory {
            addr: u16::from(addr),
            crossed: false,
        }
    }

    fn indexed<M: Memory>(&mut self, bus: &mut M, base: u16, index: u8, access: Access) -> Operand {
        let addr = base.wrapping_add(u16::from(index));
        let crossed = crosses_page(base, addr);
        if crossed || matches!(access, Access::Write | Access::Modify) {
            let uncarried = (base & 0xFF00) | (addr & 0x00FF);
            bus.read(uncarried);
        }
        Operand::Memory { addr, crossed }
    }

    fn read_zero_page_word<M: Memory>(&mut self, bus: &mut M, zp: u8) -> u16 {
        let lo = bus.read(u16::from(zp));
        let hi = bus.read(u16::from(zp.wrapping_add(1)));
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn fetch_byte<M: Memory>(&mut self, bus: &mut M) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    fn fetch_word<M: Memory>(&mut self, bus: &mut M) -> u16 {
        let lo = self.fetch_byte(bus);
        let hi = self.fetch_byte(bus);
        u16::from_le_bytes([lo, hi])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::mock::MockBus;

    fn cpu_at(pc: u16) -> Cpu {
        let mut cpu = Cpu::new();
        cpu.pc = pc;
        cpu
    }

    #[test]
    fn zero_page_x_wraps_inside_page_zero() {
        let mut bus = MockBus::default();
        bus.mem[0x0200] = 0xF0;
        let mut cpu = cpu_at(0x0200);
        cpu.x = 0x20;
        let operand = cpu.resolve(Addressing::ZeroPageX, Access::Read, &mut bus);
        assert_eq!(
            operand,
            Operand::Memory {
                addr: 0x0010,
                crossed: false
            }
        );
        assert_eq!(cpu.pc, 0x0201);
    }

    #[test]
    fn absolute_x_reports_page_cross() {
        let mut bus = MockBus::default();
        bus.mem[0x0200] = 0xFF;
        bus.mem[0x0201] = 0x12;
        let mut cpu = cpu_at(0x0200);
        cpu.x = 0x01;
        let operand = cpu.resolve(Addressing::AbsoluteX, Access::Read, &mut bus);
        assert_eq!(
            operand,
            Operand::Memory {
                addr: 0x1300,
                crossed: true
            }
        );
        assert_eq!(bus.reads_of(0x1200), 1);
    }

    #[test]
    fn stores_always_issue_dummy_read() {
        let mut bus = MockBus::default();
        bus.mem[0x0200] = 0x00;
        bus.mem[0x0201] = 0x03;
        let mut cpu = cpu_at(0x0200);
        cpu.y = 0x04;
        let operand = cpu.resolve(Addressing::AbsoluteY, Access::Write, &mut bus);
        assert!(!operand.page_crossed());
        assert_eq!(bus.reads_of(0x0304), 1);
    }

    #[test]
    fn indirect_jump_does_not_carry_into_high_byte() {
        let mut bus = MockBus::default();
        bus.mem[0x0200] = 0xFF;
        bus.mem[0x0201] = 0x10;
        bus.mem[0x10FF] = 0x34;
        bus.mem[0x1000] = 0x12;
        bus.mem[0x1100] = 0x56;
        let mut cpu = cpu_at(0x0200);
        let operand = cpu.resolve(Addressing::Indirect, Access::None, &mut bus);
        assert_eq!(
            operand,
            Operand::Memory {
                addr: 0x1234,
                crossed: false
            }
        );
    }

    #[test]
    fn indirect_y_adds_after_pointer_fetch() {
        let mut bus = MockBus::default();
        bus.mem[0x0200] = 0x40;
        bus.mem[0x0040] = 0xF0;
        bus.mem[0x0041] = 0x02;
        let mut cpu = cpu_at(0x0200);
        cpu.y = 0x20;
        let operand = cpu.resolve(Addressing::IndirectY, Access::Read, &mut bus);
        assert_eq!(
            operand,
            Operand::Memory {
                addr: 0x0310,
                crossed: true
            }
        );
    }

    #[test]
    fn relative_targets_are_signed() {
        let mut bus = MockBus::default();
        bus.mem[0x0200] = 0xFE;
        let mut cpu = cpu_at(0x0200);
        let operand = cpu.resolve(Addressing::Relative, Access::None, &mut bus);
        assert_eq!(operand, Operand::Branch(0x01FF));
    }
}
