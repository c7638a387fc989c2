use std::fmt::Display;

use crate::{
    bus::Memory,
    cpu::{Cpu, addressing::Operand, status::Status},
    memory::cpu as cpu_mem,
};

/// How an instruction uses its memory operand.
///
/// Drives the dummy reads issued by indexed addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Access {
    None,
    Read,
    Write,
    Modify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    //Load/Store
    LDA,
    LDX,
    LDY,
    STA,
    STX,
    STY,
    //Transfer
    TAX,
    TAY,
    TSX,
    TXA,
    TXS,
    TYA,
    //Stack
    PHA,
    PHP,
    PLA,
    PLP,
    //Shift
    ASL,
    LSR,
    ROL,
    ROR,
    //Logic
    AND,
    BIT,
    EOR,
    ORA,
    //Arith
    ADC,
    CMP,
    CPX,
    CPY,
    SBC,
    //Inc
    DEC,
    DEX,
    DEY,
    INC,
    INX,
    INY,
    //Ctrl
    BRK,
    JMP,
    JSR,
    RTI,
    RTS,
    //Bra
    BCC,
    BCS,
    BEQ,
    BMI,
    BNE,
    BPL,
    BVC,
    BVS,
    //Flags
    CLC,
    CLD,
    CLI,
    CLV,
    SEC,
    SED,
    SEI,
    NOP,
    //Unofficial, executed as NOPs of the same length and timing
    ALR,
    ANC,
    ANE,
    ARR,
    DCP,
    ISC,
    JAM,
    LAS,
    LAX,
    LXA,
    RLA,
    RRA,
    SAX,
    SBX,
    SHA,
    SHS,
    SHX,
    SHY,
    SLO,
    SRE,
    USBC,
}

impl Mnemonic {
    pub const fn is_official(self) -> bool {
        !matches!(
            self,
            Mnemonic::ALR
                | Mnemonic::ANC
                | Mnemonic::ANE
                | Mnemonic::ARR
                | Mnemonic::DCP
                | Mnemonic::ISC
                | Mnemonic::JAM
                | Mnemonic::LAS
                | Mnemonic::LAX
                | Mnemonic::LXA
                | Mnemonic::RLA
                | Mnemonic::RRA
                | Mnemonic::SAX
                | Mnemonic::SBX
                | Mnemonic::SHA
                | Mnemonic::SHS
                | Mnemonic::SHX
                | Mnemonic::SHY
                | Mnemonic::SLO
                | Mnemonic::SRE
                | Mnemonic::USBC
        )
    }

    pub(crate) const fn access(self) -> Access {
        match self {
            Mnemonic::STA | Mnemonic::STX | Mnemonic::STY => Access::Write,
            Mnemonic::ASL
            | Mnemonic::LSR
            | Mnemonic::ROL
            | Mnemonic::ROR
            | Mnemonic::INC
            | Mnemonic::DEC => Access::Modify,
            Mnemonic::LDA
            | Mnemonic::LDX
            | Mnemonic::LDY
            | Mnemonic::AND
            | Mnemonic::BIT
            | Mnemonic::EOR
            | Mnemonic::ORA
            | Mnemonic::ADC
            | Mnemonic::SBC
            | Mnemonic::CMP
            | Mnemonic::CPX
            | Mnemonic::CPY
            | Mnemonic::NOP => Access::Read,
            _ => Access::None,
        }
    }
}

impl Display for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Cpu {
    /// Executes one decoded instruction and returns the extra cycles it took
    /// beyond the table value (taken branches only).
    pub(crate) fn execute<M: Memory>(
        &mut self,
        mnemonic: Mnemonic,
        operand: Operand,
        bus: &mut M,
    ) -> u8 {
        match mnemonic {
            Mnemonic::LDA => {
                self.a = self.load(bus, operand);
                self.p.set_zn(self.a);
            }
            Mnemonic::LDX => {
                self.x = self.load(bus, operand);
                self.p.set_zn(self.x);
            }
            Mnemonic::LDY => {
                self.y = self.load(bus, operand);
                self.p.set_zn(self.y);
            }
            Mnemonic::STA => self.store(bus, operand, self.a),
            Mnemonic::STX => self.store(bus, operand, self.x),
            Mnemonic::STY => self.store(bus, operand, self.y),

            Mnemonic::TAX => {
                self.x = self.a;
                self.p.set_zn(self.x);
            }
            Mnemonic::TAY => {
                self.y = self.a;
                self.p.set_zn(self.y);
            }
            Mnemonic::TSX => {
                self.x = self.s;
                self.p.set_zn(self.x);
            }
            Mnemonic::TXA => {
                self.a = self.x;
                self.p.set_zn(self.a);
            }
            Mnemonic::TXS => self.s = self.x,
            Mnemonic::TYA => {
                self.a = self.y;
                self.p.set_zn(self.a);
            }

            Mnemonic::PHA => self.push(bus, self.a),
            Mnemonic::PHP => self.push(bus, self.p.to_stack_byte(true)),
            Mnemonic::PLA => {
                self.a = self.pull(bus);
                self.p.set_zn(self.a);
            }
            Mnemonic::PLP => {
                let value = self.pull(bus);
                self.p = Status::from_stack_byte(value);
            }

            Mnemonic::ASL => self.modify(bus, operand, |cpu, v| {
                cpu.p.set(Status::CARRY, v & 0x80 != 0);
                v << 1
            }),
            Mnemonic::LSR => self.modify(bus, operand, |cpu, v| {
                cpu.p.set(Status::CARRY, v & 0x01 != 0);
                v >> 1
            }),
            Mnemonic::ROL => self.modify(bus, operand, |cpu, v| {
                let carry_in = u8::from(cpu.p.contains(Status::CARRY));
                cpu.p.set(Status::CARRY, v & 0x80 != 0);
                (v << 1) | carry_in
            }),
            Mnemonic::ROR => self.modify(bus, operand, |cpu, v| {
                let carry_in = u8::from(cpu.p.contains(Status::CARRY)) << 7;
                cpu.p.set(Status::CARRY, v & 0x01 != 0);
                (v >> 1) | carry_in
            }),

            Mnemonic::AND => {
                let value = self.load(bus, operand);
                self.a &= value;
                self.p.set_zn(self.a);
            }
            Mnemonic::EOR => {
                let value = self.load(bus, operand);
                self.a ^= value;
                self.p.set_zn(self.a);
            }
            Mnemonic::ORA => {
                let value = self.load(bus, operand);
                self.a |= value;
                self.p.set_zn(self.a);
            }
            Mnemonic::BIT => {
                let value = self.load(bus, operand);
                self.p.set(Status::ZERO, self.a & value == 0);
                self.p.set(Status::OVERFLOW, value & 0x40 != 0);
                self.p.set(Status::NEGATIVE, value & 0x80 != 0);
            }

            Mnemonic::ADC => {
                let value = self.load(bus, operand);
                self.add_with_carry(value);
            }
            Mnemonic::SBC => {
                let value = self.load(bus, operand);
                self.add_with_carry(!value);
            }
            Mnemonic::CMP => {
                let value = self.load(bus, operand);
                self.compare(self.a, value);
            }
            Mnemonic::CPX => {
                let value = self.load(bus, operand);
                self.compare(self.x, value);
            }
            Mnemonic::CPY => {
                let value = self.load(bus, operand);
                self.compare(self.y, value);
            }

            Mnemonic::INC => self.modify(bus, operand, |_, v| v.wrapping_add(1)),
            Mnemonic::DEC => self.modify(bus, operand, |_, v| v.wrapping_sub(1)),
            Mnemonic::INX => {
                self.x = self.x.wrapping_add(1);
                self.p.set_zn(self.x);
            }
            Mnemonic::INY => {
                self.y = self.y.wrapping_add(1);
                self.p.set_zn(self.y);
            }
            Mnemonic::DEX => {
                self.x = self.x.wrapping_sub(1);
                self.p.set_zn(self.x);
            }
            Mnemonic::DEY => {
                self.y = self.y.wrapping_sub(1);
                self.p.set_zn(self.y);
            }

            Mnemonic::BRK => {
                // Padding byte after the opcode is skipped.
                self.pc = self.pc.wrapping_add(1);
                self.enter_interrupt(bus, cpu_mem::IRQ_VECTOR_LO, true);
            }
            Mnemonic::JMP => {
                if let Operand::Memory { addr, .. } = operand {
                    self.pc = addr;
                }
            }
            Mnemonic::JSR => {
                if let Operand::Memory { addr, .. } = operand {
                    let ret = self.pc.wrapping_sub(1);
                    self.push_word(bus, ret);
                    self.pc = addr;
                }
            }
            Mnemonic::RTI => {
                let value = self.pull(bus);
                self.p = Status::from_stack_byte(value);
                self.pc = self.pull_word(bus);
            }
            Mnemonic::RTS => {
                self.pc = self.pull_word(bus).wrapping_add(1);
            }

            Mnemonic::BCC => return self.branch(operand, !self.p.contains(Status::CARRY)),
            Mnemonic::BCS => return self.branch(operand, self.p.contains(Status::CARRY)),
            Mnemonic::BNE => return self.branch(operand, !self.p.contains(Status::ZERO)),
            Mnemonic::BEQ => return self.branch(operand, self.p.contains(Status::ZERO)),
            Mnemonic::BPL => return self.branch(operand, !self.p.contains(Status::NEGATIVE)),
            Mnemonic::BMI => return self.branch(operand, self.p.contains(Status::NEGATIVE)),
            Mnemonic::BVC => return self.branch(operand, !self.p.contains(Status::OVERFLOW)),
            Mnemonic::BVS => return self.branch(operand, self.p.contains(Status::OVERFLOW)),

            Mnemonic::CLC => self.p.remove(Status::CARRY),
            Mnemonic::CLD => self.p.remove(Status::DECIMAL),
            Mnemonic::CLI => self.p.remove(Status::INTERRUPT),
            Mnemonic::CLV => self.p.remove(Status::OVERFLOW),
            Mnemonic::SEC => self.p.insert(Status::CARRY),
            Mnemonic::SED => self.p.insert(Status::DECIMAL),
            Mnemonic::SEI => self.p.insert(Status::INTERRUPT),

            // The operand is still read so register side effects match the hardware.
            _ => {
                if let Operand::Memory { addr, .. } = operand {
                    bus.read(addr);
                }
            }
        }
        0
    }

    fn load<M: Memory>(&mut self, bus: &mut M, operand: Operand) -> u8 {
        match operand {
            Operand::Memory { addr, .. } => bus.read(addr),
            _ => self.a,
        }
    }

    fn store<M: Memory>(&mut self, bus: &mut M, operand: Operand, value: u8) {
        if let Operand::Memory { addr, .. } = operand {
            bus.write(addr, value);
        }
    }

    /// Read-modify-write: memory operands see the unmodified value written
    /// back before the result, like the hardware's double write.
    fn modify<M, F>(&mut self, bus: &mut M, operand: Operand, f: F)
    where
        M: Memory,
        F: FnOnce(&mut Self, u8) -> u8,
    {
        match operand {
            Operand::Memory { addr, .. } => {
                let old = bus.read(addr);
                bus.write(addr, old);
                let new = f(self, old);
                self.p.set_zn(new);
                bus.write(addr, new);
            }
            _ => {
                let old = self.a;
                self.a = f(self, old);
                self.p.set_zn(self.a);
            }
        }
    }

    fn add_with_carry(&mut self, value: u8) {
        let carry = u16::from(self.p.contains(Status::CARRY));
        let sum = u16::from(self.a) + u16::from(value) + carry;
        let result = sum as u8;
        self.p.set(Status::CARRY, sum > 0xFF);
        self.p.set(
            Status::OVERFLOW,
            (!(self.a ^ value) & (self.a ^ result) & 0x80) != 0,
        );
        self.a = result;
        self.p.set_zn(result);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.p.set(Status::CARRY, register >= value);
        self.p.set_zn(register.wrapping_sub(value));
    }

    /// One extra cycle when taken, two when the target is on another page.
    fn branch(&mut self, operand: Operand, taken: bool) -> u8 {
        let Operand::Branch(target) = operand else {
            return 0;
        };
        if !taken {
            return 0;
        }
        let extra = if self.pc & 0xFF00 != target & 0xFF00 {
            2
        } else {
            1
        };
        self.pc = target;
        extra
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::mock::MockBus;

    /// Runs the program at `$0200` for `steps` instructions.
    fn run(program: &[u8], steps: usize, setup: impl FnOnce(&mut Cpu, &mut MockBus)) -> (Cpu, MockBus) {
        let mut bus = MockBus::with_program(0x0200, program);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        setup(&mut cpu, &mut bus);
        for _ in 0..steps {
            cpu.step(&mut bus);
        }
        (cpu, bus)
    }

    #[test]
    fn lda_immediate_sets_flags() {
        let (cpu, _) = run(&[0xA9, 0x00, 0xA9, 0x80], 1, |_, _| {});
        assert_eq!(cpu.a, 0);
        assert!(cpu.p.contains(Status::ZERO));
        let (cpu, _) = run(&[0xA9, 0x00, 0xA9, 0x80], 2, |_, _| {});
        assert_eq!(cpu.a, 0x80);
        assert!(cpu.p.contains(Status::NEGATIVE));
        assert!(!cpu.p.contains(Status::ZERO));
    }

    #[test]
    fn adc_sets_carry_and_overflow() {
        // LDA #$7F; ADC #$01
        let (cpu, _) = run(&[0xA9, 0x7F, 0x69, 0x01], 2, |_, _| {});
        assert_eq!(cpu.a, 0x80);
        assert!(cpu.p.contains(Status::OVERFLOW));
        assert!(!cpu.p.contains(Status::CARRY));

        // LDA #$FF; ADC #$01
        let (cpu, _) = run(&[0xA9, 0xFF, 0x69, 0x01], 2, |_, _| {});
        assert_eq!(cpu.a, 0x00);
        assert!(cpu.p.contains(Status::CARRY));
        assert!(cpu.p.contains(Status::ZERO));
    }

    #[test]
    fn sbc_borrows_through_carry() {
        // SEC; LDA #$05; SBC #$06
        let (cpu, _) = run(&[0x38, 0xA9, 0x05, 0xE9, 0x06], 3, |_, _| {});
        assert_eq!(cpu.a, 0xFF);
        assert!(!cpu.p.contains(Status::CARRY));
        assert!(cpu.p.contains(Status::NEGATIVE));
    }

    #[test]
    fn cmp_orders_unsigned() {
        // LDA #$10; CMP #$10
        let (cpu, _) = run(&[0xA9, 0x10, 0xC9, 0x10], 2, |_, _| {});
        assert!(cpu.p.contains(Status::ZERO | Status::CARRY));
        // LDA #$10; CMP #$20
        let (cpu, _) = run(&[0xA9, 0x10, 0xC9, 0x20], 2, |_, _| {});
        assert!(!cpu.p.contains(Status::CARRY));
    }

    #[test]
    fn sta_and_inc_touch_memory() {
        // LDA #$41; STA $10; INC $10
        let (_, bus) = run(&[0xA9, 0x41, 0x85, 0x10, 0xE6, 0x10], 3, |_, _| {});
        assert_eq!(bus.mem[0x10], 0x42);
    }

    #[test]
    fn rmw_writes_old_value_first() {
        // INC $0300
        let (_, bus) = run(&[0xEE, 0x00, 0x03], 1, |_, bus| bus.mem[0x0300] = 0x07);
        assert_eq!(bus.writes, vec![(0x0300, 0x07), (0x0300, 0x08)]);
    }

    #[test]
    fn shifts_on_accumulator() {
        // LDA #$81; ASL A; ROR A
        let (cpu, _) = run(&[0xA9, 0x81, 0x0A], 2, |_, _| {});
        assert_eq!(cpu.a, 0x02);
        assert!(cpu.p.contains(Status::CARRY));
        let (cpu, _) = run(&[0xA9, 0x81, 0x0A, 0x6A], 3, |_, _| {});
        assert_eq!(cpu.a, 0x81);
        assert!(!cpu.p.contains(Status::CARRY));
    }

    #[test]
    fn bit_copies_operand_high_bits() {
        // LDA #$01; BIT $10
        let (cpu, _) = run(&[0xA9, 0x01, 0x24, 0x10], 2, |_, bus| bus.mem[0x10] = 0xC0);
        assert!(cpu.p.contains(Status::ZERO | Status::OVERFLOW | Status::NEGATIVE));
    }

    #[test]
    fn jsr_and_rts_round_trip() {
        // JSR $0210; LDX #$01 ... $0210: LDY #$02; RTS
        let mut program = vec![0xEA; 0x20];
        program[..5].copy_from_slice(&[0x20, 0x10, 0x02, 0xA2, 0x01]);
        program[0x10..0x13].copy_from_slice(&[0xA0, 0x02, 0x60]);
        let (cpu, bus) = run(&program, 4, |_, _| {});
        assert_eq!(cpu.x, 0x01);
        assert_eq!(cpu.y, 0x02);
        assert_eq!(cpu.s, 0xFD);
        assert_eq!(bus.mem[0x01FD], 0x02);
        assert_eq!(bus.mem[0x01FC], 0x02);
    }

    #[test]
    fn stack_round_trips_status() {
        // SEC; PHP; CLC; PLP
        let (cpu, bus) = run(&[0x38, 0x08, 0x18, 0x28], 4, |_, _| {});
        assert!(cpu.p.contains(Status::CARRY));
        assert!(!cpu.p.contains(Status::BREAK));
        assert_eq!(bus.mem[0x01FD] & 0x30, 0x30);
    }

    #[test]
    fn taken_branch_costs_extra_cycles() {
        let mut bus = MockBus::with_program(0x02F0, &[0xD0, 0x20]);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        cpu.p.remove(Status::ZERO);
        assert_eq!(cpu.step(&mut bus), 4);
        assert_eq!(cpu.pc, 0x0312);
    }

    #[test]
    fn brk_vectors_through_irq() {
        let mut bus = MockBus::with_program(0x0200, &[0x00, 0xEA]);
        bus.mem[0xFFFE] = 0x00;
        bus.mem[0xFFFF] = 0x90;
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        cpu.step(&mut bus);
        assert_eq!(cpu.pc, 0x9000);
        assert!(cpu.p.contains(Status::INTERRUPT));
        assert_eq!(bus.mem[0x01FB] & 0x10, 0x10);
        assert_eq!(bus.mem[0x01FC], 0x02);
        assert_eq!(bus.mem[0x01FD], 0x02);
    }

    #[test]
    fn unofficial_opcodes_only_advance_pc() {
        // SLO $0300 (unofficial, 3 bytes, 6 cycles)
        let (cpu, bus) = run(&[0x0F, 0x00, 0x03], 1, |_, bus| bus.mem[0x0300] = 0x81);
        assert_eq!(cpu.pc, 0x0203);
        assert_eq!(cpu.a, 0);
        assert_eq!(bus.mem[0x0300], 0x81);
        assert!(bus.writes.is_empty());
    }
}
