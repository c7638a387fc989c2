//! Ricoh 2A03 CPU core (6502 without decimal mode).
//!
//! The core is instruction-stepped with a cycle countdown: when the previous
//! instruction's cycles have elapsed, [`Cpu::clock`] fetches, decodes and
//! executes the next one in full and loads its cycle cost into the countdown.
//! All memory traffic goes through a [`Memory`] implementation, so the same
//! core runs against the console bus or a flat test memory.

use tracing::trace;

use crate::{bus::Memory, memory::cpu as cpu_mem};

mod addressing;
mod lookup;
mod mnemonic;
mod status;

pub use addressing::Addressing;
pub use lookup::Instruction;
pub use mnemonic::Mnemonic;
pub use status::Status;

use lookup::LOOKUP_TABLE;

/// Cycles spent by the reset sequence.
const RESET_CYCLES: u8 = 8;
/// Cycles spent entering an NMI handler.
const NMI_CYCLES: u8 = 8;
/// Cycles spent entering an IRQ handler.
const IRQ_CYCLES: u8 = 7;

/// Copy of the programmer-visible registers, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CpuSnapshot {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub s: u8,
    pub p: Status,
    pub pc: u16,
    /// Cycles left before the next instruction is fetched.
    pub remaining_cycles: u8,
    /// Cycles clocked since power-on.
    pub total_cycles: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cpu {
    // Registers
    pub(crate) a: u8,     //Accumulator
    pub(crate) x: u8,     //X Index Register
    pub(crate) y: u8,     //Y Index Register
    pub(crate) s: u8,     //Stack Pointer
    pub(crate) p: Status, //Processor Status
    pub(crate) pc: u16,   //Program Counter

    cycles: u8,
    total_cycles: u64,
    nmi_pending: bool,
    irq_line: bool,
}

impl Cpu {
    /// Create a new CPU instance with default values.
    /// Does not fetch the reset vector; call [`Cpu::reset`] for that.
    pub fn new() -> Self {
        Self {
            a: 0x00,
            x: 0x00,
            y: 0x00,
            s: 0xFD,
            p: Status::power_on(),
            pc: 0x0000,
            cycles: 0,
            total_cycles: 0,
            nmi_pending: false,
            irq_line: false,
        }
    }

    /// Reset sequence: PC from `$FFFC/$FFFD`, `S = $FD`, `P = I | U`.
    pub fn reset<M: Memory>(&mut self, bus: &mut M) {
        self.pc = read_vector(bus, cpu_mem::RESET_VECTOR_LO);
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.s = 0xFD;
        self.p = Status::power_on();
        self.nmi_pending = false;
        self.irq_line = false;
        self.cycles = RESET_CYCLES;
    }

    /// Advances the CPU by one cycle.
    ///
    /// Pending interrupts are taken at instruction boundaries: NMI first, then
    /// IRQ when the line is held and `I` is clear.
    pub fn clock<M: Memory>(&mut self, bus: &mut M) {
        if self.cycles == 0 {
            if self.nmi_pending {
                self.nmi_pending = false;
                self.nmi(bus);
            } else if self.irq_line && !self.p.contains(Status::INTERRUPT) {
                self.irq(bus);
            } else {
                self.cycles = self.step(bus);
            }
        }
        self.cycles = self.cycles.saturating_sub(1);
        self.total_cycles = self.total_cycles.wrapping_add(1);
    }

    /// Fetches, decodes and executes one instruction, returning its cycle cost.
    pub(crate) fn step<M: Memory>(&mut self, bus: &mut M) -> u8 {
        let pc = self.pc;
        let opcode = self.fetch_byte(bus);
        let instr = LOOKUP_TABLE[opcode as usize];
        trace!(
            pc = format_args!("{pc:04X}"),
            opcode = format_args!("{opcode:02X}"),
            mnemonic = %instr.mnemonic,
            a = self.a,
            x = self.x,
            y = self.y,
            p = self.p.bits(),
            s = self.s,
            "cpu step"
        );

        let operand = self.resolve(instr.mode, instr.mnemonic.access(), bus);
        let mut cycles = instr.cycles;
        if instr.page_penalty && operand.page_crossed() {
            cycles += 1;
        }
        cycles + self.execute(instr.mnemonic, operand, bus)
    }

    /// Enters the NMI handler immediately (vector `$FFFA`).
    pub fn nmi<M: Memory>(&mut self, bus: &mut M) {
        self.enter_interrupt(bus, cpu_mem::NMI_VECTOR_LO, false);
        self.cycles = NMI_CYCLES;
    }

    /// Enters the IRQ handler (vector `$FFFE`) unless `I` masks it.
    pub fn irq<M: Memory>(&mut self, bus: &mut M) {
        if self.p.contains(Status::INTERRUPT) {
            return;
        }
        self.enter_interrupt(bus, cpu_mem::IRQ_VECTOR_LO, false);
        self.cycles = IRQ_CYCLES;
    }

    /// Latches an NMI edge; it is serviced at the next instruction boundary.
    pub fn trigger_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Sets the level of the shared IRQ line.
    pub fn set_irq_line(&mut self, asserted: bool) {
        self.irq_line = asserted;
    }

    pub fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    /// `true` when the current instruction's cycles have all elapsed.
    pub fn is_instruction_boundary(&self) -> bool {
        self.cycles == 0
    }

    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            a: self.a,
            x: self.x,
            y: self.y,
            s: self.s,
            p: self.p,
            pc: self.pc,
            remaining_cycles: self.cycles,
            total_cycles: self.total_cycles,
        }
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    pub(crate) fn enter_interrupt<M: Memory>(&mut self, bus: &mut M, vector: u16, brk: bool) {
        self.push_word(bus, self.pc);
        self.push(bus, self.p.to_stack_byte(brk));
        self.p.insert(Status::INTERRUPT);
        self.pc = read_vector(bus, vector);
    }

    pub(crate) fn push<M: Memory>(&mut self, bus: &mut M, value: u8) {
        bus.write(cpu_mem::STACK_PAGE_START | u16::from(self.s), value);
        self.s = self.s.wrapping_sub(1);
    }

    pub(crate) fn pull<M: Memory>(&mut self, bus: &mut M) -> u8 {
        self.s = self.s.wrapping_add(1);
        bus.read(cpu_mem::STACK_PAGE_START | u16::from(self.s))
    }

    pub(crate) fn push_word<M: Memory>(&mut self, bus: &mut M, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.push(bus, hi);
        self.push(bus, lo);
    }

    pub(crate) fn pull_word<M: Memory>(&mut self, bus: &mut M) -> u16 {
        let lo = self.pull(bus);
        let hi = self.pull(bus);
        u16::from_le_bytes([lo, hi])
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

fn read_vector<M: Memory>(bus: &mut M, lo_addr: u16) -> u16 {
    let lo = bus.read(lo_addr);
    let hi = bus.read(lo_addr.wrapping_add(1));
    u16::from_le_bytes([lo, hi])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::mock::MockBus;

    fn boot(program: &[u8]) -> (Cpu, MockBus) {
        let mut bus = MockBus::with_program(0x8000, program);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        (cpu, bus)
    }

    /// Clocks through the reset sequence so the next clock fetches.
    fn finish_reset(cpu: &mut Cpu, bus: &mut MockBus) {
        for _ in 0..RESET_CYCLES {
            cpu.clock(bus);
        }
    }

    #[test]
    fn reset_loads_vector_and_registers() {
        let (cpu, _) = boot(&[0xEA]);
        let snap = cpu.snapshot();
        assert_eq!(snap.pc, 0x8000);
        assert_eq!(snap.s, 0xFD);
        assert_eq!(snap.p, Status::INTERRUPT | Status::UNUSED);
        assert_eq!(snap.remaining_cycles, RESET_CYCLES);
    }

    #[test]
    fn instruction_runs_once_its_cycles_elapse() {
        // LDA #$01 (2 cycles); LDA #$02
        let (mut cpu, mut bus) = boot(&[0xA9, 0x01, 0xA9, 0x02]);
        finish_reset(&mut cpu, &mut bus);

        cpu.clock(&mut bus);
        assert_eq!(cpu.a, 0x01);
        assert!(!cpu.is_instruction_boundary());
        cpu.clock(&mut bus);
        assert!(cpu.is_instruction_boundary());
        assert_eq!(cpu.a, 0x01);
        cpu.clock(&mut bus);
        assert_eq!(cpu.a, 0x02);
        assert_eq!(cpu.total_cycles(), u64::from(RESET_CYCLES) + 3);
    }

    #[test]
    fn page_cross_adds_a_cycle_to_reads() {
        // LDX #$01; LDA $12FF,X
        let (mut cpu, mut bus) = boot(&[0xA2, 0x01, 0xBD, 0xFF, 0x12]);
        cpu.step(&mut bus);
        assert_eq!(cpu.step(&mut bus), 5);
    }

    #[test]
    fn triggered_nmi_waits_for_boundary() {
        let (mut cpu, mut bus) = boot(&[0xEA, 0xEA]);
        bus.mem[0xFFFA] = 0x00;
        bus.mem[0xFFFB] = 0x90;
        finish_reset(&mut cpu, &mut bus);

        cpu.clock(&mut bus); // NOP starts
        cpu.trigger_nmi();
        assert!(cpu.nmi_pending());
        cpu.clock(&mut bus); // NOP finishes
        assert_eq!(cpu.pc(), 0x8001);
        cpu.clock(&mut bus);
        assert!(!cpu.nmi_pending());
        assert_eq!(cpu.pc(), 0x9000);
        assert_eq!(bus.mem[0x01FD], 0x80);
        assert_eq!(bus.mem[0x01FC], 0x01);
        assert_eq!(bus.mem[0x01FB] & 0x10, 0, "B clear for hardware interrupts");
        assert!(cpu.p.contains(Status::INTERRUPT));
    }

    #[test]
    fn irq_respects_interrupt_mask() {
        let (mut cpu, mut bus) = boot(&[0xEA, 0x58, 0xEA, 0xEA]);
        bus.mem[0xFFFE] = 0x00;
        bus.mem[0xFFFF] = 0xA0;
        cpu.set_irq_line(true);
        cpu.step(&mut bus); // NOP with I set: masked
        cpu.irq(&mut bus);
        assert_eq!(cpu.pc(), 0x8001);

        cpu.step(&mut bus); // CLI
        cpu.irq(&mut bus);
        assert_eq!(cpu.pc(), 0xA000);
        assert_eq!(cpu.snapshot().remaining_cycles, IRQ_CYCLES);
    }

    #[test]
    fn rti_restores_pc_and_status() {
        // $8000: SEC; BRK; pad  | $9000: CLC; RTI
        let mut program = vec![0xEA; 0x1010];
        program[..3].copy_from_slice(&[0x38, 0x00, 0xEA]);
        program[0x1000..0x1002].copy_from_slice(&[0x18, 0x40]);
        let (mut cpu, mut bus) = boot(&program);
        bus.mem[0xFFFE] = 0x00;
        bus.mem[0xFFFF] = 0x90;

        for _ in 0..4 {
            cpu.step(&mut bus);
        }
        assert_eq!(cpu.pc(), 0x8003);
        assert!(cpu.p.contains(Status::CARRY));
        assert!(!cpu.p.contains(Status::BREAK));
    }
}
