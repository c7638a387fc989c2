use crate::{bus::Memory, memory::cpu as cpu_mem};

/// Flat 64 KiB memory that records every access, for CPU unit tests.
#[derive(Debug)]
pub(crate) struct MockBus {
    pub(crate) mem: Vec<u8>,
    pub(crate) reads: Vec<u16>,
    pub(crate) writes: Vec<(u16, u8)>,
}

impl Default for MockBus {
    fn default() -> Self {
        Self {
            mem: vec![0; 0x1_0000],
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }
}

impl MockBus {
    /// Places `program` at `base` and points the reset vector at it.
    pub(crate) fn with_program(base: u16, program: &[u8]) -> Self {
        let mut bus = Self::default();
        let start = base as usize;
        bus.mem[start..start + program.len()].copy_from_slice(program);
        let [lo, hi] = base.to_le_bytes();
        bus.mem[cpu_mem::RESET_VECTOR_LO as usize] = lo;
        bus.mem[cpu_mem::RESET_VECTOR_HI as usize] = hi;
        bus
    }

    pub(crate) fn reads_of(&self, addr: u16) -> usize {
        self.reads.iter().filter(|&&a| a == addr).count()
    }
}

impl Memory for MockBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.reads.push(addr);
        self.mem[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.writes.push((addr, data));
        self.mem[addr as usize] = data;
    }
}
