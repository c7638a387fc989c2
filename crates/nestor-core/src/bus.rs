//! The console bus: the composition root that owns every device and drives
//! the global clock.
//!
//! One [`Bus::clock`] call is one PPU dot. Every third dot the CPU side gets a
//! cycle slot, which either runs a CPU cycle or, while an OAM DMA transfer is
//! in flight, one DMA sub-step with the CPU halted. CPU memory accesses go
//! through a short-lived [`CpuBus`] view that borrows the devices for the
//! duration of the slot.

use std::{cell::RefCell, rc::Rc};

use tracing::info;

use crate::{
    cartridge::{self, Provider, SharedCartridge},
    config::BusConfig,
    controller::Controller,
    cpu::Cpu,
    error::Error,
    memory::cpu as cpu_mem,
    ppu::{Ppu, buffer::FrameBuffer, pattern_bus::PatternBus},
    ram::cpu as cpu_ram,
    reset_kind::ResetKind,
};

pub mod cpu;
pub mod dma;
#[cfg(test)]
pub(crate) mod mock;
pub(crate) mod open_bus;

pub use cpu::CpuBus;
pub use dma::OamDma;
pub(crate) use dma::DmaAction;
pub(crate) use open_bus::OpenBus;

/// PPU dots per CPU cycle on NTSC hardware.
pub const PPU_DOTS_PER_CPU_CYCLE: u64 = 3;

/// CPU-facing memory interface.
///
/// Reads may have side effects (PPU register reads, controller shifts), so
/// both operations take `&mut self`.
pub trait Memory {
    fn read(&mut self, addr: u16) -> u8;

    fn write(&mut self, addr: u16, data: u8);
}

impl<T: Memory + ?Sized> Memory for &mut T {
    fn read(&mut self, addr: u16) -> u8 {
        (**self).read(addr)
    }

    fn write(&mut self, addr: u16, data: u8) {
        (**self).write(addr, data)
    }
}

#[derive(Debug)]
pub struct Bus {
    cpu: Cpu,
    ppu: Ppu,
    ram: cpu_ram::Ram,
    cartridge: Option<SharedCartridge>,
    controllers: [Controller; 2],
    dma: OamDma,
    open_bus: OpenBus,
    /// Global tick counter (PPU dots since construction).
    ticks: u64,
    /// CPU cycle slots since construction, DMA slots included.
    cpu_cycles: u64,
    config: BusConfig,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    pub fn with_config(config: BusConfig) -> Self {
        Self {
            cpu: Cpu::new(),
            ppu: Ppu::new(),
            ram: cpu_ram::Ram::filled(config.ram_init.fill_byte()),
            cartridge: None,
            controllers: [Controller::new(), Controller::new()],
            dma: OamDma::new(),
            open_bus: OpenBus::new(config.open_bus_decay_ticks),
            ticks: 0,
            cpu_cycles: 0,
            config,
        }
    }

    /// Attaches `cartridge` and power-cycles the console.
    pub fn insert_cartridge(&mut self, cartridge: SharedCartridge) {
        if let Ok(cart) = cartridge.try_borrow() {
            let header = cart.header();
            info!(
                mapper = header.mapper_id,
                prg_banks = header.program_bank_count,
                chr_banks = header.graphics_bank_count,
                mirroring = ?cart.mirroring(),
                "cartridge inserted"
            );
        }
        self.cartridge = Some(cartridge);
        self.reset(ResetKind::PowerOn);
    }

    /// Parses an iNES image and inserts it. On error the currently inserted
    /// cartridge stays attached and no reset happens.
    pub fn insert_rom(&mut self, bytes: &[u8]) -> Result<SharedCartridge, Error> {
        self.insert_rom_with_provider(bytes, None)
    }

    /// Like [`insert_rom`](Self::insert_rom), consulting `provider` for
    /// mapper ids the core does not implement.
    pub fn insert_rom_with_provider(
        &mut self,
        bytes: &[u8],
        provider: Option<&dyn Provider>,
    ) -> Result<SharedCartridge, Error> {
        let cart = cartridge::load_cartridge_with_provider(bytes, provider)?;
        let shared = Rc::new(RefCell::new(cart));
        self.insert_cartridge(Rc::clone(&shared));
        Ok(shared)
    }

    pub fn eject_cartridge(&mut self) -> Option<SharedCartridge> {
        let cart = self.cartridge.take();
        if cart.is_some() {
            info!("cartridge ejected");
        }
        cart
    }

    pub fn cartridge(&self) -> Option<SharedCartridge> {
        self.cartridge.clone()
    }

    /// Resets the console. [`ResetKind::PowerOn`] also reinitialises work
    /// RAM from the config and clears the open-bus latch.
    pub fn reset(&mut self, kind: ResetKind) {
        if kind == ResetKind::PowerOn {
            self.ram = cpu_ram::Ram::filled(self.config.ram_init.fill_byte());
            self.open_bus.reset();
        }
        if let Some(cart) = &self.cartridge
            && let Ok(mut cart) = cart.try_borrow_mut()
        {
            cart.reset();
        }
        self.ppu.reset();
        self.dma.reset();
        for ctrl in self.controllers.iter_mut() {
            ctrl.reset();
        }

        let (cpu, mut bus) = self.split();
        cpu.reset(&mut bus);
        info!(?kind, pc = format_args!("{:04X}", self.cpu.pc()), "reset");
    }

    /// CPU-visible read with side effects.
    pub fn read(&mut self, addr: u16) -> u8 {
        self.cpu_bus().read(addr)
    }

    /// CPU-visible write.
    pub fn write(&mut self, addr: u16, data: u8) {
        self.cpu_bus().write(addr, data)
    }

    /// Side-effect-free read for debuggers and tests: no PPU latch changes,
    /// no controller shifts, no open-bus update.
    pub fn peek(&self, addr: u16) -> u8 {
        match addr {
            cpu_mem::INTERNAL_RAM_START..=cpu_mem::INTERNAL_RAM_MIRROR_END => {
                self.ram[(addr & cpu_mem::INTERNAL_RAM_MASK) as usize]
            }
            cpu_mem::PPU_REGISTER_BASE..=cpu_mem::PPU_REGISTER_END => self
                .ppu
                .peek_register(addr, &PatternBus::new(self.cartridge.as_ref())),
            cpu_mem::CONTROLLER_PORT_1 => self.controllers[0].peek(),
            cpu_mem::CONTROLLER_PORT_2 => self.controllers[1].peek(),
            cpu_mem::CARTRIDGE_SPACE_BASE..=cpu_mem::CPU_ADDR_END => self
                .cartridge
                .as_ref()
                .and_then(|cart| cart.try_borrow().ok()?.cpu_read(addr))
                .unwrap_or_else(|| self.open_bus.sample()),
            _ => self.open_bus.sample(),
        }
    }

    /// Advances the console by one PPU dot.
    pub fn clock(&mut self) {
        let pattern = PatternBus::new(self.cartridge.as_ref());
        self.ppu.clock(&pattern);
        if self.ppu.take_nmi() {
            self.cpu.trigger_nmi();
        }

        if self.ticks % PPU_DOTS_PER_CPU_CYCLE == 0 {
            self.cpu_slot();
        }
        self.ticks = self.ticks.wrapping_add(1);
    }

    /// Clocks until the PPU finishes a frame and returns the finished picture.
    pub fn step_frame(&mut self) -> &FrameBuffer {
        self.ppu.take_frame_complete();
        loop {
            self.clock();
            if self.ppu.take_frame_complete() {
                break;
            }
        }
        self.ppu.frame()
    }

    /// One CPU cycle slot: a DMA sub-step while a transfer is active,
    /// otherwise a CPU cycle.
    fn cpu_slot(&mut self) {
        if self.dma.is_active() {
            let odd_cycle = self.cpu_cycles % 2 == 1;
            match self.dma.next_action(odd_cycle) {
                DmaAction::Idle => {}
                DmaAction::Read(addr) => {
                    let value = self.cpu_bus().read(addr);
                    self.dma.latch(value);
                }
                DmaAction::Write { offset, data } => self.ppu.write_oam(offset, data),
            }
        } else {
            let (cpu, mut bus) = self.split();
            cpu.clock(&mut bus);
        }

        self.open_bus.step();
        self.cpu_cycles = self.cpu_cycles.wrapping_add(1);
    }

    fn split(&mut self) -> (&mut Cpu, CpuBus<'_>) {
        let bus = CpuBus::new(
            &mut self.ram,
            &mut self.ppu,
            self.cartridge.as_ref(),
            &mut self.controllers,
            &mut self.dma,
            &mut self.open_bus,
        );
        (&mut self.cpu, bus)
    }

    fn cpu_bus(&mut self) -> CpuBus<'_> {
        self.split().1
    }

    /// Replaces the live button state of `port` (0 or 1). Bit 7 is A, bit 0
    /// is Right. Out-of-range ports are ignored.
    pub fn set_controller_state(&mut self, port: usize, state: u8) {
        if let Some(ctrl) = self.controllers.get_mut(port) {
            ctrl.set_state(state);
        }
    }

    pub fn controller(&self, port: usize) -> Option<&Controller> {
        self.controllers.get(port)
    }

    pub fn controller_mut(&mut self, port: usize) -> Option<&mut Controller> {
        self.controllers.get_mut(port)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn cpu_cycles(&self) -> u64 {
        self.cpu_cycles
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn frame(&self) -> &FrameBuffer {
        self.ppu.frame()
    }

    /// Consumes the PPU's frame-complete flag.
    pub fn take_frame_complete(&mut self) -> bool {
        self.ppu.take_frame_complete()
    }

    pub fn frame_count(&self) -> u64 {
        self.ppu.frame_count()
    }

    pub fn dma(&self) -> &OamDma {
        &self.dma
    }

    pub fn ram(&self) -> &[u8] {
        self.ram.as_slice()
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }
}
