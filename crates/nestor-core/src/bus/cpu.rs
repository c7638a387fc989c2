use tracing::debug;

use crate::{
    bus::{Memory, OamDma, OpenBus},
    cartridge::SharedCartridge,
    controller::Controller,
    memory::cpu as cpu_mem,
    ppu::{Ppu, pattern_bus::PatternBus},
    ram::cpu as cpu_ram,
};

/// CPU-visible bus that decodes addresses onto RAM, the PPU registers, the
/// controller ports and the cartridge. It borrows the hardware from the
/// owning [`Bus`](super::Bus) for the duration of one CPU cycle or DMA read.
#[derive(Debug)]
pub struct CpuBus<'a> {
    ram: &'a mut cpu_ram::Ram,
    ppu: &'a mut Ppu,
    cartridge: Option<&'a SharedCartridge>,
    controllers: &'a mut [Controller; 2],
    dma: &'a mut OamDma,
    open_bus: &'a mut OpenBus,
}

impl<'a> CpuBus<'a> {
    pub(crate) fn new(
        ram: &'a mut cpu_ram::Ram,
        ppu: &'a mut Ppu,
        cartridge: Option<&'a SharedCartridge>,
        controllers: &'a mut [Controller; 2],
        dma: &'a mut OamDma,
        open_bus: &'a mut OpenBus,
    ) -> Self {
        Self {
            ram,
            ppu,
            cartridge,
            controllers,
            dma,
            open_bus,
        }
    }

    fn pattern(&self) -> PatternBus<'a> {
        PatternBus::new(self.cartridge)
    }

    fn read_internal_ram(&self, addr: u16) -> u8 {
        self.ram[(addr & cpu_mem::INTERNAL_RAM_MASK) as usize]
    }

    fn write_internal_ram(&mut self, addr: u16, value: u8) {
        self.ram[(addr & cpu_mem::INTERNAL_RAM_MASK) as usize] = value;
    }

    /// `None` when no cartridge is present, the board does not drive `addr`,
    /// or the cartridge is already borrowed elsewhere.
    fn read_cartridge(&self, addr: u16) -> Option<u8> {
        let cart = self.cartridge?.try_borrow().ok()?;
        cart.cpu_read(addr)
    }

    fn write_cartridge(&mut self, addr: u16, value: u8) {
        let Some(shared) = self.cartridge else {
            return;
        };
        let accepted = shared
            .try_borrow_mut()
            .is_ok_and(|mut cart| cart.cpu_write(addr, value));
        if !accepted {
            debug!(
                addr = format_args!("{addr:04X}"),
                value = format_args!("{value:02X}"),
                "cartridge write discarded"
            );
        }
    }
}

impl Memory for CpuBus<'_> {
    fn read(&mut self, addr: u16) -> u8 {
        let mut driven = true;
        let value = match addr {
            cpu_mem::INTERNAL_RAM_START..=cpu_mem::INTERNAL_RAM_MIRROR_END => {
                self.read_internal_ram(addr)
            }
            cpu_mem::PPU_REGISTER_BASE..=cpu_mem::PPU_REGISTER_END => {
                let pattern = self.pattern();
                self.ppu.cpu_read(addr, &pattern)
            }
            cpu_mem::CONTROLLER_PORT_1 => self.controllers[0].read(),
            cpu_mem::CONTROLLER_PORT_2 => self.controllers[1].read(),
            cpu_mem::APU_REGISTER_BASE..=cpu_mem::APU_REGISTER_END
            | cpu_mem::OAM_DMA
            | cpu_mem::APU_STATUS
            | cpu_mem::TEST_MODE_BASE..=cpu_mem::TEST_MODE_END => {
                driven = false;
                self.open_bus.sample()
            }
            cpu_mem::CARTRIDGE_SPACE_BASE..=cpu_mem::CPU_ADDR_END => {
                match self.read_cartridge(addr) {
                    Some(value) => value,
                    None => {
                        driven = false;
                        self.open_bus.sample()
                    }
                }
            }
        };

        if driven {
            self.open_bus.latch(value);
        }
        value
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.open_bus.latch(data);

        match addr {
            cpu_mem::INTERNAL_RAM_START..=cpu_mem::INTERNAL_RAM_MIRROR_END => {
                self.write_internal_ram(addr, data)
            }
            cpu_mem::PPU_REGISTER_BASE..=cpu_mem::PPU_REGISTER_END => {
                let pattern = self.pattern();
                self.ppu.cpu_write(addr, data, &pattern)
            }
            cpu_mem::OAM_DMA => self.dma.start(data),
            cpu_mem::CONTROLLER_PORT_1 => {
                for ctrl in self.controllers.iter_mut() {
                    ctrl.write_strobe(data);
                }
            }
            // $4017 is the APU frame counter on writes; audio is not modelled.
            cpu_mem::CONTROLLER_PORT_2 => {}
            cpu_mem::APU_REGISTER_BASE..=cpu_mem::APU_REGISTER_END
            | cpu_mem::APU_STATUS
            | cpu_mem::TEST_MODE_BASE..=cpu_mem::TEST_MODE_END => {}
            cpu_mem::CARTRIDGE_SPACE_BASE..=cpu_mem::CPU_ADDR_END => {
                self.write_cartridge(addr, data)
            }
        }
    }
}
