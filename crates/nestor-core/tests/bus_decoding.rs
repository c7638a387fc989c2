mod common;

use std::rc::Rc;

use anyhow::Result;
use common::{IDLE_LOOP, RomBuilder, boot, nrom_program};
use nestor_core::{
    Bus, Buttons, Error,
    cartridge::{Mapper, Provider},
    memory::cpu as cpu_mem,
};
use proptest::prelude::*;
use rand::Rng;

proptest! {
    #[test]
    fn ram_mirrors_every_2k(addr in 0u16..0x2000, value: u8) {
        let mut bus = Bus::new();
        bus.write(addr, value);
        prop_assert_eq!(bus.read(addr ^ 0x0800), value);
        prop_assert_eq!(bus.read(addr & cpu_mem::INTERNAL_RAM_MASK), value);
    }

    #[test]
    fn ppu_registers_mirror_every_8_bytes(
        mirror in 0x2000u16..0x4000,
        offset in 0u16..0x03C0,
        value: u8,
    ) {
        let mut bus = Bus::new();
        let base = mirror & !0x0007;
        let [hi, lo] = (0x2000 + offset).to_be_bytes();

        bus.write(base + 6, hi);
        bus.write(base + 6, lo);
        bus.write(base + 7, value);

        bus.write(0x2006, hi);
        bus.write(0x2006, lo);
        let _stale = bus.read(0x2007);
        prop_assert_eq!(bus.read(0x2007), value);
    }

    #[test]
    fn mapper0_writes_never_change_prg(addr in 0x8000u16..=0xFFFF, value: u8) {
        let rom = RomBuilder::new(2).fill_prg(|i| (i >> 3) as u8).build();
        let (mut bus, _cart) = boot(&rom).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let before = bus.read(addr);
        bus.write(addr, value);
        prop_assert_eq!(bus.read(addr), before);
    }
}

#[test]
fn status_reads_through_mirrors_clear_the_write_toggle() {
    let mut bus = Bus::new();
    bus.write(0x2006, 0x21);
    // $3FFA mirrors $2002.
    bus.read(0x3FFA);
    bus.write(0x2006, 0x20);
    bus.write(0x2006, 0x10);
    bus.write(0x2007, 0x99);

    bus.write(0x2006, 0x20);
    bus.write(0x2006, 0x10);
    bus.read(0x2007);
    assert_eq!(bus.read(0x2007), 0x99);
}

#[test]
fn one_bank_nrom_mirrors_upper_half() -> Result<()> {
    let mut rng = rand::rng();
    let mut bank = vec![0u8; common::PRG_BANK_SIZE];
    rng.fill(&mut bank[..]);
    let rom = RomBuilder::new(1).fill_prg(|i| bank[i]).build();
    let (mut bus, _cart) = boot(&rom)?;

    for offset in (0..0x4000u16).step_by(97) {
        assert_eq!(bus.read(0x8000 + offset), bus.read(0xC000 + offset));
        assert_eq!(bus.read(0x8000 + offset), bank[offset as usize]);
    }
    Ok(())
}

#[test]
fn two_bank_nrom_maps_banks_separately() -> Result<()> {
    let rom = RomBuilder::new(2)
        .fill_prg(|i| (i / common::PRG_BANK_SIZE) as u8 + 1)
        .build();
    let (mut bus, _cart) = boot(&rom)?;

    assert_eq!(bus.read(0x8000), 1);
    assert_eq!(bus.read(0xBFFF), 1);
    assert_eq!(bus.read(0xC000), 2);
    assert_eq!(bus.read(0xFFFF), 2);
    Ok(())
}

#[test]
fn controller_shifts_live_state_msb_first() {
    let mut bus = Bus::new();
    bus.set_controller_state(0, (Buttons::A | Buttons::SELECT | Buttons::LEFT).bits());
    bus.set_controller_state(1, Buttons::B.bits());

    bus.write(cpu_mem::CONTROLLER_PORT_1, 1);
    bus.write(cpu_mem::CONTROLLER_PORT_1, 0);

    let port1: Vec<u8> = (0..8)
        .map(|_| bus.read(cpu_mem::CONTROLLER_PORT_1) & 1)
        .collect();
    assert_eq!(port1, vec![1, 0, 1, 0, 0, 0, 1, 0]);
    assert_eq!(bus.read(cpu_mem::CONTROLLER_PORT_1) & 1, 1);

    let port2: Vec<u8> = (0..8)
        .map(|_| bus.read(cpu_mem::CONTROLLER_PORT_2) & 1)
        .collect();
    assert_eq!(port2, vec![0, 1, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn strobe_high_keeps_reporting_a() {
    let mut bus = Bus::new();
    bus.set_controller_state(0, Buttons::A.bits());
    bus.write(cpu_mem::CONTROLLER_PORT_1, 1);
    for _ in 0..4 {
        assert_eq!(bus.read(cpu_mem::CONTROLLER_PORT_1) & 1, 1);
    }
}

#[test]
fn port_2_write_does_not_strobe() {
    let mut bus = Bus::new();
    bus.set_controller_state(1, Buttons::A.bits());
    bus.write(cpu_mem::CONTROLLER_PORT_2, 1);
    bus.write(cpu_mem::CONTROLLER_PORT_2, 0);
    assert_eq!(bus.read(cpu_mem::CONTROLLER_PORT_2) & 1, 0);
}

#[test]
fn open_bus_starts_at_zero_and_follows_driven_values() {
    let mut bus = Bus::new();
    assert_eq!(bus.read(0x4000), 0);
    assert_eq!(bus.read(0x8000), 0);

    bus.write(0x0000, 0xA7);
    assert_eq!(bus.read(cpu_mem::APU_STATUS), 0xA7);
    assert_eq!(bus.read(cpu_mem::OAM_DMA), 0xA7);
    assert_eq!(bus.read(0x4018), 0xA7);

    bus.read(0x0000);
    bus.write(0x0001, 0x13);
    assert_eq!(bus.read(0x5000), 0x13);
}

#[test]
fn mapper0_leaves_low_cartridge_space_floating() -> Result<()> {
    let (mut bus, _cart) = boot(&nrom_program(&IDLE_LOOP))?;
    bus.write(0x0000, 0x6E);
    assert_eq!(bus.read(0x6000), 0x6E);
    Ok(())
}

#[test]
fn failed_insert_keeps_previous_cartridge() -> Result<()> {
    let (mut bus, cart) = boot(&nrom_program(&IDLE_LOOP))?;

    let err = bus.insert_rom(b"NES\x1A").unwrap_err();
    assert!(matches!(err, Error::TooShort { actual: 4 }));

    let bad_mapper = RomBuilder::new(1).mapper(200).build();
    let err = bus.insert_rom(&bad_mapper).unwrap_err();
    assert!(matches!(err, Error::UnsupportedMapper(200)));

    let current = bus.cartridge().expect("cartridge retained");
    assert!(Rc::ptr_eq(&current, &cart));
    assert_eq!(bus.read(0xFFFC), 0x00);
    assert_eq!(bus.read(0xFFFD), 0x80);
    Ok(())
}

fn set_ppu_addr(bus: &mut Bus, addr: u16) {
    let [hi, lo] = addr.to_be_bytes();
    bus.write(0x2006, hi);
    bus.write(0x2006, lo);
}

#[test]
fn ppu_data_writes_reach_chr_rom_storage() -> Result<()> {
    let rom = RomBuilder::new(1).chr_banks(1).build();
    let (mut bus, cart) = boot(&rom)?;
    assert_eq!(cart.borrow().header().graphics_bank_count, 1);

    set_ppu_addr(&mut bus, 0x0123);
    bus.write(0x2007, 0x9C);

    assert_eq!(cart.borrow().chr()[0x0123], 0x9C);
    Ok(())
}

#[test]
fn vertical_mirroring_folds_nametables_into_ciram() -> Result<()> {
    let rom = RomBuilder::new(1).vertical().build();
    let (mut bus, _cart) = boot(&rom)?;

    set_ppu_addr(&mut bus, 0x2805);
    bus.write(0x2007, 0x5A);
    set_ppu_addr(&mut bus, 0x2405);
    bus.write(0x2007, 0x3C);

    let ciram = bus.ppu().ciram();
    assert_eq!(ciram[0x005], 0x5A);
    assert_eq!(ciram[0x405], 0x3C);

    set_ppu_addr(&mut bus, 0x2005);
    let _stale = bus.read(0x2007);
    assert_eq!(bus.read(0x2007), 0x5A);
    Ok(())
}

#[derive(Debug, Clone)]
struct LastBankOnly {
    last: usize,
}

impl Mapper for LastBankOnly {
    fn cpu_map_read(&self, addr: u16) -> Option<usize> {
        (addr >= 0xC000).then(|| self.last * common::PRG_BANK_SIZE + (addr as usize & 0x3FFF))
    }

    fn cpu_map_write(&mut self, _addr: u16, _data: u8) -> Option<usize> {
        None
    }

    fn ppu_map_read(&self, addr: u16) -> Option<usize> {
        Some(addr as usize & 0x1FFF)
    }

    fn ppu_map_write(&mut self, _addr: u16, _data: u8) -> Option<usize> {
        None
    }

    fn mapper_id(&self) -> u8 {
        200
    }
}

#[derive(Debug)]
struct TestProvider;

impl Provider for TestProvider {
    fn get_mapper(&self, id: u8, prg_banks: u8, _chr_banks: u8) -> Option<Box<dyn Mapper>> {
        (id == 200).then(|| {
            Box::new(LastBankOnly {
                last: prg_banks as usize - 1,
            }) as Box<dyn Mapper>
        })
    }
}

#[test]
fn provider_supplies_unknown_mappers() -> Result<()> {
    let rom = RomBuilder::new(4)
        .mapper(200)
        .fill_prg(|i| (i / common::PRG_BANK_SIZE) as u8)
        .build();
    let mut bus = Bus::new();
    let cart = bus.insert_rom_with_provider(&rom, Some(&TestProvider))?;

    assert_eq!(cart.borrow().mapper().mapper_id(), 200);
    assert_eq!(bus.read(0xC000), 3);
    // Below $C000 the board does not respond.
    bus.write(0x0000, 0x55);
    assert_eq!(bus.read(0x8000), 0x55);
    Ok(())
}
