mod common;

use anyhow::Result;
use common::{IDLE_LOOP, boot, nrom_program, run_cpu_cycles};
use nestor_core::{Bus, memory::cpu as cpu_mem};

fn fill_page(bus: &mut Bus, page: u8, f: impl Fn(u8) -> u8) {
    for i in 0..=255u8 {
        bus.write(u16::from_be_bytes([page, i]), f(i));
    }
}

/// Clocks until the transfer finishes and returns the CPU cycle slots it used.
fn finish_dma(bus: &mut Bus) -> u64 {
    let start = bus.cpu_cycles();
    while bus.dma().is_active() {
        bus.clock();
    }
    bus.cpu_cycles() - start
}

#[test]
fn copies_the_whole_page_into_oam() -> Result<()> {
    let (mut bus, _cart) = boot(&nrom_program(&IDLE_LOOP))?;
    fill_page(&mut bus, 0x02, |i| i ^ 0x5A);

    bus.write(cpu_mem::OAM_DMA, 0x02);
    assert!(bus.dma().is_active());
    finish_dma(&mut bus);

    assert!(!bus.dma().is_active());
    for (i, &byte) in bus.ppu().oam().iter().enumerate() {
        assert_eq!(byte, i as u8 ^ 0x5A, "OAM[{i}]");
    }
    Ok(())
}

#[test]
fn transfer_takes_513_or_514_cycles_by_parity() -> Result<()> {
    let mut seen = Vec::new();
    for lead in 0..2 {
        let (mut bus, _cart) = boot(&nrom_program(&IDLE_LOOP))?;
        run_cpu_cycles(&mut bus, lead);
        let odd_start = bus.cpu_cycles() % 2 == 1;

        bus.write(cpu_mem::OAM_DMA, 0x00);
        let slots = finish_dma(&mut bus);

        assert_eq!(slots, if odd_start { 513 } else { 514 });
        seen.push(slots);
    }
    seen.sort_unstable();
    assert_eq!(seen, vec![513, 514]);
    Ok(())
}

#[test]
fn cpu_is_halted_during_transfer() -> Result<()> {
    let (mut bus, _cart) = boot(&nrom_program(&IDLE_LOOP))?;
    bus.write(cpu_mem::OAM_DMA, 0x07);

    let cpu_before = bus.cpu().total_cycles();
    let slots = finish_dma(&mut bus);
    assert!(slots >= 513);
    assert_eq!(bus.cpu().total_cycles(), cpu_before);

    run_cpu_cycles(&mut bus, 10);
    assert_eq!(bus.cpu().total_cycles(), cpu_before + 10);
    Ok(())
}

#[test]
fn program_triggered_transfer_reads_cartridge_space() -> Result<()> {
    // LDA #$80; STA $4014; JMP $8005
    let (mut bus, cart) = boot(&nrom_program(&[0xA9, 0x80, 0x8D, 0x14, 0x40, 0x4C, 0x05, 0x80]))?;
    run_cpu_cycles(&mut bus, 600);

    assert!(!bus.dma().is_active());
    assert_eq!(bus.dma().page(), 0x80);
    let prg = cart.borrow().prg_rom()[..0x100].to_vec();
    assert_eq!(bus.ppu().oam(), &prg[..]);
    Ok(())
}
