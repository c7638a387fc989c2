//! Hardware model of the NES console bus.
//!
//! [`Bus`] owns the 6502 CPU, the 2C02 PPU, work RAM, both controller ports,
//! the OAM DMA unit and an optional shared [`Cartridge`](cartridge::Cartridge).
//! Each [`Bus::clock`] call advances the system by one PPU dot; the CPU runs
//! on every third dot.
//!
//! ```
//! use nestor_core::Bus;
//!
//! let mut bus = Bus::new();
//! bus.write(0x0001, 0x42);
//! assert_eq!(bus.read(0x0801), 0x42);
//! ```

pub mod bus;
pub mod cartridge;
pub mod config;
pub mod controller;
pub mod cpu;
pub mod error;
pub mod memory;
pub mod ppu;
pub mod ram;
pub mod reset_kind;

pub use bus::{Bus, CpuBus, Memory, OamDma};
pub use cartridge::{Cartridge, Mirroring, SharedCartridge};
pub use config::{BusConfig, RamInit};
pub use controller::{Buttons, Controller};
pub use cpu::{Cpu, CpuSnapshot};
pub use error::Error;
pub use ppu::{Ppu, buffer::FrameBuffer, palette::Color};
pub use reset_kind::ResetKind;

#[cfg(test)]
mod tests {
    use ctor::ctor;
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    #[ctor]
    fn init_tracing() {
        let subscriber = FmtSubscriber::builder()
            .with_file(true)
            .with_line_number(true)
            .with_max_level(Level::DEBUG)
            .pretty()
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("setting default subscriber failed");
    }
}
