//! Cartridge address-translation policies.
//!
//! A [`Mapper`] turns a CPU or PPU address into a byte offset inside the
//! cartridge's PRG or CHR storage. Mappers never see the storage itself; the
//! [`Cartridge`](super::Cartridge) performs the actual access with the offset
//! it gets back. Bank-switching boards keep their register state inside the
//! mapper and update it from the `data` byte of a write.
//!
//! [`create_mapper`] is the one table that maps header ids to variants. Boards
//! the core does not ship can be plugged in through a [`Provider`].

use std::{borrow::Cow, fmt::Debug};

use dyn_clone::DynClone;

mod mapper0;

pub use mapper0::Mapper0;

pub trait Mapper: DynClone + Debug {
    /// Offset into PRG storage for a CPU read, or `None` when the board does
    /// not drive the data bus at `addr`.
    fn cpu_map_read(&self, addr: u16) -> Option<usize>;

    /// Offset into PRG storage for a CPU write, or `None` when the write must
    /// not reach storage (ROM, or a register write the mapper consumed).
    fn cpu_map_write(&mut self, addr: u16, data: u8) -> Option<usize>;

    /// Offset into CHR storage for a PPU pattern-table read.
    fn ppu_map_read(&self, addr: u16) -> Option<usize>;

    /// Offset into CHR storage for a PPU pattern-table write.
    fn ppu_map_write(&mut self, addr: u16, data: u8) -> Option<usize>;

    /// Restores bank registers to their power-on values.
    fn reset(&mut self) {}

    fn mapper_id(&self) -> u8;

    fn name(&self) -> Cow<'static, str> {
        Cow::Owned(format!("Mapper {}", self.mapper_id()))
    }
}

dyn_clone::clone_trait_object!(Mapper);

/// Source of user-provided mappers when the core does not implement a board.
///
/// `Provider` is consulted only when the requested mapper id is unknown to
/// [`create_mapper`]. Returning `None` defers to the core's
/// [`Error::UnsupportedMapper`](crate::error::Error::UnsupportedMapper).
///
/// # Example
/// ```
/// use nestor_core::cartridge::{Cartridge, CartridgeHeader, Mapper, Provider};
///
/// #[derive(Debug, Clone)]
/// struct FixedLastBank {
///     prg_banks: u8,
/// }
///
/// impl Mapper for FixedLastBank {
///     fn cpu_map_read(&self, addr: u16) -> Option<usize> {
///         let last = self.prg_banks.saturating_sub(1) as usize;
///         (addr >= 0x8000).then(|| last * 0x4000 + (addr as usize & 0x3FFF))
///     }
///     fn cpu_map_write(&mut self, _addr: u16, _data: u8) -> Option<usize> { None }
///     fn ppu_map_read(&self, addr: u16) -> Option<usize> { Some(addr as usize & 0x1FFF) }
///     fn ppu_map_write(&mut self, _addr: u16, _data: u8) -> Option<usize> { None }
///     fn mapper_id(&self) -> u8 { 200 }
/// }
///
/// #[derive(Debug)]
/// struct CustomProvider;
///
/// impl Provider for CustomProvider {
///     fn get_mapper(&self, id: u8, prg_banks: u8, _chr_banks: u8) -> Option<Box<dyn Mapper>> {
///         (id == 200).then(|| Box::new(FixedLastBank { prg_banks }) as Box<dyn Mapper>)
///     }
/// }
///
/// let header = CartridgeHeader {
///     program_bank_count: 2,
///     graphics_bank_count: 1,
///     mapper_id: 200,
///     mirror_vertical: false,
/// };
/// let mut prg = vec![0u8; 2 * 0x4000];
/// prg[0x4000] = 0x99;
/// let cart = Cartridge::with_provider(header, &prg, &[0; 0x2000], Some(&CustomProvider))?;
/// assert_eq!(cart.cpu_read(0x8000), Some(0x99));
/// # Ok::<(), nestor_core::error::Error>(())
/// ```
pub trait Provider: Debug {
    fn get_mapper(&self, id: u8, prg_banks: u8, chr_banks: u8) -> Option<Box<dyn Mapper>>;
}

/// Built-in mapper table keyed by iNES mapper id.
pub fn create_mapper(id: u8, prg_banks: u8, _chr_banks: u8) -> Option<Box<dyn Mapper>> {
    match id {
        0 => Some(Box::new(Mapper0::new(prg_banks))),
        _ => None,
    }
}
