use std::{cell::RefCell, fs, path::Path, rc::Rc};

use tracing::{info, warn};

use crate::{
    cartridge::header::{NES_HEADER_LEN, ParsedHeader},
    error::Error,
};

pub const TRAINER_SIZE: usize = 512;
/// Size of one PRG bank as counted by the header.
pub const PRG_BANK_SIZE: usize = 16 * 1024;
/// Size of one CHR bank as counted by the header.
pub const CHR_BANK_SIZE: usize = 8 * 1024;

pub mod header;
pub mod mapper;
pub use mapper::{Mapper, Mapper0, Provider, create_mapper};

/// Handle shared between the bus and any diagnostic consumer.
///
/// Everything runs on the emulation thread, so `Rc<RefCell<_>>` is enough; the
/// bus only borrows it for the duration of a single access.
pub type SharedCartridge = Rc<RefCell<Cartridge>>;

/// What the file loader hands to the core: bank counts, mapper id and the
/// soldered nametable mirroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CartridgeHeader {
    /// PRG ROM size in 16 KiB units.
    pub program_bank_count: u8,
    /// CHR ROM size in 8 KiB units (0 means the board carries 8 KiB CHR RAM).
    pub graphics_bank_count: u8,
    pub mapper_id: u8,
    pub mirror_vertical: bool,
}

impl CartridgeHeader {
    pub fn prg_len(&self) -> usize {
        self.program_bank_count as usize * PRG_BANK_SIZE
    }

    pub fn chr_len(&self) -> usize {
        self.graphics_bank_count as usize * CHR_BANK_SIZE
    }

    pub fn mirroring(&self) -> Mirroring {
        if self.mirror_vertical {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        }
    }
}

/// Layout mirroring type for the PPU nametables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mirroring {
    /// `$2000` = `$2400`, `$2800` = `$2C00`.
    Horizontal,
    /// `$2000` = `$2800`, `$2400` = `$2C00`.
    Vertical,
}

/// Raw PRG/CHR storage plus the mapper that translates addresses into it.
#[derive(Debug)]
pub struct Cartridge {
    header: CartridgeHeader,
    prg: Vec<u8>,
    chr: Vec<u8>,
    mapper: Box<dyn Mapper>,
}

impl Cartridge {
    /// Builds a cartridge from a header and the PRG/CHR byte ranges the loader
    /// extracted. Fails when a range is shorter than its bank count implies or
    /// when no mapper variant matches the header.
    pub fn new(header: CartridgeHeader, prg: &[u8], chr: &[u8]) -> Result<Self, Error> {
        Self::with_provider(header, prg, chr, None)
    }

    /// Same as [`Cartridge::new`] but consults `provider` for mapper ids the
    /// core does not implement.
    pub fn with_provider(
        header: CartridgeHeader,
        prg: &[u8],
        chr: &[u8],
        provider: Option<&dyn Provider>,
    ) -> Result<Self, Error> {
        if header.program_bank_count == 0 {
            return Err(Error::NoProgramBanks);
        }

        let prg = copy_banks(prg, header.prg_len(), "PRG ROM")?;
        let chr = if header.graphics_bank_count == 0 {
            vec![0; CHR_BANK_SIZE]
        } else {
            copy_banks(chr, header.chr_len(), "CHR ROM")?
        };

        let (prg_banks, chr_banks) = (header.program_bank_count, header.graphics_bank_count);
        let mapper = create_mapper(header.mapper_id, prg_banks, chr_banks)
            .or_else(|| provider.and_then(|p| p.get_mapper(header.mapper_id, prg_banks, chr_banks)))
            .ok_or(Error::UnsupportedMapper(header.mapper_id))?;

        info!(
            mapper = %mapper.name(),
            prg_banks,
            chr_banks,
            mirroring = ?header.mirroring(),
            "cartridge built"
        );

        Ok(Self {
            header,
            prg,
            chr,
            mapper,
        })
    }

    pub fn header(&self) -> &CartridgeHeader {
        &self.header
    }

    pub fn mirroring(&self) -> Mirroring {
        self.header.mirroring()
    }

    pub fn mapper(&self) -> &dyn Mapper {
        self.mapper.as_ref()
    }

    pub fn prg_rom(&self) -> &[u8] {
        &self.prg
    }

    pub fn chr(&self) -> &[u8] {
        &self.chr
    }

    /// CPU read through the mapper. `None` when the board leaves the bus floating.
    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        let offset = self.mapper.cpu_map_read(addr)?;
        self.prg.get(offset).copied()
    }

    /// CPU write through the mapper. Returns `false` when the write was
    /// discarded (ROM, or consumed by a mapper register).
    pub fn cpu_write(&mut self, addr: u16, data: u8) -> bool {
        store(self.mapper.cpu_map_write(addr, data), &mut self.prg, data)
    }

    pub fn ppu_read(&self, addr: u16) -> Option<u8> {
        let offset = self.mapper.ppu_map_read(addr)?;
        self.chr.get(offset).copied()
    }

    pub fn ppu_write(&mut self, addr: u16, data: u8) -> bool {
        store(self.mapper.ppu_map_write(addr, data), &mut self.chr, data)
    }

    /// Power-cycle hook: restores mapper bank registers.
    pub fn reset(&mut self) {
        self.mapper.reset();
    }
}

impl Clone for Cartridge {
    fn clone(&self) -> Self {
        Self {
            header: self.header,
            prg: self.prg.clone(),
            chr: self.chr.clone(),
            mapper: self.mapper.clone(),
        }
    }
}

fn store(offset: Option<usize>, storage: &mut [u8], data: u8) -> bool {
    match offset.and_then(|offset| storage.get_mut(offset)) {
        Some(slot) => {
            *slot = data;
            true
        }
        None => false,
    }
}

fn copy_banks(bytes: &[u8], len: usize, name: &'static str) -> Result<Vec<u8>, Error> {
    let slice = bytes.get(..len).ok_or(Error::SectionTooShort {
        section: name,
        expected: len,
        actual: bytes.len(),
    })?;
    Ok(slice.to_vec())
}

/// Load a cartridge from an in-memory iNES image.
pub fn load_cartridge(bytes: &[u8]) -> Result<Cartridge, Error> {
    load_cartridge_with_provider(bytes, None)
}

/// Load a cartridge from an in-memory iNES image, asking `provider` for
/// mappers the core does not implement.
pub fn load_cartridge_with_provider(
    bytes: &[u8],
    provider: Option<&dyn Provider>,
) -> Result<Cartridge, Error> {
    let parsed = ParsedHeader::parse(bytes)?;
    let mut cursor = NES_HEADER_LEN;
    if parsed.trainer_present {
        warn!("skipping {TRAINER_SIZE}-byte trainer");
        section(bytes, &mut cursor, TRAINER_SIZE, "trainer")?;
    }

    let header = parsed.cartridge;
    let prg = section(bytes, &mut cursor, header.prg_len(), "PRG ROM")?;
    let chr = section(bytes, &mut cursor, header.chr_len(), "CHR ROM")?;

    Cartridge::with_provider(header, prg, chr, provider)
}

/// Load a cartridge directly from disk.
pub fn load_cartridge_from_file<P>(path: P) -> Result<Cartridge, Error>
where
    P: AsRef<Path>,
{
    let bytes = fs::read(path)?;
    load_cartridge(&bytes)
}

fn section<'a>(
    bytes: &'a [u8],
    cursor: &mut usize,
    len: usize,
    name: &'static str,
) -> Result<&'a [u8], Error> {
    let too_short = Error::SectionTooShort {
        section: name,
        expected: len,
        actual: bytes.len().saturating_sub(*cursor),
    };
    let slice = cursor
        .checked_add(len)
        .and_then(|end| bytes.get(*cursor..end))
        .ok_or(too_short)?;
    *cursor += len;
    Ok(slice)
}
