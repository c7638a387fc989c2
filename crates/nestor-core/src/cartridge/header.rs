//! iNES header parsing.
//!
//! The first 16 bytes of every `.nes` ROM describe how much PRG/CHR data
//! follows, which mapper the board uses and how the nametables are mirrored.
//! This module reduces them to the [`CartridgeHeader`] the cartridge is built
//! from.
//!
//! Every header flavour is read with the iNES 1.0 layout. NES 2.0 and archaic
//! headers are recognised and logged, but none of their extended fields are
//! interpreted: bank counts come from bytes 4/5 and the mapper id from the two
//! flag nibbles regardless of format.

use bitflags::bitflags;
use tracing::warn;

use crate::{cartridge::CartridgeHeader, error::Error};

const NES_MAGIC: &[u8; 4] = b"NES\x1A";

/// Length of the fixed header that precedes the trainer and PRG data.
pub const NES_HEADER_LEN: usize = 16;

bitflags! {
    /// Header byte 6: board wiring and the low mapper nibble.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags6: u8 {
        const VERTICAL_MIRRORING = 0b0000_0001;
        const BATTERY_RAM        = 0b0000_0010;
        const HAS_TRAINER        = 0b0000_0100;
        const FOUR_SCREEN_VRAM   = 0b0000_1000;
        const MAPPER_LO          = 0b1111_0000;
    }
}

bitflags! {
    /// Header byte 7: console type, format marker and the high mapper nibble.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags7: u8 {
        const VS_SYSTEM     = 0b0000_0001;
        const PLAYCHOICE    = 0b0000_0010;
        const FORMAT_MARKER = 0b0000_1100;
        const MAPPER_HI     = 0b1111_0000;
    }
}

/// Header dialect, told apart by bits 2-3 of byte 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RomFormat {
    INes,
    Nes20,
    /// Pre-standard dumps, often with a ripper signature in bytes 7-15.
    Archaic,
}

impl From<Flags7> for RomFormat {
    fn from(flags7: Flags7) -> Self {
        match (flags7 & Flags7::FORMAT_MARKER).bits() {
            0b0000_1000 => RomFormat::Nes20,
            0b0000_0000 => RomFormat::INes,
            _ => RomFormat::Archaic,
        }
    }
}

/// Everything the loader learns from the first 16 bytes of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParsedHeader {
    pub cartridge: CartridgeHeader,
    pub format: RomFormat,
    /// A 512-byte trainer sits between the header and PRG data.
    pub trainer_present: bool,
    pub battery_backed_ram: bool,
}

impl ParsedHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        let Some(header) = bytes.first_chunk::<NES_HEADER_LEN>() else {
            return Err(Error::TooShort {
                actual: bytes.len(),
            });
        };
        let [m0, m1, m2, m3, prg_banks, chr_banks, b6, b7, padding @ ..] = *header;
        if [m0, m1, m2, m3] != *NES_MAGIC {
            return Err(Error::InvalidMagic);
        }

        let flags6 = Flags6::from_bits_retain(b6);
        let flags7 = Flags7::from_bits_retain(b7);
        let format = RomFormat::from(flags7);
        match format {
            RomFormat::INes if padding[3..].iter().any(|&b| b != 0) => {
                warn!("non-zero bytes in header padding; ignoring them")
            }
            RomFormat::INes => {}
            _ => warn!(?format, "reading header with the iNES 1.0 layout"),
        }
        if flags6.contains(Flags6::FOUR_SCREEN_VRAM) {
            warn!("four-screen VRAM is not supported; using the mirroring bit");
        }

        let mapper_id =
            (flags7 & Flags7::MAPPER_HI).bits() | ((flags6 & Flags6::MAPPER_LO).bits() >> 4);
        Ok(Self {
            cartridge: CartridgeHeader {
                program_bank_count: prg_banks,
                graphics_bank_count: chr_banks,
                mapper_id,
                mirror_vertical: flags6.contains(Flags6::VERTICAL_MIRRORING),
            },
            format,
            trainer_present: flags6.contains(Flags6::HAS_TRAINER),
            battery_backed_ram: flags6.contains(Flags6::BATTERY_RAM),
        })
    }
}
