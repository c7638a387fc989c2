use thiserror::Error;

/// Load-time failures. Nothing on the clocking path ever produces one of these.
#[derive(Debug, Error)]
pub enum Error {
    /// Provided buffer is shorter than the 16-byte header.
    #[error("header expected 16 bytes, got {actual}")]
    TooShort { actual: usize },
    /// Magic number ("NES<EOF>") is missing.
    #[error("missing NES magic bytes")]
    InvalidMagic,
    /// A ROM section (trainer/PRG/CHR) is shorter than advertised.
    #[error("{section} section expected {expected} bytes, got {actual}")]
    SectionTooShort {
        section: &'static str,
        expected: usize,
        actual: usize,
    },
    /// The cartridge declares no program storage at all.
    #[error("cartridge declares zero PRG ROM banks")]
    NoProgramBanks,
    /// No built-in mapper and no provider matched the requested id.
    #[error("mapper {0} is not supported")]
    UnsupportedMapper(u8),
    /// Wrapper for I/O errors raised while reading ROMs from disk.
    #[error("i/o error while reading cartridge: {0}")]
    Io(#[from] std::io::Error),
}
