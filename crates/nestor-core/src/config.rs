//! Construction-time knobs for [`Bus`](crate::bus::Bus).

/// Number of CPU bus steps before a driven `1` bit on the floating data bus
/// decays to `0`. Roughly three NTSC frames.
pub const DEFAULT_OPEN_BUS_DECAY_TICKS: u64 = 90_000;

/// Contents of the 2 KiB work RAM after a power-on reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RamInit {
    /// Every byte cleared to `$00`.
    #[default]
    Zeroed,
    /// Every byte set to the given value (some test ROMs expect `$FF`).
    Filled(u8),
}

impl RamInit {
    pub(crate) fn fill_byte(self) -> u8 {
        match self {
            RamInit::Zeroed => 0x00,
            RamInit::Filled(value) => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusConfig {
    pub ram_init: RamInit,
    /// Open-bus bit decay period in CPU bus steps; `0` keeps bits latched forever.
    pub open_bus_decay_ticks: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            ram_init: RamInit::default(),
            open_bus_decay_ticks: DEFAULT_OPEN_BUS_DECAY_TICKS,
        }
    }
}
