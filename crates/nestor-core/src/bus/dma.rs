//! OAM DMA (`$4014`) transfer state.
//!
//! Writing page `P` to `$4014` copies `$PP00-$PPFF` into sprite memory while
//! the CPU is halted. Each CPU cycle slot the bus asks [`OamDma::next_action`]
//! what to do: one or two idle cycles to reach read alignment, then 256
//! alternating read/write pairs, for 513 or 514 cycles in total.

use tracing::debug;

/// What the bus performs during one DMA cycle slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DmaAction {
    /// Halt/alignment cycle; no bus traffic.
    Idle,
    /// Read this CPU address and hand the byte to [`OamDma::latch`].
    Read(u16),
    /// Store the staging byte into OAM at this offset.
    Write { offset: u8, data: u8 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OamDma {
    page: u8,
    cursor: u8,
    staging: u8,
    active: bool,
    dummy: bool,
}

impl OamDma {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a transfer from CPU page `page`.
    pub fn start(&mut self, page: u8) {
        debug!(page = format_args!("{page:02X}"), "OAM DMA start");
        self.page = page;
        self.cursor = 0;
        self.active = true;
        self.dummy = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn page(&self) -> u8 {
        self.page
    }

    /// Number of bytes already copied into OAM.
    pub fn cursor(&self) -> u8 {
        self.cursor
    }

    /// Decides the work for the current CPU cycle slot.
    ///
    /// `odd_cycle` is the parity of the CPU cycle counter. The dummy phase
    /// ends on an odd cycle, so the first read lands on an even one.
    pub(crate) fn next_action(&mut self, odd_cycle: bool) -> DmaAction {
        if !self.active {
            return DmaAction::Idle;
        }
        if self.dummy {
            if odd_cycle {
                self.dummy = false;
            }
            return DmaAction::Idle;
        }
        if !odd_cycle {
            return DmaAction::Read(u16::from_be_bytes([self.page, self.cursor]));
        }

        let action = DmaAction::Write {
            offset: self.cursor,
            data: self.staging,
        };
        self.cursor = self.cursor.wrapping_add(1);
        if self.cursor == 0 {
            self.active = false;
            debug!(page = format_args!("{:02X}", self.page), "OAM DMA done");
        }
        action
    }

    /// Stores the byte fetched for the pending [`DmaAction::Read`].
    pub(crate) fn latch(&mut self, data: u8) {
        self.staging = data;
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
