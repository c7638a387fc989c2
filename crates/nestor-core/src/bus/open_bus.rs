//! CPU data bus open-bus model.
//!
//! The 2A03 data bus floats when no device drives it. Reads from write-only
//! or unmapped addresses return whatever value was last on the bus, with
//! charged bits slowly leaking back to 0. The latch tracks the last driven
//! byte and a per-bit decay deadline measured in CPU bus steps.

/// Tracks the last value driven on the data bus and per-bit decay.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct OpenBus {
    value: u8,
    decay_deadline: [u64; 8],
    tick: u64,
    /// Steps before a driven bit decays; `0` keeps bits forever.
    decay_ticks: u64,
}

impl OpenBus {
    pub(crate) fn new(decay_ticks: u64) -> Self {
        Self {
            value: 0,
            decay_deadline: [0; 8],
            tick: 0,
            decay_ticks,
        }
    }

    /// Resets the open-bus state to its power-on value.
    pub(crate) fn reset(&mut self) {
        self.value = 0;
        self.decay_deadline = [0; 8];
        self.tick = 0;
    }

    /// Advances the internal clock by one CPU bus step and applies any pending
    /// bit decays.
    pub(crate) fn step(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        self.apply_decay();
    }

    /// Returns the current bus value without refreshing the decay timers.
    pub(crate) fn sample(&self) -> u8 {
        self.value
    }

    /// Latches a freshly driven value onto the bus and refreshes every bit's
    /// decay deadline.
    pub(crate) fn latch(&mut self, value: u8) {
        self.value = value;
        if self.decay_ticks == 0 {
            return;
        }
        let decay_at = self.tick.wrapping_add(self.decay_ticks);
        for (bit, deadline) in self.decay_deadline.iter_mut().enumerate() {
            *deadline = if value & (1 << bit) != 0 { decay_at } else { 0 };
        }
    }

    fn apply_decay(&mut self) {
        for (bit, deadline) in self.decay_deadline.iter_mut().enumerate() {
            if *deadline != 0 && self.tick >= *deadline {
                self.value &= !(1 << bit);
                *deadline = 0;
            }
        }
    }
}
