//! Last value driven on the CPU data bus.
//!
//! Nothing drives the lines on a read from an unmapped address, so the byte
//! left over from the previous access is read back. The charge leaks away
//! after a while; we drop the whole byte to 0 once it has not been refreshed
//! for [`DECAY_CYCLES`].

/// Roughly three NTSC frames of CPU cycles.
const DECAY_CYCLES: u64 = 90_000;

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub(crate) struct OpenBus {
    value: u8,
    /// CPU cycle at which `value` was last driven.
    driven_at: u64,
}

impl OpenBus {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }

    /// Latches a value that a device or the CPU drove onto the bus.
    pub(crate) fn latch(&mut self, value: u8, cycle: u64) {
        self.value = value;
        self.driven_at = cycle;
    }

    /// Floating read at `cycle`.
    pub(crate) fn sample(&self, cycle: u64) -> u8 {
        if cycle.saturating_sub(self.driven_at) > DECAY_CYCLES {
            0
        } else {
            self.value
        }
    }
}
