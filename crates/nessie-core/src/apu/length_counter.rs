//! Length counter shared by pulse, triangle, and noise channels.

/// Lengths indexed by bits 3-7 of the channel's fourth register.
pub(super) const LENGTH_TABLE: [u8; 32] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14, 12, 16, 24, 18, 48, 20, 96, 22,
    192, 24, 72, 26, 16, 28, 32, 30,
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct LengthCounter {
    value: u8,
    halt: bool,
    enabled: bool,
}

impl LengthCounter {
    pub(super) fn value(&self) -> u8 {
        self.value
    }

    pub(super) fn active(&self) -> bool {
        self.value > 0
    }

    /// `$4015` channel enable. Disabling clears the counter immediately.
    pub(super) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.value = 0;
        }
    }

    pub(super) fn set_halt(&mut self, halt: bool) {
        self.halt = halt;
    }

    /// Loads from the length table; ignored while the channel is disabled.
    pub(super) fn load(&mut self, register: u8) {
        if self.enabled {
            self.value = LENGTH_TABLE[(register >> 3) as usize];
        }
    }

    /// Half-frame clock.
    pub(super) fn clock(&mut self) {
        if self.value > 0 && !self.halt {
            self.value -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_channel_ignores_loads() {
        let mut counter = LengthCounter::default();
        counter.load(0b0000_1000);
        assert_eq!(counter.value(), 0);

        counter.set_enabled(true);
        counter.load(0b0000_1000);
        assert_eq!(counter.value(), 254);
    }

    #[test]
    fn halt_freezes_countdown() {
        let mut counter = LengthCounter::default();
        counter.set_enabled(true);
        counter.load(0);
        counter.set_halt(true);
        counter.clock();
        assert_eq!(counter.value(), 10);
        counter.set_halt(false);
        counter.clock();
        assert_eq!(counter.value(), 9);
        counter.set_enabled(false);
        assert!(!counter.active());
    }
}
