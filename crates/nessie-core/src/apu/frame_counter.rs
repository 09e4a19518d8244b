//! Frame sequencer that clocks the length counters at half-frame intervals
//! and raises the frame IRQ in 4-step mode.

/// Frame sequencer timing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrameCounterMode {
    #[default]
    FourStep,
    FiveStep,
}

/// What a single CPU cycle of the sequencer produced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct FrameTick {
    pub(super) half: bool,
    pub(super) frame_irq: bool,
}

/// 4-step timeline in CPU cycles: (cycle, half frame, irq). Quarter-frame
/// steps only drive envelopes and linear counters, which are not modelled.
const FRAME_STEP_4: &[(u32, bool, bool)] = &[
    (7457, false, false),
    (14913, true, false),
    (22371, false, false),
    (29829, true, true),
];
const FRAME_STEP_4_PERIOD: u32 = 29830;

/// 5-step timeline. Never raises the frame IRQ.
const FRAME_STEP_5: &[(u32, bool, bool)] = &[
    (7457, false, false),
    (14913, true, false),
    (22371, false, false),
    (37281, true, false),
];
const FRAME_STEP_5_PERIOD: u32 = 37282;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct FrameCounter {
    mode: FrameCounterMode,
    irq_inhibit: bool,
    cycle: u32,
}

impl FrameCounter {
    pub(super) fn mode(&self) -> FrameCounterMode {
        self.mode
    }

    pub(super) fn irq_inhibit(&self) -> bool {
        self.irq_inhibit
    }

    /// `$4017` write: bit 7 selects 5-step mode, bit 6 inhibits the IRQ.
    ///
    /// Resets the sequence. 5-step mode clocks the half-frame units
    /// immediately, which the returned tick reports.
    pub(super) fn configure(&mut self, value: u8) -> FrameTick {
        self.mode = if value & 0b1000_0000 == 0 {
            FrameCounterMode::FourStep
        } else {
            FrameCounterMode::FiveStep
        };
        self.irq_inhibit = value & 0b0100_0000 != 0;
        self.cycle = 0;
        FrameTick {
            half: self.mode == FrameCounterMode::FiveStep,
            frame_irq: false,
        }
    }

    fn schedule(&self) -> (&'static [(u32, bool, bool)], u32) {
        match self.mode {
            FrameCounterMode::FourStep => (FRAME_STEP_4, FRAME_STEP_4_PERIOD),
            FrameCounterMode::FiveStep => (FRAME_STEP_5, FRAME_STEP_5_PERIOD),
        }
    }

    /// Advances one CPU cycle.
    pub(super) fn step(&mut self) -> FrameTick {
        self.cycle += 1;
        let (schedule, period) = self.schedule();

        let mut tick = FrameTick::default();
        for &(at, half, irq) in schedule {
            if self.cycle == at {
                tick.half |= half;
                tick.frame_irq |= irq;
            }
        }
        if self.cycle >= period {
            self.cycle = 0;
        }

        tick.frame_irq &= !self.irq_inhibit;
        tick
    }
}
