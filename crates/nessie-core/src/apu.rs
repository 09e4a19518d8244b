//! APU timing stub.
//!
//! Only the parts that the CPU can observe without audio output are modelled:
//! the frame sequencer, the per-channel length counters behind `$4015`, and
//! the frame IRQ. Channel registers are latched so debuggers can show them,
//! but no samples are produced.

mod frame_counter;
mod length_counter;

pub use frame_counter::FrameCounterMode;

use frame_counter::FrameCounter;
use length_counter::LengthCounter;

use crate::memory::{apu as apu_mem, cpu as cpu_mem};

const CHANNEL_REGISTERS: usize = (cpu_mem::APU_CHANNEL_END - cpu_mem::APU_CHANNEL_BASE + 1) as usize;

/// Channels that carry a length counter, in `$4015` bit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Pulse1 = 0,
    Pulse2 = 1,
    Triangle = 2,
    Noise = 3,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Apu {
    lengths: [LengthCounter; 4],
    frame_counter: FrameCounter,
    frame_irq: bool,
    /// Last value written to each of `$4000-$4013`.
    registers: [u8; CHANNEL_REGISTERS],
    /// Last `$4017` write, re-applied on reset.
    frame_counter_value: u8,
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

impl Apu {
    pub fn new() -> Self {
        Self {
            lengths: [LengthCounter::default(); 4],
            frame_counter: FrameCounter::default(),
            frame_irq: false,
            registers: [0; CHANNEL_REGISTERS],
            frame_counter_value: 0,
        }
    }

    /// Soft reset: silences every channel and restarts the sequencer with the
    /// last frame counter mode.
    pub fn reset(&mut self) {
        for length in &mut self.lengths {
            length.set_enabled(false);
        }
        self.frame_irq = false;
        self.frame_counter.configure(self.frame_counter_value);
    }

    /// CPU write to `$4000-$4013`, `$4015` or `$4017`.
    pub fn cpu_write(&mut self, addr: u16, data: u8) {
        match addr {
            cpu_mem::APU_CHANNEL_BASE..=cpu_mem::APU_CHANNEL_END => {
                self.registers[(addr - cpu_mem::APU_CHANNEL_BASE) as usize] = data;
                self.write_channel(addr, data);
            }
            apu_mem::STATUS => {
                for (bit, length) in self.lengths.iter_mut().enumerate() {
                    length.set_enabled(data & (1 << bit) != 0);
                }
            }
            apu_mem::FRAME_COUNTER => {
                self.frame_counter_value = data;
                let tick = self.frame_counter.configure(data);
                if self.frame_counter.irq_inhibit() {
                    self.frame_irq = false;
                }
                if tick.half {
                    self.clock_half_frame();
                }
            }
            _ => {}
        }
    }

    fn write_channel(&mut self, addr: u16, data: u8) {
        match addr {
            apu_mem::PULSE1_CONTROL => self.lengths[0].set_halt(data & 0x20 != 0),
            apu_mem::PULSE2_CONTROL => self.lengths[1].set_halt(data & 0x20 != 0),
            apu_mem::TRIANGLE_CONTROL => self.lengths[2].set_halt(data & 0x80 != 0),
            apu_mem::NOISE_CONTROL => self.lengths[3].set_halt(data & 0x20 != 0),
            apu_mem::PULSE1_LENGTH => self.lengths[0].load(data),
            apu_mem::PULSE2_LENGTH => self.lengths[1].load(data),
            apu_mem::TRIANGLE_LENGTH => self.lengths[2].load(data),
            apu_mem::NOISE_LENGTH => self.lengths[3].load(data),
            _ => {}
        }
    }

    /// `$4015` read. Acknowledges the frame IRQ.
    pub fn read_status(&mut self) -> u8 {
        let status = self.peek_status();
        self.frame_irq = false;
        status
    }

    /// `$4015` without side effects.
    pub fn peek_status(&self) -> u8 {
        let mut status = 0;
        for (bit, length) in self.lengths.iter().enumerate() {
            if length.active() {
                status |= 1 << bit;
            }
        }
        if self.frame_irq {
            status |= 0x40;
        }
        status
    }

    /// Advances one CPU cycle.
    pub fn clock(&mut self) {
        let tick = self.frame_counter.step();
        if tick.half {
            self.clock_half_frame();
        }
        if tick.frame_irq {
            self.frame_irq = true;
        }
    }

    fn clock_half_frame(&mut self) {
        for length in &mut self.lengths {
            length.clock();
        }
    }

    pub fn irq_pending(&self) -> bool {
        self.frame_irq
    }

    pub fn length(&self, channel: Channel) -> u8 {
        self.lengths[channel as usize].value()
    }

    pub fn frame_counter_mode(&self) -> FrameCounterMode {
        self.frame_counter.mode()
    }

    /// Latched value of a channel register in `$4000-$4013`.
    pub fn register(&self, addr: u16) -> Option<u8> {
        let index = addr.checked_sub(cpu_mem::APU_CHANNEL_BASE)? as usize;
        self.registers.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_reports_loaded_lengths() {
        let mut apu = Apu::new();
        apu.cpu_write(0x4015, 0b0000_0101);
        apu.cpu_write(0x4003, 0b0000_1000);
        apu.cpu_write(0x400B, 0b0000_1000);
        apu.cpu_write(0x4007, 0b0000_1000);

        assert_eq!(apu.read_status() & 0x0F, 0b0101);
        assert_eq!(apu.length(Channel::Pulse1), 254);
        assert_eq!(apu.length(Channel::Pulse2), 0);
        assert_eq!(apu.register(0x4003), Some(0b0000_1000));
    }

    #[test]
    fn half_frames_count_lengths_down() {
        let mut apu = Apu::new();
        apu.cpu_write(0x4015, 0x01);
        apu.cpu_write(0x4003, 0x00);
        for _ in 0..29830 {
            apu.clock();
        }
        assert_eq!(apu.length(Channel::Pulse1), 8);
    }

    #[test]
    fn frame_irq_is_acknowledged_by_status_read() {
        let mut apu = Apu::new();
        for _ in 0..29829 {
            apu.clock();
        }
        assert!(apu.irq_pending());
        assert_eq!(apu.read_status() & 0x40, 0x40);
        assert!(!apu.irq_pending());
    }

    #[test]
    fn disabling_channel_clears_length() {
        let mut apu = Apu::new();
        apu.cpu_write(0x4015, 0x08);
        apu.cpu_write(0x400F, 0xF8);
        assert_eq!(apu.length(Channel::Noise), 30);
        apu.cpu_write(0x4015, 0x00);
        assert_eq!(apu.peek_status() & 0x08, 0);
    }
}
