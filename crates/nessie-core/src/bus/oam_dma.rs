//! `$4014` sprite DMA.
//!
//! The transfer halts the CPU and then alternates a read from the source page
//! with a write to OAMDATA, 256 times. One or two alignment cycles come first,
//! so the CPU loses 513 cycles, or 514 when the transfer starts on an odd CPU
//! cycle.

use tracing::debug;

use crate::memory::ppu::OAM_RAM_SIZE;

const COPY_CYCLES: u16 = 2 * OAM_RAM_SIZE as u16;

/// Bus activity for one stolen CPU cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DmaCycle {
    /// Halt/alignment cycle with no transfer.
    Halt,
    /// Read a source byte.
    Read(u16),
    /// Write the byte fetched on the previous cycle to OAMDATA.
    Write(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Transfer {
    page: u8,
    cycle: u16,
    total: u16,
    data: u8,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct OamDma {
    request: Option<u8>,
    transfer: Option<Transfer>,
}

impl OamDma {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Records a `$4014` write. The copy starts at the next CPU boundary.
    pub fn request(&mut self, page: u8) {
        self.request = Some(page);
    }

    pub fn is_pending(&self) -> bool {
        self.request.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.transfer.is_some()
    }

    /// Turns the pending request into a running transfer.
    pub fn start(&mut self, odd_cycle: bool) {
        let Some(page) = self.request.take() else {
            return;
        };
        let total = COPY_CYCLES + 1 + odd_cycle as u16;
        debug!(page = format_args!("{page:02X}"), cycles = total, "OAM DMA start");
        self.transfer = Some(Transfer {
            page,
            cycle: 0,
            total,
            data: 0,
        });
    }

    /// Advances the transfer by one CPU cycle and reports what that cycle
    /// does on the bus. `None` when no transfer is running.
    pub fn next_cycle(&mut self) -> Option<DmaCycle> {
        let transfer = self.transfer.as_mut()?;
        let alignment = transfer.total - COPY_CYCLES;
        let step = transfer.cycle;
        transfer.cycle += 1;

        let action = if step < alignment {
            DmaCycle::Halt
        } else {
            let copy = step - alignment;
            if copy % 2 == 0 {
                DmaCycle::Read(u16::from_le_bytes([(copy / 2) as u8, transfer.page]))
            } else {
                DmaCycle::Write(transfer.data)
            }
        };

        if transfer.cycle == transfer.total {
            self.transfer = None;
        }
        Some(action)
    }

    /// Stores the byte returned by a [`DmaCycle::Read`].
    pub fn latch(&mut self, data: u8) {
        if let Some(transfer) = self.transfer.as_mut() {
            transfer.data = data;
        }
    }
}
