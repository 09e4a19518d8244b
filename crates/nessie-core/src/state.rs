//! Read-only snapshots of component state for debugger displays and traces.
//!
//! Snapshots are plain `Copy` values captured between clocks; holding one
//! never borrows the emulator.

pub mod cpu;
pub mod ppu;

pub use cpu::CpuSnapshot;
pub use ppu::PpuSnapshot;
