//! Atari 2600 cartridge-bus engine.
//!
//! Replaces the ROM chip on the console's cartridge bus: every bus
//! cycle, sample the address and control lines, update the bank latch
//! if the cycle hits a hotspot, and drive the selected byte back —
//! all inside the console's per-cycle deadline. A halt gate keeps the
//! cartridge off the bus until the console finishes power sequencing.

mod bank;
mod engine;
mod halt;

pub use bank::BankSwitcher;
pub use engine::{Cartridge, CycleOutcome};
pub use halt::{HaltGate, HaltState};
