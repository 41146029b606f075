//! The narrow seam between the engine and the physical bus.

use crate::BusCycle;

/// Cartridge-side view of the console bus.
///
/// Exactly one hardware instance exists in practice, but the engine
/// only ever talks to this trait, so the same loop runs against a
/// simulated port in tests. Direction changes on the data lines are
/// explicit: [`drive`](Self::drive) acquires output direction,
/// [`release`](Self::release) gives the lines back to the console.
pub trait CartridgePort {
    /// Sample every input line (address, RW, HALT) as one batched read.
    ///
    /// All lines must come from the same instant. Sampling them
    /// line-by-line would skew the address bits against each other
    /// and against the control lines.
    fn sample(&mut self) -> BusCycle;

    /// Drive all 8 data lines with `value` as one batched write,
    /// acquiring output direction first if the lines are released.
    ///
    /// The value must be latched before the lines switch to outputs,
    /// so a stale byte is never asserted even for a moment.
    fn drive(&mut self, value: u8);

    /// Release the data lines to a non-driving state.
    ///
    /// Idempotent, and cheap enough to call on every cycle that does
    /// not drive.
    fn release(&mut self);

    /// Sample the data lines while released.
    ///
    /// Only meaningful on a cycle where the console is driving them
    /// (a write cycle). Callers must `release` first.
    fn read_data(&mut self) -> u8;

    /// Whether the data lines are currently held in output direction.
    fn is_driving(&self) -> bool;
}
