//! Power-sequencing gate.
//!
//! The console holds the HALT line asserted while it brings itself
//! up; the cartridge must stay off the bus until the line releases,
//! then serve from the very first real cycle with no warm-up. The
//! gate is one-shot: once armed it never goes quiet again, even if
//! the line re-asserts.

/// Gate state. `Armed` is the single cycle on which the halt line was
/// first observed released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltState {
    /// Halt asserted; no bus line is refreshed.
    Idle,
    /// Halt just released; serving starts this cycle.
    Armed,
    /// Serving; the halt line is ignored from here on.
    Running,
}

pub struct HaltGate {
    state: HaltState,
}

impl HaltGate {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: HaltState::Idle,
        }
    }

    /// Feed this cycle's halt line. Returns whether the engine may
    /// touch the bus this iteration. Applies only at iteration
    /// boundaries — never mid-cycle.
    pub fn admit(&mut self, halted: bool) -> bool {
        match self.state {
            HaltState::Idle => {
                if halted {
                    false
                } else {
                    self.state = HaltState::Armed;
                    true
                }
            }
            HaltState::Armed => {
                self.state = HaltState::Running;
                true
            }
            HaltState::Running => true,
        }
    }

    #[must_use]
    pub fn state(&self) -> HaltState {
        self.state
    }
}

impl Default for HaltGate {
    fn default() -> Self {
        Self::new()
    }
}
