//! Scripted console-side port for tests and the trace harness.

use std::collections::VecDeque;

use crate::{BusCycle, CartridgePort};

/// What the engine did to the data lines on one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveRecord {
    /// Data lines driven with this byte.
    Driven(u8),
    /// Data lines released (or left released).
    Released,
}

/// A scripted port: plays queued cycles to the engine and records
/// exactly what the engine drove back, paired with the cycle that was
/// on the bus at the time.
pub struct SimPort {
    script: VecDeque<BusCycle>,
    /// Byte the console drives on write cycles, seen by `read_data`.
    console_data: u8,
    last_sample: BusCycle,
    driving: Option<u8>,
    records: Vec<(BusCycle, DriveRecord)>,
}

impl SimPort {
    #[must_use]
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            console_data: 0,
            last_sample: BusCycle::read(0),
            driving: None,
            records: Vec::new(),
        }
    }

    /// Queue one cycle for the engine to sample.
    pub fn push(&mut self, cycle: BusCycle) {
        self.script.push_back(cycle);
    }

    /// Queue a read cycle at `address`.
    pub fn push_read(&mut self, address: u16) {
        self.push(BusCycle::read(address));
    }

    /// Queue a write cycle at `address`.
    pub fn push_write(&mut self, address: u16) {
        self.push(BusCycle::write(address));
    }

    /// Number of scripted cycles not yet sampled.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    /// Set the byte the console holds on the data lines (write cycles).
    pub fn set_console_data(&mut self, value: u8) {
        self.console_data = value;
    }

    /// Everything the engine drove (or released), in cycle order.
    #[must_use]
    pub fn records(&self) -> &[(BusCycle, DriveRecord)] {
        &self.records
    }

    /// Bytes driven onto the bus, in order.
    #[must_use]
    pub fn driven_bytes(&self) -> Vec<u8> {
        self.records
            .iter()
            .filter_map(|(_, r)| match r {
                DriveRecord::Driven(b) => Some(*b),
                DriveRecord::Released => None,
            })
            .collect()
    }

    /// Byte currently asserted on the data lines, if any.
    #[must_use]
    pub fn driven(&self) -> Option<u8> {
        self.driving
    }
}

impl Default for SimPort {
    fn default() -> Self {
        Self::new()
    }
}

impl CartridgePort for SimPort {
    fn sample(&mut self) -> BusCycle {
        // An exhausted script holds the bus at its last state, the way
        // real lines hold their level between transitions.
        if let Some(cycle) = self.script.pop_front() {
            self.last_sample = cycle;
        }
        self.last_sample
    }

    fn drive(&mut self, value: u8) {
        self.driving = Some(value);
        self.records.push((self.last_sample, DriveRecord::Driven(value)));
    }

    fn release(&mut self) {
        self.driving = None;
        self.records.push((self.last_sample, DriveRecord::Released));
    }

    fn read_data(&mut self) -> u8 {
        self.console_data
    }

    fn is_driving(&self) -> bool {
        self.driving.is_some()
    }
}
