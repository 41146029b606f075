//! The sample-decide-drive loop.
//!
//! One iteration per console bus cycle: sample every input line in a
//! single batched read, feed the cycle to the bank switcher, then
//! either drive the selected byte or release the data lines. The loop
//! allocates nothing and calls nothing that blocks — its only
//! temporal bound is the console's own cycle deadline.
//!
//! Driving outside the mapped window must be impossible by
//! construction: the only `drive` calls sit behind the A12 window
//! check, because once a wrong voltage is on the bus there is nothing
//! left to detect or recover.

use cart_core::{BusCycle, CartridgePort};
use format_a26::{A26Error, RomImage};

use crate::bank::BankSwitcher;
use crate::halt::{HaltGate, HaltState};

/// A12: the cartridge's mapped address window.
const WINDOW_BIT: u16 = 0x1000;

/// SuperChip RAM size.
const SC_RAM_SIZE: usize = 128;

/// What one loop iteration did, for observers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Halt gate closed; no bus line was touched.
    Gated,
    /// Served a ROM byte.
    Rom(u8),
    /// Served a SuperChip RAM byte.
    Ram(u8),
    /// Latched a console-driven byte into SuperChip RAM.
    RamWrite(u8),
    /// Write cycle or address outside the window; lines released.
    Released,
}

/// The emulated cartridge: image, bank latch, halt gate, and the port
/// they meet the console through.
pub struct Cartridge<P> {
    port: P,
    image: RomImage,
    switcher: BankSwitcher,
    gate: HaltGate,
    sc_ram: [u8; SC_RAM_SIZE],
}

impl<P: CartridgePort> Cartridge<P> {
    #[must_use]
    pub fn new(image: RomImage, port: P) -> Self {
        let switcher = BankSwitcher::new(image.scheme());
        Self {
            port,
            image,
            switcher,
            gate: HaltGate::new(),
            sc_ram: [0; SC_RAM_SIZE],
        }
    }

    /// Run one bus cycle: sample, decide, drive or release.
    ///
    /// An `OutOfRange` fault halts emulation rather than serving
    /// garbage — wrong data on this bus looks like a working
    /// cartridge until the game visibly misbehaves.
    pub fn run_cycle(&mut self) -> Result<CycleOutcome, A26Error> {
        let cycle = self.port.sample();
        if !self.gate.admit(cycle.halted) {
            // Idle: refresh nothing, but bank state and image stay
            // ready so the first real cycle is served correctly.
            return Ok(CycleOutcome::Gated);
        }
        self.serve(cycle)
    }

    /// Run the polling loop until a fault.
    ///
    /// On real hardware this never returns.
    pub fn run(&mut self) -> Result<(), A26Error> {
        loop {
            self.run_cycle()?;
        }
    }

    fn serve(&mut self, cycle: BusCycle) -> Result<CycleOutcome, A26Error> {
        // The switcher sees every cycle, in arrival order, before any
        // data is computed for it. The FE trigger lives outside the
        // window, so this cannot move behind the window check.
        self.switcher.observe(&cycle);

        if cycle.address & WINDOW_BIT == 0 {
            self.port.release();
            return Ok(CycleOutcome::Released);
        }

        if self.image.superchip() {
            let masked = cycle.address & 0x1FFF;
            if (0x1080..=0x10FF).contains(&masked) {
                let value = self.sc_ram[usize::from(masked & 0x7F)];
                self.port.drive(value);
                return Ok(CycleOutcome::Ram(value));
            }
            if (0x1000..=0x107F).contains(&masked) {
                // RAM write window: the console drives the data lines,
                // so ours must be released before latching.
                self.port.release();
                let value = self.port.read_data();
                self.sc_ram[usize::from(masked & 0x7F)] = value;
                return Ok(CycleOutcome::RamWrite(value));
            }
        }

        if cycle.is_write {
            self.port.release();
            return Ok(CycleOutcome::Released);
        }

        let offset = usize::from(cycle.address & self.image.offset_mask());
        let value = self.image.byte_at(self.switcher.current(), offset)?;
        self.port.drive(value);
        Ok(CycleOutcome::Rom(value))
    }

    /// Currently selected bank.
    #[must_use]
    pub fn bank(&self) -> usize {
        self.switcher.current()
    }

    /// Halt gate state.
    #[must_use]
    pub fn halt_state(&self) -> HaltState {
        self.gate.state()
    }

    /// The loaded image.
    #[must_use]
    pub fn image(&self) -> &RomImage {
        &self.image
    }

    /// Reference to the port.
    #[must_use]
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Mutable reference to the port.
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }
}
