//! Batched GPIO access behind contiguous line groups.
//!
//! The per-cycle timing budget rules out per-line I/O. Each logical
//! group (address, data, control) occupies one contiguous block of
//! pins, so sampling or driving a whole group is a single masked
//! operation on the raw 32-bit port word.

use crate::{BusCycle, CartridgePort};

/// A contiguous block of pins within the raw 32-bit port word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineGroup {
    /// Lowest pin number of the block.
    pub base: u8,
    /// Number of pins in the block.
    pub width: u8,
}

impl LineGroup {
    #[must_use]
    pub const fn new(base: u8, width: u8) -> Self {
        Self { base, width }
    }

    /// Bit mask covering the group in the raw port word.
    #[must_use]
    pub const fn mask(self) -> u32 {
        (((1u64 << self.width) - 1) as u32) << self.base
    }

    /// Extract the group's value from a raw port word.
    #[must_use]
    pub const fn extract(self, raw: u32) -> u32 {
        (raw & self.mask()) >> self.base
    }

    /// Place a value into the group's bit positions.
    #[must_use]
    pub const fn place(self, value: u32) -> u32 {
        (value << self.base) & self.mask()
    }
}

/// Pin assignment for the cartridge connector.
///
/// Each group must be contiguous so the port can sample or drive it
/// as one operation — a hard performance requirement, not a style
/// choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinLayout {
    /// Address inputs A0-A15.
    pub address: LineGroup,
    /// Data lines D0-D7.
    pub data: LineGroup,
    /// Read/write input. High = console read, low = console write.
    pub rw: LineGroup,
    /// Halt input. Active low: low = console holds the cartridge off.
    pub halt: LineGroup,
}

impl Default for PinLayout {
    fn default() -> Self {
        Self {
            address: LineGroup::new(0, 16),
            data: LineGroup::new(16, 8),
            rw: LineGroup::new(24, 1),
            halt: LineGroup::new(25, 1),
        }
    }
}

/// Raw batched pin operations a target must provide.
///
/// Modeled on an RP2040-class SIO block: whole-port reads, masked
/// writes, masked direction changes.
pub trait GpioPins {
    /// Read every pin in one operation.
    fn read_all(&mut self) -> u32;

    /// Set the pins selected by `mask` to the corresponding bits of `bits`.
    fn write_masked(&mut self, mask: u32, bits: u32);

    /// Switch the pins in `mask` to outputs.
    fn set_output(&mut self, mask: u32);

    /// Switch the pins in `mask` to inputs.
    fn set_input(&mut self, mask: u32);
}

/// [`CartridgePort`] over a raw GPIO block and a pin layout.
pub struct GpioPort<G> {
    pins: G,
    layout: PinLayout,
    driving: bool,
}

impl<G: GpioPins> GpioPort<G> {
    /// Wrap a GPIO block. The data lines start released.
    pub fn new(mut pins: G, layout: PinLayout) -> Self {
        pins.set_input(layout.data.mask());
        Self {
            pins,
            layout,
            driving: false,
        }
    }

    /// The pin layout in use.
    #[must_use]
    pub fn layout(&self) -> PinLayout {
        self.layout
    }
}

impl<G: GpioPins> CartridgePort for GpioPort<G> {
    fn sample(&mut self) -> BusCycle {
        let raw = self.pins.read_all();
        BusCycle {
            address: self.layout.address.extract(raw) as u16,
            // RW is high for reads
            is_write: self.layout.rw.extract(raw) == 0,
            // HALT is active low
            halted: self.layout.halt.extract(raw) == 0,
        }
    }

    fn drive(&mut self, value: u8) {
        let data = self.layout.data;
        // Latch the value first: the lines must never assert a stale
        // byte, even between these two operations.
        self.pins.write_masked(data.mask(), data.place(u32::from(value)));
        if !self.driving {
            self.pins.set_output(data.mask());
            self.driving = true;
        }
    }

    fn release(&mut self) {
        if self.driving {
            self.pins.set_input(self.layout.data.mask());
            self.driving = false;
        }
    }

    fn read_data(&mut self) -> u8 {
        let raw = self.pins.read_all();
        self.layout.data.extract(raw) as u8
    }

    fn is_driving(&self) -> bool {
        self.driving
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_group_masks() {
        let addr = LineGroup::new(0, 16);
        assert_eq!(addr.mask(), 0x0000_FFFF);
        let data = LineGroup::new(16, 8);
        assert_eq!(data.mask(), 0x00FF_0000);
        assert_eq!(data.place(0xAB), 0x00AB_0000);
        assert_eq!(data.extract(0x00AB_0000), 0xAB);
    }

    #[test]
    fn line_group_single_pin() {
        let rw = LineGroup::new(24, 1);
        assert_eq!(rw.mask(), 0x0100_0000);
        assert_eq!(rw.extract(0x0100_0000), 1);
        assert_eq!(rw.extract(0), 0);
    }

    /// Fake GPIO block that records the order of operations.
    struct FakePins {
        levels: u32,
        output_mask: u32,
        ops: Vec<String>,
    }

    impl FakePins {
        fn new(levels: u32) -> Self {
            Self {
                levels,
                output_mask: 0,
                ops: Vec::new(),
            }
        }
    }

    impl GpioPins for FakePins {
        fn read_all(&mut self) -> u32 {
            self.levels
        }
        fn write_masked(&mut self, mask: u32, bits: u32) {
            self.levels = (self.levels & !mask) | (bits & mask);
            self.ops.push(format!("write {mask:#x}"));
        }
        fn set_output(&mut self, mask: u32) {
            self.output_mask |= mask;
            self.ops.push(format!("out {mask:#x}"));
        }
        fn set_input(&mut self, mask: u32) {
            self.output_mask &= !mask;
            self.ops.push(format!("in {mask:#x}"));
        }
    }

    #[test]
    fn sample_unpacks_all_groups_from_one_read() {
        let layout = PinLayout::default();
        // Address 0x1FF8, RW high (read), HALT high (released)
        let raw = 0x1FF8 | (1 << 24) | (1 << 25);
        let mut port = GpioPort::new(FakePins::new(raw), layout);
        let cycle = port.sample();
        assert_eq!(cycle.address, 0x1FF8);
        assert!(!cycle.is_write);
        assert!(!cycle.halted);
    }

    #[test]
    fn sample_decodes_write_and_halt_polarity() {
        let layout = PinLayout::default();
        // RW low = write, HALT low = halted
        let mut port = GpioPort::new(FakePins::new(0x1234), layout);
        let cycle = port.sample();
        assert!(cycle.is_write);
        assert!(cycle.halted);
    }

    #[test]
    fn drive_latches_value_before_acquiring_direction() {
        let layout = PinLayout::default();
        let mut port = GpioPort::new(FakePins::new(0), layout);
        port.drive(0xA5);
        assert!(port.is_driving());
        // set_input from new(), then write, then out — value first
        assert_eq!(
            port.pins.ops,
            vec!["in 0xff0000", "write 0xff0000", "out 0xff0000"]
        );
        assert_eq!(port.pins.levels & 0x00FF_0000, 0x00A5_0000);
    }

    #[test]
    fn drive_twice_acquires_direction_once() {
        let layout = PinLayout::default();
        let mut port = GpioPort::new(FakePins::new(0), layout);
        port.drive(0x01);
        port.drive(0x02);
        let acquires = port.pins.ops.iter().filter(|op| op.starts_with("out")).count();
        assert_eq!(acquires, 1);
    }

    #[test]
    fn release_is_idempotent() {
        let layout = PinLayout::default();
        let mut port = GpioPort::new(FakePins::new(0), layout);
        port.drive(0xFF);
        port.release();
        port.release();
        assert!(!port.is_driving());
        let releases = port.pins.ops.iter().filter(|op| op.starts_with("in")).count();
        // One from new(), one from the first release
        assert_eq!(releases, 2);
    }

    #[test]
    fn read_data_extracts_console_byte() {
        let layout = PinLayout::default();
        let mut port = GpioPort::new(FakePins::new(0x005A_0000), layout);
        assert_eq!(port.read_data(), 0x5A);
    }
}
