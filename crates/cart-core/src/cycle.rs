//! One console bus cycle as observed at the cartridge connector.

/// Everything the cartridge can see on the connector for one console
/// clock: the address lines, the read/write line, and the halt line.
///
/// Produced by one batched sample of the input lines and fully
/// consumed within the same loop iteration. Never persisted or shared
/// across iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusCycle {
    /// Address lines A0-A15.
    pub address: u16,
    /// Read/write line: true when the console is writing.
    pub is_write: bool,
    /// Halt line: true while the console holds the cartridge off the bus.
    pub halted: bool,
}

impl BusCycle {
    /// A read cycle at `address` with the halt line released.
    #[must_use]
    pub const fn read(address: u16) -> Self {
        Self {
            address,
            is_write: false,
            halted: false,
        }
    }

    /// A write cycle at `address` with the halt line released.
    #[must_use]
    pub const fn write(address: u16) -> Self {
        Self {
            address,
            is_write: true,
            halted: false,
        }
    }

    /// A cycle sampled while the console asserts the halt line.
    #[must_use]
    pub const fn halted(address: u16) -> Self {
        Self {
            address,
            is_write: false,
            halted: true,
        }
    }
}
