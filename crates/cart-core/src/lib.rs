//! Core traits and types for real-time cartridge-bus emulation.
//!
//! The engine never touches pins directly: it talks to a
//! [`CartridgePort`], which hides whether the other side is a real
//! GPIO block or a scripted simulation. Everything the port does is
//! batched — one read for all input lines, one write for all data
//! lines — because the console's per-cycle deadline leaves no room
//! for per-line I/O.

mod cycle;
mod gpio;
mod port;
mod sim;

pub use cycle::BusCycle;
pub use gpio::{GpioPins, GpioPort, LineGroup, PinLayout};
pub use port::CartridgePort;
pub use sim::{DriveRecord, SimPort};
