//! Serial receive buffering and transmit path.
//!
//! Each physical port is a [`SerialPort`]: an interrupt-fed receive ring
//! ([`RxRing`]) plus the blocking transmit primitives, tied to the port's
//! hardware registers and to the deferred-processing scheduler.

mod port;
mod ring;

pub use port::{PortWriter, SerialPort};
pub use ring::{Push, RxRing};
