//! Shared types for the Virta I/O core.
//!
//! Definitions used on both sides of the hardware boundary: the trait
//! crate (`virta-hal`) names them in its signatures and the runtime core
//! (`virta-core`) carries them around.

#![no_std]

pub mod error;
pub mod irq;
pub mod serial;

pub use error::ConfigError;
pub use irq::{TriggerMode, EXTERNAL_LINES};
pub use serial::{
    baud_divisor, DataBits, FrameFormat, Parity, PortConfig, PortFlags, PortId, StopBits,
};
