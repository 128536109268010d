//! Virta I/O core.
//!
//! The interrupt-driven I/O core of the Virta microcontroller runtime: it
//! routes external interrupt lines to user-installed handlers, and it
//! buffers bytes arriving on serial ports so mainline code can consume
//! them as single bytes or terminator-delimited lines without losing data
//! to interrupt timing.
//!
//! # Architecture
//!
//! - [`irq`]: dispatch registry for the external interrupt lines
//! - [`serial`]: per-port receive rings and the transmit path
//! - [`deferred`]: coalescing queue of ports waiting for mainline service
//! - [`logger`]: a `log` backend writing through a port's transmit path
//! - [`testutil`]: simulated hardware used by the test suite
//!
//! Hardware registers are reached through the traits in `virta-hal`; the
//! core itself is target-independent.
//!
//! # Safety
//!
//! This is a `#![no_std]` crate. All unsafe code is documented with safety
//! invariants explaining why the usage is correct.

#![no_std]
#![warn(missing_docs)]

pub mod deferred;
pub mod irq;
pub mod logger;
pub mod serial;
pub mod testutil;
