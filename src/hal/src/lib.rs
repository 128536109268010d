//! Virta Hardware Abstraction Layer (HAL) traits.
//!
//! This crate defines the traits through which the I/O core reaches
//! target-specific hardware: the external interrupt mask and sense-control
//! registers, the UART data and status registers, the deferred-processing
//! scheduler, and the global interrupt mask. Register-level implementations
//! live with each target; the core and its tests only see these interfaces.

#![no_std]

use virta_common::{PortConfig, PortId, TriggerMode};

/// Mask and sense-control registers of the external interrupt lines.
///
/// Each physical line has its own mode field in a shared control register;
/// implementations modify only the addressed line's bits and leave the
/// others untouched. Both operations are fast and idempotent.
pub trait ExtIrqHardware {
    /// Configures the line's triggering mode and unmasks it.
    fn enable_line(&self, line: u8, mode: TriggerMode);
    /// Masks the line.
    fn disable_line(&self, line: u8);
}

/// Data and status registers of one UART.
pub trait UartHardware {
    /// Applies baud rate, frame format and enable flags.
    fn configure(&self, config: &PortConfig);
    /// Takes a received byte from the data register, if one is pending.
    fn read_byte(&self) -> Option<u8>;
    /// Whether the output holding register can accept a byte.
    fn tx_ready(&self) -> bool;
    /// Writes one byte to the output holding register.
    ///
    /// Callers check [`tx_ready`](UartHardware::tx_ready) first; what
    /// happens on a write into a full holding register is up to the
    /// hardware.
    fn write_byte(&self, byte: u8);
}

/// Requests mainline attention for a port.
///
/// Must be safe to call from interrupt context: fire-and-forget, never
/// blocking. Repeated requests for a port that has not been serviced yet
/// coalesce into one.
pub trait TopHalfScheduler {
    /// Asks the mainline to drain the port's receive buffer.
    fn request_top_half(&self, port: PortId);
}

/// The global interrupt mask.
pub trait InterruptControl {
    /// Unmasks interrupts globally.
    fn enable(&self);
    /// Masks interrupts globally.
    fn disable(&self);
    /// Whether interrupts are currently unmasked.
    fn is_enabled(&self) -> bool;

    /// Runs `f` with interrupts masked, restoring the previous mask state
    /// afterwards.
    fn without_interrupts<R>(&self, f: impl FnOnce() -> R) -> R
    where
        Self: Sized,
    {
        let was_enabled = self.is_enabled();
        if was_enabled {
            self.disable();
        }
        let result = f();
        if was_enabled {
            self.enable();
        }
        result
    }
}

impl<T: ExtIrqHardware + ?Sized> ExtIrqHardware for &T {
    fn enable_line(&self, line: u8, mode: TriggerMode) {
        (**self).enable_line(line, mode);
    }

    fn disable_line(&self, line: u8) {
        (**self).disable_line(line);
    }
}

impl<T: UartHardware + ?Sized> UartHardware for &T {
    fn configure(&self, config: &PortConfig) {
        (**self).configure(config);
    }

    fn read_byte(&self) -> Option<u8> {
        (**self).read_byte()
    }

    fn tx_ready(&self) -> bool {
        (**self).tx_ready()
    }

    fn write_byte(&self, byte: u8) {
        (**self).write_byte(byte);
    }
}

impl<T: TopHalfScheduler + ?Sized> TopHalfScheduler for &T {
    fn request_top_half(&self, port: PortId) {
        (**self).request_top_half(port);
    }
}

impl<T: InterruptControl + ?Sized> InterruptControl for &T {
    fn enable(&self) {
        (**self).enable();
    }

    fn disable(&self) {
        (**self).disable();
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }
}
