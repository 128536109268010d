//! Per-port serial engine.

use core::fmt;

use virta_common::{ConfigError, PortConfig, PortId};
use virta_hal::{InterruptControl, TopHalfScheduler, UartHardware};

use super::ring::{Push, RxRing};

/// One physical serial port: interrupt-fed receive ring, mainline read
/// operations, and the blocking transmit path.
///
/// [`ingest`](SerialPort::ingest) and
/// [`service_rx_interrupt`](SerialPort::service_rx_interrupt) belong to
/// the port's receive interrupt handler; every other operation belongs to
/// mainline code. The transmit path busy-waits on the hardware and must
/// not be called from interrupt context.
pub struct SerialPort<U, S, const N: usize> {
    id: PortId,
    hw: U,
    scheduler: S,
    config: PortConfig,
    rx: RxRing<N>,
}

impl<U: UartHardware, S: TopHalfScheduler, const N: usize> SerialPort<U, S, N> {
    /// Creates the port object. Nothing touches the hardware until
    /// [`init`](SerialPort::init).
    pub const fn new(id: PortId, hw: U, scheduler: S, config: PortConfig) -> Self {
        Self {
            id,
            hw,
            scheduler,
            rx: RxRing::new(config.terminator, config.high_water),
            config,
        }
    }

    /// Identity of this port.
    pub const fn id(&self) -> PortId {
        self.id
    }

    /// Applies the port configuration and empties the receive ring.
    ///
    /// Runs with interrupts globally masked: initialization touches the
    /// same cursors as the receive interrupt handler, so the handler must
    /// not run concurrently.
    pub fn init(&self, ctrl: &impl InterruptControl) -> Result<(), ConfigError> {
        self.config.validate()?;
        ctrl.without_interrupts(|| {
            self.hw.configure(&self.config);
            self.rx.reset();
        });
        log::debug!(
            "serial port {}: {} baud, {}-byte receive ring",
            self.id.index(),
            self.config.baud,
            self.rx.capacity(),
        );
        Ok(())
    }

    /// Hands one received byte to the ring. Interrupt side.
    ///
    /// Requests deferred processing when the byte completes a line, when
    /// the buffered count crosses the high-water mark, and when the ring
    /// is full and the byte had to be dropped. The scheduler coalesces
    /// repeated requests for the same port.
    pub fn ingest(&self, byte: u8) {
        match self.rx.push(byte) {
            Push::Stored {
                line_complete,
                above_high_water,
            } => {
                if line_complete {
                    self.scheduler.request_top_half(self.id);
                }
                if above_high_water {
                    self.scheduler.request_top_half(self.id);
                }
            }
            Push::Dropped => {
                // Nothing was stored; the consumer has to catch up before
                // any more data can be accepted.
                self.scheduler.request_top_half(self.id);
            }
        }
    }

    /// Drains the hardware receive register into the ring. Interrupt side.
    ///
    /// The receive interrupt handler calls this once per firing; hardware
    /// with a receive FIFO may deliver several bytes.
    pub fn service_rx_interrupt(&self) {
        while let Some(byte) = self.hw.read_byte() {
            self.ingest(byte);
        }
    }

    /// Number of buffered, unread bytes.
    pub fn available(&self) -> usize {
        self.rx.len()
    }

    /// Number of complete lines waiting in the ring.
    pub fn lines(&self) -> usize {
        self.rx.lines()
    }

    /// The next byte without consuming it, or `None` if the ring is empty.
    pub fn look(&self) -> Option<u8> {
        self.rx.peek()
    }

    /// Consumes one byte, or `None` if the ring is empty.
    pub fn read(&self) -> Option<u8> {
        self.rx.pop()
    }

    /// Copies the next complete line into `dest`.
    ///
    /// See [`RxRing::read_line`] for the sentinel and truncation rules.
    pub fn read_line(&self, dest: &mut [u8]) -> Option<usize> {
        self.rx.read_line(dest)
    }

    /// Discards all buffered receive data.
    pub fn flush(&self) {
        self.rx.clear();
        log::trace!("serial port {}: receive ring flushed", self.id.index());
    }

    /// Transmits one byte, busy-waiting until the output holding register
    /// is free.
    ///
    /// There is no timeout: if the peer holds the line, the wait is
    /// unbounded. Never call this from interrupt context, where a stalled
    /// transmitter would hang the whole system with interrupts masked.
    pub fn send_byte(&self, byte: u8) {
        while !self.hw.tx_ready() {
            core::hint::spin_loop();
        }
        self.hw.write_byte(byte);
    }

    /// Transmits a byte sequence.
    pub fn send_bytes(&self, bytes: &[u8]) {
        for &byte in bytes {
            self.send_byte(byte);
        }
    }

    /// Transmits a byte sequence followed by the end-of-line pair,
    /// newline then carriage return.
    pub fn send_line(&self, bytes: &[u8]) {
        self.send_bytes(bytes);
        self.send_byte(b'\n');
        self.send_byte(b'\r');
    }

    /// A [`fmt::Write`] adapter over the transmit path.
    pub fn writer(&self) -> PortWriter<'_, U, S, N> {
        PortWriter { port: self }
    }
}

/// Writes formatted text through a port's transmit path.
pub struct PortWriter<'a, U, S, const N: usize> {
    port: &'a SerialPort<U, S, N>,
}

impl<U: UartHardware, S: TopHalfScheduler, const N: usize> fmt::Write
    for PortWriter<'_, U, S, N>
{
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.port.send_bytes(s.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{CountingScheduler, SimIntCtrl, SimUart};
    use virta_common::PortFlags;

    fn test_port<'a>(
        hw: &'a SimUart,
        scheduler: &'a CountingScheduler,
        config: PortConfig,
    ) -> SerialPort<&'a SimUart, &'a CountingScheduler, 8> {
        SerialPort::new(PortId::new(0), hw, scheduler, config)
    }

    #[test]
    fn test_init_configures_hardware_with_interrupts_masked() {
        let hw = SimUart::new();
        let scheduler = CountingScheduler::new();
        let ctrl = SimIntCtrl::new();
        let port = test_port(&hw, &scheduler, PortConfig::new(9600));

        port.init(&ctrl).expect("init should succeed");

        let applied = hw.applied().expect("config should reach the hardware");
        assert_eq!(applied.config.baud, 9600);
        assert_eq!(applied.divisor, Some(103));
        assert_eq!(ctrl.masked_sections(), 1);
        assert!(ctrl.is_enabled());
    }

    #[test]
    fn test_init_rejects_contradictory_flags() {
        let hw = SimUart::new();
        let scheduler = CountingScheduler::new();
        let ctrl = SimIntCtrl::new();
        let mut config = PortConfig::new(9600);
        config.flags = PortFlags::RX_INTERRUPT | PortFlags::TX_ENABLE;
        let port = test_port(&hw, &scheduler, config);

        assert_eq!(port.init(&ctrl), Err(ConfigError::InvalidFlags));
        assert!(hw.applied().is_none());
    }

    #[test]
    fn test_line_completion_requests_top_half() {
        let hw = SimUart::new();
        let scheduler = CountingScheduler::new();
        let port = test_port(&hw, &scheduler, PortConfig::new(9600));

        port.ingest(b'h');
        port.ingest(b'i');
        assert_eq!(scheduler.count(port.id()), 0);

        port.ingest(b'\n');
        assert_eq!(scheduler.count(port.id()), 1);
        assert_eq!(port.lines(), 1);
    }

    #[test]
    fn test_overflow_drop_requests_top_half() {
        let hw = SimUart::new();
        let scheduler = CountingScheduler::new();
        let port = test_port(&hw, &scheduler, PortConfig::new(9600));

        // Ring size 8 holds 7 bytes.
        for _ in 0..7 {
            port.ingest(b'x');
        }
        assert_eq!(port.available(), 7);
        assert_eq!(scheduler.count(port.id()), 0);

        port.ingest(b'y');
        assert_eq!(port.available(), 7);
        assert_eq!(scheduler.count(port.id()), 1);
        assert_eq!(port.look(), Some(b'x'));
    }

    #[test]
    fn test_high_water_requests_top_half() {
        let hw = SimUart::new();
        let scheduler = CountingScheduler::new();
        let mut config = PortConfig::new(9600);
        config.high_water = 4;
        let port = test_port(&hw, &scheduler, config);

        for _ in 0..4 {
            port.ingest(b'x');
        }
        assert_eq!(scheduler.count(port.id()), 0);

        port.ingest(b'x');
        assert_eq!(scheduler.count(port.id()), 1);
    }

    #[test]
    fn test_terminator_at_high_water_requests_twice() {
        let hw = SimUart::new();
        let scheduler = CountingScheduler::new();
        let mut config = PortConfig::new(9600);
        config.high_water = 2;
        let port = test_port(&hw, &scheduler, config);

        port.ingest(b'a');
        port.ingest(b'b');
        // Completes a line and crosses the mark in one byte: both causes
        // request attention.
        port.ingest(b'\n');
        assert_eq!(scheduler.count(port.id()), 2);
    }

    #[test]
    fn test_service_rx_interrupt_drains_hardware() {
        let hw = SimUart::new();
        let scheduler = CountingScheduler::new();
        let port = test_port(&hw, &scheduler, PortConfig::new(9600));

        hw.feed(b"ok\n");
        port.service_rx_interrupt();

        assert_eq!(port.available(), 3);
        assert_eq!(port.read(), Some(b'o'));
        assert_eq!(port.read(), Some(b'k'));
        assert_eq!(port.read(), Some(b'\n'));
        assert_eq!(port.read(), None);
    }

    #[test]
    fn test_send_line_emits_newline_then_carriage_return() {
        let hw = SimUart::new();
        let scheduler = CountingScheduler::new();
        let port = test_port(&hw, &scheduler, PortConfig::new(9600));

        port.send_line(b"ok");
        assert_eq!(hw.transmitted().as_slice(), b"ok\n\r");
    }

    #[test]
    fn test_writer_formats_through_transmit_path() {
        use core::fmt::Write;

        let hw = SimUart::new();
        let scheduler = CountingScheduler::new();
        let port = test_port(&hw, &scheduler, PortConfig::new(9600));

        let mut writer = port.writer();
        write!(writer, "rate={}", 9600).expect("formatting should succeed");
        assert_eq!(hw.transmitted().as_slice(), b"rate=9600");
    }

    #[test]
    fn test_flush_discards_buffered_data() {
        let hw = SimUart::new();
        let scheduler = CountingScheduler::new();
        let port = test_port(&hw, &scheduler, PortConfig::new(9600));

        port.ingest(b'a');
        port.ingest(b'\n');
        port.flush();

        assert_eq!(port.available(), 0);
        assert_eq!(port.lines(), 0);
        assert_eq!(port.look(), None);
    }
}
