//! Serial-backed `log` implementation.

use core::fmt;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use virta_hal::{TopHalfScheduler, UartHardware};

use crate::serial::SerialPort;

/// Destination for formatted log records.
pub trait LogSink {
    /// Writes one record, followed by the end-of-line pair.
    fn write_record(&self, args: fmt::Arguments<'_>);
}

impl<U: UartHardware, S: TopHalfScheduler, const N: usize> LogSink for SerialPort<U, S, N> {
    fn write_record(&self, args: fmt::Arguments<'_>) {
        use fmt::Write;

        let mut writer = self.writer();
        let _ = writer.write_fmt(args);
        self.send_byte(b'\n');
        self.send_byte(b'\r');
    }
}

/// Routes `log` records through a serial port's transmit path.
///
/// Writing blocks on the transmitter: keep the level conservative on slow
/// links, and never log from interrupt context.
pub struct SerialLogger<S: LogSink + Sync + 'static> {
    sink: &'static S,
    max_level: LevelFilter,
}

impl<S: LogSink + Sync> SerialLogger<S> {
    /// Creates a logger writing to `sink`, dropping records above
    /// `max_level`.
    pub const fn new(sink: &'static S, max_level: LevelFilter) -> Self {
        Self { sink, max_level }
    }
}

impl<S: LogSink + Sync> Log for SerialLogger<S> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.sink.write_record(format_args!(
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            ));
        }
    }

    fn flush(&self) {}
}

/// Installs `logger` as the global `log` backend.
pub fn init<S: LogSink + Sync>(logger: &'static SerialLogger<S>) -> Result<(), SetLoggerError> {
    log::set_logger(logger)?;
    log::set_max_level(logger.max_level);
    Ok(())
}
