//! Simulated hardware for exercising the I/O core without a target.
//!
//! These types stand in for the register layer, the deferred-processing
//! scheduler and the global interrupt mask in unit and integration tests.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use heapless::{Deque, Vec};
use spin::Mutex;
use virta_common::{baud_divisor, PortConfig, PortId, TriggerMode, EXTERNAL_LINES};
use virta_hal::{ExtIrqHardware, InterruptControl, TopHalfScheduler, UartHardware};

/// Clock the simulated UART derives its baud divisor from.
pub const SIM_CLOCK_HZ: u32 = 16_000_000;

/// Records the mask/mode state of the external interrupt lines.
pub struct SimExtIrq {
    modes: Mutex<[Option<TriggerMode>; EXTERNAL_LINES]>,
}

impl SimExtIrq {
    /// All lines masked.
    pub const fn new() -> Self {
        Self {
            modes: Mutex::new([None; EXTERNAL_LINES]),
        }
    }

    /// The mode a line was enabled with, or `None` while it is masked.
    pub fn line_mode(&self, line: u8) -> Option<TriggerMode> {
        self.modes.lock().get(usize::from(line)).copied().flatten()
    }
}

impl Default for SimExtIrq {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtIrqHardware for SimExtIrq {
    fn enable_line(&self, line: u8, mode: TriggerMode) {
        if let Some(slot) = self.modes.lock().get_mut(usize::from(line)) {
            *slot = Some(mode);
        }
    }

    fn disable_line(&self, line: u8) {
        if let Some(slot) = self.modes.lock().get_mut(usize::from(line)) {
            *slot = None;
        }
    }
}

/// What [`SimUart::configure`] computed from the last [`PortConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedConfig {
    /// The configuration as given.
    pub config: PortConfig,
    /// Baud divisor for the simulated clock, if representable.
    pub divisor: Option<u16>,
}

/// In-memory UART: a feedable receive register and captured transmit
/// bytes.
pub struct SimUart {
    rx: Mutex<Deque<u8, 64>>,
    tx: Mutex<Vec<u8, 256>>,
    ready: AtomicBool,
    config: Mutex<Option<AppliedConfig>>,
}

impl SimUart {
    /// Idle UART: empty receive register, ready transmitter.
    pub const fn new() -> Self {
        Self {
            rx: Mutex::new(Deque::new()),
            tx: Mutex::new(Vec::new()),
            ready: AtomicBool::new(true),
            config: Mutex::new(None),
        }
    }

    /// Makes bytes appear in the receive register.
    pub fn feed(&self, bytes: &[u8]) {
        let mut rx = self.rx.lock();
        for &byte in bytes {
            let _ = rx.push_back(byte);
        }
    }

    /// Everything transmitted so far.
    pub fn transmitted(&self) -> Vec<u8, 256> {
        self.tx.lock().clone()
    }

    /// Stalls or frees the transmitter.
    pub fn set_tx_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }

    /// The configuration last applied, if any.
    pub fn applied(&self) -> Option<AppliedConfig> {
        *self.config.lock()
    }
}

impl Default for SimUart {
    fn default() -> Self {
        Self::new()
    }
}

impl UartHardware for SimUart {
    fn configure(&self, config: &PortConfig) {
        *self.config.lock() = Some(AppliedConfig {
            config: *config,
            divisor: baud_divisor(config.baud, SIM_CLOCK_HZ).ok(),
        });
    }

    fn read_byte(&self) -> Option<u8> {
        self.rx.lock().pop_front()
    }

    fn tx_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn write_byte(&self, byte: u8) {
        let _ = self.tx.lock().push(byte);
    }
}

/// Maximum port index the counting scheduler records.
const COUNTED_PORTS: usize = 8;

/// Counts deferred-processing requests per port.
pub struct CountingScheduler {
    counts: [AtomicU32; COUNTED_PORTS],
}

impl CountingScheduler {
    /// No requests recorded yet.
    pub const fn new() -> Self {
        const ZERO: AtomicU32 = AtomicU32::new(0);
        Self {
            counts: [ZERO; COUNTED_PORTS],
        }
    }

    /// Requests recorded for `port`.
    pub fn count(&self, port: PortId) -> u32 {
        self.counts
            .get(port.index())
            .map(|count| count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Requests recorded across all ports.
    pub fn total(&self) -> u32 {
        self.counts
            .iter()
            .map(|count| count.load(Ordering::Relaxed))
            .sum()
    }
}

impl Default for CountingScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TopHalfScheduler for CountingScheduler {
    fn request_top_half(&self, port: PortId) {
        if let Some(count) = self.counts.get(port.index()) {
            count.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Tracks the global interrupt mask.
pub struct SimIntCtrl {
    enabled: AtomicBool,
    masked_sections: AtomicU32,
}

impl SimIntCtrl {
    /// Interrupts start enabled.
    pub const fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            masked_sections: AtomicU32::new(0),
        }
    }

    /// How many times interrupts have been masked.
    pub fn masked_sections(&self) -> u32 {
        self.masked_sections.load(Ordering::Relaxed)
    }
}

impl Default for SimIntCtrl {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptControl for SimIntCtrl {
    fn enable(&self) {
        self.enabled.store(true, Ordering::Release);
    }

    fn disable(&self) {
        self.enabled.store(false, Ordering::Release);
        self.masked_sections.fetch_add(1, Ordering::Relaxed);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }
}
