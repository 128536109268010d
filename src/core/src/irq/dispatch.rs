//! Dispatch registry for external interrupt lines.

use core::sync::atomic::{AtomicU32, Ordering};

use spin::Mutex;
use virta_common::TriggerMode;
use virta_hal::ExtIrqHardware;

/// A user handler for an external interrupt line.
///
/// Runs in interrupt context: it must not block and should return quickly.
pub type Handler = fn();

/// Routes external interrupt lines to user-installed handlers.
///
/// One instance owns the handler table and the mask/mode hardware for
/// `LINES` physical lines. Mainline code installs and removes handlers;
/// the interrupt glue calls [`fire`](IrqDispatch::fire) when a line
/// signals.
///
/// Line indices at or above `LINES` are ignored without error; the
/// [`ignored_requests`](IrqDispatch::ignored_requests) counter records how
/// often that happened.
pub struct IrqDispatch<H, const LINES: usize> {
    handlers: Mutex<[Option<Handler>; LINES]>,
    hw: H,
    ignored: AtomicU32,
}

impl<H: ExtIrqHardware, const LINES: usize> IrqDispatch<H, LINES> {
    /// Creates a registry with every handler slot empty and every line
    /// masked (as far as this registry is concerned; the hardware is not
    /// touched here).
    pub const fn new(hw: H) -> Self {
        Self {
            handlers: Mutex::new([None; LINES]),
            hw,
            ignored: AtomicU32::new(0),
        }
    }

    /// Installs `handler` on `line` and unmasks the line with `mode`.
    ///
    /// Out-of-range lines are ignored. The handler is stored before the
    /// line is unmasked, so a firing that arrives right after the unmask
    /// already finds it.
    pub fn attach(&self, line: u8, handler: Handler, mode: TriggerMode) {
        if usize::from(line) >= LINES {
            self.ignored.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.handlers.lock()[usize::from(line)] = Some(handler);
        self.hw.enable_line(line, mode);
        log::trace!("ext irq {line}: handler attached");
    }

    /// Masks `line` and removes its handler.
    ///
    /// Out-of-range lines are ignored, and detaching a line that has no
    /// handler is a no-op. The line is masked before the slot is cleared,
    /// so a firing cannot slip in between and find an emptied slot while
    /// the line is still live.
    pub fn detach(&self, line: u8) {
        if usize::from(line) >= LINES {
            self.ignored.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.hw.disable_line(line);
        self.handlers.lock()[usize::from(line)] = None;
        log::trace!("ext irq {line}: handler detached");
    }

    /// Invokes the handler installed on `line`, if any.
    ///
    /// Called from the interrupt glue when the line signals. An empty slot
    /// is a silent no-op. A firing that races a concurrent table update is
    /// dropped: a handler is only ever called through a fully written
    /// slot.
    pub fn fire(&self, line: u8) {
        if usize::from(line) >= LINES {
            return;
        }
        let handler = match self.handlers.try_lock() {
            Some(table) => table[usize::from(line)],
            None => return,
        };
        if let Some(handler) = handler {
            handler();
        }
    }

    /// How many attach/detach requests named a line that does not exist.
    pub fn ignored_requests(&self) -> u32 {
        self.ignored.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::SimExtIrq;
    use core::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_attach_and_fire() {
        static FIRED: AtomicU32 = AtomicU32::new(0);
        fn count_firing() {
            FIRED.fetch_add(1, Ordering::Relaxed);
        }

        let hw = SimExtIrq::new();
        let dispatch = IrqDispatch::<_, 8>::new(&hw);

        dispatch.attach(2, count_firing, TriggerMode::FallingEdge);
        assert_eq!(hw.line_mode(2), Some(TriggerMode::FallingEdge));

        dispatch.fire(2);
        dispatch.fire(2);
        assert_eq!(FIRED.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_empty_slot_is_silent() {
        let hw = SimExtIrq::new();
        let dispatch = IrqDispatch::<_, 8>::new(&hw);

        // No handler installed anywhere; must simply do nothing.
        dispatch.fire(0);
        dispatch.fire(7);
    }

    #[test]
    fn test_out_of_range_requests_are_ignored() {
        fn never() {
            panic!("handler on an out-of-range line must never run");
        }

        let hw = SimExtIrq::new();
        let dispatch = IrqDispatch::<_, 8>::new(&hw);

        dispatch.attach(8, never, TriggerMode::LevelLow);
        dispatch.attach(200, never, TriggerMode::LevelLow);
        for line in 0..8 {
            assert_eq!(hw.line_mode(line), None);
        }
        assert_eq!(dispatch.ignored_requests(), 2);

        dispatch.detach(8);
        assert_eq!(dispatch.ignored_requests(), 3);

        dispatch.fire(8);
        dispatch.fire(255);
    }

    #[test]
    fn test_detach_masks_line_and_clears_handler() {
        static FIRED: AtomicU32 = AtomicU32::new(0);
        fn count_firing() {
            FIRED.fetch_add(1, Ordering::Relaxed);
        }

        let hw = SimExtIrq::new();
        let dispatch = IrqDispatch::<_, 8>::new(&hw);

        dispatch.attach(4, count_firing, TriggerMode::RisingEdge);
        dispatch.detach(4);

        assert_eq!(hw.line_mode(4), None);
        dispatch.fire(4);
        assert_eq!(FIRED.load(Ordering::Relaxed), 0);

        // Detaching an already-empty line is a safe no-op.
        dispatch.detach(4);
        dispatch.detach(5);
    }

    #[test]
    fn test_reattach_replaces_handler() {
        static FIRST: AtomicU32 = AtomicU32::new(0);
        static SECOND: AtomicU32 = AtomicU32::new(0);
        fn first() {
            FIRST.fetch_add(1, Ordering::Relaxed);
        }
        fn second() {
            SECOND.fetch_add(1, Ordering::Relaxed);
        }

        let hw = SimExtIrq::new();
        let dispatch = IrqDispatch::<_, 8>::new(&hw);

        dispatch.attach(1, first, TriggerMode::AnyEdge);
        dispatch.attach(1, second, TriggerMode::RisingEdge);
        assert_eq!(hw.line_mode(1), Some(TriggerMode::RisingEdge));

        dispatch.fire(1);
        assert_eq!(FIRST.load(Ordering::Relaxed), 0);
        assert_eq!(SECOND.load(Ordering::Relaxed), 1);
    }
}
