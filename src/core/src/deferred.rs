//! Deferred processing of received serial data.
//!
//! The receive interrupt handler does only the minimum (storing the byte)
//! and asks for the rest to happen in mainline context. [`TopHalfQueue`] is
//! that request channel: the interrupt side calls
//! [`request_top_half`](virta_hal::TopHalfScheduler::request_top_half),
//! and the mainline either polls [`take`](TopHalfQueue::take) or awaits
//! [`TopHalfStream`].

use core::pin::Pin;
use core::sync::atomic::{AtomicU32, Ordering};
use core::task::{Context, Poll};

use futures_util::stream::Stream;
use futures_util::task::AtomicWaker;
use heapless::mpmc::MpMcQueue;
use virta_common::PortId;
use virta_hal::TopHalfScheduler;

/// Most ports one queue can track; one pending bit each.
pub const MAX_PORTS: usize = 32;

/// Coalescing queue of ports waiting for mainline attention.
///
/// Safe to feed from interrupt context: requests are lock-free and never
/// block. A port already waiting is not enqueued again, so the queue holds
/// at most one entry per port and a burst of interrupts cannot grow it
/// without bound. Requests for ports at or above [`MAX_PORTS`] are
/// ignored.
pub struct TopHalfQueue {
    pending: AtomicU32,
    ready: MpMcQueue<PortId, MAX_PORTS>,
    waker: AtomicWaker,
}

impl TopHalfQueue {
    /// Creates an empty queue.
    pub const fn new() -> Self {
        Self {
            pending: AtomicU32::new(0),
            ready: MpMcQueue::new(),
            waker: AtomicWaker::new(),
        }
    }

    /// Next port needing service, or `None`.
    ///
    /// The port's pending bit is cleared before this returns, so a request
    /// arriving afterwards enqueues the port again. Callers drain the
    /// port's buffer only after `take` returns: a request coalesced away
    /// during the handoff refers to a byte that is already in the ring by
    /// then, so that drain sees it.
    pub fn take(&self) -> Option<PortId> {
        let port = self.ready.dequeue()?;
        self.pending.fetch_and(!bit(port), Ordering::AcqRel);
        Some(port)
    }

    /// An async stream of ports needing service.
    pub fn stream(&self) -> TopHalfStream<'_> {
        TopHalfStream { queue: self }
    }
}

impl Default for TopHalfQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TopHalfScheduler for TopHalfQueue {
    fn request_top_half(&self, port: PortId) {
        if port.index() >= MAX_PORTS {
            return;
        }
        if self.pending.fetch_or(bit(port), Ordering::AcqRel) & bit(port) != 0 {
            // Already waiting; coalesce.
            return;
        }
        // The pending bit guarantees at most one entry per port, and the
        // queue has one slot per possible port, so this cannot fail.
        let _ = self.ready.enqueue(port);
        self.waker.wake();
    }
}

fn bit(port: PortId) -> u32 {
    1 << port.index()
}

/// Stream of ports produced by a [`TopHalfQueue`].
pub struct TopHalfStream<'a> {
    queue: &'a TopHalfQueue,
}

impl Stream for TopHalfStream<'_> {
    type Item = PortId;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<PortId>> {
        // fast path
        if let Some(port) = self.queue.take() {
            return Poll::Ready(Some(port));
        }

        self.queue.waker.register(cx.waker());
        match self.queue.take() {
            Some(port) => {
                self.queue.waker.take();
                Poll::Ready(Some(port))
            }
            None => Poll::Pending,
        }
    }
}
