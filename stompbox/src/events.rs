//! Lock-free single-producer single-consumer queue for [`ControlEvent`]s.
//!
//! Each control interrupt owns the producer side of one queue; the idle
//! loop owns the consumer side and drains it for logging or display.
//!
//! # Safety Contract
//!
//! - Only ONE context may call [`push()`](EventQueue::push) (the button ISR
//!   or the encoder ISR, never both).
//! - Only ONE context may call [`pop()`](EventQueue::pop) (the idle loop).
//!
//! Indices are plain atomic loads and stores with acquire/release ordering.
//! No read-modify-write instruction is needed.

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use crate::control::ControlEvent;

/// Fixed-capacity queue of control events.
///
/// The usable capacity is `N - 1`: one slot stays empty so a full queue can
/// be told apart from an empty one. A push into a full queue drops the event
/// and bumps [`dropped()`](EventQueue::dropped); the producer never waits.
pub struct EventQueue<const N: usize> {
    slots: [UnsafeCell<MaybeUninit<ControlEvent>>; N],
    /// Next slot to fill (producer only).
    head: AtomicUsize,
    /// Next slot to drain (consumer only).
    tail: AtomicUsize,
    /// Events lost to a full queue (producer only).
    dropped: AtomicU32,
}

// SAFETY: ControlEvent is Copy and Send. Each index is written by exactly one
// side, and the release store of `head` publishes the slot before the
// consumer's acquire load can observe it.
unsafe impl<const N: usize> Sync for EventQueue<N> {}

impl<const N: usize> EventQueue<N> {
    /// Create an empty queue.
    ///
    /// # Panics
    ///
    /// Compile-time assertion: `N` must be at least 2.
    pub const fn new() -> Self {
        assert!(N >= 2, "event queue needs at least 2 slots (1 usable)");
        EventQueue {
            slots: [const { UnsafeCell::new(MaybeUninit::uninit()) }; N],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Usable capacity.
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Enqueue an event (producer side).
    ///
    /// Returns `Err(event)` when the queue is full; the event is counted as
    /// dropped.
    pub fn push(&self, event: ControlEvent) -> Result<(), ControlEvent> {
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) % N;
        if next == self.tail.load(Ordering::Acquire) {
            let dropped = self.dropped.load(Ordering::Relaxed);
            self.dropped.store(dropped.saturating_add(1), Ordering::Relaxed);
            return Err(event);
        }

        // SAFETY: sole producer, and `next != tail` means the consumer is not
        // reading this slot.
        unsafe {
            (*self.slots[head].get()).write(event);
        }
        self.head.store(next, Ordering::Release);
        Ok(())
    }

    /// Dequeue the oldest event (consumer side).
    pub fn pop(&self) -> Option<ControlEvent> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: sole consumer, and `tail != head` means the producer has
        // published this slot.
        let event = unsafe { (*self.slots[tail].get()).assume_init_read() };
        self.tail.store((tail + 1) % N, Ordering::Release);
        Some(event)
    }

    /// Pop every queued event into `f`, oldest first. Returns how many were drained.
    pub fn drain(&self, mut f: impl FnMut(ControlEvent)) -> usize {
        let mut count = 0;
        while let Some(event) = self.pop() {
            f(event);
            count += 1;
        }
        count
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.tail.load(Ordering::Acquire) == self.head.load(Ordering::Acquire)
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head + N - tail) % N
    }

    /// Events dropped because the queue was full.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::EffectKind;

    fn toggled(enabled: bool) -> ControlEvent {
        ControlEvent::EffectToggled { effect: EffectKind::Delay, enabled }
    }

    #[test]
    fn fifo_order() {
        let q: EventQueue<4> = EventQueue::new();
        assert!(q.is_empty());
        q.push(toggled(true)).unwrap();
        q.push(toggled(false)).unwrap();
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some(toggled(true)));
        assert_eq!(q.pop(), Some(toggled(false)));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn full_queue_drops_and_counts() {
        let q: EventQueue<3> = EventQueue::new();
        assert_eq!(q.capacity(), 2);
        q.push(toggled(true)).unwrap();
        q.push(toggled(true)).unwrap();
        assert_eq!(q.push(toggled(false)), Err(toggled(false)));
        assert_eq!(q.push(toggled(false)), Err(toggled(false)));
        assert_eq!(q.dropped(), 2);
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn drain_wraps_indices() {
        let q: EventQueue<3> = EventQueue::new();
        for round in 0..10 {
            let enabled = round % 2 == 0;
            q.push(toggled(enabled)).unwrap();
            q.push(toggled(!enabled)).unwrap();
            let mut seen = [None; 2];
            let n = q.drain(|e| {
                let slot = if seen[0].is_none() { 0 } else { 1 };
                seen[slot] = Some(e);
            });
            assert_eq!(n, 2);
            assert_eq!(seen, [Some(toggled(enabled)), Some(toggled(!enabled))]);
            assert!(q.is_empty());
        }
    }
}
