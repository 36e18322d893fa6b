//! Circular history of conditioned samples.
//!
//! One write per sampling tick; the delay and chorus read at arbitrary
//! lookbacks derived from the write cursor. There is no separate read
//! cursor, so a reader can never drift relative to the writer.

use crate::constants::HISTORY_CAPACITY;

/// Fixed-capacity ring of signed samples.
///
/// `N` is the number of slots; valid lookbacks are `1..=N-1`, where a
/// lookback of 1 is the most recent write.
pub struct HistoryBuffer<const N: usize = HISTORY_CAPACITY> {
    samples: [i32; N],
    /// Slot the next write lands in.
    cursor: usize,
    /// Total samples written since startup (saturating).
    written: u32,
}

impl<const N: usize> HistoryBuffer<N> {
    /// Create an empty, zeroed ring.
    ///
    /// # Panics
    ///
    /// Compile-time assertion: `N` must be at least 2.
    pub const fn new() -> Self {
        assert!(N >= 2, "history must have at least 2 slots");
        HistoryBuffer {
            samples: [0; N],
            cursor: 0,
            written: 0,
        }
    }

    /// Number of slots.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Total samples written since startup, saturating at `u32::MAX`.
    pub fn samples_written(&self) -> u32 {
        self.written
    }

    /// Index of the slot the next write lands in.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Store `sample` at the cursor and advance.
    #[inline]
    pub fn write(&mut self, sample: i32) {
        self.samples[self.cursor] = sample;
        self.cursor = if self.cursor + 1 == N { 0 } else { self.cursor + 1 };
        self.written = self.written.saturating_add(1);
    }

    /// Whether a read at `lookback` would return trusted data.
    #[inline]
    pub fn is_valid_lookback(&self, lookback: usize) -> bool {
        lookback >= 1 && lookback < N && (self.written as usize) > lookback
    }

    /// Sample written `lookback` steps behind the cursor.
    ///
    /// Returns `None` when the lookback is outside `1..N` or not enough
    /// samples have been written yet for the slot to hold real data.
    #[inline]
    pub fn read_at(&self, lookback: usize) -> Option<i32> {
        if !self.is_valid_lookback(lookback) {
            return None;
        }
        let index = if lookback <= self.cursor {
            self.cursor - lookback
        } else {
            N - (lookback - self.cursor)
        };
        Some(self.samples[index])
    }

    /// Zero the ring and forget how much has been written.
    pub fn clear(&mut self) {
        self.samples.fill(0);
        self.cursor = 0;
        self.written = 0;
    }
}

impl<const N: usize> Default for HistoryBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
