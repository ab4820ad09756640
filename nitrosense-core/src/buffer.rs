//! Fixed-Size Sliding Window for Chart Series
//!
//! ## Overview
//!
//! Each feed keeps the most recent readings in a [`SeriesBuffer`] so the
//! trend charts have something to draw. The buffer is a ring of fixed
//! capacity (15 by default) that:
//!
//! - keeps insertion order (oldest first when iterating)
//! - drops a reading whose timestamp equals the last buffered one
//! - evicts the oldest reading once capacity is exceeded
//!
//! ## Memory Layout
//!
//! Storage is an array of `Option<R>` sized by the const generic `N`:
//!
//! ```text
//! SeriesBuffer<_, 5> after 7 appends:
//! ┌─────┬─────┬─────┬─────┬─────┐
//! │  5  │  6  │  2  │  3  │  4  │  ← reading number
//! └─────┴─────┴─────┴─────┴─────┘
//!             ↑
//!             └── write_pos = 2 (oldest lives here once full)
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use nitrosense_core::{SeriesBuffer, WeatherReading};
//!
//! let mut series: SeriesBuffer<WeatherReading> = SeriesBuffer::new();
//!
//! assert!(series.push(WeatherReading::new(1_000, 21.5, 0.0)));
//! // Same receipt stamp - silently dropped
//! assert!(!series.push(WeatherReading::new(1_000, 21.6, 0.0)));
//!
//! assert_eq!(series.len(), 1);
//! ```

use alloc::vec::Vec;

use crate::constants::buffers::SERIES_CAPACITY;
use crate::readings::Timestamped;

/// Fixed-capacity, timestamp-deduplicated sliding window
///
/// ## Internal Invariants
///
/// - `write_pos < N`
/// - `len <= N`
/// - Iteration yields readings in insertion order
/// - No two adjacent readings share a timestamp
///
/// Not thread-safe; each feed owns its buffer behind its own lock.
#[derive(Clone)]
pub struct SeriesBuffer<R, const N: usize = SERIES_CAPACITY> {
    data: [Option<R>; N],
    write_pos: usize,
    len: usize,
}

impl<R: Timestamped + Copy, const N: usize> SeriesBuffer<R, N> {
    /// Creates a new empty buffer
    pub const fn new() -> Self {
        Self {
            data: [None; N],
            write_pos: 0,
            len: 0,
        }
    }

    /// Appends a reading unless it duplicates the last timestamp
    ///
    /// Returns `true` when the reading was stored. When the buffer is full the
    /// oldest reading is overwritten.
    pub fn push(&mut self, reading: R) -> bool {
        if let Some(last) = self.last() {
            if last.timestamp() == reading.timestamp() {
                return false;
            }
        }

        self.data[self.write_pos] = Some(reading);
        self.write_pos = (self.write_pos + 1) % N;

        if self.len < N {
            self.len += 1;
        }

        true
    }

    /// Number of stored readings
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if buffer is full
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Maximum number of readings kept
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Most recently appended reading
    pub fn last(&self) -> Option<&R> {
        if self.is_empty() {
            return None;
        }

        let idx = if self.write_pos == 0 { N - 1 } else { self.write_pos - 1 };

        self.data[idx].as_ref()
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> SeriesIter<'_, R, N> {
        SeriesIter {
            buffer: self,
            index: 0,
        }
    }

    /// Copy the window out, oldest first
    pub fn to_vec(&self) -> Vec<R> {
        self.iter().copied().collect()
    }

    /// Drop all readings
    pub fn clear(&mut self) {
        self.data = [None; N];
        self.write_pos = 0;
        self.len = 0;
    }

    /// Logical index (0 = oldest) to physical slot
    fn get(&self, index: usize) -> Option<&R> {
        if index >= self.len {
            return None;
        }

        let actual_index = if self.len < N {
            index
        } else {
            (self.write_pos + index) % N
        };

        self.data[actual_index].as_ref()
    }
}

impl<R: Timestamped + Copy, const N: usize> Default for SeriesBuffer<R, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Timestamped + Copy + core::fmt::Debug, const N: usize> core::fmt::Debug for SeriesBuffer<R, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Iterator over buffer contents, oldest first
pub struct SeriesIter<'a, R, const N: usize> {
    buffer: &'a SeriesBuffer<R, N>,
    index: usize,
}

impl<'a, R: Timestamped + Copy, const N: usize> Iterator for SeriesIter<'a, R, N> {
    type Item = &'a R;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.buffer.get(self.index)?;
        self.index += 1;
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readings::SoilReading;

    fn soil(timestamp: u64, nitrogen: f64) -> SoilReading {
        SoilReading::new(timestamp, nitrogen, 0.0, 0.0)
    }

    #[test]
    fn empty_buffer() {
        let buffer: SeriesBuffer<SoilReading> = SeriesBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.capacity(), 15);
        assert!(buffer.last().is_none());
    }

    #[test]
    fn keeps_the_fifteen_most_recent() {
        let mut buffer: SeriesBuffer<SoilReading> = SeriesBuffer::new();

        for i in 0..20u64 {
            assert!(buffer.push(soil(1_000 + i * 2_000, i as f64)));
        }

        assert_eq!(buffer.len(), 15);
        assert!(buffer.is_full());

        let nitrogen: Vec<f64> = buffer.iter().map(|r| r.nitrogen).collect();
        let expected: Vec<f64> = (5..20).map(|i| i as f64).collect();
        assert_eq!(nitrogen, expected);
    }

    #[test]
    fn duplicate_timestamp_is_dropped() {
        let mut buffer: SeriesBuffer<SoilReading> = SeriesBuffer::new();
        buffer.push(soil(100, 1.0));
        buffer.push(soil(200, 2.0));

        assert!(!buffer.push(soil(200, 99.0)));
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.last().map(|r| r.nitrogen), Some(2.0));
    }

    #[test]
    fn dedup_only_checks_the_last_entry() {
        let mut buffer: SeriesBuffer<SoilReading, 4> = SeriesBuffer::new();
        buffer.push(soil(100, 1.0));
        buffer.push(soil(200, 2.0));

        // Matches an older entry, not the last one
        assert!(buffer.push(soil(100, 3.0)));
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn dedup_after_wraparound() {
        let mut buffer: SeriesBuffer<SoilReading, 3> = SeriesBuffer::new();
        for t in [10, 20, 30, 40] {
            buffer.push(soil(t, t as f64));
        }

        assert!(!buffer.push(soil(40, 0.0)));
        let stamps: Vec<u64> = buffer.iter().map(|r| r.timestamp).collect();
        assert_eq!(stamps, vec![20, 30, 40]);
    }

    #[test]
    fn clear_resets() {
        let mut buffer: SeriesBuffer<SoilReading, 3> = SeriesBuffer::new();
        buffer.push(soil(1, 1.0));
        buffer.clear();

        assert!(buffer.is_empty());
        assert!(buffer.to_vec().is_empty());
        assert!(buffer.push(soil(1, 1.0)));
    }
}
