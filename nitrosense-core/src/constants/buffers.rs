//! Buffer Size Constants

/// Readings kept per chart series.
///
/// At the sensor poll interval this is a 30 s window; at the weather poll
/// interval, 75 s.
pub const SERIES_CAPACITY: usize = 15;
