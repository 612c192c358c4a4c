//! Time types for PALIMPSEST.
//!
//! Recorders stamp every operation with wall-clock milliseconds since the
//! Unix epoch. Ordering inside a log is `(time, sequence)`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wall clock timestamp in milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch itself
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Create from milliseconds
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Get milliseconds
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Get current timestamp
    #[must_use]
    pub fn now() -> Self {
        Self(u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0))
    }

    /// Convert to a calendar date, if representable
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.0)
            .ok()
            .and_then(DateTime::from_timestamp_millis)
    }

    /// Get duration since another timestamp
    #[must_use]
    pub fn duration_since(&self, earlier: &Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.3f")),
            None => write!(f, "{}ms", self.0),
        }
    }
}

impl From<u64> for Timestamp {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// A span between timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Duration {
    millis: u64,
}

impl Duration {
    /// Zero duration
    #[must_use]
    pub const fn zero() -> Self {
        Self { millis: 0 }
    }

    /// Duration from milliseconds
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// Get total milliseconds
    #[must_use]
    pub const fn as_millis(&self) -> u64 {
        self.millis
    }

    /// Get whole seconds
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.millis / 1_000
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Duration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.millis < 1_000 {
            write!(f, "{}ms", self.millis)
        } else if self.millis % 1_000 == 0 {
            write!(f, "{}s", self.millis / 1_000)
        } else {
            write!(f, "{}.{:03}s", self.millis / 1_000, self.millis % 1_000)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_ord() {
        let t1 = Timestamp::from_millis(1);
        let t2 = Timestamp::from_millis(2);
        assert!(t1 < t2);
        assert_eq!(t2, Timestamp::from(2));
    }

    #[test]
    fn test_timestamp_display() {
        let t = Timestamp::from_millis(1_500);
        assert_eq!(t.to_string(), "1970-01-01 00:00:01.500");
    }

    #[test]
    fn test_duration_since() {
        let t1 = Timestamp::from_millis(100);
        let t2 = Timestamp::from_millis(2_350);
        let d = t2.duration_since(&t1);
        assert_eq!(d.as_millis(), 2_250);
        assert_eq!(d.as_secs(), 2);
        assert_eq!(d.to_string(), "2.250s");
        assert_eq!(t1.duration_since(&t2), Duration::zero());
    }

    #[test]
    fn test_duration_display() {
        assert_eq!(Duration::from_millis(12).to_string(), "12ms");
        assert_eq!(Duration::from_millis(3_000).to_string(), "3s");
    }
}
