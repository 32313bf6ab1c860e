//! Watermarks: monotonically-non-decreasing timestamps carried alongside data items.

use std::fmt;

/// A single watermark timestamp.
///
/// Ordering and equality are purely on the wrapped integer. [`Watermark::MIN`] stands in
/// for "no watermark observed yet" (conceptually `-∞`) and must never be produced by a
/// real inbound stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Watermark(i64);

impl Watermark {
    /// Sentinel standing in for "no watermark observed" (conceptually `-∞`).
    pub const MIN: Watermark = Watermark(i64::MIN);

    pub fn new(value: i64) -> Self {
        Watermark(value)
    }

    pub fn value(self) -> i64 {
        self.0
    }

    pub fn is_min(self) -> bool {
        self.0 == i64::MIN
    }
}

impl From<i64> for Watermark {
    fn from(value: i64) -> Self {
        Watermark::new(value)
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_min() {
            write!(f, "-inf")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
