//! Character / line-break aggregates cached in tree nodes.

use std::ops::{Add, AddAssign, Neg, Sub};

/// Line feed; `"\r\n"` is counted once through its `'\n'`.
pub(crate) const LINE_FEED: u16 = b'\n' as u16;

/// Aggregate counts of a run of text.
///
/// Values are signed so a negated aggregate can be propagated up the tree on removal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Counts {
    /// Number of UTF-16 code units.
    pub chars: isize,
    /// Number of `'\n'` code units.
    pub line_breaks: isize,
}

impl Counts {
    /// Create counts from raw values.
    pub const fn new(chars: isize, line_breaks: isize) -> Self {
        Self { chars, line_breaks }
    }

    /// Count the code units and line breaks of a slice.
    pub fn of(units: &[u16]) -> Self {
        let line_breaks = units.iter().filter(|&&u| u == LINE_FEED).count();
        Self {
            chars: units.len() as isize,
            line_breaks: line_breaks as isize,
        }
    }

    /// Returns `true` if both counts are zero.
    pub fn is_zero(&self) -> bool {
        self.chars == 0 && self.line_breaks == 0
    }
}

impl Add for Counts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            chars: self.chars + rhs.chars,
            line_breaks: self.line_breaks + rhs.line_breaks,
        }
    }
}

impl AddAssign for Counts {
    fn add_assign(&mut self, rhs: Self) {
        self.chars += rhs.chars;
        self.line_breaks += rhs.line_breaks;
    }
}

impl Sub for Counts {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self + -rhs
    }
}

impl Neg for Counts {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            chars: -self.chars,
            line_breaks: -self.line_breaks,
        }
    }
}
