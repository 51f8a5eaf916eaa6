//! Arithmetic progression domains over integers and reals.

use std::hash::{Hash, Hasher};

use crate::error::{DomainError, Result};
use crate::global_default::REAL_RANGE_TOLERANCE;
use crate::value::real_key;

/// Largest element count addressable by a 32-bit signed index.
pub(crate) const MAX_DOMAIN_SIZE: u64 = i32::MAX as u64;

/// `lower + index * interval` evaluated without intermediate overflow.
///
/// Only called with results inside `[lower, upper]`, which fit in `i64`.
fn progression_at(lower: i64, index: i128, interval: i64) -> i64 {
    (i128::from(lower) + index * i128::from(interval)) as i64
}

/// Integers `lower, lower + interval, ..., upper`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntRange {
    lower: i64,
    upper: i64,
    interval: i64,
    size: usize,
}

impl IntRange {
    /// The integers `{0, 1}`.
    pub const BIT: IntRange = IntRange {
        lower: 0,
        upper: 1,
        interval: 1,
        size: 2,
    };

    /// Create an integer range.
    ///
    /// `upper` is rounded down onto the progression, so `IntRange::new(0, 7, 2)`
    /// and `IntRange::new(0, 6, 2)` describe the same domain.
    ///
    /// # Errors
    /// Returns an error if `interval` is not positive, `upper < lower`, or the
    /// range has more than `i32::MAX` elements.
    pub fn new(lower: i64, upper: i64, interval: i64) -> Result<Self> {
        if interval <= 0 {
            return Err(DomainError::NonPositiveInterval(interval as f64));
        }
        if upper < lower {
            return Err(DomainError::UpperBelowLower {
                lower: lower as f64,
                upper: upper as f64,
            });
        }

        let steps = (i128::from(upper) - i128::from(lower)) / i128::from(interval);
        let size = steps as u64 + 1;
        if size > MAX_DOMAIN_SIZE {
            return Err(DomainError::DomainTooLarge { size });
        }

        Ok(Self {
            lower,
            upper: progression_at(lower, steps, interval),
            interval,
            size: size as usize,
        })
    }

    pub fn lower(&self) -> i64 {
        self.lower
    }

    pub fn upper(&self) -> i64 {
        self.upper
    }

    pub fn interval(&self) -> i64 {
        self.interval
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Element at `index`; `index` must be less than [`size`](Self::size).
    pub fn value_at(&self, index: usize) -> i64 {
        progression_at(self.lower, index as i128, self.interval)
    }

    /// Index of `value`, or `None` if it is not on the progression.
    pub fn index_of(&self, value: i64) -> Option<usize> {
        if value < self.lower || value > self.upper {
            return None;
        }
        let offset = i128::from(value) - i128::from(self.lower);
        let interval = i128::from(self.interval);
        if offset % interval != 0 {
            return None;
        }
        Some((offset / interval) as usize)
    }
}

/// Reals `lower + i * interval` for `i` in `[0, size)`, matched within a tolerance.
#[derive(Debug, Clone)]
pub struct RealRange {
    lower: f64,
    upper: f64,
    interval: f64,
    tolerance: f64,
    size: usize,
}

impl RealRange {
    /// Create a real range whose tolerance is `|interval| * REAL_RANGE_TOLERANCE`.
    ///
    /// # Errors
    /// See [`RealRange::with_tolerance`].
    pub fn new(lower: f64, upper: f64, interval: f64) -> Result<Self> {
        let tolerance = (interval * REAL_RANGE_TOLERANCE.get()).abs();
        Self::with_tolerance(lower, upper, interval, tolerance)
    }

    /// Create a real range with an explicit matching tolerance.
    ///
    /// # Errors
    /// Returns an error if `interval` is not positive, `tolerance` is negative
    /// or not below `interval / 2`, or `upper < lower`.
    pub fn with_tolerance(lower: f64, upper: f64, interval: f64, tolerance: f64) -> Result<Self> {
        if !(interval > 0.0) || !interval.is_finite() {
            return Err(DomainError::NonPositiveInterval(interval));
        }
        if !(tolerance >= 0.0) || !tolerance.is_finite() {
            return Err(DomainError::InvalidTolerance(tolerance));
        }
        if tolerance >= interval / 2.0 {
            return Err(DomainError::ToleranceTooLarge {
                tolerance,
                interval,
            });
        }
        if !(upper >= lower) {
            return Err(DomainError::UpperBelowLower { lower, upper });
        }

        let steps = ((tolerance + upper - lower) / interval).floor();
        if !(steps < MAX_DOMAIN_SIZE as f64) {
            return Err(DomainError::DomainTooLarge {
                size: if steps.is_finite() { steps as u64 + 1 } else { u64::MAX },
            });
        }

        Ok(Self {
            lower,
            upper,
            interval,
            tolerance,
            size: steps as usize + 1,
        })
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Element at `index`; `index` must be less than [`size`](Self::size).
    pub fn value_at(&self, index: usize) -> f64 {
        self.lower + index as f64 * self.interval
    }

    /// Index of the element within tolerance of `value`.
    pub fn index_of(&self, value: f64) -> Option<usize> {
        let nearest = ((value - self.lower) / self.interval).round_ties_even();
        if !(nearest >= 0.0 && nearest < self.size as f64) {
            return None;
        }
        let index = nearest as usize;
        if (self.value_at(index) - value).abs() <= self.tolerance {
            Some(index)
        } else {
            None
        }
    }
}

impl PartialEq for RealRange {
    fn eq(&self, other: &Self) -> bool {
        real_key(self.lower) == real_key(other.lower)
            && self.interval.to_bits() == other.interval.to_bits()
            && self.tolerance.to_bits() == other.tolerance.to_bits()
            && self.size == other.size
    }
}

impl Eq for RealRange {}

impl Hash for RealRange {
    fn hash<H: Hasher>(&self, state: &mut H) {
        real_key(self.lower).hash(state);
        self.interval.to_bits().hash(state);
        self.tolerance.to_bits().hash(state);
        self.size.hash(state);
    }
}
