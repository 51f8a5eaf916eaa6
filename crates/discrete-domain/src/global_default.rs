//! Process-wide numeric defaults with atomic access.
//!
//! The only default used by this crate is [`REAL_RANGE_TOLERANCE`], the
//! factor applied to a real range's interval to derive the tolerance used
//! when matching values against range elements.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{DomainError, Result};

/// Relative tolerance factor for real range domains.
///
/// A real range built without an explicit tolerance uses
/// `|interval| * REAL_RANGE_TOLERANCE.get()`.
pub static REAL_RANGE_TOLERANCE: GlobalDefault = GlobalDefault::new(1e-6);

/// A global default f64 value with atomic access.
///
/// # Example
///
/// ```
/// use discrete_domain::GlobalDefault;
///
/// static MY_TOLERANCE: GlobalDefault = GlobalDefault::new(1e-6);
///
/// let factor = MY_TOLERANCE.get();
/// MY_TOLERANCE.set(factor * 10.0).unwrap();
/// ```
pub struct GlobalDefault {
    value: AtomicU64,
}

impl GlobalDefault {
    /// Create a new global default with the given initial value.
    #[must_use]
    pub const fn new(initial: f64) -> Self {
        Self {
            value: AtomicU64::new(initial.to_bits()),
        }
    }

    /// Get the current default value.
    #[must_use]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.value.load(Ordering::Relaxed))
    }

    /// Set a new default value.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidTolerance`] if the value is not finite or is negative.
    pub fn set(&self, value: f64) -> Result<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(DomainError::InvalidTolerance(value));
        }
        self.value.store(value.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    /// Set a new default value without validation.
    ///
    /// The caller must ensure the value is finite and non-negative.
    pub fn set_unchecked(&self, value: f64) {
        self.value.store(value.to_bits(), Ordering::Relaxed);
    }
}
