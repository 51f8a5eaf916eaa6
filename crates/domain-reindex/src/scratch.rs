//! Reusable index buffers for tuple-level conversions.
//!
//! Every reindexer owns one [`ScratchPool`] slot. Acquiring takes the cached
//! buffer if the slot is free and uncontended, otherwise a fresh buffer is
//! allocated. Neither acquisition nor release ever blocks.

use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;
use tracing::trace;

/// Buffer lengths of one reindexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScratchDims {
    pub from: usize,
    pub added: usize,
    pub to: usize,
    pub removed: usize,
    pub joined: usize,
}

/// Index tuples flowing through one conversion.
///
/// Fill [`from_mut`](Self::from_mut) and [`added_mut`](Self::added_mut), run
/// [`Reindexer::convert_scratch`](crate::Reindexer::convert_scratch), then
/// read [`to`](Self::to) and [`removed`](Self::removed). A conversion that has
/// no target, e.g. a tuple rejected by a conditioner, sets
/// [`is_unreachable`](Self::is_unreachable).
///
/// The buffers are only reachable as slices, so their lengths always match
/// the reindexer that handed them out.
#[derive(Debug, Clone)]
pub struct IndicesScratch {
    pub(crate) from: Vec<usize>,
    pub(crate) added: Vec<usize>,
    pub(crate) to: Vec<usize>,
    pub(crate) removed: Vec<usize>,
    pub(crate) joined: Vec<usize>,
    pub(crate) unreachable: bool,
}

impl IndicesScratch {
    pub(crate) fn new(dims: ScratchDims) -> Self {
        Self {
            from: vec![0; dims.from],
            added: vec![0; dims.added],
            to: vec![0; dims.to],
            removed: vec![0; dims.removed],
            joined: vec![0; dims.joined],
            unreachable: false,
        }
    }

    /// Placeholder left in a guard while its buffers go back to the pool.
    fn empty() -> Self {
        Self::new(ScratchDims {
            from: 0,
            added: 0,
            to: 0,
            removed: 0,
            joined: 0,
        })
    }

    fn dims(&self) -> ScratchDims {
        ScratchDims {
            from: self.from.len(),
            added: self.added.len(),
            to: self.to.len(),
            removed: self.removed.len(),
            joined: self.joined.len(),
        }
    }

    pub fn from(&self) -> &[usize] {
        &self.from
    }

    pub fn from_mut(&mut self) -> &mut [usize] {
        &mut self.from
    }

    pub fn added(&self) -> &[usize] {
        &self.added
    }

    pub fn added_mut(&mut self) -> &mut [usize] {
        &mut self.added
    }

    pub fn to(&self) -> &[usize] {
        &self.to
    }

    pub fn removed(&self) -> &[usize] {
        &self.removed
    }

    /// True if the last conversion produced no target tuple.
    pub fn is_unreachable(&self) -> bool {
        self.unreachable
    }
}

/// Single-slot cache of [`IndicesScratch`].
#[derive(Debug)]
pub(crate) struct ScratchPool {
    slot: Mutex<Option<IndicesScratch>>,
    dims: ScratchDims,
}

impl ScratchPool {
    pub(crate) fn new(dims: ScratchDims) -> Self {
        Self {
            slot: Mutex::new(None),
            dims,
        }
    }

    pub(crate) fn acquire(&self) -> ScratchGuard<'_> {
        let cached = self.slot.try_lock().and_then(|mut slot| slot.take());
        let scratch = cached.unwrap_or_else(|| IndicesScratch::new(self.dims));
        ScratchGuard {
            pool: self,
            scratch,
        }
    }

    /// True if `scratch` has this pool's buffer lengths.
    pub(crate) fn fits(&self, scratch: &IndicesScratch) -> bool {
        scratch.dims() == self.dims
    }

    fn release(&self, scratch: IndicesScratch) {
        if let Some(mut slot) = self.slot.try_lock() {
            if slot.is_none() {
                *slot = Some(scratch);
                return;
            }
        }
        trace!("scratch slot occupied, discarding buffer");
    }

    #[cfg(test)]
    pub(crate) fn is_cached(&self) -> bool {
        self.slot.lock().is_some()
    }
}

/// Exclusive use of a scratch buffer; returns it to its pool on drop.
#[derive(Debug)]
pub struct ScratchGuard<'a> {
    pool: &'a ScratchPool,
    scratch: IndicesScratch,
}

impl Deref for ScratchGuard<'_> {
    type Target = IndicesScratch;

    fn deref(&self) -> &IndicesScratch {
        &self.scratch
    }
}

impl DerefMut for ScratchGuard<'_> {
    fn deref_mut(&mut self) -> &mut IndicesScratch {
        &mut self.scratch
    }
}

impl Drop for ScratchGuard<'_> {
    fn drop(&mut self) {
        self.pool
            .release(std::mem::replace(&mut self.scratch, IndicesScratch::empty()));
    }
}
