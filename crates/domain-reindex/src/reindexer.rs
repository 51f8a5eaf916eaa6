//! The reindexer handle.
//!
//! A [`Reindexer`] maps a `from` joint domain plus optional `added` domains
//! onto a `to` joint domain plus optional `removed` domains:
//!
//! ```text
//! from ⊕ added  ──▶  to ⊕ removed
//! ```
//!
//! The total dimension count is the same on both sides. Every kind of
//! reindexer implements the same two primitives, a tuple conversion on an
//! [`IndicesScratch`] and, where the layout allows it, an O(1) joint index
//! conversion. The table conversions in [`crate::convert`] are written once
//! in terms of those primitives.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock, Weak};

use discrete_domain::{DomainError, JointDomainIndexer};
use tracing::trace;

use crate::chained::Chain;
use crate::conditioner::Conditioner;
use crate::convert::{self, JointConverter, TableKind};
use crate::error::{ReindexError, Result};
use crate::joiner::Joiner;
use crate::permuter::Permuter;
use crate::scratch::{IndicesScratch, ScratchDims, ScratchGuard, ScratchPool};

/// The indexers on both sides of a reindexer.
///
/// `added` and `removed` are always stored undirected.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Endpoints {
    pub from: JointDomainIndexer,
    pub added: Option<JointDomainIndexer>,
    pub to: JointDomainIndexer,
    pub removed: Option<JointDomainIndexer>,
}

impl Endpoints {
    pub fn swapped(&self) -> Self {
        Self {
            from: self.to.clone(),
            added: self.removed.clone(),
            to: self.from.clone(),
            removed: self.added.clone(),
        }
    }

    pub fn added_len(&self) -> usize {
        self.added.as_ref().map_or(0, JointDomainIndexer::len)
    }

    pub fn removed_len(&self) -> usize {
        self.removed.as_ref().map_or(0, JointDomainIndexer::len)
    }

    /// Size of old position `i`, counting `from` then `added`.
    pub fn old_size(&self, i: usize) -> usize {
        size_at(&self.from, self.added.as_ref(), i)
    }

    /// Size of new position `i`, counting `to` then `removed`.
    pub fn new_size(&self, i: usize) -> usize {
        size_at(&self.to, self.removed.as_ref(), i)
    }

    /// True if the joint indices of `from` and `to` are the undirected ones.
    pub fn canonical(&self) -> bool {
        self.from.supports_joint_indexing()
            && self.to.supports_joint_indexing()
            && self.from.has_canonical_domain_order()
            && self.to.has_canonical_domain_order()
    }
}

fn size_at(first: &JointDomainIndexer, second: Option<&JointDomainIndexer>, i: usize) -> usize {
    if i < first.len() {
        first.domain_size(i)
    } else {
        second.map_or(0, |s| s.domain_size(i - first.len()))
    }
}

/// Kind-specific state, one variant per reindexer kind.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ReindexKind {
    Permute(Permuter),
    Condition(Conditioner),
    Join(Joiner),
    Split(Joiner),
    Chain(Chain),
}

impl ReindexKind {
    pub fn convert_indices(&self, scratch: &mut IndicesScratch) {
        match self {
            Self::Permute(p) => p.convert_indices(scratch),
            Self::Condition(c) => c.convert_indices(scratch),
            Self::Join(j) => j.join_indices(scratch),
            Self::Split(j) => j.split_indices(scratch),
            Self::Chain(c) => c.convert_indices(scratch),
        }
    }

    /// Only valid when [`is_fast`](Self::is_fast) holds.
    #[inline]
    pub fn fast_joint(&self, joint: usize, added: usize) -> JointConversion {
        match self {
            Self::Permute(p) => p.fast_joint(joint, added),
            Self::Condition(c) => c.fast_joint(joint, added),
            Self::Join(_) | Self::Split(_) => JointConversion {
                to: Some(joint),
                removed: 0,
            },
            Self::Chain(c) => c.fast_joint(joint, added),
        }
    }

    /// Like [`fast_joint`](Self::fast_joint), but yields a target even when
    /// a conditioning check fails.
    #[inline]
    pub fn fast_passthrough(&self, joint: usize, added: usize) -> usize {
        match self {
            Self::Condition(c) => c.fast_passthrough(joint, added),
            _ => self.fast_joint(joint, added).to.unwrap_or(joint),
        }
    }

    fn is_fast(&self, ends: &Endpoints) -> bool {
        match self {
            Self::Permute(p) => p.is_fast(),
            Self::Condition(c) => c.is_fast(),
            Self::Join(j) | Self::Split(j) => j.is_identity(ends),
            Self::Chain(c) => c.stages().iter().all(Reindexer::has_fast_joint_index_conversion),
        }
    }

    fn maintains_order(&self, ends: &Endpoints) -> bool {
        match self {
            Self::Permute(p) => p.maintains_order(),
            Self::Condition(c) => c.is_fast(),
            Self::Join(j) | Self::Split(j) => j.is_identity(ends),
            Self::Chain(c) => c.stages().iter().all(Reindexer::maintains_joint_index_order),
        }
    }

    /// True if several source entries may land on one target and must be summed.
    fn merges(&self, ends: &Endpoints) -> bool {
        match self {
            Self::Permute(_) => ends.removed.is_some(),
            Self::Condition(_) | Self::Join(_) | Self::Split(_) => false,
            Self::Chain(c) => c.stages().iter().any(|s| s.0.merges),
        }
    }

    fn joined_len(&self) -> usize {
        match self {
            Self::Join(j) | Self::Split(j) => j.length(),
            _ => 0,
        }
    }

    fn inverse(&self, ends: &Endpoints) -> (Endpoints, ReindexKind) {
        let swapped = ends.swapped();
        let kind = match self {
            Self::Permute(p) => Self::Permute(p.inverse(&swapped)),
            Self::Condition(c) => Self::Condition(c.inverse(&swapped)),
            Self::Join(j) => Self::Split(j.clone()),
            Self::Split(j) => Self::Join(j.clone()),
            Self::Chain(c) => Self::Chain(c.inverse()),
        };
        (swapped, kind)
    }

    fn public_kind(&self) -> ReindexerKind {
        match self {
            Self::Permute(_) => ReindexerKind::Permuter,
            Self::Condition(_) => ReindexerKind::Conditioner,
            Self::Join(_) => ReindexerKind::Joiner,
            Self::Split(_) => ReindexerKind::Splitter,
            Self::Chain(_) => ReindexerKind::Chained,
        }
    }
}

/// Kind of a [`Reindexer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReindexerKind {
    /// Moves dimensions, possibly adding and removing some.
    Permuter,
    /// Slices a table at fixed values of trailing dimensions.
    Conditioner,
    /// Merges a contiguous run of dimensions into one joint dimension.
    Joiner,
    /// Expands a joint dimension into its constituents.
    Splitter,
    /// Applies a sequence of reindexers in order.
    Chained,
}

/// Result of converting one joint index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JointConversion {
    /// Target joint index, `None` if the source has no image.
    pub to: Option<usize>,
    /// Joint index over the removed domains, 0 if none are removed.
    pub removed: usize,
}

/// Result of converting one index tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConvertedIndices {
    /// Target tuple, `None` if the source has no image.
    pub to: Option<Vec<usize>>,
    /// Indices of the removed dimensions.
    pub removed: Vec<usize>,
}

enum InverseLink {
    Owned(Reindexer),
    /// Back reference from an inverse to the reindexer that created it.
    Back(Weak<ReindexerInner>),
}

pub(crate) struct ReindexerInner {
    pub(crate) ends: Endpoints,
    pub(crate) kind: ReindexKind,
    pub(crate) fast: bool,
    maintains_order: bool,
    pub(crate) merges: bool,
    pub(crate) added_cardinality: Option<usize>,
    pub(crate) removed_cardinality: Option<usize>,
    scratch: ScratchPool,
    inverse: OnceLock<InverseLink>,
    /// Inverse rebuilt after the back-linked original was dropped.
    rebuilt: OnceLock<Reindexer>,
}

impl ReindexerInner {
    fn new(ends: Endpoints, kind: ReindexKind) -> Self {
        let fast = kind.is_fast(&ends);
        let maintains_order = kind.maintains_order(&ends);
        let merges = kind.merges(&ends);
        let dims = ScratchDims {
            from: ends.from.len(),
            added: ends.added_len(),
            to: ends.to.len(),
            removed: ends.removed_len(),
            joined: kind.joined_len(),
        };
        let cardinality = |ix: &Option<JointDomainIndexer>| {
            ix.as_ref().map_or(Some(1), |ix| ix.cardinality().ok())
        };
        let added_cardinality = cardinality(&ends.added);
        let removed_cardinality = cardinality(&ends.removed);
        trace!(
            kind = ?kind.public_kind(),
            fast,
            maintains_order,
            merges,
            "built reindexer"
        );
        Self {
            ends,
            kind,
            fast,
            maintains_order,
            merges,
            added_cardinality,
            removed_cardinality,
            scratch: ScratchPool::new(dims),
            inverse: OnceLock::new(),
            rebuilt: OnceLock::new(),
        }
    }
}

/// Immutable, thread-safe mapping between two joint domain layouts.
///
/// Cloning is cheap and shares the underlying instance. Build one with the
/// factories ([`permuter`](Self::permuter), [`conditioner`](Self::conditioner),
/// [`joiner`](Self::joiner), ...) and compose with
/// [`combine_with`](Self::combine_with).
#[derive(Clone)]
pub struct Reindexer(pub(crate) Arc<ReindexerInner>);

impl Reindexer {
    pub(crate) fn assemble(ends: Endpoints, kind: ReindexKind) -> Self {
        Self(Arc::new(ReindexerInner::new(ends, kind)))
    }

    // ========================================================================
    // Structure
    // ========================================================================

    pub fn kind(&self) -> ReindexerKind {
        self.0.kind.public_kind()
    }

    pub fn from_domains(&self) -> &JointDomainIndexer {
        &self.0.ends.from
    }

    pub fn to_domains(&self) -> &JointDomainIndexer {
        &self.0.ends.to
    }

    pub fn added_domains(&self) -> Option<&JointDomainIndexer> {
        self.0.ends.added.as_ref()
    }

    pub fn removed_domains(&self) -> Option<&JointDomainIndexer> {
        self.0.ends.removed.as_ref()
    }

    /// Cardinality of the added domains, 1 if there are none.
    pub fn added_cardinality(&self) -> Result<usize> {
        match &self.0.ends.added {
            Some(added) => Ok(added.cardinality()?),
            None => Ok(1),
        }
    }

    /// Cardinality of the removed domains, 1 if there are none.
    pub fn removed_cardinality(&self) -> Result<usize> {
        match &self.0.ends.removed {
            Some(removed) => Ok(removed.cardinality()?),
            None => Ok(1),
        }
    }

    /// True if joint indices convert by O(1) arithmetic without decoding tuples.
    pub fn has_fast_joint_index_conversion(&self) -> bool {
        self.0.fast
    }

    /// True if increasing source joint indices (with the added index as the
    /// outer loop) produce non-decreasing target joint indices.
    pub fn maintains_joint_index_order(&self) -> bool {
        self.0.maintains_order
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    // ========================================================================
    // Composition
    // ========================================================================

    /// Reindexer mapping `to ⊕ removed` back to `from ⊕ added`.
    ///
    /// Computed once and cached; the inverse of the inverse is `self`.
    pub fn inverse(&self) -> Reindexer {
        if let Some(link) = self.0.inverse.get() {
            return match link {
                InverseLink::Owned(inverse) => inverse.clone(),
                InverseLink::Back(weak) => match weak.upgrade() {
                    Some(inner) => Reindexer(inner),
                    None => self
                        .0
                        .rebuilt
                        .get_or_init(|| self.build_inverse())
                        .clone(),
                },
            };
        }
        let inverse = self.build_inverse();
        match self.0.inverse.set(InverseLink::Owned(inverse.clone())) {
            Ok(()) => inverse,
            // another thread got there first
            Err(_) => self.inverse(),
        }
    }

    fn build_inverse(&self) -> Reindexer {
        let (ends, kind) = self.0.kind.inverse(&self.0.ends);
        let inner = ReindexerInner::new(ends, kind);
        let _ = inner.inverse.set(InverseLink::Back(Arc::downgrade(&self.0)));
        Reindexer(Arc::new(inner))
    }

    /// Reindexer applying `self` and then `next`.
    ///
    /// # Errors
    /// Returns [`ReindexError::MismatchedChain`] unless `next.from_domains()`
    /// equals `self.to_domains()`.
    pub fn combine_with(&self, next: &Reindexer) -> Result<Reindexer> {
        let (ends, chain) = Chain::build(self, next)?;
        Ok(Self::assemble(ends, ReindexKind::Chain(chain)))
    }

    /// `previous` followed by `self`, or `self` alone.
    pub fn append_to(&self, previous: Option<&Reindexer>) -> Result<Reindexer> {
        match previous {
            Some(previous) => previous.combine_with(self),
            None => Ok(self.clone()),
        }
    }

    // ========================================================================
    // Index conversion
    // ========================================================================

    /// Scratch buffers sized for this reindexer, for use with
    /// [`convert_scratch`](Self::convert_scratch).
    pub fn acquire_scratch(&self) -> ScratchGuard<'_> {
        self.0.scratch.acquire()
    }

    /// Convert `scratch.from()`/`scratch.added()` into
    /// `scratch.to()`/`scratch.removed()`.
    ///
    /// The indices are not range checked.
    ///
    /// # Panics
    /// Panics if `scratch` was not sized for this reindexer, i.e. was
    /// acquired from a reindexer with different dimension counts.
    pub fn convert_scratch(&self, scratch: &mut IndicesScratch) {
        assert!(
            self.0.scratch.fits(scratch),
            "scratch buffers do not match this reindexer"
        );
        self.0.kind.convert_indices(scratch);
    }

    /// Convert a `from` index tuple plus an `added` tuple.
    ///
    /// `added` must be empty if the reindexer adds no domains.
    pub fn convert_indices(&self, from: &[usize], added: &[usize]) -> Result<ConvertedIndices> {
        let ends = &self.0.ends;
        ends.from.validate_indices(from)?;
        match &ends.added {
            Some(ix) => ix.validate_indices(added)?,
            None if !added.is_empty() => {
                return Err(DomainError::IndicesLengthMismatch {
                    expected: 0,
                    actual: added.len(),
                }
                .into())
            }
            None => {}
        }
        let mut scratch = self.acquire_scratch();
        scratch.from.copy_from_slice(from);
        scratch.added.copy_from_slice(added);
        self.convert_scratch(&mut scratch);
        Ok(ConvertedIndices {
            to: (!scratch.unreachable).then(|| scratch.to.clone()),
            removed: scratch.removed.clone(),
        })
    }

    /// Target joint index of `joint` combined with the added joint index `added`.
    pub fn convert_joint_index(&self, joint: usize, added: usize) -> Result<Option<usize>> {
        Ok(self.convert_joint_index_with_removed(joint, added)?.to)
    }

    /// Like [`convert_joint_index`](Self::convert_joint_index), also
    /// reporting the joint index over the removed domains.
    pub fn convert_joint_index_with_removed(
        &self,
        joint: usize,
        added: usize,
    ) -> Result<JointConversion> {
        let from_cardinality = self.0.ends.from.cardinality()?;
        if joint >= from_cardinality {
            return Err(ReindexError::JointIndexOutOfRange {
                index: joint,
                cardinality: from_cardinality,
            });
        }
        let added_cardinality = self.added_cardinality()?;
        if added >= added_cardinality {
            return Err(ReindexError::JointIndexOutOfRange {
                index: added,
                cardinality: added_cardinality,
            });
        }
        Ok(JointConverter::new(self)?.convert(joint, added))
    }

    // ========================================================================
    // Table conversion
    // ========================================================================

    /// Convert a dense table of weights indexed by `from` joint index.
    ///
    /// Entries mapping to the same target are summed, targets with no
    /// source are 0.
    pub fn convert_dense_weights(&self, old: &[f64]) -> Result<Vec<f64>> {
        convert::convert_dense(self, old, TableKind::Weights)
    }

    /// Convert a dense table of energies (negative log weights).
    ///
    /// Entries mapping to the same target are combined in weight space,
    /// targets with no source are `+inf`.
    pub fn convert_dense_energies(&self, old: &[f64]) -> Result<Vec<f64>> {
        convert::convert_dense(self, old, TableKind::Energies)
    }

    /// Convert a sparse table of weights.
    ///
    /// `old_sparse_to_joint` maps each entry of `old_values` to its `from`
    /// joint index, in increasing order; `new_sparse_to_joint` lists the
    /// target joint indices of the result, typically from
    /// [`convert_sparse_to_joint_index`](Self::convert_sparse_to_joint_index).
    pub fn convert_sparse_weights(
        &self,
        old_values: &[f64],
        old_sparse_to_joint: &[usize],
        new_sparse_to_joint: &[usize],
    ) -> Result<Vec<f64>> {
        convert::convert_sparse(
            self,
            old_values,
            old_sparse_to_joint,
            new_sparse_to_joint,
            TableKind::Weights,
        )
    }

    /// Energy form of [`convert_sparse_weights`](Self::convert_sparse_weights).
    pub fn convert_sparse_energies(
        &self,
        old_values: &[f64],
        old_sparse_to_joint: &[usize],
        new_sparse_to_joint: &[usize],
    ) -> Result<Vec<f64>> {
        convert::convert_sparse(
            self,
            old_values,
            old_sparse_to_joint,
            new_sparse_to_joint,
            TableKind::Energies,
        )
    }

    /// Index tuples over [`to_domains`](Self::to_domains) of the target
    /// joint indices `new_sparse_to_joint`, one per sparse entry.
    pub fn convert_sparse_indices(&self, new_sparse_to_joint: &[usize]) -> Result<Vec<Vec<usize>>> {
        convert::convert_sparse_indices(self, new_sparse_to_joint)
    }

    /// Sorted, duplicate-free target joint indices reached from the sorted
    /// source joint indices `old_sparse_to_joint`, for every added index.
    pub fn convert_sparse_to_joint_index(&self, old_sparse_to_joint: &[usize]) -> Result<Vec<usize>> {
        convert::convert_sparse_to_joint_index(self, old_sparse_to_joint)
    }
}

impl PartialEq for Reindexer {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.0.ends == other.0.ends && self.0.kind == other.0.kind)
    }
}

impl Eq for Reindexer {}

impl Hash for Reindexer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        self.0.ends.from.hash(state);
        self.0.ends.added.hash(state);
        self.0.ends.to.hash(state);
        self.0.ends.removed.hash(state);
    }
}

impl fmt::Debug for Reindexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reindexer")
            .field("kind", &self.kind())
            .field("from", &self.0.ends.from)
            .field("added", &self.0.ends.added)
            .field("to", &self.0.ends.to)
            .field("removed", &self.0.ends.removed)
            .finish()
    }
}
