//! Table conversions shared by every reindexer kind.
//!
//! Tables are flat `f64` slices indexed by joint index, holding either
//! weights (non-negative, summed when merged) or energies (negative log
//! weights, merged through weight space). A reindexer that removes
//! dimensions may send several source entries to one target; those are the
//! *merging* conversions. All others assign.

use std::collections::HashMap;

use discrete_domain::JointLayout;

use crate::error::{ReindexError, Result};
use crate::reindexer::{JointConversion, ReindexKind, Reindexer, ReindexerInner};
use crate::scratch::ScratchGuard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TableKind {
    Weights,
    Energies,
}

impl TableKind {
    /// Value of a target that receives no source entry.
    fn empty(self) -> f64 {
        match self {
            Self::Weights => 0.0,
            Self::Energies => f64::INFINITY,
        }
    }

    fn to_weight(self, value: f64) -> f64 {
        match self {
            Self::Weights => value,
            Self::Energies => (-value).exp(),
        }
    }

    fn from_weights(self, mut weights: Vec<f64>) -> Vec<f64> {
        if self == Self::Energies {
            // ln(0) = -inf, so empty targets become +inf
            weights.iter_mut().for_each(|w| *w = -w.ln());
        }
        weights
    }
}

/// Joint index conversion with everything that can fail resolved up front.
pub(crate) struct JointConverter<'a> {
    kind: &'a ReindexKind,
    slow: Option<TupleRoute<'a>>,
}

/// Conversion through index tuples for reindexers without a fast path.
struct TupleRoute<'a> {
    from: &'a JointLayout,
    added: Option<&'a JointLayout>,
    to: &'a JointLayout,
    removed: Option<&'a JointLayout>,
    scratch: ScratchGuard<'a>,
}

impl<'a> JointConverter<'a> {
    pub(crate) fn new(reindexer: &'a Reindexer) -> Result<Self> {
        let inner = &reindexer.0;
        if inner.fast {
            return Ok(Self {
                kind: &inner.kind,
                slow: None,
            });
        }
        let ends = &inner.ends;
        let route = TupleRoute {
            from: ends.from.joint_layout()?,
            added: ends.added.as_ref().map(|ix| ix.joint_layout()).transpose()?,
            to: ends.to.joint_layout()?,
            removed: ends.removed.as_ref().map(|ix| ix.joint_layout()).transpose()?,
            scratch: reindexer.acquire_scratch(),
        };
        Ok(Self {
            kind: &inner.kind,
            slow: Some(route),
        })
    }

    /// Unchecked: `joint` and `added` must be in range.
    #[inline]
    pub(crate) fn convert(&mut self, joint: usize, added: usize) -> JointConversion {
        match &mut self.slow {
            None => self.kind.fast_joint(joint, added),
            Some(route) => route.convert(self.kind, joint, added),
        }
    }
}

impl TupleRoute<'_> {
    fn convert(&mut self, kind: &ReindexKind, joint: usize, added: usize) -> JointConversion {
        let scratch = &mut *self.scratch;
        self.from.decode(joint, &mut scratch.from);
        if let Some(layout) = self.added {
            layout.decode(added, &mut scratch.added);
        }
        kind.convert_indices(scratch);
        let removed = self.removed.map_or(0, |layout| layout.encode(&scratch.removed));
        let to = (!scratch.unreachable).then(|| self.to.encode(&scratch.to));
        JointConversion { to, removed }
    }
}

/// Whole-table conversions that need no per-entry index arithmetic.
fn dense_shortcut(
    inner: &ReindexerInner,
    old: &[f64],
    to_cardinality: usize,
    kind: TableKind,
) -> Option<Vec<f64>> {
    match &inner.kind {
        ReindexKind::Join(_) | ReindexKind::Split(_) if inner.fast => Some(old.to_vec()),
        ReindexKind::Permute(p) if p.is_identity() => Some(old.to_vec()),
        ReindexKind::Condition(c) => c.dense_slice(old, to_cardinality, kind.empty()),
        _ => None,
    }
}

pub(crate) fn convert_dense(reindexer: &Reindexer, old: &[f64], kind: TableKind) -> Result<Vec<f64>> {
    let inner = &reindexer.0;
    let from_cardinality = inner.ends.from.cardinality()?;
    if old.len() != from_cardinality {
        return Err(ReindexError::TableLengthMismatch {
            expected: from_cardinality,
            actual: old.len(),
        });
    }
    let to_cardinality = inner.ends.to.cardinality()?;
    if let Some(new) = dense_shortcut(inner, old, to_cardinality, kind) {
        return Ok(new);
    }

    let added_cardinality = reindexer.added_cardinality()?;
    let mut converter = JointConverter::new(reindexer)?;

    if inner.merges {
        let mut weights = vec![0.0; to_cardinality];
        for (joint, &value) in old.iter().enumerate() {
            let weight = kind.to_weight(value);
            for added in 0..added_cardinality {
                if let Some(new) = converter.convert(joint, added).to {
                    weights[new] += weight;
                }
            }
        }
        Ok(kind.from_weights(weights))
    } else {
        let mut new = vec![kind.empty(); to_cardinality];
        for (joint, &value) in old.iter().enumerate() {
            for added in 0..added_cardinality {
                if let Some(target) = converter.convert(joint, added).to {
                    new[target] = value;
                }
            }
        }
        Ok(new)
    }
}

fn check_sparse_indices(reindexer: &Reindexer, sparse_to_joint: &[usize]) -> Result<()> {
    let cardinality = reindexer.from_domains().cardinality()?;
    match sparse_to_joint.iter().find(|&&joint| joint >= cardinality) {
        Some(&index) => Err(ReindexError::JointIndexOutOfRange { index, cardinality }),
        None => Ok(()),
    }
}

pub(crate) fn convert_sparse(
    reindexer: &Reindexer,
    old_values: &[f64],
    old_sparse_to_joint: &[usize],
    new_sparse_to_joint: &[usize],
    kind: TableKind,
) -> Result<Vec<f64>> {
    if old_values.len() != old_sparse_to_joint.len() {
        return Err(ReindexError::SparseLengthMismatch {
            values: old_values.len(),
            indices: old_sparse_to_joint.len(),
        });
    }
    check_sparse_indices(reindexer, old_sparse_to_joint)?;

    let added_cardinality = reindexer.added_cardinality()?;
    let position: HashMap<usize, usize> = new_sparse_to_joint
        .iter()
        .enumerate()
        .map(|(sparse, &joint)| (joint, sparse))
        .collect();
    let mut converter = JointConverter::new(reindexer)?;
    let entries = old_values.iter().zip(old_sparse_to_joint);

    if reindexer.0.merges {
        let mut weights = vec![0.0; new_sparse_to_joint.len()];
        for (&value, &joint) in entries {
            let weight = kind.to_weight(value);
            for added in 0..added_cardinality {
                let target = converter.convert(joint, added).to;
                if let Some(&sparse) = target.and_then(|t| position.get(&t)) {
                    weights[sparse] += weight;
                }
            }
        }
        Ok(kind.from_weights(weights))
    } else {
        let mut new = vec![kind.empty(); new_sparse_to_joint.len()];
        for (&value, &joint) in entries {
            for added in 0..added_cardinality {
                let target = converter.convert(joint, added).to;
                if let Some(&sparse) = target.and_then(|t| position.get(&t)) {
                    new[sparse] = value;
                }
            }
        }
        Ok(new)
    }
}

pub(crate) fn convert_sparse_to_joint_index(
    reindexer: &Reindexer,
    old_sparse_to_joint: &[usize],
) -> Result<Vec<usize>> {
    check_sparse_indices(reindexer, old_sparse_to_joint)?;
    let added_cardinality = reindexer.added_cardinality()?;
    let mut converter = JointConverter::new(reindexer)?;

    let mut new = Vec::with_capacity(old_sparse_to_joint.len() * added_cardinality);
    for added in 0..added_cardinality {
        for &joint in old_sparse_to_joint {
            if let Some(target) = converter.convert(joint, added).to {
                new.push(target);
            }
        }
    }
    if !reindexer.maintains_joint_index_order() {
        new.sort_unstable();
    }
    if reindexer.removed_domains().is_some() {
        new.dedup();
    }
    Ok(new)
}

/// Index tuples of the target joint indices `new_sparse_to_joint`.
pub(crate) fn convert_sparse_indices(
    reindexer: &Reindexer,
    new_sparse_to_joint: &[usize],
) -> Result<Vec<Vec<usize>>> {
    let to = reindexer.to_domains();
    let layout = to.joint_layout()?;
    new_sparse_to_joint
        .iter()
        .map(|&joint| {
            if joint >= layout.cardinality() {
                return Err(ReindexError::JointIndexOutOfRange {
                    index: joint,
                    cardinality: layout.cardinality(),
                });
            }
            let mut indices = vec![0; to.len()];
            layout.decode(joint, &mut indices);
            Ok(indices)
        })
        .collect()
}
