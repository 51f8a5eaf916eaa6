//! Conditioning on fixed values of the trailing dimensions.
//!
//! Removing the conditioned suffix keeps only the table entries whose
//! suffix equals the conditioning values. Those entries form one contiguous
//! block of the source table, so the conversion is a slice, not a sum over
//! the removed dimensions. The inverse adds the suffix back and only the
//! added index equal to the conditioning values has a target.

use crate::reindexer::{Endpoints, JointConversion};
use crate::scratch::IndicesScratch;

/// Start of the conditioned block in the larger table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    /// Cardinality of the kept prefix, i.e. the block length.
    len: usize,
    /// Joint index of the conditioning values over the suffix domains.
    condition: usize,
}

impl Block {
    fn start(self) -> usize {
        self.len * self.condition
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Conditioner {
    values: Box<[usize]>,
    /// Number of leading dimensions kept.
    kept: usize,
    /// True when the suffix is removed, false for the inverse that adds it.
    removing: bool,
    block: Option<Block>,
}

impl Conditioner {
    /// Remove the trailing `ends.removed` dimensions, keeping `values`.
    pub(crate) fn new(ends: &Endpoints, values: Box<[usize]>) -> Self {
        Self::with_direction(ends, values, true)
    }

    fn with_direction(ends: &Endpoints, values: Box<[usize]>, removing: bool) -> Self {
        let (kept, suffix) = if removing {
            (&ends.to, ends.removed.as_ref())
        } else {
            (&ends.from, ends.added.as_ref())
        };
        let block = if ends.canonical() {
            let condition = suffix.and_then(|s| s.joint_index_from_indices(&values).ok());
            match (kept.cardinality(), condition) {
                (Ok(len), Some(condition)) => Some(Block { len, condition }),
                _ => None,
            }
        } else {
            None
        };
        Self {
            kept: kept.len(),
            values,
            removing,
            block,
        }
    }

    pub(crate) fn inverse(&self, swapped: &Endpoints) -> Self {
        Self::with_direction(swapped, self.values.clone(), !self.removing)
    }

    /// Target of `joint` as if the conditioned indices matched; only
    /// meaningful on the fast path.
    pub(crate) fn fast_passthrough(&self, joint: usize, added: usize) -> usize {
        match self.block {
            Some(block) if self.removing => joint % block.len,
            Some(block) => joint + added * block.len,
            None => joint,
        }
    }

    pub(crate) fn is_fast(&self) -> bool {
        self.block.is_some()
    }

    pub(crate) fn convert_indices(&self, scratch: &mut IndicesScratch) {
        let k = self.kept;
        if self.removing {
            scratch.to.copy_from_slice(&scratch.from[..k]);
            scratch.removed.copy_from_slice(&scratch.from[k..]);
            scratch.unreachable = scratch.removed[..] != self.values[..];
        } else {
            scratch.to[..k].copy_from_slice(&scratch.from);
            scratch.to[k..].copy_from_slice(&scratch.added);
            scratch.unreachable = scratch.added[..] != self.values[..];
        }
    }

    #[inline]
    pub(crate) fn fast_joint(&self, joint: usize, added: usize) -> JointConversion {
        let Some(block) = self.block else {
            return JointConversion {
                to: None,
                removed: 0,
            };
        };
        if self.removing {
            let removed = joint / block.len;
            JointConversion {
                to: (removed == block.condition).then(|| joint - block.start()),
                removed,
            }
        } else {
            JointConversion {
                to: (added == block.condition).then(|| joint + block.start()),
                removed: 0,
            }
        }
    }

    /// Dense table conversion as one block copy, if the layout allows it.
    pub(crate) fn dense_slice(&self, old: &[f64], to_len: usize, empty: f64) -> Option<Vec<f64>> {
        let block = self.block?;
        let start = block.start();
        if self.removing {
            Some(old[start..start + block.len].to_vec())
        } else {
            let mut new = vec![empty; to_len];
            new[start..start + block.len].copy_from_slice(old);
            Some(new)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{ReindexError, Reindexer, ReindexerKind};
    use discrete_domain::{DomainRegistry, JointDomainIndexer};

    fn abc(registry: &DomainRegistry) -> JointDomainIndexer {
        let a = registry.domain(["a0", "a1"]).unwrap();
        let b = registry.domain(["b0", "b1", "b2"]).unwrap();
        let c = registry.domain(["c0", "c1"]).unwrap();
        registry.indexer(&[a, b, c]).unwrap()
    }

    #[test]
    fn test_suffix_condition_slices() {
        let registry = DomainRegistry::new();
        let from = abc(&registry);
        let r = Reindexer::conditioner(&registry, &from, &[None, Some(2), Some(1)]).unwrap();
        assert_eq!(r.kind(), ReindexerKind::Conditioner);
        assert!(r.has_fast_joint_index_conversion());
        assert!(r.maintains_joint_index_order());
        assert_eq!(r.to_domains().len(), 1);
        assert_eq!(r.removed_cardinality().unwrap(), 6);

        let weights: Vec<f64> = (0..12).map(f64::from).collect();
        // [b2, c1] is suffix joint index 2 + 3 * 1 = 5, block [10, 12)
        assert_eq!(r.convert_dense_weights(&weights).unwrap(), vec![10.0, 11.0]);

        assert_eq!(r.convert_joint_index(11, 0).unwrap(), Some(1));
        assert_eq!(r.convert_joint_index(3, 0).unwrap(), None);

        let converted = r.convert_indices(&[1, 0, 1], &[]).unwrap();
        assert_eq!(converted.to, None);
        assert_eq!(converted.removed, vec![0, 1]);
        let converted = r.convert_indices(&[1, 2, 1], &[]).unwrap();
        assert_eq!(converted.to, Some(vec![1]));
    }

    #[test]
    fn test_inverse_adds_condition_back() {
        let registry = DomainRegistry::new();
        let from = abc(&registry);
        let r = Reindexer::conditioner(&registry, &from, &[None, Some(1), Some(0)]).unwrap();
        let inverse = r.inverse();
        assert_eq!(inverse.added_cardinality().unwrap(), 6);

        let expanded = inverse.convert_dense_energies(&[0.5, 1.5]).unwrap();
        assert_eq!(expanded.len(), 12);
        for (joint, &energy) in expanded.iter().enumerate() {
            match joint {
                2 => assert_eq!(energy, 0.5),
                3 => assert_eq!(energy, 1.5),
                _ => assert!(energy.is_infinite()),
            }
        }
        assert_eq!(inverse.convert_joint_index(1, 1).unwrap(), Some(3));
        assert_eq!(inverse.convert_joint_index(1, 0).unwrap(), None);
    }

    #[test]
    fn test_non_suffix_condition_is_chained() {
        let registry = DomainRegistry::new();
        let from = abc(&registry);
        let r = Reindexer::conditioner(&registry, &from, &[Some(1), None, None]).unwrap();
        assert_eq!(r.kind(), ReindexerKind::Chained);
        assert_eq!(r.to_domains().domain_sizes(), &[3, 2]);

        let weights: Vec<f64> = (0..12).map(f64::from).collect();
        // entries with a = a1 are the odd joint indices
        assert_eq!(
            r.convert_dense_weights(&weights).unwrap(),
            vec![1.0, 3.0, 5.0, 7.0, 9.0, 11.0]
        );
    }

    #[test]
    fn test_directed_condition_keeps_outputs() {
        let registry = DomainRegistry::new();
        let from = abc(&registry).with_outputs(&[0]).unwrap();
        let r = Reindexer::conditioner(&registry, &from, &[None, Some(2), Some(1)]).unwrap();
        assert_eq!(r.to_domains().outputs(), Some(&[0][..]));
        assert!(r.has_fast_joint_index_conversion());

        // b is an output but not a leading one, so conversion goes through tuples
        let from = abc(&registry).with_outputs(&[1]).unwrap();
        let r = Reindexer::conditioner(&registry, &from, &[None, None, Some(1)]).unwrap();
        let to = r.to_domains();
        assert_eq!(to.outputs(), Some(&[1][..]));
        assert!(!r.has_fast_joint_index_conversion());

        let weights: Vec<f64> = (0..12).map(f64::from).collect();
        let sliced = r.convert_dense_weights(&weights).unwrap();
        for a in 0..2 {
            for b in 0..3 {
                let source = from.joint_index_from_indices(&[a, b, 1]).unwrap();
                let target = to.joint_index_from_indices(&[a, b]).unwrap();
                assert_eq!(sliced[target], weights[source]);
            }
        }

        let dropped = Reindexer::conditioner(&registry, &from, &[None, Some(0), None]).unwrap();
        assert_eq!(dropped.to_domains().outputs(), Some(&[][..]));
    }

    #[test]
    fn test_condition_validation() {
        let registry = DomainRegistry::new();
        let from = abc(&registry);
        assert_eq!(
            Reindexer::conditioner(&registry, &from, &[None, Some(3), None]),
            Err(ReindexError::ConditionValueOutOfRange {
                dim: 1,
                value: 3,
                size: 3
            })
        );
        assert!(matches!(
            Reindexer::conditioner(&registry, &from, &[None]),
            Err(ReindexError::ConditionLengthMismatch { .. })
        ));

        let unconditioned = Reindexer::conditioner(&registry, &from, &[None, None, None]).unwrap();
        assert_eq!(unconditioned.kind(), ReindexerKind::Permuter);
        assert_eq!(unconditioned.to_domains(), &from);
    }
}
