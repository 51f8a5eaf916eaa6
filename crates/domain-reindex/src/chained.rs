//! Sequential composition of reindexers.
//!
//! Stage `k + 1` reads the `to` tuple of stage `k`. The added domains of the
//! chain are the stages' added domains in stage order; the removed domains
//! are the stages' removed domains in reverse stage order, so the last
//! stage's removed dimensions vary fastest.

use discrete_domain::JointDomainIndexer;

use crate::error::{ReindexError, Result};
use crate::reindexer::{Endpoints, JointConversion, ReindexKind, Reindexer};
use crate::scratch::{IndicesScratch, ScratchGuard};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Chain {
    stages: Box<[Reindexer]>,
}

fn concat_all<'a>(indexers: impl Iterator<Item = &'a JointDomainIndexer>) -> Option<JointDomainIndexer> {
    indexers.fold(None, |acc, ix| {
        Some(match acc {
            Some(acc) => acc.concat(ix),
            None => ix.clone(),
        })
    })
}

impl Chain {
    /// Chain `first` then `second`, flattening nested chains.
    pub(crate) fn build(first: &Reindexer, second: &Reindexer) -> Result<(Endpoints, Self)> {
        let mut stages = Vec::new();
        for r in [first, second] {
            match &r.0.kind {
                ReindexKind::Chain(chain) => stages.extend(chain.stages.iter().cloned()),
                _ => stages.push(r.clone()),
            }
        }
        for (i, pair) in stages.windows(2).enumerate() {
            if pair[1].from_domains() != pair[0].to_domains() {
                return Err(ReindexError::MismatchedChain { stage: i + 1 });
            }
        }

        let ends = Endpoints {
            from: first.from_domains().clone(),
            added: concat_all(stages.iter().filter_map(Reindexer::added_domains)),
            to: second.to_domains().clone(),
            removed: concat_all(stages.iter().rev().filter_map(Reindexer::removed_domains)),
        };
        Ok((
            ends,
            Self {
                stages: stages.into_boxed_slice(),
            },
        ))
    }

    pub(crate) fn stages(&self) -> &[Reindexer] {
        &self.stages
    }

    pub(crate) fn inverse(&self) -> Self {
        Self {
            stages: self.stages.iter().rev().map(Reindexer::inverse).collect(),
        }
    }

    pub(crate) fn convert_indices(&self, scratch: &mut IndicesScratch) {
        let mut added_at = 0;
        let mut removed_end = scratch.removed.len();
        let mut unreachable = false;
        let mut previous: Option<ScratchGuard<'_>> = None;

        for stage in self.stages.iter() {
            let mut local = stage.acquire_scratch();
            match &previous {
                Some(previous) => local.from.copy_from_slice(&previous.to),
                None => local.from.copy_from_slice(&scratch.from),
            }
            let n = local.added.len();
            local.added.copy_from_slice(&scratch.added[added_at..added_at + n]);
            added_at += n;

            stage.convert_scratch(&mut local);

            let n = local.removed.len();
            removed_end -= n;
            scratch.removed[removed_end..removed_end + n].copy_from_slice(&local.removed);
            // later stages still run so every removed index is filled
            unreachable |= local.unreachable;
            previous = Some(local);
        }

        if let Some(last) = previous {
            scratch.to.copy_from_slice(&last.to);
        }
        scratch.unreachable = unreachable;
    }

    #[inline]
    pub(crate) fn fast_joint(&self, joint: usize, added: usize) -> JointConversion {
        let mut joint = joint;
        let mut added = added;
        let mut removed = 0;
        let mut reachable = true;
        for stage in self.stages.iter() {
            let inner = &stage.0;
            let added_cardinality = inner.added_cardinality.unwrap_or(1);
            let local = added % added_cardinality;
            added /= added_cardinality;

            let step = inner.kind.fast_joint(joint, local);
            removed = removed * inner.removed_cardinality.unwrap_or(1) + step.removed;
            joint = match step.to {
                Some(to) => to,
                None => {
                    reachable = false;
                    inner.kind.fast_passthrough(joint, local)
                }
            };
        }
        JointConversion {
            to: reachable.then_some(joint),
            removed,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{ReindexError, Reindexer, ReindexerKind};
    use discrete_domain::{DomainRegistry, JointDomainIndexer};

    struct Fixture {
        registry: DomainRegistry,
        abc: JointDomainIndexer,
    }

    fn fixture() -> Fixture {
        let registry = DomainRegistry::new();
        let a = registry.domain(["a0", "a1"]).unwrap();
        let b = registry.domain(["b0", "b1", "b2"]).unwrap();
        let c = registry.int_range(0, 3, 1).unwrap();
        let abc = registry.indexer(&[a, b, c]).unwrap();
        Fixture { registry, abc }
    }

    #[test]
    fn test_mismatched_boundary() {
        let f = fixture();
        let drop_a = Reindexer::remover(&f.registry, &f.abc, &[0]).unwrap();
        assert_eq!(
            drop_a.combine_with(&drop_a),
            Err(ReindexError::MismatchedChain { stage: 1 })
        );
    }

    #[test]
    fn test_removed_order_is_reverse_stage_order() {
        let f = fixture();
        let drop_a = Reindexer::remover(&f.registry, &f.abc, &[0]).unwrap();
        let drop_b = Reindexer::remover(&f.registry, drop_a.to_domains(), &[0]).unwrap();
        let chain = drop_a.combine_with(&drop_b).unwrap();
        assert_eq!(chain.kind(), ReindexerKind::Chained);
        assert!(chain.has_fast_joint_index_conversion());

        let removed = chain.removed_domains().unwrap();
        assert_eq!(removed.domain_sizes(), &[3, 2]);

        let converted = chain.convert_indices(&[1, 2, 3], &[]).unwrap();
        assert_eq!(converted.to, Some(vec![3]));
        assert_eq!(converted.removed, vec![2, 1]);

        // joint [a1, b2, c3] = 1 + 2 * 2 + 6 * 3 = 23; removed [b2, a1] = 2 + 3 * 1 = 5
        let fast = chain.convert_joint_index_with_removed(23, 0).unwrap();
        assert_eq!(fast.to, Some(3));
        assert_eq!(fast.removed, 5);
    }

    #[test]
    fn test_unreachable_stage_still_reports_removed() {
        let f = fixture();
        let reg = &f.registry;
        let condition = Reindexer::conditioner(reg, &f.abc, &[None, None, Some(1)]).unwrap();
        let drop_b = Reindexer::remover(reg, condition.to_domains(), &[1]).unwrap();
        let chain = condition.combine_with(&drop_b).unwrap();
        assert!(chain.has_fast_joint_index_conversion());

        let hit = chain.convert_indices(&[1, 2, 1], &[]).unwrap();
        assert_eq!(hit.to, Some(vec![1]));
        assert_eq!(hit.removed, vec![2, 1]);

        // same pooled buffers, condition c = 1 now fails
        let miss = chain.convert_indices(&[0, 0, 0], &[]).unwrap();
        assert_eq!(miss.to, None);
        assert_eq!(miss.removed, vec![0, 0]);
        let miss = chain.convert_indices(&[1, 1, 3], &[]).unwrap();
        assert_eq!(miss.to, None);
        assert_eq!(miss.removed, vec![1, 3]);

        let mut scratch = chain.acquire_scratch();
        scratch.from_mut().copy_from_slice(&[1, 2, 1]);
        chain.convert_scratch(&mut scratch);
        assert!(!scratch.is_unreachable());
        assert_eq!(scratch.removed(), &[2, 1]);
        scratch.from_mut().copy_from_slice(&[0, 1, 3]);
        chain.convert_scratch(&mut scratch);
        assert!(scratch.is_unreachable());
        assert_eq!(scratch.removed(), &[1, 3]);
        drop(scratch);

        // joint [a1, b1, c3] = 1 + 2 * 1 + 6 * 3 = 21; removed [b1, c3] = 1 + 3 * 3 = 10
        let fast = chain.convert_joint_index_with_removed(21, 0).unwrap();
        assert_eq!(fast.to, None);
        assert_eq!(fast.removed, 10);
        for joint in 0..24 {
            let fast = chain.convert_joint_index_with_removed(joint, 0).unwrap();
            let indices = f.abc.joint_index_to_indices(joint).unwrap();
            let slow = chain.convert_indices(&indices, &[]).unwrap();
            let removed = chain.removed_domains().unwrap();
            assert_eq!(fast.removed, removed.joint_index_from_indices(&slow.removed).unwrap());
            assert_eq!(fast.to.is_some(), slow.to.is_some());
        }
    }

    #[test]
    fn test_nested_chains_flatten() {
        let f = fixture();
        let reg = &f.registry;
        let swap = Reindexer::reorder(reg, &f.abc, &[1, 0, 2]).unwrap();
        let back = swap.inverse();
        let drop_c = Reindexer::remover(reg, &f.abc, &[2]).unwrap();

        let left = swap.combine_with(&back).unwrap().combine_with(&drop_c).unwrap();
        let right = swap
            .combine_with(&back.combine_with(&drop_c).unwrap())
            .unwrap();
        assert_eq!(left, right);

        let weights: Vec<f64> = (0..24).map(f64::from).collect();
        let direct = drop_c.convert_dense_weights(&weights).unwrap();
        assert_eq!(left.convert_dense_weights(&weights).unwrap(), direct);
    }

    #[test]
    fn test_chain_with_added_domains() {
        let f = fixture();
        let reg = &f.registry;
        let bit = reg.indexer(&[reg.int_range(0, 1, 1).unwrap()]).unwrap();
        let add = Reindexer::adder(reg, &f.abc, 1, &bit).unwrap();
        let drop_a = Reindexer::remover(reg, add.to_domains(), &[0]).unwrap();
        let chain = add.combine_with(&drop_a).unwrap();
        assert_eq!(chain.added_cardinality().unwrap(), 2);
        assert_eq!(chain.removed_cardinality().unwrap(), 2);

        let converted = chain.convert_indices(&[1, 2, 3], &[1]).unwrap();
        assert_eq!(converted.to, Some(vec![1, 2, 3]));
        assert_eq!(converted.removed, vec![1]);

        let inverse = chain.inverse();
        assert_eq!(inverse.from_domains(), chain.to_domains());
        assert_eq!(inverse.to_domains(), &f.abc);
        let back = inverse.convert_indices(&[1, 2, 3], &[1]).unwrap();
        assert_eq!(back.to, Some(vec![1, 2, 3]));
        assert_eq!(back.removed, vec![1]);
    }
}
