//! Dimension permutation, possibly adding and removing dimensions.
//!
//! Old positions are numbered `from` first, then `added`; new positions `to`
//! first, then `removed`. `old_to_new[i]` is the new position of old
//! position `i`. A few common shapes of the map reduce joint index conversion
//! to one or two arithmetic operations:
//!
//! | pattern           | map shape                                 | new joint            |
//! |-------------------|-------------------------------------------|----------------------|
//! | identity          | `i -> i`                                  | `j`                  |
//! | append            | added dims go after `from`                | `j + |from| * a`     |
//! | prepend           | added dims go before `from`               | `a + |added| * j`    |
//! | remove from front | leading `from` dims become `removed`      | `j / |removed|`      |
//! | remove from back  | trailing `from` dims become `removed`     | `j % |to|`           |

use discrete_domain::JointDomainIndexer;
use tracing::debug;

use crate::error::{ReindexError, Result};
use crate::reindexer::{Endpoints, JointConversion};
use crate::scratch::IndicesScratch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FastPattern {
    Identity,
    Append { from_cardinality: usize },
    Prepend { added_cardinality: usize },
    RemoveFromFront { removed_cardinality: usize },
    RemoveFromBack { to_cardinality: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Permuter {
    old_to_new: Box<[usize]>,
    pattern: Option<FastPattern>,
    maintains_order: bool,
}

/// Inverse of a permutation of `0..len`.
///
/// # Errors
/// Fails on a wrong length, a value out of range or a repeated value.
pub(crate) fn invert_map(old_to_new: &[usize], len: usize) -> Result<Vec<usize>> {
    if old_to_new.len() != len {
        return Err(ReindexError::MapLengthMismatch {
            expected: len,
            actual: old_to_new.len(),
        });
    }
    let mut new_to_old = vec![usize::MAX; len];
    for (position, &value) in old_to_new.iter().enumerate() {
        if value >= len {
            return Err(ReindexError::MapValueOutOfRange {
                position,
                value,
                len,
            });
        }
        if new_to_old[value] != usize::MAX {
            return Err(ReindexError::DuplicateMapTarget { value });
        }
        new_to_old[value] = position;
    }
    Ok(new_to_old)
}

impl Permuter {
    pub(crate) fn new(ends: &Endpoints, old_to_new: &[usize]) -> Result<Self> {
        let (from, added) = (ends.from.len(), ends.added_len());
        let (to, removed) = (ends.to.len(), ends.removed_len());
        if from + added != to + removed {
            return Err(ReindexError::DimensionCountMismatch {
                from,
                added,
                to,
                removed,
            });
        }
        invert_map(old_to_new, from + added)?;
        for (position, &new) in old_to_new.iter().enumerate() {
            let (from_size, to_size) = (ends.old_size(position), ends.new_size(new));
            if from_size != to_size {
                return Err(ReindexError::DomainSizeMismatch {
                    position,
                    from_size,
                    to_size,
                });
            }
        }
        Ok(Self::classify(ends, old_to_new.into()))
    }

    fn classify(ends: &Endpoints, old_to_new: Box<[usize]>) -> Self {
        let from_len = ends.from.len();
        let to_len = ends.to.len();
        let added_len = ends.added_len();
        let removed_len = ends.removed_len();

        let (pattern, maintains_order) = if ends.canonical() {
            let cardinality = |ix: &Option<JointDomainIndexer>| {
                ix.as_ref().map_or(Some(1), |ix| ix.cardinality().ok())
            };
            let maintains_order = old_to_new.iter().enumerate().all(|(i, &new)| {
                if i < removed_len {
                    new == to_len + i
                } else {
                    new == i - removed_len
                }
            });
            let pattern = if maintains_order {
                match (added_len, removed_len) {
                    (0, 0) => Some(FastPattern::Identity),
                    (_, 0) => ends.from.cardinality().ok().map(|from_cardinality| {
                        FastPattern::Append { from_cardinality }
                    }),
                    (0, _) => cardinality(&ends.removed).map(|removed_cardinality| {
                        FastPattern::RemoveFromFront {
                            removed_cardinality,
                        }
                    }),
                    _ => None,
                }
            } else if removed_len == 0
                && added_len > 0
                && old_to_new.iter().enumerate().all(|(i, &new)| {
                    if i < from_len {
                        new == added_len + i
                    } else {
                        new == i - from_len
                    }
                })
            {
                cardinality(&ends.added).map(|added_cardinality| FastPattern::Prepend {
                    added_cardinality,
                })
            } else if added_len == 0
                && removed_len > 0
                && old_to_new.iter().enumerate().all(|(i, &new)| new == i)
            {
                ends.to
                    .cardinality()
                    .ok()
                    .map(|to_cardinality| FastPattern::RemoveFromBack { to_cardinality })
            } else {
                None
            };
            (pattern, maintains_order)
        } else {
            (None, false)
        };

        debug!(
            ?pattern,
            maintains_order,
            dims = old_to_new.len(),
            "classified permutation"
        );
        Self {
            old_to_new,
            pattern,
            maintains_order,
        }
    }

    /// Permuter for the swapped endpoints `swapped`.
    pub(crate) fn inverse(&self, swapped: &Endpoints) -> Self {
        let mut new_to_old = vec![0; self.old_to_new.len()];
        for (old, &new) in self.old_to_new.iter().enumerate() {
            new_to_old[new] = old;
        }
        Self::classify(swapped, new_to_old.into())
    }

    pub(crate) fn is_fast(&self) -> bool {
        self.pattern.is_some()
    }

    pub(crate) fn is_identity(&self) -> bool {
        self.pattern == Some(FastPattern::Identity)
    }

    pub(crate) fn maintains_order(&self) -> bool {
        self.maintains_order
    }

    pub(crate) fn convert_indices(&self, scratch: &mut IndicesScratch) {
        let from_len = scratch.from.len();
        let to_len = scratch.to.len();
        for (old, &new) in self.old_to_new.iter().enumerate() {
            let value = if old < from_len {
                scratch.from[old]
            } else {
                scratch.added[old - from_len]
            };
            if new < to_len {
                scratch.to[new] = value;
            } else {
                scratch.removed[new - to_len] = value;
            }
        }
        scratch.unreachable = false;
    }

    #[inline]
    pub(crate) fn fast_joint(&self, joint: usize, added: usize) -> JointConversion {
        let (to, removed) = match self.pattern {
            Some(FastPattern::Identity) | None => (joint, 0),
            Some(FastPattern::Append { from_cardinality }) => (joint + from_cardinality * added, 0),
            Some(FastPattern::Prepend { added_cardinality }) => {
                (added + added_cardinality * joint, 0)
            }
            Some(FastPattern::RemoveFromFront {
                removed_cardinality,
            }) => (joint / removed_cardinality, joint % removed_cardinality),
            Some(FastPattern::RemoveFromBack { to_cardinality }) => {
                (joint % to_cardinality, joint / to_cardinality)
            }
        };
        JointConversion {
            to: Some(to),
            removed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Reindexer, ReindexerKind};
    use discrete_domain::{DiscreteDomain, DomainRegistry, JointDomainIndexer};

    struct Fixture {
        registry: DomainRegistry,
        a: DiscreteDomain,
        b: DiscreteDomain,
        c: DiscreteDomain,
    }

    fn fixture() -> Fixture {
        let registry = DomainRegistry::new();
        Fixture {
            a: registry.domain(["a0", "a1"]).unwrap(),
            b: registry.domain(["b0", "b1", "b2"]).unwrap(),
            c: registry.int_range(0, 3, 1).unwrap(),
            registry,
        }
    }

    fn indexer(domains: &[&DiscreteDomain]) -> JointDomainIndexer {
        let domains: Vec<DiscreteDomain> = domains.iter().map(|&d| d.clone()).collect();
        JointDomainIndexer::new(&domains).unwrap()
    }

    /// Check the fast joint conversion against the tuple conversion.
    fn assert_fast_matches_tuples(r: &Reindexer) {
        assert!(r.has_fast_joint_index_conversion());
        let from = r.from_domains();
        let added = r.added_cardinality().unwrap();
        for joint in 0..from.cardinality().unwrap() {
            for a in 0..added {
                let fast = r.convert_joint_index_with_removed(joint, a).unwrap();
                let indices = from.joint_index_to_indices(joint).unwrap();
                let added_indices = match r.added_domains() {
                    Some(ix) => ix.joint_index_to_indices(a).unwrap(),
                    None => vec![],
                };
                let slow = r.convert_indices(&indices, &added_indices).unwrap();
                let to = r
                    .to_domains()
                    .joint_index_from_indices(&slow.to.unwrap())
                    .unwrap();
                assert_eq!(fast.to, Some(to));
                let removed = match r.removed_domains() {
                    Some(ix) => ix.joint_index_from_indices(&slow.removed).unwrap(),
                    None => 0,
                };
                assert_eq!(fast.removed, removed);
            }
        }
    }

    #[test]
    fn test_construction_errors() {
        let f = fixture();
        let ab = indexer(&[&f.a, &f.b]);
        let ba = indexer(&[&f.b, &f.a]);
        let abc = indexer(&[&f.a, &f.b, &f.c]);
        let reg = &f.registry;

        assert!(matches!(
            Reindexer::permuter(reg, &ab, None, &abc, None, &[0, 1, 2]),
            Err(ReindexError::DimensionCountMismatch { .. })
        ));
        assert_eq!(
            Reindexer::permuter(reg, &ab, None, &ba, None, &[1]),
            Err(ReindexError::MapLengthMismatch {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(
            Reindexer::permuter(reg, &ab, None, &ba, None, &[1, 2]),
            Err(ReindexError::MapValueOutOfRange {
                position: 1,
                value: 2,
                len: 2
            })
        );
        assert_eq!(
            Reindexer::permuter(reg, &ab, None, &ba, None, &[1, 1]),
            Err(ReindexError::DuplicateMapTarget { value: 1 })
        );
        assert_eq!(
            Reindexer::permuter(reg, &ab, None, &ba, None, &[0, 1]),
            Err(ReindexError::DomainSizeMismatch {
                position: 0,
                from_size: 2,
                to_size: 3
            })
        );
    }

    #[test]
    fn test_swap_tuple_and_joint() {
        let f = fixture();
        let ab = indexer(&[&f.a, &f.b]);
        let ba = indexer(&[&f.b, &f.a]);
        let r = Reindexer::permuter(&f.registry, &ab, None, &ba, None, &[1, 0]).unwrap();
        assert_eq!(r.kind(), ReindexerKind::Permuter);
        assert!(!r.has_fast_joint_index_conversion());
        assert!(!r.maintains_joint_index_order());

        let converted = r.convert_indices(&[1, 2], &[]).unwrap();
        assert_eq!(converted.to, Some(vec![2, 1]));
        // [a1, b2] = 1 + 2 * 2 = 5 becomes [b2, a1] = 2 + 3 * 1 = 5
        assert_eq!(r.convert_joint_index(5, 0).unwrap(), Some(5));
        // [a1, b0] = 1 becomes [b0, a1] = 3
        assert_eq!(r.convert_joint_index(1, 0).unwrap(), Some(3));
    }

    #[test]
    fn test_fast_patterns() {
        let f = fixture();
        let reg = &f.registry;
        let ab = indexer(&[&f.a, &f.b]);
        let abc = indexer(&[&f.a, &f.b, &f.c]);
        let cab = indexer(&[&f.c, &f.a, &f.b]);
        let c = indexer(&[&f.c]);

        let identity = Reindexer::permuter(reg, &ab, None, &ab, None, &[0, 1]).unwrap();
        assert!(identity.maintains_joint_index_order());
        assert_fast_matches_tuples(&identity);

        let append = Reindexer::permuter(reg, &ab, Some(&c), &abc, None, &[0, 1, 2]).unwrap();
        assert!(append.maintains_joint_index_order());
        assert_fast_matches_tuples(&append);

        let prepend = Reindexer::permuter(reg, &ab, Some(&c), &cab, None, &[1, 2, 0]).unwrap();
        assert!(!prepend.maintains_joint_index_order());
        assert_fast_matches_tuples(&prepend);

        let a = indexer(&[&f.a]);
        let bc = indexer(&[&f.b, &f.c]);
        let front = Reindexer::permuter(reg, &abc, None, &bc, Some(&a), &[2, 0, 1]).unwrap();
        assert!(front.maintains_joint_index_order());
        assert_fast_matches_tuples(&front);

        let back = Reindexer::permuter(reg, &abc, None, &ab, Some(&c), &[0, 1, 2]).unwrap();
        assert!(!back.maintains_joint_index_order());
        assert_fast_matches_tuples(&back);
    }

    #[test]
    fn test_directed_endpoints_disable_fast_path() {
        let f = fixture();
        let domains = [f.a.clone(), f.b.clone()];
        let directed = JointDomainIndexer::directed(&domains, &[1]).unwrap();
        let r = Reindexer::permuter(&f.registry, &directed, None, &directed, None, &[0, 1]).unwrap();
        assert!(!r.has_fast_joint_index_conversion());
        for joint in 0..6 {
            assert_eq!(r.convert_joint_index(joint, 0).unwrap(), Some(joint));
        }
    }

    #[test]
    fn test_inverse_map() {
        let f = fixture();
        let abc = indexer(&[&f.a, &f.b, &f.c]);
        let bca = indexer(&[&f.b, &f.c, &f.a]);
        let r = Reindexer::permuter(&f.registry, &abc, None, &bca, None, &[2, 0, 1]).unwrap();
        let inverse = r.inverse();
        for indices in abc.iter_indices() {
            let there = r.convert_indices(&indices, &[]).unwrap().to.unwrap();
            let back = inverse.convert_indices(&there, &[]).unwrap().to.unwrap();
            assert_eq!(back, indices);
        }
        assert_eq!(invert_map(&[2, 0, 1], 3).unwrap(), vec![1, 2, 0]);
    }
}
