//! Constructors for every reindexer kind.
//!
//! Each factory takes the [`DomainRegistry`] that derived indexers are
//! interned in, so reindexers built from the same domains share them.

use std::cmp::Ordering;

use discrete_domain::{DiscreteDomain, DomainRegistry, JointDomainIndexer};

use crate::conditioner::Conditioner;
use crate::error::{ReindexError, Result};
use crate::joiner::Joiner;
use crate::permuter::{invert_map, Permuter};
use crate::reindexer::{Endpoints, ReindexKind, Reindexer};

fn domains_of(from: &JointDomainIndexer, positions: &[usize]) -> Vec<DiscreteDomain> {
    positions.iter().map(|&p| from.domain(p).clone()).collect()
}

/// Interned indexer over `domains`, directed with `outputs` when `like` is
/// directed and undirected otherwise.
fn directed_like(
    registry: &DomainRegistry,
    like: &JointDomainIndexer,
    domains: &[DiscreteDomain],
    outputs: impl Iterator<Item = usize>,
) -> Result<JointDomainIndexer> {
    if like.is_directed() {
        Ok(registry.directed_indexer(domains, &outputs.collect::<Vec<_>>())?)
    } else {
        Ok(registry.indexer(domains)?)
    }
}

impl Reindexer {
    /// General permutation from `from ⊕ added` to `to ⊕ removed`.
    ///
    /// `old_to_new[i]` is the new position of old position `i`, numbering old
    /// positions `from` first then `added`, and new positions `to` first then
    /// `removed`.
    ///
    /// # Errors
    /// Fails if the dimension counts do not balance, the map is not a
    /// permutation, or it moves a dimension to one of a different size.
    pub fn permuter(
        registry: &DomainRegistry,
        from: &JointDomainIndexer,
        added: Option<&JointDomainIndexer>,
        to: &JointDomainIndexer,
        removed: Option<&JointDomainIndexer>,
        old_to_new: &[usize],
    ) -> Result<Self> {
        let ends = Endpoints {
            from: registry.intern_indexer(from),
            added: added.map(|ix| registry.intern_indexer(&ix.undirected())),
            to: registry.intern_indexer(to),
            removed: removed.map(|ix| registry.intern_indexer(&ix.undirected())),
        };
        let permuter = Permuter::new(&ends, old_to_new)?;
        Ok(Self::assemble(ends, ReindexKind::Permute(permuter)))
    }

    /// Permutation from `from` to `to` with the added or removed domains
    /// deduced from the dimension counts.
    ///
    /// When `to` has more dimensions, `old_to_new` may be shorter than
    /// `to.len()`; the missing added dimensions go to the unused target
    /// positions in increasing order. When `to` has fewer, old positions
    /// mapped to `to.len()..` are removed.
    pub fn permute_to(
        registry: &DomainRegistry,
        from: &JointDomainIndexer,
        to: &JointDomainIndexer,
        old_to_new: &[usize],
    ) -> Result<Self> {
        let (from_len, to_len) = (from.len(), to.len());
        match from_len.cmp(&to_len) {
            Ordering::Equal => Self::permuter(registry, from, None, to, None, old_to_new),
            Ordering::Less => {
                let mut map = old_to_new.to_vec();
                if map.len() < to_len {
                    let mut used = vec![false; to_len];
                    for &new in &map {
                        if new < to_len {
                            used[new] = true;
                        }
                    }
                    let unused: Vec<usize> = (0..to_len).filter(|&p| !used[p]).collect();
                    let missing = to_len - map.len();
                    map.extend(unused.into_iter().take(missing));
                }
                if map.len() != to_len {
                    return Err(ReindexError::MapLengthMismatch {
                        expected: to_len,
                        actual: map.len(),
                    });
                }
                invert_map(&map, to_len)?;
                let added = domains_of(to, &map[from_len..]);
                let added = JointDomainIndexer::new(&added)?;
                Self::permuter(registry, from, Some(&added), to, None, &map)
            }
            Ordering::Greater => {
                invert_map(old_to_new, from_len)?;
                let mut removed_positions = vec![0; from_len - to_len];
                for (old, &new) in old_to_new.iter().enumerate() {
                    if new >= to_len {
                        removed_positions[new - to_len] = old;
                    }
                }
                let removed = JointDomainIndexer::new(&domains_of(from, &removed_positions))?;
                Self::permuter(registry, from, None, to, Some(&removed), old_to_new)
            }
        }
    }

    /// Keep the dimensions in order, adding or dropping trailing ones to
    /// match `to`.
    pub fn same_order(
        registry: &DomainRegistry,
        from: &JointDomainIndexer,
        to: &JointDomainIndexer,
    ) -> Result<Self> {
        let map: Vec<usize> = (0..from.len()).collect();
        Self::permute_to(registry, from, to, &map)
    }

    /// Move dimension `i` of `from` to position `old_to_new[i]`.
    ///
    /// A directed `from` yields a directed target with the outputs moved
    /// along.
    pub fn reorder(
        registry: &DomainRegistry,
        from: &JointDomainIndexer,
        old_to_new: &[usize],
    ) -> Result<Self> {
        let new_to_old = invert_map(old_to_new, from.len())?;
        let domains = domains_of(from, &new_to_old);
        let to = match from.outputs() {
            Some(outputs) => {
                let outputs: Vec<usize> = outputs.iter().map(|&o| old_to_new[o]).collect();
                registry.directed_indexer(&domains, &outputs)?
            }
            None => registry.indexer(&domains)?,
        };
        Self::permuter(registry, from, None, &to, None, old_to_new)
    }

    /// Insert the `added` dimensions before position `offset` of `from`.
    pub fn adder(
        registry: &DomainRegistry,
        from: &JointDomainIndexer,
        offset: usize,
        added: &JointDomainIndexer,
    ) -> Result<Self> {
        let (n, m) = (from.len(), added.len());
        if offset > n {
            return Err(ReindexError::InvalidPosition {
                position: offset,
                len: n,
            });
        }
        let domains: Vec<DiscreteDomain> = from.domains()[..offset]
            .iter()
            .chain(added.domains())
            .chain(&from.domains()[offset..])
            .cloned()
            .collect();
        let to = registry.indexer(&domains)?;
        let map: Vec<usize> = (0..n)
            .map(|i| if i < offset { i } else { i + m })
            .chain(offset..offset + m)
            .collect();
        Self::permuter(registry, from, Some(added), &to, None, &map)
    }

    /// Remove the dimensions at `positions` of `from`; converted tables are
    /// summed over them.
    pub fn remover(
        registry: &DomainRegistry,
        from: &JointDomainIndexer,
        positions: &[usize],
    ) -> Result<Self> {
        let n = from.len();
        let mut removing = vec![false; n];
        for &position in positions {
            if position >= n {
                return Err(ReindexError::InvalidPosition { position, len: n });
            }
            removing[position] = true;
        }
        let (dropped, kept): (Vec<usize>, Vec<usize>) = (0..n).partition(|&p| removing[p]);
        if dropped.is_empty() {
            return Self::same_order(registry, from, from);
        }

        let to = registry.indexer(&domains_of(from, &kept))?;
        let removed = registry.indexer(&domains_of(from, &dropped))?;
        let mut map = vec![0; n];
        for (new, &old) in kept.iter().chain(&dropped).enumerate() {
            map[old] = new;
        }
        Self::permuter(registry, from, None, &to, Some(&removed), &map)
    }

    /// Condition on fixed element indices of some dimensions.
    ///
    /// `values[i]` is `Some(index)` for a conditioned dimension and `None`
    /// for a kept one. Conditioned dimensions that do not already form a
    /// suffix are first permuted to the back, giving a chained reindexer.
    /// With nothing conditioned the result is the identity; conditioning
    /// every dimension fails since no dimension would remain.
    pub fn conditioner(
        registry: &DomainRegistry,
        from: &JointDomainIndexer,
        values: &[Option<usize>],
    ) -> Result<Self> {
        let n = from.len();
        if values.len() != n {
            return Err(ReindexError::ConditionLengthMismatch {
                expected: n,
                actual: values.len(),
            });
        }
        for (dim, value) in values.iter().enumerate() {
            if let Some(value) = *value {
                let size = from.domain_size(dim);
                if value >= size {
                    return Err(ReindexError::ConditionValueOutOfRange { dim, value, size });
                }
            }
        }

        let (conditioned, free): (Vec<usize>, Vec<usize>) =
            (0..n).partition(|&p| values[p].is_some());
        if conditioned.is_empty() {
            return Self::same_order(registry, from, from);
        }
        let condition: Vec<usize> = values.iter().flatten().copied().collect();

        let is_suffix = conditioned
            .iter()
            .enumerate()
            .all(|(i, &p)| p == free.len() + i);
        if is_suffix {
            return Self::condition_suffix(registry, from, &condition);
        }

        let mut map = vec![0; n];
        for (new, &old) in free.iter().chain(&conditioned).enumerate() {
            map[old] = new;
        }
        let permute = Self::reorder(registry, from, &map)?;
        let condition = Self::condition_suffix(registry, permute.to_domains(), &condition)?;
        permute.combine_with(&condition)
    }

    fn condition_suffix(
        registry: &DomainRegistry,
        from: &JointDomainIndexer,
        values: &[usize],
    ) -> Result<Self> {
        let kept = from.len() - values.len();
        let prefix = from.subindexer(0, kept)?;
        let outputs = from.outputs().unwrap_or_default();
        let to = directed_like(
            registry,
            from,
            prefix.domains(),
            outputs.iter().copied().filter(|&p| p < kept),
        )?;
        let ends = Endpoints {
            from: registry.intern_indexer(from),
            added: None,
            to,
            removed: Some(
                registry.intern_indexer(&from.subindexer(kept, values.len())?.undirected()),
            ),
        };
        let conditioner = Conditioner::new(&ends, values.into());
        Ok(Self::assemble(ends, ReindexKind::Condition(conditioner)))
    }

    /// Join dimensions `offset..offset + length` of `from` into one joint
    /// dimension.
    ///
    /// A directed `from` gives a directed `to`: the joint dimension is an
    /// output only if every joined dimension is one. The joint domain itself
    /// is built over the undirected run.
    pub fn joiner(
        registry: &DomainRegistry,
        from: &JointDomainIndexer,
        offset: usize,
        length: usize,
    ) -> Result<Self> {
        let n = from.len();
        if length == 0 || offset + length > n {
            return Err(ReindexError::InvalidJoinRange {
                offset,
                length,
                len: n,
            });
        }
        let sub = registry.intern_indexer(&from.subindexer(offset, length)?.undirected());
        let joint = registry.joint_domain(&sub)?;
        let domains: Vec<DiscreteDomain> = from.domains()[..offset]
            .iter()
            .chain(std::iter::once(&joint))
            .chain(&from.domains()[offset + length..])
            .cloned()
            .collect();
        let run_is_output = (offset..offset + length).all(|p| from.is_output(p));
        let outputs = from.outputs().unwrap_or_default();
        let shifted = outputs.iter().filter_map(|&p| match p {
            p if p < offset => Some(p),
            p if p >= offset + length => Some(p + 1 - length),
            _ => None,
        });
        let to = directed_like(
            registry,
            from,
            &domains,
            shifted.chain(run_is_output.then_some(offset)),
        )?;
        let ends = Endpoints {
            from: registry.intern_indexer(from),
            added: None,
            to,
            removed: None,
        };
        let joiner = Joiner::new(offset, sub)?;
        Ok(Self::assemble(ends, ReindexKind::Join(joiner)))
    }

    /// Split the joint domain at `offset` of `from` into its constituents.
    ///
    /// With a directed `from`, the constituents take the direction of the
    /// joint dimension they replace.
    pub fn splitter(
        registry: &DomainRegistry,
        from: &JointDomainIndexer,
        offset: usize,
    ) -> Result<Self> {
        let n = from.len();
        if offset >= n {
            return Err(ReindexError::InvalidPosition {
                position: offset,
                len: n,
            });
        }
        let sub = from
            .domain(offset)
            .joint_indexer()
            .ok_or(ReindexError::NotAJointDomain { position: offset })?
            .clone();
        let domains: Vec<DiscreteDomain> = from.domains()[..offset]
            .iter()
            .chain(sub.domains())
            .chain(&from.domains()[offset + 1..])
            .cloned()
            .collect();
        let width = sub.len();
        let outputs = from.outputs().unwrap_or_default();
        let shifted = outputs.iter().flat_map(|&p| match p {
            p if p < offset => p..p + 1,
            p if p == offset => offset..offset + width,
            p => p + width - 1..p + width,
        });
        let to = directed_like(registry, from, &domains, shifted)?;
        let ends = Endpoints {
            from: registry.intern_indexer(from),
            added: None,
            to,
            removed: None,
        };
        let splitter = Joiner::new(offset, sub)?;
        Ok(Self::assemble(ends, ReindexKind::Split(splitter)))
    }

    /// Split the joint domains at every position in `offsets`.
    ///
    /// Offsets refer to `from`; duplicates are ignored. The splits are
    /// applied from the back so earlier offsets stay valid.
    pub fn splitter_at(
        registry: &DomainRegistry,
        from: &JointDomainIndexer,
        offsets: &[usize],
    ) -> Result<Self> {
        let mut offsets = offsets.to_vec();
        offsets.sort_unstable();
        offsets.dedup();

        let mut chain: Option<Reindexer> = None;
        let mut current = from.clone();
        for &offset in offsets.iter().rev() {
            let split = Self::splitter(registry, &current, offset)?;
            current = split.to_domains().clone();
            chain = Some(split.append_to(chain.as_ref())?);
        }
        match chain {
            Some(chain) => Ok(chain),
            None => Self::same_order(registry, from, from),
        }
    }
}
