//! Joint domain indexers: the Cartesian-product index space over an ordered
//! list of discrete domains.
//!
//! A tuple of per-domain element indices `[i_0, ..., i_{n-1}]` maps to a
//! single *joint index* `sum(i_k * stride_k)`. For an undirected indexer the
//! strides are cumulative products from the front, so dimension 0 varies
//! fastest:
//!
//! ```text
//! stride[0] = 1
//! stride[k] = stride[k-1] * size(domain[k-1])
//! ```
//!
//! A *directed* indexer designates some positions as outputs. Outputs and
//! inputs get independent stride sequences within their own sub-spaces and
//! the joint index is `output_index + input_index * output_cardinality`, so
//! outputs vary fastest. When the outputs are exactly the leading positions
//! (canonical order) the directed strides equal the undirected ones.
//!
//! If the product of the domain sizes does not fit a 32-bit signed integer
//! the indexer still exists, but every joint-index operation returns
//! [`DomainError::JointIndexingUnsupported`].
//!
//! # Example
//!
//! ```
//! use discrete_domain::{DiscreteDomain, JointDomainIndexer};
//!
//! let a = DiscreteDomain::int_range(0, 6, 2).unwrap();
//! let b = DiscreteDomain::from_values(["x", "y"]).unwrap();
//! let indexer = JointDomainIndexer::new(&[a, b]).unwrap();
//!
//! assert_eq!(indexer.cardinality().unwrap(), 8);
//! assert_eq!(indexer.joint_index_from_indices(&[2, 1]).unwrap(), 6);
//! assert_eq!(indexer.joint_index_to_indices(6).unwrap(), vec![2, 1]);
//! ```

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rand::Rng;
use tracing::debug;

use crate::domain::DiscreteDomain;
use crate::error::{DomainError, Result};
use crate::iter::IndicesIterator;
use crate::value::DomainValue;

/// Largest cardinality that supports joint indexing.
pub const MAX_JOINT_CARDINALITY: u64 = i32::MAX as u64;

/// Handle to an immutable joint domain indexer.
#[derive(Clone)]
pub struct JointDomainIndexer(pub(crate) Arc<IndexerInner>);

#[derive(Clone)]
pub(crate) struct IndexerInner {
    domains: Box<[DiscreteDomain]>,
    sizes: Box<[usize]>,
    directed: bool,
    outputs: SubSpace,
    inputs: SubSpace,
    layout: Option<JointLayout>,
    approx_cardinality: f64,
    hash: u64,
}

/// Index space over a subset of positions, e.g. the outputs of a directed indexer.
#[derive(Debug, Clone)]
struct SubSpace {
    positions: Box<[usize]>,
    /// Per domain position, zero for positions outside the sub-space.
    products: Option<Box<[usize]>>,
    cardinality: Option<usize>,
    approx_cardinality: f64,
}

/// Stride data of an indexer whose cardinality fits a joint index.
///
/// Obtained once through [`JointDomainIndexer::joint_layout`], after which
/// [`encode`](Self::encode) and [`decode`](Self::decode) are plain
/// arithmetic with no capacity or range checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointLayout {
    cardinality: usize,
    strides: Box<[usize]>,
    undirected_strides: Box<[usize]>,
    /// Positions from most to least significant.
    significance: Box<[usize]>,
}

impl JointLayout {
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Joint index of `indices`. Unchecked.
    #[inline]
    pub fn encode(&self, indices: &[usize]) -> usize {
        indices
            .iter()
            .zip(self.strides.iter())
            .map(|(i, s)| i * s)
            .sum()
    }

    /// Write the index tuple of `joint` into `out`. Unchecked.
    #[inline]
    pub fn decode(&self, mut joint: usize, out: &mut [usize]) {
        for &p in self.significance.iter() {
            let stride = self.strides[p];
            let index = joint / stride;
            joint -= index * stride;
            out[p] = index;
        }
    }
}

/// Exact product if it fits a joint index, otherwise an approximation of it.
///
/// The log-sum screens out clearly oversized products before the exact
/// 64-bit multiplication near the boundary.
fn fit_cardinality<I>(sizes: I) -> std::result::Result<usize, f64>
where
    I: Iterator<Item = usize> + Clone,
{
    let log2: f64 = sizes.clone().map(|s| (s as f64).log2()).sum();
    if log2 >= 32.0 {
        return Err(log2.exp2());
    }
    let exact = sizes.fold(1u64, |acc, s| acc.saturating_mul(s as u64));
    if exact <= MAX_JOINT_CARDINALITY {
        Ok(exact as usize)
    } else {
        Err(exact as f64)
    }
}

impl SubSpace {
    fn new(positions: Vec<usize>, sizes: &[usize]) -> Self {
        let fit = fit_cardinality(positions.iter().map(|&p| sizes[p]));
        let (cardinality, approx_cardinality) = match fit {
            Ok(c) => (Some(c), c as f64),
            Err(approx) => (None, approx),
        };
        let products = cardinality.map(|_| {
            let mut products = vec![0; sizes.len()];
            let mut product = 1;
            for &p in &positions {
                products[p] = product;
                product *= sizes[p];
            }
            products.into_boxed_slice()
        });
        Self {
            positions: positions.into_boxed_slice(),
            products,
            cardinality,
            approx_cardinality,
        }
    }

    fn unsupported(&self) -> DomainError {
        DomainError::JointIndexingUnsupported {
            cardinality: self.approx_cardinality,
        }
    }

    fn cardinality(&self) -> Result<usize> {
        self.cardinality.ok_or_else(|| self.unsupported())
    }

    fn index_from_indices(&self, indices: &[usize]) -> Result<usize> {
        let products = self.products.as_ref().ok_or_else(|| self.unsupported())?;
        Ok(self.positions.iter().map(|&p| indices[p] * products[p]).sum())
    }

    fn index_from_elements(&self, domains: &[DiscreteDomain], elements: &[DomainValue]) -> Result<usize> {
        let products = self.products.as_ref().ok_or_else(|| self.unsupported())?;
        self.positions.iter().try_fold(0, |index, &p| {
            Ok(index + domains[p].index_or_err(&elements[p])? * products[p])
        })
    }

    fn index_to_indices(&self, mut index: usize, out: &mut [usize]) -> Result<()> {
        let products = self.products.as_ref().ok_or_else(|| self.unsupported())?;
        for &p in self.positions.iter().rev() {
            let product = products[p];
            let i = index / product;
            index -= i * product;
            out[p] = i;
        }
        Ok(())
    }
}

impl JointDomainIndexer {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Create an undirected indexer over `domains`.
    ///
    /// # Errors
    /// Returns [`DomainError::EmptyDomainList`] if `domains` is empty.
    pub fn new(domains: &[DiscreteDomain]) -> Result<Self> {
        Self::build(domains.to_vec(), None)
    }

    /// Create a directed indexer whose `outputs` positions are output dimensions.
    ///
    /// # Errors
    /// Returns [`DomainError::IllegalOutputSet`] if any output position is out of range.
    pub fn directed(domains: &[DiscreteDomain], outputs: &[usize]) -> Result<Self> {
        Self::build(domains.to_vec(), Some(outputs.to_vec()))
    }

    /// Create a directed indexer from a bit mask of output positions.
    ///
    /// # Errors
    /// Returns [`DomainError::IllegalOutputSet`] if the mask has bits at or
    /// beyond `domains.len()`.
    pub fn directed_from_mask(domains: &[DiscreteDomain], mask: u64) -> Result<Self> {
        let outputs: Vec<usize> = (0..64).filter(|bit| mask & (1u64 << bit) != 0).collect();
        Self::directed(domains, &outputs)
    }

    pub(crate) fn build(domains: Vec<DiscreteDomain>, outputs: Option<Vec<usize>>) -> Result<Self> {
        if domains.is_empty() {
            return Err(DomainError::EmptyDomainList);
        }
        let len = domains.len();
        let outputs = match outputs {
            Some(mut outputs) => {
                outputs.sort_unstable();
                outputs.dedup();
                if let Some(&position) = outputs.iter().find(|&&p| p >= len) {
                    return Err(DomainError::IllegalOutputSet { position, len });
                }
                Some(outputs)
            }
            None => None,
        };
        Ok(Self::assemble(domains.into_boxed_slice(), outputs))
    }

    /// Build from validated parts.
    fn assemble(domains: Box<[DiscreteDomain]>, outputs: Option<Vec<usize>>) -> Self {
        let len = domains.len();
        let sizes: Box<[usize]> = domains.iter().map(DiscreteDomain::size).collect();
        let directed = outputs.is_some();

        let (output_positions, input_positions): (Vec<usize>, Vec<usize>) = match outputs {
            Some(outputs) => {
                let inputs = (0..len).filter(|p| outputs.binary_search(p).is_err()).collect();
                (outputs, inputs)
            }
            None => ((0..len).collect(), Vec::new()),
        };

        let significance: Box<[usize]> = input_positions
            .iter()
            .rev()
            .chain(output_positions.iter().rev())
            .copied()
            .collect();

        let fit = fit_cardinality(sizes.iter().copied());
        let approx_cardinality = match fit {
            Ok(c) => c as f64,
            Err(approx) => approx,
        };
        let layout = match fit {
            Ok(cardinality) => {
                let mut undirected_strides = vec![0; len];
                let mut product = 1;
                for (stride, &size) in undirected_strides.iter_mut().zip(sizes.iter()) {
                    *stride = product;
                    product *= size;
                }
                let mut strides = vec![0; len];
                let mut product = 1;
                for &p in significance.iter().rev() {
                    strides[p] = product;
                    product *= sizes[p];
                }
                Some(JointLayout {
                    cardinality,
                    strides: strides.into_boxed_slice(),
                    undirected_strides: undirected_strides.into_boxed_slice(),
                    significance: significance.clone(),
                })
            }
            Err(approx) => {
                debug!(
                    dims = len,
                    cardinality = approx,
                    "domain list too large for joint indexing"
                );
                None
            }
        };

        let mut hasher = DefaultHasher::new();
        domains.hash(&mut hasher);
        if directed {
            13u8.hash(&mut hasher);
            output_positions.hash(&mut hasher);
        }

        let outputs = SubSpace::new(output_positions, &sizes);
        let inputs = SubSpace::new(input_positions, &sizes);

        Self(Arc::new(IndexerInner {
            domains,
            sizes,
            directed,
            outputs,
            inputs,
            layout,
            approx_cardinality,
            hash: hasher.finish(),
        }))
    }

    /// Same domains with the given output positions.
    pub fn with_outputs(&self, outputs: &[usize]) -> Result<Self> {
        Self::directed(&self.0.domains, outputs)
    }

    /// Same domains without an input/output partition.
    pub fn undirected(&self) -> Self {
        if self.0.directed {
            Self::assemble(self.0.domains.clone(), None)
        } else {
            self.clone()
        }
    }

    /// Undirected indexer over `length` domains starting at `offset`.
    ///
    /// Returns `self` when the range covers every domain.
    pub fn subindexer(&self, offset: usize, length: usize) -> Result<Self> {
        let len = self.len();
        if length == 0 || offset + length > len {
            return Err(DomainError::InvalidSubrange {
                offset,
                length,
                len,
            });
        }
        if offset == 0 && length == len {
            return Ok(self.clone());
        }
        Ok(Self::assemble(
            self.0.domains[offset..offset + length].into(),
            None,
        ))
    }

    /// Domains of `self` followed by domains of `other`.
    ///
    /// The result is directed only if both inputs are.
    pub fn concat(&self, other: &Self) -> Self {
        let domains: Box<[DiscreteDomain]> = self
            .0
            .domains
            .iter()
            .chain(other.0.domains.iter())
            .cloned()
            .collect();
        let outputs = (self.0.directed && other.0.directed).then(|| {
            let offset = self.len();
            self.0
                .outputs
                .positions
                .iter()
                .copied()
                .chain(other.0.outputs.positions.iter().map(|p| p + offset))
                .collect()
        });
        Self::assemble(domains, outputs)
    }

    /// Same structure with `domains` substituted position by position.
    pub(crate) fn with_domains(&self, domains: Vec<DiscreteDomain>) -> Self {
        let mut inner = IndexerInner::clone(&self.0);
        inner.domains = domains.into_boxed_slice();
        Self(Arc::new(inner))
    }

    /// Stride layout for unchecked joint index arithmetic.
    ///
    /// # Errors
    /// Returns [`DomainError::JointIndexingUnsupported`] for a large indexer.
    pub fn joint_layout(&self) -> Result<&JointLayout> {
        self.0
            .layout
            .as_ref()
            .ok_or(DomainError::JointIndexingUnsupported {
                cardinality: self.0.approx_cardinality,
            })
    }

    // ========================================================================
    // Structure
    // ========================================================================

    /// Number of domains.
    pub fn len(&self) -> usize {
        self.0.domains.len()
    }

    /// Always false: an indexer has at least one domain.
    pub fn is_empty(&self) -> bool {
        self.0.domains.is_empty()
    }

    pub fn domain(&self, i: usize) -> &DiscreteDomain {
        &self.0.domains[i]
    }

    pub fn domains(&self) -> &[DiscreteDomain] {
        &self.0.domains
    }

    pub fn domain_size(&self, i: usize) -> usize {
        self.0.sizes[i]
    }

    pub fn domain_sizes(&self) -> &[usize] {
        &self.0.sizes
    }

    /// True if the cardinality fits a 32-bit signed joint index.
    pub fn supports_joint_indexing(&self) -> bool {
        self.0.layout.is_some()
    }

    /// True if the output dimensions alone fit a joint index. May hold for
    /// a large directed indexer that does not support joint indexing.
    pub fn supports_output_indexing(&self) -> bool {
        self.0.outputs.cardinality.is_some()
    }

    /// Product of the domain sizes.
    pub fn cardinality(&self) -> Result<usize> {
        Ok(self.joint_layout()?.cardinality)
    }

    /// Product of the domain sizes as a float, available even for large indexers.
    pub fn approximate_cardinality(&self) -> f64 {
        self.0.approx_cardinality
    }

    /// Joint index increment for a unit step in dimension `i`.
    pub fn stride(&self, i: usize) -> Result<usize> {
        Ok(self.joint_layout()?.strides[i])
    }

    /// Stride of dimension `i` ignoring any input/output partition.
    pub fn undirected_stride(&self, i: usize) -> Result<usize> {
        Ok(self.joint_layout()?.undirected_strides[i])
    }

    pub fn is_directed(&self) -> bool {
        self.0.directed
    }

    /// Output positions in increasing order, or `None` if undirected.
    pub fn outputs(&self) -> Option<&[usize]> {
        self.0.directed.then_some(&*self.0.outputs.positions)
    }

    /// Input positions in increasing order, or `None` if undirected.
    pub fn inputs(&self) -> Option<&[usize]> {
        self.0.directed.then_some(&*self.0.inputs.positions)
    }

    /// True if position `i` is an output. Every position of an undirected
    /// indexer counts as an output.
    pub fn is_output(&self, i: usize) -> bool {
        !self.0.directed || self.0.outputs.positions.binary_search(&i).is_ok()
    }

    /// True if the outputs are the leading positions, in which case the
    /// directed joint index equals the undirected one.
    pub fn has_canonical_domain_order(&self) -> bool {
        self.0
            .outputs
            .positions
            .iter()
            .enumerate()
            .all(|(i, &p)| i == p)
    }

    // ========================================================================
    // Joint index encoding
    // ========================================================================

    /// Joint index of the element index tuple `indices`.
    ///
    /// Unchecked: `indices` must have one in-range entry per domain, see
    /// [`validate_indices`](Self::validate_indices).
    pub fn joint_index_from_indices(&self, indices: &[usize]) -> Result<usize> {
        Ok(self.joint_layout()?.encode(indices))
    }

    /// Element index tuple of `joint`.
    pub fn joint_index_to_indices(&self, joint: usize) -> Result<Vec<usize>> {
        let mut indices = vec![0; self.len()];
        self.joint_index_to_indices_into(joint, &mut indices)?;
        Ok(indices)
    }

    /// Write the element index tuple of `joint` into `out`, which must have
    /// one entry per domain.
    pub fn joint_index_to_indices_into(&self, joint: usize, out: &mut [usize]) -> Result<()> {
        self.joint_layout()?.decode(joint, out);
        Ok(())
    }

    /// Element index of dimension `dim` within `joint`.
    pub fn joint_index_to_element_index(&self, joint: usize, dim: usize) -> Result<usize> {
        Ok((joint / self.joint_layout()?.strides[dim]) % self.0.sizes[dim])
    }

    /// Joint index of a tuple of domain elements.
    pub fn joint_index_from_elements(&self, elements: &[DomainValue]) -> Result<usize> {
        let layout = self.joint_layout()?;
        self.check_len(elements.len())?;
        let mut joint = 0;
        for ((domain, element), stride) in self
            .0
            .domains
            .iter()
            .zip(elements)
            .zip(layout.strides.iter())
        {
            joint += domain.index_or_err(element)? * stride;
        }
        Ok(joint)
    }

    /// Domain elements of `joint`.
    pub fn joint_index_to_elements(&self, joint: usize) -> Result<Vec<DomainValue>> {
        let indices = self.joint_index_to_indices(joint)?;
        Ok(self.elements_from_indices(&indices))
    }

    /// Element indices of a tuple of domain elements.
    pub fn elements_to_indices(&self, elements: &[DomainValue]) -> Result<Vec<usize>> {
        self.check_len(elements.len())?;
        self.0
            .domains
            .iter()
            .zip(elements)
            .map(|(domain, element)| domain.index_or_err(element))
            .collect()
    }

    /// Domain elements for a tuple of element indices.
    ///
    /// # Panics
    /// Panics if an index is out of range for its domain.
    pub fn elements_from_indices(&self, indices: &[usize]) -> Vec<DomainValue> {
        self.0
            .domains
            .iter()
            .zip(indices)
            .map(|(domain, &i)| domain.value_at(i))
            .collect()
    }

    // ========================================================================
    // Undirected encoding
    // ========================================================================

    /// Joint index of `indices` in declaration order, the first dimension
    /// varying fastest, whatever the input/output partition. Equals
    /// [`joint_index_from_indices`](Self::joint_index_from_indices) for an
    /// indexer in canonical order.
    pub fn undirected_joint_index_from_indices(&self, indices: &[usize]) -> Result<usize> {
        let layout = self.joint_layout()?;
        Ok(indices
            .iter()
            .zip(layout.undirected_strides.iter())
            .map(|(i, s)| i * s)
            .sum())
    }

    /// Element index tuple of an undirected joint index.
    pub fn undirected_joint_index_to_indices(&self, joint: usize) -> Result<Vec<usize>> {
        let layout = self.joint_layout()?;
        Ok(layout
            .undirected_strides
            .iter()
            .zip(self.0.sizes.iter())
            .map(|(stride, size)| (joint / stride) % size)
            .collect())
    }

    /// Element index of dimension `dim` within an undirected joint index.
    pub fn undirected_joint_index_to_element_index(&self, joint: usize, dim: usize) -> Result<usize> {
        Ok((joint / self.joint_layout()?.undirected_strides[dim]) % self.0.sizes[dim])
    }

    /// Undirected joint index of a tuple of domain elements.
    pub fn undirected_joint_index_from_elements(&self, elements: &[DomainValue]) -> Result<usize> {
        let indices = self.elements_to_indices(elements)?;
        self.undirected_joint_index_from_indices(&indices)
    }

    /// Domain elements of an undirected joint index.
    pub fn undirected_joint_index_to_elements(&self, joint: usize) -> Result<Vec<DomainValue>> {
        let indices = self.undirected_joint_index_to_indices(joint)?;
        Ok(self.elements_from_indices(&indices))
    }

    // ========================================================================
    // Input/output sub-spaces
    // ========================================================================

    /// Cardinality of the input dimensions; 1 for an undirected indexer.
    pub fn input_cardinality(&self) -> Result<usize> {
        self.0.inputs.cardinality()
    }

    /// Cardinality of the output dimensions; the full cardinality for an
    /// undirected indexer.
    pub fn output_cardinality(&self) -> Result<usize> {
        self.0.outputs.cardinality()
    }

    pub fn input_index_from_joint_index(&self, joint: usize) -> Result<usize> {
        self.joint_layout()?;
        Ok(joint / self.output_cardinality()?)
    }

    pub fn output_index_from_joint_index(&self, joint: usize) -> Result<usize> {
        self.joint_layout()?;
        Ok(joint % self.output_cardinality()?)
    }

    pub fn joint_index_from_input_output_indices(&self, input: usize, output: usize) -> Result<usize> {
        self.joint_layout()?;
        Ok(output + input * self.output_cardinality()?)
    }

    /// Input sub-index of a full index tuple.
    pub fn input_index_from_indices(&self, indices: &[usize]) -> Result<usize> {
        self.0.inputs.index_from_indices(indices)
    }

    /// Output sub-index of a full index tuple. Available on large indexers
    /// whose output sub-space fits a joint index.
    pub fn output_index_from_indices(&self, indices: &[usize]) -> Result<usize> {
        self.0.outputs.index_from_indices(indices)
    }

    /// Write the input positions of `out` from an input sub-index.
    pub fn input_index_to_indices(&self, input: usize, out: &mut [usize]) -> Result<()> {
        self.0.inputs.index_to_indices(input, out)
    }

    /// Write the output positions of `out` from an output sub-index.
    pub fn output_index_to_indices(&self, output: usize, out: &mut [usize]) -> Result<()> {
        self.0.outputs.index_to_indices(output, out)
    }

    /// Input sub-index of a full tuple of domain elements. Only the input
    /// positions are read; 0 for an undirected indexer.
    pub fn input_index_from_elements(&self, elements: &[DomainValue]) -> Result<usize> {
        self.check_len(elements.len())?;
        self.0.inputs.index_from_elements(&self.0.domains, elements)
    }

    /// Output sub-index of a full tuple of domain elements. Only the output
    /// positions are read.
    pub fn output_index_from_elements(&self, elements: &[DomainValue]) -> Result<usize> {
        self.check_len(elements.len())?;
        self.0.outputs.index_from_elements(&self.0.domains, elements)
    }

    /// Write the input positions of `out` from an input sub-index, leaving
    /// the other positions untouched.
    pub fn input_index_to_elements(&self, input: usize, out: &mut [DomainValue]) -> Result<()> {
        self.sub_index_to_elements(&self.0.inputs, input, out)
    }

    /// Write the output positions of `out` from an output sub-index, leaving
    /// the other positions untouched.
    pub fn output_index_to_elements(&self, output: usize, out: &mut [DomainValue]) -> Result<()> {
        self.sub_index_to_elements(&self.0.outputs, output, out)
    }

    fn sub_index_to_elements(&self, space: &SubSpace, index: usize, out: &mut [DomainValue]) -> Result<()> {
        self.check_len(out.len())?;
        let mut indices = vec![0; self.len()];
        space.index_to_indices(index, &mut indices)?;
        for &p in space.positions.iter() {
            let size = self.0.sizes[p];
            if indices[p] >= size {
                return Err(DomainError::IndexOutOfRange {
                    dim: p,
                    index: indices[p],
                    size,
                });
            }
            out[p] = self.0.domains[p].value_at(indices[p]);
        }
        Ok(())
    }

    /// True if `a` and `b` agree on every input position.
    pub fn has_same_inputs(&self, a: &[usize], b: &[usize]) -> bool {
        self.0.inputs.positions.iter().all(|&p| a[p] == b[p])
    }

    // ========================================================================
    // Validation, ordering, sampling
    // ========================================================================

    fn check_len(&self, actual: usize) -> Result<()> {
        if actual != self.len() {
            return Err(DomainError::IndicesLengthMismatch {
                expected: self.len(),
                actual,
            });
        }
        Ok(())
    }

    /// Check that `indices` has one in-range entry per domain.
    pub fn validate_indices(&self, indices: &[usize]) -> Result<()> {
        self.check_len(indices.len())?;
        for (dim, (&index, &size)) in indices.iter().zip(self.0.sizes.iter()).enumerate() {
            if index >= size {
                return Err(DomainError::IndexOutOfRange { dim, index, size });
            }
        }
        Ok(())
    }

    /// Order of two index tuples consistent with their joint indices:
    /// compares inputs, then outputs, each from the last position to the first.
    pub fn compare_indices(&self, a: &[usize], b: &[usize]) -> Ordering {
        let significance = self
            .0
            .inputs
            .positions
            .iter()
            .rev()
            .chain(self.0.outputs.positions.iter().rev());
        for &p in significance {
            match a[p].cmp(&b[p]) {
                Ordering::Equal => continue,
                ordering => return ordering,
            }
        }
        Ordering::Equal
    }

    /// Uniformly random joint index.
    pub fn random_joint_index<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<usize> {
        Ok(rng.gen_range(0..self.cardinality()?))
    }

    /// Uniformly random index tuple. Works for large indexers too.
    pub fn random_indices<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<usize> {
        self.0.sizes.iter().map(|&s| rng.gen_range(0..s)).collect()
    }

    /// Iterate over every index tuple, dimension 0 varying fastest.
    pub fn iter_indices(&self) -> IndicesIterator {
        IndicesIterator::new(&self.0.sizes)
    }

    /// Precomputed structural hash.
    pub fn hash_code(&self) -> u64 {
        self.0.hash
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for JointDomainIndexer {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        self.0.hash == other.0.hash
            && self.0.directed == other.0.directed
            && self.0.outputs.positions == other.0.outputs.positions
            && self.0.domains == other.0.domains
    }
}

impl Eq for JointDomainIndexer {}

impl Hash for JointDomainIndexer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl fmt::Debug for JointDomainIndexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("JointDomainIndexer");
        s.field("domains", &self.0.domains);
        if self.0.directed {
            s.field("outputs", &self.0.outputs.positions);
        }
        s.finish()
    }
}
