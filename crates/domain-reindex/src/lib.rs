//! Reindexers: conversions of indices and factor tables between joint
//! domain layouts.
//!
//! A [`Reindexer`] maps the joint index space of one
//! [`JointDomainIndexer`](discrete_domain::JointDomainIndexer) onto another,
//! optionally introducing *added* dimensions and eliminating *removed* ones.
//! Dense and sparse tables of weights or energies are converted through it.
//!
//! # Kinds
//!
//! - **Permuter**: moves dimensions, adding or removing some
//!   ([`Reindexer::permuter`], [`Reindexer::reorder`], [`Reindexer::adder`],
//!   [`Reindexer::remover`], ...)
//! - **Conditioner**: slices a table at fixed values of some dimensions
//!   ([`Reindexer::conditioner`])
//! - **Joiner / Splitter**: merges a run of dimensions into one joint
//!   dimension and back ([`Reindexer::joiner`], [`Reindexer::splitter`])
//! - **Chained**: sequential composition ([`Reindexer::combine_with`])
//!
//! # Example
//!
//! ```
//! use discrete_domain::DomainRegistry;
//! use domain_reindex::Reindexer;
//!
//! let registry = DomainRegistry::new();
//! let a = registry.int_range(0, 6, 2).unwrap();
//! let b = registry.domain(["x", "y"]).unwrap();
//! let ab = registry.indexer(&[a, b]).unwrap();
//!
//! // fix b = "y"
//! let condition = Reindexer::conditioner(&registry, &ab, &[None, Some(1)]).unwrap();
//! let weights = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
//! assert_eq!(
//!     condition.convert_dense_weights(&weights).unwrap(),
//!     vec![4.0, 5.0, 6.0, 7.0]
//! );
//!
//! // sum out a
//! let marginal = Reindexer::remover(&registry, &ab, &[0]).unwrap();
//! assert_eq!(marginal.convert_dense_weights(&weights).unwrap(), vec![6.0, 22.0]);
//! ```
//!
//! # Thread safety
//!
//! Reindexers are immutable and may be shared across threads. Tuple-level
//! conversions borrow a per-reindexer scratch buffer without blocking; a
//! contended buffer is replaced by a fresh allocation.

mod chained;
mod conditioner;
mod convert;
mod error;
mod factory;
mod joiner;
mod permuter;
mod reindexer;
mod scratch;

pub use error::{ReindexError, Result};
pub use reindexer::{ConvertedIndices, JointConversion, Reindexer, ReindexerKind};
pub use scratch::{IndicesScratch, ScratchGuard};
