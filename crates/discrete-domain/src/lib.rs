//! Discrete domains and joint-domain indexers for factor tables.
//!
//! Graphical-model inference stores joint distributions over tuples of
//! finite-valued variables as flat tables. This crate provides the index
//! arithmetic underneath those tables.
//!
//! # Overview
//!
//! - [`DiscreteDomain`]: an ordered finite set of values with O(1)
//!   value-to-index and index-to-value lookup
//! - [`JointDomainIndexer`]: the Cartesian product of an ordered list of
//!   domains, mapping index tuples to a single joint index and back,
//!   optionally partitioned into input and output dimensions
//! - [`DomainRegistry`]: interns structurally equal domains and indexers so
//!   they share one instance
//! - [`IndicesIterator`]: walks every index tuple in joint index order
//!
//! # Quick Start
//!
//! ```
//! use discrete_domain::{DomainRegistry, DomainValue};
//!
//! let registry = DomainRegistry::new();
//! let a = registry.int_range(0, 6, 2).unwrap();
//! let b = registry.domain(["x", "y"]).unwrap();
//! let indexer = registry.indexer(&[a, b]).unwrap();
//!
//! assert_eq!(indexer.cardinality().unwrap(), 8);
//! let joint = indexer
//!     .joint_index_from_elements(&[DomainValue::Int(4), DomainValue::from("y")])
//!     .unwrap();
//! assert_eq!(joint, 6);
//! assert_eq!(indexer.joint_index_to_indices(joint).unwrap(), vec![2, 1]);
//! ```
//!
//! # Large domains
//!
//! Joint indices are limited to the 32-bit signed range. An indexer whose
//! cardinality exceeds it can still validate and sample tuples, but every
//! joint index operation fails with
//! [`DomainError::JointIndexingUnsupported`].

mod domain;
mod error;
mod global_default;
mod indexer;
mod iter;
mod range;
mod registry;
mod value;

pub use domain::{DiscreteDomain, DomainKind};
pub use error::{DomainError, Result};
pub use global_default::{GlobalDefault, REAL_RANGE_TOLERANCE};
pub use indexer::{JointDomainIndexer, JointLayout, MAX_JOINT_CARDINALITY};
pub use iter::IndicesIterator;
pub use range::{IntRange, RealRange};
pub use registry::DomainRegistry;
pub use value::{DomainValue, Symbol};
