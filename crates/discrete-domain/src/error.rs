//! Error types for discrete-domain

use thiserror::Error;

/// Result type for discrete-domain operations
pub type Result<T> = std::result::Result<T, DomainError>;

/// Errors that can occur while building or querying domains and indexers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// A domain must have at least one element
    #[error("Discrete domain must contain at least one element")]
    EmptyDomain,

    /// All values of a domain must share one value kind
    #[error("Value at position {position} is a {found}, expected {expected}")]
    HeterogeneousValues {
        position: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// Domain values must be distinct
    #[error("Value at position {position} duplicates an earlier element ({value})")]
    DuplicateValue { position: usize, value: String },

    /// Range interval must be strictly positive
    #[error("Non-positive interval {0} for range domain")]
    NonPositiveInterval(f64),

    /// Range upper bound must not be below the lower bound
    #[error("Upper bound {upper} is less than lower bound {lower}")]
    UpperBelowLower { lower: f64, upper: f64 },

    /// Tolerance must be finite and non-negative
    #[error("Invalid tolerance {0}: must be finite and non-negative")]
    InvalidTolerance(f64),

    /// Tolerance must be strictly less than half the interval
    #[error("Tolerance {tolerance} is too large for interval {interval}")]
    ToleranceTooLarge { tolerance: f64, interval: f64 },

    /// Domain has more elements than a 32-bit index can address
    #[error("Domain with {size} elements is too large")]
    DomainTooLarge { size: u64 },

    /// Value is not an element of the domain
    #[error("'{value}' is not a member of the domain")]
    NotAMember { value: String },

    /// Joint indexers need at least one domain
    #[error("Joint domain indexer requires at least one domain")]
    EmptyDomainList,

    /// Output position outside of the domain list
    #[error("Illegal output set for domain list: position {position} not in [0, {len})")]
    IllegalOutputSet { position: usize, len: usize },

    /// Joint index arithmetic would overflow a 32-bit signed integer
    #[error("Joint indexing unsupported for very large domain (cardinality ~{cardinality:.3e})")]
    JointIndexingUnsupported { cardinality: f64 },

    /// Index tuple has the wrong number of entries
    #[error("Expected {expected} indices, got {actual}")]
    IndicesLengthMismatch { expected: usize, actual: usize },

    /// Element index outside of its domain
    #[error("Index {index} for dimension {dim} out of range [0, {size})")]
    IndexOutOfRange {
        dim: usize,
        index: usize,
        size: usize,
    },

    /// Requested sub-range of the domain list does not exist
    #[error("Subindexer [{offset}, {offset}+{length}) out of range for {len} domains")]
    InvalidSubrange {
        offset: usize,
        length: usize,
        len: usize,
    },
}
