//! Error types for domain-reindex

use discrete_domain::DomainError;
use thiserror::Error;

/// Result type for reindexing operations
pub type Result<T> = std::result::Result<T, ReindexError>;

/// Errors that can occur while building or applying reindexers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReindexError {
    /// Error from the underlying domains or indexers
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Dimensions going in must equal dimensions coming out
    #[error(
        "Combined size of 'from' ({from}) and 'added' ({added}) domains does not equal \
         'to' ({to}) and 'removed' ({removed}) domains"
    )]
    DimensionCountMismatch {
        from: usize,
        added: usize,
        to: usize,
        removed: usize,
    },

    /// Permutation map has the wrong number of entries
    #[error("Length of permutation array ({actual}) does not match number of domains ({expected})")]
    MapLengthMismatch { expected: usize, actual: usize },

    /// Permutation map entry outside of the target positions
    #[error("Permutation value {value} at position {position} out of range [0, {len})")]
    MapValueOutOfRange {
        position: usize,
        value: usize,
        len: usize,
    },

    /// Two source positions map to the same target
    #[error("Permutation array contains more than one mapping to domain {value}")]
    DuplicateMapTarget { value: usize },

    /// A dimension may only move to a target of the same size
    #[error("Domain size mismatch at old position {position}: {from_size} vs {to_size}")]
    DomainSizeMismatch {
        position: usize,
        from_size: usize,
        to_size: usize,
    },

    /// Consecutive chain stages do not share their boundary indexer
    #[error("Cannot chain reindexers: 'from' of stage {stage} does not equal 'to' of the previous stage")]
    MismatchedChain { stage: usize },

    /// Dimension position outside of the domain list
    #[error("Position {position} out of range for {len} domains")]
    InvalidPosition { position: usize, len: usize },

    /// Conditioning values must cover every dimension
    #[error("Expected {expected} conditioning values, got {actual}")]
    ConditionLengthMismatch { expected: usize, actual: usize },

    /// Conditioning value outside of its domain
    #[error("Conditioning value {value} for dimension {dim} out of range [0, {size})")]
    ConditionValueOutOfRange {
        dim: usize,
        value: usize,
        size: usize,
    },

    /// Join range is empty or runs past the domain list
    #[error("Cannot join [{offset}, {offset}+{length}) of {len} domains")]
    InvalidJoinRange {
        offset: usize,
        length: usize,
        len: usize,
    },

    /// Only joint domains can be split
    #[error("Domain at position {position} is not a joint domain")]
    NotAJointDomain { position: usize },

    /// Flat table length differs from the indexer cardinality
    #[error("Table has {actual} entries, expected {expected}")]
    TableLengthMismatch { expected: usize, actual: usize },

    /// Sparse values and sparse-to-joint map differ in length
    #[error("Sparse table has {values} values but {indices} joint indices")]
    SparseLengthMismatch { values: usize, indices: usize },

    /// Joint index outside of the indexer cardinality
    #[error("Joint index {index} out of range [0, {cardinality})")]
    JointIndexOutOfRange { index: usize, cardinality: usize },
}
