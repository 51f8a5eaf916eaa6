//! Discrete domains: ordered finite value sets with stable indices.
//!
//! A [`DiscreteDomain`] is an immutable, cheaply clonable handle. Construction
//! through [`DiscreteDomain::from_values`] picks the most compact
//! representation for the given values:
//!
//! 1. integers in a constant positive step become an [`IntRange`]
//! 2. reals in a constant positive step (within tolerance) become a [`RealRange`]
//! 3. [`Symbol`]s whose ordinals are `0..N` in order become an enumeration
//! 4. anything else is stored as an explicit array with a hash lookup
//!
//! Two domains are equal when they hold the same elements in the same order.
//! Interned handles (see [`DomainRegistry`](crate::DomainRegistry)) make the
//! pointer comparison a fast path for that check.
//!
//! # Example
//!
//! ```
//! use discrete_domain::{DiscreteDomain, DomainKind, DomainValue};
//!
//! let d = DiscreteDomain::from_values([0i64, 2, 4, 6]).unwrap();
//! assert_eq!(d.kind(), DomainKind::IntRange);
//! assert_eq!(d.index_of(&DomainValue::Int(4)), Some(2));
//! assert_eq!(d.index_of(&DomainValue::Int(5)), None);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem::discriminant;
use std::sync::Arc;

use crate::error::{DomainError, Result};
use crate::global_default::REAL_RANGE_TOLERANCE;
use crate::indexer::{JointDomainIndexer, JointLayout};
use crate::range::{IntRange, RealRange};
use crate::value::{DomainValue, Symbol};

/// Concrete representation of a [`DiscreteDomain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainKind {
    IntRange,
    RealRange,
    Enumeration,
    Array,
    Joint,
}

/// Handle to an immutable discrete domain.
#[derive(Clone)]
pub struct DiscreteDomain(pub(crate) Arc<DomainInner>);

pub(crate) struct DomainInner {
    repr: DomainRepr,
    hash: u64,
}

#[derive(Debug)]
enum DomainRepr {
    IntRange(IntRange),
    RealRange(RealRange),
    Enumeration(Box<[Arc<str>]>),
    Array(ArrayValues),
    Joint(JointElements),
}

#[derive(Debug)]
struct ArrayValues {
    values: Box<[DomainValue]>,
    lookup: HashMap<DomainValue, usize>,
}

#[derive(Debug)]
struct JointElements {
    indexer: JointDomainIndexer,
    layout: JointLayout,
}

impl DiscreteDomain {
    fn from_repr(repr: DomainRepr) -> Self {
        let mut hasher = DefaultHasher::new();
        match &repr {
            DomainRepr::IntRange(r) => {
                0u8.hash(&mut hasher);
                r.hash(&mut hasher);
            }
            DomainRepr::RealRange(r) => {
                1u8.hash(&mut hasher);
                r.hash(&mut hasher);
            }
            DomainRepr::Enumeration(names) => {
                2u8.hash(&mut hasher);
                names.hash(&mut hasher);
            }
            DomainRepr::Array(a) => {
                3u8.hash(&mut hasher);
                a.values.hash(&mut hasher);
            }
            DomainRepr::Joint(j) => {
                4u8.hash(&mut hasher);
                j.indexer.hash(&mut hasher);
            }
        }
        let hash = hasher.finish();
        Self(Arc::new(DomainInner { repr, hash }))
    }

    // ========================================================================
    // Factories
    // ========================================================================

    /// Create a domain from an ordered list of values.
    ///
    /// # Errors
    /// Returns an error if the list is empty, mixes value kinds, or contains
    /// duplicates.
    pub fn from_values<I, V>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<DomainValue>,
    {
        let values: Vec<DomainValue> = values.into_iter().map(Into::into).collect();
        let first = values.first().ok_or(DomainError::EmptyDomain)?;
        for (position, value) in values.iter().enumerate() {
            if discriminant(value) != discriminant(first) {
                return Err(DomainError::HeterogeneousValues {
                    position,
                    expected: first.kind_name(),
                    found: value.kind_name(),
                });
            }
        }

        let compact = match first {
            DomainValue::Int(_) => detect_int_range(&values).map(DomainRepr::IntRange),
            DomainValue::Real(_) => detect_real_range(&values).map(DomainRepr::RealRange),
            DomainValue::Symbol(_) => detect_enumeration(&values).map(DomainRepr::Enumeration),
            _ => None,
        };

        let repr = match compact {
            Some(repr) => repr,
            None => DomainRepr::Array(ArrayValues::new(values)?),
        };
        Ok(Self::from_repr(repr))
    }

    /// Integers from `lower` to `upper` inclusive in steps of `interval`.
    pub fn int_range(lower: i64, upper: i64, interval: i64) -> Result<Self> {
        Ok(Self::from_repr(DomainRepr::IntRange(IntRange::new(
            lower, upper, interval,
        )?)))
    }

    /// Consecutive integers from `lower` to `upper` inclusive.
    pub fn range(lower: i64, upper: i64) -> Result<Self> {
        Self::int_range(lower, upper, 1)
    }

    /// Reals from `lower` to `upper` in steps of `interval` using the default tolerance.
    pub fn real_range(lower: f64, upper: f64, interval: f64) -> Result<Self> {
        Ok(Self::from_repr(DomainRepr::RealRange(RealRange::new(
            lower, upper, interval,
        )?)))
    }

    /// Reals from `lower` to `upper` in steps of `interval` with an explicit tolerance.
    pub fn real_range_with_tolerance(
        lower: f64,
        upper: f64,
        interval: f64,
        tolerance: f64,
    ) -> Result<Self> {
        Ok(Self::from_repr(DomainRepr::RealRange(
            RealRange::with_tolerance(lower, upper, interval, tolerance)?,
        )))
    }

    /// The integers `{0, 1}`.
    pub fn bit() -> Self {
        Self::from_repr(DomainRepr::IntRange(IntRange::BIT))
    }

    /// The booleans `{false, true}`.
    pub fn boolean() -> Self {
        let values: Box<[DomainValue]> = Box::new([DomainValue::Bool(false), DomainValue::Bool(true)]);
        let lookup = values.iter().cloned().zip(0..).collect();
        Self::from_repr(DomainRepr::Array(ArrayValues { values, lookup }))
    }

    /// An enumeration with the given names, whose elements are [`Symbol`]s
    /// with ordinals in declaration order.
    pub fn enumeration<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        if names.is_empty() {
            return Err(DomainError::EmptyDomain);
        }
        let names: Box<[Arc<str>]> = names.iter().map(|n| Arc::from(n.as_ref())).collect();
        for (position, name) in names.iter().enumerate() {
            if names[..position].contains(name) {
                return Err(DomainError::DuplicateValue {
                    position,
                    value: name.to_string(),
                });
            }
        }
        Ok(Self::from_repr(DomainRepr::Enumeration(names)))
    }

    /// A domain whose elements are the tuples of `indexer`, in joint index order.
    ///
    /// # Errors
    /// Returns [`DomainError::JointIndexingUnsupported`] if the indexer's
    /// cardinality does not fit a 32-bit index.
    pub fn joint(indexer: &JointDomainIndexer) -> Result<Self> {
        let layout = indexer.joint_layout()?.clone();
        Ok(Self::from_repr(DomainRepr::Joint(JointElements {
            indexer: indexer.clone(),
            layout,
        })))
    }

    /// A joint domain over `domains` in order.
    pub fn joint_of(domains: &[DiscreteDomain]) -> Result<Self> {
        Self::joint(&JointDomainIndexer::new(domains)?)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Number of elements.
    pub fn size(&self) -> usize {
        match &self.0.repr {
            DomainRepr::IntRange(r) => r.size(),
            DomainRepr::RealRange(r) => r.size(),
            DomainRepr::Enumeration(names) => names.len(),
            DomainRepr::Array(a) => a.values.len(),
            DomainRepr::Joint(j) => j.layout.cardinality(),
        }
    }

    pub fn kind(&self) -> DomainKind {
        match &self.0.repr {
            DomainRepr::IntRange(_) => DomainKind::IntRange,
            DomainRepr::RealRange(_) => DomainKind::RealRange,
            DomainRepr::Enumeration(_) => DomainKind::Enumeration,
            DomainRepr::Array(_) => DomainKind::Array,
            DomainRepr::Joint(_) => DomainKind::Joint,
        }
    }

    /// Element at `index`.
    ///
    /// # Panics
    /// Panics if `index` is not in `[0, size())`.
    pub fn value_at(&self, index: usize) -> DomainValue {
        let size = self.size();
        assert!(
            index < size,
            "Index '{index}' is not in range [0,{}]",
            size as i64 - 1
        );
        match &self.0.repr {
            DomainRepr::IntRange(r) => DomainValue::Int(r.value_at(index)),
            DomainRepr::RealRange(r) => DomainValue::Real(r.value_at(index)),
            DomainRepr::Enumeration(names) => {
                DomainValue::Symbol(Symbol::new(index, names[index].clone()))
            }
            DomainRepr::Array(a) => a.values[index].clone(),
            DomainRepr::Joint(j) => {
                let mut indices = vec![0; j.indexer.len()];
                j.layout.decode(index, &mut indices);
                DomainValue::tuple(j.indexer.elements_from_indices(&indices))
            }
        }
    }

    /// Index of `value`, or `None` if it is not an element.
    pub fn index_of(&self, value: &DomainValue) -> Option<usize> {
        match (&self.0.repr, value) {
            (DomainRepr::IntRange(r), DomainValue::Int(v)) => r.index_of(*v),
            (DomainRepr::RealRange(r), DomainValue::Real(v)) => r.index_of(*v),
            (DomainRepr::Enumeration(names), DomainValue::Symbol(s)) => names
                .get(s.ordinal())
                .filter(|name| *name == s.name_arc())
                .map(|_| s.ordinal()),
            (DomainRepr::Array(a), _) => a.lookup.get(value).copied(),
            (DomainRepr::Joint(j), DomainValue::Tuple(elements)) => {
                if elements.len() != j.indexer.len() {
                    return None;
                }
                let mut joint = 0;
                for ((domain, element), stride) in j
                    .indexer
                    .domains()
                    .iter()
                    .zip(elements.iter())
                    .zip(j.layout.strides())
                {
                    joint += domain.index_of(element)? * stride;
                }
                Some(joint)
            }
            _ => None,
        }
    }

    /// Like [`index_of`](Self::index_of) but fails for non-members.
    ///
    /// # Errors
    /// Returns [`DomainError::NotAMember`] if `value` is not an element.
    pub fn index_or_err(&self, value: &DomainValue) -> Result<usize> {
        self.index_of(value)
            .ok_or_else(|| DomainError::NotAMember {
                value: value.to_string(),
            })
    }

    pub fn contains(&self, value: &DomainValue) -> bool {
        self.index_of(value).is_some()
    }

    /// All elements in index order.
    pub fn elements(&self) -> Vec<DomainValue> {
        (0..self.size()).map(|i| self.value_at(i)).collect()
    }

    /// True if every element is an integer.
    pub fn is_integral(&self) -> bool {
        match &self.0.repr {
            DomainRepr::IntRange(_) => true,
            DomainRepr::Array(a) => matches!(a.values[0], DomainValue::Int(_)),
            _ => false,
        }
    }

    /// True if every element is an integer or a real.
    pub fn is_numeric(&self) -> bool {
        match &self.0.repr {
            DomainRepr::IntRange(_) | DomainRepr::RealRange(_) => true,
            DomainRepr::Array(a) => {
                matches!(a.values[0], DomainValue::Int(_) | DomainValue::Real(_))
            }
            _ => false,
        }
    }

    pub fn as_int_range(&self) -> Option<&IntRange> {
        match &self.0.repr {
            DomainRepr::IntRange(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_real_range(&self) -> Option<&RealRange> {
        match &self.0.repr {
            DomainRepr::RealRange(r) => Some(r),
            _ => None,
        }
    }

    /// Component indexer of a joint domain.
    pub fn joint_indexer(&self) -> Option<&JointDomainIndexer> {
        match &self.0.repr {
            DomainRepr::Joint(j) => Some(&j.indexer),
            _ => None,
        }
    }

    /// Precomputed structural hash.
    pub fn hash_code(&self) -> u64 {
        self.0.hash
    }

    /// True if both handles share the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

// ============================================================================
// Representation detection
// ============================================================================

fn detect_int_range(values: &[DomainValue]) -> Option<IntRange> {
    let ints: Vec<i64> = values.iter().filter_map(DomainValue::as_int).collect();
    let first = ints[0];
    let last = ints[ints.len() - 1];
    if ints.len() == 1 {
        return IntRange::new(first, first, 1).ok();
    }
    let interval = ints[1].checked_sub(first)?;
    if interval <= 0 {
        return None;
    }
    let constant = ints
        .windows(2)
        .all(|w| w[1].checked_sub(w[0]) == Some(interval));
    if !constant {
        return None;
    }
    IntRange::new(first, last, interval).ok()
}

fn detect_real_range(values: &[DomainValue]) -> Option<RealRange> {
    let reals: Vec<f64> = values.iter().filter_map(DomainValue::as_real).collect();
    if reals.len() < 2 {
        return None;
    }
    let first = reals[0];
    let interval = reals[1] - first;
    if !(interval > 0.0) || !interval.is_finite() {
        return None;
    }
    let tolerance = (interval * REAL_RANGE_TOLERANCE.get()).abs();
    let on_grid = reals
        .iter()
        .enumerate()
        .all(|(i, v)| (first + i as f64 * interval - v).abs() <= tolerance);
    if !on_grid {
        return None;
    }
    let range = RealRange::with_tolerance(first, reals[reals.len() - 1], interval, tolerance).ok()?;
    (range.size() == reals.len()).then_some(range)
}

fn detect_enumeration(values: &[DomainValue]) -> Option<Box<[Arc<str>]>> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| match v {
            DomainValue::Symbol(s) if s.ordinal() == i => Some(s.name_arc().clone()),
            _ => None,
        })
        .collect()
}

impl ArrayValues {
    fn new(values: Vec<DomainValue>) -> Result<Self> {
        let mut lookup = HashMap::with_capacity(values.len());
        for (position, value) in values.iter().enumerate() {
            if lookup.insert(value.clone(), position).is_some() {
                return Err(DomainError::DuplicateValue {
                    position,
                    value: value.to_string(),
                });
            }
        }
        if values.len() as u64 > crate::range::MAX_DOMAIN_SIZE {
            return Err(DomainError::DomainTooLarge {
                size: values.len() as u64,
            });
        }
        Ok(Self {
            values: values.into_boxed_slice(),
            lookup,
        })
    }
}

// ============================================================================
// Equality, hashing, formatting
// ============================================================================

impl PartialEq for DomainRepr {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DomainRepr::IntRange(a), DomainRepr::IntRange(b)) => a == b,
            (DomainRepr::RealRange(a), DomainRepr::RealRange(b)) => a == b,
            (DomainRepr::Enumeration(a), DomainRepr::Enumeration(b)) => a == b,
            (DomainRepr::Array(a), DomainRepr::Array(b)) => a.values == b.values,
            (DomainRepr::Joint(a), DomainRepr::Joint(b)) => a.indexer == b.indexer,
            _ => false,
        }
    }
}

impl PartialEq for DiscreteDomain {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.0.hash == other.0.hash && self.0.repr == other.0.repr)
    }
}

impl Eq for DiscreteDomain {}

impl Hash for DiscreteDomain {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.0.hash);
    }
}

impl fmt::Debug for DiscreteDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.repr {
            DomainRepr::IntRange(r) => write!(
                f,
                "IntRange({}..={} step {})",
                r.lower(),
                r.upper(),
                r.interval()
            ),
            DomainRepr::RealRange(r) => write!(
                f,
                "RealRange({}, {} elements, step {})",
                r.lower(),
                r.size(),
                r.interval()
            ),
            DomainRepr::Enumeration(names) => write!(f, "Enumeration({names:?})"),
            DomainRepr::Array(a) => write!(f, "Array({} elements)", a.values.len()),
            DomainRepr::Joint(j) => write!(f, "Joint({:?})", j.indexer),
        }
    }
}

impl fmt::Display for DiscreteDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SHOWN: usize = 10;
        let size = self.size();
        write!(f, "DiscreteDomain - {size} elements - ")?;
        for i in 0..size.min(SHOWN) {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", self.value_at(i))?;
        }
        if size > SHOWN {
            write!(f, ", ...")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_bijection(d: &DiscreteDomain) {
        for i in 0..d.size() {
            let v = d.value_at(i);
            assert_eq!(d.index_of(&v), Some(i), "element {v} of {d:?}");
        }
    }

    #[test]
    fn test_detect_int_range() {
        let d = DiscreteDomain::from_values([0i64, 2, 4, 6]).unwrap();
        assert_eq!(d.kind(), DomainKind::IntRange);
        assert_eq!(d.size(), 4);
        assert_eq!(d, DiscreteDomain::int_range(0, 6, 2).unwrap());
        assert!(d.is_integral());
        check_bijection(&d);

        let single = DiscreteDomain::from_values([5i64]).unwrap();
        assert_eq!(single.kind(), DomainKind::IntRange);
        assert_eq!(single.value_at(0), DomainValue::Int(5));
    }

    #[test]
    fn test_irregular_ints_use_array() {
        let d = DiscreteDomain::from_values([3i64, 1, 2]).unwrap();
        assert_eq!(d.kind(), DomainKind::Array);
        assert_eq!(d.index_of(&DomainValue::Int(1)), Some(1));
        assert_eq!(d.index_of(&DomainValue::Int(4)), None);
        assert!(d.is_integral());
        check_bijection(&d);
    }

    #[test]
    fn test_detect_real_range() {
        let d = DiscreteDomain::from_values([0.0, 0.1, 0.2, 0.30000000000000004]).unwrap();
        assert_eq!(d.kind(), DomainKind::RealRange);
        assert_eq!(d.size(), 4);
        assert_eq!(d.index_of(&DomainValue::Real(0.3)), Some(3));
        assert!(d.is_numeric());
        assert!(!d.is_integral());
        check_bijection(&d);

        let uneven = DiscreteDomain::from_values([0.0, 0.1, 0.25]).unwrap();
        assert_eq!(uneven.kind(), DomainKind::Array);
    }

    #[test]
    fn test_signed_zero_array() {
        let d = DiscreteDomain::from_values([-1.5, 0.0, 2.0]).unwrap();
        assert_eq!(d.kind(), DomainKind::Array);
        assert_eq!(d.index_of(&DomainValue::Real(0.0)), Some(1));
        assert_eq!(d.index_of(&DomainValue::Real(-0.0)), Some(1));

        let negative = DiscreteDomain::from_values([-0.0, 3.0, 7.0]).unwrap();
        assert_eq!(negative.index_of(&DomainValue::Real(0.0)), Some(0));

        assert!(matches!(
            DiscreteDomain::from_values([0.0, -0.0, 1.5]),
            Err(DomainError::DuplicateValue { position: 1, .. })
        ));
    }

    #[test]
    fn test_enumeration() {
        let colors = DiscreteDomain::enumeration(&["red", "green", "blue"]).unwrap();
        assert_eq!(colors.kind(), DomainKind::Enumeration);
        let green = Symbol::new(1, "green");
        assert_eq!(colors.index_of(&DomainValue::Symbol(green.clone())), Some(1));
        assert_eq!(colors.index_of(&DomainValue::Symbol(Symbol::new(2, "green"))), None);
        assert_eq!(colors.index_of(&DomainValue::from("green")), None);
        check_bijection(&colors);

        let detected = DiscreteDomain::from_values(colors.elements()).unwrap();
        assert_eq!(detected.kind(), DomainKind::Enumeration);
        assert_eq!(detected, colors);

        let out_of_order = DiscreteDomain::from_values([green, Symbol::new(0, "red")]).unwrap();
        assert_eq!(out_of_order.kind(), DomainKind::Array);
    }

    #[test]
    fn test_text_and_boolean() {
        let d = DiscreteDomain::from_values(["x", "y"]).unwrap();
        assert_eq!(d.kind(), DomainKind::Array);
        assert_eq!(d.index_or_err(&DomainValue::from("y")).unwrap(), 1);
        assert_eq!(
            d.index_or_err(&DomainValue::from("z")),
            Err(DomainError::NotAMember {
                value: "z".to_string()
            })
        );
        assert!(!d.is_numeric());

        let b = DiscreteDomain::boolean();
        assert_eq!(b, DiscreteDomain::from_values([false, true]).unwrap());
        assert!(b.contains(&DomainValue::Bool(true)));

        let bit = DiscreteDomain::bit();
        assert_eq!(bit, DiscreteDomain::range(0, 1).unwrap());
    }

    #[test]
    fn test_order_matters_for_equality() {
        let a = DiscreteDomain::from_values(["x", "y"]).unwrap();
        let b = DiscreteDomain::from_values(["y", "x"]).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, DiscreteDomain::from_values(["x", "y"]).unwrap());
        assert_eq!(a.hash_code(), DiscreteDomain::from_values(["x", "y"]).unwrap().hash_code());
    }

    #[test]
    fn test_construction_errors() {
        let empty: [i64; 0] = [];
        assert_eq!(DiscreteDomain::from_values(empty), Err(DomainError::EmptyDomain));
        assert!(matches!(
            DiscreteDomain::from_values([DomainValue::Int(1), DomainValue::Real(2.0)]),
            Err(DomainError::HeterogeneousValues { position: 1, .. })
        ));
        assert!(matches!(
            DiscreteDomain::from_values(["a", "b", "a"]),
            Err(DomainError::DuplicateValue { position: 2, .. })
        ));
        assert!(matches!(
            DiscreteDomain::enumeration(&["a", "a"]),
            Err(DomainError::DuplicateValue { position: 1, .. })
        ));
    }

    #[test]
    fn test_joint_domain() {
        let a = DiscreteDomain::int_range(0, 6, 2).unwrap();
        let b = DiscreteDomain::from_values(["x", "y"]).unwrap();
        let joint = DiscreteDomain::joint_of(&[a, b]).unwrap();
        assert_eq!(joint.kind(), DomainKind::Joint);
        assert_eq!(joint.size(), 8);

        let v = joint.value_at(6);
        assert_eq!(
            v,
            DomainValue::tuple(vec![DomainValue::Int(4), DomainValue::from("y")])
        );
        assert_eq!(joint.index_of(&v), Some(6));
        assert_eq!(
            joint.index_of(&DomainValue::tuple(vec![DomainValue::Int(4)])),
            None
        );
        check_bijection(&joint);
    }

    #[test]
    #[should_panic(expected = "not in range")]
    fn test_value_at_out_of_range() {
        let d = DiscreteDomain::bit();
        let _ = d.value_at(2);
    }

    #[test]
    fn test_display() {
        let d = DiscreteDomain::from_values(["x", "y"]).unwrap();
        assert_eq!(d.to_string(), "DiscreteDomain - 2 elements - x, y");
    }
}
