//! Type-erased domain element values.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A named enumeration constant with its declaration ordinal.
///
/// Domains whose values are symbols with ordinals `0..N` in declaration
/// order are stored as compact enumerations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    ordinal: usize,
    name: Arc<str>,
}

impl Symbol {
    /// Create a symbol with the given ordinal and name.
    pub fn new(ordinal: usize, name: impl Into<Arc<str>>) -> Self {
        Self {
            ordinal,
            name: name.into(),
        }
    }

    /// Declaration ordinal of the symbol.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Name of the symbol.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> &Arc<str> {
        &self.name
    }
}

/// A single element of a discrete domain.
///
/// Values of one domain all share the same variant. Real values compare
/// numerically for the purpose of equality and hashing, so `0.0` and `-0.0`
/// are the same element.
#[derive(Debug, Clone)]
pub enum DomainValue {
    Int(i64),
    Real(f64),
    Bool(bool),
    Text(Arc<str>),
    Symbol(Symbol),
    /// An element of a joint domain: one value per component domain.
    Tuple(Arc<[DomainValue]>),
}

/// Bit pattern used for equality and hashing of reals.
pub(crate) fn real_key(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else if value.is_nan() {
        f64::NAN.to_bits()
    } else {
        value.to_bits()
    }
}

impl DomainValue {
    /// Name of the value variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            DomainValue::Int(_) => "int",
            DomainValue::Real(_) => "real",
            DomainValue::Bool(_) => "bool",
            DomainValue::Text(_) => "text",
            DomainValue::Symbol(_) => "symbol",
            DomainValue::Tuple(_) => "tuple",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            DomainValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            DomainValue::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DomainValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DomainValue::Text(v) => Some(v),
            DomainValue::Symbol(s) => Some(s.name()),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[DomainValue]> {
        match self {
            DomainValue::Tuple(v) => Some(v),
            _ => None,
        }
    }

    /// Build a tuple value from its components.
    pub fn tuple(values: impl Into<Vec<DomainValue>>) -> Self {
        DomainValue::Tuple(Arc::from(values.into()))
    }
}

impl PartialEq for DomainValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DomainValue::Int(a), DomainValue::Int(b)) => a == b,
            (DomainValue::Real(a), DomainValue::Real(b)) => real_key(*a) == real_key(*b),
            (DomainValue::Bool(a), DomainValue::Bool(b)) => a == b,
            (DomainValue::Text(a), DomainValue::Text(b)) => a == b,
            (DomainValue::Symbol(a), DomainValue::Symbol(b)) => a == b,
            (DomainValue::Tuple(a), DomainValue::Tuple(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for DomainValue {}

impl Hash for DomainValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            DomainValue::Int(v) => v.hash(state),
            DomainValue::Real(v) => real_key(*v).hash(state),
            DomainValue::Bool(v) => v.hash(state),
            DomainValue::Text(v) => v.hash(state),
            DomainValue::Symbol(v) => v.hash(state),
            DomainValue::Tuple(v) => v.hash(state),
        }
    }
}

impl fmt::Display for DomainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainValue::Int(v) => write!(f, "{v}"),
            DomainValue::Real(v) => write!(f, "{v}"),
            DomainValue::Bool(v) => write!(f, "{v}"),
            DomainValue::Text(v) => write!(f, "{v}"),
            DomainValue::Symbol(v) => write!(f, "{}", v.name()),
            DomainValue::Tuple(values) => {
                write!(f, "(")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl From<i64> for DomainValue {
    fn from(v: i64) -> Self {
        DomainValue::Int(v)
    }
}

impl From<i32> for DomainValue {
    fn from(v: i32) -> Self {
        DomainValue::Int(i64::from(v))
    }
}

impl From<f64> for DomainValue {
    fn from(v: f64) -> Self {
        DomainValue::Real(v)
    }
}

impl From<bool> for DomainValue {
    fn from(v: bool) -> Self {
        DomainValue::Bool(v)
    }
}

impl From<&str> for DomainValue {
    fn from(v: &str) -> Self {
        DomainValue::Text(Arc::from(v))
    }
}

impl From<String> for DomainValue {
    fn from(v: String) -> Self {
        DomainValue::Text(Arc::from(v))
    }
}

impl From<Symbol> for DomainValue {
    fn from(v: Symbol) -> Self {
        DomainValue::Symbol(v)
    }
}

impl From<Vec<DomainValue>> for DomainValue {
    fn from(v: Vec<DomainValue>) -> Self {
        DomainValue::tuple(v)
    }
}
