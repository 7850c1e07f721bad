use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::rc::Rc;
use thiserror::Error;

pub mod dimension;
pub mod frame;
pub mod group;
pub mod record_store;

/// Hard cap on dimensions per frame: one filter-mask bit each in a `u32`.
pub const MAX_DIMENSIONS: usize = 32;

/// Error type used across the crate
#[derive(Debug, Error)]
pub enum FacetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("data format error in column '{column}', row {row}: {value:?}")]
    DataFormat {
        column: String,
        row: usize,
        value: String,
    },

    #[error("missing column: {0}")]
    MissingColumn(String),

    #[error("dimension '{0}' has no total key order")]
    UndefinedKeyOrder(String),

    #[error("dimension limit reached (max {MAX_DIMENSIONS})")]
    DimensionLimit,

    #[error("parse error: {0}")]
    Parse(String),
}

/// Grouping/filtering key produced by a dimension's key function.
///
/// Scalar variants or an ordered tuple of scalars (used by the correlation
/// dimensions, e.g. `[yrs_service, salary, rank, sex]`). Floats compare and
/// hash by bit pattern so keys can live in hash maps.
#[derive(Debug, Clone)]
pub enum Key {
    Int(i64),
    Float(f64),
    Str(String),
    Composite(Vec<Key>),
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Int(a), Key::Int(b)) => a == b,
            (Key::Float(a), Key::Float(b)) => a.to_bits() == b.to_bits(),
            (Key::Str(a), Key::Str(b)) => a == b,
            (Key::Composite(a), Key::Composite(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Key::Int(v) => v.hash(state),
            Key::Float(v) => v.to_bits().hash(state),
            Key::Str(v) => v.hash(state),
            Key::Composite(v) => v.hash(state),
        }
    }
}

impl Key {
    /// Compare two keys, if they are comparable.
    ///
    /// Same-variant keys order naturally (floats by `total_cmp`, composites
    /// lexicographically); keys of different variants have no order.
    pub fn try_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Key::Int(a), Key::Int(b)) => Some(a.cmp(b)),
            (Key::Float(a), Key::Float(b)) => Some(a.total_cmp(b)),
            (Key::Str(a), Key::Str(b)) => Some(a.cmp(b)),
            (Key::Composite(a), Key::Composite(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.try_cmp(y)? {
                        Ordering::Equal => continue,
                        ord => return Some(ord),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            _ => None,
        }
    }

    /// True when both keys are the same variant (recursively for composites
    /// of equal arity), i.e. `try_cmp` is defined.
    pub fn same_kind(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Int(_), Key::Int(_))
            | (Key::Float(_), Key::Float(_))
            | (Key::Str(_), Key::Str(_)) => true,
            (Key::Composite(a), Key::Composite(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.same_kind(y))
            }
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Key::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Key::Int(v)
    }
}

impl From<f64> for Key {
    fn from(v: f64) -> Self {
        Key::Float(v)
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::Str(v.to_string())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Key::Str(v)
    }
}

impl From<Vec<Key>> for Key {
    fn from(v: Vec<Key>) -> Self {
        Key::Composite(v)
    }
}

/// Filter predicate attached to a dimension (zero or one at a time)
#[derive(Clone)]
pub enum FilterPredicate {
    Equals(Key),
    GreaterThan(Key),
    LessThan(Key),
    /// Inclusive low bound, exclusive high bound.
    Between(Key, Key),
    /// Arbitrary predicate over the key; filter-change cost degrades from
    /// binary-searched windows to a key scan (transitions only).
    Custom(Rc<dyn Fn(&Key) -> bool>),
}

impl fmt::Debug for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterPredicate::Equals(k) => f.debug_tuple("Equals").field(k).finish(),
            FilterPredicate::GreaterThan(k) => f.debug_tuple("GreaterThan").field(k).finish(),
            FilterPredicate::LessThan(k) => f.debug_tuple("LessThan").field(k).finish(),
            FilterPredicate::Between(lo, hi) => {
                f.debug_tuple("Between").field(lo).field(hi).finish()
            }
            FilterPredicate::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl FilterPredicate {
    /// Whether this predicate needs a key order to be evaluated.
    pub(crate) fn needs_order(&self) -> bool {
        matches!(
            self,
            FilterPredicate::GreaterThan(_)
                | FilterPredicate::LessThan(_)
                | FilterPredicate::Between(_, _)
        )
    }

    pub(crate) fn matches(&self, key: &Key) -> bool {
        match self {
            FilterPredicate::Equals(k) => key == k,
            FilterPredicate::GreaterThan(k) => {
                key.try_cmp(k).is_some_and(|o| o == Ordering::Greater)
            }
            FilterPredicate::LessThan(k) => key.try_cmp(k).is_some_and(|o| o == Ordering::Less),
            FilterPredicate::Between(lo, hi) => {
                key.try_cmp(lo).is_some_and(|o| o != Ordering::Less)
                    && key.try_cmp(hi).is_some_and(|o| o == Ordering::Less)
            }
            FilterPredicate::Custom(pred) => pred(key),
        }
    }
}

/// One `{key, value}` entry of a group snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow<A> {
    pub key: Key,
    pub value: A,
}
