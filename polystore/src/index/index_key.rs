use crate::common::{num_cmp_float, Value};
use std::cmp::Ordering;
use std::fmt::{Debug, Formatter};
use uuid::Uuid;

/// The kind of an [IndexKey]. An index answers a query only when every key
/// it holds has the operand's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyKind {
    Bool = 0,
    Number = 1,
    Text = 2,
    Ident = 3,
    Symbol = 4,
}

impl KeyKind {
    pub(crate) const COUNT: usize = 5;

    #[inline]
    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

/// A normalized, totally ordered scalar key.
///
/// All numeric widths collapse into one `f64` key, so `5i32` and `5.0f64`
/// share a bucket exactly as they compare equal in queries. Within one kind
/// the order matches [`compare_for_sort`](crate::common::compare_for_sort).
#[derive(Clone)]
pub enum IndexKey {
    Bool(bool),
    Number(f64),
    Text(String),
    Ident(Uuid),
    Symbol(String),
}

/// What an index records for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum IndexEntry {
    Key(IndexKey),
    /// Lists and nested documents are tracked but not keyed.
    Unindexable,
}

impl IndexEntry {
    /// Normalizes a field value; null is never indexed.
    pub(crate) fn from_value(value: &Value) -> Option<IndexEntry> {
        match value {
            Value::Null => None,
            Value::Array(_) | Value::Document(_) => Some(IndexEntry::Unindexable),
            scalar => IndexKey::from_value(scalar).map(IndexEntry::Key),
        }
    }
}

impl IndexKey {
    /// Builds the key of a scalar value; `None` for null, lists and documents.
    pub fn from_value(value: &Value) -> Option<IndexKey> {
        match value {
            Value::Bool(b) => Some(IndexKey::Bool(*b)),
            Value::I32(_) | Value::I64(_) | Value::F64(_) => value.as_f64().map(IndexKey::Number),
            Value::String(s) => Some(IndexKey::Text(s.clone())),
            Value::Id(id) => Some(IndexKey::Ident(*id)),
            Value::Enum(name) => Some(IndexKey::Symbol(name.clone())),
            Value::Null | Value::Array(_) | Value::Document(_) => None,
        }
    }

    pub fn kind(&self) -> KeyKind {
        match self {
            IndexKey::Bool(_) => KeyKind::Bool,
            IndexKey::Number(_) => KeyKind::Number,
            IndexKey::Text(_) => KeyKind::Text,
            IndexKey::Ident(_) => KeyKind::Ident,
            IndexKey::Symbol(_) => KeyKind::Symbol,
        }
    }
}

impl Ord for IndexKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (IndexKey::Bool(a), IndexKey::Bool(b)) => a.cmp(b),
            (IndexKey::Number(a), IndexKey::Number(b)) => num_cmp_float(*a, *b),
            (IndexKey::Text(a), IndexKey::Text(b)) => a.cmp(b),
            (IndexKey::Ident(a), IndexKey::Ident(b)) => a.cmp(b),
            (IndexKey::Symbol(a), IndexKey::Symbol(b)) => a.cmp(b),
            _ => self.kind().cmp(&other.kind()),
        }
    }
}

impl PartialOrd for IndexKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for IndexKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for IndexKey {}

impl Debug for IndexKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexKey::Bool(b) => write!(f, "{}", b),
            IndexKey::Number(n) => write!(f, "{}", n),
            IndexKey::Text(s) => write!(f, "{:?}", s),
            IndexKey::Ident(id) => write!(f, "{}", id),
            IndexKey::Symbol(s) => write!(f, "#{}", s),
        }
    }
}
