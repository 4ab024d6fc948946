use crate::common::Value;
use crate::filter::{Condition, Predicate, RegexPattern};

/// Starts a fluent condition on `path`.
///
/// ```rust,ignore
/// use polystore::filter::field;
///
/// let condition = field("address.city").eq("Oslo");
/// let range = field("level").between(10, 20);
/// ```
pub fn field(path: &str) -> FluentCondition {
    FluentCondition {
        path: path.to_string(),
    }
}

/// Builds a leaf [Condition] for one field path.
pub struct FluentCondition {
    path: String,
}

impl FluentCondition {
    #[inline]
    fn leaf(self, predicate: Predicate) -> Condition {
        Condition::Field {
            path: self.path,
            predicate,
        }
    }

    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> Condition {
        self.leaf(Predicate::Eq(value.into()))
    }

    #[inline]
    pub fn ne<T: Into<Value>>(self, value: T) -> Condition {
        self.leaf(Predicate::Ne(value.into()))
    }

    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> Condition {
        self.leaf(Predicate::Gt(value.into()))
    }

    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> Condition {
        self.leaf(Predicate::Gte(value.into()))
    }

    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> Condition {
        self.leaf(Predicate::Lt(value.into()))
    }

    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> Condition {
        self.leaf(Predicate::Lte(value.into()))
    }

    /// Inclusive on both ends.
    #[inline]
    pub fn between<T: Into<Value>>(self, lower: T, upper: T) -> Condition {
        self.between_optional_inclusive(lower, upper, true, true)
    }

    /// Both ends inclusive or both exclusive.
    #[inline]
    pub fn between_inclusive<T: Into<Value>>(self, lower: T, upper: T, inclusive: bool) -> Condition {
        self.between_optional_inclusive(lower, upper, inclusive, inclusive)
    }

    pub fn between_optional_inclusive<T: Into<Value>>(
        self,
        lower: T,
        upper: T,
        lower_inclusive: bool,
        upper_inclusive: bool,
    ) -> Condition {
        self.leaf(Predicate::Between {
            lower: lower.into(),
            upper: upper.into(),
            lower_inclusive,
            upper_inclusive,
        })
    }

    pub fn in_array<T: Into<Value>>(self, values: Vec<T>) -> Condition {
        self.leaf(Predicate::In(values.into_iter().map(Into::into).collect()))
    }

    pub fn not_in_array<T: Into<Value>>(self, values: Vec<T>) -> Condition {
        self.leaf(Predicate::NotIn(values.into_iter().map(Into::into).collect()))
    }

    #[inline]
    pub fn starts_with(self, prefix: &str) -> Condition {
        self.leaf(Predicate::StartsWith(prefix.to_string()))
    }

    #[inline]
    pub fn ends_with(self, suffix: &str) -> Condition {
        self.leaf(Predicate::EndsWith(suffix.to_string()))
    }

    /// Substring match on string fields, element match on list fields.
    #[inline]
    pub fn contains<T: Into<Value>>(self, value: T) -> Condition {
        self.leaf(Predicate::Contains(value.into()))
    }

    #[inline]
    pub fn regex(self, pattern: &str) -> Condition {
        self.leaf(Predicate::Regex(RegexPattern::new(pattern)))
    }
}
