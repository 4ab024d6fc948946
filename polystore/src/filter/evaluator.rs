use crate::collection::Document;
use crate::common::{compare_equals, compare_for_sort, Value};
use crate::errors::StoreResult;
use crate::filter::{Condition, Predicate};
use std::cmp::Ordering;

static NULL: Value = Value::Null;

/// Evaluates `condition` against one document.
///
/// Field paths are navigated with `separator`; an absent field reads as
/// null. Combinators short-circuit left to right. A type mismatch raised by
/// [`compare_equals`] propagates.
pub fn matches(condition: &Condition, document: &Document, separator: &str) -> StoreResult<bool> {
    match condition {
        Condition::Field { path, predicate } => {
            let value = document.get_path(path, separator).unwrap_or(&NULL);
            test_predicate(predicate, value)
        }
        Condition::And(children) => {
            for child in children {
                if !matches(child, document, separator)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Condition::Or(children) => {
            for child in children {
                if matches(child, document, separator)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

/// Tests one field value against a predicate.
pub fn test_predicate(predicate: &Predicate, value: &Value) -> StoreResult<bool> {
    match predicate {
        Predicate::Eq(operand) => compare_equals(value, operand),
        Predicate::Ne(operand) => Ok(!compare_equals(value, operand)?),
        Predicate::Gt(operand) => Ok(ranged(value, |v| compare_for_sort(v, operand).is_gt())),
        Predicate::Gte(operand) => Ok(ranged(value, |v| compare_for_sort(v, operand).is_ge())),
        Predicate::Lt(operand) => Ok(ranged(value, |v| compare_for_sort(v, operand).is_lt())),
        Predicate::Lte(operand) => Ok(ranged(value, |v| compare_for_sort(v, operand).is_le())),
        Predicate::Between {
            lower,
            upper,
            lower_inclusive,
            upper_inclusive,
        } => Ok(ranged(value, |v| {
            within_lower(compare_for_sort(v, lower), *lower_inclusive)
                && within_upper(compare_for_sort(v, upper), *upper_inclusive)
        })),
        Predicate::In(operands) => any_equal(value, operands),
        Predicate::NotIn(operands) => Ok(!any_equal(value, operands)?),
        Predicate::StartsWith(prefix) => Ok(value.as_str().is_some_and(|s| s.starts_with(prefix.as_str()))),
        Predicate::EndsWith(suffix) => Ok(value.as_str().is_some_and(|s| s.ends_with(suffix.as_str()))),
        Predicate::Contains(operand) => contains(value, operand),
        Predicate::Regex(pattern) => match value {
            Value::String(text) => Ok(pattern.regex()?.is_match(text)),
            _ => Ok(false),
        },
    }
}

/// Range predicates never match a null field.
#[inline]
fn ranged(value: &Value, test: impl FnOnce(&Value) -> bool) -> bool {
    !value.is_null() && test(value)
}

#[inline]
fn within_lower(ordering: Ordering, inclusive: bool) -> bool {
    ordering.is_gt() || (inclusive && ordering.is_eq())
}

#[inline]
fn within_upper(ordering: Ordering, inclusive: bool) -> bool {
    ordering.is_lt() || (inclusive && ordering.is_eq())
}

fn any_equal(value: &Value, operands: &[Value]) -> StoreResult<bool> {
    for operand in operands {
        if compare_equals(value, operand)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn contains(value: &Value, operand: &Value) -> StoreResult<bool> {
    match (value, operand) {
        (Value::String(text), Value::String(needle)) => Ok(text.contains(needle.as_str())),
        (Value::Array(items), _) => any_equal(operand, items),
        _ => Ok(false),
    }
}
