use crate::common::Value;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use std::cmp::Ordering;

/// Compare two floats for equality, treating NaN as equal to NaN.
#[inline]
pub(crate) fn num_eq_float(a: f64, b: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        true
    } else {
        a == b
    }
}

/// Compare two floats with a total order; NaN sorts after every number.
#[inline]
pub(crate) fn num_cmp_float(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Parses the decimal text of a string operand.
#[inline]
pub(crate) fn parse_decimal(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

fn numbers_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => num_eq_float(x, y),
        _ => false,
    }
}

fn numbers_cmp(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => num_cmp_float(x, y),
        _ => Ordering::Equal,
    }
}

fn string_equals_number(text: &str, number: &Value) -> bool {
    match (parse_decimal(text), number.as_f64()) {
        (Some(parsed), Some(n)) => num_eq_float(parsed, n),
        _ => false,
    }
}

fn string_equals_enum(text: &str, name: &str) -> bool {
    text == name || text.to_lowercase() == name.to_lowercase()
}

/// Type-coercing equality used by query predicates and array operators.
///
/// * both null: equal; exactly one null: not equal
/// * both numeric: compared as `f64` regardless of width
/// * same variant: structural equality
/// * string against number: the string is parsed as a decimal; text that
///   does not parse is simply not equal
/// * string against identifier: string forms are compared
/// * string against enum: symbolic name, then case-insensitively
///
/// Any other pairing has no coercion path and fails with
/// [ErrorKind::TypeMismatch].
pub fn compare_equals(a: &Value, b: &Value) -> StoreResult<bool> {
    match (a, b) {
        (Value::Null, Value::Null) => Ok(true),
        (Value::Null, _) | (_, Value::Null) => Ok(false),
        _ if a.is_number() && b.is_number() => Ok(numbers_equal(a, b)),
        (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
        (Value::String(x), Value::String(y)) => Ok(x == y),
        (Value::Id(x), Value::Id(y)) => Ok(x == y),
        (Value::Enum(x), Value::Enum(y)) => Ok(x == y),
        (Value::Array(_), Value::Array(_)) | (Value::Document(_), Value::Document(_)) => {
            Ok(a == b)
        }
        (Value::String(text), number) | (number, Value::String(text)) if number.is_number() => {
            Ok(string_equals_number(text, number))
        }
        (Value::String(text), Value::Id(id)) | (Value::Id(id), Value::String(text)) => {
            Ok(*text == id.to_string())
        }
        (Value::String(text), Value::Enum(name)) | (Value::Enum(name), Value::String(text)) => {
            Ok(string_equals_enum(text, name))
        }
        _ => {
            log::error!(
                "Cannot compare {} value {} with {} value {}",
                a.type_name(),
                a,
                b.type_name(),
                b
            );
            Err(StoreError::new(
                &format!(
                    "Cannot compare {} with {}",
                    a.type_name(),
                    b.type_name()
                ),
                ErrorKind::TypeMismatch,
            ))
        }
    }
}

/// Pairwise ordering used by range predicates, `Min`/`Max` updates and
/// index range scans. ORDER BY uses [compare_for_ordering], which stays
/// transitive on fields mixing numbers and non-numeric strings.
///
/// Null sorts after everything. Numbers compare numerically, with NaN after
/// every other number. A number and a string compare numerically when the
/// string parses as a decimal, lexically by string form otherwise. Values of
/// the same comparable variant use their natural order; every other pairing
/// compares the string forms of both operands.
pub fn compare_for_sort(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        _ if a.is_number() && b.is_number() => numbers_cmp(a, b),
        (Value::String(text), number) if number.is_number() => {
            match (parse_decimal(text), number.as_f64()) {
                (Some(x), Some(y)) => num_cmp_float(x, y),
                _ => lexical(a, b),
            }
        }
        (number, Value::String(text)) if number.is_number() => {
            match (number.as_f64(), parse_decimal(text)) {
                (Some(x), Some(y)) => num_cmp_float(x, y),
                _ => lexical(a, b),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Id(x), Value::Id(y)) => x.cmp(y),
        (Value::Enum(x), Value::Enum(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (left, right) in x.iter().zip(y.iter()) {
                let ordering = compare_for_sort(left, right);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => lexical(a, b),
    }
}

#[inline]
fn lexical(a: &Value, b: &Value) -> Ordering {
    a.to_string().cmp(&b.to_string())
}

/// Groups of values in an ORDER BY. Values of different groups order by
/// group alone; null is last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SortClass {
    Number,
    Text,
    Bool,
    Id,
    Enum,
    Array,
    Document,
    Null,
}

fn sort_class(value: &Value, numeric_text: bool) -> SortClass {
    match value {
        Value::Null => SortClass::Null,
        Value::I32(_) | Value::I64(_) | Value::F64(_) => SortClass::Number,
        Value::String(text) if numeric_text && parse_decimal(text).is_some() => SortClass::Number,
        Value::String(_) => SortClass::Text,
        Value::Bool(_) => SortClass::Bool,
        Value::Id(_) => SortClass::Id,
        Value::Enum(_) => SortClass::Enum,
        Value::Array(_) => SortClass::Array,
        Value::Document(_) => SortClass::Document,
    }
}

fn sort_number(value: &Value) -> f64 {
    match value {
        Value::String(text) => parse_decimal(text).unwrap_or(f64::NAN),
        other => other.as_f64().unwrap_or(f64::NAN),
    }
}

/// Total order used by ORDER BY.
///
/// Agrees with [compare_for_sort] on any field holding a single kind of
/// value. Mixed fields are grouped by kind first (numbers, then strings,
/// then the rest, null last) so the order stays transitive. With
/// `numeric_text` set, strings that parse as decimals join the numbers;
/// sorts enable it for a key when the key holds at least one number.
pub fn compare_for_ordering(a: &Value, b: &Value, numeric_text: bool) -> Ordering {
    let class = sort_class(a, numeric_text);
    let other = sort_class(b, numeric_text);
    if class != other {
        return class.cmp(&other);
    }
    match (class, a, b) {
        (SortClass::Number, _, _) => num_cmp_float(sort_number(a), sort_number(b)),
        (SortClass::Array, Value::Array(x), Value::Array(y)) => {
            for (left, right) in x.iter().zip(y.iter()) {
                let ordering = compare_for_ordering(left, right, numeric_text);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        (SortClass::Document, _, _) => lexical(a, b),
        _ => compare_for_sort(a, b),
    }
}
