use crate::collection::{Document, UpdateOperation};
use crate::common::{compare_equals, compare_for_sort, current_iso_timestamp, NumericKind, Value};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use std::cmp::Ordering;

/// Applies update operations to one document's field map.
///
/// Operations run strictly in order against the same document, so later
/// operations observe earlier ones. The evaluator does not check for
/// duplicate targets; callers validate the batch first.
pub(crate) struct UpdateEvaluator<'a> {
    separator: &'a str,
}

impl<'a> UpdateEvaluator<'a> {
    pub fn new(separator: &'a str) -> Self {
        UpdateEvaluator { separator }
    }

    /// Applies every operation and reports whether the document changed.
    ///
    /// On error the document may hold the effects of the operations that ran
    /// before the failing one; callers apply updates to a copy.
    pub fn apply(&self, document: &mut Document, operations: &[UpdateOperation]) -> StoreResult<bool> {
        let mut changed = false;
        for operation in operations {
            changed |= self.apply_one(document, operation)?;
        }
        Ok(changed)
    }

    fn apply_one(&self, document: &mut Document, operation: &UpdateOperation) -> StoreResult<bool> {
        match operation {
            UpdateOperation::Set { field, value } => self.set(document, field, value),
            UpdateOperation::Unset { field } => {
                Ok(document.remove_path(field, self.separator).is_some())
            }
            UpdateOperation::Increment { field, delta } => self.increment(document, field, delta),
            UpdateOperation::Multiply { field, factor } => self.multiply(document, field, factor),
            UpdateOperation::Min { field, value } => {
                self.replace_if(document, field, value, Ordering::Less)
            }
            UpdateOperation::Max { field, value } => {
                self.replace_if(document, field, value, Ordering::Greater)
            }
            UpdateOperation::CurrentDate { field } => {
                let now = Value::String(current_iso_timestamp());
                document.set_path(field, self.separator, now)?;
                Ok(true)
            }
            UpdateOperation::Push { field, values } => self.push(document, field, values),
            UpdateOperation::PopFirst { field } => self.pop(document, field, true),
            UpdateOperation::PopLast { field } => self.pop(document, field, false),
            UpdateOperation::Pull { field, value } => {
                self.pull(document, field, std::slice::from_ref(value))
            }
            UpdateOperation::PullAll { field, values } => self.pull(document, field, values),
            UpdateOperation::AddToSet { field, values } => self.add_to_set(document, field, values),
        }
    }

    fn current<'d>(&self, document: &'d Document, field: &str) -> &'d Value {
        static NULL: Value = Value::Null;
        document.get_path(field, self.separator).unwrap_or(&NULL)
    }

    fn set(&self, document: &mut Document, field: &str, value: &Value) -> StoreResult<bool> {
        if self.current(document, field) == value {
            return Ok(false);
        }
        document.set_path(field, self.separator, value.clone())?;
        Ok(true)
    }

    fn increment(&self, document: &mut Document, field: &str, delta: &Value) -> StoreResult<bool> {
        let current = self.current(document, field);
        let result = match current {
            Value::Null => {
                require_numeric(field, delta, "Increment")?;
                delta.clone()
            }
            _ => add_numbers(field, current, delta)?,
        };
        document.set_path(field, self.separator, result)?;
        Ok(true)
    }

    fn multiply(&self, document: &mut Document, field: &str, factor: &Value) -> StoreResult<bool> {
        let factor = require_numeric(field, factor, "Multiply")?;
        let current = match self.current(document, field) {
            Value::Null => 1.0,
            value => require_numeric(field, value, "Multiply")?,
        };
        document.set_path(field, self.separator, Value::F64(current * factor))?;
        Ok(true)
    }

    /// Min and Max: an absent field is set; otherwise the field is replaced
    /// only when the candidate orders strictly `wanted` relative to it.
    fn replace_if(
        &self,
        document: &mut Document,
        field: &str,
        candidate: &Value,
        wanted: Ordering,
    ) -> StoreResult<bool> {
        let current = self.current(document, field);
        if !current.is_null() && compare_for_sort(candidate, current) != wanted {
            return Ok(false);
        }
        document.set_path(field, self.separator, candidate.clone())?;
        Ok(true)
    }

    fn push(&self, document: &mut Document, field: &str, values: &[Value]) -> StoreResult<bool> {
        match self.list_at(document, field, "Push")? {
            Some(list) => list.extend(values.iter().cloned()),
            None => {
                document.set_path(field, self.separator, Value::Array(values.to_vec()))?;
            }
        }
        Ok(true)
    }

    fn pop(&self, document: &mut Document, field: &str, first: bool) -> StoreResult<bool> {
        let operation = if first { "PopFirst" } else { "PopLast" };
        match self.list_at(document, field, operation)? {
            Some(list) if !list.is_empty() => {
                if first {
                    list.remove(0);
                } else {
                    list.pop();
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn pull(&self, document: &mut Document, field: &str, targets: &[Value]) -> StoreResult<bool> {
        let list = match self.list_at(document, field, "Pull")? {
            Some(list) => list,
            None => return Ok(false),
        };

        // decide every element first so a type mismatch leaves the list intact
        let mut doomed = Vec::with_capacity(list.len());
        for item in list.iter() {
            doomed.push(equals_any(item, targets)?);
        }
        if !doomed.contains(&true) {
            return Ok(false);
        }

        let mut flags = doomed.into_iter();
        list.retain(|_| !flags.next().unwrap_or(false));
        Ok(true)
    }

    fn add_to_set(&self, document: &mut Document, field: &str, values: &[Value]) -> StoreResult<bool> {
        let existing = match self.list_at(document, field, "AddToSet")? {
            Some(list) => list,
            None => {
                let mut fresh = Vec::new();
                append_missing(&mut fresh, values)?;
                if fresh.is_empty() {
                    return Ok(false);
                }
                document.set_path(field, self.separator, Value::Array(fresh))?;
                return Ok(true);
            }
        };
        append_missing(existing, values)
    }

    /// The list stored at `field`; `None` when the field is absent or null.
    fn list_at<'d>(
        &self,
        document: &'d mut Document,
        field: &str,
        operation: &str,
    ) -> StoreResult<Option<&'d mut Vec<Value>>> {
        match document.get_path_mut(field, self.separator) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(list)) => Ok(Some(list)),
            Some(other) => {
                log::error!(
                    "{} on '{}' requires a list field, found {}",
                    operation,
                    field,
                    other.type_name()
                );
                Err(StoreError::new(
                    &format!(
                        "{} on '{}' requires a list field, found {}",
                        operation,
                        field,
                        other.type_name()
                    ),
                    ErrorKind::InvalidDataType,
                ))
            }
        }
    }
}

fn not_numeric(field: &str, value: &Value, operation: &str) -> StoreError {
    log::error!(
        "{} on '{}' requires numbers, found {}",
        operation,
        field,
        value.type_name()
    );
    StoreError::new(
        &format!(
            "{} on '{}' requires numbers, found {}",
            operation,
            field,
            value.type_name()
        ),
        ErrorKind::InvalidDataType,
    )
}

fn require_numeric(field: &str, value: &Value, operation: &str) -> StoreResult<f64> {
    value
        .as_f64()
        .ok_or_else(|| not_numeric(field, value, operation))
}

/// Adds two numbers in the wider of their kinds (`I32 < I64 < F64`).
/// Integer overflow widens to the next kind.
fn add_numbers(field: &str, current: &Value, delta: &Value) -> StoreResult<Value> {
    let current_kind = current
        .numeric_kind()
        .ok_or_else(|| not_numeric(field, current, "Increment"))?;
    let delta_kind = delta
        .numeric_kind()
        .ok_or_else(|| not_numeric(field, delta, "Increment"))?;

    let sum = match (current_kind.max(delta_kind), current.as_i64(), delta.as_i64()) {
        (NumericKind::Int, Some(a), Some(b)) => {
            let total = a + b;
            i32::try_from(total)
                .map(Value::I32)
                .unwrap_or(Value::I64(total))
        }
        (NumericKind::Long, Some(a), Some(b)) => a
            .checked_add(b)
            .map(Value::I64)
            .unwrap_or_else(|| Value::F64(a as f64 + b as f64)),
        _ => Value::F64(
            current.as_f64().unwrap_or_default() + delta.as_f64().unwrap_or_default(),
        ),
    };
    Ok(sum)
}

fn equals_any(item: &Value, targets: &[Value]) -> StoreResult<bool> {
    for target in targets {
        if compare_equals(item, target)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Appends each candidate not already equal to an element; reports whether
/// anything was appended.
fn append_missing(list: &mut Vec<Value>, candidates: &[Value]) -> StoreResult<bool> {
    let mut appended = false;
    for candidate in candidates {
        if !equals_any(candidate, list)? {
            list.push(candidate.clone());
            appended = true;
        }
    }
    Ok(appended)
}
