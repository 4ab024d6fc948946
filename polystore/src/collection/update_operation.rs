use crate::common::Value;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};

/// The thirteen kinds of field mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    Set,
    Unset,
    Increment,
    Multiply,
    Min,
    Max,
    CurrentDate,
    Push,
    PopFirst,
    PopLast,
    Pull,
    PullAll,
    AddToSet,
}

/// One atomic mutation of one document field.
///
/// A batch of operations is applied strictly in order, and later operations
/// see the effects of earlier ones. No two operations in a batch may target
/// the same field; see [`validate_batch`].
///
/// ```rust,ignore
/// use polystore::collection::UpdateOperation;
///
/// let ops = vec![
///     UpdateOperation::increment("exp", 50),
///     UpdateOperation::push("log", "levelled"),
/// ];
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOperation {
    /// Replaces the field value.
    Set { field: String, value: Value },
    /// Removes the field.
    Unset { field: String },
    /// Adds a numeric delta; absent reads as zero of the delta's kind.
    Increment { field: String, delta: Value },
    /// Multiplies by a factor; absent reads as one and the result is `F64`.
    Multiply { field: String, factor: Value },
    /// Replaces the field only with a strictly smaller value.
    Min { field: String, value: Value },
    /// Replaces the field only with a strictly larger value.
    Max { field: String, value: Value },
    /// Writes the current instant as an ISO-8601 string.
    CurrentDate { field: String },
    /// Appends values to a list, creating it if absent.
    Push { field: String, values: Vec<Value> },
    PopFirst { field: String },
    PopLast { field: String },
    /// Removes every element equal to the value.
    Pull { field: String, value: Value },
    /// Removes every element equal to any of the values.
    PullAll { field: String, values: Vec<Value> },
    /// Appends each value not already present.
    AddToSet { field: String, values: Vec<Value> },
}

impl UpdateOperation {
    pub fn set<T: Into<Value>>(field: &str, value: T) -> Self {
        UpdateOperation::Set {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn unset(field: &str) -> Self {
        UpdateOperation::Unset {
            field: field.to_string(),
        }
    }

    pub fn increment<T: Into<Value>>(field: &str, delta: T) -> Self {
        UpdateOperation::Increment {
            field: field.to_string(),
            delta: delta.into(),
        }
    }

    pub fn multiply<T: Into<Value>>(field: &str, factor: T) -> Self {
        UpdateOperation::Multiply {
            field: field.to_string(),
            factor: factor.into(),
        }
    }

    pub fn min<T: Into<Value>>(field: &str, value: T) -> Self {
        UpdateOperation::Min {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn max<T: Into<Value>>(field: &str, value: T) -> Self {
        UpdateOperation::Max {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn current_date(field: &str) -> Self {
        UpdateOperation::CurrentDate {
            field: field.to_string(),
        }
    }

    pub fn push<T: Into<Value>>(field: &str, value: T) -> Self {
        UpdateOperation::Push {
            field: field.to_string(),
            values: vec![value.into()],
        }
    }

    pub fn push_all<T: Into<Value>>(field: &str, values: Vec<T>) -> Self {
        UpdateOperation::Push {
            field: field.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn pop_first(field: &str) -> Self {
        UpdateOperation::PopFirst {
            field: field.to_string(),
        }
    }

    pub fn pop_last(field: &str) -> Self {
        UpdateOperation::PopLast {
            field: field.to_string(),
        }
    }

    pub fn pull<T: Into<Value>>(field: &str, value: T) -> Self {
        UpdateOperation::Pull {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn pull_all<T: Into<Value>>(field: &str, values: Vec<T>) -> Self {
        UpdateOperation::PullAll {
            field: field.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn add_to_set<T: Into<Value>>(field: &str, value: T) -> Self {
        UpdateOperation::AddToSet {
            field: field.to_string(),
            values: vec![value.into()],
        }
    }

    pub fn add_all_to_set<T: Into<Value>>(field: &str, values: Vec<T>) -> Self {
        UpdateOperation::AddToSet {
            field: field.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// The field path this operation targets.
    pub fn field(&self) -> &str {
        match self {
            UpdateOperation::Set { field, .. }
            | UpdateOperation::Unset { field }
            | UpdateOperation::Increment { field, .. }
            | UpdateOperation::Multiply { field, .. }
            | UpdateOperation::Min { field, .. }
            | UpdateOperation::Max { field, .. }
            | UpdateOperation::CurrentDate { field }
            | UpdateOperation::Push { field, .. }
            | UpdateOperation::PopFirst { field }
            | UpdateOperation::PopLast { field }
            | UpdateOperation::Pull { field, .. }
            | UpdateOperation::PullAll { field, .. }
            | UpdateOperation::AddToSet { field, .. } => field,
        }
    }

    pub fn kind(&self) -> UpdateKind {
        match self {
            UpdateOperation::Set { .. } => UpdateKind::Set,
            UpdateOperation::Unset { .. } => UpdateKind::Unset,
            UpdateOperation::Increment { .. } => UpdateKind::Increment,
            UpdateOperation::Multiply { .. } => UpdateKind::Multiply,
            UpdateOperation::Min { .. } => UpdateKind::Min,
            UpdateOperation::Max { .. } => UpdateKind::Max,
            UpdateOperation::CurrentDate { .. } => UpdateKind::CurrentDate,
            UpdateOperation::Push { .. } => UpdateKind::Push,
            UpdateOperation::PopFirst { .. } => UpdateKind::PopFirst,
            UpdateOperation::PopLast { .. } => UpdateKind::PopLast,
            UpdateOperation::Pull { .. } => UpdateKind::Pull,
            UpdateOperation::PullAll { .. } => UpdateKind::PullAll,
            UpdateOperation::AddToSet { .. } => UpdateKind::AddToSet,
        }
    }
}

impl Display for UpdateOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UpdateOperation::Set { field, value }
            | UpdateOperation::Min { field, value }
            | UpdateOperation::Max { field, value }
            | UpdateOperation::Pull { field, value } => {
                write!(f, "{:?}({}, {:?})", self.kind(), field, value)
            }
            UpdateOperation::Increment { field, delta: operand }
            | UpdateOperation::Multiply {
                field,
                factor: operand,
            } => write!(f, "{:?}({}, {:?})", self.kind(), field, operand),
            UpdateOperation::Push { field, values }
            | UpdateOperation::PullAll { field, values }
            | UpdateOperation::AddToSet { field, values } => {
                write!(f, "{:?}({}, {:?})", self.kind(), field, values)
            }
            UpdateOperation::Unset { field }
            | UpdateOperation::CurrentDate { field }
            | UpdateOperation::PopFirst { field }
            | UpdateOperation::PopLast { field } => write!(f, "{:?}({})", self.kind(), field),
        }
    }
}

/// Rejects a batch before any operation runs.
///
/// Every operation must name a non-empty field, no two operations may target
/// the same field, and arithmetic operands must be numeric.
pub fn validate_batch(operations: &[UpdateOperation]) -> StoreResult<()> {
    let mut seen = HashSet::with_capacity(operations.len());
    for operation in operations {
        let field = operation.field();
        if field.trim().is_empty() {
            log::error!("Update operation {} has no field path", operation);
            return Err(StoreError::new(
                "Update operation must name a field path",
                ErrorKind::InvalidOperation,
            ));
        }

        if !seen.insert(field) {
            log::error!("Field '{}' is targeted twice in one update batch", field);
            return Err(StoreError::new(
                &format!("Field '{}' is targeted by more than one update operation", field),
                ErrorKind::InvalidOperation,
            ));
        }

        match operation {
            UpdateOperation::Increment { delta: operand, .. }
            | UpdateOperation::Multiply {
                factor: operand, ..
            } if !operand.is_number() => {
                log::error!("Operand of {} is not numeric", operation);
                return Err(StoreError::new(
                    &format!(
                        "{:?} on '{}' requires a numeric operand, got {}",
                        operation.kind(),
                        field,
                        operand.type_name()
                    ),
                    ErrorKind::InvalidDataType,
                ));
            }
            _ => {}
        }
    }
    Ok(())
}
