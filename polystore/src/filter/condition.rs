use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::filter::Predicate;
use std::fmt::{Display, Formatter};

/// An immutable boolean expression over document fields.
///
/// A leaf tests one field path with one [Predicate]. A combinator joins two
/// or more child conditions, which may themselves be combinators.
///
/// Build conditions with the fluent API rather than by hand:
///
/// ```rust,ignore
/// use polystore::filter::{field, or};
///
/// let active_veterans = field("level").gte(50).and(field("active").eq(true));
/// let either = or(vec![field("level").eq(15), field("active").eq(true)]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Field { path: String, predicate: Predicate },
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    pub fn leaf(path: impl Into<String>, predicate: Predicate) -> Self {
        Condition::Field {
            path: path.into(),
            predicate,
        }
    }

    /// Combines this condition with another using logical AND.
    ///
    /// An existing AND on the left is extended instead of nested.
    pub fn and(self, other: Condition) -> Condition {
        match self {
            Condition::And(mut children) => {
                children.push(other);
                Condition::And(children)
            }
            condition => Condition::And(vec![condition, other]),
        }
    }

    /// Combines this condition with another using logical OR.
    ///
    /// An existing OR on the left is extended instead of nested.
    pub fn or(self, other: Condition) -> Condition {
        match self {
            Condition::Or(mut children) => {
                children.push(other);
                Condition::Or(children)
            }
            condition => Condition::Or(vec![condition, other]),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Condition::Field { .. })
    }

    /// Checks the structural invariants of the whole tree: every leaf names
    /// a non-empty field path, every combinator has at least two children,
    /// and every predicate operand is usable.
    pub fn validate(&self) -> StoreResult<()> {
        match self {
            Condition::Field { path, predicate } => {
                if path.trim().is_empty() {
                    log::error!("Condition leaf {} has no field path", predicate);
                    return Err(StoreError::new(
                        "Condition leaf must name a field path",
                        ErrorKind::FilterError,
                    ));
                }
                predicate.validate()
            }
            Condition::And(children) | Condition::Or(children) => {
                if children.len() < 2 {
                    log::error!(
                        "Combinator {} has {} children, at least 2 required",
                        self.combinator_name(),
                        children.len()
                    );
                    return Err(StoreError::new(
                        &format!(
                            "{} condition requires at least 2 children",
                            self.combinator_name()
                        ),
                        ErrorKind::FilterError,
                    ));
                }
                children.iter().try_for_each(Condition::validate)
            }
        }
    }

    fn combinator_name(&self) -> &'static str {
        match self {
            Condition::Field { .. } => "FIELD",
            Condition::And(_) => "AND",
            Condition::Or(_) => "OR",
        }
    }
}

impl Display for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::Field { path, predicate } => write!(f, "({} {})", path, predicate),
            Condition::And(children) | Condition::Or(children) => {
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", self.combinator_name())?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Joins conditions with logical AND.
///
/// A single condition is returned unchanged; an empty list yields an invalid
/// AND that [`Condition::validate`] rejects.
pub fn and(conditions: Vec<Condition>) -> Condition {
    let mut conditions = conditions;
    if conditions.len() == 1 {
        if let Some(single) = conditions.pop() {
            return single;
        }
    }
    Condition::And(conditions)
}

/// Joins conditions with logical OR.
///
/// A single condition is returned unchanged; an empty list yields an invalid
/// OR that [`Condition::validate`] rejects.
pub fn or(conditions: Vec<Condition>) -> Condition {
    let mut conditions = conditions;
    if conditions.len() == 1 {
        if let Some(single) = conditions.pop() {
            return single;
        }
    }
    Condition::Or(conditions)
}
