use crate::common::Value;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use regex::Regex;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// A regular expression operand, compiled once when the predicate is built.
///
/// An invalid pattern is kept as source only; [`Predicate::validate`] reports
/// it as a [ErrorKind::FilterError].
#[derive(Clone)]
pub struct RegexPattern {
    source: String,
    compiled: Option<Arc<Regex>>,
}

impl RegexPattern {
    pub fn new(source: &str) -> Self {
        let compiled = match Regex::new(source) {
            Ok(regex) => Some(Arc::new(regex)),
            Err(err) => {
                log::warn!("Invalid regex pattern '{}': {}", source, err);
                None
            }
        };
        RegexPattern {
            source: source.to_string(),
            compiled,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn regex(&self) -> StoreResult<&Regex> {
        match &self.compiled {
            Some(regex) => Ok(&**regex),
            None => Err(Regex::new(&self.source)
                .err()
                .map(StoreError::from)
                .unwrap_or_else(|| {
                    StoreError::new("Regex pattern failed to compile", ErrorKind::FilterError)
                })),
        }
    }
}

impl PartialEq for RegexPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Debug for RegexPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}/", self.source)
    }
}

/// A typed comparison against one field, holding the right-hand operand.
///
/// Predicates are pure: evaluating one never mutates anything.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    /// A range with independently inclusive bounds.
    Between {
        lower: Value,
        upper: Value,
        lower_inclusive: bool,
        upper_inclusive: bool,
    },
    In(Vec<Value>),
    NotIn(Vec<Value>),
    StartsWith(String),
    /// Substring of a string field, or an element of a list field.
    Contains(Value),
    EndsWith(String),
    Regex(RegexPattern),
}

impl Predicate {
    /// Short operator name, used when rendering conditions.
    pub fn operator(&self) -> &'static str {
        match self {
            Predicate::Eq(_) => "==",
            Predicate::Ne(_) => "!=",
            Predicate::Gt(_) => ">",
            Predicate::Gte(_) => ">=",
            Predicate::Lt(_) => "<",
            Predicate::Lte(_) => "<=",
            Predicate::Between { .. } => "between",
            Predicate::In(_) => "in",
            Predicate::NotIn(_) => "not in",
            Predicate::StartsWith(_) => "starts with",
            Predicate::Contains(_) => "contains",
            Predicate::EndsWith(_) => "ends with",
            Predicate::Regex(_) => "matches",
        }
    }

    /// Checks that the operand is usable.
    pub fn validate(&self) -> StoreResult<()> {
        if let Predicate::Regex(pattern) = self {
            if let Err(err) = pattern.regex() {
                log::error!("Invalid regex predicate /{}/: {}", pattern.source(), err);
                return Err(err);
            }
        }
        Ok(())
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Predicate::Eq(v)
            | Predicate::Ne(v)
            | Predicate::Gt(v)
            | Predicate::Gte(v)
            | Predicate::Lt(v)
            | Predicate::Lte(v)
            | Predicate::Contains(v) => write!(f, "{} {:?}", self.operator(), v),
            Predicate::Between {
                lower,
                upper,
                lower_inclusive,
                upper_inclusive,
            } => write!(
                f,
                "between {}{:?}, {:?}{}",
                if *lower_inclusive { "[" } else { "(" },
                lower,
                upper,
                if *upper_inclusive { "]" } else { ")" }
            ),
            Predicate::In(values) | Predicate::NotIn(values) => {
                write!(f, "{} {:?}", self.operator(), values)
            }
            Predicate::StartsWith(s) | Predicate::EndsWith(s) => {
                write!(f, "{} {:?}", self.operator(), s)
            }
            Predicate::Regex(pattern) => write!(f, "{} {:?}", self.operator(), pattern),
        }
    }
}
