use crate::common::SortOrder;
use crate::filter::Condition;
use std::fmt::{Display, Formatter};

/// Options for a find: WHERE, ORDER BY, SKIP and LIMIT.
///
/// The four steps always run in that order, so skip and limit see sorted,
/// filtered data.
///
/// # Examples
///
/// ```rust,ignore
/// use polystore::collection::{FindOptions, order_by};
/// use polystore::common::SortOrder;
/// use polystore::filter::field;
///
/// let options = FindOptions::new()
///     .filter(field("active").eq(true))
///     .sort_by("level", SortOrder::Descending)
///     .sort_by("name", SortOrder::Ascending)
///     .skip(10)
///     .limit(20);
///
/// let options = order_by("name", SortOrder::Ascending);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FindOptions {
    pub(crate) condition: Option<Condition>,
    pub(crate) sort_by: Vec<(String, SortOrder)>,
    pub(crate) skip: Option<usize>,
    pub(crate) limit: Option<usize>,
}

/// Creates `FindOptions` that only filters.
pub fn filter_by(condition: Condition) -> FindOptions {
    FindOptions::new().filter(condition)
}

/// Creates `FindOptions` sorted by one field.
pub fn order_by(field_name: &str, sort_order: SortOrder) -> FindOptions {
    FindOptions::new().sort_by(field_name, sort_order)
}

/// Creates `FindOptions` that skips the first `skip` results.
pub fn skip_by(skip: usize) -> FindOptions {
    FindOptions::new().skip(skip)
}

/// Creates `FindOptions` returning at most `limit` results.
pub fn limit_to(limit: usize) -> FindOptions {
    FindOptions::new().limit(limit)
}

impl FindOptions {
    pub fn new() -> FindOptions {
        FindOptions {
            condition: None,
            sort_by: Vec::new(),
            skip: None,
            limit: None,
        }
    }

    /// Sets the WHERE condition.
    pub fn filter(mut self, condition: Condition) -> FindOptions {
        self.condition = Some(condition);
        self
    }

    /// Appends a sort key. The first key is primary; later keys break ties.
    pub fn sort_by(mut self, field_name: &str, sort_order: SortOrder) -> FindOptions {
        self.sort_by.push((field_name.to_string(), sort_order));
        self
    }

    pub fn skip(mut self, skip: usize) -> FindOptions {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: usize) -> FindOptions {
        self.limit = Some(limit);
        self
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    pub fn sort_keys(&self) -> &[(String, SortOrder)] {
        &self.sort_by
    }

    pub fn skip_count(&self) -> Option<usize> {
        self.skip
    }

    pub fn limit_count(&self) -> Option<usize> {
        self.limit
    }
}

impl Display for FindOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.condition {
            Some(condition) => write!(f, "where {}", condition)?,
            None => write!(f, "where *")?,
        }
        if !self.sort_by.is_empty() {
            write!(f, " order by ")?;
            for (i, (field, order)) in self.sort_by.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} {:?}", field, order)?;
            }
        }
        if let Some(skip) = self.skip {
            write!(f, " skip {}", skip)?;
        }
        if let Some(limit) = self.limit {
            write!(f, " limit {}", limit)?;
        }
        Ok(())
    }
}
