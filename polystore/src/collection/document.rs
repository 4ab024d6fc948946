use crate::common::Value;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::fmt::{Debug, Display, Formatter};

/// Segments of a split field path. Most paths are shallow.
pub(crate) type PathSegments<'a> = SmallVec<[&'a str; 8]>;

pub(crate) fn split_path<'a>(path: &'a str, separator: &str) -> PathSegments<'a> {
    if separator.is_empty() {
        let mut single = PathSegments::new();
        single.push(path);
        return single;
    }
    path.split(separator).collect()
}

/// An ordered field map: string field name to [Value].
///
/// Fields keep insertion order. Nested documents are addressed by joining
/// field names with a separator (the store's configured separator, `.` by
/// default), e.g. `address.city`. A numeric segment indexes into a list when
/// reading, e.g. `tags.0`.
///
/// The top-level accessors ([`put`](Document::put), [`get`](Document::get),
/// [`remove`](Document::remove)) treat the key literally; the `*_path`
/// accessors navigate nested values.
#[derive(Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    data: IndexMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of top-level fields.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates `value` with the top-level `key`, returning the previous value.
    pub fn put<T: Into<Value>>(&mut self, key: impl Into<String>, value: T) -> Option<Value> {
        self.data.insert(key.into(), value.into())
    }

    /// Returns the value of the top-level `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.data.get_mut(key)
    }

    /// Removes the top-level `key`, keeping the order of the remaining fields.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    /// Returns every leaf field path, descending into nested documents.
    ///
    /// ```text
    /// {user: {name: "a", mail: "b"}, status: 1}  =>  [user.name, user.mail, status]
    /// ```
    pub fn fields(&self, separator: &str) -> Vec<String> {
        let mut fields = Vec::new();
        self.collect_fields("", separator, &mut fields);
        fields
    }

    fn collect_fields(&self, prefix: &str, separator: &str, fields: &mut Vec<String>) {
        for (key, value) in &self.data {
            let field = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}{}{}", prefix, separator, key)
            };

            match value {
                Value::Document(doc) if !doc.is_empty() => {
                    doc.collect_fields(&field, separator, fields)
                }
                _ => fields.push(field),
            }
        }
    }

    /// Navigates `path` and returns the value found there.
    ///
    /// A literal top-level key wins over navigation. Missing segments, out of
    /// range list indexes and scalar intermediates all yield `None`.
    pub fn get_path(&self, path: &str, separator: &str) -> Option<&Value> {
        if let Some(value) = self.data.get(path) {
            return Some(value);
        }

        let segments = split_path(path, separator);
        if segments.len() < 2 {
            return None;
        }

        let mut current = self.data.get(segments[0])?;
        for segment in &segments[1..] {
            current = match current {
                Value::Document(doc) => doc.data.get(*segment)?,
                Value::Array(list) => {
                    let index = segment.parse::<usize>().ok()?;
                    list.get(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Mutable counterpart of [`get_path`](Document::get_path).
    pub fn get_path_mut(&mut self, path: &str, separator: &str) -> Option<&mut Value> {
        if self.data.contains_key(path) {
            return self.data.get_mut(path);
        }

        let segments = split_path(path, separator);
        if segments.len() < 2 {
            return None;
        }

        let mut current = self.data.get_mut(segments[0])?;
        for segment in &segments[1..] {
            current = match current {
                Value::Document(doc) => doc.data.get_mut(*segment)?,
                Value::Array(list) => {
                    let index = segment.parse::<usize>().ok()?;
                    list.get_mut(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Writes `value` at `path`, creating intermediate documents as needed.
    ///
    /// Returns the previous value. Fails with [ErrorKind::InvalidOperation] on
    /// an empty segment, and with [ErrorKind::InvalidDataType] when an
    /// intermediate segment holds a non-document value.
    pub fn set_path(
        &mut self,
        path: &str,
        separator: &str,
        value: Value,
    ) -> StoreResult<Option<Value>> {
        if self.data.contains_key(path) {
            return Ok(self.data.insert(path.to_string(), value));
        }

        let segments = split_path(path, separator);
        if segments.iter().any(|s| s.is_empty()) {
            log::error!("Invalid field path '{}'", path);
            return Err(StoreError::new(
                &format!("Invalid field path '{}'", path),
                ErrorKind::InvalidOperation,
            ));
        }
        self.deep_set(&segments, path, value)
    }

    fn deep_set(
        &mut self,
        segments: &[&str],
        path: &str,
        value: Value,
    ) -> StoreResult<Option<Value>> {
        let key = segments[0];
        if segments.len() == 1 {
            return Ok(self.data.insert(key.to_string(), value));
        }

        let slot = self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::Document(Document::new()));
        if slot.is_null() {
            *slot = Value::Document(Document::new());
        }

        match slot {
            Value::Document(nested) => nested.deep_set(&segments[1..], path, value),
            other => {
                log::error!(
                    "Cannot set '{}': segment '{}' holds a {} value",
                    path,
                    key,
                    other.type_name()
                );
                Err(StoreError::new(
                    &format!(
                        "Cannot set '{}': segment '{}' is not a document",
                        path, key
                    ),
                    ErrorKind::InvalidDataType,
                ))
            }
        }
    }

    /// Removes the value at `path`, returning it. Emptied intermediate
    /// documents are kept.
    pub fn remove_path(&mut self, path: &str, separator: &str) -> Option<Value> {
        if self.data.contains_key(path) {
            return self.data.shift_remove(path);
        }

        let segments = split_path(path, separator);
        let (last, parents) = segments.split_last()?;
        if parents.is_empty() {
            return None;
        }

        let mut current = self.data.get_mut(parents[0])?;
        for segment in &parents[1..] {
            current = match current {
                Value::Document(doc) => doc.data.get_mut(*segment)?,
                _ => return None,
            };
        }
        match current {
            Value::Document(doc) => doc.data.shift_remove(*last),
            _ => None,
        }
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        write!(f, "}}")
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.data.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Document {
            data: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

pub fn normalize(key: &str) -> String {
    key.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// ```rust
/// use polystore::doc;
///
/// let base = 100;
/// let player = doc! {
///     name: "Bob",
///     exp: (base * 2),
///     stats: { level: 3, tags: ["new", "solo"] },
/// };
/// assert_eq!(player.size(), 3);
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::collection::Document::new()
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::collection::Document::new();
            $(
                doc.put($crate::collection::normalize(stringify!($key)), $crate::doc_value!($value));
            )*
            doc
        }
    };
}

/// Converts one `doc!` value: nested documents, arrays, or expressions.
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
