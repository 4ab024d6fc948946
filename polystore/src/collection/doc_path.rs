use std::fmt::{Debug, Display};
use std::ops::Deref;
use uuid::Uuid;

/// Identifies one document within a collection.
///
/// A path is opaque to the store: any non-empty string is accepted and it
/// never changes once the document is written. Paths order lexically.
///
/// ```rust,ignore
/// use polystore::collection::DocPath;
///
/// let fixed = DocPath::from("users/42");
/// let random = DocPath::generate();
/// assert_ne!(fixed, random);
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DocPath(String);

impl DocPath {
    pub fn new(path: impl Into<String>) -> Self {
        DocPath(path.into())
    }

    /// Creates a random path backed by a v4 UUID.
    pub fn generate() -> Self {
        DocPath(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for DocPath {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for DocPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Debug for DocPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DocPath({})", self.0)
    }
}

impl From<&str> for DocPath {
    fn from(value: &str) -> Self {
        DocPath(value.to_string())
    }
}

impl From<String> for DocPath {
    fn from(value: String) -> Self {
        DocPath(value)
    }
}

impl From<&String> for DocPath {
    fn from(value: &String) -> Self {
        DocPath(value.clone())
    }
}
