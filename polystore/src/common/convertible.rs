use crate::collection::Document;
use crate::common::Value;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use uuid::Uuid;

/// Converts between Rust types and [Value].
///
/// Entities stored through the typed helpers of
/// [`DocumentStore`](crate::store::DocumentStore) implement this trait and
/// convert to a [Value::Document].
pub trait Convertible {
    type Output;

    fn to_value(&self) -> StoreResult<Value>;
    fn from_value(value: &Value) -> StoreResult<Self::Output>;
}

fn mapping_error(value: &Value, expected: &str) -> StoreError {
    log::error!("Value {} is not {}", value, expected);
    StoreError::new(
        &format!("Value is not {}", expected),
        ErrorKind::ObjectMappingError,
    )
}

macro_rules! impl_convertible_for_scalar {
    ($($ty:ty => $variant:ident, $expected:literal);+ $(;)?) => {
        $(
            impl Convertible for $ty {
                type Output = $ty;

                fn to_value(&self) -> StoreResult<Value> {
                    Ok(Value::$variant(self.clone()))
                }

                fn from_value(value: &Value) -> StoreResult<Self::Output> {
                    match value {
                        Value::$variant(v) => Ok(v.clone()),
                        _ => Err(mapping_error(value, $expected)),
                    }
                }
            }
        )+
    };
}

impl_convertible_for_scalar! {
    bool => Bool, "a bool";
    f64 => F64, "an f64";
    String => String, "a string";
    Uuid => Id, "an id";
    Document => Document, "a document";
}

impl Convertible for i32 {
    type Output = i32;

    fn to_value(&self) -> StoreResult<Value> {
        Ok(Value::I32(*self))
    }

    fn from_value(value: &Value) -> StoreResult<Self> {
        match value {
            Value::I32(v) => Ok(*v),
            Value::I64(v) => i32::try_from(*v).map_err(|_| mapping_error(value, "an i32")),
            _ => Err(mapping_error(value, "an i32")),
        }
    }
}

/// Integer fields widen under `Increment`, so an `i64` reads either width.
impl Convertible for i64 {
    type Output = i64;

    fn to_value(&self) -> StoreResult<Value> {
        Ok(Value::I64(*self))
    }

    fn from_value(value: &Value) -> StoreResult<Self> {
        value.as_i64().ok_or_else(|| mapping_error(value, "an i64"))
    }
}

impl Convertible for Value {
    type Output = Value;

    fn to_value(&self) -> StoreResult<Value> {
        Ok(self.clone())
    }

    fn from_value(value: &Value) -> StoreResult<Self> {
        Ok(value.clone())
    }
}

impl<T> Convertible for Option<T>
where
    T: Convertible,
{
    type Output = Option<T::Output>;

    fn to_value(&self) -> StoreResult<Value> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: &Value) -> StoreResult<Self::Output> {
        match value {
            Value::Null => Ok(None),
            _ => Ok(Some(T::from_value(value)?)),
        }
    }
}

impl<T> Convertible for Vec<T>
where
    T: Convertible,
{
    type Output = Vec<T::Output>;

    fn to_value(&self) -> StoreResult<Value> {
        let mut items = Vec::with_capacity(self.len());
        for item in self {
            items.push(item.to_value()?);
        }
        Ok(Value::Array(items))
    }

    fn from_value(value: &Value) -> StoreResult<Self::Output> {
        match value {
            Value::Array(items) => items.iter().map(T::from_value).collect(),
            _ => Err(mapping_error(value, "an array")),
        }
    }
}

/// Converts an entity into the document stored for it.
pub fn to_document<T: Convertible>(entity: &T) -> StoreResult<Document> {
    match entity.to_value()? {
        Value::Document(doc) => Ok(doc),
        other => Err(mapping_error(&other, "a document")),
    }
}

/// Rebuilds an entity from a stored document.
pub fn from_document<T: Convertible>(document: &Document) -> StoreResult<T::Output> {
    T::from_value(&Value::Document(document.clone()))
}
