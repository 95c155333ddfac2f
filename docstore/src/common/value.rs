use crate::collection::Document;
use crate::common::ObjectId;
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};

/// Compare two floats with NaN ordered below every other number.
#[inline]
fn num_cmp_float(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

/// Compare an integer with a float without rounding the integer to 53 bits.
fn num_cmp_int_float(i: i64, f: f64) -> Ordering {
    // 2^63, the first float past i64::MAX
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() {
        return Ordering::Greater;
    }
    if f >= BOUND {
        return Ordering::Less;
    }
    if f < -BOUND {
        return Ordering::Greater;
    }

    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => whole.partial_cmp(&f).unwrap_or(Ordering::Equal),
        ordering => ordering,
    }
}

/// Represents a [Document] value.
///
/// A value is either a scalar (`Null`, `Bool`, 32/64-bit integers, doubles,
/// strings, [ObjectId]s) or a container (a nested [Document] or an ordered
/// array of values).
///
/// # Equality and ordering
///
/// Numeric variants compare by numeric value, so `Value::I32(1)`,
/// `Value::I64(1)` and `Value::F64(1.0)` are all equal. Values of different
/// kinds are ordered by their canonical type order:
///
/// `Null < numbers < String < Document < Array < ObjectId < Bool`
///
/// Query operators such as `$gt` never compare across that order; see
/// [Value::compare_in_bracket].
///
/// # Usage
///
/// ```text
/// let v1: Value = 42.into();           // I32
/// let v2 = Value::from("hello");       // String
/// let v3 = Value::from(vec![1, 2, 3]); // Array
/// ```
#[derive(Clone, Default)]
pub enum Value {
    /// Represents a null value.
    #[default]
    Null,
    /// Represents a boolean value.
    Bool(bool),
    /// Represents a signed 32-bit integer value.
    I32(i32),
    /// Represents a signed 64-bit integer value.
    I64(i64),
    /// Represents a 64-bit floating point value.
    F64(f64),
    /// Represents a string value.
    String(String),
    /// Represents a nested document value.
    Document(Document),
    /// Represents an ordered array of values.
    Array(Vec<Value>),
    /// Represents an object identifier.
    ObjectId(ObjectId),
}

/// The type tag of a [Value].
///
/// Displayed with the type aliases document stores use in error messages and
/// `$type` queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Bool,
    Int32,
    Int64,
    Double,
    String,
    Document,
    Array,
    ObjectId,
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueType::Null => "null",
            ValueType::Bool => "bool",
            ValueType::Int32 => "int",
            ValueType::Int64 => "long",
            ValueType::Double => "double",
            ValueType::String => "string",
            ValueType::Document => "object",
            ValueType::Array => "array",
            ValueType::ObjectId => "objectId",
        };
        write!(f, "{}", name)
    }
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::I32(_) => ValueType::Int32,
            Value::I64(_) => ValueType::Int64,
            Value::F64(_) => ValueType::Double,
            Value::String(_) => ValueType::String,
            Value::Document(_) => ValueType::Document,
            Value::Array(_) => ValueType::Array,
            Value::ObjectId(_) => ValueType::ObjectId,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_object_id(&self) -> Option<ObjectId> {
        match self {
            Value::ObjectId(v) => Some(*v),
            _ => None,
        }
    }

    /// Gets a widened numeric view of integer and double values.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::I32(v) => Some(*v as f64),
            Value::I64(v) => Some(*v as f64),
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Value::F64(v) if v.is_nan())
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::I32(_) | Value::I64(_) | Value::F64(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Value::Document(_))
    }

    /// Position of this value's kind in the canonical type order.
    pub(crate) fn canonical_rank(&self) -> u8 {
        match self {
            Value::Null => 1,
            Value::I32(_) | Value::I64(_) | Value::F64(_) => 2,
            Value::String(_) => 3,
            Value::Document(_) => 4,
            Value::Array(_) => 5,
            Value::ObjectId(_) => 6,
            Value::Bool(_) => 7,
        }
    }

    /// Compares two values of the same canonical kind.
    ///
    /// Returns `None` when the values belong to different kinds, e.g. a number
    /// and a string. Range operators treat `None` as "no match".
    pub fn compare_in_bracket(&self, other: &Value) -> Option<Ordering> {
        if self.canonical_rank() != other.canonical_rank() {
            None
        } else {
            Some(self.cmp(other))
        }
    }

    fn cmp_numbers(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::I32(a), Value::I32(b)) => a.cmp(b),
            (Value::I32(a), Value::I64(b)) => (*a as i64).cmp(b),
            (Value::I64(a), Value::I32(b)) => a.cmp(&(*b as i64)),
            (Value::I64(a), Value::I64(b)) => a.cmp(b),
            (Value::I64(a), Value::F64(b)) => num_cmp_int_float(*a, *b),
            (Value::F64(a), Value::I64(b)) => num_cmp_int_float(*b, *a).reverse(),
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => num_cmp_float(a, b),
                _ => Ordering::Equal,
            },
        }
    }

    /// Converts a JSON value, decoding relaxed Extended JSON wrappers such as
    /// `{"$oid": "..."}` and `{"$numberLong": "..."}`.
    ///
    /// Integral numbers become `I32` when they fit, `I64` otherwise.
    pub fn from_json(json: serde_json::Value) -> DocStoreResult<Value> {
        match json {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(v) => Ok(Value::Bool(v)),
            serde_json::Value::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Ok(i32::try_from(v).map(Value::I32).unwrap_or(Value::I64(v)))
                } else if let Some(v) = n.as_f64() {
                    Ok(Value::F64(v))
                } else {
                    log::error!("Unsupported JSON number {}", n);
                    Err(DocStoreError::new(
                        &format!("Unsupported JSON number {}", n),
                        ErrorKind::EncodingError,
                    ))
                }
            }
            serde_json::Value::String(v) => Ok(Value::String(v)),
            serde_json::Value::Array(items) => {
                let values = items
                    .into_iter()
                    .map(Value::from_json)
                    .collect::<DocStoreResult<Vec<_>>>()?;
                Ok(Value::Array(values))
            }
            serde_json::Value::Object(map) => {
                if map.len() == 1 {
                    if let Some((key, serde_json::Value::String(inner))) = map.iter().next() {
                        match key.as_str() {
                            "$oid" => return Ok(Value::ObjectId(ObjectId::parse_str(inner)?)),
                            "$numberLong" => {
                                let v = inner.parse::<i64>().map_err(|e| {
                                    DocStoreError::new(
                                        &format!("Invalid $numberLong '{}': {}", inner, e),
                                        ErrorKind::EncodingError,
                                    )
                                })?;
                                return Ok(Value::I64(v));
                            }
                            "$numberDouble" => {
                                let v = match inner.as_str() {
                                    "Infinity" => f64::INFINITY,
                                    "-Infinity" => f64::NEG_INFINITY,
                                    "NaN" => f64::NAN,
                                    other => other.parse::<f64>().map_err(|e| {
                                        DocStoreError::new(
                                            &format!("Invalid $numberDouble '{}': {}", other, e),
                                            ErrorKind::EncodingError,
                                        )
                                    })?,
                                };
                                return Ok(Value::F64(v));
                            }
                            _ => {}
                        }
                    }
                }
                Ok(Value::Document(Document::from_json_map(map)?))
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.is_number() && other.is_number() {
            return self.cmp_numbers(other) == Ordering::Equal;
        }

        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Document(a), Value::Document(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::ObjectId(a), Value::ObjectId(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        let rank = self.canonical_rank().cmp(&other.canonical_rank());
        if rank != Ordering::Equal {
            return rank;
        }

        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Document(a), Value::Document(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => a.cmp(b),
            (Value::ObjectId(a), Value::ObjectId(b)) => a.cmp(b),
            _ => self.cmp_numbers(other),
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(v) => write!(f, "Bool({})", v),
            Value::I32(v) => write!(f, "I32({})", v),
            Value::I64(v) => write!(f, "I64({})", v),
            Value::F64(v) => write!(f, "F64({})", v),
            Value::String(v) => write!(f, "String({:?})", v),
            Value::Document(v) => write!(f, "Document({:?})", v),
            Value::Array(v) => f.debug_list().entries(v.iter()).finish(),
            Value::ObjectId(v) => write!(f, "{:?}", v),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => Err(std::fmt::Error),
        }
    }
}

impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::I32(v) => serializer.serialize_i32(*v),
            Value::I64(v) => serializer.serialize_i64(*v),
            Value::F64(v) if v.is_finite() => serializer.serialize_f64(*v),
            Value::F64(v) => {
                let text = if v.is_nan() {
                    "NaN"
                } else if v.is_sign_positive() {
                    "Infinity"
                } else {
                    "-Infinity"
                };
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$numberDouble", text)?;
                map.end()
            }
            Value::String(v) => serializer.serialize_str(v),
            Value::Document(v) => v.serialize(serializer),
            Value::Array(v) => serializer.collect_seq(v.iter()),
            Value::ObjectId(v) => v.serialize(serializer),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Value::Document(value)
    }
}

impl From<ObjectId> for Value {
    fn from(value: ObjectId) -> Self {
        Value::ObjectId(value)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl<T> From<Vec<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}
