use crate::common::{ObjectId, Value, ValueType, DOC_ID, FIELD_SEPARATOR};
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use indexmap::IndexMap;
use itertools::Itertools;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};

pub(crate) type PathSegments<'a> = SmallVec<[&'a str; 4]>;

/// Splits an embedded field path such as `"info.x"` into its segments.
pub(crate) fn split_path(path: &str) -> PathSegments<'_> {
    path.split(FIELD_SEPARATOR).collect()
}

/// Represents a document: an ordered set of key-value pairs.
///
/// Keys are [String]s and values are [Value]s, which may themselves be nested
/// documents or arrays. Fields keep the order in which they were appended and
/// two documents are equal only if they hold the same fields in the same order.
///
/// A document is immutable once built. Use [DocumentBuilder] or the [crate::doc]
/// macro to create one:
///
/// ```rust,ignore
/// use docstore::doc;
///
/// let doc = doc! {
///     name: "MongoDB",
///     type: "database",
///     count: 1,
///     versions: ["v3.2", "v3.0", "v2.6"],
///     info: { x: 203, y: 102 },
/// };
///
/// assert_eq!(doc.get_str("name")?, "MongoDB");
/// assert_eq!(doc.get_i32("info.x")?, 203);
/// ```
///
/// ## Embedded fields
///
/// Read operations accept embedded paths separated by `.`. A literal key that
/// contains a dot takes precedence over the path interpretation. Numeric path
/// segments index into arrays, so `"versions.0"` reads `"v3.2"` above.
///
/// ## Typed reads
///
/// The `get_*` accessors never coerce. Reading an `int` field with
/// [Document::get_str] fails with [ErrorKind::TypeMismatch], and a missing
/// field fails with [ErrorKind::NotFound].
#[derive(Clone, Default)]
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

    /// Gets the number of top level fields.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Gets the value stored at `key`.
    ///
    /// The key is matched literally first, then as an embedded path.
    /// Returns `None` when neither resolves.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.data.get(key) {
            return Some(value);
        }
        if key.contains(FIELD_SEPARATOR) {
            self.get_path(&split_path(key))
        } else {
            None
        }
    }

    /// Gets a top level field without path interpretation.
    pub(crate) fn get_field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    fn get_path(&self, segments: &[&str]) -> Option<&Value> {
        let (first, rest) = segments.split_first()?;
        let mut current = self.data.get(*first)?;
        for segment in rest {
            current = match current {
                Value::Document(doc) => doc.data.get(*segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Checks whether `key` resolves to a value, `null` included.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Gets the `_id` of the document, if present.
    pub fn id(&self) -> Option<&Value> {
        self.data.get(DOC_ID)
    }

    /// Gets the top level field names in order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// Iterates over top level fields in order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.data.iter()
    }

    fn typed<'a, T>(
        &'a self,
        key: &str,
        expected: ValueType,
        extract: impl FnOnce(&'a Value) -> Option<T>,
    ) -> DocStoreResult<T> {
        match self.get(key) {
            None => {
                log::error!("Field '{}' not found in document", key);
                Err(DocStoreError::new(
                    &format!("Field '{}' not found", key),
                    ErrorKind::NotFound,
                ))
            }
            Some(value) => extract(value).ok_or_else(|| {
                log::error!(
                    "Field '{}' holds {} but {} was requested",
                    key,
                    value.value_type(),
                    expected
                );
                DocStoreError::new(
                    &format!(
                        "Field '{}' is of type {}, not {}",
                        key,
                        value.value_type(),
                        expected
                    ),
                    ErrorKind::TypeMismatch,
                )
            }),
        }
    }

    pub fn get_str(&self, key: &str) -> DocStoreResult<&str> {
        self.typed(key, ValueType::String, Value::as_str)
    }

    pub fn get_i32(&self, key: &str) -> DocStoreResult<i32> {
        self.typed(key, ValueType::Int32, Value::as_i32)
    }

    pub fn get_i64(&self, key: &str) -> DocStoreResult<i64> {
        self.typed(key, ValueType::Int64, Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> DocStoreResult<f64> {
        self.typed(key, ValueType::Double, Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> DocStoreResult<bool> {
        self.typed(key, ValueType::Bool, Value::as_bool)
    }

    pub fn get_document(&self, key: &str) -> DocStoreResult<&Document> {
        self.typed(key, ValueType::Document, Value::as_document)
    }

    pub fn get_array(&self, key: &str) -> DocStoreResult<&Vec<Value>> {
        self.typed(key, ValueType::Array, Value::as_array)
    }

    pub fn get_object_id(&self, key: &str) -> DocStoreResult<ObjectId> {
        self.typed(key, ValueType::ObjectId, Value::as_object_id)
    }

    /// Checks whether the field at `key` holds `null`.
    ///
    /// Fails with [ErrorKind::NotFound] when the field is missing.
    pub fn is_null(&self, key: &str) -> DocStoreResult<bool> {
        self.typed(key, ValueType::Null, |v| Some(v.is_null()))
    }

    /// Sets a top level field, replacing an existing value in place.
    pub(crate) fn insert(&mut self, key: &str, value: Value) {
        self.data.insert(key.to_string(), value);
    }

    /// Sets `_id` as the first field of the document.
    pub(crate) fn insert_id(&mut self, id: Value) {
        self.data.shift_remove(DOC_ID);
        self.data.shift_insert(0, DOC_ID.to_string(), id);
    }

    /// Sets the value at an embedded path, creating intermediate documents.
    ///
    /// Array segments must be numeric; writing past the end pads with `null`.
    pub(crate) fn set_path(&mut self, path: &str, value: Value) -> DocStoreResult<()> {
        let segments = split_path(path);
        if segments.iter().any(|s| s.is_empty()) {
            log::error!("Empty segment in field path '{}'", path);
            return Err(DocStoreError::new(
                &format!("Field path '{}' contains an empty segment", path),
                ErrorKind::UpdateError,
            ));
        }
        set_in_document(self, &segments, path, value)
    }

    /// Removes the value at an embedded path and returns it.
    pub(crate) fn unset_path(&mut self, path: &str) -> Option<Value> {
        let segments = split_path(path);
        let (last, parents) = segments.split_last()?;
        if parents.is_empty() {
            return self.data.shift_remove(*last);
        }

        let mut current = self.data.get_mut(parents[0])?;
        for segment in &parents[1..] {
            current = match current {
                Value::Document(doc) => doc.data.get_mut(*segment)?,
                Value::Array(items) => items.get_mut(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        match current {
            Value::Document(doc) => doc.data.shift_remove(*last),
            // removing from an array leaves a null hole
            Value::Array(items) => {
                let slot = items.get_mut(last.parse::<usize>().ok()?)?;
                Some(std::mem::take(slot))
            }
            _ => None,
        }
    }

    /// Renders the document as compact relaxed Extended JSON.
    pub fn to_json(&self) -> DocStoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Renders the document as indented relaxed Extended JSON.
    pub fn to_pretty_json(&self) -> DocStoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a document from a JSON object.
    ///
    /// `{"$oid": "..."}`, `{"$numberLong": "..."}` and `{"$numberDouble": "..."}`
    /// wrappers are decoded to their typed values.
    pub fn from_json(json: &str) -> DocStoreResult<Document> {
        match serde_json::from_str::<serde_json::Value>(json)? {
            serde_json::Value::Object(map) => Document::from_json_map(map),
            other => {
                log::error!("Expected a JSON object but found {}", other);
                Err(DocStoreError::new(
                    "A document must be a JSON object",
                    ErrorKind::EncodingError,
                ))
            }
        }
    }

    pub(crate) fn from_json_map(
        map: serde_json::Map<String, serde_json::Value>,
    ) -> DocStoreResult<Document> {
        let mut data = IndexMap::with_capacity(map.len());
        for (key, value) in map {
            data.insert(key, Value::from_json(value)?);
        }
        Ok(Document { data })
    }
}

/// Most null elements a single path assignment may append to an array.
pub(crate) const MAX_ARRAY_PADDING: usize = 1_500_000;

fn set_in_document(
    doc: &mut Document,
    segments: &[&str],
    path: &str,
    value: Value,
) -> DocStoreResult<()> {
    let (first, rest) = match segments.split_first() {
        Some(split) => split,
        None => return Ok(()),
    };

    if rest.is_empty() {
        doc.data.insert(first.to_string(), value);
        return Ok(());
    }

    let child = doc
        .data
        .entry(first.to_string())
        .or_insert_with(|| Value::Document(Document::new()));
    set_in_value(child, rest, path, value)
}

fn set_in_value(
    target: &mut Value,
    segments: &[&str],
    path: &str,
    value: Value,
) -> DocStoreResult<()> {
    match target {
        Value::Document(doc) => set_in_document(doc, segments, path, value),
        Value::Array(items) => {
            let (first, rest) = match segments.split_first() {
                Some(split) => split,
                None => return Ok(()),
            };
            let index = first.parse::<usize>().map_err(|_| {
                log::error!("Non numeric segment '{}' into array in path '{}'", first, path);
                DocStoreError::new(
                    &format!("Cannot create field '{}' in array at path '{}'", first, path),
                    ErrorKind::UpdateError,
                )
            })?;
            if items.len() <= index {
                let padded = index
                    .checked_add(1)
                    .filter(|len| len - items.len() <= MAX_ARRAY_PADDING)
                    .ok_or_else(|| {
                        log::error!("Array index {} out of range in path '{}'", index, path);
                        DocStoreError::new(
                            &format!(
                                "Cannot pad array at path '{}' to index {}, at most {} elements can be added",
                                path, index, MAX_ARRAY_PADDING
                            ),
                            ErrorKind::UpdateError,
                        )
                    })?;
                items.resize(padded, Value::Null);
            }
            if rest.is_empty() {
                items[index] = value;
                Ok(())
            } else {
                if items[index].is_null() {
                    items[index] = Value::Document(Document::new());
                }
                set_in_value(&mut items[index], rest, path, value)
            }
        }
        other => {
            log::error!(
                "Cannot traverse {} value while setting path '{}'",
                other.value_type(),
                path
            );
            Err(DocStoreError::new(
                &format!(
                    "Cannot create field '{}' in element of type {}",
                    segments.join("."),
                    other.value_type()
                ),
                ErrorKind::UpdateError,
            ))
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.data.len() == other.data.len()
            && self.data.iter().zip(other.data.iter()).all(|(a, b)| a == b)
    }
}

impl Eq for Document {}

impl PartialOrd for Document {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Document {
    fn cmp(&self, other: &Self) -> Ordering {
        self.data.iter().cmp(other.data.iter())
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let fields = self
            .data
            .iter()
            .map(|(k, v)| format!("{:?}: {:?}", k, v))
            .join(", ");
        write!(f, "{{{}}}", fields)
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        write!(f, "{}", json)
    }
}

impl serde::Serialize for Document {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.data.iter())
    }
}

/// Builds a [Document] field by field.
///
/// Appending a key that is already present replaces its value and keeps the
/// original position.
///
/// ```rust,ignore
/// let doc = DocumentBuilder::new()
///     .append("name", "MongoDB")
///     .append("count", 1)
///     .append("info", DocumentBuilder::new().append("x", 203).finalize())
///     .finalize();
/// ```
#[derive(Default)]
pub struct DocumentBuilder {
    data: IndexMap<String, Value>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        DocumentBuilder {
            data: IndexMap::new(),
        }
    }

    pub fn append(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    pub fn finalize(self) -> Document {
        Document { data: self.data }
    }
}

/// Strips the quotes `stringify!` leaves around string literal keys.
pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// Keys may be identifiers or string literals. Values may be nested
/// documents in `{}`, arrays in `[]` or any expression convertible into a
/// [Value].
///
/// ```rust,ignore
/// use docstore::doc;
///
/// let filter = doc! { "i": { "$gt": 50, "$lte": 100 } };
/// let keys = doc! { i: -1 };
/// let empty = doc! {};
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::collection::Document::new()
    };

    ({ $($inner:tt)* }) => {
        $crate::doc!($($inner)*)
    };

    ($($entries:tt)+) => {
        {
            let mut builder = $crate::collection::DocumentBuilder::new();
            $crate::__doc_entries!(builder; $($entries)+);
            builder.finalize()
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __doc_entries {
    ($builder:ident;) => {};

    ($builder:ident; $key:tt : { $($inner:tt)* } $(, $($rest:tt)*)?) => {
        $builder = $builder.append(
            &$crate::collection::normalize(stringify!($key)),
            $crate::common::Value::Document($crate::doc!($($inner)*)),
        );
        $crate::__doc_entries!($builder; $($($rest)*)?);
    };

    ($builder:ident; $key:tt : [ $($inner:tt)* ] $(, $($rest:tt)*)?) => {
        $builder = $builder.append(
            &$crate::collection::normalize(stringify!($key)),
            $crate::common::Value::Array($crate::doc_array![$($inner)*]),
        );
        $crate::__doc_entries!($builder; $($($rest)*)?);
    };

    ($builder:ident; $key:tt : $value:expr $(, $($rest:tt)*)?) => {
        $builder = $builder.append(
            &$crate::collection::normalize(stringify!($key)),
            $crate::common::Value::from($value),
        );
        $crate::__doc_entries!($builder; $($($rest)*)?);
    };
}

/// Creates a `Vec<Value>` with the same value syntax as [crate::doc].
///
/// ```rust,ignore
/// let versions = doc_array!["v3.2", "v3.0", { major: 2 }];
/// ```
#[macro_export]
macro_rules! doc_array {
    () => {
        ::std::vec::Vec::<$crate::common::Value>::new()
    };

    ($($items:tt)+) => {
        {
            let mut items = ::std::vec::Vec::<$crate::common::Value>::new();
            $crate::__array_items!(items; $($items)+);
            items
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __array_items {
    ($items:ident;) => {};

    ($items:ident; { $($inner:tt)* } $(, $($rest:tt)*)?) => {
        $items.push($crate::common::Value::Document($crate::doc!($($inner)*)));
        $crate::__array_items!($items; $($($rest)*)?);
    };

    ($items:ident; [ $($inner:tt)* ] $(, $($rest:tt)*)?) => {
        $items.push($crate::common::Value::Array($crate::doc_array![$($inner)*]));
        $crate::__array_items!($items; $($($rest)*)?);
    };

    ($items:ident; $value:expr $(, $($rest:tt)*)?) => {
        $items.push($crate::common::Value::from($value));
        $crate::__array_items!($items; $($($rest)*)?);
    };
}
