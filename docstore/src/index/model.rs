use std::fmt::Display;

use itertools::Itertools;

use crate::collection::{Document, DocumentBuilder};
use crate::common::{Value, DOC_ID, ID_INDEX_NAME};
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};

use super::IndexOptions;

/// Describes an index: its key document and options.
///
/// Keys map field paths to a direction, `1` for ascending and `-1` for
/// descending, in the order they appear.
///
/// ```rust,ignore
/// use docstore::doc;
/// use docstore::index::{IndexModel, unique_index};
///
/// let model = IndexModel::new(doc! { i: 1 }, unique_index());
/// assert_eq!(model.name(), "i_1");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct IndexModel {
    keys: Document,
    options: IndexOptions,
}

impl IndexModel {
    pub fn new(keys: Document, options: IndexOptions) -> Self {
        IndexModel { keys, options }
    }

    /// Creates a non-unique index over `keys` with a derived name.
    pub fn from_keys(keys: Document) -> Self {
        IndexModel::new(keys, IndexOptions::default())
    }

    /// The implicit unique index every collection carries on `_id`.
    pub fn id_index() -> Self {
        IndexModel::new(
            DocumentBuilder::new().append(DOC_ID, 1).finalize(),
            IndexOptions::new(Some(ID_INDEX_NAME), true),
        )
    }

    pub fn keys(&self) -> &Document {
        &self.keys
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    pub fn is_unique(&self) -> bool {
        self.options.is_unique()
    }

    /// Gets the explicit name, or the one derived from the keys, such as
    /// `i_1` or `a_1_b_-1`.
    pub fn name(&self) -> String {
        match self.options.name() {
            Some(name) => name.to_string(),
            None => self
                .keys
                .iter()
                .map(|(field, direction)| match direction.as_number() {
                    Some(d) => format!("{}_{}", field, d as i64),
                    None => format!("{}_{}", field, direction),
                })
                .join("_"),
        }
    }

    pub fn fields(&self) -> Vec<&str> {
        self.keys.keys().map(|k| k.as_str()).collect()
    }

    /// Checks the keys are non-empty field paths with a `1` or `-1` direction.
    pub fn validate(&self) -> DocStoreResult<()> {
        if self.keys.is_empty() {
            log::error!("Index keys cannot be empty");
            return Err(DocStoreError::new(
                "Index keys cannot be empty",
                ErrorKind::IndexError,
            ));
        }

        for (field, direction) in &self.keys {
            if field.is_empty() || field.starts_with('$') {
                log::error!("Invalid index field '{}'", field);
                return Err(DocStoreError::new(
                    &format!("Invalid index field '{}'", field),
                    ErrorKind::IndexError,
                ));
            }
            let valid = direction.as_number().map(|d| d == 1.0 || d == -1.0).unwrap_or(false);
            if !valid {
                log::error!("Invalid direction {} for index field '{}'", direction, field);
                return Err(DocStoreError::new(
                    &format!(
                        "Index direction of '{}' must be 1 or -1, found {}",
                        field, direction
                    ),
                    ErrorKind::IndexError,
                ));
            }
        }

        if let Some(name) = self.options.name() {
            if name.is_empty() {
                log::error!("Index name cannot be empty");
                return Err(DocStoreError::new(
                    "Index name cannot be empty",
                    ErrorKind::IndexError,
                ));
            }
        }
        Ok(())
    }

    /// Checks whether `other` describes the same index, ignoring how the name
    /// was supplied.
    pub fn same_definition(&self, other: &IndexModel) -> bool {
        self.keys == other.keys && self.is_unique() == other.is_unique()
    }

    /// Extracts the key of a document under this index. Missing fields index
    /// as `null`.
    pub(crate) fn key_of(&self, document: &Document) -> Vec<Value> {
        self.keys
            .keys()
            .map(|field| document.get(field).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// Describes the index as a document, in the shape index listings use.
    pub fn to_document(&self) -> Document {
        let builder = DocumentBuilder::new()
            .append("key", self.keys.clone())
            .append("name", self.name());
        if self.is_unique() {
            builder.append("unique", true).finalize()
        } else {
            builder.finalize()
        }
    }
}

impl Display for IndexModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_document())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::index::{non_unique_index, unique_index};

    #[test]
    fn test_default_name() {
        assert_eq!(IndexModel::from_keys(doc! { i: 1 }).name(), "i_1");
        assert_eq!(IndexModel::from_keys(doc! { a: 1, "b.c": -1 }).name(), "a_1_b.c_-1");
        assert_eq!(
            IndexModel::new(doc! { i: 1 }, unique_index().with_name("by_i")).name(),
            "by_i"
        );
    }

    #[test]
    fn test_id_index() {
        let model = IndexModel::id_index();
        assert_eq!(model.name(), "_id_");
        assert!(model.is_unique());
        assert_eq!(model.fields(), vec!["_id"]);
    }

    #[test]
    fn test_validate() {
        assert!(IndexModel::from_keys(doc! { i: 1 }).validate().is_ok());
        assert!(IndexModel::from_keys(doc! { i: -1i64 }).validate().is_ok());

        for keys in [doc! {}, doc! { i: 2 }, doc! { i: "text" }, doc! { "$i": 1 }] {
            let err = IndexModel::from_keys(keys).validate().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::IndexError);
        }

        let unnamed = IndexModel::new(doc! { i: 1 }, IndexOptions::new(Some(""), false));
        assert_eq!(unnamed.validate().unwrap_err().kind(), &ErrorKind::IndexError);
    }

    #[test]
    fn test_same_definition() {
        let a = IndexModel::from_keys(doc! { i: 1 });
        let b = IndexModel::new(doc! { i: 1 }, non_unique_index().with_name("i_1"));
        let c = IndexModel::new(doc! { i: 1 }, unique_index());
        let d = IndexModel::from_keys(doc! { i: -1 });
        assert!(a.same_definition(&b));
        assert!(!a.same_definition(&c));
        assert!(!a.same_definition(&d));
    }

    #[test]
    fn test_key_of() {
        let model = IndexModel::from_keys(doc! { i: 1, "info.x": 1 });
        assert_eq!(
            model.key_of(&doc! { i: 5, info: { x: 2 } }),
            vec![Value::I32(5), Value::I32(2)]
        );
        assert_eq!(model.key_of(&doc! {}), vec![Value::Null, Value::Null]);
    }

    #[test]
    fn test_to_document() {
        assert_eq!(
            IndexModel::id_index().to_document(),
            doc! { key: { _id: 1 }, name: "_id_", unique: true }
        );
        assert_eq!(
            IndexModel::from_keys(doc! { i: 1 }).to_string(),
            r#"{"key":{"i":1},"name":"i_1"}"#
        );
    }
}
