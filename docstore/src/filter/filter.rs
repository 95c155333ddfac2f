use crate::collection::{split_path, Document};
use crate::common::Value;
use crate::errors::DocStoreResult;
use std::fmt::Display;
use std::sync::Arc;

use super::{AllFilter, AndFilter, NotFilter, OrFilter};

/// A predicate over documents.
///
/// Implementations evaluate one node of a filter tree. Leaf filters inspect
/// a field, logical filters combine other [Filter]s.
pub trait FilterProvider: Send + Sync + Display {
    /// Checks whether `entry` satisfies this filter.
    fn apply(&self, entry: &Document) -> DocStoreResult<bool>;
}

/// A compiled, cheaply cloneable filter tree.
///
/// Filters are usually compiled from filter documents with [Filter::parse]:
///
/// ```rust,ignore
/// use docstore::doc;
/// use docstore::filter::Filter;
///
/// let filter = Filter::parse(&doc! { "i": { "$gt": 50, "$lte": 100 } })?;
/// assert!(filter.apply(&doc! { i: 71 })?);
/// assert!(!filter.apply(&doc! { i: 101 })?);
/// ```
#[derive(Clone)]
pub struct Filter {
    inner: Arc<dyn FilterProvider>,
}

impl Filter {
    pub fn new<T: FilterProvider + 'static>(inner: T) -> Self {
        Filter {
            inner: Arc::new(inner),
        }
    }

    /// Creates a filter that matches every document.
    pub fn all() -> Self {
        Filter::new(AllFilter)
    }

    /// Compiles a filter document into a filter tree.
    pub fn parse(filter: &Document) -> DocStoreResult<Self> {
        super::parser::parse_filter(filter)
    }

    pub fn and(&self, filter: Filter) -> Self {
        Filter::new(AndFilter::new(vec![self.clone(), filter]))
    }

    pub fn or(&self, filter: Filter) -> Self {
        Filter::new(OrFilter::new(vec![self.clone(), filter]))
    }

    pub fn not(&self) -> Self {
        Filter::new(NotFilter::new(self.clone()))
    }

    #[inline]
    pub fn apply(&self, entry: &Document) -> DocStoreResult<bool> {
        self.inner.apply(entry)
    }
}

impl Display for Filter {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// Collects every value reachable through `path`.
///
/// A literal top level key wins over the embedded path. When the path crosses
/// an array, each document element of that array is visited, and a numeric
/// segment additionally selects the element at that position. Arrays found at
/// the end of the path are returned as a whole.
pub(crate) fn resolve_values<'a>(entry: &'a Document, path: &str) -> Vec<&'a Value> {
    let mut values = Vec::new();
    if let Some(value) = entry.get_field(path) {
        values.push(value);
        return values;
    }

    let segments = split_path(path);
    if let Some((first, rest)) = segments.split_first() {
        if let Some(value) = entry.get_field(first) {
            collect_values(value, rest, &mut values);
        }
    }
    values
}

fn collect_values<'a>(value: &'a Value, segments: &[&str], values: &mut Vec<&'a Value>) {
    let (first, rest) = match segments.split_first() {
        Some(split) => split,
        None => {
            values.push(value);
            return;
        }
    };

    match value {
        Value::Document(doc) => {
            if let Some(child) = doc.get_field(first) {
                collect_values(child, rest, values);
            }
        }
        Value::Array(items) => {
            if let Ok(index) = first.parse::<usize>() {
                if let Some(item) = items.get(index) {
                    collect_values(item, rest, values);
                }
            }
            for item in items.iter().filter(|item| item.is_document()) {
                collect_values(item, segments, values);
            }
        }
        _ => {}
    }
}

/// Checks `predicate` against a resolved value, then against each element when
/// the value is an array.
pub(crate) fn matches_any(value: &Value, predicate: impl Fn(&Value) -> bool) -> bool {
    if predicate(value) {
        return true;
    }
    match value {
        Value::Array(items) => items.iter().any(predicate),
        _ => false,
    }
}
