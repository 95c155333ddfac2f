use std::cmp::Ordering;

use crate::collection::{split_path, Document, DocumentBuilder};
use crate::common::{Value, DOC_ID};
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use crate::filter::resolve_values;

/// Options of `find`: sort, skip, limit and projection.
///
/// ```rust,ignore
/// let options = FindOptions::new()
///     .sort(doc! { i: -1 })
///     .skip(10)
///     .limit(5)
///     .projection(doc! { _id: 0, i: 1 });
/// ```
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub(crate) sort: Option<Document>,
    pub(crate) skip: Option<u64>,
    pub(crate) limit: Option<u64>,
    pub(crate) projection: Option<Document>,
}

pub fn order_by(sort: Document) -> FindOptions {
    FindOptions::new().sort(sort)
}

pub fn skip_by(skip: u64) -> FindOptions {
    FindOptions::new().skip(skip)
}

pub fn limit_to(limit: u64) -> FindOptions {
    FindOptions::new().limit(limit)
}

impl FindOptions {
    pub fn new() -> FindOptions {
        FindOptions::default()
    }

    /// Orders results by a document of field to `1` (ascending) or `-1`
    /// (descending).
    pub fn sort(mut self, sort: Document) -> FindOptions {
        self.sort = Some(sort);
        self
    }

    pub fn skip(mut self, skip: u64) -> FindOptions {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> FindOptions {
        self.limit = Some(limit);
        self
    }

    /// Restricts returned fields. Values `1`/`true` include a field, `0`/`false`
    /// exclude it; the two may not be mixed except for `_id`.
    pub fn projection(mut self, projection: Document) -> FindOptions {
        self.projection = Some(projection);
        self
    }

    pub fn get_sort(&self) -> Option<&Document> {
        self.sort.as_ref()
    }

    pub fn get_skip(&self) -> Option<u64> {
        self.skip
    }

    pub fn get_limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn get_projection(&self) -> Option<&Document> {
        self.projection.as_ref()
    }

    pub(crate) fn sort_keys(&self) -> DocStoreResult<Vec<(String, bool)>> {
        let mut keys = Vec::new();
        if let Some(sort) = &self.sort {
            for (field, direction) in sort {
                let ascending = match direction.as_number() {
                    Some(d) if d == 1.0 => true,
                    Some(d) if d == -1.0 => false,
                    _ => {
                        log::error!("Invalid sort direction {} for field {}", direction, field);
                        return Err(DocStoreError::new(
                            &format!("Sort direction of '{}' must be 1 or -1", field),
                            ErrorKind::InvalidOperation,
                        ));
                    }
                };
                keys.push((field.clone(), ascending));
            }
        }
        Ok(keys)
    }

    pub(crate) fn compiled_projection(&self) -> DocStoreResult<Option<Projection>> {
        match &self.projection {
            Some(projection) if !projection.is_empty() => Ok(Some(Projection::compile(projection)?)),
            _ => Ok(None),
        }
    }
}

/// Compares two documents under compiled sort keys.
///
/// A missing field sorts as `null`. An array sorts by its smallest element
/// when ascending and by its largest when descending.
pub(crate) fn compare_documents(a: &Document, b: &Document, keys: &[(String, bool)]) -> Ordering {
    for (field, ascending) in keys {
        let left = sort_value(a, field, *ascending);
        let right = sort_value(b, field, *ascending);
        let ordering = if *ascending {
            left.cmp(&right)
        } else {
            right.cmp(&left)
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn sort_value(document: &Document, field: &str, ascending: bool) -> Value {
    let candidates = resolve_values(document, field);
    let flattened = candidates.into_iter().flat_map(|value| match value {
        Value::Array(items) if !items.is_empty() => items.iter().collect::<Vec<_>>(),
        other => vec![other],
    });
    let chosen = if ascending {
        flattened.min()
    } else {
        flattened.max()
    };
    chosen.cloned().unwrap_or(Value::Null)
}

/// A validated projection.
#[derive(Debug, Clone)]
pub(crate) struct Projection {
    include: bool,
    include_id: bool,
    paths: Vec<Vec<String>>,
}

impl Projection {
    pub(crate) fn compile(projection: &Document) -> DocStoreResult<Projection> {
        let mut mode: Option<bool> = None;
        let mut id_flag: Option<bool> = None;
        let mut paths = Vec::new();

        for (field, flag) in projection {
            let include = match flag {
                Value::Bool(b) => *b,
                v if v.is_number() => v.as_number().map(|n| n != 0.0).unwrap_or(false),
                other => {
                    log::error!("Unsupported projection value {} for field {}", other, field);
                    return Err(DocStoreError::new(
                        &format!("Projection of '{}' must be a boolean or number", field),
                        ErrorKind::InvalidOperation,
                    ));
                }
            };

            if field == DOC_ID {
                id_flag = Some(include);
                continue;
            }

            match mode {
                Some(existing) if existing != include => {
                    log::error!("Projection mixes inclusion and exclusion at field {}", field);
                    return Err(DocStoreError::new(
                        "Projection cannot mix inclusion and exclusion",
                        ErrorKind::InvalidOperation,
                    ));
                }
                _ => mode = Some(include),
            }
            paths.push(split_path(field).iter().map(|s| s.to_string()).collect());
        }

        Ok(Projection {
            include: mode.unwrap_or(id_flag == Some(true)),
            include_id: id_flag.unwrap_or(true),
            paths,
        })
    }

    pub(crate) fn apply(&self, document: &Document) -> Document {
        let segments: Vec<Vec<&str>> = self
            .paths
            .iter()
            .map(|p| p.iter().map(String::as_str).collect())
            .collect();
        let paths: Vec<&[&str]> = segments.iter().map(|p| p.as_slice()).collect();
        let mut projected = if self.include {
            include(document, &paths)
        } else {
            exclude(document, &paths)
        };

        match (self.include_id, document.id()) {
            (true, Some(id)) if self.include => projected.insert_id(id.clone()),
            (false, Some(_)) => {
                projected.unset_path(DOC_ID);
            }
            _ => {}
        }
        projected
    }
}

fn children<'a>(paths: &[&'a [&'a str]], key: &str) -> Vec<&'a [&'a str]> {
    paths
        .iter()
        .copied()
        .filter(|p| p.first().map(|s| *s == key).unwrap_or(false))
        .map(|p| &p[1..])
        .collect()
}

fn include(document: &Document, paths: &[&[&str]]) -> Document {
    let mut builder = DocumentBuilder::new();
    for (key, value) in document {
        let rest = children(paths, key);
        if rest.is_empty() {
            continue;
        }
        if rest.iter().any(|p| p.is_empty()) {
            builder = builder.append(key, value.clone());
            continue;
        }
        match value {
            Value::Document(sub) => builder = builder.append(key, include(sub, &rest)),
            Value::Array(items) => {
                let projected: Vec<Value> = items
                    .iter()
                    .filter_map(|item| item.as_document().map(|d| Value::Document(include(d, &rest))))
                    .collect();
                builder = builder.append(key, projected);
            }
            _ => {}
        }
    }
    builder.finalize()
}

fn exclude(document: &Document, paths: &[&[&str]]) -> Document {
    let mut builder = DocumentBuilder::new();
    for (key, value) in document {
        let rest = children(paths, key);
        if rest.iter().any(|p| p.is_empty()) {
            continue;
        }
        if rest.is_empty() {
            builder = builder.append(key, value.clone());
            continue;
        }
        let projected = match value {
            Value::Document(sub) => Value::Document(exclude(sub, &rest)),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Document(d) => Value::Document(exclude(d, &rest)),
                        other => other.clone(),
                    })
                    .collect(),
            ),
            other => other.clone(),
        };
        builder = builder.append(key, projected);
    }
    builder.finalize()
}
