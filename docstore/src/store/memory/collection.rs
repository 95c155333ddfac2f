use std::collections::BTreeSet;
use std::sync::Arc;

use itertools::Itertools;
use parking_lot::RwLock;

use crate::collection::{compare_documents, DeleteResult, Document, DocumentCursor, FindOptions, UpdateResult};
use crate::common::{ObjectId, Value};
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use crate::filter::Filter;
use crate::index::IndexModel;
use crate::store::Namespace;
use crate::update::{upsert_seed, UpdateSpec};

/// An index of a memory collection. Unique indexes keep the set of keys in
/// use.
struct IndexEntry {
    model: IndexModel,
    keys: Option<BTreeSet<Vec<Value>>>,
}

impl IndexEntry {
    fn new(model: IndexModel) -> Self {
        let keys = if model.is_unique() {
            Some(BTreeSet::new())
        } else {
            None
        };
        IndexEntry { model, keys }
    }
}

struct CollectionData {
    documents: im::Vector<Document>,
    indexes: Vec<IndexEntry>,
}

/// The documents and indexes of one collection of a memory deployment.
///
/// Documents are kept in insertion order in a persistent vector, so a query
/// snapshot is a cheap clone that later writes never disturb.
#[derive(Clone)]
pub(crate) struct MemoryCollection {
    namespace: Namespace,
    inner: Arc<RwLock<CollectionData>>,
}

impl MemoryCollection {
    pub(crate) fn new(namespace: Namespace) -> Self {
        MemoryCollection {
            namespace,
            inner: Arc::new(RwLock::new(CollectionData {
                documents: im::Vector::new(),
                indexes: vec![IndexEntry::new(IndexModel::id_index())],
            })),
        }
    }

    pub(crate) fn snapshot(&self) -> im::Vector<Document> {
        self.inner.read().documents.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.read().documents.len()
    }

    pub(crate) fn insert(&self, document: Document) -> DocStoreResult<Value> {
        let id = document.id().cloned().ok_or_else(|| {
            log::error!("Document without _id handed to {}", self.namespace);
            DocStoreError::new("Document has no _id", ErrorKind::InternalError)
        })?;

        let mut data = self.inner.write();
        self.check_unique(&data, &document, None)?;
        for entry in data.indexes.iter_mut() {
            if let Some(keys) = entry.keys.as_mut() {
                keys.insert(entry.model.key_of(&document));
            }
        }
        data.documents.push_back(document);
        log::debug!("Inserted document {} into {}", id, self.namespace);
        Ok(id)
    }

    /// Fails with [ErrorKind::DuplicateKey] when `document` collides with a
    /// stored document under a unique index. `previous` is the stored version
    /// of the document being replaced, if any.
    fn check_unique(
        &self,
        data: &CollectionData,
        document: &Document,
        previous: Option<&Document>,
    ) -> DocStoreResult<()> {
        for entry in &data.indexes {
            let keys = match &entry.keys {
                Some(keys) => keys,
                None => continue,
            };
            let key = entry.model.key_of(document);
            let own = previous.map(|p| entry.model.key_of(p) == key).unwrap_or(false);
            if !own && keys.contains(&key) {
                let dup = entry
                    .model
                    .fields()
                    .iter()
                    .zip(key.iter())
                    .map(|(field, value)| format!("{}: {}", field, value))
                    .join(", ");
                log::error!(
                    "Duplicate key in {} on index {}: {{ {} }}",
                    self.namespace,
                    entry.model.name(),
                    dup
                );
                return Err(DocStoreError::new(
                    &format!(
                        "E11000 duplicate key error collection: {} index: {} dup key: {{ {} }}",
                        self.namespace,
                        entry.model.name(),
                        dup
                    ),
                    ErrorKind::DuplicateKey,
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn find(&self, filter: &Document, options: &FindOptions) -> DocStoreResult<DocumentCursor> {
        let compiled = Filter::parse(filter)?;
        let sort_keys = options.sort_keys()?;
        let projection = options.compiled_projection()?;
        let skip = options.get_skip().unwrap_or(0) as usize;
        let limit = match options.get_limit() {
            Some(0) | None => usize::MAX,
            Some(limit) => limit as usize,
        };
        log::debug!("Find in {} with filter {}", self.namespace, compiled);

        let snapshot = self.snapshot();
        if sort_keys.is_empty() {
            let matches = snapshot.into_iter().filter_map(move |document| match compiled.apply(&document) {
                Ok(true) => Some(Ok(document)),
                Ok(false) => None,
                Err(e) => Some(Err(e)),
            });
            let page = matches.skip(skip).take(limit).map(move |result| {
                result.map(|document| match &projection {
                    Some(projection) => projection.apply(&document),
                    None => document,
                })
            });
            return Ok(DocumentCursor::new(Box::new(page)));
        }

        let mut matches = Vec::new();
        for document in snapshot {
            if compiled.apply(&document)? {
                matches.push(document);
            }
        }
        matches.sort_by(|a, b| compare_documents(a, b, &sort_keys));
        let page = matches
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|document| match &projection {
                Some(projection) => projection.apply(&document),
                None => document,
            })
            .collect();
        Ok(DocumentCursor::from_documents(page))
    }

    pub(crate) fn count(&self, filter: &Document) -> DocStoreResult<u64> {
        let compiled = Filter::parse(filter)?;
        let mut count = 0;
        for document in self.snapshot() {
            if compiled.apply(&document)? {
                count += 1;
            }
        }
        Ok(count)
    }

    pub(crate) fn update(
        &self,
        filter: &Document,
        update: &Document,
        multi: bool,
        upsert: bool,
    ) -> DocStoreResult<UpdateResult> {
        let compiled = Filter::parse(filter)?;
        let spec = UpdateSpec::parse(update)?;
        log::debug!("Update in {} where {} with {}", self.namespace, compiled, spec);

        let mut data = self.inner.write();
        let mut matched_count = 0;
        let mut modified_count = 0;

        for position in 0..data.documents.len() {
            let current = data.documents[position].clone();
            if !compiled.apply(&current)? {
                continue;
            }
            matched_count += 1;

            let updated = spec.apply(&current)?;
            if updated != current {
                self.check_unique(&data, &updated, Some(&current))?;
                reindex(&mut data, &current, Some(&updated));
                data.documents.set(position, updated);
                modified_count += 1;
            }

            if !multi {
                break;
            }
        }

        let mut upserted_id = None;
        if matched_count == 0 && upsert {
            let mut document = spec.apply(&upsert_seed(filter)?)?;
            let id = match document.id() {
                Some(id) => id.clone(),
                None => {
                    let id = Value::ObjectId(ObjectId::new());
                    document.insert_id(id.clone());
                    id
                }
            };
            self.check_unique(&data, &document, None)?;
            for entry in data.indexes.iter_mut() {
                if let Some(keys) = entry.keys.as_mut() {
                    keys.insert(entry.model.key_of(&document));
                }
            }
            data.documents.push_back(document);
            log::debug!("Upserted document {} into {}", id, self.namespace);
            upserted_id = Some(id);
        }

        Ok(UpdateResult {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_id,
        })
    }

    pub(crate) fn delete(&self, filter: &Document, multi: bool) -> DocStoreResult<DeleteResult> {
        let compiled = Filter::parse(filter)?;
        let mut data = self.inner.write();

        let mut positions = Vec::new();
        for (position, document) in data.documents.iter().enumerate() {
            if compiled.apply(document)? {
                positions.push(position);
                if !multi {
                    break;
                }
            }
        }

        for position in positions.iter().rev() {
            let removed = data.documents.remove(*position);
            reindex(&mut data, &removed, None);
        }
        log::debug!("Deleted {} document(s) from {} where {}", positions.len(), self.namespace, compiled);

        Ok(DeleteResult {
            acknowledged: true,
            deleted_count: positions.len() as u64,
        })
    }

    pub(crate) fn create_index(&self, model: &IndexModel) -> DocStoreResult<String> {
        model.validate()?;
        let name = model.name();
        let mut data = self.inner.write();

        if let Some(existing) = data.indexes.iter().find(|e| e.model.name() == name) {
            if existing.model.same_definition(model) {
                log::debug!("Index {} already exists on {}", name, self.namespace);
                return Ok(name);
            }
            log::error!("Index {} already exists on {} with different keys or options", name, self.namespace);
            return Err(DocStoreError::new(
                &format!("An index named '{}' already exists with a different definition", name),
                ErrorKind::IndexError,
            ));
        }

        if let Some(existing) = data.indexes.iter().find(|e| e.model.keys() == model.keys()) {
            log::error!(
                "Index with keys {} already exists on {} as {}",
                model.keys(),
                self.namespace,
                existing.model.name()
            );
            return Err(DocStoreError::new(
                &format!(
                    "Index with keys {} already exists with the name '{}'",
                    model.keys(),
                    existing.model.name()
                ),
                ErrorKind::IndexError,
            ));
        }

        let mut entry = IndexEntry::new(model.clone());
        if let Some(keys) = entry.keys.as_mut() {
            for document in data.documents.iter() {
                let key = model.key_of(document);
                if !keys.insert(key.clone()) {
                    log::error!("Cannot build unique index {} on {}: duplicate key {:?}", name, self.namespace, key);
                    return Err(DocStoreError::new(
                        &format!(
                            "E11000 duplicate key error collection: {} index: {} dup key: {}",
                            self.namespace,
                            name,
                            Value::Array(key)
                        ),
                        ErrorKind::DuplicateKey,
                    ));
                }
            }
        }

        data.indexes.push(entry);
        log::debug!("Created index {} on {}", name, self.namespace);
        Ok(name)
    }

    pub(crate) fn list_indexes(&self) -> Vec<IndexModel> {
        self.inner.read().indexes.iter().map(|e| e.model.clone()).collect()
    }
}

/// Moves the unique keys of `old` to those of `new`, or drops them.
fn reindex(data: &mut CollectionData, old: &Document, new: Option<&Document>) {
    for entry in data.indexes.iter_mut() {
        if let Some(keys) = entry.keys.as_mut() {
            keys.remove(&entry.model.key_of(old));
            if let Some(new) = new {
                keys.insert(entry.model.key_of(new));
            }
        }
    }
}
