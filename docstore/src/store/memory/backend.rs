use std::sync::Arc;

use crate::collection::{DeleteResult, Document, DocumentCursor, FindOptions, UpdateOptions, UpdateResult};
use crate::common::Value;
use crate::errors::DocStoreResult;
use crate::filter::Filter;
use crate::index::IndexModel;
use crate::store::{Namespace, StoreBackend};

use super::{MemoryCollection, MemoryDeployment};

/// A [StoreBackend] over a [MemoryDeployment].
///
/// Reads of a collection that does not exist see an empty collection; writes
/// create it.
pub struct MemoryBackend {
    deployment: Arc<MemoryDeployment>,
}

impl MemoryBackend {
    pub fn new(deployment: Arc<MemoryDeployment>) -> Self {
        MemoryBackend { deployment }
    }

    pub fn deployment(&self) -> &Arc<MemoryDeployment> {
        &self.deployment
    }
}

impl StoreBackend for MemoryBackend {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn ping(&self) -> DocStoreResult<()> {
        log::debug!("Ping memory deployment {}", self.deployment.address());
        Ok(())
    }

    fn list_database_names(&self) -> DocStoreResult<Vec<String>> {
        Ok(self.deployment.database_names())
    }

    fn list_collection_names(&self, database: &str) -> DocStoreResult<Vec<String>> {
        Ok(self.deployment.collection_names(database))
    }

    fn insert_one(&self, namespace: &Namespace, document: Document) -> DocStoreResult<Value> {
        self.deployment.get_or_create(namespace).insert(document)
    }

    fn insert_many(&self, namespace: &Namespace, documents: Vec<Document>) -> DocStoreResult<Vec<Value>> {
        let collection = self.deployment.get_or_create(namespace);
        let mut ids = Vec::with_capacity(documents.len());
        for document in documents {
            ids.push(collection.insert(document)?);
        }
        Ok(ids)
    }

    fn find(&self, namespace: &Namespace, filter: &Document, options: &FindOptions) -> DocStoreResult<DocumentCursor> {
        match self.deployment.collection(namespace) {
            Some(collection) => collection.find(filter, options),
            None => {
                // validate the query even when there is nothing to scan
                Filter::parse(filter)?;
                options.sort_keys()?;
                options.compiled_projection()?;
                Ok(DocumentCursor::from_documents(Vec::new()))
            }
        }
    }

    fn count_documents(&self, namespace: &Namespace, filter: &Document) -> DocStoreResult<u64> {
        match self.deployment.collection(namespace) {
            Some(collection) => collection.count(filter),
            None => {
                Filter::parse(filter)?;
                Ok(0)
            }
        }
    }

    fn update(
        &self,
        namespace: &Namespace,
        filter: &Document,
        update: &Document,
        multi: bool,
        options: &UpdateOptions,
    ) -> DocStoreResult<UpdateResult> {
        let collection = if options.is_upsert() {
            self.deployment.get_or_create(namespace)
        } else {
            match self.deployment.collection(namespace) {
                Some(collection) => collection,
                // an empty collection validates and matches nothing
                None => MemoryCollection::new(namespace.clone()),
            }
        };
        collection.update(filter, update, multi, options.is_upsert())
    }

    fn delete(&self, namespace: &Namespace, filter: &Document, multi: bool) -> DocStoreResult<DeleteResult> {
        match self.deployment.collection(namespace) {
            Some(collection) => collection.delete(filter, multi),
            None => {
                Filter::parse(filter)?;
                Ok(DeleteResult {
                    acknowledged: true,
                    deleted_count: 0,
                })
            }
        }
    }

    fn create_index(&self, namespace: &Namespace, model: &IndexModel) -> DocStoreResult<String> {
        self.deployment.get_or_create(namespace).create_index(model)
    }

    fn list_indexes(&self, namespace: &Namespace) -> DocStoreResult<Vec<IndexModel>> {
        Ok(match self.deployment.collection(namespace) {
            Some(collection) => collection.list_indexes(),
            None => Vec::new(),
        })
    }

    fn drop_collection(&self, namespace: &Namespace) -> DocStoreResult<()> {
        if self.deployment.drop_collection(namespace) {
            log::debug!("Dropped collection {}", namespace);
        }
        Ok(())
    }

    fn close(&self) -> DocStoreResult<()> {
        log::debug!("Closing memory backend for {}", self.deployment.address());
        Ok(())
    }
}
