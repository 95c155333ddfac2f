use std::sync::Arc;

use crate::common::{ObjectId, Value};
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use crate::index::IndexModel;
use crate::session::SessionInner;
use crate::store::{Namespace, Store};

use super::{
    DeleteResult, Document, DocumentCursor, FindOptions, InsertManyResult, InsertOneResult, UpdateOptions,
    UpdateResult,
};

/// A handle to one collection of a session.
///
/// Handles are cheap to clone and hold no documents themselves. Every
/// operation checks the owning session is still connected.
///
/// Writes honor the session's write concern: with `w=0` they are still
/// applied, but the result reports them unacknowledged and a failure is only
/// logged.
///
/// ```rust,ignore
/// let collection = session.database("hokori")?.collection("test")?;
/// let result = collection.insert_one(&doc! { name: "MongoDB", count: 1 })?;
/// let first = collection.find_one(&doc! {})?;
/// ```
#[derive(Clone)]
pub struct Collection {
    session: Arc<SessionInner>,
    namespace: Namespace,
}

impl Collection {
    pub(crate) fn new(session: Arc<SessionInner>, namespace: Namespace) -> Self {
        Collection { session, namespace }
    }

    pub fn name(&self) -> &str {
        self.namespace.collection()
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    fn store(&self) -> DocStoreResult<&Store> {
        self.session.ensure_connected()?;
        Ok(self.session.store())
    }

    fn execute_write<T>(
        &self,
        operation: &str,
        unacknowledged: T,
        write: impl FnOnce(&Store) -> DocStoreResult<T>,
    ) -> DocStoreResult<T> {
        let store = self.store()?;
        let result = write(store);
        if self.session.write_concern().is_acknowledged() {
            return result;
        }
        if let Err(e) = result {
            log::error!("Unacknowledged {} on {} failed: {}", operation, self.namespace, e);
        }
        Ok(unacknowledged)
    }

    /// Inserts a document. A document without `_id` gets a new [ObjectId] as
    /// its first field.
    pub fn insert_one(&self, document: &Document) -> DocStoreResult<InsertOneResult> {
        let document = with_id(document);
        self.execute_write("insert", InsertOneResult::Unacknowledged, |store| {
            let id = store.insert_one(&self.namespace, document)?;
            log::debug!("Inserted {} into {}", id, self.namespace);
            Ok(InsertOneResult::acknowledged(id))
        })
    }

    /// Inserts documents in order. When one fails, those before it stay
    /// inserted and the error is returned.
    pub fn insert_many(&self, documents: &[Document]) -> DocStoreResult<InsertManyResult> {
        self.store()?;
        if documents.is_empty() {
            log::error!("Empty batch passed to insert_many on {}", self.namespace);
            return Err(DocStoreError::new(
                "Cannot insert an empty batch of documents",
                ErrorKind::InvalidOperation,
            ));
        }

        let documents: Vec<Document> = documents.iter().map(with_id).collect();
        let unacknowledged = InsertManyResult {
            acknowledged: false,
            inserted_ids: Vec::new(),
        };
        self.execute_write("insert_many", unacknowledged, |store| {
            let inserted_ids = store.insert_many(&self.namespace, documents)?;
            log::debug!("Inserted {} document(s) into {}", inserted_ids.len(), self.namespace);
            Ok(InsertManyResult {
                acknowledged: true,
                inserted_ids,
            })
        })
    }

    /// Gets the first document matching `filter` in natural order.
    pub fn find_one(&self, filter: &Document) -> DocStoreResult<Option<Document>> {
        let options = FindOptions::new().limit(1);
        let mut cursor = self.store()?.find(&self.namespace, filter, &options)?;
        cursor.next().transpose()
    }

    pub fn find(&self, filter: &Document) -> DocStoreResult<DocumentCursor> {
        self.find_with_options(filter, &FindOptions::default())
    }

    pub fn find_with_options(&self, filter: &Document, options: &FindOptions) -> DocStoreResult<DocumentCursor> {
        self.store()?.find(&self.namespace, filter, options)
    }

    pub fn count_documents(&self, filter: &Document) -> DocStoreResult<u64> {
        self.store()?.count_documents(&self.namespace, filter)
    }

    pub fn update_one(&self, filter: &Document, update: &Document) -> DocStoreResult<UpdateResult> {
        self.update_one_with_options(filter, update, &UpdateOptions::default())
    }

    pub fn update_one_with_options(
        &self,
        filter: &Document,
        update: &Document,
        options: &UpdateOptions,
    ) -> DocStoreResult<UpdateResult> {
        self.update(filter, update, false, options)
    }

    pub fn update_many(&self, filter: &Document, update: &Document) -> DocStoreResult<UpdateResult> {
        self.update_many_with_options(filter, update, &UpdateOptions::default())
    }

    pub fn update_many_with_options(
        &self,
        filter: &Document,
        update: &Document,
        options: &UpdateOptions,
    ) -> DocStoreResult<UpdateResult> {
        self.update(filter, update, true, options)
    }

    fn update(
        &self,
        filter: &Document,
        update: &Document,
        multi: bool,
        options: &UpdateOptions,
    ) -> DocStoreResult<UpdateResult> {
        self.execute_write("update", UpdateResult::unacknowledged(), |store| {
            store.update(&self.namespace, filter, update, multi, options)
        })
    }

    pub fn delete_one(&self, filter: &Document) -> DocStoreResult<DeleteResult> {
        self.execute_write("delete", DeleteResult::unacknowledged(), |store| {
            store.delete(&self.namespace, filter, false)
        })
    }

    pub fn delete_many(&self, filter: &Document) -> DocStoreResult<DeleteResult> {
        self.execute_write("delete", DeleteResult::unacknowledged(), |store| {
            store.delete(&self.namespace, filter, true)
        })
    }

    /// Creates an index and returns its name. Index creation is always
    /// acknowledged.
    pub fn create_index(&self, model: &IndexModel) -> DocStoreResult<String> {
        let name = self.store()?.create_index(&self.namespace, model)?;
        log::debug!("Index {} ready on {}", name, self.namespace);
        Ok(name)
    }

    pub fn list_indexes(&self) -> DocStoreResult<Vec<IndexModel>> {
        self.store()?.list_indexes(&self.namespace)
    }

    /// Drops the collection with its documents and indexes. Dropping a
    /// collection that does not exist succeeds.
    pub fn drop(&self) -> DocStoreResult<()> {
        self.store()?.drop_collection(&self.namespace)
    }
}

fn with_id(document: &Document) -> Document {
    let mut document = document.clone();
    if document.id().is_none() {
        document.insert_id(Value::ObjectId(ObjectId::new()));
    }
    document
}
