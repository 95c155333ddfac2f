use std::ops::Deref;
use std::sync::Arc;

use crate::collection::{Document, DocumentCursor, FindOptions, UpdateOptions};
use crate::collection::{DeleteResult, UpdateResult};
use crate::common::Value;
use crate::errors::DocStoreResult;
use crate::index::IndexModel;

use super::Namespace;

/// Low-level interface of a document store deployment.
///
/// A backend executes already validated requests against one deployment.
/// Sessions assign `_id`s before inserting, apply the write concern to the
/// reported results, and guard every call against use after close.
///
/// # Implementations
/// - `MemoryBackend`: in-process deployments, the default and the one tests use
/// - `MongoBackend`: a MongoDB deployment through the official driver, behind
///   the `mongodb` feature
///
/// # Thread Safety
/// Implementers must be `Send + Sync`.
pub trait StoreBackend: Send + Sync {
    /// Short name of the backend, used in logs.
    fn kind(&self) -> &'static str;

    /// Checks the deployment is reachable.
    fn ping(&self) -> DocStoreResult<()>;

    fn list_database_names(&self) -> DocStoreResult<Vec<String>>;

    fn list_collection_names(&self, database: &str) -> DocStoreResult<Vec<String>>;

    /// Inserts a document that already carries an `_id` and returns that id.
    fn insert_one(&self, namespace: &Namespace, document: Document) -> DocStoreResult<Value>;

    /// Inserts documents in order, stopping at the first failure. Documents
    /// before the failing one stay inserted.
    fn insert_many(&self, namespace: &Namespace, documents: Vec<Document>) -> DocStoreResult<Vec<Value>>;

    fn find(
        &self,
        namespace: &Namespace,
        filter: &Document,
        options: &FindOptions,
    ) -> DocStoreResult<DocumentCursor>;

    fn count_documents(&self, namespace: &Namespace, filter: &Document) -> DocStoreResult<u64>;

    /// Updates the first matching document, or all of them when `multi` is set.
    fn update(
        &self,
        namespace: &Namespace,
        filter: &Document,
        update: &Document,
        multi: bool,
        options: &UpdateOptions,
    ) -> DocStoreResult<UpdateResult>;

    /// Deletes the first matching document, or all of them when `multi` is set.
    fn delete(&self, namespace: &Namespace, filter: &Document, multi: bool) -> DocStoreResult<DeleteResult>;

    /// Creates an index and returns its name.
    fn create_index(&self, namespace: &Namespace, model: &IndexModel) -> DocStoreResult<String>;

    fn list_indexes(&self, namespace: &Namespace) -> DocStoreResult<Vec<IndexModel>>;

    fn drop_collection(&self, namespace: &Namespace) -> DocStoreResult<()>;

    /// Releases resources held for the session.
    fn close(&self) -> DocStoreResult<()>;
}

/// A shared handle to a [StoreBackend].
///
/// Cloning is cheap, it only increments a reference count.
#[derive(Clone)]
pub struct Store {
    inner: Arc<dyn StoreBackend>,
}

impl Store {
    pub fn new<T: StoreBackend + 'static>(inner: T) -> Self {
        Store {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for Store {
    type Target = Arc<dyn StoreBackend>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
