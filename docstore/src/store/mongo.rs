use mongodb::bson::{self, Bson};
use mongodb::options::{
    Acknowledgment, ClientOptions, IndexOptions as DriverIndexOptions, WriteConcern as DriverWriteConcern,
};
use mongodb::sync::{Client, Collection as DriverCollection};
use mongodb::IndexModel as DriverIndexModel;

use crate::collection::{
    DeleteResult, Document, DocumentBuilder, DocumentCursor, FindOptions, UpdateOptions, UpdateResult,
};
use crate::common::{ObjectId, Value};
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use crate::index::{IndexModel, IndexOptions};
use crate::session::{SessionConfig, WriteConcern};
use crate::store::{Namespace, StoreBackend};

/// A [StoreBackend] over a MongoDB deployment, driven through the official
/// driver's blocking API.
///
/// Filters, updates, sorting and index rules are all evaluated by the server.
pub struct MongoBackend {
    client: Client,
}

impl MongoBackend {
    /// Creates a client for the session's deployment, carrying its write
    /// concern and application name. No connection is made until the first
    /// operation.
    pub fn connect(config: &SessionConfig) -> DocStoreResult<Self> {
        log::info!("Creating MongoDB client with {}", config.write_concern());
        let options = client_options(config)?;
        let client = Client::with_options(options).map_err(|e| {
            log::error!("Failed to create MongoDB client: {}", e);
            DocStoreError::new_with_cause(
                "Failed to create MongoDB client",
                ErrorKind::ConnectionError,
                DocStoreError::from(e),
            )
        })?;
        Ok(MongoBackend { client })
    }

    fn collection(&self, namespace: &Namespace) -> DriverCollection<bson::Document> {
        self.client
            .database(namespace.database())
            .collection::<bson::Document>(namespace.collection())
    }
}

fn client_options(config: &SessionConfig) -> DocStoreResult<ClientOptions> {
    let mut options = ClientOptions::parse(config.connection_string().as_str())
        .run()
        .map_err(|e| {
            log::error!("Driver rejected connection string {}: {}", config.connection_string(), e);
            DocStoreError::new_with_cause(
                &format!("Invalid connection string {}", config.connection_string()),
                ErrorKind::InvalidUri,
                DocStoreError::from(e),
            )
        })?;
    options.write_concern = Some(driver_write_concern(config.write_concern()));
    if let Some(app_name) = config.app_name() {
        options.app_name = Some(app_name.to_string());
    }
    Ok(options)
}

fn driver_write_concern(write_concern: WriteConcern) -> DriverWriteConcern {
    let acknowledgment = match write_concern {
        WriteConcern::Unacknowledged => Acknowledgment::Nodes(0),
        WriteConcern::Nodes(n) => Acknowledgment::Nodes(n),
        WriteConcern::Majority => Acknowledgment::Majority,
    };
    DriverWriteConcern::builder().w(acknowledgment).build()
}

impl StoreBackend for MongoBackend {
    fn kind(&self) -> &'static str {
        "mongodb"
    }

    fn ping(&self) -> DocStoreResult<()> {
        self.client.database("admin").run_command(bson::doc! { "ping": 1 }).run()?;
        Ok(())
    }

    fn list_database_names(&self) -> DocStoreResult<Vec<String>> {
        Ok(self.client.list_database_names().run()?)
    }

    fn list_collection_names(&self, database: &str) -> DocStoreResult<Vec<String>> {
        Ok(self.client.database(database).list_collection_names().run()?)
    }

    fn insert_one(&self, namespace: &Namespace, document: Document) -> DocStoreResult<Value> {
        let result = self.collection(namespace).insert_one(to_bson_document(&document)).run()?;
        from_bson(result.inserted_id)
    }

    fn insert_many(&self, namespace: &Namespace, documents: Vec<Document>) -> DocStoreResult<Vec<Value>> {
        let documents: Vec<bson::Document> = documents.iter().map(to_bson_document).collect();
        let result = self.collection(namespace).insert_many(documents).run()?;
        let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(position, _)| *position);
        ids.into_iter().map(|(_, id)| from_bson(id)).collect()
    }

    fn find(&self, namespace: &Namespace, filter: &Document, options: &FindOptions) -> DocStoreResult<DocumentCursor> {
        let collection = self.collection(namespace);
        let mut action = collection.find(to_bson_document(filter));
        if let Some(sort) = options.get_sort() {
            action = action.sort(to_bson_document(sort));
        }
        if let Some(skip) = options.get_skip() {
            action = action.skip(skip);
        }
        if let Some(limit) = options.get_limit() {
            action = action.limit(limit as i64);
        }
        if let Some(projection) = options.get_projection() {
            action = action.projection(to_bson_document(projection));
        }
        let cursor = action.run()?;
        let documents = cursor.map(|result| match result {
            Ok(document) => from_bson_document(document),
            Err(e) => Err(DocStoreError::from(e)),
        });
        Ok(DocumentCursor::new(Box::new(documents)))
    }

    fn count_documents(&self, namespace: &Namespace, filter: &Document) -> DocStoreResult<u64> {
        Ok(self.collection(namespace).count_documents(to_bson_document(filter)).run()?)
    }

    fn update(
        &self,
        namespace: &Namespace,
        filter: &Document,
        update: &Document,
        multi: bool,
        options: &UpdateOptions,
    ) -> DocStoreResult<UpdateResult> {
        let collection = self.collection(namespace);
        let filter = to_bson_document(filter);
        let update = to_bson_document(update);
        let result = if multi {
            collection.update_many(filter, update).upsert(options.is_upsert()).run()?
        } else {
            collection.update_one(filter, update).upsert(options.is_upsert()).run()?
        };
        Ok(UpdateResult {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id.map(from_bson).transpose()?,
        })
    }

    fn delete(&self, namespace: &Namespace, filter: &Document, multi: bool) -> DocStoreResult<DeleteResult> {
        let collection = self.collection(namespace);
        let filter = to_bson_document(filter);
        let result = if multi {
            collection.delete_many(filter).run()?
        } else {
            collection.delete_one(filter).run()?
        };
        Ok(DeleteResult {
            acknowledged: true,
            deleted_count: result.deleted_count,
        })
    }

    fn create_index(&self, namespace: &Namespace, model: &IndexModel) -> DocStoreResult<String> {
        model.validate()?;
        let options = DriverIndexOptions::builder()
            .name(model.name())
            .unique(model.is_unique())
            .build();
        let index = DriverIndexModel::builder()
            .keys(to_bson_document(model.keys()))
            .options(options)
            .build();
        let result = self.collection(namespace).create_index(index).run()?;
        Ok(result.index_name)
    }

    fn list_indexes(&self, namespace: &Namespace) -> DocStoreResult<Vec<IndexModel>> {
        let mut models = Vec::new();
        for index in self.collection(namespace).list_indexes().run()? {
            let index = index?;
            let (name, unique) = match &index.options {
                Some(options) => (options.name.clone(), options.unique.unwrap_or(false)),
                None => (None, false),
            };
            let keys = from_bson_document(index.keys)?;
            models.push(IndexModel::new(keys, IndexOptions::new(name.as_deref(), unique)));
        }
        Ok(models)
    }

    fn drop_collection(&self, namespace: &Namespace) -> DocStoreResult<()> {
        self.collection(namespace).drop().run()?;
        Ok(())
    }

    fn close(&self) -> DocStoreResult<()> {
        log::debug!("Closing MongoDB backend");
        Ok(())
    }
}

pub(crate) fn to_bson_document(document: &Document) -> bson::Document {
    let mut converted = bson::Document::new();
    for (key, value) in document {
        converted.insert(key.clone(), to_bson(value));
    }
    converted
}

pub(crate) fn to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Bool(v) => Bson::Boolean(*v),
        Value::I32(v) => Bson::Int32(*v),
        Value::I64(v) => Bson::Int64(*v),
        Value::F64(v) => Bson::Double(*v),
        Value::String(v) => Bson::String(v.clone()),
        Value::Document(v) => Bson::Document(to_bson_document(v)),
        Value::Array(v) => Bson::Array(v.iter().map(to_bson).collect()),
        Value::ObjectId(v) => Bson::ObjectId(bson::oid::ObjectId::from_bytes(v.bytes())),
    }
}

pub(crate) fn from_bson_document(document: bson::Document) -> DocStoreResult<Document> {
    let mut builder = DocumentBuilder::new();
    for (key, value) in document {
        builder = builder.append(&key, from_bson(value)?);
    }
    Ok(builder.finalize())
}

/// Converts a driver value. Types without a direct counterpart, such as
/// dates or binary data, go through their relaxed Extended JSON form.
pub(crate) fn from_bson(value: Bson) -> DocStoreResult<Value> {
    Ok(match value {
        Bson::Null => Value::Null,
        Bson::Boolean(v) => Value::Bool(v),
        Bson::Int32(v) => Value::I32(v),
        Bson::Int64(v) => Value::I64(v),
        Bson::Double(v) => Value::F64(v),
        Bson::String(v) => Value::String(v),
        Bson::Document(v) => Value::Document(from_bson_document(v)?),
        Bson::Array(v) => Value::Array(v.into_iter().map(from_bson).collect::<DocStoreResult<_>>()?),
        Bson::ObjectId(v) => Value::ObjectId(ObjectId::from_bytes(v.bytes())),
        other => Value::from_json(other.into_relaxed_extjson())?,
    })
}
