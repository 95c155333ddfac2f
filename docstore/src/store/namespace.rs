use std::fmt::Display;

use crate::common::SYSTEM_COLLECTION_PREFIX;
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};

/// The `(database, collection)` pair a collection handle addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace {
    database: String,
    collection: String,
}

impl Namespace {
    /// Creates a namespace after validating both names.
    pub fn new(database: &str, collection: &str) -> DocStoreResult<Namespace> {
        validate_database_name(database)?;
        validate_collection_name(collection)?;
        Ok(Namespace {
            database: database.to_string(),
            collection: collection.to_string(),
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

fn invalid_name(message: String) -> DocStoreError {
    log::error!("{}", message);
    DocStoreError::new(&message, ErrorKind::InvalidOperation)
}

pub(crate) fn validate_database_name(name: &str) -> DocStoreResult<()> {
    if name.is_empty() {
        return Err(invalid_name("Database name cannot be empty".to_string()));
    }
    if let Some(c) = name.chars().find(|c| matches!(c, '/' | '\\' | '.' | ' ' | '"' | '$' | '\0')) {
        return Err(invalid_name(format!(
            "Database name '{}' contains the invalid character {:?}",
            name, c
        )));
    }
    Ok(())
}

pub(crate) fn validate_collection_name(name: &str) -> DocStoreResult<()> {
    if name.is_empty() {
        return Err(invalid_name("Collection name cannot be empty".to_string()));
    }
    if name.contains('$') || name.contains('\0') {
        return Err(invalid_name(format!(
            "Collection name '{}' contains an invalid character",
            name
        )));
    }
    if name.starts_with(SYSTEM_COLLECTION_PREFIX) {
        return Err(invalid_name(format!(
            "Collection name '{}' is reserved for the store",
            name
        )));
    }
    Ok(())
}
