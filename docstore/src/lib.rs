//! # docstore - a small document store client
//!
//! docstore is a client for MongoDB-style document databases. It models
//! documents, typed values and object ids, compiles filter and update
//! documents, and runs them against a pluggable store backend.
//!
//! ## Key Features
//!
//! - **Documents**: ordered, immutable, built with `DocumentBuilder` or `doc!`
//! - **Typed reads**: every getter reports a type mismatch instead of coercing
//! - **Queries**: comparison, membership, existence, regex and logical operators
//! - **Updates**: `$set`, `$unset`, `$inc`, `$mul` and `$push`, with upserts
//! - **Indexes**: named, ascending or descending, unique or not
//! - **Backends**: an in-process `memory://` store and, with the `mongodb`
//!   feature, MongoDB deployments through the official driver
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docstore::doc;
//! use docstore::instance::Instance;
//! use docstore::session::Session;
//!
//! # fn main() -> docstore::errors::DocStoreResult<()> {
//! // Once per process
//! let instance = Instance::new()?;
//!
//! let session = Session::connect(&instance, "memory://localhost:27017")?;
//! let collection = session.database("hokori")?.collection("test")?;
//!
//! let result = collection.insert_one(&doc! { name: "MongoDB", count: 1 })?;
//! println!("inserted {}", result);
//!
//! for document in collection.find(&doc! { count: { "$gte": 1 } })? {
//!     println!("{}", document?.to_json()?);
//! }
//!
//! session.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`collection`] - Documents, collection handles, cursors, options and results
//! - [`common`] - Values, object ids and reserved names
//! - [`connection_string`] - Connection string parsing
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - Query filter compilation and evaluation
//! - [`index`] - Index models and options
//! - [`instance`] - The process-wide instance
//! - [`session`] - Sessions, their configuration and databases
//! - [`store`] - Store backends
//! - [`update`] - Update operator compilation and application

pub mod collection;
pub mod common;
pub mod connection_string;
pub mod errors;
pub mod filter;
pub mod index;
pub mod instance;
pub mod session;
pub mod store;
pub mod update;

pub use collection::{Collection, Document, DocumentBuilder, DocumentCursor};
pub use common::{ObjectId, Value, ValueType};
pub use errors::{DocStoreError, DocStoreResult, ErrorKind};
pub use instance::Instance;
pub use session::{Database, Session};

#[cfg(test)]
#[ctor::ctor]
fn init() {
    colog::init();
}
