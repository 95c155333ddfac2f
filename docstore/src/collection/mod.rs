//! Documents and collections.
//!
//! A [Document] is an ordered, immutable mapping of field names to
//! [Value](crate::common::Value)s, built with [DocumentBuilder] or the
//! [doc!](crate::doc) macro:
//!
//! ```rust,ignore
//! use docstore::doc;
//!
//! let document = doc! {
//!     name: "MongoDB",
//!     type: "database",
//!     count: 1,
//!     versions: ["v3.2", "v3.0", "v2.6"],
//!     info: { x: 203, y: 102 },
//! };
//! ```
//!
//! A [Collection] is a handle to the documents of one namespace of a session.
//! Queries return a [DocumentCursor]; writes return [InsertOneResult],
//! [InsertManyResult], [UpdateResult] or [DeleteResult].
//!
//! # Reserved Fields
//!
//! `_id` identifies a stored document. It is assigned on insert when absent
//! and can never be changed by an update.

#[allow(clippy::module_inception)]
mod collection;
mod cursor;
mod document;
mod find_options;
mod results;
mod update_options;

pub use collection::*;
pub use cursor::*;
pub use document::*;
pub use find_options::*;
pub use results::*;
pub use update_options::*;
