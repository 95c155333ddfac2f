//! Store backends and abstractions.
//!
//! A session talks to its deployment through the [StoreBackend] trait. Two
//! backends exist:
//! - **Memory**: [memory::MemoryBackend], an in-process store that evaluates
//!   filters, updates and indexes itself. Used for `memory://` connection
//!   strings and by every test.
//! - **MongoDB**: `MongoBackend` on top of the official driver, compiled with
//!   the `mongodb` feature and used for `mongodb://` and `mongodb+srv://`.
//!
//! Collections are addressed by a validated [Namespace].

pub mod memory;
#[cfg(feature = "mongodb")]
mod mongo;
mod namespace;
mod store_backend;

#[cfg(feature = "mongodb")]
pub use mongo::MongoBackend;
pub use namespace::*;
pub use store_backend::*;
