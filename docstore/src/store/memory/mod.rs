//! The in-process store behind `memory://` connection strings.
//!
//! A [MemoryDeployment] holds the collections of one memory address. The
//! process-wide `Instance` keeps one deployment per `host:port`, so every
//! session connected to the same address sees the same data.

mod backend;
mod collection;
mod deployment;

pub use backend::*;
pub(crate) use collection::*;
pub use deployment::*;
