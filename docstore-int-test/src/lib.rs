//! Shared harness for the docstore integration tests and the stress binary.

pub mod test_util;
