//! Query filters.
//!
//! Filter documents such as `{"i": {"$gt": 50, "$lte": 100}}` are compiled by
//! [Filter::parse] into a tree of [FilterProvider]s and evaluated against
//! documents one at a time.
//!
//! | operator                       | meaning                                    |
//! |--------------------------------|--------------------------------------------|
//! | `{f: v}`, `$eq`, `$ne`         | equality, or membership when `f` is an array |
//! | `$gt`, `$gte`, `$lt`, `$lte`   | ordering within one type bracket            |
//! | `$in`, `$nin`                  | equality with any value of an array         |
//! | `$exists`                      | presence of a field                         |
//! | `$regex`, `$options`           | regular expression over strings             |
//! | `$not`                         | negation of the field's operators           |
//! | `$and`, `$or`, `$nor`          | combination of filter documents             |
mod filter;
mod parser;

mod basic_filters;
mod logical_filters;
mod pattern_filters;
mod range_filters;

pub(crate) use basic_filters::*;
pub use filter::{Filter, FilterProvider};
pub(crate) use filter::{matches_any, resolve_values};
pub(crate) use logical_filters::*;
pub(crate) use parser::is_operator_document;
pub(crate) use pattern_filters::*;
pub(crate) use range_filters::*;
