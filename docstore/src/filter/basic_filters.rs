use std::fmt::Display;

use itertools::Itertools;

use crate::{collection::Document, common::Value, errors::DocStoreResult};

use super::{matches_any, resolve_values, FilterProvider};

pub(crate) struct AllFilter;

impl FilterProvider for AllFilter {
    fn apply(&self, _entry: &Document) -> DocStoreResult<bool> {
        Ok(true)
    }
}

impl Display for AllFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AllFilter")
    }
}

/// Matches when the field equals the value, or holds an array with an element
/// equal to it. A `null` value also matches a missing field.
pub(crate) struct EqualsFilter {
    field_name: String,
    field_value: Value,
}

impl EqualsFilter {
    #[inline]
    pub(crate) fn new(field_name: String, field_value: Value) -> Self {
        EqualsFilter {
            field_name,
            field_value,
        }
    }
}

pub(crate) fn equals_value(entry: &Document, field_name: &str, field_value: &Value) -> bool {
    let values = resolve_values(entry, field_name);
    if values.is_empty() {
        return field_value.is_null();
    }
    values
        .into_iter()
        .any(|value| matches_any(value, |v| v == field_value))
}

impl Display for EqualsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} == {})", self.field_name, self.field_value)
    }
}

impl FilterProvider for EqualsFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> DocStoreResult<bool> {
        Ok(equals_value(entry, &self.field_name, &self.field_value))
    }
}

/// Matches when the field equals any of the values.
pub(crate) struct InFilter {
    field_name: String,
    field_values: Vec<Value>,
}

impl InFilter {
    #[inline]
    pub(crate) fn new(field_name: String, field_values: Vec<Value>) -> Self {
        InFilter {
            field_name,
            field_values,
        }
    }
}

impl Display for InFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({} in [{}])",
            self.field_name,
            self.field_values.iter().join(", ")
        )
    }
}

impl FilterProvider for InFilter {
    fn apply(&self, entry: &Document) -> DocStoreResult<bool> {
        Ok(self
            .field_values
            .iter()
            .any(|value| equals_value(entry, &self.field_name, value)))
    }
}

/// Matches on the presence of a field, whatever its value.
pub(crate) struct ExistsFilter {
    field_name: String,
    exists: bool,
}

impl ExistsFilter {
    #[inline]
    pub(crate) fn new(field_name: String, exists: bool) -> Self {
        ExistsFilter { field_name, exists }
    }
}

impl Display for ExistsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.exists {
            write!(f, "({} exists)", self.field_name)
        } else {
            write!(f, "({} not exists)", self.field_name)
        }
    }
}

impl FilterProvider for ExistsFilter {
    fn apply(&self, entry: &Document) -> DocStoreResult<bool> {
        let present = !resolve_values(entry, &self.field_name).is_empty();
        Ok(present == self.exists)
    }
}
