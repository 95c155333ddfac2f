use std::cmp::Ordering;
use std::fmt::Display;

use crate::{collection::Document, common::Value, errors::DocStoreResult};

use super::{matches_any, resolve_values, FilterProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ComparisonMode {
    Greater,
    GreaterEqual,
    Lesser,
    LesserEqual,
}

impl ComparisonMode {
    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            ComparisonMode::Greater => ordering == Ordering::Greater,
            ComparisonMode::GreaterEqual => ordering != Ordering::Less,
            ComparisonMode::Lesser => ordering == Ordering::Less,
            ComparisonMode::LesserEqual => ordering != Ordering::Greater,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            ComparisonMode::Greater => ">",
            ComparisonMode::GreaterEqual => ">=",
            ComparisonMode::Lesser => "<",
            ComparisonMode::LesserEqual => "<=",
        }
    }
}

/// Orders the field against a value of the same type bracket.
///
/// Values of another bracket never match, so `{i: {$gt: 5}}` skips documents
/// where `i` is a string. A NaN is not ordered against other numbers here even
/// though it sorts first.
pub(crate) struct ComparisonFilter {
    field_name: String,
    field_value: Value,
    comparison_mode: ComparisonMode,
}

impl ComparisonFilter {
    pub(crate) fn new(field_name: String, field_value: Value, comparison_mode: ComparisonMode) -> Self {
        ComparisonFilter {
            field_name,
            field_value,
            comparison_mode,
        }
    }

    fn compare(&self, value: &Value) -> bool {
        match (value.is_nan(), self.field_value.is_nan()) {
            (false, false) => {}
            // NaN only ever equals NaN
            (true, true) => return self.comparison_mode.accepts(Ordering::Equal),
            _ => return false,
        }
        value
            .compare_in_bracket(&self.field_value)
            .map(|ordering| self.comparison_mode.accepts(ordering))
            .unwrap_or(false)
    }
}

impl Display for ComparisonFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({} {} {})",
            self.field_name,
            self.comparison_mode.symbol(),
            self.field_value
        )
    }
}

impl FilterProvider for ComparisonFilter {
    fn apply(&self, entry: &Document) -> DocStoreResult<bool> {
        Ok(resolve_values(entry, &self.field_name)
            .into_iter()
            .any(|value| matches_any(value, |v| self.compare(v))))
    }
}
