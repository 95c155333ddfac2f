use std::fmt::Display;

use regex::{Regex, RegexBuilder};

use crate::{
    collection::Document,
    errors::{DocStoreError, DocStoreResult, ErrorKind},
};

use super::{matches_any, resolve_values, FilterProvider};

/// Matches string fields, or arrays holding strings, against a regular
/// expression.
pub(crate) struct RegexFilter {
    field_name: String,
    pattern: Regex,
    options: String,
}

impl RegexFilter {
    /// Compiles `pattern` with `$options` style flags: `i`, `m`, `s`, `x`.
    pub(crate) fn new(field_name: String, pattern: &str, options: &str) -> DocStoreResult<Self> {
        let mut builder = RegexBuilder::new(pattern);
        for flag in options.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                other => {
                    log::error!("Unsupported regex option '{}' for field {}", other, field_name);
                    return Err(DocStoreError::new(
                        &format!("Unsupported regex option '{}'", other),
                        ErrorKind::FilterError,
                    ));
                }
            };
        }

        let pattern = builder.build().map_err(|e| {
            log::error!("Invalid regex '{}' for field {}: {}", pattern, field_name, e);
            DocStoreError::from(e)
        })?;

        Ok(RegexFilter {
            field_name,
            pattern,
            options: options.to_string(),
        })
    }
}

impl Display for RegexFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} =~ /{}/{})", self.field_name, self.pattern, self.options)
    }
}

impl FilterProvider for RegexFilter {
    fn apply(&self, entry: &Document) -> DocStoreResult<bool> {
        Ok(resolve_values(entry, &self.field_name).into_iter().any(|value| {
            matches_any(value, |v| {
                v.as_str().map(|s| self.pattern.is_match(s)).unwrap_or(false)
            })
        }))
    }
}
