//! Update operators.
//!
//! An update document such as `{"$inc": {"i": 100}}` is compiled into an
//! [UpdateSpec] once per operation and then applied to every matched document.
use std::fmt::Display;

use crate::collection::Document;
use crate::common::{Value, DOC_ID, FIELD_SEPARATOR};
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use crate::filter::is_operator_document;

fn update_error(message: String) -> DocStoreError {
    log::error!("{}", message);
    DocStoreError::new(&message, ErrorKind::UpdateError)
}

#[derive(Debug, Clone, PartialEq)]
enum UpdateOperation {
    Set(String, Value),
    Unset(String),
    Inc(String, Value),
    Mul(String, Value),
    Push(String, Vec<Value>),
}

impl UpdateOperation {
    fn path(&self) -> &str {
        match self {
            UpdateOperation::Set(path, _)
            | UpdateOperation::Unset(path)
            | UpdateOperation::Inc(path, _)
            | UpdateOperation::Mul(path, _)
            | UpdateOperation::Push(path, _) => path,
        }
    }
}

#[derive(Clone, Copy)]
enum Arithmetic {
    Add,
    Multiply,
}

/// A validated set of update operations.
///
/// Supported operators are `$set`, `$unset`, `$inc`, `$mul` and `$push`
/// (with optional `$each`). The update document must be non-empty, contain
/// only operators, and never touch `_id`.
#[derive(Debug, Clone)]
pub struct UpdateSpec {
    operations: Vec<UpdateOperation>,
}

impl UpdateSpec {
    pub fn parse(update: &Document) -> DocStoreResult<UpdateSpec> {
        if update.is_empty() {
            return Err(update_error("Update document must not be empty".to_string()));
        }

        let mut operations: Vec<UpdateOperation> = Vec::new();
        for (operator, operand) in update {
            if !operator.starts_with('$') {
                return Err(update_error(format!(
                    "Update document must contain only update operators, found field '{}'",
                    operator
                )));
            }

            let fields = operand.as_document().ok_or_else(|| {
                update_error(format!(
                    "{} expects a document, found {}",
                    operator,
                    operand.value_type()
                ))
            })?;

            for (path, value) in fields {
                validate_path(operator, path)?;
                if operations.iter().any(|op| paths_conflict(op.path(), path)) {
                    return Err(update_error(format!(
                        "Updating the path '{}' would create a conflict",
                        path
                    )));
                }

                let operation = match operator.as_str() {
                    "$set" => UpdateOperation::Set(path.clone(), value.clone()),
                    "$unset" => UpdateOperation::Unset(path.clone()),
                    "$inc" => UpdateOperation::Inc(path.clone(), numeric_operand(operator, path, value)?),
                    "$mul" => UpdateOperation::Mul(path.clone(), numeric_operand(operator, path, value)?),
                    "$push" => UpdateOperation::Push(path.clone(), push_operand(path, value)?),
                    other => {
                        return Err(update_error(format!("Unknown update operator {}", other)));
                    }
                };
                operations.push(operation);
            }
        }

        Ok(UpdateSpec { operations })
    }

    /// Applies the operations to a copy of `document`.
    pub fn apply(&self, document: &Document) -> DocStoreResult<Document> {
        let mut updated = document.clone();
        for operation in &self.operations {
            match operation {
                UpdateOperation::Set(path, value) => updated.set_path(path, value.clone())?,
                UpdateOperation::Unset(path) => {
                    updated.unset_path(path);
                }
                UpdateOperation::Inc(path, operand) => {
                    let value = match updated.get(path) {
                        None => operand.clone(),
                        Some(current) => arithmetic(path, current, operand, Arithmetic::Add)?,
                    };
                    updated.set_path(path, value)?;
                }
                UpdateOperation::Mul(path, operand) => {
                    let value = match updated.get(path) {
                        None => zero_like(operand),
                        Some(current) => arithmetic(path, current, operand, Arithmetic::Multiply)?,
                    };
                    updated.set_path(path, value)?;
                }
                UpdateOperation::Push(path, items) => {
                    let value = match updated.get(path) {
                        None => Value::Array(items.clone()),
                        Some(Value::Array(existing)) => {
                            let mut existing = existing.clone();
                            existing.extend(items.iter().cloned());
                            Value::Array(existing)
                        }
                        Some(other) => {
                            return Err(update_error(format!(
                                "$push on '{}' requires an array, found {}",
                                path,
                                other.value_type()
                            )));
                        }
                    };
                    updated.set_path(path, value)?;
                }
            }
        }
        Ok(updated)
    }
}

impl Display for UpdateSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self
            .operations
            .iter()
            .map(|op| match op {
                UpdateOperation::Set(p, v) => format!("set {} = {}", p, v),
                UpdateOperation::Unset(p) => format!("unset {}", p),
                UpdateOperation::Inc(p, v) => format!("inc {} by {}", p, v),
                UpdateOperation::Mul(p, v) => format!("mul {} by {}", p, v),
                UpdateOperation::Push(p, v) => format!("push {} item(s) to {}", v.len(), p),
            })
            .collect();
        write!(f, "[{}]", names.join(", "))
    }
}

fn validate_path(operator: &str, path: &str) -> DocStoreResult<()> {
    if path.is_empty() || path.split(FIELD_SEPARATOR).any(|s| s.is_empty()) {
        return Err(update_error(format!("{} has an invalid field path '{}'", operator, path)));
    }
    if path == DOC_ID || path.starts_with(&format!("{}{}", DOC_ID, FIELD_SEPARATOR)) {
        return Err(update_error(format!(
            "Performing {} on the path '{}' would modify the immutable field '{}'",
            operator, path, DOC_ID
        )));
    }
    Ok(())
}

fn paths_conflict(a: &str, b: &str) -> bool {
    let prefix = |long: &str, short: &str| {
        long.len() > short.len()
            && long.starts_with(short)
            && long[short.len()..].starts_with(FIELD_SEPARATOR)
    };
    a == b || prefix(a, b) || prefix(b, a)
}

fn numeric_operand(operator: &str, path: &str, value: &Value) -> DocStoreResult<Value> {
    if value.is_number() {
        Ok(value.clone())
    } else {
        Err(update_error(format!(
            "{} on '{}' expects a numeric value, found {}",
            operator,
            path,
            value.value_type()
        )))
    }
}

fn push_operand(path: &str, value: &Value) -> DocStoreResult<Vec<Value>> {
    if is_operator_document(value) {
        if let Some(doc) = value.as_document() {
            return match doc.get_field("$each") {
                Some(Value::Array(items)) if doc.len() == 1 => Ok(items.clone()),
                _ => Err(update_error(format!(
                    "$push on '{}' supports only a single $each array modifier",
                    path
                ))),
            };
        }
    }
    Ok(vec![value.clone()])
}

fn zero_like(operand: &Value) -> Value {
    match operand {
        Value::I32(_) => Value::I32(0),
        Value::I64(_) => Value::I64(0),
        _ => Value::F64(0.0),
    }
}

fn arithmetic(path: &str, current: &Value, operand: &Value, op: Arithmetic) -> DocStoreResult<Value> {
    let overflow = || {
        update_error(format!(
            "Integer overflow while updating '{}' with {}",
            path, operand
        ))
    };

    match (current, operand) {
        (Value::I32(a), Value::I32(b)) => {
            let result = match op {
                Arithmetic::Add => a.checked_add(*b),
                Arithmetic::Multiply => a.checked_mul(*b),
            };
            match result {
                Some(v) => Ok(Value::I32(v)),
                // an i32 result that does not fit widens to i64
                None => Ok(Value::I64(match op {
                    Arithmetic::Add => *a as i64 + *b as i64,
                    Arithmetic::Multiply => *a as i64 * *b as i64,
                })),
            }
        }
        (Value::I32(_) | Value::I64(_), Value::I32(_) | Value::I64(_)) => {
            let a = integer(current);
            let b = integer(operand);
            let result = match op {
                Arithmetic::Add => a.checked_add(b),
                Arithmetic::Multiply => a.checked_mul(b),
            };
            result.map(Value::I64).ok_or_else(overflow)
        }
        _ => match (current.as_number(), operand.as_number()) {
            (Some(a), Some(b)) => Ok(Value::F64(match op {
                Arithmetic::Add => a + b,
                Arithmetic::Multiply => a * b,
            })),
            _ => Err(update_error(format!(
                "Cannot apply arithmetic to non-numeric field '{}' of type {}",
                path,
                current.value_type()
            ))),
        },
    }
}

fn integer(value: &Value) -> i64 {
    match value {
        Value::I32(v) => *v as i64,
        Value::I64(v) => *v,
        _ => 0,
    }
}

/// Builds the document inserted by an upsert: the equality fields of the
/// filter, including those inside `$and` clauses.
pub(crate) fn upsert_seed(filter: &Document) -> DocStoreResult<Document> {
    let mut seed = Document::new();
    collect_equalities(filter, &mut seed)?;
    Ok(seed)
}

fn collect_equalities(filter: &Document, seed: &mut Document) -> DocStoreResult<()> {
    for (key, value) in filter {
        if key == "$and" {
            if let Some(clauses) = value.as_array() {
                for clause in clauses.iter().filter_map(Value::as_document) {
                    collect_equalities(clause, seed)?;
                }
            }
        } else if key.starts_with('$') {
            continue;
        } else if is_operator_document(value) {
            if let Some(eq) = value.as_document().and_then(|ops| ops.get_field("$eq")) {
                seed.set_path(key, eq.clone())?;
            }
        } else {
            seed.set_path(key, value.clone())?;
        }
    }
    Ok(())
}
