use crate::collection::Document;
use crate::common::Value;
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};

use super::{
    AndFilter, ComparisonFilter, ComparisonMode, EqualsFilter, ExistsFilter, Filter, InFilter,
    NotFilter, OrFilter, RegexFilter,
};

fn filter_error(message: String) -> DocStoreError {
    log::error!("{}", message);
    DocStoreError::new(&message, ErrorKind::FilterError)
}

/// Checks whether a value is an operator document such as `{"$gt": 5}`.
pub(crate) fn is_operator_document(value: &Value) -> bool {
    value
        .as_document()
        .and_then(|doc| doc.keys().next())
        .map(|key| key.starts_with('$'))
        .unwrap_or(false)
}

fn combine(mut filters: Vec<Filter>) -> Filter {
    match filters.len() {
        0 => Filter::all(),
        1 => filters.remove(0),
        _ => Filter::new(AndFilter::new(filters)),
    }
}

pub(crate) fn parse_filter(filter: &Document) -> DocStoreResult<Filter> {
    let mut filters = Vec::with_capacity(filter.len());
    for (key, value) in filter {
        if key.starts_with('$') {
            filters.push(parse_logical(key, value)?);
        } else if key.is_empty() {
            return Err(filter_error("Filter field name cannot be empty".to_string()));
        } else {
            filters.push(parse_field(key, value)?);
        }
    }
    Ok(combine(filters))
}

fn parse_logical(operator: &str, operand: &Value) -> DocStoreResult<Filter> {
    let clauses = match operand.as_array() {
        Some(items) if !items.is_empty() => items,
        _ => {
            return Err(filter_error(format!(
                "{} expects a non-empty array of filter documents",
                operator
            )))
        }
    };

    let filters = clauses
        .iter()
        .map(|clause| match clause {
            Value::Document(doc) => parse_filter(doc),
            other => Err(filter_error(format!(
                "{} clause must be a document, found {}",
                operator,
                other.value_type()
            ))),
        })
        .collect::<DocStoreResult<Vec<_>>>()?;

    match operator {
        "$and" => Ok(Filter::new(AndFilter::new(filters))),
        "$or" => Ok(Filter::new(OrFilter::new(filters))),
        "$nor" => Ok(Filter::new(NotFilter::new(Filter::new(OrFilter::new(
            filters,
        ))))),
        other => Err(filter_error(format!("Unknown top level operator {}", other))),
    }
}

fn parse_field(field: &str, value: &Value) -> DocStoreResult<Filter> {
    match value {
        Value::Document(operators) if is_operator_document(value) => {
            parse_operators(field, operators)
        }
        _ => Ok(Filter::new(EqualsFilter::new(field.to_string(), value.clone()))),
    }
}

fn parse_operators(field: &str, operators: &Document) -> DocStoreResult<Filter> {
    let mut filters = Vec::with_capacity(operators.len());
    for (operator, operand) in operators {
        let filter = match operator.as_str() {
            "$eq" => Filter::new(EqualsFilter::new(field.to_string(), operand.clone())),
            "$ne" => Filter::new(EqualsFilter::new(field.to_string(), operand.clone())).not(),
            "$gt" => comparison(field, operand, ComparisonMode::Greater),
            "$gte" => comparison(field, operand, ComparisonMode::GreaterEqual),
            "$lt" => comparison(field, operand, ComparisonMode::Lesser),
            "$lte" => comparison(field, operand, ComparisonMode::LesserEqual),
            "$in" => Filter::new(InFilter::new(field.to_string(), array_operand(field, operator, operand)?)),
            "$nin" => {
                Filter::new(InFilter::new(field.to_string(), array_operand(field, operator, operand)?)).not()
            }
            "$exists" => Filter::new(ExistsFilter::new(field.to_string(), truthy(operand))),
            "$regex" => {
                let pattern = operand.as_str().ok_or_else(|| {
                    filter_error(format!("$regex on {} expects a string pattern", field))
                })?;
                let options = match operators.get_field("$options") {
                    Some(Value::String(options)) => options.as_str(),
                    Some(other) => {
                        return Err(filter_error(format!(
                            "$options on {} expects a string, found {}",
                            field,
                            other.value_type()
                        )))
                    }
                    None => "",
                };
                Filter::new(RegexFilter::new(field.to_string(), pattern, options)?)
            }
            "$options" => {
                if operators.get_field("$regex").is_none() {
                    return Err(filter_error(format!("$options on {} without $regex", field)));
                }
                continue;
            }
            "$not" => match operand {
                Value::Document(inner) if is_operator_document(operand) => {
                    parse_operators(field, inner)?.not()
                }
                _ => {
                    return Err(filter_error(format!(
                        "$not on {} expects an operator document",
                        field
                    )))
                }
            },
            other if other.starts_with('$') => {
                return Err(filter_error(format!("Unknown operator {} on {}", other, field)))
            }
            other => {
                return Err(filter_error(format!(
                    "Cannot mix operator and field '{}' in filter on {}",
                    other, field
                )))
            }
        };
        filters.push(filter);
    }
    Ok(combine(filters))
}

fn comparison(field: &str, operand: &Value, mode: ComparisonMode) -> Filter {
    Filter::new(ComparisonFilter::new(field.to_string(), operand.clone(), mode))
}

fn array_operand(field: &str, operator: &str, operand: &Value) -> DocStoreResult<Vec<Value>> {
    operand.as_array().cloned().ok_or_else(|| {
        filter_error(format!(
            "{} on {} expects an array, found {}",
            operator,
            field,
            operand.value_type()
        ))
    })
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::I32(v) => *v != 0,
        Value::I64(v) => *v != 0,
        Value::F64(v) => *v != 0.0,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn matches(filter: Document, doc: Document) -> bool {
        Filter::parse(&filter).unwrap().apply(&doc).unwrap()
    }

    fn parse_err(filter: Document) -> ErrorKind {
        Filter::parse(&filter).err().unwrap().kind().clone()
    }

    #[test]
    fn test_empty_filter_matches_all() {
        assert!(matches(doc! {}, doc! { a: 1 }));
        assert!(matches(doc! {}, doc! {}));
    }

    #[test]
    fn test_implicit_equality_and_conjunction() {
        let filter = doc! { name: "MongoDB", count: 1 };
        assert!(matches(filter.clone(), doc! { name: "MongoDB", count: 1, x: 2 }));
        assert!(!matches(filter, doc! { name: "MongoDB", count: 2 }));
    }

    #[test]
    fn test_embedded_document_equality() {
        let filter = doc! { info: { x: 203, y: 102 } };
        assert!(matches(filter.clone(), doc! { info: { x: 203, y: 102 } }));
        assert!(!matches(filter, doc! { info: { y: 102, x: 203 } }));
        assert!(matches(doc! { "info.x": 203 }, doc! { info: { x: 203, y: 102 } }));
    }

    #[test]
    fn test_range() {
        let filter = doc! { i: { "$gt": 50, "$lte": 100 } };
        assert!(!matches(filter.clone(), doc! { i: 50 }));
        assert!(matches(filter.clone(), doc! { i: 51 }));
        assert!(matches(filter.clone(), doc! { i: 100 }));
        assert!(!matches(filter.clone(), doc! { i: 101 }));
        assert!(!matches(filter, doc! { i: "75" }));
    }

    #[test]
    fn test_ne_and_nin() {
        assert!(matches(doc! { i: { "$ne": 1 } }, doc! { i: 2 }));
        assert!(matches(doc! { i: { "$ne": 1 } }, doc! {}));
        assert!(!matches(doc! { i: { "$ne": 1 } }, doc! { i: 1 }));
        assert!(matches(doc! { i: { "$nin": [1, 2] } }, doc! { i: 3 }));
        assert!(!matches(doc! { i: { "$nin": [1, 2] } }, doc! { i: 2 }));
        assert!(matches(doc! { i: { "$in": [1, 2] } }, doc! { i: 2 }));
    }

    #[test]
    fn test_exists() {
        assert!(matches(doc! { a: { "$exists": true } }, doc! { a: () }));
        assert!(matches(doc! { a: { "$exists": false } }, doc! { b: 1 }));
        assert!(matches(doc! { a: { "$exists": 1 } }, doc! { a: 1 }));
    }

    #[test]
    fn test_regex() {
        assert!(matches(doc! { name: { "$regex": "^mongo", "$options": "i" } }, doc! { name: "MongoDB" }));
        assert!(!matches(doc! { name: { "$regex": "^mongo" } }, doc! { name: "MongoDB" }));
    }

    #[test]
    fn test_not() {
        let filter = doc! { i: { "$not": { "$gt": 5 } } };
        assert!(matches(filter.clone(), doc! { i: 3 }));
        assert!(matches(filter.clone(), doc! {}));
        assert!(!matches(filter, doc! { i: 6 }));
    }

    #[test]
    fn test_logical_operators() {
        let or = doc! { "$or": [{ i: 1 }, { i: 2 }] };
        assert!(matches(or.clone(), doc! { i: 2 }));
        assert!(!matches(or, doc! { i: 3 }));

        let and = doc! { "$and": [{ i: { "$gt": 1 } }, { i: { "$lt": 3 } }] };
        assert!(matches(and.clone(), doc! { i: 2 }));
        assert!(!matches(and, doc! { i: 3 }));

        let nor = doc! { "$nor": [{ i: 1 }, { i: 2 }] };
        assert!(matches(nor.clone(), doc! { i: 3 }));
        assert!(!matches(nor, doc! { i: 1 }));
    }

    #[test]
    fn test_invalid_filters() {
        assert_eq!(parse_err(doc! { i: { "$foo": 1 } }), ErrorKind::FilterError);
        assert_eq!(parse_err(doc! { "$foo": [{ i: 1 }] }), ErrorKind::FilterError);
        assert_eq!(parse_err(doc! { "$or": [] }), ErrorKind::FilterError);
        assert_eq!(parse_err(doc! { "$or": { i: 1 } }), ErrorKind::FilterError);
        assert_eq!(parse_err(doc! { "$and": [1] }), ErrorKind::FilterError);
        assert_eq!(parse_err(doc! { i: { "$in": 1 } }), ErrorKind::FilterError);
        assert_eq!(parse_err(doc! { i: { "$gt": 1, j: 2 } }), ErrorKind::FilterError);
        assert_eq!(parse_err(doc! { i: { "$options": "i" } }), ErrorKind::FilterError);
        assert_eq!(parse_err(doc! { i: { "$regex": 5 } }), ErrorKind::FilterError);
        assert_eq!(parse_err(doc! { i: { "$not": 5 } }), ErrorKind::FilterError);
    }

    #[test]
    fn test_display() {
        let filter = Filter::parse(&doc! { i: { "$gt": 50, "$lte": 100 } }).unwrap();
        assert_eq!(filter.to_string(), "((i > 50) && (i <= 100))");
    }
}
