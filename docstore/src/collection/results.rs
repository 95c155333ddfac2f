use std::fmt::Display;

use crate::common::{ObjectId, Value};

/// Outcome of `insert_one`.
///
/// Writes issued with an unacknowledged write concern are applied but never
/// confirmed, so no id is reported for them.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOneResult {
    /// The store confirmed the write and the `_id` is an [ObjectId].
    Acknowledged { inserted_id: ObjectId },
    /// The store confirmed the write of a document whose caller supplied `_id`
    /// is not an [ObjectId].
    AcknowledgedWithoutObjectId { inserted_id: Value },
    /// The write was not confirmed.
    Unacknowledged,
}

impl InsertOneResult {
    pub(crate) fn acknowledged(inserted_id: Value) -> Self {
        match inserted_id {
            Value::ObjectId(id) => InsertOneResult::Acknowledged { inserted_id: id },
            other => InsertOneResult::AcknowledgedWithoutObjectId { inserted_id: other },
        }
    }

    pub fn is_acknowledged(&self) -> bool {
        !matches!(self, InsertOneResult::Unacknowledged)
    }

    pub fn inserted_id(&self) -> Option<Value> {
        match self {
            InsertOneResult::Acknowledged { inserted_id } => Some(Value::ObjectId(*inserted_id)),
            InsertOneResult::AcknowledgedWithoutObjectId { inserted_id } => Some(inserted_id.clone()),
            InsertOneResult::Unacknowledged => None,
        }
    }

    pub fn object_id(&self) -> Option<ObjectId> {
        match self {
            InsertOneResult::Acknowledged { inserted_id } => Some(*inserted_id),
            _ => None,
        }
    }
}

impl Display for InsertOneResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InsertOneResult::Acknowledged { inserted_id } => {
                write!(f, "acknowledged, inserted id {}", inserted_id)
            }
            InsertOneResult::AcknowledgedWithoutObjectId { inserted_id } => {
                write!(f, "acknowledged, inserted id {} (not an object id)", inserted_id)
            }
            InsertOneResult::Unacknowledged => write!(f, "unacknowledged"),
        }
    }
}

/// Outcome of `insert_many`. Ids are listed in input order, and only for
/// acknowledged writes.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertManyResult {
    pub acknowledged: bool,
    pub inserted_ids: Vec<Value>,
}

impl InsertManyResult {
    pub fn len(&self) -> usize {
        self.inserted_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inserted_ids.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    /// Documents whose content changed.
    pub modified_count: u64,
    pub upserted_id: Option<Value>,
}

impl UpdateResult {
    pub(crate) fn unacknowledged() -> Self {
        UpdateResult {
            acknowledged: false,
            matched_count: 0,
            modified_count: 0,
            upserted_id: None,
        }
    }
}

impl Display for UpdateResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.acknowledged {
            return write!(f, "unacknowledged");
        }
        write!(f, "matched {}, modified {}", self.matched_count, self.modified_count)?;
        if let Some(id) = &self.upserted_id {
            write!(f, ", upserted {}", id)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteResult {
    pub(crate) fn unacknowledged() -> Self {
        DeleteResult {
            acknowledged: false,
            deleted_count: 0,
        }
    }
}

impl Display for DeleteResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.acknowledged {
            write!(f, "deleted {}", self.deleted_count)
        } else {
            write!(f, "unacknowledged")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_one_result_variants() {
        let id = ObjectId::new();
        let result = InsertOneResult::acknowledged(Value::ObjectId(id));
        assert_eq!(result, InsertOneResult::Acknowledged { inserted_id: id });
        assert_eq!(result.object_id(), Some(id));
        assert!(result.is_acknowledged());

        let result = InsertOneResult::acknowledged(Value::from("custom"));
        assert_eq!(result.object_id(), None);
        assert_eq!(result.inserted_id(), Some(Value::from("custom")));
        assert!(result.is_acknowledged());

        assert!(!InsertOneResult::Unacknowledged.is_acknowledged());
        assert_eq!(InsertOneResult::Unacknowledged.inserted_id(), None);
    }

    #[test]
    fn test_display() {
        let update = UpdateResult {
            acknowledged: true,
            matched_count: 2,
            modified_count: 1,
            upserted_id: None,
        };
        assert_eq!(update.to_string(), "matched 2, modified 1");
        assert_eq!(UpdateResult::unacknowledged().to_string(), "unacknowledged");

        let delete = DeleteResult {
            acknowledged: true,
            deleted_count: 3,
        };
        assert_eq!(delete.to_string(), "deleted 3");
        assert_eq!(DeleteResult::unacknowledged().to_string(), "unacknowledged");
    }
}
