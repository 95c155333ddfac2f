use crate::collection::Document;
use crate::errors::DocStoreResult;

/// A forward-only cursor over query results.
///
/// Results are produced lazily as the cursor is iterated. A cursor cannot be
/// rewound; once exhausted it keeps returning `None`. Run the query again to
/// read the results a second time.
///
/// ```rust,ignore
/// let mut cursor = collection.find(doc! { "i": { "$gt": 50 } })?;
/// for document in cursor {
///     println!("{}", document?.to_json()?);
/// }
/// ```
pub struct DocumentCursor {
    underlying: Option<Box<dyn Iterator<Item = DocStoreResult<Document>> + Send>>,
}

impl DocumentCursor {
    pub(crate) fn new(iter: Box<dyn Iterator<Item = DocStoreResult<Document>> + Send>) -> Self {
        DocumentCursor {
            underlying: Some(iter),
        }
    }

    pub(crate) fn from_documents(documents: Vec<Document>) -> Self {
        DocumentCursor::new(Box::new(documents.into_iter().map(Ok)))
    }

    /// Checks whether the cursor has been exhausted.
    pub fn is_exhausted(&self) -> bool {
        self.underlying.is_none()
    }

    /// Drains the remaining results, stopping at the first error.
    pub fn collect_documents(self) -> DocStoreResult<Vec<Document>> {
        self.collect()
    }
}

impl Iterator for DocumentCursor {
    type Item = DocStoreResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        let iter = self.underlying.as_mut()?;
        match iter.next() {
            Some(item) => Some(item),
            None => {
                self.underlying = None;
                None
            }
        }
    }
}


impl std::fmt::Debug for DocumentCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCursor")
            .field("exhausted", &self.is_exhausted())
            .finish_non_exhaustive()
    }
}
