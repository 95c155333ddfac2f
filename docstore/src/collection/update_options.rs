/// Options of `update_one` and `update_many`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    upsert: bool,
}

impl UpdateOptions {
    pub fn new(upsert: bool) -> Self {
        Self { upsert }
    }

    /// Whether a document built from the filter is inserted when nothing
    /// matches.
    pub fn is_upsert(&self) -> bool {
        self.upsert
    }
}

pub fn upsert() -> UpdateOptions {
    UpdateOptions::new(true)
}
