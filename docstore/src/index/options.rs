/// Options of an index: an optional explicit name and the unique flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexOptions {
    name: Option<String>,
    unique: bool,
}

impl IndexOptions {
    pub fn new(name: Option<&str>, unique: bool) -> IndexOptions {
        IndexOptions {
            name: name.map(|n| n.to_string()),
            unique,
        }
    }

    /// Sets the index name, replacing the one derived from the keys.
    pub fn with_name(mut self, name: &str) -> IndexOptions {
        self.name = Some(name.to_string());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }
}

pub fn unique_index() -> IndexOptions {
    IndexOptions::new(None, true)
}

pub fn non_unique_index() -> IndexOptions {
    IndexOptions::new(None, false)
}
