/// Field holding the unique identifier of a stored document.
pub const DOC_ID: &str = "_id";

/// Name of the unique index every collection carries on [DOC_ID].
pub const ID_INDEX_NAME: &str = "_id_";

/// Separator between the segments of an embedded field path.
pub const FIELD_SEPARATOR: char = '.';

/// Port assumed when a connection string does not name one.
pub const DEFAULT_PORT: u16 = 27017;

/// Connection string of the default deployment used by the tutorial.
pub const DEFAULT_URI: &str = "memory://localhost:27017";

pub const MEMORY_SCHEME: &str = "memory";
pub const MONGODB_SCHEME: &str = "mongodb";
pub const MONGODB_SRV_SCHEME: &str = "mongodb+srv";

/// Collection names with this prefix are owned by the store.
pub const SYSTEM_COLLECTION_PREFIX: &str = "system.";
