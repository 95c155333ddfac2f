use backtrace::Backtrace;
use parking_lot::Mutex;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for docstore operations.
///
/// Every failure raised by the library carries one of these kinds so callers can
/// branch on the category of failure instead of parsing messages.
///
/// # Examples
///
/// ```rust,ignore
/// use docstore::errors::{DocStoreError, ErrorKind, DocStoreResult};
///
/// fn example() -> DocStoreResult<()> {
///     Err(DocStoreError::new("field 'name' not found", ErrorKind::NotFound))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Connection errors
    /// The connection string could not be parsed
    InvalidUri,
    /// The store is unreachable, the backend is unavailable or the session is closed
    ConnectionError,
    /// A process-wide instance already exists
    InstanceAlreadyExists,

    // Read errors
    /// A field was read as a type other than the stored one
    TypeMismatch,
    /// The requested field or resource does not exist
    NotFound,

    // Write errors
    /// A write was rejected by the store
    WriteError,
    /// A write would violate a unique index
    DuplicateKey,
    /// An update document is malformed or cannot be applied
    UpdateError,
    /// An index could not be created
    IndexError,

    // Query errors
    /// A filter document is malformed
    FilterError,

    /// The operation is not valid in the current context
    InvalidOperation,
    /// Error encoding or decoding documents
    EncodingError,
    /// Error reported by a store backend
    BackendError,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidUri => write!(f, "Invalid URI"),
            ErrorKind::ConnectionError => write!(f, "Connection error"),
            ErrorKind::InstanceAlreadyExists => write!(f, "Instance already exists"),
            ErrorKind::TypeMismatch => write!(f, "Type mismatch"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::WriteError => write!(f, "Write error"),
            ErrorKind::DuplicateKey => write!(f, "Duplicate key"),
            ErrorKind::UpdateError => write!(f, "Update error"),
            ErrorKind::IndexError => write!(f, "Index error"),
            ErrorKind::FilterError => write!(f, "Filter error"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom docstore error type.
///
/// `DocStoreError` carries a message, an [ErrorKind], an optional cause and a
/// backtrace captured at construction. The backtrace is resolved lazily, only
/// when the error is printed with `{:?}`.
///
/// # Examples
///
/// ```rust,ignore
/// use docstore::errors::{DocStoreError, ErrorKind};
///
/// let cause = DocStoreError::new("connection refused", ErrorKind::BackendError);
/// let err = DocStoreError::new_with_cause("ping failed", ErrorKind::ConnectionError, cause);
/// ```
#[derive(Clone)]
pub struct DocStoreError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<DocStoreError>>,
    backtrace: Arc<Mutex<Backtrace>>,
}

impl DocStoreError {
    /// Creates a new `DocStoreError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        DocStoreError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(Mutex::new(Backtrace::new_unresolved())),
        }
    }

    /// Creates a new `DocStoreError` with a cause error.
    ///
    /// The cause is preserved and reported through [Error::source].
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: DocStoreError) -> Self {
        DocStoreError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(Mutex::new(Backtrace::new_unresolved())),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&DocStoreError> {
        self.cause.as_deref()
    }

    /// Returns `true` for failures to reach or address the store.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self.error_kind,
            ErrorKind::InvalidUri | ErrorKind::ConnectionError
        )
    }

    /// Returns `true` for writes the store rejected.
    pub fn is_write_error(&self) -> bool {
        matches!(
            self.error_kind,
            ErrorKind::WriteError
                | ErrorKind::DuplicateKey
                | ErrorKind::UpdateError
                | ErrorKind::IndexError
        )
    }
}

impl Display for DocStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for DocStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}: {}\nCaused by: {:?}", self.error_kind, self.message, cause),
            None => {
                let mut backtrace = self.backtrace.lock();
                backtrace.resolve();
                write!(f, "{}: {}\n{:?}", self.error_kind, self.message, *backtrace)
            }
        }
    }
}

impl Error for DocStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for docstore operations.
pub type DocStoreResult<T> = Result<T, DocStoreError>;

impl From<serde_json::Error> for DocStoreError {
    fn from(err: serde_json::Error) -> Self {
        DocStoreError::new(&format!("JSON error: {}", err), ErrorKind::EncodingError)
    }
}

impl From<regex::Error> for DocStoreError {
    fn from(err: regex::Error) -> Self {
        DocStoreError::new(&format!("Invalid regular expression: {}", err), ErrorKind::FilterError)
    }
}

impl From<std::fmt::Error> for DocStoreError {
    fn from(err: std::fmt::Error) -> Self {
        DocStoreError::new(&format!("Formatting error: {}", err), ErrorKind::InternalError)
    }
}

impl From<std::num::ParseIntError> for DocStoreError {
    fn from(err: std::num::ParseIntError) -> Self {
        DocStoreError::new(&format!("Integer parsing error: {}", err), ErrorKind::InvalidUri)
    }
}

#[cfg(feature = "mongodb")]
impl From<mongodb::error::Error> for DocStoreError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::{ErrorKind as DriverErrorKind, WriteFailure};

        let duplicate = match err.kind.as_ref() {
            DriverErrorKind::Write(WriteFailure::WriteError(e)) => e.code == 11000,
            DriverErrorKind::InsertMany(e) => e
                .write_errors
                .as_ref()
                .map(|errors| errors.iter().any(|e| e.code == 11000))
                .unwrap_or(false),
            _ => false,
        };
        let kind = match err.kind.as_ref() {
            _ if duplicate => ErrorKind::DuplicateKey,
            DriverErrorKind::ServerSelection { .. } | DriverErrorKind::Io(_) => ErrorKind::ConnectionError,
            DriverErrorKind::InvalidArgument { .. } => ErrorKind::InvalidOperation,
            _ => ErrorKind::BackendError,
        };
        log::error!("MongoDB error: {}", err);
        DocStoreError::new(&err.to_string(), kind)
    }
}
