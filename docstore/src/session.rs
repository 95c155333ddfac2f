use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::collection::Collection;
use crate::common::DEFAULT_URI;
use crate::connection_string::{ConnectionString, Scheme};
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use crate::instance::Instance;
use crate::store::memory::MemoryBackend;
use crate::store::{validate_database_name, Namespace, Store};

/// How far a write must get before the store confirms it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteConcern {
    /// `w=0`: writes are sent but never confirmed.
    Unacknowledged,
    /// `w=n` with `n >= 1`.
    Nodes(u32),
    /// `w=majority`.
    Majority,
}

impl WriteConcern {
    pub fn is_acknowledged(&self) -> bool {
        !matches!(self, WriteConcern::Unacknowledged)
    }
}

impl Default for WriteConcern {
    fn default() -> Self {
        WriteConcern::Nodes(1)
    }
}

impl Display for WriteConcern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteConcern::Unacknowledged => write!(f, "w=0"),
            WriteConcern::Nodes(n) => write!(f, "w={}", n),
            WriteConcern::Majority => write!(f, "w=majority"),
        }
    }
}

/// Validated settings of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    connection_string: ConnectionString,
    app_name: Option<String>,
    write_concern: WriteConcern,
    default_database: Option<String>,
}

impl SessionConfig {
    pub fn connection_string(&self) -> &ConnectionString {
        &self.connection_string
    }

    pub fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    pub fn write_concern(&self) -> WriteConcern {
        self.write_concern
    }

    pub fn default_database(&self) -> Option<&str> {
        self.default_database.as_deref()
    }
}

/// Collects session settings.
///
/// The first invalid setting is kept and reported by [SessionBuilder::build]
/// or [SessionBuilder::connect]; later calls are then ignored. Options given
/// in the connection string apply first and explicit calls override them.
///
/// ```rust,ignore
/// let session = Session::builder()
///     .uri("memory://localhost:27017/hokori")
///     .app_name("tutorial")
///     .write_concern(WriteConcern::Unacknowledged)
///     .connect(&instance)?;
/// ```
#[derive(Default)]
pub struct SessionBuilder {
    error: Option<DocStoreError>,
    connection_string: Option<ConnectionString>,
    app_name: Option<String>,
    write_concern: Option<WriteConcern>,
    default_database: Option<String>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        SessionBuilder::default()
    }

    pub fn uri(mut self, uri: &str) -> Self {
        if self.error.is_none() {
            match ConnectionString::parse(uri) {
                Ok(connection_string) => self.connection_string = Some(connection_string),
                Err(e) => self.error = Some(e),
            }
        }
        self
    }

    pub fn app_name(mut self, app_name: &str) -> Self {
        if self.error.is_none() {
            if app_name.is_empty() {
                log::error!("Application name cannot be empty");
                self.error = Some(DocStoreError::new(
                    "Application name cannot be empty",
                    ErrorKind::InvalidOperation,
                ));
            } else {
                self.app_name = Some(app_name.to_string());
            }
        }
        self
    }

    pub fn write_concern(mut self, write_concern: WriteConcern) -> Self {
        if self.error.is_none() {
            if write_concern == WriteConcern::Nodes(0) {
                self.write_concern = Some(WriteConcern::Unacknowledged);
            } else {
                self.write_concern = Some(write_concern);
            }
        }
        self
    }

    pub fn default_database(mut self, name: &str) -> Self {
        if self.error.is_none() {
            match validate_database_name(name) {
                Ok(()) => self.default_database = Some(name.to_string()),
                Err(e) => self.error = Some(e),
            }
        }
        self
    }

    pub fn build(self) -> DocStoreResult<SessionConfig> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let connection_string = match self.connection_string {
            Some(connection_string) => connection_string,
            None => ConnectionString::parse(DEFAULT_URI)?,
        };
        Ok(SessionConfig {
            app_name: self
                .app_name
                .or_else(|| connection_string.app_name().map(str::to_string)),
            write_concern: self
                .write_concern
                .or_else(|| connection_string.write_concern())
                .unwrap_or_default(),
            default_database: self
                .default_database
                .or_else(|| connection_string.database().map(str::to_string)),
            connection_string,
        })
    }

    pub fn connect(self, instance: &Instance) -> DocStoreResult<Session> {
        let config = self.build()?;
        Session::open(instance, config)
    }
}

pub(crate) struct SessionInner {
    store: Store,
    config: SessionConfig,
    connected: AtomicBool,
}

impl SessionInner {
    pub(crate) fn ensure_connected(&self) -> DocStoreResult<()> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            log::error!("Session to {} is closed", self.config.connection_string);
            Err(DocStoreError::new("Session is closed", ErrorKind::ConnectionError))
        }
    }

    pub(crate) fn store(&self) -> &Store {
        &self.store
    }

    pub(crate) fn write_concern(&self) -> WriteConcern {
        self.config.write_concern
    }

    fn close(&self) -> DocStoreResult<()> {
        if self.connected.swap(false, Ordering::AcqRel) {
            log::info!("Closing session to {}", self.config.connection_string);
            self.store.close()?;
        }
        Ok(())
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Failed to close session on drop: {}", e);
        }
    }
}

/// A connection to one document store deployment.
///
/// A session is either connected or closed. Once [Session::close] is called,
/// every operation through it, or through any [Database] or [Collection]
/// obtained from it, fails with [ErrorKind::ConnectionError]. Clones share
/// the same connection.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Connects to the deployment named by `uri` and checks it responds.
    pub fn connect(instance: &Instance, uri: &str) -> DocStoreResult<Session> {
        Session::builder().uri(uri).connect(instance)
    }

    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    fn open(instance: &Instance, config: SessionConfig) -> DocStoreResult<Session> {
        let connection_string = config.connection_string();
        let store = match connection_string.scheme() {
            Scheme::Memory => {
                let address = connection_string.primary_host().to_string();
                Store::new(MemoryBackend::new(instance.memory_deployment(&address)))
            }
            Scheme::MongoDb | Scheme::MongoDbSrv => open_mongo(&config)?,
        };

        if let Err(e) = store.ping() {
            log::error!("Deployment at {} did not respond: {}", connection_string, e);
            return Err(DocStoreError::new_with_cause(
                &format!("Failed to connect to {}", connection_string),
                ErrorKind::ConnectionError,
                e,
            ));
        }

        log::info!(
            "Connected to {} through the {} backend ({})",
            connection_string,
            store.kind(),
            config.write_concern()
        );
        Ok(Session {
            inner: Arc::new(SessionInner {
                store,
                config,
                connected: AtomicBool::new(true),
            }),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn database(&self, name: &str) -> DocStoreResult<Database> {
        self.inner.ensure_connected()?;
        validate_database_name(name)?;
        Ok(Database {
            session: self.inner.clone(),
            name: name.to_string(),
        })
    }

    /// Gets the database named in the connection string or set with
    /// [SessionBuilder::default_database].
    pub fn default_database(&self) -> DocStoreResult<Database> {
        match self.inner.config.default_database() {
            Some(name) => self.database(name),
            None => {
                log::error!("No default database configured for {}", self.inner.config.connection_string);
                Err(DocStoreError::new(
                    "No default database is configured",
                    ErrorKind::InvalidOperation,
                ))
            }
        }
    }

    pub fn list_database_names(&self) -> DocStoreResult<Vec<String>> {
        self.inner.ensure_connected()?;
        self.inner.store.list_database_names()
    }

    pub fn ping(&self) -> DocStoreResult<()> {
        self.inner.ensure_connected()?;
        self.inner.store.ping()
    }

    /// Closes the session. Closing twice is a no-op.
    pub fn close(&self) -> DocStoreResult<()> {
        self.inner.close()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }
}

#[cfg(feature = "mongodb")]
fn open_mongo(config: &SessionConfig) -> DocStoreResult<Store> {
    Ok(Store::new(crate::store::MongoBackend::connect(config)?))
}

#[cfg(not(feature = "mongodb"))]
fn open_mongo(config: &SessionConfig) -> DocStoreResult<Store> {
    let connection_string = config.connection_string();
    log::error!(
        "Cannot connect to {}: built without the mongodb feature",
        connection_string
    );
    Err(DocStoreError::new(
        &format!("The {} backend is not available in this build", connection_string.scheme()),
        ErrorKind::ConnectionError,
    ))
}

/// A named database of a session.
#[derive(Clone)]
pub struct Database {
    session: Arc<SessionInner>,
    name: String,
}

impl Database {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets a handle to a collection. The collection itself is created by
    /// the store on the first write.
    pub fn collection(&self, name: &str) -> DocStoreResult<Collection> {
        self.session.ensure_connected()?;
        let namespace = Namespace::new(&self.name, name)?;
        Ok(Collection::new(self.session.clone(), namespace))
    }

    pub fn list_collection_names(&self) -> DocStoreResult<Vec<String>> {
        self.session.ensure_connected()?;
        self.session.store().list_collection_names(&self.name)
    }
}
