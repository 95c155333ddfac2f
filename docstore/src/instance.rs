use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use itertools::Itertools;

use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use crate::store::memory::MemoryDeployment;

static INSTANCE_CREATED: AtomicBool = AtomicBool::new(false);

/// The process-wide context every session is created from.
///
/// At most one instance can ever be created in a process; creating a second
/// one fails with [ErrorKind::InstanceAlreadyExists], even after the first was
/// dropped. Create it once at startup and pass it by reference to
/// [Session::connect](crate::session::Session::connect).
///
/// The instance owns the in-process deployments behind `memory://`
/// connection strings, one per `host:port`, so sessions connected to the same
/// address share their data.
///
/// ```rust,ignore
/// let instance = Instance::new()?;
/// let session = Session::connect(&instance, "memory://localhost:27017")?;
/// ```
pub struct Instance {
    deployments: DashMap<String, Arc<MemoryDeployment>>,
    started_at: DateTime<Utc>,
}

impl Instance {
    pub fn new() -> DocStoreResult<Instance> {
        if INSTANCE_CREATED.swap(true, Ordering::SeqCst) {
            log::error!("An instance has already been created in this process");
            return Err(DocStoreError::new(
                "Only one instance can be created per process",
                ErrorKind::InstanceAlreadyExists,
            ));
        }

        log::info!("Instance created");
        Ok(Instance {
            deployments: DashMap::new(),
            started_at: Utc::now(),
        })
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Gets the memory deployment at `address`, starting it on first use.
    pub(crate) fn memory_deployment(&self, address: &str) -> Arc<MemoryDeployment> {
        self.deployments
            .entry(address.to_string())
            .or_insert_with(|| Arc::new(MemoryDeployment::new(address)))
            .value()
            .clone()
    }

    /// Addresses of the memory deployments started so far.
    pub fn memory_addresses(&self) -> Vec<String> {
        self.deployments.iter().map(|e| e.key().clone()).sorted().collect()
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        log::info!("Instance dropped with {} memory deployment(s)", self.deployments.len());
    }
}

#[cfg(test)]
pub(crate) fn test_instance() -> &'static Instance {
    use std::sync::LazyLock;

    static INSTANCE: LazyLock<Instance> =
        LazyLock::new(|| Instance::new().expect("first instance of the test process"));
    &INSTANCE
}
