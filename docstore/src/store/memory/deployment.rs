use dashmap::DashMap;
use itertools::Itertools;

use crate::store::Namespace;

use super::MemoryCollection;

/// An in-process deployment: every collection reachable at one memory
/// address.
///
/// Collections are created on first write and removed by `drop`. Handles
/// cloned out of the map stay usable after the collection is dropped, they
/// simply no longer belong to the deployment.
pub struct MemoryDeployment {
    address: String,
    collections: DashMap<Namespace, MemoryCollection>,
}

impl MemoryDeployment {
    pub(crate) fn new(address: &str) -> Self {
        log::info!("Starting memory deployment at {}", address);
        MemoryDeployment {
            address: address.to_string(),
            collections: DashMap::new(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub(crate) fn collection(&self, namespace: &Namespace) -> Option<MemoryCollection> {
        self.collections.get(namespace).map(|entry| entry.value().clone())
    }

    pub(crate) fn get_or_create(&self, namespace: &Namespace) -> MemoryCollection {
        self.collections
            .entry(namespace.clone())
            .or_insert_with(|| {
                log::debug!("Creating collection {} at {}", namespace, self.address);
                MemoryCollection::new(namespace.clone())
            })
            .value()
            .clone()
    }

    pub(crate) fn drop_collection(&self, namespace: &Namespace) -> bool {
        self.collections.remove(namespace).is_some()
    }

    pub fn database_names(&self) -> Vec<String> {
        self.collections
            .iter()
            .map(|entry| entry.key().database().to_string())
            .unique()
            .sorted()
            .collect()
    }

    pub fn collection_names(&self, database: &str) -> Vec<String> {
        self.collections
            .iter()
            .filter(|entry| entry.key().database() == database)
            .map(|entry| entry.key().collection().to_string())
            .sorted()
            .collect()
    }
}
