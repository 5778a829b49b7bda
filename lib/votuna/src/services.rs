use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use crate::error::{Result, TransferError};
use crate::traits::{CacheKey, CollectionCache, TransferBackend};

/// Collaborators shared by every transfer panel: one backend, any number of caches.
#[derive(Clone)]
pub struct Services {
    backend: Arc<dyn TransferBackend>,
    caches: HashMap<String, Arc<dyn CollectionCache>>,
}

impl Services {
    pub fn backend(&self) -> &Arc<dyn TransferBackend> {
        &self.backend
    }

    pub fn cache(&self, id: &str) -> Option<&Arc<dyn CollectionCache>> {
        self.caches.get(id)
    }

    pub fn list_caches(&self) -> Vec<&str> {
        self.caches.values().map(|c| c.id()).collect()
    }

    /// Sends every key to every registered cache, concurrently.
    pub async fn invalidate(&self, keys: &[CacheKey]) {
        let calls = self.caches.values().flat_map(|cache| {
            keys.iter().map(move |key| async move {
                debug!("Invalidating {:?} in {}", key, cache.id());
                cache.invalidate(key).await;
            })
        });
        join_all(calls).await;
    }
}

#[derive(Default)]
pub struct ServicesBuilder {
    backend: Option<Arc<dyn TransferBackend>>,
    caches: HashMap<String, Arc<dyn CollectionCache>>,
}

impl ServicesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backend(mut self, backend: impl TransferBackend + 'static) -> Self {
        self.backend = Some(Arc::new(backend));
        self
    }

    pub fn shared_backend(mut self, backend: Arc<dyn TransferBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn add_cache(mut self, cache: impl CollectionCache + 'static) -> Self {
        self.caches.insert(cache.id().to_string(), Arc::new(cache));
        self
    }

    pub fn add_shared_cache(mut self, cache: Arc<dyn CollectionCache>) -> Self {
        self.caches.insert(cache.id().to_string(), cache);
        self
    }

    pub fn build(self) -> Result<Services> {
        let backend = self
            .backend
            .ok_or_else(|| TransferError::Config("a transfer backend is required".to_string()))?;

        Ok(Services {
            backend,
            caches: self.caches,
        })
    }
}
