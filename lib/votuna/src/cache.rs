use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use crate::traits::{CacheKey, CollectionCache};

/// Publishes invalidations on a broadcast channel so other screens can refetch.
#[derive(Debug, Clone)]
pub struct BroadcastCache {
    sender: broadcast::Sender<CacheKey>,
}

impl BroadcastCache {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheKey> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastCache {
    fn default() -> Self {
        Self::new(100)
    }
}

#[async_trait]
impl CollectionCache for BroadcastCache {
    fn id(&self) -> &'static str {
        "broadcast"
    }

    async fn invalidate(&self, key: &CacheKey) {
        // No subscribers is fine: nothing on screen depends on the key.
        if self.sender.send(key.clone()).is_err() {
            debug!("No listeners for invalidation of {:?}", key);
        }
    }
}
