//! Handles for externally resolved resources (image sources).
//!
//! Rendering asks the cache for a source every frame. The first request
//! queues the source for loading and reports [`ResourceState::Pending`];
//! later frames see the resolved state once a loader has completed it.

use crate::storage::BoxFuture;
use std::collections::HashMap;

/// Decoded image metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

/// Resolution state of one resource key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    Pending,
    Ready(ImageInfo),
    Failed(String),
}

impl ResourceState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ResourceState::Ready(_))
    }
}

/// Source key -> resolution state, plus the queue of keys awaiting a loader.
#[derive(Debug, Clone, Default)]
pub struct ResourceCache {
    entries: HashMap<String, ResourceState>,
    queue: Vec<String>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of `key`; unknown keys are queued and reported pending.
    pub fn request(&mut self, key: &str) -> ResourceState {
        if let Some(state) = self.entries.get(key) {
            return state.clone();
        }
        self.entries.insert(key.to_string(), ResourceState::Pending);
        self.queue.push(key.to_string());
        ResourceState::Pending
    }

    /// State of `key` without queueing it.
    pub fn get(&self, key: &str) -> Option<&ResourceState> {
        self.entries.get(key)
    }

    /// Drain the keys that still need loading.
    pub fn take_requests(&mut self) -> Vec<String> {
        std::mem::take(&mut self.queue)
    }

    pub fn has_requests(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn resolve(&mut self, key: &str, info: ImageInfo) {
        self.entries.insert(key.to_string(), ResourceState::Ready(info));
    }

    pub fn fail(&mut self, key: &str, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("Resource {key} failed: {reason}");
        self.entries
            .insert(key.to_string(), ResourceState::Failed(reason));
    }

    /// Forget a key so it is requested again.
    pub fn evict(&mut self, key: &str) {
        self.entries.remove(key);
        self.queue.retain(|queued| queued != key);
    }
}

/// Resolves a source key to image metadata.
pub trait ResourceLoader {
    fn load(&self, key: &str) -> BoxFuture<'_, Result<ImageInfo, String>>;
}

/// Run the loader for every queued key. Returns how many resolved successfully.
pub async fn load_pending<L: ResourceLoader + ?Sized>(cache: &mut ResourceCache, loader: &L) -> usize {
    let mut resolved = 0;
    for key in cache.take_requests() {
        match loader.load(&key).await {
            Ok(info) => {
                log::debug!("Resolved {key} ({}x{})", info.width, info.height);
                cache.resolve(&key, info);
                resolved += 1;
            }
            Err(reason) => cache.fail(&key, reason),
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_util::block_on;

    struct FakeLoader;

    impl ResourceLoader for FakeLoader {
        fn load(&self, key: &str) -> BoxFuture<'_, Result<ImageInfo, String>> {
            let result = if key.ends_with(".png") {
                Ok(ImageInfo {
                    width: 64,
                    height: 32,
                })
            } else {
                Err(format!("unsupported source {key}"))
            };
            Box::pin(async move { result })
        }
    }

    #[test]
    fn test_request_queues_once() {
        let mut cache = ResourceCache::new();
        assert_eq!(cache.request("a.png"), ResourceState::Pending);
        assert_eq!(cache.request("a.png"), ResourceState::Pending);
        assert_eq!(cache.take_requests(), vec!["a.png".to_string()]);
        assert!(!cache.has_requests());
        // Still pending after the queue is drained.
        assert_eq!(cache.request("a.png"), ResourceState::Pending);
        assert!(!cache.has_requests());
    }

    #[test]
    fn test_load_pending_resolves_and_fails() {
        let mut cache = ResourceCache::new();
        cache.request("a.png");
        cache.request("b.tiff");
        let resolved = block_on(load_pending(&mut cache, &FakeLoader));
        assert_eq!(resolved, 1);
        assert_eq!(
            cache.request("a.png"),
            ResourceState::Ready(ImageInfo {
                width: 64,
                height: 32
            })
        );
        assert!(matches!(cache.request("b.tiff"), ResourceState::Failed(_)));
    }

    #[test]
    fn test_evict_requeues() {
        let mut cache = ResourceCache::new();
        cache.request("a.png");
        cache.evict("a.png");
        assert!(cache.get("a.png").is_none());
        assert!(!cache.has_requests());
        cache.request("a.png");
        assert!(cache.has_requests());
    }
}
