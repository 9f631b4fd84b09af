//! Scene and clipboard persistence with periodic auto-save.
//!
//! Saves never fail loudly: errors are logged and the dirty flag stays set so
//! the next attempt retries. Loads treat missing or corrupt data as "nothing
//! saved".

use crate::clipboard::{ClipboardManager, ClipboardPayload};
use crate::elements::Element;
use crate::storage::{Storage, StorageError};
use crate::store::ElementStore;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Key holding the ordered element list.
pub const ELEMENTS_KEY: &str = "slate.elements";

/// Key holding the clipboard payload.
pub const CLIPBOARD_KEY: &str = "slate.clipboard";

/// Persists the scene and clipboard to a storage backend.
pub struct ScenePersistence<S: Storage> {
    storage: Arc<S>,
    interval: Duration,
    last_save: Option<Instant>,
    /// Whether the scene has unsaved changes.
    dirty: bool,
}

impl<S: Storage> ScenePersistence<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
            dirty: false,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Dirty, and the interval has passed since the last save (or there was none).
    pub fn should_save(&self) -> bool {
        self.should_save_at(Instant::now())
    }

    pub fn should_save_at(&self, now: Instant) -> bool {
        if !self.dirty {
            return false;
        }
        match self.last_save {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    /// Write the ordered element list.
    pub async fn save_scene(&mut self, store: &ElementStore) {
        self.save_scene_at(store, Instant::now()).await;
    }

    /// Write the ordered element list, recording `now` as the save time.
    pub async fn save_scene_at(&mut self, store: &ElementStore, now: Instant) {
        let json = match store.to_json() {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to serialize scene: {e}");
                return;
            }
        };
        match self.storage.save(ELEMENTS_KEY, &json).await {
            Ok(()) => {
                self.dirty = false;
                self.last_save = Some(now);
                log::info!("Saved {} elements", store.len());
            }
            Err(e) => log::error!("Failed to save scene: {e}"),
        }
    }

    /// Write the clipboard slot. An empty clipboard is not written.
    pub async fn save_clipboard(&self, clipboard: &ClipboardManager) {
        let Some(payload) = clipboard.payload() else {
            return;
        };
        let json = match serde_json::to_string(payload) {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to serialize clipboard: {e}");
                return;
            }
        };
        if let Err(e) = self.storage.save(CLIPBOARD_KEY, &json).await {
            log::error!("Failed to save clipboard: {e}");
        }
    }

    /// Save the scene if dirty and the interval elapsed. Returns true if a save ran.
    pub async fn maybe_save(&mut self, store: &ElementStore) -> bool {
        self.maybe_save_at(store, Instant::now()).await
    }

    pub async fn maybe_save_at(&mut self, store: &ElementStore, now: Instant) -> bool {
        if !self.should_save_at(now) {
            return false;
        }
        self.save_scene_at(store, now).await;
        true
    }

    /// Read the saved element list.
    ///
    /// Returns None when nothing is saved, the data is unreadable, or two
    /// elements share an id.
    pub async fn load_scene(&mut self) -> Option<Vec<Element>> {
        let json = self.load_key(ELEMENTS_KEY).await?;
        let elements: Vec<Element> = match serde_json::from_str(&json) {
            Ok(elements) => elements,
            Err(e) => {
                log::warn!("Ignoring corrupt scene data: {e}");
                return None;
            }
        };
        let mut seen = HashSet::new();
        if let Some(duplicate) = elements.iter().map(Element::id).find(|id| !seen.insert(*id)) {
            log::warn!("Ignoring scene data with duplicate id {duplicate}");
            return None;
        }
        self.dirty = false;
        self.last_save = Some(Instant::now());
        log::info!("Restored {} elements", elements.len());
        Some(elements)
    }

    /// Read the saved clipboard payload.
    pub async fn load_clipboard(&self) -> Option<ClipboardPayload> {
        let json = self.load_key(CLIPBOARD_KEY).await?;
        match serde_json::from_str(&json) {
            Ok(payload) => Some(payload),
            Err(e) => {
                log::warn!("Ignoring corrupt clipboard data: {e}");
                None
            }
        }
    }

    /// Delete both saved slots.
    pub async fn clear(&mut self) {
        for key in [ELEMENTS_KEY, CLIPBOARD_KEY] {
            if let Err(e) = self.storage.delete(key).await {
                log::error!("Failed to delete {key}: {e}");
            }
        }
        self.dirty = false;
    }

    async fn load_key(&self, key: &str) -> Option<String> {
        match self.storage.load(key).await {
            Ok(json) => Some(json),
            Err(StorageError::NotFound(_)) => {
                log::debug!("Nothing saved under {key}");
                None
            }
            Err(e) => {
                log::warn!("Failed to read {key}: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{ElementDraft, Span};
    use crate::storage::test_util::block_on;
    use crate::storage::{FileStorage, MemoryStorage};
    use kurbo::{Point, Rect};
    use tempfile::tempdir;

    fn sample_store() -> ElementStore {
        let mut store = ElementStore::new();
        let a = store.add(ElementDraft::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0)));
        store.add(ElementDraft::text(Point::new(5.0, 5.0), vec![Span::new("hi").bold()]));
        store.add(ElementDraft::image(Rect::new(0.0, 0.0, 4.0, 4.0), "a.png"));
        store.set_selected([a]);
        store
    }

    #[test]
    fn test_scene_round_trip_keeps_order_and_drops_selection() {
        let storage = Arc::new(MemoryStorage::new());
        let mut persistence = ScenePersistence::new(storage);
        let store = sample_store();

        block_on(persistence.save_scene(&store));
        let elements = block_on(persistence.load_scene()).unwrap();
        let ids: Vec<_> = elements.iter().map(Element::id).collect();
        assert_eq!(ids, store.ids());
        assert!(elements.iter().all(|e| !e.is_selected()));

        let mut restored = ElementStore::new();
        restored.load_elements(elements);
        assert_eq!(restored.len(), 3);
        assert!(!restored.has_selection());
    }

    #[test]
    fn test_missing_and_corrupt_data_load_as_none() {
        let storage = Arc::new(MemoryStorage::new());
        let mut persistence = ScenePersistence::new(storage.clone());
        assert!(block_on(persistence.load_scene()).is_none());
        assert!(block_on(persistence.load_clipboard()).is_none());

        block_on(storage.save(ELEMENTS_KEY, "{not json")).unwrap();
        block_on(storage.save(CLIPBOARD_KEY, "42")).unwrap();
        assert!(block_on(persistence.load_scene()).is_none());
        assert!(block_on(persistence.load_clipboard()).is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let storage = Arc::new(MemoryStorage::new());
        let mut persistence = ScenePersistence::new(storage.clone());
        let store = sample_store();
        let first = store.elements().next().unwrap().clone();
        let json = serde_json::to_string(&vec![first.clone(), first]).unwrap();
        block_on(storage.save(ELEMENTS_KEY, &json)).unwrap();
        assert!(block_on(persistence.load_scene()).is_none());
    }

    #[test]
    fn test_clipboard_round_trip() {
        let storage = Arc::new(MemoryStorage::new());
        let persistence = ScenePersistence::new(storage.clone());
        let store = sample_store();
        let mut clipboard = ClipboardManager::default();

        // Empty clipboard is not written.
        block_on(persistence.save_clipboard(&clipboard));
        assert!(!block_on(storage.exists(CLIPBOARD_KEY)).unwrap());

        clipboard.copy(&store);
        block_on(persistence.save_clipboard(&clipboard));
        let payload = block_on(persistence.load_clipboard()).unwrap();
        assert_eq!(Some(&payload), clipboard.payload());
    }

    #[test]
    fn test_dirty_flag_and_interval() {
        let storage = Arc::new(MemoryStorage::new());
        let mut persistence = ScenePersistence::new(storage);
        assert!(!persistence.should_save());

        persistence.mark_dirty();
        assert!(persistence.should_save());

        let store = sample_store();
        assert!(block_on(persistence.maybe_save(&store)));
        assert!(!persistence.is_dirty());

        persistence.mark_dirty();
        assert!(!persistence.should_save());
        let later = Instant::now() + Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS + 1);
        assert!(persistence.should_save_at(later));
    }

    #[test]
    fn test_clear_removes_both_keys() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(FileStorage::new(dir.path()).unwrap());
        let mut persistence = ScenePersistence::new(storage.clone());
        let store = sample_store();
        let mut clipboard = ClipboardManager::default();
        clipboard.copy(&store);

        block_on(persistence.save_scene(&store));
        block_on(persistence.save_clipboard(&clipboard));
        assert_eq!(block_on(storage.list()).unwrap().len(), 2);

        block_on(persistence.clear());
        assert!(block_on(storage.list()).unwrap().is_empty());
        assert!(block_on(persistence.load_scene()).is_none());
    }
}
