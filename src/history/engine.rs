//! Clips - History engine
//!
//! Turns published clipboard content into a deduplicated, bounded, persisted
//! history. All mutations go through one lock and are saved before it is
//! released, so concurrent ticks and favorite toggles never interleave.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use uuid::Uuid;

use super::codec;
use crate::clipboard::{ClipboardContent, ContentKind, HistoryEntry};
use crate::storage::KeyValueStore;

/// Default number of retained entries
pub const DEFAULT_CAPACITY: usize = 50;

/// Storage key of the history document
pub const HISTORY_KEY: &str = "clips.history";

/// Snapshot of the history, newest first
pub type HistorySnapshot = Arc<Vec<HistoryEntry>>;

/// Entry filter used by search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EntryFilter {
    #[default]
    All,
    Text,
    Image,
    Favorites,
}

impl EntryFilter {
    /// Parse a filter name, unknown names mean no filtering
    pub fn parse(s: &str) -> Self {
        match s {
            "favorites" => EntryFilter::Favorites,
            other => match ContentKind::parse(other) {
                Some(ContentKind::Text) => EntryFilter::Text,
                Some(ContentKind::Image) => EntryFilter::Image,
                None => EntryFilter::All,
            },
        }
    }

    fn admits(&self, entry: &HistoryEntry) -> bool {
        match self {
            EntryFilter::All => true,
            EntryFilter::Text => entry.kind() == ContentKind::Text,
            EntryFilter::Image => entry.kind() == ContentKind::Image,
            EntryFilter::Favorites => entry.is_favorite,
        }
    }
}

pub struct HistoryEngine {
    store: Arc<dyn KeyValueStore>,
    capacity: usize,
    entries: Mutex<HistorySnapshot>,
    updates: watch::Sender<HistorySnapshot>,
}

impl HistoryEngine {
    /// Create the engine and restore the persisted history.
    ///
    /// Missing or unreadable data starts an empty history.
    pub fn new(store: Arc<dyn KeyValueStore>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut entries = Self::load(store.as_ref());
        if entries.len() > capacity {
            log::info!(
                "[History] Truncating restored history from {} to {} entries",
                entries.len(),
                capacity
            );
            entries.truncate(capacity);
        }
        log::info!("[History] Loaded {} entries", entries.len());

        let snapshot = Arc::new(entries);
        let (updates, _) = watch::channel(Arc::clone(&snapshot));
        Self {
            store,
            capacity,
            entries: Mutex::new(snapshot),
            updates,
        }
    }

    fn load(store: &dyn KeyValueStore) -> Vec<HistoryEntry> {
        let bytes = match store.load(HISTORY_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::warn!("[History] Failed to load history: {}", e);
                return Vec::new();
            }
        };
        codec::decode(&bytes).unwrap_or_else(|e| {
            log::warn!("[History] Stored history is unreadable, starting empty: {}", e);
            Vec::new()
        })
    }

    /// Apply a mutation, then persist and publish while still holding the lock.
    ///
    /// `plan` inspects the shared snapshot and returns `None` when nothing would
    /// change. The snapshot is only copied once a plan exists, so rejected
    /// mutations leave the published `Arc` untouched.
    fn mutate<P, T>(
        &self,
        plan: impl FnOnce(&[HistoryEntry]) -> Option<P>,
        apply: impl FnOnce(&mut Vec<HistoryEntry>, P) -> T,
    ) -> Option<T> {
        let mut guard = self.entries.lock();
        let planned = plan(&guard)?;
        let result = apply(Arc::make_mut(&mut guard), planned);
        self.persist(&guard);
        self.updates.send_replace(Arc::clone(&guard));
        Some(result)
    }

    fn persist(&self, entries: &[HistoryEntry]) {
        let bytes = match codec::encode(entries) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("[History] Failed to encode history: {}", e);
                return;
            }
        };
        // In-memory state stays authoritative, the next save catches up
        if let Err(e) = self.store.save(HISTORY_KEY, &bytes) {
            log::error!("[History] Failed to save history: {}", e);
        }
    }

    /// Record newly observed content. Returns whether an entry was inserted.
    pub fn on_new_content(&self, content: ClipboardContent) -> bool {
        let capacity = self.capacity;
        self.mutate(
            |entries| match entries.first() {
                Some(head) if head.content.same_payload(&content) => {
                    log::debug!("[History] Content matches the latest entry, skipping");
                    None
                }
                _ => Some(content),
            },
            |entries, content| {
                entries.insert(0, HistoryEntry::new(content));
                entries.truncate(capacity);
                log::debug!("[History] Added entry, count now {}", entries.len());
            },
        )
        .is_some()
    }

    /// Flip the favorite flag, returns the new value or `None` if not found
    pub fn toggle_favorite(&self, id: Uuid) -> Option<bool> {
        self.mutate(
            |entries| entries.iter().position(|e| e.id == id),
            |entries, index| {
                let entry = &mut entries[index];
                entry.is_favorite = !entry.is_favorite;
                entry.is_favorite
            },
        )
    }

    /// Delete one entry, returns whether it existed
    pub fn remove(&self, id: Uuid) -> bool {
        self.mutate(
            |entries| entries.iter().position(|e| e.id == id),
            |entries, index| {
                entries.remove(index);
            },
        )
        .is_some()
    }

    pub fn clear(&self) {
        self.mutate(|_| Some(()), |entries, ()| entries.clear());
        log::info!("[History] Cleared all entries");
    }

    pub fn clear_favorites(&self) {
        self.mutate(
            |_| Some(()),
            |entries, ()| {
                for entry in entries.iter_mut() {
                    entry.is_favorite = false;
                }
            },
        );
    }

    pub fn entries(&self) -> HistorySnapshot {
        Arc::clone(&self.entries.lock())
    }

    /// Subscribe to history changes
    pub fn subscribe(&self) -> watch::Receiver<HistorySnapshot> {
        self.updates.subscribe()
    }

    pub fn head(&self) -> Option<HistoryEntry> {
        self.entries.lock().first().cloned()
    }

    pub fn get(&self, id: Uuid) -> Option<HistoryEntry> {
        self.entries.lock().iter().find(|e| e.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Favorited entries, in history order
    pub fn favorites(&self) -> Vec<HistoryEntry> {
        self.search("", EntryFilter::Favorites)
    }

    /// Case-insensitive substring search over text, or over an image's file
    /// name hint. An empty query matches every entry the filter admits.
    pub fn search(&self, query: &str, filter: EntryFilter) -> Vec<HistoryEntry> {
        let needle = query.to_lowercase();
        self.entries
            .lock()
            .iter()
            .filter(|entry| filter.admits(entry))
            .filter(|entry| {
                needle.is_empty()
                    || entry
                        .content
                        .searchable_text()
                        .map(|text| text.to_lowercase().contains(&needle))
                        .unwrap_or(false)
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StorageError};

    struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn save(&self, _key: &str, _bytes: &[u8]) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk full".to_string()))
        }

        fn load(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
            Err(StorageError::Unavailable("disk gone".to_string()))
        }
    }

    fn engine_with(capacity: usize) -> (HistoryEngine, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let engine = HistoryEngine::new(Arc::clone(&store) as Arc<dyn KeyValueStore>, capacity);
        (engine, store)
    }

    fn texts(engine: &HistoryEngine) -> Vec<String> {
        engine
            .entries()
            .iter()
            .map(|e| e.content.searchable_text().unwrap_or_default().to_string())
            .collect()
    }

    fn persisted(store: &MemoryStore) -> Vec<HistoryEntry> {
        codec::decode(&store.load(HISTORY_KEY).unwrap().unwrap()).unwrap()
    }

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let (engine, _) = engine_with(3);
        for text in ["a", "b", "c", "d"] {
            assert!(engine.on_new_content(ClipboardContent::text(text)));
        }
        assert_eq!(texts(&engine), vec!["d", "c", "b"]);
    }

    #[test]
    fn repeated_content_is_recorded_once() {
        let (engine, store) = engine_with(DEFAULT_CAPACITY);
        assert!(engine.on_new_content(ClipboardContent::text("x")));
        let saved = store.load(HISTORY_KEY).unwrap();

        assert!(!engine.on_new_content(ClipboardContent::text("x")));
        assert_eq!(texts(&engine), vec!["x"]);
        // No write for a duplicate
        assert_eq!(store.load(HISTORY_KEY).unwrap(), saved);
    }

    #[test]
    fn dedup_only_checks_the_head() {
        let (engine, _) = engine_with(DEFAULT_CAPACITY);
        engine.on_new_content(ClipboardContent::text("x"));
        engine.on_new_content(ClipboardContent::text("y"));
        assert!(engine.on_new_content(ClipboardContent::text("x")));
        assert_eq!(texts(&engine), vec!["x", "y", "x"]);
    }

    #[test]
    fn image_after_text_is_distinct() {
        let (engine, _) = engine_with(DEFAULT_CAPACITY);
        engine.on_new_content(ClipboardContent::text("x"));
        engine.on_new_content(ClipboardContent::image(b"IMG1".to_vec(), None));

        let entries = engine.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content, ClipboardContent::image(b"IMG1".to_vec(), None));
        assert_eq!(entries[1].content, ClipboardContent::text("x"));
    }

    #[test]
    fn same_image_bytes_are_deduplicated() {
        let (engine, _) = engine_with(DEFAULT_CAPACITY);
        engine.on_new_content(ClipboardContent::image(vec![1, 2], Some("a.png".into())));
        assert!(!engine.on_new_content(ClipboardContent::image(vec![1, 2], None)));
        assert!(engine.on_new_content(ClipboardContent::image(vec![1, 3], None)));
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn text_equal_to_image_bytes_is_not_a_duplicate() {
        let (engine, _) = engine_with(DEFAULT_CAPACITY);
        engine.on_new_content(ClipboardContent::image(b"x".to_vec(), None));
        assert!(engine.on_new_content(ClipboardContent::text("x")));
    }

    #[test]
    fn toggling_twice_restores_favorite_flag() {
        let (engine, store) = engine_with(DEFAULT_CAPACITY);
        engine.on_new_content(ClipboardContent::text("only"));
        let id = engine.head().unwrap().id;

        assert_eq!(engine.toggle_favorite(id), Some(true));
        assert!(persisted(&store)[0].is_favorite);
        assert_eq!(engine.toggle_favorite(id), Some(false));
        assert!(!engine.get(id).unwrap().is_favorite);
        assert!(!persisted(&store)[0].is_favorite);
    }

    #[test]
    fn toggle_unknown_id_is_a_no_op() {
        let (engine, store) = engine_with(DEFAULT_CAPACITY);
        assert_eq!(engine.toggle_favorite(Uuid::new_v4()), None);
        assert_eq!(store.load(HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn favorites_follow_history_order_and_can_be_evicted() {
        let (engine, _) = engine_with(2);
        engine.on_new_content(ClipboardContent::text("a"));
        let a = engine.head().unwrap().id;
        engine.on_new_content(ClipboardContent::text("b"));
        let b = engine.head().unwrap().id;
        engine.toggle_favorite(a);
        engine.toggle_favorite(b);

        let favorites: Vec<_> = engine.favorites().into_iter().map(|e| e.id).collect();
        assert_eq!(favorites, vec![b, a]);

        engine.on_new_content(ClipboardContent::text("c"));
        let favorites: Vec<_> = engine.favorites().into_iter().map(|e| e.id).collect();
        assert_eq!(favorites, vec![b]);
    }

    #[test]
    fn clear_favorites_keeps_entries() {
        let (engine, store) = engine_with(DEFAULT_CAPACITY);
        engine.on_new_content(ClipboardContent::text("a"));
        engine.on_new_content(ClipboardContent::text("b"));
        for entry in engine.entries().iter() {
            engine.toggle_favorite(entry.id);
        }
        assert_eq!(engine.favorites().len(), 2);

        engine.clear_favorites();
        assert!(engine.favorites().is_empty());
        assert_eq!(engine.len(), 2);
        assert!(persisted(&store).iter().all(|e| !e.is_favorite));
    }

    #[test]
    fn clear_persists_empty_history() {
        let (engine, store) = engine_with(DEFAULT_CAPACITY);
        engine.on_new_content(ClipboardContent::text("a"));
        engine.clear();
        assert!(engine.is_empty());
        assert!(persisted(&store).is_empty());
    }

    #[test]
    fn remove_deletes_single_entry() {
        let (engine, _) = engine_with(DEFAULT_CAPACITY);
        engine.on_new_content(ClipboardContent::text("a"));
        engine.on_new_content(ClipboardContent::text("b"));
        let b = engine.head().unwrap().id;

        assert!(engine.remove(b));
        assert!(!engine.remove(b));
        assert_eq!(texts(&engine), vec!["a"]);
    }

    #[test]
    fn restores_persisted_history() {
        let store = Arc::new(MemoryStore::new());
        let first = HistoryEngine::new(Arc::clone(&store) as Arc<dyn KeyValueStore>, 10);
        first.on_new_content(ClipboardContent::text("one"));
        first.on_new_content(ClipboardContent::image(vec![7; 16], Some("pic.png".into())));
        first.toggle_favorite(first.head().unwrap().id);

        let second = HistoryEngine::new(store as Arc<dyn KeyValueStore>, 10);
        assert_eq!(*second.entries(), *first.entries());
    }

    #[test]
    fn restored_history_is_truncated_to_capacity() {
        let store = Arc::new(MemoryStore::new());
        let big = HistoryEngine::new(Arc::clone(&store) as Arc<dyn KeyValueStore>, 10);
        for i in 0..5 {
            big.on_new_content(ClipboardContent::text(format!("item {}", i)));
        }

        let small = HistoryEngine::new(store as Arc<dyn KeyValueStore>, 2);
        assert_eq!(texts(&small), vec!["item 4", "item 3"]);
    }

    #[test]
    fn corrupt_storage_starts_empty() {
        let store = Arc::new(MemoryStore::new());
        store.save(HISTORY_KEY, b"{not json at all").unwrap();
        let engine = HistoryEngine::new(store as Arc<dyn KeyValueStore>, DEFAULT_CAPACITY);
        assert!(engine.is_empty());
    }

    #[test]
    fn storage_failures_are_not_fatal() {
        let engine = HistoryEngine::new(Arc::new(FailingStore), DEFAULT_CAPACITY);
        assert!(engine.is_empty());
        assert!(engine.on_new_content(ClipboardContent::text("kept in memory")));
        assert_eq!(texts(&engine), vec!["kept in memory"]);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let (engine, _) = engine_with(0);
        assert_eq!(engine.capacity(), 1);
        engine.on_new_content(ClipboardContent::text("a"));
        engine.on_new_content(ClipboardContent::text("b"));
        assert_eq!(texts(&engine), vec!["b"]);
    }

    #[test]
    fn search_is_case_insensitive() {
        let (engine, _) = engine_with(DEFAULT_CAPACITY);
        engine.on_new_content(ClipboardContent::text("Hello World"));
        engine.on_new_content(ClipboardContent::image(vec![1], Some("WorldMap.png".into())));
        engine.on_new_content(ClipboardContent::image(vec![2], None));
        engine.on_new_content(ClipboardContent::text("unrelated"));

        assert_eq!(engine.search("world", EntryFilter::All).len(), 2);
        assert_eq!(engine.search("WORLD", EntryFilter::Text).len(), 1);
        assert_eq!(engine.search("world", EntryFilter::Image).len(), 1);
        assert_eq!(engine.search("", EntryFilter::Image).len(), 2);
        assert_eq!(engine.search("", EntryFilter::All).len(), 4);
        assert!(engine.search("missing", EntryFilter::All).is_empty());
    }

    #[test]
    fn parses_filter_names() {
        assert_eq!(EntryFilter::parse("text"), EntryFilter::Text);
        assert_eq!(EntryFilter::parse("image"), EntryFilter::Image);
        assert_eq!(EntryFilter::parse("favorites"), EntryFilter::Favorites);
        assert_eq!(EntryFilter::parse("whatever"), EntryFilter::All);
    }

    #[test]
    fn subscribers_see_every_mutation() {
        let (engine, _) = engine_with(DEFAULT_CAPACITY);
        let mut rx = engine.subscribe();
        assert!(rx.borrow_and_update().is_empty());

        engine.on_new_content(ClipboardContent::text("a"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        engine.on_new_content(ClipboardContent::text("a"));
        assert!(!rx.has_changed().unwrap());

        engine.clear();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_empty());
    }

    #[test]
    fn rejected_mutations_keep_the_published_snapshot() {
        let (engine, _) = engine_with(DEFAULT_CAPACITY);
        engine.on_new_content(ClipboardContent::image(vec![9; 64], None));
        let before = engine.entries();

        assert!(!engine.on_new_content(ClipboardContent::image(vec![9; 64], None)));
        assert!(Arc::ptr_eq(&before, &engine.entries()));
        assert_eq!(engine.toggle_favorite(Uuid::new_v4()), None);
        assert!(!engine.remove(Uuid::new_v4()));
        assert!(Arc::ptr_eq(&before, &engine.entries()));
    }

    #[test]
    fn accepted_insert_shares_existing_image_bytes() {
        let (engine, _) = engine_with(DEFAULT_CAPACITY);
        engine.on_new_content(ClipboardContent::image(vec![5; 256], None));
        let before = engine.entries();

        assert!(engine.on_new_content(ClipboardContent::text("after")));
        let after = engine.entries();
        assert!(!Arc::ptr_eq(&before, &after));
        let image_bytes = |content: &ClipboardContent| match content {
            ClipboardContent::Image { bytes, .. } => Arc::clone(bytes),
            other => panic!("expected an image, got {:?}", other),
        };
        assert!(Arc::ptr_eq(
            &image_bytes(&before[0].content),
            &image_bytes(&after[1].content)
        ));
    }

    #[test]
    fn snapshots_are_not_affected_by_later_mutations() {
        let (engine, _) = engine_with(DEFAULT_CAPACITY);
        engine.on_new_content(ClipboardContent::text("a"));
        let before = engine.entries();
        engine.on_new_content(ClipboardContent::text("b"));
        assert_eq!(before.len(), 1);
        assert_eq!(engine.len(), 2);
    }
}
