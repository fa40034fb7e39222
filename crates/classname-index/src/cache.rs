//! Per-configuration index cache with copy-on-write replacement.
//!
//! Each distinct entry-path list owns a slot holding the current [`Index`].
//! Readers take an `Arc<Index>` snapshot; rebuilds index off to the side and
//! swap the new snapshot in, so a reader never sees a half-built index.

use crate::index::Index;
use crate::indexer::StylesheetIndexer;
use arc_swap::ArcSwap;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::info;

type Slot = Arc<ArcSwap<Index>>;

/// Lazily built, change-invalidated indexes keyed by entry paths.
#[derive(Debug)]
pub struct IndexCache {
    indexer: StylesheetIndexer,
    slots: Mutex<FxHashMap<Vec<Utf8PathBuf>, Slot>>,
}

impl Default for IndexCache {
    fn default() -> Self {
        Self::new(StylesheetIndexer::default())
    }
}

impl IndexCache {
    /// Creates an empty cache.
    pub fn new(indexer: StylesheetIndexer) -> Self {
        Self {
            indexer,
            slots: Mutex::new(FxHashMap::default()),
        }
    }

    /// The indexer used for builds.
    pub fn indexer(&self) -> &StylesheetIndexer {
        &self.indexer
    }

    /// Returns the stored index for `entries`, building it on first use.
    pub fn get_or_build(&self, entries: &[Utf8PathBuf]) -> Arc<Index> {
        if let Some(slot) = self.slots.lock().get(entries) {
            return slot.load_full();
        }

        // Build without holding the lock; a concurrent first build of the same
        // configuration is harmless, the first one stored wins.
        let built = Arc::new(self.indexer.index(entries));

        let mut slots = self.slots.lock();
        let slot = slots
            .entry(entries.to_vec())
            .or_insert_with(|| Arc::new(ArcSwap::new(built)));
        slot.load_full()
    }

    /// Re-indexes `entries` and replaces the stored index.
    pub fn rebuild(&self, entries: &[Utf8PathBuf]) -> Arc<Index> {
        let built = Arc::new(self.indexer.index(entries));

        let slot = self.slots.lock().get(entries).cloned();
        match slot {
            Some(slot) => slot.store(built.clone()),
            None => {
                self.slots
                    .lock()
                    .insert(entries.to_vec(), Arc::new(ArcSwap::new(built.clone())));
            }
        }

        built
    }

    /// Drops every stored index. The next [`get_or_build`](Self::get_or_build) re-indexes.
    pub fn invalidate(&self) {
        self.slots.lock().clear();
    }

    /// Handles a change to `path`.
    ///
    /// Every configuration whose index contains `path` is fully rebuilt.
    /// Returns true if any configuration was rebuilt.
    pub fn notify_changed(&self, path: &Utf8Path) -> bool {
        !self.notify_changed_batch([path]).is_empty()
    }

    /// Handles a batch of changed paths.
    ///
    /// Each affected configuration is rebuilt once, however many of its files
    /// changed. Returns the paths that belonged to at least one index.
    pub fn notify_changed_batch<'p, I>(&self, paths: I) -> Vec<Utf8PathBuf>
    where
        I: IntoIterator<Item = &'p Utf8Path>,
    {
        let mut relevant = Vec::new();
        let mut affected: FxHashMap<Vec<Utf8PathBuf>, Slot> = FxHashMap::default();
        {
            let slots = self.slots.lock();
            for path in paths {
                let mut hit = false;
                for (entries, slot) in slots.iter() {
                    if slot.load().contains_file(path) {
                        hit = true;
                        affected
                            .entry(entries.clone())
                            .or_insert_with(|| slot.clone());
                    }
                }
                if hit {
                    relevant.push(path.to_path_buf());
                }
            }
        }

        for (entries, slot) in &affected {
            let built = self.indexer.index(entries);
            info!(
                changed = relevant.len(),
                classes = built.len(),
                files = built.files().len(),
                "stylesheet index rebuilt"
            );
            slot.store(Arc::new(built));
        }

        relevant
    }

    /// The union of all stored indexes' contributing files.
    pub fn watched_paths(&self) -> IndexSet<Utf8PathBuf> {
        let slots = self.slots.lock();
        let mut paths = IndexSet::new();
        for slot in slots.values() {
            paths.extend(slot.load().files().iter().cloned());
        }
        paths
    }

    /// Number of stored configurations.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Returns true if nothing has been built yet.
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}
