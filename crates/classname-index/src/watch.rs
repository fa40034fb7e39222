//! Filesystem watching for live re-indexing.
//!
//! [`IndexWatcher`] subscribes to the directories of every file that
//! contributed to an [`IndexCache`] index. Change events are coalesced on a
//! background thread, each batch of changed paths is handed to
//! [`IndexCache::notify_changed_batch`], and the subscription set is re-synced
//! against the rebuilt indexes. Events are only ever processed on that
//! thread, so a rebuild never re-enters itself.

use crate::cache::IndexCache;
use crate::paths;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Watcher errors.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The underlying notify watcher failed.
    #[error("watch error: {0}")]
    Notify(#[from] notify::Error),

    /// The background thread could not be started.
    #[error("failed to spawn watch thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Directory subscription capability.
pub trait PathWatcher {
    /// Starts delivering change events for entries of `dir`.
    fn watch(&mut self, dir: &Utf8Path) -> Result<(), WatchError>;
    /// Stops delivering change events for `dir`.
    fn unwatch(&mut self, dir: &Utf8Path) -> Result<(), WatchError>;
}

struct NotifyWatcher(RecommendedWatcher);

impl PathWatcher for NotifyWatcher {
    fn watch(&mut self, dir: &Utf8Path) -> Result<(), WatchError> {
        Ok(self.0.watch(dir.as_std_path(), RecursiveMode::NonRecursive)?)
    }

    fn unwatch(&mut self, dir: &Utf8Path) -> Result<(), WatchError> {
        Ok(self.0.unwatch(dir.as_std_path())?)
    }
}

/// Tracks which directories are subscribed.
///
/// Files are watched through their parent directory, so editors that save by
/// renaming a temporary file over the original keep delivering events.
#[derive(Debug, Default)]
pub struct WatchRegistry {
    dirs: IndexSet<Utf8PathBuf>,
}

impl WatchRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently subscribed directories.
    pub fn dirs(&self) -> &IndexSet<Utf8PathBuf> {
        &self.dirs
    }

    /// Subscribes to the directories of `files`, dropping stale subscriptions.
    ///
    /// Failures are logged and leave that directory unsubscribed.
    pub fn sync<'a, I>(&mut self, watcher: &mut dyn PathWatcher, files: I)
    where
        I: IntoIterator<Item = &'a Utf8PathBuf>,
    {
        let wanted: IndexSet<Utf8PathBuf> = files
            .into_iter()
            .filter_map(|file| file.parent())
            .map(Utf8Path::to_path_buf)
            .collect();

        let stale: Vec<Utf8PathBuf> = self.dirs.difference(&wanted).cloned().collect();
        for dir in stale {
            if let Err(e) = watcher.unwatch(&dir) {
                debug!(dir = %dir, error = %e, "failed to unwatch directory");
            }
            self.dirs.shift_remove(&dir);
        }

        for dir in wanted {
            if self.dirs.contains(&dir) {
                continue;
            }
            match watcher.watch(&dir) {
                Ok(()) => {
                    self.dirs.insert(dir);
                }
                Err(e) => warn!(dir = %dir, error = %e, "failed to watch directory"),
            }
        }
    }
}

/// Tuning for [`IndexWatcher`].
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Events arriving within this window of each other are handled together.
    pub debounce: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
        }
    }
}

enum Message {
    Fs(notify::Result<notify::Event>),
    Resync,
    Shutdown,
}

/// Keeps an [`IndexCache`] in sync with the filesystem.
pub struct IndexWatcher {
    control: Sender<Message>,
    handle: Option<JoinHandle<()>>,
}

impl IndexWatcher {
    /// Starts watching with default options.
    ///
    /// `on_rebuild` runs on the watcher thread with the changed paths after
    /// every batch that rebuilt at least one index.
    pub fn spawn<F>(cache: Arc<IndexCache>, on_rebuild: F) -> Result<Self, WatchError>
    where
        F: FnMut(&[Utf8PathBuf]) + Send + 'static,
    {
        Self::spawn_with(cache, WatchOptions::default(), on_rebuild)
    }

    /// Starts watching with explicit options.
    pub fn spawn_with<F>(
        cache: Arc<IndexCache>,
        options: WatchOptions,
        on_rebuild: F,
    ) -> Result<Self, WatchError>
    where
        F: FnMut(&[Utf8PathBuf]) + Send + 'static,
    {
        let (control, events) = mpsc::channel();

        let fs_events = control.clone();
        let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let _ = fs_events.send(Message::Fs(res));
        })?;
        let mut watcher = NotifyWatcher(watcher);

        let mut registry = WatchRegistry::new();
        registry.sync(&mut watcher, cache.watched_paths().iter());

        let handle = thread::Builder::new()
            .name("classname-index-watch".into())
            .spawn(move || run(cache, watcher, registry, events, options, on_rebuild))?;

        Ok(Self {
            control,
            handle: Some(handle),
        })
    }

    /// Re-syncs subscriptions, e.g. after a new configuration was built.
    pub fn resync(&self) {
        let _ = self.control.send(Message::Resync);
    }
}

impl Drop for IndexWatcher {
    fn drop(&mut self) {
        let _ = self.control.send(Message::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// A coalesced batch of events.
#[derive(Default)]
struct Batch {
    changed: IndexSet<Utf8PathBuf>,
    resync: bool,
}

impl Batch {
    /// Folds a message into the batch. Returns false on shutdown.
    fn absorb(&mut self, message: Message) -> bool {
        match message {
            Message::Fs(Ok(event)) => {
                if event.kind.is_access() {
                    return true;
                }
                for path in event.paths {
                    if let Ok(path) = Utf8PathBuf::try_from(path) {
                        self.changed.insert(paths::canonical(&path));
                    }
                }
                true
            }
            Message::Fs(Err(e)) => {
                warn!(error = %e, "stylesheet watch error");
                true
            }
            Message::Resync => {
                self.resync = true;
                true
            }
            Message::Shutdown => false,
        }
    }
}

fn run<F>(
    cache: Arc<IndexCache>,
    mut watcher: NotifyWatcher,
    mut registry: WatchRegistry,
    events: Receiver<Message>,
    options: WatchOptions,
    mut on_rebuild: F,
) where
    F: FnMut(&[Utf8PathBuf]),
{
    while let Ok(first) = events.recv() {
        let mut batch = Batch::default();
        if !batch.absorb(first) {
            return;
        }

        loop {
            match events.recv_timeout(options.debounce) {
                Ok(message) => {
                    if !batch.absorb(message) {
                        return;
                    }
                }
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return,
            }
        }

        let rebuilt = cache.notify_changed_batch(batch.changed.iter().map(Utf8PathBuf::as_path));

        if !rebuilt.is_empty() || batch.resync {
            registry.sync(&mut watcher, cache.watched_paths().iter());
        }

        if !rebuilt.is_empty() {
            debug!(count = rebuilt.len(), "stylesheets changed");
            on_rebuild(&rebuilt);
        }
    }
}
