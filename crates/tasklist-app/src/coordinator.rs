//! Persistence coordinator: decides when the local cache and the remote
//! table are read or written, and derives the [`SyncStatus`].
//!
//! A save is split in two. The sequence token and the local cache write happen
//! synchronously when the save is requested, so both follow commit order. The
//! remote push runs afterwards and waits for the previous push to finish, so
//! remote writes are applied in the same order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tasklist_core::{Task, TaskId, normalize_tasks, parse_tasks, serialize_tasks};
use tasklist_store::{CacheError, LocalCache, RemoteError, RemoteRow, RemoteStore};
use time::OffsetDateTime;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::sync_status::{AttemptToken, SyncStatus, SyncTracker};

/// Result of a save request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Requested before the initial load completed; nothing was written.
    Deferred,
    /// The attempt ran and published its status.
    Published(SyncStatus),
    /// The attempt ran but a newer attempt had started, so its status was dropped.
    Superseded(SyncStatus),
    /// The spawned save task panicked or was cancelled.
    Aborted,
}

impl SaveOutcome {
    /// Status computed by the attempt, if it ran.
    #[must_use]
    pub const fn status(self) -> Option<SyncStatus> {
        match self {
            Self::Published(status) | Self::Superseded(status) => Some(status),
            Self::Deferred | Self::Aborted => None,
        }
    }
}

/// Handle to a requested save.
///
/// The local cache has already been written when the handle is returned; the
/// remote push may still be running.
#[derive(Debug)]
pub struct PendingSave(Pending);

#[derive(Debug)]
enum Pending {
    Ready(SaveOutcome),
    Spawned(JoinHandle<SaveOutcome>),
}

impl PendingSave {
    /// Wait for the save to finish.
    pub async fn wait(self) -> SaveOutcome {
        match self.0 {
            Pending::Ready(outcome) => outcome,
            Pending::Spawned(handle) => match handle.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(error = %err, "save task did not complete");
                    SaveOutcome::Aborted
                }
            },
        }
    }
}

/// Remote half of a save whose local half already ran.
struct RemotePush {
    token: AttemptToken,
    cache_ok: bool,
    /// Closed when the previous push finishes.
    previous: Option<oneshot::Receiver<()>>,
    /// Dropped when this push finishes, releasing the next one.
    done: oneshot::Sender<()>,
}

enum Staged {
    Ready(SaveOutcome),
    Remote(RemotePush),
}

/// Owns the persistence protocol for one task list.
pub struct PersistenceCoordinator<C, R> {
    cache: C,
    remote: Option<R>,
    tracker: SyncTracker,
    loaded: AtomicBool,
    push_tail: Mutex<Option<oneshot::Receiver<()>>>,
}

impl<C, R> PersistenceCoordinator<C, R> {
    /// Coordinator over `cache` and an optional `remote`.
    pub fn new(cache: C, remote: Option<R>) -> Self {
        Self {
            cache,
            remote,
            tracker: SyncTracker::new(),
            loaded: AtomicBool::new(false),
            push_tail: Mutex::new(None),
        }
    }

    /// Whether a remote store is configured.
    pub const fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Whether the initial load has completed.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    /// Latest published status.
    pub fn status(&self) -> SyncStatus {
        self.tracker.current()
    }

    /// Receiver notified on every status change.
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.tracker.subscribe()
    }

    /// Borrow the local cache.
    pub const fn cache(&self) -> &C {
        &self.cache
    }

    fn queue_push(&self, token: AttemptToken, cache_ok: bool) -> RemotePush {
        let (done, released) = oneshot::channel();
        let previous = self
            .push_tail
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(released);
        RemotePush {
            token,
            cache_ok,
            previous,
            done,
        }
    }
}

impl<C: LocalCache, R: RemoteStore> PersistenceCoordinator<C, R> {
    /// Establish the initial list.
    ///
    /// Reads the remote table when configured, falling back to the local cache
    /// on failure. The result is mirrored into the cache unless the cache
    /// itself could not be read.
    pub async fn load(&self) -> Vec<Task> {
        let token = self.tracker.begin();

        let (tasks, status) = match &self.remote {
            Some(remote) => match remote.fetch_all().await {
                Ok(payload) => {
                    let tasks = normalize_tasks(&payload);
                    info!(count = tasks.len(), "loaded tasks from remote");
                    (tasks, SyncStatus::Saved)
                }
                Err(err) => {
                    warn!(error = %err, "remote fetch failed; falling back to local cache");
                    self.read_cache()
                }
            },
            None => self.read_cache(),
        };

        if status == SyncStatus::Error {
            warn!("local cache unreadable; leaving it untouched");
        } else if let Err(err) = self.write_cache(&tasks) {
            warn!(error = %err, "could not mirror loaded tasks into local cache");
        }

        self.loaded.store(true, Ordering::SeqCst);
        self.tracker.finish(token, status);
        tasks
    }

    /// Persist `tasks` to the local cache and, when configured, the remote table.
    ///
    /// Failures never propagate: they only shape the published status.
    pub async fn save(&self, tasks: &[Task]) -> SaveOutcome {
        match self.stage(tasks) {
            Staged::Ready(outcome) => outcome,
            Staged::Remote(push) => self.push(push, tasks).await,
        }
    }

    /// Take the sequence token and write the local cache. Without a remote the
    /// save is complete afterwards.
    fn stage(&self, tasks: &[Task]) -> Staged {
        if !self.is_loaded() {
            debug!(count = tasks.len(), "initial load still running; save skipped");
            return Staged::Ready(SaveOutcome::Deferred);
        }
        let token = self.tracker.begin();

        let cache_ok = match self.write_cache(tasks) {
            Ok(()) => true,
            Err(err) => {
                error!(error = %err, "local cache write failed");
                false
            }
        };

        if self.remote.is_none() {
            return Staged::Ready(self.publish(token, SyncStatus::local_fallback(cache_ok)));
        }
        Staged::Remote(self.queue_push(token, cache_ok))
    }

    async fn push(&self, push: RemotePush, tasks: &[Task]) -> SaveOutcome {
        let RemotePush {
            token,
            cache_ok,
            previous,
            done,
        } = push;
        if let Some(previous) = previous {
            // Resolves once the earlier push drops its sender.
            let _ = previous.await;
        }

        let status = match &self.remote {
            None => SyncStatus::local_fallback(cache_ok),
            Some(remote) => match push_remote(remote, tasks).await {
                Ok(()) => {
                    info!(count = tasks.len(), "tasks saved to remote");
                    SyncStatus::Saved
                }
                Err(err) => {
                    warn!(error = %err, cache_ok, "remote save failed");
                    SyncStatus::local_fallback(cache_ok)
                }
            },
        };

        let outcome = self.publish(token, status);
        drop(done);
        outcome
    }

    fn publish(&self, token: AttemptToken, status: SyncStatus) -> SaveOutcome {
        if self.tracker.finish(token, status) {
            SaveOutcome::Published(status)
        } else {
            SaveOutcome::Superseded(status)
        }
    }

    fn read_cache(&self) -> (Vec<Task>, SyncStatus) {
        match self.cache.read() {
            Ok(Some(raw)) => {
                let tasks = parse_tasks(&raw);
                info!(count = tasks.len(), "loaded tasks from local cache");
                (tasks, SyncStatus::LocalOnly)
            }
            Ok(None) => {
                debug!("local cache is empty");
                (Vec::new(), SyncStatus::LocalOnly)
            }
            Err(err) => {
                error!(error = %err, "local cache read failed");
                (Vec::new(), SyncStatus::Error)
            }
        }
    }

    fn write_cache(&self, tasks: &[Task]) -> Result<(), CacheError> {
        let payload = serialize_tasks(tasks).map_err(|err| CacheError::Unavailable(err.to_string()))?;
        self.cache.write(&payload)
    }
}

impl<C, R> PersistenceCoordinator<C, R>
where
    C: LocalCache + 'static,
    R: RemoteStore,
{
    /// Request a save without waiting for the remote.
    ///
    /// The token and the local cache write are taken on the calling thread, so
    /// successive calls are ordered by call order; only the remote push is
    /// spawned.
    ///
    /// # Panics
    /// Panics when a remote is configured and this is called outside a tokio
    /// runtime.
    pub fn schedule_save(self: &Arc<Self>, tasks: Vec<Task>) -> PendingSave {
        match self.stage(&tasks) {
            Staged::Ready(outcome) => PendingSave(Pending::Ready(outcome)),
            Staged::Remote(push) => {
                let this = Arc::clone(self);
                PendingSave(Pending::Spawned(tokio::spawn(async move {
                    this.push(push, &tasks).await
                })))
            }
        }
    }
}

async fn push_remote<R: RemoteStore>(remote: &R, tasks: &[Task]) -> Result<(), RemoteError> {
    if tasks.is_empty() {
        // An empty exclusion set is ill-defined; wipe the table explicitly.
        return remote.delete_all().await;
    }
    let rows = RemoteRow::from_tasks(tasks, OffsetDateTime::now_utc());
    remote.upsert(&rows).await?;
    let keep: Vec<TaskId> = tasks.iter().map(|task| task.id).collect();
    remote.delete_except(&keep).await
}
