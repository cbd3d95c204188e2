//! Sync status state machine shared by load and save attempts.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

/// Derived persistence indicator shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// A load or save attempt is in flight.
    Loading,
    /// The list is confirmed in the remote store.
    Saved,
    /// The list is only persisted in the local cache.
    LocalOnly,
    /// Neither store accepted the list.
    Error,
}

impl SyncStatus {
    /// Status after a remote failure, given how the local cache fared.
    #[must_use]
    pub const fn local_fallback(cache_ok: bool) -> Self {
        if cache_ok { Self::LocalOnly } else { Self::Error }
    }

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Saved => "saved",
            Self::LocalOnly => "local_only",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token identifying one load/save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AttemptToken(u64);

/// Publishes [`SyncStatus`] while ignoring results of superseded attempts.
///
/// Starting an attempt bumps a sequence number. Finishing only publishes when
/// the attempt still holds the latest number. Both steps run under the watch
/// channel's lock, so a slow attempt can never overwrite a newer one.
#[derive(Debug)]
pub struct SyncTracker {
    latest: AtomicU64,
    status: watch::Sender<SyncStatus>,
}

impl Default for SyncTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncTracker {
    /// Tracker starting in [`SyncStatus::Loading`].
    #[must_use]
    pub fn new() -> Self {
        let (status, _) = watch::channel(SyncStatus::Loading);
        Self {
            latest: AtomicU64::new(0),
            status,
        }
    }

    /// Start an attempt: publish `Loading` and supersede every earlier attempt.
    pub fn begin(&self) -> AttemptToken {
        let mut token = AttemptToken(0);
        self.status.send_modify(|status| {
            token = AttemptToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1);
            *status = SyncStatus::Loading;
        });
        token
    }

    /// Publish the result of an attempt. Returns false if a newer attempt has
    /// started since, in which case the status is left untouched.
    pub fn finish(&self, token: AttemptToken, outcome: SyncStatus) -> bool {
        self.status.send_if_modified(|status| {
            let latest = self.latest.load(Ordering::SeqCst);
            if token.0 != latest {
                debug!(attempt = token.0, latest, %outcome, "discarding status of superseded attempt");
                return false;
            }
            *status = outcome;
            true
        })
    }

    /// Most recently published status.
    #[must_use]
    pub fn current(&self) -> SyncStatus {
        *self.status.borrow()
    }

    /// Receiver notified on every status change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }
}
