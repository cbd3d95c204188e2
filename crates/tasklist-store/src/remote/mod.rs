//! Remote task table abstraction and adapters.

mod memory;
mod rest;

use std::cmp::Ordering;
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tasklist_core::{Task, TaskId};
use time::OffsetDateTime;

use crate::error::RemoteError;

pub use memory::{MemoryRemote, RemoteCall};
pub use rest::{RestConfig, RestRemote};

/// Row shape of the remote task table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRow {
    /// Task identifier (primary key).
    pub id: i64,
    /// Task text.
    pub text: String,
    /// Completion flag.
    pub completed: bool,
    /// Category wire name.
    pub category: String,
    /// Ordinal position within the list.
    pub sort_order: Option<i64>,
    /// Time of the write that produced the row.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl RemoteRow {
    /// Row for `task` stored at list position `position`.
    #[must_use]
    pub fn from_task(task: &Task, position: usize, updated_at: OffsetDateTime) -> Self {
        Self {
            id: task.id.get(),
            text: task.text.clone(),
            completed: task.completed,
            category: task.category.as_str().to_owned(),
            sort_order: Some(i64::try_from(position).unwrap_or(i64::MAX)),
            updated_at,
        }
    }

    /// Rows for a whole list, positions taken from list order.
    #[must_use]
    pub fn from_tasks(tasks: &[Task], updated_at: OffsetDateTime) -> Vec<Self> {
        tasks
            .iter()
            .enumerate()
            .map(|(position, task)| Self::from_task(task, position, updated_at))
            .collect()
    }

    /// Read order: `sort_order` ascending with missing positions last, then `id`.
    #[must_use]
    pub fn read_order(a: &Self, b: &Self) -> Ordering {
        match (a.sort_order, b.sort_order) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| a.id.cmp(&b.id))
    }
}

/// Asynchronous remote table of task rows.
///
/// Returned futures are `Send` so saves can run on spawned tasks.
pub trait RemoteStore: Send + Sync + 'static {
    /// Fetch every row ordered by [`RemoteRow::read_order`], as raw JSON.
    ///
    /// The payload is left undecoded so callers can sanitize it.
    ///
    /// # Errors
    /// Returns an error when the table cannot be read.
    fn fetch_all(&self) -> impl Future<Output = Result<Value, RemoteError>> + Send;

    /// Insert or update rows keyed by id.
    ///
    /// # Errors
    /// Returns an error when the write is rejected.
    fn upsert(&self, rows: &[RemoteRow]) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Delete every row whose id is not in `keep`. `keep` is never empty.
    ///
    /// # Errors
    /// Returns an error when the delete is rejected.
    fn delete_except(&self, keep: &[TaskId]) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Delete every row.
    ///
    /// # Errors
    /// Returns an error when the delete is rejected.
    fn delete_all(&self) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

impl<R: RemoteStore> RemoteStore for Arc<R> {
    fn fetch_all(&self) -> impl Future<Output = Result<Value, RemoteError>> + Send {
        (**self).fetch_all()
    }

    fn upsert(&self, rows: &[RemoteRow]) -> impl Future<Output = Result<(), RemoteError>> + Send {
        (**self).upsert(rows)
    }

    fn delete_except(&self, keep: &[TaskId]) -> impl Future<Output = Result<(), RemoteError>> + Send {
        (**self).delete_except(keep)
    }

    fn delete_all(&self) -> impl Future<Output = Result<(), RemoteError>> + Send {
        (**self).delete_all()
    }
}
