use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tasklist_core::TaskId;

use super::{RemoteRow, RemoteStore};
use crate::error::RemoteError;

/// Operation observed by a [`MemoryRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    /// `fetch_all`.
    Fetch,
    /// `upsert` with the given row ids.
    Upsert(Vec<i64>),
    /// `delete_except` with the kept ids.
    DeleteExcept(Vec<i64>),
    /// `delete_all`.
    DeleteAll,
}

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i64, RemoteRow>,
    calls: Vec<RemoteCall>,
    fail_reads: bool,
    fail_writes: bool,
}

/// In-process remote table with failure injection.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    table: Mutex<Table>,
}

impl MemoryRemote {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table seeded with `rows`.
    #[must_use]
    pub fn with_rows(rows: Vec<RemoteRow>) -> Self {
        let remote = Self::default();
        remote.lock().rows = rows.into_iter().map(|row| (row.id, row)).collect();
        remote
    }

    /// Make subsequent reads fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// Make subsequent writes and deletes fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Rows in read order.
    #[must_use]
    pub fn rows(&self) -> Vec<RemoteRow> {
        let mut rows: Vec<RemoteRow> = self.lock().rows.values().cloned().collect();
        rows.sort_by(RemoteRow::read_order);
        rows
    }

    /// Every call received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self, call: RemoteCall) -> Result<MutexGuard<'_, Table>, RemoteError> {
        let mut table = self.lock();
        table.calls.push(call);
        if table.fail_writes {
            return Err(RemoteError::Unavailable("memory remote rejects writes".into()));
        }
        Ok(table)
    }
}

impl RemoteStore for MemoryRemote {
    async fn fetch_all(&self) -> Result<Value, RemoteError> {
        {
            let mut table = self.lock();
            table.calls.push(RemoteCall::Fetch);
            if table.fail_reads {
                return Err(RemoteError::Unavailable("memory remote rejects reads".into()));
            }
        }
        Ok(serde_json::to_value(self.rows())?)
    }

    async fn upsert(&self, rows: &[RemoteRow]) -> Result<(), RemoteError> {
        let ids = rows.iter().map(|row| row.id).collect();
        let mut table = self.write_guard(RemoteCall::Upsert(ids))?;
        for row in rows {
            table.rows.insert(row.id, row.clone());
        }
        Ok(())
    }

    async fn delete_except(&self, keep: &[TaskId]) -> Result<(), RemoteError> {
        let ids: Vec<i64> = keep.iter().map(|id| id.get()).collect();
        let mut table = self.write_guard(RemoteCall::DeleteExcept(ids.clone()))?;
        let keep: HashSet<i64> = ids.into_iter().collect();
        table.rows.retain(|id, _| keep.contains(id));
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), RemoteError> {
        let mut table = self.write_guard(RemoteCall::DeleteAll)?;
        table.rows.clear();
        Ok(())
    }
}
