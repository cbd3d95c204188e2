//! Task mutation API used by presentation layers.

use std::sync::Arc;

use tasklist_core::{
    Category, Placement, Reordered, Task, TaskCounts, TaskId, ViewFilter, ops, reorder,
};
use tasklist_store::{LocalCache, RemoteStore};
use tokio::sync::watch;
use tracing::debug;

use crate::coordinator::{PendingSave, PersistenceCoordinator};
use crate::sync_status::SyncStatus;

/// Interactive state: the owned task list, the view filter and the edit session.
///
/// Every mutation swaps in a freshly computed list and, when something actually
/// changed, schedules exactly one save. Mutations return immediately; the
/// returned [`PendingSave`] can be awaited to observe the save.
pub struct TaskSession<C, R> {
    coordinator: Arc<PersistenceCoordinator<C, R>>,
    tasks: Vec<Task>,
    filter: ViewFilter,
    editing: Option<TaskId>,
}

impl<C, R> TaskSession<C, R> {
    /// Empty session backed by `coordinator`. Call [`load`](Self::load) next.
    pub fn new(coordinator: Arc<PersistenceCoordinator<C, R>>) -> Self {
        Self {
            coordinator,
            tasks: Vec::new(),
            filter: ViewFilter::default(),
            editing: None,
        }
    }

    /// Full list in display order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Tasks passing the current filter.
    pub fn visible(&self) -> Vec<&Task> {
        self.filter.visible(&self.tasks)
    }

    /// Current view filter.
    pub const fn filter(&self) -> ViewFilter {
        self.filter
    }

    /// Replace the view filter. The list itself is untouched.
    pub const fn set_filter(&mut self, filter: ViewFilter) {
        self.filter = filter;
    }

    /// Active and completed totals across the full list.
    pub fn counts(&self) -> TaskCounts {
        TaskCounts::of(&self.tasks)
    }

    /// Task under edit, if any.
    pub const fn editing(&self) -> Option<TaskId> {
        self.editing
    }

    /// Start editing `id`. Returns false when no such task exists.
    pub fn begin_edit(&mut self, id: TaskId) -> bool {
        let exists = self.tasks.iter().any(|task| task.id == id);
        if exists {
            self.editing = Some(id);
        }
        exists
    }

    /// Abandon the edit session.
    pub const fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Latest sync status.
    pub fn status(&self) -> SyncStatus {
        self.coordinator.status()
    }

    /// Receiver notified on every sync status change.
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.coordinator.subscribe()
    }

    fn end_edit_of(&mut self, id: TaskId) {
        if self.editing == Some(id) {
            self.editing = None;
        }
    }
}

impl<C, R> TaskSession<C, R>
where
    C: LocalCache + 'static,
    R: RemoteStore,
{
    /// Run the load protocol and adopt its result as the current list.
    pub async fn load(&mut self) -> SyncStatus {
        self.tasks = self.coordinator.load().await;
        self.editing = None;
        self.coordinator.status()
    }

    /// Append a task. Blank text is ignored.
    pub fn add(&mut self, text: &str, category: Category) -> Option<PendingSave> {
        let id = TaskId::next_after(self.tasks.iter().map(|task| &task.id));
        let next = ops::add(&self.tasks, id, text, category);
        self.commit("add", next)
    }

    /// Flip the completion flag of `id`.
    pub fn toggle(&mut self, id: TaskId) -> Option<PendingSave> {
        let next = ops::toggle(&self.tasks, id);
        self.commit("toggle", next)
    }

    /// Replace text and category of `id` and end its edit session.
    ///
    /// Blank text cancels the edit instead.
    pub fn edit(&mut self, id: TaskId, text: &str, category: Category) -> Option<PendingSave> {
        self.end_edit_of(id);
        let next = ops::edit(&self.tasks, id, text, category);
        self.commit("edit", next)
    }

    /// Remove `id`, cancelling its edit session if active.
    pub fn delete(&mut self, id: TaskId) -> Option<PendingSave> {
        self.end_edit_of(id);
        let next = ops::delete(&self.tasks, id);
        self.commit("delete", next)
    }

    /// Remove every completed task, cancelling the edit session first if it
    /// targets one of them.
    pub fn clear_completed(&mut self) -> Option<PendingSave> {
        if let Some(id) = self.editing
            && self.tasks.iter().any(|task| task.id == id && task.completed)
        {
            self.editing = None;
        }
        let next = ops::clear_completed(&self.tasks);
        self.commit("clear_completed", next)
    }

    /// Drop `dragged` before or after `target`, positions taken from the
    /// current view.
    pub fn reorder(&mut self, dragged: TaskId, target: TaskId, placement: Placement) -> Option<PendingSave> {
        let next = match reorder(&self.tasks, &self.filter, dragged, target, placement) {
            Reordered::Moved(tasks) => Some(tasks),
            Reordered::Unchanged => None,
        };
        self.commit("reorder", next)
    }

    fn commit(&mut self, operation: &'static str, next: Option<Vec<Task>>) -> Option<PendingSave> {
        let Some(next) = next else {
            debug!(operation, "mutation left the list unchanged");
            return None;
        };
        self.tasks = next;
        debug!(operation, count = self.tasks.len(), "list replaced; scheduling save");
        Some(self.coordinator.schedule_save(self.tasks.clone()))
    }
}
