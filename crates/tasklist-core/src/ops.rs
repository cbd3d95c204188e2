//! Pure list mutations. Each function returns a replacement list, or `None`
//! when the request leaves the list untouched.

use crate::id::TaskId;
use crate::task::{Category, Task};

/// Append a new incomplete task. Blank text is rejected.
#[must_use]
pub fn add(tasks: &[Task], id: TaskId, text: &str, category: Category) -> Option<Vec<Task>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut next = Vec::with_capacity(tasks.len() + 1);
    next.extend_from_slice(tasks);
    next.push(Task::new(id, trimmed, category));
    Some(next)
}

/// Flip the completion flag of the matching task.
#[must_use]
pub fn toggle(tasks: &[Task], id: TaskId) -> Option<Vec<Task>> {
    replace_matching(tasks, id, |task| Task {
        completed: !task.completed,
        ..task.clone()
    })
}

/// Replace text and category of the matching task. Blank text is rejected.
#[must_use]
pub fn edit(tasks: &[Task], id: TaskId, text: &str, category: Category) -> Option<Vec<Task>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    replace_matching(tasks, id, |task| Task {
        text: trimmed.to_owned(),
        category,
        ..task.clone()
    })
}

/// Remove the matching task.
#[must_use]
pub fn delete(tasks: &[Task], id: TaskId) -> Option<Vec<Task>> {
    tasks.iter().any(|task| task.id == id).then(|| {
        tasks
            .iter()
            .filter(|task| task.id != id)
            .cloned()
            .collect()
    })
}

/// Remove every completed task.
#[must_use]
pub fn clear_completed(tasks: &[Task]) -> Option<Vec<Task>> {
    tasks.iter().any(|task| task.completed).then(|| {
        tasks
            .iter()
            .filter(|task| !task.completed)
            .cloned()
            .collect()
    })
}

/// Active and completed totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    /// Incomplete tasks.
    pub active: usize,
    /// Completed tasks.
    pub completed: usize,
}

impl TaskCounts {
    /// Count a list.
    #[must_use]
    pub fn of(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|task| task.completed).count();
        Self {
            active: tasks.len() - completed,
            completed,
        }
    }
}

fn replace_matching<F>(tasks: &[Task], id: TaskId, update: F) -> Option<Vec<Task>>
where
    F: FnOnce(&Task) -> Task,
{
    let index = tasks.iter().position(|task| task.id == id)?;
    let mut next = tasks.to_vec();
    next[index] = update(&tasks[index]);
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Task> {
        vec![
            Task::new(TaskId(1), "a", Category::Personal),
            Task::new(TaskId(2), "b", Category::Personal).with_completed(true),
        ]
    }

    #[test]
    fn add_appends_trimmed_task() {
        let tasks = vec![Task::new(TaskId(1), "a", Category::Home)];
        let next = add(&tasks, TaskId(2), "  b ", Category::Work)
            .unwrap_or_else(|| panic!("add must produce a list"));
        assert_eq!(
            next,
            vec![
                Task::new(TaskId(1), "a", Category::Home),
                Task::new(TaskId(2), "b", Category::Work),
            ]
        );
        assert_eq!(tasks.len(), 1, "input must not be mutated");
    }

    #[test]
    fn add_rejects_blank_text() {
        assert!(add(&sample(), TaskId(3), "   ", Category::Work).is_none());
    }

    #[test]
    fn toggle_flips_only_the_matching_task() {
        let next = toggle(&sample(), TaskId(1)).unwrap_or_else(|| panic!("toggle"));
        assert!(next[0].completed);
        assert!(next[1].completed);
        assert!(toggle(&sample(), TaskId(9)).is_none());
    }

    #[test]
    fn edit_replaces_text_and_category() {
        let next = edit(&sample(), TaskId(2), " renamed ", Category::Health)
            .unwrap_or_else(|| panic!("edit"));
        assert_eq!(next[1].text, "renamed");
        assert_eq!(next[1].category, Category::Health);
        assert!(next[1].completed);
        assert!(edit(&sample(), TaskId(2), "\t", Category::Health).is_none());
    }

    #[test]
    fn delete_and_clear_completed() {
        let next = delete(&sample(), TaskId(1)).unwrap_or_else(|| panic!("delete"));
        assert_eq!(next.len(), 1);
        assert!(delete(&sample(), TaskId(5)).is_none());

        let cleared = clear_completed(&sample()).unwrap_or_else(|| panic!("clear"));
        assert_eq!(cleared, vec![Task::new(TaskId(1), "a", Category::Personal)]);
        assert!(clear_completed(&cleared).is_none());
    }

    #[test]
    fn counts_split_active_and_completed() {
        assert_eq!(
            TaskCounts::of(&sample()),
            TaskCounts {
                active: 1,
                completed: 1
            }
        );
    }
}
