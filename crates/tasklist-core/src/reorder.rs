//! View-relative reordering.
//!
//! Drag gestures are expressed against the *visible* (filtered) list, while the
//! persisted order is the *full* list. [`reorder`] moves the dragged task within
//! the visible subsequence and writes the result back into the slots the visible
//! tasks already occupy, so hidden tasks never move.

use crate::filter::ViewFilter;
use crate::id::TaskId;
use crate::task::Task;

/// Which side of the drop target the dragged task lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Insert in front of the target.
    Before,
    /// Insert behind the target.
    After,
}

impl Placement {
    /// Map the "place after" flag produced by hit-testing the drop target.
    #[must_use]
    pub const fn from_place_after(place_after: bool) -> Self {
        if place_after { Self::After } else { Self::Before }
    }

    const fn offset(self) -> usize {
        match self {
            Self::Before => 0,
            Self::After => 1,
        }
    }
}

/// Outcome of a reorder request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reordered {
    /// Nothing moved; callers should skip the state update.
    Unchanged,
    /// Full list with the new order.
    Moved(Vec<Task>),
}

impl Reordered {
    /// Returns true when the request moved a task.
    #[must_use]
    pub const fn is_moved(&self) -> bool {
        matches!(self, Self::Moved(_))
    }

    /// The list to commit: the reordered list, or a copy of `original`.
    #[must_use]
    pub fn apply(self, original: &[Task]) -> Vec<Task> {
        match self {
            Self::Unchanged => original.to_vec(),
            Self::Moved(tasks) => tasks,
        }
    }
}

/// Move `dragged` next to `target` within the tasks visible under `filter`.
///
/// Returns [`Reordered::Unchanged`] when either id is not visible, or when the
/// move would leave the task where it already is (including dropping a task
/// onto itself).
#[must_use]
pub fn reorder(
    tasks: &[Task],
    filter: &ViewFilter,
    dragged: TaskId,
    target: TaskId,
    placement: Placement,
) -> Reordered {
    // Full-list positions of the visible tasks, in display order.
    let slots: Vec<usize> = tasks
        .iter()
        .enumerate()
        .filter(|(_, task)| filter.matches(task))
        .map(|(index, _)| index)
        .collect();
    let position_of = |id: TaskId| slots.iter().position(|&slot| tasks[slot].id == id);

    let (Some(from), Some(target_index)) = (position_of(dragged), position_of(target)) else {
        return Reordered::Unchanged;
    };

    let mut to = target_index + placement.offset();
    if from < to {
        to -= 1;
    }
    if to == from {
        return Reordered::Unchanged;
    }

    let mut order = slots.clone();
    let moved = order.remove(from);
    order.insert(to, moved);

    let mut rebuilt = tasks.to_vec();
    for (&slot, &source) in slots.iter().zip(&order) {
        rebuilt[slot] = tasks[source].clone();
    }

    Reordered::Moved(rebuilt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{CategoryFilter, StatusFilter};
    use crate::task::Category;

    fn task(id: i64, category: Category) -> Task {
        Task::new(TaskId(id), format!("task {id}"), category)
    }

    fn ids(tasks: &[Task]) -> Vec<i64> {
        tasks.iter().map(|task| task.id.get()).collect()
    }

    fn moved(result: Reordered) -> Vec<Task> {
        match result {
            Reordered::Moved(tasks) => tasks,
            Reordered::Unchanged => panic!("expected the list to change"),
        }
    }

    fn abcd() -> Vec<Task> {
        vec![
            task(1, Category::Home),
            task(2, Category::Work),
            task(3, Category::Home),
            task(4, Category::Work),
        ]
    }

    #[test]
    fn drag_within_filtered_view_keeps_hidden_tasks_in_place() {
        let tasks = abcd();
        let filter = ViewFilter::new(StatusFilter::All, CategoryFilter::Only(Category::Home));

        let result = moved(reorder(&tasks, &filter, TaskId(1), TaskId(3), Placement::After));

        assert_eq!(ids(&result), vec![3, 2, 1, 4]);
        assert_eq!(filter.visible_ids(&result), vec![TaskId(3), TaskId(1)]);
    }

    #[test]
    fn drag_before_target_moving_up() {
        let tasks = abcd();
        let result = moved(reorder(
            &tasks,
            &ViewFilter::default(),
            TaskId(4),
            TaskId(2),
            Placement::Before,
        ));
        assert_eq!(ids(&result), vec![1, 4, 2, 3]);
    }

    #[test]
    fn drag_after_target_moving_down() {
        let tasks = abcd();
        let result = moved(reorder(
            &tasks,
            &ViewFilter::default(),
            TaskId(1),
            TaskId(3),
            Placement::After,
        ));
        assert_eq!(ids(&result), vec![2, 3, 1, 4]);
    }

    #[test]
    fn drag_to_the_end() {
        let tasks = abcd();
        let result = moved(reorder(
            &tasks,
            &ViewFilter::default(),
            TaskId(2),
            TaskId(4),
            Placement::After,
        ));
        assert_eq!(ids(&result), vec![1, 3, 4, 2]);
    }

    #[test]
    fn dropping_onto_self_is_noop() {
        let tasks = abcd();
        for placement in [Placement::Before, Placement::After] {
            assert_eq!(
                reorder(&tasks, &ViewFilter::default(), TaskId(2), TaskId(2), placement),
                Reordered::Unchanged
            );
        }
    }

    #[test]
    fn dropping_next_to_current_position_is_noop() {
        let tasks = abcd();
        let filter = ViewFilter::default();
        assert_eq!(
            reorder(&tasks, &filter, TaskId(2), TaskId(3), Placement::Before),
            Reordered::Unchanged
        );
        assert_eq!(
            reorder(&tasks, &filter, TaskId(3), TaskId(2), Placement::After),
            Reordered::Unchanged
        );
    }

    #[test]
    fn hidden_or_unknown_ids_are_noop() {
        let tasks = abcd();
        let filter = ViewFilter::new(StatusFilter::All, CategoryFilter::Only(Category::Home));
        assert_eq!(
            reorder(&tasks, &filter, TaskId(2), TaskId(1), Placement::Before),
            Reordered::Unchanged
        );
        assert_eq!(
            reorder(&tasks, &filter, TaskId(1), TaskId(4), Placement::After),
            Reordered::Unchanged
        );
        assert_eq!(
            reorder(&tasks, &filter, TaskId(99), TaskId(1), Placement::After),
            Reordered::Unchanged
        );
    }

    #[test]
    fn duplicate_ids_are_moved_by_position_not_lost() {
        let tasks = vec![
            task(1, Category::Home),
            Task::new(TaskId(1), "twin", Category::Home),
            task(2, Category::Home),
        ];
        let result = moved(reorder(
            &tasks,
            &ViewFilter::default(),
            TaskId(2),
            TaskId(1),
            Placement::Before,
        ));

        let texts: Vec<&str> = result.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["task 2", "task 1", "twin"]);
    }

    #[test]
    fn unchanged_apply_returns_equal_list() {
        let tasks = abcd();
        assert_eq!(Reordered::Unchanged.apply(&tasks), tasks);
    }

    #[test]
    fn reorder_is_a_permutation_preserving_hidden_order() {
        let mut tasks = Vec::new();
        for id in 1..=9 {
            let category = if id % 3 == 0 { Category::Work } else { Category::Home };
            tasks.push(task(id, category).with_completed(id % 2 == 0));
        }
        let filters = [
            ViewFilter::default(),
            ViewFilter::new(StatusFilter::Active, CategoryFilter::All),
            ViewFilter::new(StatusFilter::Completed, CategoryFilter::Only(Category::Home)),
            ViewFilter::new(StatusFilter::All, CategoryFilter::Only(Category::Work)),
        ];

        for filter in filters {
            for dragged in 1..=9 {
                for target in 1..=9 {
                    for placement in [Placement::Before, Placement::After] {
                        let result = reorder(&tasks, &filter, TaskId(dragged), TaskId(target), placement)
                            .apply(&tasks);

                        let mut before = ids(&tasks);
                        let mut after = ids(&result);
                        before.sort_unstable();
                        after.sort_unstable();
                        assert_eq!(before, after, "ids must be a permutation");

                        let hidden = |list: &[Task]| -> Vec<TaskId> {
                            list.iter().filter(|t| !filter.matches(t)).map(|t| t.id).collect()
                        };
                        assert_eq!(hidden(&tasks), hidden(&result), "hidden order must be preserved");

                        for (old, new) in tasks.iter().zip(&result) {
                            assert_eq!(filter.matches(old), filter.matches(new), "visible slots must not shift");
                        }
                    }
                }
            }
        }
    }
}
