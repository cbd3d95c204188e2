use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

use crate::id::TaskId;
use crate::task::{Category, Task, UnknownCategory};

/// Completion-based view filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    /// Every task.
    #[default]
    All,
    /// Incomplete tasks only.
    Active,
    /// Completed tasks only.
    Completed,
}

impl StatusFilter {
    /// Whether a task with the given completion flag passes.
    #[must_use]
    pub const fn admits(self, completed: bool) -> bool {
        match self {
            Self::All => true,
            Self::Active => !completed,
            Self::Completed => completed,
        }
    }

    /// String form used on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for unrecognized filter tokens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterParseError {
    /// Unknown status token.
    #[error("invalid status filter '{0}' (expected all, active or completed)")]
    Status(String),
    /// Unknown category token.
    #[error(transparent)]
    Category(#[from] UnknownCategory),
}

impl FromStr for StatusFilter {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" | "done" => Ok(Self::Completed),
            _ => Err(FilterParseError::Status(s.trim().to_owned())),
        }
    }
}

/// Category-based view filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryFilter {
    /// Every category.
    #[default]
    All,
    /// A single category.
    Only(Category),
}

impl CategoryFilter {
    /// Whether a task in `category` passes.
    #[must_use]
    pub fn admits(self, category: Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == category,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(category) => category.fmt(f),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        Ok(Self::Only(s.parse()?))
    }
}

/// Combined status × category filter deciding which tasks are visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewFilter {
    /// Completion filter.
    pub status: StatusFilter,
    /// Category filter.
    pub category: CategoryFilter,
}

impl ViewFilter {
    /// Construct a filter from both halves.
    #[must_use]
    pub const fn new(status: StatusFilter, category: CategoryFilter) -> Self {
        Self { status, category }
    }

    /// Returns true when the filter admits every task.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self.status, StatusFilter::All) && matches!(self.category, CategoryFilter::All)
    }

    /// Both predicates must pass.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.status.admits(task.completed) && self.category.admits(task.category)
    }

    /// Tasks passing the filter, in list order.
    #[must_use]
    pub fn visible<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|task| self.matches(task)).collect()
    }

    /// Ids of the tasks passing the filter, in list order.
    #[must_use]
    pub fn visible_ids(&self, tasks: &[Task]) -> Vec<TaskId> {
        tasks
            .iter()
            .filter(|task| self.matches(task))
            .map(|task| task.id)
            .collect()
    }
}

/// Free-function form of [`ViewFilter::matches`].
#[must_use]
pub fn matches(task: &Task, status: StatusFilter, category: CategoryFilter) -> bool {
    ViewFilter::new(status, category).matches(task)
}
