use crate::id::TaskId;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Closed set of task categories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Personal errands (default).
    #[default]
    Personal,
    /// Work items.
    Work,
    /// Household chores.
    Home,
    /// Things to buy.
    Shopping,
    /// Health and fitness.
    Health,
    /// Anything else.
    Other,
}

impl Category {
    /// Every category in display order.
    pub const ALL: [Self; 6] = [
        Self::Personal,
        Self::Work,
        Self::Home,
        Self::Shopping,
        Self::Health,
        Self::Other,
    ];

    /// Wire representation shared by the cache and the remote table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "Personal",
            Self::Work => "Work",
            Self::Home => "Home",
            Self::Shopping => "Shopping",
            Self::Health => "Health",
            Self::Other => "Other",
        }
    }

    /// Exact match against the wire representation.
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.as_str() == value)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when user input does not name a known category.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown category '{0}' (expected one of: Personal, Work, Home, Shopping, Health, Other)")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Case-insensitive lookup for user-facing inputs.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownCategory(trimmed.to_owned()))
    }
}

/// Single to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Identifier (creation timestamp).
    pub id: TaskId,
    /// Task text.
    pub text: String,
    /// Completion flag.
    pub completed: bool,
    /// Category bucket.
    pub category: Category,
}

impl Task {
    /// Create an incomplete task.
    #[must_use]
    pub fn new(id: TaskId, text: impl Into<String>, category: Category) -> Self {
        Self {
            id,
            text: text.into(),
            completed: false,
            category,
        }
    }

    /// Builder-style completion flag setter.
    #[must_use]
    pub const fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }
}
