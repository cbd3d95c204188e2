//! Domain types, view filtering and reordering for tasklist.

/// View filters.
pub mod filter;
/// Identifier types.
pub mod id;
/// Payload sanitizing.
pub mod normalize;
/// Pure list mutations.
pub mod ops;
pub mod reorder;
/// Task records and categories.
pub mod task;

pub use filter::{CategoryFilter, FilterParseError, StatusFilter, ViewFilter, matches};
pub use id::TaskId;
pub use normalize::{normalize_tasks, parse_tasks, serialize_tasks};
pub use ops::TaskCounts;
pub use reorder::{Placement, Reordered, reorder};
pub use task::{Category, Task, UnknownCategory};
