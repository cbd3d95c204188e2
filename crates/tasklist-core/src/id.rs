use serde::{Deserialize, Serialize};
use std::{fmt, num::ParseIntError, str::FromStr};
use time::OffsetDateTime;

/// Identifier of a task (creation time in Unix milliseconds).
#[derive(
    Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl TaskId {
    /// Identifier derived from the current wall clock.
    #[must_use]
    pub fn now() -> Self {
        Self::from_timestamp(OffsetDateTime::now_utc())
    }

    /// Identifier derived from an arbitrary timestamp.
    #[must_use]
    pub fn from_timestamp(ts: OffsetDateTime) -> Self {
        let millis = ts.unix_timestamp_nanos() / 1_000_000;
        Self(i64::try_from(millis).unwrap_or(i64::MAX))
    }

    /// Fresh identifier that sorts after every id in `existing`.
    ///
    /// Two tasks created within the same millisecond would otherwise collide.
    #[must_use]
    pub fn next_after<'a, I>(existing: I) -> Self
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let now = Self::now();
        existing
            .into_iter()
            .max()
            .map_or(now, |max| now.max(Self(max.0.saturating_add(1))))
    }

    /// Raw integer value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TaskId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl From<i64> for TaskId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}
