//! Refresh pass outcome types
//!
//! A report lists what a pass attempted and which units failed under the
//! isolate policy. Under the abort policy a failed pass yields an error
//! instead of a report.

use crate::FetchError;
use chrono::{DateTime, Utc};
use std::fmt;

/// Which refresh pass produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPass {
    Procedures,
    Branches,
}

impl fmt::Display for RefreshPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Procedures => f.write_str("procedures"),
            Self::Branches => f.write_str("branches"),
        }
    }
}

/// A unit of work whose fetch failed
#[derive(Debug)]
pub struct FailedUnit {
    pub topic_id: i64,
    /// Set for branch fetches only
    pub region_id: Option<i64>,
    pub error: FetchError,
}

impl fmt::Display for FailedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.region_id {
            Some(region_id) => write!(
                f,
                "topic {} region {}: {}",
                self.topic_id, region_id, self.error
            ),
            None => write!(f, "topic {}: {}", self.topic_id, self.error),
        }
    }
}

/// Summary of one refresh pass
#[derive(Debug)]
pub struct RefreshReport {
    pub pass: RefreshPass,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Units fetched during this pass
    pub attempted: usize,

    /// Units left alone because they were already populated
    pub skipped: usize,

    /// Units whose fetch failed, in tree order
    pub failures: Vec<FailedUnit>,
}

impl RefreshReport {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failures.len()
    }

    /// Returns true if every attempted unit was populated
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
