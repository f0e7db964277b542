use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

/// A scheduling slot at a branch
///
/// No crawl path produces appointments yet; branches only expose the slot
/// for callers that source them elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Appointment {
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
}

impl Appointment {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            id: None,
            date,
            time: None,
        }
    }

    pub fn with_time(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}
