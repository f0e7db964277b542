use crate::tree::appointment::Appointment;
use crate::tree::records::BranchRecord;
use serde::Serialize;
use std::fmt;

/// A physical service location handling one topic inside one region
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub id: i64,
    pub name: String,
    pub address: String,

    /// Id of the region this branch was fetched for
    pub region_id: i64,

    /// Id of the topic this branch was fetched for
    pub topic_id: i64,

    /// Province number the service reported, kept for diagnostics only
    pub reported_region_id: Option<i64>,

    appointments: Vec<Appointment>,
}

impl Branch {
    /// Builds a branch from a wire record, taking ownership from the fetch scope
    pub fn from_record(record: BranchRecord, region_id: i64, topic_id: i64) -> Self {
        if let Some(reported) = record.province {
            if reported != region_id {
                tracing::debug!(
                    "Branch {} reported province {} while fetched for region {}",
                    record.id,
                    reported,
                    region_id
                );
            }
        }

        Self {
            id: record.id,
            name: record.name,
            address: record.address,
            region_id,
            topic_id,
            reported_region_id: record.province,
            appointments: Vec::new(),
        }
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn add_appointment(&mut self, appointment: Appointment) {
        self.appointments.push(appointment);
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "branch {} ({})", self.id, self.name)
    }
}
