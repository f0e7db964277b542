use crate::tree::records::ProcedureRecord;
use serde::Serialize;
use std::fmt;

/// An administrative action available under a topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Procedure {
    pub id: i64,
    pub name: String,
}

impl Procedure {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl From<ProcedureRecord> for Procedure {
    fn from(record: ProcedureRecord) -> Self {
        Self::new(record.id, record.name)
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "procedure {} ({})", self.id, self.name)
    }
}
