use crate::client::{Payload, RestClient};
use crate::config::{RegionEntry, ServiceConfig};
use crate::tree::branch::Branch;
use crate::tree::fetch_list;
use crate::tree::records::BranchRecord;
use crate::FetchError;
use serde::Serialize;
use std::fmt;

/// A statically configured geographic subdivision under one topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Region {
    pub id: i64,
    pub name: String,

    /// Id of the topic this region was generated for
    pub topic_id: i64,

    /// `None` until the branch fetch for this region has succeeded
    branches: Option<Vec<Branch>>,
}

impl Region {
    pub fn new(entry: &RegionEntry, topic_id: i64) -> Self {
        Self {
            id: entry.id,
            name: entry.name.clone(),
            topic_id,
            branches: None,
        }
    }

    /// Fetched branches in response order; empty until fetched
    pub fn branches(&self) -> &[Branch] {
        self.branches.as_deref().unwrap_or(&[])
    }

    pub fn has_branches(&self) -> bool {
        self.branches.is_some()
    }

    /// Requests this region's branches without touching the region
    pub async fn request_branches(
        &self,
        client: &RestClient,
        service: &ServiceConfig,
    ) -> Result<Vec<Branch>, FetchError> {
        tracing::info!(
            "Downloading branches for topic {} in region {}...",
            self.topic_id,
            self.name
        );

        let payload: Payload = vec![
            ("topicoId", self.topic_id.to_string()),
            ("provinciaId", self.id.to_string()),
        ];
        let records: Vec<BranchRecord> =
            fetch_list(client, service.branches_url(), payload).await?;

        let branches: Vec<Branch> = records
            .into_iter()
            .map(|record| Branch::from_record(record, self.id, self.topic_id))
            .collect();
        tracing::debug!("Obtained branches: {:?}", branches);

        Ok(branches)
    }

    /// Stores fetched branches; a region that already has branches keeps them
    pub(crate) fn set_branches(&mut self, branches: Vec<Branch>) {
        if self.branches.is_none() {
            self.branches = Some(branches);
        }
    }

    /// Fetches and stores this region's branches unless already populated
    pub async fn fetch_branches(
        &mut self,
        client: &RestClient,
        service: &ServiceConfig,
    ) -> Result<(), FetchError> {
        if self.has_branches() {
            return Ok(());
        }

        let branches = self.request_branches(client, service).await?;
        self.set_branches(branches);
        Ok(())
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region {} ({})", self.id, self.name)
    }
}
