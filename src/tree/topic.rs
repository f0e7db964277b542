use crate::client::{Payload, RestClient};
use crate::config::{RegionEntry, ServiceConfig};
use crate::tree::fetch_list;
use crate::tree::procedure::Procedure;
use crate::tree::records::{ProcedureRecord, TopicRecord};
use crate::tree::region::Region;
use crate::{CrawlError, FetchError};
use serde::Serialize;
use std::fmt;

/// A licensing category, root of the procedure and region subtrees
///
/// Procedures and regions are populated independently of each other; both
/// stay `None` until their refresh pass has run for this topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topic {
    pub id: i64,
    pub name: String,
    procedures: Option<Vec<Procedure>>,
    regions: Option<Vec<Region>>,
}

impl Topic {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            procedures: None,
            regions: None,
        }
    }

    /// Requests the topic listing for the configured service
    pub async fn request_all(
        client: &RestClient,
        service: &ServiceConfig,
    ) -> Result<Vec<Topic>, FetchError> {
        tracing::info!("Downloading topics...");

        let payload: Payload = vec![("servicioId", service.service_id.to_string())];
        let records: Vec<TopicRecord> = fetch_list(client, service.topics_url(), payload).await?;

        let topics: Vec<Topic> = records
            .into_iter()
            .map(|record| Topic::new(record.id, record.name))
            .collect();
        tracing::debug!("Obtained topics: {:?}", topics);

        Ok(topics)
    }

    /// Fetched procedures in response order; empty until fetched
    pub fn procedures(&self) -> &[Procedure] {
        self.procedures.as_deref().unwrap_or(&[])
    }

    pub fn has_procedures(&self) -> bool {
        self.procedures.is_some()
    }

    /// Generated regions in configuration order; empty until generated
    pub fn regions(&self) -> &[Region] {
        self.regions.as_deref().unwrap_or(&[])
    }

    pub fn regions_mut(&mut self) -> &mut [Region] {
        self.regions.as_deref_mut().unwrap_or(&mut [])
    }

    pub fn has_regions(&self) -> bool {
        self.regions.is_some()
    }

    /// Requests this topic's procedures without touching the topic
    pub async fn request_procedures(
        &self,
        client: &RestClient,
        service: &ServiceConfig,
    ) -> Result<Vec<Procedure>, FetchError> {
        tracing::info!("Downloading procedures for topic {}...", self.name);

        let payload: Payload = vec![("topicoId", self.id.to_string())];
        let records: Vec<ProcedureRecord> =
            fetch_list(client, service.procedures_url(), payload).await?;

        let procedures: Vec<Procedure> = records.into_iter().map(Procedure::from).collect();
        tracing::debug!("Obtained procedures: {:?}", procedures);

        Ok(procedures)
    }

    /// Stores fetched procedures; a topic that already has procedures keeps them
    pub(crate) fn set_procedures(&mut self, procedures: Vec<Procedure>) {
        if self.procedures.is_none() {
            self.procedures = Some(procedures);
        }
    }

    /// Fetches and stores this topic's procedures unless already populated
    pub async fn fetch_procedures(
        &mut self,
        client: &RestClient,
        service: &ServiceConfig,
    ) -> Result<(), FetchError> {
        if self.has_procedures() {
            return Ok(());
        }

        let procedures = self.request_procedures(client, service).await?;
        self.set_procedures(procedures);
        Ok(())
    }

    /// Appends one region per configured entry, in configuration order
    ///
    /// Every call appends: calling it twice yields every region twice.
    /// Returns the regions appended by this call.
    pub fn generate_regions(&mut self, entries: &[RegionEntry]) -> &mut [Region] {
        tracing::info!("Generating regions for topic {}...", self.name);

        let regions = self.regions.get_or_insert_with(Vec::new);
        let start = regions.len();
        regions.extend(entries.iter().map(|entry| Region::new(entry, self.id)));
        tracing::debug!("Completed {} regions for topic {}", entries.len(), self.id);

        &mut regions[start..]
    }

    /// Generates regions only if this topic has none yet
    ///
    /// A second call returns `CrawlError::RegionsAlreadyGenerated` and leaves
    /// the regions untouched.
    pub fn materialize_regions(
        &mut self,
        entries: &[RegionEntry],
    ) -> Result<&mut [Region], CrawlError> {
        if self.has_regions() {
            return Err(CrawlError::RegionsAlreadyGenerated { topic_id: self.id });
        }

        Ok(self.generate_regions(entries))
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "topic {} ({})", self.id, self.name)
    }
}
