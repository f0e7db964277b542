//! Crawl run - hierarchical crawl orchestration
//!
//! A run moves through three stages:
//! - Construction, which fetches the topic list
//! - Procedure refresh, one fetch per topic
//! - Branch refresh, which generates each topic's regions and fetches one
//!   branch list per region
//!
//! The two refresh passes are independent and may run in either order. Each
//! pass fans out with bounded concurrency and commits results by index, so
//! tree order always mirrors response and configuration order.

use crate::client::RestClient;
use crate::config::Config;
use crate::crawler::fanout::fan_out;
use crate::crawler::report::{FailedUnit, RefreshPass, RefreshReport};
use crate::tree::Topic;
use crate::CrawlError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// One execution assembling the topic/procedure/region/branch tree
#[derive(Debug, Serialize)]
pub struct CrawlRun {
    id: i64,
    created_at: DateTime<Utc>,
    topics: Vec<Topic>,
    /// SHA-256 of the configuration file, when the run was built from one
    config_hash: Option<String>,
    #[serde(skip)]
    config: Arc<Config>,
    #[serde(skip)]
    client: RestClient,
}

/// Entity counts of an assembled tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub topics: usize,
    pub procedures: usize,
    pub regions: usize,
    pub branches: usize,
}

impl fmt::Display for TreeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} topics, {} procedures, {} regions, {} branches",
            self.topics, self.procedures, self.regions, self.branches
        )
    }
}

impl CrawlRun {
    /// Creates a run and fetches its topics
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlRun)` - Run with its topic list populated
    /// * `Err(CrawlError::Topics)` - The topic fetch failed; no run exists
    pub async fn create(
        id: i64,
        config: Arc<Config>,
        client: RestClient,
        config_hash: Option<String>,
    ) -> Result<Self, CrawlError> {
        tracing::info!("Creating crawl run {}", id);
        let created_at = Utc::now();

        let topics = Topic::request_all(&client, &config.service)
            .await
            .map_err(|source| CrawlError::Topics { source })?;

        tracing::info!(
            "Created crawl run {} at {} with {} topics (config hash: {})",
            id,
            created_at,
            topics.len(),
            config_hash.as_deref().unwrap_or("none")
        );

        Ok(Self {
            id,
            created_at,
            topics,
            config_hash,
            config,
            client,
        })
    }

    /// Builds the HTTP client from `config` and creates a run
    pub async fn from_config(id: i64, config: Config) -> Result<Self, CrawlError> {
        Self::from_config_with_hash(id, config, None).await
    }

    /// Like `from_config`, recording the hash of the file `config` came from
    pub async fn from_config_with_hash(
        id: i64,
        config: Config,
        config_hash: Option<String>,
    ) -> Result<Self, CrawlError> {
        let client = RestClient::new(&config.client)?;
        Self::create(id, Arc::new(config), client, config_hash).await
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn config_hash(&self) -> Option<&str> {
        self.config_hash.as_deref()
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn into_topics(self) -> Vec<Topic> {
        self.topics
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            topics: self.topics.len(),
            ..TreeStats::default()
        };

        for topic in &self.topics {
            stats.procedures += topic.procedures().len();
            stats.regions += topic.regions().len();
            stats.branches += topic
                .regions()
                .iter()
                .map(|region| region.branches().len())
                .sum::<usize>();
        }

        stats
    }

    /// Fetches procedures for every topic that has none yet
    pub async fn refresh_procedures(&mut self) -> Result<RefreshReport, CrawlError> {
        let started_at = Utc::now();
        tracing::info!("Starting procedures refresh at: {}", started_at);

        let pending: Vec<usize> = self
            .topics
            .iter()
            .enumerate()
            .filter(|(_, topic)| !topic.has_procedures())
            .map(|(index, _)| index)
            .collect();
        let attempted = pending.len();
        let skipped = self.topics.len() - attempted;

        let topics = &self.topics;
        let client = &self.client;
        let service = &self.config.service;
        let outcome = fan_out(
            pending,
            self.config.crawler.max_concurrent_fetches,
            self.config.crawler.failure_policy,
            move |index: usize| topics[index].request_procedures(client, service),
        )
        .await
        .map_err(|(index, source)| CrawlError::Procedures {
            topic_id: self.topics[index].id,
            source,
        })?;

        let failures: Vec<FailedUnit> = outcome
            .failed
            .into_iter()
            .map(|(index, error)| FailedUnit {
                topic_id: self.topics[index].id,
                region_id: None,
                error,
            })
            .collect();

        for (index, procedures) in outcome.fetched {
            self.topics[index].set_procedures(procedures);
        }

        let report = self.finish(RefreshPass::Procedures, started_at, attempted, skipped, failures);
        Ok(report)
    }

    /// Generates regions for every topic that has none yet, then fetches
    /// branches for every region that has none yet
    pub async fn refresh_branches(&mut self) -> Result<RefreshReport, CrawlError> {
        let started_at = Utc::now();
        tracing::info!("Starting branches refresh at: {}", started_at);

        for topic in &mut self.topics {
            if !topic.has_regions() {
                topic.materialize_regions(&self.config.service.regions)?;
            }
        }

        let mut pending: Vec<(usize, usize)> = Vec::new();
        let mut skipped = 0;
        for (topic_index, topic) in self.topics.iter().enumerate() {
            for (region_index, region) in topic.regions().iter().enumerate() {
                if region.has_branches() {
                    skipped += 1;
                } else {
                    pending.push((topic_index, region_index));
                }
            }
        }
        let attempted = pending.len();

        let topics = &self.topics;
        let client = &self.client;
        let service = &self.config.service;
        let outcome = fan_out(
            pending,
            self.config.crawler.max_concurrent_fetches,
            self.config.crawler.failure_policy,
            move |(topic_index, region_index): (usize, usize)| {
                topics[topic_index].regions()[region_index].request_branches(client, service)
            },
        )
        .await
        .map_err(|((topic_index, region_index), source)| {
            let topic = &self.topics[topic_index];
            CrawlError::Branches {
                topic_id: topic.id,
                region_id: topic.regions()[region_index].id,
                source,
            }
        })?;

        let failures: Vec<FailedUnit> = outcome
            .failed
            .into_iter()
            .map(|((topic_index, region_index), error)| {
                let topic = &self.topics[topic_index];
                FailedUnit {
                    topic_id: topic.id,
                    region_id: Some(topic.regions()[region_index].id),
                    error,
                }
            })
            .collect();

        for ((topic_index, region_index), branches) in outcome.fetched {
            self.topics[topic_index].regions_mut()[region_index].set_branches(branches);
        }

        let report = self.finish(RefreshPass::Branches, started_at, attempted, skipped, failures);
        Ok(report)
    }

    fn finish(
        &self,
        pass: RefreshPass,
        started_at: DateTime<Utc>,
        attempted: usize,
        skipped: usize,
        failures: Vec<FailedUnit>,
    ) -> RefreshReport {
        for failure in &failures {
            tracing::warn!("Skipped {} for {}", pass, failure);
        }

        let finished_at = Utc::now();
        tracing::info!("Completed {} refresh at: {}", pass, finished_at);
        tracing::debug!(
            "{} refresh: {} fetched, {} failed, {} already populated",
            pass,
            attempted - failures.len(),
            failures.len(),
            skipped
        );

        RefreshReport {
            pass,
            started_at,
            finished_at,
            attempted,
            skipped,
            failures,
        }
    }
}
