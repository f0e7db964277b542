//! Integration tests for the crawl run
//!
//! These tests use wiremock to stand in for the licensing service and drive
//! construction and both refresh passes end-to-end.

use licensing_crawler::config::{
    ClientConfig, Config, CrawlerConfig, FailurePolicy, RegionEntry, ServiceConfig,
};
use licensing_crawler::crawler::{crawl, CrawlRun, RefreshPass};
use licensing_crawler::tree::Topic;
use licensing_crawler::{CrawlError, FetchError, RestClient};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the given base URL
fn create_test_config(base_url: &str, regions: Vec<(i64, &str)>) -> Config {
    Config {
        service: ServiceConfig {
            service_id: 1,
            base_url: base_url.to_string(),
            topic_path: "/topics".to_string(),
            procedure_path: "/procedures".to_string(),
            branch_path: "/branches".to_string(),
            regions: regions
                .into_iter()
                .map(|(id, name)| RegionEntry::from((id, name.to_string())))
                .collect(),
        },
        client: ClientConfig {
            timeout_secs: 5,
            connect_timeout_secs: 1,
            ..ClientConfig::default()
        },
        crawler: CrawlerConfig::default(),
    }
}

async fn mount_json(server: &MockServer, endpoint: &str, form: &str, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(endpoint))
        .and(body_string_contains(form))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_single_topic(server: &MockServer) {
    mount_json(
        server,
        "/topics",
        "servicioId=1",
        json!([{"pTopicoID": 1, "pNombre": "Licenses"}]),
    )
    .await;
}

#[tokio::test]
async fn test_construction_fetches_topics_in_order() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/topics",
        "servicioId=1",
        json!([
            {"pTopicoID": 3, "pNombre": "Renewal"},
            {"pTopicoID": 1, "pNombre": "Licenses"},
            {"pTopicoID": 2, "pNombre": "Duplicates"}
        ]),
    )
    .await;

    let run = CrawlRun::from_config(1, create_test_config(&server.uri(), vec![(10, "North")]))
        .await
        .expect("Failed to create run");

    let topics: Vec<(i64, &str)> = run
        .topics()
        .iter()
        .map(|t| (t.id, t.name.as_str()))
        .collect();
    assert_eq!(
        topics,
        vec![(3, "Renewal"), (1, "Licenses"), (2, "Duplicates")]
    );
}

#[tokio::test]
async fn test_single_topic_starts_unpopulated() {
    let server = MockServer::start().await;
    mount_single_topic(&server).await;

    let run = CrawlRun::from_config(1, create_test_config(&server.uri(), vec![(10, "North")]))
        .await
        .expect("Failed to create run");

    assert_eq!(run.id(), 1);
    assert_eq!(run.topics().len(), 1);
    let topic = &run.topics()[0];
    assert_eq!(topic.id, 1);
    assert_eq!(topic.name, "Licenses");
    assert!(topic.procedures().is_empty());
    assert!(topic.regions().is_empty());
}

#[tokio::test]
async fn test_procedure_refresh_leaves_regions_untouched() {
    let server = MockServer::start().await;
    mount_single_topic(&server).await;
    mount_json(
        &server,
        "/procedures",
        "topicoId=1",
        json!([{"TramiteId": 5, "Nombre": "Renew"}]),
    )
    .await;

    let mut run =
        CrawlRun::from_config(1, create_test_config(&server.uri(), vec![(10, "North")]))
            .await
            .expect("Failed to create run");
    let report = run.refresh_procedures().await.expect("Refresh failed");

    assert_eq!(report.pass, RefreshPass::Procedures);
    assert_eq!(report.attempted, 1);
    assert!(report.is_complete());

    let topic = &run.topics()[0];
    assert_eq!(topic.procedures().len(), 1);
    assert_eq!(topic.procedures()[0].id, 5);
    assert_eq!(topic.procedures()[0].name, "Renew");
    assert!(!topic.has_regions());
}

#[tokio::test]
async fn test_branch_refresh_generates_regions_and_fetches_branches() {
    let server = MockServer::start().await;
    mount_single_topic(&server).await;
    mount_json(
        &server,
        "/branches",
        "provinciaId=10",
        json!([{
            "pSucursalID": 100,
            "pNombre": "Main",
            "pDireccion": "1 St",
            "numeroProvincia": 10
        }]),
    )
    .await;
    mount_json(&server, "/branches", "provinciaId=20", json!([])).await;

    let config = create_test_config(&server.uri(), vec![(10, "North"), (20, "South")]);
    let mut run = CrawlRun::from_config(1, config)
        .await
        .expect("Failed to create run");
    let report = run.refresh_branches().await.expect("Refresh failed");

    assert_eq!(report.attempted, 2);
    assert!(report.is_complete());

    let topic = &run.topics()[0];
    assert_eq!(topic.regions().len(), 2);
    assert!(!topic.has_procedures());

    let north = &topic.regions()[0];
    assert_eq!((north.id, north.name.as_str()), (10, "North"));
    assert_eq!(north.branches().len(), 1);
    let branch = &north.branches()[0];
    assert_eq!(branch.id, 100);
    assert_eq!(branch.address, "1 St");
    assert_eq!(branch.region_id, 10);
    assert_eq!(branch.topic_id, 1);

    let south = &topic.regions()[1];
    assert_eq!(south.id, 20);
    assert!(south.has_branches());
    assert!(south.branches().is_empty());
}

#[tokio::test]
async fn test_branch_ownership_ignores_reported_province() {
    let server = MockServer::start().await;
    mount_single_topic(&server).await;
    mount_json(
        &server,
        "/branches",
        "provinciaId=10",
        json!([{
            "pSucursalID": 100,
            "pNombre": "Main",
            "pDireccion": "1 St",
            "numeroProvincia": 99
        }]),
    )
    .await;

    let mut run =
        CrawlRun::from_config(1, create_test_config(&server.uri(), vec![(10, "North")]))
            .await
            .expect("Failed to create run");
    run.refresh_branches().await.expect("Refresh failed");

    let branch = &run.topics()[0].regions()[0].branches()[0];
    assert_eq!(branch.region_id, 10);
    assert_eq!(branch.topic_id, 1);
    assert_eq!(branch.reported_region_id, Some(99));
}

#[tokio::test]
async fn test_unreachable_topic_endpoint_fails_construction() {
    let config = create_test_config("http://127.0.0.1:1", vec![(10, "North")]);

    let result = CrawlRun::from_config(1, config).await;

    assert!(matches!(
        result,
        Err(CrawlError::Topics {
            source: FetchError::NoResponse { .. }
        })
    ));
}

#[tokio::test]
async fn test_malformed_topic_body_fails_construction() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/topics"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let result = CrawlRun::from_config(1, create_test_config(&server.uri(), vec![(10, "North")])).await;

    assert!(matches!(
        result,
        Err(CrawlError::Topics {
            source: FetchError::Decode { .. }
        })
    ));
}

#[tokio::test]
async fn test_order_is_kept_when_responses_arrive_out_of_order() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/topics",
        "servicioId=1",
        json!([
            {"pTopicoID": 1, "pNombre": "Slow"},
            {"pTopicoID": 2, "pNombre": "Fast"}
        ]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/procedures"))
        .and(body_string_contains("topicoId=1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"TramiteId": 11, "Nombre": "Slow procedure"}]))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    mount_json(
        &server,
        "/procedures",
        "topicoId=2",
        json!([
            {"TramiteId": 21, "Nombre": "First"},
            {"TramiteId": 22, "Nombre": "Second"}
        ]),
    )
    .await;

    let mut run =
        CrawlRun::from_config(1, create_test_config(&server.uri(), vec![(10, "North")]))
            .await
            .expect("Failed to create run");
    run.refresh_procedures().await.expect("Refresh failed");

    let topics = run.topics();
    assert_eq!(topics[0].id, 1);
    assert_eq!(topics[0].procedures()[0].id, 11);
    let fast_ids: Vec<i64> = topics[1].procedures().iter().map(|p| p.id).collect();
    assert_eq!(fast_ids, vec![21, 22]);
}

/// Two topics where the second topic's procedure endpoint is broken
async fn mount_partially_broken_procedures(server: &MockServer) {
    mount_json(
        server,
        "/topics",
        "servicioId=1",
        json!([
            {"pTopicoID": 1, "pNombre": "Licenses"},
            {"pTopicoID": 2, "pNombre": "Permits"}
        ]),
    )
    .await;
    mount_json(
        server,
        "/procedures",
        "topicoId=1",
        json!([{"TramiteId": 5, "Nombre": "Renew"}]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/procedures"))
        .and(body_string_contains("topicoId=2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_abort_policy_commits_nothing_on_failure() {
    let server = MockServer::start().await;
    mount_partially_broken_procedures(&server).await;

    let mut run =
        CrawlRun::from_config(1, create_test_config(&server.uri(), vec![(10, "North")]))
            .await
            .expect("Failed to create run");
    let result = run.refresh_procedures().await;

    assert!(matches!(
        result,
        Err(CrawlError::Procedures {
            topic_id: 2,
            source: FetchError::Status { status: 500, .. }
        })
    ));
    assert!(run.topics().iter().all(|t| !t.has_procedures()));
}

#[tokio::test]
async fn test_isolate_policy_keeps_successful_units() {
    let server = MockServer::start().await;
    mount_partially_broken_procedures(&server).await;

    let mut config = create_test_config(&server.uri(), vec![(10, "North")]);
    config.crawler.failure_policy = FailurePolicy::Isolate;
    let mut run = CrawlRun::from_config(1, config)
        .await
        .expect("Failed to create run");
    let report = run.refresh_procedures().await.expect("Refresh failed");

    assert_eq!(report.attempted, 2);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].topic_id, 2);

    assert_eq!(run.topics()[0].procedures().len(), 1);
    assert!(!run.topics()[1].has_procedures());
}

#[tokio::test]
async fn test_isolated_failures_are_retried_by_next_refresh() {
    let server = MockServer::start().await;
    mount_single_topic(&server).await;
    Mock::given(method("POST"))
        .and(path("/procedures"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_json(
        &server,
        "/procedures",
        "topicoId=1",
        json!([{"TramiteId": 5, "Nombre": "Renew"}]),
    )
    .await;

    let mut config = create_test_config(&server.uri(), vec![(10, "North")]);
    config.crawler.failure_policy = FailurePolicy::Isolate;
    let mut run = CrawlRun::from_config(1, config)
        .await
        .expect("Failed to create run");

    let first = run.refresh_procedures().await.expect("Refresh failed");
    assert_eq!(first.failures.len(), 1);
    assert!(!run.topics()[0].has_procedures());

    let second = run.refresh_procedures().await.expect("Refresh failed");
    assert!(second.is_complete());
    assert_eq!(run.topics()[0].procedures().len(), 1);
}

#[tokio::test]
async fn test_second_refresh_does_not_refetch_or_duplicate() {
    let server = MockServer::start().await;
    mount_single_topic(&server).await;
    Mock::given(method("POST"))
        .and(path("/branches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"pSucursalID": 100, "pNombre": "Main", "pDireccion": "1 St", "numeroProvincia": 10}
        ])))
        .expect(2)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), vec![(10, "North"), (20, "South")]);
    let mut run = CrawlRun::from_config(1, config)
        .await
        .expect("Failed to create run");

    run.refresh_branches().await.expect("Refresh failed");
    let second = run.refresh_branches().await.expect("Refresh failed");

    assert_eq!(second.attempted, 0);
    assert_eq!(second.skipped, 2);
    assert_eq!(run.topics()[0].regions().len(), 2);
    assert_eq!(run.stats().branches, 2);
}

#[tokio::test]
async fn test_full_crawl() {
    let server = MockServer::start().await;
    mount_json(
        &server,
        "/topics",
        "servicioId=1",
        json!([
            {"pTopicoID": 1, "pNombre": "Licenses"},
            {"pTopicoID": 2, "pNombre": "Permits"}
        ]),
    )
    .await;
    mount_json(
        &server,
        "/procedures",
        "topicoId=",
        json!([{"TramiteId": 5, "Nombre": "Renew"}]),
    )
    .await;
    mount_json(
        &server,
        "/branches",
        "provinciaId=",
        json!([
            {"pSucursalID": 100, "pNombre": "Main", "pDireccion": "1 St", "numeroProvincia": 10},
            {"pSucursalID": 101, "pNombre": "Annex", "pDireccion": "2 St", "numeroProvincia": 10}
        ]),
    )
    .await;

    let run = crawl(7, create_test_config(&server.uri(), vec![(10, "North"), (20, "South")]))
        .await
        .expect("Crawl failed");

    let stats = run.stats();
    assert_eq!(stats.topics, 2);
    assert_eq!(stats.procedures, 2);
    assert_eq!(stats.regions, 4);
    assert_eq!(stats.branches, 8);

    let tree = serde_json::to_value(&run).expect("Failed to serialize run");
    assert_eq!(tree["id"], 7);
    assert_eq!(tree["topics"][1]["regions"][1]["branches"][0]["topic_id"], 2);
    assert_eq!(tree["topics"][1]["regions"][1]["branches"][0]["region_id"], 20);
}

#[tokio::test]
async fn test_entity_fetches_populate_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/procedures"))
        .and(body_string_contains("topicoId=4"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"TramiteId": 5, "Nombre": "Renew"}])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/branches"))
        .and(body_string_contains("topicoId=4&provinciaId=10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"pSucursalID": 100, "pNombre": "Main", "pDireccion": "1 St", "numeroProvincia": 10}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri(), vec![(10, "North")]);
    let client = RestClient::new(&config.client).expect("Failed to build client");
    let mut topic = Topic::new(4, "Permits");

    topic
        .fetch_procedures(&client, &config.service)
        .await
        .expect("Procedure fetch failed");
    topic
        .fetch_procedures(&client, &config.service)
        .await
        .expect("Procedure fetch failed");
    assert_eq!(topic.procedures().len(), 1);

    let regions = topic
        .materialize_regions(&config.service.regions)
        .expect("Regions already generated");
    let region = &mut regions[0];
    region
        .fetch_branches(&client, &config.service)
        .await
        .expect("Branch fetch failed");
    region
        .fetch_branches(&client, &config.service)
        .await
        .expect("Branch fetch failed");
    assert_eq!(region.branches().len(), 1);
    assert_eq!(region.branches()[0].topic_id, 4);
}

/// One topic with regions 10 and 20; region 10 answers, region 20 does not
async fn mount_partially_broken_branches(server: &MockServer, region_20: ResponseTemplate) {
    mount_single_topic(server).await;
    mount_json(
        server,
        "/branches",
        "provinciaId=10",
        json!([{"pSucursalID": 100, "pNombre": "Main", "pDireccion": "1 St", "numeroProvincia": 10}]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/branches"))
        .and(body_string_contains("provinciaId=20"))
        .respond_with(region_20)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_abort_policy_withholds_all_branches_on_failure() {
    let server = MockServer::start().await;
    mount_partially_broken_branches(&server, ResponseTemplate::new(404)).await;

    let config = create_test_config(&server.uri(), vec![(10, "North"), (20, "South")]);
    let mut run = CrawlRun::from_config(1, config)
        .await
        .expect("Failed to create run");
    let result = run.refresh_branches().await;

    assert!(matches!(
        result,
        Err(CrawlError::Branches {
            topic_id: 1,
            region_id: 20,
            source: FetchError::Status { status: 404, .. }
        })
    ));

    let topic = &run.topics()[0];
    assert_eq!(topic.regions().len(), 2);
    assert!(topic.regions().iter().all(|r| !r.has_branches()));
    assert_eq!(run.stats().branches, 0);
}

#[tokio::test]
async fn test_isolate_policy_keeps_answered_regions_on_timeout() {
    let server = MockServer::start().await;
    mount_partially_broken_branches(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(json!([]))
            .set_delay(Duration::from_secs(3)),
    )
    .await;

    let mut config = create_test_config(&server.uri(), vec![(10, "North"), (20, "South")]);
    config.client.timeout_secs = 1;
    config.crawler.failure_policy = FailurePolicy::Isolate;
    let mut run = CrawlRun::from_config(1, config)
        .await
        .expect("Failed to create run");
    let report = run.refresh_branches().await.expect("Refresh failed");

    assert_eq!(report.pass, RefreshPass::Branches);
    assert_eq!(report.attempted, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].topic_id, 1);
    assert_eq!(report.failures[0].region_id, Some(20));
    assert!(matches!(
        report.failures[0].error,
        FetchError::NoResponse { .. }
    ));

    let regions = run.topics()[0].regions();
    assert_eq!(regions[0].branches().len(), 1);
    assert_eq!(regions[0].branches()[0].id, 100);
    assert!(!regions[1].has_branches());
}

#[tokio::test]
async fn test_config_hash_is_recorded_on_run() {
    let server = MockServer::start().await;
    mount_single_topic(&server).await;

    let config = create_test_config(&server.uri(), vec![(10, "North")]);
    let run = CrawlRun::from_config_with_hash(1, config, Some("abc123".to_string()))
        .await
        .expect("Failed to create run");
    assert_eq!(run.config_hash(), Some("abc123"));

    let tree = serde_json::to_value(&run).expect("Failed to serialize run");
    assert_eq!(tree["config_hash"], "abc123");

    let plain = CrawlRun::from_config(1, create_test_config(&server.uri(), vec![(10, "North")]))
        .await
        .expect("Failed to create run");
    assert_eq!(plain.config_hash(), None);
}
