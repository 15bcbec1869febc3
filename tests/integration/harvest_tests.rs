//! End-to-end harvest scenarios against a mock OSDI API

use osdi_harvest::config::{ApiConfig, Config, CrawlerConfig, OutputConfig};
use osdi_harvest::crawler::run_harvest;
use osdi_harvest::{HarvestError, OutputRecord};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FORM_ID: &str = "form-1";
const TOKEN: &str = "secret-token";
const ROOT_PATH: &str = "/forms/form-1/submissions/";

/// Creates a test configuration pointing at the mock server, writing into `dir`
fn create_test_config(base_url: &str, dir: &TempDir) -> Config {
    Config {
        api: ApiConfig {
            base_url: base_url.to_string(),
            token: TOKEN.to_string(),
            form_id: FORM_ID.to_string(),
            request_timeout_secs: 5,
            connect_timeout_secs: 5,
        },
        crawler: CrawlerConfig {
            page_workers: 5,
            detail_workers: 5,
        },
        output: OutputConfig {
            data_path: dir.path().join("data.json").display().to_string(),
            debug_log_path: dir.path().join("debug.log").display().to_string(),
        },
    }
}

fn submission(person_url: Option<&str>, created: &str) -> Value {
    let mut sub = json!({
        "created_date": created,
        "identifiers": [format!("action_network:{}", created)]
    });
    if let Some(person_url) = person_url {
        sub["_links"] = json!({ "osdi:person": { "href": person_url } });
    }
    sub
}

fn page(submissions: Vec<Value>, next: Option<String>) -> Value {
    let mut body = json!({
        "_embedded": { "osdi:submissions": submissions },
        "_links": { "self": { "href": "ignored" } }
    });
    if let Some(next) = next {
        body["_links"]["next"] = json!({ "href": next });
    }
    body
}

fn person(zip: &str, city: &str, leader: &str, chapter: &str) -> Value {
    json!({
        "given_name": "Test",
        "postal_addresses": [{ "postal_code": zip, "locality": city, "primary": true }],
        "custom_fields": { "ChapterLeaderName": leader, "ChapterName": chapter }
    })
}

async fn mount_json(server: &MockServer, at: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(at))
        .and(header("OSDI-API-Token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

fn read_log(dir: &TempDir) -> String {
    std::fs::read_to_string(dir.path().join("debug.log")).expect("Failed to read debug log")
}

fn read_dataset(dir: &TempDir) -> Vec<OutputRecord> {
    let content =
        std::fs::read_to_string(dir.path().join("data.json")).expect("Failed to read dataset");
    serde_json::from_str(&content).expect("Dataset is not valid JSON")
}

fn by_timestamp(records: &[OutputRecord]) -> HashMap<String, OutputRecord> {
    records
        .iter()
        .map(|r| (r.timestamp_est.clone(), r.clone()))
        .collect()
}

#[tokio::test]
async fn test_latest_submission_per_person_is_enriched() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let person_a = format!("{}/people/a", base);
    let person_b = format!("{}/people/b", base);

    mount_json(
        &server,
        ROOT_PATH,
        page(
            vec![
                submission(Some(&person_a), "2024-05-01T10:00:00Z"),
                submission(Some(&person_b), "2024-05-01T10:05:00Z"),
            ],
            Some(format!("{}/next/2", base)),
        ),
    )
    .await;
    mount_json(
        &server,
        "/next/2",
        page(vec![submission(Some(&person_a), "2024-05-01T10:10:00Z")], None),
    )
    .await;
    mount_json(
        &server,
        "/people/a",
        person("02139", "Cambridge", "Robin Doe", "Boston Area"),
    )
    .await;
    mount_json(
        &server,
        "/people/b",
        person("10001", "New York", "Sam Roe", "NYC"),
    )
    .await;

    let config = create_test_config(&base, &dir);
    let report = run_harvest(config).await.expect("Harvest failed");

    assert_eq!(report.records.len(), 2);
    assert_eq!(report.statistics.pages_fetched, 2);
    assert_eq!(report.statistics.records_seen, 3);
    assert_eq!(report.statistics.entities, 2);
    assert_eq!(report.statistics.details_fetched, 2);

    let written = read_dataset(&dir);
    assert_eq!(written.len(), 2);

    let rows = by_timestamp(&written);
    let a = &rows["2024-05-01T10:10:00Z"];
    assert_eq!(a.zip_code, "02139");
    assert_eq!(a.city, "Cambridge");
    assert_eq!(a.chapter_leader_name, "Robin Doe");
    assert_eq!(a.chapter_name, "Boston Area");

    let b = &rows["2024-05-01T10:05:00Z"];
    assert_eq!(b.zip_code, "10001");
    assert_eq!(b.chapter_name, "NYC");

    assert!(!rows.contains_key("2024-05-01T10:00:00Z"));

    let log = read_log(&dir);
    assert_eq!(log.lines().filter(|l| l.starts_with("Fetched page data: ")).count(), 2);
    assert_eq!(
        log.lines()
            .filter(|l| l.starts_with("Fetched person details: "))
            .count(),
        2
    );
    assert!(!log.contains("Error"));
}

#[tokio::test]
async fn test_output_field_names() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let person_a = format!("{}/people/a", base);

    mount_json(
        &server,
        ROOT_PATH,
        page(vec![submission(Some(&person_a), "2024-05-01T10:00:00Z")], None),
    )
    .await;
    mount_json(&server, "/people/a", person("02139", "Cambridge", "Robin Doe", "Boston Area")).await;

    run_harvest(create_test_config(&base, &dir))
        .await
        .expect("Harvest failed");

    let raw: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("data.json")).unwrap())
            .unwrap();
    assert_eq!(
        raw,
        json!([{
            "Zip code": "02139",
            "City": "Cambridge",
            "ChapterLeaderName": "Robin Doe",
            "ChapterName": "Boston Area",
            "Timestamp (EST)": "2024-05-01T10:00:00Z"
        }])
    );
}

#[tokio::test]
async fn test_failed_page_is_logged_and_skipped() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let person_a = format!("{}/people/a", base);
    let failing = format!("{}/next/2", base);

    mount_json(
        &server,
        ROOT_PATH,
        page(
            vec![submission(Some(&person_a), "2024-05-01T10:00:00Z")],
            Some(failing.clone()),
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/next/2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_json(&server, "/people/a", person("02139", "Cambridge", "Robin Doe", "Boston Area")).await;

    let report = run_harvest(create_test_config(&base, &dir))
        .await
        .expect("A failed page must not abort the run");

    assert_eq!(report.statistics.pages_fetched, 1);
    assert_eq!(report.statistics.pages_failed, 1);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].zip_code, "02139");

    let log = read_log(&dir);
    let errors: Vec<_> = log.lines().filter(|l| l.starts_with("Error")).collect();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with(&format!("Error fetching page: {} - ", failing)));
    assert!(errors[0].contains("500"));
}

#[tokio::test]
async fn test_failed_page_loses_its_descendants() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_json(
        &server,
        ROOT_PATH,
        page(
            vec![submission(None, "2024-05-01T10:00:00Z")],
            Some(format!("{}/next/2", base)),
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/next/2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    // Only reachable through the failed page
    Mock::given(method("GET"))
        .and(path("/next/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![], None)))
        .expect(0)
        .mount(&server)
        .await;

    let report = run_harvest(create_test_config(&base, &dir))
        .await
        .expect("Harvest failed");

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.statistics.pages_failed, 1);
}

#[tokio::test]
async fn test_malformed_page_body_is_recovered() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path(ROOT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let report = run_harvest(create_test_config(&base, &dir))
        .await
        .expect("A malformed page must not abort the run");

    assert!(report.records.is_empty());
    assert_eq!(report.statistics.pages_failed, 1);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("data.json")).unwrap(),
        "[]"
    );
    assert!(read_log(&dir).contains("Malformed JSON body"));
}

#[tokio::test]
async fn test_null_entity_skips_detail_fetch() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_json(
        &server,
        ROOT_PATH,
        page(vec![submission(None, "2024-05-01T10:00:00Z")], None),
    )
    .await;

    let report = run_harvest(create_test_config(&base, &dir))
        .await
        .expect("Harvest failed");

    assert_eq!(
        report.records,
        vec![OutputRecord {
            zip_code: "N/A".to_string(),
            city: "N/A".to_string(),
            chapter_leader_name: "N/A".to_string(),
            chapter_name: "N/A".to_string(),
            timestamp_est: "2024-05-01T10:00:00Z".to_string(),
        }]
    );
    assert_eq!(report.statistics.details_skipped, 1);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), ROOT_PATH);
}

#[tokio::test]
async fn test_detail_failure_keeps_record() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let person_a = format!("{}/people/a", base);
    let person_b = format!("{}/people/b", base);

    mount_json(
        &server,
        ROOT_PATH,
        page(
            vec![
                submission(Some(&person_a), "2024-05-01T10:00:00Z"),
                submission(Some(&person_b), "2024-05-01T10:05:00Z"),
            ],
            None,
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/people/a"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/people/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{ truncated"))
        .expect(1)
        .mount(&server)
        .await;

    let report = run_harvest(create_test_config(&base, &dir))
        .await
        .expect("Detail failures must not abort the run");

    assert_eq!(report.records.len(), 2);
    assert_eq!(report.statistics.details_failed, 2);
    for record in &report.records {
        assert_eq!(record.zip_code, "N/A");
        assert_eq!(record.city, "N/A");
        assert_eq!(record.chapter_leader_name, "N/A");
        assert_eq!(record.chapter_name, "N/A");
        assert_ne!(record.timestamp_est, "N/A");
    }

    let log = read_log(&dir);
    assert!(log.contains(&format!("Error fetching person details for: {} - ", person_a)));
    assert!(log.contains(&format!("Error fetching person details for: {} - ", person_b)));
}

#[tokio::test]
async fn test_slow_detail_times_out() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let person_a = format!("{}/people/a", base);

    mount_json(
        &server,
        ROOT_PATH,
        page(vec![submission(Some(&person_a), "2024-05-01T10:00:00Z")], None),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/people/a"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(person("02139", "Cambridge", "Robin Doe", "Boston Area"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = create_test_config(&base, &dir);
    config.api.request_timeout_secs = 1;

    let report = run_harvest(config).await.expect("Harvest failed");

    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].zip_code, "N/A");
    assert_eq!(report.statistics.details_failed, 1);
    assert!(read_log(&dir).contains("Request timeout"));
}

#[tokio::test]
async fn test_long_chain_with_repeat_submitters() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let pages = 12;

    // Page i holds submissions from people (3i + k) % 10, stamped minute i, second k
    let mut newest: HashMap<usize, String> = HashMap::new();
    for i in 0..pages {
        let mut subs = Vec::new();
        for k in 0..3 {
            let who = (3 * i + k) % 10;
            let created = format!("2024-05-01T00:{:02}:{:02}Z", i, k);
            subs.push(submission(Some(&format!("{}/people/{}", base, who)), &created));
            newest.insert(who, created);
        }

        let at = if i == 0 {
            ROOT_PATH.to_string()
        } else {
            format!("/next/{}", i)
        };
        let next = (i + 1 < pages).then(|| format!("{}/next/{}", base, i + 1));
        mount_json(&server, &at, page(subs, next)).await;
    }

    Mock::given(method("GET"))
        .and(path_regex(r"^/people/\d+$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(person("02139", "Cambridge", "Robin Doe", "Boston Area")),
        )
        .expect(10)
        .mount(&server)
        .await;

    let report = run_harvest(create_test_config(&base, &dir))
        .await
        .expect("Harvest failed");

    assert_eq!(report.statistics.pages_fetched, pages as u64);
    assert_eq!(report.statistics.records_seen, 3 * pages as u64);
    assert_eq!(report.records.len(), 10);

    let mut got: Vec<_> = report.records.iter().map(|r| r.timestamp_est.clone()).collect();
    let mut expected: Vec<_> = newest.into_values().collect();
    got.sort();
    expected.sort();
    assert_eq!(got, expected);
}

#[tokio::test]
async fn test_unwritable_output_aborts_run() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_json(
        &server,
        ROOT_PATH,
        page(vec![submission(None, "2024-05-01T10:00:00Z")], None),
    )
    .await;

    let mut config = create_test_config(&base, &dir);
    let data_path = dir.path().join("missing-dir").join("data.json");
    config.output.data_path = data_path.display().to_string();

    let result = run_harvest(config).await;

    assert!(matches!(result, Err(HarvestError::Write { .. })));
    assert!(!data_path.exists());
}

#[tokio::test]
async fn test_missing_credentials_fail_before_any_request() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let mut config = create_test_config(&server.uri(), &dir);
    config.api.token = String::new();

    let result = run_harvest(config).await;

    assert!(matches!(result, Err(HarvestError::Config(_))));
    assert!(server.received_requests().await.unwrap().is_empty());
    assert!(!dir.path().join("data.json").exists());
}
