use async_trait::async_trait;
use axum::{Router, http::StatusCode, routing::get};
use chrono::{NaiveDate, NaiveDateTime};
use log_service::{
    LogFetcher, LogServiceError, MalformedLinePolicy, ReqwestTextSource, RetrievalError,
    TextSource,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const VALID_CHAT_LOGS: &str = include_str!("fixtures/valid_chat_logs.txt");
const TEST_CHANNEL_NAME: &str = "mizkif";

/// Serves a canned body and remembers every request it saw
struct StubSource {
    response: Result<String, RetrievalError>,
    requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl StubSource {
    fn ok(body: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(body.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn failing(err: RetrievalError) -> Arc<Self> {
        Arc::new(Self {
            response: Err(err),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl TextSource for StubSource {
    async fn fetch_text(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, RetrievalError> {
        let headers = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.requests.lock().unwrap().push((url.to_string(), headers));
        self.response.clone()
    }
}

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2022, 5, 19)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

#[tokio::test]
async fn test_get_log_data_for_date_range() {
    let source = StubSource::ok(VALID_CHAT_LOGS);
    let fetcher = LogFetcher::new(source.clone(), "https://logs.example.com");

    let start = at(0, 1, 0);
    let end = at(23, 30, 50);
    let batch = fetcher
        .fetch_log_records(TEST_CHANNEL_NAME, start, end)
        .await
        .unwrap();

    assert_eq!(batch.len(), 16);
    assert_eq!(batch.skipped_lines, 0);
    assert!(
        batch
            .records
            .iter()
            .all(|r| start <= r.timestamp && r.timestamp <= end)
    );
    assert!(
        batch
            .records
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp)
    );
    assert_eq!(batch.records[0].username.as_deref(), Some("nightbot"));
    assert_eq!(batch.records[15].message, "Thanks for watching!");
}

#[tokio::test]
async fn sends_one_plain_text_request_per_fetch() {
    let source = StubSource::ok(VALID_CHAT_LOGS);
    let fetcher = LogFetcher::new(source.clone(), "https://logs.example.com");

    fetcher
        .fetch_log_records(TEST_CHANNEL_NAME, at(0, 0, 0), at(1, 0, 0))
        .await
        .unwrap();

    let requests = source.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (url, headers) = &requests[0];
    assert!(url.starts_with("https://logs.example.com/channel/mizkif?"));
    assert!(headers.contains(&("Accept".to_string(), "text/plain".to_string())));
}

#[tokio::test]
async fn window_without_lines_is_empty_not_error() {
    let fetcher = LogFetcher::new(StubSource::ok(VALID_CHAT_LOGS), "https://logs.example.com");

    let batch = fetcher
        .fetch_log_records(TEST_CHANNEL_NAME, at(23, 45, 0), at(23, 59, 0))
        .await
        .unwrap();
    assert!(batch.is_empty());
}

#[tokio::test]
async fn retrieval_failure_is_reported() {
    let source = StubSource::failing(RetrievalError::Status {
        url: "https://logs.example.com/channel/mizkif".to_string(),
        status: 503,
    });
    let fetcher = LogFetcher::new(source, "https://logs.example.com");

    let err = fetcher
        .fetch_log_records(TEST_CHANNEL_NAME, at(0, 0, 0), at(1, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LogServiceError::Retrieval(RetrievalError::Status { status: 503, .. })
    ));
}

#[tokio::test]
async fn invalid_arguments_never_reach_the_network() {
    let source = StubSource::ok(VALID_CHAT_LOGS);
    let fetcher = LogFetcher::new(source.clone(), "https://logs.example.com");

    let err = fetcher
        .fetch_log_records("   ", at(0, 0, 0), at(1, 0, 0))
        .await
        .unwrap_err();
    assert_eq!(err, LogServiceError::InvalidChannel(String::new()));

    let err = fetcher
        .fetch_log_records(TEST_CHANNEL_NAME, at(2, 0, 0), at(1, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, LogServiceError::InvalidWindow(_)));
    assert!(err.is_invalid_request());

    assert_eq!(source.request_count(), 0);
}

#[tokio::test]
async fn channel_is_trimmed_before_building_the_url() {
    let source = StubSource::ok(VALID_CHAT_LOGS);
    let fetcher = LogFetcher::new(source.clone(), "https://logs.example.com");

    fetcher
        .fetch_log_records(" mizkif ", at(0, 0, 0), at(1, 0, 0))
        .await
        .unwrap();

    let requests = source.requests.lock().unwrap();
    assert_eq!(
        requests[0].0,
        "https://logs.example.com/channel/mizkif?from=2022-05-19T00%3A00%3A00Z&to=2022-05-19T01%3A00%3A00Z"
    );
}

#[tokio::test]
async fn channel_cannot_escape_its_path_segment() {
    let source = StubSource::ok(VALID_CHAT_LOGS);
    let fetcher = LogFetcher::new(source.clone(), "https://logs.example.com");

    for channel in ["../x", "a?b", "a#b", "a/b", "mizkif&to=2030-01-01T00:00:00Z"] {
        let err = fetcher
            .fetch_log_records(channel, at(0, 0, 0), at(1, 0, 0))
            .await
            .unwrap_err();
        assert_eq!(err, LogServiceError::InvalidChannel(channel.to_string()));
        assert!(err.is_invalid_request());
    }
    assert_eq!(source.request_count(), 0);
}

#[tokio::test]
async fn malformed_lines_follow_configured_policy() {
    let body = format!("{VALID_CHAT_LOGS}this line is not a log record\n");

    let skipping = LogFetcher::new(StubSource::ok(&body), "https://logs.example.com");
    let batch = skipping
        .fetch_log_records(TEST_CHANNEL_NAME, at(0, 1, 0), at(23, 30, 50))
        .await
        .unwrap();
    assert_eq!(batch.len(), 16);
    assert_eq!(batch.skipped_lines, 1);

    let strict = LogFetcher::new(StubSource::ok(&body), "https://logs.example.com")
        .with_policy(MalformedLinePolicy::FailFast);
    let err = strict
        .fetch_log_records(TEST_CHANNEL_NAME, at(0, 1, 0), at(23, 30, 50))
        .await
        .unwrap_err();
    match err {
        LogServiceError::Parse(parse) => {
            assert_eq!(parse.line_number, 20);
            assert_eq!(parse.line, "this line is not a log record");
        }
        other => panic!("expected parse error, got {other:?}"),
    }
}

async fn spawn_archive() -> String {
    let app = Router::new()
        .route("/channel/mizkif", get(|| async { VALID_CHAT_LOGS }))
        .route(
            "/channel/banned",
            get(|| async { (StatusCode::NOT_FOUND, "channel not logged") }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn reqwest_source_fetches_from_archive() {
    let base_url = spawn_archive().await;
    let source = Arc::new(ReqwestTextSource::new(Duration::from_secs(5)).unwrap());
    let fetcher = LogFetcher::new(source, base_url);

    let batch = fetcher
        .fetch_log_records(TEST_CHANNEL_NAME, at(0, 1, 0), at(23, 30, 50))
        .await
        .unwrap();
    assert_eq!(batch.len(), 16);
}

#[tokio::test]
async fn reqwest_source_maps_error_status() {
    let base_url = spawn_archive().await;
    let source = Arc::new(ReqwestTextSource::new(Duration::from_secs(5)).unwrap());
    let fetcher = LogFetcher::new(source, base_url);

    let err = fetcher
        .fetch_log_records("banned", at(0, 0, 0), at(1, 0, 0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LogServiceError::Retrieval(RetrievalError::Status { status: 404, .. })
    ));
}
