use crate::error::{LogServiceError, RetrievalError};
use crate::parser::{MalformedLinePolicy, parse_log_text};
use crate::source::TextSource;
use chrono::{NaiveDateTime, SecondsFormat};
use domain::{LogBatch, TimeWindow};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_LOG_ARCHIVE_URL: &str = "https://logs.ivr.fi";

/// Twitch logins are ASCII letters, digits and underscores
pub fn is_valid_channel(channel: &str) -> bool {
    !channel.is_empty()
        && channel
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Retrieves chat-log text for a channel and window from the log archive
pub struct LogFetcher {
    source: Arc<dyn TextSource>,
    base_url: String,
    policy: MalformedLinePolicy,
}

impl LogFetcher {
    pub fn new(source: Arc<dyn TextSource>, base_url: impl Into<String>) -> Self {
        Self {
            source,
            base_url: base_url.into(),
            policy: MalformedLinePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MalformedLinePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> MalformedLinePolicy {
        self.policy
    }

    /// `{base_url}/channel/{channel}?from=..&to=..`
    ///
    /// The channel is appended as a single percent-encoded path segment.
    pub fn channel_url(&self, channel: &str, window: &TimeWindow) -> Result<Url, RetrievalError> {
        let invalid = |reason: String| RetrievalError::InvalidUrl {
            url: self.base_url.clone(),
            reason,
        };

        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .push("channel")
            .push(channel);

        let from = window.start().and_utc().to_rfc3339_opts(SecondsFormat::Secs, true);
        let to = window.end().and_utc().to_rfc3339_opts(SecondsFormat::Secs, true);
        url.query_pairs_mut()
            .clear()
            .append_pair("from", &from)
            .append_pair("to", &to);
        Ok(url)
    }

    /// Fetch the records of `channel` whose timestamps fall in `[start, end]`.
    ///
    /// Issues exactly one request. An empty window yields an empty batch.
    pub async fn fetch_log_records(
        &self,
        channel: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<LogBatch, LogServiceError> {
        let window = TimeWindow::new(start, end)?;
        self.fetch_window(channel, &window).await
    }

    pub async fn fetch_window(
        &self,
        channel: &str,
        window: &TimeWindow,
    ) -> Result<LogBatch, LogServiceError> {
        let channel = channel.trim();
        if !is_valid_channel(channel) {
            return Err(LogServiceError::InvalidChannel(channel.to_string()));
        }

        let url = self.channel_url(channel, window)?;
        debug!("Fetching chat logs from {}", url);
        let body = self
            .source
            .fetch_text(url.as_str(), &[("Accept", "text/plain")])
            .await?;

        let batch = parse_log_text(&body, window, self.policy)?;
        info!(
            channel,
            start = %window.start(),
            end = %window.end(),
            records = batch.len(),
            skipped = batch.skipped_lines,
            "Fetched chat logs"
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    struct Unreachable;

    #[async_trait::async_trait]
    impl TextSource for Unreachable {
        async fn fetch_text(&self, url: &str, _: &[(&str, &str)]) -> Result<String, RetrievalError> {
            panic!("unexpected request to {url}");
        }
    }

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 5, 19)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn channel_url_carries_window_as_query() {
        let fetcher = LogFetcher::new(Arc::new(Unreachable), "https://logs.example.com/");
        let window = TimeWindow::new(at(0), at(23)).unwrap();
        let url = fetcher.channel_url("mizkif", &window).unwrap();

        assert_eq!(url.path(), "/channel/mizkif");
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            query,
            vec![
                ("from".to_string(), "2022-05-19T00:00:00Z".to_string()),
                ("to".to_string(), "2022-05-19T23:00:00Z".to_string()),
            ]
        );
    }

    #[test]
    fn channel_url_encodes_channel_as_one_segment() {
        let fetcher = LogFetcher::new(Arc::new(Unreachable), "https://logs.example.com/api");
        let window = TimeWindow::new(at(0), at(1)).unwrap();

        for (channel, path) in [
            ("../x", "/api/channel/..%2Fx"),
            ("a?b", "/api/channel/a%3Fb"),
            ("a#b", "/api/channel/a%23b"),
            ("a/b", "/api/channel/a%2Fb"),
        ] {
            let url = fetcher.channel_url(channel, &window).unwrap();
            assert_eq!(url.path(), path);
            assert_eq!(url.fragment(), None);
            let keys: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
            assert_eq!(keys, vec!["from", "to"]);
        }
    }

    #[test]
    fn channel_names_are_twitch_logins() {
        assert!(is_valid_channel("mizkif"));
        assert!(is_valid_channel("Some_Streamer_42"));
        for bad in ["", "../x", "a?b", "a#b", "a/b", "two words", "caf\u{e9}"] {
            assert!(!is_valid_channel(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn channel_url_rejects_bad_base() {
        let fetcher = LogFetcher::new(Arc::new(Unreachable), "not a url");
        let window = TimeWindow::new(at(0), at(1)).unwrap();
        assert!(matches!(
            fetcher.channel_url("mizkif", &window),
            Err(RetrievalError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn default_policy_is_skip() {
        let fetcher = LogFetcher::new(Arc::new(Unreachable), DEFAULT_LOG_ARCHIVE_URL);
        assert_eq!(fetcher.policy(), MalformedLinePolicy::Skip);
    }
}
