use crate::error::RetrievalError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Capability to fetch a plain-text document over the network
#[async_trait]
pub trait TextSource: Send + Sync {
    async fn fetch_text(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, RetrievalError>;
}

/// [`TextSource`] backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestTextSource {
    http_client: Client,
}

impl ReqwestTextSource {
    pub fn new(timeout: Duration) -> Result<Self, RetrievalError> {
        let http_client = Client::builder()
            .user_agent(concat!("twitch-chat-analyzer/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| RetrievalError::Transport {
                url: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl TextSource for ReqwestTextSource {
    async fn fetch_text(&self, url: &str, headers: &[(&str, &str)]) -> Result<String, RetrievalError> {
        let mut request_builder = self.http_client.get(url);
        for (name, value) in headers {
            request_builder = request_builder.header(*name, *value);
        }

        debug!("GET {}", url);
        let response = request_builder
            .send()
            .await
            .map_err(|e| RetrievalError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Log archive responded with {} for {}", status, url);
            return Err(RetrievalError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| RetrievalError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
