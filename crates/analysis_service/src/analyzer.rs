use crate::error::AnalysisError;
use datastore::Repository;
use domain::{TimeWindow, VideoDetails};
use emote_metrics::{ChatLogAnalysis, KeywordTally};
use futures::future::join_all;
use log_service::{LogFetcher, LogServiceError};
use serde::Serialize;
use tracing::{info, warn};

/// Fetches a channel's chat logs and tallies emote keywords over them
pub struct ChatAnalyzer {
    fetcher: LogFetcher,
    tally: KeywordTally,
}

/// Result of analyzing one video as part of a channel-wide run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAnalysisOutcome {
    pub video_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ChatLogAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatAnalyzer {
    pub fn new(fetcher: LogFetcher, tally: KeywordTally) -> Self {
        Self { fetcher, tally }
    }

    pub async fn analyze(
        &self,
        channel: &str,
        window: TimeWindow,
    ) -> Result<ChatLogAnalysis, LogServiceError> {
        let batch = self.fetcher.fetch_window(channel, &window).await?;
        Ok(self.tally.analyze(channel.trim(), window, &batch))
    }

    /// Analyze a registered video's window and mark it indexed
    pub async fn analyze_video(
        &self,
        repo: &dyn Repository,
        id: &str,
    ) -> Result<ChatLogAnalysis, AnalysisError> {
        let video = repo
            .find_by_id(id)?
            .ok_or_else(|| AnalysisError::VideoNotFound { id: id.to_string() })?;
        self.index_video(repo, video).await
    }

    /// Analyze every video of `channel` that is not indexed yet.
    ///
    /// Videos are processed concurrently; one failure does not stop the others.
    pub async fn analyze_pending(
        &self,
        repo: &dyn Repository,
        channel: &str,
    ) -> Result<Vec<VideoAnalysisOutcome>, AnalysisError> {
        let pending: Vec<VideoDetails> = repo
            .find_by_channel_name(channel)?
            .into_iter()
            .filter(|video| !video.indexed)
            .collect();
        info!(channel, pending = pending.len(), "Analyzing pending videos");

        let runs = pending.into_iter().map(|video| async move {
            let video_id = video.id.clone();
            match self.index_video(repo, video).await {
                Ok(analysis) => VideoAnalysisOutcome {
                    video_id,
                    analysis: Some(analysis),
                    error: None,
                },
                Err(err) => {
                    warn!(video_id = %video_id, "Video analysis failed: {}", err);
                    VideoAnalysisOutcome {
                        video_id,
                        analysis: None,
                        error: Some(err.to_string()),
                    }
                }
            }
        });
        Ok(join_all(runs).await)
    }

    async fn index_video(
        &self,
        repo: &dyn Repository,
        video: VideoDetails,
    ) -> Result<ChatLogAnalysis, AnalysisError> {
        let window = video.window()?;
        let analysis = self.analyze(&video.channel_name, window).await?;

        // The video may have been re-registered while its logs were being fetched
        if !repo.mark_indexed(&video)? {
            warn!(id = %video.id, "Video changed during analysis, leaving it pending");
            return Err(AnalysisError::VideoChanged { id: video.id });
        }
        info!(id = %video.id, channel = %video.channel_name, "Video indexed");
        Ok(analysis)
    }
}
