use crate::tally::{CategoryCounts, KeywordTally};
use chrono::NaiveDateTime;
use domain::{LogBatch, TimeWindow};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Matches within one minute of chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinuteBucket {
    pub minute: NaiveDateTime,
    pub total: u64,
    pub counts: CategoryCounts,
}

/// Aggregated emote metrics for a channel over a window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatLogAnalysis {
    pub channel: String,
    pub window: TimeWindow,
    pub total_records: usize,
    pub skipped_lines: usize,
    /// Sum of every record's tally, all configured categories present
    pub emote_metrics: CategoryCounts,
    /// Minutes with at least one match, oldest first
    pub timeline: Vec<MinuteBucket>,
    /// Minute with the most matches; earliest wins a tie
    pub most_popular_occurrence: Option<NaiveDateTime>,
}

impl KeywordTally {
    /// Sum per-record tallies over a whole batch
    pub fn analyze(&self, channel: &str, window: TimeWindow, batch: &LogBatch) -> ChatLogAnalysis {
        let mut emote_metrics = self.empty_counts();
        let mut minutes: BTreeMap<NaiveDateTime, MinuteBucket> = BTreeMap::new();

        for record in &batch.records {
            let counts = self.tally(&record.message);
            let matched: u64 = counts.values().sum();
            if matched == 0 {
                continue;
            }

            let minute = record.minute();
            let bucket = minutes.entry(minute).or_insert_with(|| MinuteBucket {
                minute,
                total: 0,
                counts: self.empty_counts(),
            });
            bucket.total += matched;
            for (category, count) in counts {
                *bucket.counts.entry(category.clone()).or_insert(0) += count;
                *emote_metrics.entry(category).or_insert(0) += count;
            }
        }

        let timeline: Vec<MinuteBucket> = minutes.into_values().collect();
        // max_by_key returns the last maximum; walk newest first so the earliest minute wins
        let most_popular_occurrence = timeline
            .iter()
            .rev()
            .max_by_key(|bucket| bucket.total)
            .map(|bucket| bucket.minute);

        debug!(
            channel,
            records = batch.len(),
            active_minutes = timeline.len(),
            "Analyzed chat batch"
        );

        ChatLogAnalysis {
            channel: channel.to_string(),
            window,
            total_records: batch.len(),
            skipped_lines: batch.skipped_lines,
            emote_metrics,
            timeline,
            most_popular_occurrence,
        }
    }
}
