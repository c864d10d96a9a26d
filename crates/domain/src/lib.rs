use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Category name an emote keyword is grouped under (e.g. "humor")
pub type Category = String;

/// Returned when a window's start lies after its end
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("window start {start} is after window end {end}")]
pub struct InvalidWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Inclusive `[start, end]` range of UTC timestamps used to filter chat-log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, InvalidWindow> {
        if start > end {
            return Err(InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Both ends are inclusive
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

/// One parsed line of chat-log text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLogRecord {
    pub timestamp: NaiveDateTime,
    /// Channel from the `#channel` prefix, when the line carries one
    pub channel: Option<String>,
    /// `None` for system notices (timeouts, bans) which have no author
    pub username: Option<String>,
    pub message: String,
}

impl ChatLogRecord {
    /// Timestamp truncated to the start of its minute
    pub fn minute(&self) -> NaiveDateTime {
        self.timestamp
            .with_second(0)
            .and_then(|ts| ts.with_nanosecond(0))
            .unwrap_or(self.timestamp)
    }
}

/// Records parsed from one fetch, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogBatch {
    pub records: Vec<ChatLogRecord>,
    /// Malformed lines dropped while parsing
    pub skipped_lines: usize,
}

impl LogBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Metadata for a recorded stream video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub id: String,
    pub channel_name: String,
    pub video_title: String,
    pub video_start_time: NaiveDateTime,
    pub video_end_time: NaiveDateTime,
    pub video_url: String,
    /// Set once the video's chat has been analyzed
    pub indexed: bool,
}

impl VideoDetails {
    /// The chat window covered by this video
    pub fn window(&self) -> Result<TimeWindow, InvalidWindow> {
        TimeWindow::new(self.video_start_time, self.video_end_time)
    }
}

/// Read-only mapping from category name to its trigger keywords.
///
/// Keywords are exact, case-sensitive tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmoteMapping {
    categories: BTreeMap<Category, BTreeSet<String>>,
}

impl EmoteMapping {
    pub fn new(categories: BTreeMap<Category, BTreeSet<String>>) -> Self {
        Self { categories }
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn keywords(&self, category: &str) -> Option<&BTreeSet<String>> {
        self.categories.get(category)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.categories.iter().map(|(c, k)| (c.as_str(), k))
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl<C, K, I> FromIterator<(C, I)> for EmoteMapping
where
    C: Into<String>,
    K: Into<String>,
    I: IntoIterator<Item = K>,
{
    fn from_iter<T: IntoIterator<Item = (C, I)>>(iter: T) -> Self {
        let mut categories: BTreeMap<Category, BTreeSet<String>> = BTreeMap::new();
        for (category, keywords) in iter {
            categories
                .entry(category.into())
                .or_default()
                .extend(keywords.into_iter().map(Into::into));
        }
        Self { categories }
    }
}
