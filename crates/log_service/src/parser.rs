//! Parser for the plain-text chat-log export format:
//!
//! ```text
//! [2022-05-19 00:01:00] #mizkif someviewer: OMEGALUL
//! [2022-05-19 00:01:04] #mizkif someviewer has been timed out for 10s
//! ```

use crate::error::ParseError;
use chrono::NaiveDateTime;
use domain::{ChatLogRecord, LogBatch, TimeWindow};
use serde::Deserialize;
use tracing::warn;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What to do with a line that is not a valid log record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedLinePolicy {
    /// Drop the line and count it in [`LogBatch::skipped_lines`]
    #[default]
    Skip,
    /// Abort the whole parse on the first bad line
    FailFast,
}

/// Parse a single log line. `line_number` is only used for error reporting.
pub fn parse_log_line(line_number: usize, line: &str) -> Result<ChatLogRecord, ParseError> {
    let malformed = |reason: &str| ParseError {
        line_number,
        line: line.to_string(),
        reason: reason.to_string(),
    };

    let rest = line
        .trim()
        .strip_prefix('[')
        .ok_or_else(|| malformed("missing opening bracket"))?;
    let (raw_timestamp, rest) = rest
        .split_once(']')
        .ok_or_else(|| malformed("missing closing bracket"))?;
    let timestamp = NaiveDateTime::parse_from_str(raw_timestamp.trim(), TIMESTAMP_FORMAT)
        .map_err(|e| malformed(&format!("invalid timestamp: {e}")))?;

    let rest = rest.trim_start();
    let (channel, body) = match rest.strip_prefix('#') {
        Some(prefixed) => match prefixed.split_once(' ') {
            Some((channel, body)) => (Some(channel.to_string()), body),
            None => (Some(prefixed.to_string()), ""),
        },
        None => (None, rest),
    };

    // "user: message" vs. a system notice with no author
    let (username, message) = match body.split_once(": ") {
        Some((user, message)) if !user.is_empty() && !user.contains(char::is_whitespace) => {
            (Some(user.to_string()), message)
        }
        _ => (None, body),
    };

    Ok(ChatLogRecord {
        timestamp,
        channel,
        username,
        message: message.trim_end().to_string(),
    })
}

/// Parse a response body into the records that fall inside `window`.
///
/// Blank lines are ignored. Source order is preserved.
pub fn parse_log_text(
    text: &str,
    window: &TimeWindow,
    policy: MalformedLinePolicy,
) -> Result<LogBatch, ParseError> {
    let mut batch = LogBatch::default();

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_log_line(index + 1, line) {
            Ok(record) if window.contains(record.timestamp) => batch.records.push(record),
            Ok(_) => {}
            Err(err) => match policy {
                MalformedLinePolicy::Skip => {
                    warn!("Skipping {}", err);
                    batch.skipped_lines += 1;
                }
                MalformedLinePolicy::FailFast => return Err(err),
            },
        }
    }

    Ok(batch)
}
