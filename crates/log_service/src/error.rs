use thiserror::Error;

/// Failure to obtain log text from the archive
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetrievalError {
    #[error("Invalid log archive URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Log archive returned status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read response body from {url}: {message}")]
    Body { url: String, message: String },
}

/// A chat-log line that could not be turned into a record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed log line {line_number} ({reason}): {line:?}")]
pub struct ParseError {
    /// 1-based position in the response body
    pub line_number: usize,
    pub line: String,
    pub reason: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogServiceError {
    #[error("Invalid channel name {0:?}: expected letters, digits or underscores")]
    InvalidChannel(String),

    #[error("Invalid time window: {0}")]
    InvalidWindow(#[from] domain::InvalidWindow),

    #[error("Log retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Log parsing failed: {0}")]
    Parse(#[from] ParseError),
}

impl LogServiceError {
    /// True when the caller supplied bad arguments rather than the archive misbehaving
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, Self::InvalidChannel(_) | Self::InvalidWindow(_))
    }
}
