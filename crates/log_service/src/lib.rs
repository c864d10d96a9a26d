//! Retrieval of raw chat-log text from the log archive and parsing into records.

pub mod error;
pub mod fetcher;
pub mod parser;
pub mod source;

pub use error::{LogServiceError, ParseError, RetrievalError};
pub use fetcher::{DEFAULT_LOG_ARCHIVE_URL, LogFetcher, is_valid_channel};
pub use parser::{MalformedLinePolicy, parse_log_line, parse_log_text};
pub use source::{DEFAULT_TIMEOUT, ReqwestTextSource, TextSource};
