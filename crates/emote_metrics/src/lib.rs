//! Emote keyword tallies for chat messages and log batches.

pub mod analysis;
pub mod tally;

pub use analysis::{ChatLogAnalysis, MinuteBucket};
pub use tally::{CategoryCounts, KeywordTally, tally_keywords};
