// TrendCrab - GPL-3.0-or-later
// This file is part of TrendCrab.
//
// Copyright (C) 2025 Daniel Freiermuth
//
// TrendCrab is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// TrendCrab is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with TrendCrab.  If not, see <https://www.gnu.org/licenses/>.

//! Store boundaries and the job that ties them to the engine.

pub mod enrich;
pub mod job;
pub mod json_sink;
pub mod jsonl_store;
pub mod memory_store;

pub use job::{JobSummary, TrendJob};
pub use json_sink::JsonSnapshotSink;
pub use jsonl_store::{JsonlOccurrenceSource, JsonlPostStore};
pub use memory_store::MemoryStore;

use crate::record::{OccurrenceRecord, PostTrend};
use crate::trend::window::TimeWindow;
use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    /// A stored record could not be decoded
    Parse { line: usize, message: String },
    /// The backing store refused or could not serve the request
    Unavailable(String),
    Timeout(String),
}

impl StoreError {
    /// Whether re-running the whole job may succeed
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Parse { line, message } => write!(f, "malformed record on line {line}: {message}"),
            Self::Unavailable(msg) => write!(f, "store unavailable: {msg}"),
            Self::Timeout(msg) => write!(f, "store query timed out: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse { .. } | Self::Unavailable(_) | Self::Timeout(_) => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::TimedOut {
            Self::Timeout(e.to_string())
        } else {
            Self::Io(e)
        }
    }
}

/// Supplies occurrence records for a time range.
pub trait OccurrenceSource: Send + Sync {
    /// All records with `created_at` in `[range.start, range.end)`, without any cap
    fn occurrences_between(&self, range: &TimeWindow) -> Result<Vec<OccurrenceRecord>, StoreError>;
}

/// Verification query for one published phrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    /// Every token must occur in the post text
    pub tokens: Vec<String>,
    pub window: TimeWindow,
    /// Restrict to posts tagged with this language
    pub language: Option<String>,
}

/// Raw post store used to verify published trends.
pub trait PostStore: Send + Sync {
    fn count_posts(&self, query: &PostQuery) -> Result<u64, StoreError>;
}

/// Destination of each run's trends.
pub trait TrendSink {
    /// Replace everything previously stored with `trends`
    fn replace_all(&mut self, trends: &[PostTrend]) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(StoreError::Timeout("posts".into()).is_retryable());
        assert!(StoreError::Unavailable("db down".into()).is_retryable());
        assert!(!StoreError::Parse {
            line: 3,
            message: "bad".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_io_timeout_maps_to_timeout() {
        let err: StoreError = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow disk").into();
        assert!(matches!(err, StoreError::Timeout(_)));

        let err: StoreError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, StoreError::Io(_)));
        assert!(!err.is_retryable());
    }
}
