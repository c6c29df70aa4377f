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

//! One complete trend run: ingest, rank, verify, publish.

use crate::core::enrich::enrich;
use crate::core::{OccurrenceSource, PostStore, StoreError, TrendSink};
use crate::record::PostTrend;
use crate::trend::window::WindowError;
use crate::trend::{PartitionTrends, TrendEngine};
use chrono::{DateTime, Utc};
use std::fmt;

#[derive(Debug)]
pub enum JobError {
    Window(WindowError),
    Store(StoreError),
}

impl JobError {
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Window(_) => false,
            Self::Store(e) => e.is_retryable(),
        }
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Window(e) => write!(f, "{e}"),
            Self::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for JobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Window(e) => Some(e),
            Self::Store(e) => Some(e),
        }
    }
}

impl From<WindowError> for JobError {
    fn from(e: WindowError) -> Self {
        Self::Window(e)
    }
}

impl From<StoreError> for JobError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

/// What a finished run did
#[derive(Debug, Clone, PartialEq)]
pub struct JobSummary {
    pub records_ingested: usize,
    pub partitions: Vec<PartitionTrends>,
    pub trends_written: usize,
    pub enriched: bool,
}

#[derive(Debug, Clone)]
pub struct TrendJob {
    engine: TrendEngine,
}

impl TrendJob {
    pub const fn new(engine: TrendEngine) -> Self {
        Self { engine }
    }

    /// Run once. The sink is written exactly once, after everything else succeeded.
    pub fn run(
        &self,
        now: DateTime<Utc>,
        source: &dyn OccurrenceSource,
        posts: Option<&dyn PostStore>,
        sink: &mut dyn TrendSink,
    ) -> Result<JobSummary, JobError> {
        profiling::scope!("TrendJob::run");
        let windows = self.engine.windows(now)?;
        tracing::info!(
            "Ranking trends for recent window {} against older window {}",
            windows.recent,
            windows.older
        );

        let records = source.occurrences_between(&windows.full_range())?;
        let mut partitions = self.engine.rank_in(&records, &windows);

        let enriched = if let Some(posts) = posts {
            enrich(&mut partitions, posts, &windows.recent)?;
            true
        } else {
            false
        };

        let published: Vec<PostTrend> = partitions
            .iter()
            .flat_map(|partition| partition.trends.iter())
            .map(crate::trend::RankedTrend::to_post_trend)
            .collect();
        sink.replace_all(&published)?;

        tracing::info!(
            "Published {} trends across {} partition(s) from {} records",
            published.len(),
            partitions.len(),
            records.len()
        );

        Ok(JobSummary {
            records_ingested: records.len(),
            partitions,
            trends_written: published.len(),
            enriched,
        })
    }

    /// Like [`Self::run`], re-running the whole job on retryable store errors.
    pub fn run_with_retries(
        &self,
        now: DateTime<Utc>,
        max_attempts: usize,
        source: &dyn OccurrenceSource,
        posts: Option<&dyn PostStore>,
        sink: &mut dyn TrendSink,
    ) -> Result<JobSummary, JobError> {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.run(now, source, posts, sink) {
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    tracing::warn!("Attempt {attempt}/{max_attempts} failed: {e}; retrying");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MemoryStore, PostQuery};
    use crate::record::{OccurrenceRecord, Post};
    use crate::trend::window::{TimeWindow, WindowSpans};
    use crate::trend::EngineSettings;
    use chrono::{TimeDelta, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 20, 12, 0, 0).unwrap()
    }

    fn election_records() -> Vec<OccurrenceRecord> {
        let recent = now() - TimeDelta::hours(24);
        let older = now() - TimeDelta::hours(72);
        let mut records = vec![OccurrenceRecord::new("election", recent).with_word2("day"); 5];
        records.extend(vec![OccurrenceRecord::new("election", older); 2]);
        records.extend(vec![OccurrenceRecord::new("weather", recent); 3]);
        records.extend(vec![OccurrenceRecord::new("weather", older); 3]);
        records
    }

    /// Fails with a timeout a fixed number of times before serving
    struct FlakySource {
        inner: MemoryStore,
        failures_left: AtomicUsize,
    }

    impl OccurrenceSource for FlakySource {
        fn occurrences_between(
            &self,
            range: &TimeWindow,
        ) -> Result<Vec<OccurrenceRecord>, StoreError> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StoreError::Timeout("occurrence query".to_string()));
            }
            self.inner.occurrences_between(range)
        }
    }

    struct FailingPosts;

    impl PostStore for FailingPosts {
        fn count_posts(&self, _query: &PostQuery) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("post store offline".to_string()))
        }
    }

    #[test]
    fn test_run_publishes_ranked_trends() {
        let source = MemoryStore::with_records(election_records());
        let mut sink = MemoryStore::new();

        let summary = TrendJob::new(TrendEngine::default())
            .run(now(), &source, None, &mut sink)
            .unwrap();

        assert_eq!(summary.records_ingested, 13);
        assert!(!summary.enriched);
        assert_eq!(sink.writes, 1);
        assert_eq!(sink.trends.len(), summary.trends_written);
        assert_eq!(sink.trends[0].phrase, "election day");
        assert_eq!(sink.trends[0].post_count, 25);
        // Flat activity scores 0.5 and is still published below growing phrases.
        assert_eq!(sink.trends.last().unwrap().phrase, "weather");
    }

    #[test]
    fn test_run_with_enrichment_uses_verified_counts() {
        let source = MemoryStore::with_records(election_records());
        let posts = MemoryStore::new().with_posts(vec![
            Post {
                text: "Election day!".to_string(),
                created_at: now() - TimeDelta::hours(5),
                language: None,
            },
            Post {
                text: "Rainy weather on election day".to_string(),
                created_at: now() - TimeDelta::hours(6),
                language: None,
            },
        ]);
        let mut sink = MemoryStore::new();

        let summary = TrendJob::new(TrendEngine::default())
            .run(now(), &source, Some(&posts), &mut sink)
            .unwrap();

        assert!(summary.enriched);
        let counts: Vec<(&str, u64)> = sink
            .trends
            .iter()
            .map(|t| (t.phrase.as_str(), t.post_count))
            .collect();
        assert_eq!(counts, vec![("election day", 2), ("weather", 1)]);
    }

    #[test]
    fn test_enrichment_failure_skips_the_write() {
        let source = MemoryStore::with_records(election_records());
        let mut sink = MemoryStore::new();

        let err = TrendJob::new(TrendEngine::default())
            .run(now(), &source, Some(&FailingPosts), &mut sink)
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(sink.writes, 0);
        assert!(sink.trends.is_empty());
    }

    #[test]
    fn test_retries_transient_ingest_failures() {
        let source = FlakySource {
            inner: MemoryStore::with_records(election_records()),
            failures_left: AtomicUsize::new(2),
        };
        let mut sink = MemoryStore::new();
        let job = TrendJob::new(TrendEngine::default());

        let summary = job
            .run_with_retries(now(), 3, &source, None, &mut sink)
            .unwrap();
        assert_eq!(summary.records_ingested, 13);
        assert_eq!(sink.writes, 1);

        source.failures_left.store(5, Ordering::SeqCst);
        assert!(job
            .run_with_retries(now(), 3, &source, None, &mut sink)
            .is_err());
    }

    #[test]
    fn test_invalid_spans_are_not_retried() {
        let engine = TrendEngine::new(EngineSettings {
            spans: WindowSpans {
                recent: TimeDelta::hours(48),
                lookback: TimeDelta::hours(12),
            },
            ..EngineSettings::default()
        });
        let source = MemoryStore::new();
        let mut sink = MemoryStore::new();

        let err = TrendJob::new(engine)
            .run_with_retries(now(), 3, &source, None, &mut sink)
            .unwrap_err();
        assert!(matches!(err, JobError::Window(_)));
        assert_eq!(sink.writes, 0);
    }

    #[test]
    fn test_empty_store_publishes_empty_feed() {
        let source = MemoryStore::new();
        let mut sink = MemoryStore::new();
        sink.trends.push(PostTrend {
            phrase: "stale".to_string(),
            post_count: 1,
            language: None,
        });

        let summary = TrendJob::new(TrendEngine::default())
            .run(now(), &source, None, &mut sink)
            .unwrap();
        assert_eq!(summary.trends_written, 0);
        assert!(sink.trends.is_empty());
    }
}
