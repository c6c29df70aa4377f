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

//! Trend scoring engine.
//!
//! Pipeline per language partition:
//! window partitioning -> weighted counting (both windows in parallel) ->
//! scoring -> overlap resolution -> top-N truncation.

pub mod counter;
pub mod overlap;
pub mod scorer;
pub mod window;

use crate::record::{phrase_tokens, OccurrenceRecord, PostTrend};
use chrono::{DateTime, Utc};
use counter::WeightedCounts;
use overlap::resolve_overlaps;
use scorer::{score_candidates, TrendCandidate};
use serde::Serialize;
use window::{WindowError, WindowPair, WindowSpans};

/// Number of trends published per partition
pub const DEFAULT_TOP_N: usize = 10;

/// Final entry of the trend feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedTrend {
    /// 1-based position within its partition
    pub rank: usize,
    pub phrase: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub trend_score: f64,
    pub recent_count: f64,
    pub older_count: f64,
    /// Verified number of posts containing the phrase, once enriched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_count: Option<u64>,
}

impl RankedTrend {
    fn from_candidate(rank: usize, candidate: TrendCandidate, language: Option<&str>) -> Self {
        Self {
            rank,
            phrase: candidate.phrase,
            language: language.map(str::to_string),
            trend_score: candidate.trend_score,
            recent_count: candidate.recent_count,
            older_count: candidate.older_count,
            post_count: None,
        }
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        phrase_tokens(&self.phrase)
    }

    /// Verified post count if known, otherwise the rounded weighted count
    pub fn display_count(&self) -> u64 {
        self.post_count
            .unwrap_or_else(|| self.recent_count.max(0.0).round() as u64)
    }

    pub fn to_post_trend(&self) -> PostTrend {
        PostTrend {
            phrase: self.phrase.clone(),
            post_count: self.display_count(),
            language: self.language.clone(),
        }
    }
}

/// Ranked output of one language partition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionTrends {
    /// `None` for the single, language-agnostic partition
    pub language: Option<String>,
    pub trends: Vec<RankedTrend>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub spans: WindowSpans,
    pub top_n: usize,
    /// Language partitions to rank independently. Empty ranks everything together.
    pub languages: Vec<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            spans: WindowSpans::default(),
            top_n: DEFAULT_TOP_N,
            languages: Vec::new(),
        }
    }
}

/// Deterministic trend ranking over an immutable batch of records.
#[derive(Debug, Clone, Default)]
pub struct TrendEngine {
    settings: EngineSettings,
}

impl TrendEngine {
    pub const fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn windows(&self, now: DateTime<Utc>) -> Result<WindowPair, WindowError> {
        WindowPair::partition(now, self.settings.spans)
    }

    /// Rank every configured partition.
    pub fn rank(
        &self,
        records: &[OccurrenceRecord],
        now: DateTime<Utc>,
    ) -> Result<Vec<PartitionTrends>, WindowError> {
        let windows = self.windows(now)?;
        Ok(self.rank_in(records, &windows))
    }

    /// Rank every configured partition against precomputed windows.
    pub fn rank_in(&self, records: &[OccurrenceRecord], windows: &WindowPair) -> Vec<PartitionTrends> {
        profiling::scope!("TrendEngine::rank_in");

        if self.settings.languages.is_empty() {
            let refs: Vec<&OccurrenceRecord> = records.iter().collect();
            return vec![PartitionTrends {
                language: None,
                trends: self.rank_partition(&refs, windows, None),
            }];
        }

        self.settings
            .languages
            .iter()
            .map(|language| {
                let refs: Vec<&OccurrenceRecord> = records
                    .iter()
                    .filter(|record| record.is_language(language))
                    .collect();
                PartitionTrends {
                    language: Some(language.clone()),
                    trends: self.rank_partition(&refs, windows, Some(language.as_str())),
                }
            })
            .collect()
    }

    fn rank_partition(
        &self,
        records: &[&OccurrenceRecord],
        windows: &WindowPair,
        language: Option<&str>,
    ) -> Vec<RankedTrend> {
        let candidates = rank_candidates(records, windows);
        let total = candidates.len();

        let trends: Vec<RankedTrend> = candidates
            .into_iter()
            .take(self.settings.top_n)
            .enumerate()
            .map(|(idx, candidate)| RankedTrend::from_candidate(idx + 1, candidate, language))
            .collect();

        tracing::debug!(
            "Partition {}: {} records, {} deduplicated candidates, publishing {}",
            language.unwrap_or("*"),
            records.len(),
            total,
            trends.len()
        );
        trends
    }
}

/// Count, score and deduplicate one partition. The result is not truncated.
pub fn rank_candidates(records: &[&OccurrenceRecord], windows: &WindowPair) -> Vec<TrendCandidate> {
    profiling::scope!("rank_candidates");
    let (recent, older) = rayon::join(
        || WeightedCounts::from_records(records.iter().copied(), &windows.recent),
        || WeightedCounts::from_records(records.iter().copied(), &windows.older),
    );

    resolve_overlaps(score_candidates(&recent, &older))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 20, 12, 0, 0).unwrap()
    }

    fn recent_mid() -> DateTime<Utc> {
        now() - TimeDelta::hours(24)
    }

    fn older_mid() -> DateTime<Utc> {
        now() - TimeDelta::hours(72)
    }

    fn repeat(record: &OccurrenceRecord, n: usize) -> Vec<OccurrenceRecord> {
        vec![record.clone(); n]
    }

    fn phrases(partition: &PartitionTrends) -> Vec<&str> {
        partition.trends.iter().map(|t| t.phrase.as_str()).collect()
    }

    #[test]
    fn test_bigram_subsumes_unigrams() {
        let mut records = repeat(
            &OccurrenceRecord::new("election", recent_mid()).with_word2("day"),
            5,
        );
        records.extend(repeat(&OccurrenceRecord::new("election", older_mid()), 2));

        let result = TrendEngine::default().rank(&records, now()).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(phrases(&result[0]), vec!["election day"]);

        let trend = &result[0].trends[0];
        assert_eq!(trend.rank, 1);
        assert!((trend.recent_count - 25.0).abs() < 1e-9);
        assert!(trend.trend_score > 0.5);
    }

    #[test]
    fn test_empty_input_yields_empty_ranking() {
        let result = TrendEngine::default().rank(&[], now()).unwrap();
        assert_eq!(result.len(), 1);
        assert!(result[0].trends.is_empty());
    }

    #[test]
    fn test_records_outside_both_windows_are_ignored() {
        let records = vec![
            OccurrenceRecord::new("ancient", now() - TimeDelta::hours(200)),
            OccurrenceRecord::new("future", now() + TimeDelta::hours(1)),
        ];
        let result = TrendEngine::default().rank(&records, now()).unwrap();
        assert!(result[0].trends.is_empty());
    }

    #[test]
    fn test_top_n_truncation_and_ranks() {
        let words = ["alpha", "bravo", "charlie", "delta", "echo", "foxtrot"];
        let records: Vec<_> = words
            .iter()
            .enumerate()
            .flat_map(|(i, word)| repeat(&OccurrenceRecord::new(*word, recent_mid()), i + 1))
            .collect();

        let engine = TrendEngine::new(EngineSettings {
            top_n: 3,
            ..EngineSettings::default()
        });
        let result = engine.rank(&records, now()).unwrap();
        assert_eq!(phrases(&result[0]), vec!["foxtrot", "echo", "delta"]);
        let ranks: Vec<usize> = result[0].trends.iter().map(|t| t.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let mut records = Vec::new();
        for (i, word) in ["rust", "crab", "ferris", "cargo", "tokio"].iter().enumerate() {
            records.extend(repeat(&OccurrenceRecord::new(*word, recent_mid()).with_word2("news"), 3));
            records.extend(repeat(&OccurrenceRecord::new(*word, older_mid()), i));
        }

        let engine = TrendEngine::default();
        let first = engine.rank(&records, now()).unwrap();
        let second = engine.rank(&records, now()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_language_partitions_are_independent() {
        let mut records = repeat(
            &OccurrenceRecord::new("election", recent_mid()).with_language("en"),
            4,
        );
        records.extend(repeat(
            &OccurrenceRecord::new("選挙", recent_mid()).with_language("ja"),
            4,
        ));
        records.extend(repeat(
            &OccurrenceRecord::new("wahl", recent_mid()).with_language("de"),
            9,
        ));
        records.push(OccurrenceRecord::new("untagged", recent_mid()));

        let engine = TrendEngine::new(EngineSettings {
            languages: vec!["en".to_string(), "ja".to_string()],
            ..EngineSettings::default()
        });
        let result = engine.rank(&records, now()).unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].language.as_deref(), Some("en"));
        assert_eq!(phrases(&result[0]), vec!["election"]);
        assert_eq!(result[1].language.as_deref(), Some("ja"));
        assert_eq!(phrases(&result[1]), vec!["選挙"]);
        assert_eq!(result[1].trends[0].language.as_deref(), Some("ja"));

        // Each partition normalizes against its own maximum.
        assert!((result[0].trends[0].trend_score - result[1].trends[0].trend_score).abs() < 1e-12);
    }

    #[test]
    fn test_display_count_prefers_verified_posts() {
        let mut trend = RankedTrend {
            rank: 1,
            phrase: "election day".to_string(),
            language: Some("en".to_string()),
            trend_score: 0.9,
            recent_count: 24.6,
            older_count: 0.0,
            post_count: None,
        };
        assert_eq!(trend.display_count(), 25);

        trend.post_count = Some(7);
        let published = trend.to_post_trend();
        assert_eq!(published.post_count, 7);
        assert_eq!(published.language.as_deref(), Some("en"));
        assert_eq!(trend.tokens().collect::<Vec<_>>(), vec!["election", "day"]);
    }
}
