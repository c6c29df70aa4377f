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

//! Verified post counts for published trends.
//!
//! The weighted `recent_count` is good for ranking but meaningless to a
//! reader, so every published phrase is re-counted against the raw posts.

use crate::core::{PostQuery, PostStore, StoreError};
use crate::trend::window::TimeWindow;
use crate::trend::PartitionTrends;
use rayon::prelude::*;
use std::collections::HashMap;

type TrendKey = (Option<String>, String);

/// Fill in `post_count` for every trend of every partition.
///
/// Queries run in parallel. If any of them fails, nothing is modified.
pub fn enrich(
    partitions: &mut [PartitionTrends],
    posts: &dyn PostStore,
    window: &TimeWindow,
) -> Result<(), StoreError> {
    profiling::scope!("enrich");

    let queries: Vec<(TrendKey, PostQuery)> = partitions
        .iter()
        .flat_map(|partition| partition.trends.iter())
        .map(|trend| {
            let key = (trend.language.clone(), trend.phrase.clone());
            let query = PostQuery {
                tokens: trend.tokens().map(str::to_string).collect(),
                window: *window,
                language: trend.language.clone(),
            };
            (key, query)
        })
        .collect();

    tracing::debug!("Verifying {} trends against the post store", queries.len());

    let counts: HashMap<TrendKey, u64> = queries
        .into_par_iter()
        .map(|(key, query)| posts.count_posts(&query).map(|count| (key, count)))
        .collect::<Result<_, _>>()?;

    for trend in partitions.iter_mut().flat_map(|p| p.trends.iter_mut()) {
        let key = (trend.language.clone(), trend.phrase.clone());
        trend.post_count = counts.get(&key).copied();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MemoryStore;
    use crate::record::Post;
    use crate::trend::RankedTrend;
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 20, 12, 0, 0).unwrap()
    }

    fn window() -> TimeWindow {
        TimeWindow::new(now() - TimeDelta::hours(48), now()).unwrap()
    }

    fn post(text: &str, hours_ago: i64, language: &str) -> Post {
        Post {
            text: text.to_string(),
            created_at: now() - TimeDelta::hours(hours_ago),
            language: Some(language.to_string()),
        }
    }

    fn ranked(phrase: &str, language: Option<&str>) -> RankedTrend {
        RankedTrend {
            rank: 1,
            phrase: phrase.to_string(),
            language: language.map(str::to_string),
            trend_score: 0.9,
            recent_count: 50.0,
            older_count: 1.0,
            post_count: None,
        }
    }

    struct FailingStore;

    impl PostStore for FailingStore {
        fn count_posts(&self, _query: &PostQuery) -> Result<u64, StoreError> {
            Err(StoreError::Timeout("count query exceeded 5s".to_string()))
        }
    }

    #[test]
    fn test_counts_replace_weighted_counts() {
        let store = MemoryStore::new().with_posts(vec![
            post("Election day lines are long", 3, "en"),
            post("Happy election day!", 10, "en"),
            post("Election results tonight", 5, "en"),
            post("election day last week", 70, "en"),
            post("選挙 の 結果", 2, "ja"),
        ]);

        let mut partitions = vec![
            PartitionTrends {
                language: Some("en".to_string()),
                trends: vec![ranked("election day", Some("en")), ranked("results", Some("en"))],
            },
            PartitionTrends {
                language: Some("ja".to_string()),
                trends: vec![ranked("選挙", Some("ja"))],
            },
        ];

        enrich(&mut partitions, &store, &window()).unwrap();

        assert_eq!(partitions[0].trends[0].post_count, Some(2));
        assert_eq!(partitions[0].trends[1].post_count, Some(1));
        assert_eq!(partitions[1].trends[0].post_count, Some(1));
        assert_eq!(partitions[0].trends[0].display_count(), 2);
    }

    #[test]
    fn test_failure_leaves_trends_untouched() {
        let mut partitions = vec![PartitionTrends {
            language: None,
            trends: vec![ranked("rust", None)],
        }];

        let err = enrich(&mut partitions, &FailingStore, &window()).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(partitions[0].trends[0].post_count, None);
    }
}
