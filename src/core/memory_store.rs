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

use crate::core::jsonl_store::count_matching;
use crate::core::{OccurrenceSource, PostQuery, PostStore, StoreError, TrendSink};
use crate::record::{OccurrenceRecord, Post, PostTrend};
use crate::trend::window::TimeWindow;

/// In-process store implementing every boundary at once
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub records: Vec<OccurrenceRecord>,
    pub posts: Vec<Post>,
    pub trends: Vec<PostTrend>,
    /// Number of completed `replace_all` calls
    pub writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<OccurrenceRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_posts(mut self, posts: Vec<Post>) -> Self {
        self.posts = posts;
        self
    }
}

impl OccurrenceSource for MemoryStore {
    fn occurrences_between(&self, range: &TimeWindow) -> Result<Vec<OccurrenceRecord>, StoreError> {
        Ok(self
            .records
            .iter()
            .filter(|record| range.contains(record.created_at))
            .cloned()
            .collect())
    }
}

impl PostStore for MemoryStore {
    fn count_posts(&self, query: &PostQuery) -> Result<u64, StoreError> {
        Ok(count_matching(&self.posts, query))
    }
}

impl TrendSink for MemoryStore {
    fn replace_all(&mut self, trends: &[PostTrend]) -> Result<(), StoreError> {
        self.trends = trends.to_vec();
        self.writes += 1;
        Ok(())
    }
}
