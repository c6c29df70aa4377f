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

//! File-backed stores reading JSON Lines dumps.

use crate::core::{OccurrenceSource, PostQuery, PostStore, StoreError};
use crate::record::jsonl::read_jsonl;
use crate::record::{OccurrenceRecord, Post};
use crate::trend::window::TimeWindow;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Occurrence records stored one JSON object per line.
///
/// The file is re-read on every query, so a dump replaced between runs is
/// always picked up.
#[derive(Debug, Clone)]
pub struct JsonlOccurrenceSource {
    path: PathBuf,
}

impl JsonlOccurrenceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OccurrenceSource for JsonlOccurrenceSource {
    fn occurrences_between(&self, range: &TimeWindow) -> Result<Vec<OccurrenceRecord>, StoreError> {
        profiling::scope!("JsonlOccurrenceSource::occurrences_between");
        let file = File::open(&self.path)?;
        let records: Vec<OccurrenceRecord> = read_jsonl(BufReader::new(file))?;
        let total = records.len();

        let in_range: Vec<OccurrenceRecord> = records
            .into_iter()
            .filter(|record| range.contains(record.created_at))
            .collect();

        tracing::info!(
            "Read {total} occurrence records from {}, {} within {range}",
            self.path.display(),
            in_range.len()
        );
        Ok(in_range)
    }
}

/// Posts loaded once from a JSON Lines dump.
#[derive(Debug, Clone)]
pub struct JsonlPostStore {
    posts: Vec<Post>,
}

impl JsonlPostStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let file = File::open(path)?;
        let posts: Vec<Post> = read_jsonl(BufReader::new(file))?;
        tracing::info!("Loaded {} posts from {}", posts.len(), path.display());
        Ok(Self { posts })
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

impl PostStore for JsonlPostStore {
    fn count_posts(&self, query: &PostQuery) -> Result<u64, StoreError> {
        Ok(count_matching(&self.posts, query))
    }
}

/// Count posts inside the query window, in the query language, containing every token
pub fn count_matching(posts: &[Post], query: &PostQuery) -> u64 {
    posts
        .iter()
        .filter(|post| query.window.contains(post.created_at))
        .filter(|post| {
            query
                .language
                .as_deref()
                .map_or(true, |language| post.language.as_deref() == Some(language))
        })
        .filter(|post| post.contains_all(&query.tokens))
        .count() as u64
}
