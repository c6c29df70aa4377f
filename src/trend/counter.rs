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

//! Time-weighted unigram/bigram/trigram counting for a single window.

use crate::record::OccurrenceRecord;
use crate::trend::window::TimeWindow;
use std::collections::HashMap;

/// Extra weight a record gets at the start edge of its window
pub const EDGE_BOOST: f64 = 0.5;

/// Bigram contributions are multiplied by this
pub const BIGRAM_MULTIPLIER: f64 = 4.0;

/// Trigram contributions are multiplied by this
pub const TRIGRAM_MULTIPLIER: f64 = 8.0;

/// Weight of a record created at `created_at` inside `window`.
///
/// 1.5 at the window's start edge, decaying linearly to 1.0 at its end edge.
/// Timestamps outside the window are clamped to the nearest edge.
pub fn time_weight(created_at: chrono::DateTime<chrono::Utc>, window: &TimeWindow) -> f64 {
    let normalized = window.position_of(created_at);
    (1.0 - normalized).mul_add(EDGE_BOOST, 1.0)
}

/// Accumulated weights of one window.
///
/// Single words live in `words`, bigrams and trigrams share `phrases`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightedCounts {
    pub words: HashMap<String, f64>,
    pub phrases: HashMap<String, f64>,
}

impl WeightedCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every record whose `created_at` falls inside `window`.
    pub fn from_records<'a, I>(records: I, window: &TimeWindow) -> Self
    where
        I: IntoIterator<Item = &'a OccurrenceRecord>,
    {
        profiling::scope!("WeightedCounts::from_records");
        records
            .into_iter()
            .filter(|record| window.contains(record.created_at))
            .fold(Self::new(), |mut counts, record| {
                counts.add_record(record, window);
                counts
            })
    }

    /// Add one record's contribution. Inert records are ignored.
    pub fn add_record(&mut self, record: &OccurrenceRecord, window: &TimeWindow) {
        let Some(grams) = record.grams() else {
            return;
        };
        let weight = time_weight(record.created_at, window);

        if let Some(bigram) = grams.bigram() {
            *self.phrases.entry(bigram).or_insert(0.0) += weight * BIGRAM_MULTIPLIER;
        }
        if let Some(trigram) = grams.trigram() {
            *self.phrases.entry(trigram).or_insert(0.0) += weight * TRIGRAM_MULTIPLIER;
        }

        for token in [Some(grams.first), grams.second, grams.third]
            .into_iter()
            .flatten()
        {
            *self.words.entry(token).or_insert(0.0) += weight;
        }
    }

    /// Key-wise sum of two count sets
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        for (key, weight) in other.words {
            *self.words.entry(key).or_insert(0.0) += weight;
        }
        for (key, weight) in other.phrases {
            *self.phrases.entry(key).or_insert(0.0) += weight;
        }
        self
    }

    pub fn word(&self, key: &str) -> f64 {
        self.words.get(key).copied().unwrap_or(0.0)
    }

    pub fn phrase(&self, key: &str) -> f64 {
        self.phrases.get(key).copied().unwrap_or(0.0)
    }

    /// Word weight plus phrase weight under the same key
    pub fn combined(&self, key: &str) -> f64 {
        self.word(key) + self.phrase(key)
    }

    /// Largest single weight in either map, 0.0 when empty
    pub fn max_weight(&self) -> f64 {
        self.words
            .values()
            .chain(self.phrases.values())
            .copied()
            .fold(0.0, f64::max)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.words
            .keys()
            .chain(self.phrases.keys())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.phrases.is_empty()
    }
}

impl std::iter::Sum for WeightedCounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::new(), Self::merge)
    }
}
