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

//! Collapsing of phrases that subsume one another.
//!
//! A hot topic tends to surface as its unigram, bigram and trigram at the
//! same time ("election", "election day", "election day results"). Only
//! the best-scoring variant of such a family is kept.

use crate::trend::scorer::TrendCandidate;
use indexmap::IndexMap;

/// Whether two phrases of different length subsume one another.
///
/// This is a raw substring test on the phrase strings, so "cat" also
/// matches inside "concatenate now". Phrases with the same number of tokens
/// never overlap.
pub fn phrases_overlap(a: &TrendCandidate, b: &TrendCandidate) -> bool {
    let (a_len, b_len) = (a.token_count(), b.token_count());
    if a_len == b_len {
        return false;
    }

    let (shorter, longer) = if a_len < b_len {
        (&a.phrase, &b.phrase)
    } else {
        (&b.phrase, &a.phrase)
    };
    longer.contains(shorter.as_str())
}

/// Rank candidates by descending score and drop subsumed phrases.
///
/// The sort is stable, so equal scores keep their input order. When a
/// newcomer overlaps an accepted phrase, the strictly higher score wins;
/// on a tie the accepted phrase stays.
pub fn resolve_overlaps(mut candidates: Vec<TrendCandidate>) -> Vec<TrendCandidate> {
    profiling::scope!("resolve_overlaps");
    candidates.sort_by(|a, b| b.trend_score.total_cmp(&a.trend_score));

    let mut accepted: IndexMap<String, TrendCandidate> = IndexMap::new();

    for candidate in candidates {
        if accepted.contains_key(&candidate.phrase) {
            continue;
        }

        let mut beaten = false;
        let mut evicted = Vec::new();
        for (phrase, existing) in &accepted {
            if !phrases_overlap(&candidate, existing) {
                continue;
            }
            if candidate.trend_score > existing.trend_score {
                evicted.push(phrase.clone());
            } else {
                beaten = true;
                break;
            }
        }

        if beaten {
            tracing::trace!("Dropping subsumed phrase '{}'", candidate.phrase);
            continue;
        }

        for phrase in &evicted {
            tracing::trace!("'{}' evicts subsumed phrase '{phrase}'", candidate.phrase);
            accepted.shift_remove(phrase);
        }
        accepted.insert(candidate.phrase.clone(), candidate);
    }

    accepted.into_values().collect()
}
