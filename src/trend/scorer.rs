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

use crate::record::phrase_tokens;
use crate::trend::counter::WeightedCounts;
use serde::Serialize;
use std::collections::BTreeSet;
use std::f64::consts::FRAC_PI_2;

/// A phrase seen in either window, with its trend score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendCandidate {
    pub phrase: String,
    pub recent_count: f64,
    pub older_count: f64,
    /// In [0.0, 1.0]; 0.5 means no change between the windows
    pub trend_score: f64,
}

impl TrendCandidate {
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        phrase_tokens(&self.phrase)
    }

    pub fn token_count(&self) -> usize {
        self.phrase.split(' ').count()
    }
}

/// Largest single weight across both windows' word and phrase maps.
///
/// 0.0 when there is no data at all.
pub fn max_count(recent: &WeightedCounts, older: &WeightedCounts) -> f64 {
    recent.max_weight().max(older.max_weight())
}

/// Squash relative growth, damped by absolute volume, into [0, 1].
///
/// `relative = (recent - older) / (older + 1)` and
/// `absolute = ln(recent + 1) / ln(max + 1)`; their product goes through
/// `atan` so that zero growth maps to exactly 0.5.
pub fn trend_score(recent_count: f64, older_count: f64, max_count: f64) -> f64 {
    let relative_increase = (recent_count - older_count) / (older_count + 1.0);
    let absolute_factor = if max_count > 0.0 {
        recent_count.ln_1p() / max_count.ln_1p()
    } else {
        0.0
    };
    let raw = relative_increase * absolute_factor;

    ((raw.atan() / FRAC_PI_2 + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Score every phrase that appears in either window.
///
/// Keys are visited in sorted order, so the output order is deterministic.
pub fn score_candidates(recent: &WeightedCounts, older: &WeightedCounts) -> Vec<TrendCandidate> {
    profiling::scope!("score_candidates");
    let max = max_count(recent, older);
    if max <= 0.0 {
        return Vec::new();
    }

    let keys: BTreeSet<&str> = recent.keys().chain(older.keys()).collect();

    keys.into_iter()
        .filter(|key| !key.trim().is_empty())
        .filter_map(|key| {
            let recent_count = recent.combined(key);
            let older_count = older.combined(key);
            if recent_count == 0.0 && older_count == 0.0 {
                return None;
            }

            Some(TrendCandidate {
                phrase: key.to_string(),
                recent_count,
                older_count,
                trend_score: trend_score(recent_count, older_count, max),
            })
        })
        .collect()
}
