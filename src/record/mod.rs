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

//! Input and output records exchanged with the stores.

pub mod jsonl;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One word (optionally followed by one or two more) extracted from a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceRecord {
    pub word: String,
    #[serde(default)]
    pub word2: Option<String>,
    #[serde(default)]
    pub word3: Option<String>,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Normalized n-gram tokens of a record, ready for counting.
///
/// `second` is only set when `word2` survives normalization, and `third`
/// only when both `word2` and `word3` do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grams {
    pub first: String,
    pub second: Option<String>,
    pub third: Option<String>,
}

impl Grams {
    /// Bigram key (`"first second"`), if the record has a second token
    pub fn bigram(&self) -> Option<String> {
        self.second
            .as_ref()
            .map(|second| format!("{} {second}", self.first))
    }

    /// Trigram key (`"first second third"`), if the record has all three tokens
    pub fn trigram(&self) -> Option<String> {
        match (&self.second, &self.third) {
            (Some(second), Some(third)) => Some(format!("{} {second} {third}", self.first)),
            _ => None,
        }
    }
}

impl OccurrenceRecord {
    pub fn new(word: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            word: word.into(),
            word2: None,
            word3: None,
            created_at,
            language: None,
        }
    }

    #[must_use]
    pub fn with_word2(mut self, word2: impl Into<String>) -> Self {
        self.word2 = Some(word2.into());
        self
    }

    #[must_use]
    pub fn with_word3(mut self, word3: impl Into<String>) -> Self {
        self.word3 = Some(word3.into());
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Normalize the record's tokens.
    ///
    /// Returns `None` for inert records (blank `word`). A blank `word2`
    /// also drops `word3`, since a trigram needs both preceding tokens.
    pub fn grams(&self) -> Option<Grams> {
        let first = normalize_token(&self.word)?;
        let second = self.word2.as_deref().and_then(normalize_token);
        let third = second
            .as_ref()
            .and_then(|_| self.word3.as_deref().and_then(normalize_token));

        Some(Grams {
            first,
            second,
            third,
        })
    }

    /// Whether the record carries the given language tag
    pub fn is_language(&self, language: &str) -> bool {
        self.language.as_deref() == Some(language)
    }
}

/// A raw post, as seen by the enrichment query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub text: String,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub language: Option<String>,
}

impl Post {
    /// Check whether the post text contains every token (case-insensitive)
    pub fn contains_all<S: AsRef<str>>(&self, tokens: &[S]) -> bool {
        let text = self.text.to_lowercase();
        tokens
            .iter()
            .all(|token| text.contains(&token.as_ref().to_lowercase()))
    }
}

/// A published trend, as handed to the result sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostTrend {
    pub phrase: String,
    pub post_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Trim and lower-case a token. Blank tokens normalize to `None`.
pub fn normalize_token(token: &str) -> Option<String> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Split a phrase key back into its tokens
pub fn phrase_tokens(phrase: &str) -> impl Iterator<Item = &str> {
    phrase.split(' ').filter(|token| !token.is_empty())
}
