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

//! JSON Lines decoding for occurrence and post dumps.

use crate::core::StoreError;
use serde::de::DeserializeOwned;
use std::io::BufRead;

/// Decode every non-blank line of `reader` as one `T`.
///
/// Stops at the first malformed line and reports its 1-based line number.
pub fn read_jsonl<T, R>(reader: R) -> Result<Vec<T>, StoreError>
where
    T: DeserializeOwned,
    R: BufRead,
{
    profiling::scope!("read_jsonl");
    let mut items = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let item = serde_json::from_str(trimmed).map_err(|e| StoreError::Parse {
            line: idx + 1,
            message: e.to_string(),
        })?;
        items.push(item);
    }

    tracing::trace!("Decoded {} JSON lines", items.len());
    Ok(items)
}
