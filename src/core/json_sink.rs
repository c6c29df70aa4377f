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

//! JSON snapshot sink.
//!
//! Each run rewrites the whole snapshot: the new content goes to a sibling
//! temp file which is then renamed over the old one, so readers never see a
//! half-written feed. A `.lock` file serializes concurrent writers.

use crate::core::{StoreError, TrendSink};
use crate::record::PostTrend;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// On-disk trend feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendSnapshot {
    pub generated_at: DateTime<Utc>,
    pub trends: Vec<PostTrend>,
}

impl TrendSnapshot {
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| StoreError::Parse {
            line: e.line(),
            message: e.to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct JsonSnapshotSink {
    path: PathBuf,
    generated_at: DateTime<Utc>,
}

impl JsonSnapshotSink {
    /// `generated_at` is stamped into every snapshot this sink writes
    pub fn new(path: impl Into<PathBuf>, generated_at: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            generated_at,
        }
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(suffix);
        self.path.with_file_name(name)
    }
}

impl TrendSink for JsonSnapshotSink {
    fn replace_all(&mut self, trends: &[PostTrend]) -> Result<(), StoreError> {
        profiling::scope!("JsonSnapshotSink::replace_all");

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.sibling(".lock"))?;
        lock.lock_exclusive()?;

        let snapshot = TrendSnapshot {
            generated_at: self.generated_at,
            trends: trends.to_vec(),
        };
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))?;

        let tmp_path = self.sibling(".tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;

        FileExt::unlock(&lock)?;
        tracing::info!(
            "Wrote {} trends to {}",
            trends.len(),
            self.path.display()
        );
        Ok(())
    }
}
