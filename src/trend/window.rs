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

//! Recent/older time window partitioning.

use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;

/// Default length of the recent window
pub const DEFAULT_RECENT_HOURS: i64 = 48;

/// Default total lookback (recent + older window)
pub const DEFAULT_LOOKBACK_HOURS: i64 = 96;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    /// `start` is not strictly before `end`
    Empty {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// A span is zero, negative or does not fit into a timestamp
    InvalidSpan(String),
}

impl fmt::Display for WindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { start, end } => {
                write!(f, "empty time window [{start}, {end})")
            }
            Self::InvalidSpan(msg) => write!(f, "invalid window span: {msg}"),
        }
    }
}

impl std::error::Error for WindowError {}

/// Half-open interval `[start, end)` with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, WindowError> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(WindowError::Empty { start, end })
        }
    }

    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }

    /// Relative position of `ts` inside the window, clamped to `[0, 1]`.
    ///
    /// 0.0 is the start edge, 1.0 the end edge.
    pub fn position_of(&self, ts: DateTime<Utc>) -> f64 {
        let elapsed = (ts - self.start).as_seconds_f64();
        let length = self.duration().as_seconds_f64();
        (elapsed / length).clamp(0.0, 1.0)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Lengths of the recent window and of the total lookback.
///
/// The older window covers `lookback - recent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpans {
    pub recent: TimeDelta,
    pub lookback: TimeDelta,
}

impl WindowSpans {
    pub fn from_hours(recent_hours: i64, lookback_hours: i64) -> Result<Self, WindowError> {
        let recent = TimeDelta::try_hours(recent_hours).ok_or_else(|| {
            WindowError::InvalidSpan(format!("{recent_hours}h is out of range"))
        })?;
        let lookback = TimeDelta::try_hours(lookback_hours).ok_or_else(|| {
            WindowError::InvalidSpan(format!("{lookback_hours}h is out of range"))
        })?;
        let spans = Self { recent, lookback };
        spans.validate()?;
        Ok(spans)
    }

    pub fn validate(&self) -> Result<(), WindowError> {
        if self.recent <= TimeDelta::zero() {
            return Err(WindowError::InvalidSpan(format!(
                "recent span must be positive, got {}",
                self.recent
            )));
        }
        if self.lookback <= self.recent {
            return Err(WindowError::InvalidSpan(format!(
                "lookback ({}) must be longer than the recent span ({})",
                self.lookback, self.recent
            )));
        }
        Ok(())
    }
}

impl Default for WindowSpans {
    fn default() -> Self {
        Self {
            recent: TimeDelta::hours(DEFAULT_RECENT_HOURS),
            lookback: TimeDelta::hours(DEFAULT_LOOKBACK_HOURS),
        }
    }
}

/// Which of the two windows a timestamp belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSide {
    Recent,
    Older,
}

/// The two adjacent windows of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPair {
    pub recent: TimeWindow,
    pub older: TimeWindow,
}

impl WindowPair {
    /// `recent = [now - spans.recent, now)`, `older = [now - spans.lookback, now - spans.recent)`
    pub fn partition(now: DateTime<Utc>, spans: WindowSpans) -> Result<Self, WindowError> {
        spans.validate()?;

        let boundary = now
            .checked_sub_signed(spans.recent)
            .ok_or_else(|| WindowError::InvalidSpan("recent window start underflows".into()))?;
        let older_start = now
            .checked_sub_signed(spans.lookback)
            .ok_or_else(|| WindowError::InvalidSpan("older window start underflows".into()))?;

        Ok(Self {
            recent: TimeWindow::new(boundary, now)?,
            older: TimeWindow::new(older_start, boundary)?,
        })
    }

    /// The single range covering both windows, used for ingestion
    pub const fn full_range(&self) -> TimeWindow {
        TimeWindow {
            start: self.older.start,
            end: self.recent.end,
        }
    }

    pub fn classify(&self, ts: DateTime<Utc>) -> Option<WindowSide> {
        if self.recent.contains(ts) {
            Some(WindowSide::Recent)
        } else if self.older.contains(ts) {
            Some(WindowSide::Older)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_default_partition() {
        let pair = WindowPair::partition(now(), WindowSpans::default()).unwrap();
        assert_eq!(pair.recent.end(), now());
        assert_eq!(pair.recent.start(), now() - TimeDelta::hours(48));
        assert_eq!(pair.older.end(), pair.recent.start());
        assert_eq!(pair.older.start(), now() - TimeDelta::hours(96));
    }

    #[test]
    fn test_windows_are_half_open_and_contiguous() {
        let pair = WindowPair::partition(now(), WindowSpans::default()).unwrap();
        let boundary = pair.recent.start();

        assert_eq!(pair.classify(boundary), Some(WindowSide::Recent));
        assert_eq!(
            pair.classify(boundary - TimeDelta::seconds(1)),
            Some(WindowSide::Older)
        );
        assert_eq!(pair.classify(now()), None);
        assert_eq!(pair.classify(pair.older.start()), Some(WindowSide::Older));
        assert_eq!(
            pair.classify(pair.older.start() - TimeDelta::seconds(1)),
            None
        );

        let full = pair.full_range();
        assert_eq!(full.start(), pair.older.start());
        assert_eq!(full.end(), now());
    }

    #[test]
    fn test_empty_window_rejected() {
        assert!(TimeWindow::new(now(), now()).is_err());
        assert!(TimeWindow::new(now(), now() - TimeDelta::hours(1)).is_err());
    }

    #[test]
    fn test_invalid_spans() {
        assert!(WindowSpans::from_hours(0, 96).is_err());
        assert!(WindowSpans::from_hours(48, 48).is_err());
        assert!(WindowSpans::from_hours(48, 24).is_err());
        assert!(WindowSpans::from_hours(24, 72).is_ok());
    }

    #[test]
    fn test_position_of_is_clamped() {
        let window = TimeWindow::new(now() - TimeDelta::hours(10), now()).unwrap();
        assert!((window.position_of(now() - TimeDelta::hours(5)) - 0.5).abs() < 1e-12);
        assert_eq!(window.position_of(now() - TimeDelta::hours(20)), 0.0);
        assert_eq!(window.position_of(now() + TimeDelta::hours(1)), 1.0);
    }
}
