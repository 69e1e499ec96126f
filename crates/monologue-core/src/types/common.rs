//! Shared time units for playback.

use serde::{Deserialize, Serialize};

/// Playback position in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position(pub u64);

impl Position {
    pub const ZERO: Self = Self(0);

    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_secs(seconds: f64) -> Self {
        Self((seconds * 1000.0) as u64)
    }

    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn as_secs(&self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Move by a signed number of milliseconds, saturating at zero.
    pub const fn offset(&self, delta_ms: i64) -> Self {
        if delta_ms >= 0 {
            Self(self.0.saturating_add(delta_ms as u64))
        } else {
            Self(self.0.saturating_sub(delta_ms.unsigned_abs()))
        }
    }

    /// Time left until `duration`; zero once the position passes the end.
    pub const fn remaining(&self, duration: Duration) -> Duration {
        Duration(duration.0.saturating_sub(self.0))
    }

    /// Format as M:SS or H:MM:SS.
    pub fn format(&self) -> String {
        Duration(self.0).format()
    }
}

impl From<u64> for Position {
    fn from(millis: u64) -> Self {
        Self(millis)
    }
}

/// Total media duration in milliseconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Duration(pub u64);

impl Duration {
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub const fn from_secs(seconds: u64) -> Self {
        Self(seconds * 1000)
    }

    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn as_secs(&self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Format as M:SS or H:MM:SS.
    pub fn format(&self) -> String {
        let total_secs = self.0 / 1000;
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;

        if hours > 0 {
            format!("{hours}:{minutes:02}:{seconds:02}")
        } else {
            format!("{minutes}:{seconds:02}")
        }
    }
}

impl From<u64> for Duration {
    fn from(millis: u64) -> Self {
        Self(millis)
    }
}
