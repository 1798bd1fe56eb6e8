use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbolic code for one of the four daily invigilation time windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SlotCode {
    S1,
    S2,
    S3,
    S4,
}

impl SlotCode {
    pub const ALL: [SlotCode; 4] = [SlotCode::S1, SlotCode::S2, SlotCode::S3, SlotCode::S4];

    /// Derive the slot code from an exam start time.
    ///
    /// Fixed partition of the day:
    /// S1 = [08:30, 10:30), S2 = [10:30, 12:30), S3 = [12:30, 14:30), S4 = [14:30, 17:00).
    /// Times outside these windows fall back to S1 before noon and S3 after.
    pub fn from_start_time(start: NaiveTime) -> Self {
        let minutes = start.hour() * 60 + start.minute();
        match minutes {
            510..=629 => SlotCode::S1,
            630..=749 => SlotCode::S2,
            750..=869 => SlotCode::S3,
            870..=1019 => SlotCode::S4,
            m if m < 720 => SlotCode::S1,
            _ => SlotCode::S3,
        }
    }

    /// 1-based position within the day (S1 < S2 < S3 < S4)
    pub fn index(self) -> u8 {
        match self {
            SlotCode::S1 => 1,
            SlotCode::S2 => 2,
            SlotCode::S3 => 3,
            SlotCode::S4 => 4,
        }
    }

    /// Nominal wall-clock window, for reports
    pub fn window(self) -> &'static str {
        match self {
            SlotCode::S1 => "08:30-10:30",
            SlotCode::S2 => "10:30-12:30",
            SlotCode::S3 => "12:30-14:30",
            SlotCode::S4 => "14:30-17:00",
        }
    }
}

impl fmt::Display for SlotCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotCode::S1 => write!(f, "S1"),
            SlotCode::S2 => write!(f, "S2"),
            SlotCode::S3 => write!(f, "S3"),
            SlotCode::S4 => write!(f, "S4"),
        }
    }
}
