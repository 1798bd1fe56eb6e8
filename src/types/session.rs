use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use super::SlotCode;

/// Identity of an invigilation session.
///
/// All exams sharing (date, slot, semester, session type) form one session
/// and are covered by a single invigilator team.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub date: NaiveDate,
    pub slot: SlotCode,
    pub semester: String,
    pub session_type: String,
    /// 1-based sequential number of this date within the batch,
    /// in chronological order
    pub day_index: u32,
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} (day {})",
            self.date, self.slot, self.semester, self.session_type, self.day_index
        )
    }
}

/// A session together with the indices of its member exams
/// (indices into the input exam list)
#[derive(Debug, Clone)]
pub struct Session {
    pub key: SessionKey,
    pub exams: Vec<usize>,
}

impl Session {
    pub fn exam_count(&self) -> usize {
        self.exams.len()
    }
}
