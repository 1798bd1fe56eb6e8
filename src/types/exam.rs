use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use super::{ExamId, ExternalCode, SlotCode};

/// A single exam sitting in one room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    pub id: ExamId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// Semester label, e.g. "SEMESTRE 1"
    pub semester: String,
    /// Session type, e.g. "Principale" or "Controle"
    pub session_type: String,
    pub room: String,
    /// Roster code of the teacher who authored the exam, if known
    #[serde(default)]
    pub responsible_external_code: Option<ExternalCode>,
}

impl Exam {
    /// Slot code derived from the start time
    pub fn slot(&self) -> SlotCode {
        SlotCode::from_start_time(self.start_time)
    }
}
