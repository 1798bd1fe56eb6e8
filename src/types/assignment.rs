use serde::{Deserialize, Serialize};
use super::{ExamId, TeacherId};

/// One teacher assigned to invigilate one exam
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub exam_id: ExamId,
    pub teacher_id: TeacherId,
    pub room: String,
    /// True when this teacher authored the exam
    pub is_responsible: bool,
}
