use serde::{Deserialize, Serialize};
use super::{ExternalCode, GradeCode, TeacherId};

/// Represents a teacher who may be drafted for invigilation duty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    /// Grade the surveillance quota applies to
    pub grade_code: GradeCode,
    /// Roster code used by exams and wishes to reference this teacher
    pub external_code: ExternalCode,
    /// Teachers with `eligible = false` never appear in any assignment
    #[serde(default = "default_eligible")]
    pub eligible: bool,
}

fn default_eligible() -> bool {
    true
}
