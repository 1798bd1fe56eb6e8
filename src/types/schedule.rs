use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use super::{Assignment, Diagnostics, ExamId, GradeCode, SlotCode, TeacherId};

/// Outcome reported by the solver driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// Proven optimal within the configured gap
    Optimal,
    /// A solution satisfying every hard constraint, found before the budget ran out
    Feasible,
    /// The hard constraints admit no solution
    Infeasible,
    /// The solver stopped without a usable answer
    Unknown,
}

impl SolveStatus {
    pub fn is_solved(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "Optimal",
            SolveStatus::Feasible => "Feasible",
            SolveStatus::Infeasible => "Infeasible",
            SolveStatus::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

/// Load summary for one grade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeLoadStats {
    pub grade_code: GradeCode,
    pub teacher_count: usize,
    pub quota: u32,
    pub mean_load: f64,
    /// All eligible teachers of this grade carry the same load
    pub equal: bool,
}

/// A wish the solver could not honor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WishViolation {
    pub teacher_id: TeacherId,
    pub date: NaiveDate,
    pub slot: SlotCode,
}

/// Aggregate statistics over a solved schedule
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleStats {
    pub per_teacher_load: BTreeMap<TeacherId, u32>,
    pub grade_loads: Vec<GradeLoadStats>,
    pub per_grade_equality_ok: bool,
    pub wish_respected: usize,
    pub wish_violated: usize,
    pub wish_out_of_scope: usize,
    pub wish_violations: Vec<WishViolation>,
    pub session_count: usize,
    pub exam_count: usize,
}

impl ScheduleStats {
    /// Share of wishes honored. Out-of-scope wishes count as respected.
    pub fn wish_respect_ratio(&self) -> f64 {
        let total = self.wish_respected + self.wish_violated + self.wish_out_of_scope;
        if total == 0 {
            return 1.0;
        }
        (self.wish_respected + self.wish_out_of_scope) as f64 / total as f64
    }
}

/// Metadata about the generated schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleMetadata {
    pub generated_at: String,
    pub algorithm_version: String,
    pub score: f64,
    pub solve_time_ms: u64,
}

impl Default for ScheduleMetadata {
    fn default() -> Self {
        Self {
            generated_at: String::new(),
            algorithm_version: String::new(),
            score: 0.0,
            solve_time_ms: 0,
        }
    }
}

/// The complete outcome of one scheduling run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub status: SolveStatus,
    pub assignments: Vec<Assignment>,
    pub stats: ScheduleStats,
    pub diagnostics: Diagnostics,
    pub metadata: ScheduleMetadata,
}

impl Schedule {
    /// Create an empty schedule with the given status
    pub fn new(status: SolveStatus) -> Self {
        Self {
            status,
            assignments: Vec::new(),
            stats: ScheduleStats::default(),
            diagnostics: Diagnostics::new(),
            metadata: ScheduleMetadata {
                generated_at: chrono::Utc::now().to_rfc3339(),
                algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
                score: 0.0,
                solve_time_ms: 0,
            },
        }
    }

    /// All assignments of one teacher
    pub fn assignments_for_teacher(&self, teacher_id: &TeacherId) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| &a.teacher_id == teacher_id)
            .collect()
    }

    /// All assignments covering one exam
    pub fn assignments_for_exam(&self, exam_id: &ExamId) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| &a.exam_id == exam_id)
            .collect()
    }

    /// Total number of exam-teacher pairs emitted
    pub fn total_assignments(&self) -> usize {
        self.assignments.len()
    }
}
