use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use super::{Exam, GradeCode, Teacher, Wish};

/// Quota applied when a teacher's grade has no configuration entry
pub const DEFAULT_GRADE_QUOTA: u32 = 2;

/// Surveillance quota configuration for one grade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeConfig {
    pub grade_code: GradeCode,
    pub label: String,
    /// Strict maximum number of sessions a teacher of this grade may invigilate
    pub quota: u32,
}

/// Solver parameters, loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveConfig {
    /// Minimum invigilators required per exam
    #[serde(default = "default_min_invigilators")]
    pub min_invigilators_per_exam: u32,
    /// Allow proportional coverage reduction when quotas cannot meet demand
    #[serde(default = "default_true")]
    pub allow_fallback: bool,
    /// Take unavailability wishes into account
    #[serde(default = "default_true")]
    pub honor_wishes: bool,
    /// Reward grouped sessions and penalize isolated ones
    #[serde(default = "default_true")]
    pub enable_grouping: bool,
    /// Wall-clock solve budget in seconds
    #[serde(default = "default_time_budget")]
    pub time_budget_s: u64,
    /// Relative optimality gap at which the solve may stop
    #[serde(default = "default_gap")]
    pub gap: f64,
}

fn default_min_invigilators() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

fn default_time_budget() -> u64 {
    900
}

fn default_gap() -> f64 {
    0.01
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            min_invigilators_per_exam: 2,
            allow_fallback: true,
            honor_wishes: true,
            enable_grouping: true,
            time_budget_s: 900,
            gap: 0.01,
        }
    }
}

/// All input data bundled together
#[derive(Debug)]
pub struct ScheduleInput {
    pub teachers: Vec<Teacher>,
    pub grades: Vec<GradeConfig>,
    pub exams: Vec<Exam>,
    pub wishes: Vec<Wish>,
    pub config: SolveConfig,
}

impl ScheduleInput {
    /// Grade code -> quota lookup
    pub fn quota_map(&self) -> BTreeMap<&GradeCode, u32> {
        self.grades.iter().map(|g| (&g.grade_code, g.quota)).collect()
    }

    /// Teachers that may appear in assignments, in input order
    pub fn eligible_teachers(&self) -> Vec<&Teacher> {
        self.teachers.iter().filter(|t| t.eligible).collect()
    }
}
