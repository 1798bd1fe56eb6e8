mod hard_constraints;
mod soft_constraints;

pub use hard_constraints::*;
pub use soft_constraints::*;

use crate::scheduler::{build_sessions, CoverageMode};
use crate::types::{ExamId, Schedule, ScheduleInput, Session};
use std::collections::HashMap;

/// Result of schedule validation
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub hard_violations: Vec<Violation>,
    pub soft_scores: Vec<SoftScore>,
    pub total_score: f64,
    pub statistics: ScheduleStatistics,
}

/// A constraint violation
#[derive(Debug, Clone)]
pub struct Violation {
    pub constraint: String,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

/// Score for a soft constraint
#[derive(Debug, Clone)]
pub struct SoftScore {
    pub constraint: String,
    pub score: f64,
    pub max_score: f64,
    pub details: String,
}

/// Statistics about the schedule
#[derive(Debug, Clone)]
pub struct ScheduleStatistics {
    pub total_sessions: usize,
    pub total_exams: usize,
    pub total_assignments: usize,
    pub teachers_used: usize,
    pub wish_violations: usize,
}

/// Session universe rebuilt from the input, shared by the checks
pub struct SessionTables {
    pub sessions: Vec<Session>,
    pub session_of_exam: HashMap<ExamId, usize>,
    pub mode: CoverageMode,
}

/// Rebuild the session universe and coverage mode the scheduler used
pub fn build_session_tables(input: &ScheduleInput) -> SessionTables {
    let sessions = build_sessions(&input.exams);

    let mut session_of_exam = HashMap::new();
    for (idx, session) in sessions.iter().enumerate() {
        for &exam_idx in &session.exams {
            session_of_exam.insert(input.exams[exam_idx].id.clone(), idx);
        }
    }

    let quota_map = input.quota_map();
    let m = input.config.min_invigilators_per_exam;
    let total_quota: u64 = input
        .eligible_teachers()
        .iter()
        .map(|t| {
            quota_map
                .get(&t.grade_code)
                .copied()
                .unwrap_or(crate::types::DEFAULT_GRADE_QUOTA) as u64
        })
        .sum();
    let ideal_demand: u64 = sessions
        .iter()
        .map(|s| s.exam_count() as u64 * m as u64)
        .sum();
    let mode = CoverageMode::determine(total_quota, ideal_demand, m, input.config.allow_fallback);

    SessionTables {
        sessions,
        session_of_exam,
        mode,
    }
}

/// Validate a complete schedule against every hard invariant, then score
/// the soft criteria. Meant for Optimal/Feasible schedules; an unsolved
/// schedule with assignments missing will fail the coverage checks.
pub fn validate_schedule(schedule: &Schedule, input: &ScheduleInput) -> ValidationReport {
    let tables = build_session_tables(input);

    let mut hard_violations = Vec::new();
    hard_violations.extend(check_ineligible_assignments(schedule, input));
    hard_violations.extend(check_assignment_duplication(schedule, input, &tables));
    hard_violations.extend(check_coverage(schedule, input, &tables));
    hard_violations.extend(check_grade_equality(schedule, input, &tables));
    hard_violations.extend(check_quota_caps(schedule, input, &tables));
    hard_violations.extend(check_responsible_presence(schedule, input));
    hard_violations.extend(check_day_isolation(schedule, input, &tables));
    hard_violations.extend(check_session_balance(schedule, input, &tables));

    let soft_scores = calculate_soft_scores(schedule, input, &tables);
    let statistics = calculate_statistics(schedule, input, &tables);

    let total_score = if hard_violations.iter().any(|v| v.severity == Severity::Error) {
        0.0
    } else {
        let soft_total: f64 = soft_scores.iter().map(|s| s.score).sum();
        let soft_max: f64 = soft_scores.iter().map(|s| s.max_score).sum();
        if soft_max > 0.0 {
            (soft_total / soft_max) * 100.0
        } else {
            100.0
        }
    };

    ValidationReport {
        is_valid: hard_violations.iter().all(|v| v.severity != Severity::Error),
        hard_violations,
        soft_scores,
        total_score,
        statistics,
    }
}

fn calculate_statistics(
    schedule: &Schedule,
    _input: &ScheduleInput,
    tables: &SessionTables,
) -> ScheduleStatistics {
    let teachers_used = schedule
        .assignments
        .iter()
        .map(|a| &a.teacher_id)
        .collect::<std::collections::HashSet<_>>()
        .len();

    ScheduleStatistics {
        total_sessions: tables.sessions.len(),
        total_exams: tables.session_of_exam.len(),
        total_assignments: schedule.assignments.len(),
        teachers_used,
        wish_violations: schedule.stats.wish_violated,
    }
}
