use crate::error::Result;
use crate::types::Schedule;

/// Generate JSON report of the schedule
pub fn generate_json_report(schedule: &Schedule) -> Result<String> {
    Ok(serde_json::to_string_pretty(schedule)?)
}

/// Summary statistics as JSON
#[derive(serde::Serialize)]
pub struct JsonSummary {
    pub status: String,
    pub total_sessions: usize,
    pub total_exams: usize,
    pub total_assignments: usize,
    pub wish_respected: usize,
    pub wish_violated: usize,
    pub wish_out_of_scope: usize,
    pub warnings: usize,
    pub solve_time_ms: u64,
    pub score: f64,
}

pub fn generate_json_summary(schedule: &Schedule) -> Result<String> {
    let summary = JsonSummary {
        status: schedule.status.to_string(),
        total_sessions: schedule.stats.session_count,
        total_exams: schedule.stats.exam_count,
        total_assignments: schedule.total_assignments(),
        wish_respected: schedule.stats.wish_respected,
        wish_violated: schedule.stats.wish_violated,
        wish_out_of_scope: schedule.stats.wish_out_of_scope,
        warnings: schedule.diagnostics.warning_count(),
        solve_time_ms: schedule.metadata.solve_time_ms,
        score: schedule.metadata.score,
    };

    Ok(serde_json::to_string_pretty(&summary)?)
}
