use crate::reporter::collect_session_rows;
use crate::types::{Schedule, ScheduleInput};
use crate::validator::ValidationReport;
use itertools::Itertools;

/// Generate a markdown report of the schedule
pub fn generate_markdown_report(
    schedule: &Schedule,
    input: &ScheduleInput,
    validation: &ValidationReport,
) -> String {
    let mut lines = vec![
        "# Invigilation Schedule".to_string(),
        String::new(),
        format!("Generated: {}", schedule.metadata.generated_at),
        format!("Algorithm: v{}", schedule.metadata.algorithm_version),
        format!("Status: {}", schedule.status),
        format!("Solve time: {}ms", schedule.metadata.solve_time_ms),
        String::new(),
    ];

    // Summary
    lines.push("## Summary\n".to_string());
    lines.push("| Metric | Value |".to_string());
    lines.push("|--------|-------|".to_string());
    lines.push(format!("| Sessions | {} |", schedule.stats.session_count));
    lines.push(format!("| Exams | {} |", schedule.stats.exam_count));
    lines.push(format!("| Assignments | {} |", schedule.total_assignments()));
    lines.push(format!("| Wishes Respected | {} |", schedule.stats.wish_respected));
    lines.push(format!("| Wishes Violated | {} |", schedule.stats.wish_violated));
    lines.push(format!(
        "| Wishes Out Of Scope | {} |",
        schedule.stats.wish_out_of_scope
    ));
    lines.push(format!("| Overall Score | {:.1}/100 |", validation.total_score));
    lines.push(String::new());

    // Validation status
    if validation.is_valid {
        lines.push("## Validation: PASSED\n".to_string());
    } else {
        lines.push("## Validation: FAILED\n".to_string());
        for violation in &validation.hard_violations {
            lines.push(format!("- **{}**: {}", violation.constraint, violation.message));
        }
        lines.push(String::new());
    }

    // Soft scores
    lines.push("## Soft Constraint Scores\n".to_string());
    for score in &validation.soft_scores {
        let pct = if score.max_score > 0.0 {
            (score.score / score.max_score) * 100.0
        } else {
            100.0
        };
        lines.push(format!(
            "- **{}**: {:.1}% ({})",
            score.constraint, pct, score.details
        ));
    }
    lines.push(String::new());

    // Planning, one table per day
    lines.push("## Planning\n".to_string());
    let rows = collect_session_rows(schedule, input);
    for (day, day_rows) in &rows.iter().group_by(|r| r.key.day_index) {
        let day_rows: Vec<_> = day_rows.collect();
        lines.push(format!(
            "### Day {} - {}\n",
            day,
            day_rows[0].key.date
        ));
        lines.push("| Slot | Window | Semester | Session | Exams | Rooms | Invigilators |".to_string());
        lines.push("|------|--------|----------|---------|-------|-------|--------------|".to_string());
        for row in day_rows {
            lines.push(format!(
                "| {} | {} | {} | {} | {} | {} | {} |",
                row.key.slot,
                row.key.slot.window(),
                row.key.semester,
                row.key.session_type,
                row.exam_count,
                row.rooms.join(", "),
                row.team.join(", ")
            ));
        }
        lines.push(String::new());
    }

    // Per-teacher loads
    lines.push("## Teacher Loads\n".to_string());
    lines.push("| Teacher | Grade | Sessions |".to_string());
    lines.push("|---------|-------|----------|".to_string());
    for (teacher_id, load) in &schedule.stats.per_teacher_load {
        let teacher = input.teachers.iter().find(|t| &t.id == teacher_id);
        let (name, grade) = teacher
            .map(|t| (t.name.as_str(), t.grade_code.0.as_str()))
            .unwrap_or((teacher_id.0.as_str(), "?"));
        lines.push(format!("| {} | {} | {} |", name, grade, load));
    }
    lines.push(String::new());

    // Wish violations
    if !schedule.stats.wish_violations.is_empty() {
        lines.push("## Wish Violations\n".to_string());
        for v in &schedule.stats.wish_violations {
            lines.push(format!("- {} assigned on {} {}", v.teacher_id, v.date, v.slot));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}
