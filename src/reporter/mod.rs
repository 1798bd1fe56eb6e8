mod json;
mod markdown;
mod text;

pub use json::*;
pub use markdown::*;
pub use text::*;

use crate::error::Result;
use crate::types::{Schedule, ScheduleInput, SessionKey, TeacherId};
use crate::validator::{build_session_tables, ValidationReport};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Json,
    Markdown,
    Text,
}

/// Generate all reports and write to output directory
pub fn generate_reports(
    schedule: &Schedule,
    input: &ScheduleInput,
    validation: &ValidationReport,
    output_dir: &Path,
    formats: &[OutputFormat],
) -> Result<()> {
    fs::create_dir_all(output_dir)?;

    // Clone schedule and update score from validation
    let mut schedule_with_score = schedule.clone();
    schedule_with_score.metadata.score = validation.total_score;

    for format in formats {
        match format {
            OutputFormat::Json => {
                let json = generate_json_report(&schedule_with_score)?;
                fs::write(output_dir.join("schedule.json"), json)?;
            }
            OutputFormat::Markdown => {
                let md = generate_markdown_report(&schedule_with_score, input, validation);
                fs::write(output_dir.join("schedule.md"), md)?;
            }
            OutputFormat::Text => {
                let txt = generate_text_report(&schedule_with_score, input, validation);
                fs::write(output_dir.join("schedule.txt"), txt)?;
            }
        }
    }

    Ok(())
}

/// One session with its invigilation team, for tabular reports
pub(crate) struct SessionRow {
    pub key: SessionKey,
    pub exam_count: usize,
    pub rooms: Vec<String>,
    pub team: Vec<String>,
}

/// Collect per-session team rows in session order
pub(crate) fn collect_session_rows(schedule: &Schedule, input: &ScheduleInput) -> Vec<SessionRow> {
    let tables = build_session_tables(input);

    let mut teams: Vec<BTreeSet<&TeacherId>> = vec![BTreeSet::new(); tables.sessions.len()];
    for assignment in &schedule.assignments {
        if let Some(&s) = tables.session_of_exam.get(&assignment.exam_id) {
            teams[s].insert(&assignment.teacher_id);
        }
    }

    tables
        .sessions
        .iter()
        .enumerate()
        .map(|(s, session)| {
            let mut rooms: Vec<String> = session
                .exams
                .iter()
                .map(|&idx| input.exams[idx].room.clone())
                .collect();
            rooms.sort();
            rooms.dedup();

            let team = teams[s]
                .iter()
                .map(|id| {
                    input
                        .teachers
                        .iter()
                        .find(|t| &&t.id == id)
                        .map(|t| t.name.clone())
                        .unwrap_or_else(|| id.to_string())
                })
                .collect();

            SessionRow {
                key: session.key.clone(),
                exam_count: session.exam_count(),
                rooms,
                team,
            }
        })
        .collect()
}

/// Generate a teacher's individual duty roster
pub fn generate_teacher_schedule(
    schedule: &Schedule,
    input: &ScheduleInput,
    teacher_id: &TeacherId,
) -> Option<String> {
    let teacher = input.teachers.iter().find(|t| &t.id == teacher_id)?;
    let tables = build_session_tables(input);

    let mut duties: BTreeSet<usize> = BTreeSet::new();
    for assignment in schedule.assignments_for_teacher(teacher_id) {
        if let Some(&s) = tables.session_of_exam.get(&assignment.exam_id) {
            duties.insert(s);
        }
    }

    let mut lines = vec![
        format!("# Invigilation duties for {} ({})", teacher.name, teacher.id),
        format!("Grade: {}\n", teacher.grade_code),
    ];

    if duties.is_empty() {
        lines.push("No invigilation duties assigned.".to_string());
    } else {
        lines.push(format!("## {} session(s)\n", duties.len()));
        for s in duties {
            let session = &tables.sessions[s];
            let mut rooms: Vec<&str> = session
                .exams
                .iter()
                .map(|&idx| input.exams[idx].room.as_str())
                .collect();
            rooms.sort();
            rooms.dedup();

            lines.push(format!(
                "- **{}** {} ({}) - {} - {} exam(s) in room(s) {}",
                session.key.date,
                session.key.slot,
                session.key.slot.window(),
                session.key.semester,
                session.exam_count(),
                rooms.join(", ")
            ));
        }
    }

    Some(lines.join("\n"))
}
