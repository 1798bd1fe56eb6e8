use crate::reporter::collect_session_rows;
use crate::types::{Schedule, ScheduleInput};
use crate::validator::ValidationReport;
use colored::Colorize;

/// Generate a plain text report (with colors for terminal)
pub fn generate_text_report(
    schedule: &Schedule,
    input: &ScheduleInput,
    validation: &ValidationReport,
) -> String {
    let mut lines = Vec::new();

    lines.push("═".repeat(60));
    lines.push("           INVIGILATION SCHEDULE REPORT".to_string());
    lines.push("═".repeat(60));
    lines.push(String::new());

    lines.push(format!("Generated:  {}", schedule.metadata.generated_at));
    lines.push(format!("Status:     {}", schedule.status));
    lines.push(format!("Solve Time: {}ms", schedule.metadata.solve_time_ms));
    lines.push(String::new());

    lines.push("─".repeat(40));
    lines.push("STATISTICS".to_string());
    lines.push("─".repeat(40));
    lines.push(format!("  Sessions:     {}", schedule.stats.session_count));
    lines.push(format!("  Exams:        {}", schedule.stats.exam_count));
    lines.push(format!("  Assignments:  {}", schedule.total_assignments()));
    lines.push(format!(
        "  Wishes:       {} respected, {} violated, {} out of scope",
        schedule.stats.wish_respected,
        schedule.stats.wish_violated,
        schedule.stats.wish_out_of_scope
    ));
    lines.push(format!("  Score:        {:.1}/100", validation.total_score));
    lines.push(String::new());

    lines.push("─".repeat(40));
    if validation.is_valid {
        lines.push("VALIDATION: PASSED".green().to_string());
    } else {
        lines.push("VALIDATION: FAILED".red().to_string());
        for v in &validation.hard_violations {
            lines.push(format!("  ! {}: {}", v.constraint.red(), v.message));
        }
    }
    lines.push("─".repeat(40));
    lines.push(String::new());

    // Per-grade loads
    lines.push("GRADE LOADS".to_string());
    lines.push("─".repeat(40));
    for g in &schedule.stats.grade_loads {
        let marker = if g.equal { "●".green() } else { "●".red() };
        lines.push(format!(
            "  {} {} | {} teacher(s) | mean {:.1} | quota {}",
            marker, g.grade_code, g.teacher_count, g.mean_load, g.quota
        ));
    }
    lines.push(String::new());

    // Sessions with their teams
    lines.push("SESSIONS".to_string());
    lines.push("─".repeat(40));
    for row in collect_session_rows(schedule, input) {
        lines.push(format!(
            "\n{} {} ({}) | {} | {} | day {}",
            row.key.date.to_string().bold(),
            row.key.slot,
            row.key.slot.window(),
            row.key.semester,
            row.key.session_type,
            row.key.day_index
        ));
        lines.push(format!(
            "  {} exam(s) in room(s) {} | {} invigilator(s)",
            row.exam_count,
            row.rooms.join(", "),
            row.team.len()
        ));
        for name in &row.team {
            lines.push(format!("    - {}", name));
        }
    }

    // Wish violations, if any
    if !schedule.stats.wish_violations.is_empty() {
        lines.push(String::new());
        lines.push("WISH VIOLATIONS".to_string());
        lines.push("─".repeat(40));
        for v in &schedule.stats.wish_violations {
            lines.push(format!("  ! {} on {} {}", v.teacher_id, v.date, v.slot));
        }
    }

    lines.push(String::new());
    lines.push("═".repeat(60));

    lines.join("\n")
}

/// Print a quick summary to stdout
pub fn print_summary(schedule: &Schedule, validation: &ValidationReport) {
    println!();
    if schedule.status.is_solved() && validation.is_valid {
        println!("{}", "✓ Schedule generated successfully".green().bold());
    } else if schedule.status.is_solved() {
        println!("{}", "✗ Schedule has validation errors".red().bold());
    } else {
        println!("{}", format!("✗ No schedule: {}", schedule.status).red().bold());
    }
    println!();
    println!("  Status:      {}", schedule.status);
    println!("  Sessions:    {}", schedule.stats.session_count);
    println!("  Assignments: {}", schedule.total_assignments());
    println!(
        "  Wishes:      {:.0}% respected",
        schedule.stats.wish_respect_ratio() * 100.0
    );
    println!("  Score:       {:.1}/100", validation.total_score);
    println!("  Time:        {}ms", schedule.metadata.solve_time_ms);
    println!();

    let warnings: Vec<_> = schedule.diagnostics.warnings().collect();
    if !warnings.is_empty() {
        println!("{}", format!("  {} warning(s):", warnings.len()).yellow());
        for w in warnings.iter().take(10) {
            println!("    {}", w.message.as_str().yellow());
        }
        if warnings.len() > 10 {
            println!("    ... and {} more", warnings.len() - 10);
        }
        println!();
    }
}
