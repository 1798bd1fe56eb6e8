use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use invigilation_scheduler::parser::{load_input_from_dir, validate_input};
use invigilation_scheduler::reporter::{
    generate_json_summary, generate_reports, generate_teacher_schedule, print_summary,
    OutputFormat,
};
use invigilation_scheduler::scheduler::generate_schedule;
use invigilation_scheduler::types::TeacherId;
use invigilation_scheduler::validator::validate_schedule;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "invigilation-scheduler")]
#[command(about = "Constraint-based exam invigilation schedule generator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run demo with sample data
    Demo,

    /// Generate a schedule from input data
    Schedule {
        /// Directory containing input JSON files
        #[arg(short, long)]
        data: PathBuf,

        /// Output directory for schedule files
        #[arg(short, long, default_value = "./output")]
        output: PathBuf,

        /// Output format(s): json, markdown, text, or all
        #[arg(short, long, default_value = "all")]
        format: String,

        /// Suppress progress output, print JSON summary only
        #[arg(short, long)]
        quiet: bool,
    },

    /// Validate an existing schedule
    Validate {
        /// Path to schedule.json file
        #[arg(short, long)]
        schedule: PathBuf,

        /// Directory containing input data for validation
        #[arg(short, long)]
        data: PathBuf,

        /// Show detailed validation results
        #[arg(short, long)]
        verbose: bool,
    },

    /// Generate reports from a schedule
    Report {
        /// Path to schedule.json file
        #[arg(short, long)]
        schedule: PathBuf,

        /// Directory containing input data
        #[arg(short, long)]
        data: PathBuf,

        /// Generate duty roster for a specific teacher ID
        #[arg(long)]
        teacher: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo => run_demo(),
        Commands::Schedule {
            data,
            output,
            format,
            quiet,
        } => run_schedule(&data, &output, &format, quiet),
        Commands::Validate {
            schedule,
            data,
            verbose,
        } => run_validate(&schedule, &data, verbose),
        Commands::Report {
            schedule,
            data,
            teacher,
        } => run_report(&schedule, &data, teacher),
    }
}

fn run_demo() -> Result<()> {
    println!("{}", "Invigilation Scheduler Demo".bold().cyan());
    println!("{}", "─".repeat(40));

    let demo_path = PathBuf::from("data/demo");
    let output_path = PathBuf::from("output");

    if !demo_path.join("exams.json").exists() {
        println!(
            "{}",
            "Demo data not found. Creating sample data...".yellow()
        );
        create_demo_data(&demo_path)?;
    }

    println!("Loading demo data from: {}", demo_path.display());

    let input = load_input_from_dir(&demo_path).context("Failed to load demo data")?;

    let validation_result = validate_input(&input)?;
    for warning in &validation_result.warnings {
        println!("{} {}", "Warning:".yellow(), warning);
    }

    println!(
        "Loaded {} teachers, {} grades, {} exams, {} wishes",
        input.teachers.len(),
        input.grades.len(),
        input.exams.len(),
        input.wishes.len()
    );

    println!("\nGenerating schedule...\n");
    let schedule = generate_schedule(&input, false)?;

    if !schedule.status.is_solved() {
        println!(
            "{}",
            format!("No schedule produced (status: {})", schedule.status)
                .red()
                .bold()
        );
        for entry in schedule.diagnostics.entries() {
            println!("  {}", entry);
        }
        return Ok(());
    }

    let validation = validate_schedule(&schedule, &input);
    print_summary(&schedule, &validation);

    generate_reports(
        &schedule,
        &input,
        &validation,
        &output_path,
        &[OutputFormat::Json, OutputFormat::Markdown, OutputFormat::Text],
    )?;

    println!(
        "Reports written to: {}",
        output_path.display().to_string().green()
    );

    Ok(())
}

fn run_schedule(data: &PathBuf, output: &PathBuf, format: &str, quiet: bool) -> Result<()> {
    let input = load_input_from_dir(data).context("Failed to load input data")?;

    if !quiet {
        let validation_result = validate_input(&input)?;
        for warning in &validation_result.warnings {
            println!("{} {}", "Warning:".yellow(), warning);
        }
        println!(
            "Loaded {} teachers, {} grades, {} exams, {} wishes",
            input.teachers.len(),
            input.grades.len(),
            input.exams.len(),
            input.wishes.len()
        );
    }

    let schedule = generate_schedule(&input, quiet)?;

    if !schedule.status.is_solved() {
        if quiet {
            println!("{}", generate_json_summary(&schedule)?);
        } else {
            println!(
                "{}",
                format!("No schedule produced (status: {})", schedule.status)
                    .red()
                    .bold()
            );
            for entry in schedule.diagnostics.entries() {
                println!("  {}", entry);
            }
        }
        std::process::exit(1);
    }

    let validation = validate_schedule(&schedule, &input);
    let formats = parse_formats(format);
    generate_reports(&schedule, &input, &validation, output, &formats)?;

    if quiet {
        let mut with_score = schedule.clone();
        with_score.metadata.score = validation.total_score;
        println!("{}", generate_json_summary(&with_score)?);
    } else {
        print_summary(&schedule, &validation);
        println!("Reports written to: {}", output.display().to_string().green());
    }

    Ok(())
}

fn run_validate(schedule_path: &PathBuf, data: &PathBuf, verbose: bool) -> Result<()> {
    let input = load_input_from_dir(data)?;

    let schedule_json = std::fs::read_to_string(schedule_path)?;
    let schedule: invigilation_scheduler::types::Schedule = serde_json::from_str(&schedule_json)?;

    let validation = validate_schedule(&schedule, &input);

    if validation.is_valid {
        println!("{}", "✓ Schedule is valid".green().bold());
    } else {
        println!("{}", "✗ Schedule has violations".red().bold());
        for v in &validation.hard_violations {
            println!("  - {}: {}", v.constraint.red(), v.message);
        }
    }

    if verbose {
        println!("\n{}", "Soft Constraint Scores:".bold());
        for score in &validation.soft_scores {
            let pct = if score.max_score > 0.0 {
                (score.score / score.max_score) * 100.0
            } else {
                100.0
            };
            println!("  {}: {:.1}% ({})", score.constraint, pct, score.details);
        }

        println!("\n{}", "Statistics:".bold());
        println!("  Sessions:    {}", validation.statistics.total_sessions);
        println!("  Exams:       {}", validation.statistics.total_exams);
        println!("  Assignments: {}", validation.statistics.total_assignments);
        println!("  Teachers:    {}", validation.statistics.teachers_used);
    }

    println!("\nOverall Score: {:.1}/100", validation.total_score);

    Ok(())
}

fn run_report(schedule_path: &PathBuf, data: &PathBuf, teacher: Option<String>) -> Result<()> {
    let input = load_input_from_dir(data)?;

    let schedule_json = std::fs::read_to_string(schedule_path)?;
    let schedule: invigilation_scheduler::types::Schedule = serde_json::from_str(&schedule_json)?;

    if let Some(teacher_id) = teacher {
        let id = TeacherId(teacher_id);
        match generate_teacher_schedule(&schedule, &input, &id) {
            Some(report) => println!("{}", report),
            None => println!("Teacher not found"),
        }
    } else {
        let validation = validate_schedule(&schedule, &input);
        print_summary(&schedule, &validation);
    }

    Ok(())
}

fn parse_formats(format: &str) -> Vec<OutputFormat> {
    if format == "all" {
        return vec![OutputFormat::Json, OutputFormat::Markdown, OutputFormat::Text];
    }

    format
        .split(',')
        .filter_map(|f| match f.trim().to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            "text" | "txt" => Some(OutputFormat::Text),
            _ => None,
        })
        .collect()
}

fn create_demo_data(path: &PathBuf) -> Result<()> {
    std::fs::create_dir_all(path)?;

    // Teachers
    let teachers = serde_json::json!([
        {"id": "t001", "name": "A. Haddad", "grade_code": "PR", "external_code": "ENS-014", "eligible": true},
        {"id": "t002", "name": "S. Mansour", "grade_code": "PR", "external_code": "ENS-022", "eligible": true},
        {"id": "t003", "name": "R. Ben Salah", "grade_code": "MC", "external_code": "ENS-031", "eligible": true},
        {"id": "t004", "name": "N. Gharbi", "grade_code": "MC", "external_code": "ENS-035", "eligible": true},
        {"id": "t005", "name": "L. Trabelsi", "grade_code": "MC", "external_code": "ENS-040", "eligible": true},
        {"id": "t006", "name": "M. Jlassi", "grade_code": "AS", "external_code": "ENS-052", "eligible": true},
        {"id": "t007", "name": "H. Ayari", "grade_code": "AS", "external_code": "ENS-057", "eligible": true},
        {"id": "t008", "name": "K. Bouzid", "grade_code": "AS", "external_code": "ENS-063", "eligible": true},
        {"id": "t009", "name": "F. Chaabane", "grade_code": "PR", "external_code": "ENS-070", "eligible": false}
    ]);
    std::fs::write(
        path.join("teachers.json"),
        serde_json::to_string_pretty(&teachers)?,
    )?;

    // Grade quotas
    let grades = serde_json::json!([
        {"grade_code": "PR", "label": "Professeur", "quota": 2},
        {"grade_code": "MC", "label": "Maitre de conferences", "quota": 3},
        {"grade_code": "AS", "label": "Assistant", "quota": 4}
    ]);
    std::fs::write(
        path.join("grades.json"),
        serde_json::to_string_pretty(&grades)?,
    )?;

    // Exams: three days, morning-heavy, a few responsible teachers
    let exams = serde_json::json!([
        {"id": "ex01", "date": "2025-06-10", "start_time": "08:30:00", "end_time": "10:00:00", "semester": "SEMESTRE 2", "session_type": "Principale", "room": "A101", "responsible_external_code": "ENS-031"},
        {"id": "ex02", "date": "2025-06-10", "start_time": "08:30:00", "end_time": "10:00:00", "semester": "SEMESTRE 2", "session_type": "Principale", "room": "A102"},
        {"id": "ex03", "date": "2025-06-10", "start_time": "10:30:00", "end_time": "12:00:00", "semester": "SEMESTRE 2", "session_type": "Principale", "room": "A101", "responsible_external_code": "ENS-052"},
        {"id": "ex04", "date": "2025-06-10", "start_time": "10:30:00", "end_time": "12:00:00", "semester": "SEMESTRE 2", "session_type": "Principale", "room": "B201"},
        {"id": "ex05", "date": "2025-06-11", "start_time": "08:30:00", "end_time": "10:00:00", "semester": "SEMESTRE 2", "session_type": "Principale", "room": "A101"},
        {"id": "ex06", "date": "2025-06-11", "start_time": "08:30:00", "end_time": "10:00:00", "semester": "SEMESTRE 2", "session_type": "Principale", "room": "A103", "responsible_external_code": "ENS-040"},
        {"id": "ex07", "date": "2025-06-11", "start_time": "12:30:00", "end_time": "14:00:00", "semester": "SEMESTRE 2", "session_type": "Principale", "room": "B201"},
        {"id": "ex08", "date": "2025-06-12", "start_time": "08:30:00", "end_time": "10:00:00", "semester": "SEMESTRE 2", "session_type": "Principale", "room": "A101"},
        {"id": "ex09", "date": "2025-06-12", "start_time": "08:30:00", "end_time": "10:00:00", "semester": "SEMESTRE 2", "session_type": "Principale", "room": "A102", "responsible_external_code": "ENS-057"},
        {"id": "ex10", "date": "2025-06-12", "start_time": "10:30:00", "end_time": "12:00:00", "semester": "SEMESTRE 2", "session_type": "Principale", "room": "A101"}
    ]);
    std::fs::write(
        path.join("exams.json"),
        serde_json::to_string_pretty(&exams)?,
    )?;

    // Wishes (unavailability markers)
    let wishes = serde_json::json!([
        {"teacher_external_code": "ENS-014", "date": "2025-06-10", "slot": "S1"},
        {"teacher_external_code": "ENS-063", "date": "2025-06-12", "slot": "S2"}
    ]);
    std::fs::write(
        path.join("wishes.json"),
        serde_json::to_string_pretty(&wishes)?,
    )?;

    // Solver parameters
    let config = "min_invigilators_per_exam = 2\n\
                  allow_fallback = true\n\
                  honor_wishes = true\n\
                  enable_grouping = true\n\
                  time_budget_s = 60\n\
                  gap = 0.01\n";
    std::fs::write(path.join("config.toml"), config)?;

    println!("{}", "Demo data created successfully!".green());
    Ok(())
}
