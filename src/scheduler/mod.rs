mod constraints;
mod model;
mod objective;
mod session_builder;
mod solver;
mod stats;

pub use constraints::{balance_tolerance, coverage_bounds, CoverageBounds};
pub use model::{CoverageMode, ResolvedWish, SolverContext};
pub use objective::ObjectiveWeights;
pub use session_builder::build_sessions;
pub use solver::{expand_assignments, SolveOutcome};
pub use stats::compute_stats;

use crate::error::{Result, SchedulerError};
use crate::types::{Diagnostics, Schedule, ScheduleInput, ScheduleMetadata, SolveStatus};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;

/// Main entry point for invigilation schedule generation
pub fn generate_schedule(input: &ScheduleInput, quiet: bool) -> Result<Schedule> {
    let start_time = Instant::now();

    let cfg = &input.config;
    if cfg.min_invigilators_per_exam < 1 {
        return Err(SchedulerError::InvalidParameter(
            "min_invigilators_per_exam must be at least 1".to_string(),
        )
        .into());
    }
    if !(0.0..=1.0).contains(&cfg.gap) {
        return Err(SchedulerError::InvalidParameter("gap must lie in [0, 1]".to_string()).into());
    }
    if input.exams.is_empty() {
        return Err(SchedulerError::NothingToSchedule("no exams to plan".to_string()).into());
    }
    if input.eligible_teachers().is_empty() {
        return Err(SchedulerError::NothingToSchedule(
            "no teachers are eligible for invigilation".to_string(),
        )
        .into());
    }

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb
    };

    let mut diags = Diagnostics::new();

    // Stage 1: group exams into sessions
    progress.set_message("Grouping exams into sessions...");
    progress.set_position(10);
    let sessions = build_sessions(&input.exams);
    let day_count = sessions.iter().map(|s| s.key.day_index).max().unwrap_or(0);
    diags.info(format!(
        "{} session(s) over {} day(s) from {} exam(s)",
        sessions.len(),
        day_count,
        input.exams.len()
    ));

    // Stage 2: eligibility, quotas, coverage mode and wish resolution
    progress.set_message("Building decision model...");
    progress.set_position(30);
    let ctx = SolverContext::new(input, sessions, &mut diags);

    // Stages 3-4: constraints, objective, solve
    progress.set_message("Solving session assignment (ILP)...");
    progress.set_position(50);
    let outcome = solver::solve_session_assignment(&ctx, &mut diags);

    if !outcome.status.is_solved() {
        if outcome.status == SolveStatus::Infeasible {
            solver::diagnose_infeasibility(&ctx, &mut diags);
        }
        solver::remediation_hints(&mut diags);
        progress.finish_with_message("No schedule produced");

        let mut schedule = Schedule::new(outcome.status);
        schedule.stats.session_count = ctx.session_count();
        schedule.stats.exam_count = input.exams.len();
        schedule.diagnostics = diags;
        schedule.metadata.solve_time_ms = start_time.elapsed().as_millis() as u64;
        return Ok(schedule);
    }

    // Stage 5: expansion and statistics
    progress.set_message("Expanding assignments...");
    progress.set_position(85);
    let assignments = solver::expand_assignments(&ctx, &outcome.chosen);
    solver::verify_session_coverage(&ctx, &outcome.chosen, &mut diags);

    progress.set_message("Computing statistics...");
    progress.set_position(95);
    let stats = compute_stats(&ctx, &outcome.chosen, &mut diags);

    progress.set_position(100);
    progress.finish_with_message("Schedule generated");

    Ok(Schedule {
        status: outcome.status,
        assignments,
        stats,
        diagnostics: diags,
        metadata: ScheduleMetadata {
            generated_at: chrono::Utc::now().to_rfc3339(),
            algorithm_version: env!("CARGO_PKG_VERSION").to_string(),
            score: 0.0, // Calculated by the validator
            solve_time_ms: start_time.elapsed().as_millis() as u64,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Exam, ExamId, ExternalCode, GradeCode, GradeConfig, SlotCode, SolveConfig, Teacher,
        TeacherId, Wish,
    };
    use chrono::NaiveTime;
    use std::collections::BTreeSet;

    fn teacher(id: &str, grade: &str, code: &str) -> Teacher {
        Teacher {
            id: TeacherId(id.to_string()),
            name: format!("Teacher {}", id),
            grade_code: GradeCode(grade.to_string()),
            external_code: ExternalCode(code.to_string()),
            eligible: true,
        }
    }

    fn grade(code: &str, quota: u32) -> GradeConfig {
        GradeConfig {
            grade_code: GradeCode(code.to_string()),
            label: code.to_string(),
            quota,
        }
    }

    fn exam(id: &str, date: &str, hour: u32, minute: u32, responsible: Option<&str>) -> Exam {
        Exam {
            id: ExamId(id.to_string()),
            date: date.parse().unwrap(),
            start_time: NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(hour + 1, 30, 0).unwrap(),
            semester: "SEMESTRE 1".to_string(),
            session_type: "Principale".to_string(),
            room: "A1".to_string(),
            responsible_external_code: responsible.map(|c| ExternalCode(c.to_string())),
        }
    }

    fn config(m: u32, allow_fallback: bool, enable_grouping: bool) -> SolveConfig {
        SolveConfig {
            min_invigilators_per_exam: m,
            allow_fallback,
            honor_wishes: true,
            enable_grouping,
            time_budget_s: 60,
            gap: 0.0,
        }
    }

    #[test]
    fn test_trivial_feasible_batch() {
        // Two teachers, one exam needing both of them
        let input = ScheduleInput {
            teachers: vec![teacher("t1", "G", "a"), teacher("t2", "G", "b")],
            grades: vec![grade("G", 1)],
            exams: vec![exam("e1", "2025-06-10", 9, 0, None)],
            wishes: vec![],
            config: config(2, true, true),
        };

        let schedule = generate_schedule(&input, true).unwrap();

        assert_eq!(schedule.status, SolveStatus::Optimal);
        assert_eq!(schedule.assignments.len(), 2);
        let assigned: BTreeSet<&str> = schedule
            .assignments
            .iter()
            .map(|a| a.teacher_id.0.as_str())
            .collect();
        assert_eq!(assigned, BTreeSet::from(["t1", "t2"]));
        assert_eq!(schedule.stats.per_teacher_load[&TeacherId("t1".to_string())], 1);
        assert_eq!(schedule.stats.per_teacher_load[&TeacherId("t2".to_string())], 1);
        assert_eq!(schedule.stats.wish_respected, 0);
        assert_eq!(schedule.stats.wish_violated, 0);
        assert!(schedule.stats.per_grade_equality_ok);
    }

    #[test]
    fn test_responsible_teacher_is_assigned_and_flagged() {
        // Two exams in one session; one names t2 as responsible. Both
        // teachers are needed, and t2 carries the responsible flag on its
        // own exam only.
        let input = ScheduleInput {
            teachers: vec![teacher("t1", "G", "alpha"), teacher("t2", "G", "beta")],
            grades: vec![grade("G", 2)],
            exams: vec![
                exam("e1", "2025-06-10", 9, 0, Some("beta")),
                exam("e2", "2025-06-10", 9, 15, None),
            ],
            wishes: vec![],
            config: config(1, true, true),
        };

        let schedule = generate_schedule(&input, true).unwrap();

        assert!(schedule.status.is_solved());
        let responsible: Vec<_> = schedule
            .assignments
            .iter()
            .filter(|a| a.is_responsible)
            .collect();
        assert_eq!(responsible.len(), 1);
        assert_eq!(responsible[0].teacher_id, TeacherId("t2".to_string()));
        assert_eq!(responsible[0].exam_id, ExamId("e1".to_string()));

        let load_t1 = schedule.stats.per_teacher_load[&TeacherId("t1".to_string())];
        let load_t2 = schedule.stats.per_teacher_load[&TeacherId("t2".to_string())];
        assert_eq!(load_t1, load_t2);
    }

    #[test]
    fn test_odd_demand_with_strict_equality_is_infeasible() {
        // Five one-exam sessions, two same-grade teachers: equal loads
        // cannot sum to five
        let exams: Vec<Exam> = (0..5)
            .map(|i| {
                exam(
                    &format!("e{}", i),
                    &format!("2025-06-{:02}", 10 + i),
                    9,
                    0,
                    None,
                )
            })
            .collect();
        let input = ScheduleInput {
            teachers: vec![teacher("t1", "G", "a"), teacher("t2", "G", "b")],
            grades: vec![grade("G", 5)],
            exams,
            wishes: vec![],
            config: config(1, true, false),
        };

        let schedule = generate_schedule(&input, true).unwrap();

        assert_eq!(schedule.status, SolveStatus::Infeasible);
        assert!(schedule.assignments.is_empty());
        // Diagnosis and remediation lines are present
        assert!(!schedule.diagnostics.is_empty());
        assert!(schedule
            .diagnostics
            .entries()
            .iter()
            .any(|d| d.message.contains("remediation")));
    }

    #[test]
    fn test_adaptive_mode_uses_all_quota_seats() {
        // Q = 5 teachers x quota 2 = 10 seats, D = 7 exams x m 2 = 14.
        // The proportional floor is 1, so every session gets 1..=2
        // invigilators and utilization drives the total to 10.
        let teachers: Vec<Teacher> = (0..5)
            .map(|i| teacher(&format!("t{}", i), "G", &format!("c{}", i)))
            .collect();
        let hours = [(8, 30), (10, 30), (12, 30), (14, 30)];
        let exams: Vec<Exam> = (0..7)
            .map(|i| {
                let (h, m) = hours[i % 4];
                exam(
                    &format!("e{}", i),
                    if i < 4 { "2025-06-10" } else { "2025-06-11" },
                    h,
                    m,
                    None,
                )
            })
            .collect();
        let input = ScheduleInput {
            teachers,
            grades: vec![grade("G", 2)],
            exams,
            wishes: vec![],
            config: config(2, true, false),
        };

        let schedule = generate_schedule(&input, true).unwrap();

        assert!(schedule.status.is_solved());
        // Sessions each hold one exam, so assignments equal session coverage
        assert_eq!(schedule.assignments.len(), 10);
        for exam_idx in 0..7 {
            let count = schedule
                .assignments
                .iter()
                .filter(|a| a.exam_id == ExamId(format!("e{}", exam_idx)))
                .count();
            assert!((1..=2).contains(&count), "exam e{}: {} invigilators", exam_idx, count);
        }
        for load in schedule.stats.per_teacher_load.values() {
            assert_eq!(*load, 2);
        }
    }

    #[test]
    fn test_first_and_last_session_alone_is_never_produced() {
        // One day, four one-exam sessions, two teachers with quota 2: the
        // only forbidden split is {S1, S4} + {S2, S3}
        let hours = [(8, 30), (10, 30), (12, 30), (14, 30)];
        let exams: Vec<Exam> = hours
            .iter()
            .enumerate()
            .map(|(i, &(h, m))| exam(&format!("e{}", i), "2025-06-10", h, m, None))
            .collect();
        let input = ScheduleInput {
            teachers: vec![teacher("t1", "G", "a"), teacher("t2", "G", "b")],
            grades: vec![grade("G", 2)],
            exams,
            wishes: vec![],
            config: config(1, true, true),
        };

        let schedule = generate_schedule(&input, true).unwrap();

        assert!(schedule.status.is_solved());
        for tid in ["t1", "t2"] {
            let slots: BTreeSet<SlotCode> = schedule
                .assignments
                .iter()
                .filter(|a| a.teacher_id.0 == tid)
                .map(|a| {
                    let idx: usize = a.exam_id.0[1..].parse().unwrap();
                    [SlotCode::S1, SlotCode::S2, SlotCode::S3, SlotCode::S4][idx]
                })
                .collect();
            assert_ne!(
                slots,
                BTreeSet::from([SlotCode::S1, SlotCode::S4]),
                "teacher {} got only the first and last session",
                tid
            );
        }
    }

    #[test]
    fn test_wish_respected_when_alternatives_exist() {
        // t1 is unavailable for the S1 slot; two other teachers can cover
        let input = ScheduleInput {
            teachers: vec![
                teacher("t1", "A", "a"),
                teacher("t2", "B", "b"),
                teacher("t3", "B", "c"),
            ],
            grades: vec![grade("A", 1), grade("B", 1)],
            exams: vec![exam("e1", "2025-06-10", 9, 0, None)],
            wishes: vec![Wish {
                teacher_external_code: ExternalCode("a".to_string()),
                date: Some("2025-06-10".parse().unwrap()),
                slot: Some(SlotCode::S1),
            }],
            config: config(2, true, false),
        };

        let schedule = generate_schedule(&input, true).unwrap();

        assert!(schedule.status.is_solved());
        assert!(schedule
            .assignments
            .iter()
            .all(|a| a.teacher_id != TeacherId("t1".to_string())));
        assert_eq!(schedule.stats.wish_respected, 1);
        assert_eq!(schedule.stats.wish_violated, 0);
    }

    #[test]
    fn test_identical_runs_agree_on_aggregates() {
        let build_input = || ScheduleInput {
            teachers: (0..4)
                .map(|i| teacher(&format!("t{}", i), "G", &format!("c{}", i)))
                .collect(),
            grades: vec![grade("G", 2)],
            exams: vec![
                exam("e0", "2025-06-10", 8, 30, None),
                exam("e1", "2025-06-10", 10, 30, None),
                exam("e2", "2025-06-11", 8, 30, None),
                exam("e3", "2025-06-11", 10, 30, None),
            ],
            wishes: vec![Wish {
                teacher_external_code: ExternalCode("c0".to_string()),
                date: Some("2025-06-10".parse().unwrap()),
                slot: Some(SlotCode::S1),
            }],
            config: config(2, true, true),
        };

        let first = generate_schedule(&build_input(), true).unwrap();
        let second = generate_schedule(&build_input(), true).unwrap();

        assert_eq!(first.status, second.status);
        assert_eq!(first.assignments.len(), second.assignments.len());
        assert_eq!(first.stats.wish_respected, second.stats.wish_respected);
        assert_eq!(first.stats.wish_violated, second.stats.wish_violated);
        assert_eq!(first.stats.wish_out_of_scope, second.stats.wish_out_of_scope);
        assert_eq!(
            first.stats.per_grade_equality_ok,
            second.stats.per_grade_equality_ok
        );
    }

    #[test]
    fn test_empty_inputs_are_rejected() {
        let no_exams = ScheduleInput {
            teachers: vec![teacher("t1", "G", "a")],
            grades: vec![grade("G", 1)],
            exams: vec![],
            wishes: vec![],
            config: config(1, true, true),
        };
        assert!(generate_schedule(&no_exams, true).is_err());

        let mut ineligible = teacher("t1", "G", "a");
        ineligible.eligible = false;
        let no_teachers = ScheduleInput {
            teachers: vec![ineligible],
            grades: vec![grade("G", 1)],
            exams: vec![exam("e1", "2025-06-10", 9, 0, None)],
            wishes: vec![],
            config: config(1, true, true),
        };
        assert!(generate_schedule(&no_teachers, true).is_err());
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        let mut input = ScheduleInput {
            teachers: vec![teacher("t1", "G", "a")],
            grades: vec![grade("G", 1)],
            exams: vec![exam("e1", "2025-06-10", 9, 0, None)],
            wishes: vec![],
            config: config(0, true, true),
        };
        assert!(generate_schedule(&input, true).is_err());

        input.config.min_invigilators_per_exam = 1;
        input.config.gap = 1.5;
        assert!(generate_schedule(&input, true).is_err());
    }

    #[test]
    fn test_unknown_responsible_code_only_warns() {
        let input = ScheduleInput {
            teachers: vec![teacher("t1", "G", "a"), teacher("t2", "G", "b")],
            grades: vec![grade("G", 1)],
            exams: vec![exam("e1", "2025-06-10", 9, 0, Some("ghost"))],
            wishes: vec![],
            config: config(2, true, true),
        };

        let schedule = generate_schedule(&input, true).unwrap();

        assert!(schedule.status.is_solved());
        assert!(schedule
            .diagnostics
            .warnings()
            .any(|d| d.message.contains("ghost")));
        assert!(schedule.assignments.iter().all(|a| !a.is_responsible));
    }
}
