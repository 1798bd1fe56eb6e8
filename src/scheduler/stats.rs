use crate::scheduler::model::{ResolvedWish, SolverContext};
use crate::types::{Diagnostics, GradeLoadStats, ScheduleStats, WishViolation};
use itertools::Itertools;

/// Post-solve accounting: per-teacher loads, per-grade equality check and
/// the respected / violated / out-of-scope classification of every wish
pub fn compute_stats(
    ctx: &SolverContext,
    chosen: &[Vec<usize>],
    diags: &mut Diagnostics,
) -> ScheduleStats {
    let mut loads = vec![0u32; ctx.teacher_count()];
    for selected in chosen {
        for &t in selected {
            loads[t] += 1;
        }
    }

    let per_teacher_load = ctx
        .teachers
        .iter()
        .enumerate()
        .map(|(t, teacher)| (teacher.id.clone(), loads[t]))
        .collect();

    let mut grade_loads = Vec::new();
    for (grade, columns) in ctx.teachers_by_grade() {
        let quota = ctx.quotas[columns[0]];
        let values: Vec<u32> = columns.iter().map(|&t| loads[t]).collect();
        let mean_load = values.iter().sum::<u32>() as f64 / values.len() as f64;
        let equal = values.iter().all_equal();
        grade_loads.push(GradeLoadStats {
            grade_code: grade.clone(),
            teacher_count: columns.len(),
            quota,
            mean_load,
            equal,
        });
    }
    let per_grade_equality_ok = grade_loads.iter().all(|g| g.equal);

    let mut wish_respected = 0;
    let mut wish_violated = 0;
    let mut wish_out_of_scope = 0;
    let mut wish_violations = Vec::new();

    for wish in &ctx.wishes {
        match wish {
            ResolvedWish::Matched {
                teacher,
                date,
                slot,
                sessions,
            } => {
                let assigned = sessions.iter().any(|&s| chosen[s].contains(teacher));
                if assigned {
                    wish_violated += 1;
                    wish_violations.push(WishViolation {
                        teacher_id: ctx.teachers[*teacher].id.clone(),
                        date: *date,
                        slot: *slot,
                    });
                } else {
                    wish_respected += 1;
                }
            }
            ResolvedWish::OutOfScope { .. } => wish_out_of_scope += 1,
            ResolvedWish::Skipped => {}
        }
    }

    let load_min = loads.iter().min().copied().unwrap_or(0);
    let load_max = loads.iter().max().copied().unwrap_or(0);
    let load_mean = if loads.is_empty() {
        0.0
    } else {
        loads.iter().sum::<u32>() as f64 / loads.len() as f64
    };

    diags.info("Solution statistics:");
    diags.info(format!(
        "  load min {} / max {} / mean {:.2} (dispersion {})",
        load_min,
        load_max,
        load_mean,
        load_max - load_min
    ));
    for g in &grade_loads {
        diags.info(format!(
            "  grade {}: {} teacher(s), mean {:.1} session(s) (quota {})",
            g.grade_code, g.teacher_count, g.mean_load, g.quota
        ));
    }
    if per_grade_equality_ok {
        diags.info("  intra-grade load equality holds for every grade");
    } else {
        diags.warn("Intra-grade load inequality detected");
    }
    if wish_respected + wish_violated + wish_out_of_scope > 0 {
        diags.info(format!(
            "  wishes: {} respected, {} violated, {} out of scope",
            wish_respected, wish_violated, wish_out_of_scope
        ));
    }

    ScheduleStats {
        per_teacher_load,
        grade_loads,
        per_grade_equality_ok,
        wish_respected,
        wish_violated,
        wish_out_of_scope,
        wish_violations,
        session_count: ctx.session_count(),
        exam_count: ctx.input.exams.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::session_builder::build_sessions;
    use crate::types::{
        Exam, ExamId, ExternalCode, GradeCode, GradeConfig, ScheduleInput, SlotCode, SolveConfig,
        Teacher, TeacherId, Wish,
    };
    use chrono::NaiveTime;

    fn teacher(id: &str, grade: &str, code: &str) -> Teacher {
        Teacher {
            id: TeacherId(id.to_string()),
            name: id.to_string(),
            grade_code: GradeCode(grade.to_string()),
            external_code: ExternalCode(code.to_string()),
            eligible: true,
        }
    }

    fn exam(id: &str, date: &str, hour: u32) -> Exam {
        Exam {
            id: ExamId(id.to_string()),
            date: date.parse().unwrap(),
            start_time: NaiveTime::from_hms_opt(hour, 30, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(hour + 2, 0, 0).unwrap(),
            semester: "SEMESTRE 1".to_string(),
            session_type: "Principale".to_string(),
            room: "A1".to_string(),
            responsible_external_code: None,
        }
    }

    fn grade(code: &str, quota: u32) -> GradeConfig {
        GradeConfig {
            grade_code: GradeCode(code.to_string()),
            label: code.to_string(),
            quota,
        }
    }

    #[test]
    fn test_loads_and_wish_classification() {
        let input = ScheduleInput {
            teachers: vec![teacher("t1", "PR", "a"), teacher("t2", "PR", "b")],
            grades: vec![grade("PR", 2)],
            exams: vec![exam("e1", "2025-06-10", 8), exam("e2", "2025-06-10", 10)],
            wishes: vec![
                // t1 is unavailable for the S1 slot; classification depends on the pick
                Wish {
                    teacher_external_code: ExternalCode("a".to_string()),
                    date: Some("2025-06-10".parse().unwrap()),
                    slot: Some(SlotCode::S1),
                },
                // Out of scope: nothing scheduled on this date
                Wish {
                    teacher_external_code: ExternalCode("b".to_string()),
                    date: Some("2025-06-20".parse().unwrap()),
                    slot: Some(SlotCode::S1),
                },
            ],
            config: SolveConfig::default(),
        };

        let sessions = build_sessions(&input.exams);
        let mut diags = Diagnostics::new();
        let ctx = SolverContext::new(&input, sessions, &mut diags);

        // Session 0 is S1, session 1 is S2. Assign t2 to S1, both to S2.
        let chosen = vec![vec![1], vec![0, 1]];
        let stats = compute_stats(&ctx, &chosen, &mut diags);

        assert_eq!(stats.per_teacher_load[&TeacherId("t1".to_string())], 1);
        assert_eq!(stats.per_teacher_load[&TeacherId("t2".to_string())], 2);
        assert_eq!(stats.wish_respected, 1);
        assert_eq!(stats.wish_violated, 0);
        assert_eq!(stats.wish_out_of_scope, 1);
        assert!((stats.wish_respect_ratio() - 1.0).abs() < f64::EPSILON);
        // Loads 1 and 2 for the same grade: equality check must fail
        assert!(!stats.per_grade_equality_ok);
    }

    #[test]
    fn test_violated_wish_is_recorded() {
        let input = ScheduleInput {
            teachers: vec![teacher("t1", "PR", "a")],
            grades: vec![grade("PR", 1)],
            exams: vec![exam("e1", "2025-06-10", 8)],
            wishes: vec![Wish {
                teacher_external_code: ExternalCode("a".to_string()),
                date: Some("2025-06-10".parse().unwrap()),
                slot: Some(SlotCode::S1),
            }],
            config: SolveConfig::default(),
        };

        let sessions = build_sessions(&input.exams);
        let mut diags = Diagnostics::new();
        let ctx = SolverContext::new(&input, sessions, &mut diags);

        let chosen = vec![vec![0]];
        let stats = compute_stats(&ctx, &chosen, &mut diags);

        assert_eq!(stats.wish_violated, 1);
        assert_eq!(stats.wish_violations.len(), 1);
        assert_eq!(stats.wish_violations[0].teacher_id, TeacherId("t1".to_string()));
        assert_eq!(stats.wish_violations[0].slot, SlotCode::S1);
        assert!(stats.per_grade_equality_ok);
    }
}
