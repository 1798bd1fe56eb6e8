use crate::scheduler::{balance_tolerance, coverage_bounds};
use crate::types::{GradeCode, Schedule, ScheduleInput, Teacher, TeacherId, DEFAULT_GRADE_QUOTA};
use crate::validator::{SessionTables, Severity, Violation};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Distinct sessions worked by each teacher
fn teacher_session_sets(
    schedule: &Schedule,
    tables: &SessionTables,
) -> BTreeMap<TeacherId, BTreeSet<usize>> {
    let mut map: BTreeMap<TeacherId, BTreeSet<usize>> = BTreeMap::new();
    for assignment in &schedule.assignments {
        if let Some(&s) = tables.session_of_exam.get(&assignment.exam_id) {
            map.entry(assignment.teacher_id.clone()).or_default().insert(s);
        }
    }
    map
}

/// Distinct teachers selected for each session
fn session_teacher_sets(schedule: &Schedule, tables: &SessionTables) -> Vec<BTreeSet<TeacherId>> {
    let mut sets = vec![BTreeSet::new(); tables.sessions.len()];
    for assignment in &schedule.assignments {
        if let Some(&s) = tables.session_of_exam.get(&assignment.exam_id) {
            sets[s].insert(assignment.teacher_id.clone());
        }
    }
    sets
}

fn quota_for(input: &ScheduleInput, grade: &GradeCode) -> u32 {
    input
        .quota_map()
        .get(grade)
        .copied()
        .unwrap_or(DEFAULT_GRADE_QUOTA)
}

/// All eligible teachers of a grade carry the same load
pub fn check_grade_equality(
    schedule: &Schedule,
    input: &ScheduleInput,
    tables: &SessionTables,
) -> Vec<Violation> {
    let loads = teacher_session_sets(schedule, tables);
    let mut by_grade: BTreeMap<&GradeCode, Vec<(&Teacher, usize)>> = BTreeMap::new();
    for teacher in input.eligible_teachers() {
        let load = loads.get(&teacher.id).map(|s| s.len()).unwrap_or(0);
        by_grade.entry(&teacher.grade_code).or_default().push((teacher, load));
    }

    let mut violations = Vec::new();
    for (grade, members) in by_grade {
        let reference = members[0].1;
        if members.iter().any(|&(_, load)| load != reference) {
            let detail: Vec<String> = members
                .iter()
                .map(|(t, load)| format!("{}={}", t.id, load))
                .collect();
            violations.push(Violation {
                constraint: "GradeEquality".to_string(),
                message: format!("Unequal loads in grade '{}': {}", grade, detail.join(", ")),
                severity: Severity::Error,
            });
        }
    }
    violations
}

/// No teacher exceeds the quota of their grade
pub fn check_quota_caps(
    schedule: &Schedule,
    input: &ScheduleInput,
    tables: &SessionTables,
) -> Vec<Violation> {
    let loads = teacher_session_sets(schedule, tables);
    let mut violations = Vec::new();

    for teacher in input.eligible_teachers() {
        let load = loads.get(&teacher.id).map(|s| s.len()).unwrap_or(0);
        let quota = quota_for(input, &teacher.grade_code);
        if load as u32 > quota {
            violations.push(Violation {
                constraint: "QuotaCap".to_string(),
                message: format!(
                    "Teacher '{}' works {} sessions, quota for grade '{}' is {}",
                    teacher.id, load, teacher.grade_code, quota
                ),
                severity: Severity::Error,
            });
        }
    }
    violations
}

/// Every session holds a team within its coverage bounds
pub fn check_coverage(
    schedule: &Schedule,
    input: &ScheduleInput,
    tables: &SessionTables,
) -> Vec<Violation> {
    let m = input.config.min_invigilators_per_exam;
    let teacher_count = input.eligible_teachers().len() as u32;
    let teams = session_teacher_sets(schedule, tables);
    let mut violations = Vec::new();

    for (s, session) in tables.sessions.iter().enumerate() {
        let bounds = coverage_bounds(tables.mode, session.exam_count() as u32, m, teacher_count);
        let count = teams[s].len() as u32;
        if count < bounds.lower {
            violations.push(Violation {
                constraint: "Coverage".to_string(),
                message: format!(
                    "Session {}: {} invigilator(s), required at least {}",
                    session.key, count, bounds.lower
                ),
                severity: Severity::Error,
            });
        }
        if let Some(upper) = bounds.upper {
            if count > upper {
                violations.push(Violation {
                    constraint: "Coverage".to_string(),
                    message: format!(
                        "Session {}: {} invigilator(s), allowed at most {}",
                        session.key, count, upper
                    ),
                    severity: Severity::Error,
                });
            }
        }
    }
    violations
}

/// Every resolvable responsible teacher invigilates their own exam
pub fn check_responsible_presence(schedule: &Schedule, input: &ScheduleInput) -> Vec<Violation> {
    let by_code: HashMap<_, _> = input
        .eligible_teachers()
        .into_iter()
        .map(|t| (t.external_code.clone(), t.id.clone()))
        .collect();

    let mut violations = Vec::new();
    for exam in &input.exams {
        let code = match exam.responsible_external_code.as_ref() {
            Some(code) => code,
            None => continue,
        };
        let teacher_id = match by_code.get(code) {
            Some(id) => id,
            // Unresolvable codes are a warning at solve time, not a violation
            None => continue,
        };

        let present = schedule
            .assignments_for_exam(&exam.id)
            .iter()
            .any(|a| &a.teacher_id == teacher_id && a.is_responsible);
        if !present {
            violations.push(Violation {
                constraint: "ResponsiblePresence".to_string(),
                message: format!(
                    "Exam '{}': responsible teacher '{}' is not on the invigilation team",
                    exam.id, teacher_id
                ),
                severity: Severity::Error,
            });
        }
    }
    violations
}

/// No assignment references an ineligible or unknown teacher
pub fn check_ineligible_assignments(schedule: &Schedule, input: &ScheduleInput) -> Vec<Violation> {
    let teachers: HashMap<_, _> = input.teachers.iter().map(|t| (&t.id, t)).collect();
    let mut flagged = BTreeSet::new();
    let mut violations = Vec::new();

    for assignment in &schedule.assignments {
        if !flagged.insert(&assignment.teacher_id) {
            continue;
        }
        match teachers.get(&assignment.teacher_id) {
            Some(teacher) if teacher.eligible => {}
            Some(_) => violations.push(Violation {
                constraint: "NoIneligibleAssignment".to_string(),
                message: format!(
                    "Teacher '{}' is assigned but does not participate in invigilation",
                    assignment.teacher_id
                ),
                severity: Severity::Error,
            }),
            None => violations.push(Violation {
                constraint: "NoIneligibleAssignment".to_string(),
                message: format!("Assignment references unknown teacher '{}'", assignment.teacher_id),
                severity: Severity::Error,
            }),
        }
    }
    violations
}

/// No teacher works exactly the first and last session of a 3+-session day
pub fn check_day_isolation(
    schedule: &Schedule,
    _input: &ScheduleInput,
    tables: &SessionTables,
) -> Vec<Violation> {
    let worked = teacher_session_sets(schedule, tables);

    let mut by_day: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (idx, session) in tables.sessions.iter().enumerate() {
        by_day.entry(session.key.day_index).or_default().push(idx);
    }

    let mut violations = Vec::new();
    for (day, mut session_idxs) in by_day {
        if session_idxs.len() < 3 {
            continue;
        }
        session_idxs.sort_by_key(|&s| (tables.sessions[s].key.slot, s));
        let first = session_idxs[0];
        let last = *session_idxs.last().expect("day has sessions");
        let day_sessions: BTreeSet<usize> = session_idxs.iter().copied().collect();

        for (teacher_id, sessions) in &worked {
            let on_day: BTreeSet<usize> = sessions.intersection(&day_sessions).copied().collect();
            if on_day == BTreeSet::from([first, last]) {
                violations.push(Violation {
                    constraint: "DayAntiIsolation".to_string(),
                    message: format!(
                        "Teacher '{}' works only the first and last session of day {}",
                        teacher_id, day
                    ),
                    severity: Severity::Error,
                });
            }
        }
    }
    violations
}

/// Same-size sessions stay within the balance tolerance of one another
pub fn check_session_balance(
    schedule: &Schedule,
    input: &ScheduleInput,
    tables: &SessionTables,
) -> Vec<Violation> {
    let m = input.config.min_invigilators_per_exam;
    let teams = session_teacher_sets(schedule, tables);

    let mut by_size: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, session) in tables.sessions.iter().enumerate() {
        by_size.entry(session.exam_count()).or_default().push(idx);
    }

    let mut violations = Vec::new();
    for (size, group) in by_size {
        if group.len() < 2 {
            continue;
        }
        let tolerance = balance_tolerance(tables.mode, size as u32, m) as i64;
        for i in 0..group.len() {
            for j in (i + 1)..group.len() {
                let a = teams[group[i]].len() as i64;
                let b = teams[group[j]].len() as i64;
                if (a - b).abs() > tolerance {
                    violations.push(Violation {
                        constraint: "SessionBalance".to_string(),
                        message: format!(
                            "Sessions {} and {} ({} exams each) differ by {} invigilators, tolerance {}",
                            tables.sessions[group[i]].key,
                            tables.sessions[group[j]].key,
                            size,
                            (a - b).abs(),
                            tolerance
                        ),
                        severity: Severity::Error,
                    });
                }
            }
        }
    }
    violations
}

/// Every exam of a session receives the same set of teachers
pub fn check_assignment_duplication(
    schedule: &Schedule,
    input: &ScheduleInput,
    tables: &SessionTables,
) -> Vec<Violation> {
    let mut per_exam: HashMap<&crate::types::ExamId, BTreeSet<&TeacherId>> = HashMap::new();
    for assignment in &schedule.assignments {
        per_exam
            .entry(&assignment.exam_id)
            .or_default()
            .insert(&assignment.teacher_id);
    }

    let empty = BTreeSet::new();
    let mut violations = Vec::new();
    for session in &tables.sessions {
        let mut reference: Option<(&crate::types::ExamId, &BTreeSet<&TeacherId>)> = None;
        for &exam_idx in &session.exams {
            let exam_id = &input.exams[exam_idx].id;
            let team = per_exam.get(exam_id).unwrap_or(&empty);
            match reference {
                None => reference = Some((exam_id, team)),
                Some((ref_exam, ref_team)) => {
                    if team != ref_team {
                        violations.push(Violation {
                            constraint: "AssignmentDuplication".to_string(),
                            message: format!(
                                "Exams '{}' and '{}' share session {} but have different teams",
                                ref_exam, exam_id, session.key
                            ),
                            severity: Severity::Error,
                        });
                    }
                }
            }
        }
    }
    violations
}
