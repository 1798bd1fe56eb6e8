use crate::scheduler::model::{CoverageMode, ResolvedWish, SolverContext};
use crate::types::Diagnostics;
use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, Variable};
use itertools::Itertools;
use std::collections::HashSet;

/// Stage 2: one boolean decision per (session, eligible teacher) pair,
/// kept as a contiguous matrix indexed `[session][teacher]`
pub fn build_decision_matrix(
    vars: &mut ProblemVariables,
    ctx: &SolverContext,
) -> Vec<Vec<Variable>> {
    (0..ctx.session_count())
        .map(|_| {
            (0..ctx.teacher_count())
                .map(|_| vars.add(variable().binary()))
                .collect()
        })
        .collect()
}

/// Per-teacher load expressions: sessions worked by each column
pub fn load_expressions(ctx: &SolverContext, x: &[Vec<Variable>]) -> Vec<Expression> {
    (0..ctx.teacher_count())
        .map(|t| x.iter().map(|row| Expression::from(row[t])).sum())
        .collect()
}

/// Per-session coverage expressions: teachers selected for each row
pub fn cover_expressions(x: &[Vec<Variable>]) -> Vec<Expression> {
    x.iter()
        .map(|row| row.iter().copied().map(Expression::from).sum())
        .collect()
}

/// Responsible presence: every exam's responsible teacher, when eligible,
/// is pinned to the exam's session. Unresolvable codes only warn; the exam
/// then has no guaranteed responsible seat.
pub fn responsible_presence(
    ctx: &SolverContext,
    x: &[Vec<Variable>],
    diags: &mut Diagnostics,
) -> Vec<Constraint> {
    let by_code = ctx.teacher_by_code();
    let mut pinned: HashSet<(usize, usize)> = HashSet::new();
    let mut constraints = Vec::new();

    for (s, session) in ctx.sessions.iter().enumerate() {
        for &exam_idx in &session.exams {
            let exam = &ctx.input.exams[exam_idx];
            let code = match exam.responsible_external_code.as_ref() {
                Some(code) => code,
                None => continue,
            };

            if let Some(&t) = by_code.get(code) {
                if pinned.insert((s, t)) {
                    constraints.push(constraint!(Expression::from(x[s][t]) == 1.0));
                }
            } else {
                let known_ineligible = ctx
                    .input
                    .teachers
                    .iter()
                    .any(|teacher| &teacher.external_code == code && !teacher.eligible);
                if known_ineligible {
                    diags.warn(format!(
                        "Responsible teacher '{}' does not participate in invigilation \
                         (exam {} on {} at {} in room {})",
                        code, exam.id, exam.date, exam.start_time, exam.room
                    ));
                } else {
                    diags.warn(format!(
                        "Responsible teacher code '{}' not found \
                         (exam {} on {} at {} in room {})",
                        code, exam.id, exam.date, exam.start_time, exam.room
                    ));
                }
            }
        }
    }

    if !constraints.is_empty() {
        diags.info(format!(
            "{} responsible teacher(s) pinned to their sessions",
            constraints.len()
        ));
    }
    constraints
}

/// Inclusive coverage bounds for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageBounds {
    pub lower: u32,
    pub upper: Option<u32>,
    /// Fewer eligible teachers than exams: the lower bound was relaxed
    pub starved: bool,
}

/// Coverage bounds for a session of `n_exams` exams with `teacher_count`
/// eligible teachers available
pub fn coverage_bounds(
    mode: CoverageMode,
    n_exams: u32,
    m: u32,
    teacher_count: u32,
) -> CoverageBounds {
    if teacher_count < n_exams {
        return CoverageBounds {
            lower: teacher_count,
            upper: None,
            starved: true,
        };
    }
    let ideal = n_exams * m;
    match mode {
        CoverageMode::Normal => CoverageBounds {
            lower: ideal,
            upper: Some(ideal),
            starved: false,
        },
        CoverageMode::Adaptive { floor_per_exam } => CoverageBounds {
            lower: n_exams * floor_per_exam,
            upper: Some(ideal),
            starved: false,
        },
    }
}

/// Per-session coverage: exact in normal mode, ranged in adaptive mode,
/// relaxed with a warning when fewer eligible teachers exist than exams
pub fn session_coverage(
    ctx: &SolverContext,
    x: &[Vec<Variable>],
    diags: &mut Diagnostics,
) -> (Vec<Constraint>, Vec<CoverageBounds>) {
    let m = ctx.input.config.min_invigilators_per_exam;
    let teacher_count = ctx.teacher_count() as u32;
    let covers = cover_expressions(x);

    let mut constraints = Vec::new();
    let mut all_bounds = Vec::with_capacity(ctx.session_count());

    for (s, session) in ctx.sessions.iter().enumerate() {
        let n = session.exam_count() as u32;
        let bounds = coverage_bounds(ctx.mode, n, m, teacher_count);

        if bounds.starved {
            diags.warn(format!(
                "Session {}: needs at least {} invigilators (one per exam) but only {} \
                 teachers are eligible",
                session.key, n, teacher_count
            ));
            constraints.push(constraint!(covers[s].clone() >= bounds.lower as f64));
        } else {
            let upper = bounds.upper.expect("non-starved sessions are bounded above");
            if bounds.lower == upper {
                constraints.push(constraint!(covers[s].clone() == upper as f64));
                diags.info(format!(
                    "Session {}: {} exam(s), exactly {} invigilators",
                    session.key, n, upper
                ));
            } else {
                constraints.push(constraint!(covers[s].clone() >= bounds.lower as f64));
                constraints.push(constraint!(covers[s].clone() <= upper as f64));
                diags.info(format!(
                    "Session {}: {} exam(s), between {} and {} invigilators",
                    session.key, n, bounds.lower, upper
                ));
            }
        }
        all_bounds.push(bounds);
    }

    (constraints, all_bounds)
}

/// Grade quota cap plus strict intra-grade load equality, forced against
/// the first teacher of each grade. Infeasible batches are rejected rather
/// than silently unbalanced.
pub fn grade_quota_equality(
    ctx: &SolverContext,
    loads: &[Expression],
    diags: &mut Diagnostics,
) -> Vec<Constraint> {
    let mut constraints = Vec::new();

    for (grade, columns) in ctx.teachers_by_grade() {
        let quota = ctx.quotas[columns[0]];
        diags.info(format!(
            "Grade {}: {} teacher(s), quota max {} session(s) each",
            grade,
            columns.len(),
            quota
        ));

        for &t in &columns {
            constraints.push(constraint!(loads[t].clone() <= quota as f64));
        }

        let representative = columns[0];
        for &t in &columns[1..] {
            let diff = loads[t].clone() - loads[representative].clone();
            constraints.push(constraint!(diff == 0.0));
        }
    }

    constraints
}

/// Coverage difference tolerated between two sessions with `n_exams` exams
pub fn balance_tolerance(mode: CoverageMode, n_exams: u32, m: u32) -> u32 {
    match mode {
        CoverageMode::Adaptive { .. } => (n_exams * m.saturating_sub(1) / 2)
            .max(n_exams)
            .max(5),
        CoverageMode::Normal => (n_exams / 20).max(2),
    }
}

/// Inter-session balance: sessions with the same exam count stay within a
/// mode-dependent tolerance of one another
pub fn session_balance(
    ctx: &SolverContext,
    x: &[Vec<Variable>],
    diags: &mut Diagnostics,
) -> Vec<Constraint> {
    let m = ctx.input.config.min_invigilators_per_exam;
    let covers = cover_expressions(x);
    let mut constraints = Vec::new();

    for (size, group) in ctx.sessions_by_size() {
        if group.len() < 2 {
            continue;
        }
        let tolerance = balance_tolerance(ctx.mode, size as u32, m);
        diags.info(format!(
            "Balance: {} sessions with {} exam(s), tolerance +/-{} invigilators",
            group.len(),
            size,
            tolerance
        ));

        for (&a, &b) in group.iter().tuple_combinations() {
            let forward = covers[a].clone() - covers[b].clone();
            constraints.push(constraint!(forward <= tolerance as f64));
            let backward = covers[b].clone() - covers[a].clone();
            constraints.push(constraint!(backward <= tolerance as f64));
        }
    }

    constraints
}

/// Forbid working exactly the first and last session of a 3+-session day
/// with nothing in between: x[first] + x[last] <= 1 + sum(middle)
pub fn day_anti_isolation(
    ctx: &SolverContext,
    x: &[Vec<Variable>],
    diags: &mut Diagnostics,
) -> Vec<Constraint> {
    let mut constraints = Vec::new();

    for (_day, mut session_idxs) in ctx.sessions_by_day() {
        if session_idxs.len() < 3 {
            continue;
        }
        session_idxs.sort_by_key(|&s| (ctx.sessions[s].key.slot, s));
        let first = session_idxs[0];
        let last = *session_idxs.last().expect("day has sessions");
        let middle = &session_idxs[1..session_idxs.len() - 1];

        for t in 0..ctx.teacher_count() {
            let mut lhs = Expression::from(x[first][t]);
            lhs += Expression::from(x[last][t]);
            for &mid in middle {
                lhs += (-1.0) * x[mid][t];
            }
            constraints.push(constraint!(lhs <= 1.0));
        }
    }

    if !constraints.is_empty() {
        diags.info(format!(
            "{} first+last isolation constraint(s) applied",
            constraints.len()
        ));
    }
    constraints
}

/// Deduplicated (session, teacher) pairs hit by unavailability wishes
pub fn wish_pairs(ctx: &SolverContext) -> Vec<(usize, usize)> {
    let mut seen = HashSet::new();
    let mut pairs = Vec::new();

    for wish in &ctx.wishes {
        if let ResolvedWish::Matched {
            teacher, sessions, ..
        } = wish
        {
            for &s in sessions {
                if seen.insert((s, *teacher)) {
                    pairs.push((s, *teacher));
                }
            }
        }
    }
    pairs
}

/// Indicator variables and linking constraints for the day-grouping bonus
pub struct GroupingArtifacts {
    pub constraints: Vec<Constraint>,
    /// Pre-weighted objective terms, one coefficient per variable
    pub objective_terms: Vec<(f64, Variable)>,
}

/// Day-grouping bonus. For each (teacher, day) with k sessions worked, the
/// contribution is k when k >= 2, -2 when k == 1 and 0 otherwise; with
/// has_any / has_multi / is_isolated indicators this reduces to
/// k - 3 * is_isolated.
pub fn day_grouping(
    vars: &mut ProblemVariables,
    ctx: &SolverContext,
    x: &[Vec<Variable>],
    weight: f64,
) -> GroupingArtifacts {
    let mut constraints = Vec::new();
    let mut objective_terms = Vec::new();

    for (_day, session_idxs) in ctx.sessions_by_day() {
        let day_len = session_idxs.len() as f64;

        for t in 0..ctx.teacher_count() {
            if session_idxs.len() == 1 {
                // A lone session in a day is isolated whenever it is worked
                objective_terms.push((-2.0 * weight, x[session_idxs[0]][t]));
                continue;
            }

            let has_any = vars.add(variable().binary());
            let has_multi = vars.add(variable().binary());
            let is_isolated = vars.add(variable().binary());

            let k: Expression = session_idxs
                .iter()
                .map(|&s| Expression::from(x[s][t]))
                .sum();

            // has_any = 1 exactly when k >= 1
            let mut any_lower = k.clone();
            any_lower += (-1.0) * has_any;
            constraints.push(constraint!(any_lower >= 0.0));
            let mut any_upper = k.clone();
            any_upper += (-day_len) * has_any;
            constraints.push(constraint!(any_upper <= 0.0));

            // has_multi = 1 exactly when k >= 2
            let mut multi_lower = k.clone();
            multi_lower += (-2.0) * has_multi;
            constraints.push(constraint!(multi_lower >= 0.0));
            let mut multi_upper = k.clone();
            multi_upper += (-(day_len - 1.0)) * has_multi;
            constraints.push(constraint!(multi_upper <= 1.0));

            // is_isolated = has_any and not has_multi
            let mut iso_floor = Expression::from(is_isolated);
            iso_floor += (-1.0) * has_any;
            iso_floor += Expression::from(has_multi);
            constraints.push(constraint!(iso_floor >= 0.0));
            let mut iso_any = Expression::from(is_isolated);
            iso_any += (-1.0) * has_any;
            constraints.push(constraint!(iso_any <= 0.0));
            let iso_multi = Expression::from(is_isolated) + Expression::from(has_multi);
            constraints.push(constraint!(iso_multi <= 1.0));

            for &s in &session_idxs {
                objective_terms.push((weight, x[s][t]));
            }
            objective_terms.push((-3.0 * weight, is_isolated));
        }
    }

    GroupingArtifacts {
        constraints,
        objective_terms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_bounds_normal_is_exact() {
        let b = coverage_bounds(CoverageMode::Normal, 5, 2, 30);
        assert_eq!(b.lower, 10);
        assert_eq!(b.upper, Some(10));
        assert!(!b.starved);
    }

    #[test]
    fn test_coverage_bounds_adaptive_is_ranged() {
        let b = coverage_bounds(CoverageMode::Adaptive { floor_per_exam: 1 }, 5, 2, 30);
        assert_eq!(b.lower, 5);
        assert_eq!(b.upper, Some(10));
        assert!(!b.starved);
    }

    #[test]
    fn test_coverage_bounds_starved_relaxes_to_teacher_count() {
        let b = coverage_bounds(CoverageMode::Normal, 8, 2, 3);
        assert_eq!(b.lower, 3);
        assert_eq!(b.upper, None);
        assert!(b.starved);
    }

    #[test]
    fn test_balance_tolerance_normal() {
        // max(2, floor(0.05 * n))
        assert_eq!(balance_tolerance(CoverageMode::Normal, 5, 2), 2);
        assert_eq!(balance_tolerance(CoverageMode::Normal, 40, 2), 2);
        assert_eq!(balance_tolerance(CoverageMode::Normal, 100, 2), 5);
    }

    #[test]
    fn test_balance_tolerance_adaptive() {
        // max(floor(0.5 * n * (m - 1)), n, 5)
        let mode = CoverageMode::Adaptive { floor_per_exam: 1 };
        assert_eq!(balance_tolerance(mode, 2, 2), 5);
        assert_eq!(balance_tolerance(mode, 10, 2), 10);
        assert_eq!(balance_tolerance(mode, 10, 3), 10);
        assert_eq!(balance_tolerance(mode, 12, 4), 18);
    }
}
