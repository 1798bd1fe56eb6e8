use crate::scheduler::constraints::{
    build_decision_matrix, coverage_bounds, day_anti_isolation, day_grouping,
    grade_quota_equality, load_expressions, responsible_presence, session_balance,
    session_coverage, wish_pairs,
};
use crate::scheduler::model::SolverContext;
use crate::scheduler::objective::ObjectiveWeights;
use crate::types::{Assignment, Diagnostics, SolveStatus};
use good_lp::solvers::highs::highs;
use good_lp::{
    constraint, variable, variables, Expression, ResolutionError, Solution, SolverModel, Variable,
};
use std::time::Instant;

/// Outcome of the ILP stage: the chosen teacher columns per session
#[derive(Debug)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    pub chosen: Vec<Vec<usize>>,
}

/// Hard-constraint groups to emit. The infeasibility diagnosis re-tests
/// them cumulatively to locate the blocker.
#[derive(Debug, Clone, Copy)]
struct ConstraintToggles {
    responsible: bool,
    coverage: bool,
    quotas: bool,
    balance: bool,
    anti_isolation: bool,
}

const NO_CONSTRAINTS: ConstraintToggles = ConstraintToggles {
    responsible: false,
    coverage: false,
    quotas: false,
    balance: false,
    anti_isolation: false,
};

/// Stages 2-4: build the full model and run HiGHS within the configured
/// wall-clock and relative-gap budget
pub fn solve_session_assignment(ctx: &SolverContext, diags: &mut Diagnostics) -> SolveOutcome {
    let cfg = &ctx.input.config;
    let weights = ObjectiveWeights::select(ctx.mode, cfg.enable_grouping);
    let workers = num_cpus::get().min(16);

    let mut vars = variables!();
    let x = build_decision_matrix(&mut vars, ctx);
    let loads = load_expressions(ctx, &x);

    let session_count = ctx.session_count() as f64;
    let load_min = vars.add(variable().integer().min(0).max(session_count));
    let load_max = vars.add(variable().integer().min(0).max(session_count));

    let grouping = cfg
        .enable_grouping
        .then(|| day_grouping(&mut vars, ctx, &x, weights.grouping));

    let pairs = wish_pairs(ctx);
    if !pairs.is_empty() {
        diags.info(format!(
            "{} wished-against (session, teacher) pairs penalized",
            pairs.len()
        ));
    }

    // Objective: minimize wish penalty and load dispersion, maximize quota
    // utilization (adaptive mode) and the grouping score
    let mut objective = Expression::default();
    for &(s, t) in &pairs {
        objective += (-weights.wish_penalty) * x[s][t];
    }
    objective += (-weights.dispersion) * load_max;
    objective += weights.dispersion * load_min;
    if weights.utilization > 0.0 {
        for load in &loads {
            objective += weights.utilization * load.clone();
        }
    }
    if let Some(artifacts) = &grouping {
        for &(coefficient, var) in &artifacts.objective_terms {
            objective += coefficient * var;
        }
    }

    let mut model = vars
        .maximise(objective)
        .using(highs)
        .set_option("threads", workers as i32)
        .set_option("parallel", if workers > 1 { "on" } else { "off" })
        .set_option("time_limit", cfg.time_budget_s as f64)
        .set_option("mip_rel_gap", cfg.gap)
        .set_option("presolve", "on")
        .set_option("random_seed", 42)
        .set_option("output_flag", "false");

    // load_min <= load(t) <= load_max keeps the dispersion term honest
    for load in &loads {
        let mut above_min = load.clone();
        above_min += (-1.0) * load_min;
        model.add_constraint(constraint!(above_min >= 0.0));
        let mut below_max = load.clone();
        below_max += (-1.0) * load_max;
        model.add_constraint(constraint!(below_max <= 0.0));
    }

    for c in responsible_presence(ctx, &x, diags) {
        model.add_constraint(c);
    }
    let (coverage_constraints, _bounds) = session_coverage(ctx, &x, diags);
    for c in coverage_constraints {
        model.add_constraint(c);
    }
    for c in grade_quota_equality(ctx, &loads, diags) {
        model.add_constraint(c);
    }
    for c in session_balance(ctx, &x, diags) {
        model.add_constraint(c);
    }
    for c in day_anti_isolation(ctx, &x, diags) {
        model.add_constraint(c);
    }
    if let Some(artifacts) = grouping {
        for c in artifacts.constraints {
            model.add_constraint(c);
        }
    }

    diags.info(format!(
        "Solving: {} workers, {}s budget, {:.1}% relative gap",
        workers,
        cfg.time_budget_s,
        cfg.gap * 100.0
    ));

    let started = Instant::now();
    match model.solve() {
        Ok(solution) => {
            let chosen = extract_chosen(ctx, &x, &solution);
            // A solve that exhausts the wall budget returns the incumbent
            let status = if started.elapsed().as_secs_f64() >= cfg.time_budget_s as f64 {
                SolveStatus::Feasible
            } else {
                SolveStatus::Optimal
            };
            SolveOutcome { status, chosen }
        }
        Err(ResolutionError::Infeasible) => SolveOutcome {
            status: SolveStatus::Infeasible,
            chosen: Vec::new(),
        },
        Err(e) => {
            diags.warn(format!("Solver stopped without a usable solution: {}", e));
            SolveOutcome {
                status: SolveStatus::Unknown,
                chosen: Vec::new(),
            }
        }
    }
}

fn extract_chosen<S: Solution>(
    ctx: &SolverContext,
    x: &[Vec<Variable>],
    solution: &S,
) -> Vec<Vec<usize>> {
    (0..ctx.session_count())
        .map(|s| {
            (0..ctx.teacher_count())
                .filter(|&t| solution.value(x[s][t]) > 0.5)
                .collect()
        })
        .collect()
}

/// Stage 5: fan the chosen teachers of each session out into per-exam
/// assignments, flagging the responsible teacher of each exam
pub fn expand_assignments(ctx: &SolverContext, chosen: &[Vec<usize>]) -> Vec<Assignment> {
    let mut assignments = Vec::new();

    for (s, session) in ctx.sessions.iter().enumerate() {
        for &exam_idx in &session.exams {
            let exam = &ctx.input.exams[exam_idx];
            for &t in &chosen[s] {
                let teacher = ctx.teachers[t];
                assignments.push(Assignment {
                    exam_id: exam.id.clone(),
                    teacher_id: teacher.id.clone(),
                    room: exam.room.clone(),
                    is_responsible: exam.responsible_external_code.as_ref()
                        == Some(&teacher.external_code),
                });
            }
        }
    }

    assignments
}

/// Post-solve check: recount invigilators per session against the required
/// bounds and warn on shortfalls
pub fn verify_session_coverage(
    ctx: &SolverContext,
    chosen: &[Vec<usize>],
    diags: &mut Diagnostics,
) {
    let m = ctx.input.config.min_invigilators_per_exam;
    let teacher_count = ctx.teacher_count() as u32;

    for (s, session) in ctx.sessions.iter().enumerate() {
        let bounds = coverage_bounds(ctx.mode, session.exam_count() as u32, m, teacher_count);
        let assigned = chosen[s].len() as u32;
        if assigned < bounds.lower {
            diags.warn(format!(
                "Session {}: {} invigilator(s) assigned, required at least {}",
                session.key, assigned, bounds.lower
            ));
        }
    }
}

/// Remediation lines attached to every unsolved outcome
pub fn remediation_hints(diags: &mut Diagnostics) {
    diags.info("Suggested remediations:");
    diags.info("  - raise time_budget_s");
    diags.info("  - lower min_invigilators_per_exam");
    diags.info("  - enable allow_fallback to permit reduced coverage");
    diags.info("  - review grade quotas against the number of sessions");
    diags.info("  - check how many teachers are eligible for invigilation");
}

/// Feasibility-only solve of a constraint subset, used by the diagnosis.
/// Emitter warnings are discarded; only the verdict matters here.
fn feasibility_probe(ctx: &SolverContext, toggles: ConstraintToggles) -> bool {
    let mut scratch = Diagnostics::new();
    let mut vars = variables!();
    let x = build_decision_matrix(&mut vars, ctx);
    let loads = load_expressions(ctx, &x);

    let mut model = vars
        .maximise(Expression::default())
        .using(highs)
        .set_option("time_limit", 10.0)
        .set_option("presolve", "on")
        .set_option("output_flag", "false");

    if toggles.responsible {
        for c in responsible_presence(ctx, &x, &mut scratch) {
            model.add_constraint(c);
        }
    }
    if toggles.coverage {
        let (constraints, _) = session_coverage(ctx, &x, &mut scratch);
        for c in constraints {
            model.add_constraint(c);
        }
    }
    if toggles.quotas {
        for c in grade_quota_equality(ctx, &loads, &mut scratch) {
            model.add_constraint(c);
        }
    }
    if toggles.balance {
        for c in session_balance(ctx, &x, &mut scratch) {
            model.add_constraint(c);
        }
    }
    if toggles.anti_isolation {
        for c in day_anti_isolation(ctx, &x, &mut scratch) {
            model.add_constraint(c);
        }
    }

    model.solve().is_ok()
}

/// Progressive re-test of the hard-constraint groups to pinpoint which one
/// makes the batch infeasible, with targeted suggestions
pub fn diagnose_infeasibility(ctx: &SolverContext, diags: &mut Diagnostics) {
    diags.info("Constraint diagnosis (progressive re-test):");

    let with_responsible = ConstraintToggles {
        responsible: true,
        ..NO_CONSTRAINTS
    };
    if !feasibility_probe(ctx, with_responsible) {
        diags.warn("Responsible presence alone is unsatisfiable");
        diags.info(
            "Check that every responsible teacher participates in invigilation and that \
             roster codes are correct",
        );
        return;
    }
    diags.info("  responsible presence: ok");

    let with_coverage = ConstraintToggles {
        coverage: true,
        ..with_responsible
    };
    if !feasibility_probe(ctx, with_coverage) {
        diags.warn("Session coverage cannot be met with the available teachers");
        diags.info(format!(
            "Add eligible teachers or reduce min_invigilators_per_exam (currently {})",
            ctx.input.config.min_invigilators_per_exam
        ));
        return;
    }
    diags.info("  session coverage: ok");

    let with_quotas = ConstraintToggles {
        quotas: true,
        ..with_coverage
    };
    if !feasibility_probe(ctx, with_quotas) {
        diags.warn("Grade quotas and intra-grade equality conflict with the coverage needs");

        let m = ctx.input.config.min_invigilators_per_exam;
        let mut capacity: u64 = 0;
        for (grade, columns) in ctx.teachers_by_grade() {
            let quota = ctx.quotas[columns[0]];
            let grade_capacity = columns.len() as u64 * quota as u64;
            capacity += grade_capacity;
            diags.info(format!(
                "  grade {}: {} teacher(s) x quota {} = capacity {}",
                grade,
                columns.len(),
                quota,
                grade_capacity
            ));
        }
        let demand: u64 = ctx
            .sessions
            .iter()
            .map(|s| s.exam_count() as u64 * m as u64)
            .sum();
        diags.info(format!(
            "  total quota capacity {} against ideal demand {}",
            capacity, demand
        ));

        if capacity < demand {
            diags.info("Raise quotas, add teachers or reduce min_invigilators_per_exam");
        } else {
            diags.info(
                "Capacity suffices on paper; the strict intra-grade equality or the \
                 responsibles' distribution is the blocker. Adjust quotas so each grade's \
                 load divides evenly, or review responsible assignments",
            );
        }
        return;
    }
    diags.info("  grade quotas: ok");

    diags.info(
        "Base constraints are compatible; the conflict involves session balance, \
         anti-isolation or the wish objective. Raise the time budget or disable \
         grouping and retry",
    );
}
