use crate::types::{
    Diagnostics, ExternalCode, GradeCode, ScheduleInput, Session, SlotCode, Teacher,
    DEFAULT_GRADE_QUOTA,
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Coverage regime, decided from total quota capacity against ideal demand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageMode {
    /// Every session gets exactly `exams * m` invigilators
    Normal,
    /// Quotas cannot meet demand: sessions get between
    /// `exams * floor_per_exam` and `exams * m` invigilators
    Adaptive { floor_per_exam: u32 },
}

impl CoverageMode {
    /// Pick the regime. `total_quota` is the capacity Q, `ideal_demand` the
    /// demand D = sum over sessions of `exams * m`. Adaptive mode lowers the
    /// per-exam floor proportionally, never below 1.
    pub fn determine(total_quota: u64, ideal_demand: u64, m: u32, allow_fallback: bool) -> Self {
        if allow_fallback && ideal_demand > 0 && total_quota < ideal_demand {
            let floor = ((total_quota * m as u64) / ideal_demand).max(1) as u32;
            CoverageMode::Adaptive {
                floor_per_exam: floor,
            }
        } else {
            CoverageMode::Normal
        }
    }

    pub fn is_adaptive(self) -> bool {
        matches!(self, CoverageMode::Adaptive { .. })
    }
}

/// How a single wish resolved against the session universe
#[derive(Debug, Clone)]
pub enum ResolvedWish {
    /// Known teacher, at least one session on the wished date and slot
    Matched {
        teacher: usize,
        date: NaiveDate,
        slot: SlotCode,
        sessions: Vec<usize>,
    },
    /// Valid wish whose date and slot fall outside the scheduled sessions
    OutOfScope {
        teacher: usize,
        date: NaiveDate,
        slot: SlotCode,
    },
    /// Unknown teacher code or missing date/slot; already warned about
    Skipped,
}

/// Index tables shared by the model builder, the statistics pass and the
/// infeasibility diagnosis. Decision variables are owned by each built
/// model; this context only carries plain data.
pub struct SolverContext<'a> {
    pub input: &'a ScheduleInput,
    pub sessions: Vec<Session>,
    /// Eligible teachers in input order; these are the matrix columns
    pub teachers: Vec<&'a Teacher>,
    /// Quota per matrix column
    pub quotas: Vec<u32>,
    pub mode: CoverageMode,
    /// Wishes resolved against teachers and sessions (empty when wishes are off)
    pub wishes: Vec<ResolvedWish>,
}

impl<'a> SolverContext<'a> {
    pub fn new(input: &'a ScheduleInput, sessions: Vec<Session>, diags: &mut Diagnostics) -> Self {
        let teachers = input.eligible_teachers();
        let quota_map = input.quota_map();

        let mut unconfigured: BTreeSet<&GradeCode> = BTreeSet::new();
        let quotas: Vec<u32> = teachers
            .iter()
            .map(|t| match quota_map.get(&t.grade_code) {
                Some(&q) => q,
                None => {
                    unconfigured.insert(&t.grade_code);
                    DEFAULT_GRADE_QUOTA
                }
            })
            .collect();
        for grade in unconfigured {
            diags.warn(format!(
                "Grade '{}' has no quota configuration, using default of {}",
                grade, DEFAULT_GRADE_QUOTA
            ));
        }

        let m = input.config.min_invigilators_per_exam;
        let total_quota: u64 = quotas.iter().map(|&q| q as u64).sum();
        let ideal_demand: u64 = sessions
            .iter()
            .map(|s| s.exam_count() as u64 * m as u64)
            .sum();

        let mode = CoverageMode::determine(
            total_quota,
            ideal_demand,
            m,
            input.config.allow_fallback,
        );
        match mode {
            CoverageMode::Adaptive { floor_per_exam } => {
                diags.warn(format!(
                    "Adaptive mode: total quota capacity ({}) is below ideal demand ({}); \
                     coverage floor lowered to {} invigilator(s) per exam",
                    total_quota, ideal_demand, floor_per_exam
                ));
            }
            CoverageMode::Normal if total_quota < ideal_demand => {
                diags.warn(format!(
                    "Total quota capacity ({}) is below ideal demand ({}) and fallback is \
                     disabled; the solver must place exactly {} invigilator(s) per exam and \
                     may report the batch infeasible",
                    total_quota, ideal_demand, m
                ));
            }
            CoverageMode::Normal => {}
        }

        let wishes = if input.config.honor_wishes {
            resolve_wishes(input, &sessions, &teachers, diags)
        } else {
            Vec::new()
        };

        Self {
            input,
            sessions,
            teachers,
            quotas,
            mode,
            wishes,
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn teacher_count(&self) -> usize {
        self.teachers.len()
    }

    /// Column index by roster code
    pub fn teacher_by_code(&self) -> HashMap<&ExternalCode, usize> {
        self.teachers
            .iter()
            .enumerate()
            .map(|(idx, t)| (&t.external_code, idx))
            .collect()
    }

    /// Session indices grouped by day index, sessions in builder order
    pub fn sessions_by_day(&self) -> BTreeMap<u32, Vec<usize>> {
        let mut by_day: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (idx, session) in self.sessions.iter().enumerate() {
            by_day.entry(session.key.day_index).or_default().push(idx);
        }
        by_day
    }

    /// Session indices grouped by exam count
    pub fn sessions_by_size(&self) -> BTreeMap<usize, Vec<usize>> {
        let mut by_size: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (idx, session) in self.sessions.iter().enumerate() {
            by_size.entry(session.exam_count()).or_default().push(idx);
        }
        by_size
    }

    /// Eligible-teacher columns grouped by grade
    pub fn teachers_by_grade(&self) -> BTreeMap<&GradeCode, Vec<usize>> {
        let mut by_grade: BTreeMap<&GradeCode, Vec<usize>> = BTreeMap::new();
        for (idx, teacher) in self.teachers.iter().enumerate() {
            by_grade.entry(&teacher.grade_code).or_default().push(idx);
        }
        by_grade
    }
}

/// Match wishes to teacher columns and sessions. Wishes with a missing
/// date or slot, or an unknown roster code, are skipped with a warning.
fn resolve_wishes(
    input: &ScheduleInput,
    sessions: &[Session],
    teachers: &[&Teacher],
    diags: &mut Diagnostics,
) -> Vec<ResolvedWish> {
    let by_code: HashMap<&ExternalCode, usize> = teachers
        .iter()
        .enumerate()
        .map(|(idx, t)| (&t.external_code, idx))
        .collect();

    input
        .wishes
        .iter()
        .map(|wish| {
            let date = match wish.date {
                Some(d) => d,
                None => {
                    diags.warn(format!(
                        "Wish from '{}' has no date, skipping",
                        wish.teacher_external_code
                    ));
                    return ResolvedWish::Skipped;
                }
            };
            let slot = match wish.slot {
                Some(s) => s,
                None => {
                    diags.warn(format!(
                        "Wish from '{}' has no slot, skipping",
                        wish.teacher_external_code
                    ));
                    return ResolvedWish::Skipped;
                }
            };
            let teacher = match by_code.get(&wish.teacher_external_code) {
                Some(&idx) => idx,
                None => {
                    diags.warn(format!(
                        "Wish references unknown or ineligible teacher code '{}', skipping",
                        wish.teacher_external_code
                    ));
                    return ResolvedWish::Skipped;
                }
            };

            let matching: Vec<usize> = sessions
                .iter()
                .enumerate()
                .filter(|(_, s)| s.key.date == date && s.key.slot == slot)
                .map(|(idx, _)| idx)
                .collect();

            if matching.is_empty() {
                ResolvedWish::OutOfScope {
                    teacher,
                    date,
                    slot,
                }
            } else {
                ResolvedWish::Matched {
                    teacher,
                    date,
                    slot,
                    sessions: matching,
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_stays_normal_when_capacity_suffices() {
        assert_eq!(CoverageMode::determine(20, 14, 2, true), CoverageMode::Normal);
        assert_eq!(CoverageMode::determine(14, 14, 2, true), CoverageMode::Normal);
    }

    #[test]
    fn test_mode_stays_normal_without_fallback() {
        assert_eq!(CoverageMode::determine(10, 14, 2, false), CoverageMode::Normal);
    }

    #[test]
    fn test_adaptive_floor_is_proportional() {
        // floor = max(1, Q * m / D)
        assert_eq!(
            CoverageMode::determine(10, 14, 2, true),
            CoverageMode::Adaptive { floor_per_exam: 1 }
        );
        assert_eq!(
            CoverageMode::determine(21, 30, 3, true),
            CoverageMode::Adaptive { floor_per_exam: 2 }
        );
        // Never below one invigilator per exam
        assert_eq!(
            CoverageMode::determine(1, 100, 2, true),
            CoverageMode::Adaptive { floor_per_exam: 1 }
        );
    }
}
