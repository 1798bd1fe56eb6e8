use crate::types::{Schedule, ScheduleInput, TeacherId, DEFAULT_GRADE_QUOTA};
use crate::validator::{SessionTables, SoftScore};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Calculate all soft constraint scores
pub fn calculate_soft_scores(
    schedule: &Schedule,
    input: &ScheduleInput,
    tables: &SessionTables,
) -> Vec<SoftScore> {
    vec![
        score_wish_satisfaction(schedule, input, tables),
        score_day_grouping(schedule, tables),
        score_quota_utilization(schedule, input, tables),
    ]
}

/// Share of valid wishes that ended up respected (out-of-scope counts as
/// respected)
fn score_wish_satisfaction(
    schedule: &Schedule,
    input: &ScheduleInput,
    tables: &SessionTables,
) -> SoftScore {
    let by_code: HashMap<_, _> = input
        .eligible_teachers()
        .into_iter()
        .map(|t| (t.external_code.clone(), t.id.clone()))
        .collect();

    let mut teams: Vec<BTreeSet<&TeacherId>> = vec![BTreeSet::new(); tables.sessions.len()];
    for assignment in &schedule.assignments {
        if let Some(&s) = tables.session_of_exam.get(&assignment.exam_id) {
            teams[s].insert(&assignment.teacher_id);
        }
    }

    let mut total = 0usize;
    let mut respected = 0usize;
    for wish in &input.wishes {
        let (date, slot) = match (wish.date, wish.slot) {
            (Some(date), Some(slot)) => (date, slot),
            _ => continue,
        };
        let teacher_id = match by_code.get(&wish.teacher_external_code) {
            Some(id) => id,
            None => continue,
        };

        total += 1;
        let violated = tables
            .sessions
            .iter()
            .enumerate()
            .filter(|(_, s)| s.key.date == date && s.key.slot == slot)
            .any(|(idx, _)| teams[idx].contains(teacher_id));
        if !violated {
            respected += 1;
        }
    }

    SoftScore {
        constraint: "WishSatisfaction".to_string(),
        score: respected as f64,
        max_score: total as f64,
        details: format!("{}/{} wishes respected", respected, total),
    }
}

/// Share of worked teacher-days holding two or more sessions
fn score_day_grouping(schedule: &Schedule, tables: &SessionTables) -> SoftScore {
    let mut day_of_session: Vec<u32> = Vec::with_capacity(tables.sessions.len());
    for session in &tables.sessions {
        day_of_session.push(session.key.day_index);
    }

    let mut worked: HashMap<&TeacherId, BTreeSet<usize>> = HashMap::new();
    for assignment in &schedule.assignments {
        if let Some(&s) = tables.session_of_exam.get(&assignment.exam_id) {
            worked.entry(&assignment.teacher_id).or_default().insert(s);
        }
    }

    let mut grouped = 0usize;
    let mut isolated = 0usize;
    for sessions in worked.values() {
        let mut per_day: BTreeMap<u32, usize> = BTreeMap::new();
        for &s in sessions {
            *per_day.entry(day_of_session[s]).or_insert(0) += 1;
        }
        for &count in per_day.values() {
            if count >= 2 {
                grouped += 1;
            } else {
                isolated += 1;
            }
        }
    }

    SoftScore {
        constraint: "DayGrouping".to_string(),
        score: grouped as f64,
        max_score: (grouped + isolated) as f64,
        details: format!(
            "{} grouped teacher-day(s), {} isolated",
            grouped, isolated
        ),
    }
}

/// Invigilation duties performed against the quota seats usable by this batch
fn score_quota_utilization(
    schedule: &Schedule,
    input: &ScheduleInput,
    tables: &SessionTables,
) -> SoftScore {
    let quota_map = input.quota_map();
    let capacity: u64 = input
        .eligible_teachers()
        .iter()
        .map(|t| {
            quota_map
                .get(&t.grade_code)
                .copied()
                .unwrap_or(DEFAULT_GRADE_QUOTA) as u64
        })
        .sum();
    let demand: u64 = tables
        .sessions
        .iter()
        .map(|s| s.exam_count() as u64 * input.config.min_invigilators_per_exam as u64)
        .sum();
    let usable = capacity.min(demand);

    let mut duties: BTreeSet<(&TeacherId, usize)> = BTreeSet::new();
    for assignment in &schedule.assignments {
        if let Some(&s) = tables.session_of_exam.get(&assignment.exam_id) {
            duties.insert((&assignment.teacher_id, s));
        }
    }

    SoftScore {
        constraint: "QuotaUtilization".to_string(),
        score: duties.len() as f64,
        max_score: usable as f64,
        details: format!("{} duties over {} usable quota seats", duties.len(), usable),
    }
}
