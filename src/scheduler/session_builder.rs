use crate::types::{Exam, Session, SessionKey};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

/// Stage 1: group exams into invigilation sessions.
///
/// Exams are partitioned by (date, slot, semester, session type), ordered by
/// date, then slot (S1 < S2 < S3 < S4), then semester, then session type.
/// Each distinct date receives a 1-based day index in chronological order.
/// Empty input yields an empty list; the caller surfaces the error.
pub fn build_sessions(exams: &[Exam]) -> Vec<Session> {
    // BTreeMap keyed by the sort tuple gives the required stable order
    let mut grouped: BTreeMap<(NaiveDate, u8, String, String), Vec<usize>> = BTreeMap::new();

    for (idx, exam) in exams.iter().enumerate() {
        let key = (
            exam.date,
            exam.slot().index(),
            exam.semester.clone(),
            exam.session_type.clone(),
        );
        grouped.entry(key).or_default().push(idx);
    }

    let mut day_index_of: HashMap<NaiveDate, u32> = HashMap::new();
    let mut sessions = Vec::with_capacity(grouped.len());

    for ((date, _slot_index, semester, session_type), exam_indices) in grouped {
        let next_index = day_index_of.len() as u32 + 1;
        let day_index = *day_index_of.entry(date).or_insert(next_index);
        let slot = exams[exam_indices[0]].slot();

        sessions.push(Session {
            key: SessionKey {
                date,
                slot,
                semester,
                session_type,
                day_index,
            },
            exams: exam_indices,
        });
    }

    sessions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExamId, SlotCode};
    use chrono::NaiveTime;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn make_exam(id: &str, date: &str, start: (u32, u32), semester: &str, session: &str) -> Exam {
        Exam {
            id: ExamId(id.to_string()),
            date: date.parse().unwrap(),
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(start.0 + 1, start.1, 0).unwrap(),
            semester: semester.to_string(),
            session_type: session.to_string(),
            room: "A1".to_string(),
            responsible_external_code: None,
        }
    }

    #[test]
    fn test_empty_input_yields_no_sessions() {
        assert!(build_sessions(&[]).is_empty());
    }

    #[test]
    fn test_groups_same_slot_exams() {
        let exams = vec![
            make_exam("e1", "2025-06-10", (9, 0), "SEMESTRE 1", "Principale"),
            make_exam("e2", "2025-06-10", (8, 45), "SEMESTRE 1", "Principale"),
            make_exam("e3", "2025-06-10", (10, 30), "SEMESTRE 1", "Principale"),
        ];

        let sessions = build_sessions(&exams);
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].key.slot, SlotCode::S1);
        assert_eq!(sessions[0].exam_count(), 2);
        assert_eq!(sessions[1].key.slot, SlotCode::S2);
        assert_eq!(sessions[1].exam_count(), 1);
    }

    #[test]
    fn test_semesters_split_sessions() {
        let exams = vec![
            make_exam("e1", "2025-06-10", (9, 0), "SEMESTRE 1", "Principale"),
            make_exam("e2", "2025-06-10", (9, 0), "SEMESTRE 2", "Principale"),
        ];

        let sessions = build_sessions(&exams);
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].key.semester, "SEMESTRE 1");
        assert_eq!(sessions[1].key.semester, "SEMESTRE 2");
        // Same date, so same day index
        assert_eq!(sessions[0].key.day_index, 1);
        assert_eq!(sessions[1].key.day_index, 1);
    }

    #[test]
    fn test_day_indices_follow_chronology() {
        let exams = vec![
            make_exam("e1", "2025-06-12", (9, 0), "S1", "Principale"),
            make_exam("e2", "2025-06-10", (9, 0), "S1", "Principale"),
            make_exam("e3", "2025-06-11", (9, 0), "S1", "Principale"),
            make_exam("e4", "2025-06-10", (14, 30), "S1", "Principale"),
        ];

        let sessions = build_sessions(&exams);
        assert_eq!(sessions.len(), 4);
        let days: Vec<(String, u32)> = sessions
            .iter()
            .map(|s| (s.key.date.to_string(), s.key.day_index))
            .collect();
        assert_eq!(
            days,
            vec![
                ("2025-06-10".to_string(), 1),
                ("2025-06-10".to_string(), 1),
                ("2025-06-11".to_string(), 2),
                ("2025-06-12".to_string(), 3),
            ]
        );
    }

    #[test]
    fn test_slots_sorted_within_day() {
        let exams = vec![
            make_exam("e1", "2025-06-10", (14, 30), "S1", "Principale"),
            make_exam("e2", "2025-06-10", (8, 30), "S1", "Principale"),
            make_exam("e3", "2025-06-10", (12, 30), "S1", "Principale"),
        ];

        let sessions = build_sessions(&exams);
        let slots: Vec<SlotCode> = sessions.iter().map(|s| s.key.slot).collect();
        assert_eq!(slots, vec![SlotCode::S1, SlotCode::S3, SlotCode::S4]);
    }

    proptest! {
        #[test]
        fn every_exam_lands_in_exactly_one_session(count in 1usize..40) {
            let exams: Vec<Exam> = (0..count)
                .map(|i| make_exam(
                    &format!("e{}", i),
                    &format!("2025-06-{:02}", 1 + i % 5),
                    (8 + (i % 9) as u32, 0),
                    if i % 2 == 0 { "SEMESTRE 1" } else { "SEMESTRE 2" },
                    "Principale",
                ))
                .collect();

            let sessions = build_sessions(&exams);

            let mut seen: HashSet<usize> = HashSet::new();
            for session in &sessions {
                for &exam_idx in &session.exams {
                    prop_assert!(seen.insert(exam_idx), "exam in two sessions");
                }
            }
            prop_assert_eq!(seen.len(), exams.len());

            // Keys are unique and day indices are dense and chronological
            let mut keys = HashSet::new();
            for session in &sessions {
                let key = (
                    session.key.date,
                    session.key.slot,
                    session.key.semester.clone(),
                    session.key.session_type.clone(),
                );
                prop_assert!(keys.insert(key), "duplicate session key");
            }

            let mut last_date = None;
            let mut last_index = 0u32;
            for session in &sessions {
                match last_date {
                    Some(d) if d == session.key.date => {
                        prop_assert_eq!(session.key.day_index, last_index);
                    }
                    Some(d) => {
                        prop_assert!(session.key.date > d);
                        prop_assert_eq!(session.key.day_index, last_index + 1);
                    }
                    None => prop_assert_eq!(session.key.day_index, 1),
                }
                last_date = Some(session.key.date);
                last_index = session.key.day_index;
            }
        }
    }
}
