use crate::error::Result;
use crate::types::{ExternalCode, ScheduleInput};
use std::collections::{HashMap, HashSet};

/// Validation result with collected errors
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }
}

/// Validate all input data
pub fn validate_input(input: &ScheduleInput) -> Result<ValidationResult> {
    let mut result = ValidationResult::default();

    check_duplicate_ids(input, &mut result);

    if input.exams.is_empty() {
        result.add_error("No exams to plan");
    }
    if input.eligible_teachers().is_empty() {
        result.add_error("No teachers are eligible for invigilation");
    }

    if input.config.min_invigilators_per_exam < 1 {
        result.add_error("min_invigilators_per_exam must be at least 1");
    }
    if !(0.0..=1.0).contains(&input.config.gap) {
        result.add_error("gap must lie in [0, 1]");
    }

    // Teachers whose grade has no quota configuration fall back to a default
    let configured: HashSet<_> = input.grades.iter().map(|g| &g.grade_code).collect();
    let mut unconfigured: Vec<_> = input
        .teachers
        .iter()
        .filter(|t| !configured.contains(&t.grade_code))
        .map(|t| t.grade_code.to_string())
        .collect();
    unconfigured.sort();
    unconfigured.dedup();
    for grade in unconfigured {
        result.add_warning(format!("Grade '{}' has no quota configuration", grade));
    }

    for grade in &input.grades {
        if grade.quota == 0 {
            result.add_warning(format!(
                "Grade '{}' has quota 0; its teachers can never be assigned",
                grade.grade_code
            ));
        }
    }

    // Responsible codes must resolve to an eligible teacher to be enforced
    let eligible_codes: HashMap<&ExternalCode, bool> = input
        .teachers
        .iter()
        .map(|t| (&t.external_code, t.eligible))
        .collect();
    for exam in &input.exams {
        if let Some(code) = &exam.responsible_external_code {
            match eligible_codes.get(code) {
                Some(true) => {}
                Some(false) => result.add_warning(format!(
                    "Exam '{}' responsible '{}' does not participate in invigilation",
                    exam.id, code
                )),
                None => result.add_warning(format!(
                    "Exam '{}' references unknown responsible code '{}'",
                    exam.id, code
                )),
            }
        }
    }

    for wish in &input.wishes {
        if wish.date.is_none() || wish.slot.is_none() {
            result.add_warning(format!(
                "Wish from '{}' is missing its date or slot",
                wish.teacher_external_code
            ));
        }
        if !eligible_codes.contains_key(&wish.teacher_external_code) {
            result.add_warning(format!(
                "Wish references unknown teacher code '{}'",
                wish.teacher_external_code
            ));
        }
    }

    if !result.is_valid() {
        return Err(anyhow::anyhow!(
            "Validation failed with {} errors:\n{}",
            result.errors.len(),
            result.errors.join("\n")
        ));
    }

    Ok(result)
}

fn check_duplicate_ids(input: &ScheduleInput, result: &mut ValidationResult) {
    let mut teacher_ids = HashSet::new();
    let mut external_codes = HashSet::new();
    for teacher in &input.teachers {
        if !teacher_ids.insert(&teacher.id) {
            result.add_error(format!("Duplicate teacher ID: '{}'", teacher.id));
        }
        if !external_codes.insert(&teacher.external_code) {
            result.add_error(format!(
                "Duplicate teacher external code: '{}'",
                teacher.external_code
            ));
        }
    }

    let mut exam_ids = HashSet::new();
    for exam in &input.exams {
        if !exam_ids.insert(&exam.id) {
            result.add_error(format!("Duplicate exam ID: '{}'", exam.id));
        }
    }

    let mut grade_codes = HashSet::new();
    for grade in &input.grades {
        if !grade_codes.insert(&grade.grade_code) {
            result.add_error(format!("Duplicate grade configuration: '{}'", grade.grade_code));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Exam, ExamId, GradeCode, GradeConfig, SolveConfig, Teacher, TeacherId, Wish,
    };
    use chrono::NaiveTime;

    fn valid_input() -> ScheduleInput {
        ScheduleInput {
            teachers: vec![Teacher {
                id: TeacherId("t1".to_string()),
                name: "Teacher".to_string(),
                grade_code: GradeCode("PR".to_string()),
                external_code: ExternalCode("a".to_string()),
                eligible: true,
            }],
            grades: vec![GradeConfig {
                grade_code: GradeCode("PR".to_string()),
                label: "Professeur".to_string(),
                quota: 2,
            }],
            exams: vec![Exam {
                id: ExamId("e1".to_string()),
                date: "2025-06-10".parse().unwrap(),
                start_time: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                semester: "SEMESTRE 1".to_string(),
                session_type: "Principale".to_string(),
                room: "A1".to_string(),
                responsible_external_code: None,
            }],
            wishes: vec![],
            config: SolveConfig {
                min_invigilators_per_exam: 1,
                ..SolveConfig::default()
            },
        }
    }

    #[test]
    fn test_valid_input_passes() {
        let result = validate_input(&valid_input()).unwrap();
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_duplicate_teacher_id_fails() {
        let mut input = valid_input();
        let mut dup = input.teachers[0].clone();
        dup.external_code = ExternalCode("b".to_string());
        input.teachers.push(dup);
        assert!(validate_input(&input).is_err());
    }

    #[test]
    fn test_unknown_responsible_code_warns() {
        let mut input = valid_input();
        input.exams[0].responsible_external_code = Some(ExternalCode("ghost".to_string()));
        let result = validate_input(&input).unwrap();
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("ghost"));
    }

    #[test]
    fn test_incomplete_wish_warns() {
        let mut input = valid_input();
        input.wishes.push(Wish {
            teacher_external_code: ExternalCode("a".to_string()),
            date: None,
            slot: None,
        });
        let result = validate_input(&input).unwrap();
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_no_exams_fails() {
        let mut input = valid_input();
        input.exams.clear();
        assert!(validate_input(&input).is_err());
    }
}
