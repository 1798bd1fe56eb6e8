use crate::error::{Result, SchedulerError};
use crate::types::{Exam, GradeConfig, ScheduleInput, SolveConfig, Teacher, Wish};
use std::fs;
use std::path::Path;

/// Load all input data from a directory
pub fn load_input_from_dir(dir: &Path) -> Result<ScheduleInput> {
    let teachers = load_teachers(&dir.join("teachers.json"))?;
    let grades = load_grades(&dir.join("grades.json"))?;
    let exams = load_exams(&dir.join("exams.json"))?;
    let wishes = load_wishes_or_default(&dir.join("wishes.json"))?;
    let config = load_config_or_default(&dir.join("config.toml"));

    Ok(ScheduleInput {
        teachers,
        grades,
        exams,
        wishes,
        config,
    })
}

/// Load teachers from JSON file
pub fn load_teachers(path: &Path) -> Result<Vec<Teacher>> {
    load_json_file(path)
}

/// Load grade quota configurations from JSON file
pub fn load_grades(path: &Path) -> Result<Vec<GradeConfig>> {
    load_json_file(path)
}

/// Load exams from JSON file
pub fn load_exams(path: &Path) -> Result<Vec<Exam>> {
    load_json_file(path)
}

/// Load wishes from JSON file; a missing file simply means no wishes
pub fn load_wishes_or_default(path: &Path) -> Result<Vec<Wish>> {
    if path.exists() {
        load_json_file(path)
    } else {
        Ok(Vec::new())
    }
}

/// Load solve parameters from TOML file, or use defaults
pub fn load_config_or_default(path: &Path) -> SolveConfig {
    if path.exists() {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => SolveConfig::default(),
        }
    } else {
        SolveConfig::default()
    }
}

/// Generic JSON file loader
fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let path_str = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| SchedulerError::FileRead {
        path: path_str.clone(),
        source: e,
    })?;

    serde_json::from_str(&content).map_err(|e| {
        SchedulerError::JsonParse {
            file: path_str,
            message: e.to_string(),
        }
        .into()
    })
}
