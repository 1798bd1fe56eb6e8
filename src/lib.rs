//! Invigilation Scheduler - Constraint-based exam invigilation schedule generator
//!
//! This library assigns teachers to exam invigilation *sessions* using
//! Integer Linear Programming (ILP) optimization. All exams sharing a
//! (date, slot, semester, session type) form one session and are covered
//! by a single invigilator team.
//!
//! # Algorithm Overview
//!
//! The scheduler works in 5 stages:
//! 1. **Session Building**: Group exams into sessions and index the exam days
//! 2. **Model Building**: One boolean decision per (session, eligible teacher)
//! 3. **Constraints & Objective**: Grade quotas and equality, per-session
//!    coverage, responsible presence, anti-isolation, wish penalties and
//!    grouping bonuses combined into a weighted objective
//! 4. **Solve**: HiGHS with a wall-clock and relative-gap budget
//! 5. **Expansion**: Chosen teachers fan out into per-exam assignments
//!
//! # Example
//!
//! ```no_run
//! use invigilation_scheduler::parser::load_input_from_dir;
//! use invigilation_scheduler::scheduler::generate_schedule;
//! use invigilation_scheduler::validator::validate_schedule;
//! use std::path::Path;
//!
//! let input = load_input_from_dir(Path::new("./data/demo")).unwrap();
//! let schedule = generate_schedule(&input, false).unwrap();
//! let validation = validate_schedule(&schedule, &input);
//! println!("Status: {} Score: {:.1}", schedule.status, validation.total_score);
//! ```

pub mod error;
pub mod parser;
pub mod reporter;
pub mod scheduler;
pub mod types;
pub mod validator;

pub use error::{Result, SchedulerError};
