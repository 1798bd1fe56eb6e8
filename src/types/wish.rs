use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use super::{ExternalCode, SlotCode};

/// A teacher-provided unavailability marker for one date and slot.
///
/// Wishes are soft: assigning against one is penalized in the objective,
/// never forbidden. A wish missing its date or slot is skipped with a
/// warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wish {
    pub teacher_external_code: ExternalCode,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub slot: Option<SlotCode>,
}
