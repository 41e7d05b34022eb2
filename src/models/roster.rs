use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A student's attendance value for one class on one date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    #[default]
    #[serde(rename = "P")]
    Present,
    #[serde(rename = "A")]
    Absent,
}

impl Mark {
    pub fn toggled(self) -> Self {
        match self {
            Mark::Present => Mark::Absent,
            Mark::Absent => Mark::Present,
        }
    }

    /// Storage code, `P` or `A`.
    pub fn as_code(self) -> &'static str {
        match self {
            Mark::Present => "P",
            Mark::Absent => "A",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "P" => Some(Mark::Present),
            "A" => Some(Mark::Absent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassContext {
    pub class_id: String,
    pub course_code: String,
    pub room: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(rename = "date")]
    pub session_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    #[serde(rename = "userId")]
    pub student_id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    /// Only reported when attendance was already recorded for the date.
    #[serde(rename = "status", default, skip_serializing_if = "Option::is_none")]
    pub prior_mark: Option<Mark>,
}

/// Snapshot returned by the roster endpoint for one class and date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRoster {
    #[serde(rename = "classInfo")]
    pub context: ClassContext,
    pub students: Vec<RosterEntry>,
    #[serde(rename = "alreadyMarked")]
    pub already_recorded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub class_id: String,
    pub course_code: String,
    pub course_name: String,
    pub start_time: String,
    pub end_time: String,
    pub room: String,
    pub day_of_week: String,
    pub attendance_marked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacultyClasses {
    pub faculty: crate::models::User,
    pub date: NaiveDate,
    pub classes: Vec<ClassSummary>,
}
