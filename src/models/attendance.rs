use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Body of both the create and the amend call. Present students are never listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendancePayload {
    pub class_id: String,
    pub date: NaiveDate,
    #[serde(rename = "absentees", default)]
    pub absent_student_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub message: String,
    pub total_students: usize,
    pub absent_count: usize,
    pub present_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitMode {
    /// First submission for the class and date.
    Create,
    /// Replace an existing record.
    Amend,
}
