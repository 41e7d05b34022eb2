use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::User;

/// Standing of one student: attendance per course, CGPA, fees and what is
/// left of today's timetable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentDashboard {
    pub user: User,
    pub attendance: AttendanceStanding,
    pub cgpa: f64,
    pub fee: FeeStatus,
    pub timetable: Vec<TimetableSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceStanding {
    /// Mean of the course percentages, one decimal.
    pub overall: f64,
    pub courses: Vec<CourseAttendance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseAttendance {
    pub course_code: String,
    pub course_name: String,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FeeStatus {
    pub amount: f64,
    pub status: String,
    pub due_date: Option<String>,
}

impl Default for FeeStatus {
    fn default() -> Self {
        Self {
            amount: 0.0,
            status: "NIL".to_string(),
            due_date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TimetableSlot {
    pub class_id: String,
    pub course_code: String,
    pub course_name: String,
    pub start_time: String,
    pub end_time: String,
    pub room: String,
}
