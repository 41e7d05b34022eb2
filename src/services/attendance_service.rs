use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, NaiveTime};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::auth::classify_id;
use crate::db::repository::{self, ClassRow, StudentRow};
use crate::error::AppError;
use crate::models::{
    AttendancePayload, AttendanceStanding, ClassContext, ClassRoster, CommitMode, Confirmation,
    CourseAttendance, FacultyClasses, Mark, Role, RosterEntry, StudentDashboard, User,
};

/// Server-side rules of record for rosters and attendance.
pub struct AttendanceService {
    db: SqlitePool,
}

impl AttendanceService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn login(&self, user_id: &str) -> Result<User, AppError> {
        let user_id = user_id.trim();
        if classify_id(user_id).is_none() {
            return Err(AppError::BadRequest(
                "Enter a valid 8-digit Student ID or 5-digit Faculty ID".to_string(),
            ));
        }

        repository::find_user(&self.db, user_id)
            .await?
            .and_then(|row| row.into_user())
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn faculty_classes(&self, faculty_id: &str, date: NaiveDate) -> Result<FacultyClasses, AppError> {
        let faculty = repository::find_user(&self.db, faculty_id)
            .await?
            .and_then(|row| row.into_user())
            .filter(|user| user.role == Role::Faculty)
            .ok_or_else(|| AppError::NotFound("Faculty not found".to_string()))?;

        let classes = repository::fetch_classes_for_faculty(&self.db, faculty_id, date).await?;
        Ok(FacultyClasses {
            faculty,
            date,
            classes,
        })
    }

    pub async fn student_dashboard(
        &self,
        student_id: &str,
        date: NaiveDate,
        now: NaiveTime,
    ) -> Result<StudentDashboard, AppError> {
        let user = repository::find_user(&self.db, student_id)
            .await?
            .and_then(|row| row.into_user())
            .filter(|user| user.role == Role::Student)
            .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

        let rows = repository::fetch_student_dashboard(&self.db, student_id, date, now).await?;

        let overall = if rows.enrollments.is_empty() {
            0.0
        } else {
            let total: f64 = rows.enrollments.iter().map(|e| e.attendance_percent).sum();
            (total / rows.enrollments.len() as f64 * 10.0).round() / 10.0
        };
        // Stored per enrollment, identical across a student's courses.
        let cgpa = rows.enrollments.first().map_or(0.0, |e| e.cgpa);

        let courses = rows
            .enrollments
            .into_iter()
            .map(|e| CourseAttendance {
                course_code: e.course_code,
                course_name: e.course_name,
                percent: e.attendance_percent,
            })
            .collect();

        Ok(StudentDashboard {
            user,
            attendance: AttendanceStanding { overall, courses },
            cgpa,
            fee: rows.fee.unwrap_or_default(),
            timetable: rows.remaining_classes,
        })
    }

    pub async fn class_roster(&self, class_id: &str, date: NaiveDate) -> Result<ClassRoster, AppError> {
        let class = self.find_class(class_id).await?;
        let students = repository::fetch_enrolled_students(&self.db, &class.course_code).await?;
        let recorded: HashMap<String, Mark> = repository::fetch_marks(&self.db, class_id, date)
            .await?
            .into_iter()
            .collect();
        let already_recorded = !recorded.is_empty();

        let students = students
            .into_iter()
            .map(|student| {
                let prior_mark = recorded.get(&student.user_id).copied();
                RosterEntry {
                    student_id: student.user_id,
                    display_name: student.name,
                    prior_mark,
                }
            })
            .collect();

        Ok(ClassRoster {
            context: ClassContext {
                class_id: class.id,
                course_code: class.course_code,
                room: class.room,
                start_time: class.start_time,
                end_time: class.end_time,
                session_date: date,
            },
            students,
            already_recorded,
        })
    }

    /// First submission. Rejected with `Conflict` if anything is recorded for the class and date.
    pub async fn record(&self, payload: &AttendancePayload) -> Result<Confirmation, AppError> {
        self.write(payload, CommitMode::Create).await
    }

    /// Replaces an existing record. Rejected with `NotFound` if there is none.
    pub async fn rectify(&self, payload: &AttendancePayload) -> Result<Confirmation, AppError> {
        self.write(payload, CommitMode::Amend).await
    }

    async fn write(&self, payload: &AttendancePayload, mode: CommitMode) -> Result<Confirmation, AppError> {
        let class = self.find_class(&payload.class_id).await?;
        let students = repository::fetch_enrolled_students(&self.db, &class.course_code).await?;
        if students.is_empty() {
            // Nothing would be stored, so the record could never be found again.
            return Err(AppError::BadRequest(format!(
                "Class {} has no enrolled students",
                class.id
            )));
        }
        let absentees = validate_absentees(payload, &students)?;

        let exists = repository::record_exists(&self.db, &class.id, payload.date).await?;
        match mode {
            CommitMode::Create if exists => {
                return Err(AppError::Conflict(format!(
                    "Attendance for class {} on {} is already recorded",
                    class.id, payload.date
                )));
            }
            CommitMode::Amend if !exists => {
                return Err(AppError::NotFound(format!(
                    "No attendance recorded for class {} on {}",
                    class.id, payload.date
                )));
            }
            _ => {}
        }

        let replace = mode == CommitMode::Amend;
        repository::write_attendance(&self.db, &class.id, payload.date, &students, &absentees, replace)
            .await
            .map_err(|e| {
                let duplicate = e
                    .as_database_error()
                    .is_some_and(|db_err| db_err.is_unique_violation());
                if duplicate {
                    warn!("concurrent attendance submission for class {}", class.id);
                    AppError::Conflict(format!(
                        "Attendance for class {} on {} is already recorded",
                        class.id, payload.date
                    ))
                } else {
                    AppError::Database(e)
                }
            })?;

        let verb = if replace { "rectified" } else { "recorded" };
        let total = students.len();
        let absent = absentees.len();
        info!(
            "Attendance {} for class {} on {}: {} students, {} absent",
            verb, class.id, payload.date, total, absent
        );

        Ok(Confirmation {
            message: format!("Attendance {} for {} students ({} absent).", verb, total, absent),
            total_students: total,
            absent_count: absent,
            present_count: total - absent,
        })
    }

    async fn find_class(&self, class_id: &str) -> Result<ClassRow, AppError> {
        repository::find_class(&self.db, class_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Class not found".to_string()))
    }
}

fn validate_absentees<'a>(
    payload: &'a AttendancePayload,
    students: &[StudentRow],
) -> Result<HashSet<&'a str>, AppError> {
    let enrolled: HashSet<&str> = students.iter().map(|s| s.user_id.as_str()).collect();
    let mut absentees = HashSet::with_capacity(payload.absent_student_ids.len());

    for id in &payload.absent_student_ids {
        if !enrolled.contains(id.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Student {} is not enrolled in class {}",
                id, payload.class_id
            )));
        }
        if !absentees.insert(id.as_str()) {
            return Err(AppError::BadRequest(format!("Student {} is listed twice", id)));
        }
    }

    Ok(absentees)
}
