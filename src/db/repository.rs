use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime};
use sqlx::{FromRow, SqlitePool};

use crate::models::{ClassSummary, FeeStatus, Mark, Role, TimetableSlot, User};

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub user_id: String,
    pub name: String,
    pub role: String,
}

impl UserRow {
    pub fn into_user(self) -> Option<User> {
        Some(User {
            role: Role::parse(&self.role)?,
            user_id: self.user_id,
            name: self.name,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ClassRow {
    pub id: String,
    pub course_code: String,
    pub start_time: String,
    pub end_time: String,
    pub room: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct StudentRow {
    pub user_id: String,
    pub name: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct EnrollmentRow {
    pub course_code: String,
    pub course_name: String,
    pub attendance_percent: f64,
    pub cgpa: f64,
}

/// Everything the student dashboard shows, as stored.
#[derive(Debug, Clone)]
pub struct StudentDashboardRows {
    pub enrollments: Vec<EnrollmentRow>,
    pub fee: Option<FeeStatus>,
    pub remaining_classes: Vec<TimetableSlot>,
}

pub async fn find_user(db: &SqlitePool, user_id: &str) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT user_id, name, role FROM users WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(db)
        .await
}

pub async fn find_class(db: &SqlitePool, class_id: &str) -> Result<Option<ClassRow>, sqlx::Error> {
    sqlx::query_as::<_, ClassRow>(
        "SELECT id, course_code, start_time, end_time, room FROM timetable WHERE id = ?"
    )
    .bind(class_id)
    .fetch_optional(db)
    .await
}

pub async fn fetch_enrolled_students(
    db: &SqlitePool,
    course_code: &str,
) -> Result<Vec<StudentRow>, sqlx::Error> {
    sqlx::query_as::<_, StudentRow>(
        r#"
        SELECT u.user_id, u.name
        FROM enrollments e
        JOIN users u ON e.student_id = u.user_id
        WHERE e.course_code = ? AND u.role = 'STUDENT'
        ORDER BY u.name ASC, u.user_id ASC
        "#,
    )
    .bind(course_code)
    .fetch_all(db)
    .await
}

/// Recorded marks for a class and date, keyed by student id.
pub async fn fetch_marks(
    db: &SqlitePool,
    class_id: &str,
    date: NaiveDate,
) -> Result<Vec<(String, Mark)>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, String)>(
        "SELECT student_id, status FROM attendance WHERE class_id = ? AND date = ?",
    )
    .bind(class_id)
    .bind(date.to_string())
    .fetch_all(db)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(student_id, status)| Some((student_id, Mark::from_code(&status)?)))
        .collect())
}

pub async fn record_exists(db: &SqlitePool, class_id: &str, date: NaiveDate) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM attendance WHERE class_id = ? AND date = ?)",
    )
    .bind(class_id)
    .bind(date.to_string())
    .fetch_one(db)
    .await
}

pub async fn fetch_classes_for_faculty(
    db: &SqlitePool,
    faculty_id: &str,
    date: NaiveDate,
) -> Result<Vec<ClassSummary>, sqlx::Error> {
    let day_of_week = date.format("%A").to_string();

    sqlx::query_as::<_, ClassSummary>(
        r#"
        SELECT
            t.id AS class_id,
            t.course_code,
            c.course_name,
            t.start_time,
            t.end_time,
            t.room,
            t.day_of_week,
            EXISTS(
                SELECT 1 FROM attendance a WHERE a.class_id = t.id AND a.date = ?
            ) AS attendance_marked
        FROM timetable t
        JOIN courses c ON t.course_code = c.course_code
        WHERE t.faculty_id = ? AND t.day_of_week = ?
        ORDER BY t.start_time ASC
        "#,
    )
    .bind(date.to_string())
    .bind(faculty_id)
    .bind(day_of_week)
    .fetch_all(db)
    .await
}

/// Writes one row per enrolled student, `A` for absentees and `P` otherwise.
/// With `replace`, the existing record for the class and date is deleted first.
pub async fn write_attendance(
    db: &SqlitePool,
    class_id: &str,
    date: NaiveDate,
    students: &[StudentRow],
    absentees: &HashSet<&str>,
    replace: bool,
) -> Result<(), sqlx::Error> {
    let date = date.to_string();
    let mut tx = db.begin().await?;

    if replace {
        sqlx::query("DELETE FROM attendance WHERE class_id = ? AND date = ?")
            .bind(class_id)
            .bind(&date)
            .execute(&mut *tx)
            .await?;
    }

    for student in students {
        let mark = if absentees.contains(student.user_id.as_str()) {
            Mark::Absent
        } else {
            Mark::Present
        };

        sqlx::query("INSERT INTO attendance (class_id, student_id, date, status) VALUES (?, ?, ?, ?)")
            .bind(class_id)
            .bind(&student.user_id)
            .bind(&date)
            .bind(mark.as_code())
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await
}

/// Enrollments, fee and the classes of the student's courses on `date` that
/// have not ended by `now`.
pub async fn fetch_student_dashboard(
    db: &SqlitePool,
    student_id: &str,
    date: NaiveDate,
    now: NaiveTime,
) -> Result<StudentDashboardRows, sqlx::Error> {
    let enrollments = sqlx::query_as::<_, EnrollmentRow>(
        r#"
        SELECT e.course_code, c.course_name, e.attendance_percent, e.cgpa
        FROM enrollments e
        JOIN courses c ON e.course_code = c.course_code
        WHERE e.student_id = ?
        ORDER BY e.course_code ASC
        "#,
    )
    .bind(student_id)
    .fetch_all(db)
    .await?;

    let fee = sqlx::query_as::<_, FeeStatus>("SELECT amount, status, due_date FROM fees WHERE student_id = ?")
        .bind(student_id)
        .fetch_optional(db)
        .await?;

    let remaining_classes = sqlx::query_as::<_, TimetableSlot>(
        r#"
        SELECT t.id AS class_id, t.course_code, c.course_name, t.start_time, t.end_time, t.room
        FROM timetable t
        JOIN courses c ON t.course_code = c.course_code
        JOIN enrollments e ON e.course_code = t.course_code AND e.student_id = ?
        WHERE t.day_of_week = ? AND t.end_time > ?
        ORDER BY t.start_time ASC
        "#,
    )
    .bind(student_id)
    .bind(date.format("%A").to_string())
    .bind(now.format("%H:%M").to_string())
    .fetch_all(db)
    .await?;

    Ok(StudentDashboardRows {
        enrollments,
        fee,
        remaining_classes,
    })
}
