#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use attendance::client::{AttendanceStore, RosterSource};
use attendance::config::SessionConfig;
use attendance::error::BackendError;
use attendance::models::{
    AttendancePayload, ClassContext, ClassRoster, CommitMode, Confirmation, Mark, RosterEntry,
};
use attendance::session::{AttendanceSession, Clock};
use chrono::NaiveDate;
use sqlx::SqlitePool;

pub const CLASS_ID: &str = "c1";
pub const STUDENT_1: &str = "11800001";
pub const STUDENT_2: &str = "11800002";
pub const STUDENT_3: &str = "11800003";
pub const FACULTY_ID: &str = "14234";

pub fn class_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

pub fn clock_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()
}

pub fn context() -> ClassContext {
    ClassContext {
        class_id: CLASS_ID.to_string(),
        course_code: "CSE310".to_string(),
        room: "34-201".to_string(),
        start_time: "09:00".to_string(),
        end_time: "10:00".to_string(),
        session_date: class_date(),
    }
}

/// Three students in roster order; `absent` only matters when `already_recorded`.
pub fn roster(already_recorded: bool, absent: &[&str]) -> ClassRoster {
    let students = [(STUDENT_1, "Asha Verma"), (STUDENT_2, "Bilal Khan"), (STUDENT_3, "Chen Li")]
        .into_iter()
        .map(|(id, name)| RosterEntry {
            student_id: id.to_string(),
            display_name: name.to_string(),
            prior_mark: already_recorded.then(|| {
                if absent.contains(&id) {
                    Mark::Absent
                } else {
                    Mark::Present
                }
            }),
        })
        .collect();

    ClassRoster {
        context: context(),
        students,
        already_recorded,
    }
}

pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub struct FakeRoster {
    roster: Mutex<ClassRoster>,
    failures: Mutex<VecDeque<BackendError>>,
    calls: AtomicUsize,
}

impl FakeRoster {
    pub fn new(roster: ClassRoster) -> Arc<Self> {
        Arc::new(Self {
            roster: Mutex::new(roster),
            failures: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set_roster(&self, roster: ClassRoster) {
        *self.roster.lock().unwrap() = roster;
    }

    pub fn fail_next(&self, err: BackendError) {
        self.failures.lock().unwrap().push_back(err);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RosterSource for FakeRoster {
    async fn fetch_class_roster(&self, class_id: &str) -> Result<ClassRoster, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        let roster = self.roster.lock().unwrap().clone();
        if roster.context.class_id != class_id {
            return Err(BackendError::NotFound("Class not found".to_string()));
        }
        Ok(roster)
    }
}

pub struct FakeStore {
    requests: Mutex<Vec<(CommitMode, AttendancePayload)>>,
    failures: Mutex<VecDeque<BackendError>>,
    delay: Mutex<Option<Duration>>,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
            delay: Mutex::new(None),
        })
    }

    pub fn fail_next(&self, err: BackendError) {
        self.failures.lock().unwrap().push_back(err);
    }

    pub fn delay_responses(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn requests(&self) -> Vec<(CommitMode, AttendancePayload)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    async fn respond(&self, mode: CommitMode, payload: &AttendancePayload) -> Result<Confirmation, BackendError> {
        self.requests.lock().unwrap().push((mode, payload.clone()));

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failures.lock().unwrap().pop_front();
        if let Some(err) = failure {
            return Err(err);
        }

        let absent = payload.absent_student_ids.len();
        Ok(Confirmation {
            message: format!("Attendance saved for 3 students ({} absent).", absent),
            total_students: 3,
            absent_count: absent,
            present_count: 3 - absent,
        })
    }
}

#[async_trait]
impl AttendanceStore for FakeStore {
    async fn create_attendance(&self, payload: &AttendancePayload) -> Result<Confirmation, BackendError> {
        self.respond(CommitMode::Create, payload).await
    }

    async fn amend_attendance(&self, payload: &AttendancePayload) -> Result<Confirmation, BackendError> {
        self.respond(CommitMode::Amend, payload).await
    }
}

pub fn session_with(
    roster: &Arc<FakeRoster>,
    store: &Arc<FakeStore>,
    config: SessionConfig,
) -> AttendanceSession {
    AttendanceSession::new(CLASS_ID, roster.clone(), store.clone(), config)
        .with_clock(Arc::new(FixedClock(clock_date())))
}

pub fn session(roster: &Arc<FakeRoster>, store: &Arc<FakeStore>) -> AttendanceSession {
    session_with(roster, store, SessionConfig::default())
}

/// Migrated in-memory database with one faculty member, three students
/// enrolled in CSE310 and two timetable slots (`c1` on Monday, `c2` on Tuesday).
pub async fn seeded_pool() -> SqlitePool {
    let pool = attendance::db::connect_in_memory()
        .await
        .expect("Failed to create database");

    for (id, name, role) in [
        (FACULTY_ID, "Dr. Meera Rao", "FACULTY"),
        (STUDENT_1, "Asha Verma", "STUDENT"),
        (STUDENT_2, "Bilal Khan", "STUDENT"),
        (STUDENT_3, "Chen Li", "STUDENT"),
    ] {
        sqlx::query("INSERT INTO users (user_id, name, role) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(role)
            .execute(&pool)
            .await
            .expect("Failed to insert user");
    }

    for (code, name) in [("CSE310", "Java Programming"), ("CSE320", "Software Engineering")] {
        sqlx::query("INSERT INTO courses (course_code, course_name) VALUES (?, ?)")
            .bind(code)
            .bind(name)
            .execute(&pool)
            .await
            .expect("Failed to insert course");
    }

    for (student, course, percent, cgpa) in [
        (STUDENT_1, "CSE310", 80.0, 8.4),
        (STUDENT_1, "CSE320", 91.0, 8.4),
        (STUDENT_2, "CSE310", 95.0, 9.1),
        (STUDENT_3, "CSE310", 70.0, 7.2),
    ] {
        sqlx::query(
            "INSERT INTO enrollments (student_id, course_code, attendance_percent, cgpa) VALUES (?, ?, ?, ?)",
        )
        .bind(student)
        .bind(course)
        .bind(percent)
        .bind(cgpa)
        .execute(&pool)
        .await
        .expect("Failed to enroll student");
    }

    sqlx::query("INSERT INTO fees (student_id, amount, status, due_date) VALUES (?, 45000.0, 'PENDING', '2026-11-15')")
        .bind(STUDENT_1)
        .execute(&pool)
        .await
        .expect("Failed to insert fee");

    for (id, day, start, end) in [("c1", "Monday", "09:00", "10:00"), ("c2", "Tuesday", "11:00", "12:00")] {
        sqlx::query(
            r#"
            INSERT INTO timetable (id, course_code, faculty_id, day_of_week, start_time, end_time, room)
            VALUES (?, 'CSE310', ?, ?, ?, ?, '34-201')
            "#,
        )
        .bind(id)
        .bind(FACULTY_ID)
        .bind(day)
        .bind(start)
        .bind(end)
        .execute(&pool)
        .await
        .expect("Failed to insert timetable slot");
    }

    pool
}
