use std::str::FromStr;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{AttendancePayload, ClassContext, CommitMode, Mark};
use crate::session::Phase;
use crate::session::roster::Marks;

/// Where the attendance date sent on commit comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmissionDateSource {
    /// Local calendar date at commit time.
    #[default]
    ClientClock,
    /// The session date reported with the class roster.
    ScheduledClassDate,
}

impl FromStr for SubmissionDateSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client_clock" => Ok(SubmissionDateSource::ClientClock),
            "scheduled_class_date" => Ok(SubmissionDateSource::ScheduledClassDate),
            other => Err(format!("unknown submission date source {other:?}")),
        }
    }
}

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

pub fn absentees(marks: &Marks) -> Vec<String> {
    marks
        .values()
        .filter(|student| student.mark == Mark::Absent)
        .map(|student| student.student_id.clone())
        .collect()
}

pub fn select_mode(phase: Phase, was_previously_recorded: bool) -> CommitMode {
    if phase == Phase::Rectifying && was_previously_recorded {
        CommitMode::Amend
    } else {
        CommitMode::Create
    }
}

pub fn submission_date(
    source: SubmissionDateSource,
    context: &ClassContext,
    clock: &dyn Clock,
) -> NaiveDate {
    match source {
        SubmissionDateSource::ClientClock => clock.today(),
        SubmissionDateSource::ScheduledClassDate => context.session_date,
    }
}

pub fn build_payload(context: &ClassContext, marks: &Marks, date: NaiveDate) -> AttendancePayload {
    AttendancePayload {
        class_id: context.class_id.clone(),
        date,
        absent_student_ids: absentees(marks),
    }
}

/// Handle for one in-flight commit, issued by `begin_commit`.
#[derive(Debug, Clone)]
pub struct CommitTicket {
    pub(crate) session_id: Uuid,
    pub(crate) seq: u64,
    mode: CommitMode,
    payload: AttendancePayload,
}

impl CommitTicket {
    pub(crate) fn new(session_id: Uuid, seq: u64, mode: CommitMode, payload: AttendancePayload) -> Self {
        Self {
            session_id,
            seq,
            mode,
            payload,
        }
    }

    pub fn mode(&self) -> CommitMode {
        self.mode
    }

    pub fn payload(&self) -> &AttendancePayload {
        &self.payload
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}
