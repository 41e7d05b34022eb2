//! Attendance marking for a single class and date.
//!
//! An [`AttendanceSession`] is owned by exactly one open view. Every mutating
//! operation takes `&mut self`, so at most one roster fetch or commit can be
//! outstanding per session. Dropping the session (or a pending `commit()`
//! future) drops the in-flight request with it; its result is never applied.

pub mod payload;
pub mod phase;
pub mod roster;

pub use payload::{Clock, CommitTicket, SubmissionDateSource, SystemClock};
pub use phase::Phase;
pub use roster::{Marks, StudentMark};

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::{AttendanceStore, RosterSource};
use crate::config::SessionConfig;
use crate::error::{BackendError, SessionError};
use crate::models::{ClassContext, ClassRoster, CommitMode, Confirmation, Mark};

struct PendingCommit {
    seq: u64,
    resume: Phase,
}

pub struct AttendanceSession {
    id: Uuid,
    class_id: String,
    roster_source: Arc<dyn RosterSource>,
    store: Arc<dyn AttendanceStore>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
    phase: Phase,
    context: Option<ClassContext>,
    marks: Marks,
    baseline: IndexMap<String, Mark>,
    was_previously_recorded: bool,
    pending: Option<PendingCommit>,
    last_seq: u64,
}

impl AttendanceSession {
    /// Creates a session in [`Phase::Loading`]. Call [`open`](Self::open) to load the roster.
    pub fn new(
        class_id: impl Into<String>,
        roster_source: Arc<dyn RosterSource>,
        store: Arc<dyn AttendanceStore>,
        config: SessionConfig,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            class_id: class_id.into(),
            roster_source,
            store,
            clock: Arc::new(SystemClock),
            config,
            phase: Phase::Loading,
            context: None,
            marks: Marks::new(),
            baseline: IndexMap::new(),
            was_previously_recorded: false,
            pending: None,
            last_seq: 0,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn context(&self) -> Option<&ClassContext> {
        self.context.as_ref()
    }

    pub fn marks(&self) -> &Marks {
        &self.marks
    }

    pub fn mark_of(&self, student_id: &str) -> Option<Mark> {
        self.marks.get(student_id).map(|student| student.mark)
    }

    /// Current marks without display names, comparable with [`baseline_marks`](Self::baseline_marks).
    pub fn mark_snapshot(&self) -> IndexMap<String, Mark> {
        roster::snapshot_marks(&self.marks)
    }

    /// Marks as they were when the session last became locked (or was loaded).
    pub fn baseline_marks(&self) -> &IndexMap<String, Mark> {
        &self.baseline
    }

    pub fn was_previously_recorded(&self) -> bool {
        self.was_previously_recorded
    }

    pub fn present_count(&self) -> usize {
        self.count(Mark::Present)
    }

    pub fn absent_count(&self) -> usize {
        self.count(Mark::Absent)
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.marks
            .iter()
            .any(|(id, student)| self.baseline.get(id) != Some(&student.mark))
    }

    /// Loads the roster. Only accepted while [`Phase::Loading`]; on failure the
    /// session stays there and `open` may be issued again.
    pub async fn open(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Loading {
            return Err(self.rejected("open"));
        }

        info!(session_id = %self.id, class_id = %self.class_id, "Loading class roster");
        let roster = self.fetch_roster().await?;
        let marks = roster::bootstrap(&roster).map_err(|e| {
            warn!(session_id = %self.id, class_id = %self.class_id, "Rejected roster: {}", e);
            SessionError::LoadFailure(e)
        })?;

        self.apply_loaded(roster, marks);
        Ok(())
    }

    /// Flips a student between present and absent. Returns the new mark.
    pub fn toggle(&mut self, student_id: &str) -> Result<Mark, SessionError> {
        if !self.phase.accepts_toggle() {
            return Err(self.rejected("toggle"));
        }

        let student = self
            .marks
            .get_mut(student_id)
            .ok_or_else(|| SessionError::UnknownStudent(student_id.to_string()))?;
        student.mark = student.mark.toggled();

        debug!(
            session_id = %self.id,
            student_id,
            mark = student.mark.as_code(),
            "Toggled mark"
        );
        Ok(student.mark)
    }

    pub fn enter_rectify(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Locked {
            return Err(self.rejected("enter_rectify"));
        }

        info!(session_id = %self.id, class_id = %self.class_id, "Entering rectification");
        self.phase = Phase::Rectifying;
        Ok(())
    }

    /// Discards rectification edits by reloading marks from the roster source.
    ///
    /// If the reload fails the session stays in [`Phase::Rectifying`] with its
    /// edits intact.
    pub async fn cancel_rectify(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Rectifying {
            return Err(self.rejected("cancel_rectify"));
        }

        info!(session_id = %self.id, class_id = %self.class_id, "Cancelling rectification, reloading roster");
        let fresh = self.fetch_roster().await?;

        self.marks = roster::reconcile(&self.marks, &fresh).map_err(|e| {
            warn!(session_id = %self.id, class_id = %self.class_id, "Reloaded roster rejected: {}", e);
            SessionError::LoadFailure(e)
        })?;
        self.baseline = roster::snapshot_marks(&self.marks);
        self.phase = Phase::Locked;
        Ok(())
    }

    /// Commits the current marks: create on first submission, amend while rectifying.
    ///
    /// The call is bounded by `commit_timeout` and transient failures are
    /// retried `commit_retries` times. Any failure restores the phase held
    /// before the commit, with marks unchanged.
    pub async fn commit(&mut self) -> Result<Confirmation, SessionError> {
        let ticket = self.begin_commit()?;

        // Reverts `Submitting` if this future is dropped before completion.
        let mut session = scopeguard::guard(self, |session| session.abandon_commit());
        let outcome = session.send(&ticket).await;
        session.complete_commit(&ticket, outcome)
    }

    /// Local half of a commit: moves to [`Phase::Submitting`] and returns the
    /// ticket describing what has to be sent.
    pub fn begin_commit(&mut self) -> Result<CommitTicket, SessionError> {
        match self.phase {
            Phase::Editable | Phase::Rectifying => {}
            Phase::Submitting => return Err(SessionError::CommitInFlight),
            Phase::Loading | Phase::Locked => return Err(self.rejected("commit")),
        }
        let Some(context) = self.context.as_ref() else {
            return Err(self.rejected("commit"));
        };

        let date = payload::submission_date(self.config.date_source, context, self.clock.as_ref());
        let mode = payload::select_mode(self.phase, self.was_previously_recorded);
        let body = payload::build_payload(context, &self.marks, date);

        self.last_seq += 1;
        self.pending = Some(PendingCommit {
            seq: self.last_seq,
            resume: self.phase,
        });
        self.phase = Phase::Submitting;

        info!(
            session_id = %self.id,
            class_id = %self.class_id,
            %date,
            ?mode,
            absentees = body.absent_student_ids.len(),
            "Submitting attendance"
        );
        Ok(CommitTicket::new(self.id, self.last_seq, mode, body))
    }

    /// Applies the outcome of the request described by `ticket`.
    ///
    /// Results for any ticket other than the pending one are rejected with
    /// [`SessionError::StaleCommit`] and leave the session untouched.
    pub fn complete_commit(
        &mut self,
        ticket: &CommitTicket,
        outcome: Result<Confirmation, BackendError>,
    ) -> Result<Confirmation, SessionError> {
        let resume = match self.pending.take() {
            Some(pending) if ticket.session_id == self.id && pending.seq == ticket.seq => {
                pending.resume
            }
            other => {
                self.pending = other;
                warn!(session_id = %self.id, ticket_seq = ticket.seq, "Ignoring stale commit result");
                return Err(SessionError::StaleCommit);
            }
        };

        match outcome {
            Ok(confirmation) => {
                self.baseline = roster::snapshot_marks(&self.marks);
                self.was_previously_recorded = true;
                self.phase = Phase::Locked;
                info!(
                    session_id = %self.id,
                    class_id = %self.class_id,
                    "Attendance committed: {}",
                    confirmation.message
                );
                Ok(confirmation)
            }
            Err(err) => {
                self.phase = resume;
                warn!(
                    session_id = %self.id,
                    class_id = %self.class_id,
                    phase = %resume,
                    "Commit failed: {}",
                    err
                );
                Err(SessionError::from_commit_failure(err))
            }
        }
    }

    /// Gives up on the pending commit without an outcome, restoring the prior phase.
    pub fn abandon_commit(&mut self) {
        if let Some(pending) = self.pending.take() {
            warn!(
                session_id = %self.id,
                class_id = %self.class_id,
                "Abandoning in-flight commit, assuming it did not succeed"
            );
            self.phase = pending.resume;
        }
    }

    async fn send(&self, ticket: &CommitTicket) -> Result<Confirmation, BackendError> {
        let mut retries = 0;

        loop {
            let request = async {
                match ticket.mode() {
                    CommitMode::Create => self.store.create_attendance(ticket.payload()).await,
                    CommitMode::Amend => self.store.amend_attendance(ticket.payload()).await,
                }
            };
            let result = tokio::time::timeout(self.config.commit_timeout, request)
                .await
                .unwrap_or_else(|_| Err(BackendError::Timeout));

            match result {
                Err(err) if err.is_transient() && retries < self.config.commit_retries => {
                    retries += 1;
                    warn!(
                        session_id = %self.id,
                        retry = retries,
                        "Commit failed transiently ({}), retrying",
                        err
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                other => return other,
            }
        }
    }

    async fn fetch_roster(&self) -> Result<ClassRoster, SessionError> {
        self.roster_source
            .fetch_class_roster(&self.class_id)
            .await
            .map_err(|e| {
                warn!(session_id = %self.id, class_id = %self.class_id, "Roster fetch failed: {}", e);
                SessionError::LoadFailure(e)
            })
    }

    fn apply_loaded(&mut self, roster: ClassRoster, marks: Marks) {
        self.was_previously_recorded = roster.already_recorded;
        self.baseline = roster::snapshot_marks(&marks);
        self.marks = marks;
        self.context = Some(roster.context);
        self.phase = if roster.already_recorded {
            Phase::Locked
        } else {
            Phase::Editable
        };

        info!(
            session_id = %self.id,
            class_id = %self.class_id,
            students = self.marks.len(),
            phase = %self.phase,
            "Roster loaded"
        );
    }

    fn count(&self, mark: Mark) -> usize {
        self.marks.values().filter(|student| student.mark == mark).count()
    }

    fn rejected(&self, operation: &'static str) -> SessionError {
        SessionError::PhaseRejected {
            operation,
            phase: self.phase,
        }
    }
}
