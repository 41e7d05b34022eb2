use std::fmt;

/// Lifecycle phase of an [`AttendanceSession`](super::AttendanceSession).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Roster not loaded yet, or the last load failed.
    Loading,
    /// First submission for the date, marks can be toggled.
    Editable,
    /// Record committed. Edits require an explicit rectification.
    Locked,
    /// Reopened for amendment of a committed record.
    Rectifying,
    /// A create or amend call is in flight.
    Submitting,
}

impl Phase {
    pub fn accepts_toggle(self) -> bool {
        matches!(self, Phase::Editable | Phase::Rectifying)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Loading => "loading",
            Phase::Editable => "editable",
            Phase::Locked => "locked",
            Phase::Rectifying => "rectifying",
            Phase::Submitting => "submitting",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
