pub mod attendance;
pub mod dashboard;
pub mod roster;
pub mod user;

pub use attendance::{AttendancePayload, CommitMode, Confirmation};
pub use dashboard::{AttendanceStanding, CourseAttendance, FeeStatus, StudentDashboard, TimetableSlot};
pub use roster::{ClassContext, ClassRoster, ClassSummary, FacultyClasses, Mark, RosterEntry};
pub use user::{LoginRequest, LoginResponse, Role, User};
