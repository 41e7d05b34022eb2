pub mod http;

use async_trait::async_trait;

use crate::error::BackendError;
use crate::models::{AttendancePayload, ClassRoster, Confirmation, User};

pub use http::HttpBackend;

/// Enrolled students and prior state of a class for the current date.
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// Fails with `NotFound` for an unknown class and `Unavailable` on transport failure.
    async fn fetch_class_roster(&self, class_id: &str) -> Result<ClassRoster, BackendError>;
}

/// Durable per-class, per-date attendance record.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Fails with `Conflict` if a record for the class and date already exists.
    async fn create_attendance(&self, payload: &AttendancePayload) -> Result<Confirmation, BackendError>;

    /// Replaces the record for the class and date. Fails with `NotFound` if there is none.
    async fn amend_attendance(&self, payload: &AttendancePayload) -> Result<Confirmation, BackendError>;
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, user_id: &str) -> Result<User, BackendError>;
}
