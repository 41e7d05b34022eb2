use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use crate::client::Authenticator;
use crate::error::AuthError;
use crate::models::{Role, User};

static STUDENT_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{8}$").unwrap());
static FACULTY_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{5}$").unwrap());

/// Infers the role from the shape of an id: 8 digits for students, 5 for faculty.
pub fn classify_id(id: &str) -> Option<Role> {
    if STUDENT_ID.is_match(id) {
        Some(Role::Student)
    } else if FACULTY_ID.is_match(id) {
        Some(Role::Faculty)
    } else {
        None
    }
}

/// The signed-in user of one client, passed explicitly to whatever needs it.
#[derive(Debug, Default)]
pub struct AuthSession {
    user: Option<User>,
}

impl AuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub async fn login(
        &mut self,
        authenticator: &dyn Authenticator,
        user_id: &str,
    ) -> Result<&User, AuthError> {
        let user_id = user_id.trim();
        let detected = classify_id(user_id).ok_or(AuthError::UnrecognizedId)?;

        let user = authenticator.login(user_id).await?;
        if user.role != detected {
            warn!(
                user_id,
                "Id looks like {:?} but the server reports {:?}",
                detected,
                user.role
            );
        }

        info!(user_id = %user.user_id, role = user.role.as_str(), "Signed in");
        Ok(self.user.insert(user))
    }

    /// Signs out, returning the user that was signed in.
    pub fn logout(&mut self) -> Option<User> {
        let previous = self.user.take();
        if let Some(user) = &previous {
            info!(user_id = %user.user_id, "Signed out");
        }
        previous
    }

    pub fn require(&self, role: Role) -> Result<&User, AuthError> {
        let user = self.user.as_ref().ok_or(AuthError::NotSignedIn)?;
        if user.role != role {
            return Err(AuthError::WrongRole {
                required: role,
                actual: user.role,
            });
        }
        Ok(user)
    }
}
