use std::fmt::{self, Debug, Formatter};

/// Credentials and identity of the current user, passed to every backend call.
#[derive(Clone)]
pub struct Session {
    token: String,
    student_id: Option<String>,
}

impl Session {
    pub fn new(token: impl Into<String>, student_id: Option<String>) -> Self {
        Session {
            token: token.into(),
            student_id,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn student_id(&self) -> Option<&str> {
        self.student_id.as_deref()
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"***")
            .field("student_id", &self.student_id)
            .finish()
    }
}
