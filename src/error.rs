//! Error types shared by the directory, session, and task store.
//!
//! Every failure is local and recoverable: the CLI surfaces the message and
//! the user retries. Nothing here aborts the process.

/// An operation failure with a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed input at a boundary (registration, task creation).
    Validation { field: String, message: String },
    /// Registration with an email that is already taken.
    DuplicateEmail(String),
    /// Sign-in failed. The message distinguishes "user not found" from
    /// "invalid password" for display, but callers see one kind.
    Authentication(String),
    /// A role or ownership rule was violated.
    Authorization(String),
    /// A referenced id is not in the collection.
    NotFound(String),
}

impl Error {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { field, message } => write!(f, "[{}]: {}", field, message),
            Self::DuplicateEmail(email) => write!(f, "email already registered: {}", email),
            Self::Authentication(msg) => write!(f, "authentication failed: {}", msg),
            Self::Authorization(msg) => write!(f, "not allowed: {}", msg),
            Self::NotFound(what) => write!(f, "not found: {}", what),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = Error::validation("password", "must be at least 6 characters");
        assert_eq!(err.to_string(), "[password]: must be at least 6 characters");

        let err = Error::DuplicateEmail("a@b.c".to_string());
        assert_eq!(err.to_string(), "email already registered: a@b.c");

        let err = Error::NotFound("task 42".to_string());
        assert_eq!(err.to_string(), "not found: task 42");
    }
}
