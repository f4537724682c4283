use thiserror::Error;

/// Failure taxonomy surfaced by the auth service.
///
/// Every storage fault is caught at the service boundary and wrapped into
/// [`AuthError::Storage`] with a human-readable message; callers above the
/// service never see an unstructured fault. The `Display` rendering of each
/// variant is exactly the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Login with an unmatched email + secret pair. Unknown email and wrong
    /// secret are deliberately indistinguishable.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Registration with an email some account already holds.
    #[error("Email already exists")]
    DuplicateEmail,

    /// An underlying persistence fault, wrapped with a short context prefix.
    #[error("{0}")]
    Storage(String),
}

impl AuthError {
    /// Wrap a storage fault under a context prefix, e.g. `"Login failed"`.
    #[must_use]
    pub fn storage(prefix: &str, err: impl std::fmt::Display) -> Self {
        Self::Storage(format!("{prefix}: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_credentials_message_is_non_distinguishing() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
    }

    #[test]
    fn duplicate_email_message() {
        assert_eq!(AuthError::DuplicateEmail.to_string(), "Email already exists");
    }

    #[test]
    fn storage_wraps_with_prefix() {
        let err = AuthError::storage("Login failed", "disk I/O error");
        assert_eq!(err.to_string(), "Login failed: disk I/O error");
    }
}
