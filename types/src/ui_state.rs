use serde::{Deserialize, Serialize};

/// Transient request-lifecycle state owned by the auth controller.
///
/// Never persisted. `error_message` and `registration_success` are sticky:
/// they survive the return to idle until the caller explicitly clears them,
/// so the UI can acknowledge them (e.g. a one-time navigation after a
/// successful registration). The whole struct resets to defaults on logout.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUiState {
    /// A login or register request is in flight.
    pub is_loading: bool,
    /// Mirrors "some account is active"; seeded at construction and kept
    /// current by the session observer.
    pub is_logged_in: bool,
    /// Set on successful registration, cleared only by explicit acknowledgment.
    pub registration_success: bool,
    /// Last request failure, cleared on the next request or explicitly.
    pub error_message: Option<String>,
}
