//! Authentication boundary.

use serde::{Deserialize, Serialize};

/// Signed-in account as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    /// Stable account id; addresses the remote document `users/{account_id}`.
    pub account_id: String,
    pub display_name: Option<String>,
}

impl UserSession {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            display_name: None,
        }
    }
}

/// Interactive sign-in provider.
///
/// Both calls only initiate the flow. The outcome arrives later as a session
/// change delivered by the host to `HabitController::handle_session_change`.
pub trait AuthProvider: Send + Sync {
    fn login(&self);
    fn logout(&self);
}

/// Provider for hosts without sign-in support.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuth;

impl AuthProvider for NoopAuth {
    fn login(&self) {}
    fn logout(&self) {}
}
