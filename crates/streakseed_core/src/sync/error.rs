//! Remote sync error envelope.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Sync phase in which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Subscribe,
    Push,
    Receive,
}

impl SyncStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subscribe => "subscribe",
            Self::Push => "push",
            Self::Receive => "receive",
        }
    }
}

/// Provider-agnostic failure description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncError {
    pub provider: String,
    pub stage: SyncStage,
    /// Stable machine-readable code, e.g. `offline`, `permission_denied`.
    pub code: String,
    pub message: String,
    /// Whether the transport may succeed if the same call is repeated.
    pub retryable: bool,
}

impl SyncError {
    pub fn new(
        provider: impl Into<String>,
        stage: SyncStage,
        code: impl Into<String>,
        message: impl Into<String>,
        retryable: bool,
    ) -> Self {
        Self {
            provider: provider.into(),
            stage,
            code: code.into(),
            message: message.into(),
            retryable,
        }
    }
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} failed ({}): {}",
            self.provider,
            self.stage.as_str(),
            self.code,
            self.message
        )
    }
}

impl Error for SyncError {}

pub type SyncResult<T> = Result<T, SyncError>;
