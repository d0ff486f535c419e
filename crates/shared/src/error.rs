use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure classes a door-open request can settle into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// HTTP 425: the door was opened less than the cool-down ago.
    RateLimited,
    /// HTTP 401: the session credentials are no longer trusted.
    Unauthorized,
    /// Any other non-2xx status.
    Unknown,
    /// The request never produced a response.
    Transport,
}

impl FailureKind {
    /// Whether the panel must be rebuilt from a clean load after this failure.
    pub fn requires_reload(self) -> bool {
        !matches!(self, FailureKind::RateLimited)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown door '{0}' (expected inner or outer)")]
pub struct ParseDoorError(pub String);
