use std::time::Duration;

use shared::{domain::Severity, error::FailureKind};

use crate::api::{DoorResponse, TransportError};

/// Cool-down the door service enforces between two openings of one door.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(10);
/// Delay between an unrecoverable failure and the panel reload.
pub const RELOAD_DELAY: Duration = Duration::from_secs(5);
/// How long a toast stays in the tray.
pub const TOAST_LIFETIME: Duration = Duration::from_millis(5000);

const STATUS_UNAUTHORIZED: u16 = 401;
const STATUS_TOO_EARLY: u16 = 425;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoorOutcome {
    Opened,
    RateLimited,
    Unauthorized,
    Unknown { status: u16, body: String },
    Transport { message: String },
}

pub fn classify(result: Result<DoorResponse, TransportError>) -> DoorOutcome {
    match result {
        Ok(response) if response.is_success() => DoorOutcome::Opened,
        Ok(response) => match response.status {
            STATUS_TOO_EARLY => DoorOutcome::RateLimited,
            STATUS_UNAUTHORIZED => DoorOutcome::Unauthorized,
            status => DoorOutcome::Unknown {
                status,
                body: response.body,
            },
        },
        Err(error) => DoorOutcome::Transport {
            message: error.message().to_string(),
        },
    }
}

impl DoorOutcome {
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            DoorOutcome::Opened => None,
            DoorOutcome::RateLimited => Some(FailureKind::RateLimited),
            DoorOutcome::Unauthorized => Some(FailureKind::Unauthorized),
            DoorOutcome::Unknown { .. } => Some(FailureKind::Unknown),
            DoorOutcome::Transport { .. } => Some(FailureKind::Transport),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure_kind().is_none()
    }

    pub fn requires_reload(&self) -> bool {
        self.failure_kind().is_some_and(FailureKind::requires_reload)
    }

    /// Notification shown for this outcome; successes stay silent.
    pub fn toast(&self) -> Option<(String, Severity)> {
        let reload_secs = RELOAD_DELAY.as_secs();
        match self {
            DoorOutcome::Opened => None,
            DoorOutcome::RateLimited => Some((
                format!(
                    "Too fast! Wait at least {} seconds until you press again.",
                    RATE_LIMIT_WINDOW.as_secs()
                ),
                Severity::Warning,
            )),
            DoorOutcome::Unauthorized => Some((
                format!("Unauthorized! Will reload in {reload_secs} seconds."),
                Severity::Error,
            )),
            DoorOutcome::Unknown { status, body } => Some((
                format!("Unknown error: {status} - {body}! Will reload in {reload_secs} seconds."),
                Severity::Error,
            )),
            DoorOutcome::Transport { message } => Some((
                format!("Network error: {message}! Will reload in {reload_secs} seconds."),
                Severity::Error,
            )),
        }
    }
}
