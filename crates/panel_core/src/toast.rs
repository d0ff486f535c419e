use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use shared::domain::Severity;
use tokio::sync::broadcast;
use tracing::debug;

use crate::{lock, outcome::TOAST_LIFETIME, timer::TimerSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(pub u64);

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "toast-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub text: String,
    pub severity: Severity,
    pub shown_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrayEvent {
    Shown(Toast),
    Removed(ToastId),
}

struct TrayState {
    items: Mutex<Vec<Toast>>,
    events: broadcast::Sender<TrayEvent>,
}

impl TrayState {
    fn remove(&self, id: ToastId) {
        let removed = {
            let mut items = lock(&self.items);
            let before = items.len();
            items.retain(|toast| toast.id != id);
            items.len() != before
        };
        if removed {
            debug!(%id, "toast expired");
            let _ = self.events.send(TrayEvent::Removed(id));
        }
    }
}

/// Shared notification tray. Every toast removes itself after its lifetime;
/// there is no dismiss action, deduplication or cap on visible entries.
pub struct ToastTray {
    state: Arc<TrayState>,
    removals: TimerSet,
    next_id: AtomicU64,
    lifetime: Duration,
}

impl ToastTray {
    pub fn new() -> Self {
        Self::with_lifetime(TOAST_LIFETIME)
    }

    pub fn with_lifetime(lifetime: Duration) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: Arc::new(TrayState {
                items: Mutex::new(Vec::new()),
                events,
            }),
            removals: TimerSet::new(),
            next_id: AtomicU64::new(1),
            lifetime,
        }
    }

    /// Appends one toast and schedules its removal. Requires a Tokio runtime.
    pub fn notify(&self, text: impl Into<String>, severity: Severity) -> ToastId {
        let toast = Toast {
            id: ToastId(self.next_id.fetch_add(1, Ordering::Relaxed)),
            text: text.into(),
            severity,
            shown_at: Utc::now(),
        };
        let id = toast.id;
        debug!(%id, %severity, text = %toast.text, "toast shown");

        lock(&self.state.items).push(toast.clone());
        let _ = self.state.events.send(TrayEvent::Shown(toast));

        let state = Arc::downgrade(&self.state);
        self.removals.schedule(self.lifetime, move || {
            if let Some(state) = state.upgrade() {
                state.remove(id);
            }
        });
        id
    }

    pub fn items(&self) -> Vec<Toast> {
        lock(&self.state.items).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.state.items).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TrayEvent> {
        self.state.events.subscribe()
    }

    /// Drops every visible toast and cancels their pending removals.
    pub fn clear(&self) {
        self.removals.cancel_all();
        lock(&self.state.items).clear();
    }
}

impl Default for ToastTray {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "tests/toast_tests.rs"]
mod tests;
