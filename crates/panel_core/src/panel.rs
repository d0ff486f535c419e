use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use shared::domain::Door;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::{
    api::DoorApi,
    lock,
    outcome::{classify, DoorOutcome, RELOAD_DELAY},
    timer::{self, TimerHandle},
    toast::ToastTray,
};

/// Rebuilds the panel from a clean load, discarding the current session.
pub trait Reloader: Send + Sync {
    fn reload(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// The control was already waiting on a request; nothing was sent.
    Ignored,
    Settled(DoorOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    ControlChanged { door: Door, disabled: bool },
    ReloadScheduled { after: Duration },
}

struct Control {
    disabled: AtomicBool,
}

impl Control {
    fn new() -> Self {
        Self {
            disabled: AtomicBool::new(false),
        }
    }

    /// Flips the control to disabled; false if it already was.
    fn try_disable(&self) -> bool {
        self.disabled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn enable(&self) {
        self.disabled.store(false, Ordering::Release);
    }
}

/// Re-enables the control when the request settles or its future is dropped.
struct InFlight<'a> {
    panel: &'a DoorPanel,
    door: Door,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.panel.control(self.door).enable();
        self.panel.emit(PanelEvent::ControlChanged {
            door: self.door,
            disabled: false,
        });
    }
}

pub struct DoorPanel {
    api: Arc<dyn DoorApi>,
    tray: Arc<ToastTray>,
    reloader: Arc<dyn Reloader>,
    inner: Control,
    outer: Control,
    pending_reload: Mutex<Option<TimerHandle>>,
    reload_delay: Duration,
    events: broadcast::Sender<PanelEvent>,
}

impl DoorPanel {
    pub fn new(
        api: Arc<dyn DoorApi>,
        tray: Arc<ToastTray>,
        reloader: Arc<dyn Reloader>,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            api,
            tray,
            reloader,
            inner: Control::new(),
            outer: Control::new(),
            pending_reload: Mutex::new(None),
            reload_delay: RELOAD_DELAY,
            events,
        }
    }

    pub fn with_reload_delay(mut self, delay: Duration) -> Self {
        self.reload_delay = delay;
        self
    }

    pub fn tray(&self) -> &Arc<ToastTray> {
        &self.tray
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PanelEvent> {
        self.events.subscribe()
    }

    pub fn is_disabled(&self, door: Door) -> bool {
        self.control(door).disabled.load(Ordering::Acquire)
    }

    pub fn reload_pending(&self) -> bool {
        lock(&self.pending_reload)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Handles one activation of `door`'s control.
    ///
    /// While a request for the same door is in flight further activations
    /// are ignored. The other door's control is unaffected.
    pub async fn activate(&self, door: Door) -> Activation {
        if !self.control(door).try_disable() {
            debug!(%door, "control busy; activation ignored");
            return Activation::Ignored;
        }
        self.emit(PanelEvent::ControlChanged {
            door,
            disabled: true,
        });

        let result = {
            let _in_flight = InFlight { panel: self, door };
            self.api.open(door).await
        };

        let outcome = classify(result);
        self.react(door, &outcome);
        Activation::Settled(outcome)
    }

    /// Cancels the pending reload and empties the tray.
    pub fn teardown(&self) {
        if let Some(handle) = lock(&self.pending_reload).take() {
            handle.cancel();
        }
        self.tray.clear();
    }

    fn react(&self, door: Door, outcome: &DoorOutcome) {
        match outcome {
            DoorOutcome::Opened => info!(%door, "door opened"),
            DoorOutcome::RateLimited => warn!(%door, "door service rate limited the request"),
            DoorOutcome::Unauthorized => warn!(%door, "door service rejected the session"),
            DoorOutcome::Unknown { status, body } => {
                error!(%door, status, %body, "door service returned an unexpected status")
            }
            DoorOutcome::Transport { message } => {
                error!(%door, %message, "door service unreachable")
            }
        }

        if let Some((text, severity)) = outcome.toast() {
            self.tray.notify(text, severity);
        }
        if outcome.requires_reload() {
            self.schedule_reload();
        }
    }

    fn schedule_reload(&self) {
        let mut pending = lock(&self.pending_reload);
        if pending.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("reload already scheduled");
            return;
        }

        let reloader = Arc::clone(&self.reloader);
        *pending = Some(timer::schedule(self.reload_delay, move || {
            info!("reloading panel");
            reloader.reload();
        }));
        drop(pending);

        info!(after_ms = self.reload_delay.as_millis() as u64, "reload scheduled");
        self.emit(PanelEvent::ReloadScheduled {
            after: self.reload_delay,
        });
    }

    fn control(&self, door: Door) -> &Control {
        match door {
            Door::Inner => &self.inner,
            Door::Outer => &self.outer,
        }
    }

    fn emit(&self, event: PanelEvent) {
        let _ = self.events.send(event);
    }
}

impl Drop for DoorPanel {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.pending_reload).take() {
            handle.cancel();
        }
    }
}

#[cfg(test)]
#[path = "tests/panel_tests.rs"]
mod tests;
