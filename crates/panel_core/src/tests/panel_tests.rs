use std::{
    collections::VecDeque,
    sync::atomic::AtomicUsize,
};

use async_trait::async_trait;
use shared::domain::Severity;
use tokio::sync::Notify;

use super::*;
use crate::api::{DoorResponse, TransportError};

struct ScriptedApi {
    responses: Mutex<VecDeque<Result<DoorResponse, TransportError>>>,
    calls: Mutex<Vec<Door>>,
    gated_door: Option<Door>,
    gate: Notify,
}

impl ScriptedApi {
    fn new(responses: Vec<Result<DoorResponse, TransportError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
            gated_door: None,
            gate: Notify::new(),
        }
    }

    /// Requests for `door` wait until [`ScriptedApi::release`] is called.
    fn gated(door: Door, responses: Vec<Result<DoorResponse, TransportError>>) -> Self {
        let mut api = Self::new(responses);
        api.gated_door = Some(door);
        api
    }

    fn release(&self) {
        self.gate.notify_one();
    }

    fn calls(&self) -> Vec<Door> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl DoorApi for ScriptedApi {
    async fn open(&self, door: Door) -> Result<DoorResponse, TransportError> {
        lock(&self.calls).push(door);
        if self.gated_door == Some(door) {
            self.gate.notified().await;
        }
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Ok(DoorResponse::new(204, "")))
    }
}

#[derive(Default)]
struct RecordingReloader {
    reloads: AtomicUsize,
}

impl RecordingReloader {
    fn count(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

impl Reloader for RecordingReloader {
    fn reload(&self) {
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    panel: Arc<DoorPanel>,
    api: Arc<ScriptedApi>,
    reloader: Arc<RecordingReloader>,
}

fn harness(api: ScriptedApi) -> Harness {
    let api = Arc::new(api);
    let reloader = Arc::new(RecordingReloader::default());
    let panel = DoorPanel::new(api.clone(), Arc::new(ToastTray::new()), reloader.clone());
    Harness {
        panel: Arc::new(panel),
        api,
        reloader,
    }
}

fn status(code: u16, body: &str) -> Result<DoorResponse, TransportError> {
    Ok(DoorResponse::new(code, body))
}

async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn successful_open_is_silent_and_reenables_the_control() {
    let h = harness(ScriptedApi::new(vec![status(204, "")]));

    let activation = h.panel.activate(Door::Inner).await;

    assert_eq!(activation, Activation::Settled(DoorOutcome::Opened));
    assert_eq!(h.api.calls(), vec![Door::Inner]);
    assert!(!h.panel.is_disabled(Door::Inner));
    assert!(h.panel.tray().is_empty());
    assert!(!h.panel.reload_pending());
}

#[tokio::test(start_paused = true)]
async fn rate_limited_open_warns_for_five_seconds_without_reload() {
    let h = harness(ScriptedApi::new(vec![status(425, "")]));

    let activation = h.panel.activate(Door::Outer).await;
    assert_eq!(activation, Activation::Settled(DoorOutcome::RateLimited));
    assert!(!h.panel.is_disabled(Door::Outer));

    let items = h.panel.tray().items();
    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0].text,
        "Too fast! Wait at least 10 seconds until you press again."
    );
    assert_eq!(items[0].severity, Severity::Warning);
    assert!(!h.panel.reload_pending());

    tokio::time::advance(Duration::from_secs(5)).await;
    settle().await;
    assert!(h.panel.tray().is_empty());

    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;
    assert_eq!(h.reloader.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn unauthorized_open_reloads_after_five_seconds() {
    let h = harness(ScriptedApi::new(vec![status(401, "")]));

    h.panel.activate(Door::Inner).await;

    let items = h.panel.tray().items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].text, "Unauthorized! Will reload in 5 seconds.");
    assert_eq!(items[0].severity, Severity::Error);
    assert!(h.panel.reload_pending());

    tokio::time::advance(Duration::from_millis(4999)).await;
    settle().await;
    assert_eq!(h.reloader.count(), 0);

    tokio::time::advance(Duration::from_millis(1)).await;
    settle().await;
    assert_eq!(h.reloader.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn unknown_status_reports_body_and_reloads() {
    let h = harness(ScriptedApi::new(vec![status(503, "db down")]));

    let activation = h.panel.activate(Door::Outer).await;
    assert_eq!(
        activation,
        Activation::Settled(DoorOutcome::Unknown {
            status: 503,
            body: "db down".to_string()
        })
    );

    let items = h.panel.tray().items();
    assert_eq!(
        items[0].text,
        "Unknown error: 503 - db down! Will reload in 5 seconds."
    );
    assert_eq!(items[0].severity, Severity::Error);

    tokio::time::advance(RELOAD_DELAY).await;
    settle().await;
    assert_eq!(h.reloader.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn transport_failure_reenables_control_and_reports() {
    let h = harness(ScriptedApi::new(vec![Err(TransportError::new(
        "connection refused",
    ))]));

    h.panel.activate(Door::Inner).await;

    assert!(!h.panel.is_disabled(Door::Inner));
    let items = h.panel.tray().items();
    assert_eq!(
        items[0].text,
        "Network error: connection refused! Will reload in 5 seconds."
    );
    assert!(h.panel.reload_pending());
}

#[tokio::test(start_paused = true)]
async fn repeated_activation_while_in_flight_sends_one_request() {
    let h = harness(ScriptedApi::gated(Door::Inner, vec![status(204, "")]));

    let first = tokio::spawn({
        let panel = h.panel.clone();
        async move { panel.activate(Door::Inner).await }
    });
    settle().await;
    assert!(h.panel.is_disabled(Door::Inner));

    assert_eq!(h.panel.activate(Door::Inner).await, Activation::Ignored);
    assert_eq!(h.panel.activate(Door::Inner).await, Activation::Ignored);

    h.api.release();
    let settled = first.await.expect("join first activation");
    assert_eq!(settled, Activation::Settled(DoorOutcome::Opened));
    assert_eq!(h.api.calls(), vec![Door::Inner]);
    assert!(!h.panel.is_disabled(Door::Inner));
}

#[tokio::test(start_paused = true)]
async fn other_door_stays_usable_while_one_is_in_flight() {
    let h = harness(ScriptedApi::gated(
        Door::Inner,
        vec![status(204, ""), status(204, "")],
    ));

    let inner = tokio::spawn({
        let panel = h.panel.clone();
        async move { panel.activate(Door::Inner).await }
    });
    settle().await;

    let outer = h.panel.activate(Door::Outer).await;
    assert_eq!(outer, Activation::Settled(DoorOutcome::Opened));
    assert!(h.panel.is_disabled(Door::Inner));

    h.api.release();
    inner.await.expect("join inner activation");
    assert_eq!(h.api.calls(), vec![Door::Inner, Door::Outer]);
}

#[tokio::test(start_paused = true)]
async fn dropped_activation_does_not_leave_control_disabled() {
    let h = harness(ScriptedApi::gated(Door::Outer, Vec::new()));

    let activation = tokio::spawn({
        let panel = h.panel.clone();
        async move { panel.activate(Door::Outer).await }
    });
    settle().await;
    assert!(h.panel.is_disabled(Door::Outer));

    activation.abort();
    settle().await;
    assert!(!h.panel.is_disabled(Door::Outer));
}

#[tokio::test(start_paused = true)]
async fn only_one_reload_is_pending_at_a_time() {
    let h = harness(ScriptedApi::new(vec![status(401, ""), status(500, "boom")]));

    h.panel.activate(Door::Inner).await;
    tokio::time::advance(Duration::from_secs(2)).await;
    settle().await;
    h.panel.activate(Door::Outer).await;
    assert_eq!(h.panel.tray().len(), 2);

    tokio::time::advance(Duration::from_secs(3)).await;
    settle().await;
    assert_eq!(h.reloader.count(), 1);

    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;
    assert_eq!(h.reloader.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn teardown_cancels_reload_and_clears_tray() {
    let h = harness(ScriptedApi::new(vec![status(401, "")]));

    h.panel.activate(Door::Inner).await;
    h.panel.teardown();

    assert!(h.panel.tray().is_empty());
    assert!(!h.panel.reload_pending());
    tokio::time::advance(Duration::from_secs(10)).await;
    settle().await;
    assert_eq!(h.reloader.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn control_changes_and_reload_are_published() {
    let h = harness(ScriptedApi::new(vec![status(401, "")]));
    let mut events = h.panel.subscribe();

    h.panel.activate(Door::Outer).await;

    assert_eq!(
        events.try_recv().expect("disabled event"),
        PanelEvent::ControlChanged {
            door: Door::Outer,
            disabled: true
        }
    );
    assert_eq!(
        events.try_recv().expect("enabled event"),
        PanelEvent::ControlChanged {
            door: Door::Outer,
            disabled: false
        }
    );
    assert_eq!(
        events.try_recv().expect("reload event"),
        PanelEvent::ReloadScheduled {
            after: RELOAD_DELAY
        }
    );
}
