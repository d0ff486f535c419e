//! One panel "page load": the HTTP client, tray and panel built from settings.

use std::sync::Arc;

use anyhow::Context;
use panel_core::{DoorPanel, HttpDoorApi, Reloader, ToastTray};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::Settings;

pub struct Session {
    pub panel: Arc<DoorPanel>,
}

impl Session {
    pub fn open(settings: &Settings, reloader: Arc<dyn Reloader>) -> anyhow::Result<Self> {
        let api = HttpDoorApi::new(
            &settings.server_url,
            settings.credentials(),
            settings.request_timeout(),
        )
        .context("failed to set up the door service client")?;
        info!(
            server_url = %api.base_url(),
            authenticated = settings.username.is_some(),
            "panel session opened"
        );

        let panel = DoorPanel::new(Arc::new(api), Arc::new(ToastTray::new()), reloader);
        Ok(Self {
            panel: Arc::new(panel),
        })
    }

    pub fn close(&self) {
        self.panel.teardown();
    }
}

/// Asks the interactive loop to rebuild the session.
pub struct ChannelReloader {
    tx: mpsc::UnboundedSender<()>,
}

impl ChannelReloader {
    pub fn new(tx: mpsc::UnboundedSender<()>) -> Self {
        Self { tx }
    }
}

impl Reloader for ChannelReloader {
    fn reload(&self) {
        if self.tx.send(()).is_err() {
            warn!("reload requested after the session was closed");
        }
    }
}

/// Single-shot sessions exit before a reload could matter.
pub struct NoopReloader;

impl Reloader for NoopReloader {
    fn reload(&self) {
        info!("reload skipped for single-shot session");
    }
}
