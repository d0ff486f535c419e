use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;
use panel_core::Credentials;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub server_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:3000".into(),
            username: None,
            password: None,
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    pub fn credentials(&self) -> Option<Credentials> {
        self.username.as_ref().map(|username| Credentials {
            username: username.clone(),
            password: self.password.clone(),
        })
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub server_url: Option<String>,
    pub username: Option<String>,
}

pub fn load_settings(config_path: &Path, overrides: &Overrides) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(config_path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse '{}'", config_path.display()))?,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
        Err(error) => {
            return Err(error)
                .with_context(|| format!("failed to read '{}'", config_path.display()))
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());

    if let Some(v) = &overrides.server_url {
        settings.server_url = v.clone();
    }
    if let Some(v) = &overrides.username {
        settings.username = Some(v.clone());
    }

    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg = toml::from_str::<HashMap<String, String>>(raw)?;
    if let Some(v) = file_cfg.get("server_url") {
        settings.server_url = v.clone();
    }
    if let Some(v) = file_cfg.get("username") {
        settings.username = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("password") {
        settings.password = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("request_timeout_secs") {
        let secs = v
            .parse::<u64>()
            .with_context(|| format!("request_timeout_secs must be a number, got '{v}'"))?;
        settings.request_timeout_secs = Some(secs);
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("DOOR_PANEL_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = var("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = var("DOOR_PANEL_USERNAME") {
        settings.username = Some(v);
    }
    if let Some(v) = var("APP__USERNAME") {
        settings.username = Some(v);
    }

    if let Some(v) = var("DOOR_PANEL_PASSWORD") {
        settings.password = Some(v);
    }
    if let Some(v) = var("APP__PASSWORD") {
        settings.password = Some(v);
    }

    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = Some(parsed);
        }
    }
}
