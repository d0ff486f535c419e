use chrono::Local;
use panel_core::{DoorPanel, PanelEvent, Toast, TrayEvent};
use shared::{domain::Door, error::ParseDoorError};
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use tracing::{debug, warn};

pub const HELP: &str = "commands: inner (i), outer (o), help (?), quit (q)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Activate(Door),
    Help,
    Quit,
    Empty,
}

pub fn parse_input(line: &str) -> Result<Input, ParseDoorError> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" => Ok(Input::Empty),
        "help" | "?" => Ok(Input::Help),
        "quit" | "q" | "exit" => Ok(Input::Quit),
        other => other.parse().map(Input::Activate),
    }
}

pub fn render_toast(toast: &Toast) -> String {
    format!(
        "[{}] {}: {}",
        toast.shown_at.with_timezone(&Local).format("%H:%M:%S"),
        toast.severity,
        toast.text
    )
}

/// Prints tray entries as they appear until the panel's channels close.
pub fn spawn_printer(panel: &DoorPanel) -> JoinHandle<()> {
    let mut tray = panel.tray().subscribe();
    let mut controls = panel.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                event = tray.recv() => match event {
                    Ok(TrayEvent::Shown(toast)) => println!("{}", render_toast(&toast)),
                    Ok(TrayEvent::Removed(id)) => debug!(%id, "toast dismissed"),
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "toast events dropped"),
                    Err(RecvError::Closed) => break,
                },
                event = controls.recv() => match event {
                    Ok(PanelEvent::ControlChanged { door, disabled }) => {
                        debug!(control = door.control_id(), disabled, "{} control changed", door.label())
                    }
                    Ok(PanelEvent::ReloadScheduled { after }) => {
                        debug!(after_ms = after.as_millis() as u64, "reload pending")
                    }
                    Err(RecvError::Lagged(skipped)) => warn!(skipped, "panel events dropped"),
                    Err(RecvError::Closed) => break,
                },
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use panel_core::ToastId;
    use shared::domain::Severity;

    use super::*;

    #[test]
    fn parses_panel_input() {
        assert_eq!(parse_input("inner"), Ok(Input::Activate(Door::Inner)));
        assert_eq!(parse_input(" O \n"), Ok(Input::Activate(Door::Outer)));
        assert_eq!(parse_input("?"), Ok(Input::Help));
        assert_eq!(parse_input("Quit"), Ok(Input::Quit));
        assert_eq!(parse_input("   "), Ok(Input::Empty));
        assert!(parse_input("garage").is_err());
    }

    #[test]
    fn toast_lines_carry_severity_and_text() {
        let toast = Toast {
            id: ToastId(1),
            text: "Too fast! Wait at least 10 seconds until you press again.".into(),
            severity: Severity::Warning,
            shown_at: Utc::now(),
        };
        let line = render_toast(&toast);
        assert!(line.starts_with('['));
        assert!(line.ends_with(
            "] warning: Too fast! Wait at least 10 seconds until you press again."
        ));
    }
}
