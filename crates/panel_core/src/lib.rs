//! Rendering-agnostic core of the door control panel.
//!
//! A [`DoorPanel`] owns one control per door. Activating a control issues a
//! single request to the door service through a [`DoorApi`], classifies the
//! response and reacts by posting toasts to the shared [`ToastTray`] and,
//! for failures the current session cannot recover from, by scheduling a
//! [`Reloader::reload`] after [`RELOAD_DELAY`].

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod api;
pub mod outcome;
pub mod panel;
pub mod timer;
pub mod toast;

pub use api::{Credentials, DoorApi, DoorResponse, HttpDoorApi, TransportError};
pub use outcome::{classify, DoorOutcome, RATE_LIMIT_WINDOW, RELOAD_DELAY, TOAST_LIFETIME};
pub use panel::{Activation, DoorPanel, PanelEvent, Reloader};
pub use timer::{schedule, TimerHandle, TimerSet};
pub use toast::{Toast, ToastId, ToastTray, TrayEvent};

/// Locks a std mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
