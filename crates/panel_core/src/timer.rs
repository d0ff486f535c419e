//! Delayed side effects that can be cancelled when the panel is torn down.

use std::{sync::Mutex, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{sleep_until, Instant},
};

use crate::lock;

/// Handle to a scheduled callback. Dropping it leaves the callback scheduled.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Runs `f` once `delay` has elapsed, measured from this call.
///
/// Must be called from within a Tokio runtime.
pub fn schedule<F>(delay: Duration, f: F) -> TimerHandle
where
    F: FnOnce() + Send + 'static,
{
    let deadline = Instant::now() + delay;
    let task = tokio::spawn(async move {
        sleep_until(deadline).await;
        f();
    });
    TimerHandle { task }
}

/// A group of timers cancelled together.
#[derive(Debug, Default)]
pub struct TimerSet {
    handles: Mutex<Vec<TimerHandle>>,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule<F>(&self, delay: Duration, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = schedule(delay, f);
        let mut handles = lock(&self.handles);
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    pub fn pending(&self) -> usize {
        lock(&self.handles)
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }

    pub fn cancel_all(&self) {
        for handle in lock(&self.handles).drain(..) {
            handle.cancel();
        }
    }
}

impl Drop for TimerSet {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
