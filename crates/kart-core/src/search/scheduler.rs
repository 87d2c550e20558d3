use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::{Error, Result};

type Trigger = Arc<dyn Fn(String) + Send + Sync>;

/// A scheduled-but-not-yet-fired search. Aborts its task when dropped.
struct PendingTimer {
    task: JoinHandle<()>,
}

impl PendingTimer {
    fn is_alive(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PendingTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Trailing-edge debounce over raw search-box input.
///
/// Each [`on_input`](Self::on_input) replaces the single pending timer; the
/// trigger runs with the last text once `delay` passes without further input.
/// There is no leading-edge call and no maximum wait, so input arriving faster
/// than `delay` forever keeps the search from firing.
///
/// Dropping the scheduler cancels whatever is pending.
pub struct SearchScheduler {
    delay: Duration,
    trigger: Trigger,
    runtime: Handle,
    /// Zero or one timer, never more
    pending: Option<PendingTimer>,
}

impl SearchScheduler {
    /// Create a scheduler on the current Tokio runtime.
    pub fn new<F>(delay: Duration, trigger: F) -> Result<Self>
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        Ok(Self::with_handle(runtime, delay, trigger))
    }

    pub fn with_handle<F>(runtime: Handle, delay: Duration, trigger: F) -> Self
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        Self {
            delay,
            trigger: Arc::new(trigger),
            runtime,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record new input text, restarting the quiescence window.
    pub fn on_input(&mut self, text: impl Into<String>) {
        let text = text.into();
        // The old timer must be gone before the new one exists
        self.cancel();

        let deadline = Instant::now() + self.delay;
        let trigger = Arc::clone(&self.trigger);
        tracing::trace!("Arming search timer for '{}' ({:?})", text, self.delay);

        let task = self.runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            tracing::debug!("Input settled, searching for '{}'", text);
            trigger(text);
        });
        self.pending = Some(PendingTimer { task });
    }

    /// Drop the pending timer, if any. Safe to call at any time.
    pub fn cancel(&mut self) {
        if let Some(timer) = self.pending.take() {
            if timer.is_alive() {
                tracing::debug!("Cancelled pending search");
            }
        }
    }

    /// Teardown alias for [`cancel`](Self::cancel).
    pub fn reset(&mut self) {
        self.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(PendingTimer::is_alive)
    }
}

impl Drop for SearchScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
