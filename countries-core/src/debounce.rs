//! Debounced search-text commits.
//!
//! The search box keeps its own raw text; a [`Debouncer`] turns the
//! keystroke stream into committed queries by emitting a value only
//! after [`SEARCH_DEBOUNCE`] of silence. Re-submitting cancels the
//! pending emission outright; it is never fired early.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Quiet period before a submitted value is committed.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Cancellable scheduled emission of the most recent submitted value.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    tx: mpsc::UnboundedSender<String>,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// Create a debouncer and the channel its commits arrive on.
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { delay, tx, pending: None }, rx)
    }

    /// Schedule `value` for emission after the quiet period, cancelling
    /// any previously scheduled emission.
    pub fn submit(&mut self, value: impl Into<String>) {
        self.cancel();

        let value = value.into();
        let delay = self.delay;
        let tx = self.tx.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(value);
        }));
    }

    /// Drop the pending emission, if any.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, sleep};

    #[tokio::test(start_paused = true)]
    async fn commits_after_the_quiet_period() {
        let (mut debouncer, mut rx) = Debouncer::new(SEARCH_DEBOUNCE);

        debouncer.submit("fin");
        advance(Duration::from_millis(499)).await;
        assert!(rx.try_recv().is_err());

        advance(Duration::from_millis(2)).await;
        // Let the spawned task run after the clock moved.
        sleep(Duration::from_millis(0)).await;
        assert_eq!(rx.try_recv().ok().as_deref(), Some("fin"));
    }

    #[tokio::test(start_paused = true)]
    async fn resubmission_cancels_the_pending_commit() {
        let (mut debouncer, mut rx) = Debouncer::new(SEARCH_DEBOUNCE);

        debouncer.submit("f");
        advance(Duration::from_millis(400)).await;
        debouncer.submit("fi");
        advance(Duration::from_millis(400)).await;
        debouncer.submit("fin");

        advance(Duration::from_millis(501)).await;
        sleep(Duration::from_millis(0)).await;

        // Only the final value is ever committed.
        assert_eq!(rx.try_recv().ok().as_deref(), Some("fin"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_the_pending_commit() {
        let (mut debouncer, mut rx) = Debouncer::new(SEARCH_DEBOUNCE);

        debouncer.submit("fin");
        debouncer.cancel();

        advance(Duration::from_secs(2)).await;
        sleep(Duration::from_millis(0)).await;
        assert!(rx.try_recv().is_err());
    }
}
