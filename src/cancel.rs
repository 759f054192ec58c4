//! Cooperative cancellation token shared by sessions and catalog fetches.

use tokio::sync::watch;

/// Cancellation signal owned by a session (or view) for its lifetime.
///
/// Every asynchronous operation started on behalf of the owner selects
/// against this token and drops its result instead of applying it once the
/// token fires. Cloning yields another handle onto the same signal.
#[derive(Debug, Clone)]
pub struct Cancellation {
    sender: watch::Sender<bool>,
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancellation {
    /// Fresh, un-fired token.
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(false);
        Self { sender }
    }

    /// Fire the token. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Whether the token has fired.
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolve once the token fires; resolves immediately if it already has.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // wait_for only errs when the sender is dropped, which cannot happen
        // while `self` holds it.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}
