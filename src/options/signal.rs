//! Abort signal forwarded to transports.

use std::sync::Arc;

use tokio::sync::watch;

/// A clonable cancellation token a caller attaches to a request.
///
/// The client never inspects it; it travels inside
/// [`EffectiveOptions`](super::EffectiveOptions) so the transport can stop
/// its round-trip. All clones observe the same state.
#[derive(Clone, Debug)]
pub struct AbortSignal {
    state: Arc<watch::Sender<bool>>,
}

impl AbortSignal {
    /// Create a new signal (not aborted).
    pub fn new() -> Self {
        Self {
            state: Arc::new(watch::Sender::new(false)),
        }
    }

    /// Abort. Every clone and every pending [`aborted`](Self::aborted) wait observes it.
    pub fn abort(&self) {
        self.state.send_replace(true);
    }

    /// Check if this signal has been aborted.
    pub fn is_aborted(&self) -> bool {
        *self.state.borrow()
    }

    /// Resolves once the signal is aborted.
    pub async fn aborted(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so this only returns on abort.
        let _ = rx.wait_for(|aborted| *aborted).await;
    }
}

impl Default for AbortSignal {
    fn default() -> Self {
        Self::new()
    }
}
