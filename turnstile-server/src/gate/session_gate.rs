use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Process-wide "a peer session is in progress" flag.
///
/// Cloning yields another handle to the same flag. The only way to set it is
/// [`SessionGate::try_acquire`], and the only way to clear it is dropping the
/// returned [`GateLease`], so every acquisition is released exactly once.
#[derive(Clone)]
pub struct SessionGate {
    state: Arc<watch::Sender<bool>>,
}

impl SessionGate {
    pub fn new() -> Self {
        Self {
            state: Arc::new(watch::Sender::new(false)),
        }
    }

    /// Compare-and-set false -> true.
    pub fn try_acquire(&self) -> Option<GateLease> {
        let acquired = self.state.send_if_modified(|held| {
            if *held {
                false
            } else {
                *held = true;
                true
            }
        });

        if !acquired {
            return None;
        }

        debug!("Session gate acquired");
        Some(GateLease {
            gate: self.clone(),
        })
    }

    pub fn is_held(&self) -> bool {
        *self.state.borrow()
    }

    /// Receiver that observes every acquire/release.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }

    fn release(&self) {
        let released = self
            .state
            .send_if_modified(|held| std::mem::replace(held, false));
        if released {
            debug!("Session gate released");
        }
    }
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGate")
            .field("held", &self.is_held())
            .finish()
    }
}

/// Proof of holding the [`SessionGate`]; releases it on drop.
#[must_use = "dropping the lease releases the session gate"]
pub struct GateLease {
    gate: SessionGate,
}

impl fmt::Debug for GateLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GateLease")
    }
}

impl Drop for GateLease {
    fn drop(&mut self) {
        self.gate.release();
    }
}
