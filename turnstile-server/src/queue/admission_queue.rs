use crate::error::{GatewayError, GatewayResult};
use crate::gate::{GateLease, SessionGate};
use crate::queue::ClientConnection;
use parking_lot::Mutex;
use turnstile_core::ClientId;

/// Outcome of one eligibility check for a queued client.
#[derive(Debug)]
pub enum Admission {
    /// Head of the queue and the gate was free; the lease now holds it.
    Eligible(GateLease),
    /// Somebody else is ahead or a session is in progress.
    Waiting(usize),
    /// The client is no longer queued.
    Departed,
}

/// FIFO of connected clients, bounded by `capacity`.
///
/// Positions are never stored: they are the live index of a client, so they
/// shift down as soon as anybody ahead leaves.
#[derive(Debug)]
pub struct AdmissionQueue {
    entries: Mutex<Vec<ClientConnection>>,
    capacity: usize,
}

impl AdmissionQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    /// Appends the client unless the queue is full. Returns its position.
    pub fn try_admit(&self, connection: ClientConnection) -> GatewayResult<usize> {
        let mut entries = self.entries.lock();

        if entries.len() >= self.capacity {
            return Err(GatewayError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        entries.push(connection);
        Ok(entries.len() - 1)
    }

    pub fn position(&self, id: &ClientId) -> Option<usize> {
        self.entries.lock().iter().position(|c| &c.id == id)
    }

    /// Removes the client wherever it sits. Safe to call more than once.
    pub fn remove(&self, id: &ClientId) -> Option<ClientConnection> {
        let mut entries = self.entries.lock();
        let position = entries.iter().position(|c| &c.id == id)?;
        Some(entries.remove(position))
    }

    /// Position lookup and gate acquisition under one lock, so two clients
    /// can never both come out eligible.
    pub fn evaluate(&self, id: &ClientId, gate: &SessionGate) -> Admission {
        let entries = self.entries.lock();

        match entries.iter().position(|c| &c.id == id) {
            None => Admission::Departed,
            Some(0) => match gate.try_acquire() {
                Some(lease) => Admission::Eligible(lease),
                None => Admission::Waiting(0),
            },
            Some(position) => Admission::Waiting(position),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queued ids in order.
    pub fn snapshot(&self) -> Vec<ClientId> {
        self.entries.lock().iter().map(|c| c.id).collect()
    }
}
