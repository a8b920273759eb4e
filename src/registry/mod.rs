//! Pending registry — one in-flight future per fingerprint.
//!
//! The registry backs both deduplication and submission locks. Admission is a
//! single atomic step per fingerprint: checking for an in-flight entry and
//! registering a new one happen under the same per-key entry lock, so two
//! racing callers can never both start a round-trip for a deduplicated key.
//!
//! A started round-trip is represented by a [`Flight`]. Completing or dropping
//! it unregisters the entry. Each entry carries a generation id and a flight
//! only removes its own generation, so a non-deduplicating call that replaced
//! an entry is not unregistered when the older call settles.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::trace;

use crate::error::{NormalizedError, normalize};
use crate::fingerprint::Fingerprint;
use crate::transport::TransportError;

/// The settled outcome of one physical round-trip.
pub type Outcome = Result<Value, NormalizedError>;

/// A clonable handle on the outcome of one physical round-trip.
pub type SharedResponse = Shared<BoxFuture<'static, Outcome>>;

struct PendingEntry {
    generation: u64,
    response: SharedResponse,
}

/// How a call wants to treat an identical in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharePolicy {
    /// Refuse to proceed while one is in flight.
    pub lock: bool,
    /// Join the one in flight instead of starting another.
    pub dedupe: bool,
}

/// The outcome of [`PendingRegistry::admit`].
pub enum Admission {
    /// No usable in-flight request existed; a new one was registered.
    /// The caller must drive the [`Flight`] and may await the response.
    Started(Flight, SharedResponse),
    /// An identical request is in flight; await its outcome.
    Shared(SharedResponse),
    /// The call asked for a lock and an identical request is in flight.
    Locked,
}

/// Process-wide map from fingerprint to the in-flight response future.
#[derive(Default)]
pub struct PendingRegistry {
    entries: DashMap<Fingerprint, PendingEntry>,
    generations: AtomicU64,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while a request with this fingerprint is in flight.
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains_key(fingerprint)
    }

    /// Number of fingerprints currently in flight.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lock, share, or register a round-trip for `fingerprint`.
    pub fn admit(self: &Arc<Self>, fingerprint: &Fingerprint, policy: SharePolicy) -> Admission {
        match self.entries.entry(fingerprint.clone()) {
            Entry::Occupied(_) if policy.lock => Admission::Locked,
            Entry::Occupied(occupied) if policy.dedupe => {
                Admission::Shared(occupied.get().response.clone())
            }
            Entry::Occupied(mut occupied) => {
                let (flight, entry) = self.flight(fingerprint);
                trace!(key = %fingerprint, generation = entry.generation, "pending entry replaced");
                let response = entry.response.clone();
                occupied.insert(entry);
                Admission::Started(flight, response)
            }
            Entry::Vacant(vacant) => {
                let (flight, entry) = self.flight(fingerprint);
                trace!(key = %fingerprint, generation = entry.generation, "pending entry registered");
                let response = entry.response.clone();
                vacant.insert(entry);
                Admission::Started(flight, response)
            }
        }
    }

    // Runs under the entry lock: only allocates, never touches `entries`.
    fn flight(self: &Arc<Self>, fingerprint: &Fingerprint) -> (Flight, PendingEntry) {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = oneshot::channel();
        let response = receiver
            .map(|received| {
                received.unwrap_or_else(|_| {
                    Err(normalize(TransportError::Other(
                        "request dropped before completion".to_owned(),
                    )))
                })
            })
            .boxed()
            .shared();
        let flight = Flight {
            registry: Arc::clone(self),
            fingerprint: fingerprint.clone(),
            generation,
            sender: Some(sender),
        };
        (flight, PendingEntry { generation, response })
    }

    fn release(&self, fingerprint: &Fingerprint, generation: u64) -> bool {
        let removed = self
            .entries
            .remove_if(fingerprint, |_, entry| entry.generation == generation)
            .is_some();
        trace!(key = %fingerprint, generation, removed, "pending entry released");
        removed
    }
}

/// The producing side of one registered round-trip.
///
/// [`complete`](Self::complete) unregisters the entry, then hands the outcome
/// to every waiter. Dropping an uncompleted flight unregisters the entry and
/// fails its waiters, so the entry is removed exactly once however the
/// round-trip ends.
pub struct Flight {
    registry: Arc<PendingRegistry>,
    fingerprint: Fingerprint,
    generation: u64,
    sender: Option<oneshot::Sender<Outcome>>,
}

impl Flight {
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Settles the round-trip.
    pub fn complete(mut self, outcome: Outcome) {
        self.registry.release(&self.fingerprint, self.generation);
        if let Some(sender) = self.sender.take() {
            // Nobody waiting is fine: the outcome was only needed for side effects.
            let _ = sender.send(outcome);
        }
    }
}

impl Drop for Flight {
    fn drop(&mut self) {
        if self.sender.is_some() {
            self.registry.release(&self.fingerprint, self.generation);
        }
    }
}
