//! Bounded admission gate.
//!
//! # Responsibilities
//! - Track how many of a fixed number of permits are free
//! - Hand out permits without ever waiting
//! - Return a permit on every exit path of the guarded work
//!
//! # Design Decisions
//! - A single `AtomicUsize` updated with compare-and-swap; no lock
//! - A failed acquire has no side effect and never queues the caller
//! - No fairness: whichever caller wins the CAS gets the last permit

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Fixed-capacity counting gate with non-blocking acquire.
#[derive(Debug)]
pub struct AdmissionGate {
    capacity: usize,
    available: AtomicUsize,
}

impl AdmissionGate {
    /// Create a gate with `capacity` free permits. Capacity must be positive.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "admission gate capacity must be positive");
        Self {
            capacity,
            available: AtomicUsize::new(capacity),
        }
    }

    /// Take one permit if any is free.
    ///
    /// Returns `false` without touching the counter when the gate is full.
    /// A successful call must be paired with exactly one [`release`](Self::release).
    pub fn try_acquire(&self) -> bool {
        let mut prev = self.available.load(Ordering::Acquire);
        loop {
            if prev == 0 {
                return false;
            }
            match self.available.compare_exchange_weak(
                prev,
                prev - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(x) => prev = x,
            }
        }
    }

    /// Return one permit.
    ///
    /// Never exceeds capacity: a release with no matching acquire is logged and dropped.
    pub fn release(&self) {
        let capacity = self.capacity;
        let released = self
            .available
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < capacity).then_some(n + 1)
            });

        if released.is_err() {
            tracing::warn!(capacity, "Admission permit released with no matching acquire");
        }
    }

    /// Scoped acquire: the returned permit releases itself when dropped.
    pub fn try_permit(self: &Arc<Self>) -> Option<AdmissionPermit> {
        self.try_acquire().then(|| AdmissionPermit {
            gate: Arc::clone(self),
        })
    }

    /// Number of permits currently free.
    pub fn available(&self) -> usize {
        self.available.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of permits currently held.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.available()
    }
}

/// A held permit. Dropping it releases the permit, including when the
/// owning future is cancelled or unwinds.
#[derive(Debug)]
pub struct AdmissionPermit {
    gate: Arc<AdmissionGate>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.gate.release();
    }
}
