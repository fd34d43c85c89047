//! Bounded, ordered violation store shared by all camera workers.
//!
//! The ledger is the single point of truth for downstream consumers: a
//! newest-first window of the most recent violations, capacity-bounded with
//! automatic eviction of the oldest entry. Concurrent inserts from multiple
//! workers are linearized by an internal mutex; snapshots and aggregates are
//! consistent views, never torn reads. Entries are immutable after insert.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::violation::{Violation, ViolationType};

/// Default number of most-recent violations kept.
pub const DEFAULT_LEDGER_CAPACITY: usize = 10;

struct LedgerInner {
    /// Front is newest.
    entries: VecDeque<Violation>,
    capacity: usize,
    subscribers: Vec<Sender<Violation>>,
}

/// Capacity-bounded, newest-first violation window.
pub struct ViolationLedger {
    inner: Mutex<LedgerInner>,
}

impl ViolationLedger {
    /// Create a ledger keeping at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LedgerInner {
                entries: VecDeque::with_capacity(capacity.max(1)),
                capacity: capacity.max(1),
                subscribers: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerInner> {
        // A worker panicking mid-insert leaves the window intact; recover
        // the guard rather than poisoning every other camera.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a violation at the newest position, evicting the oldest entry
    /// once capacity is exceeded. Each successful insert is pushed to all
    /// live subscribers.
    pub fn insert(&self, violation: Violation) {
        let mut inner = self.lock();
        inner.entries.push_front(violation.clone());
        while inner.entries.len() > inner.capacity {
            inner.entries.pop_back();
        }
        inner
            .subscribers
            .retain(|subscriber| subscriber.send(violation.clone()).is_ok());
    }

    /// Newest-first read-only view of the current window.
    pub fn snapshot(&self) -> Vec<Violation> {
        self.lock().entries.iter().cloned().collect()
    }

    /// Per-type counts plus total over the current window.
    ///
    /// Pure fold over the entries; never mutates the ledger and is safe to
    /// call concurrently with inserts.
    pub fn aggregate(&self) -> ViolationStats {
        let inner = self.lock();
        let mut stats = ViolationStats::default();
        for violation in &inner.entries {
            stats.record(violation.violation_type);
        }
        stats
    }

    /// Register for push notifications; every later insert is delivered.
    pub fn subscribe(&self) -> Receiver<Violation> {
        let (sender, receiver) = mpsc::channel();
        self.lock().subscribers.push(sender);
        receiver
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }
}

/// Per-type violation counts for the statistics display.
#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct ViolationStats {
    pub helmetless: usize,
    pub overspeeding: usize,
    pub red_light: usize,
    pub triple_riding: usize,
    pub unknown: usize,
    pub total: usize,
}

impl ViolationStats {
    fn record(&mut self, violation_type: ViolationType) {
        match violation_type {
            ViolationType::Helmetless => self.helmetless += 1,
            ViolationType::Overspeeding => self.overspeeding += 1,
            ViolationType::RedLight => self.red_light += 1,
            ViolationType::TripleRiding => self.triple_riding += 1,
            ViolationType::Unknown => self.unknown += 1,
        }
        self.total += 1;
    }

    pub fn count(&self, violation_type: ViolationType) -> usize {
        match violation_type {
            ViolationType::Helmetless => self.helmetless,
            ViolationType::Overspeeding => self.overspeeding,
            ViolationType::RedLight => self.red_light,
            ViolationType::TripleRiding => self.triple_riding,
            ViolationType::Unknown => self.unknown,
        }
    }
}
