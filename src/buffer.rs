//! Bounded observation buffer between the capture thread and the sink.
//!
//! A fixed array of slots with `head` (next write) and `tail` (oldest
//! pending) indices. One slot always stays empty so that `head == tail`
//! means empty; a buffer of `capacity` slots therefore holds at most
//! `capacity - 1` records.
//!
//! Pushing never blocks. When the buffer is full the incoming record is
//! either dropped or, in ring mode, stored after evicting the oldest
//! pending record; both count as an overrun. Consumers read with
//! [`ObservationBuffer::pop`] and release the slot with
//! [`ObservationBuffer::advance_tail`] once they are done with it.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use crate::domain::Observation;
use crate::error::BufferError;

/// What happened to a pushed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Stored,
    /// Stored after discarding the oldest pending record (ring mode).
    Evicted,
    /// Buffer full; the record was discarded.
    Dropped,
    /// An identical sighting is already pending; nothing was written.
    Duplicate,
}

/// Point-in-time buffer statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferStats {
    pub pending: usize,
    pub capacity: usize,
    pub percent_full: f64,
    /// The next push will overrun.
    pub full: bool,
    pub overruns: u64,
}

struct Ring {
    slots: Vec<Option<Observation>>,
    head: usize,
    tail: usize,
    /// Set once `head` is one slot behind `tail`; cleared when a slot is
    /// released.
    full: bool,
    overruns: u64,
    closed: bool,
}

impl Ring {
    fn last(&self) -> usize {
        self.slots.len() - 1
    }

    fn next(&self, index: usize) -> usize {
        if index == self.last() {
            0
        } else {
            index + 1
        }
    }

    fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Writing one more record would make `head` catch up with `tail`.
    fn cursors_full(&self) -> bool {
        self.head + 1 == self.tail || (self.head == self.last() && self.tail == 0)
    }

    fn pending(&self) -> usize {
        if self.head >= self.tail {
            self.head - self.tail
        } else {
            self.slots.len() - self.tail + self.head
        }
    }

    fn has_pending_match(&self, record: &Observation) -> bool {
        let mut index = self.tail;
        while index != self.head {
            if let Some(pending) = &self.slots[index] {
                if pending.same_sighting(record) {
                    return true;
                }
            }
            index = self.next(index);
        }
        false
    }
}

/// Fixed-capacity store of observations shared by one producer and one
/// or more consumers.
pub struct ObservationBuffer {
    ring: Mutex<Ring>,
    signal: Condvar,
    ring_mode: bool,
}

impl ObservationBuffer {
    /// Create a buffer of `capacity` slots. With `ring_mode` set a full
    /// buffer overwrites its oldest record instead of dropping new ones.
    pub fn new(capacity: usize, ring_mode: bool) -> Result<Self, BufferError> {
        if capacity < 2 {
            return Err(BufferError::CapacityTooSmall(capacity));
        }
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);

        Ok(Self {
            ring: Mutex::new(Ring {
                slots,
                head: 0,
                tail: 0,
                full: false,
                overruns: 0,
                closed: false,
            }),
            signal: Condvar::new(),
            ring_mode,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Ring> {
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of slots, including the one kept free.
    pub fn capacity(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_ring(&self) -> bool {
        self.ring_mode
    }

    /// Store a record without blocking.
    ///
    /// With `suppress_duplicates` set, a record matching a pending one on
    /// (IP, kind, hardware address) is skipped and not counted as an
    /// overrun. Only a stored record wakes blocked consumers.
    pub fn push(&self, record: Observation, suppress_duplicates: bool) -> PushOutcome {
        let mut ring = self.lock();

        if suppress_duplicates && !ring.is_empty() && ring.has_pending_match(&record) {
            return PushOutcome::Duplicate;
        }

        let mut outcome = PushOutcome::Stored;
        if ring.full {
            ring.overruns += 1;
            if !self.ring_mode {
                return PushOutcome::Dropped;
            }
            let tail = ring.tail;
            ring.slots[tail] = None;
            ring.tail = ring.next(tail);
            outcome = PushOutcome::Evicted;
        }

        let head = ring.head;
        ring.slots[head] = Some(record);
        ring.head = ring.next(head);
        ring.full = ring.cursors_full();

        drop(ring);
        self.signal.notify_all();
        outcome
    }

    /// Return a copy of the oldest pending record without releasing it.
    ///
    /// With `block` set this waits until a record is pushed. A blocking
    /// pop on a closed, empty buffer returns `None`.
    pub fn pop(&self, block: bool) -> Option<Observation> {
        let mut ring = self.lock();

        if block {
            while ring.is_empty() && !ring.closed {
                ring = self
                    .signal
                    .wait(ring)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }

        if ring.is_empty() {
            return None;
        }
        ring.slots[ring.tail].clone()
    }

    /// Release the oldest pending record. No-op when empty.
    pub fn advance_tail(&self) {
        let mut ring = self.lock();
        if ring.is_empty() {
            return;
        }
        let tail = ring.tail;
        ring.slots[tail] = None;
        ring.tail = ring.next(tail);
        ring.full = false;
    }

    /// Discard every pending record.
    pub fn flush(&self) {
        let mut ring = self.lock();
        while !ring.is_empty() {
            let tail = ring.tail;
            ring.slots[tail] = None;
            ring.tail = ring.next(tail);
        }
        ring.full = false;
    }

    /// Stop blocking consumers. Pending records can still be popped, and
    /// blocking pops return `None` once the buffer is drained.
    pub fn close(&self) {
        self.lock().closed = true;
        self.signal.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn len(&self) -> usize {
        self.lock().pending()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn overruns(&self) -> u64 {
        self.lock().overruns
    }

    pub fn stats(&self) -> BufferStats {
        let ring = self.lock();
        let pending = ring.pending();
        let capacity = ring.slots.len();
        BufferStats {
            pending,
            capacity,
            percent_full: pending as f64 / capacity as f64 * 100.0,
            full: ring.full,
            overruns: ring.overruns,
        }
    }
}
