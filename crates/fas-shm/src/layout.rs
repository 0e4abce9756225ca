// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Memory layout of the shared control block
//!
//! ```text
//! offset  size  field
//! 0       1     running (bool)
//! 4       4     write_cursor (u32, always < RING_CAPACITY)
//! 8       68*N  slots: edge_count (u32) + 8 edges of (u, v) u32 pairs
//! ```
//!
//! A freshly truncated (zero-filled) segment is a valid block: not running,
//! cursor 0, every slot empty.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use fas_graph::{Candidate, Edge, MAX_FEEDBACK_EDGES};

/// Number of slots in the ring
pub const RING_CAPACITY: usize = 20;

/// One published candidate as stored in shared memory
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RingSlot {
    pub edge_count: u32,
    pub edges: [Edge; MAX_FEEDBACK_EDGES],
}

impl RingSlot {
    /// Valid edges of the slot. A corrupt count is clamped to the array.
    pub fn edges(&self) -> &[Edge] {
        let count = (self.edge_count as usize).min(MAX_FEEDBACK_EDGES);
        &self.edges[..count]
    }

    pub fn to_candidate(&self) -> Candidate {
        let mut candidate = Candidate::empty();
        for edge in self.edges() {
            candidate.push(*edge);
        }
        candidate
    }
}

impl From<&Candidate> for RingSlot {
    fn from(candidate: &Candidate) -> Self {
        let mut slot = RingSlot {
            edge_count: candidate.edge_count() as u32,
            ..RingSlot::default()
        };
        slot.edges[..candidate.edge_count()].copy_from_slice(candidate.edges());
        slot
    }
}

/// The whole shared memory segment
///
/// Slots are not synchronised by the type system. The semaphore protocol
/// guarantees that a slot is written by at most one producer and never read
/// while it is being written; see [`write_slot`](Self::write_slot) and
/// [`read_slot`](Self::read_slot).
#[repr(C)]
pub struct SharedControlBlock {
    running: AtomicBool,
    write_cursor: AtomicU32,
    slots: [UnsafeCell<RingSlot>; RING_CAPACITY],
}

// SAFETY: the flag and cursor are atomics; slot access goes through the
// unsafe accessors whose callers uphold the semaphore protocol.
unsafe impl Sync for SharedControlBlock {}

impl SharedControlBlock {
    /// Size of the shared memory segment in bytes
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Heap-backed block in the all-zero state, for single-process use.
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            write_cursor: AtomicU32::new(0),
            slots: std::array::from_fn(|_| UnsafeCell::new(RingSlot::default())),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    /// The flag itself, so a signal handler can clear it.
    pub fn running_flag(&self) -> &AtomicBool {
        &self.running
    }

    /// Slot the next producer writes to.
    pub fn write_cursor(&self) -> usize {
        self.write_cursor.load(Ordering::Acquire) as usize % RING_CAPACITY
    }

    /// Move the cursor to the next slot and return it. Only the producer
    /// holding the mutual exclusion semaphore may call this.
    pub fn advance_write_cursor(&self) -> usize {
        let next = (self.write_cursor() + 1) % RING_CAPACITY;
        self.write_cursor.store(next as u32, Ordering::Release);
        next
    }

    /// Back to the initial state: stopped, cursor at slot 0.
    pub(crate) fn reset(&self) {
        self.running.store(false, Ordering::Release);
        self.write_cursor.store(0, Ordering::Release);
    }

    /// Store `candidate` in slot `index % RING_CAPACITY`.
    ///
    /// # Safety
    ///
    /// The caller must hold a `free` permit for this slot and the mutual
    /// exclusion semaphore, so no other process reads or writes it.
    pub unsafe fn write_slot(&self, index: usize, candidate: &Candidate) {
        let slot = self.slots[index % RING_CAPACITY].get();
        // SAFETY: exclusive access per the caller contract
        unsafe { slot.write(RingSlot::from(candidate)) };
    }

    /// Copy slot `index % RING_CAPACITY` out of shared memory.
    ///
    /// # Safety
    ///
    /// The caller must hold a `used` permit for this slot, so no producer is
    /// writing it.
    pub unsafe fn read_slot(&self, index: usize) -> RingSlot {
        let slot = self.slots[index % RING_CAPACITY].get();
        // SAFETY: no concurrent writer per the caller contract
        unsafe { slot.read() }
    }
}

impl Default for SharedControlBlock {
    fn default() -> Self {
        Self::new()
    }
}
