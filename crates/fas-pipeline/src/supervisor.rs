// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Supervisor: single consumer of the ring
//!
//! ```text
//! Created ──run──▶ Running ──running=false──▶ Draining ──▶ Terminated
//! ```
//!
//! In `Running` every iteration takes one `used` permit, inspects the slot
//! at the read cursor, gives one `free` permit back and advances. When the
//! loop ends `used` is posted once more so no process stays parked on it,
//! then everything is torn down.

use fas_graph::{Candidate, MAX_FEEDBACK_EDGES};
use fas_shm::{
    ResourceNames, RingSlot, SemaphoreKind, SharedSession, TeardownReport, WaitOutcome,
    RING_CAPACITY,
};
use tracing::{debug, error, info, warn};

use crate::error::PipelineError;
use crate::report::SolutionReporter;

/// Best-count sentinel before any slot was read: one more than any
/// candidate can hold.
pub const NO_SOLUTION: usize = MAX_FEEDBACK_EDGES + 1;

const ROLE: &str = "supervisor";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Created,
    Running,
    Draining,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A generator delivered an empty feedback arc set
    AcyclicFound,
    /// The running flag was cleared by a signal or another process
    Cancelled,
}

#[derive(Debug)]
pub struct SupervisorOutcome {
    /// Smallest solution received, if any slot was evaluated
    pub best: Option<Candidate>,
    pub slots_consumed: u64,
    pub reason: StopReason,
    pub teardown: TeardownReport,
}

pub struct Supervisor {
    session: SharedSession,
    state: SupervisorState,
    read_cursor: usize,
    best_edge_count: usize,
    best: Option<Candidate>,
    slots_consumed: u64,
    reason: StopReason,
}

impl Supervisor {
    /// Create the shared resources and enter `Created`.
    pub fn create(names: &ResourceNames) -> Result<Self, PipelineError> {
        let session = SharedSession::create(names)?;
        Ok(Self::new(session))
    }

    /// Take over an owner session and raise its running flag.
    pub fn new(session: SharedSession) -> Self {
        session.set_running(true);
        info!(shm = %session.names().shared_memory, "Supervisor created");
        Self {
            session,
            state: SupervisorState::Created,
            read_cursor: 0,
            best_edge_count: NO_SOLUTION,
            best: None,
            slots_consumed: 0,
            reason: StopReason::Cancelled,
        }
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SharedSession {
        &mut self.session
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn best_edge_count(&self) -> usize {
        self.best_edge_count
    }

    pub fn read_cursor(&self) -> usize {
        self.read_cursor
    }

    fn transition(&mut self, next: SupervisorState) {
        info!(from = ?self.state, to = ?next, "Supervisor state change");
        self.state = next;
    }

    /// Consume one slot: wait for `used`, evaluate unless cancelled, post
    /// `free`, advance the read cursor.
    pub fn consume_next<R: SolutionReporter>(&mut self, reporter: &mut R) -> Result<(), PipelineError> {
        let outcome = self
            .session
            .acquire(SemaphoreKind::Used)
            .map_err(PipelineError::ipc(ROLE, "wait on used"))?;

        // After a cancellation the slot may be stale or only partly written,
        // so it is not read at all
        let cancelled = outcome == WaitOutcome::Interrupted || !self.session.is_running();
        if cancelled {
            debug!(slot = self.read_cursor, "Cancellation observed, slot skipped");
        } else {
            // SAFETY: holding a used permit for this slot
            let slot = unsafe { self.session.control().read_slot(self.read_cursor) };
            self.evaluate(&slot, reporter);
        }

        self.session
            .release(SemaphoreKind::Free)
            .map_err(PipelineError::ipc(ROLE, "post free"))?;
        self.read_cursor = (self.read_cursor + 1) % RING_CAPACITY;
        self.slots_consumed += 1;
        Ok(())
    }

    fn evaluate<R: SolutionReporter>(&mut self, slot: &RingSlot, reporter: &mut R) {
        let candidate = slot.to_candidate();
        let edge_count = candidate.edge_count();
        if edge_count >= self.best_edge_count {
            return;
        }

        self.best_edge_count = edge_count;
        self.best = Some(candidate);

        if candidate.is_acyclic() {
            info!("Generator found an acyclic ordering, stopping");
            reporter.report_acyclic();
            self.reason = StopReason::AcyclicFound;
            self.session.request_stop();
        } else {
            info!(edges = edge_count, solution = %candidate, "New best feedback arc set");
            reporter.report_improvement(&candidate);
        }
    }

    /// Drain the ring until the running flag drops, then tear down.
    ///
    /// On a fatal IPC error the shared resources are still released (on
    /// drop) before the error is returned.
    pub fn run<R: SolutionReporter>(mut self, reporter: &mut R) -> Result<SupervisorOutcome, PipelineError> {
        self.transition(SupervisorState::Running);

        while self.session.is_running() {
            if let Err(err) = self.consume_next(reporter) {
                error!(error = ?err, "Supervisor loop failed");
                return Err(err);
            }
        }

        self.transition(SupervisorState::Draining);
        // No process may stay parked on `used` after the flag dropped
        if let Err(err) = self.session.release(SemaphoreKind::Used) {
            warn!(error = %err, "Final used post failed");
        }
        reporter.report_final(self.best.as_ref());

        let Supervisor {
            session,
            best,
            slots_consumed,
            reason,
            ..
        } = self;
        let teardown = session.teardown();
        info!(state = ?SupervisorState::Terminated, slots_consumed, "Supervisor finished");

        Ok(SupervisorOutcome {
            best,
            slots_consumed,
            reason,
            teardown,
        })
    }
}
