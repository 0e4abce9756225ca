// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Generator: one of many producers
//!
//! Publishing a candidate:
//! 1. wait `mutualExclusion`
//! 2. re-check the running flag (it may have dropped while queued)
//! 3. wait `free`
//! 4. write the slot at the shared write cursor and advance it
//! 5. post `used`, post `mutualExclusion`
//!
//! Every exit path between 1 and 5 posts `used` so a supervisor waiting on
//! an empty ring wakes up, and posts `mutualExclusion` if it holds it so the
//! next producer can observe the stop as well.

use fas_graph::{Candidate, SearchEngine};
use fas_shm::{
    shutdown_requested, ResourceNames, SemaphoreKind, SharedSession, TeardownReport, WaitOutcome,
};
use tracing::{debug, info, trace, warn};

use crate::error::PipelineError;

const ROLE: &str = "generator";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    Attaching,
    Running,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The candidate was written to this slot
    Published { slot: usize },
    /// Shutdown was observed; nothing was written
    Stopped,
}

#[derive(Debug)]
pub struct GeneratorOutcome {
    pub iterations: u64,
    pub published: u64,
    /// Smallest candidate this generator computed
    pub best_edge_count: Option<usize>,
    pub teardown: TeardownReport,
}

pub struct Generator {
    session: SharedSession,
    engine: SearchEngine,
    state: GeneratorState,
    iterations: u64,
    published: u64,
    best_edge_count: Option<usize>,
}

impl Generator {
    /// Attach to a running supervisor's resources.
    pub fn attach(names: &ResourceNames, engine: SearchEngine) -> Result<Self, PipelineError> {
        debug!(state = ?GeneratorState::Attaching, shm = %names.shared_memory, "Generator attaching");
        let session = SharedSession::attach(names)?;
        Ok(Self::new(session, engine))
    }

    pub fn new(session: SharedSession, engine: SearchEngine) -> Self {
        Self {
            session,
            engine,
            state: GeneratorState::Attaching,
            iterations: 0,
            published: 0,
            best_edge_count: None,
        }
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SharedSession {
        &mut self.session
    }

    pub fn state(&self) -> GeneratorState {
        self.state
    }

    fn transition(&mut self, next: GeneratorState) {
        info!(from = ?self.state, to = ?next, "Generator state change");
        self.state = next;
    }

    fn keep_running(&self) -> bool {
        !shutdown_requested() && self.session.is_running()
    }

    fn post(&self, kind: SemaphoreKind, step: &'static str) -> Result<(), PipelineError> {
        self.session
            .release(kind)
            .map_err(PipelineError::ipc(ROLE, step))
    }

    /// Publish one candidate into the ring.
    pub fn publish(&mut self, candidate: &Candidate) -> Result<PublishOutcome, PipelineError> {
        let outcome = self
            .session
            .acquire(SemaphoreKind::MutualExclusion)
            .map_err(PipelineError::ipc(ROLE, "wait on mutualExclusion"))?;
        if outcome == WaitOutcome::Interrupted {
            self.post(SemaphoreKind::Used, "post used")?;
            return Ok(PublishOutcome::Stopped);
        }

        if !self.session.is_running() {
            self.post(SemaphoreKind::Used, "post used")?;
            self.post(SemaphoreKind::MutualExclusion, "post mutualExclusion")?;
            return Ok(PublishOutcome::Stopped);
        }

        let outcome = self
            .session
            .acquire(SemaphoreKind::Free)
            .map_err(PipelineError::ipc(ROLE, "wait on free"))?;
        if outcome == WaitOutcome::Interrupted {
            self.post(SemaphoreKind::Used, "post used")?;
            self.post(SemaphoreKind::MutualExclusion, "post mutualExclusion")?;
            return Ok(PublishOutcome::Stopped);
        }

        let control = self.session.control();
        let slot = control.write_cursor();
        // SAFETY: holding mutualExclusion and a free permit for this slot
        unsafe { control.write_slot(slot, candidate) };
        control.advance_write_cursor();

        self.post(SemaphoreKind::Used, "post used")?;
        self.post(SemaphoreKind::MutualExclusion, "post mutualExclusion")?;

        self.published += 1;
        trace!(slot, edges = candidate.edge_count(), "Candidate published");
        Ok(PublishOutcome::Published { slot })
    }

    fn track_best(&mut self, candidate: &Candidate) {
        let edges = candidate.edge_count();
        if self.best_edge_count.map_or(true, |best| edges < best) {
            debug!(edges, iteration = self.iterations, "Local best improved");
            self.best_edge_count = Some(edges);
        }
    }

    /// Search and publish until shutdown, then detach.
    pub fn run(mut self) -> Result<GeneratorOutcome, PipelineError> {
        self.transition(GeneratorState::Running);

        while self.keep_running() {
            let candidate = self.engine.next_candidate();
            self.iterations += 1;
            self.track_best(&candidate);

            if self.publish(&candidate)? == PublishOutcome::Stopped {
                break;
            }
        }

        Ok(self.shutdown())
    }

    /// Wake a supervisor that may be waiting on an empty ring, then release
    /// this process's handles.
    pub fn shutdown(mut self) -> GeneratorOutcome {
        self.transition(GeneratorState::Terminated);
        if let Err(err) = self.session.release(SemaphoreKind::Used) {
            warn!(error = %err, "Final used post failed");
        }

        let Generator {
            session,
            iterations,
            published,
            best_edge_count,
            ..
        } = self;
        let teardown = session.teardown();
        info!(iterations, published, best_edge_count, "Generator finished");

        GeneratorOutcome {
            iterations,
            published,
            best_edge_count,
            teardown,
        }
    }
}
