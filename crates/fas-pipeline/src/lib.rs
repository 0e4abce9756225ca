// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # fas-pipeline
//!
//! The two process roles of the search.
//!
//! - [`Supervisor`]: owns the shared resources, drains the ring and reports
//!   every strictly smaller feedback arc set. Stops when a generator finds an
//!   acyclic ordering or on a shutdown signal.
//! - [`Generator`]: attaches to the supervisor's resources and publishes one
//!   candidate per shuffled ordering until the running flag drops.

pub mod error;
pub mod generator;
pub mod report;
pub mod supervisor;

pub use error::PipelineError;
pub use generator::{Generator, GeneratorOutcome, GeneratorState, PublishOutcome};
pub use report::{ConsoleReporter, SolutionReporter};
pub use supervisor::{StopReason, Supervisor, SupervisorOutcome, SupervisorState, NO_SOLUTION};
