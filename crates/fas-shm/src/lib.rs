// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # fas-shm
//!
//! Inter-process plumbing shared by the supervisor and the generators:
//!
//! - a POSIX shared memory object holding a [`SharedControlBlock`]: the
//!   running flag, the producers' write cursor and a ring of
//!   [`RING_CAPACITY`] candidate slots
//! - three named semaphores (`free`, `used`, `mutualExclusion`) that bound
//!   the ring and serialise producers
//! - signal handling that turns SIGINT/SIGTERM into a cleared running flag
//!   and interrupted semaphore waits
//!
//! The supervisor calls [`SharedSession::create`] and owns the names; every
//! generator calls [`SharedSession::attach`]. Whatever a session acquired is
//! released in reverse order by [`SharedSession::teardown`] or on drop.

pub mod error;
pub mod layout;
pub mod resources;
pub mod semaphore;
pub mod session;
pub mod shutdown;
pub mod sync;

pub use error::ShmError;
pub use layout::{RingSlot, SharedControlBlock, RING_CAPACITY};
pub use resources::{TeardownFailure, TeardownReport};
pub use semaphore::NamedSemaphore;
pub use session::{ResourceNames, SessionRole, SharedSession};
pub use shutdown::{install_signal_handlers, request_shutdown, shutdown_requested};
pub use sync::{SemaphoreKind, WaitOutcome};
