// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! SIGINT/SIGTERM handling
//!
//! The handler only stores to atomics. It always records the request in a
//! process-local flag and, once a session has bound it, also clears the
//! running flag in shared memory so every process sees the stop.
//!
//! Handlers are installed without `SA_RESTART`: a blocked `sem_wait`
//! returns `EINTR` and the waiting loop gets a chance to exit.

use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use tracing::{debug, info};

use crate::error::ShmError;

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);
static SHARED_RUNNING: AtomicPtr<AtomicBool> = AtomicPtr::new(ptr::null_mut());

/// Signals that request a shutdown
pub const SHUTDOWN_SIGNALS: [Signal; 2] = [Signal::SIGINT, Signal::SIGTERM];

extern "C" fn on_shutdown_signal(_signal: libc::c_int) {
    request_shutdown();
}

/// Install the shutdown handler for SIGINT and SIGTERM.
pub fn install_signal_handlers() -> Result<(), ShmError> {
    let action = SigAction::new(
        SigHandler::Handler(on_shutdown_signal),
        SaFlags::empty(),
        SigSet::empty(),
    );
    for signal in SHUTDOWN_SIGNALS {
        // SAFETY: the handler only performs atomic loads and stores
        unsafe { sigaction(signal, &action) }
            .map_err(|errno| ShmError::from_errno("sigaction", signal.as_str(), errno))?;
    }
    info!("Shutdown signal handlers installed (SIGINT, SIGTERM)");
    Ok(())
}

/// Same effect as receiving SIGINT. Async-signal-safe.
pub fn request_shutdown() {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
    let shared = SHARED_RUNNING.load(Ordering::SeqCst);
    if !shared.is_null() {
        // SAFETY: a bound pointer refers to a live mapping; it is unbound
        // before the mapping is released
        unsafe { (*shared).store(false, Ordering::SeqCst) };
    }
}

/// Whether this process has received a shutdown signal
pub fn shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}

/// Point the handler at a mapped running flag.
pub(crate) fn bind_running_flag(flag: &AtomicBool) {
    SHARED_RUNNING.store(flag as *const AtomicBool as *mut AtomicBool, Ordering::SeqCst);
    // A signal that arrived before binding still has to stop everyone
    if shutdown_requested() {
        flag.store(false, Ordering::SeqCst);
    }
    debug!("Signal handler bound to shared running flag");
}

pub(crate) fn unbind_running_flag() {
    SHARED_RUNNING.store(ptr::null_mut(), Ordering::SeqCst);
    debug!("Signal handler unbound from shared running flag");
}
