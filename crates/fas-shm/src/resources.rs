// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Acquired OS resources, released in reverse order of acquisition
//!
//! Every step of session setup pushes what it acquired. Teardown pops the
//! stack, so a setup that failed halfway releases exactly what it got.
//! Release failures are logged and collected; they never stop the unwind.

use std::ffi::c_void;
use std::fs::File;
use std::io;
use std::mem::ManuallyDrop;
use std::os::fd::IntoRawFd;

use memmap2::MmapMut;
use thiserror::Error;
use tracing::{debug, warn};

use crate::semaphore::NamedSemaphore;
use crate::shutdown;

pub(crate) enum Resource {
    /// Shared memory name owned by this process; unlinked on release
    SharedMemoryName(String),
    /// Open descriptor of the shared memory object
    Descriptor { name: String, file: File },
    /// Mapping of the shared memory object, created at offset 0
    Mapping { name: String, map: MmapMut },
    /// Semaphore name owned by this process; unlinked on release
    SemaphoreName(String),
    /// Open semaphore handle; closed on release
    Semaphore(NamedSemaphore),
    /// Signal handlers write to the mapped running flag
    SignalBinding,
}

/// One failed release step
#[derive(Debug, Error)]
#[error("{operation} failed for {resource}: {source}")]
pub struct TeardownFailure {
    pub operation: &'static str,
    pub resource: String,
    #[source]
    pub source: io::Error,
}

/// Outcome of unwinding a resource stack
#[derive(Debug, Default)]
pub struct TeardownReport {
    pub released: usize,
    pub failures: Vec<TeardownFailure>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Resource {
    fn release(self) -> Result<(), TeardownFailure> {
        match self {
            Resource::SharedMemoryName(name) => {
                nix::sys::mman::shm_unlink(name.as_str()).map_err(|errno| TeardownFailure {
                    operation: "shm_unlink",
                    resource: name.clone(),
                    source: errno.into(),
                })?;
                debug!(shm = %name, "Unlinked shared memory");
                Ok(())
            }
            Resource::Descriptor { name, file } => {
                let fd = file.into_raw_fd();
                // SAFETY: fd came from an owned File and is closed exactly once
                if unsafe { libc::close(fd) } == -1 {
                    return Err(TeardownFailure {
                        operation: "close",
                        resource: name,
                        source: io::Error::last_os_error(),
                    });
                }
                debug!(shm = %name, "Closed shared memory descriptor");
                Ok(())
            }
            Resource::Mapping { name, map } => {
                // memmap2 ignores munmap errors on drop, so unmap by hand
                let map = ManuallyDrop::new(map);
                // SAFETY: the mapping starts at offset 0 and is not used again
                unsafe { unmap(&name, map.as_ptr().cast_mut().cast(), map.len()) }?;
                debug!(shm = %name, "Unmapped shared memory");
                Ok(())
            }
            Resource::SemaphoreName(name) => {
                NamedSemaphore::unlink(&name).map_err(|source| TeardownFailure {
                    operation: "sem_unlink",
                    resource: name.clone(),
                    source,
                })?;
                debug!(semaphore = %name, "Unlinked semaphore");
                Ok(())
            }
            Resource::Semaphore(semaphore) => {
                let name = semaphore.name().to_string();
                semaphore.close().map_err(|source| TeardownFailure {
                    operation: "sem_close",
                    resource: name.clone(),
                    source,
                })?;
                debug!(semaphore = %name, "Closed semaphore");
                Ok(())
            }
            Resource::SignalBinding => {
                shutdown::unbind_running_flag();
                Ok(())
            }
        }
    }
}

/// Unmap `len` bytes at `addr`.
///
/// # Safety
///
/// Nothing may access the range afterwards, and no other owner may unmap it.
unsafe fn unmap(name: &str, addr: *mut c_void, len: usize) -> Result<(), TeardownFailure> {
    if libc::munmap(addr, len) == -1 {
        return Err(TeardownFailure {
            operation: "munmap",
            resource: name.to_string(),
            source: io::Error::last_os_error(),
        });
    }
    Ok(())
}

#[derive(Default)]
pub(crate) struct ResourceStack {
    entries: Vec<Resource>,
}

impl ResourceStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, resource: Resource) {
        self.entries.push(resource);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Release everything, most recent first.
    pub(crate) fn unwind(&mut self) -> TeardownReport {
        let mut report = TeardownReport::default();
        while let Some(resource) = self.entries.pop() {
            match resource.release() {
                Ok(()) => report.released += 1,
                Err(failure) => {
                    warn!(error = %failure, "Teardown step failed");
                    report.failures.push(failure);
                }
            }
        }
        report
    }
}

impl Drop for ResourceStack {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            debug!(remaining = self.entries.len(), "Releasing resources on drop");
            self.unwind();
        }
    }
}
