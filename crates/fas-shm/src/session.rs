// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! One process's view of the shared resources
//!
//! The owner (supervisor) creates the shared memory object and the three
//! semaphores exclusively and removes their names on teardown. Attached
//! processes (generators) open existing resources and only close their own
//! handles.

use std::fs::File;
use std::io;
use std::ptr::NonNull;

use memmap2::MmapOptions;
use nix::fcntl::OFlag;
use nix::sys::stat::Mode;
use tracing::{debug, info};

use crate::error::ShmError;
use crate::layout::SharedControlBlock;
use crate::resources::{Resource, ResourceStack, TeardownReport};
use crate::semaphore::NamedSemaphore;
use crate::shutdown;
use crate::sync::{SemaphoreKind, SemaphoreTriple, WaitOutcome};

/// The four well-known names shared by supervisor and generators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    pub shared_memory: String,
    pub free: String,
    pub used: String,
    pub mutual_exclusion: String,
}

impl ResourceNames {
    pub fn new(
        shared_memory: impl Into<String>,
        free: impl Into<String>,
        used: impl Into<String>,
        mutual_exclusion: impl Into<String>,
    ) -> Self {
        Self {
            shared_memory: shared_memory.into(),
            free: free.into(),
            used: used.into(),
            mutual_exclusion: mutual_exclusion.into(),
        }
    }

    /// `<prefix>_shm`, `<prefix>_free`, `<prefix>_used`, `<prefix>_mutex`.
    /// `prefix` must start with `/`.
    pub fn with_prefix(prefix: &str) -> Self {
        Self::new(
            format!("{prefix}_shm"),
            format!("{prefix}_free"),
            format!("{prefix}_used"),
            format!("{prefix}_mutex"),
        )
    }

    pub fn semaphore(&self, kind: SemaphoreKind) -> &str {
        match kind {
            SemaphoreKind::Free => &self.free,
            SemaphoreKind::Used => &self.used,
            SemaphoreKind::MutualExclusion => &self.mutual_exclusion,
        }
    }
}

impl Default for ResourceNames {
    fn default() -> Self {
        Self::new(
            "/fb_arc_set_shm",
            "/fb_arc_set_free",
            "/fb_arc_set_used",
            "/fb_arc_set_mutex",
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// Created the resources and removes them on teardown
    Owner,
    /// Opened existing resources
    Attached,
}

pub struct SharedSession {
    role: SessionRole,
    names: ResourceNames,
    control: NonNull<SharedControlBlock>,
    semaphores: SemaphoreTriple,
    resources: ResourceStack,
}

// SAFETY: the control block is Sync and stays mapped until the resource
// stack is unwound, which only happens through `&mut self` or drop.
unsafe impl Send for SharedSession {}

impl SharedSession {
    /// Create every shared resource exclusively.
    ///
    /// Fails with [`ShmError::AlreadyExists`] if any name is taken; resources
    /// created before the failure are removed again, and the pre-existing one
    /// is left untouched.
    pub fn create(names: &ResourceNames) -> Result<Self, ShmError> {
        let mut resources = ResourceStack::new();

        let fd = nix::sys::mman::shm_open(
            names.shared_memory.as_str(),
            OFlag::O_CREAT | OFlag::O_EXCL | OFlag::O_RDWR,
            Mode::S_IRUSR | Mode::S_IWUSR,
        )
        .map_err(|errno| ShmError::from_errno("shm_open", &names.shared_memory, errno))?;
        resources.push(Resource::SharedMemoryName(names.shared_memory.clone()));

        let file = File::from(fd);
        file.set_len(SharedControlBlock::SIZE as u64)
            .map_err(|err| ShmError::from_io("ftruncate", &names.shared_memory, err))?;

        let control = map_control_block(&mut resources, &names.shared_memory, file)?;

        let free = create_semaphore(&mut resources, names, SemaphoreKind::Free)?;
        let used = create_semaphore(&mut resources, names, SemaphoreKind::Used)?;
        let mutual_exclusion =
            create_semaphore(&mut resources, names, SemaphoreKind::MutualExclusion)?;

        let session = Self {
            role: SessionRole::Owner,
            names: names.clone(),
            control,
            semaphores: SemaphoreTriple::new(free, used, mutual_exclusion),
            resources,
        };
        // ftruncate zero-fills, but the block must start stopped at slot 0
        // regardless
        session.control().reset();

        info!(
            shm = %names.shared_memory,
            bytes = SharedControlBlock::SIZE,
            resources = session.resources.len(),
            "Created shared resources"
        );
        Ok(session)
    }

    /// Open the resources created by a running owner.
    pub fn attach(names: &ResourceNames) -> Result<Self, ShmError> {
        let mut resources = ResourceStack::new();

        let fd = nix::sys::mman::shm_open(names.shared_memory.as_str(), OFlag::O_RDWR, Mode::empty())
            .map_err(|errno| ShmError::from_errno("shm_open", &names.shared_memory, errno))?;
        let file = File::from(fd);

        let actual = file
            .metadata()
            .map_err(|err| ShmError::from_io("fstat", &names.shared_memory, err))?
            .len();
        if actual != SharedControlBlock::SIZE as u64 {
            return Err(ShmError::SizeMismatch {
                name: names.shared_memory.clone(),
                expected: SharedControlBlock::SIZE,
                actual,
            });
        }

        let control = map_control_block(&mut resources, &names.shared_memory, file)?;

        let free = open_semaphore(&mut resources, names, SemaphoreKind::Free)?;
        let used = open_semaphore(&mut resources, names, SemaphoreKind::Used)?;
        let mutual_exclusion =
            open_semaphore(&mut resources, names, SemaphoreKind::MutualExclusion)?;

        let session = Self {
            role: SessionRole::Attached,
            names: names.clone(),
            control,
            semaphores: SemaphoreTriple::new(free, used, mutual_exclusion),
            resources,
        };
        info!(shm = %names.shared_memory, "Attached to shared resources");
        Ok(session)
    }

    pub fn role(&self) -> SessionRole {
        self.role
    }

    pub fn names(&self) -> &ResourceNames {
        &self.names
    }

    pub fn control(&self) -> &SharedControlBlock {
        // SAFETY: the mapping outlives every borrow of self
        unsafe { self.control.as_ref() }
    }

    pub fn is_running(&self) -> bool {
        self.control().is_running()
    }

    pub fn set_running(&self, running: bool) {
        self.control().set_running(running);
    }

    /// Clear the shared running flag; every process stops at its next check.
    pub fn request_stop(&self) {
        debug!(shm = %self.names.shared_memory, "Stop requested");
        self.set_running(false);
    }

    /// Make the signal handler clear this session's running flag.
    pub fn bind_shutdown_signals(&mut self) {
        shutdown::bind_running_flag(self.control().running_flag());
        self.resources.push(Resource::SignalBinding);
    }

    /// Block on one semaphore.
    ///
    /// `EINTR` during shutdown is [`WaitOutcome::Interrupted`]; while still
    /// running it is [`ShmError::UnexpectedInterrupt`].
    pub fn acquire(&self, kind: SemaphoreKind) -> Result<WaitOutcome, ShmError> {
        let semaphore = self.semaphores.get(kind);
        match semaphore.wait() {
            Ok(()) => Ok(WaitOutcome::Acquired),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                if self.is_running() && !shutdown::shutdown_requested() {
                    return Err(ShmError::UnexpectedInterrupt {
                        semaphore: semaphore.name().to_string(),
                    });
                }
                debug!(semaphore = %kind, "Wait interrupted by shutdown");
                Ok(WaitOutcome::Interrupted)
            }
            Err(err) => Err(ShmError::from_io("sem_wait", semaphore.name(), err)),
        }
    }

    pub fn release(&self, kind: SemaphoreKind) -> Result<(), ShmError> {
        let semaphore = self.semaphores.get(kind);
        semaphore
            .post()
            .map_err(|err| ShmError::from_io("sem_post", semaphore.name(), err))
    }

    /// Current permit count of one semaphore.
    pub fn semaphore_value(&self, kind: SemaphoreKind) -> Result<i32, ShmError> {
        let semaphore = self.semaphores.get(kind);
        semaphore
            .value()
            .map_err(|err| ShmError::from_io("sem_getvalue", semaphore.name(), err))
    }

    /// Release everything in reverse order of acquisition.
    pub fn teardown(mut self) -> TeardownReport {
        let report = self.resources.unwind();
        info!(
            shm = %self.names.shared_memory,
            role = ?self.role,
            released = report.released,
            failures = report.failures.len(),
            "Shared resources released"
        );
        report
    }
}

/// Create one semaphore and push its name, then its handle.
fn create_semaphore(
    resources: &mut ResourceStack,
    names: &ResourceNames,
    kind: SemaphoreKind,
) -> Result<NamedSemaphore, ShmError> {
    let name = names.semaphore(kind);
    let semaphore = NamedSemaphore::create(name, kind.initial_value())?;
    resources.push(Resource::SemaphoreName(name.to_string()));
    resources.push(Resource::Semaphore(semaphore.share_handle()));
    Ok(semaphore)
}

fn open_semaphore(
    resources: &mut ResourceStack,
    names: &ResourceNames,
    kind: SemaphoreKind,
) -> Result<NamedSemaphore, ShmError> {
    let semaphore = NamedSemaphore::open(names.semaphore(kind))?;
    resources.push(Resource::Semaphore(semaphore.share_handle()));
    Ok(semaphore)
}

/// Map `file` and push the descriptor and the mapping, in that order.
fn map_control_block(
    resources: &mut ResourceStack,
    name: &str,
    file: File,
) -> Result<NonNull<SharedControlBlock>, ShmError> {
    // SAFETY: other processes map the same object; all
    // access goes through atomics or the semaphore-protected slot accessors
    let mapped = unsafe {
        MmapOptions::new()
            .len(SharedControlBlock::SIZE)
            .map_mut(&file)
    };
    let mut map = match mapped {
        Ok(map) => map,
        Err(err) => {
            resources.push(Resource::Descriptor {
                name: name.to_string(),
                file,
            });
            return Err(ShmError::from_io("mmap", name, err));
        }
    };

    let control = NonNull::new(map.as_mut_ptr().cast::<SharedControlBlock>()).ok_or_else(|| {
        ShmError::Os {
            operation: "mmap",
            resource: name.to_string(),
            source: io::Error::other("null mapping"),
        }
    })?;

    resources.push(Resource::Descriptor {
        name: name.to_string(),
        file,
    });
    resources.push(Resource::Mapping {
        name: name.to_string(),
        map,
    });
    Ok(control)
}
