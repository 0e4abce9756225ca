// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! POSIX named semaphores
//!
//! Thin wrapper over `sem_open` and friends. Closing and unlinking are
//! explicit so the session can release them in a fixed order and report
//! failures; dropping a handle does nothing.

use std::ffi::CString;
use std::io;
use std::ptr::NonNull;

use tracing::debug;

use crate::error::ShmError;

pub struct NamedSemaphore {
    name: String,
    raw: NonNull<libc::sem_t>,
}

// SAFETY: sem_t operations are thread-safe by POSIX; the handle is only
// invalidated by `close`, which consumes it.
unsafe impl Send for NamedSemaphore {}
unsafe impl Sync for NamedSemaphore {}

impl std::fmt::Debug for NamedSemaphore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedSemaphore")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

pub(crate) fn c_name(name: &str) -> Result<CString, ShmError> {
    CString::new(name).map_err(|_| ShmError::InvalidName {
        name: name.to_string(),
        reason: "contains a NUL byte",
    })
}

impl NamedSemaphore {
    /// Create a new semaphore with `initial` permits, failing if the name exists.
    pub fn create(name: &str, initial: u32) -> Result<Self, ShmError> {
        let c_name = c_name(name)?;
        // SAFETY: c_name is a valid NUL-terminated string
        let raw = unsafe {
            libc::sem_open(
                c_name.as_ptr(),
                libc::O_CREAT | libc::O_EXCL,
                0o600 as libc::c_uint,
                initial as libc::c_uint,
            )
        };
        let semaphore = Self::from_raw(name, raw)?;
        debug!(semaphore = name, initial, "Created named semaphore");
        Ok(semaphore)
    }

    /// Open an existing semaphore.
    pub fn open(name: &str) -> Result<Self, ShmError> {
        let c_name = c_name(name)?;
        // SAFETY: c_name is a valid NUL-terminated string
        let raw = unsafe { libc::sem_open(c_name.as_ptr(), 0) };
        let semaphore = Self::from_raw(name, raw)?;
        debug!(semaphore = name, "Opened named semaphore");
        Ok(semaphore)
    }

    fn from_raw(name: &str, raw: *mut libc::sem_t) -> Result<Self, ShmError> {
        if raw == libc::SEM_FAILED {
            return Err(ShmError::from_io(
                "sem_open",
                name,
                io::Error::last_os_error(),
            ));
        }
        let raw = NonNull::new(raw).ok_or_else(|| ShmError::Os {
            operation: "sem_open",
            resource: name.to_string(),
            source: io::Error::other("null semaphore handle"),
        })?;
        Ok(Self {
            name: name.to_string(),
            raw,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block until a permit is available.
    ///
    /// Returns the raw OS error so the caller can tell `EINTR` apart.
    pub fn wait(&self) -> io::Result<()> {
        // SAFETY: raw is an open semaphore for the lifetime of self
        if unsafe { libc::sem_wait(self.raw.as_ptr()) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn post(&self) -> io::Result<()> {
        // SAFETY: raw is an open semaphore for the lifetime of self
        if unsafe { libc::sem_post(self.raw.as_ptr()) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Current number of permits.
    pub fn value(&self) -> io::Result<i32> {
        let mut value: libc::c_int = 0;
        // SAFETY: raw is open and value is a valid out-pointer
        if unsafe { libc::sem_getvalue(self.raw.as_ptr(), &mut value) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(value)
    }

    /// Second handle to the same open semaphore. Only one of the two may be
    /// closed; the session keeps one for waits and gives one to its
    /// resource stack.
    pub(crate) fn share_handle(&self) -> Self {
        Self {
            name: self.name.clone(),
            raw: self.raw,
        }
    }

    /// Close this process's handle.
    pub fn close(self) -> io::Result<()> {
        // SAFETY: raw is open; self is consumed so it is not used again
        if unsafe { libc::sem_close(self.raw.as_ptr()) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Remove `name` from the system namespace.
    pub fn unlink(name: &str) -> io::Result<()> {
        let c_name = CString::new(name)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
        // SAFETY: c_name is a valid NUL-terminated string
        if unsafe { libc::sem_unlink(c_name.as_ptr()) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn unique_name(tag: &str) -> String {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        format!(
            "/fas_sem_unit_{}_{}_{}",
            std::process::id(),
            tag,
            COUNTER.fetch_add(1, Ordering::Relaxed)
        )
    }

    #[test]
    fn test_create_wait_post() {
        let name = unique_name("basic");
        let semaphore = NamedSemaphore::create(&name, 2).unwrap();
        assert_eq!(semaphore.value().unwrap(), 2);

        semaphore.wait().unwrap();
        assert_eq!(semaphore.value().unwrap(), 1);
        semaphore.post().unwrap();
        semaphore.post().unwrap();
        assert_eq!(semaphore.value().unwrap(), 3);

        semaphore.close().unwrap();
        NamedSemaphore::unlink(&name).unwrap();
    }

    #[test]
    fn test_exclusive_create() {
        let name = unique_name("excl");
        let first = NamedSemaphore::create(&name, 1).unwrap();
        assert!(matches!(
            NamedSemaphore::create(&name, 5),
            Err(ShmError::AlreadyExists { .. })
        ));
        // Existing semaphore untouched
        assert_eq!(first.value().unwrap(), 1);

        first.close().unwrap();
        NamedSemaphore::unlink(&name).unwrap();
    }

    #[test]
    fn test_open_shares_permits() {
        let name = unique_name("shared");
        let owner = NamedSemaphore::create(&name, 0).unwrap();
        let other = NamedSemaphore::open(&name).unwrap();

        other.post().unwrap();
        assert_eq!(owner.value().unwrap(), 1);
        owner.wait().unwrap();
        assert_eq!(other.value().unwrap(), 0);

        other.close().unwrap();
        owner.close().unwrap();
        NamedSemaphore::unlink(&name).unwrap();
    }

    #[test]
    fn test_open_missing() {
        let name = unique_name("missing");
        assert!(matches!(
            NamedSemaphore::open(&name),
            Err(ShmError::NotFound { .. })
        ));
        let err = NamedSemaphore::unlink(&name).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_nul_in_name() {
        assert!(matches!(
            NamedSemaphore::open("/bad\0name"),
            Err(ShmError::InvalidName { .. })
        ));
    }
}
