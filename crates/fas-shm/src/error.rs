// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShmError {
    #[error("{resource} already exists (another supervisor running, or stale resources left behind)")]
    AlreadyExists { resource: String },

    #[error("{resource} does not exist (is the supervisor running?)")]
    NotFound { resource: String },

    #[error("shared memory {name} has {actual} bytes, expected {expected}")]
    SizeMismatch {
        name: String,
        expected: usize,
        actual: u64,
    },

    #[error("invalid IPC name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("wait on {semaphore} interrupted while still running")]
    UnexpectedInterrupt { semaphore: String },

    #[error("{operation} failed for {resource}: {source}")]
    Os {
        operation: &'static str,
        resource: String,
        #[source]
        source: io::Error,
    },
}

impl ShmError {
    /// Classify an OS error, keeping `EEXIST` and `ENOENT` distinguishable.
    pub fn from_io(operation: &'static str, resource: &str, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::AlreadyExists => ShmError::AlreadyExists {
                resource: resource.to_string(),
            },
            io::ErrorKind::NotFound => ShmError::NotFound {
                resource: resource.to_string(),
            },
            _ => ShmError::Os {
                operation,
                resource: resource.to_string(),
                source,
            },
        }
    }

    pub fn from_errno(operation: &'static str, resource: &str, errno: nix::errno::Errno) -> Self {
        Self::from_io(operation, resource, io::Error::from(errno))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::errno::Errno;

    #[test]
    fn test_errno_classification() {
        assert!(matches!(
            ShmError::from_errno("shm_open", "/x", Errno::EEXIST),
            ShmError::AlreadyExists { .. }
        ));
        assert!(matches!(
            ShmError::from_errno("sem_open", "/x", Errno::ENOENT),
            ShmError::NotFound { .. }
        ));
        assert!(matches!(
            ShmError::from_errno("sem_wait", "/x", Errno::EINVAL),
            ShmError::Os { operation: "sem_wait", .. }
        ));
    }
}
