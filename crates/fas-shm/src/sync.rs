// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The three semaphores guarding the ring
//!
//! - `free` counts empty slots (starts at [`RING_CAPACITY`])
//! - `used` counts filled slots (starts at 0)
//! - `mutualExclusion` admits one producer at a time (starts at 1)
//!
//! Producers take `mutualExclusion` then `free`, and release `used` then
//! `mutualExclusion`. The supervisor takes `used` and releases `free`.

use crate::layout::RING_CAPACITY;
use crate::semaphore::NamedSemaphore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemaphoreKind {
    Free,
    Used,
    MutualExclusion,
}

impl SemaphoreKind {
    /// Creation order; teardown runs the other way round.
    pub const ALL: [SemaphoreKind; 3] = [
        SemaphoreKind::Free,
        SemaphoreKind::Used,
        SemaphoreKind::MutualExclusion,
    ];

    pub fn initial_value(self) -> u32 {
        match self {
            SemaphoreKind::Free => RING_CAPACITY as u32,
            SemaphoreKind::Used => 0,
            SemaphoreKind::MutualExclusion => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SemaphoreKind::Free => "free",
            SemaphoreKind::Used => "used",
            SemaphoreKind::MutualExclusion => "mutualExclusion",
        }
    }
}

impl std::fmt::Display for SemaphoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of a blocking acquire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// A permit was taken
    Acquired,
    /// The wait was cut short by a shutdown signal; no permit was taken
    Interrupted,
}

/// Open handles to the three semaphores of one session
#[derive(Debug)]
pub(crate) struct SemaphoreTriple {
    free: NamedSemaphore,
    used: NamedSemaphore,
    mutual_exclusion: NamedSemaphore,
}

impl SemaphoreTriple {
    pub(crate) fn new(
        free: NamedSemaphore,
        used: NamedSemaphore,
        mutual_exclusion: NamedSemaphore,
    ) -> Self {
        Self {
            free,
            used,
            mutual_exclusion,
        }
    }

    pub(crate) fn get(&self, kind: SemaphoreKind) -> &NamedSemaphore {
        match kind {
            SemaphoreKind::Free => &self.free,
            SemaphoreKind::Used => &self.used,
            SemaphoreKind::MutualExclusion => &self.mutual_exclusion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_values() {
        assert_eq!(SemaphoreKind::Free.initial_value(), 20);
        assert_eq!(SemaphoreKind::Used.initial_value(), 0);
        assert_eq!(SemaphoreKind::MutualExclusion.initial_value(), 1);
    }

    #[test]
    fn test_labels() {
        let labels: Vec<String> = SemaphoreKind::ALL.iter().map(|k| k.to_string()).collect();
        assert_eq!(labels, vec!["free", "used", "mutualExclusion"]);
    }
}
