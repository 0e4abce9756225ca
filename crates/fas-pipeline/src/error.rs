// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use fas_shm::ShmError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Setting up the shared resources failed
    #[error(transparent)]
    Setup(#[from] ShmError),

    /// A semaphore operation failed inside the main loop
    #[error("{role}: {step} failed")]
    Ipc {
        role: &'static str,
        step: &'static str,
        #[source]
        source: ShmError,
    },
}

impl PipelineError {
    pub(crate) fn ipc(role: &'static str, step: &'static str) -> impl FnOnce(ShmError) -> Self {
        move |source| PipelineError::Ipc { role, step, source }
    }
}
