// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker error taxonomy.

use oc_compliance::ComplianceError;
use oc_core::JobError;
use oc_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Compliance(#[from] ComplianceError),

    #[error(transparent)]
    Job(#[from] JobError),
}

pub type WorkerResult<T> = Result<T, WorkerError>;
