// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage error taxonomy.

use oc_core::JobId;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("job {job_id} not found")]
    JobNotFound { job_id: JobId },

    #[error("call {call_id} not found")]
    CallNotFound { call_id: String },

    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error("malformed record at {path}: {source}")]
    Corrupt { path: PathBuf, #[source] source: serde_json::Error },
}

pub type StorageResult<T> = Result<T, StorageError>;
