// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-per-job JSON store with an idempotency-key pointer index.
//!
//! Each job is a single `{job_id}.json` file under `jobs/`. A parallel
//! `idempotency/{key}.json` pointer file maps an idempotency key to the
//! job it first created, so a repeated enqueue with the same key returns
//! the original job instead of creating a duplicate.

use crate::error::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use oc_core::{JobId, JobState, OutboundCallJob};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct JsonJobStore {
    jobs_dir: PathBuf,
    idempotency_dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonJobStore {
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        let jobs_dir = root.join("jobs");
        let idempotency_dir = root.join("idempotency");
        for dir in [&jobs_dir, &idempotency_dir] {
            fs::create_dir_all(dir).map_err(|source| StorageError::Io { path: dir.clone(), source })?;
        }
        Ok(Self { jobs_dir, idempotency_dir, lock: Mutex::new(()) })
    }

    fn job_path(&self, job_id: &JobId) -> PathBuf {
        self.jobs_dir.join(format!("{job_id}.json"))
    }

    fn idempotency_path(&self, key: &str) -> PathBuf {
        self.idempotency_dir.join(format!("{key}.json"))
    }

    fn read_job(&self, path: &Path) -> StorageResult<OutboundCallJob> {
        let raw = fs::read_to_string(path).map_err(|source| StorageError::Io { path: path.to_path_buf(), source })?;
        serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt { path: path.to_path_buf(), source })
    }

    fn write_job(&self, job: &OutboundCallJob) -> StorageResult<()> {
        let path = self.job_path(&job.job_id);
        let raw = serde_json::to_string_pretty(job).expect("OutboundCallJob always serializes");
        fs::write(&path, raw).map_err(|source| StorageError::Io { path, source })
    }

    /// Idempotent enqueue: if a job already exists for `job.idempotency_key`,
    /// returns that job unchanged. Otherwise persists `job` and indexes it.
    pub fn create_job(&self, job: OutboundCallJob) -> StorageResult<OutboundCallJob> {
        let _guard = self.lock.lock().expect("job store lock poisoned");
        let idem_path = self.idempotency_path(&job.idempotency_key);
        if idem_path.exists() {
            let existing_id = fs::read_to_string(&idem_path)
                .map_err(|source| StorageError::Io { path: idem_path.clone(), source })?;
            let existing = JobId::from_string(existing_id.trim());
            return self.read_job(&self.job_path(&existing));
        }
        self.write_job(&job)?;
        fs::write(&idem_path, job.job_id.as_str())
            .map_err(|source| StorageError::Io { path: idem_path, source })?;
        Ok(job)
    }

    pub fn get_job(&self, job_id: &JobId) -> StorageResult<OutboundCallJob> {
        let _guard = self.lock.lock().expect("job store lock poisoned");
        let path = self.job_path(job_id);
        if !path.exists() {
            return Err(StorageError::JobNotFound { job_id: *job_id });
        }
        self.read_job(&path)
    }

    pub fn save_job(&self, job: &OutboundCallJob) -> StorageResult<()> {
        let _guard = self.lock.lock().expect("job store lock poisoned");
        self.write_job(job)
    }

    fn list_jobs_unlocked(&self) -> StorageResult<Vec<OutboundCallJob>> {
        let entries = fs::read_dir(&self.jobs_dir).map_err(|source| StorageError::Io { path: self.jobs_dir.clone(), source })?;
        let mut jobs = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Ok(job) = self.read_job(&path) {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }

    /// List every job currently on disk, skipping unreadable/corrupt files.
    pub fn list_jobs(&self) -> StorageResult<Vec<OutboundCallJob>> {
        let _guard = self.lock.lock().expect("job store lock poisoned");
        self.list_jobs_unlocked()
    }

    /// Jobs whose state is `queued` and whose `scheduled_for_utc` has
    /// passed — candidates for the next dispatch sweep.
    pub fn list_dispatchable(&self, now_utc: DateTime<Utc>) -> StorageResult<Vec<OutboundCallJob>> {
        let jobs = self.list_jobs()?;
        Ok(jobs.into_iter().filter(|job| job.state == JobState::Queued && job.scheduled_for_utc <= now_utc).collect())
    }

    /// Promote any `waiting_retry` job whose delay has elapsed back to
    /// `queued`, then lease and return the single best-due `queued` job
    /// (minimum `(priority, created_at_utc)`), or `None` if none is due.
    /// Both steps run under one lock acquisition so a retry cannot mature
    /// and be missed between the promotion sweep and the lease pick.
    ///
    /// `lease_seconds` is accepted for parity with the documented contract
    /// but isn't persisted: lease-expiry reclamation is left to an
    /// external sweeper, which this core doesn't implement.
    pub fn lease_next_due_job(&self, worker_id: &str, lease_seconds: i64, now_utc: DateTime<Utc>) -> StorageResult<Option<OutboundCallJob>> {
        let _guard = self.lock.lock().expect("job store lock poisoned");
        let _ = lease_seconds;
        let mut jobs = self.list_jobs_unlocked()?;

        for job in jobs.iter_mut() {
            if job.state == JobState::WaitingRetry {
                if let Some(retry_after) = job.retry_after_utc {
                    if retry_after <= now_utc {
                        job.retry_ready(now_utc).expect("waiting_retry -> queued is a legal transition");
                        self.write_job(job)?;
                    }
                }
            }
        }

        let candidate = jobs
            .into_iter()
            .filter(|job| job.state == JobState::Queued && job.scheduled_for_utc <= now_utc)
            .min_by_key(|job| (job.priority, job.created_at_utc));

        let Some(mut job) = candidate else {
            return Ok(None);
        };
        job.lease(now_utc).expect("queued -> leased is a legal transition");
        self.write_job(&job)?;
        Ok(Some(job))
    }
}

#[cfg(test)]
#[path = "job_store_tests.rs"]
mod tests;
