// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker's poll loop: lease, process, sleep, repeat. Grounded on
//! `run_outbound_worker.py`'s `main()` — single-threaded, any number of
//! workers may run concurrently against the same store directories.

use std::thread;
use std::time::Duration;

use chrono::Utc;

use crate::process::{process_one_job, ProcessOutcome, WorkerStores};

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub worker_id: String,
    pub lease_seconds: i64,
    pub poll_seconds: f64,
    /// 0 means no fixed limit.
    pub max_jobs: u32,
    /// Run at most one lease/process cycle, then exit regardless of `max_jobs`.
    pub once: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { worker_id: "worker_local".to_string(), lease_seconds: 90, poll_seconds: 2.0, max_jobs: 0, once: false }
    }
}

/// Run the poll loop until `--once` completes a cycle, `--max-jobs` is
/// reached, or the process is killed. Returns the number of jobs
/// processed (leased and either blocked, deferred, or initialized).
pub fn run_worker_loop(stores: &WorkerStores, config: &WorkerConfig) -> u32 {
    let mut processed = 0u32;
    loop {
        let now_utc = Utc::now();
        let outcome = process_one_job(stores, &config.worker_id, config.lease_seconds, now_utc);

        let did_work = match outcome {
            Ok(ProcessOutcome::Idle) => false,
            Ok(ProcessOutcome::Initialized { call_id }) => {
                tracing::info!(call_id = %call_id, "call initialized");
                true
            }
            Ok(ProcessOutcome::Deferred { decision_code, retry_after_seconds }) => {
                tracing::info!(decision_code = %decision_code, retry_after_seconds, "job deferred by compliance gate");
                true
            }
            Ok(ProcessOutcome::Blocked { decision_code }) => {
                tracing::info!(decision_code = %decision_code, "job canceled by compliance gate");
                true
            }
            Err(err) => {
                tracing::error!(error = %err, "unexpected error processing job");
                true
            }
        };

        if did_work {
            processed += 1;
            if config.once {
                break;
            }
            if config.max_jobs > 0 && processed >= config.max_jobs {
                break;
            }
            continue;
        }

        if config.once {
            tracing::debug!("idle: no due jobs");
            break;
        }
        if config.max_jobs > 0 && processed >= config.max_jobs {
            break;
        }

        thread::sleep(Duration::from_secs_f64(config.poll_seconds.max(0.1)));
    }
    processed
}

#[cfg(test)]
#[path = "loop_runner_tests.rs"]
mod tests;
