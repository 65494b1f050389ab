// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `oc-worker`: lease/gate/dispatch loop over the job, call, and
//! attempt-ledger stores. Any number of workers may run concurrently
//! against the same store directories — each store serializes its own
//! writes behind a store-wide lock.

use clap::Parser;
use oc_storage::{JsonAttemptLedger, JsonCallStore, JsonJobStore};
use oc_worker::{run_worker_loop, WorkerConfig, WorkerStores};

/// Outbound call worker: leases due jobs, runs the pre-dial compliance
/// gate, and initializes calls for anything it allows.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    #[arg(long, default_value = "worker_local")]
    worker_id: String,

    #[arg(long, default_value_t = 90)]
    lease_seconds: i64,

    #[arg(long, default_value_t = 2.0)]
    poll_seconds: f64,

    /// 0 means no fixed limit.
    #[arg(long, default_value_t = 0)]
    max_jobs: u32,

    /// Run at most one lease/process cycle, then exit.
    #[arg(long)]
    once: bool,

    #[arg(long, default_value = "runtime/jobs")]
    jobs_dir: String,

    #[arg(long, default_value = "runtime/calls")]
    calls_dir: String,

    #[arg(long, default_value = "runtime/ledger")]
    ledger_dir: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let jobs = JsonJobStore::open(&cli.jobs_dir)?;
    let calls = JsonCallStore::open(&cli.calls_dir)?;
    let ledger = JsonAttemptLedger::open(&cli.ledger_dir)?;
    let stores = WorkerStores { jobs: &jobs, calls: &calls, ledger: &ledger };

    let config = WorkerConfig {
        worker_id: cli.worker_id,
        lease_seconds: cli.lease_seconds,
        poll_seconds: cli.poll_seconds,
        max_jobs: cli.max_jobs,
        once: cli.once,
    };

    let processed = run_worker_loop(&stores, &config);
    tracing::info!(processed, "worker loop exiting");
    Ok(())
}
