// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only per-account attempt ledger.
//!
//! Each account gets one JSON file keyed by the first 32 hex characters of
//! `sha256(account_ref)`, holding the full event history for that account.
//! The compliance gate reads this back through [`attempts_today`] and
//! [`last_counted_attempt_at`], both of which only consider events with
//! `counts_toward_attempt = true` and resolve "today"/"last" against the
//! account's IANA policy timezone, not UTC.

use crate::error::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use oc_core::LedgerEvent;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

pub struct JsonAttemptLedger {
    dir: PathBuf,
    lock: Mutex<()>,
}

fn account_slug(account_ref: &str) -> String {
    let digest = Sha256::digest(account_ref.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect::<String>()[..32].to_string()
}

impl JsonAttemptLedger {
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = root.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io { path: dir.clone(), source })?;
        Ok(Self { dir, lock: Mutex::new(()) })
    }

    fn path_for(&self, account_ref: &str) -> PathBuf {
        self.dir.join(format!("{}.json", account_slug(account_ref)))
    }

    fn load(&self, account_ref: &str) -> StorageResult<Vec<LedgerEvent>> {
        let path = self.path_for(account_ref);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&path).map_err(|source| StorageError::Io { path: path.clone(), source })?;
        serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt { path, source })
    }

    /// Append one event to the account's event history.
    pub fn append(&self, event: LedgerEvent) -> StorageResult<()> {
        let _guard = self.lock.lock().expect("attempt ledger lock poisoned");
        let mut events = self.load(&event.account_ref)?;
        let path = self.path_for(&event.account_ref);
        events.push(event);
        let raw = serde_json::to_string_pretty(&events).expect("Vec<LedgerEvent> always serializes");
        fs::write(&path, raw).map_err(|source| StorageError::Io { path, source })
    }

    pub fn events_for(&self, account_ref: &str) -> StorageResult<Vec<LedgerEvent>> {
        let _guard = self.lock.lock().expect("attempt ledger lock poisoned");
        self.load(account_ref)
    }

    /// Number of counted attempts whose local date (in `tz`) equals
    /// `now_utc`'s local date.
    pub fn attempts_today(&self, account_ref: &str, tz: Tz, now_utc: DateTime<Utc>) -> StorageResult<i32> {
        let today_local = now_utc.with_timezone(&tz).date_naive();
        let events = self.events_for(account_ref)?;
        Ok(events
            .iter()
            .filter(|e| e.counts_toward_attempt && e.recorded_at_utc.with_timezone(&tz).date_naive() == today_local)
            .count() as i32)
    }

    /// UTC timestamp of the most recent counted attempt, if any.
    pub fn last_counted_attempt_at(&self, account_ref: &str) -> StorageResult<Option<DateTime<Utc>>> {
        let events = self.events_for(account_ref)?;
        Ok(events
            .iter()
            .filter(|e| e.counts_toward_attempt)
            .map(|e| e.recorded_at_utc)
            .max())
    }
}

#[cfg(test)]
#[path = "attempt_ledger_tests.rs"]
mod tests;
