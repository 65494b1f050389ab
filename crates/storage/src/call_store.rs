// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-per-call JSON store.
//!
//! Each call gets a `{call_id}.json` file holding its current
//! [`CallState`], an ordered transcript of [`CallTurn`]s, and enough
//! envelope metadata (job, account, start/end timestamps, the finalized
//! outcome) to build a call summary without replaying the dialog engine.

use crate::error::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use oc_core::{Action, CallId, CallState, JobId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Whether the call is still in progress or has reached a terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Active,
    Ended,
}

/// One recorded turn: the opening system prompt or a caller/assistant
/// exchange, kept for audit and for `CallStore::summarize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallTurn {
    pub turn_index: u32,
    pub timestamp_utc: DateTime<Utc>,
    pub recorded_at_utc: DateTime<Utc>,
    pub event_type: String,
    pub user_transcript_present: bool,
    pub assistant_intent: Option<String>,
    pub actions: Vec<Action>,
    pub nlu_intent: Option<String>,
    pub nlu_confidence: Option<f64>,
}

fn extract_outcome_code(actions: &[Action]) -> Option<String> {
    actions.iter().find_map(|a| match a {
        Action::SetOutcome { outcome_code } => Some(outcome_code.clone()),
        _ => None,
    })
}

fn extract_end_reason(actions: &[Action]) -> Option<String> {
    actions.iter().find_map(|a| match a {
        Action::EndCall { reason } => Some(reason.clone()),
        _ => None,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub call_id: CallId,
    pub job_id: JobId,
    pub account_ref: String,
    pub started_at_utc: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at_utc: Option<DateTime<Utc>>,
    pub state: CallState,
    pub status: CallStatus,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
    #[serde(default)]
    pub turns: Vec<CallTurn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_outcome_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_end_reason: Option<String>,
}

/// Rolled-up view of a call, without the full per-turn transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSummary {
    pub call_id: CallId,
    pub status: CallStatus,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
    pub turns_count: usize,
    pub last_assistant_intent: Option<String>,
    pub final_outcome_code: Option<String>,
    pub final_end_reason: Option<String>,
}

impl CallRecord {
    /// Creates a new record with its opening turn already recorded. `state`
    /// is the state returned by the dialog engine's `start_call`.
    pub fn new(job_id: JobId, account_ref: impl Into<String>, started_at_utc: DateTime<Utc>, state: CallState) -> Self {
        let opening_turn = CallTurn {
            turn_index: 1,
            timestamp_utc: started_at_utc,
            recorded_at_utc: started_at_utc,
            event_type: "system_start".to_string(),
            user_transcript_present: false,
            assistant_intent: state.last_assistant_intent.clone(),
            actions: Vec::new(),
            nlu_intent: None,
            nlu_confidence: None,
        };
        Self {
            call_id: CallId::new(),
            job_id,
            account_ref: account_ref.into(),
            started_at_utc,
            ended_at_utc: None,
            state,
            status: CallStatus::Active,
            created_at_utc: started_at_utc,
            updated_at_utc: started_at_utc,
            turns: vec![opening_turn],
            final_outcome_code: None,
            final_end_reason: None,
        }
    }

    /// Appends one turn's outcome to the record, updating `state` and, if
    /// the turn ended the call, the terminal bookkeeping fields. Grounded
    /// on `call_store.py: append_turn`.
    pub fn append_turn(
        &mut self,
        event_type: &str,
        user_transcript_present: bool,
        assistant_intent: Option<String>,
        actions: Vec<Action>,
        state: CallState,
        nlu_intent: Option<String>,
        nlu_confidence: Option<f64>,
        timestamp_utc: DateTime<Utc>,
        recorded_at_utc: DateTime<Utc>,
    ) {
        let turn_index = self.turns.len() as u32 + 1;
        let ended = state.phase == oc_core::Phase::Ended;

        self.turns.push(CallTurn {
            turn_index,
            timestamp_utc,
            recorded_at_utc,
            event_type: event_type.to_string(),
            user_transcript_present,
            assistant_intent,
            actions: actions.clone(),
            nlu_intent,
            nlu_confidence,
        });
        self.state = state;
        self.updated_at_utc = recorded_at_utc;

        if ended {
            self.status = CallStatus::Ended;
            self.ended_at_utc = Some(recorded_at_utc);
            let outcome_code = extract_outcome_code(&actions);
            let end_reason = self.state.end_reason.clone().or_else(|| extract_end_reason(&actions));
            if let Some(outcome_code) = outcome_code {
                self.final_outcome_code = Some(outcome_code);
            } else if self.final_outcome_code.is_none() {
                self.final_outcome_code = end_reason.clone();
            }
            if let Some(end_reason) = end_reason {
                self.final_end_reason = Some(end_reason);
            }
        }
    }

    pub fn summarize(&self) -> CallSummary {
        CallSummary {
            call_id: self.call_id.clone(),
            status: self.status,
            created_at_utc: self.created_at_utc,
            updated_at_utc: self.updated_at_utc,
            turns_count: self.turns.len(),
            last_assistant_intent: self.turns.last().and_then(|t| t.assistant_intent.clone()),
            final_outcome_code: self.final_outcome_code.clone(),
            final_end_reason: self.final_end_reason.clone(),
        }
    }
}

pub struct JsonCallStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonCallStore {
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = root.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Io { path: dir.clone(), source })?;
        Ok(Self { dir, lock: Mutex::new(()) })
    }

    fn path_for(&self, call_id: &CallId) -> PathBuf {
        self.dir.join(format!("{call_id}.json"))
    }

    fn read(&self, path: &Path) -> StorageResult<CallRecord> {
        let raw = fs::read_to_string(path).map_err(|source| StorageError::Io { path: path.to_path_buf(), source })?;
        serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt { path: path.to_path_buf(), source })
    }

    pub fn create_call(&self, record: CallRecord) -> StorageResult<CallRecord> {
        let _guard = self.lock.lock().expect("call store lock poisoned");
        let path = self.path_for(&record.call_id);
        let raw = serde_json::to_string_pretty(&record).expect("CallRecord always serializes");
        fs::write(&path, raw).map_err(|source| StorageError::Io { path, source })?;
        Ok(record)
    }

    pub fn get_call(&self, call_id: &CallId) -> StorageResult<CallRecord> {
        let _guard = self.lock.lock().expect("call store lock poisoned");
        let path = self.path_for(call_id);
        if !path.exists() {
            return Err(StorageError::CallNotFound { call_id: call_id.to_string() });
        }
        self.read(&path)
    }

    pub fn save_call(&self, record: &CallRecord) -> StorageResult<()> {
        let _guard = self.lock.lock().expect("call store lock poisoned");
        let path = self.path_for(&record.call_id);
        let raw = serde_json::to_string_pretty(record).expect("CallRecord always serializes");
        fs::write(&path, raw).map_err(|source| StorageError::Io { path, source })
    }

    /// Reads, appends a turn to, and persists a call record under one lock
    /// acquisition so no writer can interleave a stale append.
    pub fn append_turn(
        &self,
        call_id: &CallId,
        event_type: &str,
        user_transcript_present: bool,
        assistant_intent: Option<String>,
        actions: Vec<Action>,
        state: CallState,
        nlu_intent: Option<String>,
        nlu_confidence: Option<f64>,
        timestamp_utc: DateTime<Utc>,
        recorded_at_utc: DateTime<Utc>,
    ) -> StorageResult<CallRecord> {
        let _guard = self.lock.lock().expect("call store lock poisoned");
        let path = self.path_for(call_id);
        if !path.exists() {
            return Err(StorageError::CallNotFound { call_id: call_id.to_string() });
        }
        let mut record = self.read(&path)?;
        record.append_turn(event_type, user_transcript_present, assistant_intent, actions, state, nlu_intent, nlu_confidence, timestamp_utc, recorded_at_utc);
        let raw = serde_json::to_string_pretty(&record).expect("CallRecord always serializes");
        fs::write(&path, raw).map_err(|source| StorageError::Io { path, source })?;
        Ok(record)
    }

    /// List every call on disk, skipping unreadable/corrupt files.
    pub fn list_calls(&self) -> StorageResult<Vec<CallRecord>> {
        let _guard = self.lock.lock().expect("call store lock poisoned");
        let entries = fs::read_dir(&self.dir).map_err(|source| StorageError::Io { path: self.dir.clone(), source })?;
        let mut calls = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Ok(record) = self.read(&path) {
                calls.push(record);
            }
        }
        Ok(calls)
    }
}

#[cfg(test)]
#[path = "call_store_tests.rs"]
mod tests;
