// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#[derive(Debug, thiserror::Error)]
pub enum ComplianceError {
    #[error("unknown IANA timezone {tz:?}")]
    UnknownTimezone { tz: String },

    #[error("malformed call window {window:?}, expected HH:MM-HH:MM")]
    MalformedWindow { window: String },
}

pub type ComplianceResult<T> = Result<T, ComplianceError>;
