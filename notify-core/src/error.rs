// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Relay Error Types

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::provider::ProviderError;
use crate::request::ValidationError;

/// Outcome of a failed relay attempt.
///
/// Only [`RelayError::Validation`] and [`RelayError::Provider`] carry
/// caller-visible detail. Everything else is an internal error whose
/// cause stays in the operational log.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Caller request missing required fields.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Provider answered with a non-success status.
    #[error("provider rejected message with status {status}")]
    Provider {
        /// HTTP status returned by the provider.
        status: u16,
        /// Provider response body, untouched.
        details: Value,
    },

    /// Provider did not answer in time.
    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),

    /// Provider unreachable or its response unreadable.
    #[error("provider transport error: {0}")]
    Transport(#[from] ProviderError),

    /// Provider signalled success without the expected fields.
    #[error("malformed provider reply: {0}")]
    MalformedReply(String),

    /// The task running the provider call panicked or was cancelled.
    #[error("provider task aborted: {0}")]
    Aborted(String),
}

impl RelayError {
    /// True for failures reported to the caller as an opaque internal error.
    pub fn is_internal(&self) -> bool {
        !matches!(self, RelayError::Validation(_) | RelayError::Provider { .. })
    }
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;
