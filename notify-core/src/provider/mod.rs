// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Messaging Provider Abstraction
//!
//! The relay talks to the third-party messaging API through the
//! [`MessageProvider`] trait:
//! - [`TwilioClient`]: HTTP client for the real provider
//! - [`MockProvider`]: scripted in-memory provider for tests
//!
//! Provider responses are kept opaque. Only the HTTP status, the message
//! identifier and the delivery status are ever read out of them.

mod mock;
mod twilio;

pub use mock::{MockBehavior, MockProvider};
pub use twilio::{ProviderConfig, TwilioClient, DEFAULT_PROVIDER_BASE_URL};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::address::NormalizedAddress;

/// A message ready to be handed to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: NormalizedAddress,
    pub from: NormalizedAddress,
    pub body: String,
}

/// Raw provider answer: HTTP status plus the untouched response body.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply {
    pub status: u16,
    pub body: Value,
}

impl ProviderReply {
    pub fn new(status: u16, body: Value) -> Self {
        ProviderReply { status, body }
    }

    /// Wraps a raw response body. Non-JSON text is kept as a JSON string.
    pub fn from_text(status: u16, text: &str) -> Self {
        let body = serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()));
        ProviderReply { status, body }
    }

    /// True when the provider accepted or queued the message.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Provider-assigned message identifier (`sid`).
    pub fn message_sid(&self) -> Option<&str> {
        self.body.get("sid").and_then(Value::as_str)
    }

    /// Provider delivery status (`queued`, `accepted`, ...).
    pub fn delivery_status(&self) -> Option<&str> {
        self.body.get("status").and_then(Value::as_str)
    }
}

/// The provider could not be reached or its answer could not be read.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Network/request error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Transport failure reported by a non-HTTP provider.
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Delivers a single message to the messaging provider.
#[async_trait]
pub trait MessageProvider: Send + Sync {
    /// Sends `message` once. HTTP-level rejections are returned as a
    /// [`ProviderReply`] with a non-success status, not as an error.
    async fn send(&self, message: &OutboundMessage) -> Result<ProviderReply, ProviderError>;
}
