// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mock Provider
//!
//! In-memory provider for testing without network access.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{MessageProvider, OutboundMessage, ProviderError, ProviderReply};

/// What the mock does when asked to send.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Answer with the given status and body.
    Reply(ProviderReply),
    /// Fail as if the network dropped.
    Fail(String),
    /// Never answer.
    Hang,
}

/// Mock provider that records sent messages and answers from a script.
pub struct MockProvider {
    behavior: Mutex<MockBehavior>,
    sent: Mutex<Vec<OutboundMessage>>,
}

impl MockProvider {
    /// Creates a mock that accepts every message as `queued`.
    pub fn new() -> Self {
        Self::accepting("SM00000000000000000000000000000000", "queued")
    }

    /// Creates a mock that accepts with the given id and status.
    pub fn accepting(sid: &str, status: &str) -> Self {
        Self::with_behavior(MockBehavior::Reply(ProviderReply::new(
            201,
            json!({ "sid": sid, "status": status }),
        )))
    }

    /// Creates a mock that rejects with the given HTTP status and body.
    pub fn rejecting(status: u16, body: Value) -> Self {
        Self::with_behavior(MockBehavior::Reply(ProviderReply::new(status, body)))
    }

    /// Creates a mock whose sends fail at the transport level.
    pub fn failing(reason: &str) -> Self {
        Self::with_behavior(MockBehavior::Fail(reason.to_string()))
    }

    /// Creates a mock that never answers.
    pub fn hanging() -> Self {
        Self::with_behavior(MockBehavior::Hang)
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        MockProvider {
            behavior: Mutex::new(behavior),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the scripted behavior.
    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Returns all messages the provider was asked to send.
    pub fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of send attempts made.
    pub fn call_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageProvider for MockProvider {
    async fn send(&self, message: &OutboundMessage) -> Result<ProviderReply, ProviderError> {
        self.sent.lock().unwrap().push(message.clone());
        let behavior = self.behavior.lock().unwrap().clone();

        match behavior {
            MockBehavior::Reply(reply) => Ok(reply),
            MockBehavior::Fail(reason) => Err(ProviderError::Transport(reason)),
            MockBehavior::Hang => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::normalize_address;

    fn message() -> OutboundMessage {
        OutboundMessage {
            to: normalize_address("+1555"),
            from: normalize_address("+1444"),
            body: "hi".into(),
        }
    }

    #[tokio::test]
    async fn test_mock_records_messages() {
        let mock = MockProvider::new();
        mock.send(&message()).await.unwrap();
        mock.send(&message()).await.unwrap();

        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.sent_messages()[0].to.as_str(), "whatsapp:+1555");
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockProvider::failing("connection reset");
        let result = mock.send(&message()).await;
        assert!(matches!(result, Err(ProviderError::Transport(r)) if r == "connection reset"));
    }

    #[tokio::test]
    async fn test_set_behavior() {
        let mock = MockProvider::new();
        mock.set_behavior(MockBehavior::Reply(ProviderReply::new(429, json!({"code": 20429}))));
        let reply = mock.send(&message()).await.unwrap();
        assert_eq!(reply.status, 429);
    }
}
