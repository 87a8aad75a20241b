// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for the message relay service against scripted providers

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use notify_core::*;

fn credentials() -> ProviderCredentials {
    ProviderCredentials::new("AC123", "token", "+14155238886")
}

fn relay_with(provider: Arc<dyn MessageProvider>, timeout: Duration) -> MessageRelay {
    MessageRelay::new(
        provider,
        &credentials(),
        RelayOptions {
            provider_timeout: timeout,
        },
    )
}

#[tokio::test]
async fn test_send_returns_provider_receipt() {
    let provider = Arc::new(MockProvider::accepting("X", "queued"));
    let relay = relay_with(provider.clone(), DEFAULT_PROVIDER_TIMEOUT);

    let receipt = relay
        .send(SendRequest::new("+15551234567", "Fee reminder"))
        .await
        .unwrap();

    assert_eq!(receipt.message_sid, "X");
    assert_eq!(receipt.status, "queued");
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_outbound_message_is_normalized() {
    let provider = Arc::new(MockProvider::new());
    let relay = relay_with(provider.clone(), DEFAULT_PROVIDER_TIMEOUT);

    relay
        .send(SendRequest::new("+15551234567", "Fee reminder"))
        .await
        .unwrap();

    let sent = provider.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to.as_str(), "whatsapp:+15551234567");
    assert_eq!(sent[0].from.as_str(), "whatsapp:+14155238886");
    assert_eq!(sent[0].body, "Fee reminder");
}

#[tokio::test]
async fn test_already_prefixed_recipient_not_doubled() {
    let provider = Arc::new(MockProvider::new());
    let relay = relay_with(provider.clone(), DEFAULT_PROVIDER_TIMEOUT);

    relay
        .send(SendRequest::new("whatsapp:+15551234567", "hi"))
        .await
        .unwrap();

    assert_eq!(provider.sent_messages()[0].to.as_str(), "whatsapp:+15551234567");
}

#[tokio::test]
async fn test_missing_fields_make_no_provider_call() {
    let provider = Arc::new(MockProvider::new());
    let relay = relay_with(provider.clone(), DEFAULT_PROVIDER_TIMEOUT);

    let requests = [
        SendRequest::default(),
        SendRequest::new("", ""),
        SendRequest {
            to: Some("+1555".into()),
            message: None,
        },
        SendRequest {
            to: None,
            message: Some("hello".into()),
        },
    ];

    for request in requests {
        let err = relay.send(request).await.unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
    }
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_provider_rejection_passes_status_and_body() {
    let provider = Arc::new(MockProvider::rejecting(401, json!({"code": 20003})));
    let relay = relay_with(provider.clone(), DEFAULT_PROVIDER_TIMEOUT);

    let err = relay
        .send(SendRequest::new("+15551234567", "hi"))
        .await
        .unwrap_err();

    match err {
        RelayError::Provider { status, details } => {
            assert_eq!(status, 401);
            assert_eq!(details, json!({"code": 20003}));
        }
        other => panic!("expected provider error, got {other:?}"),
    }
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_transport_failure_is_internal() {
    let provider = Arc::new(MockProvider::failing("connection reset by peer"));
    let relay = relay_with(provider.clone(), DEFAULT_PROVIDER_TIMEOUT);

    let err = relay
        .send(SendRequest::new("+15551234567", "hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::Transport(_)));
    assert!(err.is_internal());
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_hanging_provider_times_out() {
    let provider = Arc::new(MockProvider::hanging());
    let relay = relay_with(provider.clone(), Duration::from_millis(50));

    let err = relay
        .send(SendRequest::new("+15551234567", "hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::Timeout(_)));
    assert!(err.is_internal());
    assert_eq!(provider.call_count(), 1);
}

/// Provider that answers slowly and records whether it finished.
struct SlowProvider {
    delay: Duration,
    completed: AtomicBool,
}

#[async_trait]
impl MessageProvider for SlowProvider {
    async fn send(&self, _message: &OutboundMessage) -> Result<ProviderReply, ProviderError> {
        tokio::time::sleep(self.delay).await;
        self.completed.store(true, Ordering::SeqCst);
        Ok(ProviderReply::new(
            201,
            json!({"sid": "SM-slow", "status": "queued"}),
        ))
    }
}

#[tokio::test]
async fn test_provider_call_survives_caller_cancellation() {
    let provider = Arc::new(SlowProvider {
        delay: Duration::from_millis(100),
        completed: AtomicBool::new(false),
    });
    let relay = relay_with(provider.clone(), DEFAULT_PROVIDER_TIMEOUT);

    // Caller gives up long before the provider answers
    let abandoned = tokio::time::timeout(
        Duration::from_millis(10),
        relay.send(SendRequest::new("+15551234567", "hi")),
    )
    .await;
    assert!(abandoned.is_err());
    assert!(!provider.completed.load(Ordering::SeqCst));

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(provider.completed.load(Ordering::SeqCst));
}
