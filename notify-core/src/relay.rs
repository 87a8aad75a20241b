// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Message Relay Service
//!
//! Validates a send request, normalizes the recipient, hands the message
//! to the provider exactly once and maps the outcome into a
//! [`SendReceipt`] or a [`RelayError`].
//!
//! The provider call runs in its own task. If the caller disappears while
//! the provider is still working, the call is not cancelled and its
//! outcome is still logged.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::address::{normalize_address, NormalizedAddress};
use crate::credentials::ProviderCredentials;
use crate::error::RelayError;
use crate::provider::{MessageProvider, OutboundMessage, ProviderReply};
use crate::request::SendRequest;

/// Default upper bound on a single provider call.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Tunables for [`MessageRelay`].
#[derive(Debug, Clone)]
pub struct RelayOptions {
    /// Upper bound on a provider call; elapsed calls are internal errors.
    pub provider_timeout: Duration,
}

impl Default for RelayOptions {
    fn default() -> Self {
        RelayOptions {
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }
}

/// Provider acceptance of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    pub message_sid: String,
    pub status: String,
}

/// Relays validated messages to a [`MessageProvider`].
pub struct MessageRelay {
    provider: Arc<dyn MessageProvider>,
    sender: NormalizedAddress,
    options: RelayOptions,
}

impl MessageRelay {
    pub fn new(
        provider: Arc<dyn MessageProvider>,
        credentials: &ProviderCredentials,
        options: RelayOptions,
    ) -> Self {
        MessageRelay {
            provider,
            sender: credentials.sender_address(),
            options,
        }
    }

    /// Channel-prefixed sender used as `From` on every message.
    pub fn sender(&self) -> &NormalizedAddress {
        &self.sender
    }

    /// Sends one message. Makes no provider call when validation fails,
    /// and exactly one otherwise. Never retries.
    pub async fn send(&self, request: SendRequest) -> Result<SendReceipt, RelayError> {
        let validated = request.validate()?;

        let message = OutboundMessage {
            to: normalize_address(&validated.to),
            from: self.sender.clone(),
            body: validated.body,
        };

        let reply = self.dispatch(message).await?;
        map_reply(reply)
    }

    /// Runs the provider call on a detached task bounded by the timeout.
    async fn dispatch(&self, message: OutboundMessage) -> Result<ProviderReply, RelayError> {
        let provider = Arc::clone(&self.provider);
        let timeout = self.options.provider_timeout;

        let task = tokio::spawn(async move {
            let started = Instant::now();
            let outcome = tokio::time::timeout(timeout, provider.send(&message)).await;
            let elapsed = started.elapsed();

            match outcome {
                Ok(Ok(reply)) => {
                    if reply.is_success() {
                        info!(
                            recipient = %message.to,
                            message_sid = reply.message_sid().unwrap_or("<none>"),
                            elapsed_ms = elapsed.as_millis() as u64,
                            "WhatsApp message sent"
                        );
                    } else {
                        warn!(
                            recipient = %message.to,
                            status = reply.status,
                            details = %reply.body,
                            "Provider rejected WhatsApp message"
                        );
                    }
                    Ok(reply)
                }
                Ok(Err(e)) => {
                    error!(recipient = %message.to, error = %e, "Provider call failed");
                    Err(RelayError::Transport(e))
                }
                Err(_) => {
                    error!(
                        recipient = %message.to,
                        timeout_ms = timeout.as_millis() as u64,
                        "Provider call timed out"
                    );
                    Err(RelayError::Timeout(timeout))
                }
            }
        });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Provider task aborted");
                Err(RelayError::Aborted(e.to_string()))
            }
        }
    }
}

/// Maps a provider reply into the caller-facing outcome.
fn map_reply(reply: ProviderReply) -> Result<SendReceipt, RelayError> {
    if !reply.is_success() {
        return Err(RelayError::Provider {
            status: reply.status,
            details: reply.body,
        });
    }

    match (reply.message_sid(), reply.delivery_status()) {
        (Some(sid), Some(status)) => Ok(SendReceipt {
            message_sid: sid.to_string(),
            status: status.to_string(),
        }),
        _ => {
            error!(body = %reply.body, "Provider success reply lacks sid or status");
            Err(RelayError::MalformedReply(
                "success reply without sid or status".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProvider;
    use serde_json::json;

    fn relay_with(provider: Arc<MockProvider>) -> MessageRelay {
        let creds = ProviderCredentials::new("AC123", "token", "+14155238886");
        MessageRelay::new(provider, &creds, RelayOptions::default())
    }

    #[test]
    fn test_map_reply_success() {
        let receipt = map_reply(ProviderReply::new(
            201,
            json!({"sid": "SM1", "status": "queued", "extra": 1}),
        ))
        .unwrap();
        assert_eq!(
            receipt,
            SendReceipt {
                message_sid: "SM1".into(),
                status: "queued".into()
            }
        );
    }

    #[test]
    fn test_map_reply_missing_sid_is_malformed() {
        let err = map_reply(ProviderReply::new(200, json!({"status": "queued"}))).unwrap_err();
        assert!(matches!(err, RelayError::MalformedReply(_)));
        assert!(err.is_internal());
    }

    #[test]
    fn test_map_reply_failure_passes_body_through() {
        let err = map_reply(ProviderReply::new(400, json!({"code": 21211}))).unwrap_err();
        match err {
            RelayError::Provider { status, details } => {
                assert_eq!(status, 400);
                assert_eq!(details, json!({"code": 21211}));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_receipt_serializes_camel_case() {
        let receipt = SendReceipt {
            message_sid: "SM1".into(),
            status: "queued".into(),
        };
        assert_eq!(
            serde_json::to_value(&receipt).unwrap(),
            json!({"messageSid": "SM1", "status": "queued"})
        );
    }

    #[tokio::test]
    async fn test_sender_is_prefixed() {
        let relay = relay_with(Arc::new(MockProvider::new()));
        assert_eq!(relay.sender().as_str(), "whatsapp:+14155238886");
    }

    #[tokio::test]
    async fn test_validation_failure_skips_provider() {
        let provider = Arc::new(MockProvider::new());
        let relay = relay_with(provider.clone());

        let err = relay.send(SendRequest::new("", "hello")).await.unwrap_err();

        assert!(matches!(err, RelayError::Validation(_)));
        assert_eq!(provider.call_count(), 0);
    }
}
