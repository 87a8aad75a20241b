// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Twilio Messages API client
//!
//! Sends form-encoded `To`/`From`/`Body` to the account's Messages
//! resource using HTTP Basic authentication.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use tracing::debug;

use super::{MessageProvider, OutboundMessage, ProviderError, ProviderReply};
use crate::credentials::ProviderCredentials;

/// Production API host.
pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.twilio.com";

/// Configuration for the provider HTTP client.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API base URL (overridden in tests to point at a mock server)
    pub base_url: String,

    /// HTTP timeout for a single send
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PROVIDER_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl ProviderConfig {
    /// Point the client at a different API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP client for the Twilio Messages API.
pub struct TwilioClient {
    client: Client,
    messages_url: String,
    credentials: ProviderCredentials,
}

impl TwilioClient {
    /// Create a new client from config and credentials
    pub fn new(
        config: &ProviderConfig,
        credentials: ProviderCredentials,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!(
                "notify-relay/{}",
                option_env!("CARGO_PKG_VERSION").unwrap_or("0.1.0")
            ))
            .build()?;

        let messages_url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            config.base_url.trim_end_matches('/'),
            credentials.account_sid()
        );

        Ok(Self {
            client,
            messages_url,
            credentials,
        })
    }

    /// Full URL of the Messages resource
    pub fn messages_url(&self) -> &str {
        &self.messages_url
    }
}

#[async_trait]
impl MessageProvider for TwilioClient {
    async fn send(&self, message: &OutboundMessage) -> Result<ProviderReply, ProviderError> {
        let form = [
            ("To", message.to.as_str()),
            ("From", message.from.as_str()),
            ("Body", message.body.as_str()),
        ];

        let response = self
            .client
            .post(&self.messages_url)
            .header(AUTHORIZATION, self.credentials.authorization_header().as_str())
            .form(&form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        debug!(status, "Provider responded");

        Ok(ProviderReply::from_text(status, &text))
    }
}
