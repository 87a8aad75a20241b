// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Provider Credentials
//!
//! Loaded once at process start and read-only afterwards. The auth token
//! is wiped from memory on drop and never appears in `Debug` output.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::address::{normalize_address, NormalizedAddress};

/// Environment variable holding the provider account identifier.
pub const ACCOUNT_SID_VAR: &str = "TWILIO_ACCOUNT_SID";
/// Environment variable holding the provider auth token.
pub const AUTH_TOKEN_VAR: &str = "TWILIO_AUTH_TOKEN";
/// Environment variable holding the sender phone number.
pub const FROM_NUMBER_VAR: &str = "TWILIO_WHATSAPP_NUMBER";

/// Credential loading errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("missing provider credentials: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

/// Account identifier, auth token and sender number for the provider.
#[derive(Clone)]
pub struct ProviderCredentials {
    account_sid: String,
    auth_token: Zeroizing<String>,
    from_number: String,
}

impl ProviderCredentials {
    /// Creates credentials from explicit values.
    pub fn new(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
    ) -> Self {
        ProviderCredentials {
            account_sid: account_sid.into(),
            auth_token: Zeroizing::new(auth_token.into()),
            from_number: from_number.into(),
        }
    }

    /// Loads credentials from the process environment.
    pub fn from_env() -> Result<Self, CredentialsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads credentials through `lookup`, reporting every missing value
    /// at once. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CredentialsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut read = |key: &'static str| match lookup(key).filter(|v| !v.is_empty()) {
            Some(value) => value,
            None => {
                missing.push(key);
                String::new()
            }
        };

        let account_sid = read(ACCOUNT_SID_VAR);
        let auth_token = Zeroizing::new(read(AUTH_TOKEN_VAR));
        let from_number = read(FROM_NUMBER_VAR);

        if !missing.is_empty() {
            return Err(CredentialsError::Missing(missing));
        }

        Ok(ProviderCredentials {
            account_sid,
            auth_token,
            from_number,
        })
    }

    pub fn account_sid(&self) -> &str {
        &self.account_sid
    }

    /// Sender number with the channel prefix applied.
    pub fn sender_address(&self) -> NormalizedAddress {
        normalize_address(&self.from_number)
    }

    /// `Authorization` header value for HTTP Basic authentication.
    pub fn authorization_header(&self) -> Zeroizing<String> {
        let pair = Zeroizing::new(format!("{}:{}", self.account_sid, &*self.auth_token));
        Zeroizing::new(format!("Basic {}", STANDARD.encode(pair.as_bytes())))
    }
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .field("from_number", &self.from_number)
            .finish()
    }
}
