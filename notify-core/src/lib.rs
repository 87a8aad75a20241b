// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Notify Core Library
//!
//! Outbound WhatsApp message relay: request validation, recipient
//! normalization, provider credentials and delivery through the
//! messaging provider.

pub mod address;
pub mod credentials;
pub mod error;
pub mod provider;
pub mod relay;
pub mod request;

pub use address::{normalize_address, NormalizedAddress, WHATSAPP_PREFIX};
pub use credentials::{CredentialsError, ProviderCredentials};
pub use error::{RelayError, RelayResult};
pub use provider::{
    MessageProvider, MockBehavior, MockProvider, OutboundMessage, ProviderConfig, ProviderError,
    ProviderReply, TwilioClient,
};
pub use relay::{MessageRelay, RelayOptions, SendReceipt, DEFAULT_PROVIDER_TIMEOUT};
pub use request::{SendRequest, ValidatedMessage, ValidationError, MISSING_FIELDS_MESSAGE};
